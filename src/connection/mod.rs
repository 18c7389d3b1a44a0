pub(crate) mod client;
#[cfg(test)]
pub(crate) mod mock;

use crate::app::error::Error;
use bytes::Bytes;
use http::Request as HttpRequest;
use http::Response as HttpResponse;
use std::time::Duration;

pub trait SendMessage<T, R> {
    fn send(&self, data: T) -> R;
}

/// Request paired with the deadline it must complete within.
#[derive(Debug)]
pub struct TimedRequest {
    pub request: HttpRequest<Vec<u8>>,
    pub timeout: Duration,
}

pub type HttpResult = Result<HttpResponse<Bytes>, Error>;

/// Anything able to deliver a [`TimedRequest`].
pub trait Transport: SendMessage<TimedRequest, HttpResult> {}

impl<T> Transport for T where T: SendMessage<TimedRequest, HttpResult> {}
