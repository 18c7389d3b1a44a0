use crate::app::error::Error;
use crate::connection::{HttpResult, SendMessage, TimedRequest};
use http::Response as HttpResponse;
use reqwest::blocking::Client;
use reqwest::blocking::Request;
use std::convert::TryFrom;

impl SendMessage<TimedRequest, HttpResult> for Client {
    fn send(&self, data: TimedRequest) -> HttpResult {
        let mut request =
            Request::try_from(data.request).map_err(|e| Error::Definition(e.to_string()))?;
        *request.timeout_mut() = Some(data.timeout);
        let response = self.execute(request).map_err(classify)?;

        let mut builder = HttpResponse::builder()
            .status(response.status())
            .version(response.version());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(response.headers().clone());
        }
        let body = response.bytes().map_err(classify)?;
        builder
            .body(body)
            .map_err(|e| Error::Internal(e.to_string()))
    }
}

fn classify(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else {
        Error::Connection(err.to_string())
    }
}
