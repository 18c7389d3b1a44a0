use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Connection refused, DNS failure, TLS errors and friends.
    Connection(String),
    Timeout(String),
    /// Body was expected to be JSON but wasn't.
    Decode { reason: String, excerpt: String },
    /// Liquid template could not be parsed or rendered.
    Template(String),
    /// Broken test case definition.
    Definition(String),
    Internal(String),
}

impl ::std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Connection(err) => write!(f, "Network error: {}", err),
            Error::Timeout(err) => write!(f, "Request timed out: {}", err),
            Error::Decode { reason, excerpt } => {
                write!(f, "Response is not valid JSON ({}): {}", reason, excerpt)
            }
            Error::Template(err) => write!(f, "Template error: {}", err),
            Error::Definition(err) => write!(f, "Invalid test case: {}", err),
            Error::Internal(err) => write!(f, "Harness fault: {}", err),
        }
    }
}
