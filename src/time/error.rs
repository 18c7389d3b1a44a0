use std::fmt;

/// An error that occurred while parsing a human readable duration.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    Syntax(String),
    UnitNotSupported(String),
    Overflow(String),
}

impl ::std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Syntax(ref value) => write!(f, "'{}' is not a duration, expected e.g. 500ms, 10s, 1m", value),
            Error::UnitNotSupported(ref unit) => write!(f, "Unit '{}' not supported", unit),
            Error::Overflow(ref value) => write!(f, "Duration '{}' is too large", value),
        }
    }
}
