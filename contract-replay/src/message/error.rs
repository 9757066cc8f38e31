use hyper::http;
use std::fmt::Display;

#[derive(Debug)]
pub enum Error {
    InvalidPath(String, String),
    InvalidMethod(String),
    InvalidHeaderName(String),
    InvalidHeaderValue(String),
    InvalidStatusCode(i64),
    BodyEncode(serde_json::Error),
    HttpError(http::Error),
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidPath(path, reason) => write!(f, "invalid path '{}': {}", path, reason),
            Error::InvalidMethod(method) => write!(f, "invalid method '{}'", method),
            Error::InvalidHeaderName(name) => write!(f, "invalid header name '{}'", name),
            Error::InvalidHeaderValue(name) => write!(f, "invalid value for header '{}'", name),
            Error::InvalidStatusCode(status) => write!(f, "invalid status code {}", status),
            Error::BodyEncode(e) => write!(f, "failed to marshal body: {}", e),
            Error::HttpError(e) => write!(f, "Http Error: {}", e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::BodyEncode(e)
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::HttpError(e)
    }
}
