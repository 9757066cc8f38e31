use crate::contract;
use std::{fmt::Display, io, path::PathBuf};

/// Errors that stop a replay before any entry is classified.
#[derive(Debug)]
pub enum Error {
    ReadContract(PathBuf, io::Error),
    ParseContract(contract::error::Error),
    BuildValidator(String),
    ReadTranscript(PathBuf, io::Error),
    DecodeTranscript(serde_json::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadContract(_, e) | Error::ReadTranscript(_, e) => Some(e),
            Error::ParseContract(e) => Some(e),
            Error::DecodeTranscript(e) => Some(e),
            Error::BuildValidator(_) => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ReadContract(path, e) => write!(
                f,
                "Failed to read OpenAPI spec from '{}': {}",
                path.display(),
                e
            ),
            Error::ParseContract(e) => write!(f, "Failed to load OpenAPI spec: {}", e),
            Error::BuildValidator(e) => write!(f, "Failed to build validator: {}", e),
            Error::ReadTranscript(path, e) => write!(
                f,
                "Failed to read requests file '{}': {}",
                path.display(),
                e
            ),
            Error::DecodeTranscript(e) => write!(f, "Failed to parse requests file: {}", e),
        }
    }
}

impl From<contract::error::Error> for Error {
    fn from(e: contract::error::Error) -> Self {
        Error::ParseContract(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::DecodeTranscript(e)
    }
}
