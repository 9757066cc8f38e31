use std::fmt::Display;

#[derive(Debug)]
pub enum Error {
    Yaml(serde_yaml::Error),
    NotAMapping,
    MissingVersion,
    UnsupportedVersion(String),
    InvalidPaths,
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Yaml(e) => write!(f, "document is neither YAML nor JSON: {}", e),
            Error::NotAMapping => write!(f, "document root is not a mapping"),
            Error::MissingVersion => write!(f, "document has no 'openapi' version string"),
            Error::UnsupportedVersion(version) => {
                write!(f, "unsupported OpenAPI version '{}', expected 3.0 or 3.1", version)
            }
            Error::InvalidPaths => write!(f, "'paths' is not a mapping"),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Yaml(e)
    }
}
