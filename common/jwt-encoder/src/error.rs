use thiserror::Error;

pub type SetupResult<T> = Result<T, SetupError>;

/// Raised while assembling an encoder, never while encoding or decoding.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no {0} key configured")]
    MissingKey(&'static str),
    #[error("failed to parse key: {0}")]
    KeyParse(String),
    #[error("invalid encoder configuration: {0}")]
    InvalidConfig(String),
}

impl From<jsonwebtoken::errors::Error> for SetupError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::KeyParse(value.to_string())
    }
}
