use thiserror::Error;

pub type EncodeResult<T> = Result<T, EncodeError>;
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Failure while turning a payload into a signed token.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("invalid signing configuration: {0}")]
    InvalidConfig(String),
    #[error("unable to sign token: {0}")]
    Unsigned(String),
}

impl EncodeError {
    pub fn reason(&self) -> &'static str {
        match self {
            EncodeError::InvalidConfig(_) => "invalid_config",
            EncodeError::Unsigned(_) => "unsigned_token",
        }
    }
}

/// Failure while recovering a payload from a token.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("unable to verify token signature: {0}")]
    Unverified(String),
    #[error("token has expired")]
    Expired,
    #[error("token was marked as invalid by a listener after successful decoding")]
    InvalidatedByListener,
}

impl DecodeError {
    pub fn reason(&self) -> &'static str {
        match self {
            DecodeError::Invalid(_) => "invalid_token",
            DecodeError::Unverified(_) => "unverified_token",
            DecodeError::Expired => "expired_token",
            DecodeError::InvalidatedByListener => "invalidated_token",
        }
    }
}
