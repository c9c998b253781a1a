//! Token holders that may or may not carry a raw JWT.
//!
//! Decoding distinguishes three situations: the holder has no notion of
//! credentials at all, it has one but nothing is set, or it carries a raw
//! token string. Only the last one reaches the encoder.

use crate::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials<'a> {
    /// The holder does not expose credentials.
    Unsupported,
    /// The holder exposes credentials but none are set.
    Absent,
    /// Raw token string.
    Present(&'a str),
}

pub trait CredentialHolder {
    fn credentials(&self) -> Credentials<'_>;

    fn has_credentials(&self) -> bool {
        !matches!(self.credentials(), Credentials::Unsupported)
    }

    /// The raw token, if one is set and non-empty.
    fn raw_token(&self) -> Option<&str> {
        match self.credentials() {
            Credentials::Present(token) if !token.is_empty() => Some(token),
            _ => None,
        }
    }
}

/// Holder for unauthenticated contexts; never carries a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousToken;

impl CredentialHolder for AnonymousToken {
    fn credentials(&self) -> Credentials<'_> {
        Credentials::Unsupported
    }
}

/// Holder for a bearer credential that may not have been supplied yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerToken {
    credentials: Option<String>,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            credentials: Some(token.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn erase_credentials(&mut self) {
        self.credentials = None;
    }
}

impl CredentialHolder for BearerToken {
    fn credentials(&self) -> Credentials<'_> {
        match self.credentials.as_deref() {
            Some(token) if !token.is_empty() => Credentials::Present(token),
            _ => Credentials::Absent,
        }
    }
}

/// Holder produced after a token was verified for a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedToken {
    identifier: String,
    roles: Vec<String>,
    token: String,
}

impl AuthenticatedToken {
    pub fn new(identity: &dyn Identity, token: impl Into<String>) -> Self {
        Self {
            identifier: identity.identifier().to_string(),
            roles: identity.roles(),
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Identity for AuthenticatedToken {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn roles(&self) -> Vec<String> {
        self.roles.clone()
    }
}

impl CredentialHolder for AuthenticatedToken {
    fn credentials(&self) -> Credentials<'_> {
        if self.token.is_empty() {
            Credentials::Absent
        } else {
            Credentials::Present(&self.token)
        }
    }
}
