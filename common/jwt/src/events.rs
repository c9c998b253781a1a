//! Lifecycle events published by [`JwtManager`](crate::JwtManager).

use crate::identity::Identity;
use crate::{Header, Payload};

/// Published after the payload is built and before it is encoded.
pub const JWT_CREATED: &str = "lexik_jwt_authentication.on_jwt_created";
/// Published after the payload was encoded into a token.
pub const JWT_ENCODED: &str = "lexik_jwt_authentication.on_jwt_encoded";
/// Published after a token was decoded into a payload.
pub const JWT_DECODED: &str = "lexik_jwt_authentication.on_jwt_decoded";

/// Last chance to change the claims (and header) before signing.
pub struct JwtCreatedEvent<'a> {
    payload: Payload,
    header: Header,
    identity: &'a dyn Identity,
}

impl<'a> JwtCreatedEvent<'a> {
    pub fn new(payload: Payload, identity: &'a dyn Identity) -> Self {
        Self {
            payload,
            header: Header::new(),
            identity,
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    pub fn set_payload(&mut self, payload: Payload) {
        self.payload = payload;
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    pub fn identity(&self) -> &dyn Identity {
        self.identity
    }

    pub fn into_parts(self) -> (Payload, Header) {
        (self.payload, self.header)
    }
}

/// Carries the signed token; listeners may replace it.
#[derive(Debug, Clone)]
pub struct JwtEncodedEvent {
    token: String,
    payload: Payload,
}

impl JwtEncodedEvent {
    pub fn new(token: String, payload: Payload) -> Self {
        Self { token, payload }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_token(self) -> String {
        self.token
    }
}

/// Carries a freshly decoded payload; listeners may change or reject it.
#[derive(Debug, Clone)]
pub struct JwtDecodedEvent {
    payload: Payload,
    token: String,
    valid: bool,
}

impl JwtDecodedEvent {
    pub fn new(payload: Payload, token: impl Into<String>) -> Self {
        Self {
            payload,
            token: token.into(),
            valid: true,
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    pub fn set_payload(&mut self, payload: Payload) {
        self.payload = payload;
    }

    /// Raw token the payload was decoded from.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn mark_as_invalid(&mut self) {
        self.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

/// Mutable view over whichever event is being dispatched.
pub enum JwtEvent<'e, 'a> {
    Created(&'e mut JwtCreatedEvent<'a>),
    Encoded(&'e mut JwtEncodedEvent),
    Decoded(&'e mut JwtDecodedEvent),
}

impl JwtEvent<'_, '_> {
    pub fn name(&self) -> &'static str {
        match self {
            JwtEvent::Created(_) => JWT_CREATED,
            JwtEvent::Encoded(_) => JWT_ENCODED,
            JwtEvent::Decoded(_) => JWT_DECODED,
        }
    }
}
