#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use common_jwt::{
    DecodeError, DecodeResult, EncodeError, EncodeResult, EventDispatcher, Header, InMemoryUser,
    JwtEncoder, JwtEvent, JwtManager, ManagerConfig, Payload,
};
use serde_json::{json, Value};

/// Encoder double that records every call and replays canned results.
#[derive(Default)]
pub struct RecordingEncoder {
    pub encoded: Mutex<Vec<(Payload, Header)>>,
    pub decoded: Mutex<Vec<String>>,
    token: String,
    claims: Payload,
    fail_encode: bool,
    fail_decode: bool,
}

impl RecordingEncoder {
    pub fn returning(token: &str, claims: Payload) -> Self {
        Self {
            token: token.to_string(),
            claims,
            ..Self::default()
        }
    }

    pub fn failing_encode() -> Self {
        Self {
            fail_encode: true,
            ..Self::default()
        }
    }

    pub fn failing_decode() -> Self {
        Self {
            fail_decode: true,
            ..Self::default()
        }
    }

    pub fn encode_calls(&self) -> usize {
        self.encoded.lock().expect("lock").len()
    }

    pub fn decode_calls(&self) -> usize {
        self.decoded.lock().expect("lock").len()
    }

    pub fn last_encoded(&self) -> Payload {
        self.encoded
            .lock()
            .expect("lock")
            .last()
            .map(|(payload, _)| payload.clone())
            .expect("encode was called")
    }

    pub fn last_header(&self) -> Header {
        self.encoded
            .lock()
            .expect("lock")
            .last()
            .map(|(_, header)| header.clone())
            .expect("encode was called")
    }
}

impl JwtEncoder for RecordingEncoder {
    fn encode(&self, payload: &Payload) -> EncodeResult<String> {
        self.encode_with_header(payload, &Header::new())
    }

    fn encode_with_header(&self, payload: &Payload, header: &Header) -> EncodeResult<String> {
        self.encoded
            .lock()
            .expect("lock")
            .push((payload.clone(), header.clone()));
        if self.fail_encode {
            return Err(EncodeError::Unsigned("signing key unavailable".into()));
        }
        Ok(self.token.clone())
    }

    fn decode(&self, token: &str) -> DecodeResult<Payload> {
        self.decoded.lock().expect("lock").push(token.to_string());
        if self.fail_decode {
            return Err(DecodeError::Unverified("signature mismatch".into()));
        }
        Ok(self.claims.clone())
    }
}

type Hook = Box<dyn Fn(&mut JwtEvent<'_, '_>) + Send + Sync>;

/// Dispatcher double recording `(dispatched name, event kind)` pairs.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub dispatched: Mutex<Vec<(String, &'static str)>>,
    hook: Option<Hook>,
}

impl RecordingDispatcher {
    pub fn with_hook<F>(hook: F) -> Self
    where
        F: Fn(&mut JwtEvent<'_, '_>) + Send + Sync + 'static,
    {
        Self {
            dispatched: Mutex::default(),
            hook: Some(Box::new(hook)),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.dispatched
            .lock()
            .expect("lock")
            .iter()
            .map(|(name, kind)| {
                assert_eq!(name.as_str(), *kind, "event dispatched under a foreign name");
                name.clone()
            })
            .collect()
    }
}

impl EventDispatcher for RecordingDispatcher {
    fn dispatch(&self, event: &mut JwtEvent<'_, '_>, name: &str) {
        self.dispatched
            .lock()
            .expect("lock")
            .push((name.to_string(), event.name()));
        if let Some(hook) = &self.hook {
            hook(event);
        }
    }
}

pub fn user() -> InMemoryUser {
    InMemoryUser::new("user")
}

pub fn foo_bar() -> Payload {
    payload(json!({ "foo": "bar" }))
}

pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn manager(
    encoder: &Arc<RecordingEncoder>,
    dispatcher: &Arc<RecordingDispatcher>,
) -> JwtManager {
    JwtManager::new(
        encoder.clone(),
        dispatcher.clone(),
        ManagerConfig::new("username"),
    )
}
