use tracing::debug;

use crate::events::{
    JwtCreatedEvent, JwtDecodedEvent, JwtEncodedEvent, JwtEvent, JWT_CREATED, JWT_DECODED,
    JWT_ENCODED,
};

/// Synchronous delivery of lifecycle events.
///
/// Implementations must hand the same event to every listener in turn so that
/// later listeners observe earlier mutations, and return only once the last
/// listener has run.
pub trait EventDispatcher: Send + Sync {
    fn dispatch(&self, event: &mut JwtEvent<'_, '_>, name: &str);
}

type Listener = Box<dyn Fn(&mut JwtEvent<'_, '_>) + Send + Sync>;

struct RegisteredListener {
    name: String,
    callback: Listener,
}

/// In-process dispatcher keeping listeners in registration order.
#[derive(Default)]
pub struct ListenerDispatcher {
    listeners: Vec<RegisteredListener>,
}

impl ListenerDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener<F>(mut self, name: impl Into<String>, listener: F) -> Self
    where
        F: Fn(&mut JwtEvent<'_, '_>) + Send + Sync + 'static,
    {
        self.listeners.push(RegisteredListener {
            name: name.into(),
            callback: Box::new(listener),
        });
        self
    }

    pub fn on_created<F>(self, listener: F) -> Self
    where
        F: Fn(&mut JwtCreatedEvent<'_>) + Send + Sync + 'static,
    {
        self.with_listener(JWT_CREATED, move |event| {
            if let JwtEvent::Created(created) = event {
                listener(&mut **created);
            }
        })
    }

    pub fn on_encoded<F>(self, listener: F) -> Self
    where
        F: Fn(&mut JwtEncodedEvent) + Send + Sync + 'static,
    {
        self.with_listener(JWT_ENCODED, move |event| {
            if let JwtEvent::Encoded(encoded) = event {
                listener(&mut **encoded);
            }
        })
    }

    pub fn on_decoded<F>(self, listener: F) -> Self
    where
        F: Fn(&mut JwtDecodedEvent) + Send + Sync + 'static,
    {
        self.with_listener(JWT_DECODED, move |event| {
            if let JwtEvent::Decoded(decoded) = event {
                listener(&mut **decoded);
            }
        })
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners
            .iter()
            .filter(|listener| listener.name == name)
            .count()
    }
}

impl EventDispatcher for ListenerDispatcher {
    fn dispatch(&self, event: &mut JwtEvent<'_, '_>, name: &str) {
        let listeners = self.listener_count(name);
        debug!(event = name, listeners, "dispatching JWT event");
        for listener in self.listeners.iter().filter(|listener| listener.name == name) {
            (listener.callback)(&mut *event);
        }
    }
}
