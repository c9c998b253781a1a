pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod encoder;
pub mod enrichment;
pub mod error;
pub mod events;
pub mod identity;
pub mod manager;

use serde_json::{Map, Value};

/// Claims carried by a token, keyed by claim name.
pub type Payload = Map<String, Value>;

/// JOSE header parameters a Created listener may add before signing.
pub type Header = Map<String, Value>;

pub use config::{load_manager_config, load_manager_config_from, ManagerConfig, MergePolicy};
pub use credentials::{AnonymousToken, AuthenticatedToken, BearerToken, CredentialHolder, Credentials};
pub use dispatcher::{EventDispatcher, ListenerDispatcher};
pub use encoder::JwtEncoder;
pub use enrichment::{enrich_fn, ChainEnrichment, FnEnrichment, PayloadEnrichment, RandomJtiEnrichment};
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use events::{
    JwtCreatedEvent, JwtDecodedEvent, JwtEncodedEvent, JwtEvent, JWT_CREATED, JWT_DECODED,
    JWT_ENCODED,
};
pub use identity::{Identity, InMemoryUser};
pub use manager::JwtManager;
