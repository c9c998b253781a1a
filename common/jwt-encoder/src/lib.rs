//! [`JwtEncoder`](common_jwt::JwtEncoder) implementation backed by the
//! `jsonwebtoken` crate.

pub mod config;
pub mod encoder;
pub mod error;
pub mod keys;

pub use config::{load_encoder_config, load_encoder_config_from, EncoderConfig};
pub use encoder::{JsonWebTokenEncoder, JsonWebTokenEncoderBuilder};
pub use error::{SetupError, SetupResult};
pub use keys::KeyStore;
