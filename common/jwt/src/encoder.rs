use crate::error::{DecodeResult, EncodeResult};
use crate::{Header, Payload};

/// Converts claims to a signed token and back.
///
/// Key management and the signature algorithm live behind this trait; the
/// manager only sequences calls to it.
pub trait JwtEncoder: Send + Sync {
    fn encode(&self, payload: &Payload) -> EncodeResult<String>;

    /// Encodes with extra JOSE header parameters. Encoders that do not support
    /// custom headers ignore them.
    fn encode_with_header(&self, payload: &Payload, header: &Header) -> EncodeResult<String> {
        let _ = header;
        self.encode(payload)
    }

    fn decode(&self, token: &str) -> DecodeResult<Payload>;
}
