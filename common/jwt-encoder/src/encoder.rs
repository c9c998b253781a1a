use std::env;

use anyhow::{anyhow, Context};
use chrono::Utc;
use common_jwt::{DecodeError, DecodeResult, EncodeError, EncodeResult, Header, JwtEncoder, Payload};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header as JoseHeader, Validation};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{load_encoder_config_from, EncoderConfig};
use crate::error::{SetupError, SetupResult};
use crate::keys::KeyStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    fn of(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => KeyFamily::Hmac,
            Algorithm::ES256 | Algorithm::ES384 => KeyFamily::Ec,
            Algorithm::EdDSA => KeyFamily::Ed,
            _ => KeyFamily::Rsa,
        }
    }
}

/// Signs and verifies tokens with `jsonwebtoken`.
///
/// On encode the registered claims `iat`, `exp`, `iss` and `aud` are added
/// when configured and not already present; every other claim is passed
/// through untouched.
#[derive(Clone)]
pub struct JsonWebTokenEncoder {
    config: EncoderConfig,
    signing_key: EncodingKey,
    verification_key: DecodingKey,
    additional_keys: KeyStore,
}

impl JsonWebTokenEncoder {
    pub fn builder(config: EncoderConfig) -> JsonWebTokenEncoderBuilder {
        JsonWebTokenEncoderBuilder::new(config)
    }

    /// Loads configuration and key material from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`. Key material comes from `JWT_SECRET`
    /// for HMAC algorithms and from `JWT_PRIVATE_KEY_PEM` /
    /// `JWT_PUBLIC_KEY_PEM` otherwise.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = load_encoder_config_from(&lookup)?;
        let algorithm = config.algorithm;
        let family = KeyFamily::of(algorithm);
        let builder = Self::builder(config);

        let builder = if family == KeyFamily::Hmac {
            let secret = lookup("JWT_SECRET")
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("JWT_SECRET is required for {algorithm:?}"))?;
            builder.with_secret(secret.as_bytes())
        } else {
            let private_pem = pem_from(&lookup, "JWT_PRIVATE_KEY_PEM")?;
            let public_pem = pem_from(&lookup, "JWT_PUBLIC_KEY_PEM")?;
            let loaded = match family {
                KeyFamily::Ec => builder.with_ec_pem(&private_pem, &public_pem),
                KeyFamily::Ed => builder.with_ed_pem(&private_pem, &public_pem),
                _ => builder.with_rsa_pem(&private_pem, &public_pem),
            };
            loaded.context("Failed to load JWT key pair")?
        };

        Ok(builder.build()?)
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn additional_keys(&self) -> &KeyStore {
        &self.additional_keys
    }

    fn registered_claims(&self, payload: &Payload) -> EncodeResult<Payload> {
        let mut claims = payload.clone();
        let now = Utc::now().timestamp();
        claims.entry("iat").or_insert_with(|| Value::from(now));
        if let Some(ttl) = self.config.token_ttl_seconds {
            if !claims.contains_key("exp") {
                let exp = now.checked_add(ttl).ok_or_else(|| {
                    EncodeError::InvalidConfig(format!("token TTL {ttl} overflows exp"))
                })?;
                claims.insert("exp".into(), Value::from(exp));
            }
        }
        if let Some(issuer) = &self.config.issuer {
            claims
                .entry("iss")
                .or_insert_with(|| Value::String(issuer.clone()));
        }
        if let Some(audience) = &self.config.audience {
            claims
                .entry("aud")
                .or_insert_with(|| Value::String(audience.clone()));
        }
        Ok(claims)
    }

    fn jose_header(&self, header: &Header) -> EncodeResult<JoseHeader> {
        let mut jose = JoseHeader::new(self.config.algorithm);
        jose.kid = self.config.key_id.clone();

        for (name, value) in header {
            let text = || {
                value.as_str().map(str::to_string).ok_or_else(|| {
                    EncodeError::InvalidConfig(format!(
                        "header parameter '{name}' must be a string"
                    ))
                })
            };
            match name.as_str() {
                "alg" => {
                    let requested = text()?;
                    if requested.parse::<Algorithm>().ok() != Some(self.config.algorithm) {
                        return Err(EncodeError::InvalidConfig(format!(
                            "header algorithm '{requested}' does not match configured {:?}",
                            self.config.algorithm
                        )));
                    }
                }
                "typ" => jose.typ = Some(text()?),
                "cty" => jose.cty = Some(text()?),
                "kid" => jose.kid = Some(text()?),
                "jku" => jose.jku = Some(text()?),
                "x5u" => jose.x5u = Some(text()?),
                "x5t" => jose.x5t = Some(text()?),
                other => warn!(parameter = other, "skipping unsupported JWT header parameter"),
            }
        }

        Ok(jose)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.config.algorithm);
        validation.leeway = self.config.clock_skew_seconds;
        if self.config.allow_no_expiration {
            validation.required_spec_claims.remove("exp");
        }
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        validation
    }

    fn verify_with(
        &self,
        token: &str,
        key: &DecodingKey,
        validation: &Validation,
    ) -> DecodeResult<Payload> {
        jsonwebtoken::decode::<Payload>(token, key, validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }
}

impl JwtEncoder for JsonWebTokenEncoder {
    fn encode(&self, payload: &Payload) -> EncodeResult<String> {
        self.encode_with_header(payload, &Header::new())
    }

    fn encode_with_header(&self, payload: &Payload, header: &Header) -> EncodeResult<String> {
        let jose = self.jose_header(header)?;
        let claims = self.registered_claims(payload)?;
        let token = jsonwebtoken::encode(&jose, &claims, &self.signing_key)
            .map_err(|err| EncodeError::Unsigned(err.to_string()))?;
        debug!(kid = ?jose.kid, alg = ?jose.alg, "signed JWT");
        Ok(token)
    }

    fn decode(&self, token: &str) -> DecodeResult<Payload> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|err| DecodeError::Invalid(err.to_string()))?;
        let validation = self.validation();

        if let Some(kid) = header.kid.as_deref() {
            if let Some(key) = self.additional_keys.get(kid) {
                debug!(kid, "verifying JWT with additional key");
                return self.verify_with(token, &key, &validation);
            }
            if self.config.key_id.as_deref() == Some(kid) {
                return self.verify_with(token, &self.verification_key, &validation);
            }
        }

        let mut last_failure = None;
        let candidates = std::iter::once(self.verification_key.clone()).chain(
            self.additional_keys
                .keys()
                .into_iter()
                .map(|(_, key)| key),
        );
        for key in candidates {
            match self.verify_with(token, &key, &validation) {
                Ok(payload) => return Ok(payload),
                Err(DecodeError::Unverified(reason)) => last_failure = Some(reason),
                Err(other) => return Err(other),
            }
        }

        Err(DecodeError::Unverified(
            last_failure.unwrap_or_else(|| "no verification key available".to_string()),
        ))
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> DecodeError {
    match err.kind() {
        ErrorKind::ExpiredSignature => DecodeError::Expired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidRsaKey(_) => DecodeError::Unverified(err.to_string()),
        _ => DecodeError::Invalid(err.to_string()),
    }
}

fn pem_from<F>(lookup: &F, key: &str) -> anyhow::Result<Vec<u8>>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("{key} is required"))?;
    // Single-line env values carry escaped newlines.
    Ok(value.replace("\\n", "\n").into_bytes())
}

pub struct JsonWebTokenEncoderBuilder {
    config: EncoderConfig,
    keys: Option<(EncodingKey, DecodingKey, Option<KeyFamily>)>,
    additional_keys: KeyStore,
}

impl JsonWebTokenEncoderBuilder {
    fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            keys: None,
            additional_keys: KeyStore::new(),
        }
    }

    pub fn with_secret(mut self, secret: &[u8]) -> Self {
        self.keys = Some((
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
            Some(KeyFamily::Hmac),
        ));
        self
    }

    pub fn with_rsa_pem(mut self, private_pem: &[u8], public_pem: &[u8]) -> SetupResult<Self> {
        self.keys = Some((
            EncodingKey::from_rsa_pem(private_pem)?,
            DecodingKey::from_rsa_pem(public_pem)?,
            Some(KeyFamily::Rsa),
        ));
        Ok(self)
    }

    pub fn with_ec_pem(mut self, private_pem: &[u8], public_pem: &[u8]) -> SetupResult<Self> {
        self.keys = Some((
            EncodingKey::from_ec_pem(private_pem)?,
            DecodingKey::from_ec_pem(public_pem)?,
            Some(KeyFamily::Ec),
        ));
        Ok(self)
    }

    pub fn with_ed_pem(mut self, private_pem: &[u8], public_pem: &[u8]) -> SetupResult<Self> {
        self.keys = Some((
            EncodingKey::from_ed_pem(private_pem)?,
            DecodingKey::from_ed_pem(public_pem)?,
            Some(KeyFamily::Ed),
        ));
        Ok(self)
    }

    /// Uses pre-built keys; their family is not checked against the algorithm.
    pub fn with_keys(mut self, signing: EncodingKey, verification: DecodingKey) -> Self {
        self.keys = Some((signing, verification, None));
        self
    }

    /// Accepts tokens signed by another key, e.g. during key rotation.
    pub fn with_verification_key(self, kid: impl Into<String>, key: DecodingKey) -> Self {
        self.additional_keys.insert_key(kid, key);
        self
    }

    pub fn with_key_store(mut self, store: KeyStore) -> Self {
        self.additional_keys = store;
        self
    }

    pub fn build(self) -> SetupResult<JsonWebTokenEncoder> {
        self.config.validate()?;
        let (signing_key, verification_key, family) =
            self.keys.ok_or(SetupError::MissingKey("signing"))?;

        let expected = KeyFamily::of(self.config.algorithm);
        if let Some(family) = family {
            if family != expected {
                return Err(SetupError::InvalidConfig(format!(
                    "{:?} keys cannot be used with {:?}",
                    family, self.config.algorithm
                )));
            }
        }

        debug!(
            alg = ?self.config.algorithm,
            additional_keys = self.additional_keys.len(),
            "built JWT encoder"
        );
        Ok(JsonWebTokenEncoder {
            config: self.config,
            signing_key,
            verification_key,
            additional_keys: self.additional_keys,
        })
    }
}
