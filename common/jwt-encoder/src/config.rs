use anyhow::{anyhow, Context, Result};
use jsonwebtoken::Algorithm;
use std::env;

use crate::error::{SetupError, SetupResult};

pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;
/// Upper bound for `token_ttl_seconds`: 100 years.
pub const MAX_TOKEN_TTL_SECONDS: i64 = 100 * 365 * 24 * 3600;

/// Signing and validation settings for [`JsonWebTokenEncoder`](crate::JsonWebTokenEncoder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub algorithm: Algorithm,
    /// Lifetime added as `exp` on encode; `None` issues tokens without expiry.
    pub token_ttl_seconds: Option<i64>,
    /// Accept tokens without an `exp` claim on decode.
    pub allow_no_expiration: bool,
    /// Allowable clock skew in seconds when validating exp/nbf.
    pub clock_skew_seconds: u64,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// `kid` header written on every issued token.
    pub key_id: Option<String>,
}

impl EncoderConfig {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            token_ttl_seconds: Some(DEFAULT_TOKEN_TTL_SECONDS),
            allow_no_expiration: false,
            clock_skew_seconds: 0,
            issuer: None,
            audience: None,
            key_id: None,
        }
    }

    pub fn with_ttl(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = Some(seconds);
        self
    }

    /// Issue and accept tokens without an `exp` claim.
    pub fn without_expiration(mut self) -> Self {
        self.token_ttl_seconds = None;
        self.allow_no_expiration = true;
        self
    }

    pub fn with_clock_skew(mut self, seconds: u64) -> Self {
        self.clock_skew_seconds = seconds;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.key_id = Some(kid.into());
        self
    }

    pub fn validate(&self) -> SetupResult<()> {
        match self.token_ttl_seconds {
            Some(ttl) if ttl <= 0 => Err(SetupError::InvalidConfig(format!(
                "token TTL must be positive, got {ttl}"
            ))),
            Some(ttl) if ttl > MAX_TOKEN_TTL_SECONDS => Err(SetupError::InvalidConfig(format!(
                "token TTL {ttl} exceeds the maximum of {MAX_TOKEN_TTL_SECONDS} seconds"
            ))),
            None if !self.allow_no_expiration => Err(SetupError::InvalidConfig(
                "a token TTL is required unless allow_no_expiration is enabled".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::new(Algorithm::RS256)
    }
}

pub fn load_encoder_config() -> Result<EncoderConfig> {
    load_encoder_config_from(|key| env::var(key).ok())
}

/// Same as [`load_encoder_config`] with an explicit variable lookup.
pub fn load_encoder_config_from<F>(lookup: F) -> Result<EncoderConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let value = |key: &str| lookup(key).and_then(|value| normalize_optional(&value));

    let algorithm = value("JWT_ALGORITHM")
        .map(|raw| {
            raw.parse::<Algorithm>()
                .or_else(|_| raw.to_ascii_uppercase().parse::<Algorithm>())
                .map_err(|err| anyhow!("Unsupported algorithm '{raw}': {err}"))
        })
        .transpose()
        .context("Failed to parse JWT_ALGORITHM")?
        .unwrap_or(Algorithm::RS256);

    let allow_no_expiration = value("JWT_ALLOW_NO_EXPIRATION")
        .map(|raw| parse_bool(&raw))
        .unwrap_or(false);

    let token_ttl_seconds = match value("JWT_TOKEN_TTL") {
        Some(raw) if matches!(raw.to_ascii_lowercase().as_str(), "none" | "never") => None,
        Some(raw) => Some(
            raw.parse::<i64>()
                .with_context(|| format!("Failed to parse JWT_TOKEN_TTL '{raw}'"))?,
        ),
        None => Some(DEFAULT_TOKEN_TTL_SECONDS),
    };

    let clock_skew_seconds = value("JWT_CLOCK_SKEW")
        .map(|raw| raw.parse::<u64>())
        .transpose()
        .context("Failed to parse JWT_CLOCK_SKEW")?
        .unwrap_or(0);

    let config = EncoderConfig {
        algorithm,
        token_ttl_seconds,
        allow_no_expiration,
        clock_skew_seconds,
        issuer: value("JWT_ISSUER"),
        audience: value("JWT_AUDIENCE"),
        key_id: value("JWT_KEY_ID"),
    };
    config.validate()?;
    Ok(config)
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
