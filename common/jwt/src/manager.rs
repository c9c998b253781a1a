use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ManagerConfig, MergePolicy};
use crate::credentials::{CredentialHolder, Credentials};
use crate::dispatcher::EventDispatcher;
use crate::encoder::JwtEncoder;
use crate::enrichment::PayloadEnrichment;
use crate::error::{DecodeError, DecodeResult, EncodeResult};
use crate::events::{
    JwtCreatedEvent, JwtDecodedEvent, JwtEncodedEvent, JwtEvent, JWT_CREATED, JWT_DECODED,
    JWT_ENCODED,
};
use crate::identity::Identity;
use crate::Payload;

/// Issues and reads tokens by sequencing payload construction, enrichment,
/// lifecycle events and the encoder.
///
/// The manager holds configuration only; every call builds its own payload
/// and events, so one instance can be shared across threads.
#[derive(Clone)]
pub struct JwtManager {
    encoder: Arc<dyn JwtEncoder>,
    dispatcher: Arc<dyn EventDispatcher>,
    config: ManagerConfig,
    enrichment: Option<Arc<dyn PayloadEnrichment>>,
}

impl JwtManager {
    pub fn new(
        encoder: Arc<dyn JwtEncoder>,
        dispatcher: Arc<dyn EventDispatcher>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            encoder,
            dispatcher,
            config,
            enrichment: None,
        }
    }

    pub fn with_enrichment(mut self, enrichment: impl PayloadEnrichment + 'static) -> Self {
        self.enrichment = Some(Arc::new(enrichment));
        self
    }

    pub fn with_shared_enrichment(mut self, enrichment: Arc<dyn PayloadEnrichment>) -> Self {
        self.enrichment = Some(enrichment);
        self
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn identity_field(&self) -> &str {
        &self.config.identity_field
    }

    /// Issues a token whose claims are derived from `identity`.
    pub fn create(&self, identity: &dyn Identity) -> EncodeResult<String> {
        let payload = self.identity_claims(identity);
        self.issue(identity, payload)
    }

    /// Issues a token carrying `payload` in addition to the identity claims.
    /// Which side wins on conflicting keys follows the configured
    /// [`MergePolicy`].
    pub fn create_from_payload(
        &self,
        identity: &dyn Identity,
        payload: Payload,
    ) -> EncodeResult<String> {
        let base = self.identity_claims(identity);
        let merged = match self.config.merge_policy {
            MergePolicy::SuppliedWins => {
                let mut merged = base;
                merged.extend(payload);
                merged
            }
            MergePolicy::IdentityWins => {
                let mut merged = payload;
                merged.extend(base);
                merged
            }
        };
        self.issue(identity, merged)
    }

    /// Decodes the token carried by `holder`.
    ///
    /// Returns `Ok(None)` without touching the encoder when the holder has no
    /// credentials or none are set. A payload rejected by a Decoded listener is
    /// reported as [`DecodeError::InvalidatedByListener`], not as `Ok(None)`.
    pub fn decode(&self, holder: &dyn CredentialHolder) -> DecodeResult<Option<Payload>> {
        let token = match holder.credentials() {
            Credentials::Present(token) if !token.is_empty() => token,
            Credentials::Present(_) | Credentials::Absent => {
                debug!("token holder carries no credentials; nothing to decode");
                return Ok(None);
            }
            Credentials::Unsupported => {
                debug!("token holder does not support credentials; nothing to decode");
                return Ok(None);
            }
        };
        self.read(token).map(Some)
    }

    /// Decodes a raw token string.
    pub fn parse(&self, token: &str) -> DecodeResult<Payload> {
        self.read(token)
    }

    fn identity_claims(&self, identity: &dyn Identity) -> Payload {
        let mut payload = Payload::new();
        if let Some(claim) = &self.config.roles_claim {
            let roles = identity.roles().into_iter().map(Value::String).collect();
            payload.insert(claim.clone(), Value::Array(roles));
        }
        payload.insert(
            self.config.identity_field.clone(),
            Value::String(identity.identifier().to_string()),
        );
        payload
    }

    fn issue(&self, identity: &dyn Identity, mut payload: Payload) -> EncodeResult<String> {
        if let Some(enrichment) = &self.enrichment {
            enrichment.enrich(identity, &mut payload);
        }

        let mut created = JwtCreatedEvent::new(payload, identity);
        self.dispatcher
            .dispatch(&mut JwtEvent::Created(&mut created), JWT_CREATED);
        let (payload, header) = created.into_parts();

        let token = self.encoder.encode_with_header(&payload, &header)?;

        let mut encoded = JwtEncodedEvent::new(token, payload);
        self.dispatcher
            .dispatch(&mut JwtEvent::Encoded(&mut encoded), JWT_ENCODED);

        debug!(identity = identity.identifier(), "issued JWT");
        Ok(encoded.into_token())
    }

    fn read(&self, token: &str) -> DecodeResult<Payload> {
        let payload = self.encoder.decode(token)?;

        let mut decoded = JwtDecodedEvent::new(payload, token);
        self.dispatcher
            .dispatch(&mut JwtEvent::Decoded(&mut decoded), JWT_DECODED);

        if !decoded.is_valid() {
            warn!("decoded JWT rejected by listener");
            return Err(DecodeError::InvalidatedByListener);
        }

        debug!("decoded JWT successfully");
        Ok(decoded.into_payload())
    }
}
