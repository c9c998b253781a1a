use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::identity::Identity;
use crate::Payload;

/// Adds or overwrites claims before a token is signed.
pub trait PayloadEnrichment: Send + Sync {
    fn enrich(&self, identity: &dyn Identity, payload: &mut Payload);
}

/// Adapter turning a function value into an enrichment.
pub struct FnEnrichment<F> {
    f: F,
}

pub fn enrich_fn<F>(f: F) -> FnEnrichment<F>
where
    F: Fn(&dyn Identity, &mut Payload) + Send + Sync,
{
    FnEnrichment { f }
}

impl<F> PayloadEnrichment for FnEnrichment<F>
where
    F: Fn(&dyn Identity, &mut Payload) + Send + Sync,
{
    fn enrich(&self, identity: &dyn Identity, payload: &mut Payload) {
        (self.f)(identity, payload)
    }
}

/// Runs several enrichments, in insertion order, as a single hook.
#[derive(Clone, Default)]
pub struct ChainEnrichment {
    enrichments: Vec<Arc<dyn PayloadEnrichment>>,
}

impl ChainEnrichment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, enrichment: impl PayloadEnrichment + 'static) -> Self {
        self.enrichments.push(Arc::new(enrichment));
        self
    }

    pub fn len(&self) -> usize {
        self.enrichments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enrichments.is_empty()
    }
}

impl PayloadEnrichment for ChainEnrichment {
    fn enrich(&self, identity: &dyn Identity, payload: &mut Payload) {
        for enrichment in &self.enrichments {
            enrichment.enrich(identity, payload);
        }
    }
}

/// Gives every token a unique `jti` claim.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJtiEnrichment;

impl PayloadEnrichment for RandomJtiEnrichment {
    fn enrich(&self, _identity: &dyn Identity, payload: &mut Payload) {
        payload
            .entry("jti")
            .or_insert_with(|| Value::String(Uuid::new_v4().simple().to_string()));
    }
}
