use std::sync::{Arc, PoisonError, RwLock};

use jsonwebtoken::DecodingKey;

use crate::error::SetupResult;

/// Thread-safe, ordered store of verification keys indexed by key id.
///
/// Order matters for tokens without a matching `kid`: keys are tried from the
/// first inserted to the last.
#[derive(Clone, Default)]
pub struct KeyStore {
    inner: Arc<RwLock<Vec<(String, DecodingKey)>>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key, replacing any key already stored under `kid`.
    pub fn insert_key(&self, kid: impl Into<String>, key: DecodingKey) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        upsert(&mut guard, kid.into(), key);
    }

    pub fn insert_rsa_pem(&self, kid: impl Into<String>, pem: &[u8]) -> SetupResult<()> {
        let key = DecodingKey::from_rsa_pem(pem)?;
        self.insert_key(kid, key);
        Ok(())
    }

    pub fn get(&self, kid: &str) -> Option<DecodingKey> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .iter()
            .find(|(existing, _)| existing == kid)
            .map(|(_, key)| key.clone())
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.get(kid).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every key in insertion order.
    pub fn keys(&self) -> Vec<(String, DecodingKey)> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps the whole store; a repeated `kid` keeps its first position and
    /// its last key.
    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, DecodingKey)>,
    {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.clear();
        for (kid, key) in entries {
            upsert(&mut guard, kid, key);
        }
    }
}

fn upsert(entries: &mut Vec<(String, DecodingKey)>, kid: String, key: DecodingKey) {
    match entries.iter_mut().find(|(existing, _)| *existing == kid) {
        Some(entry) => entry.1 = key,
        None => entries.push((kid, key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_store_insert_replace_round_trip() {
        let store = KeyStore::new();
        assert!(!store.contains("kid"));
        store.insert_key("kid", DecodingKey::from_secret(b"secret"));
        assert!(store.contains("kid"));
        assert!(store.get("kid").is_some());

        store.replace_all(vec![(
            "another".to_string(),
            DecodingKey::from_secret(b"other"),
        )]);
        assert!(!store.contains("kid"));
        assert!(store.contains("another"));
    }

    #[test]
    fn insert_same_kid_keeps_position() {
        let store = KeyStore::new();
        store.insert_key("a", DecodingKey::from_secret(b"one"));
        store.insert_key("b", DecodingKey::from_secret(b"two"));
        store.insert_key("a", DecodingKey::from_secret(b"three"));

        let kids: Vec<String> = store.keys().into_iter().map(|(kid, _)| kid).collect();
        assert_eq!(kids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn replace_all_collapses_duplicate_kids() {
        let store = KeyStore::new();
        store.replace_all(vec![
            ("a".to_string(), DecodingKey::from_secret(b"old")),
            ("b".to_string(), DecodingKey::from_secret(b"two")),
            ("a".to_string(), DecodingKey::from_secret(b"new")),
        ]);

        let kids: Vec<String> = store.keys().into_iter().map(|(kid, _)| kid).collect();
        assert_eq!(kids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn insert_rsa_pem_rejects_garbage() {
        let store = KeyStore::new();
        assert!(store.insert_rsa_pem("kid", b"not a pem").is_err());
        assert!(store.is_empty());
    }
}
