use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// How caller-supplied claims combine with identity-derived ones in
/// [`JwtManager::create_from_payload`](crate::JwtManager::create_from_payload).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Caller-supplied claims overwrite identity-derived claims.
    #[default]
    SuppliedWins,
    /// Identity-derived claims overwrite caller-supplied claims.
    IdentityWins,
}

impl std::str::FromStr for MergePolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "supplied_wins" | "supplied" => Ok(MergePolicy::SuppliedWins),
            "identity_wins" | "identity" => Ok(MergePolicy::IdentityWins),
            other => Err(anyhow!(
                "Unsupported merge policy '{other}'. Use supplied_wins or identity_wins."
            )),
        }
    }
}

/// Runtime configuration for token issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Claim key receiving the identity's identifier.
    pub identity_field: String,
    /// Claim key receiving the identity's roles, if any.
    #[serde(default)]
    pub roles_claim: Option<String>,
    #[serde(default)]
    pub merge_policy: MergePolicy,
}

impl ManagerConfig {
    pub fn new(identity_field: impl Into<String>) -> Self {
        Self {
            identity_field: identity_field.into(),
            roles_claim: None,
            merge_policy: MergePolicy::default(),
        }
    }

    pub fn with_roles_claim(mut self, claim: impl Into<String>) -> Self {
        self.roles_claim = Some(claim.into());
        self
    }

    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_FIELD)
    }
}

pub const DEFAULT_IDENTITY_FIELD: &str = "username";

pub fn load_manager_config() -> Result<ManagerConfig> {
    load_manager_config_from(|key| env::var(key).ok())
}

/// Same as [`load_manager_config`] with an explicit variable lookup.
pub fn load_manager_config_from<F>(lookup: F) -> Result<ManagerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let identity_field = lookup("JWT_IDENTITY_FIELD")
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| DEFAULT_IDENTITY_FIELD.to_string());

    let roles_claim = lookup("JWT_ROLES_CLAIM").and_then(|value| normalize_optional(&value));

    let merge_policy = lookup("JWT_MERGE_POLICY")
        .and_then(|value| normalize_optional(&value))
        .map(|value| value.parse::<MergePolicy>())
        .transpose()
        .context("Failed to parse JWT_MERGE_POLICY")?
        .unwrap_or_default();

    Ok(ManagerConfig {
        identity_field,
        roles_claim,
        merge_policy,
    })
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load_manager_config_from(lookup(&[])).expect("config");
        assert_eq!(config, ManagerConfig::new("username"));
        assert_eq!(config.merge_policy, MergePolicy::SuppliedWins);
    }

    #[test]
    fn reads_all_variables() {
        let config = load_manager_config_from(lookup(&[
            ("JWT_IDENTITY_FIELD", " email "),
            ("JWT_ROLES_CLAIM", "roles"),
            ("JWT_MERGE_POLICY", "Identity-Wins"),
        ]))
        .expect("config");

        assert_eq!(config.identity_field, "email");
        assert_eq!(config.roles_claim.as_deref(), Some("roles"));
        assert_eq!(config.merge_policy, MergePolicy::IdentityWins);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load_manager_config_from(lookup(&[
            ("JWT_IDENTITY_FIELD", "   "),
            ("JWT_ROLES_CLAIM", ""),
        ]))
        .expect("config");
        assert_eq!(config.identity_field, "username");
        assert!(config.roles_claim.is_none());
    }

    #[test]
    fn rejects_unknown_merge_policy() {
        let err = load_manager_config_from(lookup(&[("JWT_MERGE_POLICY", "newest")]))
            .expect_err("invalid policy");
        assert!(err.to_string().contains("JWT_MERGE_POLICY"));
    }

    #[test]
    fn deserializes_with_serde_defaults() {
        let config: ManagerConfig =
            serde_json::from_value(serde_json::json!({ "identity_field": "sub" }))
                .expect("config");
        assert_eq!(config, ManagerConfig::new("sub"));

        let config: ManagerConfig = serde_json::from_value(serde_json::json!({
            "identity_field": "sub",
            "merge_policy": "identity_wins"
        }))
        .expect("config");
        assert_eq!(config.merge_policy, MergePolicy::IdentityWins);
    }
}
