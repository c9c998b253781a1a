use serde::{Deserialize, Serialize};

/// An authenticated principal a token can be issued for.
pub trait Identity {
    /// Stable identifier written under the manager's identity field.
    fn identifier(&self) -> &str;

    fn roles(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Identity held entirely in memory, e.g. for fixtures or service accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryUser {
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl InMemoryUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}

impl Identity for InMemoryUser {
    fn identifier(&self) -> &str {
        &self.username
    }

    fn roles(&self) -> Vec<String> {
        self.roles.clone()
    }
}
