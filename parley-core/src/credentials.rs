//! Credential lookup at the session boundary.
//!
//! Sources return `None` when a key cannot be found; they never fail. Whoever builds
//! the session decides how a missing key is surfaced (the default registry turns it into
//! a visible `CredentialMissing` error on the first send).

use std::collections::HashMap;
use std::env;

use tracing::{debug, error};

use crate::provider::ProviderKind;
use crate::secret::Secret;

pub trait CredentialSource: Send + Sync {
    fn api_key(&self, provider: ProviderKind) -> Option<Secret<String>>;
}

/// Reads keys from the process environment, after loading a `.env` file if present
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    pub fn new() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }
        EnvCredentials
    }
}

impl CredentialSource for EnvCredentials {
    fn api_key(&self, provider: ProviderKind) -> Option<Secret<String>> {
        let var = provider.api_key_env_var();
        match env::var(var) {
            Ok(key) if !key.trim().is_empty() => Some(Secret::new(key)),
            _ => {
                error!("Couldn't find {} API key in {}", provider, var);
                None
            }
        }
    }
}

/// Fixed keys, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    keys: HashMap<ProviderKind, Secret<String>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_key(mut self, provider: ProviderKind, key: impl Into<Secret<String>>) -> Self {
        self.keys.insert(provider, key.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn api_key(&self, provider: ProviderKind) -> Option<Secret<String>> {
        self.keys
            .get(&provider)
            .filter(|key| !key.is_blank())
            .cloned()
    }
}
