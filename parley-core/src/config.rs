use std::env;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::provider::ProviderKind;
use crate::transcript::DEFAULT_SYSTEM_PROMPT;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for one chat session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Content of the system turn, now and after every reset
    pub system_prompt: String,
    /// Provider selected when the session starts
    pub default_provider: ProviderKind,
    /// Upper bound for a single provider call; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            default_provider: ProviderKind::DeepSeek,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl SessionConfig {
    /// Reads `PARLEY_SYSTEM_PROMPT`, `PARLEY_PROVIDER` and `PARLEY_TIMEOUT_SECS`
    /// (`0` disables the timeout), falling back to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown provider or a non-numeric timeout.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`] with a custom variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(prompt) = lookup("PARLEY_SYSTEM_PROMPT").filter(|p| !p.trim().is_empty()) {
            config.system_prompt = prompt;
        }
        if let Some(provider) = lookup("PARLEY_PROVIDER") {
            config.default_provider = provider.parse()?;
        }
        if let Some(secs) = lookup("PARLEY_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!("PARLEY_TIMEOUT_SECS must be a whole number, got '{secs}'"))
            })?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn with_default_provider(mut self, provider: ProviderKind) -> Self {
        self.default_provider = provider;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}
