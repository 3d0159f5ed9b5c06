//! Provider registry for runtime service lookup.
//!
//! ```rust
//! use parley_core::{ProviderKind, ProviderRegistry};
//! use parley_core::provider::placeholder::PlaceholderService;
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register(PlaceholderService::new());
//! assert!(registry.contains(ProviderKind::ChatGpt));
//! assert!(!registry.contains(ProviderKind::DeepSeek));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::credentials::CredentialSource;
use crate::llm_service::{HttpLlmService, LlmService};
use crate::provider::ProviderKind;
use crate::provider::deepseek::DeepSeekAdapter;
use crate::provider::placeholder::PlaceholderService;

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    services: HashMap<ProviderKind, Arc<dyn LlmService>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live DeepSeek over HTTPS plus the ChatGPT placeholder.
    ///
    /// A missing DeepSeek key still registers the adapter; the first send then fails
    /// with a visible `CredentialMissing` turn instead of going out unauthenticated.
    pub fn with_defaults(credentials: &dyn CredentialSource) -> Self {
        let api_key = credentials
            .api_key(ProviderKind::DeepSeek)
            .unwrap_or_else(|| {
                warn!("DeepSeek registered without an API key");
                Default::default()
            });

        let mut registry = Self::new();
        registry.register(HttpLlmService::new(DeepSeekAdapter::new(api_key)));
        registry.register(PlaceholderService::new());
        registry
    }

    /// Registers a service under the provider it reports, replacing any previous one
    pub fn register<S>(&mut self, service: S)
    where
        S: LlmService + 'static,
    {
        self.services.insert(service.provider(), Arc::new(service));
    }

    pub fn get(&self, provider: ProviderKind) -> Option<Arc<dyn LlmService>> {
        self.services.get(&provider).cloned()
    }

    pub fn contains(&self, provider: ProviderKind) -> bool {
        self.services.contains_key(&provider)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.services.keys()).finish()
    }
}
