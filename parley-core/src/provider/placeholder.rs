//! Stand-in backend for a provider without a live integration.
//!
//! Answers every request with a canned turn after a fixed delay. The delay is an
//! ordinary tokio sleep, so dropping the future (which is what orchestrator
//! cancellation does) abandons it exactly like an in-flight HTTP call.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::llm_service::LlmService;
use crate::provider::{Completion, ProviderKind};
use crate::turn::Turn;

pub const DEFAULT_RESPONSE: &str = "This is a placeholder response from OpenAI.";
pub const DEFAULT_LATENCY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct PlaceholderConfig {
    pub provider: ProviderKind,
    pub latency: Duration,
    pub response: String,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::ChatGpt,
            latency: DEFAULT_LATENCY,
            response: DEFAULT_RESPONSE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaceholderService {
    config: PlaceholderConfig,
}

impl PlaceholderService {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "debug")]
    pub fn with_config(config: PlaceholderConfig) -> Self {
        info!("Creating placeholder service for {}", config.provider);
        Self { config }
    }
}

#[async_trait]
impl LlmService for PlaceholderService {
    fn provider(&self) -> ProviderKind {
        self.config.provider
    }

    async fn generate_next_turn(&self, transcript: &[Turn]) -> Result<Completion> {
        debug!(
            "Placeholder answering {} turns after {:?}",
            transcript.len(),
            self.config.latency
        );
        tokio::time::sleep(self.config.latency).await;

        let mut completion = Completion::new(Turn::assistant(self.config.response.clone()));
        completion.finish_reason = Some("stop".to_string());
        Ok(completion)
    }
}
