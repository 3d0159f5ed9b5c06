use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::provider::{Completion, ProviderAdapter, ProviderKind};
use crate::transport::{HttpTransport, Transport};
use crate::turn::Turn;

/// This is anything that can generate the next turn of a conversation.
///
/// The orchestrator awaits this and nothing else, so adding a backend never touches
/// the orchestrator. Implementations must be cancel-safe: dropping the returned future
/// abandons the call.
#[async_trait]
pub trait LlmService: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Fails fast, before any network round-trip, when the service cannot be used
    fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Generates the next assistant turn for the given transcript.
    async fn generate_next_turn(&self, transcript: &[Turn]) -> Result<Completion>;
}

/// An LLM service that sends requests over HTTP.
///
/// Pairs a [`ProviderAdapter`] (wire format) with a [`Transport`] (network).
///
/// # Examples
///
/// ```no_run
/// use parley_core::llm_service::{HttpLlmService, LlmService};
/// use parley_core::provider::deepseek::DeepSeekAdapter;
/// use parley_core::{Secret, Turn};
///
/// #[tokio::main]
/// async fn main() -> parley_core::Result<()> {
///     let service = HttpLlmService::new(DeepSeekAdapter::new(Secret::from("sk-...")));
///
///     let transcript = vec![Turn::system("You are a helpful assistant"), Turn::user("Hello")];
///     let completion = service.generate_next_turn(&transcript).await?;
///     println!("{}", completion.turn.content());
///
///     Ok(())
/// }
/// ```
pub struct HttpLlmService<A: ProviderAdapter> {
    adapter: A,
    transport: Arc<dyn Transport>,
}

impl<A: ProviderAdapter> HttpLlmService<A> {
    /// Creates a service that talks to the real network
    pub fn new(adapter: A) -> Self {
        Self::with_transport(adapter, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(adapter: A, transport: Arc<dyn Transport>) -> Self {
        HttpLlmService { adapter, transport }
    }
}

#[async_trait]
impl<A: ProviderAdapter> LlmService for HttpLlmService<A> {
    fn provider(&self) -> ProviderKind {
        self.adapter.provider()
    }

    fn check_ready(&self) -> Result<()> {
        self.adapter.check_credentials()
    }

    async fn generate_next_turn(&self, transcript: &[Turn]) -> Result<Completion> {
        self.adapter.check_credentials()?;

        let request = match self.adapter.encode(transcript) {
            Ok(req) => {
                debug!(
                    "Request created successfully: {} {}",
                    req.method(),
                    req.url()
                );
                req
            }
            Err(e) => {
                error!("Failed to create request: {}", e);
                return Err(e);
            }
        };

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            warn!(
                "{} responded with status {}",
                self.adapter.provider(),
                response.status
            );
            trace!("Error body: {}", response.body);
            return Err(Error::Http {
                status: response.status,
            });
        }

        let completion = self.adapter.decode(&response.body)?;
        info!("Successfully parsed response into completion");
        Ok(completion)
    }
}
