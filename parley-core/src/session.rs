use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::credentials::CredentialSource;
use crate::error::{Error, Result};
use crate::events::{self, EventSender, EventStream, SessionEvent};
use crate::llm_service::LlmService;
use crate::lock_unpoisoned;
use crate::orchestrator::{Generation, Orchestrator, Outcome, RequestState};
use crate::provider::{Completion, ProviderKind};
use crate::registry::ProviderRegistry;
use crate::transcript::{Transcript, TranscriptSnapshot};
use crate::turn::{Turn, TurnId};

/// The chat session a UI or test harness drives
///
/// Owns the transcript and the provider selection and sequences every operation
/// against the orchestrator. All operations return immediately; results arrive on the
/// [`EventStream`] returned by [`Session::new`].
pub struct Session {
    transcript: Arc<Mutex<Transcript>>,
    // Also serializes send/switch/reset against each other.
    selection: Mutex<ProviderKind>,
    registry: ProviderRegistry,
    orchestrator: Arc<Orchestrator>,
    events: EventSender,
}

impl Session {
    pub fn new(config: SessionConfig, registry: ProviderRegistry) -> (Self, EventStream) {
        info!(
            provider = %config.default_provider,
            providers = ?registry,
            timeout = ?config.request_timeout,
            "starting session"
        );
        let transcript = Arc::new(Mutex::new(Transcript::with_system_prompt(
            config.system_prompt,
        )));
        let (events, stream) = events::channel();
        let orchestrator = Orchestrator::new(
            Arc::clone(&transcript),
            events.clone(),
            config.request_timeout,
        );

        let session = Self {
            transcript,
            selection: Mutex::new(config.default_provider),
            registry,
            orchestrator,
            events,
        };
        (session, stream)
    }

    /// Builds the default provider registry from `credentials`
    pub fn with_credentials(
        config: SessionConfig,
        credentials: &dyn CredentialSource,
    ) -> (Self, EventStream) {
        Self::new(config, ProviderRegistry::with_defaults(credentials))
    }

    /// Appends a user turn and issues a request against the selected provider.
    ///
    /// Returns `None` without touching anything when `text` is blank. Any request still
    /// in flight is cancelled first and its result will never appear.
    pub fn send_message(&self, text: &str) -> Option<TurnId> {
        if text.trim().is_empty() {
            debug!("ignoring blank message");
            return None;
        }

        let selection = self.lock_selection();
        // Cancel before appending so a finishing request cannot land after this turn.
        self.orchestrator.cancel();

        let turn = Turn::user(text);
        let id = turn.id();
        let snapshot = {
            let mut transcript = lock_unpoisoned(&self.transcript);
            transcript.append(turn.clone());
            transcript.snapshot()
        };
        self.events.emit(SessionEvent::MessageAppended(turn));

        let service = self
            .registry
            .get(*selection)
            .unwrap_or_else(|| Arc::new(Unavailable(*selection)));
        self.orchestrator.issue(snapshot, service);

        Some(id)
    }

    /// Changes the provider used by the next send. A request in flight is unaffected.
    pub fn switch_provider(&self, provider: ProviderKind) {
        let mut selection = self.lock_selection();
        if *selection != provider {
            info!(from = %*selection, to = %provider, "switching provider");
            *selection = provider;
        }
    }

    /// Cancels any request in flight and starts over with a fresh system turn.
    pub fn reset_conversation(&self) {
        let _selection = self.lock_selection();
        self.orchestrator.cancel();
        lock_unpoisoned(&self.transcript).reset();
        info!("conversation reset");
        self.events.emit(SessionEvent::ConversationReset);
    }

    pub fn provider(&self) -> ProviderKind {
        *self.lock_selection()
    }

    pub fn transcript(&self) -> TranscriptSnapshot {
        lock_unpoisoned(&self.transcript).snapshot()
    }

    pub fn request_state(&self) -> RequestState {
        self.orchestrator.state()
    }

    pub fn last_outcome(&self) -> Option<(Generation, Outcome)> {
        self.orchestrator.last_outcome()
    }

    fn lock_selection(&self) -> MutexGuard<'_, ProviderKind> {
        lock_unpoisoned(&self.selection)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.orchestrator.cancel();
    }
}

/// Stands in for a provider that has no registered service
struct Unavailable(ProviderKind);

#[async_trait]
impl LlmService for Unavailable {
    fn provider(&self) -> ProviderKind {
        self.0
    }

    fn check_ready(&self) -> Result<()> {
        Err(Error::ProviderUnavailable(self.0))
    }

    async fn generate_next_turn(&self, _transcript: &[Turn]) -> Result<Completion> {
        Err(Error::ProviderUnavailable(self.0))
    }
}
