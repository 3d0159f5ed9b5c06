//! Single-in-flight request state machine.
//!
//! Every [`Orchestrator::issue`] gets the next generation number and replaces the
//! pending request, cancelling the old one. Results only reach the transcript through
//! [`Orchestrator::complete`], which compares generations under the state lock, so a
//! superseded request can never append a turn or emit an event no matter how late its
//! response arrives.
//!
//! Lock order is state, then transcript.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{EventSender, SessionEvent};
use crate::llm_service::LlmService;
use crate::lock_unpoisoned;
use crate::provider::{Completion, ProviderKind};
use crate::transcript::{Transcript, TranscriptSnapshot};
use crate::turn::Turn;

pub type Generation = u64;

/// What the orchestrator is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Issued {
        generation: Generation,
        provider: ProviderKind,
        issued_against_len: usize,
    },
}

/// Terminal state of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
    Cancelled,
}

struct PendingRequest {
    generation: Generation,
    target_provider: ProviderKind,
    issued_against_len: usize,
    cancel: CancellationToken,
    // Dropping the handle detaches the task; cancellation goes through the token.
    _task: Option<JoinHandle<()>>,
}

struct OrchestratorState {
    next_generation: Generation,
    pending: Option<PendingRequest>,
    last_outcome: Option<(Generation, Outcome)>,
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self {
            next_generation: 1,
            pending: None,
            last_outcome: None,
        }
    }
}

pub struct Orchestrator {
    transcript: Arc<Mutex<Transcript>>,
    events: EventSender,
    state: Mutex<OrchestratorState>,
    timeout: Option<Duration>,
}

impl Orchestrator {
    /// Creates an orchestrator that writes results into `transcript` and `events`.
    ///
    /// `timeout` bounds each provider call; `None` waits indefinitely.
    pub fn new(
        transcript: Arc<Mutex<Transcript>>,
        events: EventSender,
        timeout: Option<Duration>,
    ) -> Arc<Self> {
        Arc::new(Self {
            transcript,
            events,
            state: Mutex::new(OrchestratorState::default()),
            timeout,
        })
    }

    /// Starts a request for `snapshot` against `service`, cancelling any pending one.
    ///
    /// Returns immediately. Must be called from within a tokio runtime. A service that
    /// fails [`LlmService::check_ready`] goes straight to Failed without spawning.
    pub fn issue(
        self: &Arc<Self>,
        snapshot: TranscriptSnapshot,
        service: Arc<dyn LlmService>,
    ) -> Generation {
        let provider = service.provider();

        // Numbered under the lock so the installed request always holds the newest generation.
        let mut state = self.lock_state();
        let generation = state.next_generation;
        state.next_generation += 1;
        Self::cancel_pending(&mut state, "superseded");

        info!(generation, %provider, turns = snapshot.len(), "issuing request");
        self.events.emit(SessionEvent::LoadingStarted);

        if let Err(error) = service.check_ready() {
            warn!(generation, %provider, "request rejected before sending: {}", error);
            self.apply(&mut state, generation, provider, Err(error));
            return generation;
        }

        let cancel = CancellationToken::new();
        let issued_against_len = snapshot.len();
        let task = tokio::spawn(
            Arc::clone(self).run(generation, snapshot, service, cancel.clone()),
        );

        state.pending = Some(PendingRequest {
            generation,
            target_provider: provider,
            issued_against_len,
            cancel,
            _task: Some(task),
        });

        generation
    }

    /// Cancels the pending request, if any. Silent: no transcript change, no event.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock_state();
        Self::cancel_pending(&mut state, "cancelled by caller")
    }

    pub fn state(&self) -> RequestState {
        match &self.lock_state().pending {
            Some(pending) => RequestState::Issued {
                generation: pending.generation,
                provider: pending.target_provider,
                issued_against_len: pending.issued_against_len,
            },
            None => RequestState::Idle,
        }
    }

    pub fn last_outcome(&self) -> Option<(Generation, Outcome)> {
        self.lock_state().last_outcome
    }

    async fn run(
        self: Arc<Self>,
        generation: Generation,
        snapshot: TranscriptSnapshot,
        service: Arc<dyn LlmService>,
        cancel: CancellationToken,
    ) {
        let call = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, service.generate_next_turn(&snapshot))
                    .await
                    .unwrap_or_else(|_| Err(Error::Timeout(limit))),
                None => service.generate_next_turn(&snapshot).await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(generation, "in-flight call abandoned");
                return;
            }
            result = call => result,
        };

        self.complete(generation, result);
    }

    /// The only path by which a provider result reaches the transcript.
    fn complete(&self, generation: Generation, result: Result<Completion>) {
        let mut state = self.lock_state();
        let is_current = state
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == generation);
        if !is_current {
            debug!(generation, "discarding stale result");
            return;
        }

        let Some(pending) = state.pending.take() else {
            return;
        };
        debug!(
            generation,
            issued_against_len = pending.issued_against_len,
            "request resolved"
        );
        self.apply(&mut state, generation, pending.target_provider, result);
    }

    fn apply(
        &self,
        state: &mut OrchestratorState,
        generation: Generation,
        provider: ProviderKind,
        result: Result<Completion>,
    ) {
        let turn = match result {
            Ok(completion) => {
                info!(generation, "request completed");
                state.last_outcome = Some((generation, Outcome::Completed));
                completion.turn
            }
            Err(error) if error.is_cancelled() => {
                state.last_outcome = Some((generation, Outcome::Cancelled));
                return;
            }
            Err(error) => {
                warn!(generation, "request failed: {}", error);
                state.last_outcome = Some((generation, Outcome::Failed));
                Turn::assistant(error.user_message())
            }
        };
        let turn = turn.with_provider(provider);

        // Events are sent while the state lock is held so their order matches the
        // transcript order.
        lock_unpoisoned(&self.transcript).append(turn.clone());
        self.events.emit(SessionEvent::MessageAppended(turn));
        self.events.emit(SessionEvent::LoadingEnded);
    }

    fn cancel_pending(state: &mut OrchestratorState, reason: &str) -> bool {
        match state.pending.take() {
            Some(pending) => {
                info!(generation = pending.generation, reason, "cancelling pending request");
                pending.cancel.cancel();
                state.last_outcome = Some((pending.generation, Outcome::Cancelled));
                true
            }
            None => false,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, OrchestratorState> {
        lock_unpoisoned(&self.state)
    }
}
