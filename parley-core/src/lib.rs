// Chat session core: transcript, provider adapters, and the single-in-flight
// request orchestrator behind a UI.

use std::sync::{Mutex, MutexGuard};

pub mod config;
pub mod credentials;
pub mod error;
pub mod events;
pub mod llm_service;
pub mod orchestrator;
pub mod provider;
pub mod registry;
pub mod secret;
pub mod session;
pub mod transcript;
pub mod transport;
pub mod turn;

// Re-export the main types for convenient usage
pub use config::SessionConfig;
pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials};
pub use error::{Error, Result};
pub use events::{EventStream, SessionEvent};
pub use llm_service::{HttpLlmService, LlmService};
pub use orchestrator::{Generation, Outcome, RequestState};
pub use provider::{Completion, ProviderAdapter, ProviderKind, Usage};
pub use registry::ProviderRegistry;
pub use secret::Secret;
pub use session::Session;
pub use transcript::{DEFAULT_SYSTEM_PROMPT, Transcript, TranscriptSnapshot};
pub use turn::{Role, Turn, TurnId};

/// Locks `mutex`, recovering the guard if a previous holder panicked.
///
/// Every critical section in this crate leaves its data consistent before anything
/// that can panic, so a poisoned lock is still safe to use.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
