//! Display-facing events emitted by a session.
//!
//! The UI collaborator subscribes to an [`EventStream`] and renders from it; it never
//! reads the transcript directly.

use tokio::sync::mpsc;
use tracing::trace;

use crate::turn::Turn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A turn was appended to the transcript (user, assistant, or error)
    MessageAppended(Turn),
    /// A request was issued and is awaiting a result
    LoadingStarted,
    /// The current request reached Completed or Failed
    LoadingEnded,
    /// The transcript was reset; derived presentation state should be dropped
    ConversationReset,
}

/// Sending half of the event channel
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSender {
    /// Delivers an event; a dropped receiver is not an error
    pub fn emit(&self, event: SessionEvent) {
        trace!(?event, "emitting session event");
        let _ = self.sender.send(event);
    }
}

/// Receiving half of the event channel
#[derive(Debug)]
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<SessionEvent>,
}

impl EventStream {
    /// Waits for the next event; `None` once the session is dropped
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }

    /// Returns an event if one is already queued
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drains every event that is already queued
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Creates a connected sender/stream pair
pub fn channel() -> (EventSender, EventStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (EventSender { sender }, EventStream { receiver })
}
