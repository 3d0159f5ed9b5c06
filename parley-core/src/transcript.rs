use std::ops::Deref;
use std::sync::Arc;

use crate::turn::{Role, Turn};

/// Instructions placed at the head of every fresh conversation
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant";

/// The ordered, append-only history of one conversation
///
/// The first turn is always the system turn. Individual turns are never
/// edited or removed; the only way to shrink a transcript is [`Transcript::reset`].
#[derive(Debug, Clone)]
pub struct Transcript {
    system_prompt: String,
    turns: Vec<Turn>,
}

impl Transcript {
    /// Creates a transcript holding a single system turn with the default prompt
    pub fn new() -> Self {
        Self::with_system_prompt(DEFAULT_SYSTEM_PROMPT)
    }

    /// Creates a transcript whose system turn (now and after every reset) uses `prompt`
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let system_prompt = prompt.into();
        let turns = vec![Turn::system(system_prompt.clone())];
        Self {
            system_prompt,
            turns,
        }
    }

    /// Adds a turn to the end of the conversation
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Replaces the whole conversation with a fresh system turn
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::system(self.system_prompt.clone()));
    }

    /// Returns an immutable view of the current turns, oldest first
    pub fn snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot(self.turns.iter().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheaply clonable, read-only copy of a transcript taken at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSnapshot(Arc<[Turn]>);

impl TranscriptSnapshot {
    /// Counts the turns with the given role
    pub fn count_role(&self, role: Role) -> usize {
        self.0.iter().filter(|turn| turn.role() == role).count()
    }
}

impl Deref for TranscriptSnapshot {
    type Target = [Turn];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transcript_has_system_turn() {
        let transcript = Transcript::new();
        assert_eq!(transcript.len(), 1);
        let first = &transcript.turns()[0];
        assert_eq!(first.role(), Role::System);
        assert_eq!(first.content(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(transcript.system_prompt(), DEFAULT_SYSTEM_PROMPT);
        assert!(!transcript.is_empty());
    }

    #[test]
    fn test_append_keeps_order() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::user("one"));
        transcript.append(Turn::assistant("two"));

        let contents: Vec<_> = transcript.turns().iter().map(Turn::content).collect();
        assert_eq!(contents, vec![DEFAULT_SYSTEM_PROMPT, "one", "two"]);
        assert_eq!(transcript.last().map(Turn::role), Some(Role::Assistant));
    }

    #[test]
    fn test_reset_restores_single_system_turn() {
        let mut transcript = Transcript::with_system_prompt("Be terse.");
        transcript.append(Turn::user("hi"));
        transcript.append(Turn::assistant("hello"));
        let old_system_id = transcript.turns()[0].id();

        transcript.reset();

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.turns()[0].role(), Role::System);
        assert_eq!(transcript.turns()[0].content(), "Be terse.");
        assert_eq!(transcript.system_prompt(), "Be terse.");
        assert_ne!(transcript.turns()[0].id(), old_system_id);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_appends() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::user("first"));
        let snapshot = transcript.snapshot();

        transcript.append(Turn::assistant("second"));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(transcript.len(), 3);
        assert_eq!(snapshot.count_role(Role::User), 1);
        assert_eq!(snapshot.count_role(Role::Assistant), 0);
    }
}
