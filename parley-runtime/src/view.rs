use parley_core::{Role, SessionEvent, Turn};

/// What a chat window shows, rebuilt purely from session events
///
/// The system turn is never displayed, so a reset simply empties the view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatView {
    messages: Vec<Turn>,
    loading: bool,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the view and returns the line to print for it, if any
    pub fn apply(&mut self, event: SessionEvent) -> Option<String> {
        match event {
            SessionEvent::MessageAppended(turn) => {
                let line = render(&turn);
                self.messages.push(turn);
                line
            }
            SessionEvent::LoadingStarted => {
                let was_loading = std::mem::replace(&mut self.loading, true);
                (!was_loading).then(|| "...".to_string())
            }
            SessionEvent::LoadingEnded => {
                self.loading = false;
                None
            }
            SessionEvent::ConversationReset => {
                self.messages.clear();
                self.loading = false;
                Some("--- new conversation ---".to_string())
            }
        }
    }

    pub fn messages(&self) -> &[Turn] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

// User turns are already on screen as typed.
fn render(turn: &Turn) -> Option<String> {
    match turn.role() {
        Role::Assistant => {
            let label = turn
                .provider()
                .map_or_else(|| "Assistant".to_string(), |provider| provider.to_string());
            Some(format!("{label}: {}\n", turn.content()))
        }
        Role::User | Role::System => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::provider::placeholder::{PlaceholderConfig, PlaceholderService};
    use parley_core::{ProviderKind, ProviderRegistry, Session, SessionConfig};
    use std::time::Duration;

    #[test]
    fn test_loading_follows_events() {
        let mut view = ChatView::new();

        assert_eq!(view.apply(SessionEvent::LoadingStarted), Some("...".to_string()));
        // Superseding request: still loading, nothing new to print
        assert_eq!(view.apply(SessionEvent::LoadingStarted), None);
        assert!(view.is_loading());

        let line = view.apply(SessionEvent::MessageAppended(Turn::assistant("Hi there")));
        assert_eq!(line.as_deref(), Some("Assistant: Hi there\n"));
        view.apply(SessionEvent::LoadingEnded);
        assert!(!view.is_loading());
        assert_eq!(view.messages().len(), 1);
    }

    #[test]
    fn test_replies_are_labelled_by_provider() {
        let mut view = ChatView::new();

        let deepseek = Turn::assistant("Hi").with_provider(ProviderKind::DeepSeek);
        let chatgpt = Turn::assistant("Hello").with_provider(ProviderKind::ChatGpt);

        assert_eq!(
            view.apply(SessionEvent::MessageAppended(deepseek)).as_deref(),
            Some("DeepSeek: Hi\n")
        );
        assert_eq!(
            view.apply(SessionEvent::MessageAppended(chatgpt)).as_deref(),
            Some("ChatGPT: Hello\n")
        );
    }

    #[test]
    fn test_reset_clears_view() {
        let mut view = ChatView::new();
        view.apply(SessionEvent::MessageAppended(Turn::user("Hello")));
        view.apply(SessionEvent::LoadingStarted);

        view.apply(SessionEvent::ConversationReset);

        assert!(view.messages().is_empty());
        assert!(!view.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_tracks_session() {
        let mut registry = ProviderRegistry::new();
        registry.register(PlaceholderService::with_config(PlaceholderConfig {
            latency: Duration::from_millis(100),
            ..PlaceholderConfig::default()
        }));
        let (session, mut events) = Session::new(
            SessionConfig::default().with_default_provider(ProviderKind::ChatGpt),
            registry,
        );
        let mut view = ChatView::new();

        session.send_message("Hello");
        while let Some(event) = events.recv().await {
            let done = event == SessionEvent::LoadingEnded;
            view.apply(event);
            if done {
                break;
            }
        }

        let shown: Vec<_> = view.messages().iter().map(Turn::content).collect();
        assert_eq!(
            shown,
            vec!["Hello", "This is a placeholder response from OpenAI."]
        );
        assert_eq!(&session.transcript()[1..], view.messages());
    }
}
