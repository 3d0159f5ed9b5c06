use std::time::Duration;

use thiserror::Error;

use crate::provider::ProviderKind;

/// Represents errors that can occur while issuing a chat request
#[derive(Error, Debug)]
pub enum Error {
    /// No API key was available for the selected provider
    #[error("No API key configured for {0}")]
    CredentialMissing(ProviderKind),

    /// The request body could not be encoded
    #[error("Request serialization error: {0}")]
    RequestSerialization(#[source] serde_json::Error),

    /// Network or connectivity failure
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status code
    #[error("Provider returned HTTP status {status}")]
    Http { status: u16 },

    /// The response body did not match the provider schema
    #[error("Malformed provider response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// The response parsed but carried no assistant content
    #[error("Provider returned no completion content")]
    EmptyCompletion,

    /// The request was superseded or explicitly cancelled
    #[error("Request cancelled")]
    Cancelled,

    /// The request did not finish within the configured limit
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// No service is registered for the selected provider
    #[error("Provider not available: {0}")]
    ProviderUnavailable(ProviderKind),

    #[error("Couldn't parse base url")]
    BaseUrl(#[from] url::ParseError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Short description suitable for showing in the transcript.
    ///
    /// Never includes response bodies, error chains or credentials.
    pub fn user_message(&self) -> String {
        match self {
            Error::CredentialMissing(provider) => {
                format!("Error: No API key configured for {provider}")
            }
            Error::RequestSerialization(_) => "Error: Unable to send message".to_string(),
            Error::Transport(e) if e.is_connect() => {
                "Error: Could not connect to the server".to_string()
            }
            Error::Transport(_) => "Error: Network request failed".to_string(),
            Error::Http { status } => format!("Error: Server returned status {status}"),
            Error::MalformedResponse(_) => {
                "Error: Unable to process server response".to_string()
            }
            Error::EmptyCompletion => "Error: No content in AI response".to_string(),
            Error::Cancelled => "Request cancelled".to_string(),
            Error::Timeout(_) => "Error: The request timed out".to_string(),
            Error::ProviderUnavailable(provider) => {
                format!("Error: {provider} is not available")
            }
            Error::BaseUrl(_) | Error::Config(_) => {
                "Error: The client is misconfigured".to_string()
            }
        }
    }

    /// Whether this error is a silent cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// A Result type that uses our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_short_and_redacted() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let msg = Error::MalformedResponse(parse_err).user_message();
        assert_eq!(msg, "Error: Unable to process server response");
        assert!(!msg.contains("line"));

        assert_eq!(
            Error::EmptyCompletion.user_message(),
            "Error: No content in AI response"
        );
        assert_eq!(
            Error::Http { status: 503 }.user_message(),
            "Error: Server returned status 503"
        );
        assert_eq!(
            Error::CredentialMissing(ProviderKind::DeepSeek).user_message(),
            "Error: No API key configured for DeepSeek"
        );
    }

    #[test]
    fn test_only_cancelled_is_silent() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::EmptyCompletion.is_cancelled());
        assert!(!Error::Timeout(Duration::from_secs(1)).is_cancelled());
    }
}
