use std::fmt;
use std::str::FromStr;

use reqwest::Request;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::turn::Turn;

pub mod deepseek;
pub mod placeholder;

/// The backends a session can be pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// DeepSeek chat completions, live over HTTPS
    DeepSeek,
    /// ChatGPT, currently served by the placeholder
    ChatGpt,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::DeepSeek, ProviderKind::ChatGpt];

    /// Returns the environment variable the default credential source reads
    ///
    /// # Examples
    ///
    /// ```
    /// use parley_core::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::DeepSeek.api_key_env_var(), "DEEPSEEK_API_KEY");
    /// ```
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderKind::ChatGpt => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::DeepSeek => write!(f, "DeepSeek"),
            ProviderKind::ChatGpt => write!(f, "ChatGPT"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "chatgpt" | "openai" => Ok(ProviderKind::ChatGpt),
            other => Err(Error::Config(format!("unknown provider '{other}'"))),
        }
    }
}

/// Token accounting reported by a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub prompt_cache_hit_tokens: Option<u32>,
    pub prompt_cache_miss_tokens: Option<u32>,
}

/// The decoded result of one provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Assistant turn built from the first returned choice
    pub turn: Turn,
    /// Why the provider stopped generating, when reported
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl Completion {
    pub fn new(turn: Turn) -> Self {
        Self {
            turn,
            finish_reason: None,
            usage: None,
        }
    }

    /// True when the provider reported a stop reason other than a natural end
    pub fn is_truncated(&self) -> bool {
        self.finish_reason
            .as_deref()
            .is_some_and(|reason| reason != "stop")
    }
}

/// A `ProviderAdapter` turns a transcript into an HTTP request and a response body
/// back into a [`Completion`].
///
/// Adapters are constructed with their credential already resolved and never read
/// credentials themselves.
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Fails with [`Error::CredentialMissing`] when the adapter has no usable key
    ///
    /// Called before any network round-trip.
    fn check_credentials(&self) -> Result<()>;

    /// Converts the transcript, oldest turn first, into an HTTP request
    ///
    /// # Errors
    ///
    /// Returns an error if the base url is invalid or the body cannot be serialized.
    fn encode(&self, transcript: &[Turn]) -> Result<Request>;

    /// Parses a raw response body into a completion
    ///
    /// # Errors
    ///
    /// [`Error::MalformedResponse`] when the body does not match the provider schema,
    /// [`Error::EmptyCompletion`] when it matches but carries no assistant content.
    fn decode(&self, raw_response_text: &str) -> Result<Completion>;
}
