use crate::error::{Error, Result};
use crate::provider::{Completion, ProviderAdapter, ProviderKind, Usage};
use crate::secret::Secret;
use crate::turn::{Role, Turn};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Url};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, instrument, trace, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Output cap sent with every request
pub const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Configuration for the DeepSeek adapter
#[derive(Debug, Clone)]
pub struct DeepSeekConfig {
    /// API key for authentication
    pub api_key: Secret<String>,
    /// Base URL for the API, without the `/chat/completions` suffix
    pub base_url: String,
    /// Model identifier sent in every request
    pub model: String,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::default(),
            base_url: env::var("DEEPSEEK_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Encoder/decoder for the DeepSeek chat completions API
#[derive(Debug, Clone)]
pub struct DeepSeekAdapter {
    config: DeepSeekConfig,
}

impl DeepSeekAdapter {
    /// Creates an adapter for the public endpoint with the given key
    ///
    /// # Examples
    ///
    /// ```
    /// use parley_core::provider::deepseek::DeepSeekAdapter;
    /// use parley_core::Secret;
    ///
    /// let adapter = DeepSeekAdapter::new(Secret::from("sk-example"));
    /// ```
    #[instrument(skip(api_key), level = "debug")]
    pub fn new(api_key: Secret<String>) -> Self {
        Self::with_config(DeepSeekConfig {
            api_key,
            ..DeepSeekConfig::default()
        })
    }

    /// Creates an adapter with custom configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use parley_core::provider::deepseek::{DeepSeekAdapter, DeepSeekConfig};
    ///
    /// let config = DeepSeekConfig {
    ///     api_key: "your-api-key".into(),
    ///     base_url: "http://localhost:8080".to_string(),
    ///     model: "deepseek-chat".to_string(),
    /// };
    ///
    /// let adapter = DeepSeekAdapter::with_config(config);
    /// ```
    #[instrument(skip(config), level = "debug")]
    pub fn with_config(config: DeepSeekConfig) -> Self {
        info!("Creating DeepSeekAdapter");
        debug!("API key set: {}", !config.api_key.is_blank());
        debug!("Base URL: {}", config.base_url);
        debug!("Model: {}", config.model);

        Self { config }
    }

    fn endpoint(&self) -> Result<Url> {
        let url_str = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        debug!("Parsing URL: {}", url_str);
        Url::parse(&url_str).map_err(|e| {
            error!("Failed to parse URL '{}': {}", url_str, e);
            Error::from(e)
        })
    }

    fn create_request_payload<'a>(&'a self, transcript: &'a [Turn]) -> DeepSeekRequest<'a> {
        debug!("Converting {} turns to DeepSeek format", transcript.len());

        DeepSeekRequest {
            messages: transcript.iter().map(DeepSeekMessage::from).collect(),
            model: &self.config.model,
            frequency_penalty: 0.0,
            max_tokens: MAX_OUTPUT_TOKENS,
            presence_penalty: 0.0,
            response_format: ResponseFormat { r#type: "text" },
            stop: None,
            stream: false,
            stream_options: None,
            temperature: 1.0,
            top_p: 1.0,
            tools: None,
            tool_choice: "none",
            logprobs: false,
            top_logprobs: None,
        }
    }
}

impl ProviderAdapter for DeepSeekAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::DeepSeek
    }

    fn check_credentials(&self) -> Result<()> {
        if self.config.api_key.is_blank() {
            warn!("No DeepSeek API key configured");
            return Err(Error::CredentialMissing(ProviderKind::DeepSeek));
        }
        Ok(())
    }

    fn encode(&self, transcript: &[Turn]) -> Result<Request> {
        info!("Creating request for DeepSeek model: {}", self.config.model);

        let mut request = Request::new(Method::POST, self.endpoint()?);
        debug!("Created request: {} {}", request.method(), request.url());

        let mut auth_header = HeaderValue::from_str(&self.config.api_key.bearer()).map_err(|_| {
            error!("API key contains characters that cannot be sent in a header");
            Error::Config("invalid API key format".into())
        })?;
        auth_header.set_sensitive(true);

        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth_header);

        let payload = self.create_request_payload(transcript);
        let body_bytes = serde_json::to_vec(&payload).map_err(|e| {
            error!("Failed to serialize payload: {}", e);
            Error::RequestSerialization(e)
        })?;
        debug!("Payload serialized successfully ({} bytes)", body_bytes.len());

        *request.body_mut() = Some(body_bytes.into());
        Ok(request)
    }

    fn decode(&self, raw_response_text: &str) -> Result<Completion> {
        info!("Parsing response from DeepSeek API");
        trace!("Raw response: {}", raw_response_text);

        let response = serde_json::from_str::<DeepSeekResponse>(raw_response_text).map_err(|e| {
            error!("Failed to deserialize response: {}", e);
            Error::MalformedResponse(e)
        })?;
        debug!("Response id: {}, model: {}", response.id, response.model);
        debug!("Number of choices: {}", response.choices.len());

        let usage = response.usage.map(Usage::from);
        if let Some(usage) = &usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        // First choice wins; any others are ignored
        let Some(choice) = response.choices.into_iter().next() else {
            warn!("DeepSeek returned zero choices");
            return Err(Error::EmptyCompletion);
        };

        if choice.message.role != Role::Assistant.as_str() {
            warn!("Unexpected role in first choice: {}", choice.message.role);
        }

        let content = match choice.message.content {
            Some(content) if !content.trim().is_empty() => content,
            _ => {
                warn!("First choice carried no content");
                return Err(Error::EmptyCompletion);
            }
        };

        let completion = Completion {
            turn: Turn::assistant(content),
            finish_reason: choice.finish_reason,
            usage,
        };
        if completion.is_truncated() {
            warn!(
                "DeepSeek completion ended early: {:?}",
                completion.finish_reason
            );
        }

        Ok(completion)
    }
}

/// Represents a message in the DeepSeek request format
#[derive(Debug, Serialize)]
pub(crate) struct DeepSeekMessage<'a> {
    pub content: &'a str,
    pub role: &'static str,
}

impl<'a> From<&'a Turn> for DeepSeekMessage<'a> {
    fn from(turn: &'a Turn) -> Self {
        DeepSeekMessage {
            content: turn.content(),
            role: turn.role().as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    pub r#type: &'static str,
}

/// Represents a request to the DeepSeek API
///
/// Unused optional fields serialize as explicit `null`.
#[derive(Debug, Serialize)]
pub(crate) struct DeepSeekRequest<'a> {
    pub messages: Vec<DeepSeekMessage<'a>>,
    pub model: &'a str,
    pub frequency_penalty: f32,
    pub max_tokens: u32,
    pub presence_penalty: f32,
    pub response_format: ResponseFormat,
    pub stop: Option<Vec<String>>,
    pub stream: bool,
    pub stream_options: Option<serde_json::Value>,
    pub temperature: f32,
    pub top_p: f32,
    pub tools: Option<Vec<serde_json::Value>>,
    pub tool_choice: &'static str,
    pub logprobs: bool,
    pub top_logprobs: Option<u32>,
}

/// Represents a response from the DeepSeek API
#[derive(Debug, Deserialize)]
pub(crate) struct DeepSeekResponse {
    pub id: String,
    #[allow(dead_code)]
    pub object: String,
    #[allow(dead_code)]
    pub created: u64,
    pub model: String,
    pub choices: Vec<DeepSeekChoice>,
    pub usage: Option<DeepSeekUsage>,
    #[allow(dead_code)]
    pub system_fingerprint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeepSeekChoice {
    #[allow(dead_code)]
    pub index: usize,
    pub message: DeepSeekResponseMessage,
    #[allow(dead_code)]
    pub logprobs: Option<serde_json::Value>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeepSeekResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeepSeekUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub prompt_cache_hit_tokens: Option<u32>,
    pub prompt_cache_miss_tokens: Option<u32>,
}

impl From<DeepSeekUsage> for Usage {
    fn from(usage: DeepSeekUsage) -> Self {
        Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            prompt_cache_hit_tokens: usage.prompt_cache_hit_tokens,
            prompt_cache_miss_tokens: usage.prompt_cache_miss_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn adapter() -> DeepSeekAdapter {
        DeepSeekAdapter::with_config(DeepSeekConfig {
            api_key: Secret::from("sk-test"),
            base_url: "https://api.deepseek.com/".to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    fn body_json(request: &Request) -> Value {
        let bytes = request.body().and_then(|b| b.as_bytes()).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_request_creation() {
        let transcript = vec![Turn::system("Be brief."), Turn::user("Hello")];
        let request = adapter().encode(&transcript).unwrap();

        assert_eq!(request.method(), "POST");
        assert_eq!(
            request.url().as_str(),
            "https://api.deepseek.com/chat/completions"
        );
        assert_eq!(request.headers().get("Content-Type").unwrap(), "application/json");
        assert_eq!(request.headers().get("Accept").unwrap(), "application/json");
        assert_eq!(request.headers().get("Authorization").unwrap(), "Bearer sk-test");
        assert!(request.headers().get("Authorization").unwrap().is_sensitive());
    }

    #[test]
    fn test_request_payload_fields() {
        let transcript = vec![
            Turn::system("Be brief."),
            Turn::user("Hello"),
            Turn::assistant("Hi"),
            Turn::user("Bye"),
        ];
        let body = body_json(&adapter().encode(&transcript).unwrap());

        assert_eq!(
            body["messages"],
            json!([
                {"content": "Be brief.", "role": "system"},
                {"content": "Hello", "role": "user"},
                {"content": "Hi", "role": "assistant"},
                {"content": "Bye", "role": "user"},
            ])
        );
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["temperature"], 1.0);
        assert_eq!(body["top_p"], 1.0);
        assert_eq!(body["frequency_penalty"], 0.0);
        assert_eq!(body["presence_penalty"], 0.0);
        assert_eq!(body["stream"], false);
        assert_eq!(body["tool_choice"], "none");
        assert_eq!(body["logprobs"], false);
        assert_eq!(body["response_format"], json!({"type": "text"}));

        let object = body.as_object().unwrap();
        for field in ["stop", "stream_options", "tools", "top_logprobs"] {
            assert_eq!(object.get(field), Some(&Value::Null), "{field} should be null");
        }
    }

    #[test]
    fn test_missing_key_is_reported_before_encoding() {
        let adapter = DeepSeekAdapter::new(Secret::from("  "));
        assert!(matches!(
            adapter.check_credentials(),
            Err(Error::CredentialMissing(ProviderKind::DeepSeek))
        ));
        assert!(self::adapter().check_credentials().is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let adapter = DeepSeekAdapter::with_config(DeepSeekConfig {
            api_key: Secret::from("sk-test"),
            base_url: "not a url".to_string(),
            model: DEFAULT_MODEL.to_string(),
        });
        assert!(matches!(adapter.encode(&[]), Err(Error::BaseUrl(_))));
    }

    #[test]
    fn test_decode_first_choice_wins() {
        let raw = json!({
            "id": "resp-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "deepseek-chat",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "first"},
                    "logprobs": null,
                    "finish_reason": "stop"
                },
                {
                    "index": 1,
                    "message": {"role": "assistant", "content": "second"},
                    "logprobs": null,
                    "finish_reason": "stop"
                }
            ],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 2,
                "total_tokens": 12,
                "prompt_cache_hit_tokens": 0,
                "prompt_cache_miss_tokens": 10
            },
            "system_fingerprint": "fp_1"
        })
        .to_string();

        let completion = adapter().decode(&raw).unwrap();
        assert_eq!(completion.turn.role(), Role::Assistant);
        assert_eq!(completion.turn.content(), "first");
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
        let usage = completion.usage.unwrap();
        assert_eq!(usage.total_tokens, 12);
        assert_eq!(usage.prompt_cache_miss_tokens, Some(10));
    }

    #[test]
    fn test_decode_null_content_is_empty_completion() {
        let raw = json!({
            "id": "resp-2",
            "object": "chat.completion",
            "created": 1,
            "model": "deepseek-chat",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": null},
                "finish_reason": "stop"
            }]
        })
        .to_string();

        assert!(matches!(adapter().decode(&raw), Err(Error::EmptyCompletion)));
    }

    #[test]
    fn test_decode_reports_truncation() {
        let raw = json!({
            "id": "resp-3",
            "object": "chat.completion",
            "created": 1,
            "model": "deepseek-chat",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "cut"},
                "finish_reason": "length"
            }]
        })
        .to_string();

        let completion = adapter().decode(&raw).unwrap();
        assert!(completion.is_truncated());
        assert!(completion.usage.is_none());
    }
}
