//! Provider wire protocol.
//!
//! The core treats the network contract as opaque: one `send` per shaped
//! request, yielding one response or one typed error. [`HttpChatBackend`]
//! speaks the OpenAI-compatible chat-completions dialect that every
//! [`ProviderKind`](tutormesh_domain::ProviderKind) in the registry either
//! serves natively or exposes through a compatibility endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use tutormesh_domain::{
    ChatMessage, Choice, CompletionResponse, FinishReason, ModelConfig, ProviderConfig,
    ProviderError, Role, ShapedRequest, TokenUsage,
};

/// Opaque provider network contract.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Perform one provider call. No retries, no health bookkeeping —
    /// that's the executor's job.
    async fn send(
        &self,
        provider: &ProviderConfig,
        model: &ModelConfig,
        request: &ShapedRequest,
    ) -> Result<CompletionResponse, ProviderError>;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for std::sync::Arc<T> {
    async fn send(
        &self,
        provider: &ProviderConfig,
        model: &ModelConfig,
        request: &ShapedRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        (**self).send(provider, model, request).await
    }
}

// -- Wire types (OpenAI-compatible chat completions) -------------------------

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct WireError {
    error: WireErrorBody,
}

#[derive(Deserialize)]
struct WireErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn finish_reason(raw: Option<&str>) -> FinishReason {
    match raw {
        Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("tool_calls") => FinishReason::ToolCalls,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Other,
    }
}

/// HTTP adapter for OpenAI-compatible chat-completions endpoints.
pub struct HttpChatBackend {
    client: reqwest::Client,
}

impl HttpChatBackend {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn api_key(provider: &ProviderConfig) -> String {
        if !provider.api_key.is_empty() {
            return provider.api_key.clone();
        }
        provider
            .api_key_env
            .as_ref()
            .and_then(|env| std::env::var(env).ok())
            .unwrap_or_default()
    }

    fn body(model: &ModelConfig, request: &ShapedRequest) -> serde_json::Value {
        let messages: Vec<WireMessage<'_>> = request
            .messages
            .iter()
            .map(|m: &ChatMessage| WireMessage {
                role: role_str(m.role),
                content: &m.content,
            })
            .collect();
        let mut body = serde_json::json!({
            "model": model.id,
            "messages": messages,
        });
        for (key, value) in &request.params {
            body[key] = value.clone();
        }
        body
    }

    /// Map an HTTP-level failure onto the error taxonomy.
    fn classify_status(provider: &ProviderConfig, status: u16, body: &str) -> ProviderError {
        match status {
            401 | 403 => ProviderError::InvalidApiKey(provider.name.clone()),
            404 => ProviderError::ModelNotFound(extract_message(body)),
            429 => ProviderError::RateLimitExceeded(extract_message(body)),
            400 => {
                let message = extract_message(body);
                let lower = message.to_lowercase();
                if lower.contains("context length") || lower.contains("maximum context") {
                    ProviderError::ContextLengthExceeded(message)
                } else if lower.contains("content") && lower.contains("filter") {
                    ProviderError::ContentFiltered(message)
                } else {
                    ProviderError::UnknownError(message)
                }
            }
            _ => ProviderError::UnknownError(extract_message(body)),
        }
    }
}

impl Default for HttpChatBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_message(body: &str) -> String {
    match serde_json::from_str::<WireError>(body) {
        Ok(wire) => match wire.error.code {
            Some(code) => format!("{} ({code})", wire.error.message),
            None => wire.error.message,
        },
        Err(_) => truncate(body, 300),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}...(truncated)")
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(
        &self,
        provider: &ProviderConfig,
        model: &ModelConfig,
        request: &ShapedRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", provider.base_url.trim_end_matches('/'));
        let started = Instant::now();

        let mut builder = self
            .client
            .post(&url)
            .timeout(Duration::from_millis(provider.limits.request_timeout_ms))
            .json(&Self::body(model, request));
        let key = Self::api_key(provider);
        if !key.is_empty() {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else if e.is_connect() {
                ProviderError::ConnectionError(e.to_string())
            } else {
                ProviderError::UnknownError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(Self::classify_status(provider, status, &text));
        }

        let wire: WireResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::UnknownError(format!("malformed response: {e}")))?;
        debug!(provider = %provider.name, model = %model.id, "completion received");

        let choices = wire
            .choices
            .into_iter()
            .map(|c| {
                let reason = finish_reason(c.finish_reason.as_deref());
                Choice {
                    message: ChatMessage::assistant(c.message.content.unwrap_or_default()),
                    finish_reason: reason,
                }
            })
            .collect::<Vec<_>>();

        // A filtered response arrives with HTTP 200 and a telltale finish
        // reason; surface it as the typed error.
        if choices
            .iter()
            .all(|c| c.finish_reason == FinishReason::ContentFilter)
            && !choices.is_empty()
        {
            return Err(ProviderError::ContentFiltered(provider.name.clone()));
        }

        let usage = wire.usage.map_or(TokenUsage::default(), |u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        });

        Ok(CompletionResponse {
            choices,
            usage,
            latency_ms: started.elapsed().as_millis() as u64,
            provider: provider.name.clone(),
            model: model.id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutormesh_domain::ProviderKind;

    fn provider() -> ProviderConfig {
        ProviderConfig::new("openai", ProviderKind::OpenAi, "https://api.openai.com/v1")
    }

    #[test]
    fn test_status_classification() {
        let p = provider();
        assert!(matches!(
            HttpChatBackend::classify_status(&p, 401, "{}"),
            ProviderError::InvalidApiKey(_)
        ));
        assert!(matches!(
            HttpChatBackend::classify_status(&p, 429, "{}"),
            ProviderError::RateLimitExceeded(_)
        ));
        assert!(matches!(
            HttpChatBackend::classify_status(&p, 500, "{}"),
            ProviderError::UnknownError(_)
        ));
    }

    #[test]
    fn test_context_length_recognized_in_400() {
        let p = provider();
        let body = r#"{"error":{"message":"This model's maximum context length is 8192 tokens","code":"context_length_exceeded"}}"#;
        assert!(matches!(
            HttpChatBackend::classify_status(&p, 400, body),
            ProviderError::ContextLengthExceeded(_)
        ));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"message":"boom","code":"server_error"}}"#;
        assert_eq!(extract_message(body), "boom (server_error)");
        assert_eq!(extract_message("not json"), "not json");
    }

    #[test]
    fn test_wire_body_includes_shaped_params() {
        let model = ModelConfig::new("openai", "gpt-4.1");
        let mut params = serde_json::Map::new();
        params.insert("temperature".to_string(), serde_json::json!(0.3));
        let shaped = ShapedRequest {
            messages: vec![ChatMessage::user("hi")],
            params,
            dropped: vec![],
        };
        let body = HttpChatBackend::body(&model, &shaped);
        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["messages"][0]["role"], "user");
    }
}
