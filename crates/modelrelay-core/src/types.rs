//! Core types for Modelrelay.
//!
//! Two groups live here:
//! - the caller-facing requests (`ChatRequest`, `CodeRequest`) and the
//!   routed result (`Routed`, `ModelInfo`),
//! - the provider wire envelopes: OpenAI-compatible chat completions (OpenAI,
//!   DeepSeek) and Anthropic Messages.

use serde::{Deserialize, Deserializer, Serialize};

/// Model id meaning "let the router pick".
pub const AUTO_MODEL: &str = "auto";

/// Model id reported when nothing can serve a request.
pub const MOCK_MODEL: &str = "mock";

// ─────────────────────────────────────────────
// Caller-facing requests
// ─────────────────────────────────────────────

/// Routing mode: plain conversation or code-only generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteMode {
    Chat,
    Code,
}

impl RouteMode {
    /// Name of the required text field for this mode.
    pub fn required_field(self) -> &'static str {
        match self {
            RouteMode::Chat => "content",
            RouteMode::Code => "prompt",
        }
    }
}

/// `null` reads as an empty string.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `POST /chat`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// User message. A missing or null field deserializes to empty and fails
    /// validation.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    /// Requested model id, or `"auto"` / absent for fallback routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Body of `POST /code-generate`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CodeRequest {
    /// Task description.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prompt: String,
    /// Requested model id, or `"auto"` / absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Target language, e.g. `"python"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl CodeRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            language: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Mode-independent view of a request, as seen by the router.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteRequest {
    pub mode: RouteMode,
    pub text: String,
    pub requested_model: Option<String>,
    pub language: Option<String>,
}

impl RouteRequest {
    /// The requested model, with empty and `"auto"` collapsed to `None`.
    pub fn pinned_model(&self) -> Option<&str> {
        self.requested_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty() && !m.eq_ignore_ascii_case(AUTO_MODEL))
    }
}

impl From<ChatRequest> for RouteRequest {
    fn from(req: ChatRequest) -> Self {
        RouteRequest {
            mode: RouteMode::Chat,
            text: req.content,
            requested_model: req.model,
            language: None,
        }
    }
}

impl From<CodeRequest> for RouteRequest {
    fn from(req: CodeRequest) -> Self {
        RouteRequest {
            mode: RouteMode::Code,
            text: req.prompt,
            requested_model: req.model,
            language: req.language,
        }
    }
}

/// Successful routing outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct Routed {
    /// Generated text (normalized in code mode).
    pub text: String,
    /// Model that produced the text.
    pub model: String,
    /// Provider id that produced the text.
    pub provider: String,
}

/// One entry of `GET /models`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
}

impl ModelInfo {
    /// The synthetic entry listed when no provider is available.
    pub fn mock() -> Self {
        ModelInfo {
            id: MOCK_MODEL.to_string(),
            name: "Mock Model".to_string(),
            provider: MOCK_MODEL.to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Messages (shared by both wire formats)
// ─────────────────────────────────────────────

/// A chat message; the `role` tag matches both OpenAI and Anthropic.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "system")]
    System { content: String },

    #[serde(rename = "user")]
    User { content: String },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// OpenAI-compatible chat completions
// ─────────────────────────────────────────────

/// Request body for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Raw chat completion response. Only the fields we read are modelled.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if any.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
    }
}

// ─────────────────────────────────────────────
// Anthropic Messages
// ─────────────────────────────────────────────

/// Request body for Anthropic's `/v1/messages` endpoint.
///
/// The system instruction is a top-level field; `messages` carries only
/// user/assistant turns.
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Raw Messages response.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// One block of an Anthropic response. Non-text blocks are ignored.
#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessagesResponse {
    /// Text of the first `text` block, if any.
    pub fn into_text(self) -> Option<String> {
        self.content
            .into_iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_missing_content_is_empty() {
        let req: ChatRequest = serde_json::from_value(json!({"model": "gpt-4"})).unwrap();
        assert!(req.content.is_empty());
        assert_eq!(req.model.as_deref(), Some("gpt-4"));
    }

    #[test]
    fn test_null_text_is_empty() {
        let chat: ChatRequest = serde_json::from_value(json!({"content": null})).unwrap();
        assert!(chat.content.is_empty());

        let code: CodeRequest =
            serde_json::from_value(json!({"prompt": null, "language": "python"})).unwrap();
        assert!(code.prompt.is_empty());
        assert_eq!(code.language.as_deref(), Some("python"));

        // Wrong types are still rejected.
        assert!(serde_json::from_value::<ChatRequest>(json!({"content": 42})).is_err());
    }

    #[test]
    fn test_code_request_fields() {
        let req: CodeRequest = serde_json::from_value(json!({
            "prompt": "add two numbers",
            "language": "python"
        }))
        .unwrap();
        assert_eq!(req.prompt, "add two numbers");
        assert_eq!(req.language.as_deref(), Some("python"));
        assert!(req.model.is_none());
    }

    #[test]
    fn test_pinned_model_collapses_auto() {
        let auto: RouteRequest = ChatRequest::new("hi").with_model("auto").into();
        assert_eq!(auto.pinned_model(), None);

        let upper: RouteRequest = ChatRequest::new("hi").with_model("AUTO").into();
        assert_eq!(upper.pinned_model(), None);

        let unset: RouteRequest = ChatRequest::new("hi").into();
        assert_eq!(unset.pinned_model(), None);

        let blank: RouteRequest = ChatRequest::new("hi").with_model("  ").into();
        assert_eq!(blank.pinned_model(), None);

        let pinned: RouteRequest = ChatRequest::new("hi").with_model("gpt-4").into();
        assert_eq!(pinned.pinned_model(), Some("gpt-4"));
    }

    #[test]
    fn test_code_request_into_route_request() {
        let req: RouteRequest = CodeRequest::new("sort a list")
            .with_language("rust")
            .into();
        assert_eq!(req.mode, RouteMode::Code);
        assert_eq!(req.text, "sort a list");
        assert_eq!(req.language.as_deref(), Some("rust"));
        assert_eq!(req.mode.required_field(), "prompt");
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(Message::system("Be brief.")).unwrap();
        assert_eq!(json, json!({"role": "system", "content": "Be brief."}));

        let json = serde_json::to_value(Message::user("Hello")).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_chat_completion_request_skips_none() {
        let request = ChatCompletionRequest {
            model: "gpt-4".to_string(),
            messages: vec![Message::user("Hello")],
            max_tokens: None,
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_chat_completion_response_text() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"message": {"content": "Hi!"}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(resp.into_text().as_deref(), Some("Hi!"));

        let empty: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(empty.into_text().is_none());
    }

    #[test]
    fn test_messages_request_system_top_level() {
        let request = MessagesRequest {
            model: "claude-3-5-sonnet-20240620".to_string(),
            max_tokens: 2000,
            messages: vec![Message::user("Hello")],
            system: Some("Be helpful.".to_string()),
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "Be helpful.");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_messages_response_skips_non_text_blocks() {
        let resp: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Hello there"}
            ]
        }))
        .unwrap();
        assert_eq!(resp.into_text().as_deref(), Some("Hello there"));
    }

    #[test]
    fn test_mock_model_info() {
        let mock = ModelInfo::mock();
        assert_eq!(mock.id, "mock");
        assert_eq!(mock.provider, "mock");
    }
}
