use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;
use crate::tools::ToolDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A chat message in the OpenAI wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    /// Speaker name; used to tell agents apart in a group chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

/// `arguments` is a JSON object encoded as a string, as the API sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            name: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Message text, empty when the model only returned tool calls.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// One completion round-trip: the full transcript plus the tools on offer.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDescriptor>,
}

/// Anything that can produce the next assistant message.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage>;
}

/// HTTP client for the OpenAI chat-completions API.
pub struct OpenAiClient {
    pub endpoint: String,
    pub model: String,
    api_key: String,
    temperature: Option<f32>,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            anyhow::bail!("OpenAI API key missing. Set OPENAI_API_KEY in .env");
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build OpenAI HTTP client")?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            client,
        })
    }

    fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": request.messages,
        });

        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> =
                request.tools.iter().map(ToolDescriptor::to_openai).collect();
            body["tools"] = serde_json::json!(tools);
        }

        if let Some(temperature) = self.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        body
    }
}

#[async_trait::async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage> {
        log::debug!(
            "OpenAI: sending {} message(s), {} tool(s)",
            request.messages.len(),
            request.tools.len()
        );

        let response = self.client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&request))
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        let mut completion: Completion = response.json().await
            .context("Failed to parse OpenAI response")?;

        if completion.choices.is_empty() {
            anyhow::bail!("No choices in OpenAI response");
        }

        Ok(completion.choices.swap_remove(0).message)
    }
}

#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}
