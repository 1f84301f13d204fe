use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::openai::{ChatMessage, ChatModel, CompletionRequest, FunctionCall, Role, ToolCall};

/// Replays queued replies and records every request it receives.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ChatMessage>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = ChatMessage>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(content: &str) -> ChatMessage {
        ChatMessage {
            role: Role::Assistant,
            content: Some(content.to_string()),
            name: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn call(id: &str, name: &str, arguments: serde_json::Value) -> ChatMessage {
        ChatMessage {
            content: None,
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                kind: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }],
            ..Self::text("")
        }
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("scripted model ran out of replies"))
    }
}
