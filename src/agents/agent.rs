use anyhow::Result;

use crate::openai::{ChatMessage, ChatModel, CompletionRequest, Role};
use crate::tools::ToolDescriptor;

#[derive(Debug, Clone)]
enum Kind {
    /// Replies through the model with every registered tool on offer.
    Assistant,
    /// Never calls the model; answers with a fixed line and executes tools.
    Proxy { auto_reply: String },
}

/// A named participant in a chat.
#[derive(Debug, Clone)]
pub struct Agent {
    pub name: String,
    pub system_message: String,
    kind: Kind,
}

impl Agent {
    pub fn assistant(name: &str, system_message: &str) -> Self {
        Self {
            name: name.to_string(),
            system_message: system_message.to_string(),
            kind: Kind::Assistant,
        }
    }

    pub fn user_proxy(name: &str, system_message: &str, auto_reply: &str) -> Self {
        Self {
            name: name.to_string(),
            system_message: system_message.to_string(),
            kind: Kind::Proxy {
                auto_reply: auto_reply.to_string(),
            },
        }
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.kind, Kind::Proxy { .. })
    }

    /// Produce this agent's next message given the shared transcript.
    pub async fn reply(
        &self,
        model: &dyn ChatModel,
        history: &[ChatMessage],
        tools: &[ToolDescriptor],
    ) -> Result<ChatMessage> {
        match &self.kind {
            Kind::Proxy { auto_reply } => Ok(ChatMessage::user(auto_reply.as_str()).with_name(&self.name)),
            Kind::Assistant => {
                let mut messages = vec![ChatMessage::system(self.system_message.as_str())];
                messages.extend(transcript_for(&self.name, history));

                let mut reply = model
                    .complete(CompletionRequest {
                        messages,
                        tools: tools.to_vec(),
                    })
                    .await?;
                reply.role = Role::Assistant;
                reply.name = Some(self.name.clone());
                Ok(reply)
            }
        }
    }
}

/// The transcript as `viewer` should see it: its own messages stay assistant
/// turns, other speakers' plain text becomes named user turns. Tool-call turns
/// are kept as assistant turns so their tool results stay paired.
pub(crate) fn transcript_for(viewer: &str, history: &[ChatMessage]) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|msg| {
            let foreign = msg.name.as_deref() != Some(viewer);
            if msg.role == Role::Assistant && msg.tool_calls.is_empty() && foreign {
                let mut msg = msg.clone();
                msg.role = Role::User;
                msg
            } else {
                msg.clone()
            }
        })
        .collect()
}
