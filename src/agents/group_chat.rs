use anyhow::{Context, Result};

use super::agent::{transcript_for, Agent};
use super::TERMINATE;
use crate::openai::{ChatMessage, ChatModel, CompletionRequest, ToolCall};
use crate::tools::ToolRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerSelection {
    /// The manager model names the next speaker.
    Auto,
    /// Agents speak in the order they were added.
    RoundRobin,
}

/// Transcript of a finished chat.
#[derive(Debug)]
pub struct ChatOutcome {
    pub messages: Vec<ChatMessage>,
    /// True when a participant said TERMINATE, false when the round limit hit.
    pub terminated: bool,
}

impl ChatOutcome {
    /// Last non-empty text message, usually the answer.
    pub fn last_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .map(ChatMessage::text)
            .find(|t| !t.trim().is_empty())
    }
}

/// A multi-agent conversation. The first proxy agent executes tool calls.
pub struct GroupChat {
    agents: Vec<Agent>,
    max_round: usize,
    selection: SpeakerSelection,
}

impl GroupChat {
    pub fn new(agents: Vec<Agent>, max_round: usize, selection: SpeakerSelection) -> Self {
        Self {
            agents,
            max_round,
            selection,
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.agents.iter().position(|a| a.name == name)
    }

    fn executor_name(&self) -> &str {
        self.agents
            .iter()
            .find(|a| a.is_proxy())
            .map(|a| a.name.as_str())
            .unwrap_or("executor")
    }

    /// Run until someone says TERMINATE or `max_round` messages exist.
    pub async fn run(
        &self,
        model: &dyn ChatModel,
        registry: &ToolRegistry,
        initiator: &str,
        message: &str,
    ) -> Result<ChatOutcome> {
        let mut last = self
            .index_of(initiator)
            .with_context(|| format!("Initiator {} is not part of the chat", initiator))?;
        let mut history = vec![ChatMessage::user(message).with_name(initiator)];
        let tools = registry.descriptors();
        // Set after a tool round so the caller reads its own results.
        let mut resume: Option<usize> = None;

        log::info!(
            "GroupChat: {} agent(s), max_round={}, selection={:?}",
            self.agents.len(),
            self.max_round,
            self.selection
        );

        while history.len() < self.max_round {
            let next = match resume.take() {
                Some(idx) => idx,
                None => self.select_speaker(model, last, &history).await?,
            };
            let speaker = &self.agents[next];

            let reply = speaker
                .reply(model, &history, &tools)
                .await
                .with_context(|| format!("{} failed to reply", speaker.name))?;
            log::info!("GroupChat: {} -> {}", speaker.name, summarize(&reply));

            let calls = reply.tool_calls.clone();
            let done = reply.text().contains(TERMINATE);
            history.push(reply);
            last = next;

            if !calls.is_empty() {
                for call in &calls {
                    if history.len() >= self.max_round {
                        break;
                    }
                    let output = self.execute(registry, call).await;
                    history.push(ChatMessage::tool_result(call.id.as_str(), output));
                }
                resume = Some(next);
                continue;
            }

            if done {
                return Ok(ChatOutcome {
                    messages: history,
                    terminated: true,
                });
            }
        }

        log::warn!("GroupChat: stopped after {} rounds", self.max_round);
        Ok(ChatOutcome {
            messages: history,
            terminated: false,
        })
    }

    async fn execute(&self, registry: &ToolRegistry, call: &ToolCall) -> String {
        log::info!(
            "GroupChat: {} executing {}({})",
            self.executor_name(),
            call.function.name,
            call.function.arguments
        );

        match registry.call(&call.function.name, &call.function.arguments).await {
            Ok(output) => output,
            Err(e) => {
                log::warn!("GroupChat: tool {} failed: {:#}", call.function.name, e);
                format!("Error: {:#}", e)
            }
        }
    }

    async fn select_speaker(
        &self,
        model: &dyn ChatModel,
        last: usize,
        history: &[ChatMessage],
    ) -> Result<usize> {
        let round_robin = (last + 1) % self.agents.len();
        if self.selection == SpeakerSelection::RoundRobin {
            return Ok(round_robin);
        }

        let mut messages = vec![ChatMessage::system(self.selector_prompt())];
        messages.extend(transcript_for("", history));
        messages.push(ChatMessage::user(format!(
            "Read the above conversation. Then select the next role from [{}] to play. Only return the role.",
            self.role_names()
        )));

        let choice = model
            .complete(CompletionRequest {
                messages,
                tools: Vec::new(),
            })
            .await
            .context("Speaker selection failed")?;

        match self.match_agent(choice.text()) {
            Some(idx) => Ok(idx),
            None => {
                log::warn!(
                    "GroupChat: could not match speaker from {:?}, using {}",
                    choice.text(),
                    self.agents[round_robin].name
                );
                Ok(round_robin)
            }
        }
    }

    fn role_names(&self) -> String {
        self.agents
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn selector_prompt(&self) -> String {
        let roles: Vec<String> = self
            .agents
            .iter()
            .map(|a| format!("{}: {}", a.name, a.system_message))
            .collect();

        format!(
            "You are in a role play game. The following roles are available:\n{}.\n\nRead the following conversation.\nThen select the next role from [{}] to play. Only return the role.",
            roles.join("\n"),
            self.role_names()
        )
    }

    /// Exact name first, otherwise the earliest-mentioned agent name.
    fn match_agent(&self, text: &str) -> Option<usize> {
        let text = text.trim();
        if let Some(idx) = self.index_of(text) {
            return Some(idx);
        }

        self.agents
            .iter()
            .enumerate()
            .filter_map(|(idx, a)| text.find(a.name.as_str()).map(|pos| (pos, idx)))
            .min()
            .map(|(_, idx)| idx)
    }
}

fn summarize(msg: &ChatMessage) -> String {
    if !msg.tool_calls.is_empty() {
        let names: Vec<&str> = msg.tool_calls.iter().map(|c| c.function.name.as_str()).collect();
        return format!("tool call(s): {}", names.join(", "));
    }

    let text = msg.text();
    match text.char_indices().nth(120) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
