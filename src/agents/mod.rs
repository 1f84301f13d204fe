pub mod agent;
pub mod group_chat;
#[cfg(test)]
pub(crate) mod mock;

pub use agent::Agent;
pub use group_chat::{ChatOutcome, GroupChat, SpeakerSelection};

/// Any message containing this marker ends the conversation.
pub const TERMINATE: &str = "TERMINATE";
