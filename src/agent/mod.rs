pub mod protocol;
mod client;
mod options;

pub use client::AgentClient;
pub use options::{AgentOptions, PermissionMode, DEFAULT_ALLOWED_TOOLS, DEFAULT_CLI};
pub use protocol::{ContentBlock, Message, ResultMessage};

use crate::error::AgentResult;

/// A conversation with the agent: submit prompts, read what comes back.
#[allow(async_fn_in_trait)]
pub trait AgentSession {
    /// Submit a prompt as the next user turn.
    async fn query(&mut self, prompt: &str) -> AgentResult<()>;

    /// Next message from the agent, or `None` once the stream has ended.
    async fn next_message(&mut self) -> AgentResult<Option<Message>>;

    /// Signal that no further prompts will be submitted.
    async fn end_input(&mut self) -> AgentResult<()> {
        Ok(())
    }
}
