use std::io::Write;

use crate::agent::{AgentSession, Message};
use crate::error::Result;
use crate::log;
use crate::printer::MessagePrinter;

/// Prompt used when none is given on the command line.
pub const DEFAULT_PROMPT: &str =
    "Look around this repository and give a short overview of what it does and how it is laid out.";

/// Send one prompt and print everything the agent emits until its stream ends.
///
/// Error results are printed like any other completion; the run still ends
/// normally.
pub async fn run<A, W>(agent: &mut A, printer: &MessagePrinter, out: &mut W, prompt: &str) -> Result<()>
where
    A: AgentSession,
    W: Write,
{
    agent.query(prompt).await?;
    agent.end_input().await?;

    let mut messages = 0usize;
    while let Some(message) = agent.next_message().await? {
        messages += 1;
        if let Message::Result(result) = &message {
            log::log_event(&format!(
                "Session {} completed with subtype {}",
                result.session_id.as_deref().unwrap_or("-"),
                result.subtype
            ));
        }
        printer.print(&message, out)?;
    }

    log::log_event(&format!("Stream ended after {} messages", messages));
    Ok(())
}
