//! Console rendering of agent messages
//!
//! One printer serves both front ends. `DetailLevel::Summary` is the chat
//! view: successful tool results are hidden and thinking is cut to a short
//! preview. `DetailLevel::Full` is the streaming view and shows everything.

use std::io::{self, Write};

use crate::agent::{ContentBlock, Message, ResultMessage};
use crate::log;

/// Default length of the thinking preview in summary mode.
pub const DEFAULT_THINKING_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    Summary,
    Full,
}

#[derive(Debug, Clone)]
pub struct MessagePrinter {
    detail: DetailLevel,
    thinking_preview_chars: usize,
}

impl MessagePrinter {
    pub fn summary(thinking_preview_chars: usize) -> Self {
        Self {
            detail: DetailLevel::Summary,
            thinking_preview_chars,
        }
    }

    pub fn full() -> Self {
        Self {
            detail: DetailLevel::Full,
            thinking_preview_chars: DEFAULT_THINKING_PREVIEW_CHARS,
        }
    }

    /// Lines to show for one message. Unhandled shapes yield nothing.
    pub fn render(&self, message: &Message) -> Vec<String> {
        match message {
            Message::Assistant(msg) => msg
                .content()
                .iter()
                .filter_map(|block| self.render_block(block))
                .collect(),
            // Tool results come back to the model as user messages; the
            // echoed prompt text is not shown again.
            Message::User(msg) => msg
                .message
                .content
                .iter()
                .filter(|block| matches!(block, ContentBlock::ToolResult { .. }))
                .filter_map(|block| self.render_block(block))
                .collect(),
            Message::Result(result) if self.detail == DetailLevel::Full => {
                vec![render_completion(result)]
            }
            Message::Result(_) => vec![],
            Message::System(sys) => {
                log::log_event(&format!(
                    "Agent {} (session {}, model {}, {} tools)",
                    sys.subtype,
                    sys.session_id.as_deref().unwrap_or("-"),
                    sys.model.as_deref().unwrap_or("-"),
                    sys.tools.len()
                ));
                vec![]
            }
            other => {
                log::log_event(&format!("Not rendered: {} message", other.kind()));
                vec![]
            }
        }
    }

    pub fn print<W: Write>(&self, message: &Message, out: &mut W) -> io::Result<()> {
        for line in self.render(message) {
            writeln!(out, "{}", line)?;
        }
        out.flush()
    }

    fn render_block(&self, block: &ContentBlock) -> Option<String> {
        match block {
            ContentBlock::Text { text } => Some(text.clone()),
            ContentBlock::ToolUse { id, name, input } => {
                log::log_event(&format!("Tool use {} ({}): {}", name, id, input));
                Some(format!("[Tool: {}]", name))
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                if *is_error {
                    log::log_event(&format!("Tool {} failed", tool_use_id));
                    Some(format!("[Tool Error: {}]", content.to_display_string()))
                } else if self.detail == DetailLevel::Full {
                    Some(format!("[Tool Result: {}]", content.to_display_string()))
                } else {
                    None
                }
            }
            ContentBlock::Thinking { thinking } => match self.detail {
                DetailLevel::Summary => Some(format!(
                    "[Thinking: {}...]",
                    preview(thinking, self.thinking_preview_chars)
                )),
                DetailLevel::Full => Some(format!("[Thinking: {}]", thinking)),
            },
            ContentBlock::Unknown { kind } => {
                log::log_event(&format!(
                    "Not rendered: {} block",
                    kind.as_deref().unwrap_or("untyped")
                ));
                None
            }
        }
    }
}

/// First `max_chars` characters, never splitting a char.
fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn render_completion(result: &ResultMessage) -> String {
    let mut parts = vec![result.subtype.clone()];
    if let Some(turns) = result.num_turns {
        parts.push(format!("{} turns", turns));
    }
    if let Some(ms) = result.duration_ms {
        parts.push(format!("{:.1}s", ms as f64 / 1000.0));
    }
    if let Some(cost) = result.total_cost_usd {
        parts.push(format!("${:.4}", cost));
    }
    format!("[Done: {}]", parts.join(" | "))
}
