//! Agent CLI stream-json types
//!
//! Every line the agent CLI writes on stdout is one JSON object tagged by
//! `type`. Tags and content block kinds we don't know about are kept as
//! `Unknown` so callers can log them instead of failing the whole stream.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Incoming messages
// ============================================================================

/// One message read from the agent stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    System(SystemMessage),
    Assistant(AssistantMessage),
    User(UserMessage),
    Result(ResultMessage),
    Unknown { raw_type: Option<String> },
}

impl Message {
    /// Parse one NDJSON line.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Short name used in log lines.
    pub fn kind(&self) -> &str {
        match self {
            Message::System(_) => "system",
            Message::Assistant(_) => "assistant",
            Message::User(_) => "user",
            Message::Result(_) => "result",
            Message::Unknown { raw_type } => raw_type.as_deref().unwrap_or("untyped"),
        }
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let message_type = value
            .get("type")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        match message_type.as_deref() {
            // Only ever logged: a shape we can't read is skipped, not fatal.
            Some("system") => Ok(serde_json::from_value(value)
                .map(Message::System)
                .unwrap_or_else(|_| Message::Unknown {
                    raw_type: Some("system".to_string()),
                })),
            Some("assistant") => serde_json::from_value(value)
                .map(Message::Assistant)
                .map_err(D::Error::custom),
            Some("user") => serde_json::from_value(value)
                .map(Message::User)
                .map_err(D::Error::custom),
            Some("result") => serde_json::from_value(value)
                .map(Message::Result)
                .map_err(D::Error::custom),
            other => Ok(Message::Unknown {
                raw_type: other.map(|s| s.to_string()),
            }),
        }
    }
}

/// Session metadata, emitted once when the agent starts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SystemMessage {
    pub subtype: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssistantMessage {
    pub message: MessageBody,
}

impl AssistantMessage {
    pub fn content(&self) -> &[ContentBlock] {
        &self.message.content
    }
}

/// Tool results fed back to the model show up as user messages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserMessage {
    pub message: MessageBody,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageBody {
    #[serde(default, deserialize_with = "content_blocks")]
    pub content: Vec<ContentBlock>,
}

/// Message content is either a bare string or a list of blocks.
fn content_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(vec![ContentBlock::Text { text }]),
        Value::Null => Ok(Vec::new()),
        other => serde_json::from_value(other).map_err(D::Error::custom),
    }
}

/// Turn completion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultMessage {
    pub subtype: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub num_turns: Option<u32>,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
}

impl ResultMessage {
    /// `error`, any `error_*` subtype, or an explicit `is_error` flag.
    pub fn is_error(&self) -> bool {
        self.is_error || self.subtype == "error" || self.subtype.starts_with("error_")
    }

    /// Best available description of the outcome.
    pub fn description(&self) -> &str {
        self.result
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.errors.first().map(|s| s.as_str()).filter(|s| !s.is_empty()))
            .unwrap_or(&self.subtype)
    }
}

// ============================================================================
// Content blocks
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: ToolResultContent,
        is_error: bool,
    },
    Thinking {
        thinking: String,
    },
    Unknown {
        kind: Option<String>,
    },
}

#[derive(Deserialize)]
struct ToolUseFields {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default)]
    input: Value,
}

#[derive(Deserialize)]
struct ToolResultFields {
    #[serde(default)]
    tool_use_id: String,
    #[serde(default)]
    content: Option<ToolResultContent>,
    #[serde(default)]
    is_error: Option<bool>,
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let block_type = value.get("type").and_then(|v| v.as_str());

        let text_field = |field: &str| -> Result<String, D::Error> {
            value
                .get(field)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .ok_or_else(|| D::Error::custom(format!("missing field `{}`", field)))
        };

        match block_type {
            Some("text") => Ok(ContentBlock::Text {
                text: text_field("text")?,
            }),
            Some("thinking") => Ok(ContentBlock::Thinking {
                thinking: text_field("thinking")?,
            }),
            Some("tool_use") => {
                let fields: ToolUseFields =
                    serde_json::from_value(value.clone()).map_err(D::Error::custom)?;
                Ok(ContentBlock::ToolUse {
                    id: fields.id,
                    name: fields.name,
                    input: fields.input,
                })
            }
            Some("tool_result") => {
                let fields: ToolResultFields =
                    serde_json::from_value(value.clone()).map_err(D::Error::custom)?;
                Ok(ContentBlock::ToolResult {
                    tool_use_id: fields.tool_use_id,
                    content: fields
                        .content
                        .unwrap_or_else(|| ToolResultContent::Text(String::new())),
                    is_error: fields.is_error.unwrap_or(false),
                })
            }
            other => Ok(ContentBlock::Unknown {
                kind: other.map(|s| s.to_string()),
            }),
        }
    }
}

/// Tool result content: plain text or a list of structured parts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Structured(Vec<Value>),
}

impl ToolResultContent {
    /// Flatten for console display. Image parts become `[image]`.
    pub fn to_display_string(&self) -> String {
        match self {
            ToolResultContent::Text(s) => s.clone(),
            ToolResultContent::Structured(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| {
                        let obj = item.as_object()?;
                        if obj.get("type").and_then(|v| v.as_str()) == Some("image") {
                            Some("[image]".to_string())
                        } else {
                            obj.get("text").and_then(|v| v.as_str()).map(|s| s.to_string())
                        }
                    })
                    .collect();
                if parts.is_empty() {
                    serde_json::to_string(items).unwrap_or_default()
                } else {
                    parts.join("\n")
                }
            }
        }
    }
}

// ============================================================================
// Outgoing prompt
// ============================================================================

/// A prompt written to the agent's stdin as one JSON line.
#[derive(Debug, Serialize)]
pub struct UserPrompt<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: PromptBody<'a>,
    pub parent_tool_use_id: Option<&'a str>,
    pub session_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PromptBody<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> UserPrompt<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            kind: "user",
            message: PromptBody {
                role: "user",
                content,
            },
            parent_tool_use_id: None,
            session_id: "default",
        }
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
