use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

/// Tools the agent may use without asking when nothing else is configured.
pub const DEFAULT_ALLOWED_TOOLS: [&str; 3] = ["Read", "Edit", "Glob"];

/// Default agent executable, looked up on `PATH`.
pub const DEFAULT_CLI: &str = "claude";

/// Whether proposed edits are auto-approved or need confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    Default,
    #[default]
    AcceptEdits,
    Plan,
    BypassPermissions,
}

impl PermissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::Plan => "plan",
            PermissionMode::BypassPermissions => "bypassPermissions",
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(PermissionMode::Default),
            "acceptEdits" => Ok(PermissionMode::AcceptEdits),
            "plan" => Ok(PermissionMode::Plan),
            "bypassPermissions" => Ok(PermissionMode::BypassPermissions),
            other => Err(format!(
                "unknown permission mode '{}' (expected default, acceptEdits, plan or bypassPermissions)",
                other
            )),
        }
    }
}

/// How the agent process is launched.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOptions {
    pub cli_path: PathBuf,
    pub cwd: Option<PathBuf>,
    pub allowed_tools: Vec<String>,
    pub permission_mode: PermissionMode,
    pub model: Option<String>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            cli_path: PathBuf::from(DEFAULT_CLI),
            cwd: None,
            allowed_tools: DEFAULT_ALLOWED_TOOLS.iter().map(|s| s.to_string()).collect(),
            permission_mode: PermissionMode::default(),
            model: None,
        }
    }
}

impl AgentOptions {
    /// Arguments for a stream-json session over stdin/stdout.
    pub fn cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
            "--input-format".to_string(),
            "stream-json".to_string(),
        ];

        if !self.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(self.allowed_tools.join(","));
        }

        args.push("--permission-mode".to_string());
        args.push(self.permission_mode.as_str().to_string());

        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }

        args
    }
}
