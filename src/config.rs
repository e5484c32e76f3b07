//! Configuration file support for taskpilot.
//!
//! Configuration is loaded from `~/.config/taskpilot/config.toml` with the following precedence:
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`TASKPILOT_CLI`)
//! 3. Configuration file
//! 4. Default values (lowest priority)
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.config/taskpilot/config.toml
//! cli_path = "/usr/local/bin/claude"
//! allowed_tools = ["Read", "Edit", "Glob", "Grep"]
//! permission_mode = "acceptEdits"
//! model = "sonnet"
//! task_file = "TODO.md"
//! thinking_preview_chars = 160
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::agent::{AgentOptions, PermissionMode, DEFAULT_ALLOWED_TOOLS, DEFAULT_CLI};
use crate::printer::DEFAULT_THINKING_PREVIEW_CHARS;

/// Environment variable naming the agent executable.
pub const CLI_ENV_VAR: &str = "TASKPILOT_CLI";

const DEFAULT_TASK_FILE: &str = "todo.md";

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Agent executable to spawn
    pub cli_path: Option<PathBuf>,

    /// Tools the agent may use
    pub allowed_tools: Option<Vec<String>>,

    /// Edit approval policy
    pub permission_mode: Option<PermissionMode>,

    /// Model override passed to the agent
    pub model: Option<String>,

    /// Task list the chat prompt points the agent at
    pub task_file: Option<PathBuf>,

    /// Thinking preview length in chat mode
    pub thinking_preview_chars: Option<usize>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cli_path: Option<PathBuf>,
    pub allowed_tools: Option<Vec<String>>,
    pub permission_mode: Option<PermissionMode>,
    pub model: Option<String>,
    pub task_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default configuration if file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, with the same fallbacks as `load`.
    pub fn load_from(config_path: &Path) -> Self {
        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskpilot")
            .join("config.toml")
    }

    /// Merge with CLI overrides.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if overrides.cli_path.is_some() {
            self.cli_path = overrides.cli_path;
        }
        if overrides.allowed_tools.is_some() {
            self.allowed_tools = overrides.allowed_tools;
        }
        if overrides.permission_mode.is_some() {
            self.permission_mode = overrides.permission_mode;
        }
        if overrides.model.is_some() {
            self.model = overrides.model;
        }
        if overrides.task_file.is_some() {
            self.task_file = overrides.task_file;
        }
        self
    }

    /// Get the agent executable, falling back to environment variable or default.
    pub fn cli_path(&self) -> PathBuf {
        self.cli_path
            .clone()
            .or_else(|| std::env::var(CLI_ENV_VAR).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLI))
    }

    pub fn allowed_tools(&self) -> Vec<String> {
        self.allowed_tools
            .clone()
            .unwrap_or_else(|| DEFAULT_ALLOWED_TOOLS.iter().map(|s| s.to_string()).collect())
    }

    pub fn permission_mode(&self) -> PermissionMode {
        self.permission_mode.unwrap_or_default()
    }

    pub fn task_file(&self) -> PathBuf {
        self.task_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TASK_FILE))
    }

    pub fn thinking_preview_chars(&self) -> usize {
        self.thinking_preview_chars
            .unwrap_or(DEFAULT_THINKING_PREVIEW_CHARS)
    }

    /// Options for launching the agent in `cwd`.
    pub fn agent_options(&self, cwd: Option<PathBuf>) -> AgentOptions {
        AgentOptions {
            cli_path: self.cli_path(),
            cwd,
            allowed_tools: self.allowed_tools(),
            permission_mode: self.permission_mode(),
            model: self.model.clone(),
        }
    }
}
