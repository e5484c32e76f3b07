use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::agent::PermissionMode;
use crate::config::Overrides;

#[derive(Debug, Parser)]
#[command(
    name = "taskpilot",
    version,
    about = "Pick tasks from a todo list together with a coding agent"
)]
pub struct Cli {
    /// Config file (defaults to ~/.config/taskpilot/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Agent executable to spawn.
    #[arg(long, global = true)]
    pub cli_path: Option<PathBuf>,

    /// Working directory for the agent.
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Model override passed to the agent.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// default, acceptEdits, plan or bypassPermissions.
    #[arg(long, global = true)]
    pub permission_mode: Option<PermissionMode>,

    /// Comma-separated tool names the agent may use.
    #[arg(long, global = true, value_delimiter = ',')]
    pub allowed_tools: Option<Vec<String>>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Negotiate the next task interactively (default).
    Chat(ChatArgs),
    /// Send one prompt and stream the full response.
    Stream(StreamArgs),
}

#[derive(Debug, Args, Default)]
pub struct ChatArgs {
    /// Task list the agent should read.
    #[arg(long)]
    pub task_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct StreamArgs {
    /// Prompt to send instead of the built-in one.
    pub prompt: Option<String>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let task_file = match &self.command {
            Some(Command::Chat(args)) => args.task_file.clone(),
            _ => None,
        };
        Overrides {
            cli_path: self.cli_path.clone(),
            allowed_tools: self.allowed_tools.clone(),
            permission_mode: self.permission_mode,
            model: self.model.clone(),
            task_file,
        }
    }
}
