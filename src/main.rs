mod agent;
mod chat;
mod cli;
mod config;
mod console;
mod error;
mod log;
mod printer;
mod stream;

use std::io::{self, stderr, stdout, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use agent::{AgentClient, AgentOptions};
use cli::{Cli, Command};
use config::Config;
use console::StdinReader;
use error::{AgentError, PilotError};
use printer::MessagePrinter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Ok(log_path) = log::init() {
        log::log(&format!("Log file: {}", log_path.display()));
    }

    let cwd = match &cli.cwd {
        Some(dir) if !dir.is_dir() => bail!("'{}' is not a directory", dir.display()),
        Some(dir) => Some(dir.canonicalize().unwrap_or_else(|_| dir.clone())),
        None => None,
    };

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .with_overrides(cli.overrides());
    let options = config.agent_options(cwd.clone());

    let outcome = match cli.command {
        None | Some(Command::Chat(_)) => run_chat(&config, &options, cwd).await,
        Some(Command::Stream(args)) => {
            let prompt = args.prompt.unwrap_or_else(|| stream::DEFAULT_PROMPT.to_string());
            run_stream(&options, &prompt).await
        }
    };

    // Agent failures are reported, not propagated: the run still ends normally.
    if let Err(e) = outcome {
        report_failure(&e, &mut stdout(), &mut stderr())?;
    }

    log::log("=== taskpilot finished ===");
    Ok(())
}

/// Print a failed run: the agent's own stderr to `err`, the report line to `out`.
fn report_failure<O: Write, E: Write>(e: &PilotError, out: &mut O, err: &mut E) -> io::Result<()> {
    log::log(&format!("Run failed: {}", e));
    match e {
        PilotError::Agent(agent_err) => {
            if let AgentError::Process { stderr, .. } = agent_err {
                if !stderr.trim().is_empty() {
                    writeln!(err, "{}", stderr.trim())?;
                }
            }
            writeln!(out, "{}", agent_err.report())?;
        }
        PilotError::Console(io_err) => writeln!(err, "Console error: {}", io_err)?,
    }
    out.flush()
}

async fn run_chat(config: &Config, options: &AgentOptions, cwd: Option<PathBuf>) -> error::Result<()> {
    let task_file = config.task_file();
    let task_path = cwd.unwrap_or_default().join(&task_file);
    if !task_path.exists() {
        log::log(&format!(
            "Warning: task file {} does not exist; the agent will report it",
            task_path.display()
        ));
    }

    let mut agent = AgentClient::spawn(options)?;
    let mut input = StdinReader::spawn();
    let printer = MessagePrinter::summary(config.thinking_preview_chars());
    let prompt = chat::initial_prompt(&task_file);

    chat::run(&mut agent, &mut input, &printer, &mut stdout(), &prompt).await
}

async fn run_stream(options: &AgentOptions, prompt: &str) -> error::Result<()> {
    let mut agent = AgentClient::spawn(options)?;
    let printer = MessagePrinter::full();

    stream::run(&mut agent, &printer, &mut stdout(), prompt).await
}
