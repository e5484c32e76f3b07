//! Session log file
//!
//! Stdout belongs to the conversation, so diagnostics go to a per-run file
//! under `~/.taskpilot/logs`. Every NDJSON line exchanged with the agent is
//! recorded with its direction and message type.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use once_cell::sync::Lazy;

const MAX_LINE_PREVIEW: usize = 500;

static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

/// Direction of an NDJSON line relative to taskpilot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wire {
    FromAgent,
    ToAgent,
}

/// `~/.taskpilot/logs`, or `./.taskpilot/logs` without a home directory.
pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".taskpilot")
        .join("logs")
}

/// Start logging to a fresh file in the default log directory.
pub fn init() -> std::io::Result<PathBuf> {
    init_in(&log_dir())
}

/// Start logging to a fresh timestamped file in `dir`.
pub fn init_in(dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let log_path = dir.join(format!(
        "taskpilot_{}.log",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)?;

    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(file);
    }
    log("=== taskpilot started ===");

    Ok(log_path)
}

/// Append a timestamped line. No-op until `init` succeeds.
pub fn log(msg: &str) {
    let Ok(mut guard) = LOG_FILE.lock() else {
        return;
    };
    if let Some(file) = guard.as_mut() {
        let _ = writeln!(file, "[{}] {}", Local::now().format("%H:%M:%S%.3f"), msg);
        let _ = file.flush();
    }
}

/// Record a line read from the agent, tagged with its message type.
pub fn log_incoming(kind: &str, line: &str) {
    log(&wire_entry(Wire::FromAgent, kind, line));
}

/// Record a line written to the agent, tagged with its message type.
pub fn log_outgoing(kind: &str, line: &str) {
    log(&wire_entry(Wire::ToAgent, kind, line));
}

pub fn log_event(event: &str) {
    log(&format!("[EVENT] {}", event));
}

fn wire_entry(wire: Wire, kind: &str, line: &str) -> String {
    let arrow = match wire {
        Wire::FromAgent => "<--",
        Wire::ToAgent => "-->",
    };
    format!("{} {} {}", arrow, kind, preview(line))
}

fn preview(line: &str) -> String {
    if line.len() <= MAX_LINE_PREVIEW {
        return line.to_string();
    }
    let mut cut = MAX_LINE_PREVIEW;
    while !line.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... ({} bytes total)", &line[..cut], line.len())
}
