use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use super::options::AgentOptions;
use super::protocol::{Message, UserPrompt};
use super::AgentSession;
use crate::error::{AgentError, AgentResult};
use crate::log;

/// Connection to a running agent CLI process
pub struct AgentClient {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: FramedRead<ChildStdout, LinesCodec>,
    /// Collects stderr so it can be attached to a process failure
    stderr_task: Option<JoinHandle<String>>,
    cli_path: PathBuf,
}

impl AgentClient {
    /// Spawn the agent process
    pub fn spawn(options: &AgentOptions) -> AgentResult<Self> {
        let args = options.cli_args();
        log::log_event(&format!(
            "Spawning {} {}",
            options.cli_path.display(),
            args.join(" ")
        ));

        let mut command = Command::new(&options.cli_path);
        command.args(&args);
        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }

        Self::spawn_command(command, options.cli_path.clone())
    }

    fn spawn_command(mut command: Command, cli_path: PathBuf) -> AgentResult<Self> {
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => AgentError::CliNotFound(cli_path.clone()),
            _ => AgentError::SpawnFailed(e.to_string()),
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::SpawnFailed("No stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::SpawnFailed("No stdout".to_string()))?;

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        Ok(Self {
            child,
            stdin: Some(stdin),
            lines: FramedRead::new(stdout, LinesCodec::new()),
            stderr_task,
            cli_path,
        })
    }

    /// Wait for the process once stdout is exhausted and turn a bad exit
    /// status into an error.
    async fn finish(&mut self) -> AgentResult<()> {
        self.stdin.take();
        let status = self.child.wait().await?;
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        log::log_event(&format!(
            "{} exited with {}",
            self.cli_path.display(),
            status
        ));

        if status.success() {
            Ok(())
        } else {
            if !stderr.trim().is_empty() {
                log::log(&format!("agent stderr: {}", stderr.trim()));
            }
            Err(AgentError::Process {
                exit_code: status.code(),
                stderr,
            })
        }
    }
}

impl AgentSession for AgentClient {
    async fn query(&mut self, prompt: &str) -> AgentResult<()> {
        let line = UserPrompt::new(prompt)
            .to_line()
            .map_err(|e| AgentError::Protocol(e.to_string()))?;
        let stdin = self.stdin.as_mut().ok_or(AgentError::Disconnected)?;

        log::log_outgoing("user", &line);
        let write = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await?;
            Ok::<_, std::io::Error>(())
        };
        let written = write.await;
        match written {
            Ok(()) => Ok(()),
            // The agent went away between turns; its exit status says why.
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                log::log_event("Agent stdin closed while sending prompt");
                self.finish().await?;
                Err(AgentError::Disconnected)
            }
            Err(e) => Err(AgentError::Io(e)),
        }
    }

    async fn next_message(&mut self) -> AgentResult<Option<Message>> {
        loop {
            match self.lines.next().await {
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let parsed = Message::parse(&line);
                    let kind = parsed.as_ref().map(|m| m.kind()).unwrap_or("invalid");
                    log::log_incoming(kind, &line);
                    return parsed.map(Some).map_err(|e| {
                        AgentError::Protocol(format!("invalid message from agent: {}", e))
                    });
                }
                Some(Err(LinesCodecError::Io(e))) => return Err(AgentError::Io(e)),
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    return Err(AgentError::Protocol("line too long".to_string()));
                }
                None => {
                    self.finish().await?;
                    return Ok(None);
                }
            }
        }
    }

    async fn end_input(&mut self) -> AgentResult<()> {
        if self.stdin.take().is_some() {
            log::log_event("Closed agent stdin");
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn fake_agent(script: &str) -> AgentClient {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        AgentClient::spawn_command(command, PathBuf::from("sh")).unwrap()
    }

    #[tokio::test]
    async fn test_missing_cli_maps_to_not_found() {
        let options = AgentOptions {
            cli_path: PathBuf::from("/definitely/not/here/agent"),
            ..AgentOptions::default()
        };
        match AgentClient::spawn(&options) {
            Err(AgentError::CliNotFound(path)) => {
                assert_eq!(path, PathBuf::from("/definitely/not/here/agent"))
            }
            Err(e) => panic!("unexpected error {:?}", e),
            Ok(_) => panic!("spawn should fail"),
        }
    }

    #[tokio::test]
    async fn test_reads_messages_until_eof() {
        let script = r#"
read prompt
echo '{"type":"system","subtype":"init","session_id":"s1"}'
echo ''
echo '{"type":"assistant","message":{"content":[{"type":"text","text":"hi"}]}}'
echo '{"type":"result","subtype":"success","result":"ok"}'
"#;
        let mut agent = fake_agent(script);
        agent.query("hello").await.unwrap();

        assert!(matches!(agent.next_message().await.unwrap(), Some(Message::System(_))));
        assert!(matches!(agent.next_message().await.unwrap(), Some(Message::Assistant(_))));
        match agent.next_message().await.unwrap() {
            Some(Message::Result(result)) => assert_eq!(result.description(), "ok"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(agent.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prompt_is_written_as_user_line() {
        let mut agent = fake_agent(r#"read -r prompt; echo "$prompt" >&2; exit 7"#);
        agent.query("yes").await.unwrap();

        match agent.next_message().await {
            Err(AgentError::Process { exit_code, stderr }) => {
                assert_eq!(exit_code, Some(7));
                let sent: serde_json::Value = serde_json::from_str(stderr.trim()).unwrap();
                assert_eq!(sent["type"], "user");
                assert_eq!(sent["message"]["content"], "yes");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_process_error() {
        let mut agent = fake_agent("echo oops >&2; exit 3");
        match agent.next_message().await {
            Err(AgentError::Process { exit_code, stderr }) => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr.trim(), "oops");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_line_is_protocol_error() {
        let mut agent = fake_agent("echo 'not json'");
        assert!(matches!(
            agent.next_message().await,
            Err(AgentError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_agent_exit_between_turns_reports_exit_code() {
        let script = r#"read -r p; echo '{"type":"result","subtype":"success","result":"ok"}'; echo gone >&2; exit 5"#;
        let mut agent = fake_agent(script);
        agent.query("hello").await.unwrap();
        assert!(matches!(agent.next_message().await.unwrap(), Some(Message::Result(_))));

        // Let the process exit so the next write hits a closed pipe.
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        match agent.query("yes").await {
            Err(AgentError::Process { exit_code, stderr }) => {
                assert_eq!(exit_code, Some(5));
                assert_eq!(stderr.trim(), "gone");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clean_exit_between_turns_is_disconnected() {
        let script = r#"read -r p; echo '{"type":"result","subtype":"success","result":"ok"}'"#;
        let mut agent = fake_agent(script);
        agent.query("hello").await.unwrap();
        assert!(matches!(agent.next_message().await.unwrap(), Some(Message::Result(_))));

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        assert!(matches!(
            agent.query("yes").await,
            Err(AgentError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_query_after_end_input_is_disconnected() {
        let mut agent = fake_agent("cat >/dev/null");
        agent.end_input().await.unwrap();
        assert!(matches!(
            agent.query("late").await,
            Err(AgentError::Disconnected)
        ));
        assert!(agent.next_message().await.unwrap().is_none());
    }
}
