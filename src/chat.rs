//! Interactive task selection
//!
//! The agent reads the task list itself and proposes a task. Each completed
//! turn hands control back to the user, whose reply becomes the next prompt.

use std::io::Write;
use std::path::Path;

use crate::agent::{AgentSession, Message};
use crate::console::LineReader;
use crate::error::{AgentError, Result};
use crate::log;
use crate::printer::MessagePrinter;

/// Replies that end the conversation, compared case-insensitively.
pub const EXIT_KEYWORDS: [&str; 4] = ["exit", "quit", "bye", "q"];

const USER_PROMPT: &str = "You: ";

/// First prompt sent to the agent for the given task list file.
pub fn initial_prompt(task_file: &Path) -> String {
    let name = task_file.display();
    format!(
        "Read {name} and select the first incomplete item. \
         Prompt the user if they want to complete this task or to skip it. \
         If they want to skip it, select the next item and prompt the user. \
         Once a todo item is selected, generate a prompt for Claude Code to complete it."
    )
}

pub fn is_exit_keyword(input: &str) -> bool {
    EXIT_KEYWORDS
        .iter()
        .any(|keyword| input.eq_ignore_ascii_case(keyword))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    AwaitingAgentTurn,
    AwaitingUserInput,
    Terminated,
}

/// Run the conversation until the user leaves or the agent reports an error.
pub async fn run<A, R, W>(
    agent: &mut A,
    input: &mut R,
    printer: &MessagePrinter,
    out: &mut W,
    initial_prompt: &str,
) -> Result<()>
where
    A: AgentSession,
    R: LineReader,
    W: Write,
{
    agent.query(initial_prompt).await?;
    let mut state = ChatState::AwaitingAgentTurn;

    loop {
        let next = match state {
            ChatState::AwaitingAgentTurn => finish_turn(agent, printer, out).await?,
            ChatState::AwaitingUserInput => read_reply(agent, input, out).await?,
            ChatState::Terminated => break,
        };
        if next != state {
            log::log_event(&format!("Chat state: {:?} -> {:?}", state, next));
        }
        state = next;
    }

    Ok(())
}

/// Print messages until the agent completes the current turn.
async fn finish_turn<A, W>(agent: &mut A, printer: &MessagePrinter, out: &mut W) -> Result<ChatState>
where
    A: AgentSession,
    W: Write,
{
    loop {
        let Some(message) = agent.next_message().await? else {
            return Err(AgentError::IncompleteTurn.into());
        };
        printer.print(&message, out)?;

        if let Message::Result(result) = &message {
            if result.is_error() {
                writeln!(out, "Error: {}", result.description())?;
                return Ok(ChatState::Terminated);
            }
            return Ok(ChatState::AwaitingUserInput);
        }
    }
}

/// Ask for one reply and decide what happens next.
async fn read_reply<A, R, W>(agent: &mut A, input: &mut R, out: &mut W) -> Result<ChatState>
where
    A: AgentSession,
    R: LineReader,
    W: Write,
{
    writeln!(out)?;
    write!(out, "{}", USER_PROMPT)?;
    out.flush()?;

    let Some(line) = input.read_line().await? else {
        writeln!(out, "\nGoodbye!")?;
        return Ok(ChatState::Terminated);
    };
    let reply = line.trim();

    if is_exit_keyword(reply) {
        writeln!(out, "Goodbye!")?;
        return Ok(ChatState::Terminated);
    }
    if reply.is_empty() {
        return Ok(ChatState::AwaitingUserInput);
    }

    agent.query(reply).await?;
    Ok(ChatState::AwaitingAgentTurn)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::agent::protocol::{AssistantMessage, MessageBody};
    use crate::agent::{ContentBlock, ResultMessage};
    use crate::console::scripted::ScriptedLines;
    use crate::error::{AgentResult, PilotError};
    use crate::printer::DEFAULT_THINKING_PREVIEW_CHARS;

    /// Agent that answers each prompt with a canned turn.
    pub(crate) struct ScriptedAgent {
        turns: VecDeque<Vec<Message>>,
        pending: VecDeque<Message>,
        pub prompts: Vec<String>,
        pub input_closed: bool,
    }

    impl ScriptedAgent {
        pub(crate) fn new(turns: Vec<Vec<Message>>) -> Self {
            Self {
                turns: turns.into(),
                pending: VecDeque::new(),
                prompts: vec![],
                input_closed: false,
            }
        }
    }

    impl AgentSession for ScriptedAgent {
        async fn query(&mut self, prompt: &str) -> AgentResult<()> {
            self.prompts.push(prompt.to_string());
            if let Some(turn) = self.turns.pop_front() {
                self.pending.extend(turn);
            }
            Ok(())
        }

        async fn next_message(&mut self) -> AgentResult<Option<Message>> {
            Ok(self.pending.pop_front())
        }

        async fn end_input(&mut self) -> AgentResult<()> {
            self.input_closed = true;
            Ok(())
        }
    }

    pub(crate) fn text(text: &str) -> Message {
        Message::Assistant(AssistantMessage {
            message: MessageBody {
                content: vec![ContentBlock::Text {
                    text: text.to_string(),
                }],
            },
        })
    }

    pub(crate) fn result(subtype: &str, text: Option<&str>) -> Message {
        Message::Result(ResultMessage {
            subtype: subtype.to_string(),
            is_error: false,
            result: text.map(|s| s.to_string()),
            errors: vec![],
            session_id: None,
            duration_ms: None,
            num_turns: None,
            total_cost_usd: None,
        })
    }

    fn ok_turn(reply: &str) -> Vec<Message> {
        vec![text(reply), result("success", Some(reply))]
    }

    async fn run_chat(agent: &mut ScriptedAgent, lines: &mut ScriptedLines) -> (Result<()>, String) {
        let printer = MessagePrinter::summary(DEFAULT_THINKING_PREVIEW_CHARS);
        let mut out = Vec::new();
        let res = run(agent, lines, &printer, &mut out, "start").await;
        (res, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_exit_keywords_any_case() {
        for word in ["exit", "EXIT", "Quit", "bYe", "q", "Q"] {
            assert!(is_exit_keyword(word), "{word}");
        }
        for word in ["", "yes", "quitting", "qq", "no"] {
            assert!(!is_exit_keyword(word), "{word}");
        }
    }

    #[test]
    fn test_initial_prompt_names_task_file() {
        let prompt = initial_prompt(Path::new("todo.md"));
        assert!(prompt.starts_with("Read todo.md and select the first incomplete item."));
        assert!(initial_prompt(Path::new("docs/TASKS.md")).contains("Read docs/TASKS.md "));
    }

    #[tokio::test]
    async fn test_exit_keyword_stops_without_new_prompt() {
        for word in ["exit", "QUIT", "Bye", "q", "  Q  "] {
            let mut agent = ScriptedAgent::new(vec![ok_turn("Pick a task?")]);
            let mut lines = ScriptedLines::new(&[word, "should not be read"]);

            let (res, out) = run_chat(&mut agent, &mut lines).await;
            res.unwrap();
            assert_eq!(agent.prompts, vec!["start"]);
            assert_eq!(lines.reads, 1);
            assert!(out.ends_with("You: Goodbye!\n"), "{out:?}");
        }
    }

    #[tokio::test]
    async fn test_empty_input_keeps_waiting() {
        let mut agent = ScriptedAgent::new(vec![ok_turn("Pick a task?")]);
        let mut lines = ScriptedLines::new(&["", "   ", "q"]);

        let (res, out) = run_chat(&mut agent, &mut lines).await;
        res.unwrap();
        assert_eq!(agent.prompts, vec!["start"]);
        assert_eq!(lines.reads, 3);
        assert_eq!(out.matches("You: ").count(), 3);
    }

    #[tokio::test]
    async fn test_error_result_terminates_and_prints_text() {
        let mut agent = ScriptedAgent::new(vec![vec![
            text("working"),
            result("error", Some("todo.md not found")),
        ]]);
        let mut lines = ScriptedLines::new(&["yes"]);

        let (res, out) = run_chat(&mut agent, &mut lines).await;
        res.unwrap();
        assert_eq!(lines.reads, 0);
        assert_eq!(out, "working\nError: todo.md not found\n");
    }

    #[tokio::test]
    async fn test_error_subtype_variants_terminate() {
        let mut agent = ScriptedAgent::new(vec![vec![result("error_max_turns", None)]]);
        let mut lines = ScriptedLines::new(&["yes"]);

        let (res, out) = run_chat(&mut agent, &mut lines).await;
        res.unwrap();
        assert_eq!(lines.reads, 0);
        assert_eq!(out, "Error: error_max_turns\n");
    }

    #[tokio::test]
    async fn test_success_returns_to_prompt() {
        let mut agent = ScriptedAgent::new(vec![ok_turn("one"), ok_turn("two")]);
        let mut lines = ScriptedLines::new(&["next"]);

        let (res, out) = run_chat(&mut agent, &mut lines).await;
        res.unwrap();
        assert_eq!(agent.prompts, vec!["start", "next"]);
        assert_eq!(lines.reads, 2);
        assert_eq!(out, "one\n\nYou: two\n\nYou: \nGoodbye!\n");
    }

    #[tokio::test]
    async fn test_task_selection_scenario() {
        let question = "Do you want to complete 'Write tests'?";
        let mut agent = ScriptedAgent::new(vec![
            ok_turn(question),
            ok_turn("Here is a prompt for Claude Code: write the tests."),
        ]);
        let mut lines = ScriptedLines::new(&["yes", "q"]);

        let initial = initial_prompt(Path::new("todo.md"));
        let printer = MessagePrinter::summary(DEFAULT_THINKING_PREVIEW_CHARS);
        let mut out = Vec::new();
        run(&mut agent, &mut lines, &printer, &mut out, &initial)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(agent.prompts, vec![initial, "yes".to_string()]);
        assert!(out.starts_with(&format!("{question}\n")));
        assert!(out.ends_with("You: Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_end_of_input_says_goodbye() {
        let mut agent = ScriptedAgent::new(vec![ok_turn("Pick a task?")]);
        let mut lines = ScriptedLines::new(&[]);

        let (res, out) = run_chat(&mut agent, &mut lines).await;
        res.unwrap();
        assert_eq!(agent.prompts, vec!["start"]);
        assert!(out.ends_with("You: \nGoodbye!\n"));
    }

    #[tokio::test]
    async fn test_stream_end_mid_turn_is_error() {
        let mut agent = ScriptedAgent::new(vec![vec![text("partial")]]);
        let mut lines = ScriptedLines::new(&["q"]);

        let (res, out) = run_chat(&mut agent, &mut lines).await;
        assert!(matches!(
            res,
            Err(PilotError::Agent(AgentError::IncompleteTurn))
        ));
        assert_eq!(out, "partial\n");
    }

    #[tokio::test]
    async fn test_reply_is_trimmed_before_forwarding() {
        let mut agent = ScriptedAgent::new(vec![ok_turn("a"), ok_turn("b")]);
        let mut lines = ScriptedLines::new(&["  skip it  ", "bye"]);

        let (res, _) = run_chat(&mut agent, &mut lines).await;
        res.unwrap();
        assert_eq!(agent.prompts, vec!["start", "skip it"]);
    }
}
