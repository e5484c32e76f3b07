//! Line-oriented console input
//!
//! Stdin is read on a dedicated thread so a pending read never holds up
//! runtime shutdown. Ctrl-C while waiting for a line counts as end of input.

use std::io::{self, BufRead};
use std::thread;

use tokio::sync::mpsc;

/// Source of user replies for the chat loop.
#[allow(async_fn_in_trait)]
pub trait LineReader {
    /// Next line without its terminator, or `None` on end of input or interrupt.
    async fn read_line(&mut self) -> io::Result<Option<String>>;
}

pub struct StdinReader {
    rx: mpsc::Receiver<io::Result<String>>,
}

impl StdinReader {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(16);
        thread::spawn(move || {
            let stdin = io::stdin();
            let mut stdin = stdin.lock();
            loop {
                let Some(line) = next_line(&mut stdin).transpose() else {
                    break;
                };
                let stop = line.is_err();
                if tx.blocking_send(line).is_err() || stop {
                    break;
                }
            }
        });
        Self { rx }
    }
}

/// One line without `\n` or `\r\n`. Bytes that aren't UTF-8 are replaced
/// instead of failing the read.
fn next_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

impl LineReader for StdinReader {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        tokio::select! {
            line = self.rx.recv() => line.transpose(),
            _ = tokio::signal::ctrl_c() => Ok(None),
        }
    }
}
