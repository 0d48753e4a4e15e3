//! Interactive line-by-line sending.
//!
//! Each line is sent as one message. A trailing token that looks like a path
//! is attached as a file candidate. `quit`, `exit`, `q` or end of input stop
//! the loop.

use super::{report_outcome, DeliveryClient};
use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::debug;

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

/// What a single input line asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum LineCommand {
    Exit,
    Empty,
    Send { text: String, file: Option<String> },
}

/// Counts of messages handled by the loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplStats {
    pub sent: usize,
    pub failed: usize,
}

impl ReplStats {
    /// True when no message failed to deliver.
    pub fn all_delivered(&self) -> bool {
        self.failed == 0
    }
}

/// Interpret one line of input.
pub fn parse_line(line: &str) -> LineCommand {
    let line = line.trim();
    if line.is_empty() {
        return LineCommand::Empty;
    }
    if EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w)) {
        return LineCommand::Exit;
    }

    if let Some((text, last)) = line.rsplit_once(char::is_whitespace) {
        let text = text.trim_end();
        if !text.is_empty() && looks_like_path(last) {
            return LineCommand::Send {
                text: text.to_string(),
                file: Some(last.to_string()),
            };
        }
    }

    LineCommand::Send {
        text: line.to_string(),
        file: None,
    }
}

fn looks_like_path(token: &str) -> bool {
    token.starts_with('/')
        || token.starts_with("./")
        || token.starts_with("../")
        || token.starts_with("~/")
        || token.contains('\\')
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().into_owned(),
        _ => path.to_string(),
    }
}

/// Read lines from `input` and send each one until an exit word or EOF.
pub async fn run_repl<R, W>(
    client: &DeliveryClient,
    mut input: R,
    out: &mut W,
    show_prompt: bool,
) -> Result<ReplStats>
where
    R: BufRead,
    W: Write,
{
    let mut stats = ReplStats::default();

    if show_prompt {
        writeln!(
            out,
            "Enter a message to send (type 'quit' to exit). Append a file path to attach it."
        )?;
    }

    loop {
        if show_prompt {
            write!(out, "\nmessage> ")?;
            out.flush()?;
        }

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        match parse_line(&line) {
            LineCommand::Exit => break,
            LineCommand::Empty => {
                writeln!(out, "Message cannot be empty")?;
            }
            LineCommand::Send { text, file } => {
                let candidates: Vec<String> = file.iter().map(|f| expand_home(f)).collect();
                debug!("Interactive send with {} file candidate(s)", candidates.len());
                let outcome = client.send(&text, &candidates).await;
                if report_outcome(&outcome, out)? {
                    stats.sent += 1;
                } else {
                    stats.failed += 1;
                }
            }
        }
    }

    if show_prompt {
        writeln!(out, "Goodbye")?;
    }
    Ok(stats)
}
