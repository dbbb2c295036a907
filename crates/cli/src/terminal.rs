// Operator prompts on the controlling terminal.
//
// Prompts go to stderr; stdout is reserved for command output. Reads run on
// the blocking pool.

use std::io::{self, BufRead, Write};

use autolog_daemon::operator::Operator;
use autolog_daemon::BoxFuture;

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalOperator;

impl Operator for TerminalOperator {
    fn confirm(&self, prompt: &str) -> BoxFuture<'_, bool> {
        let prompt = format!("{prompt} [y/N] ");
        Box::pin(async move {
            read_line(prompt).await.is_some_and(|answer| is_affirmative(&answer))
        })
    }

    fn input(&self, prompt: &str) -> BoxFuture<'_, Option<String>> {
        let prompt = format!("{prompt} ");
        Box::pin(read_line(prompt))
    }
}

/// Print `prompt` and read one line. `None` on EOF or a read error.
pub async fn read_line(prompt: String) -> Option<String> {
    tokio::task::spawn_blocking(move || {
        let mut err = io::stderr().lock();
        let _ = write!(err, "{prompt}");
        let _ = err.flush();
        drop(err);

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    })
    .await
    .ok()
    .flatten()
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
