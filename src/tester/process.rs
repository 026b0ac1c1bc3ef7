//! Run the rendered program in a child interpreter.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::TestRunner;
use crate::program::{DefinitionKind, ProgramStore};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_OUTPUT: usize = 4_000;

/// Message returned when there is nothing to run yet.
pub const EMPTY_PROGRAM_REPORT: &str = "There is no program to run yet: no code has been merged.";

/// Feeds the program to `<interpreter> -` on stdin and reports its output.
#[derive(Debug, Clone)]
pub struct ProcessTestRunner {
    interpreter: String,
    timeout: Duration,
    max_output: usize,
}

impl Default for ProcessTestRunner {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl ProcessTestRunner {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout: DEFAULT_TIMEOUT,
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cap on characters kept from each of stdout and stderr.
    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    /// The script handed to the interpreter.
    ///
    /// A program that defines `main` but never calls it gets the usual
    /// `__main__` guard appended.
    pub fn script(program: &ProgramStore) -> String {
        let mut script = program.render();
        let calls_main = program
            .definitions()
            .any(|d| d.kind == DefinitionKind::Statement && d.source.contains("__main__"));
        let defines_main = program
            .get("main")
            .is_some_and(|d| d.kind == DefinitionKind::Function);
        if defines_main && !calls_main {
            script.push_str("\n\nif __name__ == \"__main__\":\n    main()\n");
        }
        script
    }

    async fn execute(&self, script: &str) -> std::io::Result<Option<std::process::Output>> {
        let mut child = Command::new(&self.interpreter)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        // On timeout the child is dropped, which kills it.
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map(Some),
            Err(_) => Ok(None),
        }
    }

    fn format_output(&self, output: &std::process::Output) -> String {
        let status = match output.status.code() {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        };
        let stdout = truncate(&String::from_utf8_lossy(&output.stdout), self.max_output);
        let stderr = truncate(&String::from_utf8_lossy(&output.stderr), self.max_output);

        let mut report = format!("Program finished with {status}.\n");
        if !stdout.trim().is_empty() {
            report.push_str(&format!("--- stdout ---\n{}\n", stdout.trim_end()));
        }
        if !stderr.trim().is_empty() {
            report.push_str(&format!("--- stderr ---\n{}\n", stderr.trim_end()));
        }
        if stdout.trim().is_empty() && stderr.trim().is_empty() {
            report.push_str("(no output)\n");
        }
        report
    }
}

#[async_trait]
impl TestRunner for ProcessTestRunner {
    async fn run(&self, program: &ProgramStore) -> String {
        if program.is_empty() {
            return EMPTY_PROGRAM_REPORT.to_string();
        }

        let script = Self::script(program);
        debug!(interpreter = %self.interpreter, bytes = script.len(), "running program");

        match self.execute(&script).await {
            Ok(Some(output)) => self.format_output(&output),
            Ok(None) => {
                warn!(timeout_secs = self.timeout.as_secs(), "program run timed out");
                format!(
                    "Program did not finish within {} seconds and was stopped.",
                    self.timeout.as_secs()
                )
            }
            Err(e) => {
                warn!(interpreter = %self.interpreter, error = %e, "could not run program");
                format!("Could not run the program with '{}': {e}", self.interpreter)
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}\n... (output truncated)", &text[..cut]),
        None => text.to_string(),
    }
}
