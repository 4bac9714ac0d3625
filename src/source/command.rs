//! Generator commands run through the shell.

use crate::error::{Result, RzfError};
use crate::source::reader::{Delimiter, ReaderSource};
use crate::source::CandidateSource;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::BufReader;
use tokio::process::{Child, Command};

/// Lines printed by a shell command on stdout.
///
/// The command runs under `$SHELL -c` (falling back to `sh`). A non-zero exit status is
/// reported as an ingestion failure once its output has been consumed.
pub struct CommandSource {
    command: String,
    child: Child,
    lines: ReaderSource,
    reaped: bool,
}

impl CommandSource {
    pub fn spawn(command: &str, delimiter: Delimiter) -> Result<Self> {
        let shell = std::env::var("SHELL")
            .ok()
            .filter(|shell| !shell.is_empty())
            .unwrap_or_else(|| "sh".to_string());

        let mut child = Command::new(&shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RzfError::command_failed(command, format!("{shell}: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RzfError::command_failed(command, "stdout was not captured"))?;

        log::debug!("spawned generator `{}` with {}", command, shell);

        Ok(Self {
            command: command.to_string(),
            child,
            lines: ReaderSource::new(BufReader::new(stdout), delimiter, format!("`{command}`")),
            reaped: false,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl CandidateSource for CommandSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<String>>> {
        if let Some(batch) = self.lines.next_batch().await? {
            return Ok(Some(batch));
        }
        if self.reaped {
            return Ok(None);
        }

        self.reaped = true;
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| RzfError::command_failed(&self.command, e.to_string()))?;
        if !status.success() {
            return Err(RzfError::command_failed(&self.command, status.to_string()));
        }
        Ok(None)
    }

    fn skipped_lines(&self) -> usize {
        self.lines.skipped_lines()
    }

    fn describe(&self) -> String {
        self.lines.describe()
    }
}
