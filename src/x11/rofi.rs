//! [`Prompter`] backed by `rofi -dmenu`.

use crate::traits::Prompter;
use log::debug;
use std::io::Write;
use std::process::{Command, Stdio};

/// Shows a rofi dmenu and returns the trimmed selection.
pub struct Rofi {
    program: String,
}

#[derive(Debug, thiserror::Error)]
#[error("rofi error: {0}")]
pub struct RofiError(String);

impl Default for Rofi {
    fn default() -> Self {
        Self::new("rofi")
    }
}

impl Rofi {
    /// Use `program` instead of `rofi` (any dmenu-compatible binary that
    /// accepts `-dmenu -p PROMPT` works).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Trim rofi's stdout; an empty answer means "nothing chosen".
pub(crate) fn selection_from_stdout(stdout: &[u8]) -> Option<String> {
    let s = String::from_utf8_lossy(stdout).trim().to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

impl Prompter for Rofi {
    type Error = RofiError;

    fn choose(&self, prompt: &str, options: &[String]) -> Result<Option<String>, Self::Error> {
        debug!("{} -dmenu -p {:?} ({} options)", self.program, prompt, options.len());
        let mut child = Command::new(&self.program)
            .args(["-dmenu", "-p", prompt])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| RofiError(format!("failed to run {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(options.join("\n").as_bytes())
                .map_err(|e| RofiError(format!("write: {}", e)))?;
        }

        // rofi exits non-zero when the menu is dismissed; that is just "no
        // answer", not an error.
        let output = child
            .wait_with_output()
            .map_err(|e| RofiError(format!("wait: {}", e)))?;
        Ok(selection_from_stdout(&output.stdout))
    }
}
