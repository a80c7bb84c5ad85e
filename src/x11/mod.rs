//! X11 desktop backends.
//!
//! This module provides concrete implementations of the
//! [`Desktop`](crate::traits::Desktop), [`Prompter`](crate::traits::Prompter)
//! and [`TextLocator`](crate::traits::TextLocator) traits by shelling out to
//! xdotool, bspc, scrot, notify-send, rofi and tesseract.
//!
//! Nothing outside this module should spawn those tools directly.

pub mod desktop;
pub mod ocr;
pub mod rofi;

use std::process::{Command, Output, Stdio};

/// Run `program args…` to completion and return its output, failing on a
/// spawn error or a non-zero exit status.
pub(crate) fn run_tool(program: &str, args: &[&str]) -> Result<Output, String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| format!("failed to run {}: {}", program, e))?;
    if !output.status.success() {
        return Err(format!(
            "{} {} exited with {}: {}",
            program,
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(output)
}
