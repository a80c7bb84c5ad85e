//! Opening flow files in the user's editor.

use super::FlowError;
use log::info;
use std::path::Path;
use std::process::Command;

/// Editor used when nothing else is configured.
pub const FALLBACK_EDITOR: &str = "vim";

/// Read the editor out of a `~/.selected_editor` file.
///
/// Debian's `select-editor` writes
///
/// ```text
/// # Generated by /usr/bin/select-editor
/// SELECTED_EDITOR="/usr/bin/vim.basic"
/// ```
///
/// while hand-written files often contain just the command.  Both are
/// accepted.
pub fn parse_selected_editor(contents: &str) -> Option<String> {
    let line = contents
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))?;
    let value = line.strip_prefix("SELECTED_EDITOR=").unwrap_or(line);
    let value = value.trim().trim_matches('"').trim_matches('\'').trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Pick the editor: configured command, then `selected_editor` file
/// contents, then `$EDITOR`, then [`FALLBACK_EDITOR`].
pub fn resolve_editor(
    configured: Option<&str>,
    selected_editor_file: Option<&str>,
    env_editor: Option<&str>,
) -> String {
    let nonempty = |s: &&str| !s.trim().is_empty();
    configured
        .filter(nonempty)
        .map(|s| s.trim().to_string())
        .or_else(|| selected_editor_file.and_then(parse_selected_editor))
        .or_else(|| env_editor.filter(nonempty).map(|s| s.trim().to_string()))
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Resolve the editor from the real environment.
pub fn detect_editor(configured: Option<&str>, home: &Path) -> String {
    let selected = std::fs::read_to_string(home.join(".selected_editor")).ok();
    let env_editor = std::env::var("EDITOR").ok();
    resolve_editor(configured, selected.as_deref(), env_editor.as_deref())
}

/// Run `editor file` and wait for it to exit.
///
/// The editor string may carry arguments (`"code --wait"`).
pub fn open(editor: &str, file: &Path) -> Result<(), FlowError> {
    let mut parts = editor.split_whitespace();
    let program = parts.next().ok_or_else(|| FlowError::Editor {
        editor: editor.to_string(),
        reason: "empty editor command".into(),
    })?;
    let status = Command::new(program)
        .args(parts)
        .arg(file)
        .status()
        .map_err(|e| FlowError::Editor {
            editor: editor.to_string(),
            reason: e.to_string(),
        })?;
    info!("closed {} for {} ({})", editor, file.display(), status);
    if status.success() {
        Ok(())
    } else {
        Err(FlowError::Editor {
            editor: editor.to_string(),
            reason: format!("exited with {}", status),
        })
    }
}
