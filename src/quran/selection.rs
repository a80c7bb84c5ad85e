//! The saved surah / ayah range.

use super::metadata::Metadata;
use super::{io_err, QuranError};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::Path;

/// What to play.  Persisted as
/// `{"current_surah": "002", "start_ayah": 1, "end_ayah": 5}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Zero-padded three-digit surah number.
    pub current_surah: String,
    pub start_ayah: u32,
    pub end_ayah: u32,
}

impl Selection {
    /// Build a validated selection from raw user input.  The surah must be
    /// known to `meta`.
    pub fn new(surah: &str, start: u32, end: u32, meta: &Metadata) -> Result<Self, QuranError> {
        let current_surah = known_surah(surah, meta)?;
        validate_range(meta.ayah_count(&current_surah), start, end)?;
        Ok(Self {
            current_surah,
            start_ayah: start,
            end_ayah: end,
        })
    }

    /// Numeric surah.
    pub fn surah_number(&self) -> Result<u32, QuranError> {
        self.current_surah
            .parse()
            .map_err(|_| QuranError::InvalidSurah(self.current_surah.clone()))
    }

    /// `Some` if a selection was saved, `None` if the state file is absent.
    pub fn load(path: &Path) -> Result<Option<Self>, QuranError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(path, e)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| QuranError::Json {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Write the selection, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), QuranError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let json = serde_json::to_string(self).map_err(|source| QuranError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|e| io_err(path, e))
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.current_surah, self.start_ayah, self.end_ayah)
    }
}

/// Zero-pad a surah number to three digits (`"2"` → `"002"`).
pub fn pad_surah(input: &str) -> Result<String, QuranError> {
    let trimmed = input.trim();
    let n: u32 = trimmed
        .parse()
        .map_err(|_| QuranError::InvalidSurah(input.to_string()))?;
    if n == 0 {
        return Err(QuranError::InvalidSurah(input.to_string()));
    }
    Ok(format!("{:03}", n))
}

/// [`pad_surah`], rejecting surahs `meta` does not know.
pub fn known_surah(input: &str, meta: &Metadata) -> Result<String, QuranError> {
    let surah = pad_surah(input)?;
    if meta.knows(&surah) {
        Ok(surah)
    } else {
        Err(QuranError::InvalidSurah(input.to_string()))
    }
}

/// A range is valid when it is not reversed and (if the surah's length is
/// known) does not run past the last ayah.
pub fn validate_range(count: u32, start: u32, end: u32) -> Result<(), QuranError> {
    if start <= end && (count == 0 || end <= count) {
        Ok(())
    } else {
        Err(QuranError::InvalidRange { start, end, count })
    }
}

/// Ask for a selection on a terminal.
///
/// Invalid ranges re-prompt.  Returns `None` when input ends before a
/// valid selection was entered.
pub fn prompt_selection<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    meta: &Metadata,
) -> Result<Option<Selection>, QuranError> {
    let surah = loop {
        let Some(line) = ask(input, output, "Select Surah (e.g., 002): ")? else {
            return Ok(None);
        };
        match known_surah(&line, meta) {
            Ok(s) => break s,
            Err(_) => say(output, "Invalid surah. Please try again.")?,
        }
    };
    let count = meta.ayah_count(&surah);

    loop {
        let Some(start) = ask(input, output, "From Ayah: ")? else {
            return Ok(None);
        };
        let Some(end) = ask(input, output, "To Ayah: ")? else {
            return Ok(None);
        };
        if let (Ok(start), Ok(end)) = (start.parse::<u32>(), end.parse::<u32>()) {
            if validate_range(count, start, end).is_ok() {
                return Ok(Some(Selection {
                    current_surah: surah,
                    start_ayah: start,
                    end_ayah: end,
                }));
            }
        }
        say(output, "Invalid range. Please try again.")?;
    }
}

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> Result<Option<String>, QuranError> {
    let stdio = |e| io_err(Path::new("<stdio>"), e);
    write!(output, "{}", prompt).map_err(stdio)?;
    output.flush().map_err(stdio)?;
    let mut line = String::new();
    if input.read_line(&mut line).map_err(stdio)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn say<W: Write>(output: &mut W, msg: &str) -> Result<(), QuranError> {
    writeln!(output, "{}", msg).map_err(|e| io_err(Path::new("<stdio>"), e))
}
