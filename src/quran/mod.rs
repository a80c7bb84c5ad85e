//! Quran playback widget.
//!
//! A selection (surah plus ayah range) is saved in the state directory; playback
//! hands a playlist of per-ayah mp3 files to a detached mpv, which is then
//! paused, resumed and stopped over its IPC socket.  Only one playback is
//! expected at a time; the PID file is a convention, not a lock.

pub mod metadata;
pub mod playlist;
pub mod selection;
pub mod session;

use crate::mpv::ipc::MpvError;
use std::path::{Path, PathBuf};

/// Errors from the Quran widget.
#[derive(Debug, thiserror::Error)]
pub enum QuranError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid surah: {0:?}")]
    InvalidSurah(String),
    #[error("invalid ayah range {start}-{end} (surah has {count} ayat)")]
    InvalidRange { start: u32, end: u32, count: u32 },
    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },
    #[error("mpv: {0}")]
    Mpv(#[from] MpvError),
}

pub(crate) fn io_err(path: &Path, source: std::io::Error) -> QuranError {
    QuranError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Files the widget keeps in its state directory.
#[derive(Debug, Clone)]
pub struct StatePaths {
    dir: PathBuf,
}

impl StatePaths {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saved selection.
    pub fn state(&self) -> PathBuf {
        self.dir.join("state.json")
    }

    /// mpv's IPC socket.
    pub fn socket(&self) -> PathBuf {
        self.dir.join("mpv_socket")
    }

    /// PID of the running mpv.
    pub fn pid(&self) -> PathBuf {
        self.dir.join("mpv_pid")
    }

    pub fn playlist(&self) -> PathBuf {
        self.dir.join("playlist.txt")
    }

    pub fn ensure_dir(&self) -> Result<(), QuranError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))
    }
}
