//! Ids of videos already downloaded.

use super::WatchlistError;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only id list, one id per line.
#[derive(Debug)]
pub struct DownloadCache {
    path: PathBuf,
    ids: HashSet<String>,
}

impl DownloadCache {
    /// Read the cache; a missing file is an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, WatchlistError> {
        let path = path.into();
        let ids = match std::fs::read_to_string(&path) {
            Ok(c) => c
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(source) => return Err(WatchlistError::Io { path, source }),
        };
        Ok(Self { path, ids })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.ids.contains(video_id)
    }

    /// Remember `video_id` and append it to the file.
    pub fn record(&mut self, video_id: &str) -> Result<(), WatchlistError> {
        let io = |source| WatchlistError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io)?;
        writeln!(file, "{}", video_id).map_err(io)?;
        self.ids.insert(video_id.to_string());
        Ok(())
    }
}
