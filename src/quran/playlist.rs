//! Per-ayah audio playlist.
//!
//! Audio collections name one file per ayah as `SSSAAA.mp3`: three-digit
//! surah, three-digit ayah (`002255.mp3` is Ayat al-Kursi).

use super::selection::Selection;
use super::{io_err, QuranError};
use log::warn;
use std::path::{Path, PathBuf};

/// File name for one ayah.
pub fn ayah_file_name(surah: u32, ayah: u32) -> String {
    format!("{:03}{:03}.mp3", surah, ayah)
}

/// Playlist for a selection, split into files that exist and files that
/// are missing from `audio_dir`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    pub entries: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

impl Playlist {
    pub fn build(audio_dir: &Path, selection: &Selection) -> Result<Self, QuranError> {
        let surah = selection.surah_number()?;
        let mut playlist = Playlist::default();
        for ayah in selection.start_ayah..=selection.end_ayah {
            let path = audio_dir.join(ayah_file_name(surah, ayah));
            if path.exists() {
                playlist.entries.push(path);
            } else {
                warn!("missing audio file: {}", path.display());
                playlist.missing.push(path);
            }
        }
        Ok(playlist)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the playlist as newline-separated paths (mpv's `--playlist`
    /// format).
    pub fn write(&self, path: &Path) -> Result<(), QuranError> {
        let body = self
            .entries
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(path, body).map_err(|e| io_err(path, e))
    }
}
