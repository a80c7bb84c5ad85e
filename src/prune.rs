//! Delete videos shorter than a threshold.

use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Errors from [`prune`].
#[derive(Debug, thiserror::Error)]
#[error("cannot read {path}: {source}")]
pub struct PruneError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// Reports a media file's duration in seconds.
pub trait MediaDuration {
    /// `None` when the duration cannot be determined.
    fn duration(&self, path: &Path) -> Option<f64>;
}

/// Durations read with `ffprobe`.
pub struct Ffprobe {
    pub program: String,
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self {
            program: "ffprobe".into(),
        }
    }
}

/// Parse ffprobe's bare `format=duration` output.
pub fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
}

impl MediaDuration for Ffprobe {
    fn duration(&self, path: &Path) -> Option<f64> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output();
        match output {
            Ok(out) if out.status.success() => parse_duration(&String::from_utf8_lossy(&out.stdout)),
            Ok(out) => {
                debug!("{} failed on {}: {}", self.program, path.display(), out.status);
                None
            }
            Err(e) => {
                warn!("failed to run {}: {}", self.program, e);
                None
            }
        }
    }
}

/// A file that was deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Removed {
    pub name: String,
    pub duration: f64,
}

impl std::fmt::Display for Removed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Removing {} (duration: {:.2}s)", self.name, self.duration)
    }
}

/// Remove every `*.<extension>` file in `dir` whose measured duration is
/// below `max_secs`.  Files of unknown duration are kept.  `on_remove` is
/// called before each deletion.
pub fn prune<P: MediaDuration>(
    dir: &Path,
    extension: &str,
    max_secs: f64,
    durations: &P,
    mut on_remove: impl FnMut(&Removed),
) -> Result<Vec<Removed>, PruneError> {
    let read_err = |source| PruneError {
        path: dir.to_path_buf(),
        source,
    };
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(read_err)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|x| x == extension))
        .collect();
    files.sort();

    let mut removed = Vec::new();
    for path in files {
        let Some(duration) = durations.duration(&path) else {
            debug!("keeping {}: unknown duration", path.display());
            continue;
        };
        if duration >= max_secs {
            continue;
        }
        let entry = Removed {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            duration,
        };
        on_remove(&entry);
        match std::fs::remove_file(&path) {
            Ok(()) => removed.push(entry),
            Err(e) => warn!("could not remove {}: {}", path.display(), e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TableDurations(HashMap<&'static str, f64>);

    impl MediaDuration for TableDurations {
        fn duration(&self, path: &Path) -> Option<f64> {
            let name = path.file_name()?.to_str()?;
            self.0.get(name).copied()
        }
    }

    #[test]
    fn parses_ffprobe_output() {
        assert_eq!(parse_duration("59.933000\n"), Some(59.933));
        assert_eq!(parse_duration("N/A\n"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn removes_only_short_known_videos() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["short.mp4", "long.mp4", "edge.mp4", "unknown.mp4", "short.mkv"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let durations = TableDurations(HashMap::from([
            ("short.mp4", 12.5),
            ("long.mp4", 600.0),
            ("edge.mp4", 60.0),
            ("short.mkv", 1.0),
        ]));

        let mut lines = Vec::new();
        let removed = prune(dir.path(), "mp4", 60.0, &durations, |r| lines.push(r.to_string())).unwrap();

        assert_eq!(lines, vec!["Removing short.mp4 (duration: 12.50s)".to_string()]);
        assert_eq!(removed.len(), 1);
        assert!(!dir.path().join("short.mp4").exists());
        for kept in ["long.mp4", "edge.mp4", "unknown.mp4", "short.mkv"] {
            assert!(dir.path().join(kept).exists(), "{} should be kept", kept);
        }
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let durations = TableDurations(HashMap::new());
        assert!(prune(&dir.path().join("gone"), "mp4", 60.0, &durations, |_| {}).is_err());
    }

    #[test]
    fn missing_ffprobe_means_unknown() {
        let ffprobe = Ffprobe {
            program: "/nonexistent/deskflow-ffprobe".into(),
        };
        assert_eq!(ffprobe.duration(Path::new("/tmp/x.mp4")), None);
    }
}
