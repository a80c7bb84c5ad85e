//! On-disk flow storage: one `<name>.json` file per flow.

use super::FlowError;
use crate::action::Flow;
use log::debug;
use std::path::{Path, PathBuf};

/// A directory of flow files.
///
/// The directory is only created when a flow is saved; listing a missing
/// directory yields no flows.
#[derive(Debug, Clone)]
pub struct FlowStore {
    dir: PathBuf,
}

const EXTENSION: &str = "json";

impl FlowStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Sorted flow names, without the `.json` extension.
    pub fn list(&self) -> Result<Vec<String>, FlowError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.dir, e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_err(&self.dir, e))?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Path of the file backing `name` (with or without `.json`).
    pub fn path_for(&self, name: &str) -> Result<PathBuf, FlowError> {
        let stem = validate_name(name)?;
        Ok(self.dir.join(format!("{}.{}", stem, EXTENSION)))
    }

    pub fn load(&self, name: &str) -> Result<Flow, FlowError> {
        let path = self.path_for(name)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FlowError::NotFound(name.to_string()))
            }
            Err(e) => return Err(io_err(&path, e)),
        };
        let flow: Flow =
            serde_json::from_str(&contents).map_err(|source| FlowError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!("loaded {} action(s) from {}", flow.len(), path.display());
        Ok(flow)
    }

    /// Write `flow` to `<dir>/<name>.json`, creating the directory if
    /// needed, and return the written path.
    pub fn save(&self, name: &str, flow: &Flow) -> Result<PathBuf, FlowError> {
        let path = self.path_for(name)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let json = flow.to_json().map_err(|source| FlowError::Parse {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|e| io_err(&path, e))?;
        debug!("saved {} action(s) to {}", flow.len(), path.display());
        Ok(path)
    }
}

fn io_err(path: &Path, source: std::io::Error) -> FlowError {
    FlowError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Strip an optional `.json` suffix and reject names that would escape the
/// flow directory or hide the file.
fn validate_name(name: &str) -> Result<&str, FlowError> {
    let trimmed = name.trim();
    let stem = trimmed.strip_suffix(".json").unwrap_or(trimmed);
    if stem.is_empty() || stem.contains('/') || stem.starts_with('.') {
        return Err(FlowError::InvalidName(name.to_string()));
    }
    Ok(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    fn sample() -> Flow {
        Flow::new(vec![
            Action::WindowSwitch { desktop: 2 },
            Action::Type { text: "report".into() },
            Action::Enter,
        ])
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlowStore::new(dir.path().join("nested/flows"));
        assert!(!store.exists());

        let path = store.save("daily", &sample()).unwrap();
        assert_eq!(path, dir.path().join("nested/flows/daily.json"));
        assert!(store.exists());
        assert_eq!(store.load("daily").unwrap(), sample());
        assert_eq!(store.load("daily.json").unwrap(), sample());
    }

    #[test]
    fn list_is_sorted_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlowStore::new(dir.path());
        store.save("zeta", &sample()).unwrap();
        store.save("alpha", &sample()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("sub.json")).unwrap();
        assert_eq!(store.list().unwrap(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn missing_dir_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlowStore::new(dir.path().join("absent"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn missing_flow_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlowStore::new(dir.path());
        assert!(matches!(store.load("ghost"), Err(FlowError::NotFound(n)) if n == "ghost"));
    }

    #[test]
    fn corrupt_flow_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlowStore::new(dir.path());
        std::fs::write(dir.path().join("bad.json"), r#"[{"action": "fly"}]"#).unwrap();
        let err = store.load("bad").unwrap_err();
        assert!(matches!(err, FlowError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn rejects_unsafe_names() {
        let store = FlowStore::new("/tmp/flows");
        for name in ["", "  ", ".json", "../etc/passwd", "a/b", ".hidden"] {
            assert!(
                matches!(store.path_for(name), Err(FlowError::InvalidName(_))),
                "{:?} should be rejected",
                name
            );
        }
        assert_eq!(
            store.path_for(" daily ").unwrap(),
            PathBuf::from("/tmp/flows/daily.json")
        );
    }
}
