//! Application configuration.
//!
//! The configuration is loaded from a JSON file at
//! `$XDG_CONFIG_HOME/deskflow/config.json` (or the path passed with
//! `--config`).  Each utility owns one top-level section, so a file only
//! needs to mention what it changes.
//!
//! # Example
//!
//! ```json
//! {
//!   "env_file": "~/scripts/deskflow.env",
//!   "flows": { "dir": "~/flows", "capture_delay_ms": 3000 },
//!   "quran": { "audio_dir": "~/quran/naseer_qatami" },
//!   "watchlist": { "max_age_hours": 24 },
//!   "prune": { "max_secs": 90 },
//!   "editor": { "command": "nvim" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
///
/// Every field is optional. A minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// `KEY=VALUE` file loaded into the process environment at startup.
    #[serde(default)]
    pub env_file: Option<PathBuf>,

    #[serde(default)]
    pub flows: FlowConfig,

    #[serde(default)]
    pub quran: QuranConfig,

    #[serde(default)]
    pub watchlist: WatchlistConfig,

    #[serde(default)]
    pub prune: PruneConfig,

    #[serde(default)]
    pub editor: EditorConfig,
}

/// Flow recording and replay.
///
/// All durations are in **milliseconds**.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Directory holding `<name>.json` flow files.
    pub dir: PathBuf,
    /// Time the user gets to park the pointer before a coordinate click is
    /// captured.
    pub capture_delay_ms: u64,
    /// Pause between individual scroll notches.
    pub scroll_delay_ms: u64,
    /// Where the text finder writes its screenshot.
    pub screenshot_path: PathBuf,
    /// dmenu-compatible launcher used for prompts.
    pub launcher: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("~/.local/share/deskflow/flows"),
            capture_delay_ms: 2000,
            scroll_delay_ms: 100,
            screenshot_path: PathBuf::from("/tmp/flow_screen.png"),
            launcher: "rofi".into(),
        }
    }
}

/// Quran playback widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuranConfig {
    /// Holds `state.json`, `mpv_socket`, `mpv_pid` and `playlist.txt`.
    pub state_dir: PathBuf,
    /// Directory of per-ayah `SSSAAA.mp3` files.  `QURAN_AUDIO_DIR`
    /// overrides it.
    pub audio_dir: PathBuf,
    /// Optional `{"001": 7, …}` ayah-count table overriding the built-in
    /// one.
    pub metadata_path: Option<PathBuf>,
    /// How long to wait after asking mpv to quit (ms).
    pub quit_grace_ms: u64,
    /// Player binary.
    pub mpv: String,
}

impl Default for QuranConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("~/.config/quran_widget"),
            audio_dir: PathBuf::from("~/quran/naseer_qatami"),
            metadata_path: None,
            quit_grace_ms: 500,
            mpv: "mpv".into(),
        }
    }
}

/// Channel watchlist downloader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistConfig {
    pub channels_file: PathBuf,
    pub cache_file: PathBuf,
    pub download_dir: PathBuf,
    /// Videos older than this are ignored.
    pub max_age_hours: i64,
    /// yt-dlp format selector (`18` is 360p mp4).
    pub format: String,
    pub downloader: String,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            channels_file: PathBuf::from("~/.config/deskflow/channels.txt"),
            cache_file: PathBuf::from("~/.local/share/deskflow/downloaded_videos.txt"),
            download_dir: PathBuf::from("~/yt-watchlist"),
            max_age_hours: 72,
            format: "18".into(),
            downloader: "yt-dlp".into(),
        }
    }
}

/// Short-video pruning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    pub dir: PathBuf,
    /// Videos strictly shorter than this many seconds are removed.
    pub max_secs: f64,
    pub extension: String,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("~/yt-watchlist"),
            max_secs: 60.0,
            extension: "mp4".into(),
        }
    }
}

/// Editor used by `flow edit`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Explicit editor; wins over `~/.selected_editor` and `$EDITOR`.
    pub command: Option<String>,
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Expand `~` in every configured path and apply environment
    /// overrides (`QURAN_AUDIO_DIR`).
    pub fn resolve(self) -> Self {
        let audio_override = std::env::var("QURAN_AUDIO_DIR").ok();
        self.resolve_with(&home_dir(), audio_override.as_deref())
    }

    fn resolve_with(mut self, home: &Path, audio_override: Option<&str>) -> Self {
        let expand = |p: &Path| expand_home_with(p, home);
        self.env_file = self.env_file.map(|p| expand(&p));
        self.flows.dir = expand(&self.flows.dir);
        self.flows.screenshot_path = expand(&self.flows.screenshot_path);
        self.quran.state_dir = expand(&self.quran.state_dir);
        self.quran.audio_dir = match audio_override {
            Some(dir) if !dir.is_empty() => expand(Path::new(dir)),
            _ => expand(&self.quran.audio_dir),
        };
        self.quran.metadata_path = self.quran.metadata_path.map(|p| expand(&p));
        self.watchlist.channels_file = expand(&self.watchlist.channels_file);
        self.watchlist.cache_file = expand(&self.watchlist.cache_file);
        self.watchlist.download_dir = expand(&self.watchlist.download_dir);
        self.prune.dir = expand(&self.prune.dir);
        self
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

/// `$HOME`, falling back to `/tmp` when unset.
pub fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".into()))
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/deskflow`).
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("deskflow")
}

/// Replace a leading `~` with `$HOME`.
pub fn expand_home(path: &Path) -> PathBuf {
    expand_home_with(path, &home_dir())
}

fn expand_home_with(path: &Path, home: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde_with_context(raw.as_ref(), || Some(home.to_string_lossy())).as_ref())
}

/// Parse `KEY=VALUE` lines.  Blank lines and `#` comments are skipped, as
/// are lines without `=`.  Only the first `=` splits, so values may contain
/// more.
pub fn parse_env_lines(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Load an env file into the process environment.
///
/// Must run before any thread is spawned.
pub fn load_env_file(path: &Path) -> Result<usize, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
    let pairs = parse_env_lines(&contents);
    for (key, value) in &pairs {
        std::env::set_var(key, value);
    }
    Ok(pairs.len())
}
