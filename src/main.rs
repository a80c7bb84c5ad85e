//! Entry point for the **deskflow** command line.
//!
//! Loads the configuration (and the optional env file it names), then
//! dispatches to one utility per subcommand.  Each utility runs to
//! completion on the main thread and exits.

use clap::{Parser, Subcommand};
use deskflow::config::{self, Config, FlowConfig, QuranConfig};
use deskflow::crop::{self, CropError};
use deskflow::flow::editor;
use deskflow::flow::player::{Player, PlayerSettings};
use deskflow::flow::recorder::Recorder;
use deskflow::flow::store::FlowStore;
use deskflow::flow::{choose_flow_to_edit, choose_flow_to_run, FlowError, Pick};
use deskflow::prune::{self, Ffprobe, PruneError};
use deskflow::quran::metadata::Metadata;
use deskflow::quran::selection::{prompt_selection, Selection};
use deskflow::quran::session::{PlayOutcome, QuranSession, SessionSettings, Status};
use deskflow::quran::{QuranError, StatePaths};
use deskflow::watchlist::cache::DownloadCache;
use deskflow::watchlist::channel::read_channels;
use deskflow::watchlist::http::HttpFetcher;
use deskflow::watchlist::{self, WatchlistError, YtDlp};
use deskflow::x11::desktop::XDesktop;
use deskflow::x11::ocr::Tesseract;
use deskflow::x11::rofi::Rofi;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "deskflow", version, about = "Desktop automation utilities")]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/deskflow/config.json).
    #[arg(long, global = true, env = "DESKFLOW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record, replay and edit UI flows.
    #[command(subcommand)]
    Flow(FlowCommand),
    /// Quran playback widget.
    #[command(subcommand)]
    Quran(QuranCommand),
    /// Download recent uploads of the channels in the channel list.
    Watchlist,
    /// Delete videos shorter than a threshold.
    Prune {
        /// Directory to prune (default: `prune.dir` from the config).
        dir: Option<PathBuf>,
        /// Videos shorter than this many seconds are removed.
        #[arg(long)]
        max_secs: Option<f64>,
    },
    /// Cut a post screenshot down to the photo.
    Crop { input: PathBuf, output: PathBuf },
}

#[derive(Subcommand)]
enum FlowCommand {
    /// Record a new flow interactively.
    Record,
    /// Replay a flow (picked from a menu when NAME is omitted).
    Run { name: Option<String> },
    /// Open a flow file in the editor.
    Edit { name: Option<String> },
    /// List stored flows.
    List,
}

#[derive(Subcommand)]
enum QuranCommand {
    /// Choose the surah and ayah range (prompts when no arguments are given).
    Select {
        #[arg(requires_all = ["from", "to"])]
        surah: Option<String>,
        from: Option<u32>,
        to: Option<u32>,
    },
    /// Start playback, or stop it and reselect if already playing.
    Play,
    /// Toggle pause.
    Pause,
    /// Stop playback and clean up.
    Stop,
    /// Show the selection and what mpv is doing.
    Status,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Quran(#[from] QuranError),
    #[error(transparent)]
    Watchlist(#[from] WatchlistError),
    #[error(transparent)]
    Prune(#[from] PruneError),
    #[error(transparent)]
    Crop(#[from] CropError),
}

//  Config

/// Load the config from `explicit` or the default location.  A missing
/// default file falls back to compiled-in defaults; an explicit path must
/// load.
fn load_config(explicit: Option<&Path>) -> Result<Config, config::ConfigError> {
    if let Some(path) = explicit {
        let cfg = Config::load(&config::expand_home(path))?;
        info!("loaded config from {}", path.display());
        return Ok(cfg);
    }
    let path = config::config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            Ok(cfg)
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Ok(Config::default())
        }
    }
}

/// Load the env file named by the config, if any.  Failure is a warning.
fn apply_env_file(cfg: &Config) {
    let Some(path) = cfg.env_file.as_deref() else {
        return;
    };
    match config::load_env_file(&config::expand_home(path)) {
        Ok(n) => info!("loaded {} variable(s) from {}", n, path.display()),
        Err(e) => warn!("{}", e),
    }
}

//  Main

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let cfg = match load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    apply_env_file(&cfg);
    let cfg = cfg.resolve();

    let result = match cli.command {
        Commands::Flow(cmd) => run_flow_command(&cfg, cmd),
        Commands::Quran(cmd) => run_quran_command(&cfg.quran, cmd),
        Commands::Watchlist => run_watchlist(&cfg),
        Commands::Prune { dir, max_secs } => run_prune(&cfg, dir, max_secs),
        Commands::Crop { input, output } => run_crop(&input, &output),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

//  Flows

fn player_settings(cfg: &FlowConfig) -> PlayerSettings {
    PlayerSettings {
        scroll_delay: Duration::from_millis(cfg.scroll_delay_ms),
        screenshot_path: cfg.screenshot_path.clone(),
    }
}

fn run_flow_command(cfg: &Config, cmd: FlowCommand) -> Result<(), AppError> {
    let desktop = XDesktop::new();
    let ocr = Tesseract::default();
    let rofi = Rofi::new(cfg.flows.launcher.clone());
    let store = FlowStore::new(&cfg.flows.dir);
    let player = Player::new(&desktop, &ocr, player_settings(&cfg.flows));

    match cmd {
        FlowCommand::Record => {
            let capture_delay = Duration::from_millis(cfg.flows.capture_delay_ms);
            let recorder = Recorder::new(player, &rofi, capture_delay);
            let flow = recorder.record()?;
            match recorder.save(&store, &flow)? {
                Some(path) => println!("Saved to {}", path.display()),
                None => info!("nothing saved ({} action(s) recorded)", flow.len()),
            }
        }
        FlowCommand::Run { name } => {
            let name = match name {
                Some(n) => n,
                None => match choose_flow_to_run(&store, &player, &rofi)? {
                    Pick::Chosen(n) => n,
                    Pick::NoFlows | Pick::Cancelled => return Ok(()),
                },
            };
            let flow = store.load(&name)?;
            info!("running {} ({} action(s))", name, flow.len());
            let report = player.run(&flow)?;
            for text in &report.missed {
                warn!("text not found during replay: {:?}", text);
            }
            info!("performed {} action(s)", report.performed);
        }
        FlowCommand::Edit { name } => {
            let name = match name {
                Some(n) => n,
                None => match choose_flow_to_edit(&store, &desktop, &rofi)? {
                    Pick::Chosen(n) => n,
                    Pick::NoFlows => return Ok(()),
                    Pick::Cancelled => {
                        println!("No flow selected.");
                        return Ok(());
                    }
                },
            };
            let path = store.path_for(&name)?;
            let editor = editor::detect_editor(cfg.editor.command.as_deref(), &config::home_dir());
            editor::open(&editor, &path)?;
            println!("Closed {} for {}.", editor, path.display());
        }
        FlowCommand::List => {
            for name in store.list()? {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

//  Quran

fn quran_session(cfg: &QuranConfig) -> QuranSession {
    QuranSession::new(
        StatePaths::new(&cfg.state_dir),
        SessionSettings {
            audio_dir: cfg.audio_dir.clone(),
            mpv: cfg.mpv.clone(),
            quit_grace: Duration::from_millis(cfg.quit_grace_ms),
        },
    )
}

fn quran_metadata(cfg: &QuranConfig) -> Result<Metadata, QuranError> {
    match &cfg.metadata_path {
        Some(path) => Metadata::load(path),
        None => Ok(Metadata::builtin()),
    }
}

fn select_on_terminal(meta: &Metadata) -> Result<Option<Selection>, QuranError> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    prompt_selection(&mut input, &mut std::io::stdout(), meta)
}

fn run_quran_command(cfg: &QuranConfig, cmd: QuranCommand) -> Result<(), AppError> {
    let session = quran_session(cfg);

    match cmd {
        QuranCommand::Select { surah, from, to } => {
            let meta = quran_metadata(cfg)?;
            let selection = match (surah, from, to) {
                (Some(surah), Some(from), Some(to)) => Some(Selection::new(&surah, from, to, &meta)?),
                _ => select_on_terminal(&meta)?,
            };
            match selection {
                Some(sel) => {
                    session.paths().ensure_dir()?;
                    sel.save(&session.paths().state())?;
                    println!("Saved range {}", sel);
                }
                None => println!("No selection made."),
            }
        }
        QuranCommand::Play => {
            let meta = quran_metadata(cfg)?;
            match session.play(|| select_on_terminal(&meta))? {
                PlayOutcome::Reselected(Some(sel)) => {
                    println!("Stopped playback. Saved range {}", sel)
                }
                PlayOutcome::Reselected(None) => println!("Stopped playback."),
                PlayOutcome::NoSelection => println!("No selection made."),
                PlayOutcome::NoAudio(_) => {
                    println!("No audio files found for the selected range.")
                }
                PlayOutcome::Started {
                    pid,
                    selection,
                    playlist,
                } => println!(
                    "Playing {} ({} file(s), pid {})",
                    selection,
                    playlist.entries.len(),
                    pid
                ),
            }
        }
        QuranCommand::Pause => {
            if session.pause() {
                println!("Toggled mpv pause state.");
            } else {
                println!("No mpv instance found or IPC socket not available.");
            }
        }
        QuranCommand::Stop => {
            session.stop()?;
            println!("Cleaned up mpv state files.");
        }
        QuranCommand::Status => {
            match Selection::load(&session.paths().state())? {
                Some(sel) => println!("selection: {}", sel),
                None => println!("selection: none"),
            }
            match session.status() {
                Status::Stopped => println!("player: stopped"),
                Status::Unreachable(reason) => println!("player: not responding ({})", reason),
                Status::Playing {
                    paused,
                    position,
                    count,
                } => {
                    let state = if paused { "paused" } else { "playing" };
                    match (position, count) {
                        (Some(pos), Some(count)) => {
                            println!("player: {} (file {}/{})", state, pos + 1, count)
                        }
                        _ => println!("player: {}", state),
                    }
                }
            }
        }
    }
    Ok(())
}

//  Watchlist / prune / crop

fn run_watchlist(cfg: &Config) -> Result<(), AppError> {
    let w = &cfg.watchlist;
    let channels = read_channels(&w.channels_file)?;
    if channels.is_empty() {
        info!("no channels to check");
        return Ok(());
    }
    let mut cache = DownloadCache::load(&w.cache_file)?;
    let downloader = YtDlp {
        program: w.downloader.clone(),
        format: w.format.clone(),
        dir: w.download_dir.clone(),
    };
    let summary = watchlist::run(
        &channels,
        &mut cache,
        &HttpFetcher::new(),
        &downloader,
        chrono::Utc::now(),
        chrono::Duration::hours(w.max_age_hours),
    )?;
    info!(
        "checked {} channel(s) ({} failed), downloaded {} video(s), {} download(s) failed",
        summary.channels,
        summary.failed_channels,
        summary.downloaded.len(),
        summary.failed_downloads
    );
    Ok(())
}

fn run_prune(cfg: &Config, dir: Option<PathBuf>, max_secs: Option<f64>) -> Result<(), AppError> {
    let dir = dir
        .map(|d| config::expand_home(&d))
        .unwrap_or_else(|| cfg.prune.dir.clone());
    let max_secs = max_secs.unwrap_or(cfg.prune.max_secs);
    let removed = prune::prune(
        &dir,
        &cfg.prune.extension,
        max_secs,
        &Ffprobe::default(),
        |r| println!("{}", r),
    )?;
    info!("removed {} file(s) from {}", removed.len(), dir.display());
    Ok(())
}

fn run_crop(input: &Path, output: &Path) -> Result<(), AppError> {
    let input = config::expand_home(input);
    let output = config::expand_home(output);
    let b = crop::crop_file(&input, &output)?;
    println!(
        "Saved {} (rows {}..{})",
        output.display(),
        b.top,
        b.top + b.height
    );
    Ok(())
}
