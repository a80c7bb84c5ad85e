//! Starting, pausing and stopping the detached mpv.

use super::playlist::Playlist;
use super::selection::Selection;
use super::{io_err, QuranError, StatePaths};
use crate::mpv::ipc::MpvClient;
use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde_json::{json, Value};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub audio_dir: PathBuf,
    /// Player binary.
    pub mpv: String,
    /// Pause after asking mpv to quit, before anything harsher.
    pub quit_grace: Duration,
}

/// What [`QuranSession::play`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Playback was already running: it was stopped and the user was asked
    /// for a new selection (which may have been declined).
    Reselected(Option<Selection>),
    /// No saved selection and the user did not provide one.
    NoSelection,
    /// None of the selected ayat have an audio file.
    NoAudio(Playlist),
    Started {
        pid: u32,
        selection: Selection,
        playlist: Playlist,
    },
}

/// Player state as reported over IPC.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// No IPC socket: nothing is playing.
    Stopped,
    /// A socket exists but mpv did not answer.
    Unreachable(String),
    Playing {
        paused: bool,
        /// 0-based index of the current playlist entry.
        position: Option<i64>,
        count: Option<i64>,
    },
}

/// Controls the widget's single mpv instance.
pub struct QuranSession {
    paths: StatePaths,
    settings: SessionSettings,
    client: MpvClient,
}

/// Parse the PID file contents.  Only a plain positive decimal is accepted.
pub(crate) fn parse_pid(contents: &str) -> Option<i32> {
    let s = contents.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|pid| *pid > 0)
}

fn remove_if_exists(path: &Path) -> Result<bool, QuranError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_err(path, e)),
    }
}

impl QuranSession {
    pub fn new(paths: StatePaths, settings: SessionSettings) -> Self {
        let client = MpvClient::new(paths.socket());
        Self {
            paths,
            settings,
            client,
        }
    }

    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    /// Whether a previous `play` left a PID file behind.
    pub fn is_running(&self) -> bool {
        self.paths.pid().exists()
    }

    /// Start playback of the saved selection.
    ///
    /// `select` is asked for a selection when none is saved, or after an
    /// already running playback has been stopped.  A returned selection is
    /// saved before use.
    pub fn play<F>(&self, mut select: F) -> Result<PlayOutcome, QuranError>
    where
        F: FnMut() -> Result<Option<Selection>, QuranError>,
    {
        self.paths.ensure_dir()?;

        if self.is_running() {
            info!("existing playback detected, stopping and reselecting");
            self.kill_existing()?;
            let selection = select()?;
            if let Some(sel) = &selection {
                sel.save(&self.paths.state())?;
            }
            return Ok(PlayOutcome::Reselected(selection));
        }

        let selection = match Selection::load(&self.paths.state())? {
            Some(sel) => sel,
            None => match select()? {
                Some(sel) => {
                    sel.save(&self.paths.state())?;
                    sel
                }
                None => return Ok(PlayOutcome::NoSelection),
            },
        };

        let playlist = Playlist::build(&self.settings.audio_dir, &selection)?;
        if playlist.is_empty() {
            return Ok(PlayOutcome::NoAudio(playlist));
        }
        playlist.write(&self.paths.playlist())?;

        let pid = self.spawn_player()?;
        let pid_path = self.paths.pid();
        std::fs::write(&pid_path, pid.to_string()).map_err(|e| io_err(&pid_path, e))?;
        info!("started {} (pid {}) for {}", self.settings.mpv, pid, selection);

        Ok(PlayOutcome::Started {
            pid,
            selection,
            playlist,
        })
    }

    /// Launch mpv in its own process group so it outlives this process and
    /// the terminal that started it.
    fn spawn_player(&self) -> Result<u32, QuranError> {
        let socket = self.paths.socket();
        let playlist = self.paths.playlist();
        let child = Command::new(&self.settings.mpv)
            .arg("--really-quiet")
            .arg("--no-terminal")
            .arg(format!("--input-ipc-server={}", socket.display()))
            .arg(format!("--playlist={}", playlist.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .map_err(|e| QuranError::Spawn {
                program: self.settings.mpv.clone(),
                reason: e.to_string(),
            })?;
        Ok(child.id())
    }

    /// Toggle pause.  Returns `false` if no mpv is listening.
    pub fn pause(&self) -> bool {
        match self.client.send(&[json!("cycle"), json!("pause")]) {
            Ok(()) => true,
            Err(e) => {
                debug!("pause not delivered: {}", e);
                false
            }
        }
    }

    /// Ask mpv to quit and clean up the PID file and socket whether or not
    /// it answered.  Returns whether the quit command was delivered.
    pub fn stop(&self) -> Result<bool, QuranError> {
        let sent = self.send_quit();
        remove_if_exists(&self.paths.pid())?;
        remove_if_exists(&self.paths.socket())?;
        Ok(sent)
    }

    /// Stop a running playback harder than [`stop`](Self::stop): after the
    /// quit request the recorded PID is sent `SIGKILL`.
    ///
    /// Returns the PID that was signalled, if any.
    pub fn kill_existing(&self) -> Result<Option<i32>, QuranError> {
        let pid_path = self.paths.pid();
        let contents = match std::fs::read_to_string(&pid_path) {
            Ok(c) => Some(c),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(io_err(&pid_path, e)),
        };

        let mut signalled = None;
        if let Some(pid) = contents.as_deref().and_then(parse_pid) {
            self.send_quit();
            match kill(Pid::from_raw(pid), Signal::SIGKILL) {
                Ok(()) => {
                    info!("killed existing mpv process {}", pid);
                    signalled = Some(pid);
                }
                Err(Errno::ESRCH) => debug!("mpv process {} already gone", pid),
                Err(e) => warn!("could not kill existing mpv process {}: {}", pid, e),
            }
        } else if contents.is_some() {
            warn!("ignoring malformed pid file {}", pid_path.display());
        }

        remove_if_exists(&pid_path)?;
        remove_if_exists(&self.paths.socket())?;
        Ok(signalled)
    }

    /// Query mpv for its pause flag and playlist position.
    pub fn status(&self) -> Status {
        if !self.paths.socket().exists() {
            return Status::Stopped;
        }
        let paused = match self.client.get_property("pause") {
            Ok(v) => v.as_bool().unwrap_or(false),
            Err(e) => return Status::Unreachable(e.to_string()),
        };
        let int_prop = |name: &str| {
            self.client
                .get_property(name)
                .ok()
                .as_ref()
                .and_then(Value::as_i64)
        };
        Status::Playing {
            paused,
            position: int_prop("playlist-pos"),
            count: int_prop("playlist-count"),
        }
    }

    fn send_quit(&self) -> bool {
        match self.client.send(&[json!("quit")]) {
            Ok(()) => {
                info!("sent quit command to mpv");
                if !self.settings.quit_grace.is_zero() {
                    std::thread::sleep(self.settings.quit_grace);
                }
                true
            }
            Err(e) => {
                debug!("quit not delivered: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quran::metadata::Metadata;
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixListener;
    use std::sync::mpsc;

    struct Fixture {
        _dir: tempfile::TempDir,
        session: QuranSession,
        audio: PathBuf,
    }

    fn fixture(mpv: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("audio");
        std::fs::create_dir(&audio).unwrap();
        let session = QuranSession::new(
            StatePaths::new(dir.path().join("state")),
            SessionSettings {
                audio_dir: audio.clone(),
                mpv: mpv.into(),
                quit_grace: Duration::ZERO,
            },
        );
        Fixture {
            _dir: dir,
            session,
            audio,
        }
    }

    fn fatiha(start: u32, end: u32) -> Selection {
        Selection::new("1", start, end, &Metadata::builtin()).unwrap()
    }

    /// Bind a fake mpv socket that reports every received line.
    fn listen(path: &Path) -> mpsc::Receiver<String> {
        let listener = UnixListener::bind(path).unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                for line in BufReader::new(stream).lines().map_while(Result::ok) {
                    let _ = tx.send(line);
                }
            }
        });
        rx
    }

    /// Bind a fake mpv that answers `requests` `get_property` calls from
    /// `props`, one connection per request.
    fn serve_properties(path: &Path, requests: usize, props: Vec<(&'static str, Value)>) {
        let listener = UnixListener::bind(path).unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming().take(requests) {
                let stream = stream.unwrap();
                let mut writer = stream.try_clone().unwrap();
                let mut line = String::new();
                BufReader::new(stream).read_line(&mut line).unwrap();
                let msg: Value = serde_json::from_str(&line).unwrap();
                let id = msg["request_id"].clone();
                let name = msg["command"][1].as_str().unwrap_or_default().to_string();
                let reply = match props.iter().find(|(n, _)| *n == name) {
                    Some((_, data)) => json!({"data": data, "error": "success", "request_id": id}),
                    None => json!({"error": "property unavailable", "request_id": id}),
                };
                writeln!(writer, "{}", reply).unwrap();
            }
        });
    }

    #[test]
    fn pid_file_parsing() {
        assert_eq!(parse_pid("4242\n"), Some(4242));
        assert_eq!(parse_pid(""), None);
        assert_eq!(parse_pid("-1"), None);
        assert_eq!(parse_pid("0"), None);
        assert_eq!(parse_pid("12ab"), None);
    }

    #[test]
    fn play_without_selection_asks_and_gives_up() {
        let f = fixture("true");
        let mut asked = 0;
        let outcome = f
            .session
            .play(|| {
                asked += 1;
                Ok(None)
            })
            .unwrap();
        assert_eq!(outcome, PlayOutcome::NoSelection);
        assert_eq!(asked, 1);
    }

    #[test]
    fn play_without_audio_does_not_start() {
        let f = fixture("true");
        let outcome = f.session.play(|| Ok(Some(fatiha(1, 2)))).unwrap();
        assert!(matches!(outcome, PlayOutcome::NoAudio(ref p) if p.missing.len() == 2));
        assert!(!f.session.is_running());
        // The selection the user just made is kept for next time.
        assert_eq!(
            Selection::load(&f.session.paths().state()).unwrap(),
            Some(fatiha(1, 2))
        );
    }

    #[test]
    fn play_uses_saved_selection_and_records_pid() {
        let f = fixture("true");
        std::fs::write(f.audio.join("001001.mp3"), b"x").unwrap();
        std::fs::write(f.audio.join("001003.mp3"), b"x").unwrap();
        f.session.paths().ensure_dir().unwrap();
        fatiha(1, 3).save(&f.session.paths().state()).unwrap();

        let outcome = f
            .session
            .play(|| panic!("selection should not be requested"))
            .unwrap();
        let (pid, selection, playlist) = match outcome {
            PlayOutcome::Started {
                pid,
                selection,
                playlist,
            } => (pid, selection, playlist),
            other => panic!("expected playback to start, got {:?}", other),
        };
        assert_eq!(selection, fatiha(1, 3));
        assert_eq!(playlist.entries.len(), 2);
        assert!(f.session.is_running());
        assert_eq!(
            std::fs::read_to_string(f.session.paths().pid()).unwrap(),
            pid.to_string()
        );
        let written = std::fs::read_to_string(f.session.paths().playlist()).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.ends_with("001003.mp3"));
    }

    #[test]
    fn play_reports_missing_player() {
        let f = fixture("/nonexistent/deskflow-mpv");
        std::fs::write(f.audio.join("001001.mp3"), b"x").unwrap();
        let err = f.session.play(|| Ok(Some(fatiha(1, 1)))).unwrap_err();
        assert!(matches!(err, QuranError::Spawn { .. }));
        assert!(!f.session.is_running());
    }

    #[test]
    fn play_while_running_kills_and_reselects() {
        let f = fixture("true");
        f.session.paths().ensure_dir().unwrap();
        let mut victim = Command::new("sleep").arg("30").spawn().unwrap();
        std::fs::write(f.session.paths().pid(), victim.id().to_string()).unwrap();

        let outcome = f.session.play(|| Ok(Some(fatiha(2, 5)))).unwrap();
        assert_eq!(outcome, PlayOutcome::Reselected(Some(fatiha(2, 5))));

        let status = victim.wait().unwrap();
        assert!(!status.success());
        assert!(!f.session.is_running());
        assert_eq!(
            Selection::load(&f.session.paths().state()).unwrap(),
            Some(fatiha(2, 5))
        );
    }

    #[test]
    fn kill_existing_tolerates_garbage_pid_file() {
        let f = fixture("true");
        f.session.paths().ensure_dir().unwrap();
        std::fs::write(f.session.paths().pid(), "not-a-pid").unwrap();
        assert_eq!(f.session.kill_existing().unwrap(), None);
        assert!(!f.session.is_running());
    }

    #[test]
    fn stop_without_player_still_cleans_up() {
        let f = fixture("true");
        f.session.paths().ensure_dir().unwrap();
        std::fs::write(f.session.paths().pid(), "123").unwrap();
        assert!(!f.session.stop().unwrap());
        assert!(!f.session.paths().pid().exists());
    }

    #[test]
    fn stop_sends_quit_and_removes_socket() {
        let f = fixture("true");
        f.session.paths().ensure_dir().unwrap();
        let socket = f.session.paths().socket();
        let lines = listen(&socket);

        assert!(f.session.stop().unwrap());
        assert!(!socket.exists());
        let line = lines.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(line, r#"{"command":["quit"]}"#);
    }

    #[test]
    fn pause_cycles_pause() {
        let f = fixture("true");
        assert!(!f.session.pause());

        f.session.paths().ensure_dir().unwrap();
        let lines = listen(&f.session.paths().socket());
        assert!(f.session.pause());
        let line = lines.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(line, r#"{"command":["cycle","pause"]}"#);
    }

    #[test]
    fn status_reports_pause_and_position() {
        let f = fixture("true");
        f.session.paths().ensure_dir().unwrap();
        serve_properties(
            &f.session.paths().socket(),
            3,
            vec![
                ("pause", json!(true)),
                ("playlist-pos", json!(2)),
                ("playlist-count", json!(5)),
            ],
        );
        assert_eq!(
            f.session.status(),
            Status::Playing {
                paused: true,
                position: Some(2),
                count: Some(5),
            }
        );
    }

    #[test]
    fn status_tolerates_missing_playlist_properties() {
        let f = fixture("true");
        f.session.paths().ensure_dir().unwrap();
        serve_properties(&f.session.paths().socket(), 3, vec![("pause", json!(false))]);
        assert_eq!(
            f.session.status(),
            Status::Playing {
                paused: false,
                position: None,
                count: None,
            }
        );
    }

    #[test]
    fn status_with_dead_socket_is_unreachable() {
        let f = fixture("true");
        f.session.paths().ensure_dir().unwrap();
        drop(UnixListener::bind(f.session.paths().socket()).unwrap());
        assert!(matches!(f.session.status(), Status::Unreachable(_)));
    }

    #[test]
    fn status_without_socket_is_stopped() {
        let f = fixture("true");
        assert_eq!(f.session.status(), Status::Stopped);
    }
}
