//! Unix-socket client for a running mpv.
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"command":["cycle","pause"]}
//! {"command":["get_property","playlist-pos"],"request_id":3}
//! ```
//!
//! mpv answers requests with
//! `{"data":2,"error":"success","request_id":3}` and interleaves
//! unsolicited event lines such as `{"event":"pause"}`.

use log::debug;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How long [`MpvClient::request`] waits for mpv to answer.
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Errors produced by the mpv client.
#[derive(Debug, thiserror::Error)]
pub enum MpvError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// mpv answered with something other than `"success"`.
    #[error("mpv rejected command: {0}")]
    Command(String),
    #[error("mpv closed the connection before replying")]
    Closed,
}

/// Talks to one mpv instance through its IPC socket.
///
/// No connection is kept open; each call connects, writes one line, and
/// disconnects.
#[derive(Debug, Clone)]
pub struct MpvClient {
    path: PathBuf,
}

/// Serialise a command line without a request id.
pub(crate) fn command_line(args: &[Value]) -> String {
    format!("{}\n", json!({ "command": args }))
}

/// Find the reply to `request_id` among lines read from mpv.
///
/// Returns `None` for event lines and replies to other requests.
pub(crate) fn match_reply(line: &str, request_id: u64) -> Option<Result<Value, MpvError>> {
    let msg: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return Some(Err(e.into())),
    };
    if msg.get("event").is_some() || msg.get("request_id").and_then(Value::as_u64) != Some(request_id)
    {
        return None;
    }
    match msg.get("error").and_then(Value::as_str) {
        Some("success") => Some(Ok(msg.get("data").cloned().unwrap_or(Value::Null))),
        Some(other) => Some(Err(MpvError::Command(other.to_string()))),
        None => Some(Err(MpvError::Command("reply without error field".into()))),
    }
}

impl MpvClient {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fire-and-forget: write one command and hang up.
    ///
    /// Fails when the socket is missing or nobody is listening on it.
    pub fn send(&self, args: &[Value]) -> Result<(), MpvError> {
        let mut stream = UnixStream::connect(&self.path)?;
        let line = command_line(args);
        debug!("mpv <- {}", line.trim_end());
        stream.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Send a command and wait for its reply, returning the reply's `data`.
    pub fn request(&self, args: &[Value]) -> Result<Value, MpvError> {
        let request_id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        let mut stream = UnixStream::connect(&self.path)?;
        stream.set_read_timeout(Some(REPLY_TIMEOUT))?;

        let line = format!(
            "{}\n",
            json!({ "command": args, "request_id": request_id })
        );
        debug!("mpv <- {}", line.trim_end());
        stream.write_all(line.as_bytes())?;

        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            debug!("mpv -> {}", line);
            if let Some(result) = match_reply(&line, request_id) {
                return result;
            }
        }
        Err(MpvError::Closed)
    }

    /// `get_property` shorthand.
    pub fn get_property(&self, name: &str) -> Result<Value, MpvError> {
        self.request(&[json!("get_property"), json!(name)])
    }
}

//  Tests
