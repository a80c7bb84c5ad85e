//! Record-and-replay UI flows.
//!
//! A flow is recorded interactively by the [`recorder`], stored as a JSON
//! file by the [`store`], replayed by the [`player`] and hand-edited
//! through the [`editor`].

pub mod editor;
pub mod player;
pub mod recorder;
pub mod store;

use crate::traits::{Desktop, Prompter, TextLocator};
use log::warn;
use player::Player;
use std::path::PathBuf;
use store::FlowStore;

/// Title of the notifications sent by `flow edit`.
pub const EDITOR_NOTIFY_TITLE: &str = "Flow Editor";

/// Errors from recording, storing or replaying flows.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid flow file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid flow name: {0:?}")]
    InvalidName(String),
    #[error("flow not found: {0}")]
    NotFound(String),
    /// The desktop backend returned an error.
    #[error("desktop error: {0}")]
    Desktop(String),
    #[error("prompt error: {0}")]
    Prompt(String),
    #[error("text recognition error: {0}")]
    Ocr(String),
    #[error("editor {editor} failed: {reason}")]
    Editor { editor: String, reason: String },
    /// A replayed action failed; `index` is 0-based.
    #[error("action {index} ({action}) failed: {source}")]
    Step {
        index: usize,
        action: &'static str,
        source: Box<FlowError>,
    },
}

/// Outcome of asking the user which stored flow to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    /// The flow directory has no flows.
    NoFlows,
    /// The user dismissed the menu.
    Cancelled,
    Chosen(String),
}

/// Offer every stored flow in a menu.
///
/// The menu shows file names (`name.json`), which
/// [`FlowStore::load`] accepts as well as bare names.
pub fn pick_flow<P: Prompter>(
    store: &FlowStore,
    prompter: &P,
    prompt: &str,
) -> Result<Pick, FlowError> {
    let names = store.list()?;
    if names.is_empty() {
        return Ok(Pick::NoFlows);
    }
    let options: Vec<String> = names.iter().map(|n| format!("{}.json", n)).collect();
    match prompter
        .choose(prompt, &options)
        .map_err(|e| FlowError::Prompt(e.to_string()))?
    {
        Some(choice) => Ok(Pick::Chosen(choice)),
        None => Ok(Pick::Cancelled),
    }
}

/// Pick the flow to replay.  An empty store is reported with a
/// notification.
pub fn choose_flow_to_run<D: Desktop, L: TextLocator, P: Prompter>(
    store: &FlowStore,
    player: &Player<'_, D, L>,
    prompter: &P,
) -> Result<Pick, FlowError> {
    let pick = pick_flow(store, prompter, "Pick flow")?;
    if pick == Pick::NoFlows {
        player.notify("No flows found");
    }
    Ok(pick)
}

/// Pick the flow to edit.  A missing directory and an empty store are
/// both reported with a notification and give [`Pick::NoFlows`].
pub fn choose_flow_to_edit<D: Desktop, P: Prompter>(
    store: &FlowStore,
    desktop: &D,
    prompter: &P,
) -> Result<Pick, FlowError> {
    let notify = |body: &str| {
        if let Err(e) = desktop.notify(EDITOR_NOTIFY_TITLE, body) {
            warn!("notification failed: {}", e);
        }
    };
    if !store.exists() {
        notify("Flows directory not found.");
        return Ok(Pick::NoFlows);
    }
    let pick = pick_flow(store, prompter, "Edit flow")?;
    if pick == Pick::NoFlows {
        notify("No flows found to edit.");
    }
    Ok(pick)
}
