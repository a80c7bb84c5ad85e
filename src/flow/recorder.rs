//! Interactive flow recording.
//!
//! The recorder shows a menu of [`ActionKind`]s.  Each pick collects the
//! action's parameters, performs it immediately (so the desktop ends up in
//! the state the next step expects) and appends it to the flow.  Picking
//! "save & exit" or dismissing the menu stops recording.

use super::player::{Player, Step};
use super::store::FlowStore;
use super::FlowError;
use crate::action::{parse_action_kind, Action, ActionKind, Flow};
use crate::traits::{Desktop, Prompter, TextLocator};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;

/// Menu entry that ends recording.
pub const SAVE_AND_EXIT: &str = "save & exit";

pub struct Recorder<'a, D: Desktop, P: Prompter, L: TextLocator> {
    player: Player<'a, D, L>,
    prompter: &'a P,
    capture_delay: Duration,
}

/// Parse a count typed by the user.  Empty input counts as zero; anything
/// else that is not a non-negative integer is rejected.
fn parse_times(answer: Option<&str>) -> Option<u32> {
    match answer.map(str::trim) {
        None | Some("") => Some(0),
        Some(s) => s.parse().ok(),
    }
}

impl<'a, D: Desktop, P: Prompter, L: TextLocator> Recorder<'a, D, P, L> {
    pub fn new(player: Player<'a, D, L>, prompter: &'a P, capture_delay: Duration) -> Self {
        Self {
            player,
            prompter,
            capture_delay,
        }
    }

    /// The action menu: every kind, then [`SAVE_AND_EXIT`].
    pub fn menu() -> Vec<String> {
        ActionKind::ALL
            .iter()
            .map(|k| k.to_string())
            .chain(std::iter::once(SAVE_AND_EXIT.to_string()))
            .collect()
    }

    /// Run the menu loop until the user saves or dismisses it.
    pub fn record(&self) -> Result<Flow, FlowError> {
        let menu = Self::menu();
        let mut actions = Vec::new();
        loop {
            let choice = match self.prompt_choose("Pick action", &menu)? {
                Some(c) if c != SAVE_AND_EXIT => c,
                _ => break,
            };
            let Some(kind) = parse_action_kind(&choice) else {
                debug!("ignoring unknown menu entry {:?}", choice);
                continue;
            };
            if let Some(action) = self.record_one(kind)? {
                info!("recorded {}", action.name());
                actions.push(action);
            }
        }
        Ok(Flow::new(actions))
    }

    /// Ask for a flow name and save.  Returns the written path, or `None`
    /// if the flow is empty or no name was given.
    pub fn save(&self, store: &FlowStore, flow: &Flow) -> Result<Option<PathBuf>, FlowError> {
        if flow.is_empty() {
            return Ok(None);
        }
        let Some(name) = self.prompt_input("Flow file name")? else {
            return Ok(None);
        };
        let path = store.save(&name, flow)?;
        self.player.notify(&format!("Saved to {}", path.display()));
        Ok(Some(path))
    }

    /// Collect parameters for one action, perform it, and return the
    /// record.  `None` means the input was unusable and nothing is
    /// recorded; a dismissed text prompt records an empty string.
    pub fn record_one(&self, kind: ActionKind) -> Result<Option<Action>, FlowError> {
        let action = match kind {
            ActionKind::CoordinateClick => {
                self.player.notify("Move mouse and wait...");
                if !self.capture_delay.is_zero() {
                    std::thread::sleep(self.capture_delay);
                }
                let (x, y) = self
                    .player
                    .desktop()
                    .pointer_location()
                    .map_err(|e| FlowError::Desktop(e.to_string()))?;
                Action::CoordinateClick { x, y }
            }
            ActionKind::WindowSwitch => {
                let answer = self.prompt_input("Desktop number")?;
                match answer.as_deref().map(str::trim).map(str::parse::<u32>) {
                    Some(Ok(desktop)) => Action::WindowSwitch { desktop },
                    Some(Err(_)) => {
                        warn!("not a desktop number: {:?}", answer);
                        return Ok(None);
                    }
                    None => return Ok(None),
                }
            }
            ActionKind::TextFinder => Action::TextFinder {
                text: self.prompt_input("Text to find")?.unwrap_or_default(),
            },
            ActionKind::CtrlSend => Action::CtrlSend {
                letter: self.prompt_input("Ctrl + ?")?.unwrap_or_default(),
            },
            ActionKind::Typing => Action::Type {
                text: self.prompt_input("Type text")?.unwrap_or_default(),
            },
            ActionKind::ScrollDown | ActionKind::ScrollUp => {
                let prompt = if kind == ActionKind::ScrollDown {
                    "Scroll down times"
                } else {
                    "Scroll up times"
                };
                let answer = self.prompt_input(prompt)?;
                let Some(times) = parse_times(answer.as_deref()) else {
                    warn!("not a scroll count: {:?}", answer);
                    return Ok(None);
                };
                if kind == ActionKind::ScrollDown {
                    Action::ScrollDown { times }
                } else {
                    Action::ScrollUp { times }
                }
            }
            ActionKind::Enter => Action::Enter,
        };

        // A text-finder miss still records the step: the text may well be
        // on screen when the flow is replayed later.
        if let Step::TextNotFound(text) = self.player.perform(&action)? {
            self.player.notify(&format!("Text '{}' not found", text));
        }
        Ok(Some(action))
    }

    fn prompt_choose(&self, prompt: &str, options: &[String]) -> Result<Option<String>, FlowError> {
        self.prompter
            .choose(prompt, options)
            .map_err(|e| FlowError::Prompt(e.to_string()))
    }

    fn prompt_input(&self, prompt: &str) -> Result<Option<String>, FlowError> {
        self.prompter
            .input(prompt)
            .map_err(|e| FlowError::Prompt(e.to_string()))
    }
}
