//! Replays recorded [`Action`]s against a [`Desktop`].

use super::FlowError;
use crate::action::{Action, Flow};
use crate::traits::{Desktop, TextLocator};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

/// Mouse button xdotool maps to wheel-up.
pub const WHEEL_UP: u8 = 4;
/// Mouse button xdotool maps to wheel-down.
pub const WHEEL_DOWN: u8 = 5;

/// Title used for every desktop notification about flows.
pub const NOTIFY_TITLE: &str = "Flow";

/// Timing and scratch-file settings shared by recording and replay.
#[derive(Debug, Clone)]
pub struct PlayerSettings {
    pub scroll_delay: Duration,
    pub screenshot_path: PathBuf,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            scroll_delay: Duration::from_millis(100),
            screenshot_path: PathBuf::from("/tmp/flow_screen.png"),
        }
    }
}

/// What happened when an action was performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Done,
    /// The text finder found no matching word; nothing was clicked.
    TextNotFound(String),
}

/// Summary of a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub performed: usize,
    /// Texts the finder could not locate.
    pub missed: Vec<String>,
}

/// Performs actions on a desktop.
///
/// The player is generic over the [`Desktop`] and [`TextLocator`] so the
/// same code drives the real X11 session and the test doubles.
pub struct Player<'a, D: Desktop, L: TextLocator> {
    desktop: &'a D,
    locator: &'a L,
    settings: PlayerSettings,
}

impl<'a, D: Desktop, L: TextLocator> Player<'a, D, L> {
    pub fn new(desktop: &'a D, locator: &'a L, settings: PlayerSettings) -> Self {
        Self {
            desktop,
            locator,
            settings,
        }
    }

    pub fn desktop(&self) -> &D {
        self.desktop
    }

    /// Send a notification, logging instead of failing.
    pub fn notify(&self, body: &str) {
        if let Err(e) = self.desktop.notify(NOTIFY_TITLE, body) {
            warn!("notification failed: {}", e);
        }
    }

    /// Perform one action.
    pub fn perform(&self, action: &Action) -> Result<Step, FlowError> {
        match action {
            Action::CoordinateClick { x, y } => self.desktop.click_at(*x, *y).map_err(desk)?,
            Action::WindowSwitch { desktop } => {
                self.desktop.focus_desktop(*desktop).map_err(desk)?
            }
            Action::TextFinder { text } => return self.find_and_click(text),
            Action::CtrlSend { letter } if letter.is_empty() => {}
            Action::CtrlSend { letter } => {
                self.desktop.key(&format!("ctrl+{}", letter)).map_err(desk)?
            }
            Action::Type { text } => self.desktop.type_text(text).map_err(desk)?,
            Action::ScrollDown { times } => self.scroll(WHEEL_DOWN, *times)?,
            Action::ScrollUp { times } => self.scroll(WHEEL_UP, *times)?,
            Action::Enter => self.desktop.key("Return").map_err(desk)?,
        }
        Ok(Step::Done)
    }

    /// Replay every action in order.
    ///
    /// A text-finder miss is reported and replay continues; any other
    /// failure stops the replay.
    pub fn run(&self, flow: &Flow) -> Result<Report, FlowError> {
        let mut report = Report::default();
        for (index, action) in flow.actions.iter().enumerate() {
            info!("step {}: {}", index, action.name());
            match self.perform(action) {
                Ok(Step::Done) => {}
                Ok(Step::TextNotFound(text)) => {
                    warn!("text {:?} not found, continuing", text);
                    self.notify(&format!("Text '{}' not found", text));
                    report.missed.push(text);
                }
                Err(e) => {
                    return Err(FlowError::Step {
                        index,
                        action: action.name(),
                        source: Box::new(e),
                    })
                }
            }
            report.performed += 1;
        }
        Ok(report)
    }

    fn find_and_click(&self, text: &str) -> Result<Step, FlowError> {
        let shot = &self.settings.screenshot_path;
        self.desktop.screenshot(shot).map_err(desk)?;
        let found = self
            .locator
            .locate(shot, text)
            .map_err(|e| FlowError::Ocr(e.to_string()))?;
        match found {
            Some((x, y)) => {
                self.desktop.click_at(x, y).map_err(desk)?;
                Ok(Step::Done)
            }
            None => Ok(Step::TextNotFound(text.to_string())),
        }
    }

    fn scroll(&self, button: u8, times: u32) -> Result<(), FlowError> {
        for _ in 0..times {
            self.desktop.click_button(button).map_err(desk)?;
            if !self.settings.scroll_delay.is_zero() {
                std::thread::sleep(self.settings.scroll_delay);
            }
        }
        Ok(())
    }
}

fn desk<E: std::error::Error>(e: E) -> FlowError {
    FlowError::Desktop(e.to_string())
}
