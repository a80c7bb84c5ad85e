//! Actions and types used throughout deskflow.
//!
//! This module defines the vocabulary that recording and replay share:
//! [`Action`] is one persisted step of a flow, [`ActionKind`] is the menu
//! entry the user picks while recording, and [`Flow`] is the ordered list
//! that ends up on disk.
//!
//! # Wire format
//!
//! A flow file is a JSON array of objects tagged by an `"action"` key:
//!
//! ```json
//! [
//!   {"action": "window_switch", "desktop": 2},
//!   {"action": "coordinate_click", "x": 640, "y": 400},
//!   {"action": "type", "text": "hello"},
//!   {"action": "enter"}
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// One recorded UI step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Move the pointer to an absolute screen position and left-click.
    CoordinateClick { x: i32, y: i32 },

    /// Focus a bspwm desktop by its 1-based index.
    WindowSwitch { desktop: u32 },

    /// Screenshot, OCR, and click the centre of the first word containing
    /// `text`.
    TextFinder { text: String },

    /// Send `ctrl+<letter>`.
    CtrlSend { letter: String },

    /// Type literal text.
    #[serde(rename = "type")]
    Type { text: String },

    /// Scroll the wheel down `times` notches.
    ScrollDown { times: u32 },

    /// Scroll the wheel up `times` notches.
    ScrollUp { times: u32 },

    /// Press Return.
    Enter,
}

impl Action {
    /// Short name used in log lines and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Action::CoordinateClick { .. } => "coordinate_click",
            Action::WindowSwitch { .. } => "window_switch",
            Action::TextFinder { .. } => "text_finder",
            Action::CtrlSend { .. } => "ctrl_send",
            Action::Type { .. } => "type",
            Action::ScrollDown { .. } => "scroll_down",
            Action::ScrollUp { .. } => "scroll_up",
            Action::Enter => "enter",
        }
    }
}

/// An ordered, replayable list of actions.
///
/// Serialised as a bare JSON array so files stay hand-editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flow {
    pub actions: Vec<Action>,
}

impl Flow {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// The entries of the recorder's action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CoordinateClick,
    WindowSwitch,
    TextFinder,
    CtrlSend,
    Typing,
    ScrollDown,
    ScrollUp,
    Enter,
}

impl ActionKind {
    /// Every kind, in menu order.
    pub const ALL: [ActionKind; 8] = [
        ActionKind::CoordinateClick,
        ActionKind::WindowSwitch,
        ActionKind::TextFinder,
        ActionKind::CtrlSend,
        ActionKind::Typing,
        ActionKind::ScrollDown,
        ActionKind::ScrollUp,
        ActionKind::Enter,
    ];
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::CoordinateClick => write!(f, "coordinate click"),
            ActionKind::WindowSwitch => write!(f, "window switch"),
            ActionKind::TextFinder => write!(f, "text finder"),
            ActionKind::CtrlSend => write!(f, "ctrl send"),
            ActionKind::Typing => write!(f, "typing action"),
            ActionKind::ScrollDown => write!(f, "scroll down"),
            ActionKind::ScrollUp => write!(f, "scroll up"),
            ActionKind::Enter => write!(f, "enter"),
        }
    }
}

/// Parse a menu label (case-insensitive; spaces, `-` and `_` are ignored,
/// so "coordinate click", "coordinate_click" and "CoordinateClick" all
/// match).
pub fn parse_action_kind(s: &str) -> Option<ActionKind> {
    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect();
    match normalized.as_str() {
        "coordinateclick" => Some(ActionKind::CoordinateClick),
        "windowswitch" => Some(ActionKind::WindowSwitch),
        "textfinder" => Some(ActionKind::TextFinder),
        "ctrlsend" => Some(ActionKind::CtrlSend),
        "typingaction" | "typing" | "type" => Some(ActionKind::Typing),
        "scrolldown" => Some(ActionKind::ScrollDown),
        "scrollup" => Some(ActionKind::ScrollUp),
        "enter" => Some(ActionKind::Enter),
        _ => None,
    }
}

/// Centre of a bounding box, rounding toward the top-left like integer
/// division does.
pub fn box_center(left: i32, top: i32, width: i32, height: i32) -> (i32, i32) {
    (left + width / 2, top + height / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_matches_menu_labels() {
        let labels: Vec<String> = ActionKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "coordinate click",
                "window switch",
                "text finder",
                "ctrl send",
                "typing action",
                "scroll down",
                "scroll up",
                "enter",
            ]
        );
    }

    #[test]
    fn every_label_parses_back() {
        for kind in ActionKind::ALL {
            assert_eq!(parse_action_kind(&kind.to_string()), Some(kind));
        }
    }

    #[test]
    fn parse_is_lenient_about_case_and_separators() {
        assert_eq!(parse_action_kind("Scroll_Down"), Some(ActionKind::ScrollDown));
        assert_eq!(parse_action_kind("  ctrl-send "), Some(ActionKind::CtrlSend));
        assert_eq!(parse_action_kind("save & exit"), None);
        assert_eq!(parse_action_kind(""), None);
    }

    #[test]
    fn reads_legacy_flow_file() {
        let json = r#"[
            {"action": "window_switch", "desktop": 3},
            {"action": "coordinate_click", "x": 100, "y": 250},
            {"action": "text_finder", "text": "Submit"},
            {"action": "ctrl_send", "letter": "v"},
            {"action": "type", "text": "hello world"},
            {"action": "scroll_down", "times": 4},
            {"action": "scroll_up", "times": 0},
            {"action": "enter"}
        ]"#;
        let flow: Flow = serde_json::from_str(json).unwrap();
        assert_eq!(flow.len(), 8);
        assert_eq!(flow.actions[0], Action::WindowSwitch { desktop: 3 });
        assert_eq!(flow.actions[1], Action::CoordinateClick { x: 100, y: 250 });
        assert_eq!(flow.actions[4], Action::Type { text: "hello world".into() });
        assert_eq!(flow.actions[7], Action::Enter);
    }

    #[test]
    fn writes_tagged_objects() {
        let flow = Flow::new(vec![Action::Type { text: "hi".into() }, Action::Enter]);
        let value: serde_json::Value = serde_json::from_str(&flow.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"action": "type", "text": "hi"}, {"action": "enter"}])
        );
    }

    #[test]
    fn pretty_output_uses_two_space_indent() {
        let flow = Flow::new(vec![Action::Enter]);
        assert_eq!(flow.to_json().unwrap(), "[\n  {\n    \"action\": \"enter\"\n  }\n]");
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let json = r#"[{"action": "teleport"}]"#;
        assert!(serde_json::from_str::<Flow>(json).is_err());
    }

    #[test]
    fn action_names_match_tags() {
        let a = Action::ScrollUp { times: 2 };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["action"], a.name());
    }

    #[test]
    fn box_center_uses_integer_halves() {
        assert_eq!(box_center(10, 20, 31, 9), (25, 24));
        assert_eq!(box_center(0, 0, 0, 0), (0, 0));
    }
}
