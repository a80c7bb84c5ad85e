//! Core traits that decouple deskflow from the concrete desktop tools.
//!
//! Every concrete backend (xdotool + bspc, rofi, tesseract, a test harness,
//! …) implements one of these traits.  The flow
//! [`Recorder`](crate::flow::recorder::Recorder) and
//! [`Player`](crate::flow::player::Player) only depend on these
//! abstractions.

use std::path::Path;

/// Abstraction over the input simulator, the window manager and the
/// notification daemon of a desktop session.
///
/// An implementation might shell out to xdotool and bspc, or it might be a
/// recording stub used in tests.
pub trait Desktop {
    /// The error type produced by this desktop.
    type Error: std::error::Error + Send + 'static;

    /// Current pointer position in screen pixels.
    fn pointer_location(&self) -> Result<(i32, i32), Self::Error>;

    /// Move the pointer to `(x, y)` and press the left button once.
    fn click_at(&self, x: i32, y: i32) -> Result<(), Self::Error>;

    /// Press a single mouse button where the pointer is.
    ///
    /// Button `4` scrolls up and button `5` scrolls down.
    fn click_button(&self, button: u8) -> Result<(), Self::Error>;

    /// Send a key chord in xdotool notation (`"Return"`, `"ctrl+v"`).
    fn key(&self, chord: &str) -> Result<(), Self::Error>;

    /// Type literal text.
    fn type_text(&self, text: &str) -> Result<(), Self::Error>;

    /// Focus the desktop with the given 1-based index.
    fn focus_desktop(&self, index: u32) -> Result<(), Self::Error>;

    /// Capture the whole screen to `path`.
    fn screenshot(&self, path: &Path) -> Result<(), Self::Error>;

    /// Show a desktop notification.
    ///
    /// Notifications are best effort; callers log failures and carry on.
    fn notify(&self, title: &str, body: &str) -> Result<(), Self::Error>;
}

/// A blocking dialog that asks the user for one answer.
pub trait Prompter {
    type Error: std::error::Error + Send + 'static;

    /// Offer `options` and return the selection, or `None` if the user
    /// dismissed the dialog or picked nothing.
    ///
    /// Implementations may also return free text the user typed instead of
    /// one of the options.
    fn choose(&self, prompt: &str, options: &[String]) -> Result<Option<String>, Self::Error>;

    /// Ask for free text.  `None` on dismissal or empty input.
    fn input(&self, prompt: &str) -> Result<Option<String>, Self::Error> {
        self.choose(prompt, &[String::new()])
    }
}

/// Finds on-screen text in a screenshot.
pub trait TextLocator {
    type Error: std::error::Error + Send + 'static;

    /// Return the centre of the first word in `image` that contains
    /// `needle` (case-insensitive), or `None` if nothing matches.
    fn locate(&self, image: &Path, needle: &str) -> Result<Option<(i32, i32)>, Self::Error>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! Recording test doubles shared by the flow tests.

    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::PathBuf;

    #[derive(Debug, thiserror::Error)]
    #[error("mock error: {0}")]
    pub struct MockError(pub String);

    /// Every call a [`MockDesktop`] received, in order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum DesktopCall {
        ClickAt(i32, i32),
        Button(u8),
        Key(String),
        Type(String),
        Desktop(u32),
        Screenshot(PathBuf),
        Notify(String, String),
    }

    #[derive(Debug, Default)]
    pub struct MockDesktop {
        pub pointer: (i32, i32),
        pub calls: RefCell<Vec<DesktopCall>>,
        /// When set, every call after this many recorded calls fails.
        pub fail_after: Option<usize>,
    }

    impl MockDesktop {
        fn record(&self, call: DesktopCall) -> Result<(), MockError> {
            if let Some(limit) = self.fail_after {
                if self.calls.borrow().len() >= limit {
                    return Err(MockError(format!("{:?} refused", call)));
                }
            }
            self.calls.borrow_mut().push(call);
            Ok(())
        }

        pub fn calls(&self) -> Vec<DesktopCall> {
            self.calls.borrow().clone()
        }
    }

    impl Desktop for MockDesktop {
        type Error = MockError;

        fn pointer_location(&self) -> Result<(i32, i32), MockError> {
            Ok(self.pointer)
        }

        fn click_at(&self, x: i32, y: i32) -> Result<(), MockError> {
            self.record(DesktopCall::ClickAt(x, y))
        }

        fn click_button(&self, button: u8) -> Result<(), MockError> {
            self.record(DesktopCall::Button(button))
        }

        fn key(&self, chord: &str) -> Result<(), MockError> {
            self.record(DesktopCall::Key(chord.into()))
        }

        fn type_text(&self, text: &str) -> Result<(), MockError> {
            self.record(DesktopCall::Type(text.into()))
        }

        fn focus_desktop(&self, index: u32) -> Result<(), MockError> {
            self.record(DesktopCall::Desktop(index))
        }

        fn screenshot(&self, path: &Path) -> Result<(), MockError> {
            self.record(DesktopCall::Screenshot(path.to_path_buf()))
        }

        fn notify(&self, title: &str, body: &str) -> Result<(), MockError> {
            self.record(DesktopCall::Notify(title.into(), body.into()))
        }
    }

    /// Replays scripted answers and remembers which prompts were shown.
    #[derive(Debug, Default)]
    pub struct ScriptedPrompter {
        pub answers: RefCell<VecDeque<Option<String>>>,
        pub prompts: RefCell<Vec<String>>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: &[Option<&str>]) -> Self {
            Self {
                answers: RefCell::new(answers.iter().map(|a| a.map(String::from)).collect()),
                prompts: RefCell::new(Vec::new()),
            }
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.borrow().clone()
        }
    }

    impl Prompter for ScriptedPrompter {
        type Error = MockError;

        fn choose(&self, prompt: &str, _options: &[String]) -> Result<Option<String>, MockError> {
            self.prompts.borrow_mut().push(prompt.into());
            Ok(self.answers.borrow_mut().pop_front().flatten())
        }
    }

    /// Finds text only when it is in its fixed table.
    #[derive(Debug, Default)]
    pub struct TableLocator {
        pub words: Vec<(String, (i32, i32))>,
    }

    impl TextLocator for TableLocator {
        type Error = MockError;

        fn locate(&self, _image: &Path, needle: &str) -> Result<Option<(i32, i32)>, MockError> {
            let needle = needle.to_lowercase();
            Ok(self
                .words
                .iter()
                .find(|(w, _)| w.to_lowercase().contains(&needle))
                .map(|(_, pos)| *pos))
        }
    }

    #[test]
    fn mock_desktop_records_calls() {
        let d = MockDesktop::default();
        d.click_at(1, 2).unwrap();
        d.key("Return").unwrap();
        assert_eq!(
            d.calls(),
            vec![DesktopCall::ClickAt(1, 2), DesktopCall::Key("Return".into())]
        );
    }

    #[test]
    fn mock_desktop_fails_after_limit() {
        let d = MockDesktop {
            fail_after: Some(1),
            ..Default::default()
        };
        assert!(d.key("a").is_ok());
        assert!(d.key("b").is_err());
    }

    #[test]
    fn default_input_offers_single_empty_option() {
        let p = ScriptedPrompter::new(&[Some("42")]);
        assert_eq!(p.input("Desktop number").unwrap(), Some("42".into()));
        assert_eq!(p.prompts(), vec!["Desktop number".to_string()]);
        assert_eq!(p.input("again").unwrap(), None);
    }
}
