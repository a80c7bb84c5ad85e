//! [`Desktop`] implementation backed by xdotool and bspwm.

use super::run_tool;
use crate::traits::Desktop;
use log::debug;
use std::path::Path;

/// xdotool / bspc / scrot / notify-send backed desktop.
///
/// Every method spawns one short-lived child process and waits for it.
pub struct XDesktop;

/// Errors from the desktop tools.
#[derive(Debug, thiserror::Error)]
#[error("desktop error: {0}")]
pub struct XDesktopError(String);

impl Default for XDesktop {
    fn default() -> Self {
        Self
    }
}

impl XDesktop {
    pub fn new() -> Self {
        Self
    }
}

fn tool(program: &str, args: &[&str]) -> Result<String, XDesktopError> {
    debug!("{} {}", program, args.join(" "));
    let out = run_tool(program, args).map_err(XDesktopError)?;
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

/// Parse the `--shell` output of `xdotool getmouselocation`:
///
/// ```text
/// X=812
/// Y=433
/// SCREEN=0
/// WINDOW=62914567
/// ```
pub(crate) fn parse_mouse_location(out: &str) -> Option<(i32, i32)> {
    let mut x = None;
    let mut y = None;
    for line in out.lines() {
        if let Some((key, value)) = line.trim().split_once('=') {
            match key {
                "X" => x = value.parse().ok(),
                "Y" => y = value.parse().ok(),
                _ => {}
            }
        }
    }
    Some((x?, y?))
}

impl Desktop for XDesktop {
    type Error = XDesktopError;

    fn pointer_location(&self) -> Result<(i32, i32), Self::Error> {
        let out = tool("xdotool", &["getmouselocation", "--shell"])?;
        parse_mouse_location(&out)
            .ok_or_else(|| XDesktopError(format!("unexpected getmouselocation output: {:?}", out)))
    }

    fn click_at(&self, x: i32, y: i32) -> Result<(), Self::Error> {
        let (x, y) = (x.to_string(), y.to_string());
        tool("xdotool", &["mousemove", &x, &y, "click", "1"]).map(drop)
    }

    fn click_button(&self, button: u8) -> Result<(), Self::Error> {
        tool("xdotool", &["click", &button.to_string()]).map(drop)
    }

    fn key(&self, chord: &str) -> Result<(), Self::Error> {
        tool("xdotool", &["key", chord]).map(drop)
    }

    fn type_text(&self, text: &str) -> Result<(), Self::Error> {
        // `--` keeps text starting with a dash from being read as a flag.
        tool("xdotool", &["type", "--", text]).map(drop)
    }

    fn focus_desktop(&self, index: u32) -> Result<(), Self::Error> {
        tool("bspc", &["desktop", "-f", &format!("^{}", index)]).map(drop)
    }

    fn screenshot(&self, path: &Path) -> Result<(), Self::Error> {
        let path = path.to_string_lossy();
        tool("scrot", &["-o", &path]).map(drop)
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), Self::Error> {
        tool("notify-send", &[title, body]).map(drop)
    }
}
