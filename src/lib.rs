//! **deskflow**: desktop automation utilities for an X11 session.
//!
//! The crate bundles a handful of small tools behind one binary:
//!
//! * UI *flows*: record a sequence of clicks, keystrokes, scrolls and
//!   desktop switches once, replay it later ([`flow`]).
//! * A Quran playback widget that drives a detached mpv over its JSON IPC
//!   socket ([`quran`], [`mpv`]).
//! * A YouTube channel watchlist downloader ([`watchlist`]) and a pruner
//!   for short videos ([`prune`]).
//! * A screenshot cropper that cuts a post screenshot down to its photo
//!   ([`crop`]).
//!
//! # Architecture
//!
//! Everything that touches the desktop goes through three traits in
//! [`traits`]:
//!
//! * [`traits::Desktop`]: pointer, keyboard, window manager, screenshots
//!   and notifications.
//! * [`traits::Prompter`]: blocking menu / free-text dialogs.
//! * [`traits::TextLocator`]: finding a word on a screenshot.
//!
//! Concrete implementations live in [`x11`] (xdotool, bspc, scrot,
//! notify-send, rofi and tesseract).

pub mod action;
pub mod config;
pub mod crop;
pub mod flow;
pub mod mpv;
pub mod prune;
pub mod quran;
pub mod traits;
pub mod watchlist;
pub mod x11;
