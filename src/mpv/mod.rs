//! Client side of mpv's JSON IPC.
//!
//! mpv started with `--input-ipc-server=<path>` listens on a Unix socket
//! and accepts newline-delimited JSON commands.

pub mod ipc;
