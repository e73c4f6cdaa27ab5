//! Yonmoku session server library.
//!
//! Two-player four-in-a-row played over WebSocket: room lifecycle, turn
//! enforcement, win/draw detection, reconnection and a timed play-again vote.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
