//! WebRTC signaling relay library.
//!
//! This library provides the server side of a signaling relay: peers register
//! under a client ID, exchange opaque offer / answer / candidate messages, and
//! share presence payloads through bounded rooms.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
