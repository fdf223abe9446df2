//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard and mouse input handling
//! - `events` - Background task event processing
//! - `render` - Header, tab bar and screen dispatch
//! - `helpers` - Task spawning and browser launching
//! - `home`, `detail`, `people`, `member`, `profile`, `sign_in` - One per screen
//! - `status` - Status bar widget
//! - `help` - Key table overlay

mod detail;
mod events;
mod help;
mod helpers;
mod home;
mod input;
mod loop_runner;
mod member;
mod people;
mod profile;
mod render;
mod sign_in;
mod status;

// Re-export the public API
pub use loop_runner::{run, Action};
