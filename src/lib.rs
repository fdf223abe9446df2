//! Terminal client for the Sarvail alumni community.
//!
//! The library holds everything the `sarvail` binary runs: the REST client,
//! the feed and directory stores, session persistence and the ratatui UI.

pub mod api;
pub mod app;
pub mod config;
pub mod content;
pub mod feed;
pub mod people;
pub mod profile;
pub mod session;
pub mod storage;
pub mod theme;
pub mod ui;
pub mod util;
