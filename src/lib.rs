//! Love Quests
//!
//! Quests earn hearts, hearts buy rewards. Progress lives in a local cache
//! and is synced best-effort to a shared store; magic codes move it between
//! devices by hand.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod format;
pub mod logging;
pub mod progress;
pub mod remote;
pub mod server;
pub mod session;
pub mod story;
pub mod sync_code;
pub mod types;
pub mod validate;
