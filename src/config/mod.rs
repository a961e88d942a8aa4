//! Configuration module for Tally
//!
//! This module provides configuration management including:
//! - base directory and per-book path resolution
//! - user settings persistence

pub mod paths;
pub mod settings;

pub use paths::{BookPaths, TallyPaths};
pub use settings::Settings;
