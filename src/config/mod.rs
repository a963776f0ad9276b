//! Configuration management module
//!
//! This module handles loading the tool's own settings from defaults, a
//! settings file, environment variables and command-line flags.

pub mod settings;

pub use settings::*;
