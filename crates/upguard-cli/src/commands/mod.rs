//! Subcommand implementations.

pub mod check;
pub mod clean;
pub mod completion;
pub mod config;
pub mod sniff;

use crate::error::add_file_context;
use anyhow::Result;
use std::path::Path;
use upguard_core::Config;

/// Loads the configuration file, or the defaults when none is given.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => add_file_context(Config::load(path), path),
        None => Ok(Config::default()),
    }
}
