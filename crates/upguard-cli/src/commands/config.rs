//! Config command implementation

use super::load_config;
use crate::cli::ConfigArgs;
use crate::output::OutputFormatter;
use anyhow::Result;

pub fn execute(args: &ConfigArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    tracing::debug!(
        denied = %config.upload.denied,
        mode = ?config.sanitize.mode,
        "effective configuration"
    );
    formatter.format_config(&config)
}
