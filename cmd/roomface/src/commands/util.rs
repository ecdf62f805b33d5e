//! Utility functions for CLI commands.

use serde::Serialize;

use crate::config::Config;
use crate::Cli;

/// Loads the configuration and applies command-line overrides.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut cfg = Config::load(cli.config.as_deref())?;
    if let Some(root) = &cli.root {
        cfg.root = Some(root.clone());
    }
    if let Some(program) = &cli.extractor {
        cfg.extractor.program = program.clone();
    }
    tracing::debug!(layout = ?cfg.layout(), extractor = %cfg.extractor.program, "config loaded");
    Ok(cfg)
}

/// Prints a value as a single JSON line on stdout.
pub fn print_json_line<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
