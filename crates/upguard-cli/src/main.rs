//! Upguard CLI - Command-line utility for checking uploads and request
//! values against an upguard configuration.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    logging::init(cli.verbose, cli.quiet);
    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    match &cli.command {
        cli::Commands::Check(args) => commands::check::execute(args, &*formatter),
        cli::Commands::Sniff(args) => commands::sniff::execute(args, &*formatter),
        cli::Commands::Clean(args) => commands::clean::execute(args, &*formatter),
        cli::Commands::Config(args) => commands::config::execute(args, &*formatter),
        cli::Commands::Completion(args) => {
            commands::completion::execute(args.shell);
            Ok(())
        }
    }
}
