//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "upguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check an upload file against the archive denylist
    Check(CheckArgs),
    /// Print the detected type of files
    Sniff(SniffArgs),
    /// Run a request value through the sanitizer
    Clean(CleanArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Path to the uploaded file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Check as a web-facing upload (uses `web_denied` when configured)
    #[arg(long)]
    pub web: bool,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Comma-separated denied types, overriding the configuration
    #[arg(long, value_name = "LIST")]
    pub denied: Option<String>,

    /// Skip unreadable archive entries instead of rejecting the upload
    #[arg(long)]
    pub best_effort: bool,

    /// Maximum single extracted file size in bytes
    #[arg(long, value_parser = parse_byte_size)]
    pub max_file_size: Option<u64>,

    /// Maximum total extracted size in bytes
    #[arg(long, value_parser = parse_byte_size)]
    pub max_total_size: Option<u64>,
}

#[derive(clap::Args)]
pub struct SniffArgs {
    /// Files to inspect
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(clap::Args)]
pub struct CleanArgs {
    /// Value to check
    #[arg(value_name = "VALUE")]
    pub value: String,

    /// Parameter (or header) name the value arrives under
    #[arg(short, long, default_value = "value")]
    pub name: String,

    /// Treat the value as a header (no SQL injection check)
    #[arg(long)]
    pub header: bool,

    /// Treat the value as a plain-text request body
    #[arg(long, conflicts_with_all = ["header", "name"])]
    pub body: bool,

    /// Request path reported in the rejection message
    #[arg(short, long, default_value = "/")]
    pub path: String,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    /// Configuration file (TOML); defaults apply when omitted
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Parse byte size with optional suffix (K, M, G, T)
#[allow(clippy::option_if_let_else)]
fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte size".to_string());
    }

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix('T') {
        (stripped, 1024_u64.pow(4))
    } else if let Some(stripped) = s.strip_suffix('G') {
        (stripped, 1024_u64.pow(3))
    } else if let Some(stripped) = s.strip_suffix('M') {
        (stripped, 1024_u64.pow(2))
    } else if let Some(stripped) = s.strip_suffix('K') {
        (stripped, 1024)
    } else {
        (s, 1)
    };

    num_str
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("byte size overflow: {s}"))
        })
}
