//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app_config::check_max_age_hours;

/// Harvest and cache NotebookLM browser-session credentials.
///
/// Cached cookies, CSRF token and session id are reused by NotebookLM
/// consumer tools until they expire; run `login` again to refresh them.
#[derive(Parser, Debug)]
#[command(name = "notebooklm-consumer-auth")]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Flags accepted by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Auth cache file (default: ~/.notebooklm-consumer/auth.json)
    #[arg(long, value_name = "PATH", global = true)]
    pub cache_path: Option<PathBuf>,

    /// Hours before cached credentials are refreshed (default: 24)
    #[arg(long, value_name = "HOURS", global = true, value_parser = parse_max_age_hours)]
    pub max_age_hours: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Return cached credentials or extract fresh ones from a browser session (default)
    Login(LoginArgs),
    /// Show the cached credential state without secrets
    Status,
    /// Delete the cached credentials
    Clear,
    /// Show the effective configuration
    Config,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// DevTools cookie export (JSON) of the signed-in session
    #[arg(long, value_name = "PATH")]
    pub cookies: Option<PathBuf>,

    /// Saved HTML source of the signed-in NotebookLM page
    #[arg(long, value_name = "PATH")]
    pub html: Option<PathBuf>,

    /// Ignore cached credentials and extract fresh ones
    #[arg(short, long)]
    pub force: bool,
}

fn parse_max_age_hours(raw: &str) -> Result<f64, String> {
    let hours = raw
        .trim()
        .parse::<f64>()
        .map_err(|error| format!("invalid number: {error}"))?;
    check_max_age_hours(hours)?;
    Ok(hours)
}
