//! CLI entry point for the NotebookLM credential helper.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod app_config;
mod cli;
mod commands;
mod terminal;

use cli::{Cli, Command, LoginArgs};

/// Process outcome mapped to the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::FAILURE,
        }
    }
}

fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    let no_color = terminal::should_disable_color(
        cli.global.no_color,
        terminal::no_color_env_requested(),
        terminal::is_dumb_terminal(),
    );
    terminal::init_tracing(
        terminal::default_log_level(cli.global.verbose, cli.global.quiet),
        no_color,
    );
    debug!(?cli, "CLI arguments parsed");

    match run(&cli) {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Failure.into()
        }
    }
}

fn run(cli: &Cli) -> Result<ProcessExit> {
    let loaded = app_config::load_default_file_config()?;
    let settings = app_config::resolve_settings(&cli.global, &loaded)?;
    debug!(cache = %settings.cache_location.path().display(), "Resolved settings");

    match &cli.command {
        None => commands::run_login_command(&settings, &LoginArgs::default()),
        Some(Command::Login(args)) => commands::run_login_command(&settings, args),
        Some(Command::Status) => commands::run_status_command(&settings),
        Some(Command::Clear) => commands::run_clear_command(&settings),
        Some(Command::Config) => commands::run_config_show_command(&settings, &loaded),
    }
}
