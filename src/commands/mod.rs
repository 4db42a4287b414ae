//! CLI command handlers.

mod auth;
mod config;

pub use auth::{run_clear_command, run_login_command, run_status_command};
pub use config::run_config_show_command;
