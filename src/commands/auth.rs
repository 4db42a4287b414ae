//! Auth command handlers: login, status and clear for the credential cache.

use std::io::{self, IsTerminal};

use anyhow::{Result, anyhow};
use notebooklm_auth::auth::missing_cookies;
use notebooklm_auth::{
    CacheError, CacheStore, ExportCollector, ExportSource, LifecycleCoordinator, ObtainError,
    TokenRecord,
};
use tracing::{info, warn};

use crate::ProcessExit;
use crate::app_config::Settings;
use crate::cli::LoginArgs;

const SECS_PER_HOUR: f64 = 3600.0;

fn cache_store(settings: &Settings) -> CacheStore {
    CacheStore::new(settings.cache_location.clone()).with_max_age_hours(settings.max_age_hours)
}

/// Picks where each export comes from, or `None` when a path is missing and
/// nobody is at the terminal to type it.
fn export_sources(args: &LoginArgs, interactive: bool) -> Option<(ExportSource, ExportSource)> {
    let source = |path: &Option<std::path::PathBuf>| match path {
        Some(path) => Some(ExportSource::File(path.clone())),
        None if interactive => Some(ExportSource::Prompt),
        None => None,
    };
    Some((source(&args.cookies)?, source(&args.html)?))
}

pub fn run_login_command(settings: &Settings, args: &LoginArgs) -> Result<ProcessExit> {
    let mut coordinator = LifecycleCoordinator::new(cache_store(settings));

    let interactive = io::stdin().is_terminal();
    if let Some((cookies, html)) = export_sources(args, interactive) {
        let collector = ExportCollector::new(cookies, html, io::stdin().lock(), io::stderr())
            .with_target_url(settings.target_url.clone());
        coordinator = coordinator.with_collector(collector);
    }

    let result = if args.force {
        coordinator.refresh()
    } else {
        coordinator.obtain()
    };

    match result {
        Ok(record) => {
            print_login_summary(&record, settings);
            Ok(ProcessExit::Success)
        }
        Err(ObtainError::ExtractionUnavailable) => Err(anyhow!(
            "Authentication failed: no usable cached tokens and no way to extract new ones; \
             pass --cookies and --html, or run interactively from a terminal"
        )),
        Err(error) => Err(anyhow!("Authentication failed: {error}")),
    }
}

fn print_login_summary(record: &TokenRecord, settings: &Settings) {
    println!(
        "Authenticated: {} cookies cached at {}",
        record.cookies().len(),
        settings.cache_location.path().display()
    );
    println!("csrf_token = {}", presence(record.csrf_token()));
    println!("session_id = {}", presence(record.session_id()));
}

fn presence(value: &str) -> &'static str {
    if value.is_empty() { "missing" } else { "present" }
}

pub fn run_status_command(settings: &Settings) -> Result<ProcessExit> {
    let store = cache_store(settings);
    let path = store.location().path();
    println!("cache_path = {}", path.display());

    let record = match store.read() {
        Ok(Some(record)) => record,
        Ok(None) => {
            println!("state = missing");
            return Ok(ProcessExit::Failure);
        }
        Err(CacheError::Io(error)) => {
            return Err(anyhow!("Failed to read auth cache: {error}"));
        }
        Err(error) => {
            warn!(%error, "Cached auth tokens are unreadable");
            println!("state = corrupt");
            return Ok(ProcessExit::Failure);
        }
    };

    let expired = record.is_expired(store.max_age_hours());
    let missing = missing_cookies(record.cookies());
    let state = if expired {
        "expired"
    } else if !missing.is_empty() {
        "incomplete"
    } else {
        "valid"
    };

    println!("state = {state}");
    println!("age_hours = {:.1}", record.age_secs() / SECS_PER_HOUR);
    println!("max_age_hours = {}", store.max_age_hours());
    println!("cookies = {}", record.cookies().len());
    if !missing.is_empty() {
        println!("missing_cookies = {}", missing.join(", "));
    }
    println!("csrf_token = {}", presence(record.csrf_token()));
    println!("session_id = {}", presence(record.session_id()));

    Ok(if state == "valid" {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    })
}

pub fn run_clear_command(settings: &Settings) -> Result<ProcessExit> {
    let store = cache_store(settings);
    let removed = store
        .clear()
        .map_err(|error| anyhow!("Failed to clear cached auth tokens: {error}"))?;

    if removed {
        info!(path = %store.location().path().display(), "Cleared cached auth tokens");
    } else {
        info!("No cached auth tokens found");
    }

    Ok(ProcessExit::Success)
}
