//! Cache-first retrieval of usable credentials.
//!
//! [`LifecycleCoordinator::obtain`] returns a cached record when one is fresh
//! and complete. Otherwise it runs the injected [`AuthCollector`] once,
//! validates the harvested cookies and persists a brand-new record.

use std::io;
use std::path::PathBuf;

use tracing::{info, instrument, warn};

use super::cache::CacheStore;
use super::extract::{CookieEntry, extract_csrf, extract_session_id, parse_cookie_list};
use super::record::{TokenRecord, unix_now};
use super::validate::{missing_cookies, validate_cookies};

/// Raw material handed back by an interactive collector.
#[derive(Debug, Clone, Default)]
pub struct CollectedAuth {
    /// Cookies in browser order; later duplicates win.
    pub cookies: Vec<CookieEntry>,
    /// Markup of an authenticated NotebookLM page.
    pub html: String,
}

/// Errors raised by a collector.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// A collector input file could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Interactive prompt I/O failed.
    #[error("failed to read interactive input: {0}")]
    Prompt(#[from] io::Error),
    /// Cookie export was not valid JSON of a known shape.
    #[error("invalid cookie export JSON: {0}")]
    CookieExport(#[from] serde_json::Error),
    /// The user abandoned the flow.
    #[error("{0}")]
    Aborted(String),
}

/// Capability that drives an authenticated browser session and returns its
/// cookies and page markup.
///
/// Implementations may block indefinitely while waiting for the user.
pub trait AuthCollector {
    /// Collects cookies and page markup from an authenticated session.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] when the session material cannot be obtained.
    fn collect(&mut self) -> Result<CollectedAuth, CollectError>;
}

impl<C: AuthCollector + ?Sized> AuthCollector for &mut C {
    fn collect(&mut self) -> Result<CollectedAuth, CollectError> {
        (**self).collect()
    }
}

/// Errors surfaced by [`LifecycleCoordinator::obtain`].
#[derive(Debug, thiserror::Error)]
pub enum ObtainError {
    /// Extraction was needed but no collector is wired in.
    #[error("no interactive extraction collector is available to refresh auth tokens")]
    ExtractionUnavailable,
    /// Harvested cookies lack required session cookies; nothing was cached.
    #[error("extracted cookies are missing required entries: {}", missing.join(", "))]
    IncompleteCredentials { missing: Vec<&'static str> },
    /// The collector failed.
    #[error("credential collection failed: {0}")]
    Collector(#[from] CollectError),
    /// Writing the cache failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Orchestrates cache lookup, interactive extraction and persistence.
pub struct LifecycleCoordinator<'a> {
    store: CacheStore,
    collector: Option<Box<dyn AuthCollector + 'a>>,
}

impl<'a> LifecycleCoordinator<'a> {
    /// Creates a coordinator with no collector; a cache miss then fails with
    /// [`ObtainError::ExtractionUnavailable`].
    #[must_use]
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            collector: None,
        }
    }

    /// Wires in the interactive collector.
    #[must_use]
    pub fn with_collector(mut self, collector: impl AuthCollector + 'a) -> Self {
        self.collector = Some(Box::new(collector));
        self
    }

    #[must_use]
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    #[must_use]
    pub fn has_collector(&self) -> bool {
        self.collector.is_some()
    }

    /// Returns usable credentials, from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`ObtainError`] when extraction is needed and unavailable,
    /// collection fails, the cookies are incomplete, or the cache write fails.
    #[instrument(level = "debug", skip(self), fields(cache = %self.store.location().path().display()))]
    pub fn obtain(&mut self) -> Result<TokenRecord, ObtainError> {
        if let Some(record) = self.store.load() {
            if record.is_usable() {
                info!(
                    age_secs = record.age_secs(),
                    cookies = record.cookies().len(),
                    "Using cached auth tokens"
                );
                return Ok(record);
            }
            warn!(
                missing = ?missing_cookies(record.cookies()),
                "Cached auth tokens lack required cookies, re-extracting"
            );
        }

        self.extract()
    }

    /// Ignores the cache and extracts fresh credentials.
    ///
    /// # Errors
    ///
    /// Same as [`LifecycleCoordinator::obtain`] on a cache miss.
    pub fn refresh(&mut self) -> Result<TokenRecord, ObtainError> {
        info!("Forced refresh requested, skipping cached auth tokens");
        self.extract()
    }

    fn extract(&mut self) -> Result<TokenRecord, ObtainError> {
        let Some(collector) = self.collector.as_mut() else {
            return Err(ObtainError::ExtractionUnavailable);
        };

        info!("Starting interactive auth token extraction");
        let collected = collector.collect()?;
        let extracted_at = unix_now();

        let cookies = parse_cookie_list(collected.cookies);
        if !validate_cookies(&cookies) {
            let missing = missing_cookies(&cookies);
            warn!(?missing, cookies = cookies.len(), "Extracted cookies are incomplete");
            return Err(ObtainError::IncompleteCredentials { missing });
        }

        let csrf_token = extract_csrf(&collected.html).unwrap_or_else(|| {
            warn!("CSRF token not found in page markup; state-changing requests will fail");
            String::new()
        });
        let session_id = extract_session_id(&collected.html).unwrap_or_else(|| {
            warn!("Session id not found in page markup");
            String::new()
        });

        let record = TokenRecord::new(cookies, csrf_token, session_id, extracted_at);
        self.store.save(&record)?;
        info!(cookies = record.cookies().len(), "Extracted fresh auth tokens");
        Ok(record)
    }
}
