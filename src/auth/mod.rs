//! NotebookLM session credential lifecycle.
//!
//! Harvested cookies, CSRF token and session id are cached per user as JSON
//! and reused until they expire, at which point an interactive collector is
//! asked for a fresh browser session.

mod cache;
mod collector;
mod extract;
mod lifecycle;
mod record;
mod validate;

pub use cache::{
    CACHE_DIR_NAME, CACHE_FILE_NAME, CacheError, CacheLocation, CacheStore, HOME_OVERRIDE_ENV,
    default_cache_dir,
};
pub use collector::{DEFAULT_TARGET_URL, ExportCollector, ExportSource};
pub use extract::{
    CookieEntry, extract_csrf, extract_session_id, parse_cookie_export, parse_cookie_list,
};
pub use lifecycle::{AuthCollector, CollectError, CollectedAuth, LifecycleCoordinator, ObtainError};
pub use record::{DEFAULT_MAX_AGE_HOURS, RecordError, TokenRecord};
pub use validate::{REQUIRED_COOKIES, missing_cookies, validate_cookies};
