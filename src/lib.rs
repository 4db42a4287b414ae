//! NotebookLM Auth Library
//!
//! Harvests, validates and caches the browser-session credentials a
//! NotebookLM consumer tool needs for authenticated requests: session
//! cookies, the CSRF token and the session identifier.
//!
//! # Architecture
//!
//! - [`auth`] - Token record, cache store, validator, markup extractor and
//!   the lifecycle coordinator tying them together
//!
//! Credentials are never minted here, only harvested from a session the
//! user has already signed in to.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;

// Re-export commonly used types
pub use auth::{
    AuthCollector, CacheError, CacheLocation, CacheStore, CollectError, CollectedAuth,
    CookieEntry, DEFAULT_MAX_AGE_HOURS, ExportCollector, ExportSource, LifecycleCoordinator,
    ObtainError, REQUIRED_COOKIES, RecordError, TokenRecord, extract_csrf, extract_session_id,
    parse_cookie_list, validate_cookies,
};
