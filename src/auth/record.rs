//! Harvested credential bundle and its persisted JSON form.
//!
//! A [`TokenRecord`] is created once per extraction event and never mutated;
//! a refresh always produces a new record.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use tracing::debug;
use url::Url;

use super::validate::validate_cookies;

/// Credential age after which a cached record must be refreshed.
pub const DEFAULT_MAX_AGE_HOURS: f64 = 24.0;

const SECS_PER_HOUR: f64 = 3600.0;

/// Errors produced while decoding a persisted record.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Input is not parseable JSON.
    #[error("auth record is not valid JSON: {0}")]
    CacheCorrupt(#[source] serde_json::Error),
    /// Input is JSON but lacks a required field or has the wrong shape.
    #[error("auth record is malformed: {0}")]
    MalformedRecord(#[source] serde_json::Error),
}

impl RecordError {
    fn from_json_error(error: serde_json::Error) -> Self {
        match error.classify() {
            Category::Data => Self::MalformedRecord(error),
            Category::Io | Category::Syntax | Category::Eof => Self::CacheCorrupt(error),
        }
    }
}

/// Cookies, CSRF token and session id captured from an authenticated session.
///
/// Cookie values and the CSRF token are secrets. The `Debug` output only
/// lists cookie names.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    cookies: BTreeMap<String, String>,
    csrf_token: String,
    session_id: String,
    // A missing timestamp decodes as the epoch, which is always expired.
    #[serde(default)]
    extracted_at: f64,
}

impl TokenRecord {
    /// Creates a record captured at `extracted_at` (seconds since the Unix epoch).
    #[must_use]
    pub fn new(
        cookies: BTreeMap<String, String>,
        csrf_token: String,
        session_id: String,
        extracted_at: f64,
    ) -> Self {
        Self {
            cookies,
            csrf_token,
            session_id,
            extracted_at,
        }
    }

    /// Cookie name to value mapping, in name order.
    #[must_use]
    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    /// Anti-forgery token required on state-changing requests.
    ///
    /// Sensitive: avoid logging the return value.
    #[must_use]
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Capture time in seconds since the Unix epoch.
    #[must_use]
    pub fn extracted_at(&self) -> f64 {
        self.extracted_at
    }

    /// Returns `true` when the cookie set carries every required session cookie.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        validate_cookies(&self.cookies)
    }

    /// Returns `true` when the record is older than `max_age_hours`.
    #[must_use]
    pub fn is_expired(&self, max_age_hours: f64) -> bool {
        self.is_expired_at(unix_now(), max_age_hours)
    }

    /// Expiry check against an explicit clock reading.
    #[must_use]
    pub fn is_expired_at(&self, now: f64, max_age_hours: f64) -> bool {
        now - self.extracted_at > max_age_hours * SECS_PER_HOUR
    }

    /// Seconds elapsed since capture, clamped at zero for clock skew.
    #[must_use]
    pub fn age_secs(&self) -> f64 {
        (unix_now() - self.extracted_at).max(0.0)
    }

    /// Renders the cookies as a `Cookie` request header value.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Builds a cookie jar holding every cookie, scoped to `url`'s host.
    #[must_use]
    pub fn cookie_jar(&self, url: &Url) -> Arc<Jar> {
        let jar = Arc::new(Jar::default());
        let secure = url.scheme() == "https";

        for (name, value) in &self.cookies {
            let mut set_cookie = format!("{name}={value}; Path=/");
            if secure {
                set_cookie.push_str("; Secure");
            }
            jar.add_cookie_str(&set_cookie, url);
            debug!(name = %name, host = ?url.host_str(), "loaded cookie into jar");
        }

        jar
    }

    /// Structured form of the record.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "cookies": self.cookies,
            "csrf_token": self.csrf_token,
            "session_id": self.session_id,
            "extracted_at": self.extracted_at,
        })
    }

    /// Decodes a record from its structured form.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MalformedRecord`] when `cookies`, `csrf_token`
    /// or `session_id` is missing or has the wrong type.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RecordError> {
        serde_json::from_value(value).map_err(RecordError::MalformedRecord)
    }

    /// Serializes the record as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; not expected for string maps.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a record from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::CacheCorrupt`] for unparseable input and
    /// [`RecordError::MalformedRecord`] for JSON missing required fields.
    pub fn from_json(raw: &str) -> Result<Self, RecordError> {
        serde_json::from_str(raw).map_err(RecordError::from_json_error)
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .field("csrf_token", &"[REDACTED]")
            .field("session_id", &self.session_id)
            .field("extracted_at", &self.extracted_at)
            .finish()
    }
}

/// Current wall-clock time in fractional seconds since the Unix epoch.
pub(crate) fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |duration| duration.as_secs_f64())
}
