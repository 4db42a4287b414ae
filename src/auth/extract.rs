//! Token recovery from NotebookLM page markup and DevTools cookie exports.
//!
//! Each token has a fixed, ordered list of embedding patterns. Patterns are
//! tried in list order and the first one that matches anywhere in the markup
//! wins, even when a later pattern would also match.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument};

/// One embedding format for a token, with a label used in diagnostics.
struct TokenPattern {
    label: &'static str,
    regex: Regex,
}

impl TokenPattern {
    #[allow(clippy::expect_used)]
    fn new(label: &'static str, pattern: &str) -> Self {
        Self {
            label,
            regex: Regex::new(pattern).expect("token regex is valid"), // Static pattern, safe to panic
        }
    }
}

/// CSRF embeddings in priority order: `WIZ_global_data.SNlM0e`, a raw `at=`
/// parameter, then the `FdrFJe` field.
static CSRF_PATTERNS: LazyLock<[TokenPattern; 3]> = LazyLock::new(|| {
    [
        TokenPattern::new("SNlM0e", r#""SNlM0e":"([^"]+)""#),
        TokenPattern::new("at-param", r#"at=([^&"]+)"#),
        TokenPattern::new("FdrFJe", r#""FdrFJe":"([^"]+)""#),
    ]
});

/// Session id embeddings in priority order.
static SESSION_ID_PATTERNS: LazyLock<[TokenPattern; 2]> = LazyLock::new(|| {
    [
        TokenPattern::new("FdrFJe", r#""FdrFJe":"([^"]+)""#),
        TokenPattern::new("f.sid", r"f\.sid=(\d+)"),
    ]
});

fn first_match(html: &str, patterns: &[TokenPattern], token: &'static str) -> Option<String> {
    for pattern in patterns {
        if let Some(captures) = pattern.regex.captures(html)
            && let Some(group) = captures.get(1)
        {
            debug!(token, pattern = pattern.label, "token found in page markup");
            return Some(group.as_str().to_string());
        }
    }
    debug!(token, "token not found in page markup");
    None
}

/// Recovers the CSRF token from page markup.
///
/// Returns `None` when no known embedding is present.
#[must_use]
#[instrument(level = "debug", skip(html), fields(html_len = html.len()))]
pub fn extract_csrf(html: &str) -> Option<String> {
    first_match(html, CSRF_PATTERNS.as_slice(), "csrf_token")
}

/// Recovers the session identifier from page markup.
///
/// Returns `None` when no known embedding is present.
#[must_use]
#[instrument(level = "debug", skip(html), fields(html_len = html.len()))]
pub fn extract_session_id(html: &str) -> Option<String> {
    first_match(html, SESSION_ID_PATTERNS.as_slice(), "session_id")
}

/// A cookie as reported by browser DevTools. Fields other than `name` and
/// `value` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CookieEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl CookieEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }
}

/// Converts ordered cookie entries into a name to value mapping.
///
/// Entries with an empty or missing name are skipped. A repeated name keeps
/// the value of its last occurrence. A missing value becomes an empty string.
#[must_use]
pub fn parse_cookie_list<I>(entries: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = CookieEntry>,
{
    let mut cookies = BTreeMap::new();
    for entry in entries {
        let Some(name) = entry.name.filter(|name| !name.is_empty()) else {
            continue;
        };
        cookies.insert(name, entry.value.unwrap_or_default());
    }
    cookies
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CookieExportPayload {
    Array(Vec<CookieEntry>),
    Wrapped { cookies: Vec<CookieEntry> },
}

/// Parses a DevTools cookie export: a JSON array of cookie objects, or an
/// object with a `cookies` array.
///
/// # Errors
///
/// Returns the JSON error when the payload matches neither shape.
#[instrument(level = "debug", skip(raw))]
pub fn parse_cookie_export(raw: &str) -> Result<Vec<CookieEntry>, serde_json::Error> {
    let payload: CookieExportPayload = serde_json::from_str(raw.trim())?;
    let entries = match payload {
        CookieExportPayload::Array(entries) | CookieExportPayload::Wrapped { cookies: entries } => {
            entries
        }
    };
    debug!(entries = entries.len(), "parsed cookie export");
    Ok(entries)
}
