//! Minimum cookie set check.
//!
//! Passing validation is necessary but not sufficient: the service only
//! confirms a session by accepting a request.

use std::collections::BTreeMap;

/// Cookies that must be present for NotebookLM to accept a request.
pub const REQUIRED_COOKIES: [&str; 5] = ["SID", "HSID", "SSID", "APISID", "SAPISID"];

/// Returns `true` when every [`REQUIRED_COOKIES`] name is a key of `cookies`.
///
/// Values are not inspected.
#[must_use]
pub fn validate_cookies(cookies: &BTreeMap<String, String>) -> bool {
    REQUIRED_COOKIES
        .iter()
        .all(|required| cookies.contains_key(*required))
}

/// Required cookie names absent from `cookies`, in [`REQUIRED_COOKIES`] order.
#[must_use]
pub fn missing_cookies(cookies: &BTreeMap<String, String>) -> Vec<&'static str> {
    REQUIRED_COOKIES
        .iter()
        .copied()
        .filter(|required| !cookies.contains_key(*required))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie_map(names: &[&str]) -> BTreeMap<String, String> {
        names
            .iter()
            .map(|name| ((*name).to_string(), format!("{name}-value")))
            .collect()
    }

    #[test]
    fn test_validate_accepts_exact_required_set() {
        assert!(validate_cookies(&cookie_map(&REQUIRED_COOKIES)));
    }

    #[test]
    fn test_validate_accepts_superset() {
        let mut names = REQUIRED_COOKIES.to_vec();
        names.extend(["NID", "__Secure-1PSID", "OSID"]);
        assert!(validate_cookies(&cookie_map(&names)));
    }

    #[test]
    fn test_removing_any_required_cookie_fails_validation() {
        for removed in REQUIRED_COOKIES {
            let mut cookies = cookie_map(&REQUIRED_COOKIES);
            cookies.remove(removed);
            assert!(
                !validate_cookies(&cookies),
                "validation should fail without {removed}"
            );
            assert_eq!(missing_cookies(&cookies), vec![removed]);
        }
    }

    #[test]
    fn test_validate_ignores_values() {
        let cookies = REQUIRED_COOKIES
            .iter()
            .map(|name| ((*name).to_string(), String::new()))
            .collect();
        assert!(validate_cookies(&cookies));
    }

    #[test]
    fn test_empty_cookie_set_misses_everything() {
        let cookies = BTreeMap::new();
        assert!(!validate_cookies(&cookies));
        assert_eq!(missing_cookies(&cookies), REQUIRED_COOKIES.to_vec());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let cookies = cookie_map(&["sid", "HSID", "SSID", "APISID", "SAPISID"]);
        assert!(!validate_cookies(&cookies));
        assert_eq!(missing_cookies(&cookies), vec!["SID"]);
    }
}
