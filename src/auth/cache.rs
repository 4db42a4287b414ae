//! Per-user persistence of the most recent [`TokenRecord`].
//!
//! The cache lives at `~/.notebooklm-consumer/auth.json` unless
//! `NOTEBOOKLM_CONSUMER_HOME` or an explicit [`CacheLocation`] says otherwise.
//! A corrupt or stale cache is reported and treated as absent.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::record::{DEFAULT_MAX_AGE_HOURS, RecordError, TokenRecord};

/// Directory name created under the user's home directory.
pub const CACHE_DIR_NAME: &str = ".notebooklm-consumer";
/// File name of the cached record inside the cache directory.
pub const CACHE_FILE_NAME: &str = "auth.json";
/// Environment variable that overrides the cache directory.
pub const HOME_OVERRIDE_ENV: &str = "NOTEBOOKLM_CONSUMER_HOME";

/// Errors raised by raw cache access.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Neither the override variable nor a home directory is available.
    #[error("unable to determine cache directory (set NOTEBOOKLM_CONSUMER_HOME or HOME)")]
    HomeUnavailable,
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Cache contents could not be decoded.
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Filesystem location of the cache file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    path: PathBuf,
}

impl CacheLocation {
    /// Uses `path` as the cache file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `auth.json` inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CACHE_FILE_NAME))
    }

    /// The per-user default: `auth.json` inside [`default_cache_dir`].
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::HomeUnavailable`] if no base directory is found.
    pub fn default_location() -> Result<Self, CacheError> {
        Ok(Self::in_dir(default_cache_dir()?))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the cache file.
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from(CACHE_FILE_NAME), OsString::from);
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Returns the per-user cache directory.
///
/// Priority:
/// 1. `$NOTEBOOKLM_CONSUMER_HOME`
/// 2. `$HOME/.notebooklm-consumer`
/// 3. `%USERPROFILE%\.notebooklm-consumer`
///
/// # Errors
///
/// Returns [`CacheError::HomeUnavailable`] when none of the variables is set.
pub fn default_cache_dir() -> Result<PathBuf, CacheError> {
    resolve_cache_dir(
        sanitize_env_path(env::var_os(HOME_OVERRIDE_ENV)),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("USERPROFILE")),
    )
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

fn resolve_cache_dir(
    override_dir: Option<PathBuf>,
    home: Option<PathBuf>,
    user_profile: Option<PathBuf>,
) -> Result<PathBuf, CacheError> {
    if let Some(dir) = override_dir {
        return Ok(dir);
    }
    if let Some(home) = home {
        return Ok(home.join(CACHE_DIR_NAME));
    }
    if let Some(user_profile) = user_profile {
        return Ok(user_profile.join(CACHE_DIR_NAME));
    }

    Err(CacheError::HomeUnavailable)
}

/// Single-record store backed by one JSON file.
///
/// There is no locking: concurrent writers race and the last rename wins.
#[derive(Debug, Clone)]
pub struct CacheStore {
    location: CacheLocation,
    max_age_hours: f64,
}

impl CacheStore {
    /// Creates a store with the default 24 hour expiry.
    #[must_use]
    pub fn new(location: CacheLocation) -> Self {
        Self {
            location,
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
        }
    }

    /// Overrides the age after which [`CacheStore::load`] discards a record.
    #[must_use]
    pub fn with_max_age_hours(mut self, max_age_hours: f64) -> Self {
        self.max_age_hours = max_age_hours;
        self
    }

    #[must_use]
    pub fn location(&self) -> &CacheLocation {
        &self.location
    }

    #[must_use]
    pub fn max_age_hours(&self) -> f64 {
        self.max_age_hours
    }

    /// Reads the cached record without any expiry check.
    ///
    /// Returns `Ok(None)` when no cache file exists.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the file cannot be read or decoded.
    pub fn read(&self) -> Result<Option<TokenRecord>, CacheError> {
        let path = self.location.path();
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(path)?;
        let record = TokenRecord::from_json(&raw)?;
        Ok(Some(record))
    }

    /// Returns the cached record if it exists, decodes, and has not expired.
    ///
    /// Every failure is logged and reported as `None`.
    #[must_use]
    pub fn load(&self) -> Option<TokenRecord> {
        let path = self.location.path();
        match self.read() {
            Ok(None) => {
                debug!(path = %path.display(), "no cached auth tokens");
                None
            }
            Ok(Some(record)) if record.is_expired(self.max_age_hours) => {
                info!(
                    path = %path.display(),
                    age_secs = record.age_secs(),
                    max_age_hours = self.max_age_hours,
                    "Cached auth tokens expired, refresh needed"
                );
                None
            }
            Ok(Some(record)) => {
                debug!(
                    path = %path.display(),
                    cookies = record.cookies().len(),
                    "loaded cached auth tokens"
                );
                Some(record)
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "Failed to load cached auth tokens");
                None
            }
        }
    }

    /// Writes `record`, replacing any previous cache file.
    ///
    /// The record is written to a sibling temp file and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error unchanged.
    pub fn save(&self, record: &TokenRecord) -> io::Result<()> {
        if let Some(dir) = self.location.dir() {
            fs::create_dir_all(dir)?;
        }

        let json = record.to_json()?;
        let temp_path = self.location.temp_path();
        fs::write(&temp_path, json)?;
        set_owner_only_permissions(&temp_path)?;

        if let Err(error) = fs::rename(&temp_path, self.location.path()) {
            let _ = fs::remove_file(&temp_path);
            return Err(error);
        }

        info!(path = %self.location.path().display(), "Auth tokens cached");
        Ok(())
    }

    /// Deletes the cache file.
    ///
    /// Returns `true` when a file existed and was removed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when removal fails.
    pub fn clear(&self) -> io::Result<bool> {
        let path = self.location.path();
        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(path)?;
        Ok(true)
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tempfile::TempDir;

    use super::*;
    use crate::auth::record::unix_now;

    fn sample_record(extracted_at: f64) -> TokenRecord {
        let cookies = ["SID", "HSID", "SSID", "APISID", "SAPISID"]
            .into_iter()
            .map(|name| (name.to_string(), format!("{name}-secret")))
            .collect::<BTreeMap<_, _>>();
        TokenRecord::new(cookies, "csrf".to_string(), "123".to_string(), extracted_at)
    }

    fn store_in(tempdir: &TempDir) -> CacheStore {
        CacheStore::new(CacheLocation::in_dir(tempdir.path().join("cache")))
    }

    #[test]
    fn test_load_missing_file_returns_none() {
        let tempdir = TempDir::new().unwrap();
        let store = store_in(&tempdir);
        assert!(store.load().is_none());
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_directory_and_round_trips() {
        let tempdir = TempDir::new().unwrap();
        let store = store_in(&tempdir);
        let record = sample_record(unix_now());

        store.save(&record).unwrap();

        assert!(store.location().path().is_file());
        assert_eq!(store.load(), Some(record));
    }

    #[test]
    fn test_save_is_idempotent_on_existing_directory() {
        let tempdir = TempDir::new().unwrap();
        let store = store_in(&tempdir);
        store.save(&sample_record(unix_now())).unwrap();
        let second = sample_record(unix_now());
        store.save(&second).unwrap();
        assert_eq!(store.load(), Some(second));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let tempdir = TempDir::new().unwrap();
        let store = store_in(&tempdir);
        store.save(&sample_record(unix_now())).unwrap();
        assert!(!store.location().temp_path().exists());
    }

    #[test]
    fn test_saved_file_uses_persisted_layout() {
        let tempdir = TempDir::new().unwrap();
        let store = store_in(&tempdir);
        store.save(&sample_record(1_718_000_000.0)).unwrap();

        let raw = fs::read_to_string(store.location().path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["cookies"]["SID"], "SID-secret");
        assert_eq!(value["csrf_token"], "csrf");
        assert_eq!(value["session_id"], "123");
        assert_eq!(value["extracted_at"], 1_718_000_000.0);
    }

    #[test]
    fn test_load_expired_record_returns_none_but_read_returns_it() {
        let tempdir = TempDir::new().unwrap();
        let store = store_in(&tempdir);
        let stale = sample_record(unix_now() - 25.0 * 3600.0);
        store.save(&stale).unwrap();

        assert!(store.load().is_none());
        assert_eq!(store.read().unwrap(), Some(stale));
    }

    #[test]
    fn test_max_age_override_changes_expiry() {
        let tempdir = TempDir::new().unwrap();
        let record = sample_record(unix_now() - 3.0 * 3600.0);
        store_in(&tempdir).save(&record).unwrap();

        assert!(store_in(&tempdir).load().is_some());
        assert!(store_in(&tempdir).with_max_age_hours(2.0).load().is_none());
    }

    #[test]
    fn test_load_corrupt_file_returns_none() {
        let tempdir = TempDir::new().unwrap();
        let store = store_in(&tempdir);
        fs::create_dir_all(store.location().dir().unwrap()).unwrap();
        fs::write(store.location().path(), "{ not json").unwrap();

        assert!(store.load().is_none());
        assert!(matches!(
            store.read(),
            Err(CacheError::Record(RecordError::CacheCorrupt(_)))
        ));
    }

    #[test]
    fn test_load_malformed_record_returns_none() {
        let tempdir = TempDir::new().unwrap();
        let store = store_in(&tempdir);
        fs::create_dir_all(store.location().dir().unwrap()).unwrap();
        fs::write(
            store.location().path(),
            r#"{"cookies": {"SID": "a"}, "extracted_at": 1}"#,
        )
        .unwrap();

        assert!(store.load().is_none());
        assert!(matches!(
            store.read(),
            Err(CacheError::Record(RecordError::MalformedRecord(_)))
        ));
    }

    #[test]
    fn test_load_unreadable_path_returns_none() {
        let tempdir = TempDir::new().unwrap();
        let store = store_in(&tempdir);
        // A directory where the file should be cannot be read as text.
        fs::create_dir_all(store.location().path()).unwrap();

        assert!(store.load().is_none());
        assert!(matches!(store.read(), Err(CacheError::Io(_))));
    }

    #[test]
    fn test_clear_removes_existing_file() {
        let tempdir = TempDir::new().unwrap();
        let store = store_in(&tempdir);
        store.save(&sample_record(unix_now())).unwrap();

        assert!(store.clear().unwrap());
        assert!(!store.location().path().exists());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_save_surfaces_io_errors() {
        let tempdir = TempDir::new().unwrap();
        let blocker = tempdir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let store = CacheStore::new(CacheLocation::in_dir(blocker.join("nested")));

        assert!(store.save(&sample_record(unix_now())).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tempdir = TempDir::new().unwrap();
        let store = store_in(&tempdir);
        store.save(&sample_record(unix_now())).unwrap();

        let mode = fs::metadata(store.location().path())
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_location_in_dir_appends_file_name() {
        let location = CacheLocation::in_dir("/tmp/notebooklm");
        assert_eq!(location.path(), Path::new("/tmp/notebooklm/auth.json"));
        assert_eq!(location.dir(), Some(Path::new("/tmp/notebooklm")));
    }

    #[test]
    fn test_bare_file_name_has_no_directory() {
        assert_eq!(CacheLocation::new("auth.json").dir(), None);
    }

    #[test]
    fn test_sanitize_env_path_rejects_blank_values() {
        assert!(sanitize_env_path(Some(OsString::from(""))).is_none());
        assert!(sanitize_env_path(Some(OsString::from("   "))).is_none());
        assert!(sanitize_env_path(None).is_none());
    }

    #[test]
    fn test_resolve_cache_dir_prefers_override() {
        let resolved = resolve_cache_dir(
            Some(PathBuf::from("/tmp/override")),
            Some(PathBuf::from("/tmp/home")),
            Some(PathBuf::from("/tmp/profile")),
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/override"));
    }

    #[test]
    fn test_resolve_cache_dir_falls_back_to_home() {
        let resolved = resolve_cache_dir(
            None,
            Some(PathBuf::from("/tmp/home")),
            Some(PathBuf::from("/tmp/profile")),
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/home/.notebooklm-consumer"));
    }

    #[test]
    fn test_resolve_cache_dir_falls_back_to_user_profile() {
        let resolved = resolve_cache_dir(None, None, Some(PathBuf::from("/tmp/profile"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/profile/.notebooklm-consumer"));
    }

    #[test]
    fn test_resolve_cache_dir_errors_when_all_sources_missing() {
        let result = resolve_cache_dir(None, None, None);
        assert!(matches!(result, Err(CacheError::HomeUnavailable)));
    }
}
