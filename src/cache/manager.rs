//! Cache store for persisting section payloads to disk
//!
//! Provides a `CacheStore` that stores JSON payloads in files with expiry
//! timestamps. Reads pass every entry through a fixed sequence of integrity
//! gates and the registered payload validators before trusting it.

use chrono::{DateTime, TimeDelta, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{CacheKey, DefectClass, CACHE_VERSION};
use crate::validate::{ValidationError, ValidatorRegistry};

/// Entries smaller than this cannot hold a complete envelope
pub const MIN_ENTRY_BYTES: usize = 50;

/// TTL applied by `save_default`
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Log code for TTL expiry; informational, not a defect
const EXPIRED_CODE: &str = "DC-06";

/// Distinguishes concurrent temp files written by this process
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Envelope written to disk around every payload
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// When the cache entry expires
    expires_at: DateTime<Utc>,
    /// The cached data
    payload: T,
    /// When the data was cached
    saved_at: DateTime<Utc>,
}

/// Errors surfaced by cache writes
///
/// Reads never fail: a bad entry is deleted and reported as a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem operation failed
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The payload could not be serialized
    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CacheError {
    fn io(path: &Path, source: io::Error) -> Self {
        CacheError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Why `inspect` refused an entry
#[derive(Debug)]
enum Rejection {
    Corrupt { defect: DefectClass, detail: String },
    Expired,
    Invalid(ValidationError),
}

impl Rejection {
    fn corrupt(defect: DefectClass, detail: impl Into<String>) -> Self {
        Rejection::Corrupt {
            defect,
            detail: detail.into(),
        }
    }

    fn log(&self, key: &CacheKey) {
        match self {
            Rejection::Expired => {
                info!(code = EXPIRED_CODE, key = key.token(), "Cache expired (TTL)");
            }
            Rejection::Corrupt { defect, detail } => {
                warn!(
                    code = defect.code(),
                    defect = %defect,
                    key = key.token(),
                    detail = %detail,
                    "Cache entry rejected"
                );
            }
            Rejection::Invalid(err) => {
                warn!(
                    code = err.defect().code(),
                    defect = %err.defect(),
                    key = key.token(),
                    "{}",
                    err.message()
                );
            }
        }
    }
}

/// Manages reading and writing cached payloads on disk
///
/// Entries live as JSON files in a single directory (`~/.cache/folio/` on
/// Linux by default). The directory is created on first write. Any number of
/// readers may share a directory; concurrent writers to the same key are
/// last-write-wins.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    /// Version tag prefixed to every key
    version: String,
    /// TTL used by `save_default`
    default_ttl: Duration,
    /// Checks applied to payloads on every read
    validators: Arc<ValidatorRegistry>,
}

impl CacheStore {
    /// Creates a CacheStore using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "folio")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a CacheStore rooted at `cache_dir` with the standard validators
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            version: CACHE_VERSION.to_string(),
            default_ttl: DEFAULT_TTL,
            validators: Arc::new(ValidatorRegistry::standard()),
        }
    }

    /// Replaces the version tag prefixed to every key
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Replaces the TTL used by `save_default`
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Replaces the payload validators
    pub fn with_validators(mut self, validators: ValidatorRegistry) -> Self {
        self.validators = Arc::new(validators);
        self
    }

    /// Directory holding the entries
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// TTL used by `save_default`
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Normalizes a logical name into this store's key space
    pub fn key(&self, logical: &str) -> CacheKey {
        CacheKey::new(logical, &self.version)
    }

    /// Path of the file backing `logical`
    pub fn entry_path(&self, logical: &str) -> PathBuf {
        self.cache_dir.join(self.key(logical).file_name())
    }

    fn ensure_dir(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| CacheError::io(&self.cache_dir, e))
    }

    /// Reads a payload, returning `None` on a miss
    ///
    /// An entry is only returned if it exists, is at least `MIN_ENTRY_BYTES`
    /// long, parses as JSON with a mapping/sequence root, has not expired,
    /// carries a mapping/sequence `payload`, and satisfies every validator
    /// that supports the key. An entry failing any of these is logged and
    /// deleted, so the next read is a clean miss.
    pub fn load(&self, logical: &str) -> Option<Value> {
        let key = self.key(logical);
        let path = self.cache_dir.join(key.file_name());

        match self.inspect(&key, &path) {
            Ok(found) => {
                if found.is_some() {
                    debug!(key = key.token(), "Cache hit");
                }
                found
            }
            Err(rejection) => {
                rejection.log(&key);
                remove_quietly(&path);
                None
            }
        }
    }

    fn inspect(&self, key: &CacheKey, path: &Path) -> Result<Option<Value>, Rejection> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Rejection::corrupt(
                    DefectClass::PartialWrite,
                    format!("unreadable: {}", e),
                ))
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(Rejection::corrupt(DefectClass::PartialWrite, "empty"));
        }
        if bytes.len() < MIN_ENTRY_BYTES {
            return Err(Rejection::corrupt(
                DefectClass::PartialWrite,
                format!("truncated ({} bytes)", bytes.len()),
            ));
        }

        let root: Value = serde_json::from_slice(&bytes)
            .map_err(|e| Rejection::corrupt(DefectClass::Syntax, e.to_string()))?;

        if !is_container(&root) {
            return Err(Rejection::corrupt(DefectClass::RootShape, "root is a scalar"));
        }

        if let Some(stamp) = root.get("expires_at") {
            let expires_at: DateTime<Utc> = serde_json::from_value(stamp.clone()).map_err(|_| {
                Rejection::corrupt(DefectClass::RootShape, "unreadable expiry stamp")
            })?;
            if expires_at < Utc::now() {
                return Err(Rejection::Expired);
            }
        }

        let payload = match root {
            Value::Object(mut map) => map.remove("payload"),
            _ => None,
        };
        let payload = payload
            .filter(is_container)
            .ok_or_else(|| Rejection::corrupt(DefectClass::MissingPayload, "no usable payload"))?;

        if let Some(err) = self.validators.check(key, &payload) {
            return Err(Rejection::Invalid(err));
        }

        Ok(Some(payload))
    }

    /// Runs the validators governing `logical` over a payload held elsewhere
    ///
    /// Used for section data nested inside another entry, such as a cached
    /// page, which `load` only checks under the outer key.
    pub fn validate(&self, logical: &str, payload: &Value) -> Option<ValidationError> {
        self.validators.check(&self.key(logical), payload)
    }

    /// Writes a payload with the given TTL, replacing any existing entry
    ///
    /// The envelope is written to a temp file in the cache directory and
    /// renamed over the entry, so readers see either the old or the new file.
    ///
    /// # Arguments
    /// * `logical` - Logical name of the entry (e.g., "header_settings")
    /// * `data` - The payload to cache
    /// * `ttl` - How long the entry should be served
    pub fn save<T: Serialize + ?Sized>(
        &self,
        logical: &str,
        data: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.ensure_dir()?;

        let key = self.key(logical);
        let now = Utc::now();
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or_else(|| now + TimeDelta::days(36_500));

        let entry = CacheEntry {
            expires_at,
            payload: data,
            saved_at: now,
        };
        let json = serde_json::to_string_pretty(&entry)?;

        let path = self.cache_dir.join(key.file_name());
        let tmp = self.cache_dir.join(format!(
            ".{}.{}-{}.tmp",
            key.token(),
            std::process::id(),
            WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        fs::write(&tmp, json).map_err(|e| CacheError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            remove_quietly(&tmp);
            return Err(CacheError::io(&path, e));
        }

        debug!(key = key.token(), ttl_secs = ttl.as_secs(), "Cache saved");
        Ok(())
    }

    /// Writes a payload with the store's default TTL
    pub fn save_default<T: Serialize + ?Sized>(
        &self,
        logical: &str,
        data: &T,
    ) -> Result<(), CacheError> {
        self.save(logical, data, self.default_ttl)
    }

    /// Removes a single entry; removing a missing entry succeeds
    pub fn delete(&self, logical: &str) -> Result<(), CacheError> {
        let path = self.entry_path(logical);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }

    /// Removes every entry in the cache directory
    ///
    /// Only `*.json` files are touched. Returns the number of entries removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::io(&self.cache_dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry.map_err(|e| CacheError::io(&self.cache_dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(CacheError::io(&path, e)),
                }
            }
        }

        info!(removed, dir = %self.cache_dir.display(), "Cache cleared");
        Ok(removed)
    }
}

/// True for JSON mappings and sequences
fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove cache file");
        }
    }
}
