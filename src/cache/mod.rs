//! Cache module for storing section payloads to disk
//!
//! This module provides a cache store that persists section payloads to the filesystem
//! with per-entry TTL values. Unlike a plain key/value file cache, every read re-checks
//! the file's integrity and business semantics; anything that fails a check is deleted
//! and reported as a miss so corruption never reaches the page layer.

mod defect;
mod key;
mod manager;

pub use defect::DefectClass;
pub use key::{sanitize_name, CacheKey, CACHE_VERSION};
pub use manager::{CacheError, CacheStore, DEFAULT_TTL, MIN_ENTRY_BYTES};
