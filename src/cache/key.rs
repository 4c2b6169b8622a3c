/// Cache-format version tag. Bumping it orphans every existing entry.
pub const CACHE_VERSION: &str = "v1";

/// A logical cache name normalized into a filesystem-safe token
///
/// The logical part (`name`) is what validators match on; the versioned
/// `token` is what ends up on disk. Two logical names that sanitize to the
/// same text share one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: String,
    token: String,
}

impl CacheKey {
    /// Builds a key for `logical` under the given version tag
    pub fn new(logical: &str, version: &str) -> Self {
        let name = sanitize_name(logical);
        let token = format!("{}_{}", version, name);
        Self { name, token }
    }

    /// The sanitized logical name, without the version prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The versioned token used for storage
    pub fn token(&self) -> &str {
        &self.token
    }

    /// File name of the entry inside the cache directory
    pub fn file_name(&self) -> String {
        format!("{}.json", self.token)
    }
}

/// Lowercases `raw` and replaces everything outside `[a-z0-9_-]` with `_`
pub fn sanitize_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_lowercased_and_versioned() {
        let key = CacheKey::new("Header_Settings", CACHE_VERSION);
        assert_eq!(key.name(), "header_settings");
        assert_eq!(key.token(), "v1_header_settings");
        assert_eq!(key.file_name(), "v1_header_settings.json");
    }

    #[test]
    fn test_unsafe_characters_are_replaced() {
        let key = CacheKey::new("  ../notes list!  ", "v1");
        assert_eq!(key.name(), "___notes_list_");
        assert!(!key.token().contains('/'));
    }

    #[test]
    fn test_colliding_names_share_a_token() {
        let a = CacheKey::new("notes page", "v1");
        let b = CacheKey::new("notes.page", "v1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_version_bump_changes_token() {
        let v1 = CacheKey::new("home", "v1");
        let v2 = CacheKey::new("home", "v2");
        assert_eq!(v1.name(), v2.name());
        assert_ne!(v1.token(), v2.token());
    }
}
