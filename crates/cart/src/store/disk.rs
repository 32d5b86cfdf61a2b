//! File-backed local store.
//!
//! One JSON file per key under a directory. This is the "survives page
//! reloads, scoped to one device" store when the session runs as a native
//! process rather than in a browser.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::LocalStore;

/// [`LocalStore`] persisting each key to `<dir>/<key>.json`.
///
/// Writes are best-effort per the local-store contract: an I/O failure is
/// logged, not surfaced, matching browser storage which does not fail for
/// capacity at this system's scale.
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    dir: PathBuf,
}

impl FileLocalStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// write, not here.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        // Keys are internal constants, but keep path traversal impossible.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    /// The backing directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl LocalStore for FileLocalStore {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), "failed to create local store dir: {e}");
            return;
        }
        if let Err(e) = fs::write(self.path(key), value) {
            warn!(key, "failed to write local store value: {e}");
        }
    }

    fn clear(&self, key: &str) {
        match fs::remove_file(self.path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(key, "failed to clear local store value: {e}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_clear_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::new(dir.path());

        assert_eq!(store.read("cart_lines"), None);
        store.write("cart_lines", "{\"v\":1}");
        assert_eq!(store.read("cart_lines"), Some("{\"v\":1}".to_owned()));

        store.clear("cart_lines");
        assert_eq!(store.read("cart_lines"), None);
        // Clearing an absent key is a no-op
        store.clear("cart_lines");
    }

    #[test]
    fn test_keys_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::new(dir.path());

        store.write("../escape", "x");
        assert!(dir.path().join("___escape.json").exists());
    }
}
