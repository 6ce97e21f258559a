//! File-backed token store.

use std::path::{Path, PathBuf};

use super::{StoreError, TokenPair, TokenStore};

/// Token store persisting the pair as a small JSON file.
///
/// The file is re-read on every load so that multiple handles over the same
/// path observe each other's writes, mirroring how durable client storage
/// behaves across views of the same origin.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by the given path.
    ///
    /// The file is created lazily on the first `save`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenPair>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let pair: TokenPair = serde_json::from_str(&raw)?;
        Ok(Some(pair))
    }

    fn save(&self, tokens: &TokenPair) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let raw = serde_json::to_string_pretty(tokens)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_load_clear_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));

        let pair = TokenPair::new("access".to_string(), "refresh".to_string());
        store.save(&pair).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());

        // Clearing an already-clear store is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_two_handles_share_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let writer = FileTokenStore::new(&path);
        let reader = FileTokenStore::new(&path);

        writer
            .save(&TokenPair::new("a".to_string(), "r".to_string()))
            .unwrap();
        assert!(reader.load().unwrap().is_some());

        writer.clear().unwrap();
        assert!(reader.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/tokens.json");
        let store = FileTokenStore::new(&path);

        store
            .save(&TokenPair::new("a".to_string(), "r".to_string()))
            .unwrap();
        assert!(path.exists());
    }
}
