use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{KeyStore, KeyStoreError};

/// Key store keeping one file per slot inside a directory
///
/// Writes go to a temp file in the same directory which is then renamed
/// over the slot file, so a crash mid-write leaves the old value intact.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    /// Open (and create if needed) a key store rooted at `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, KeyStoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn slot_path(&self, slot: &str) -> Result<PathBuf, KeyStoreError> {
        let valid = !slot.is_empty()
            && slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(KeyStoreError::Internal(format!("invalid slot name: {:?}", slot)));
        }
        Ok(self.dir.join(slot))
    }
}

impl KeyStore for FileKeyStore {
    fn read(&self, slot: &str) -> Result<Option<String>, KeyStoreError> {
        match fs::read_to_string(self.slot_path(slot)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, slot: &str, value: &str) -> Result<(), KeyStoreError> {
        let path = self.slot_path(slot)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| KeyStoreError::Io(e.error))?;
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), KeyStoreError> {
        match fs::remove_file(self.slot_path(slot)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_write_remove() {
        let temp = TempDir::new().unwrap();
        let store = FileKeyStore::open(temp.path().join("keys")).unwrap();

        assert_eq!(store.read("slot").unwrap(), None);
        store.write("slot", "first").unwrap();
        store.write("slot", "second").unwrap();
        assert_eq!(store.read("slot").unwrap().as_deref(), Some("second"));

        store.remove("slot").unwrap();
        assert_eq!(store.read("slot").unwrap(), None);
        store.remove("slot").unwrap();
    }

    #[test]
    fn test_reopen_sees_previous_writes() {
        let temp = TempDir::new().unwrap();
        FileKeyStore::open(temp.path())
            .unwrap()
            .write("slot", "value")
            .unwrap();

        let reopened = FileKeyStore::open(temp.path()).unwrap();
        assert_eq!(reopened.read("slot").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_rejects_path_like_slots() {
        let temp = TempDir::new().unwrap();
        let store = FileKeyStore::open(temp.path()).unwrap();
        assert!(store.write("../escape", "x").is_err());
        assert!(store.read("").is_err());
    }
}
