use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::errors::StoreError;
use super::identity::Identity;
use super::lock::{LockMode, StoreLock};

/// On-disk container. `identities` has no serde default: a file without it
/// is corrupt, not empty.
#[derive(Debug, Deserialize)]
struct Configuration {
    identities: Vec<Identity>,
}

#[derive(Serialize)]
struct ConfigurationRef<'a> {
    identities: &'a [Identity],
}

/// Handle on a JSON identity file.
///
/// Every query re-reads the file and every mutation is a full
/// read-modify-write under an exclusive lock, so separate handles (and
/// separate processes) on the same path always see each other's writes.
#[derive(Debug)]
pub struct IdentityStore {
    path: PathBuf,
    identities: Vec<Identity>,
}

impl IdentityStore {
    /// Opens the identity file at `path`, creating an empty one (and any
    /// missing parent directories) when nothing exists there yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let mut store = Self {
            path,
            identities: Vec::new(),
        };

        let _lock = StoreLock::acquire(&store.path, LockMode::Exclusive)?;
        let exists = store
            .path
            .try_exists()
            .map_err(|e| StoreError::io(&store.path, e))?;
        if !exists {
            store.create_empty()?;
        }
        store.load()?;
        debug!(
            "Opened identity store {:?} ({} entries)",
            store.path,
            store.identities.len()
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored identity in insertion order.
    pub fn list(&mut self) -> Result<Vec<Identity>, StoreError> {
        let _lock = StoreLock::acquire(&self.path, LockMode::Shared)?;
        self.load()?;
        Ok(self.identities.clone())
    }

    /// Exact, case-sensitive lookup by name.
    pub fn lookup(&mut self, name: &str) -> Result<Identity, StoreError> {
        let _lock = StoreLock::acquire(&self.path, LockMode::Shared)?;
        self.load()?;
        self.identities
            .iter()
            .find(|identity| identity.name == name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    /// Appends `identity` unless another entry already uses its name.
    pub fn insert(&mut self, identity: Identity) -> Result<(), StoreError> {
        if identity.name.is_empty() {
            return Err(StoreError::InvalidIdentity(
                "identity name must not be empty".into(),
            ));
        }

        let _lock = StoreLock::acquire(&self.path, LockMode::Exclusive)?;
        self.load()?;
        if self.identities.iter().any(|i| i.name == identity.name) {
            return Err(StoreError::DuplicateName {
                name: identity.name,
            });
        }

        info!("Adding identity '{}'", identity.name);
        self.identities.push(identity);
        self.save()
    }

    /// Removes every entry called `name`.
    pub fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        let _lock = StoreLock::acquire(&self.path, LockMode::Exclusive)?;
        self.load()?;

        let before = self.identities.len();
        self.identities.retain(|identity| identity.name != name);
        if self.identities.len() == before {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            });
        }

        info!("Removing identity '{}'", name);
        self.save()
    }

    fn load(&mut self) -> Result<(), StoreError> {
        let raw = fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let config: Configuration = serde_json::from_slice(&raw)
            .map_err(|e| StoreError::corrupt(&self.path, e.to_string()))?;

        if let Some(position) = config.identities.iter().position(|i| i.name.is_empty()) {
            return Err(StoreError::corrupt(
                &self.path,
                format!("identity #{} has an empty name", position + 1),
            ));
        }

        self.identities = config.identities;
        Ok(())
    }

    fn save(&self) -> Result<(), StoreError> {
        let tmp = self.write_temp(&self.identities)?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;
        debug!(
            "Wrote {} identities to {:?}",
            self.identities.len(),
            self.path
        );
        Ok(())
    }

    fn create_empty(&self) -> Result<(), StoreError> {
        let tmp = self.write_temp(&[])?;
        match tmp.persist_noclobber(&self.path) {
            Ok(_) => {
                info!("Created empty identity file {:?}", self.path);
                Ok(())
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e.error)),
        }
    }

    /// Serializes into a synced temp file beside the target, ready to be
    /// renamed over it. The temp file is owner read/write only.
    fn write_temp(&self, identities: &[Identity]) -> Result<NamedTempFile, StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut json = serde_json::to_string_pretty(&ConfigurationRef { identities })
            .map_err(|e| StoreError::io(&self.path, e.into()))?;
        json.push('\n');

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        Ok(tmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, IdentityStore) {
        let dir = TempDir::new().unwrap();
        let store = IdentityStore::open(dir.path().join("ids.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn new_file_is_pretty_json_with_empty_array() {
        let (_dir, store) = temp_store();
        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({ "identities": [] }));
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn missing_parent_directories_are_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("ids.json");
        IdentityStore::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_name_is_rejected_on_insert() {
        let (_dir, mut store) = temp_store();
        let err = store
            .insert(Identity::new("", "u", "h", 0, ""))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidIdentity(_)));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn stored_empty_name_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.json");
        fs::write(&path, r#"{"identities":[{"name":"","address":"h"}]}"#).unwrap();
        let err = IdentityStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::ConfigCorrupt { .. }));
    }

    #[test]
    fn duplicate_check_uses_name_only() {
        let (_dir, mut store) = temp_store();
        store.insert(Identity::new("web", "a", "h1", 0, "")).unwrap();
        let err = store
            .insert(Identity::new("web", "b", "h2", 2222, "other"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName { ref name } if name == "web"));

        // distinct names with identical other fields are fine
        store.insert(Identity::new("web2", "a", "h1", 0, "")).unwrap();
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn external_edits_are_picked_up() {
        let (_dir, mut store) = temp_store();
        fs::write(
            store.path(),
            r#"{"identities":[{"name":"hand","username":"u","address":"h","description":""}]}"#,
        )
        .unwrap();
        assert_eq!(store.lookup("hand").unwrap().address, "h");
    }

    #[test]
    fn file_deleted_after_open_is_an_io_error() {
        let (_dir, mut store) = temp_store();
        fs::remove_file(store.path()).unwrap();
        assert!(matches!(store.list().unwrap_err(), StoreError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn identity_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, mut store) = temp_store();
        store.insert(Identity::new("a", "u", "h", 0, "")).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
