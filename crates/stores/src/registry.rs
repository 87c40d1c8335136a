//! The registry store: one JSON snapshot of every known collection
//! descriptor, keyed by fingerprint. Reads open the current snapshot;
//! writes serialize behind a lock file and land via write-new-then-rename,
//! so readers always observe a complete document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use models::{CollectionDescriptor, Fingerprint};

use crate::{write_atomic, StoreError};

const REGISTRY_FILE: &str = "registry.json";
const LOCK_FILE: &str = "registry.lock";

/// A lock older than this is presumed to be left over from a crashed
/// writer and is broken.
const STALE_LOCK: Duration = Duration::from_secs(300);

pub struct RegistryStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl RegistryStore {
    pub fn open(root: &Path) -> Self {
        Self {
            path: root.join(REGISTRY_FILE),
            lock_path: root.join(LOCK_FILE),
        }
    }

    /// All descriptors in the current snapshot, sorted by fingerprint,
    /// optionally filtered by target body (case-insensitive).
    pub fn descriptors(
        &self,
        target: Option<&str>,
    ) -> Result<impl Iterator<Item = CollectionDescriptor>, StoreError> {
        let target = target.map(|t| t.to_uppercase());
        Ok(self
            .load()?
            .into_values()
            .filter(move |d| match &target {
                Some(t) => d.target.to_uppercase() == *t,
                None => true,
            }))
    }

    /// Looks up one descriptor by its fingerprint.
    pub fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CollectionDescriptor>, StoreError> {
        Ok(self.load()?.remove(&fingerprint.to_string()))
    }

    /// Looks up one descriptor by dataset id, ignoring case.
    pub fn find_by_dataset(&self, dataset_id: &str) -> Result<Option<CollectionDescriptor>, StoreError> {
        Ok(self
            .load()?
            .into_values()
            .find(|d| d.dataset_id.eq_ignore_ascii_case(dataset_id)))
    }

    /// Inserts or replaces descriptors. The whole snapshot is rewritten
    /// under the writer lock; concurrent readers keep the prior snapshot
    /// until the rename lands.
    pub fn upsert_all(
        &self,
        descriptors: impl IntoIterator<Item = CollectionDescriptor>,
    ) -> Result<usize, StoreError> {
        let _lock = WriterLock::acquire(&self.lock_path)?;

        let mut snapshot = self.load()?;
        let mut written = 0;
        for descriptor in descriptors {
            snapshot.insert(descriptor.fingerprint().to_string(), descriptor);
            written += 1;
        }

        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        write_atomic(&self.path, &bytes)?;
        tracing::debug!(written, total = snapshot.len(), "registry snapshot written");
        Ok(written)
    }

    fn load(&self) -> Result<BTreeMap<String, CollectionDescriptor>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}

/// An exclusive advisory lock: a sibling file created with create-new
/// semantics, removed on drop. Stale locks from crashed writers age out.
struct WriterLock {
    path: PathBuf,
}

impl WriterLock {
    fn acquire(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        match std::fs::OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(Self { path: path.to_path_buf() }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let stale = std::fs::metadata(path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|m| m.elapsed().ok())
                    .map(|age| age > STALE_LOCK)
                    .unwrap_or(false);
                if stale {
                    tracing::warn!(path = %path.display(), "breaking stale registry lock");
                    let _ = std::fs::remove_file(path);
                    return Self::acquire(path);
                }
                Err(StoreError::Locked { path: path.display().to_string() })
            }
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn descriptor(dataset_id: &str, target: &str) -> CollectionDescriptor {
        serde_json::from_value(serde_json::json!({
            "ODEMetaDB": target,
            "IHID": "MGS",
            "IHName": "Mars Global Surveyor",
            "IID": "MOLA",
            "DataSetId": dataset_id,
            "NumberProducts": 1000,
            "ValidFootprints": "T",
        }))
        .unwrap()
    }

    #[test]
    fn upsert_is_insert_or_replace() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path());

        store.upsert_all([descriptor("DS-A", "Mars")]).unwrap();
        store.upsert_all([descriptor("DS-B", "Moon")]).unwrap();

        let mut replacement = descriptor("DS-A", "Mars");
        replacement.number_products = 2000;
        store.upsert_all([replacement]).unwrap();

        let all: Vec<_> = store.descriptors(None).unwrap().collect();
        assert_eq!(2, all.len());
        let a = store.find_by_dataset("ds-a").unwrap().unwrap();
        assert_eq!(2000, a.number_products);
    }

    #[test]
    fn target_filter_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path());
        store
            .upsert_all([descriptor("DS-A", "Mars"), descriptor("DS-B", "Moon")])
            .unwrap();

        let mars: Vec<_> = store.descriptors(Some("MARS")).unwrap().collect();
        assert_eq!(1, mars.len());
        assert_eq!("DS-A", mars[0].dataset_id);
    }

    #[test]
    fn get_resolves_by_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path());
        let d = descriptor("DS-A", "Mars");
        let fp = d.fingerprint();
        store.upsert_all([d]).unwrap();
        assert!(store.get(&fp).unwrap().is_some());
    }

    #[test]
    fn concurrent_writer_is_rejected_until_the_lock_drops() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path());

        let held = WriterLock::acquire(&dir.path().join(LOCK_FILE)).unwrap();
        let err = store.upsert_all([descriptor("DS-A", "Mars")]).unwrap_err();
        assert!(matches!(err, StoreError::Locked { .. }));

        drop(held);
        store.upsert_all([descriptor("DS-A", "Mars")]).unwrap();
    }
}
