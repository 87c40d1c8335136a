//! The two on-disk stores everything durable goes through: the registry of
//! collection descriptors and the per-collection file tree. All other
//! crates hold only transient in-memory views; resumption and idempotence
//! come from what these stores already contain.

mod files;
mod registry;
mod report;

pub use files::{FileStore, ResetScope};
pub use registry::RegistryStore;
pub use report::{CollectionReport, PhaseSummary};

/// Error type shared by both stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to persist {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("registry document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("registry is locked by another writer ({path})")]
    Locked { path: String },
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io { path: path.display().to_string(), source }
    }
}

/// Writes `bytes` to `path` atomically: the content lands in a temp
/// sibling first and is renamed over the destination, so a crash never
/// leaves a partial file and a prior version survives any failure.
pub fn write_atomic(path: &std::path::Path, bytes: &[u8]) -> Result<(), StoreError> {
    use std::io::Write;

    let parent = path.parent().unwrap_or_else(|| std::path::Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
    temp.write_all(bytes).map_err(|e| StoreError::io(path, e))?;
    temp.flush().map_err(|e| StoreError::io(path, e))?;
    temp.persist(path).map_err(|source| StoreError::Persist {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn atomic_writes_replace_whole_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/file.json");

        write_atomic(&path, b"first").unwrap();
        assert_eq!("first", std::fs::read_to_string(&path).unwrap());

        write_atomic(&path, b"second").unwrap();
        assert_eq!("second", std::fs::read_to_string(&path).unwrap());

        // No temp siblings are left behind.
        let siblings: Vec<_> = std::fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(1, siblings.len());
    }

    #[test]
    fn a_crash_before_the_rename_leaves_prior_content_intact() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page_000.json");
        write_atomic(&path, b"prior page").unwrap();

        // The write protocol up to the crash point: temp sibling written
        // and flushed, process dies before the rename.
        let mut temp = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
        temp.write_all(b"half a new p").unwrap();
        temp.flush().unwrap();
        let orphan = temp.into_temp_path().keep().unwrap();

        assert_eq!("prior page", std::fs::read_to_string(&path).unwrap());

        // The next run simply rewrites; the orphan never becomes visible
        // under the destination name.
        write_atomic(&path, b"new page").unwrap();
        assert_eq!("new page", std::fs::read_to_string(&path).unwrap());
        assert_ne!(orphan, path);
    }
}
