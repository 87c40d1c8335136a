//! The per-collection file tree:
//!
//! ```text
//! <root>/<target>/<mission>/<host>/<instrument>/<dataset>/
//!   records/page_000.json
//!   pds3/mission.cat
//!   quarantine/…
//!   stac/collection.json
//!   stac/items/<item>.json
//! ```
//!
//! Every collection directory is self-contained and independently
//! re-buildable; writes within it are atomic per file.

use std::path::{Path, PathBuf};

use models::{CatalogKind, Fingerprint};

use crate::{write_atomic, StoreError};

const RECORDS_DIR: &str = "records";
const PDS3_DIR: &str = "pds3";
const STAC_DIR: &str = "stac";
const QUARANTINE_DIR: &str = "quarantine";

/// What `reset` removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    /// All harvested files (records and PDS3 objects) of every collection;
    /// STAC output stays.
    Files,
    /// The whole STAC tree: every collection's `stac/` directory plus the
    /// shared parent catalogs.
    Stac,
    /// Everything belonging to one collection.
    Collection(Fingerprint),
}

#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(fingerprint.relative_dir())
    }

    pub fn records_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.collection_dir(fingerprint).join(RECORDS_DIR)
    }

    pub fn pds3_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.collection_dir(fingerprint).join(PDS3_DIR)
    }

    pub fn stac_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.collection_dir(fingerprint).join(STAC_DIR)
    }

    /// The shared STAC parent tree (root, mission, host, instrument
    /// catalogs), outside any single collection.
    pub fn stac_root(&self) -> PathBuf {
        self.root.join(STAC_DIR)
    }

    pub fn page_path(&self, fingerprint: &Fingerprint, page_index: u64) -> PathBuf {
        self.records_dir(fingerprint).join(format!("page_{page_index:03}.json"))
    }

    pub fn has_page(&self, fingerprint: &Fingerprint, page_index: u64) -> bool {
        self.page_path(fingerprint, page_index).is_file()
    }

    /// Writes one record page atomically; a failure leaves any prior page
    /// content intact.
    pub fn write_page(
        &self,
        fingerprint: &Fingerprint,
        page_index: u64,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        write_atomic(&self.page_path(fingerprint, page_index), bytes)
    }

    /// Page indices below `total_pages` with no file on disk, ascending;
    /// this is what makes extraction resumable.
    pub fn list_missing_pages(&self, fingerprint: &Fingerprint, total_pages: u64) -> Vec<u64> {
        (0..total_pages)
            .filter(|index| !self.has_page(fingerprint, *index))
            .collect()
    }

    /// All persisted pages, sorted by page index. Completion order during
    /// extraction is unspecified, so readers always sort.
    pub fn list_pages(&self, fingerprint: &Fingerprint) -> Result<Vec<(u64, PathBuf)>, StoreError> {
        let dir = self.records_dir(fingerprint);
        let mut pages = Vec::new();
        for path in read_dir_or_empty(&dir)? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(index) = name
                .strip_prefix("page_")
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<u64>().ok())
            {
                pages.push((index, path));
            }
        }
        pages.sort_by_key(|(index, _)| *index);
        Ok(pages)
    }

    /// The PDS3 catalog files of a collection, classified by kind.
    pub fn list_pds3(&self, fingerprint: &Fingerprint) -> Result<Vec<(CatalogKind, PathBuf)>, StoreError> {
        let dir = self.pds3_dir(fingerprint);
        let mut files = Vec::new();
        for path in read_dir_or_empty(&dir)? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match CatalogKind::from_filename(name) {
                Some(kind) => files.push((kind, path)),
                None => tracing::debug!(file = name, "unclassified file under pds3/"),
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn pds3_path(&self, fingerprint: &Fingerprint, filename: &str) -> PathBuf {
        self.pds3_dir(fingerprint).join(filename.to_ascii_lowercase())
    }

    /// Moves a malformed file into the collection's quarantine directory,
    /// preserving its name. The original path no longer exists afterwards.
    pub fn quarantine(&self, fingerprint: &Fingerprint, path: &Path) -> Result<PathBuf, StoreError> {
        let dir = self.collection_dir(fingerprint).join(QUARANTINE_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let dest = dir.join(path.file_name().unwrap_or_default());
        std::fs::rename(path, &dest).map_err(|e| StoreError::io(path, e))?;
        tracing::warn!(from = %path.display(), to = %dest.display(), "quarantined malformed file");
        Ok(dest)
    }

    /// Scoped deletion. Only ever removes what the scope names; absent
    /// directories are fine.
    pub fn reset(&self, scope: ResetScope) -> Result<(), StoreError> {
        match scope {
            ResetScope::Files => {
                for collection in self.collection_dirs()? {
                    remove_dir_if_present(&collection.join(RECORDS_DIR))?;
                    remove_dir_if_present(&collection.join(PDS3_DIR))?;
                    remove_dir_if_present(&collection.join(QUARANTINE_DIR))?;
                }
            }
            ResetScope::Stac => {
                remove_dir_if_present(&self.stac_root())?;
                for collection in self.collection_dirs()? {
                    remove_dir_if_present(&collection.join(STAC_DIR))?;
                }
            }
            ResetScope::Collection(fingerprint) => {
                remove_dir_if_present(&self.collection_dir(&fingerprint))?;
            }
        }
        Ok(())
    }

    /// Every collection directory on disk, found by walking the five
    /// fixed levels of the layout.
    pub fn collection_dirs(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut dirs = vec![self.root.clone()];
        for level in 0..5 {
            let mut next = Vec::new();
            for dir in dirs {
                for path in read_dir_or_empty(&dir)? {
                    if !path.is_dir() {
                        continue;
                    }
                    // The shared STAC tree lives beside the target dirs.
                    if level == 0 && path.file_name().and_then(|n| n.to_str()) == Some(STAC_DIR) {
                        continue;
                    }
                    next.push(path);
                }
            }
            dirs = next;
        }
        dirs.sort();
        Ok(dirs)
    }
}

fn read_dir_or_empty(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            let mut paths = Vec::new();
            for entry in entries {
                paths.push(entry.map_err(|e| StoreError::io(dir, e))?.path());
            }
            paths.sort();
            Ok(paths)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(StoreError::io(dir, e)),
    }
}

fn remove_dir_if_present(dir: &Path) -> Result<(), StoreError> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(dir, e)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mola() -> Fingerprint {
        Fingerprint::new("Mars", "Mars Global Surveyor", "MGS", "MOLA", "MGS-M-MOLA-3-PEDR-L1A-V1.0")
    }

    #[test]
    fn missing_pages_resume_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path());
        let fp = mola();

        assert_eq!(vec![0, 1, 2, 3], store.list_missing_pages(&fp, 4));

        store.write_page(&fp, 0, b"{}").unwrap();
        store.write_page(&fp, 2, b"{}").unwrap();
        assert_eq!(vec![1, 3], store.list_missing_pages(&fp, 4));
        assert!(store.has_page(&fp, 0));
        assert!(!store.has_page(&fp, 1));
    }

    #[test]
    fn pages_list_sorted_regardless_of_write_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path());
        let fp = mola();

        for index in [7u64, 0, 11, 3] {
            store.write_page(&fp, index, b"{}").unwrap();
        }
        let indices: Vec<u64> = store.list_pages(&fp).unwrap().into_iter().map(|(i, _)| i).collect();
        assert_eq!(vec![0, 3, 7, 11], indices);
    }

    #[test]
    fn pds3_files_classify_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path());
        let fp = mola();

        for name in ["mission.cat", "inst.cat", "aareadme.txt"] {
            crate::write_atomic(&store.pds3_path(&fp, name), b"x").unwrap();
        }
        let kinds: Vec<CatalogKind> = store.list_pds3(&fp).unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(vec![CatalogKind::Mission, CatalogKind::Instrument], kinds);
    }

    #[test]
    fn quarantine_moves_the_file_aside() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path());
        let fp = mola();

        store.write_page(&fp, 0, b"<html>not json</html>").unwrap();
        let page = store.page_path(&fp, 0);
        let moved = store.quarantine(&fp, &page).unwrap();

        assert!(!page.exists());
        assert!(moved.exists());
        assert!(moved.parent().unwrap().ends_with(QUARANTINE_DIR));
    }

    #[test]
    fn reset_scopes_are_precise() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path());
        let fp = mola();

        store.write_page(&fp, 0, b"{}").unwrap();
        crate::write_atomic(&store.pds3_path(&fp, "mission.cat"), b"x").unwrap();
        crate::write_atomic(&store.stac_dir(&fp).join("collection.json"), b"{}").unwrap();
        crate::write_atomic(&store.stac_root().join("catalog.json"), b"{}").unwrap();

        store.reset(ResetScope::Files).unwrap();
        assert!(!store.has_page(&fp, 0));
        assert!(store.stac_dir(&fp).join("collection.json").exists());

        store.reset(ResetScope::Stac).unwrap();
        assert!(!store.stac_dir(&fp).exists());
        assert!(!store.stac_root().exists());

        crate::write_atomic(&store.page_path(&fp, 0), b"{}").unwrap();
        store.reset(ResetScope::Collection(fp.clone())).unwrap();
        assert!(!store.collection_dir(&fp).exists());
    }

    #[test]
    fn collection_dirs_walk_the_fixed_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path());
        let fp = mola();
        store.write_page(&fp, 0, b"{}").unwrap();
        crate::write_atomic(&store.stac_root().join("catalog.json"), b"{}").unwrap();

        let dirs = store.collection_dirs().unwrap();
        assert_eq!(vec![store.collection_dir(&fp)], dirs);
    }
}
