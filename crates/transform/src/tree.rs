//! Layout and link plumbing of the managed STAC tree.
//!
//! Parent catalogs (root, mission, instrument host, instrument) live under
//! `<root>/stac/…`; each collection's own subtree lives in the collection
//! directory. All links are relative, and every write regenerates them
//! from the tree's current state, so re-running a transform converges.

use std::path::{Path, PathBuf};

use models::stac::{rel, Catalog, Extent, Link};
use models::Fingerprint;
use stores::{write_atomic, FileStore};

use crate::TransformError;

const CATALOG_FILE: &str = "catalog.json";
const COLLECTION_FILE: &str = "collection.json";
const ITEMS_DIR: &str = "items";

pub const ROOT_ID: &str = "pds";
const ROOT_DESCRIPTION: &str =
    "Planetary data set catalogs harvested from the ODE service and the PDS3 archive.";

/// Path and link arithmetic for one collection's place in the tree.
pub struct StacTree {
    files: FileStore,
}

impl StacTree {
    pub fn new(files: FileStore) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    // Document paths.

    pub fn root_catalog_path(&self) -> PathBuf {
        self.files.stac_root().join(CATALOG_FILE)
    }

    pub fn mission_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.files.stac_root().join(fingerprint.mission_id())
    }

    pub fn host_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.mission_dir(fingerprint).join(fingerprint.instrument_host_id())
    }

    pub fn instrument_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.host_dir(fingerprint).join(fingerprint.instrument_id())
    }

    pub fn collection_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.files.stac_dir(fingerprint).join(COLLECTION_FILE)
    }

    pub fn items_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.files.stac_dir(fingerprint).join(ITEMS_DIR)
    }

    pub fn item_path(&self, fingerprint: &Fingerprint, item_id: &str) -> PathBuf {
        self.items_dir(fingerprint).join(format!("{item_id}.json"))
    }

    // Relative hrefs. The parent tree sits four segments under the storage
    // root (`stac/<mission>/<host>/<instrument>`), a collection document
    // six (`<target>/…/<dataset>/stac`), an item seven.

    /// Href from the instrument catalog to a collection document.
    pub fn instrument_to_collection(&self, fingerprint: &Fingerprint) -> String {
        format!(
            "../../../../{}/stac/{}",
            path_to_href(&fingerprint.relative_dir()),
            COLLECTION_FILE
        )
    }

    /// Href from a collection document to its instrument catalog.
    pub fn collection_to_instrument(&self, fingerprint: &Fingerprint) -> String {
        format!(
            "../../../../../../stac/{}/{}/{}/{}",
            fingerprint.mission_id(),
            fingerprint.instrument_host_id(),
            fingerprint.instrument_id(),
            CATALOG_FILE
        )
    }

    pub fn collection_to_root(&self) -> String {
        format!("../../../../../../stac/{CATALOG_FILE}")
    }

    pub fn item_to_root(&self) -> String {
        format!("../../../../../../../stac/{CATALOG_FILE}")
    }

    // Reading and writing documents.

    pub fn read_catalog(&self, path: &Path) -> Result<Option<Catalog>, TransformError> {
        read_json(path)
    }

    pub fn read_collection(
        &self,
        path: &Path,
    ) -> Result<Option<models::stac::Collection>, TransformError> {
        read_json(path)
    }

    /// Serializes and writes a document, skipping the write when the bytes
    /// are already on disk. Returns whether anything changed.
    pub fn write_document<T: serde::Serialize>(
        &self,
        path: &Path,
        document: &T,
    ) -> Result<bool, TransformError> {
        let mut bytes = serde_json::to_vec_pretty(document)?;
        bytes.push(b'\n');
        if let Ok(existing) = std::fs::read(path) {
            if existing == bytes {
                return Ok(false);
            }
        }
        write_atomic(path, &bytes)?;
        Ok(true)
    }

    /// Creates or refreshes the parent chain for one collection: the
    /// mission, instrument-host, and instrument catalogs plus the root.
    /// Child links are regenerated by scanning the tree, and extents are
    /// widened to cover `collection_extent`.
    pub fn ensure_parents(
        &self,
        fingerprint: &Fingerprint,
        collection_extent: &Extent,
        enrich: impl Fn(Level, &mut Catalog),
    ) -> Result<(), TransformError> {
        // Leaf-most first, so that the scans below see the directories.
        let instrument_dir = self.instrument_dir(fingerprint);
        let mut instrument = self
            .read_catalog(&instrument_dir.join(CATALOG_FILE))?
            .unwrap_or_else(|| {
                Catalog::new(
                    fingerprint.instrument_id(),
                    format!("Data sets of instrument {}", fingerprint.instrument()),
                )
            });
        instrument.title.get_or_insert_with(|| fingerprint.instrument().to_string());
        enrich(Level::Instrument, &mut instrument);
        widen(&mut instrument.extent, collection_extent);
        let child_href = self.instrument_to_collection(fingerprint);
        instrument.links = regenerate_links(
            &instrument.links,
            &[
                Link::root("../../../catalog.json"),
                Link::parent("../catalog.json"),
            ],
            Some(Link::child(child_href)),
        );
        self.write_document(&instrument_dir.join(CATALOG_FILE), &instrument)?;

        let host_dir = self.host_dir(fingerprint);
        let mut host = self.read_catalog(&host_dir.join(CATALOG_FILE))?.unwrap_or_else(|| {
            Catalog::new(
                fingerprint.instrument_host_id(),
                format!("Instruments of {}", fingerprint.instrument_host()),
            )
        });
        host.title.get_or_insert_with(|| fingerprint.instrument_host().to_string());
        enrich(Level::InstrumentHost, &mut host);
        self.roll_up(&host_dir, &mut host)?;
        host.links = vec![Link::root("../../catalog.json"), Link::parent("../catalog.json")];
        host.links.extend(scan_children(&host_dir));
        self.write_document(&host_dir.join(CATALOG_FILE), &host)?;

        let mission_dir = self.mission_dir(fingerprint);
        let mut mission = self.read_catalog(&mission_dir.join(CATALOG_FILE))?.unwrap_or_else(|| {
            Catalog::new(
                fingerprint.mission_id(),
                format!("Data sets of mission {}", fingerprint.mission()),
            )
        });
        mission.title.get_or_insert_with(|| fingerprint.mission().to_string());
        enrich(Level::Mission, &mut mission);
        self.roll_up(&mission_dir, &mut mission)?;
        mission.links = vec![Link::root("../catalog.json"), Link::parent("../catalog.json")];
        mission.links.extend(scan_children(&mission_dir));
        self.write_document(&mission_dir.join(CATALOG_FILE), &mission)?;

        let mut root = self
            .read_catalog(&self.root_catalog_path())?
            .unwrap_or_else(|| Catalog::new(ROOT_ID, ROOT_DESCRIPTION));
        enrich(Level::Root, &mut root);
        root.links = vec![Link::root("./catalog.json")];
        root.links.extend(scan_children(&self.files.stac_root()));
        self.write_document(&self.root_catalog_path(), &root)?;

        Ok(())
    }

    /// Widens a parent's extent to the union of its on-disk children.
    fn roll_up(&self, dir: &Path, catalog: &mut Catalog) -> Result<(), TransformError> {
        let mut union: Option<Extent> = None;
        for child in child_dirs(dir) {
            if let Some(child_catalog) = self.read_catalog(&child.join(CATALOG_FILE))? {
                if let Some(extent) = child_catalog.extent {
                    match union.as_mut() {
                        Some(u) => u.union(&extent),
                        None => union = Some(extent),
                    }
                }
            }
        }
        if let Some(extent) = union {
            widen(&mut catalog.extent, &extent);
        }
        Ok(())
    }
}

/// Which parent a transform is enriching; PDS3 metadata applies per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Root,
    Mission,
    InstrumentHost,
    Instrument,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, TransformError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(stores::StoreError::Io { path: path.display().to_string(), source: e }.into()),
    }
}

fn widen(extent: &mut Option<Extent>, with: &Extent) {
    match extent {
        Some(existing) => existing.union(with),
        None => *extent = Some(with.clone()),
    }
}

/// Structural links are replaced wholesale; child links into the managed
/// tree are kept (other collections contributed them), deduplicated, and
/// sorted so rewrites are stable.
fn regenerate_links(existing: &[Link], structural: &[Link], add_child: Option<Link>) -> Vec<Link> {
    let mut children: Vec<Link> = existing.iter().filter(|l| l.rel == rel::CHILD).cloned().collect();
    if let Some(child) = add_child {
        children.push(child);
    }
    children.sort_by(|a, b| a.href.cmp(&b.href));
    children.dedup_by(|a, b| a.href == b.href);

    let mut links = structural.to_vec();
    links.extend(children);
    links
}

/// Child catalogs found by scanning a parent's directory.
fn scan_children(dir: &Path) -> Vec<Link> {
    let mut links: Vec<Link> = child_dirs(dir)
        .into_iter()
        .filter(|child| child.join(CATALOG_FILE).is_file())
        .filter_map(|child| {
            let name = child.file_name()?.to_str()?.to_string();
            Some(Link::child(format!("./{name}/{CATALOG_FILE}")))
        })
        .collect();
    links.sort_by(|a, b| a.href.cmp(&b.href));
    links
}

fn child_dirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn path_to_href(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod test {
    use super::*;

    fn mola() -> Fingerprint {
        Fingerprint::new("Mars", "Mars Global Surveyor", "MGS", "MOLA", "MGS-M-MOLA-3-PEDR-L1A-V1.0")
    }

    #[test]
    fn hrefs_resolve_between_tree_locations() {
        let dir = tempfile::tempdir().unwrap();
        let tree = StacTree::new(FileStore::open(dir.path()));
        let fp = mola();

        // instrument catalog dir + href == collection path.
        let resolved = normalize(&tree.instrument_dir(&fp).join(tree.instrument_to_collection(&fp)));
        assert_eq!(normalize(&tree.collection_path(&fp)), resolved);

        // collection dir + href == instrument catalog path.
        let collection_dir = tree.files().stac_dir(&fp);
        let resolved = normalize(&collection_dir.join(tree.collection_to_instrument(&fp)));
        assert_eq!(normalize(&tree.instrument_dir(&fp).join(CATALOG_FILE)), resolved);

        // collection dir + root href == root catalog path.
        let resolved = normalize(&collection_dir.join(tree.collection_to_root()));
        assert_eq!(normalize(&tree.root_catalog_path()), resolved);

        // items dir + root href == root catalog path.
        let resolved = normalize(&tree.items_dir(&fp).join(tree.item_to_root()));
        assert_eq!(normalize(&tree.root_catalog_path()), resolved);
    }

    /// Resolves `..` components without touching the filesystem.
    fn normalize(path: &Path) -> PathBuf {
        let mut out = PathBuf::new();
        for component in path.components() {
            match component {
                std::path::Component::ParentDir => {
                    out.pop();
                }
                other => out.push(other),
            }
        }
        out
    }

    #[test]
    fn ensure_parents_builds_the_chain_with_resolving_links() {
        let dir = tempfile::tempdir().unwrap();
        let tree = StacTree::new(FileStore::open(dir.path()));
        let fp = mola();
        let extent = Extent::default();

        tree.ensure_parents(&fp, &extent, |_, _| {}).unwrap();

        let root = tree.read_catalog(&tree.root_catalog_path()).unwrap().unwrap();
        assert_eq!(ROOT_ID, root.id);
        let child = root.links.iter().find(|l| l.rel == rel::CHILD).unwrap();
        assert_eq!("./mars-global-surveyor/catalog.json", child.href);

        let mission = tree
            .read_catalog(&tree.mission_dir(&fp).join(CATALOG_FILE))
            .unwrap()
            .unwrap();
        assert_eq!("mars-global-surveyor", mission.id);
        assert!(mission.links.iter().any(|l| l.rel == rel::CHILD && l.href == "./mgs/catalog.json"));

        let instrument = tree
            .read_catalog(&tree.instrument_dir(&fp).join(CATALOG_FILE))
            .unwrap()
            .unwrap();
        assert_eq!("mola", instrument.id);
        let child = instrument.links.iter().find(|l| l.rel == rel::CHILD).unwrap();
        assert_eq!(tree.instrument_to_collection(&fp), child.href);
    }

    #[test]
    fn ensure_parents_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let tree = StacTree::new(FileStore::open(dir.path()));
        let fp = mola();

        tree.ensure_parents(&fp, &Extent::default(), |_, _| {}).unwrap();
        let first = std::fs::read(tree.root_catalog_path()).unwrap();
        let first_mission = std::fs::read(tree.mission_dir(&fp).join(CATALOG_FILE)).unwrap();

        tree.ensure_parents(&fp, &Extent::default(), |_, _| {}).unwrap();
        assert_eq!(first, std::fs::read(tree.root_catalog_path()).unwrap());
        assert_eq!(
            first_mission,
            std::fs::read(tree.mission_dir(&fp).join(CATALOG_FILE)).unwrap()
        );
    }
}
