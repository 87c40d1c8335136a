//! `transform_records`: record pages into STAC items, plus the shallow
//! collection document when none exists yet.

use models::stac::{Extent, Link};
use models::{CollectionDescriptor, RecordPage};
use stores::CollectionReport;

use crate::tree::StacTree;
use crate::TransformError;

/// Statistics of one collection's record transform.
#[derive(Debug, Default)]
pub struct RecordStats {
    pub pages: usize,
    pub items_written: usize,
    pub items_skipped: usize,
}

/// Streams every record page of the collection from the file store and
/// emits one STAC item per record. The collection document is created from
/// the descriptor when absent; parents are created or merged afterwards.
///
/// A page that fails to decode is quarantined and reported; a single item
/// that fails to write is skipped and reported. Neither aborts the
/// collection.
#[tracing::instrument(level = "info", skip_all, fields(dataset = %descriptor.dataset_id))]
pub fn transform_records(
    tree: &StacTree,
    descriptor: &CollectionDescriptor,
    report: &mut CollectionReport,
) -> Result<RecordStats, TransformError> {
    let fingerprint = descriptor.fingerprint();
    let files = tree.files().clone();
    let mut stats = RecordStats::default();

    // Shallow collection from the descriptor, unless a previous run (or a
    // PDS3 enrichment) already wrote one.
    let collection_path = tree.collection_path(&fingerprint);
    let mut collection = tree
        .read_collection(&collection_path)?
        .unwrap_or_else(|| descriptor.to_stac_collection());

    let mut extent: Option<Extent> = None;

    for (index, path) in files.list_pages(&fingerprint)? {
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(source) => {
                report.record("io", format!("page {index}: {source}"));
                continue;
            }
        };
        let page = match RecordPage::decode(&bytes) {
            Ok(page) => page,
            Err(error) => {
                // Malformed upstream response: quarantine and continue.
                report.record("decode", format!("page {index}: {error}"));
                files.quarantine(&fingerprint, &path)?;
                continue;
            }
        };
        if !page.is_complete() {
            tracing::warn!(
                page = index,
                advertised = page.header_count(),
                actual = page.records().len(),
                "page header count does not match its records"
            );
        }
        stats.pages += 1;

        for record in page.into_records() {
            let mut item = record.to_stac_item(&collection.id);
            if item.id.is_empty() {
                stats.items_skipped += 1;
                report.record("item", format!("page {index}: record without a product id"));
                continue;
            }
            item.links = vec![
                Link::root(tree.item_to_root()),
                Link::parent("../collection.json"),
                Link::collection("../collection.json"),
            ];

            let item_extent = Extent::new(
                item.bbox.clone().unwrap_or_else(|| vec![-180.0, -90.0, 180.0, 90.0]),
                item.properties.start_datetime.or(item.properties.datetime),
                item.properties.end_datetime.or(item.properties.datetime),
            );

            let item_path = tree.item_path(&fingerprint, &item.id);
            match tree.write_document(&item_path, &item) {
                Ok(_) => {
                    stats.items_written += 1;
                    match extent.as_mut() {
                        Some(e) => e.union(&item_extent),
                        None => extent = Some(item_extent),
                    }
                }
                Err(error) => {
                    stats.items_skipped += 1;
                    report.record("item", format!("{}: {error}", item.id));
                }
            }
        }
    }

    // The collection covers the union of its items; with no items yet it
    // keeps the descriptor's extent.
    if let Some(items_extent) = &extent {
        collection.extent.union(items_extent);
    }
    collection.links = collection_links(tree, &fingerprint)?;
    tree.write_document(&collection_path, &collection)?;

    tree.ensure_parents(&fingerprint, &collection.extent, |_, _| {})?;

    tracing::info!(
        pages = stats.pages,
        items = stats.items_written,
        skipped = stats.items_skipped,
        "record transform finished"
    );
    Ok(stats)
}

/// Regenerates the collection's links from the tree's current state: the
/// structural links plus one `item` link per emitted item. Items from
/// prior runs stay linked, which keeps the item set a union across runs.
pub(crate) fn collection_links(
    tree: &StacTree,
    fingerprint: &models::Fingerprint,
) -> Result<Vec<Link>, TransformError> {
    let mut links = vec![
        Link::root(tree.collection_to_root()),
        Link::parent(tree.collection_to_instrument(fingerprint)),
    ];

    let items_dir = tree.items_dir(fingerprint);
    let mut item_names: Vec<String> = match std::fs::read_dir(&items_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(|s| s.to_string()))
            .filter(|name| name.ends_with(".json"))
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            return Err(stores::StoreError::Io {
                path: items_dir.display().to_string(),
                source: e,
            }
            .into())
        }
    };
    item_names.sort();
    links.extend(item_names.into_iter().map(|name| Link::item(format!("./items/{name}"))));
    Ok(links)
}
