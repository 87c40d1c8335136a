use fetch::{FetchOutcome, FetchPool, FetchRequest, RequestClass};
use models::{CollectionDescriptor, DiscoveryResponse};
use stores::{FileStore, RegistryStore};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::urls::OdeEndpoints;
use crate::ExtractError;

/// Page size of the records endpoint; the service caps larger requests to
/// this anyway, so page indices stay stable across runs.
pub const PAGE_SIZE: u64 = 100;

/// Queries the discovery endpoint, keeps the georeferenced descriptors
/// (valid footprints and at least one product), and writes them through
/// to the registry, create-or-replace. Returns what was written.
#[tracing::instrument(level = "info", skip(pool, registry, endpoints, cancel))]
pub async fn discover(
    pool: &FetchPool,
    registry: &RegistryStore,
    endpoints: &OdeEndpoints,
    planet: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Vec<CollectionDescriptor>, ExtractError> {
    let url = endpoints.discovery(planet);
    let bytes = pool.fetch_bytes(&url, cancel).await?;
    let response = DiscoveryResponse::decode(&bytes)?;

    let mut kept = 0u64;
    let mut dropped = 0u64;
    let descriptors: Vec<CollectionDescriptor> = response
        .into_descriptors()
        .filter(|d| {
            if d.is_georeferenced() {
                kept += 1;
                true
            } else {
                dropped += 1;
                false
            }
        })
        .collect();

    registry.upsert_all(descriptors.iter().cloned())?;
    tracing::info!(kept, dropped, "discovery finished and registered");
    Ok(descriptors)
}

/// Fetches every record page of a collection that is not on disk yet, up
/// to `sample` pages when given. Raw page JSON is persisted verbatim;
/// pages complete in any order.
#[tracing::instrument(
    level = "info",
    skip_all,
    fields(dataset = %descriptor.dataset_id, sample)
)]
pub async fn extract_records(
    pool: &FetchPool,
    files: &FileStore,
    endpoints: &OdeEndpoints,
    descriptor: &CollectionDescriptor,
    sample: Option<u64>,
    events: Option<UnboundedSender<fetch::FetchEvent>>,
    cancel: &CancellationToken,
) -> Result<FetchOutcome, ExtractError> {
    let fingerprint = descriptor.fingerprint();
    let total_pages = descriptor.page_count(PAGE_SIZE);
    let wanted = match sample {
        Some(limit) => limit.min(total_pages),
        None => total_pages,
    };

    let missing = files.list_missing_pages(&fingerprint, wanted);
    tracing::info!(
        total_pages,
        wanted,
        missing = missing.len(),
        "extracting record pages"
    );

    let requests: Vec<FetchRequest> = missing
        .into_iter()
        .map(|index| FetchRequest {
            url: endpoints.records(descriptor, index * PAGE_SIZE, PAGE_SIZE),
            dest: files.page_path(&fingerprint, index),
            expected_len: None,
            class: RequestClass::Json,
        })
        .collect();

    Ok(pool.fetch_all(requests, events, cancel).await)
}
