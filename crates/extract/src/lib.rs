//! The extract phase: discovering georeferenced collections from the ODE
//! service, pulling their record pages, and scraping PDS3 catalog objects
//! off the archive website. Everything lands in the file store; resumption
//! is entirely a function of what is already there.

mod ode;
mod site;
mod urls;

pub use ode::{discover, extract_records, PAGE_SIZE};
pub use site::{extract_pds3, scrape_catalog_anchors, volume_index_url};
pub use urls::OdeEndpoints;

/// Errors of the extract phase. Fetch failures inside a page run are
/// collected in the returned outcome instead; these are the failures that
/// stop a collection.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] fetch::FetchError),

    #[error(transparent)]
    Decode(#[from] models::DecodeError),

    #[error(transparent)]
    Store(#[from] stores::StoreError),

    #[error("collection {0} has no fetched records to derive the volume from")]
    NoRecords(String),

    #[error("collection {0} carries no usable volume identifier")]
    NoVolume(String),
}
