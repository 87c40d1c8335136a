//! The transform phase: composes record pages and parsed PDS3 catalogs
//! into the on-disk STAC tree. A collection's subtree moves through
//! `absent -> shallow (descriptor only) -> deep (with items) -> enriched
//! (with PDS3 catalogs)`; every write is idempotent, and parent catalogs
//! are shared across the collections that roll up to them.

mod catalogs;
mod pds3_set;
mod records;
mod tree;

pub use catalogs::transform_pds3;
pub use pds3_set::Pds3Set;
pub use records::{transform_records, RecordStats};
pub use tree::{Level, StacTree};

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Store(#[from] stores::StoreError),

    #[error("failed to encode STAC document: {0}")]
    Encode(#[from] serde_json::Error),
}
