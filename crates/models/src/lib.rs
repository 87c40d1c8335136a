//! Typed domain models shared by every crate in the workspace: collection
//! fingerprints, ODE collection descriptors and record pages, PDS3 catalog
//! kinds, and the STAC documents the transformer emits.

mod collections;
mod fingerprint;
mod json;
mod kinds;
mod records;
mod slug;
pub mod stac;

pub use collections::{CollectionDescriptor, DiscoveryResponse};
pub use fingerprint::Fingerprint;
pub use json::DecodeError;
pub use kinds::CatalogKind;
pub use records::{ProductFile, Record, RecordPage};
pub use slug::slug;
