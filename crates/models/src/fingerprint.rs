use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::slug;

/// The minimal tuple distinguishing one PDS data set from another. Every
/// storage key in the workspace (registry rows, collection directories,
/// STAC identifiers) derives from a fingerprint, and a fingerprint never
/// changes once created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    target: String,
    mission: String,
    instrument_host: String,
    instrument: String,
    dataset_id: String,
}

impl Fingerprint {
    pub fn new(
        target: impl Into<String>,
        mission: impl Into<String>,
        instrument_host: impl Into<String>,
        instrument: impl Into<String>,
        dataset_id: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into().to_uppercase(),
            mission: mission.into().to_uppercase(),
            instrument_host: instrument_host.into().to_uppercase(),
            instrument: instrument.into().to_uppercase(),
            dataset_id: dataset_id.into().to_uppercase(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn mission(&self) -> &str {
        &self.mission
    }

    pub fn instrument_host(&self) -> &str {
        &self.instrument_host
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    /// The collection's directory below the storage root:
    /// `target/mission/host/instrument/dataset_id`, each segment slugged.
    pub fn relative_dir(&self) -> PathBuf {
        [
            slug(&self.target),
            slug(&self.mission),
            slug(&self.instrument_host),
            slug(&self.instrument),
            slug(&self.dataset_id),
        ]
        .iter()
        .collect()
    }

    /// STAC identifier of the mission catalog this collection rolls up to.
    pub fn mission_id(&self) -> String {
        slug(&self.mission)
    }

    /// STAC identifier of the instrument-host catalog.
    pub fn instrument_host_id(&self) -> String {
        slug(&self.instrument_host)
    }

    /// STAC identifier of the instrument catalog.
    pub fn instrument_id(&self) -> String {
        slug(&self.instrument)
    }

    /// STAC identifier of the collection itself.
    pub fn collection_id(&self) -> String {
        slug(&self.dataset_id)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.target, self.mission, self.instrument_host, self.instrument, self.dataset_id
        )
    }
}
