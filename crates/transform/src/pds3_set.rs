//! The PDS3 object set of one collection, loaded in two passes: every
//! catalog file parses into the arena first, then cross-references are
//! resolved by key lookup. Files the grammar rejects are reported and the
//! corresponding enrichment is simply omitted.

use std::collections::BTreeMap;

use models::CatalogKind;
use parser::objects::{
    DataSet, DataSetMapProjection, Instrument, InstrumentHost, Mission, Personnel, ReferenceEntry,
    VolumeDescriptor,
};
use parser::CatalogObject;
use stores::{CollectionReport, FileStore};

use crate::TransformError;

/// Arena of the parsed catalog objects of one collection.
#[derive(Debug, Default)]
pub struct Pds3Set {
    pub mission: Option<Mission>,
    pub instrument_host: Option<InstrumentHost>,
    pub instrument: Option<Instrument>,
    pub data_set: Option<DataSet>,
    pub map_projection: Option<DataSetMapProjection>,
    pub personnel: Option<Personnel>,
    /// Reference records keyed by `REFERENCE_KEY_ID`.
    references: BTreeMap<String, ReferenceEntry>,
    pub volume: Option<VolumeDescriptor>,
}

impl Pds3Set {
    /// First pass: parse every file under `pds3/`. Parse failures land in
    /// the report; the set stays usable with whatever did parse.
    pub fn load(
        files: &FileStore,
        fingerprint: &models::Fingerprint,
        report: &mut CollectionReport,
    ) -> Result<Self, TransformError> {
        let mut set = Pds3Set::default();
        for (kind, path) in files.list_pds3(fingerprint)? {
            match parser::parse_file(&path) {
                Ok(object) => set.insert(object),
                Err(error) => {
                    tracing::warn!(file = %path.display(), %error, "catalog file left unparsed");
                    report.record("parse", error.to_string());
                }
            }
        }
        Ok(set)
    }

    fn insert(&mut self, object: CatalogObject) {
        match object {
            CatalogObject::Mission(m) => self.mission = Some(m),
            CatalogObject::InstrumentHost(h) => self.instrument_host = Some(h),
            CatalogObject::Instrument(i) => self.instrument = Some(i),
            CatalogObject::DataSet(d) => self.data_set = Some(d),
            CatalogObject::DataSetMapProjection(p) => self.map_projection = Some(p),
            CatalogObject::Personnel(p) => self.personnel = Some(p),
            CatalogObject::VolumeDescriptor(v) => self.volume = Some(v),
            CatalogObject::Reference(list) => {
                // Second-pass linkage is by key; missions cite references
                // cite missions, so nothing holds a pointer to anything.
                for record in list.records {
                    if let Some(key) = record.key_id() {
                        self.references.insert(key.to_string(), record);
                    }
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mission.is_none()
            && self.instrument_host.is_none()
            && self.instrument.is_none()
            && self.data_set.is_none()
            && self.map_projection.is_none()
            && self.personnel.is_none()
            && self.volume.is_none()
            && self.references.is_empty()
    }

    /// Resolves one citation key to its reference record.
    pub fn reference(&self, key: &str) -> Option<&ReferenceEntry> {
        self.references.get(key)
    }

    /// Resolves the citations of the data set catalog: the full reference
    /// descriptions for every key it cites that the reference file knows.
    pub fn data_set_citations(&self) -> Vec<String> {
        let Some(data_set) = &self.data_set else {
            return Vec::new();
        };
        data_set
            .references
            .iter()
            .filter_map(|entry| entry.key_id())
            .filter_map(|key| self.reference(key))
            .filter_map(|record| record.properties.text("REFERENCE_DESC"))
            .map(|desc| desc.to_string())
            .collect()
    }

    /// True when a file of this kind parsed successfully.
    pub fn has(&self, kind: CatalogKind) -> bool {
        match kind {
            CatalogKind::Mission => self.mission.is_some(),
            CatalogKind::InstrumentHost => self.instrument_host.is_some(),
            CatalogKind::Instrument => self.instrument.is_some(),
            CatalogKind::DataSet => self.data_set.is_some(),
            CatalogKind::DataSetMapProjection => self.map_projection.is_some(),
            CatalogKind::Personnel => self.personnel.is_some(),
            CatalogKind::Reference => !self.references.is_empty(),
            CatalogKind::VolumeDescriptor => self.volume.is_some(),
        }
    }
}
