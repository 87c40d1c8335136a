//! Typed catalog objects: the eight variants the grammars produce, plus
//! the keyword map they all carry. Payloads stay keyword-addressed so that
//! unknown keywords survive a parse; the typed accessors cover only the
//! identifiers and dates the transformer composes STAC nodes from.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use models::CatalogKind;

use crate::value::Value;

/// The keyword/value payload of an object or sub-object. Keys are
/// upper-cased at parse time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties(BTreeMap<String, Value>);

impl Properties {
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Text of an identifier keyword; `None` when absent or explicitly
    /// unknown.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_text)
    }

    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        self.0.get(key).and_then(Value::as_date)
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_integer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, Value)> for Properties {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Properties(iter.into_iter().collect())
    }
}

/// A sub-object no grammar claims: kept verbatim so a rewrite loses
/// nothing, reported as a warning at parse time.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueBlock {
    pub name: String,
    pub properties: Properties,
    pub blocks: Vec<OpaqueBlock>,
}

/// A reference citation entry; the same shape serves every catalog class
/// (`MISSION_REFERENCE_INFORMATION`, `INSTRUMENT_REFERENCE_INFO`, …).
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub properties: Properties,
}

impl ReferenceEntry {
    pub fn key_id(&self) -> Option<&str> {
        self.properties.text("REFERENCE_KEY_ID")
    }
}

/// One parsed catalog file.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogObject {
    Mission(Mission),
    InstrumentHost(InstrumentHost),
    Instrument(Instrument),
    DataSet(DataSet),
    DataSetMapProjection(DataSetMapProjection),
    Personnel(Personnel),
    Reference(ReferenceList),
    VolumeDescriptor(VolumeDescriptor),
}

impl CatalogObject {
    pub fn kind(&self) -> CatalogKind {
        match self {
            CatalogObject::Mission(_) => CatalogKind::Mission,
            CatalogObject::InstrumentHost(_) => CatalogKind::InstrumentHost,
            CatalogObject::Instrument(_) => CatalogKind::Instrument,
            CatalogObject::DataSet(_) => CatalogKind::DataSet,
            CatalogObject::DataSetMapProjection(_) => CatalogKind::DataSetMapProjection,
            CatalogObject::Personnel(_) => CatalogKind::Personnel,
            CatalogObject::Reference(_) => CatalogKind::Reference,
            CatalogObject::VolumeDescriptor(_) => CatalogKind::VolumeDescriptor,
        }
    }

    /// The object's primary key within its class: the natural id other
    /// catalog files cite it by.
    pub fn identifier(&self) -> String {
        match self {
            CatalogObject::Mission(m) => m.mission_name().unwrap_or_default().to_string(),
            CatalogObject::InstrumentHost(h) => {
                h.properties.text("INSTRUMENT_HOST_ID").unwrap_or_default().to_string()
            }
            CatalogObject::Instrument(i) => format!(
                "{}/{}",
                i.properties.text("INSTRUMENT_HOST_ID").unwrap_or_default(),
                i.properties.text("INSTRUMENT_ID").unwrap_or_default(),
            ),
            CatalogObject::DataSet(d) => {
                d.properties.text("DATA_SET_ID").unwrap_or_default().to_string()
            }
            CatalogObject::DataSetMapProjection(p) => {
                p.properties.text("DATA_SET_ID").unwrap_or_default().to_string()
            }
            CatalogObject::Personnel(p) => p
                .records
                .first()
                .and_then(|r| r.user_id())
                .unwrap_or_default()
                .to_string(),
            CatalogObject::Reference(r) => r
                .records
                .first()
                .and_then(|e| e.key_id())
                .unwrap_or_default()
                .to_string(),
            CatalogObject::VolumeDescriptor(v) => {
                v.properties.text("VOLUME_ID").unwrap_or_default().to_string()
            }
        }
    }

    /// Reference keys cited by this object, across all its reference
    /// sub-objects.
    pub fn reference_keys(&self) -> Vec<&str> {
        let entries: &[ReferenceEntry] = match self {
            CatalogObject::Mission(m) => &m.references,
            CatalogObject::InstrumentHost(h) => &h.references,
            CatalogObject::Instrument(i) => &i.references,
            CatalogObject::DataSet(d) => &d.references,
            CatalogObject::DataSetMapProjection(p) => &p.references,
            _ => &[],
        };
        entries.iter().filter_map(ReferenceEntry::key_id).collect()
    }
}

/// `MISSION.CAT`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mission {
    /// File-level keywords before the root object.
    pub header: Properties,
    /// Keywords directly inside `OBJECT = MISSION`.
    pub properties: Properties,
    pub information: Properties,
    pub host: MissionHost,
    pub references: Vec<ReferenceEntry>,
    pub opaque: Vec<OpaqueBlock>,
}

impl Mission {
    pub fn mission_name(&self) -> Option<&str> {
        self.properties.text("MISSION_NAME")
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.information.date("MISSION_START_DATE")
    }

    pub fn stop_date(&self) -> Option<NaiveDate> {
        self.information.date("MISSION_STOP_DATE")
    }

    pub fn description(&self) -> Option<&str> {
        self.information.text("MISSION_DESC")
    }

    /// Target names across the mission host.
    pub fn targets(&self) -> Vec<&str> {
        self.host
            .targets
            .iter()
            .filter_map(|t| t.text("TARGET_NAME"))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissionHost {
    pub properties: Properties,
    /// `MISSION_TARGET` sub-objects, one per target body.
    pub targets: Vec<Properties>,
}

/// `INSTHOST.CAT`.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentHost {
    pub header: Properties,
    pub properties: Properties,
    pub information: Properties,
    pub references: Vec<ReferenceEntry>,
    pub opaque: Vec<OpaqueBlock>,
}

impl InstrumentHost {
    pub fn host_id(&self) -> Option<&str> {
        self.properties.text("INSTRUMENT_HOST_ID")
    }

    pub fn host_name(&self) -> Option<&str> {
        self.information.text("INSTRUMENT_HOST_NAME")
    }

    pub fn description(&self) -> Option<&str> {
        self.information.text("INSTRUMENT_HOST_DESC")
    }
}

/// `INST.CAT`.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub header: Properties,
    pub properties: Properties,
    pub information: Properties,
    pub references: Vec<ReferenceEntry>,
    pub opaque: Vec<OpaqueBlock>,
}

impl Instrument {
    pub fn instrument_id(&self) -> Option<&str> {
        self.properties.text("INSTRUMENT_ID")
    }

    pub fn host_id(&self) -> Option<&str> {
        self.properties.text("INSTRUMENT_HOST_ID")
    }

    pub fn instrument_name(&self) -> Option<&str> {
        self.information.text("INSTRUMENT_NAME")
    }

    pub fn description(&self) -> Option<&str> {
        self.information.text("INSTRUMENT_DESC")
    }
}

/// `DS.CAT`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    pub header: Properties,
    pub properties: Properties,
    pub information: Properties,
    /// `DATA_SET_TARGET`, one or more.
    pub targets: Vec<Properties>,
    pub host: Properties,
    pub mission: Properties,
    pub references: Vec<ReferenceEntry>,
    pub opaque: Vec<OpaqueBlock>,
}

impl DataSet {
    pub fn dataset_id(&self) -> Option<&str> {
        self.properties.text("DATA_SET_ID")
    }

    pub fn dataset_name(&self) -> Option<&str> {
        self.information.text("DATA_SET_NAME")
    }

    pub fn description(&self) -> Option<&str> {
        self.information.text("DATA_SET_DESC")
    }

    pub fn start_time(&self) -> Option<NaiveDate> {
        self.information.date("START_TIME")
    }

    pub fn stop_time(&self) -> Option<NaiveDate> {
        self.information.date("STOP_TIME")
    }

    pub fn mission_name(&self) -> Option<&str> {
        self.mission.text("MISSION_NAME")
    }
}

/// `DSMAP.CAT`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSetMapProjection {
    pub header: Properties,
    pub properties: Properties,
    pub information: Properties,
    pub references: Vec<ReferenceEntry>,
    pub opaque: Vec<OpaqueBlock>,
}

impl DataSetMapProjection {
    pub fn map_projection_type(&self) -> Option<&str> {
        self.information.text("MAP_PROJECTION_TYPE")
    }
}

/// `PERSON.CAT`: a file of one or more `PERSONNEL` records.
#[derive(Debug, Clone, PartialEq)]
pub struct Personnel {
    pub header: Properties,
    pub records: Vec<PersonnelRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonnelRecord {
    pub properties: Properties,
    pub information: Properties,
    /// `PERSONNEL_ELECTRONIC_MAIL` sub-objects.
    pub emails: Vec<Properties>,
    pub opaque: Vec<OpaqueBlock>,
}

impl PersonnelRecord {
    pub fn user_id(&self) -> Option<&str> {
        self.properties.text("PDS_USER_ID")
    }

    pub fn full_name(&self) -> Option<&str> {
        self.information.text("FULL_NAME")
    }

    pub fn registration_date(&self) -> Option<NaiveDate> {
        self.information.date("REGISTRATION_DATE")
    }

    pub fn addresses(&self) -> Vec<&str> {
        self.emails
            .iter()
            .filter_map(|e| e.text("ELECTRONIC_MAIL_ID"))
            .collect()
    }
}

/// `REF.CAT`: a file of one or more `REFERENCE` records, keyword-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceList {
    pub header: Properties,
    pub records: Vec<ReferenceEntry>,
    pub opaque: Vec<OpaqueBlock>,
}

/// `VOLDESC.CAT`.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDescriptor {
    pub header: Properties,
    pub properties: Properties,
    pub data_producer: Properties,
    /// The `CATALOG` sub-object: pointers to the other catalog files on
    /// the volume.
    pub catalog: Properties,
    pub data_supplier: Option<Properties>,
    pub files: Vec<Properties>,
    pub directories: Vec<Directory>,
    pub opaque: Vec<OpaqueBlock>,
}

impl VolumeDescriptor {
    pub fn volume_id(&self) -> Option<&str> {
        self.properties.text("VOLUME_ID")
    }
}

/// A `DIRECTORY` sub-object; directories nest.
#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    pub properties: Properties,
    pub files: Vec<Properties>,
    pub directories: Vec<Directory>,
}
