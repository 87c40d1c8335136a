use serde::{Deserialize, Serialize};

/// The eight PDS3 catalog object classes this pipeline understands. The
/// website extractor uses the roster to pick anchors off a volume index
/// page, the file store uses it to classify files under `pds3/`, and the
/// parser registry uses it to choose a grammar.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Mission,
    InstrumentHost,
    Instrument,
    DataSet,
    DataSetMapProjection,
    Personnel,
    Reference,
    VolumeDescriptor,
}

/// Filename heuristics, checked in order. More specific stems come first so
/// that `DSMAP.CAT` is never mistaken for a data set and `INSTHOST.CAT` is
/// never mistaken for an instrument.
const FILENAME_HEURISTICS: &[(&str, CatalogKind)] = &[
    ("voldesc", CatalogKind::VolumeDescriptor),
    ("dsmap", CatalogKind::DataSetMapProjection),
    ("insthost", CatalogKind::InstrumentHost),
    ("inst_host", CatalogKind::InstrumentHost),
    ("instrument_host", CatalogKind::InstrumentHost),
    ("inst", CatalogKind::Instrument),
    ("mission", CatalogKind::Mission),
    ("person", CatalogKind::Personnel),
    ("ref", CatalogKind::Reference),
    ("dataset", CatalogKind::DataSet),
    ("data_set", CatalogKind::DataSet),
    ("ds", CatalogKind::DataSet),
];

impl CatalogKind {
    /// Every kind, in declaration order: the full catalog-object roster.
    pub fn all() -> impl Iterator<Item = CatalogKind> {
        <CatalogKind as strum::IntoEnumIterator>::iter()
    }

    /// The upstream name of the root `OBJECT = …` block for this kind.
    pub fn object_name(&self) -> &'static str {
        match self {
            CatalogKind::Mission => "MISSION",
            CatalogKind::InstrumentHost => "INSTRUMENT_HOST",
            CatalogKind::Instrument => "INSTRUMENT",
            CatalogKind::DataSet => "DATA_SET",
            CatalogKind::DataSetMapProjection => "DATA_SET_MAP_PROJECTION",
            CatalogKind::Personnel => "PERSONNEL",
            CatalogKind::Reference => "REFERENCE",
            CatalogKind::VolumeDescriptor => "VOLUME",
        }
    }

    /// Classifies an upstream filename (`MISSION.CAT`, `dsmap.cat`, …).
    /// Matching is case-insensitive over the file stem.
    pub fn from_filename(filename: &str) -> Option<CatalogKind> {
        let stem = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(filename)
            .split('.')
            .next()
            .unwrap_or(filename)
            .to_ascii_lowercase();
        FILENAME_HEURISTICS
            .iter()
            .find(|(pat, _)| stem.contains(pat))
            .map(|(_, kind)| *kind)
    }

    /// The filename this kind is stored under in a collection's `pds3/`
    /// directory when the upstream name is unusable.
    pub fn canonical_filename(&self) -> &'static str {
        match self {
            CatalogKind::Mission => "mission.cat",
            CatalogKind::InstrumentHost => "insthost.cat",
            CatalogKind::Instrument => "inst.cat",
            CatalogKind::DataSet => "ds.cat",
            CatalogKind::DataSetMapProjection => "dsmap.cat",
            CatalogKind::Personnel => "person.cat",
            CatalogKind::Reference => "ref.cat",
            CatalogKind::VolumeDescriptor => "voldesc.cat",
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.object_name())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn filenames_classify_to_the_expected_kind() {
        let cases = [
            ("MISSION.CAT", CatalogKind::Mission),
            ("catalog/mission.cat", CatalogKind::Mission),
            ("INSTHOST.CAT", CatalogKind::InstrumentHost),
            ("INST.CAT", CatalogKind::Instrument),
            ("DS.CAT", CatalogKind::DataSet),
            ("DATASET.CAT", CatalogKind::DataSet),
            ("DSMAP.CAT", CatalogKind::DataSetMapProjection),
            ("PERSON.CAT", CatalogKind::Personnel),
            ("REF.CAT", CatalogKind::Reference),
            ("VOLDESC.CAT", CatalogKind::VolumeDescriptor),
            ("voldesc.sfd", CatalogKind::VolumeDescriptor),
        ];
        for (name, expect) in cases {
            assert_eq!(Some(expect), CatalogKind::from_filename(name), "{name}");
        }
        assert_eq!(None, CatalogKind::from_filename("AAREADME.TXT"));
    }

    #[test]
    fn every_kind_round_trips_through_its_canonical_filename() {
        for kind in CatalogKind::iter() {
            assert_eq!(Some(kind), CatalogKind::from_filename(kind.canonical_filename()));
        }
    }
}
