//! End-to-end tests over realistic catalog files: each supported class
//! parses, exposes its identifiers, and survives a pretty-print round
//! trip.

use chrono::NaiveDate;
use parser::{parse_file, parse_str, to_odl, CatalogObject, ParseError};
use pretty_assertions::assert_eq;
use std::path::Path;

fn parse_fixture(name: &str) -> CatalogObject {
    parse_file(Path::new("tests/data").join(name).as_path()).expect(name)
}

#[test]
fn mission_catalog_parses_with_targets_and_references() {
    let CatalogObject::Mission(mission) = parse_fixture("MISSION.CAT") else {
        panic!("expected a mission");
    };

    assert_eq!(Some("MARS GLOBAL SURVEYOR"), mission.mission_name());
    assert_eq!(
        Some(NaiveDate::from_ymd_opt(1994, 10, 12).unwrap()),
        mission.start_date()
    );
    // The stop date is present but explicitly unknown, not absent.
    assert!(mission
        .information
        .get("MISSION_STOP_DATE")
        .map(|v| v.is_unknown())
        .unwrap_or(false));
    assert_eq!(vec!["MARS", "PHOBOS", "SUN"], mission.targets());

    let keys: Vec<&str> = mission.references.iter().filter_map(|r| r.key_id()).collect();
    assert!(keys.len() >= 9, "expected at least 9 references, got {}", keys.len());
    assert!(keys.contains(&"ZUBERETAL1992"));
}

#[test]
fn personnel_catalog_parses_every_record() {
    let CatalogObject::Personnel(personnel) = parse_fixture("PERSON.CAT") else {
        panic!("expected personnel");
    };
    assert_eq!(8, personnel.records.len());

    let slavney = personnel
        .records
        .iter()
        .find(|r| r.user_id() == Some("SSLAVNEY"))
        .expect("SSLAVNEY record");
    assert_eq!(vec!["SLAVNEY@WUNDER.WUSTL.EDU"], slavney.addresses());
    assert_eq!(
        Some(NaiveDate::from_ymd_opt(1988, 11, 1).unwrap()),
        slavney.registration_date()
    );
}

#[test]
fn data_set_catalog_links_mission_and_host() {
    let CatalogObject::DataSet(ds) = parse_fixture("DS.CAT") else {
        panic!("expected a data set");
    };
    assert_eq!(Some("MGS-M-MOLA-3-PEDR-L1A-V1.0"), ds.dataset_id());
    assert_eq!(Some("MARS GLOBAL SURVEYOR"), ds.mission_name());
    assert_eq!(1, ds.targets.len());
    assert_eq!(Some("MGS"), ds.host.text("INSTRUMENT_HOST_ID"));
    assert_eq!(
        Some(NaiveDate::from_ymd_opt(1997, 9, 15).unwrap()),
        ds.start_time()
    );
}

#[test]
fn volume_descriptor_nests_directories() {
    let CatalogObject::VolumeDescriptor(volume) = parse_fixture("VOLDESC.CAT") else {
        panic!("expected a volume descriptor");
    };
    assert_eq!(Some("MGSL_2110"), volume.volume_id());
    assert_eq!(Some("MISSION.CAT"), volume.catalog.text("^MISSION_CATALOG"));
    assert_eq!(1, volume.files.len());
    assert_eq!(1, volume.directories.len());
    let catalog_dir = &volume.directories[0];
    assert_eq!(1, catalog_dir.files.len());
    assert_eq!(1, catalog_dir.directories.len());
    assert_eq!(1, catalog_dir.directories[0].files.len());
}

#[test]
fn every_class_round_trips_through_its_projection() {
    for name in [
        "MISSION.CAT",
        "INSTHOST.CAT",
        "INST.CAT",
        "DS.CAT",
        "DSMAP.CAT",
        "PERSON.CAT",
        "REF.CAT",
        "VOLDESC.CAT",
    ] {
        let first = parse_fixture(name);
        let projected = to_odl(&first);
        let second = parse_str(&projected, name).unwrap_or_else(|err| {
            panic!("projection of {name} does not re-parse: {err}\n{projected}")
        });
        assert_eq!(first, second, "round trip of {name} diverged");
    }
}

#[test]
fn missing_required_sub_object_is_an_invariant_violation() {
    let text = r#"
PDS_VERSION_ID = PDS3
OBJECT = MISSION
  MISSION_NAME = "MARS GLOBAL SURVEYOR"
  OBJECT = MISSION_INFORMATION
    MISSION_START_DATE = 1994-10-12
  END_OBJECT = MISSION_INFORMATION
END_OBJECT = MISSION
END
"#;
    let err = parse_str(text, "MISSION.CAT").unwrap_err();
    assert!(
        matches!(err, ParseError::MissingSubObject { name: "MISSION_HOST", .. }),
        "{err}"
    );
}

#[test]
fn unknown_sub_objects_are_retained_opaquely() {
    let text = r#"
PDS_VERSION_ID = PDS3
OBJECT = INSTRUMENT
  INSTRUMENT_HOST_ID = MGS
  INSTRUMENT_ID = MOLA
  OBJECT = INSTRUMENT_INFORMATION
    INSTRUMENT_NAME = "MARS ORBITER LASER ALTIMETER"
  END_OBJECT = INSTRUMENT_INFORMATION
  OBJECT = INSTRUMENT_CALIBRATION
    NOTE = "not part of the instrument grammar"
  END_OBJECT = INSTRUMENT_CALIBRATION
END_OBJECT = INSTRUMENT
END
"#;
    let CatalogObject::Instrument(instrument) = parse_str(text, "INST.CAT").unwrap() else {
        panic!("expected an instrument");
    };
    assert_eq!(1, instrument.opaque.len());
    assert_eq!("INSTRUMENT_CALIBRATION", instrument.opaque[0].name);
    assert!(instrument.opaque[0].properties.text("NOTE").is_some());
}
