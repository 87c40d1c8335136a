//! End-to-end tests of the transform phase against a scratch storage
//! root: record pages become items under a resolving parent chain, PDS3
//! objects enrich the same chain, and re-running either transform changes
//! nothing.

use models::stac::rel;
use models::CollectionDescriptor;
use pretty_assertions::assert_eq;
use stores::{CollectionReport, FileStore};
use transform::{transform_pds3, transform_records, StacTree};

fn descriptor() -> CollectionDescriptor {
    serde_json::from_value(serde_json::json!({
        "ODEMetaDB": "Mars",
        "IHID": "MGS",
        "IHName": "Mars Global Surveyor",
        "IID": "MOLA",
        "IName": "Mars Orbiter Laser Altimeter",
        "PT": "PEDR",
        "DataSetId": "MGS-M-MOLA-3-PEDR-L1A-V1.0",
        "NumberProducts": 2,
        "ValidFootprints": "T",
        "MinObservationTime": "1997-09-15T00:00:00.000",
        "MaxObservationTime": "2001-06-30T00:00:00.000",
    }))
    .unwrap()
}

fn page_json(first_id: &str, second_id: &str) -> Vec<u8> {
    serde_json::json!({
        "ODEResults": {
            "Status": "Success",
            "Count": 2,
            "Products": {
                "Product": [
                    {
                        "pdsid": first_id,
                        "PDSVolume_Id": "MGSL_21XX",
                        "UTC_start_time": "1997-09-15T19:10:00.000",
                        "UTC_stop_time": "1997-09-15T19:27:52.000",
                        "Footprint_C0_geometry":
                            "POLYGON ((10.0 -5.0, 12.0 -5.0, 12.0 -3.0, 10.0 -3.0, 10.0 -5.0))",
                        "Product_files": {
                            "Product_file": {
                                "FileName": "A.B",
                                "URL": "https://archive.example/mgsl_21xx/a.b",
                                "Type": "Product"
                            }
                        }
                    },
                    {
                        "pdsid": second_id,
                        "UTC_start_time": "1998-01-01T00:00:00.000",
                        "UTC_stop_time": "1998-01-02T00:00:00.000",
                        "Westernmost_longitude": 50.0,
                        "Easternmost_longitude": 55.0,
                        "Minimum_latitude": 10.0,
                        "Maximum_latitude": 12.0,
                        "Product_files": {
                            "Product_file": {
                                "FileName": "B.B",
                                "URL": "https://archive.example/mgsl_21xx/b.b",
                                "Type": "Product"
                            }
                        }
                    }
                ]
            }
        }
    })
    .to_string()
    .into_bytes()
}

const MISSION_CAT: &str = r#"
PDS_VERSION_ID = PDS3
OBJECT = MISSION
  MISSION_NAME = "MARS GLOBAL SURVEYOR"
  OBJECT = MISSION_INFORMATION
    MISSION_START_DATE = 1994-10-12
    MISSION_STOP_DATE = 2006-11-02
    MISSION_DESC = "The Mars Global Surveyor mission mapped Mars."
  END_OBJECT = MISSION_INFORMATION
  OBJECT = MISSION_HOST
    INSTRUMENT_HOST_ID = MGS
    OBJECT = MISSION_TARGET
      TARGET_NAME = MARS
    END_OBJECT = MISSION_TARGET
  END_OBJECT = MISSION_HOST
END_OBJECT = MISSION
END
"#;

const DS_CAT: &str = r#"
PDS_VERSION_ID = PDS3
OBJECT = DATA_SET
  DATA_SET_ID = "MGS-M-MOLA-3-PEDR-L1A-V1.0"
  OBJECT = DATA_SET_INFORMATION
    DATA_SET_NAME = "MGS MOLA PRECISION EXPERIMENT DATA RECORDS"
    START_TIME = 1997-09-15
    STOP_TIME = 2001-06-30
    PRODUCER_FULL_NAME = "DAVID E. SMITH"
    DATA_SET_DESC = "MOLA profiles of the Martian surface."
  END_OBJECT = DATA_SET_INFORMATION
  OBJECT = DATA_SET_TARGET
    TARGET_NAME = MARS
  END_OBJECT = DATA_SET_TARGET
  OBJECT = DATA_SET_HOST
    INSTRUMENT_HOST_ID = MGS
    INSTRUMENT_ID = MOLA
  END_OBJECT = DATA_SET_HOST
  OBJECT = DATA_SET_MISSION
    MISSION_NAME = "MARS GLOBAL SURVEYOR"
  END_OBJECT = DATA_SET_MISSION
  OBJECT = DATA_SET_REFERENCE_INFORMATION
    REFERENCE_KEY_ID = "ZUBERETAL1992"
  END_OBJECT = DATA_SET_REFERENCE_INFORMATION
END_OBJECT = DATA_SET
END
"#;

const REF_CAT: &str = r#"
PDS_VERSION_ID = PDS3
OBJECT = REFERENCE
  REFERENCE_KEY_ID = "ZUBERETAL1992"
  REFERENCE_DESC = "Zuber, M.T., et al., The Mars Observer Laser Altimeter investigation, 1992."
END_OBJECT = REFERENCE
END
"#;

fn seed(store: &FileStore, with_pds3: bool) -> CollectionDescriptor {
    let descriptor = descriptor();
    let fp = descriptor.fingerprint();
    store.write_page(&fp, 0, &page_json("AP00001L", "AP00002L")).unwrap();
    if with_pds3 {
        stores::write_atomic(&store.pds3_path(&fp, "mission.cat"), MISSION_CAT.as_bytes()).unwrap();
        stores::write_atomic(&store.pds3_path(&fp, "ds.cat"), DS_CAT.as_bytes()).unwrap();
        stores::write_atomic(&store.pds3_path(&fp, "ref.cat"), REF_CAT.as_bytes()).unwrap();
    }
    descriptor
}

fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[test]
fn records_transform_emits_items_under_a_resolving_tree() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path());
    let tree = StacTree::new(store.clone());
    let descriptor = seed(&store, false);
    let fp = descriptor.fingerprint();

    let mut report = CollectionReport::default();
    let stats = transform_records(&tree, &descriptor, &mut report).unwrap();
    assert!(report.is_empty());
    assert_eq!(2, stats.items_written);

    // Items exist and link to their collection.
    let item = read_json(&tree.item_path(&fp, "ap00001l"));
    assert_eq!("Feature", item["type"]);
    assert_eq!("mgs-m-mola-3-pedr-l1a-v1-0", item["collection"]);
    let rels: Vec<&str> = item["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["rel"].as_str().unwrap())
        .collect();
    assert!(rels.contains(&rel::PARENT) && rels.contains(&rel::COLLECTION) && rels.contains(&rel::ROOT));

    // The collection links every emitted item and its parent instrument.
    let collection = read_json(&tree.collection_path(&fp));
    let item_links: Vec<&str> = collection["links"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|l| l["rel"] == "item")
        .map(|l| l["href"].as_str().unwrap())
        .collect();
    assert_eq!(vec!["./items/ap00001l.json", "./items/ap00002l.json"], item_links);

    // The parent chain resolves: root, mission, host, instrument,
    // collection, by construction of the directories.
    assert!(tree.root_catalog_path().is_file());
    assert!(tree.mission_dir(&fp).join("catalog.json").is_file());
    assert!(tree.host_dir(&fp).join("catalog.json").is_file());
    assert!(tree.instrument_dir(&fp).join("catalog.json").is_file());

    // The collection's spatial extent covers both items.
    let bbox = collection["extent"]["spatial"]["bbox"][0].as_array().unwrap();
    let bbox: Vec<f64> = bbox.iter().map(|v| v.as_f64().unwrap()).collect();
    assert!(bbox[0] <= 10.0 && bbox[2] >= 55.0 && bbox[1] <= -5.0 && bbox[3] >= 12.0);
}

#[test]
fn records_transform_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path());
    let tree = StacTree::new(store.clone());
    let descriptor = seed(&store, false);
    let fp = descriptor.fingerprint();

    transform_records(&tree, &descriptor, &mut CollectionReport::default()).unwrap();
    let collection_before = std::fs::read(tree.collection_path(&fp)).unwrap();
    let item_before = std::fs::read(tree.item_path(&fp, "ap00001l")).unwrap();
    let root_before = std::fs::read(tree.root_catalog_path()).unwrap();

    transform_records(&tree, &descriptor, &mut CollectionReport::default()).unwrap();
    assert_eq!(collection_before, std::fs::read(tree.collection_path(&fp)).unwrap());
    assert_eq!(item_before, std::fs::read(tree.item_path(&fp, "ap00001l")).unwrap());
    assert_eq!(root_before, std::fs::read(tree.root_catalog_path()).unwrap());
}

#[test]
fn pds3_transform_enriches_the_chain_and_preserves_items() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path());
    let tree = StacTree::new(store.clone());
    let descriptor = seed(&store, true);
    let fp = descriptor.fingerprint();

    transform_records(&tree, &descriptor, &mut CollectionReport::default()).unwrap();
    let item_before = std::fs::read(tree.item_path(&fp, "ap00001l")).unwrap();

    let mut report = CollectionReport::default();
    transform_pds3(&tree, &descriptor, &mut report).unwrap();
    assert!(report.is_empty());

    // Items are untouched; only documents above them changed.
    assert_eq!(item_before, std::fs::read(tree.item_path(&fp, "ap00001l")).unwrap());

    // The mission catalog carries the PDS3 identity and links down the
    // chain down to the collection.
    let mission = read_json(&tree.mission_dir(&fp).join("catalog.json"));
    assert_eq!("mars-global-surveyor", mission["id"]);
    assert_eq!("MARS GLOBAL SURVEYOR", mission["title"]);
    let child = mission["links"].as_array().unwrap().iter().find(|l| l["rel"] == "child").unwrap();
    assert_eq!("./mgs/catalog.json", child["href"]);

    let host = read_json(&tree.host_dir(&fp).join("catalog.json"));
    let child = host["links"].as_array().unwrap().iter().find(|l| l["rel"] == "child").unwrap();
    assert_eq!("./mola/catalog.json", child["href"]);

    let instrument = read_json(&tree.instrument_dir(&fp).join("catalog.json"));
    let child = instrument["links"].as_array().unwrap().iter().find(|l| l["rel"] == "child").unwrap();
    assert!(child["href"].as_str().unwrap().ends_with("stac/collection.json"));

    // PDS3 wins on the collection document, and citations resolve through
    // the reference file.
    let collection = read_json(&tree.collection_path(&fp));
    assert_eq!("MGS MOLA PRECISION EXPERIMENT DATA RECORDS", collection["title"]);
    assert!(collection["pds:citations"][0].as_str().unwrap().contains("Zuber"));

    // The mission's temporal extent covers the collection's.
    let mission_interval = &mission["extent"]["temporal"]["interval"][0];
    let collection_interval = &collection["extent"]["temporal"]["interval"][0];
    assert!(mission_interval[0].as_str().unwrap() <= collection_interval[0].as_str().unwrap());
    assert!(mission_interval[1].as_str().unwrap() >= collection_interval[1].as_str().unwrap());

    // Running the PDS3 transform again changes nothing.
    let mission_before = std::fs::read(tree.mission_dir(&fp).join("catalog.json")).unwrap();
    transform_pds3(&tree, &descriptor, &mut CollectionReport::default()).unwrap();
    assert_eq!(mission_before, std::fs::read(tree.mission_dir(&fp).join("catalog.json")).unwrap());
}

#[test]
fn undecodable_pages_are_quarantined_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path());
    let tree = StacTree::new(store.clone());
    let descriptor = seed(&store, false);
    let fp = descriptor.fingerprint();

    // A page that came back as HTML despite the JSON request.
    store.write_page(&fp, 1, b"<html>503 Service Unavailable</html>").unwrap();

    let mut report = CollectionReport::default();
    let stats = transform_records(&tree, &descriptor, &mut report).unwrap();

    // The good page still produced its items.
    assert_eq!(2, stats.items_written);
    assert!(!report.is_empty());
    assert!(!store.has_page(&fp, 1));
    assert!(store.collection_dir(&fp).join("quarantine/page_001.json").is_file());
}
