//! `transform_pds3`: enriches the collection and its parent catalogs with
//! the metadata of the parsed PDS3 objects. Where a PDS3 object and the
//! ODE descriptor disagree on a field, the PDS3 value wins.

use chrono::NaiveDate;
use models::stac::{Extent, Provider};
use models::CollectionDescriptor;
use stores::CollectionReport;

use crate::pds3_set::Pds3Set;
use crate::records::collection_links;
use crate::tree::{Level, StacTree};
use crate::TransformError;

/// Loads the collection's PDS3 object set and rebuilds the enriched
/// mission / host / instrument / collection documents.
#[tracing::instrument(level = "info", skip_all, fields(dataset = %descriptor.dataset_id))]
pub fn transform_pds3(
    tree: &StacTree,
    descriptor: &CollectionDescriptor,
    report: &mut CollectionReport,
) -> Result<(), TransformError> {
    let fingerprint = descriptor.fingerprint();
    let set = Pds3Set::load(tree.files(), &fingerprint, report)?;
    if set.is_empty() {
        tracing::info!("no parsed PDS3 objects; leaving the shallow documents in place");
    }

    // The collection document first.
    let collection_path = tree.collection_path(&fingerprint);
    let mut collection = tree
        .read_collection(&collection_path)?
        .unwrap_or_else(|| descriptor.to_stac_collection());

    if let Some(data_set) = &set.data_set {
        if let Some(name) = data_set.dataset_name() {
            collection.title = Some(name.to_string());
        }
        if let Some(desc) = data_set.description().or_else(|| {
            data_set.information.text("ABSTRACT_DESC")
        }) {
            collection.description = desc.to_string();
        }
        for target in data_set.targets.iter().filter_map(|t| t.text("TARGET_NAME")) {
            let keyword = target.to_uppercase();
            if !collection.keywords.contains(&keyword) {
                collection.keywords.push(keyword);
            }
        }
        if let Some(producer) = data_set.information.text("PRODUCER_FULL_NAME") {
            collection.providers = vec![Provider {
                name: producer.to_string(),
                description: None,
                roles: vec!["producer".to_string()],
                url: None,
            }];
        }
        // PDS3 time bounds win over the descriptor's.
        let start = data_set.start_time();
        let stop = data_set.stop_time();
        if start.is_some() || stop.is_some() {
            let bbox = collection
                .extent
                .overall_bbox()
                .cloned()
                .unwrap_or_else(|| vec![-180.0, -90.0, 180.0, 90.0]);
            let (old_start, old_stop) = collection.extent.overall_interval();
            collection.extent = Extent::new(
                bbox,
                start.map(start_of_day).or(old_start),
                stop.map(end_of_day).or(old_stop),
            );
        }
    }

    let citations = set.data_set_citations();
    if !citations.is_empty() {
        collection
            .extra
            .insert("pds:citations".to_string(), serde_json::json!(citations));
    }
    if let Some(projection) = &set.map_projection {
        if let Some(kind) = projection.map_projection_type() {
            collection
                .extra
                .insert("pds:map_projection".to_string(), serde_json::json!(kind));
        }
    }

    collection.links = collection_links(tree, &fingerprint)?;
    tree.write_document(&collection_path, &collection)?;

    // Parents, enriched per level.
    tree.ensure_parents(&fingerprint, &collection.extent, |level, catalog| match level {
        Level::Mission => {
            if let Some(mission) = &set.mission {
                if let Some(name) = mission.mission_name() {
                    catalog.title = Some(name.to_string());
                }
                if let Some(desc) = mission.description() {
                    catalog.description = desc.to_string();
                }
                let targets: Vec<String> =
                    mission.targets().iter().map(|t| t.to_uppercase()).collect();
                if !targets.is_empty() {
                    catalog.keywords = targets;
                }
                let start = mission.start_date().map(start_of_day);
                let stop = mission.stop_date().map(end_of_day);
                if start.is_some() || stop.is_some() {
                    let extent = catalog.extent.get_or_insert_with(Extent::default);
                    let bbox = extent
                        .overall_bbox()
                        .cloned()
                        .unwrap_or_else(|| vec![-180.0, -90.0, 180.0, 90.0]);
                    *extent = Extent::new(bbox, start, stop);
                }
            }
        }
        Level::InstrumentHost => {
            if let Some(host) = &set.instrument_host {
                if let Some(name) = host.host_name() {
                    catalog.title = Some(name.to_string());
                }
                if let Some(desc) = host.description() {
                    catalog.description = desc.to_string();
                }
            }
        }
        Level::Instrument => {
            if let Some(instrument) = &set.instrument {
                if let Some(name) = instrument.instrument_name() {
                    catalog.title = Some(name.to_string());
                }
                if let Some(desc) = instrument.description() {
                    catalog.description = desc.to_string();
                }
            }
        }
        Level::Root => {}
    })?;

    Ok(())
}

fn start_of_day(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

fn end_of_day(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_hms_opt(23, 59, 59).unwrap_or_default().and_utc()
}
