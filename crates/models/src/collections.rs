use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::json::{self, DecodeError};
use crate::stac;
use crate::Fingerprint;

/// One row of the ODE discovery (`query=iipt`) endpoint: an instrument
/// host / instrument / product type tuple together with the counts and
/// footprint validity that decide whether the collection is worth
/// harvesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    /// Target body, e.g. `Mars`. The service names this after the metadata
    /// database the tuple lives in.
    #[serde(rename = "ODEMetaDB")]
    pub target: String,

    #[serde(rename = "IHID")]
    pub instrument_host_id: String,

    #[serde(rename = "IHName", default)]
    pub instrument_host_name: String,

    #[serde(rename = "IID")]
    pub instrument_id: String,

    #[serde(rename = "IName", default)]
    pub instrument_name: String,

    #[serde(rename = "PT", default)]
    pub product_type: String,

    #[serde(rename = "DataSetId")]
    pub dataset_id: String,

    #[serde(rename = "NumberProducts", deserialize_with = "json::count", default)]
    pub number_products: u64,

    /// `"T"` when the service holds valid footprints for the data set.
    #[serde(rename = "ValidFootprints", default)]
    pub valid_footprints: String,

    #[serde(
        rename = "MinObservationTime",
        deserialize_with = "json::utc_time",
        serialize_with = "json::serialize_utc_time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub min_observation_time: Option<DateTime<Utc>>,

    #[serde(
        rename = "MaxObservationTime",
        deserialize_with = "json::utc_time",
        serialize_with = "json::serialize_utc_time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_observation_time: Option<DateTime<Utc>>,

    #[serde(
        rename = "WesternLongitude",
        deserialize_with = "json::float",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub western_longitude: Option<f64>,

    #[serde(
        rename = "EasternLongitude",
        deserialize_with = "json::float",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub eastern_longitude: Option<f64>,

    #[serde(
        rename = "MinLatitude",
        deserialize_with = "json::float",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub min_latitude: Option<f64>,

    #[serde(
        rename = "MaxLatitude",
        deserialize_with = "json::float",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_latitude: Option<f64>,

    /// Identifier of the archive volume the data set is published on, when
    /// the service knows it.
    #[serde(rename = "PDSVolumeId", default, skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<String>,

    /// Template of the records endpoint for this data set, when advertised.
    #[serde(rename = "ProductsURL", default, skip_serializing_if = "Option::is_none")]
    pub products_url: Option<String>,
}

impl CollectionDescriptor {
    /// The mission name the fingerprint is keyed on. The discovery endpoint
    /// carries no mission column; the host's long name stands in until the
    /// PDS3 mission catalog enriches it.
    pub fn mission_name(&self) -> &str {
        if self.instrument_host_name.trim().is_empty() {
            &self.instrument_host_id
        } else {
            &self.instrument_host_name
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(
            &self.target,
            self.mission_name(),
            &self.instrument_host_id,
            &self.instrument_id,
            &self.dataset_id,
        )
    }

    /// A collection is retained iff the service holds valid footprints for
    /// it and it contains at least one product.
    pub fn is_georeferenced(&self) -> bool {
        let truthy = matches!(
            self.valid_footprints.trim().to_ascii_uppercase().as_str(),
            "T" | "TRUE" | "Y" | "YES" | "1"
        );
        truthy && self.number_products > 0
    }

    /// Number of record pages at the given page size.
    pub fn page_count(&self, page_size: u64) -> u64 {
        if page_size == 0 {
            return 0;
        }
        (self.number_products + page_size - 1) / page_size
    }

    /// Bounding box `[west, south, east, north]`; the whole body when the
    /// service advertises no bounds.
    pub fn bbox(&self) -> [f64; 4] {
        [
            self.western_longitude.unwrap_or(-180.0),
            self.min_latitude.unwrap_or(-90.0),
            self.eastern_longitude.unwrap_or(180.0),
            self.max_latitude.unwrap_or(90.0),
        ]
    }

    /// Projects the descriptor into the shallow STAC collection document,
    /// before any PDS3 enrichment.
    pub fn to_stac_collection(&self) -> stac::Collection {
        let fp = self.fingerprint();
        let title = if self.instrument_name.trim().is_empty() {
            self.dataset_id.clone()
        } else {
            format!("{} - {}", self.dataset_id, self.instrument_name)
        };
        let mut collection = stac::Collection::new(
            fp.collection_id(),
            format!(
                "Products of data set {} ({} / {}), harvested from the ODE service.",
                self.dataset_id, self.instrument_host_id, self.instrument_id
            ),
        );
        collection.title = Some(title);
        collection.keywords = vec![
            self.target.to_uppercase(),
            self.instrument_host_id.clone(),
            self.instrument_id.clone(),
        ];
        collection.extent = stac::Extent::new(
            self.bbox().to_vec(),
            self.min_observation_time,
            self.max_observation_time,
        );
        collection
    }
}

/// Envelope of the discovery endpoint.
#[derive(Debug, Deserialize)]
pub struct DiscoveryResponse {
    #[serde(rename = "ODEResults")]
    results: DiscoveryResults,
}

#[derive(Debug, Deserialize)]
struct DiscoveryResults {
    #[serde(rename = "Status", default)]
    status: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "IIPTSets", default)]
    iipt_sets: Option<IiptSets>,
}

#[derive(Debug, Deserialize)]
struct IiptSets {
    #[serde(rename = "IIPTSet", deserialize_with = "json::one_or_many", default)]
    sets: Vec<CollectionDescriptor>,
}

impl DiscoveryResponse {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let response: DiscoveryResponse = serde_json::from_slice(bytes)?;
        if let Some(status) = response.results.status.as_deref() {
            if !status.eq_ignore_ascii_case("success") {
                let message = response
                    .results
                    .error
                    .clone()
                    .unwrap_or_else(|| status.to_string());
                return Err(DecodeError::Service(message));
            }
        }
        Ok(response)
    }

    /// All descriptors of the response, in service order.
    pub fn into_descriptors(self) -> impl Iterator<Item = CollectionDescriptor> {
        self.results
            .iipt_sets
            .map(|s| s.sets)
            .unwrap_or_default()
            .into_iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn descriptor(valid: &str, products: u64) -> CollectionDescriptor {
        serde_json::from_value(serde_json::json!({
            "ODEMetaDB": "Mars",
            "IHID": "MGS",
            "IHName": "Mars Global Surveyor",
            "IID": "MOLA",
            "IName": "Mars Orbiter Laser Altimeter",
            "PT": "PEDR",
            "DataSetId": "MGS-M-MOLA-3-PEDR-L1A-V1.0",
            "NumberProducts": products,
            "ValidFootprints": valid,
        }))
        .unwrap()
    }

    #[test]
    fn georeferenced_requires_valid_footprints_and_products() {
        assert!(descriptor("T", 1000).is_georeferenced());
        assert!(!descriptor("T", 0).is_georeferenced());
        assert!(!descriptor("F", 1000).is_georeferenced());
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(10, descriptor("T", 1000).page_count(100));
        assert_eq!(11, descriptor("T", 1001).page_count(100));
        assert_eq!(1, descriptor("T", 1).page_count(100));
        assert_eq!(0, descriptor("T", 0).page_count(100));
    }

    #[test]
    fn discovery_envelope_decodes_and_reports_service_errors() {
        let body = serde_json::json!({
            "ODEResults": {
                "Status": "Success",
                "IIPTSets": {
                    "IIPTSet": {
                        "ODEMetaDB": "Mars",
                        "IHID": "MGS",
                        "IID": "MOLA",
                        "DataSetId": "MGS-M-MOLA-3-PEDR-L1A-V1.0",
                        "NumberProducts": "1000",
                        "ValidFootprints": "T"
                    }
                }
            }
        });
        let response = DiscoveryResponse::decode(body.to_string().as_bytes()).unwrap();
        let descriptors: Vec<_> = response.into_descriptors().collect();
        assert_eq!(1, descriptors.len());
        assert_eq!(1000, descriptors[0].number_products);

        let err = DiscoveryResponse::decode(
            br#"{"ODEResults": {"Status": "Error", "Error": "no such database"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no such database"));
    }

    #[test]
    fn descriptors_round_trip_through_their_canonical_json() {
        let before = descriptor("T", 1000);
        let encoded = serde_json::to_string(&before).unwrap();
        let after: CollectionDescriptor = serde_json::from_str(&encoded).unwrap();
        assert_eq!(before, after);
    }
}
