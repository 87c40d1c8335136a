use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::json::{self, DecodeError};
use crate::stac;

/// One page of the ODE records endpoint, decoded from the raw JSON the
/// extract phase persisted verbatim.
#[derive(Debug, Deserialize)]
pub struct RecordPage {
    #[serde(rename = "ODEResults")]
    results: RecordResults,
}

#[derive(Debug, Deserialize)]
struct RecordResults {
    #[serde(rename = "Status", default)]
    status: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "Count", deserialize_with = "json::count", default)]
    count: u64,
    #[serde(rename = "Products", default)]
    products: Option<Products>,
}

#[derive(Debug, Deserialize)]
struct Products {
    #[serde(rename = "Product", deserialize_with = "json::one_or_many", default)]
    records: Vec<Record>,
}

impl RecordPage {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let page: RecordPage = serde_json::from_slice(bytes)?;
        if let Some(status) = page.results.status.as_deref() {
            if !status.eq_ignore_ascii_case("success") {
                let message = page.results.error.clone().unwrap_or_else(|| status.to_string());
                return Err(DecodeError::Service(message));
            }
        }
        Ok(page)
    }

    /// The record count the page header advertises. A complete page holds
    /// exactly this many records.
    pub fn header_count(&self) -> u64 {
        self.results.count
    }

    pub fn records(&self) -> &[Record] {
        self.results.products.as_ref().map(|p| p.records.as_slice()).unwrap_or(&[])
    }

    pub fn into_records(self) -> Vec<Record> {
        self.results.products.map(|p| p.records).unwrap_or_default()
    }

    /// A page is complete when the advertised count matches the records it
    /// actually carries.
    pub fn is_complete(&self) -> bool {
        self.results.count as usize == self.records().len()
    }
}

/// A single observational product: identity, acquisition window, footprint,
/// and the files it is made of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "pdsid")]
    pub product_id: String,

    #[serde(rename = "ode_id", default, skip_serializing_if = "Option::is_none")]
    pub ode_id: Option<String>,

    #[serde(rename = "Data_Set_Id", default)]
    pub dataset_id: String,

    #[serde(rename = "PDSVolume_Id", default, skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<String>,

    #[serde(
        rename = "UTC_start_time",
        deserialize_with = "json::utc_time",
        serialize_with = "json::serialize_utc_time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(
        rename = "UTC_stop_time",
        deserialize_with = "json::utc_time",
        serialize_with = "json::serialize_utc_time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_time: Option<DateTime<Utc>>,

    /// Footprint polygon in WKT, `POLYGON ((lon lat, …))`.
    #[serde(rename = "Footprint_C0_geometry", default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<String>,

    #[serde(
        rename = "Westernmost_longitude",
        deserialize_with = "json::float",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub westernmost_longitude: Option<f64>,

    #[serde(
        rename = "Easternmost_longitude",
        deserialize_with = "json::float",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub easternmost_longitude: Option<f64>,

    #[serde(
        rename = "Minimum_latitude",
        deserialize_with = "json::float",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_latitude: Option<f64>,

    #[serde(
        rename = "Maximum_latitude",
        deserialize_with = "json::float",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub maximum_latitude: Option<f64>,

    #[serde(rename = "Product_files", default, skip_serializing_if = "Option::is_none")]
    product_files: Option<ProductFiles>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
struct ProductFiles {
    #[serde(rename = "Product_file", deserialize_with = "json::one_or_many", default)]
    files: Vec<ProductFile>,
}

/// One physical file of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFile {
    #[serde(rename = "FileName", default)]
    pub file_name: String,

    #[serde(rename = "URL")]
    pub url: String,

    /// Upstream role: `Product`, `Browse`, `Label`, …
    #[serde(rename = "Type", default)]
    pub kind: String,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        rename = "KB",
        deserialize_with = "json::float",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub size_kb: Option<f64>,

    #[serde(rename = "MD5", default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl ProductFile {
    /// Asset role inferred from the upstream file type.
    pub fn roles(&self) -> Vec<String> {
        match self.kind.to_ascii_lowercase().as_str() {
            "browse" | "thumbnail" => vec!["overview".to_string()],
            "label" => vec!["metadata".to_string()],
            _ => vec!["data".to_string()],
        }
    }
}

impl Record {
    pub fn files(&self) -> &[ProductFile] {
        self.product_files.as_ref().map(|f| f.files.as_slice()).unwrap_or(&[])
    }

    /// Bounding box `[west, south, east, north]` from the advertised
    /// bounds, falling back to the footprint's own extremes.
    pub fn bbox(&self) -> Option<[f64; 4]> {
        match (
            self.westernmost_longitude,
            self.minimum_latitude,
            self.easternmost_longitude,
            self.maximum_latitude,
        ) {
            (Some(w), Some(s), Some(e), Some(n)) => Some([w, s, e, n]),
            _ => {
                let rings = self.footprint.as_deref().and_then(parse_wkt_polygon)?;
                let exterior = rings.first()?;
                let mut bbox = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
                for [lon, lat] in exterior {
                    bbox[0] = bbox[0].min(*lon);
                    bbox[1] = bbox[1].min(*lat);
                    bbox[2] = bbox[2].max(*lon);
                    bbox[3] = bbox[3].max(*lat);
                }
                Some(bbox)
            }
        }
    }

    /// GeoJSON geometry of the footprint: the WKT polygon when present,
    /// otherwise the bounding box as a closed ring.
    pub fn geometry(&self) -> Option<serde_json::Value> {
        if let Some(rings) = self.footprint.as_deref().and_then(parse_wkt_polygon) {
            return Some(serde_json::json!({
                "type": "Polygon",
                "coordinates": rings,
            }));
        }
        let [w, s, e, n] = self.bbox()?;
        Some(serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[w, s], [e, s], [e, n], [w, n], [w, s]]],
        }))
    }

    /// Projects the record into the STAC item emitted under the
    /// collection's `items/` directory.
    pub fn to_stac_item(&self, collection_id: &str) -> stac::Item {
        let mut item = stac::Item::new(crate::slug(&self.product_id));
        item.collection = Some(collection_id.to_string());
        item.geometry = self.geometry();
        item.bbox = self.bbox().map(|b| b.to_vec());
        item.properties.datetime = self.start_time;
        item.properties.start_datetime = self.start_time;
        item.properties.end_datetime = self.stop_time;
        item.properties
            .extra
            .insert("pds:product_id".to_string(), serde_json::json!(self.product_id));
        if let Some(volume) = &self.volume_id {
            item.properties
                .extra
                .insert("pds:volume_id".to_string(), serde_json::json!(volume));
        }

        for file in self.files() {
            let key = if file.file_name.trim().is_empty() {
                crate::slug(file.url.rsplit('/').next().unwrap_or(&file.url))
            } else {
                crate::slug(&file.file_name)
            };
            if key.is_empty() || item.assets.contains_key(&key) {
                continue;
            }
            item.assets.insert(
                key,
                stac::Asset {
                    href: file.url.clone(),
                    title: Some(file.file_name.clone()).filter(|n| !n.trim().is_empty()),
                    description: file.description.clone(),
                    media_type: Some(stac::media_type_for_path(&file.file_name).to_string()),
                    roles: file.roles(),
                },
            );
        }
        item
    }
}

/// Parses `POLYGON ((lon lat, …), (…))` into rings of `[lon, lat]` pairs.
/// Anything else (MULTIPOLYGON, malformed text) yields `None`; callers fall
/// back to the record's bounding box.
fn parse_wkt_polygon(wkt: &str) -> Option<Vec<Vec<[f64; 2]>>> {
    let trimmed = wkt.trim();
    let upper = trimmed.to_ascii_uppercase();
    let body = upper.strip_prefix("POLYGON")?;
    // Work on the original text at the same offset to preserve digits.
    let body = trimmed[trimmed.len() - body.len()..].trim();
    let body = body.strip_prefix('(')?.strip_suffix(')')?;

    let mut rings = Vec::new();
    for ring_text in body.split("),") {
        let ring_text = ring_text.trim().trim_start_matches('(').trim_end_matches(')');
        let mut ring = Vec::new();
        for pair in ring_text.split(',') {
            let mut coords = pair.split_whitespace();
            let lon: f64 = coords.next()?.parse().ok()?;
            let lat: f64 = coords.next()?.parse().ok()?;
            ring.push([lon, lat]);
        }
        if ring.len() < 4 {
            return None;
        }
        rings.push(ring);
    }
    if rings.is_empty() {
        None
    } else {
        Some(rings)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page_json() -> serde_json::Value {
        serde_json::json!({
            "ODEResults": {
                "Status": "Success",
                "Count": "2",
                "Products": {
                    "Product": [
                        {
                            "pdsid": "AP00001L",
                            "Data_Set_Id": "MGS-M-MOLA-3-PEDR-L1A-V1.0",
                            "PDSVolume_Id": "MGSL_21XX",
                            "UTC_start_time": "1997-09-15T19:10:00.000",
                            "UTC_stop_time": "1997-09-15T19:27:52.000",
                            "Footprint_C0_geometry":
                                "POLYGON ((10.0 -5.0, 12.0 -5.0, 12.0 -3.0, 10.0 -3.0, 10.0 -5.0))",
                            "Product_files": {
                                "Product_file": [
                                    {
                                        "FileName": "AP00001L.B",
                                        "URL": "https://pds-geosciences.wustl.edu/mgsl_21xx/ap00001l.b",
                                        "Type": "Product",
                                        "KB": "312"
                                    },
                                    {
                                        "FileName": "AP00001L.LBL",
                                        "URL": "https://pds-geosciences.wustl.edu/mgsl_21xx/ap00001l.lbl",
                                        "Type": "Label"
                                    }
                                ]
                            }
                        },
                        {
                            "pdsid": "AP00002L",
                            "UTC_start_time": "1997-09-15T21:00:00.000",
                            "Westernmost_longitude": "20.5",
                            "Easternmost_longitude": "22.5",
                            "Minimum_latitude": "-10",
                            "Maximum_latitude": "-8",
                            "Product_files": {
                                "Product_file": {
                                    "FileName": "AP00002L.B",
                                    "URL": "https://pds-geosciences.wustl.edu/mgsl_21xx/ap00002l.b",
                                    "Type": "Product"
                                }
                            }
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn pages_decode_with_one_or_many_files() {
        let page = RecordPage::decode(page_json().to_string().as_bytes()).unwrap();
        assert!(page.is_complete());
        assert_eq!(2, page.records().len());
        assert_eq!(2, page.records()[0].files().len());
        assert_eq!(1, page.records()[1].files().len());
    }

    #[test]
    fn wkt_footprints_become_geojson_polygons() {
        let page = RecordPage::decode(page_json().to_string().as_bytes()).unwrap();
        let record = &page.records()[0];
        assert_eq!(Some([10.0, -5.0, 12.0, -3.0]), record.bbox());
        let geometry = record.geometry().unwrap();
        assert_eq!("Polygon", geometry["type"]);
        assert_eq!(
            serde_json::json!([[[10.0, -5.0], [12.0, -5.0], [12.0, -3.0], [10.0, -3.0], [10.0, -5.0]]]),
            geometry["coordinates"]
        );
    }

    #[test]
    fn records_without_footprints_fall_back_to_bounds() {
        let page = RecordPage::decode(page_json().to_string().as_bytes()).unwrap();
        let record = &page.records()[1];
        assert_eq!(Some([20.5, -10.0, 22.5, -8.0]), record.bbox());
        assert!(record.geometry().is_some());
    }

    #[test]
    fn items_carry_assets_with_roles_and_media_types() {
        let page = RecordPage::decode(page_json().to_string().as_bytes()).unwrap();
        let item = page.records()[0].to_stac_item("mgs-m-mola-3-pedr-l1a-v1-0");
        assert_eq!("ap00001l", item.id);
        assert_eq!(Some("mgs-m-mola-3-pedr-l1a-v1-0".to_string()), item.collection);
        assert_eq!(2, item.assets.len());

        let label = &item.assets["ap00001l-lbl"];
        assert_eq!(vec!["metadata".to_string()], label.roles);
        assert_eq!(Some("text/plain".to_string()), label.media_type);
        assert_eq!(
            "1997-09-15T19:10:00+00:00",
            item.properties.datetime.unwrap().to_rfc3339()
        );
    }

    #[test]
    fn truncated_wkt_is_rejected() {
        assert!(parse_wkt_polygon("POLYGON ((10 20, 30 40").is_none());
        assert!(parse_wkt_polygon("LINESTRING (10 20, 30 40)").is_none());
        assert!(parse_wkt_polygon("POLYGON ((10 20, 30 40, 50 60))").is_none());
    }
}
