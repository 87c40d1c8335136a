//! STAC 1.0.0 documents as they are written to disk: catalogs, collections,
//! items, links, and assets. Only the fields this pipeline emits are
//! modeled; unknown fields on documents read back from disk are preserved
//! through the `extra` maps so that a rewrite never loses them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STAC_VERSION: &str = "1.0.0";

/// Relation types used inside the managed tree.
pub mod rel {
    pub const ROOT: &str = "root";
    pub const PARENT: &str = "parent";
    pub const CHILD: &str = "child";
    pub const ITEM: &str = "item";
    pub const SELF: &str = "self";
    pub const COLLECTION: &str = "collection";
}

/// A catalog node of the tree: the root, a mission, an instrument host, or
/// an instrument. Parent nodes additionally carry the union of their
/// children's extents, which plain STAC catalogs do not model; the field is
/// omitted from serialization while empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "type")]
    pub type_: String,

    pub stac_version: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Catalog {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            type_: "Catalog".to_string(),
            stac_version: STAC_VERSION.to_string(),
            id: id.into(),
            title: None,
            description: description.into(),
            keywords: Vec::new(),
            extent: None,
            links: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// The collection document of a data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "type")]
    pub type_: String,

    pub stac_version: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    pub license: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<Provider>,

    pub extent: Extent,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Collection {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            type_: "Collection".to_string(),
            stac_version: STAC_VERSION.to_string(),
            id: id.into(),
            title: None,
            description: description.into(),
            keywords: Vec::new(),
            license: "proprietary".to_string(),
            providers: Vec::new(),
            extent: Extent::default(),
            links: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// One STAC item, a GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub type_: String,

    pub stac_version: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(default)]
    pub geometry: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    pub properties: ItemProperties,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            type_: "Feature".to_string(),
            stac_version: STAC_VERSION.to_string(),
            id: id.into(),
            collection: None,
            geometry: None,
            bbox: None,
            properties: ItemProperties::default(),
            links: Vec::new(),
            assets: BTreeMap::new(),
        }
    }
}

/// Item properties. `datetime` is always serialized, null when unknown, as
/// the STAC item spec requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ItemProperties {
    #[serde(default)]
    pub datetime: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<DateTime<Utc>>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,

    pub href: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn new(rel: &str, href: impl Into<String>) -> Self {
        Self {
            rel: rel.to_string(),
            href: href.into(),
            media_type: Some("application/json".to_string()),
            title: None,
        }
    }

    pub fn root(href: impl Into<String>) -> Self {
        Self::new(rel::ROOT, href)
    }

    pub fn parent(href: impl Into<String>) -> Self {
        Self::new(rel::PARENT, href)
    }

    pub fn child(href: impl Into<String>) -> Self {
        Self::new(rel::CHILD, href)
    }

    pub fn item(href: impl Into<String>) -> Self {
        Self::new(rel::ITEM, href)
    }

    pub fn self_(href: impl Into<String>) -> Self {
        Self::new(rel::SELF, href)
    }

    pub fn collection(href: impl Into<String>) -> Self {
        Self::new(rel::COLLECTION, href)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Spatial and temporal extent of a collection or parent catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub spatial: SpatialExtent,
    pub temporal: TemporalExtent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub bbox: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub interval: Vec<Vec<Option<DateTime<Utc>>>>,
}

impl Default for Extent {
    fn default() -> Self {
        Self::new(vec![-180.0, -90.0, 180.0, 90.0], None, None)
    }
}

impl Extent {
    pub fn new(bbox: Vec<f64>, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            spatial: SpatialExtent { bbox: vec![bbox] },
            temporal: TemporalExtent { interval: vec![vec![start, end]] },
        }
    }

    /// The collection-level bounding box and interval (the first entry of
    /// each list per the STAC collection spec).
    pub fn overall_bbox(&self) -> Option<&Vec<f64>> {
        self.spatial.bbox.first()
    }

    pub fn overall_interval(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self.temporal.interval.first() {
            Some(pair) => (
                pair.first().copied().flatten(),
                pair.get(1).copied().flatten(),
            ),
            None => (None, None),
        }
    }

    /// Widens this extent to also cover `other`. An unknown (open) end of
    /// either interval leaves the union open on that side.
    pub fn union(&mut self, other: &Extent) {
        let ours = match self.spatial.bbox.first().cloned() {
            Some(b) if b.len() == 4 => b,
            _ => vec![-180.0, -90.0, 180.0, 90.0],
        };
        if let Some(theirs) = other.spatial.bbox.first() {
            if theirs.len() == 4 {
                let merged = vec![
                    ours[0].min(theirs[0]),
                    ours[1].min(theirs[1]),
                    ours[2].max(theirs[2]),
                    ours[3].max(theirs[3]),
                ];
                self.spatial.bbox = vec![merged];
            }
        }

        let (our_start, our_end) = self.overall_interval();
        let (their_start, their_end) = other.overall_interval();
        let start = match (our_start, their_start) {
            (Some(a), Some(b)) => Some(a.min(b)),
            _ => None,
        };
        let end = match (our_end, their_end) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        self.temporal.interval = vec![vec![start, end]];
    }

    /// True when `other` lies entirely within this extent. Open ends of
    /// this extent cover everything on that side.
    pub fn covers(&self, other: &Extent) -> bool {
        let (start, end) = self.overall_interval();
        let (other_start, other_end) = other.overall_interval();
        let start_ok = match (start, other_start) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a <= b,
        };
        let end_ok = match (end, other_end) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a >= b,
        };
        start_ok && end_ok
    }
}

/// Media type inferred from a file extension, for assets and links.
pub fn media_type_for_path(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match extension.as_str() {
        "json" => "application/json",
        "xml" => "application/xml",
        "html" | "htm" => "text/html",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "lbl" | "cat" | "txt" | "fmt" | "tab" | "asc" => "text/plain",
        _ => "application/octet-stream",
    }
}
