use std::collections::BTreeMap;

use fetch::{FetchOutcome, FetchPool, FetchRequest, RequestClass};
use models::{CatalogKind, CollectionDescriptor, Record, RecordPage};
use stores::FileStore;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::ExtractError;

lazy_static::lazy_static! {
    /// Anchor tags of the archive's volume index pages. The pages are
    /// plain directory listings, so a regex over `<a href …>text</a>` is
    /// all the structure we rely on.
    static ref ANCHOR: regex::Regex =
        regex::Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*["']?([^"'\s>]+)["']?[^>]*>(.*?)</a>"#)
            .unwrap();

    /// Anchor text that names a file, e.g. `MISSION.CAT` or `VOLDESC.SFD`.
    static ref FILE_NAME: regex::Regex =
        regex::Regex::new(r"(?i)^[A-Z0-9_]+\.(CAT|SFD|TXT)$").unwrap();
}

/// Composes the volume index URL for a collection from one of its fetched
/// records: the record's first product-file URL, truncated at the volume
/// identifier segment, with the volume's `catalog` directory appended.
pub fn volume_index_url(record: &Record) -> Option<Url> {
    let volume_id = record.volume_id.as_deref()?;
    let file_url: Url = record.files().first()?.url.parse().ok()?;

    let segments: Vec<&str> = file_url.path_segments()?.collect();
    let volume_at = segments.iter().position(|s| s.eq_ignore_ascii_case(volume_id))?;

    let mut url = file_url.clone();
    {
        let mut path = url.path_segments_mut().ok()?;
        path.clear();
        for segment in &segments[..=volume_at] {
            path.push(segment);
        }
        path.push("catalog");
        // Trailing slash, so relative hrefs resolve inside the directory.
        path.push("");
    }
    url.set_query(None);
    Some(url)
}

/// Picks the catalog-object anchors off a volume index page. Matching is
/// case-insensitive against the catalog roster, the first occurrence of
/// each kind wins, and anchors that are not catalog files are ignored.
pub fn scrape_catalog_anchors(html: &str, base: &Url) -> Vec<(CatalogKind, String, Url)> {
    let mut found: BTreeMap<CatalogKind, (String, Url)> = BTreeMap::new();

    for capture in ANCHOR.captures_iter(html) {
        let href = capture.get(1).map(|m| m.as_str()).unwrap_or("");
        let text = capture.get(2).map(|m| m.as_str()).unwrap_or("").trim();

        if !FILE_NAME.is_match(text) {
            continue;
        }
        let Some(kind) = CatalogKind::from_filename(text) else {
            continue;
        };
        let Ok(url) = base.join(href) else {
            tracing::debug!(href, "anchor href does not resolve; ignoring");
            continue;
        };
        found.entry(kind).or_insert_with(|| (text.to_lowercase(), url));
    }

    found
        .into_iter()
        .map(|(kind, (name, url))| (kind, name, url))
        .collect()
}

/// Scrapes a collection's volume index page and downloads its PDS3
/// catalog objects into the collection's `pds3/` directory.
#[tracing::instrument(level = "info", skip_all, fields(dataset = %descriptor.dataset_id))]
pub async fn extract_pds3(
    pool: &FetchPool,
    files: &FileStore,
    descriptor: &CollectionDescriptor,
    events: Option<UnboundedSender<fetch::FetchEvent>>,
    cancel: &CancellationToken,
) -> Result<FetchOutcome, ExtractError> {
    let fingerprint = descriptor.fingerprint();

    // Any fetched record names the volume; take the first one on disk.
    let record = first_record(files, &fingerprint)?
        .ok_or_else(|| ExtractError::NoRecords(fingerprint.to_string()))?;

    let index_url = volume_index_url(&record)
        .ok_or_else(|| ExtractError::NoVolume(fingerprint.to_string()))?;
    tracing::info!(url = %index_url, "fetching volume index page");

    let html_bytes = pool.fetch_bytes(&index_url, cancel).await?;
    let html = String::from_utf8_lossy(&html_bytes);
    let anchors = scrape_catalog_anchors(&html, &index_url);
    if anchors.is_empty() {
        tracing::warn!(url = %index_url, "volume index page lists no catalog objects");
    }

    let requests: Vec<FetchRequest> = anchors
        .into_iter()
        .map(|(kind, name, url)| {
            tracing::debug!(%kind, name, %url, "catalog object located");
            FetchRequest {
                url,
                dest: files.pds3_path(&fingerprint, &name),
                expected_len: None,
                class: RequestClass::Pds3Text,
            }
        })
        .collect();

    Ok(pool.fetch_all(requests, events, cancel).await)
}

/// The first record of the first complete page on disk.
fn first_record(
    files: &FileStore,
    fingerprint: &models::Fingerprint,
) -> Result<Option<Record>, ExtractError> {
    for (_, path) in files.list_pages(fingerprint)? {
        let bytes = std::fs::read(&path).map_err(|source| {
            stores::StoreError::Io { path: path.display().to_string(), source }
        })?;
        match RecordPage::decode(&bytes) {
            Ok(page) => {
                if let Some(record) = page.into_records().into_iter().next() {
                    return Ok(Some(record));
                }
            }
            Err(error) => {
                tracing::warn!(page = %path.display(), %error, "skipping undecodable page");
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(volume_id: &str, file_url: &str) -> Record {
        serde_json::from_value(serde_json::json!({
            "pdsid": "AP00001L",
            "PDSVolume_Id": volume_id,
            "Product_files": {
                "Product_file": { "FileName": "AP00001L.B", "URL": file_url, "Type": "Product" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn volume_index_url_truncates_at_the_volume_segment() {
        let record = record(
            "MGSL_21XX",
            "https://pds-geosciences.wustl.edu/mgs/mgsl_21xx/pedr/ap00001l.b",
        );
        assert_eq!(
            "https://pds-geosciences.wustl.edu/mgs/mgsl_21xx/catalog/",
            volume_index_url(&record).unwrap().as_str()
        );
    }

    #[test]
    fn records_without_a_matching_segment_yield_none() {
        let record = record("OTHER_VOL", "https://host.example/a/b/c.b");
        assert!(volume_index_url(&record).is_none());
    }

    #[test]
    fn scraping_keeps_the_first_of_each_kind_and_ignores_noise() {
        let base: Url = "https://host.example/mgsl_21xx/catalog/".parse().unwrap();
        let html = r#"
<html><body>
<a href="/icons/blank.gif">[   ]</a>
<a href="AAREADME.TXT">AAREADME.TXT</a>
<a href="MISSION.CAT">MISSION.CAT</a>
<a href="mission2.cat">MISSION2.CAT</a>
<a href='INST.CAT'>inst.cat</a>
<a href="PERSON.CAT">PERSON.CAT</a>
<a href="somewhere/else.html">Dataset description</a>
</body></html>
"#;
        let anchors = scrape_catalog_anchors(html, &base);
        let kinds: Vec<CatalogKind> = anchors.iter().map(|(k, _, _)| *k).collect();
        assert_eq!(
            vec![CatalogKind::Mission, CatalogKind::Instrument, CatalogKind::Personnel],
            kinds
        );

        let mission = anchors.iter().find(|(k, _, _)| *k == CatalogKind::Mission).unwrap();
        assert_eq!("mission.cat", mission.1);
        assert_eq!("https://host.example/mgsl_21xx/catalog/MISSION.CAT", mission.2.as_str());
    }
}
