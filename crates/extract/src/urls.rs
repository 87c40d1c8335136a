use models::CollectionDescriptor;
use url::Url;

/// URL templates of the ODE service. The same host serves discovery and
/// record listings; only the query differs.
#[derive(Debug, Clone)]
pub struct OdeEndpoints {
    base: Url,
}

impl OdeEndpoints {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// The discovery endpoint (`query=iipt`), optionally scoped to one
    /// planet's metadata database.
    pub fn discovery(&self, planet: Option<&str>) -> Url {
        let mut url = self.base.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("query", "iipt").append_pair("output", "JSON");
            if let Some(planet) = planet {
                query.append_pair("odemetadb", planet);
            }
        }
        url
    }

    /// One page of the records endpoint, parameterized by dataset and
    /// offset.
    pub fn records(&self, descriptor: &CollectionDescriptor, offset: u64, limit: u64) -> Url {
        let mut url = self.base.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("query", "product")
                .append_pair("results", "opmf")
                .append_pair("output", "JSON")
                .append_pair("odemetadb", &descriptor.target)
                .append_pair("ihid", &descriptor.instrument_host_id)
                .append_pair("iid", &descriptor.instrument_id)
                .append_pair("pt", &descriptor.product_type)
                .append_pair("dsid", &descriptor.dataset_id)
                .append_pair("offset", &offset.to_string())
                .append_pair("limit", &limit.to_string());
        }
        url
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn endpoints() -> OdeEndpoints {
        OdeEndpoints::new("https://oderest.example.org/live2/".parse().unwrap())
    }

    #[test]
    fn discovery_url_carries_the_planet_filter() {
        let url = endpoints().discovery(Some("Mars"));
        assert_eq!("https://oderest.example.org/live2/?query=iipt&output=JSON&odemetadb=Mars", url.as_str());

        let url = endpoints().discovery(None);
        assert!(!url.as_str().contains("odemetadb"));
    }

    #[test]
    fn records_url_pages_by_offset() {
        let descriptor: CollectionDescriptor = serde_json::from_value(serde_json::json!({
            "ODEMetaDB": "Mars",
            "IHID": "MGS",
            "IID": "MOLA",
            "PT": "PEDR",
            "DataSetId": "MGS-M-MOLA-3-PEDR-L1A-V1.0",
            "NumberProducts": 1000,
            "ValidFootprints": "T",
        }))
        .unwrap();

        let url = endpoints().records(&descriptor, 200, 100);
        let query = url.query().unwrap();
        assert!(query.contains("query=product"));
        assert!(query.contains("ihid=MGS"));
        assert!(query.contains("offset=200"));
        assert!(query.contains("limit=100"));
    }
}
