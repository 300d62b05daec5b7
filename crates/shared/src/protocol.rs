use serde::{Deserialize, Serialize};

use crate::domain::{DatasetMode, SearchMode};

/// One page of a server-paginated collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionPage<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "snake_case")]
pub enum DatasetSource {
    Existing { database: String },
    Urls { urls: Vec<String> },
    Sparql { sparql: String },
    Upload {},
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatasetRequest {
    pub name: String,
    pub description: String,
    pub source: DatasetSource,
    pub search_mode: SearchMode,
    pub mode: DatasetMode,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn source_is_tagged_by_source_type() {
        let body = CreateDatasetRequest {
            name: "cats".into(),
            description: String::new(),
            source: DatasetSource::Urls {
                urls: vec!["https://example.org/cats.ttl".into()],
            },
            search_mode: SearchMode::Local,
            mode: DatasetMode::Local,
        };
        assert_eq!(
            serde_json::to_value(&body).expect("encode"),
            json!({
                "name": "cats",
                "description": "",
                "source": {"source_type": "urls", "urls": ["https://example.org/cats.ttl"]},
                "search_mode": "LOCAL",
                "mode": "LOCAL",
            })
        );
    }

    #[test]
    fn upload_source_serializes_to_bare_tag() {
        assert_eq!(
            serde_json::to_string(&DatasetSource::Upload {}).expect("encode"),
            r#"{"source_type":"upload"}"#
        );
    }

    #[test]
    fn page_count_defaults_to_zero() {
        let page: CollectionPage<serde_json::Value> =
            serde_json::from_value(json!({"results": []})).expect("decode");
        assert_eq!(page.count, 0);
    }
}
