use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_newtype!(DatasetId);
id_newtype!(TermId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchMode {
    #[default]
    Local,
    Wikidata,
}

impl SearchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Wikidata => "WIKIDATA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatasetMode {
    #[default]
    Local,
    Sparql,
}

impl DatasetMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Sparql => "SPARQL",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub search_mode: Option<SearchMode>,
    #[serde(default)]
    pub mode: Option<DatasetMode>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Match statistics for one dataset in a discovery search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    pub dataset_id: DatasetId,
    pub dataset_name: String,
    pub triples_matched: (u64, u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredTerm {
    pub id: TermId,
    pub dataset_id: DatasetId,
    pub dataset_name: String,
    pub term: String,
}

/// Row returned by the discovery endpoint: a dataset plus the triples that
/// matched the active term filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRow {
    pub id: DatasetId,
    pub name: String,
    #[serde(default)]
    pub terms: Vec<DiscoveredTerm>,
}

impl DiscoveryRow {
    pub fn terms_summary(&self) -> String {
        self.terms
            .iter()
            .map(|t| t.term.as_str())
            .collect::<Vec<_>>()
            .join(". ")
    }
}

/// Leading segment of a UUID, used where the full identifier is too wide.
pub fn format_uuid_short(value: &str) -> &str {
    value.split('-').next().unwrap_or(value)
}
