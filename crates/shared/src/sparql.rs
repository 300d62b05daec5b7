use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    Literal,
    Uri,
    Bnode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Term {
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Uri,
            value: value.into(),
            lang: None,
        }
    }

    pub fn literal(value: impl Into<String>, lang: Option<&str>) -> Self {
        Self {
            kind: TermKind::Literal,
            value: value.into(),
            lang: lang.map(str::to_string),
        }
    }
}

pub fn term_to_sparql(term: &Term) -> String {
    match term.kind {
        TermKind::Literal => {
            let quoted = format!("\"{}\"", escape_literal(&term.value));
            match term.lang.as_deref().filter(|lang| !lang.is_empty()) {
                Some(lang) => format!("{quoted}@{lang}"),
                None => quoted,
            }
        }
        TermKind::Uri => format!("<{}>", term.value),
        TermKind::Bnode => format!("_:{}", term.value),
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    pub name: &'static str,
    pub iri: &'static str,
}

impl Prefix {
    pub fn term(&self, local: &str) -> Term {
        Term::uri(format!("{}{local}", self.iri))
    }

    pub fn declaration(&self) -> String {
        format!("PREFIX {}: <{}>", self.name, self.iri)
    }
}

pub const RDF: Prefix = Prefix {
    name: "rdf",
    iri: "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
};
pub const RDFS: Prefix = Prefix {
    name: "rdfs",
    iri: "http://www.w3.org/2000/01/rdf-schema#",
};
pub const OWL: Prefix = Prefix {
    name: "owl",
    iri: "http://www.w3.org/2002/07/owl#",
};

pub const PREFIXES: [Prefix; 3] = [RDF, RDFS, OWL];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum CellOutput {
    ExecuteResult {
        data: Map<String, Value>,
    },
    Error {
        #[serde(default)]
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Error)]
pub enum SparqlError {
    #[error("invalid result payload for {content_type}: {source}")]
    InvalidPayload {
        content_type: String,
        source: serde_json::Error,
    },
}

/// Decodes the result set carried by an `execute_result` output.
pub fn extract_sparql_result(output: &CellOutput) -> Result<Option<Value>, SparqlError> {
    let CellOutput::ExecuteResult { data } = output else {
        return Ok(None);
    };
    let entry = match data.get(SPARQL_RESULTS_JSON) {
        Some(payload) => Some((SPARQL_RESULTS_JSON, payload)),
        None => data.iter().next().map(|(key, payload)| (key.as_str(), payload)),
    };
    let Some((content_type, payload)) = entry else {
        return Ok(None);
    };

    match payload {
        Value::String(raw) => serde_json::from_str(raw).map(Some).map_err(|source| {
            SparqlError::InvalidPayload {
                content_type: content_type.to_string(),
                source,
            }
        }),
        other => Ok(Some(other.clone())),
    }
}
