use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use shared::{
    domain::{DatasetMode, SearchMode},
    protocol::{CreateDatasetRequest, DatasetSource},
};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    api::ApiClient,
    error::{ClientError, ClientResult},
    notification::Notifier,
};

pub const DATASETS_ENDPOINT: &str = "/datasets/";
pub const WIKIDATA_ENTITY_DATA_URL: &str = "https://www.wikidata.org/wiki/Special:EntityData";

pub const ACCEPTED_UPLOAD_EXTENSIONS: &[&str] = &[
    "rdf", "xml", "rdfxml", "owl", "ttl", "turtle", "trig", "trix", "nt", "nq", "json", "ld",
    "jsonld", "sms", "zip", "gz", "bz2",
];

const CREATED_MESSAGE: &str = "Dataset scheduled for creation";
const FAILED_MESSAGE: &str = "Error creating dataset";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    #[default]
    Existing,
    Urls,
    Sparql,
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlMode {
    #[default]
    Raw,
    Wikidata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WikidataItem {
    Entity,
    Property,
}

impl WikidataItem {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Entity => "Q",
            Self::Property => "P",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatasetForm {
    pub name: String,
    pub description: String,
    pub database: String,
    /// Newline separated URLs, or a WikiData identifier.
    pub source: String,
    pub sparql: String,
    pub search_mode: SearchMode,
    pub files: Vec<PathBuf>,
    pub mode: SourceMode,
    pub url_mode: UrlMode,
    pub wikidata_item: Option<WikidataItem>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Select the type of WikiData item to query")]
    MissingWikidataItem,
    #[error("Select at least one file to upload")]
    NoFiles,
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),
}

#[derive(Debug, Clone)]
pub enum CreatePayload {
    Json(CreateDatasetRequest),
    Upload(UploadRequest),
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub name: String,
    pub description: String,
    pub search_mode: SearchMode,
    pub files: Vec<PathBuf>,
}

impl UploadRequest {
    pub async fn into_form(self) -> ClientResult<Form> {
        let source = serde_json::to_string(&DatasetSource::Upload {})?;
        let mut form = Form::new()
            .text("name", self.name)
            .text("description", self.description)
            .text("source", source);
        for path in self.files {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| ClientError::Io {
                    path: path.clone(),
                    source,
                })?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            form = form.part("files", Part::bytes(bytes).file_name(file_name));
        }
        Ok(form
            .text("search_mode", self.search_mode.as_str())
            .text("mode", DatasetMode::Local.as_str()))
    }
}

/// Entity-data URL for a bare WikiData identifier. Values that already look
/// like URLs are returned unchanged.
pub fn wikidata_source_url(source: &str, item: WikidataItem) -> String {
    if source.starts_with("http") {
        return source.to_string();
    }
    format!(
        "{WIKIDATA_ENTITY_DATA_URL}?id={}{}&format=rdf",
        item.prefix(),
        source.trim()
    )
}

fn split_urls(source: &str) -> Vec<String> {
    source
        .split(|c: char| c == '\r' || c == '\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_accepted_upload(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| ACCEPTED_UPLOAD_EXTENSIONS.contains(&ext.as_str()))
}

impl DatasetForm {
    pub fn build(&self) -> Result<CreatePayload, FormError> {
        let source = match self.mode {
            SourceMode::Upload => return self.build_upload(),
            SourceMode::Existing => DatasetSource::Existing {
                database: self.database.clone(),
            },
            SourceMode::Urls => {
                let raw = match self.url_mode {
                    UrlMode::Raw => self.source.clone(),
                    UrlMode::Wikidata => {
                        let item = self.wikidata_item.ok_or(FormError::MissingWikidataItem)?;
                        wikidata_source_url(&self.source, item)
                    }
                };
                DatasetSource::Urls {
                    urls: split_urls(&raw),
                }
            }
            SourceMode::Sparql => DatasetSource::Sparql {
                sparql: self.sparql.clone(),
            },
        };

        Ok(CreatePayload::Json(CreateDatasetRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            source,
            search_mode: self.search_mode,
            mode: match self.mode {
                SourceMode::Sparql => DatasetMode::Sparql,
                _ => DatasetMode::Local,
            },
        }))
    }

    fn build_upload(&self) -> Result<CreatePayload, FormError> {
        if self.files.is_empty() {
            return Err(FormError::NoFiles);
        }
        if let Some(rejected) = self.files.iter().find(|p| !is_accepted_upload(p)) {
            return Err(FormError::UnsupportedFile(rejected.display().to_string()));
        }
        Ok(CreatePayload::Upload(UploadRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            search_mode: self.search_mode,
            files: self.files.clone(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Failed(String),
}

pub struct DatasetCreator {
    client: ApiClient,
    notifier: Notifier,
    endpoint: String,
}

impl DatasetCreator {
    pub fn new(client: ApiClient, notifier: Notifier) -> Self {
        Self {
            client,
            notifier,
            endpoint: DATASETS_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Submits the form. Only `201 Created` counts as success; the form can be
    /// resubmitted after any failure.
    pub async fn submit(&self, form: &DatasetForm) -> CreateOutcome {
        let payload = match form.build() {
            Ok(payload) => payload,
            Err(err) => {
                let message = err.to_string();
                self.notifier.error(message.clone());
                return CreateOutcome::Failed(message);
            }
        };

        match self.send(payload).await {
            Ok(201) => {
                info!(name = %form.name, "dataset scheduled for creation");
                self.notifier.success(CREATED_MESSAGE);
                CreateOutcome::Created
            }
            Ok(status) => {
                error!(status, "dataset creation returned unexpected status");
                self.notifier.error(FAILED_MESSAGE);
                CreateOutcome::Failed(FAILED_MESSAGE.to_string())
            }
            Err(err) => {
                error!("dataset creation failed: {err}");
                self.notifier.error(FAILED_MESSAGE);
                CreateOutcome::Failed(FAILED_MESSAGE.to_string())
            }
        }
    }

    async fn send(&self, payload: CreatePayload) -> ClientResult<u16> {
        match payload {
            CreatePayload::Json(body) => self.client.create_dataset_json(&self.endpoint, &body).await,
            CreatePayload::Upload(upload) => {
                let form = upload.into_form().await?;
                self.client
                    .create_dataset_multipart(&self.endpoint, form)
                    .await
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/datasets_tests.rs"]
mod tests;
