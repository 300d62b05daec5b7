use async_trait::async_trait;
use reqwest::{multipart::Form, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use shared::protocol::{CollectionPage, CreateDatasetRequest};
use tracing::debug;

use crate::{
    config::{normalize_base_url, Settings},
    error::{ClientError, ClientResult},
    grid::CollectionRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStyle {
    /// `limit`/`offset` pagination with `search` and a
    /// `filterField`/`filterOperator`/`filterValue` triple.
    #[default]
    LimitOffset,
    /// `page`/`limit` pagination with `q` and `<field>=<op>:<value>`.
    PageNumber,
}

impl QueryStyle {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "limit_offset" => Some(Self::LimitOffset),
            "page_number" => Some(Self::PageNumber),
            _ => None,
        }
    }

    pub fn query_pairs(self, request: &CollectionRequest) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(6);
        match self {
            Self::LimitOffset => {
                pairs.push(("limit".to_string(), request.limit.to_string()));
                pairs.push(("offset".to_string(), request.offset().to_string()));
                if !request.ordering.is_empty() {
                    pairs.push(("ordering".to_string(), request.ordering.clone()));
                }
                if !request.query.is_empty() {
                    pairs.push(("search".to_string(), request.query.clone()));
                }
                if let Some(filter) = &request.filter {
                    pairs.push(("filterField".to_string(), filter.filter_field.clone()));
                    pairs.push(("filterOperator".to_string(), filter.filter_operator.clone()));
                    pairs.push(("filterValue".to_string(), filter.value_text()));
                }
            }
            Self::PageNumber => {
                pairs.push(("page".to_string(), request.page.to_string()));
                pairs.push(("limit".to_string(), request.limit.to_string()));
                if !request.ordering.is_empty() {
                    pairs.push(("ordering".to_string(), request.ordering.clone()));
                }
                if !request.query.is_empty() {
                    pairs.push(("q".to_string(), request.query.clone()));
                }
                if let Some(filter) = &request.filter {
                    pairs.push((
                        filter.filter_field.clone(),
                        format!("{}:{}", filter.filter_operator, filter.value_text()),
                    ));
                }
            }
        }
        pairs
    }
}

#[async_trait]
pub trait CollectionBackend: Send + Sync {
    async fn fetch_collection(
        &self,
        request: &CollectionRequest,
    ) -> ClientResult<CollectionPage<Value>>;
    async fn delete_item(&self, path: &str) -> ClientResult<()>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    query_style: QueryStyle,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            query_style: QueryStyle::default(),
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: normalize_base_url(&settings.api_base_url)?,
            token: settings.api_token.clone(),
            query_style: settings.query_style,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_query_style(mut self, query_style: QueryStyle) -> Self {
        self.query_style = query_style;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}", self.base_url)
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_status(status.as_u16(), &body))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> ClientResult<T> {
        let response = self
            .authorize(self.http.get(self.url(endpoint)))
            .query(query)
            .send()
            .await?;
        let body = Self::check(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn create_dataset_json(
        &self,
        endpoint: &str,
        body: &CreateDatasetRequest,
    ) -> ClientResult<u16> {
        let response = self
            .authorize(self.http.post(self.url(endpoint)))
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.status().as_u16())
    }

    pub async fn create_dataset_multipart(&self, endpoint: &str, form: Form) -> ClientResult<u16> {
        let response = self
            .authorize(self.http.post(self.url(endpoint)))
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check(response).await?.status().as_u16())
    }
}

#[async_trait]
impl CollectionBackend for ApiClient {
    async fn fetch_collection(
        &self,
        request: &CollectionRequest,
    ) -> ClientResult<CollectionPage<Value>> {
        let query = self.query_style.query_pairs(request);
        debug!(endpoint = %request.endpoint, ?query, "fetching collection page");
        self.get_json(&request.endpoint, &query).await
    }

    async fn delete_item(&self, path: &str) -> ClientResult<()> {
        debug!(path, "deleting item");
        let response = self
            .authorize(self.http.delete(self.url(path)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
