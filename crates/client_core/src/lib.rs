use std::sync::Arc;

use serde_json::Value;
use shared::domain::{Dataset, DiscoveryRow};
use tokio::sync::broadcast;

pub mod api;
pub mod config;
pub mod controller;
pub mod datasets;
pub mod discovery;
pub mod error;
pub mod grid;
pub mod notification;

pub use api::{ApiClient, CollectionBackend, QueryStyle};
pub use config::{load_settings, Settings};
pub use controller::{
    DeleteOutcome, FetchOutcome, FetchTicket, ListItem, LoadState, PaginatedListController,
};
pub use datasets::{CreateOutcome, DatasetCreator, DatasetForm};
pub use error::{ClientError, ClientResult};
pub use grid::{CollectionRequest, CollectionResult, FieldFilter, FilterModel, GridConfig};
pub use notification::{Notification, NotificationVariant, Notifier};

/// Entry point tying one API client and one notification channel to the
/// grids and forms built on top of them.
#[derive(Clone)]
pub struct DatasetClient {
    api: ApiClient,
    notifier: Notifier,
}

impl DatasetClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            notifier: Notifier::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(ApiClient::from_settings(settings)?))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    pub fn list<T: ListItem>(&self, config: GridConfig) -> PaginatedListController<T> {
        PaginatedListController::new(config, Arc::new(self.api.clone()), self.notifier.clone())
    }

    pub fn datasets(&self) -> PaginatedListController<Dataset> {
        self.list(discovery::datasets_grid())
    }

    pub fn discoveries(&self) -> PaginatedListController<DiscoveryRow> {
        self.list(discovery::discovery_grid())
    }

    /// A grid over an arbitrary endpoint with untyped rows.
    pub fn raw_list(&self, endpoint: &str) -> PaginatedListController<Value> {
        self.list(GridConfig::new(endpoint))
    }

    pub fn creator(&self) -> DatasetCreator {
        DatasetCreator::new(self.api.clone(), self.notifier.clone())
    }
}
