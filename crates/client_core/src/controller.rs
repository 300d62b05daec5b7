use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{Dataset, DiscoveryRow},
    protocol::CollectionPage,
};
use tracing::{debug, info, warn};

use crate::{
    api::CollectionBackend,
    error::{ClientError, ClientResult},
    grid::{
        ordering_token, CollectionRequest, CollectionResult, FieldFilter, FilterModel,
        GridConfig, SortDirection, SortItem,
    },
    notification::Notifier,
};

const FALLBACK_PAGE_SIZE: u32 = 20;

pub trait ListItem: DeserializeOwned + Clone + Send + Sync + 'static {
    fn identifier(&self) -> Option<String>;

    fn label(&self) -> Option<String> {
        None
    }
}

impl ListItem for Dataset {
    fn identifier(&self) -> Option<String> {
        Some(self.id.to_string())
    }

    fn label(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

impl ListItem for DiscoveryRow {
    fn identifier(&self) -> Option<String> {
        Some(self.id.to_string())
    }

    fn label(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

/// Untyped rows from heterogeneous collections: `task_id` wins over `id`.
impl ListItem for Value {
    fn identifier(&self) -> Option<String> {
        ["task_id", "id"]
            .iter()
            .find_map(|key| scalar_text(self.get(*key)?))
    }

    fn label(&self) -> Option<String> {
        ["name", "title"]
            .iter()
            .find_map(|key| scalar_text(self.get(*key)?))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Only the completion of the most recently issued ticket is applied.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a ticket does nothing until it is fetched"]
pub struct FetchTicket {
    seq: u64,
    request: CollectionRequest,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> &CollectionRequest {
        &self.request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Failed(String),
    NothingPending,
}

struct DeletingGuard<'a>(&'a mut bool);

impl<'a> DeletingGuard<'a> {
    fn set(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for DeletingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

pub struct PaginatedListController<T: ListItem> {
    config: GridConfig,
    backend: Arc<dyn CollectionBackend>,
    notifier: Notifier,
    page: u32,
    limit: u32,
    sort_model: Vec<SortItem>,
    query: String,
    filter: Option<FieldFilter>,
    pending_deletion: Option<T>,
    result: CollectionResult<T>,
    load_state: LoadState,
    issued_seq: u64,
    deleting: bool,
}

impl<T: ListItem> PaginatedListController<T> {
    pub fn new(config: GridConfig, backend: Arc<dyn CollectionBackend>, notifier: Notifier) -> Self {
        let limit = config
            .page_size_options
            .first()
            .copied()
            .unwrap_or(FALLBACK_PAGE_SIZE);
        let initial_filter = config.initial_filter.clone();
        let mut controller = Self {
            config,
            backend,
            notifier,
            page: 0,
            limit,
            sort_model: Vec::new(),
            query: String::new(),
            filter: None,
            pending_deletion: None,
            result: CollectionResult::default(),
            load_state: LoadState::Idle,
            issued_seq: 0,
            deleting: false,
        };
        if let Some(model) = initial_filter {
            controller.apply_filter_model(&model);
        }
        controller
    }

    pub fn with_page_size(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn request(&self) -> CollectionRequest {
        CollectionRequest {
            endpoint: self.config.endpoint.clone(),
            page: self.page,
            limit: self.limit,
            query: self.query.clone(),
            ordering: self.ordering(),
            filter: self.filter.clone(),
        }
    }

    pub fn ordering(&self) -> String {
        let model = if self.sort_model.is_empty() {
            &self.config.initial_sorting
        } else {
            &self.sort_model
        };
        ordering_token(model).unwrap_or_default()
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued_seq += 1;
        self.load_state = LoadState::Loading;
        let request = self.request();
        debug!(seq = self.issued_seq, ?request, "derived collection request");
        FetchTicket {
            seq: self.issued_seq,
            request,
        }
    }

    pub fn set_page(&mut self, page: u32) -> FetchTicket {
        self.page = page;
        self.begin_fetch()
    }

    /// Changes the page size. The page index is kept even if it now lies
    /// past the end of the collection.
    pub fn set_limit(&mut self, limit: u32) -> FetchTicket {
        self.limit = limit.max(1);
        self.begin_fetch()
    }

    pub fn set_sort(&mut self, field: impl Into<String>, direction: SortDirection) -> FetchTicket {
        self.sort_model = vec![SortItem {
            field: field.into(),
            sort: direction,
        }];
        self.begin_fetch()
    }

    pub fn set_sort_model(&mut self, model: &[SortItem]) -> FetchTicket {
        if model.len() > 1 {
            debug!(dropped = model.len() - 1, "multi-column sort truncated to first entry");
        }
        self.sort_model = model.iter().take(1).cloned().collect();
        self.begin_fetch()
    }

    pub fn set_filter_model(&mut self, model: &FilterModel) -> FetchTicket {
        self.apply_filter_model(model);
        self.begin_fetch()
    }

    fn apply_filter_model(&mut self, model: &FilterModel) {
        match &model.quick_filter_values {
            Some(tokens) if self.config.show_quick_filter => self.query = tokens.join(" "),
            Some(_) => debug!("quick filter disabled for this grid, search ignored"),
            None => {}
        }

        let Some(first) = model.items.first() else {
            self.filter = None;
            return;
        };
        if model.items.len() > 1 {
            debug!(
                ignored = model.items.len() - 1,
                "only the first field filter is forwarded"
            );
        }

        if let Some(column) = self.config.column(&first.column_field) {
            if !column.allows(&first.operator_value) {
                warn!(
                    field = %first.column_field,
                    operator = %first.operator_value,
                    "rejected filter on restricted column"
                );
                self.notifier.warning(format!(
                    "Filtering on '{}' with operator '{}' is not supported",
                    first.column_field, first.operator_value
                ));
                return;
            }
        }
        self.filter = Some(FieldFilter::from_item(first));
    }

    pub fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        outcome: ClientResult<CollectionPage<Value>>,
    ) -> FetchOutcome {
        if ticket.seq != self.issued_seq {
            warn!(
                seq = ticket.seq,
                latest = self.issued_seq,
                "discarding stale collection response"
            );
            return FetchOutcome::Stale;
        }

        let decoded = outcome.and_then(|page| {
            let items = page
                .results
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<T>, _>>()?;
            Ok(CollectionResult {
                items,
                total_count: page.count,
            })
        });

        match decoded {
            Ok(result) => {
                self.result = result;
                self.load_state = LoadState::Loaded;
            }
            Err(err) => {
                warn!(endpoint = %ticket.request.endpoint, "collection fetch failed: {err}");
                let message = err.user_message();
                if err.is_auth_failure() {
                    self.notifier.error(message.clone());
                }
                self.load_state = LoadState::Failed(message);
            }
        }
        FetchOutcome::Applied
    }

    pub async fn fetch(&mut self, ticket: FetchTicket) -> FetchOutcome {
        let outcome = self.backend.fetch_collection(&ticket.request).await;
        self.apply_fetch(ticket, outcome)
    }

    pub async fn reload(&mut self) -> FetchOutcome {
        let ticket = self.begin_fetch();
        self.fetch(ticket).await
    }

    pub fn request_delete(&mut self, item: T) -> ClientResult<bool> {
        if !self.config.delete_enabled {
            return Err(ClientError::DeleteDisabled {
                endpoint: self.config.endpoint.clone(),
            });
        }
        if self.pending_deletion.is_some() {
            return Ok(false);
        }
        self.pending_deletion = Some(item);
        Ok(true)
    }

    pub fn cancel_delete(&mut self) {
        self.pending_deletion = None;
    }

    /// Deletes the pending item. On failure the item stays pending so the
    /// caller can retry or cancel.
    pub async fn confirm_delete(&mut self) -> DeleteOutcome {
        let Some(item) = self.pending_deletion.as_ref() else {
            return DeleteOutcome::NothingPending;
        };
        let label = item.label().unwrap_or_default();
        let Some(id) = item.identifier() else {
            let err = ClientError::MissingIdentifier { label };
            let message = err.user_message();
            self.notifier.error(message.clone());
            return DeleteOutcome::Failed(message);
        };

        let path = format!("{}{id}/", self.config.endpoint);
        debug!(%path, %label, "deleting item");
        let outcome = {
            let _deleting = DeletingGuard::set(&mut self.deleting);
            self.backend.delete_item(&path).await
        };

        match outcome {
            Ok(()) => {
                info!(%path, "item deleted");
                self.pending_deletion = None;
                self.reload().await;
                DeleteOutcome::Deleted
            }
            Err(err) => {
                let message = err.user_message();
                warn!(%path, "delete failed: {err}");
                self.notifier.error(message.clone());
                DeleteOutcome::Failed(message)
            }
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filter(&self) -> Option<&FieldFilter> {
        self.filter.as_ref()
    }

    pub fn pending_deletion(&self) -> Option<&T> {
        self.pending_deletion.as_ref()
    }

    pub fn result(&self) -> &CollectionResult<T> {
        &self.result
    }

    pub fn rows(&self) -> &[T] {
        &self.result.items
    }

    pub fn total_count(&self) -> u64 {
        self.result.total_count
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn backend(&self) -> Arc<dyn CollectionBackend> {
        Arc::clone(&self.backend)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
