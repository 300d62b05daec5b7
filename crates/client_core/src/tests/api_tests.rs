use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;
use tokio::{net::TcpListener, sync::Mutex};

use crate::grid::{FieldFilter, SortItem};

#[derive(Clone, Default)]
struct ServerState {
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
    deleted: Arc<Mutex<Vec<String>>>,
}

async fn handle_list(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    state.queries.lock().await.push(query);
    state.auth_headers.lock().await.push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    Json(json!({
        "results": [{"id": "a", "name": "cats"}, {"id": "b", "name": "dogs"}],
        "count": 42,
    }))
}

async fn handle_delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<serde_json::Value>)> {
    if id == "locked" {
        return Err((
            StatusCode::CONFLICT,
            Json(json!({"detail": "dataset is still importing"})),
        ));
    }
    state.deleted.lock().await.push(id);
    Ok(StatusCode::NO_CONTENT)
}

async fn spawn_collection_server() -> anyhow::Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/datasets/", get(handle_list))
        .route("/api/datasets/:id/", delete(handle_delete))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api"), state))
}

fn sample_request() -> CollectionRequest {
    CollectionRequest {
        endpoint: "/datasets/".into(),
        page: 2,
        limit: 20,
        query: "alice bob".into(),
        ordering: SortItem::desc("name").ordering_token(),
        filter: Some(FieldFilter {
            filter_field: "terms".into(),
            filter_operator: "contains".into(),
            filter_value: json!("cat"),
        }),
    }
}

#[test]
fn limit_offset_style_encodes_offset_and_filter_triple() {
    let pairs = QueryStyle::LimitOffset.query_pairs(&sample_request());
    let pairs: HashMap<_, _> = pairs.into_iter().collect();
    assert_eq!(pairs["limit"], "20");
    assert_eq!(pairs["offset"], "40");
    assert_eq!(pairs["ordering"], "-name");
    assert_eq!(pairs["search"], "alice bob");
    assert_eq!(pairs["filterField"], "terms");
    assert_eq!(pairs["filterOperator"], "contains");
    assert_eq!(pairs["filterValue"], "cat");
}

#[test]
fn page_number_style_encodes_operator_prefixed_value() {
    let pairs = QueryStyle::PageNumber.query_pairs(&sample_request());
    let pairs: HashMap<_, _> = pairs.into_iter().collect();
    assert_eq!(pairs["page"], "2");
    assert_eq!(pairs["q"], "alice bob");
    assert_eq!(pairs["terms"], "contains:cat");
    assert!(!pairs.contains_key("offset"));
}

#[test]
fn empty_query_and_ordering_are_omitted() {
    let request = CollectionRequest {
        query: String::new(),
        ordering: String::new(),
        filter: None,
        ..sample_request()
    };
    let keys: Vec<String> = QueryStyle::LimitOffset
        .query_pairs(&request)
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec!["limit".to_string(), "offset".to_string()]);
}

#[test]
fn parses_query_style_names() {
    assert_eq!(QueryStyle::parse("page-number"), Some(QueryStyle::PageNumber));
    assert_eq!(QueryStyle::parse(" LIMIT_OFFSET "), Some(QueryStyle::LimitOffset));
    assert_eq!(QueryStyle::parse("cursor"), None);
}

#[test]
fn joins_endpoints_onto_base_url() {
    let client = ApiClient::new("http://localhost:8000/api/");
    assert_eq!(client.url("/datasets/"), "http://localhost:8000/api/datasets/");
    assert_eq!(client.url("datasets/"), "http://localhost:8000/api/datasets/");
    assert_eq!(
        client.url("https://other.example/x/"),
        "https://other.example/x/"
    );
}

#[tokio::test]
async fn fetch_collection_sends_query_and_decodes_page() {
    let (base_url, state) = spawn_collection_server().await.expect("spawn server");
    let client = ApiClient::new(base_url).with_token("secret");

    let page = client
        .fetch_collection(&sample_request())
        .await
        .expect("fetch");
    assert_eq!(page.count, 42);
    assert_eq!(page.results.len(), 2);

    let queries = state.queries.lock().await;
    assert_eq!(queries[0]["offset"], "40");
    assert_eq!(queries[0]["search"], "alice bob");
    assert_eq!(
        state.auth_headers.lock().await[0].as_deref(),
        Some("Bearer secret")
    );
}

#[tokio::test]
async fn delete_item_reports_backend_message() {
    let (base_url, state) = spawn_collection_server().await.expect("spawn server");
    let client = ApiClient::new(base_url);

    client
        .delete_item("/datasets/abc/")
        .await
        .expect("delete succeeds");
    assert_eq!(*state.deleted.lock().await, vec!["abc".to_string()]);

    let err = client
        .delete_item("/datasets/locked/")
        .await
        .expect_err("conflict");
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.user_message(), "dataset is still importing");
}

#[tokio::test]
async fn missing_route_is_a_status_error() {
    let (base_url, _state) = spawn_collection_server().await.expect("spawn server");
    let client = ApiClient::new(base_url);
    let request = CollectionRequest {
        endpoint: "/missing/".into(),
        ..sample_request()
    };
    let err = client.fetch_collection(&request).await.expect_err("404");
    assert_eq!(err.status(), Some(404));
}
