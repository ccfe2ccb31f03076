use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use imagery::{ImageryCatalog, ImageryError};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

#[derive(Clone)]
pub struct AppState {
    datasets: Arc<BTreeMap<String, ImageryCatalog>>,
}

impl AppState {
    pub fn new(datasets: impl IntoIterator<Item = (String, PathBuf)>) -> Self {
        let datasets = datasets
            .into_iter()
            .map(|(name, dir)| (name, ImageryCatalog::new(dir)))
            .collect();
        Self {
            datasets: Arc::new(datasets),
        }
    }

    pub fn datasets(&self) -> impl Iterator<Item = (&String, &ImageryCatalog)> {
        self.datasets.iter()
    }

    fn catalog(&self, dataset: &str) -> Option<&ImageryCatalog> {
        self.datasets.get(dataset)
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/:dataset", get(get_summary))
        .route("/api/:dataset/:datehour", get(get_image))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn get_summary(State(state): State<AppState>, Path(dataset): Path<String>) -> Response {
    let Some(catalog) = state.catalog(&dataset) else {
        return unknown_dataset(&dataset);
    };
    match catalog.summary().await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => imagery_error(&dataset, &err),
    }
}

async fn get_image(
    State(state): State<AppState>,
    Path((dataset, datehour)): Path<(String, String)>,
) -> Response {
    let Some(catalog) = state.catalog(&dataset) else {
        return unknown_dataset(&dataset);
    };
    match catalog.read_datehour(&datehour).await {
        Ok(bytes) => {
            let mut headers = HeaderMap::new();
            headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
            headers.insert(http::header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            (StatusCode::OK, headers, Body::from(bytes)).into_response()
        }
        Err(err) => imagery_error(&dataset, &err),
    }
}

fn unknown_dataset(dataset: &str) -> Response {
    debug!("unknown dataset {dataset:?}");
    (StatusCode::NOT_FOUND, Json(json!({ "error": "unknown dataset" }))).into_response()
}

fn imagery_error(dataset: &str, err: &ImageryError) -> Response {
    let (status, message) = match err {
        ImageryError::InvalidTimestamp(_) => (StatusCode::BAD_REQUEST, "Invalid datehour format"),
        ImageryError::NotFound { .. } => (StatusCode::NOT_FOUND, "no such hour exists"),
        ImageryError::DirectoryUnreadable { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "image directory missing or unreadable",
        ),
        ImageryError::Empty { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "no images available"),
        ImageryError::FileUnreadable { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "image missing or unreadable",
        ),
    };
    if err.is_recoverable() {
        debug!("{dataset}: {err}");
    } else {
        error!("{dataset}: {err}");
    }
    (status, Json(json!({ "error": message }))).into_response()
}
