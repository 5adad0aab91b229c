use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::ListParams;
use crate::console::charts::RenderedChart;
use crate::console::dashboard::{DashboardSnapshot, TimeRange};
use crate::error::{ConsoleError, Notice};
use crate::models::cluster::{ClusterDraft, Status};
use crate::AppState;

pub(crate) fn error_status(err: &ConsoleError) -> StatusCode {
    match err {
        ConsoleError::NotFound(_) => StatusCode::NOT_FOUND,
        ConsoleError::Validation(_) => StatusCode::BAD_REQUEST,
        ConsoleError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        ConsoleError::FetchFailed(_) => StatusCode::BAD_GATEWAY,
        ConsoleError::MutationFailed(_) | ConsoleError::Cancelled => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn status_body(status: &str, message: String) -> Status {
    Status {
        api_version: "v1".to_string(),
        kind: "Status".to_string(),
        status: status.to_string(),
        message,
    }
}

fn error_response(err: &ConsoleError) -> Response {
    (error_status(err), Json(status_body("Failure", err.to_string()))).into_response()
}

// --- Clusters ---

pub async fn handle_list_clusters(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let criteria = match params.criteria() {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };
    let pagination = params.pagination(state.config.list.default_page_size);

    match state.source.list_clusters(&criteria, pagination).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn handle_get_cluster(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.source.get_cluster(&id).await {
        Ok(Some(cluster)) => Json(cluster).into_response(),
        Ok(None) => error_response(&ConsoleError::NotFound(id)),
        Err(e) => error_response(&e),
    }
}

pub async fn handle_get_inventory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.source.cluster_inventory(&id).await {
        Ok(Some(inventory)) => Json(inventory).into_response(),
        Ok(None) => error_response(&ConsoleError::NotFound(id)),
        Err(e) => error_response(&e),
    }
}

pub async fn handle_delete_cluster(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.mutations.delete_cluster(&id).await {
        Ok(()) => {
            tracing::info!("cluster {} deleted via API", id);
            Json(status_body("Success", format!("cluster {:?} deleted", id))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

pub async fn handle_create_cluster(
    State(state): State<AppState>,
    Json(draft): Json<ClusterDraft>,
) -> Response {
    match state.mutations.create_cluster(&draft).await {
        Ok(cluster) => (StatusCode::CREATED, Json(cluster)).into_response(),
        Err(e) => error_response(&e),
    }
}

// --- Dashboard ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardBody {
    pub snapshot: Option<DashboardSnapshot>,
    pub range: TimeRange,
    pub loading: bool,
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
    pub charts: Vec<RenderedChart>,
    pub notices: Vec<Notice>,
}

async fn dashboard_body(state: &AppState) -> DashboardBody {
    state.dashboard.ensure_snapshot().await;
    let mut composer = state.dashboard.composer().lock().await;
    DashboardBody {
        snapshot: composer.snapshot().cloned(),
        range: composer.range(),
        loading: composer.is_loading(),
        auto_refresh: state.dashboard.auto_refresh_enabled(),
        refresh_interval_secs: state.dashboard.refresh_interval().as_secs(),
        charts: state.board.rendered(),
        notices: composer.take_notices(),
    }
}

pub async fn handle_dashboard(State(state): State<AppState>) -> Json<DashboardBody> {
    Json(dashboard_body(&state).await)
}

pub async fn handle_dashboard_refresh(State(state): State<AppState>) -> Json<DashboardBody> {
    state.dashboard.refresh().await;
    Json(dashboard_body(&state).await)
}

#[derive(Deserialize)]
pub struct AutoRefreshRequest {
    pub enabled: bool,
}

pub async fn handle_dashboard_auto_refresh(
    State(state): State<AppState>,
    Json(req): Json<AutoRefreshRequest>,
) -> Json<DashboardBody> {
    state.dashboard.set_auto_refresh(req.enabled);
    Json(dashboard_body(&state).await)
}

#[derive(Deserialize)]
pub struct RangeRequest {
    pub range: TimeRange,
}

pub async fn handle_dashboard_range(
    State(state): State<AppState>,
    Json(req): Json<RangeRequest>,
) -> Json<DashboardBody> {
    state.dashboard.set_range(req.range).await;
    Json(dashboard_body(&state).await)
}

pub async fn handle_dashboard_resize(State(state): State<AppState>) -> StatusCode {
    state.dashboard.resize().await;
    StatusCode::NO_CONTENT
}

// --- Health ---

pub async fn handle_healthz(State(state): State<AppState>) -> Response {
    match state.source.all_clusters().await {
        Ok(clusters) => (
            StatusCode::OK,
            format!("ok ({} clusters)", clusters.len()),
        )
            .into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_http_statuses() {
        assert_eq!(
            error_status(&ConsoleError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&ConsoleError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&ConsoleError::NotImplemented("create cluster")),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            error_status(&ConsoleError::FetchFailed("down".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn dashboard_notices_serialize_with_lowercase_level() {
        let json = serde_json::to_value(Notice::warning("careful")).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["message"], "careful");
    }
}
