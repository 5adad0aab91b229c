pub mod api;
pub mod ui;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Deserialize;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::console::query::{FilterCriteria, Pagination};
use crate::error::ConsoleError;
use crate::models::cluster::ClusterStatus;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Clusters
        .route(
            "/api/v1/clusters",
            get(api::handle_list_clusters).post(api::handle_create_cluster),
        )
        .route(
            "/api/v1/clusters/{id}",
            get(api::handle_get_cluster).delete(api::handle_delete_cluster),
        )
        .route(
            "/api/v1/clusters/{id}/inventory",
            get(api::handle_get_inventory),
        )
        // Dashboard
        .route("/api/v1/dashboard", get(api::handle_dashboard))
        .route("/api/v1/dashboard/refresh", post(api::handle_dashboard_refresh))
        .route(
            "/api/v1/dashboard/auto-refresh",
            put(api::handle_dashboard_auto_refresh),
        )
        .route("/api/v1/dashboard/range", put(api::handle_dashboard_range))
        .route("/api/v1/dashboard/resize", post(api::handle_dashboard_resize))
        // Health
        .route("/healthz", get(api::handle_healthz))
        // Dashboard UI
        .route("/ui/", get(ui::handle_dashboard))
        .route("/ui/dashboard/refresh", post(ui::handle_dashboard_refresh))
        .route(
            "/ui/dashboard/auto-refresh",
            post(ui::handle_dashboard_auto_refresh),
        )
        .route("/ui/dashboard/range", post(ui::handle_dashboard_range))
        .route("/ui/clusters", get(ui::handle_clusters))
        .route("/ui/clusters/actions", post(ui::handle_cluster_action))
        .route("/ui/clusters/{id}", get(ui::handle_cluster_detail))
        .route("/ui/clusters/{id}/edit", get(ui::handle_cluster_edit))
        // Static files
        .nest_service("/ui/static", ServeDir::new("static"))
        // Root redirect
        .route(
            "/",
            get(|| async {
                axum::response::Redirect::to("/ui/")
            }),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// List state carried in query strings and hidden form fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default, alias = "page_size")]
    pub page_size: Option<usize>,
}

impl ListParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut params = ListParams::default();
        for (k, v) in pairs {
            match k.as_str() {
                "name" => params.name = v.clone(),
                "status" => params.status = v.clone(),
                "page" => params.page = v.parse().ok(),
                "pageSize" | "page_size" => params.page_size = v.parse().ok(),
                _ => {}
            }
        }
        params
    }

    pub fn criteria(&self) -> Result<FilterCriteria, ConsoleError> {
        let status = match self.status.trim() {
            "" => None,
            s => Some(
                s.parse::<ClusterStatus>()
                    .map_err(ConsoleError::Validation)?,
            ),
        };
        Ok(FilterCriteria::new(self.name.trim(), status))
    }

    pub fn pagination(&self, default_page_size: usize) -> Pagination {
        Pagination::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(default_page_size),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clients::{DataSource, MutationSink};
    use crate::config::Config;
    use crate::console::charts::ChartBoard;
    use crate::console::dashboard::{DASHBOARD_TARGETS, DashboardComposer, DashboardSession};
    use crate::console::metrics::SimulatedMetrics;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    /// App state over the given backends with a default config.
    pub(crate) fn state_with(
        source: Arc<dyn DataSource>,
        mutations: Arc<dyn MutationSink>,
    ) -> AppState {
        let config = Config::parse("{}").unwrap();
        let board = ChartBoard::with_targets(DASHBOARD_TARGETS);
        let composer = DashboardComposer::new(
            source.clone(),
            Box::new(SimulatedMetrics::new(config.dashboard.seed)),
            Arc::new(board.clone()),
        );
        AppState {
            source,
            mutations,
            dashboard: Arc::new(DashboardSession::new(composer, config.refresh_interval())),
            board,
            config: Arc::new(config),
        }
    }

    /// Serve the full router on an ephemeral port; returns its base URL.
    pub(crate) async fn serve(state: AppState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn params_parse_status_and_paging() {
        let params = ListParams {
            name: " prod ".to_string(),
            status: "Running".to_string(),
            page: Some(3),
            page_size: None,
        };
        let criteria = params.criteria().unwrap();
        assert_eq!(criteria.name, "prod");
        assert_eq!(criteria.status, Some(ClusterStatus::Running));
        assert_eq!(params.pagination(20), Pagination::new(3, 20));
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let params = ListParams {
            status: "exploded".to_string(),
            ..Default::default()
        };
        assert!(matches!(params.criteria(), Err(ConsoleError::Validation(_))));
    }

    #[test]
    fn pairs_fill_known_fields() {
        let pairs = vec![
            ("name".to_string(), "edge".to_string()),
            ("page".to_string(), "2".to_string()),
            ("page_size".to_string(), "50".to_string()),
            ("ids".to_string(), "cls-001".to_string()),
        ];
        let params = ListParams::from_pairs(&pairs);
        assert_eq!(params.name, "edge");
        assert_eq!(params.pagination(10), Pagination::new(2, 50));
    }
}
