mod clients;
mod config;
mod console;
mod error;
mod helpers;
mod models;
mod routes;
mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use clients::mock::MockBackend;
use clients::{DataSource, HttpBackend, MutationSink};
use config::{Config, SourceConfig};
use console::charts::ChartBoard;
use console::dashboard::{DashboardComposer, DashboardSession, DASHBOARD_TARGETS};
use console::metrics::SimulatedMetrics;
use store::ClusterStore;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn DataSource>,
    pub mutations: Arc<dyn MutationSink>,
    pub dashboard: Arc<DashboardSession>,
    /// Charts the dashboard composer draws into.
    pub board: ChartBoard,
    pub config: Arc<Config>,
}

type Backends = (Arc<dyn DataSource>, Arc<dyn MutationSink>);

fn build_backends(cfg: &Config) -> Result<Backends, error::ConsoleError> {
    match &cfg.source {
        SourceConfig::Mock {
            count,
            latency_ms,
            seed,
        } => {
            let store = Arc::new(ClusterStore::seeded(*count, *seed));
            info!("serving {} mock clusters", store.len());
            let backend = Arc::new(MockBackend::new(store, Duration::from_millis(*latency_ms)));
            let source: Arc<dyn DataSource> = backend.clone();
            let mutations: Arc<dyn MutationSink> = backend;
            Ok((source, mutations))
        }
        SourceConfig::Remote {
            base_url,
            timeout_secs,
        } => {
            let backend = Arc::new(HttpBackend::new(
                base_url.clone(),
                Duration::from_secs(*timeout_secs),
            )?);
            info!("proxying clusters from {}", backend.address);
            let source: Arc<dyn DataSource> = backend.clone();
            let mutations: Arc<dyn MutationSink> = backend;
            Ok((source, mutations))
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cluster_console=info")),
        )
        .init();

    let config_path = std::env::args()
        .skip(1)
        .zip(std::env::args().skip(2))
        .find_map(|(k, v)| {
            if k == "-config" || k == "--config" {
                Some(v)
            } else {
                None
            }
        })
        .or_else(|| std::env::args().nth(1).filter(|a| !a.starts_with('-')))
        .unwrap_or_else(|| "/etc/cluster-console/config.yaml".to_string());

    let cfg = Config::load(&PathBuf::from(&config_path)).unwrap_or_else(|e| {
        eprintln!("error loading config: {}", e);
        std::process::exit(1);
    });

    let (source, mutations) = build_backends(&cfg).unwrap_or_else(|e| {
        eprintln!("error building cluster backend: {}", e);
        std::process::exit(1);
    });

    let board = ChartBoard::with_targets(DASHBOARD_TARGETS);
    let composer = DashboardComposer::new(
        source.clone(),
        Box::new(SimulatedMetrics::new(cfg.dashboard.seed)),
        Arc::new(board.clone()),
    );
    let dashboard = Arc::new(DashboardSession::new(composer, cfg.refresh_interval()));
    dashboard.refresh().await;
    if cfg.dashboard.auto_refresh {
        dashboard.set_auto_refresh(true);
    }

    let cfg = Arc::new(cfg);
    let state = AppState {
        source,
        mutations,
        dashboard: dashboard.clone(),
        board,
        config: cfg.clone(),
    };

    let router = routes::build_router(state);

    let listen_addr = cfg.listen_addr();
    let listener = TcpListener::bind(&listen_addr).await.unwrap_or_else(|e| {
        eprintln!("failed to bind {}: {}", listen_addr, e);
        std::process::exit(1);
    });

    info!("cluster-console listening on {}", listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            dashboard.teardown().await;
            info!("dashboard stopped");
        })
        .await
        .unwrap_or_else(|e| {
            eprintln!("server error: {}", e);
            std::process::exit(1);
        });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
