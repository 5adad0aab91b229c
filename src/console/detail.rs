use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use super::actions::{Navigator, LIST_PATH};
use super::charts::{ChartRenderer, ChartSet, SeriesConfig};
use crate::clients::DataSource;
use crate::error::ConsoleResult;
use crate::helpers::clamp_percent;
use crate::models::cluster::{Cluster, Inventory};

pub const CPU_GAUGE: &str = "gauge-cpu";
pub const MEMORY_GAUGE: &str = "gauge-memory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailTab {
    #[default]
    Overview,
    Nodes,
    Pods,
    Metrics,
    Events,
}

impl DetailTab {
    pub const ALL: [DetailTab; 5] = [
        DetailTab::Overview,
        DetailTab::Nodes,
        DetailTab::Pods,
        DetailTab::Metrics,
        DetailTab::Events,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DetailTab::Overview => "overview",
            DetailTab::Nodes => "nodes",
            DetailTab::Pods => "pods",
            DetailTab::Metrics => "metrics",
            DetailTab::Events => "events",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DetailTab::Overview => "Overview",
            DetailTab::Nodes => "Nodes",
            DetailTab::Pods => "Pods",
            DetailTab::Metrics => "Metrics",
            DetailTab::Events => "Events",
        }
    }
}

impl fmt::Display for DetailTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DetailTab::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tab {:?}", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterDetail {
    pub cluster: Cluster,
    pub inventory: Inventory,
}

impl ClusterDetail {
    pub fn gauges(&self) -> [(&'static str, SeriesConfig); 2] {
        [
            (CPU_GAUGE, SeriesConfig::gauge("CPU", clamp_percent(self.cluster.usage.cpu))),
            (
                MEMORY_GAUGE,
                SeriesConfig::gauge("Memory", clamp_percent(self.cluster.usage.memory)),
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Box<ClusterDetail>),
    NotFound { id: String },
}

impl Resolution {
    /// Where the not-found state sends the user.
    pub fn back_path(&self) -> &'static str {
        LIST_PATH
    }
}

pub struct DetailResolver<'a> {
    source: &'a dyn DataSource,
}

impl<'a> DetailResolver<'a> {
    pub fn new(source: &'a dyn DataSource) -> Self {
        Self { source }
    }

    /// Look up `id`. An unknown id is `Ok(NotFound)`; only a failing backend
    /// is an error.
    pub async fn resolve(&self, id: &str) -> ConsoleResult<Resolution> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(Resolution::NotFound { id: String::new() });
        }

        let cluster = match self.source.get_cluster(id).await? {
            Some(c) => c,
            None => {
                debug!("cluster {} not found", id);
                return Ok(Resolution::NotFound { id: id.to_string() });
            }
        };

        let mut inventory = self
            .source
            .cluster_inventory(id)
            .await?
            .unwrap_or_default();
        inventory.events.sort_by_key(|e| e.at);

        Ok(Resolution::Found(Box::new(ClusterDetail { cluster, inventory })))
    }

    /// Resolve the id carried in the current route.
    pub async fn resolve_current(&self, navigator: &dyn Navigator) -> ConsoleResult<Resolution> {
        let id = navigator.current_params().remove("id").unwrap_or_default();
        self.resolve(&id).await
    }
}

/// A resolved detail page with its active tab and gauge charts.
pub struct DetailView {
    resolution: Resolution,
    tab: DetailTab,
    charts: ChartSet,
}

impl DetailView {
    pub fn new(resolution: Resolution, renderer: Arc<dyn ChartRenderer>) -> Self {
        Self {
            resolution,
            tab: DetailTab::Overview,
            charts: ChartSet::new(renderer),
        }
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn tab(&self) -> DetailTab {
        self.tab
    }

    /// Entering the metrics tab rebuilds the gauges. Leaving it keeps them
    /// until teardown.
    pub fn switch_tab(&mut self, tab: DetailTab) {
        self.tab = tab;
        if tab != DetailTab::Metrics {
            return;
        }
        if let Resolution::Found(detail) = &self.resolution {
            for (target, config) in detail.gauges() {
                self.charts.reinit(target, &config);
            }
        }
    }

    pub fn chart_count(&self) -> usize {
        self.charts.len()
    }

    pub fn teardown(&mut self) {
        self.charts.dispose_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockBackend;
    use crate::console::actions::tests::RecordingNavigator;
    use crate::console::charts::tests::SpyRenderer;
    use crate::console::list::tests::store_of;
    use crate::console::query::{FilterCriteria, Pagination};
    use crate::error::ConsoleError;
    use crate::models::cluster::ClusterPage;
    use crate::store::ClusterStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    struct Unreachable;

    #[async_trait]
    impl DataSource for Unreachable {
        async fn list_clusters(&self, _: &FilterCriteria, _: Pagination) -> ConsoleResult<ClusterPage> {
            Err(ConsoleError::FetchFailed("down".to_string()))
        }
        async fn get_cluster(&self, _: &str) -> ConsoleResult<Option<Cluster>> {
            Err(ConsoleError::FetchFailed("down".to_string()))
        }
        async fn all_clusters(&self) -> ConsoleResult<Vec<Cluster>> {
            Err(ConsoleError::FetchFailed("down".to_string()))
        }
        async fn cluster_inventory(&self, _: &str) -> ConsoleResult<Option<Inventory>> {
            Err(ConsoleError::FetchFailed("down".to_string()))
        }
    }

    async fn found(id: &str) -> Resolution {
        let backend = MockBackend::new(Arc::new(ClusterStore::seeded(5, 2)), Duration::ZERO);
        DetailResolver::new(&backend).resolve(id).await.unwrap()
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let backend = MockBackend::new(store_of(3), Duration::ZERO);
        let res = DetailResolver::new(&backend).resolve("missing").await.unwrap();
        assert_eq!(
            res,
            Resolution::NotFound {
                id: "missing".to_string()
            }
        );
        assert_eq!(res.back_path(), "/ui/clusters");
    }

    #[tokio::test]
    async fn known_id_resolves_with_inventory() {
        match found("cls-003").await {
            Resolution::Found(detail) => {
                assert_eq!(detail.cluster.id, "cls-003");
                assert!(!detail.inventory.nodes.is_empty());
                assert!(detail.inventory.events.windows(2).all(|w| w[0].at <= w[1].at));
            }
            other => panic!("expected found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn backend_failure_is_an_error_not_a_miss() {
        let res = DetailResolver::new(&Unreachable).resolve("x").await;
        assert!(matches!(res, Err(ConsoleError::FetchFailed(_))));
    }

    #[tokio::test]
    async fn resolve_current_reads_route_params() {
        let backend = MockBackend::new(store_of(3), Duration::ZERO);
        let navigator = RecordingNavigator {
            params: HashMap::from([("id".to_string(), "c01".to_string())]),
            ..Default::default()
        };
        let res = DetailResolver::new(&backend)
            .resolve_current(&navigator)
            .await
            .unwrap();
        assert!(matches!(res, Resolution::Found(_)));

        let empty = RecordingNavigator::default();
        let res = DetailResolver::new(&backend).resolve_current(&empty).await.unwrap();
        assert!(matches!(res, Resolution::NotFound { .. }));
    }

    #[tokio::test]
    async fn metrics_tab_builds_gauges_from_usage() {
        let spy = SpyRenderer::mounted(&[CPU_GAUGE, MEMORY_GAUGE]);
        let mut view = DetailView::new(found("cls-001").await, spy.clone());
        let (cpu, memory) = match view.resolution() {
            Resolution::Found(d) => (d.cluster.usage.cpu, d.cluster.usage.memory),
            _ => unreachable!(),
        };

        view.switch_tab(DetailTab::Nodes);
        assert_eq!(view.chart_count(), 0);

        view.switch_tab(DetailTab::Metrics);
        assert_eq!(view.chart_count(), 2);
        let last = spy.last.lock().unwrap().clone();
        assert_eq!(last[CPU_GAUGE].series[0].data, vec![clamp_percent(cpu)]);
        assert_eq!(last[MEMORY_GAUGE].series[0].data, vec![clamp_percent(memory)]);

        view.switch_tab(DetailTab::Events);
        assert_eq!(view.chart_count(), 2);

        view.switch_tab(DetailTab::Metrics);
        assert_eq!(SpyRenderer::count(&spy.inits), 4);
        assert_eq!(SpyRenderer::count(&spy.disposes), 2);
    }

    #[tokio::test]
    async fn teardown_releases_every_gauge() {
        let spy = SpyRenderer::mounted(&[CPU_GAUGE, MEMORY_GAUGE]);
        let mut view = DetailView::new(found("cls-002").await, spy.clone());
        view.switch_tab(DetailTab::Metrics);
        view.teardown();
        view.switch_tab(DetailTab::Overview);
        assert_eq!(view.chart_count(), 0);
        assert_eq!(SpyRenderer::count(&spy.disposes), 2);
        assert_eq!(SpyRenderer::count(&spy.resizes), 0);
    }

    #[tokio::test]
    async fn not_found_view_has_no_charts() {
        let spy = SpyRenderer::mounted(&[CPU_GAUGE, MEMORY_GAUGE]);
        let mut view = DetailView::new(
            Resolution::NotFound {
                id: "nope".to_string(),
            },
            spy.clone(),
        );
        view.switch_tab(DetailTab::Metrics);
        assert_eq!(view.chart_count(), 0);
        assert_eq!(SpyRenderer::count(&spy.inits), 0);
    }

    #[test]
    fn tabs_parse_case_insensitively() {
        assert_eq!("Metrics".parse::<DetailTab>(), Ok(DetailTab::Metrics));
        assert!("logs".parse::<DetailTab>().is_err());
    }
}
