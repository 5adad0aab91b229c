use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::charts::{ChartKind, ChartRenderer, ChartSet, Series, SeriesConfig};
use super::metrics::{LiveUsage, MetricsSource};
use super::poller::Poller;
use crate::clients::DataSource;
use crate::error::{ConsoleResult, Notice};
use crate::models::cluster::{Cluster, ClusterStatus};
use crate::models::views::Metric;

pub const TREND_CHART: &str = "usage-trend";
pub const STATUS_CHART: &str = "status-distribution";
pub const CAPACITY_CHART: &str = "cluster-capacity";
pub const CPU_CHART: &str = "live-cpu";
pub const MEMORY_CHART: &str = "live-memory";
pub const DISK_CHART: &str = "live-disk";
pub const NETWORK_CHART: &str = "live-network";

/// Every chart target the dashboard page mounts.
pub const DASHBOARD_TARGETS: [&str; 7] = [
    TREND_CHART,
    STATUS_CHART,
    CAPACITY_CHART,
    CPU_CHART,
    MEMORY_CHART,
    DISK_CHART,
    NETWORK_CHART,
];

const CAPACITY_TOP_N: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    Hour,
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [TimeRange::Hour, TimeRange::Day, TimeRange::Week];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::Hour => "1h",
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
        }
    }

    fn step(self) -> ChronoDuration {
        match self {
            TimeRange::Hour => ChronoDuration::minutes(5),
            TimeRange::Day => ChronoDuration::hours(1),
            TimeRange::Week => ChronoDuration::days(1),
        }
    }

    pub fn points(self) -> usize {
        match self {
            TimeRange::Hour => 12,
            TimeRange::Day => 24,
            TimeRange::Week => 7,
        }
    }

    /// Axis labels ending at `now`, oldest first.
    pub fn labels(self, now: DateTime<Utc>) -> Vec<String> {
        let fmt = match self {
            TimeRange::Hour | TimeRange::Day => "%H:%M",
            TimeRange::Week => "%m-%d",
        };
        (0..self.points())
            .rev()
            .map(|i| (now - self.step() * i as i32).format(fmt).to_string())
            .collect()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| format!("unknown time range {:?}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Aggregates {
    pub total: usize,
    pub running: usize,
    pub nodes: u64,
    pub pods: u64,
}

impl Aggregates {
    pub fn compute(clusters: &[Cluster]) -> Self {
        clusters.iter().fold(Self::default(), |mut acc, c| {
            acc.total += 1;
            if c.status == ClusterStatus::Running {
                acc.running += 1;
            }
            acc.nodes += u64::from(c.node_count);
            acc.pods += u64::from(c.pod_count);
            acc
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: ClusterStatus,
    pub count: usize,
}

pub fn status_counts(clusters: &[Cluster]) -> Vec<StatusCount> {
    ClusterStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: clusters.iter().filter(|c| c.status == status).count(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub aggregates: Aggregates,
    pub statuses: Vec<StatusCount>,
    pub usage: LiveUsage,
    pub range: TimeRange,
    pub refreshed_at: DateTime<Utc>,
}

/// One in-flight dashboard fetch.
pub struct RefreshTicket {
    generation: u64,
    source: Arc<dyn DataSource>,
}

impl RefreshTicket {
    pub async fn fetch(&self) -> ConsoleResult<Vec<Cluster>> {
        self.source.all_clusters().await
    }
}

/// Derives dashboard numbers from the cluster collection and keeps the
/// dashboard charts in sync with them.
pub struct DashboardComposer {
    source: Arc<dyn DataSource>,
    metrics: Box<dyn MetricsSource>,
    charts: ChartSet,
    range: TimeRange,
    snapshot: Option<DashboardSnapshot>,
    loading: bool,
    generation: u64,
    torn_down: bool,
    notices: Vec<Notice>,
}

impl DashboardComposer {
    pub fn new(
        source: Arc<dyn DataSource>,
        metrics: Box<dyn MetricsSource>,
        renderer: Arc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            source,
            metrics,
            charts: ChartSet::new(renderer),
            range: TimeRange::default(),
            snapshot: None,
            loading: false,
            generation: 0,
            torn_down: false,
            notices: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn chart_count(&self) -> usize {
        self.charts.len()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Mark a refresh in flight. The fetch itself runs on the returned
    /// ticket so callers can release the composer while it is pending.
    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        if self.torn_down {
            debug!("dashboard refresh after teardown ignored");
            return None;
        }
        self.generation += 1;
        self.loading = true;
        Some(RefreshTicket {
            generation: self.generation,
            source: self.source.clone(),
        })
    }

    /// Apply a fetch result: recompute aggregates and push fresh series into
    /// every mounted chart. Only the latest ticket may touch the snapshot or
    /// the loading flag, and on failure the previous snapshot stays.
    pub fn finish_refresh(
        &mut self,
        ticket: &RefreshTicket,
        result: ConsoleResult<Vec<Cluster>>,
    ) -> bool {
        if self.torn_down {
            debug!("dashboard refresh finished after teardown, dropped");
            return false;
        }
        if ticket.generation != self.generation {
            debug!(
                "stale dashboard refresh {} dropped (current {})",
                ticket.generation, self.generation
            );
            return false;
        }
        self.loading = false;

        let clusters = match result {
            Ok(c) => c,
            Err(e) => {
                warn!("dashboard refresh failed: {}", e);
                self.notices.push(Notice::from(&e));
                return false;
            }
        };

        let snapshot = DashboardSnapshot {
            aggregates: Aggregates::compute(&clusters),
            statuses: status_counts(&clusters),
            usage: self.metrics.current().clamped(),
            range: self.range,
            refreshed_at: Utc::now(),
        };
        self.render_charts(&clusters, &snapshot);
        self.snapshot = Some(snapshot);
        true
    }

    /// Takes effect on the next refresh.
    pub fn set_range(&mut self, range: TimeRange) {
        self.range = range;
    }

    pub fn resize(&mut self) {
        if !self.torn_down {
            self.charts.resize_all();
        }
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.loading = false;
        self.charts.dispose_all();
    }

    fn render_charts(&mut self, clusters: &[Cluster], snapshot: &DashboardSnapshot) {
        let trend = self.metrics.trend(self.range.points());
        let trend_config = SeriesConfig::new(
            ChartKind::Line,
            format!("Resource usage ({})", self.range),
            self.range.labels(snapshot.refreshed_at),
            vec![
                Series {
                    name: Metric::Cpu.label().to_string(),
                    data: trend.iter().map(|u| u.clamped().cpu).collect(),
                },
                Series {
                    name: Metric::Memory.label().to_string(),
                    data: trend.iter().map(|u| u.clamped().memory).collect(),
                },
            ],
        );

        let status_config = SeriesConfig::new(
            ChartKind::Pie,
            "Cluster status",
            snapshot
                .statuses
                .iter()
                .map(|s| s.status.label().to_string())
                .collect(),
            vec![Series {
                name: "clusters".to_string(),
                data: snapshot.statuses.iter().map(|s| s.count as f64).collect(),
            }],
        );

        let mut busiest: Vec<&Cluster> = clusters.iter().collect();
        busiest.sort_by(|a, b| b.pod_count.cmp(&a.pod_count).then_with(|| a.name.cmp(&b.name)));
        busiest.truncate(CAPACITY_TOP_N);
        let capacity_config = SeriesConfig::new(
            ChartKind::Bar,
            "Nodes and pods per cluster",
            busiest.iter().map(|c| c.name.clone()).collect(),
            vec![
                Series {
                    name: "nodes".to_string(),
                    data: busiest.iter().map(|c| f64::from(c.node_count)).collect(),
                },
                Series {
                    name: "pods".to_string(),
                    data: busiest.iter().map(|c| f64::from(c.pod_count)).collect(),
                },
            ],
        );

        let usage = snapshot.usage;
        let gauges = [
            (CPU_CHART, Metric::Cpu, usage.cpu),
            (MEMORY_CHART, Metric::Memory, usage.memory),
            (DISK_CHART, Metric::Disk, usage.disk),
            (NETWORK_CHART, Metric::Network, usage.network),
        ];

        let mut drawn = 0;
        for (target, config) in [
            (TREND_CHART, &trend_config),
            (STATUS_CHART, &status_config),
            (CAPACITY_CHART, &capacity_config),
        ] {
            if self.charts.ensure(target, config) {
                drawn += 1;
            }
        }
        for (target, metric, value) in gauges {
            if self.charts.ensure(target, &SeriesConfig::gauge(metric.label(), value)) {
                drawn += 1;
            }
        }
        debug!("dashboard refreshed, {} charts drawn", drawn);
    }
}

/// Long-lived dashboard: a composer plus its auto-refresh timer.
pub struct DashboardSession {
    composer: Arc<Mutex<DashboardComposer>>,
    poller: std::sync::Mutex<Poller>,
}

impl DashboardSession {
    pub fn new(composer: DashboardComposer, interval: Duration) -> Self {
        Self {
            composer: Arc::new(Mutex::new(composer)),
            poller: std::sync::Mutex::new(Poller::new(interval)),
        }
    }

    pub fn composer(&self) -> &Arc<Mutex<DashboardComposer>> {
        &self.composer
    }

    pub fn refresh_interval(&self) -> Duration {
        self.poller().interval()
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        self.poller().is_enabled()
    }

    /// Turn the refresh timer on or off. Turning it on twice still leaves
    /// exactly one timer.
    pub fn set_auto_refresh(&self, enabled: bool) {
        let mut poller = self.poller();
        if enabled {
            let composer = self.composer.clone();
            poller.enable(move || {
                let composer = composer.clone();
                async move {
                    refresh_unlocked(&composer).await;
                }
            });
            info!("dashboard auto-refresh every {:?}", poller.interval());
        } else {
            poller.disable();
            info!("dashboard auto-refresh off");
        }
    }

    /// Refresh without holding the composer across the fetch, so readers
    /// see `loading` while it is pending.
    pub async fn refresh(&self) -> bool {
        refresh_unlocked(&self.composer).await
    }

    /// Refresh only when nothing has been drawn yet and no fetch is pending.
    pub async fn ensure_snapshot(&self) {
        let idle = {
            let composer = self.composer.lock().await;
            composer.snapshot().is_none() && !composer.is_loading()
        };
        if idle {
            self.refresh().await;
        }
    }

    pub async fn set_range(&self, range: TimeRange) -> bool {
        self.composer.lock().await.set_range(range);
        self.refresh().await
    }

    pub async fn resize(&self) {
        self.composer.lock().await.resize();
    }

    /// Stop the timer and release every chart.
    pub async fn teardown(&self) {
        self.poller().disable();
        let mut composer = self.composer.lock().await;
        let charts = composer.chart_count();
        composer.teardown();
        debug!("dashboard torn down, {} charts released", charts);
    }

    fn poller(&self) -> std::sync::MutexGuard<'_, Poller> {
        self.poller.lock().unwrap_or_else(|e| e.into_inner())
    }
}

async fn refresh_unlocked(composer: &Mutex<DashboardComposer>) -> bool {
    let Some(ticket) = composer.lock().await.begin_refresh() else {
        return false;
    };
    let result = ticket.fetch().await;
    composer.lock().await.finish_refresh(&ticket, result)
}
