use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Gauge,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<f64>,
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesConfig {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl SeriesConfig {
    pub fn gauge(title: impl Into<String>, value: f64) -> Self {
        let title = title.into();
        Self {
            kind: ChartKind::Gauge,
            labels: vec![title.clone()],
            series: vec![Series {
                name: title.clone(),
                data: vec![value],
            }],
            title,
            max: Some(100.0),
        }
    }

    pub fn new(kind: ChartKind, title: impl Into<String>, labels: Vec<String>, series: Vec<Series>) -> Self {
        Self {
            kind,
            title: title.into(),
            labels,
            series,
            max: None,
        }
    }
}

/// Live chart instance returned by a renderer.
pub trait ChartHandle: Send {
    fn set_option(&mut self, config: &SeriesConfig);
    fn resize(&mut self);
    fn dispose(self: Box<Self>);
}

/// Drawing surface. Targets must be mounted before a chart can be bound.
pub trait ChartRenderer: Send + Sync {
    fn is_mounted(&self, target: &str) -> bool;
    fn init(&self, target: &str, config: &SeriesConfig) -> Box<dyn ChartHandle>;
}

/// Chart instances owned by one view, keyed by target.
pub struct ChartSet {
    renderer: Arc<dyn ChartRenderer>,
    charts: BTreeMap<String, Box<dyn ChartHandle>>,
}

impl ChartSet {
    pub fn new(renderer: Arc<dyn ChartRenderer>) -> Self {
        Self {
            renderer,
            charts: BTreeMap::new(),
        }
    }

    /// Reconfigure the chart on `target`, creating it if needed. A target that
    /// isn't mounted is skipped and false is returned.
    pub fn ensure(&mut self, target: &str, config: &SeriesConfig) -> bool {
        if let Some(handle) = self.charts.get_mut(target) {
            handle.set_option(config);
            return true;
        }
        if !self.renderer.is_mounted(target) {
            debug!("chart target {} not mounted, skipping init", target);
            return false;
        }
        let handle = self.renderer.init(target, config);
        self.charts.insert(target.to_string(), handle);
        true
    }

    /// Throw away any existing instance on `target` and build a fresh one.
    pub fn reinit(&mut self, target: &str, config: &SeriesConfig) -> bool {
        if let Some(old) = self.charts.remove(target) {
            old.dispose();
        }
        self.ensure(target, config)
    }

    pub fn resize_all(&mut self) {
        for handle in self.charts.values_mut() {
            handle.resize();
        }
    }

    pub fn dispose_all(&mut self) {
        let charts = std::mem::take(&mut self.charts);
        if !charts.is_empty() {
            debug!("disposing {} charts", charts.len());
        }
        for handle in charts.into_values() {
            handle.dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

}

impl Drop for ChartSet {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

// --- In-process board ---

/// What a board target currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedChart {
    pub target: String,
    pub instance: u64,
    pub revision: u64,
    pub resizes: u64,
    pub config: SeriesConfig,
}

#[derive(Default)]
struct BoardInner {
    mounted: BTreeSet<String>,
    charts: BTreeMap<String, RenderedChart>,
    next_instance: u64,
}

/// Renderer that keeps chart configurations in memory so pages and the JSON
/// API can hand them to the browser. Cloning shares the board.
#[derive(Clone, Default)]
pub struct ChartBoard {
    inner: Arc<Mutex<BoardInner>>,
}

impl ChartBoard {
    pub fn with_targets<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let board = Self::default();
        for t in targets {
            board.mount(t);
        }
        board
    }

    pub fn mount(&self, target: impl Into<String>) {
        self.lock().mounted.insert(target.into());
    }

    pub fn rendered(&self) -> Vec<RenderedChart> {
        self.lock().charts.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BoardInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ChartRenderer for ChartBoard {
    fn is_mounted(&self, target: &str) -> bool {
        self.lock().mounted.contains(target)
    }

    fn init(&self, target: &str, config: &SeriesConfig) -> Box<dyn ChartHandle> {
        let mut inner = self.lock();
        inner.next_instance += 1;
        let instance = inner.next_instance;
        inner.charts.insert(
            target.to_string(),
            RenderedChart {
                target: target.to_string(),
                instance,
                revision: 1,
                resizes: 0,
                config: config.clone(),
            },
        );
        Box::new(BoardChart {
            board: self.clone(),
            target: target.to_string(),
            instance,
        })
    }
}

struct BoardChart {
    board: ChartBoard,
    target: String,
    instance: u64,
}

impl BoardChart {
    fn with_entry(&self, f: impl FnOnce(&mut RenderedChart)) {
        let mut inner = self.board.lock();
        if let Some(entry) = inner.charts.get_mut(&self.target) {
            if entry.instance == self.instance {
                f(entry);
            }
        }
    }
}

impl ChartHandle for BoardChart {
    fn set_option(&mut self, config: &SeriesConfig) {
        self.with_entry(|e| {
            e.config = config.clone();
            e.revision += 1;
        });
    }

    fn resize(&mut self) {
        self.with_entry(|e| e.resizes += 1);
    }

    fn dispose(self: Box<Self>) {
        let mut inner = self.board.lock();
        if inner
            .charts
            .get(&self.target)
            .is_some_and(|e| e.instance == self.instance)
        {
            inner.charts.remove(&self.target);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Renderer that counts every call made through it.
    #[derive(Default)]
    pub(crate) struct SpyRenderer {
        pub mounted: Mutex<BTreeSet<String>>,
        pub inits: Arc<AtomicUsize>,
        pub updates: Arc<AtomicUsize>,
        pub resizes: Arc<AtomicUsize>,
        pub disposes: Arc<AtomicUsize>,
        pub last: Arc<Mutex<BTreeMap<String, SeriesConfig>>>,
    }

    impl SpyRenderer {
        pub(crate) fn mounted(targets: &[&str]) -> Arc<Self> {
            let spy = Self::default();
            spy.mounted
                .lock()
                .unwrap()
                .extend(targets.iter().map(|t| t.to_string()));
            Arc::new(spy)
        }

        pub(crate) fn count(counter: &Arc<AtomicUsize>) -> usize {
            counter.load(Ordering::SeqCst)
        }
    }

    struct SpyHandle {
        target: String,
        updates: Arc<AtomicUsize>,
        resizes: Arc<AtomicUsize>,
        disposes: Arc<AtomicUsize>,
        last: Arc<Mutex<BTreeMap<String, SeriesConfig>>>,
    }

    impl ChartHandle for SpyHandle {
        fn set_option(&mut self, config: &SeriesConfig) {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.last.lock().unwrap().insert(self.target.clone(), config.clone());
        }
        fn resize(&mut self) {
            self.resizes.fetch_add(1, Ordering::SeqCst);
        }
        fn dispose(self: Box<Self>) {
            self.disposes.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ChartRenderer for SpyRenderer {
        fn is_mounted(&self, target: &str) -> bool {
            self.mounted.lock().unwrap().contains(target)
        }

        fn init(&self, target: &str, config: &SeriesConfig) -> Box<dyn ChartHandle> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            self.last.lock().unwrap().insert(target.to_string(), config.clone());
            Box::new(SpyHandle {
                target: target.to_string(),
                updates: self.updates.clone(),
                resizes: self.resizes.clone(),
                disposes: self.disposes.clone(),
                last: self.last.clone(),
            })
        }
    }

    #[test]
    fn unmounted_target_is_a_noop() {
        let spy = SpyRenderer::mounted(&[]);
        let mut set = ChartSet::new(spy.clone());
        assert!(!set.ensure("trend", &SeriesConfig::gauge("cpu", 10.0)));
        assert_eq!(set.len(), 0);
        assert_eq!(SpyRenderer::count(&spy.inits), 0);
    }

    #[test]
    fn ensure_inits_once_then_updates_in_place() {
        let spy = SpyRenderer::mounted(&["cpu"]);
        let mut set = ChartSet::new(spy.clone());
        set.ensure("cpu", &SeriesConfig::gauge("cpu", 10.0));
        set.ensure("cpu", &SeriesConfig::gauge("cpu", 20.0));
        assert_eq!(SpyRenderer::count(&spy.inits), 1);
        assert_eq!(SpyRenderer::count(&spy.updates), 1);
        assert_eq!(spy.last.lock().unwrap()["cpu"].series[0].data, vec![20.0]);
    }

    #[test]
    fn reinit_disposes_previous_instance() {
        let spy = SpyRenderer::mounted(&["cpu"]);
        let mut set = ChartSet::new(spy.clone());
        set.ensure("cpu", &SeriesConfig::gauge("cpu", 10.0));
        set.reinit("cpu", &SeriesConfig::gauge("cpu", 30.0));
        assert_eq!(SpyRenderer::count(&spy.inits), 2);
        assert_eq!(SpyRenderer::count(&spy.disposes), 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn dropping_the_set_disposes_everything() {
        let spy = SpyRenderer::mounted(&["a", "b"]);
        {
            let mut set = ChartSet::new(spy.clone());
            set.ensure("a", &SeriesConfig::gauge("a", 1.0));
            set.ensure("b", &SeriesConfig::gauge("b", 2.0));
        }
        assert_eq!(SpyRenderer::count(&spy.disposes), 2);
    }

    #[test]
    fn board_tracks_revisions_and_disposal() {
        let board = ChartBoard::with_targets(["gauge"]);
        let mut set = ChartSet::new(Arc::new(board.clone()));
        set.ensure("gauge", &SeriesConfig::gauge("cpu", 5.0));
        set.ensure("gauge", &SeriesConfig::gauge("cpu", 6.0));
        set.resize_all();

        let chart = board.rendered().remove(0);
        assert_eq!(chart.target, "gauge");
        assert_eq!(chart.revision, 2);
        assert_eq!(chart.resizes, 1);
        assert_eq!(chart.config.series[0].data, vec![6.0]);

        set.dispose_all();
        assert!(board.rendered().is_empty());
    }

    #[test]
    fn stale_board_handle_does_not_touch_new_instance() {
        let board = ChartBoard::with_targets(["g"]);
        let mut old = board.init("g", &SeriesConfig::gauge("g", 1.0));
        let _new = board.init("g", &SeriesConfig::gauge("g", 2.0));
        old.set_option(&SeriesConfig::gauge("g", 99.0));
        old.dispose();
        let chart = board.rendered().remove(0);
        assert_eq!(chart.config.series[0].data, vec![2.0]);
    }
}
