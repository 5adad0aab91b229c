use askama::Template;
use async_trait::async_trait;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::api::error_status;
use super::ListParams;
use crate::console::actions::{
    ActionDispatcher, ActionOutcome, ConfirmPrompt, Confirmer, LIST_PATH, Navigator, RowAction,
};
use crate::console::charts::{ChartBoard, RenderedChart};
use crate::console::dashboard::TimeRange;
use crate::console::detail::{
    CPU_GAUGE, DetailResolver, DetailTab, DetailView, MEMORY_GAUGE, Resolution,
};
use crate::console::list::ListView;
use crate::console::query::{PAGE_SIZES, Pagination};
use crate::error::{ConsoleError, Notice};
use crate::helpers::{format_percent, human_duration_secs, human_time};
use crate::models::cluster::{ClusterDraft, ClusterStatus};
use crate::models::views::*;
use crate::AppState;

// --- Request-scoped collaborators ---

/// Navigator for a single request: records where an action wants to go so
/// the handler can answer with a redirect.
struct RequestNavigator {
    params: HashMap<String, String>,
    target: Mutex<Option<String>>,
}

impl RequestNavigator {
    fn new(params: HashMap<String, String>) -> Self {
        Self {
            params,
            target: Mutex::new(None),
        }
    }

    fn take_target(&self) -> Option<String> {
        self.target.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

impl Navigator for RequestNavigator {
    fn navigate_to(&self, path: &str) {
        debug!("navigating to {}", path);
        *self.target.lock().unwrap_or_else(|e| e.into_inner()) = Some(path.to_string());
    }

    fn current_params(&self) -> HashMap<String, String> {
        self.params.clone()
    }
}

/// Two-step confirmation over plain forms. The first submission has no
/// `confirm=yes` and is declined with the prompt kept for the confirm page.
struct FormConfirmer {
    confirmed: bool,
    prompt: Mutex<Option<ConfirmPrompt>>,
}

impl FormConfirmer {
    fn new(confirmed: bool) -> Self {
        Self {
            confirmed,
            prompt: Mutex::new(None),
        }
    }

    fn take_prompt(&self) -> Option<ConfirmPrompt> {
        self.prompt.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

#[async_trait]
impl Confirmer for FormConfirmer {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        *self.prompt.lock().unwrap_or_else(|e| e.into_inner()) = Some(prompt.clone());
        self.confirmed
    }
}

/// Parse a row action button value: `view:<id>`, `edit:<id>`, `delete:<id>`,
/// `batch-delete` or `create`.
fn parse_action(raw: &str) -> Result<RowAction, ConsoleError> {
    let raw = raw.trim();
    match raw.split_once(':') {
        Some((verb, id)) if !id.trim().is_empty() => {
            let id = id.trim().to_string();
            match verb {
                "view" => Ok(RowAction::View(id)),
                "edit" => Ok(RowAction::Edit(id)),
                "delete" => Ok(RowAction::Delete(id)),
                _ => Err(ConsoleError::Validation(format!("unknown action {:?}", raw))),
            }
        }
        None if raw == "batch-delete" => Ok(RowAction::BatchDelete),
        None if raw == "create" => Ok(RowAction::Create(ClusterDraft::default())),
        _ => Err(ConsoleError::Validation(format!("unknown action {:?}", raw))),
    }
}

// --- Shared view pieces ---

#[derive(Debug, Clone)]
struct OptionView {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Debug, Clone)]
struct PageLink {
    number: usize,
    current: bool,
}

#[derive(Debug, Clone)]
struct ChartView {
    target: String,
    title: String,
    config_json: String,
}

impl ChartView {
    fn build(chart: &RenderedChart) -> Self {
        Self {
            target: chart.target.clone(),
            title: chart.config.title.clone(),
            config_json: serde_json::to_string(&chart.config).unwrap_or_default(),
        }
    }
}

fn render_template(tmpl: &impl Template) -> Response {
    render_with_status(StatusCode::OK, tmpl)
}

fn render_with_status(status: StatusCode, tmpl: &impl Template) -> Response {
    match tmpl.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn dashboard_crumb() -> Breadcrumb {
    Breadcrumb::new("Dashboard", "/ui/")
}

fn clusters_crumb() -> Breadcrumb {
    Breadcrumb::new("Clusters", LIST_PATH)
}

// --- Dashboard ---

#[derive(Debug, Clone)]
struct UsageRow {
    label: String,
    bar: UsageBar,
}

#[derive(Debug, Clone)]
struct StatusRow {
    label: String,
    class: String,
    count: usize,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    app_title: String,
    title: String,
    current_nav: String,
    breadcrumbs: Vec<Breadcrumb>,
    notices: Vec<Notice>,
    has_snapshot: bool,
    loading: bool,
    total: usize,
    running: usize,
    nodes: u64,
    pods: u64,
    usage: Vec<UsageRow>,
    statuses: Vec<StatusRow>,
    refreshed: String,
    ranges: Vec<OptionView>,
    auto_refresh: bool,
    interval: String,
    charts: Vec<ChartView>,
}

pub async fn handle_dashboard(State(state): State<AppState>) -> Response {
    state.dashboard.ensure_snapshot().await;
    let mut composer = state.dashboard.composer().lock().await;
    let loading = composer.is_loading();
    let mut notices = composer.take_notices();
    let snapshot = composer.snapshot().cloned();
    let range = composer.range();
    drop(composer);

    let auto_refresh = state.dashboard.auto_refresh_enabled();
    let interval = human_duration_secs(state.dashboard.refresh_interval().as_secs());
    if auto_refresh {
        notices.push(Notice::info(format!("Auto-refresh every {}", interval)));
    }

    let mut tmpl = DashboardTemplate {
        app_title: state.config.title.clone(),
        title: "Dashboard".to_string(),
        current_nav: "dashboard".to_string(),
        breadcrumbs: vec![dashboard_crumb()],
        notices,
        has_snapshot: snapshot.is_some(),
        loading,
        total: 0,
        running: 0,
        nodes: 0,
        pods: 0,
        usage: Vec::new(),
        statuses: Vec::new(),
        refreshed: "never".to_string(),
        ranges: TimeRange::ALL
            .into_iter()
            .map(|r| OptionView {
                value: r.as_str().to_string(),
                label: r.as_str().to_string(),
                selected: r == range,
            })
            .collect(),
        auto_refresh,
        interval,
        charts: state.board.rendered().iter().map(ChartView::build).collect(),
    };

    if let Some(snap) = snapshot {
        tmpl.total = snap.aggregates.total;
        tmpl.running = snap.aggregates.running;
        tmpl.nodes = snap.aggregates.nodes;
        tmpl.pods = snap.aggregates.pods;
        tmpl.usage = [
            (Metric::Cpu, snap.usage.cpu),
            (Metric::Memory, snap.usage.memory),
            (Metric::Disk, snap.usage.disk),
            (Metric::Network, snap.usage.network),
        ]
        .into_iter()
        .map(|(metric, value)| UsageRow {
            label: metric.label().to_string(),
            bar: UsageBar::new(metric, value),
        })
        .collect();
        tmpl.statuses = snap
            .statuses
            .iter()
            .map(|s| StatusRow {
                label: s.status.label().to_string(),
                class: status_badge(s.status).to_string(),
                count: s.count,
            })
            .collect();
        tmpl.refreshed = human_time(Some(snap.refreshed_at));
    }

    render_template(&tmpl)
}

pub async fn handle_dashboard_refresh(State(state): State<AppState>) -> Redirect {
    state.dashboard.refresh().await;
    Redirect::to("/ui/")
}

#[derive(Deserialize)]
pub struct AutoRefreshForm {
    #[serde(default)]
    enabled: String,
}

pub async fn handle_dashboard_auto_refresh(
    State(state): State<AppState>,
    Form(form): Form<AutoRefreshForm>,
) -> Redirect {
    state.dashboard.set_auto_refresh(form.enabled == "on");
    Redirect::to("/ui/")
}

#[derive(Deserialize)]
pub struct RangeForm {
    range: String,
}

pub async fn handle_dashboard_range(
    State(state): State<AppState>,
    Form(form): Form<RangeForm>,
) -> Response {
    match form.range.parse::<TimeRange>() {
        Ok(range) => {
            state.dashboard.set_range(range).await;
            Redirect::to("/ui/").into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e).into_response(),
    }
}

// --- Clusters ---

#[derive(Template)]
#[template(path = "clusters.html")]
struct ClustersTemplate {
    app_title: String,
    title: String,
    current_nav: String,
    breadcrumbs: Vec<Breadcrumb>,
    notices: Vec<Notice>,
    rows: Vec<ClusterRowView>,
    filter_name: String,
    filter_status: String,
    statuses: Vec<OptionView>,
    page_sizes: Vec<OptionView>,
    page: usize,
    page_size: usize,
    total: usize,
    total_pages: usize,
    pages: Vec<PageLink>,
    has_prev: bool,
    has_next: bool,
    prev_page: usize,
    next_page: usize,
    selected_count: usize,
    loading: bool,
}

/// Rebuild the list view a request describes and fetch its page.
async fn load_list(state: &AppState, params: &ListParams) -> Result<ListView, ConsoleError> {
    let default_size = state.config.list.default_page_size;
    let criteria = params.criteria()?;
    let wanted = params.pagination(default_size);

    let mut view = ListView::new(Pagination::new(1, default_size));
    view.set_filter(criteria);
    view.set_page_size(wanted.page_size());
    view.set_page(wanted.page());
    refresh_list(state, &mut view).await;

    // A page past the end (e.g. after deletions) falls back to the last one.
    // A failed fetch has no total to fall back on.
    let last = view.pagination().total_pages(view.total());
    if view.notices().is_empty() && view.rows().is_empty() && view.pagination().page() > last {
        view.set_page(last);
        refresh_list(state, &mut view).await;
    }
    Ok(view)
}

async fn refresh_list(state: &AppState, view: &mut ListView) {
    view.refresh(state.source.as_ref(), &CancellationToken::new()).await;
}

fn build_clusters_page(state: &AppState, view: &mut ListView) -> ClustersTemplate {
    let pagination = view.pagination();
    let total = view.total();
    let total_pages = pagination.total_pages(total);
    let page = pagination.page();
    let criteria = view.criteria().clone();
    let selection = view.selection();

    let rows = view
        .rows()
        .iter()
        .map(|c| ClusterRowView::build(c, selection.contains(&c.id)))
        .collect();
    let selected_count = selection.count();

    let mut statuses = vec![OptionView {
        value: String::new(),
        label: "All statuses".to_string(),
        selected: criteria.status.is_none(),
    }];
    statuses.extend(ClusterStatus::ALL.into_iter().map(|s| OptionView {
        value: s.as_str().to_string(),
        label: s.label().to_string(),
        selected: criteria.status == Some(s),
    }));

    ClustersTemplate {
        app_title: state.config.title.clone(),
        title: "Clusters".to_string(),
        current_nav: "clusters".to_string(),
        breadcrumbs: vec![dashboard_crumb(), clusters_crumb()],
        notices: view.take_notices(),
        rows,
        filter_name: criteria.name.clone(),
        filter_status: criteria.status.map(|s| s.as_str().to_string()).unwrap_or_default(),
        statuses,
        page_sizes: PAGE_SIZES
            .into_iter()
            .map(|size| OptionView {
                value: size.to_string(),
                label: format!("{} / page", size),
                selected: size == pagination.page_size(),
            })
            .collect(),
        page,
        page_size: pagination.page_size(),
        total,
        total_pages,
        pages: (1..=total_pages)
            .map(|number| PageLink {
                number,
                current: number == page,
            })
            .collect(),
        has_prev: page > 1,
        has_next: page < total_pages,
        prev_page: page.saturating_sub(1).max(1),
        next_page: (page + 1).min(total_pages),
        selected_count,
        loading: view.is_loading(),
    }
}

pub async fn handle_clusters(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    match load_list(&state, &params).await {
        Ok(mut view) => render_template(&build_clusters_page(&state, &mut view)),
        Err(e) => {
            // Bad filter values: show the unfiltered list with the reason.
            let mut view = match load_list(&state, &ListParams::default()).await {
                Ok(v) => v,
                Err(e) => return (error_status(&e), e.to_string()).into_response(),
            };
            view.push_notice(Notice::from(&e));
            render_with_status(StatusCode::BAD_REQUEST, &build_clusters_page(&state, &mut view))
        }
    }
}

#[derive(Template)]
#[template(path = "confirm.html")]
struct ConfirmTemplate {
    app_title: String,
    title: String,
    current_nav: String,
    breadcrumbs: Vec<Breadcrumb>,
    notices: Vec<Notice>,
    heading: String,
    message: String,
    action: String,
    ids: Vec<String>,
    filter_name: String,
    filter_status: String,
    page: usize,
    page_size: usize,
}

pub async fn handle_cluster_action(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let params = ListParams::from_pairs(&pairs);
    let field = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    };
    let raw_action = field("action").to_string();
    let confirmed = field("confirm") == "yes";
    let ids: Vec<String> = pairs
        .iter()
        .filter(|(k, _)| k == "ids")
        .map(|(_, v)| v.clone())
        .collect();

    let action = match parse_action(&raw_action) {
        Ok(a) => a,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let mut view = match load_list(&state, &params).await {
        Ok(v) => v,
        Err(e) => return (error_status(&e), e.to_string()).into_response(),
    };
    view.selection_changed(ids);

    let confirmer = FormConfirmer::new(confirmed);
    let navigator = RequestNavigator::new(HashMap::new());
    let dispatcher = ActionDispatcher::new(
        state.source.as_ref(),
        state.mutations.as_ref(),
        &confirmer,
        &navigator,
    );

    match dispatcher.dispatch(&mut view, action).await {
        ActionOutcome::Navigated(path) => {
            Redirect::to(&navigator.take_target().unwrap_or(path)).into_response()
        }
        ActionOutcome::Declined => match confirmer.take_prompt() {
            Some(prompt) => {
                let pagination = view.pagination();
                let criteria = view.criteria();
                let tmpl = ConfirmTemplate {
                    app_title: state.config.title.clone(),
                    title: prompt.title.clone(),
                    current_nav: "clusters".to_string(),
                    breadcrumbs: vec![
                        dashboard_crumb(),
                        clusters_crumb(),
                        Breadcrumb::new(prompt.title.clone(), ""),
                    ],
                    notices: Vec::new(),
                    heading: prompt.title,
                    message: prompt.message,
                    action: raw_action,
                    ids: prompt.ids,
                    filter_name: criteria.name.clone(),
                    filter_status: criteria
                        .status
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_default(),
                    page: pagination.page(),
                    page_size: pagination.page_size(),
                };
                render_template(&tmpl)
            }
            None => Redirect::to(LIST_PATH).into_response(),
        },
        ActionOutcome::Deleted { .. } | ActionOutcome::Rejected => {
            render_template(&build_clusters_page(&state, &mut view))
        }
    }
}

// --- Cluster detail ---

#[derive(Debug, Clone)]
struct TabView {
    name: String,
    label: String,
    active: bool,
}

#[derive(Template)]
#[template(path = "cluster_detail.html")]
struct ClusterDetailTemplate {
    app_title: String,
    title: String,
    current_nav: String,
    breadcrumbs: Vec<Breadcrumb>,
    notices: Vec<Notice>,
    cluster: ClusterRowView,
    description: String,
    labels: Vec<LabelView>,
    disk: UsageBar,
    cpu_value: String,
    memory_value: String,
    tab: String,
    tabs: Vec<TabView>,
    nodes: Vec<MemberNodeView>,
    pods: Vec<MemberPodView>,
    events: Vec<EventView>,
    charts: Vec<ChartView>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate {
    app_title: String,
    title: String,
    current_nav: String,
    breadcrumbs: Vec<Breadcrumb>,
    notices: Vec<Notice>,
    heading: String,
    message: String,
    back_url: String,
}

#[derive(Deserialize)]
pub struct DetailParams {
    #[serde(default)]
    tab: Option<String>,
}

pub async fn handle_cluster_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DetailParams>,
) -> Response {
    let tab = params
        .tab
        .as_deref()
        .and_then(|t| t.parse::<DetailTab>().ok())
        .unwrap_or_default();
    render_detail(&state, id, tab, Vec::new()).await
}

pub async fn handle_cluster_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let notice = Notice::from(&ConsoleError::NotImplemented("editing clusters"));
    render_detail(&state, id, DetailTab::Overview, vec![notice]).await
}

async fn render_detail(
    state: &AppState,
    id: String,
    tab: DetailTab,
    mut notices: Vec<Notice>,
) -> Response {
    let navigator = RequestNavigator::new(HashMap::from([("id".to_string(), id.clone())]));
    let resolution = match DetailResolver::new(state.source.as_ref())
        .resolve_current(&navigator)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!("loading cluster {}: {}", id, e);
            let tmpl = NotFoundTemplate {
                app_title: state.config.title.clone(),
                title: "Cluster unavailable".to_string(),
                current_nav: "clusters".to_string(),
                breadcrumbs: vec![dashboard_crumb(), clusters_crumb()],
                notices: vec![Notice::from(&e)],
                heading: "Cluster unavailable".to_string(),
                message: format!("Cluster {:?} could not be loaded.", id),
                back_url: LIST_PATH.to_string(),
            };
            return render_with_status(error_status(&e), &tmpl);
        }
    };

    let board = ChartBoard::with_targets([CPU_GAUGE, MEMORY_GAUGE]);
    let mut view = DetailView::new(resolution, Arc::new(board.clone()));
    view.switch_tab(tab);
    debug!("cluster {} {} tab drew {} charts", id, tab.as_str(), view.chart_count());
    let charts: Vec<ChartView> = board.rendered().iter().map(ChartView::build).collect();
    view.teardown();

    let detail = match view.resolution() {
        Resolution::Found(detail) => detail,
        Resolution::NotFound { id } => {
            let tmpl = NotFoundTemplate {
                app_title: state.config.title.clone(),
                title: "Cluster not found".to_string(),
                current_nav: "clusters".to_string(),
                breadcrumbs: vec![dashboard_crumb(), clusters_crumb()],
                notices,
                heading: "Cluster not found".to_string(),
                message: format!("No cluster with id {:?} exists. It may have been deleted.", id),
                back_url: view.resolution().back_path().to_string(),
            };
            return render_with_status(StatusCode::NOT_FOUND, &tmpl);
        }
    };

    let cluster = &detail.cluster;
    if cluster.status == ClusterStatus::Error {
        notices.push(Notice::error(format!("Cluster \"{}\" reports an error state", cluster.name)));
    }

    let tmpl = ClusterDetailTemplate {
        app_title: state.config.title.clone(),
        title: cluster.name.clone(),
        current_nav: "clusters".to_string(),
        breadcrumbs: vec![
            dashboard_crumb(),
            clusters_crumb(),
            Breadcrumb::new(cluster.name.clone(), format!("{}/{}", LIST_PATH, cluster.id)),
        ],
        notices,
        cluster: ClusterRowView::build(cluster, false),
        description: cluster.description.clone(),
        labels: build_label_views(cluster),
        disk: UsageBar::new(Metric::Disk, cluster.usage.disk),
        cpu_value: format_percent(cluster.usage.cpu),
        memory_value: format_percent(cluster.usage.memory),
        tab: view.tab().as_str().to_string(),
        tabs: DetailTab::ALL
            .into_iter()
            .map(|t| TabView {
                name: t.as_str().to_string(),
                label: t.label().to_string(),
                active: t == view.tab(),
            })
            .collect(),
        nodes: detail.inventory.nodes.iter().map(MemberNodeView::build).collect(),
        pods: detail.inventory.pods.iter().map(MemberPodView::build).collect(),
        events: detail.inventory.events.iter().rev().map(EventView::build).collect(),
        charts,
    };

    render_template(&tmpl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockBackend;
    use crate::clients::DataSource;
    use crate::console::query::FilterCriteria;
    use crate::error::ConsoleResult;
    use crate::models::cluster::{Cluster, ClusterPage, Inventory};
    use crate::routes::tests::state_with;
    use crate::store::ClusterStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn row_actions_parse() {
        assert_eq!(
            parse_action("view:cls-001").unwrap(),
            RowAction::View("cls-001".to_string())
        );
        assert_eq!(
            parse_action("edit:cls-002").unwrap(),
            RowAction::Edit("cls-002".to_string())
        );
        assert_eq!(
            parse_action(" delete:cls-003 ").unwrap(),
            RowAction::Delete("cls-003".to_string())
        );
        assert_eq!(parse_action("batch-delete").unwrap(), RowAction::BatchDelete);
        assert_eq!(
            parse_action("create").unwrap(),
            RowAction::Create(ClusterDraft::default())
        );
    }

    #[test]
    fn malformed_actions_are_rejected() {
        for raw in ["", "view:", "restart:cls-001", "delete-all"] {
            assert!(
                matches!(parse_action(raw), Err(ConsoleError::Validation(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[tokio::test]
    async fn form_confirmer_keeps_prompt_for_confirm_page() {
        let confirmer = FormConfirmer::new(false);
        let prompt = ConfirmPrompt {
            title: "Delete cluster".to_string(),
            message: "Delete cluster \"a\"?".to_string(),
            ids: vec!["a".to_string()],
        };
        assert!(!confirmer.confirm(&prompt).await);
        assert_eq!(confirmer.take_prompt(), Some(prompt));
        assert_eq!(confirmer.take_prompt(), None);
    }

    #[test]
    fn request_navigator_records_last_target() {
        let navigator = RequestNavigator::new(HashMap::from([("id".to_string(), "x".to_string())]));
        navigator.navigate_to("/ui/clusters/x");
        assert_eq!(navigator.take_target().as_deref(), Some("/ui/clusters/x"));
        assert_eq!(navigator.current_params()["id"], "x");
    }

    struct DownSource {
        lists: AtomicUsize,
    }

    #[async_trait]
    impl DataSource for DownSource {
        async fn list_clusters(&self, _: &FilterCriteria, _: Pagination) -> ConsoleResult<ClusterPage> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            Err(ConsoleError::FetchFailed("backend down".to_string()))
        }
        async fn get_cluster(&self, _: &str) -> ConsoleResult<Option<Cluster>> {
            Ok(None)
        }
        async fn all_clusters(&self) -> ConsoleResult<Vec<Cluster>> {
            Ok(Vec::new())
        }
        async fn cluster_inventory(&self, _: &str) -> ConsoleResult<Option<Inventory>> {
            Ok(None)
        }
    }

    fn page_params(page: usize) -> ListParams {
        ListParams {
            page: Some(page),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn page_past_the_end_falls_back_to_last() {
        let backend = Arc::new(MockBackend::new(
            Arc::new(ClusterStore::seeded(25, 3)),
            Duration::ZERO,
        ));
        let state = state_with(backend.clone(), backend);

        let view = load_list(&state, &page_params(9)).await.unwrap();
        assert_eq!(view.pagination().page(), 3);
        assert_eq!(view.rows().len(), 5);
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn failed_fetch_reports_once_without_fallback() {
        let source = Arc::new(DownSource {
            lists: AtomicUsize::new(0),
        });
        let sink = Arc::new(MockBackend::new(Arc::new(ClusterStore::new(Vec::new())), Duration::ZERO));
        let state = state_with(source.clone(), sink);

        let view = load_list(&state, &page_params(4)).await.unwrap();
        assert_eq!(source.lists.load(Ordering::SeqCst), 1);
        assert_eq!(view.notices().len(), 1);
        assert_eq!(view.pagination().page(), 4);
    }
}
