use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::query::{FilterCriteria, Pagination};
use super::selection::SelectionTracker;
use crate::clients::DataSource;
use crate::error::{ConsoleError, ConsoleResult, Notice};
use crate::models::cluster::{Cluster, ClusterPage};

/// Snapshot of what a fetch was issued for. Completions are matched against
/// the view's latest generation so an older response can't overwrite a newer
/// one.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    pub criteria: FilterCriteria,
    pub pagination: Pagination,
}

/// State behind the cluster table: criteria, pager, visible rows, selection.
///
/// Selection is page-scoped: changing the filter, page or page size clears it,
/// and each completed fetch drops ids that are no longer on the visible page.
#[derive(Debug, Default)]
pub struct ListView {
    criteria: FilterCriteria,
    pagination: Pagination,
    selection: SelectionTracker,
    rows: Vec<Cluster>,
    total: usize,
    loading: bool,
    generation: u64,
    notices: Vec<Notice>,
}

impl ListView {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            pagination,
            ..Default::default()
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn rows(&self) -> &[Cluster] {
        &self.rows
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionTracker {
        &mut self.selection
    }

    /// Forward the table's selection-changed event.
    pub fn selection_changed<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.selection_changed(ids);
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Display name for a visible row, falling back to the id.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.rows
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
            .unwrap_or(id)
    }

    /// Returns true when the visible set may change and a refetch is due.
    pub fn set_filter(&mut self, criteria: FilterCriteria) -> bool {
        let changed = !self.criteria.same_predicate(&criteria);
        self.criteria = criteria;
        if changed {
            self.pagination = self.pagination.first_page();
            self.selection.clear();
        }
        changed
    }

    pub fn set_page(&mut self, page: usize) -> bool {
        let next = self.pagination.with_page(page);
        if next == self.pagination {
            return false;
        }
        self.pagination = next;
        self.selection.clear();
        true
    }

    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let next = Pagination::new(1, page_size);
        if next == self.pagination {
            return false;
        }
        self.pagination = next;
        self.selection.clear();
        true
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        FetchTicket {
            generation: self.generation,
            criteria: self.criteria.clone(),
            pagination: self.pagination,
        }
    }

    /// Apply a fetch result. Returns false if the ticket was superseded.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: ConsoleResult<ClusterPage>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "discarding stale cluster page (generation {} < {})",
                ticket.generation, self.generation
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(page) => {
                self.rows = page.records;
                self.total = page.total;
                let rows = &self.rows;
                self.selection.retain(|id| rows.iter().any(|c| c.id == id));
            }
            Err(ConsoleError::Cancelled) => {
                debug!("cluster list fetch cancelled");
            }
            Err(e) => {
                warn!("listing clusters failed: {}", e);
                self.notices.push(Notice::from(&e));
            }
        }
        true
    }

    /// Fetch the current page from `source`. Loading is cleared on every path,
    /// including cancellation.
    pub async fn refresh(&mut self, source: &dyn DataSource, cancel: &CancellationToken) -> bool {
        let ticket = self.begin_fetch();
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(ConsoleError::Cancelled),
            r = source.list_clusters(&ticket.criteria, ticket.pagination) => r,
        };
        self.complete_fetch(ticket, result)
    }
}
