//! Filtering and pagination over a cluster collection.
//!
//! Everything here is a pure derivation: the same collection, criteria and
//! pagination always produce the same page.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::cluster::{Cluster, ClusterStatus};

/// Page sizes the pager offers.
pub const PAGE_SIZES: [usize; 4] = [10, 20, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<ClusterStatus>,
    /// Carried with the search form; not applied when filtering.
    #[serde(default)]
    pub date_range: Option<DateRange>,
}

impl FilterCriteria {
    pub fn new(name: impl Into<String>, status: Option<ClusterStatus>) -> Self {
        Self {
            name: name.into(),
            status,
            date_range: None,
        }
    }

    pub fn matches(&self, cluster: &Cluster) -> bool {
        self.matches_name(cluster) && self.status.is_none_or(|s| cluster.status == s)
    }

    fn matches_name(&self, cluster: &Cluster) -> bool {
        self.name.is_empty() || cluster.name.to_lowercase().contains(&self.name.to_lowercase())
    }

    /// Equality on the fields that change which records pass.
    pub fn same_predicate(&self, other: &FilterCriteria) -> bool {
        self.name.to_lowercase() == other.name.to_lowercase() && self.status == other.status
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    page: usize,
    page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Page is raised to 1; a size outside [`PAGE_SIZES`] falls back to the default.
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: normalize_page_size(page_size),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn with_page(self, page: usize) -> Self {
        Self::new(page, self.page_size)
    }

    pub fn first_page(self) -> Self {
        self.with_page(1)
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }
}

pub fn normalize_page_size(size: usize) -> usize {
    if PAGE_SIZES.contains(&size) {
        size
    } else {
        DEFAULT_PAGE_SIZE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice {
    pub items: Vec<Cluster>,
    pub total: usize,
    pub pagination: Pagination,
}

/// Apply the filter to `records`, then cut out the requested page.
pub fn query(records: &[Cluster], criteria: &FilterCriteria, pagination: Pagination) -> PageSlice {
    let filtered: Vec<&Cluster> = records.iter().filter(|c| criteria.matches(c)).collect();
    let total = filtered.len();

    let items = filtered
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.page_size())
        .cloned()
        .collect();

    PageSlice {
        items,
        total,
        pagination,
    }
}
