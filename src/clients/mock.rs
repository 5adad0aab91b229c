use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{DataSource, MutationSink};
use crate::console::query::{query, FilterCriteria, Pagination};
use crate::error::{ConsoleError, ConsoleResult};
use crate::models::cluster::{Cluster, ClusterDraft, ClusterPage, Inventory};
use crate::store::ClusterStore;

/// Backend over the in-memory store, with an artificial round-trip delay.
pub struct MockBackend {
    store: Arc<ClusterStore>,
    latency: Duration,
}

impl MockBackend {
    pub fn new(store: Arc<ClusterStore>, latency: Duration) -> Self {
        Self { store, latency }
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl DataSource for MockBackend {
    async fn list_clusters(
        &self,
        criteria: &FilterCriteria,
        pagination: Pagination,
    ) -> ConsoleResult<ClusterPage> {
        self.round_trip().await;
        let slice = query(&self.store.snapshot(), criteria, pagination);
        debug!(
            "mock list page={} size={} total={}",
            pagination.page(),
            pagination.page_size(),
            slice.total
        );
        Ok(ClusterPage {
            records: slice.items,
            total: slice.total,
        })
    }

    async fn get_cluster(&self, id: &str) -> ConsoleResult<Option<Cluster>> {
        self.round_trip().await;
        Ok(self.store.get(id))
    }

    async fn all_clusters(&self) -> ConsoleResult<Vec<Cluster>> {
        self.round_trip().await;
        Ok(self.store.snapshot())
    }

    async fn cluster_inventory(&self, id: &str) -> ConsoleResult<Option<Inventory>> {
        self.round_trip().await;
        Ok(self.store.inventory(id))
    }
}

#[async_trait]
impl MutationSink for MockBackend {
    async fn delete_cluster(&self, id: &str) -> ConsoleResult<()> {
        self.round_trip().await;
        match self.store.remove(id) {
            Some(c) => {
                info!("deleted cluster {} ({})", c.name, c.id);
                Ok(())
            }
            None => Err(ConsoleError::NotFound(id.to_string())),
        }
    }

    async fn create_cluster(&self, _draft: &ClusterDraft) -> ConsoleResult<Cluster> {
        Err(ConsoleError::NotImplemented("create cluster"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cluster::ClusterStatus;

    fn backend() -> MockBackend {
        MockBackend::new(Arc::new(ClusterStore::seeded(25, 11)), Duration::ZERO)
    }

    #[tokio::test]
    async fn list_pages_through_store() {
        let b = backend();
        let page = b
            .list_clusters(&FilterCriteria::default(), Pagination::new(3, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.records.len(), 5);
    }

    #[tokio::test]
    async fn list_applies_status_filter() {
        let b = backend();
        let criteria = FilterCriteria::new("", Some(ClusterStatus::Running));
        let page = b.list_clusters(&criteria, Pagination::new(1, 100)).await.unwrap();
        assert!(page.records.iter().all(|c| c.status == ClusterStatus::Running));
        assert_eq!(page.records.len(), page.total);
    }

    #[tokio::test]
    async fn delete_removes_then_reports_not_found() {
        let b = backend();
        b.delete_cluster("cls-001").await.unwrap();
        assert_eq!(b.get_cluster("cls-001").await.unwrap(), None);
        assert_eq!(
            b.delete_cluster("cls-001").await,
            Err(ConsoleError::NotFound("cls-001".to_string()))
        );
    }

    #[tokio::test]
    async fn create_is_not_implemented() {
        let b = backend();
        let err = b.create_cluster(&ClusterDraft::default()).await.unwrap_err();
        assert_eq!(err, ConsoleError::NotImplemented("create cluster"));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_simulated() {
        let b = MockBackend::new(Arc::new(ClusterStore::seeded(3, 1)), Duration::from_millis(300));
        let start = tokio::time::Instant::now();
        b.all_clusters().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
