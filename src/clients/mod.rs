pub mod mock;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::console::query::{FilterCriteria, Pagination, PAGE_SIZES};
use crate::error::{ConsoleError, ConsoleResult};
use crate::models::cluster::{Cluster, ClusterDraft, ClusterPage, Inventory};

/// Read side of the cluster backend.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn list_clusters(
        &self,
        criteria: &FilterCriteria,
        pagination: Pagination,
    ) -> ConsoleResult<ClusterPage>;

    /// `Ok(None)` when no cluster has this id.
    async fn get_cluster(&self, id: &str) -> ConsoleResult<Option<Cluster>>;

    async fn all_clusters(&self) -> ConsoleResult<Vec<Cluster>>;

    async fn cluster_inventory(&self, id: &str) -> ConsoleResult<Option<Inventory>>;
}

/// Write side of the cluster backend. Each call stands alone; there is no
/// transaction across a batch.
#[async_trait]
pub trait MutationSink: Send + Sync {
    async fn delete_cluster(&self, id: &str) -> ConsoleResult<()>;

    async fn create_cluster(&self, draft: &ClusterDraft) -> ConsoleResult<Cluster>;
}

/// Backend that talks to another console's JSON API.
pub struct HttpBackend {
    pub address: String,
    http: Client,
}

impl HttpBackend {
    pub fn new(address: String, timeout: Duration) -> ConsoleResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConsoleError::FetchFailed(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            address: address.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ConsoleResult<Option<T>> {
        let resp = self
            .http
            .get(format!("{}{}", self.address, path))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| ConsoleError::FetchFailed(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if resp.status().as_u16() >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConsoleError::FetchFailed(format!(
                "GET {} returned error: {}",
                path, body
            )));
        }
        resp.json()
            .await
            .map(Some)
            .map_err(|e| ConsoleError::FetchFailed(format!("decoding {}: {}", path, e)))
    }
}

#[async_trait]
impl DataSource for HttpBackend {
    async fn list_clusters(
        &self,
        criteria: &FilterCriteria,
        pagination: Pagination,
    ) -> ConsoleResult<ClusterPage> {
        let mut query = vec![
            ("page", pagination.page().to_string()),
            ("pageSize", pagination.page_size().to_string()),
        ];
        if !criteria.name.is_empty() {
            query.push(("name", criteria.name.clone()));
        }
        if let Some(status) = criteria.status {
            query.push(("status", status.to_string()));
        }

        self.get_json("/api/v1/clusters", &query)
            .await?
            .ok_or_else(|| ConsoleError::FetchFailed("cluster list endpoint missing".to_string()))
    }

    async fn get_cluster(&self, id: &str) -> ConsoleResult<Option<Cluster>> {
        self.get_json(&format!("/api/v1/clusters/{}", id), &[]).await
    }

    async fn all_clusters(&self) -> ConsoleResult<Vec<Cluster>> {
        let criteria = FilterCriteria::default();
        let size = PAGE_SIZES[PAGE_SIZES.len() - 1];
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.list_clusters(&criteria, Pagination::new(page, size)).await?;
            let done = batch.records.is_empty() || all.len() + batch.records.len() >= batch.total;
            all.extend(batch.records);
            if done {
                break;
            }
            page += 1;
        }

        debug!("fetched {} clusters from {}", all.len(), self.address);
        Ok(all)
    }

    async fn cluster_inventory(&self, id: &str) -> ConsoleResult<Option<Inventory>> {
        self.get_json(&format!("/api/v1/clusters/{}/inventory", id), &[])
            .await
    }
}

#[async_trait]
impl MutationSink for HttpBackend {
    async fn delete_cluster(&self, id: &str) -> ConsoleResult<()> {
        let resp = self
            .http
            .delete(format!("{}/api/v1/clusters/{}", self.address, id))
            .send()
            .await
            .map_err(|e| ConsoleError::MutationFailed(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ConsoleError::NotFound(id.to_string()));
        }
        if resp.status().as_u16() >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConsoleError::MutationFailed(format!(
                "delete cluster failed: {}",
                body
            )));
        }
        Ok(())
    }

    async fn create_cluster(&self, draft: &ClusterDraft) -> ConsoleResult<Cluster> {
        let resp = self
            .http
            .post(format!("{}/api/v1/clusters", self.address))
            .header("Accept", "application/json")
            .json(draft)
            .send()
            .await
            .map_err(|e| ConsoleError::MutationFailed(e.to_string()))?;

        if resp.status() == StatusCode::NOT_IMPLEMENTED {
            return Err(ConsoleError::NotImplemented("create cluster"));
        }
        if resp.status().as_u16() >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConsoleError::MutationFailed(format!(
                "create cluster failed: {}",
                body
            )));
        }
        resp.json()
            .await
            .map_err(|e| ConsoleError::MutationFailed(format!("decoding created cluster: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockBackend;
    use crate::models::cluster::ClusterStatus;
    use crate::routes::tests::{serve, state_with};
    use crate::store::ClusterStore;
    use std::sync::Arc;

    fn ids(clusters: &[Cluster]) -> Vec<&str> {
        clusters.iter().map(|c| c.id.as_str()).collect()
    }

    /// An `HttpBackend` talking to a live console over a seeded store.
    async fn remote(count: usize) -> (HttpBackend, Arc<ClusterStore>) {
        let store = Arc::new(ClusterStore::seeded(count, 7));
        let backend = Arc::new(MockBackend::new(store.clone(), Duration::ZERO));
        let base_url = serve(state_with(backend.clone(), backend)).await;
        let http = HttpBackend::new(format!("{}/", base_url), Duration::from_secs(5)).unwrap();
        (http, store)
    }

    #[tokio::test]
    async fn lists_a_filtered_page() {
        let (http, store) = remote(25).await;
        let criteria = FilterCriteria::new("", Some(ClusterStatus::Running));

        let page = http.list_clusters(&criteria, Pagination::new(1, 10)).await.unwrap();
        let expected = crate::console::query::query(
            &store.snapshot(),
            &criteria,
            Pagination::new(1, 10),
        );
        assert_eq!(page.total, expected.total);
        assert_eq!(ids(&page.records), ids(&expected.items));
    }

    #[tokio::test]
    async fn all_clusters_walks_every_page() {
        let (http, store) = remote(230).await;
        let all = http.all_clusters().await.unwrap();
        assert_eq!(all.len(), 230);
        assert_eq!(ids(&all), ids(&store.snapshot()));
    }

    #[tokio::test]
    async fn unknown_cluster_is_none() {
        let (http, store) = remote(3).await;
        let id = store.snapshot()[0].id.clone();

        let found = http.get_cluster(&id).await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(id.clone()));
        assert!(http.cluster_inventory(&id).await.unwrap().is_some());

        assert_eq!(http.get_cluster("missing").await.unwrap(), None);
        assert_eq!(http.cluster_inventory("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_reports_missing_cluster() {
        let (http, store) = remote(3).await;
        let id = store.snapshot()[1].id.clone();

        http.delete_cluster(&id).await.unwrap();
        assert_eq!(store.len(), 2);

        let err = http.delete_cluster(&id).await.unwrap_err();
        assert_eq!(err, ConsoleError::NotFound(id));
    }

    #[tokio::test]
    async fn create_is_not_implemented_remotely() {
        let (http, _) = remote(1).await;
        let err = http.create_cluster(&ClusterDraft::default()).await.unwrap_err();
        assert_eq!(err, ConsoleError::NotImplemented("create cluster"));
    }

    #[tokio::test]
    async fn unreachable_console_is_a_fetch_error() {
        let http = HttpBackend::new("http://127.0.0.1:1".to_string(), Duration::from_secs(1)).unwrap();
        assert!(matches!(
            http.all_clusters().await,
            Err(ConsoleError::FetchFailed(_))
        ));
    }
}
