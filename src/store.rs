use chrono::{Duration, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::console::metrics::SeededRng;
use crate::models::cluster::{
    Cluster, ClusterEvent, ClusterStatus, EventKind, Inventory, MemberNode, MemberPod, PodPhase,
    Utilization,
};

/// In-memory cluster collection. Built once at startup and shared by handle;
/// tests build their own.
pub struct ClusterStore {
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    clusters: Vec<Cluster>,
    inventory: HashMap<String, Inventory>,
}

impl ClusterStore {
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self::with_inventory(clusters, HashMap::new())
    }

    pub fn with_inventory(clusters: Vec<Cluster>, inventory: HashMap<String, Inventory>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(clusters.len());
        for c in clusters {
            if seen.insert(c.id.clone()) {
                unique.push(c);
            } else {
                warn!("dropping cluster with duplicate id {}", c.id);
            }
        }
        Self {
            inner: RwLock::new(StoreInner {
                clusters: unique,
                inventory,
            }),
        }
    }

    /// Deterministic mock collection of `count` clusters with inventory.
    pub fn seeded(count: usize, seed: u64) -> Self {
        let mut rng = SeededRng::new(seed);
        let mut clusters = Vec::with_capacity(count);
        let mut inventory = HashMap::new();

        for i in 0..count {
            let cluster = mock_cluster(i, &mut rng);
            inventory.insert(cluster.id.clone(), mock_inventory(&cluster, &mut rng));
            clusters.push(cluster);
        }

        debug!("seeded {} mock clusters", clusters.len());
        Self::with_inventory(clusters, inventory)
    }

    pub fn snapshot(&self) -> Vec<Cluster> {
        self.read().clusters.clone()
    }

    pub fn get(&self, id: &str) -> Option<Cluster> {
        self.read().clusters.iter().find(|c| c.id == id).cloned()
    }

    /// `None` when the cluster itself is unknown.
    pub fn inventory(&self, id: &str) -> Option<Inventory> {
        let inner = self.read();
        if !inner.clusters.iter().any(|c| c.id == id) {
            return None;
        }
        let mut inv = inner.inventory.get(id).cloned().unwrap_or_default();
        inv.events.sort_by_key(|e| e.at);
        Some(inv)
    }

    pub fn remove(&self, id: &str) -> Option<Cluster> {
        let mut inner = self.write();
        let pos = inner.clusters.iter().position(|c| c.id == id)?;
        inner.inventory.remove(id);
        Some(inner.clusters.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.read().clusters.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

const ENVIRONMENTS: [&str; 6] = ["prod", "staging", "dev", "edge", "analytics", "billing"];
const REGIONS: [&str; 4] = ["us-east", "us-west", "eu-central", "ap-south"];
const VERSIONS: [&str; 4] = ["v1.27.9", "v1.28.6", "v1.29.2", "v1.30.1"];
const NAMESPACES: [&str; 3] = ["default", "platform", "data"];
const STATUS_WEIGHTS: [ClusterStatus; 8] = [
    ClusterStatus::Running,
    ClusterStatus::Running,
    ClusterStatus::Running,
    ClusterStatus::Running,
    ClusterStatus::Running,
    ClusterStatus::Stopped,
    ClusterStatus::Error,
    ClusterStatus::Pending,
];

fn mock_cluster(i: usize, rng: &mut SeededRng) -> Cluster {
    let env = *rng.pick(&ENVIRONMENTS);
    let region = *rng.pick(&REGIONS);
    let status = *rng.pick(&STATUS_WEIGHTS);
    let node_count = rng.range_u32(3, 40);
    let pod_count = node_count * rng.range_u32(4, 18);

    let base = NaiveDate::from_ymd_opt(2024, 1, 15)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap_or_default();
    let created = base + Duration::days((i as i64 * 11) % 300) + Duration::minutes(i as i64 * 37);

    let mut labels = HashMap::new();
    labels.insert("env".to_string(), env.to_string());
    labels.insert("region".to_string(), region.to_string());
    labels.insert(
        "tier".to_string(),
        if env == "prod" { "critical" } else { "standard" }.to_string(),
    );

    Cluster {
        id: format!("cls-{:03}", i + 1),
        name: format!("{}-{}-{:02}", env, region, i + 1),
        version: rng.pick(&VERSIONS).to_string(),
        status,
        node_count,
        pod_count,
        namespace: rng.pick(&NAMESPACES).to_string(),
        endpoint: format!("https://10.{}.{}.1:6443", 20 + i / 250, i % 250),
        created_at: created.format("%Y-%m-%d %H:%M:%S").to_string(),
        usage: Utilization {
            cpu: rng.range_f64(5.0, 95.0),
            memory: rng.range_f64(10.0, 95.0),
            disk: rng.range_f64(15.0, 90.0),
        },
        labels,
        description: format!("{} workloads in {}", env, region),
    }
}

fn mock_inventory(cluster: &Cluster, rng: &mut SeededRng) -> Inventory {
    let node_names: Vec<String> = (0..cluster.node_count.min(6))
        .map(|k| format!("{}-node-{}", cluster.name, k + 1))
        .collect();

    let nodes = node_names
        .iter()
        .enumerate()
        .map(|(k, name)| MemberNode {
            name: name.clone(),
            role: if k == 0 { "control-plane" } else { "worker" }.to_string(),
            ready: match cluster.status {
                ClusterStatus::Running => true,
                ClusterStatus::Pending => k == 0,
                ClusterStatus::Stopped | ClusterStatus::Error => false,
            },
            cpu: rng.range_f64(5.0, 95.0),
            memory: rng.range_f64(10.0, 95.0),
        })
        .collect();

    const WORKLOADS: [&str; 6] = ["coredns", "ingress-nginx", "metrics-server", "api-gateway", "worker", "scheduler"];
    let phase = match cluster.status {
        ClusterStatus::Running => PodPhase::Running,
        ClusterStatus::Pending => PodPhase::Pending,
        ClusterStatus::Error => PodPhase::Failed,
        ClusterStatus::Stopped => PodPhase::Succeeded,
    };
    let pods = if node_names.is_empty() {
        Vec::new()
    } else {
        (0..cluster.pod_count.min(12) as usize)
            .map(|k| MemberPod {
                name: format!("{}-{:04x}", WORKLOADS[k % WORKLOADS.len()], rng.next_u64() & 0xffff),
                namespace: if k % 3 == 0 { "kube-system" } else { cluster.namespace.as_str() }.to_string(),
                node: node_names[k % node_names.len()].clone(),
                phase,
                restarts: rng.range_u32(0, 3),
            })
            .collect()
    };

    let now = Utc::now();
    let mut events = vec![
        ClusterEvent {
            at: now - Duration::hours(72),
            kind: EventKind::Normal,
            reason: "Provisioned".to_string(),
            message: format!("cluster {} provisioned", cluster.name),
        },
        ClusterEvent {
            at: now - Duration::hours(30),
            kind: EventKind::Normal,
            reason: "Upgraded".to_string(),
            message: format!("control plane upgraded to {}", cluster.version),
        },
        ClusterEvent {
            at: now - Duration::hours(4),
            kind: EventKind::Normal,
            reason: "Scaled".to_string(),
            message: format!("node pool scaled to {} nodes", cluster.node_count),
        },
    ];
    match cluster.status {
        ClusterStatus::Error => events.push(ClusterEvent {
            at: now - Duration::minutes(12),
            kind: EventKind::Warning,
            reason: "Unhealthy".to_string(),
            message: "control plane health check failing".to_string(),
        }),
        ClusterStatus::Pending => events.push(ClusterEvent {
            at: now - Duration::minutes(3),
            kind: EventKind::Normal,
            reason: "Provisioning".to_string(),
            message: "waiting for worker nodes to join".to_string(),
        }),
        ClusterStatus::Stopped => events.push(ClusterEvent {
            at: now - Duration::minutes(45),
            kind: EventKind::Normal,
            reason: "Stopped".to_string(),
            message: "cluster stopped by operator".to_string(),
        }),
        ClusterStatus::Running => {}
    }
    if cluster.usage.cpu > 80.0 {
        events.push(ClusterEvent {
            at: now - Duration::minutes(1),
            kind: EventKind::Warning,
            reason: "HighCPU".to_string(),
            message: format!("cpu usage at {:.0}%", cluster.usage.cpu),
        });
    }

    Inventory { nodes, pods, events }
}
