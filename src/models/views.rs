use serde::Serialize;

use crate::helpers::{clamp_percent, format_percent, human_time};
use crate::models::cluster::{
    Cluster, ClusterEvent, ClusterStatus, EventKind, MemberNode, MemberPod, PodPhase,
};

/// Badge class for a cluster status.
pub fn status_badge(status: ClusterStatus) -> &'static str {
    match status {
        ClusterStatus::Running => "badge-success",
        ClusterStatus::Stopped => "badge-info",
        ClusterStatus::Error => "badge-error",
        ClusterStatus::Pending => "badge-warning",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cpu,
    Memory,
    Disk,
    Network,
}

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Metric::Cpu => "CPU",
            Metric::Memory => "Memory",
            Metric::Disk => "Disk",
            Metric::Network => "Network",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Normal,
    Accent,
    Danger,
}

pub const DANGER_THRESHOLD: f64 = 80.0;

impl UsageLevel {
    pub fn of(metric: Metric, value: f64) -> Self {
        if clamp_percent(value) > DANGER_THRESHOLD {
            return UsageLevel::Danger;
        }
        match metric {
            Metric::Cpu | Metric::Disk | Metric::Network => UsageLevel::Normal,
            Metric::Memory => UsageLevel::Accent,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            UsageLevel::Normal => "progress-primary",
            UsageLevel::Accent => "progress-success",
            UsageLevel::Danger => "progress-error",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UsageBar {
    pub value: f64,
    pub display: String,
    pub class: String,
}

impl UsageBar {
    pub fn new(metric: Metric, value: f64) -> Self {
        let value = clamp_percent(value);
        Self {
            value,
            display: format_percent(value),
            class: UsageLevel::of(metric, value).css_class().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClusterRowView {
    pub id: String,
    pub name: String,
    pub version: String,
    pub status: String,
    pub status_class: String,
    pub node_count: u32,
    pub pod_count: u32,
    pub namespace: String,
    pub endpoint: String,
    pub created_at: String,
    pub cpu: UsageBar,
    pub memory: UsageBar,
    pub selected: bool,
}

impl ClusterRowView {
    pub fn build(cluster: &Cluster, selected: bool) -> Self {
        Self {
            id: cluster.id.clone(),
            name: cluster.name.clone(),
            version: cluster.version.clone(),
            status: cluster.status.label().to_string(),
            status_class: status_badge(cluster.status).to_string(),
            node_count: cluster.node_count,
            pod_count: cluster.pod_count,
            namespace: cluster.namespace.clone(),
            endpoint: cluster.endpoint.clone(),
            created_at: cluster.created_at.clone(),
            cpu: UsageBar::new(Metric::Cpu, cluster.usage.cpu),
            memory: UsageBar::new(Metric::Memory, cluster.usage.memory),
            selected,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelView {
    pub key: String,
    pub value: String,
}

pub fn build_label_views(cluster: &Cluster) -> Vec<LabelView> {
    let mut labels: Vec<LabelView> = cluster
        .labels
        .iter()
        .map(|(k, v)| LabelView {
            key: k.clone(),
            value: v.clone(),
        })
        .collect();
    labels.sort_by(|a, b| a.key.cmp(&b.key));
    labels
}

#[derive(Debug, Clone, Default)]
pub struct MemberNodeView {
    pub name: String,
    pub role: String,
    pub status: String,
    pub status_class: String,
    pub cpu: UsageBar,
    pub memory: UsageBar,
}

impl MemberNodeView {
    pub fn build(node: &MemberNode) -> Self {
        let (status, status_class) = if node.ready {
            ("Ready", "badge-success")
        } else {
            ("NotReady", "badge-error")
        };
        Self {
            name: node.name.clone(),
            role: node.role.clone(),
            status: status.to_string(),
            status_class: status_class.to_string(),
            cpu: UsageBar::new(Metric::Cpu, node.cpu),
            memory: UsageBar::new(Metric::Memory, node.memory),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemberPodView {
    pub name: String,
    pub namespace: String,
    pub node: String,
    pub phase: String,
    pub phase_class: String,
    pub restarts: u32,
}

impl MemberPodView {
    pub fn build(pod: &MemberPod) -> Self {
        let phase_class = match pod.phase {
            PodPhase::Running => "badge-success",
            PodPhase::Succeeded => "badge-info",
            PodPhase::Pending => "badge-warning",
            PodPhase::Failed => "badge-error",
            PodPhase::Unknown => "badge-ghost",
        };
        Self {
            name: pod.name.clone(),
            namespace: pod.namespace.clone(),
            node: pod.node.clone(),
            phase: pod.phase.as_str().to_string(),
            phase_class: phase_class.to_string(),
            restarts: pod.restarts,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventView {
    pub when: String,
    pub age: String,
    pub kind: String,
    pub kind_class: String,
    pub reason: String,
    pub message: String,
}

impl EventView {
    pub fn build(event: &ClusterEvent) -> Self {
        let (kind, kind_class) = match event.kind {
            EventKind::Normal => ("Normal", "badge-info"),
            EventKind::Warning => ("Warning", "badge-warning"),
        };
        Self {
            when: event.at.format("%Y-%m-%d %H:%M:%S").to_string(),
            age: human_time(Some(event.at)),
            kind: kind.to_string(),
            kind_class: kind_class.to_string(),
            reason: event.reason.clone(),
            message: event.message.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Breadcrumb {
    pub label: String,
    pub url: String,
}

impl Breadcrumb {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}
