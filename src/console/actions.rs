use async_trait::async_trait;
use futures_util::future::join_all;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::list::ListView;
use crate::clients::{DataSource, MutationSink};
use crate::error::{ConsoleError, Notice};
use crate::models::cluster::ClusterDraft;

pub const LIST_PATH: &str = "/ui/clusters";

pub fn detail_path(id: &str) -> String {
    format!("{}/{}", LIST_PATH, id)
}

pub fn edit_path(id: &str) -> String {
    format!("{}/{}/edit", LIST_PATH, id)
}

/// Router seen from the views.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
    fn current_params(&self) -> HashMap<String, String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    pub ids: Vec<String>,
}

/// Modal confirmation. Returning false means the user backed out.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowAction {
    View(String),
    Edit(String),
    Delete(String),
    BatchDelete,
    Create(ClusterDraft),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Navigated(String),
    /// Confirmation declined; nothing happened.
    Declined,
    Deleted {
        deleted: Vec<String>,
        failed: Vec<(String, ConsoleError)>,
    },
    /// Refused before reaching the backend, or the backend refused. The
    /// reason is in the view's notices.
    Rejected,
}

pub struct ActionDispatcher<'a> {
    source: &'a dyn DataSource,
    mutations: &'a dyn MutationSink,
    confirmer: &'a dyn Confirmer,
    navigator: &'a dyn Navigator,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(
        source: &'a dyn DataSource,
        mutations: &'a dyn MutationSink,
        confirmer: &'a dyn Confirmer,
        navigator: &'a dyn Navigator,
    ) -> Self {
        Self {
            source,
            mutations,
            confirmer,
            navigator,
        }
    }

    pub async fn dispatch(&self, view: &mut ListView, action: RowAction) -> ActionOutcome {
        match action {
            RowAction::View(id) => self.navigate(detail_path(&id)),
            RowAction::Edit(id) => self.navigate(edit_path(&id)),
            RowAction::Delete(id) => {
                let name = view.display_name(&id).to_string();
                let prompt = ConfirmPrompt {
                    title: "Delete cluster".to_string(),
                    message: format!("Delete cluster \"{}\"? This cannot be undone.", name),
                    ids: vec![id],
                };
                self.delete_confirmed(view, prompt).await
            }
            RowAction::BatchDelete => {
                if view.selection().is_empty() {
                    view.push_notice(Notice::warning("Select at least one cluster first"));
                    return ActionOutcome::Rejected;
                }
                let ids: Vec<String> = view.selection().ids().map(str::to_string).collect();
                let names: Vec<&str> = ids.iter().map(|id| view.display_name(id)).collect();
                let prompt = ConfirmPrompt {
                    title: "Delete clusters".to_string(),
                    message: format!(
                        "Delete {} selected clusters ({})? This cannot be undone.",
                        ids.len(),
                        names.join(", ")
                    ),
                    ids,
                };
                self.delete_confirmed(view, prompt).await
            }
            RowAction::Create(draft) => match self.mutations.create_cluster(&draft).await {
                Ok(cluster) => {
                    view.push_notice(Notice::success(format!("Cluster \"{}\" created", cluster.name)));
                    view.refresh(self.source, &CancellationToken::new()).await;
                    ActionOutcome::Navigated(self.navigate_path(detail_path(&cluster.id)))
                }
                Err(e) => {
                    warn!("create cluster {:?}: {}", draft.name, e);
                    view.push_notice(Notice::from(&e));
                    ActionOutcome::Rejected
                }
            },
        }
    }

    fn navigate(&self, path: String) -> ActionOutcome {
        ActionOutcome::Navigated(self.navigate_path(path))
    }

    fn navigate_path(&self, path: String) -> String {
        self.navigator.navigate_to(&path);
        path
    }

    async fn delete_confirmed(&self, view: &mut ListView, prompt: ConfirmPrompt) -> ActionOutcome {
        if !self.confirmer.confirm(&prompt).await {
            return ActionOutcome::Declined;
        }

        let names: HashMap<String, String> = prompt
            .ids
            .iter()
            .map(|id| (id.clone(), view.display_name(id).to_string()))
            .collect();

        let results = join_all(prompt.ids.iter().map(|id| self.mutations.delete_cluster(id))).await;

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for (id, result) in prompt.ids.into_iter().zip(results) {
            match result {
                Ok(()) => deleted.push(id),
                Err(e) => failed.push((id, e)),
            }
        }

        let name_of = |id: &str| names.get(id).cloned().unwrap_or_else(|| id.to_string());

        match deleted.as_slice() {
            [] => {}
            [only] => view.push_notice(Notice::success(format!("Cluster \"{}\" deleted", name_of(only.as_str())))),
            many => view.push_notice(Notice::success(format!("Deleted {} clusters", many.len()))),
        }
        if !failed.is_empty() {
            let detail: Vec<String> = failed
                .iter()
                .map(|(id, e)| format!("{} ({})", name_of(id.as_str()), e))
                .collect();
            warn!("failed to delete {} clusters: {}", failed.len(), detail.join(", "));
            view.push_notice(Notice::error(format!("Failed to delete {}", detail.join(", "))));
        }

        if !deleted.is_empty() {
            info!("deleted clusters: {}", deleted.join(", "));
            view.selection_mut().retain(|id| !deleted.iter().any(|d| d == id));
            view.refresh(self.source, &CancellationToken::new()).await;
        }

        ActionOutcome::Deleted { deleted, failed }
    }
}
