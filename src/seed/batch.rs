use futures::stream::{self, StreamExt};

use crate::infrahub::{ApiError, GraphApi, NodeData, NodeHandle};
use crate::models::kind;

use super::context::SeedContext;

struct BatchTask<K> {
    kind: String,
    key: K,
    label: String,
    data: NodeData,
    allow_upsert: bool,
}

pub struct BatchOutcome<K> {
    pub kind: String,
    pub key: K,
    pub label: String,
    pub result: Result<NodeHandle, ApiError>,
}

/// Saves queued together and awaited as a group. Completion order among
/// members is unspecified.
pub struct Batch<'a, K> {
    api: &'a dyn GraphApi,
    tasks: Vec<BatchTask<K>>,
    max_concurrent: usize,
}

impl<'a, K: Send + 'a> Batch<'a, K> {
    pub fn new(api: &'a dyn GraphApi, max_concurrent: usize) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn add(&mut self, kind: &str, key: K, label: impl Into<String>, data: NodeData) {
        self.add_with(kind, key, label, data, true)
    }

    pub fn add_with(&mut self, kind: &str, key: K, label: impl Into<String>, data: NodeData, allow_upsert: bool) {
        let label = label.into();
        tracing::debug!("- Added to batch [{}] '{}'", kind, label);
        self.tasks.push(BatchTask {
            kind: kind.to_string(),
            key,
            label,
            data,
            allow_upsert,
        });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub async fn execute(self) -> Vec<BatchOutcome<K>> {
        tracing::debug!("Executing batch of {} saves", self.len());
        let api = self.api;
        stream::iter(self.tasks)
            .map(|task| async move {
                let result = api.create(&task.kind, &task.data, task.allow_upsert).await;
                BatchOutcome {
                    kind: task.kind,
                    key: task.key,
                    label: task.label,
                    result,
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await
    }
}

/// Log the outcomes of a batch, count them in the report and return the
/// objects that were saved.
pub fn settle<K>(ctx: &mut SeedContext, outcomes: Vec<BatchOutcome<K>>) -> Vec<(K, NodeHandle)> {
    let mut saved = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome.result {
            Ok(node) => {
                tracing::debug!("- Created [{}] '{}'", outcome.kind, outcome.label);
                ctx.report.created += 1;
                saved.push((outcome.key, node));
            }
            Err(e) => {
                tracing::debug!("- Creation failed for [{}] '{}' due to {}", outcome.kind, outcome.label, e);
                ctx.report.record_failure(format!("{} '{}': {}", outcome.kind, outcome.label, e));
            }
        }
    }
    saved
}

/// Run a batch keyed by business name and record every saved object in the
/// store under its kind.
pub async fn execute_into_store(ctx: &mut SeedContext, batch: Batch<'_, String>) {
    let outcomes = batch.execute().await;
    for (key, node) in settle(ctx, outcomes) {
        let kind = node.kind.clone();
        ctx.store.set(&kind, key, node);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    pub allow_upsert: bool,
    /// Fetch the existing object by its natural key when the save fails
    pub retrieve_on_failure: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            allow_upsert: true,
            retrieve_on_failure: false,
        }
    }
}

/// Save a single object and record it in the store. Failures are logged
/// and leave the object unset.
pub async fn create_and_save(
    api: &dyn GraphApi,
    ctx: &mut SeedContext,
    kind_name: &str,
    object_name: &str,
    data: &NodeData,
    options: SaveOptions,
) -> Option<NodeHandle> {
    match api.create(kind_name, data, options.allow_upsert).await {
        Ok(node) => {
            tracing::debug!("- Created {} - {}", kind_name, object_name);
            ctx.report.created += 1;
            ctx.store.set(kind_name, object_name, node.clone());
            Some(node)
        }
        Err(e) => {
            if e.is_conflict() {
                tracing::debug!("- {} - {} already exists", kind_name, object_name);
            } else {
                tracing::debug!("- Creation failed for {} - {} due to {}", kind_name, object_name, e);
            }
            if !options.retrieve_on_failure {
                ctx.report.record_failure(format!("{} '{}': {}", kind_name, object_name, e));
                return None;
            }

            match api.get(kind_name, kind::natural_key(kind_name), object_name).await {
                Ok(Some(node)) => {
                    tracing::debug!("- Retrieved {} - {}", kind_name, object_name);
                    ctx.report.retrieved += 1;
                    ctx.store.set(kind_name, object_name, node.clone());
                    Some(node)
                }
                Ok(None) => {
                    ctx.report.record_failure(format!("{} '{}': {}", kind_name, object_name, e));
                    None
                }
                Err(fetch_err) => {
                    tracing::warn!("Failed to retrieve {} - {}: {}", kind_name, object_name, fetch_err);
                    ctx.report.record_failure(format!("{} '{}': {}", kind_name, object_name, e));
                    None
                }
            }
        }
    }
}
