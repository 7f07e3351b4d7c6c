//! Action Registry
//!
//! Maps action names to executable Rust code, split into a map-action half
//! and a reduce-action half. The controller pushes new action bundles by
//! replacing a whole half at once; there is no per-entry merge.
//!
//! Executors look actions up in a snapshot taken at dispatch time, so a
//! replacement never affects tasks that are already running.

use super::types::TaskKind;

use anyhow::Result;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// An action is an async function of `(partition_count, input_blob)` that
/// produces an output blob or fails.
pub type ActionFn = Arc<
    dyn Fn(u32, Vec<u8>) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send>> + Send + Sync,
>;

/// Wraps a plain async closure into the boxed [`ActionFn`] shape.
pub fn action_fn<F, Fut>(action: F) -> ActionFn
where
    F: Fn(u32, Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
{
    Arc::new(move |partitions, input| Box::pin(action(partitions, input)))
}

#[derive(Clone, Default)]
pub struct ActionRegistry {
    map_actions: HashMap<String, ActionFn>,
    reduce_actions: HashMap<String, ActionFn>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the map-action half wholesale.
    pub fn set_map_actions(&mut self, actions: HashMap<String, ActionFn>) {
        tracing::info!("Installing {} map action(s)", actions.len());
        self.map_actions = actions;
    }

    /// Replaces the reduce-action half wholesale.
    pub fn set_reduce_actions(&mut self, actions: HashMap<String, ActionFn>) {
        tracing::info!("Installing {} reduce action(s)", actions.len());
        self.reduce_actions = actions;
    }

    pub fn map_action_names(&self) -> Vec<String> {
        self.map_actions.keys().cloned().collect()
    }

    pub fn reduce_action_names(&self) -> Vec<String> {
        self.reduce_actions.keys().cloned().collect()
    }

    /// Cheap copy handed to an executor at dispatch time. The actions
    /// themselves are shared behind `Arc`s; only the name tables are cloned.
    pub fn snapshot(&self) -> ActionRegistry {
        self.clone()
    }

    /// Picks the registry half for the task kind and looks the action up.
    ///
    /// `Ok(None)` means the kind is dispatchable but no action carries that
    /// name. Kinds outside the map/combine/reduce set are an error.
    pub fn resolve(&self, kind: &TaskKind, name: &str) -> Result<Option<ActionFn>> {
        match kind {
            TaskKind::Map => Ok(self.map_actions.get(name).cloned()),
            TaskKind::Combine | TaskKind::Reduce => Ok(self.reduce_actions.get(name).cloned()),
            TaskKind::Other(tag) => Err(anyhow::anyhow!("unknown task kind: {}", tag)),
        }
    }
}
