//! Registry of configured tool adapters.
//!
//! The registry is write-once during startup registration and read-only
//! afterwards; it is an explicitly constructed value passed by reference
//! into the engine callers and the pipeline runner, never a process-wide
//! singleton.

use crate::adapters::ToolAdapter;
use crate::core::entities::ToolDescriptor;
use crate::core::error::AppError;
use crate::core::types::{ErrorCategory, TaskType};
use futures::future;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

pub struct ToolRegistry {
    /// Adapters in registration order; the order is the authoritative
    /// tie-break for selection.
    adapters: IndexMap<String, Arc<dyn ToolAdapter>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            adapters: IndexMap::new(),
        }
    }

    /// Register an adapter. Names must be unique; a duplicate is a
    /// Configuration error.
    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) -> Result<(), AppError> {
        let name = adapter.descriptor().name.clone();
        if self.adapters.contains_key(&name) {
            return Err(AppError::new(
                ErrorCategory::Configuration,
                format!("adapter '{name}' is already registered"),
            )
            .with_code("REG-001"));
        }
        self.adapters.insert(name, adapter);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Registered adapter names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    /// Descriptors of every registered adapter in registration order,
    /// without probing availability.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.adapters
            .values()
            .map(|adapter| adapter.descriptor().clone())
            .collect()
    }

    /// Direct lookup without an availability check; callers must verify
    /// availability themselves before executing.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolAdapter>> {
        self.adapters.get(name).cloned()
    }

    /// Descriptors of every adapter whose availability probe succeeded.
    ///
    /// Probes run concurrently, one per registered adapter, and are joined
    /// before returning. Install state is checked live, so ordering and
    /// membership may differ between calls.
    pub async fn available(&self) -> Vec<ToolDescriptor> {
        self.probe_all()
            .await
            .into_iter()
            .filter_map(|(adapter, up)| up.then(|| adapter.descriptor().clone()))
            .collect()
    }

    /// Best available adapter for a task type, or `None` when no available
    /// adapter declares the capability: a normal outcome meaning "no tool
    /// for this job".
    ///
    /// Among capable, available adapters the lowest `priority` wins;
    /// ties are broken by registration order (first registered wins),
    /// deterministically across repeated calls.
    pub async fn find_best_tool(&self, task_type: TaskType) -> Option<Arc<dyn ToolAdapter>> {
        let mut best: Option<Arc<dyn ToolAdapter>> = None;
        for (adapter, up) in self.probe_all().await {
            if !up || !adapter.descriptor().supports(task_type) {
                continue;
            }
            let better = match &best {
                None => true,
                Some(current) => adapter.descriptor().priority < current.descriptor().priority,
            };
            if better {
                best = Some(adapter.clone());
            }
        }
        if best.is_none() {
            debug!(%task_type, "no available adapter supports task type");
        }
        best
    }

    async fn probe_all(&self) -> Vec<(&Arc<dyn ToolAdapter>, bool)> {
        let probes = self.adapters.values().map(|adapter| adapter.check_availability());
        let results = future::join_all(probes).await;
        self.adapters.values().zip(results).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
