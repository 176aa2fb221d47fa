//! Per-target "already processing" guard

use dashmap::DashSet;
use std::sync::Arc;
use tracing::debug;

/// Set of targets with a summarization in flight.
///
/// Cloning shares the set. Target keys are opaque to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct TargetGuard {
    active: Arc<DashSet<String>>,
}

impl TargetGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `target` as processing; `None` if it already is.
    ///
    /// The mark is cleared when the returned permit is dropped.
    pub fn try_acquire(&self, target: impl Into<String>) -> Option<TargetPermit> {
        let target = target.into();
        if !self.active.insert(target.clone()) {
            debug!(target = %target, "Target already processing");
            return None;
        }

        Some(TargetPermit {
            active: Arc::clone(&self.active),
            target,
        })
    }

    pub fn is_processing(&self, target: &str) -> bool {
        self.active.contains(target)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Held while a target is being processed
#[derive(Debug)]
pub struct TargetPermit {
    active: Arc<DashSet<String>>,
    target: String,
}

impl TargetPermit {
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Drop for TargetPermit {
    fn drop(&mut self) {
        self.active.remove(&self.target);
    }
}
