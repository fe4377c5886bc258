//! Target registry
//!
//! Name -> instance mapping that also remembers registration order, which is
//! the order the dispatch loop scans in.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use contracts::TargetSpec;

use crate::error::{DispatcherError, Result};
use crate::instance::{Claim, TargetInstance};

#[derive(Debug, Default)]
struct RegistryInner {
    order: Vec<Arc<TargetInstance>>,
    index: HashMap<String, usize>,
}

/// Registry of known targets
#[derive(Debug, Default)]
pub struct TargetRegistry {
    inner: RwLock<RegistryInner>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new target
    ///
    /// # Errors
    /// `DuplicateTarget` if the name is already taken
    pub fn register(&self, spec: TargetSpec) -> Result<Arc<TargetInstance>> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.index.contains_key(&spec.name) {
            return Err(DispatcherError::duplicate_target(spec.name));
        }
        let position = inner.order.len();
        inner.index.insert(spec.name.clone(), position);
        let instance = Arc::new(TargetInstance::new(spec));
        inner.order.push(Arc::clone(&instance));
        Ok(instance)
    }

    /// Look up a target by name
    ///
    /// # Errors
    /// `UnknownTarget` if no such target is registered
    pub fn get(&self, name: &str) -> Result<Arc<TargetInstance>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .index
            .get(name)
            .map(|&i| Arc::clone(&inner.order[i]))
            .ok_or_else(|| DispatcherError::unknown_target(name))
    }

    /// All targets in registration order
    pub fn all(&self) -> Vec<Arc<TargetInstance>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.all().iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Claim work from the first idle target with a non-empty queue
    ///
    /// Scans in registration order; the claim itself is atomic per target.
    pub(crate) fn select_next(&self) -> Option<(Arc<TargetInstance>, Claim)> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .order
            .iter()
            .find_map(|t| t.try_claim().map(|claim| (Arc::clone(t), claim)))
    }

    /// Number of targets with an execution in flight
    pub fn busy_count(&self) -> usize {
        self.all().iter().filter(|t| t.is_busy()).count()
    }
}
