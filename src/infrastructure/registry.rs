//! Checker registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::scan::{ResourceChecker, ResourceKind};

/// Error returned when a requested resource type has no registered checker.
#[derive(Debug, thiserror::Error)]
#[error("No checker registered for resource type '{kind}'")]
pub struct UnregisteredKindError {
    pub kind: ResourceKind,
}

/// Maps resource types to the concrete checkers to invoke.
pub struct CheckerRegistry {
    checkers: HashMap<ResourceKind, Arc<dyn ResourceChecker>>,
}

impl CheckerRegistry {
    pub fn new() -> Self {
        Self {
            checkers: HashMap::new(),
        }
    }

    /// Register a checker under its own kind.
    pub fn register(&mut self, checker: Arc<dyn ResourceChecker>) {
        self.checkers.insert(checker.kind(), checker);
    }

    /// Registered kinds in stable order.
    pub fn registered_kinds(&self) -> Vec<ResourceKind> {
        let mut kinds: Vec<ResourceKind> = self.checkers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Resolve a requested set of resource types to checkers.
    ///
    /// `None` or an empty set selects every registered checker. A requested
    /// kind without a registered checker is an error, not silently skipped.
    pub fn resolve(
        &self,
        requested: Option<&[ResourceKind]>,
    ) -> Result<Vec<Arc<dyn ResourceChecker>>, UnregisteredKindError> {
        let kinds: Vec<ResourceKind> = match requested {
            Some(kinds) if !kinds.is_empty() => kinds.to_vec(),
            _ => self.registered_kinds(),
        };

        kinds
            .into_iter()
            .map(|kind| {
                self.checkers
                    .get(&kind)
                    .cloned()
                    .ok_or(UnregisteredKindError { kind })
            })
            .collect()
    }
}

impl Default for CheckerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
