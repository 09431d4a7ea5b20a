use tracing::debug;

use crate::model::{ModelStore, NodeId};

/// Finds nodes no facet refers to.
#[derive(Debug, Default)]
pub struct FindUnusedNodes;

impl FindUnusedNodes {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Unused nodes, in store order.
    #[must_use]
    pub fn execute(&self, store: &ModelStore) -> Vec<NodeId> {
        let unused: Vec<NodeId> = store
            .nodes()
            .filter(|(_, n)| n.facets().is_empty())
            .map(|(id, _)| id)
            .collect();
        debug!(count = unused.len(), "unused nodes");
        unused
    }
}
