use std::collections::HashMap;

use tracing::debug;

use crate::model::{FacetId, ModelStore, NodeId};

/// Finds facets along open edges of a triangulated surface.
#[derive(Debug, Default)]
pub struct FindHoles;

fn edge(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl FindHoles {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Facets touching an edge shared by other than exactly two facets,
    /// in store order.
    ///
    /// Returns `None` when any facet is not a triangle.
    #[must_use]
    pub fn execute(&self, store: &ModelStore) -> Option<Vec<FacetId>> {
        let mut counts: HashMap<(NodeId, NodeId), usize> = HashMap::new();
        for (_, facet) in store.facets() {
            let [a, b, c] = facet.nodes() else {
                debug!(len = facet.len(), "hole search needs triangles");
                return None;
            };
            for e in [edge(*a, *b), edge(*b, *c), edge(*c, *a)] {
                *counts.entry(e).or_default() += 1;
            }
        }
        let holes: Vec<FacetId> = store
            .facets()
            .filter(|(_, f)| {
                let n = f.nodes();
                (0..3).any(|i| counts.get(&edge(n[i], n[(i + 1) % 3])) != Some(&2))
            })
            .map(|(id, _)| id)
            .collect();
        debug!(count = holes.len(), "hole facets");
        Some(holes)
    }
}
