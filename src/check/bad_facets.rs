use std::collections::HashSet;

use tracing::debug;

use crate::math::polygon_3d::{is_collinear, is_planar};
use crate::model::{FacetData, FacetId, ModelStore, NodeId};

use super::CheckParams;

/// Finds degenerate, duplicated or warped facets.
#[derive(Debug)]
pub struct FindBadFacets {
    params: CheckParams,
}

impl FindBadFacets {
    #[must_use]
    pub fn new(params: CheckParams) -> Self {
        Self { params }
    }

    /// Checks a facet on its own. Geometric tests are skipped when a node
    /// cannot be resolved.
    fn is_bad(&self, store: &ModelStore, id: FacetId, facet: &FacetData) -> bool {
        let distinct = facet.distinct_nodes().len();
        if distinct != facet.len() || distinct < self.params.ndim {
            return true;
        }
        if self.params.ndim == 2 {
            return facet.len() > 2;
        }
        if facet.len() <= 3 {
            return false;
        }
        let Some(points) = store.facet_points(id) else {
            return false;
        };
        let tol = self.params.planarity_tolerance;
        is_collinear(&points, tol) || !is_planar(&points, tol)
    }

    /// Bad facets, in store order. Of several facets over the same node
    /// set, all but the first are flagged.
    #[must_use]
    pub fn execute(&self, store: &ModelStore) -> Vec<FacetId> {
        let mut seen: HashSet<Vec<NodeId>> = HashSet::new();
        let mut bad = Vec::new();
        for (id, facet) in store.facets() {
            let mut set = facet.distinct_nodes();
            set.sort_unstable();
            let repeated = !seen.insert(set);
            if repeated || self.is_bad(store, id, facet) {
                bad.push(id);
            }
        }
        debug!(count = bad.len(), ndim = self.params.ndim, "bad facets");
        bad
    }
}
