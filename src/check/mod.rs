//! Read-only structural checks over the mesh store.
//!
//! Each check is a small query object: build it with `new`, run it with
//! `execute`. Results are element lists for the caller to act on through
//! commands; nothing here mutates the store.

mod bad_facets;
mod duplicates;
mod holes;
mod unused;

pub use bad_facets::FindBadFacets;
pub use duplicates::{DuplicateNodes, FindDuplicateNodes};
pub use holes::FindHoles;
pub use unused::FindUnusedNodes;

/// Parameters controlling the consistency checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckParams {
    /// Model dimensionality: 2 for line-facet models, 3 for polygon models.
    pub ndim: usize,
    /// Collinearity and planarity tolerance, relative to the facet extent.
    pub planarity_tolerance: f64,
}

impl Default for CheckParams {
    fn default() -> Self {
        Self {
            ndim: 3,
            planarity_tolerance: 1e-6,
        }
    }
}
