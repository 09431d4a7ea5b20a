//! Turns a 2D pick into an existing element or a candidate facet.
//!
//! The synthesizer never mutates the store. It keeps the result of the
//! last queries so a caller can compare them (see
//! [`Synthesizer::which_is_closest`]) and then build a command.

mod candidate;
mod closest;

pub use closest::Closest;

use crate::math::Point2;
use crate::model::{ElementId, FacetId, NodeId, RegionId};

/// Parameters controlling picking and facet synthesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisParams {
    /// Maximum model-space distance between a pick and an accepted element.
    pub picking_distance: f64,
    /// Scale applied to the k-nearest radius when gathering facet candidates.
    pub auto_facet_factor: f64,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            picking_distance: 1.0,
            auto_facet_factor: 1.5,
        }
    }
}

/// Advisory picking state.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    params: SynthesisParams,
    node: Option<Closest<NodeId>>,
    facet: Option<Closest<FacetId>>,
    region: Option<Closest<RegionId>>,
    candidate: Option<Vec<NodeId>>,
}

impl Synthesizer {
    #[must_use]
    pub fn new(params: SynthesisParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn params(&self) -> SynthesisParams {
        self.params
    }

    pub fn set_params(&mut self, params: SynthesisParams) {
        self.params = params;
    }

    #[must_use]
    pub fn closest_node(&self) -> Option<&Closest<NodeId>> {
        self.node.as_ref()
    }

    #[must_use]
    pub fn closest_facet(&self) -> Option<&Closest<FacetId>> {
        self.facet.as_ref()
    }

    #[must_use]
    pub fn closest_region(&self) -> Option<&Closest<RegionId>> {
        self.region.as_ref()
    }

    /// Node list of the last synthesized facet, if any.
    #[must_use]
    pub fn candidate(&self) -> Option<&[NodeId]> {
        self.candidate.as_deref()
    }

    /// Forgets every closest element and the candidate facet.
    pub fn clear(&mut self) {
        self.node = None;
        self.facet = None;
        self.region = None;
        self.candidate = None;
    }

    /// Whichever of the last closest node, facet and region is nearest to
    /// `p` in pixel space.
    ///
    /// Ties go to the node, then the facet, then the region.
    #[must_use]
    pub fn which_is_closest(&self, p: &Point2) -> Option<ElementId> {
        let mut best: Option<(ElementId, f64)> = None;
        let mut consider = |id: ElementId, d: f64| {
            if best.is_none_or(|(_, b)| d < b) {
                best = Some((id, d));
            }
        };
        if let Some(c) = &self.node {
            consider(c.id.into(), c.distance_to(p));
        }
        if let Some(c) = &self.facet {
            consider(c.id.into(), c.distance_to(p));
        }
        if let Some(c) = &self.region {
            consider(c.id.into(), c.distance_to(p));
        }
        best.map(|(id, _)| id)
    }
}
