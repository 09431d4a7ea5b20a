use tracing::trace;

use crate::math::{Point2, Point3};
use crate::model::{FacetId, ModelStore, NodeId, RegionId};
use crate::selection::{Painted, SelectionContext};

use super::Synthesizer;

/// An accepted pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Closest<K> {
    pub id: K,
    /// Where the element is painted.
    pub pixel: Point2,
    /// Model-space distance between the pick and the element.
    pub spatial_distance: f64,
}

impl<K> Closest<K> {
    /// Pixel-space distance from `p` to where the element is painted.
    #[must_use]
    pub fn distance_to(&self, p: &Point2) -> f64 {
        (self.pixel - p).norm()
    }
}

/// Nearest painted entry to `p`; the first one wins on equal distance.
fn nearest_painted<K: Copy>(painted: &[Painted<K>], p: &Point2) -> Option<Painted<K>> {
    let mut best: Option<(Painted<K>, f64)> = None;
    for entry in painted {
        let d = (entry.pixel - p).norm();
        if best.as_ref().is_none_or(|(_, b)| d < *b) {
            best = Some((*entry, d));
        }
    }
    best.map(|(entry, _)| entry)
}

/// Resolves the pick to model space through the current section.
fn pick_point(store: &ModelStore, ctx: &SelectionContext, p: &Point2) -> Option<Point3> {
    store
        .section(ctx.current_section?)
        .ok()?
        .pixel_to_model(p)
}

impl Synthesizer {
    fn accept<K: Copy>(
        &self,
        store: &ModelStore,
        ctx: &SelectionContext,
        painted: &[Painted<K>],
        p: &Point2,
        resolve: impl Fn(K) -> Option<Point3>,
    ) -> Option<Closest<K>> {
        let pick = pick_point(store, ctx, p)?;
        let entry = nearest_painted(painted, p)?;
        let spatial_distance = (resolve(entry.id)? - pick).norm();
        trace!(spatial_distance, "closest candidate");
        (spatial_distance <= self.params.picking_distance).then_some(Closest {
            id: entry.id,
            pixel: entry.pixel,
            spatial_distance,
        })
    }

    /// Painted node nearest to `p`, if it lies within the picking distance
    /// in model space.
    ///
    /// Clears the previous closest node first, so a miss leaves nothing
    /// behind. Requires a calibrated current section.
    pub fn calculate_closest_node(
        &mut self,
        store: &ModelStore,
        ctx: &SelectionContext,
        p: &Point2,
    ) -> Option<NodeId> {
        self.node = None;
        self.node = self.accept(store, ctx, &ctx.painted.nodes, p, |n| store.node_point(n));
        self.node.map(|c| c.id)
    }

    /// Painted facet whose drawn centroid is nearest to `p`, measured in
    /// model space against the facet centroid.
    pub fn calculate_closest_facet(
        &mut self,
        store: &ModelStore,
        ctx: &SelectionContext,
        p: &Point2,
    ) -> Option<FacetId> {
        self.facet = None;
        self.facet = self.accept(store, ctx, &ctx.painted.facets, p, |f| {
            store.facet_centroid(f)
        });
        self.facet.map(|c| c.id)
    }

    /// Painted region or control point nearest to `p`.
    pub fn calculate_closest_region(
        &mut self,
        store: &ModelStore,
        ctx: &SelectionContext,
        p: &Point2,
    ) -> Option<RegionId> {
        self.region = None;
        self.region = self.accept(store, ctx, &ctx.painted.regions, p, |r| {
            store.region_point(r)
        });
        self.region.map(|c| c.id)
    }
}
