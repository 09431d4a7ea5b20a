//! Caller-supplied view state consumed by commands and the synthesizer.

use crate::math::Point2;
use crate::model::{FacetId, GroupId, ModelStore, NodeId, RegionId, SectionId};

/// An element as currently drawn, with the 2D point it was drawn at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Painted<K> {
    pub id: K,
    pub pixel: Point2,
}

impl<K> Painted<K> {
    #[must_use]
    pub fn new(id: K, pixel: Point2) -> Self {
        Self { id, pixel }
    }
}

/// The visible working set, as projected by the display layer.
///
/// Facets are represented by the projection of their centroid.
#[derive(Debug, Clone, Default)]
pub struct PaintedSet {
    pub nodes: Vec<Painted<NodeId>>,
    pub facets: Vec<Painted<FacetId>>,
    pub regions: Vec<Painted<RegionId>>,
}

impl PaintedSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.facets.is_empty() && self.regions.is_empty()
    }

    /// Painted set of everything on `section`, drawn at its pixel
    /// coordinates. Facets are painted at the mean pixel of their
    /// on-section nodes.
    #[must_use]
    pub fn on_section(store: &ModelStore, section: SectionId) -> Self {
        let Ok(data) = store.section(section) else {
            return Self::default();
        };
        let node_pixel = |id: NodeId| match store.node(id).ok()?.position() {
            crate::model::NodePosition::OnSection { section: s, pixel } if *s == section => {
                Some(*pixel)
            }
            _ => None,
        };
        let nodes = data
            .nodes()
            .iter()
            .filter_map(|&n| node_pixel(n).map(|p| Painted::new(n, p)))
            .collect();
        let facets = data
            .facets()
            .iter()
            .filter_map(|&f| {
                let pixels: Vec<Point2> = store
                    .facet(f)
                    .ok()?
                    .nodes()
                    .iter()
                    .filter_map(|&n| node_pixel(n))
                    .collect();
                if pixels.is_empty() {
                    return None;
                }
                #[allow(clippy::cast_precision_loss)]
                let n = pixels.len() as f64;
                let sum = pixels.iter().fold(Point2::origin().coords, |acc, p| acc + p.coords);
                Some(Painted::new(f, Point2::from(sum / n)))
            })
            .collect();
        let regions = data
            .regions()
            .iter()
            .filter_map(|&r| {
                let region = store.region(r).ok()?;
                Some(Painted::new(r, region.pixel()))
            })
            .collect();
        Self {
            nodes,
            facets,
            regions,
        }
    }
}

/// Explicit view state a command or query depends on.
#[derive(Debug, Clone, Default)]
pub struct SelectionContext {
    pub current_group: Option<GroupId>,
    pub current_section: Option<SectionId>,
    pub painted: PaintedSet,
}

impl SelectionContext {
    #[must_use]
    pub fn new(current_group: Option<GroupId>, current_section: Option<SectionId>) -> Self {
        Self {
            current_group,
            current_section,
            painted: PaintedSet::default(),
        }
    }

    #[must_use]
    pub fn with_painted(mut self, painted: PaintedSet) -> Self {
        self.painted = painted;
        self
    }

    /// Makes `to` current if `from` is.
    pub fn redirect_group(&mut self, from: GroupId, to: GroupId) {
        if self.current_group == Some(from) {
            self.current_group = Some(to);
        }
    }

    /// Drops selection entries that are no longer attached. A removed
    /// current group falls back to the first group.
    pub fn repair(&mut self, store: &ModelStore) {
        if self
            .current_group
            .is_some_and(|g| !store.groups().contains(g))
        {
            self.current_group = store.groups().at(0);
        }
        if self
            .current_section
            .is_some_and(|s| !store.sections().contains(s))
        {
            self.current_section = None;
        }
        self.painted.nodes.retain(|p| store.contains_node(p.id));
        self.painted.facets.retain(|p| store.contains_facet(p.id));
        self.painted.regions.retain(|p| store.contains_region(p.id));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{cross_section, Fixture};

    #[test]
    fn painted_on_section_collects_members() {
        let mut fx = Fixture::new();
        let s = fx.store.add_section(cross_section());
        let a = fx.on_section(s, 0.0, 0.0);
        let b = fx.on_section(s, 10.0, 0.0);
        let c = fx.node(50.0, 50.0, 50.0);
        let f = fx.facet(&[a, b, c]);
        let r = fx.region(s, 3.0, 3.0, false);
        let painted = PaintedSet::on_section(&fx.store, s);
        assert_eq!(painted.nodes.len(), 2);
        assert_eq!(painted.facets, vec![Painted::new(f, Point2::new(5.0, 0.0))]);
        assert_eq!(painted.regions[0].id, r);
    }

    #[test]
    fn repair_drops_removed_group() {
        let mut fx = Fixture::new();
        let g2 = fx
            .store
            .add_group(crate::model::GroupData::new("b", crate::model::Color::default()));
        let mut ctx = SelectionContext::new(Some(g2), None);
        fx.store.detach_group(g2).unwrap();
        ctx.repair(&fx.store);
        assert_eq!(ctx.current_group, Some(fx.group));
    }
}
