use tracing::debug;

use crate::error::Result;
use crate::model::{
    ElementId, FacetId, FacetPlacement, ModelStore, NodeId, NodePlacement, RegionId,
    RegionPlacement,
};

use super::{ensure_fresh, take_state, Command};

/// Placements recorded while detaching, in detach order.
#[derive(Debug, Default)]
pub(crate) struct Detachment {
    facets: Vec<(FacetId, FacetPlacement)>,
    nodes: Vec<(NodeId, NodePlacement)>,
    regions: Vec<(RegionId, RegionPlacement)>,
}

impl Detachment {
    /// Detaches facets first, then nodes, then regions.
    ///
    /// On failure everything detached so far is re-attached.
    pub(crate) fn detach(
        store: &mut ModelStore,
        facets: &[FacetId],
        nodes: &[NodeId],
        regions: &[RegionId],
    ) -> Result<Self> {
        let mut done = Self::default();
        if let Err(err) = done.detach_all(store, facets, nodes, regions) {
            done.restore(store)?;
            return Err(err);
        }
        Ok(done)
    }

    fn detach_all(
        &mut self,
        store: &mut ModelStore,
        facets: &[FacetId],
        nodes: &[NodeId],
        regions: &[RegionId],
    ) -> Result<()> {
        for &f in facets {
            let p = store.detach_facet(f)?;
            self.facets.push((f, p));
        }
        for &n in nodes {
            let p = store.detach_node(n)?;
            self.nodes.push((n, p));
        }
        for &r in regions {
            let p = store.detach_region(r)?;
            self.regions.push((r, p));
        }
        Ok(())
    }

    /// Re-attaches everything in reverse detach order.
    pub(crate) fn restore(self, store: &mut ModelStore) -> Result<()> {
        for (r, p) in self.regions.into_iter().rev() {
            store.attach_region(r, &p)?;
        }
        for (n, p) in self.nodes.into_iter().rev() {
            store.attach_node(n, &p)?;
        }
        for (f, p) in self.facets.into_iter().rev() {
            store.attach_facet(f, &p)?;
        }
        Ok(())
    }
}

/// Deletes nodes, facets and regions.
///
/// Deleting a node also deletes every facet that references it.
#[derive(Debug)]
pub struct RemoveElements {
    nodes: Vec<NodeId>,
    facets: Vec<FacetId>,
    regions: Vec<RegionId>,
    name: String,
    done: Option<Detachment>,
}

impl RemoveElements {
    /// Creates a removal of the given elements; repeats are ignored.
    #[must_use]
    pub fn new(elements: impl IntoIterator<Item = ElementId>) -> Self {
        let mut nodes = Vec::new();
        let mut facets = Vec::new();
        let mut regions = Vec::new();
        for e in elements {
            match e {
                ElementId::Node(n) if !nodes.contains(&n) => nodes.push(n),
                ElementId::Facet(f) if !facets.contains(&f) => facets.push(f),
                ElementId::Region(r) if !regions.contains(&r) => regions.push(r),
                _ => {}
            }
        }
        let name = match (nodes.is_empty(), facets.is_empty(), regions.is_empty()) {
            (false, true, true) => "delete nodes",
            (true, false, true) => "delete facets",
            (true, true, false) => "delete regions",
            _ => "delete elements",
        }
        .to_string();
        Self {
            nodes,
            facets,
            regions,
            name,
            done: None,
        }
    }

    #[must_use]
    pub fn nodes(ids: &[NodeId]) -> Self {
        Self::new(ids.iter().map(|&n| ElementId::Node(n)))
    }

    #[must_use]
    pub fn facets(ids: &[FacetId]) -> Self {
        Self::new(ids.iter().map(|&f| ElementId::Facet(f)))
    }

    #[must_use]
    pub fn regions(ids: &[RegionId]) -> Self {
        Self::new(ids.iter().map(|&r| ElementId::Region(r)))
    }

    /// Facets to detach: the explicit ones plus every facet of a removed
    /// node, without repeats.
    fn facet_closure(&self, store: &ModelStore) -> Result<Vec<FacetId>> {
        let mut out = self.facets.clone();
        for &n in &self.nodes {
            for &f in store.node(n)?.facets() {
                if !out.contains(&f) {
                    out.push(f);
                }
            }
        }
        Ok(out)
    }
}

impl Command for RemoveElements {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, store: &ModelStore) -> bool {
        (!self.nodes.is_empty() || !self.facets.is_empty() || !self.regions.is_empty())
            && self.nodes.iter().all(|&n| store.contains_node(n))
            && self.facets.iter().all(|&f| store.contains_facet(f))
            && self.regions.iter().all(|&r| store.contains_region(r))
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.done, &self.name)?;
        let facets = self.facet_closure(store)?;
        let done = Detachment::detach(store, &facets, &self.nodes, &self.regions)?;
        debug!(
            nodes = self.nodes.len(),
            facets = facets.len(),
            regions = self.regions.len(),
            "elements removed"
        );
        self.done = Some(done);
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        take_state(&mut self.done, &self.name)?.restore(store)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{cross_section, snapshot, Fixture};

    #[test]
    fn removing_node_cascades_to_facets() {
        let mut fx = Fixture::new();
        let ([a, b, ..], facets) = fx.tetrahedron();
        let before = snapshot(&fx.store);
        let mut cmd = RemoveElements::nodes(&[a]);
        assert!(cmd.check(&fx.store));
        cmd.execute(&mut fx.store).unwrap();
        assert_eq!(fx.store.node_count(), 3);
        assert_eq!(fx.store.facet_ids(), &[facets[2]]);
        assert_eq!(fx.store.node(b).unwrap().facets(), &[facets[2]]);
        cmd.undo(&mut fx.store).unwrap();
        assert_eq!(snapshot(&fx.store), before);
    }

    #[test]
    fn mixed_removal_round_trip() {
        let mut fx = Fixture::new();
        let s = fx.store.add_section(cross_section());
        let ([_, b, c, _], facets) = fx.tetrahedron();
        let r = fx.region(s, 1.0, 1.0, true);
        let on = fx.on_section(s, 5.0, 5.0);
        let before = snapshot(&fx.store);
        let mut cmd = RemoveElements::new([
            ElementId::Facet(facets[1]),
            ElementId::Node(c),
            ElementId::Region(r),
            ElementId::Node(on),
            ElementId::Node(c),
        ]);
        assert_eq!(cmd.name(), "delete elements");
        cmd.execute(&mut fx.store).unwrap();
        assert_eq!(fx.store.facet_count(), 0);
        assert!(fx.store.section(s).unwrap().nodes().is_empty());
        assert!(fx.store.node(b).unwrap().facets().is_empty());
        cmd.undo(&mut fx.store).unwrap();
        assert_eq!(snapshot(&fx.store), before);
    }

    #[test]
    fn check_rejects_missing_elements() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        let mut cmd = RemoveElements::nodes(&[a]);
        cmd.execute(&mut fx.store).unwrap();
        assert!(!RemoveElements::nodes(&[a]).check(&fx.store));
        assert!(!RemoveElements::nodes(&[]).check(&fx.store));
    }
}
