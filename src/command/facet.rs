use crate::error::Result;
use crate::model::{FacetData, FacetId, GroupId, ModelStore, NodeId};
use crate::selection::SelectionContext;

use super::{ensure_fresh, ensure_state, take_state, Command};

/// Adds a facet.
#[derive(Debug)]
pub struct AddFacet {
    pending: Option<FacetData>,
    created: Option<FacetId>,
}

impl AddFacet {
    #[must_use]
    pub fn new(nodes: Vec<NodeId>, group: GroupId) -> Self {
        Self {
            pending: Some(FacetData::new(nodes, group)),
            created: None,
        }
    }

    /// Facet over `nodes` in the current group.
    #[must_use]
    pub fn in_current_group(ctx: &SelectionContext, nodes: Vec<NodeId>) -> Option<Self> {
        Some(Self::new(nodes, ctx.current_group?))
    }

    #[must_use]
    pub fn created(&self) -> Option<FacetId> {
        self.created
    }
}

/// Returns `true` if some attached facet has exactly the node set `nodes`.
fn facet_exists(store: &ModelStore, nodes: &[NodeId]) -> bool {
    let Some(&first) = nodes.first() else {
        return false;
    };
    let Ok(node) = store.node(first) else {
        return false;
    };
    node.facets().iter().any(|&f| {
        store.facet(f).is_ok_and(|other| {
            let mut theirs = other.distinct_nodes();
            theirs.sort_unstable();
            let mut ours = nodes.to_vec();
            ours.sort_unstable();
            theirs == ours
        })
    })
}

impl Command for AddFacet {
    fn name(&self) -> &str {
        "add facet"
    }

    /// At least two distinct attached nodes, no repeats, an attached group,
    /// and no existing facet over the same nodes.
    fn check(&self, store: &ModelStore) -> bool {
        let Some(data) = &self.pending else {
            return false;
        };
        data.len() >= 2
            && data.distinct_nodes().len() == data.len()
            && data.nodes().iter().all(|&n| store.contains_node(n))
            && store.groups().contains(data.group())
            && !facet_exists(store, data.nodes())
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.created, "add facet")?;
        let data = take_state(&mut self.pending, "add facet")?;
        match store.add_facet(data.clone()) {
            Ok(id) => {
                self.created = Some(id);
                Ok(())
            }
            Err(err) => {
                self.pending = Some(data);
                Err(err.into())
            }
        }
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let id = take_state(&mut self.created, "add facet")?;
        store.detach_facet(id)?;
        self.pending = Some(store.discard_facet(id)?);
        Ok(())
    }
}

/// Reverses the node order (orientation) of facets.
#[derive(Debug)]
pub struct ReverseFacets {
    facets: Vec<FacetId>,
    executed: bool,
}

impl ReverseFacets {
    #[must_use]
    pub fn new(facets: Vec<FacetId>) -> Self {
        Self {
            facets,
            executed: false,
        }
    }

    fn flip(&self, store: &mut ModelStore) -> Result<()> {
        for &f in &self.facets {
            store.reverse_facet(f)?;
        }
        Ok(())
    }
}

impl Command for ReverseFacets {
    fn name(&self) -> &str {
        "reverse facets"
    }

    fn check(&self, store: &ModelStore) -> bool {
        !self.facets.is_empty() && self.facets.iter().all(|&f| store.contains_facet(f))
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_state(self.executed, false, "reverse facets")?;
        self.flip(store)?;
        self.executed = true;
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_state(self.executed, true, "reverse facets")?;
        // Reversal is its own inverse.
        self.flip(store)?;
        self.executed = false;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::selection::SelectionContext;
    use crate::test_support::{snapshot, Fixture};

    #[test]
    fn add_facet_round_trip() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        let c = fx.node(0.0, 1.0, 0.0);
        let before = snapshot(&fx.store);
        let ctx = SelectionContext::new(Some(fx.group), None);
        let mut cmd = AddFacet::in_current_group(&ctx, vec![a, b, c]).unwrap();
        assert!(cmd.check(&fx.store));
        cmd.execute(&mut fx.store).unwrap();
        let f = cmd.created().unwrap();
        assert_eq!(fx.store.node(b).unwrap().facets(), &[f]);
        cmd.undo(&mut fx.store).unwrap();
        assert_eq!(snapshot(&fx.store), before);
    }

    #[test]
    fn add_facet_rejects_repeats_and_duplicates() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        let c = fx.node(0.0, 1.0, 0.0);
        assert!(!AddFacet::new(vec![a, b, a], fx.group).check(&fx.store));
        assert!(!AddFacet::new(vec![a], fx.group).check(&fx.store));
        fx.facet(&[a, b, c]);
        assert!(!AddFacet::new(vec![c, a, b], fx.group).check(&fx.store));
        assert!(AddFacet::new(vec![a, b], fx.group).check(&fx.store));
    }

    #[test]
    fn reverse_twice_restores() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        let c = fx.node(0.0, 1.0, 0.0);
        let f = fx.facet(&[a, b, c]);
        let before = snapshot(&fx.store);
        let mut cmd = ReverseFacets::new(vec![f]);
        cmd.execute(&mut fx.store).unwrap();
        assert_eq!(fx.store.facet(f).unwrap().nodes(), &[c, b, a]);
        assert!(fx.store.facet_normal(f).unwrap().z < 0.0);
        cmd.undo(&mut fx.store).unwrap();
        assert_eq!(snapshot(&fx.store), before);
    }
}
