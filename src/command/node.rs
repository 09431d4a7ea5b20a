use tracing::debug;

use crate::error::Result;
use crate::math::{Point2, Point3};
use crate::model::{
    FacetId, FacetPlacement, ModelStore, NodeData, NodeId, NodePlacement, NodePosition,
};
use crate::selection::SelectionContext;

use super::{ensure_fresh, take_state, Command};

/// Adds a node.
#[derive(Debug)]
pub struct AddNode {
    pending: Option<NodeData>,
    created: Option<NodeId>,
}

impl AddNode {
    #[must_use]
    pub fn new(data: NodeData) -> Self {
        Self {
            pending: Some(data),
            created: None,
        }
    }

    /// Node at `pixel` on the current section, in the current group.
    ///
    /// Returns `None` when the context has no current group or section.
    #[must_use]
    pub fn on_section(ctx: &SelectionContext, pixel: Point2) -> Option<Self> {
        let position = NodePosition::OnSection {
            section: ctx.current_section?,
            pixel,
        };
        Some(Self::new(NodeData::new(position, ctx.current_group?)))
    }

    /// Node at a spatial `point`, in the current group.
    #[must_use]
    pub fn off_section(ctx: &SelectionContext, point: Point3) -> Option<Self> {
        let position = NodePosition::OffSection { point };
        Some(Self::new(NodeData::new(position, ctx.current_group?)))
    }

    /// The new node's ID once executed.
    #[must_use]
    pub fn created(&self) -> Option<NodeId> {
        self.created
    }
}

impl Command for AddNode {
    fn name(&self) -> &str {
        "add node"
    }

    /// The group must be attached; an on-section node also needs an
    /// attached, calibrated section.
    fn check(&self, store: &ModelStore) -> bool {
        let Some(data) = &self.pending else {
            return false;
        };
        store.groups().contains(data.group())
            && data.section().is_none_or(|s| {
                store.sections().contains(s)
                    && store.section(s).is_ok_and(|sec| sec.is_calibrated())
            })
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.created, self.name())?;
        let data = take_state(&mut self.pending, "add node")?;
        match store.add_node(data.clone()) {
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
        let id = take_state(&mut self.created, "add node")?;
        store.detach_node(id)?;
        self.pending = Some(store.discard_node(id)?);
        Ok(())
    }
}

/// Moves a node within its section (or in space for off-section nodes).
#[derive(Debug)]
pub struct MoveNode {
    node: NodeId,
    position: NodePosition,
    previous: Option<NodePosition>,
}

impl MoveNode {
    #[must_use]
    pub fn new(node: NodeId, position: NodePosition) -> Self {
        Self {
            node,
            position,
            previous: None,
        }
    }
}

impl Command for MoveNode {
    fn name(&self) -> &str {
        "move node"
    }

    fn check(&self, store: &ModelStore) -> bool {
        store.contains_node(self.node)
            && store
                .node(self.node)
                .is_ok_and(|n| n.section() == self.position.section())
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.previous, self.name())?;
        self.previous = Some(store.set_node_position(self.node, self.position)?);
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let previous = take_state(&mut self.previous, "move node")?;
        store.set_node_position(self.node, previous)?;
        Ok(())
    }
}

#[derive(Debug)]
enum FacetEdit {
    Relinked {
        facet: FacetId,
        nodes: Vec<NodeId>,
        placement: FacetPlacement,
    },
    Removed {
        facet: FacetId,
        placement: FacetPlacement,
    },
}

/// Merges one node into another.
///
/// Every facet referencing `from` is relinked onto `into`; a facet that
/// already contains `into` just drops `from`, and one left with fewer than
/// two nodes is removed. `from` is then removed.
#[derive(Debug)]
pub struct MergeNodes {
    from: NodeId,
    into: NodeId,
    done: Option<(Vec<FacetEdit>, NodePlacement)>,
}

impl MergeNodes {
    #[must_use]
    pub fn new(from: NodeId, into: NodeId) -> Self {
        Self {
            from,
            into,
            done: None,
        }
    }

    /// Merges `node` into its nearest neighbour, if it has one.
    #[must_use]
    pub fn into_closest(store: &ModelStore, node: NodeId) -> Option<Self> {
        store
            .find_closest_node(node)
            .map(|into| Self::new(node, into))
    }

    fn relink(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        if nodes.contains(&self.into) {
            nodes.iter().copied().filter(|&n| n != self.from).collect()
        } else {
            nodes
                .iter()
                .map(|&n| if n == self.from { self.into } else { n })
                .collect()
        }
    }

    fn rollback(store: &mut ModelStore, edits: Vec<FacetEdit>) -> Result<()> {
        for edit in edits.into_iter().rev() {
            match edit {
                FacetEdit::Relinked {
                    facet,
                    nodes,
                    placement,
                } => {
                    store.replace_facet_nodes(facet, nodes, Some(&placement))?;
                }
                FacetEdit::Removed { facet, placement } => {
                    store.attach_facet(facet, &placement)?;
                }
            }
        }
        Ok(())
    }

    fn apply(&self, store: &mut ModelStore, edits: &mut Vec<FacetEdit>) -> Result<NodePlacement> {
        let facets = store.node(self.from)?.facets().to_vec();
        for facet in facets {
            let relinked = self.relink(store.facet(facet)?.nodes());
            if relinked.len() < 2 || relinked.iter().all(|&n| n == relinked[0]) {
                let placement = store.detach_facet(facet)?;
                edits.push(FacetEdit::Removed { facet, placement });
            } else {
                let (nodes, placement) = store.replace_facet_nodes(facet, relinked, None)?;
                edits.push(FacetEdit::Relinked {
                    facet,
                    nodes,
                    placement,
                });
            }
        }
        Ok(store.detach_node(self.from)?)
    }
}

impl Command for MergeNodes {
    fn name(&self) -> &str {
        "merge nodes"
    }

    fn check(&self, store: &ModelStore) -> bool {
        self.from != self.into && store.contains_node(self.from) && store.contains_node(self.into)
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.done, self.name())?;
        let mut edits = Vec::new();
        match self.apply(store, &mut edits) {
            Ok(placement) => {
                debug!(facets = edits.len(), "nodes merged");
                self.done = Some((edits, placement));
                Ok(())
            }
            Err(err) => {
                Self::rollback(store, edits)?;
                Err(err)
            }
        }
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let (edits, placement) = take_state(&mut self.done, "merge nodes")?;
        store.attach_node(self.from, &placement)?;
        Self::rollback(store, edits)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::NodePosition;
    use crate::selection::SelectionContext;
    use crate::test_support::{cross_section, snapshot, Fixture};

    #[test]
    fn add_node_on_current_section() {
        let mut fx = Fixture::new();
        let s = fx.store.add_section(cross_section());
        let before = snapshot(&fx.store);
        let ctx = SelectionContext::new(Some(fx.group), Some(s));
        let mut cmd = AddNode::on_section(&ctx, Point2::new(10.0, 20.0)).unwrap();
        assert!(cmd.check(&fx.store));
        cmd.execute(&mut fx.store).unwrap();
        let id = cmd.created().unwrap();
        assert_eq!(fx.store.node_point(id), Some(Point3::new(10.0, 0.0, -20.0)));
        assert_eq!(fx.store.section(s).unwrap().nodes(), &[id]);
        cmd.undo(&mut fx.store).unwrap();
        assert_eq!(snapshot(&fx.store), before);
        assert!(fx.store.node(id).is_err());
    }

    #[test]
    fn add_node_needs_context() {
        let ctx = SelectionContext::new(None, None);
        assert!(AddNode::on_section(&ctx, Point2::new(0.0, 0.0)).is_none());
        assert!(AddNode::off_section(&ctx, Point3::origin()).is_none());
    }

    #[test]
    fn add_node_on_uncalibrated_section_fails_check() {
        let mut fx = Fixture::new();
        let s = fx.store.add_section(crate::model::SectionData::new(
            crate::model::SectionOrientation::Depth,
            crate::model::SectionContent::Blank {
                width: 1.0,
                height: 1.0,
            },
        ));
        let ctx = SelectionContext::new(Some(fx.group), Some(s));
        let cmd = AddNode::on_section(&ctx, Point2::new(0.5, 0.5)).unwrap();
        assert!(!cmd.check(&fx.store));
    }

    #[test]
    fn move_node_round_trip() {
        let mut fx = Fixture::new();
        let n = fx.node(1.0, 2.0, 3.0);
        let before = snapshot(&fx.store);
        let target = NodePosition::OffSection {
            point: Point3::new(4.0, 5.0, 6.0),
        };
        let mut cmd = MoveNode::new(n, target);
        cmd.execute(&mut fx.store).unwrap();
        assert_eq!(fx.store.node_point(n), Some(Point3::new(4.0, 5.0, 6.0)));
        cmd.undo(&mut fx.store).unwrap();
        assert_eq!(snapshot(&fx.store), before);
    }

    #[test]
    fn move_node_across_sections_fails_check() {
        let mut fx = Fixture::new();
        let s = fx.store.add_section(cross_section());
        let n = fx.node(1.0, 2.0, 3.0);
        let cmd = MoveNode::new(
            n,
            NodePosition::OnSection {
                section: s,
                pixel: Point2::new(0.0, 0.0),
            },
        );
        assert!(!cmd.check(&fx.store));
    }

    #[test]
    fn merge_relinks_and_restores() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        let c = fx.node(0.0, 1.0, 0.0);
        let a2 = fx.node(0.0, 0.0, 0.0);
        let d = fx.node(1.0, 1.0, 0.0);
        let f0 = fx.facet(&[a2, b, c]);
        let f1 = fx.facet(&[a, a2, d]);
        let line = fx.facet(&[a, a2]);
        let before = snapshot(&fx.store);

        let mut cmd = MergeNodes::into_closest(&fx.store, a2).unwrap();
        assert!(cmd.check(&fx.store));
        cmd.execute(&mut fx.store).unwrap();
        assert!(!fx.store.contains_node(a2));
        assert_eq!(fx.store.facet(f0).unwrap().nodes(), &[a, b, c]);
        assert_eq!(fx.store.facet(f1).unwrap().nodes(), &[a, d]);
        assert!(!fx.store.contains_facet(line));
        assert_eq!(fx.store.node(a).unwrap().facets(), &[f1, f0]);

        cmd.undo(&mut fx.store).unwrap();
        assert_eq!(snapshot(&fx.store), before);
    }

    #[test]
    fn merge_into_self_fails_check() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        assert!(!MergeNodes::new(a, a).check(&fx.store));
    }
}
