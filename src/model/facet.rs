use super::group::GroupId;
use super::node::NodeId;
use super::section::SectionId;

slotmap::new_key_type! {
    /// Unique identifier for a facet in the model store.
    pub struct FacetId;
}

/// Data associated with a facet.
///
/// A facet is an ordered node loop: two nodes for a line facet,
/// three or more for a polygon.
#[derive(Debug, Clone)]
pub struct FacetData {
    nodes: Vec<NodeId>,
    boundary: bool,
    group: GroupId,
    sections: Vec<SectionId>,
    id: usize,
    attached: bool,
}

impl FacetData {
    /// Creates a facet over `nodes` belonging to `group`.
    #[must_use]
    pub fn new(nodes: Vec<NodeId>, group: GroupId) -> Self {
        Self {
            nodes,
            boundary: false,
            group,
            sections: Vec::new(),
            id: 0,
            attached: false,
        }
    }

    /// Sets the boundary marker.
    #[must_use]
    pub fn with_boundary(mut self, boundary: bool) -> Self {
        self.boundary = boundary;
        self
    }

    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node references with repeats removed, in first-appearance order.
    #[must_use]
    pub fn distinct_nodes(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        for &n in &self.nodes {
            if !out.contains(&n) {
                out.push(n);
            }
        }
        out
    }

    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    #[must_use]
    pub fn boundary(&self) -> bool {
        self.boundary
    }

    #[must_use]
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Sections touched by the facet's nodes, in first-appearance order.
    #[must_use]
    pub fn sections(&self) -> &[SectionId] {
        &self.sections
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub(crate) fn set_nodes(&mut self, nodes: Vec<NodeId>) {
        self.nodes = nodes;
    }

    pub(crate) fn reverse(&mut self) {
        self.nodes.reverse();
    }

    pub(crate) fn set_boundary(&mut self, boundary: bool) {
        self.boundary = boundary;
    }

    pub(crate) fn set_group(&mut self, group: GroupId) {
        self.group = group;
    }

    pub(crate) fn set_sections(&mut self, sections: Vec<SectionId>) {
        self.sections = sections;
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    pub(crate) fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }
}
