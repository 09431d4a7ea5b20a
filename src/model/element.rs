use super::facet::FacetId;
use super::node::NodeId;
use super::region::RegionId;

/// A reference to any group-owned element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Node(NodeId),
    Facet(FacetId),
    Region(RegionId),
}

impl From<NodeId> for ElementId {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<FacetId> for ElementId {
    fn from(id: FacetId) -> Self {
        Self::Facet(id)
    }
}

impl From<RegionId> for ElementId {
    fn from(id: RegionId) -> Self {
        Self::Region(id)
    }
}
