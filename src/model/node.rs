use crate::math::{Point2, Point3};

use super::facet::FacetId;
use super::group::GroupId;
use super::section::SectionId;

slotmap::new_key_type! {
    /// Unique identifier for a node in the model store.
    pub struct NodeId;
}

/// Where a node's position is defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodePosition {
    /// Pixel coordinate on a section, resolved through its calibration.
    OnSection { section: SectionId, pixel: Point2 },
    /// Spatial coordinate, independent of any section.
    OffSection { point: Point3 },
}

impl NodePosition {
    /// The owning section, if the node is defined on one.
    #[must_use]
    pub fn section(&self) -> Option<SectionId> {
        match self {
            Self::OnSection { section, .. } => Some(*section),
            Self::OffSection { .. } => None,
        }
    }
}

/// Data associated with a node.
#[derive(Debug, Clone)]
pub struct NodeData {
    position: NodePosition,
    boundary: bool,
    group: GroupId,
    facets: Vec<FacetId>,
    id: usize,
    attached: bool,
}

impl NodeData {
    /// Creates a node belonging to `group`.
    #[must_use]
    pub fn new(position: NodePosition, group: GroupId) -> Self {
        Self {
            position,
            boundary: false,
            group,
            facets: Vec::new(),
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
    pub fn position(&self) -> &NodePosition {
        &self.position
    }

    #[must_use]
    pub fn section(&self) -> Option<SectionId> {
        self.position.section()
    }

    #[must_use]
    pub fn boundary(&self) -> bool {
        self.boundary
    }

    #[must_use]
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Facets that reference this node.
    #[must_use]
    pub fn facets(&self) -> &[FacetId] {
        &self.facets
    }

    /// Dense index assigned by the last [`ModelStore::reset_ids`](super::ModelStore::reset_ids).
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub(crate) fn set_position(&mut self, position: NodePosition) {
        self.position = position;
    }

    pub(crate) fn set_boundary(&mut self, boundary: bool) {
        self.boundary = boundary;
    }

    pub(crate) fn set_group(&mut self, group: GroupId) {
        self.group = group;
    }

    pub(crate) fn facets_mut(&mut self) -> &mut Vec<FacetId> {
        &mut self.facets
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    pub(crate) fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }
}
