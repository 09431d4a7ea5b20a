use super::facet::FacetId;
use super::node::NodeId;
use super::region::RegionId;
use super::registry::{Registry, RegistryEntry};

slotmap::new_key_type! {
    /// Unique identifier for a group in the group registry.
    pub struct GroupId;
}

/// 8-bit RGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from unit-range channels, clamping out-of-range input.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_unit(r: f64, g: f64, b: f64) -> Self {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(c(r), c(g), c(b))
    }
}

/// A named, colored partition of the model.
///
/// Holds the authoritative membership lists; each member also records its
/// group, and the model store keeps both sides in step.
#[derive(Debug, Clone)]
pub struct GroupData {
    name: String,
    color: Color,
    nodes: Vec<NodeId>,
    facets: Vec<FacetId>,
    regions: Vec<RegionId>,
    id: usize,
    attached: bool,
}

impl GroupData {
    /// Creates an empty group.
    #[must_use]
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            nodes: Vec::new(),
            facets: Vec::new(),
            regions: Vec::new(),
            id: 0,
            attached: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[must_use]
    pub fn facets(&self) -> &[FacetId] {
        &self.facets
    }

    #[must_use]
    pub fn regions(&self) -> &[RegionId] {
        &self.regions
    }

    /// Total number of member nodes, facets and regions.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.nodes.len() + self.facets.len() + self.regions.len()
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn set_name(&mut self, name: String) -> String {
        std::mem::replace(&mut self.name, name)
    }

    pub(crate) fn set_color(&mut self, color: Color) -> Color {
        std::mem::replace(&mut self.color, color)
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.nodes
    }

    pub(crate) fn facets_mut(&mut self) -> &mut Vec<FacetId> {
        &mut self.facets
    }

    pub(crate) fn regions_mut(&mut self) -> &mut Vec<RegionId> {
        &mut self.regions
    }
}

impl RegistryEntry for GroupData {
    const KIND: &'static str = "group";

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn set_id(&mut self, id: usize) {
        self.id = id;
    }
}

/// Ordered group collection; position drives paint and export order.
pub type GroupRegistry = Registry<GroupId, GroupData>;

impl GroupRegistry {
    /// First attached group with the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<GroupId> {
        self.iter().find(|(_, g)| g.name() == name).map(|(k, _)| k)
    }
}
