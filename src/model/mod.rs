pub mod element;
pub mod facet;
pub mod group;
pub mod node;
pub mod region;
pub mod registry;
pub mod section;
pub mod voi;

pub use element::ElementId;
pub use facet::{FacetData, FacetId};
pub use group::{Color, GroupData, GroupId, GroupRegistry};
pub use node::{NodeData, NodeId, NodePosition};
pub use region::{RegionData, RegionId};
pub use registry::{Registry, RegistryEntry};
pub use section::{
    Calibration, SectionContent, SectionData, SectionId, SectionOrientation, SectionRegistry,
};
pub use voi::Voi;

use slotmap::SlotMap;

use crate::error::ModelError;
use crate::math::polygon_3d;
use crate::math::{Point2, Point3, Vector3};
use registry::{insert_key, remove_key};

/// List positions a node occupied before it was detached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePlacement {
    order: usize,
    group: usize,
    section: Option<usize>,
}

/// List positions a facet occupied before it was detached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetPlacement {
    order: usize,
    group: usize,
    sections: Vec<(SectionId, usize)>,
    nodes: Vec<(NodeId, usize)>,
}

/// List positions a region occupied before it was detached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPlacement {
    order: usize,
    group: usize,
    section: usize,
}

fn slot_of<K: PartialEq + Copy>(slots: &[(K, usize)], key: K) -> Option<usize> {
    slots.iter().find(|(k, _)| *k == key).map(|&(_, i)| i)
}

/// Central arena that owns all model elements.
///
/// Nodes, facets and regions live in arenas keyed by generational IDs;
/// separate order lists hold the attached elements in container order.
/// Detached elements stay in their arena so that commands can re-attach
/// them under the same key. Every method that adds or removes an element
/// updates its group, its section and the node→facet back-references in
/// the same call.
#[derive(Debug, Default)]
pub struct ModelStore {
    nodes: SlotMap<NodeId, NodeData>,
    facets: SlotMap<FacetId, FacetData>,
    regions: SlotMap<RegionId, RegionData>,
    node_order: Vec<NodeId>,
    facet_order: Vec<FacetId>,
    region_order: Vec<RegionId>,
    groups: GroupRegistry,
    sections: SectionRegistry,
    voi: Option<Voi>,
}

impl ModelStore {
    /// Creates a new, empty model store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Node operations ---

    /// Inserts a node and registers it with its group and section.
    ///
    /// # Errors
    ///
    /// Returns an error if the node's group or section is not attached.
    pub(crate) fn add_node(&mut self, mut data: NodeData) -> Result<NodeId, ModelError> {
        let group = data.group();
        let section = data.section();
        self.groups.attached(group)?;
        if let Some(s) = section {
            self.sections.attached(s)?;
        }
        data.facets_mut().clear();
        data.set_attached(true);
        let id = self.nodes.insert(data);
        self.node_order.push(id);
        self.groups.get_mut(group)?.nodes_mut().push(id);
        if let Some(s) = section {
            self.sections.get_mut(s)?.nodes_mut().push(id);
        }
        Ok(id)
    }

    /// Re-attaches a detached node at the positions it held before.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown or already attached, or its
    /// group or section is detached.
    pub(crate) fn attach_node(
        &mut self,
        id: NodeId,
        placement: &NodePlacement,
    ) -> Result<(), ModelError> {
        let node = self.node(id)?;
        if node.is_attached() {
            return Err(ModelError::AlreadyAttached("node"));
        }
        let group = node.group();
        let section = node.section();
        self.groups.attached(group)?;
        if let Some(s) = section {
            self.sections.attached(s)?;
        }
        insert_key(&mut self.node_order, Some(placement.order), id);
        insert_key(self.groups.get_mut(group)?.nodes_mut(), Some(placement.group), id);
        if let Some(s) = section {
            insert_key(self.sections.get_mut(s)?.nodes_mut(), placement.section, id);
        }
        self.node_mut(id)?.set_attached(true);
        Ok(())
    }

    /// Deregisters a node from the store, its group and its section.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not attached or still referenced by
    /// facets.
    pub(crate) fn detach_node(&mut self, id: NodeId) -> Result<NodePlacement, ModelError> {
        let node = self.attached_node(id)?;
        if !node.facets().is_empty() {
            return Err(ModelError::NodeInUse(node.facets().len()));
        }
        let group = node.group();
        let section = node.section();
        let order = remove_key(&mut self.node_order, id).ok_or(ModelError::Detached("node"))?;
        let group_index =
            remove_key(self.groups.get_mut(group)?.nodes_mut(), id)
                .ok_or(ModelError::Detached("node"))?;
        let section_index = match section {
            Some(s) => remove_key(self.sections.get_mut(s)?.nodes_mut(), id),
            None => None,
        };
        self.node_mut(id)?.set_attached(false);
        Ok(NodePlacement {
            order,
            group: group_index,
            section: section_index,
        })
    }

    /// Drops a detached node from the arena, returning its data.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown or still attached.
    pub(crate) fn discard_node(&mut self, id: NodeId) -> Result<NodeData, ModelError> {
        if self.node(id)?.is_attached() {
            return Err(ModelError::AlreadyAttached("node"));
        }
        self.nodes.remove(id).ok_or(ModelError::EntityNotFound("node"))
    }

    /// Returns the node data, attached or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the arena.
    pub fn node(&self, id: NodeId) -> Result<&NodeData, ModelError> {
        self.nodes.get(id).ok_or(ModelError::EntityNotFound("node"))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, ModelError> {
        self.nodes
            .get_mut(id)
            .ok_or(ModelError::EntityNotFound("node"))
    }

    fn attached_node(&self, id: NodeId) -> Result<&NodeData, ModelError> {
        let node = self.node(id)?;
        if node.is_attached() {
            Ok(node)
        } else {
            Err(ModelError::Detached("node"))
        }
    }

    /// Replaces a node's position, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not attached or the new position
    /// names a different section.
    pub(crate) fn set_node_position(
        &mut self,
        id: NodeId,
        position: NodePosition,
    ) -> Result<NodePosition, ModelError> {
        let node = self.attached_node(id)?;
        if node.section() != position.section() {
            return Err(ModelError::SectionChange);
        }
        let old = *node.position();
        self.node_mut(id)?.set_position(position);
        Ok(old)
    }

    /// Sets a node's boundary marker, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not attached.
    pub(crate) fn set_node_boundary(
        &mut self,
        id: NodeId,
        boundary: bool,
    ) -> Result<bool, ModelError> {
        let old = self.attached_node(id)?.boundary();
        self.node_mut(id)?.set_boundary(boundary);
        Ok(old)
    }

    /// Replaces a node's facet back-references with a permutation of them.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EntityNotFound`] if `order` is not a
    /// permutation of the current back-references.
    pub(crate) fn reorder_node_facets(
        &mut self,
        id: NodeId,
        order: Vec<FacetId>,
    ) -> Result<(), ModelError> {
        let current = self.attached_node(id)?.facets();
        let same = current.len() == order.len()
            && order.iter().all(|f| current.contains(f))
            && current.iter().all(|f| order.contains(f));
        if !same {
            return Err(ModelError::EntityNotFound("facet back-reference"));
        }
        *self.node_mut(id)?.facets_mut() = order;
        Ok(())
    }

    /// Spatial position of a node, or `None` if its section is uncalibrated.
    #[must_use]
    pub fn node_point(&self, id: NodeId) -> Option<Point3> {
        match self.nodes.get(id)?.position() {
            NodePosition::OffSection { point } => Some(*point),
            NodePosition::OnSection { section, pixel } => {
                self.sections.get(*section).ok()?.pixel_to_model(pixel)
            }
        }
    }

    /// Returns `true` if the node is attached.
    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(NodeData::is_attached)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    #[must_use]
    pub fn has_nodes(&self) -> bool {
        !self.node_order.is_empty()
    }

    /// Node at position `index` in container order.
    #[must_use]
    pub fn node_at(&self, index: usize) -> Option<NodeId> {
        self.node_order.get(index).copied()
    }

    /// Attached node IDs in container order.
    #[must_use]
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_order
    }

    /// Attached nodes in container order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> + '_ {
        self.node_order
            .iter()
            .filter_map(|&id| self.nodes.get(id).map(|n| (id, n)))
    }

    /// Nearest other attached node by spatial distance.
    ///
    /// Linear scan in container order; the first node found at the minimum
    /// distance wins. Nodes that cannot be resolved are skipped.
    #[must_use]
    pub fn find_closest_node(&self, id: NodeId) -> Option<NodeId> {
        let target = self.node_point(id)?;
        let mut best: Option<(NodeId, f64)> = None;
        for &other in &self.node_order {
            if other == id {
                continue;
            }
            let Some(p) = self.node_point(other) else {
                continue;
            };
            let d = (p - target).norm();
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((other, d));
            }
        }
        best.map(|(n, _)| n)
    }

    // --- Facet operations ---

    /// Inserts a facet and registers it with its group, the sections its
    /// nodes lie on, and each node's facet list.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet has fewer than two nodes, or any node
    /// or the group is not attached.
    pub(crate) fn add_facet(&mut self, mut data: FacetData) -> Result<FacetId, ModelError> {
        if data.len() < 2 {
            return Err(ModelError::TooFewNodes(data.len()));
        }
        let sections = self.validate_facet(&data)?;
        data.set_sections(sections);
        data.set_attached(false);
        let id = self.facets.insert(data);
        self.link_facet(id, None)?;
        Ok(id)
    }

    /// Re-attaches a detached facet at the positions it held before.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet is unknown or already attached, or any
    /// of its nodes, its group or sections is detached.
    pub(crate) fn attach_facet(
        &mut self,
        id: FacetId,
        placement: &FacetPlacement,
    ) -> Result<(), ModelError> {
        let facet = self.facet(id)?;
        if facet.is_attached() {
            return Err(ModelError::AlreadyAttached("facet"));
        }
        let sections = self.validate_facet(facet)?;
        self.facet_mut(id)?.set_sections(sections);
        self.link_facet(id, Some(placement))
    }

    /// Deregisters a facet from the store, its group, its sections and its
    /// nodes' facet lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet is not attached.
    pub(crate) fn detach_facet(&mut self, id: FacetId) -> Result<FacetPlacement, ModelError> {
        let facet = self.attached_facet(id)?;
        let group = facet.group();
        let sections = facet.sections().to_vec();
        let distinct = facet.distinct_nodes();

        let order = remove_key(&mut self.facet_order, id).ok_or(ModelError::Detached("facet"))?;
        let group_index = remove_key(self.groups.get_mut(group)?.facets_mut(), id)
            .ok_or(ModelError::Detached("facet"))?;
        let mut section_slots = Vec::with_capacity(sections.len());
        for s in sections {
            if let Some(i) = remove_key(self.sections.get_mut(s)?.facets_mut(), id) {
                section_slots.push((s, i));
            }
        }
        let mut node_slots = Vec::with_capacity(distinct.len());
        for n in distinct {
            if let Some(i) = remove_key(self.node_mut(n)?.facets_mut(), id) {
                node_slots.push((n, i));
            }
        }
        self.facet_mut(id)?.set_attached(false);
        Ok(FacetPlacement {
            order,
            group: group_index,
            sections: section_slots,
            nodes: node_slots,
        })
    }

    /// Drops a detached facet from the arena, returning its data.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet is unknown or still attached.
    pub(crate) fn discard_facet(&mut self, id: FacetId) -> Result<FacetData, ModelError> {
        if self.facet(id)?.is_attached() {
            return Err(ModelError::AlreadyAttached("facet"));
        }
        self.facets
            .remove(id)
            .ok_or(ModelError::EntityNotFound("facet"))
    }

    /// Swaps a facet's node list, re-linking back-references.
    ///
    /// The facet keeps the container, group and section positions given by
    /// `placement`, or its current ones when `placement` is `None`. Returns
    /// the previous node list and the placement it had before the call.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet is not attached, the new list has fewer
    /// than two nodes, or any new node is not attached.
    pub(crate) fn replace_facet_nodes(
        &mut self,
        id: FacetId,
        nodes: Vec<NodeId>,
        placement: Option<&FacetPlacement>,
    ) -> Result<(Vec<NodeId>, FacetPlacement), ModelError> {
        self.attached_facet(id)?;
        if nodes.len() < 2 {
            return Err(ModelError::TooFewNodes(nodes.len()));
        }
        for &n in &nodes {
            self.attached_node(n)?;
        }
        let previous = self.detach_facet(id)?;
        let facet = self.facet_mut(id)?;
        let old_nodes = facet.nodes().to_vec();
        facet.set_nodes(nodes);
        let target = placement.cloned().unwrap_or_else(|| previous.clone());
        self.attach_facet(id, &target)?;
        Ok((old_nodes, previous))
    }

    /// Reverses a facet's node order (flips its normal).
    ///
    /// # Errors
    ///
    /// Returns an error if the facet is not attached.
    pub(crate) fn reverse_facet(&mut self, id: FacetId) -> Result<(), ModelError> {
        self.attached_facet(id)?;
        self.facet_mut(id)?.reverse();
        Ok(())
    }

    /// Sets a facet's boundary marker, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet is not attached.
    pub(crate) fn set_facet_boundary(
        &mut self,
        id: FacetId,
        boundary: bool,
    ) -> Result<bool, ModelError> {
        let old = self.attached_facet(id)?.boundary();
        self.facet_mut(id)?.set_boundary(boundary);
        Ok(old)
    }

    /// Returns the facet data, attached or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet is not in the arena.
    pub fn facet(&self, id: FacetId) -> Result<&FacetData, ModelError> {
        self.facets
            .get(id)
            .ok_or(ModelError::EntityNotFound("facet"))
    }

    fn facet_mut(&mut self, id: FacetId) -> Result<&mut FacetData, ModelError> {
        self.facets
            .get_mut(id)
            .ok_or(ModelError::EntityNotFound("facet"))
    }

    fn attached_facet(&self, id: FacetId) -> Result<&FacetData, ModelError> {
        let facet = self.facet(id)?;
        if facet.is_attached() {
            Ok(facet)
        } else {
            Err(ModelError::Detached("facet"))
        }
    }

    /// Checks a facet's references and returns the sections it touches.
    fn validate_facet(&self, data: &FacetData) -> Result<Vec<SectionId>, ModelError> {
        self.groups.attached(data.group())?;
        let mut sections = Vec::new();
        for n in data.distinct_nodes() {
            if let Some(s) = self.attached_node(n)?.section() {
                self.sections.attached(s)?;
                if !sections.contains(&s) {
                    sections.push(s);
                }
            }
        }
        Ok(sections)
    }

    fn link_facet(
        &mut self,
        id: FacetId,
        placement: Option<&FacetPlacement>,
    ) -> Result<(), ModelError> {
        let facet = self.facet(id)?;
        let group = facet.group();
        let sections = facet.sections().to_vec();
        let distinct = facet.distinct_nodes();

        insert_key(&mut self.facet_order, placement.map(|p| p.order), id);
        insert_key(
            self.groups.get_mut(group)?.facets_mut(),
            placement.map(|p| p.group),
            id,
        );
        for s in sections {
            let at = placement.and_then(|p| slot_of(&p.sections, s));
            insert_key(self.sections.get_mut(s)?.facets_mut(), at, id);
        }
        for n in distinct {
            let at = placement.and_then(|p| slot_of(&p.nodes, n));
            insert_key(self.node_mut(n)?.facets_mut(), at, id);
        }
        self.facet_mut(id)?.set_attached(true);
        Ok(())
    }

    /// Spatial positions of a facet's nodes, or `None` if any node cannot
    /// be resolved.
    #[must_use]
    pub fn facet_points(&self, id: FacetId) -> Option<Vec<Point3>> {
        self.facets
            .get(id)?
            .nodes()
            .iter()
            .map(|&n| self.node_point(n))
            .collect()
    }

    #[must_use]
    pub fn facet_centroid(&self, id: FacetId) -> Option<Point3> {
        polygon_3d::centroid(&self.facet_points(id)?)
    }

    /// Unit normal of a polygonal facet; `None` for line facets and
    /// degenerate polygons.
    #[must_use]
    pub fn facet_normal(&self, id: FacetId) -> Option<Vector3> {
        polygon_3d::newell_normal(&self.facet_points(id)?)
    }

    #[must_use]
    pub fn contains_facet(&self, id: FacetId) -> bool {
        self.facets.get(id).is_some_and(FacetData::is_attached)
    }

    #[must_use]
    pub fn facet_count(&self) -> usize {
        self.facet_order.len()
    }

    #[must_use]
    pub fn has_facets(&self) -> bool {
        !self.facet_order.is_empty()
    }

    #[must_use]
    pub fn facet_at(&self, index: usize) -> Option<FacetId> {
        self.facet_order.get(index).copied()
    }

    #[must_use]
    pub fn facet_ids(&self) -> &[FacetId] {
        &self.facet_order
    }

    /// Attached facets in container order.
    pub fn facets(&self) -> impl Iterator<Item = (FacetId, &FacetData)> + '_ {
        self.facet_order
            .iter()
            .filter_map(|&id| self.facets.get(id).map(|f| (id, f)))
    }

    // --- Region operations ---

    /// Inserts a region point and registers it with its group and section.
    ///
    /// # Errors
    ///
    /// Returns an error if the group or section is not attached.
    pub(crate) fn add_region(&mut self, mut data: RegionData) -> Result<RegionId, ModelError> {
        let group = data.group();
        let section = data.section();
        self.groups.attached(group)?;
        self.sections.attached(section)?;
        data.set_attached(true);
        let id = self.regions.insert(data);
        self.region_order.push(id);
        self.groups.get_mut(group)?.regions_mut().push(id);
        self.sections.get_mut(section)?.regions_mut().push(id);
        Ok(id)
    }

    /// Re-attaches a detached region at the positions it held before.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is unknown or already attached, or
    /// its group or section is detached.
    pub(crate) fn attach_region(
        &mut self,
        id: RegionId,
        placement: &RegionPlacement,
    ) -> Result<(), ModelError> {
        let region = self.region(id)?;
        if region.is_attached() {
            return Err(ModelError::AlreadyAttached("region"));
        }
        let group = region.group();
        let section = region.section();
        self.groups.attached(group)?;
        self.sections.attached(section)?;
        insert_key(&mut self.region_order, Some(placement.order), id);
        insert_key(self.groups.get_mut(group)?.regions_mut(), Some(placement.group), id);
        insert_key(
            self.sections.get_mut(section)?.regions_mut(),
            Some(placement.section),
            id,
        );
        self.region_mut(id)?.set_attached(true);
        Ok(())
    }

    /// Deregisters a region from the store, its group and its section.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is not attached.
    pub(crate) fn detach_region(&mut self, id: RegionId) -> Result<RegionPlacement, ModelError> {
        let region = self.region(id)?;
        if !region.is_attached() {
            return Err(ModelError::Detached("region"));
        }
        let group = region.group();
        let section = region.section();
        let detached = || ModelError::Detached("region");
        let order = remove_key(&mut self.region_order, id).ok_or_else(detached)?;
        let group_index =
            remove_key(self.groups.get_mut(group)?.regions_mut(), id).ok_or_else(detached)?;
        let section_index =
            remove_key(self.sections.get_mut(section)?.regions_mut(), id).ok_or_else(detached)?;
        self.region_mut(id)?.set_attached(false);
        Ok(RegionPlacement {
            order,
            group: group_index,
            section: section_index,
        })
    }

    /// Drops a detached region from the arena, returning its data.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is unknown or still attached.
    pub(crate) fn discard_region(&mut self, id: RegionId) -> Result<RegionData, ModelError> {
        if self.region(id)?.is_attached() {
            return Err(ModelError::AlreadyAttached("region"));
        }
        self.regions
            .remove(id)
            .ok_or(ModelError::EntityNotFound("region"))
    }

    /// Moves a region point within its section, returning the old pixel.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is not attached.
    pub(crate) fn set_region_pixel(
        &mut self,
        id: RegionId,
        pixel: Point2,
    ) -> Result<Point2, ModelError> {
        let region = self.region_mut(id)?;
        if !region.is_attached() {
            return Err(ModelError::Detached("region"));
        }
        let old = region.pixel();
        region.set_pixel(pixel);
        Ok(old)
    }

    /// Returns the region data, attached or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is not in the arena.
    pub fn region(&self, id: RegionId) -> Result<&RegionData, ModelError> {
        self.regions
            .get(id)
            .ok_or(ModelError::EntityNotFound("region"))
    }

    fn region_mut(&mut self, id: RegionId) -> Result<&mut RegionData, ModelError> {
        self.regions
            .get_mut(id)
            .ok_or(ModelError::EntityNotFound("region"))
    }

    /// Spatial position of a region point, or `None` if its section is
    /// uncalibrated.
    #[must_use]
    pub fn region_point(&self, id: RegionId) -> Option<Point3> {
        let region = self.regions.get(id)?;
        self.sections
            .get(region.section())
            .ok()?
            .pixel_to_model(&region.pixel())
    }

    #[must_use]
    pub fn contains_region(&self, id: RegionId) -> bool {
        self.regions.get(id).is_some_and(RegionData::is_attached)
    }

    #[must_use]
    pub fn region_count(&self) -> usize {
        self.region_order.len()
    }

    #[must_use]
    pub fn has_regions(&self) -> bool {
        !self.region_order.is_empty()
    }

    #[must_use]
    pub fn region_at(&self, index: usize) -> Option<RegionId> {
        self.region_order.get(index).copied()
    }

    #[must_use]
    pub fn region_ids(&self) -> &[RegionId] {
        &self.region_order
    }

    /// Attached regions in container order.
    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &RegionData)> + '_ {
        self.region_order
            .iter()
            .filter_map(|&id| self.regions.get(id).map(|r| (id, r)))
    }

    // --- Group membership ---

    /// Moves an element into `group` at `index` (appended when `None`).
    ///
    /// Returns the element's previous group and its position there, which
    /// is exactly what is needed to move it back.
    ///
    /// # Errors
    ///
    /// Returns an error if the element or the target group is not attached.
    pub(crate) fn reassign_group(
        &mut self,
        element: ElementId,
        group: GroupId,
        index: Option<usize>,
    ) -> Result<(GroupId, usize), ModelError> {
        self.groups.attached(group)?;
        match element {
            ElementId::Node(id) => {
                let old = self.attached_node(id)?.group();
                let at = remove_key(self.groups.get_mut(old)?.nodes_mut(), id)
                    .ok_or(ModelError::Detached("node"))?;
                insert_key(self.groups.get_mut(group)?.nodes_mut(), index, id);
                self.node_mut(id)?.set_group(group);
                Ok((old, at))
            }
            ElementId::Facet(id) => {
                let old = self.attached_facet(id)?.group();
                let at = remove_key(self.groups.get_mut(old)?.facets_mut(), id)
                    .ok_or(ModelError::Detached("facet"))?;
                insert_key(self.groups.get_mut(group)?.facets_mut(), index, id);
                self.facet_mut(id)?.set_group(group);
                Ok((old, at))
            }
            ElementId::Region(id) => {
                let region = self.region(id)?;
                if !region.is_attached() {
                    return Err(ModelError::Detached("region"));
                }
                let old = region.group();
                let at = remove_key(self.groups.get_mut(old)?.regions_mut(), id)
                    .ok_or(ModelError::Detached("region"))?;
                insert_key(self.groups.get_mut(group)?.regions_mut(), index, id);
                self.region_mut(id)?.set_group(group);
                Ok((old, at))
            }
        }
    }

    /// Group that currently owns `element`.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not in the arena.
    pub fn group_of(&self, element: ElementId) -> Result<GroupId, ModelError> {
        Ok(match element {
            ElementId::Node(id) => self.node(id)?.group(),
            ElementId::Facet(id) => self.facet(id)?.group(),
            ElementId::Region(id) => self.region(id)?.group(),
        })
    }

    // --- Group registry ---

    /// Group registry (read-only).
    #[must_use]
    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    /// Returns the group data, attached or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is not in the registry arena.
    pub fn group(&self, id: GroupId) -> Result<&GroupData, ModelError> {
        self.groups.get(id)
    }

    /// Appends a new group.
    pub(crate) fn add_group(&mut self, data: GroupData) -> GroupId {
        self.groups.add(data)
    }

    /// Re-attaches a detached group at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is unknown or already attached.
    pub(crate) fn attach_group(&mut self, id: GroupId, index: usize) -> Result<(), ModelError> {
        self.groups.attach(id, index)
    }

    /// Detaches an empty group, returning its position.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is not attached or still has members.
    pub(crate) fn detach_group(&mut self, id: GroupId) -> Result<usize, ModelError> {
        let members = self.groups.attached(id)?.member_count();
        if members > 0 {
            return Err(ModelError::NotEmpty {
                kind: "group",
                members,
            });
        }
        self.groups.detach(id)
    }

    /// Drops a detached group from the registry arena.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is unknown or still attached.
    pub(crate) fn discard_group(&mut self, id: GroupId) -> Result<GroupData, ModelError> {
        self.groups.discard(id)
    }

    /// Renames a group, returning the old name.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is not attached.
    pub(crate) fn rename_group(&mut self, id: GroupId, name: String) -> Result<String, ModelError> {
        Ok(self.groups.attached_mut(id)?.set_name(name))
    }

    /// Recolors a group, returning the old color.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is not attached.
    pub(crate) fn recolor_group(&mut self, id: GroupId, color: Color) -> Result<Color, ModelError> {
        Ok(self.groups.attached_mut(id)?.set_color(color))
    }

    /// Moves a group by `delta` positions, clamped to the registry bounds.
    ///
    /// Returns the new position, or `None` when the group did not move.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is not attached.
    pub(crate) fn move_group(
        &mut self,
        id: GroupId,
        delta: isize,
    ) -> Result<Option<usize>, ModelError> {
        self.groups.move_by(id, delta)
    }

    /// Reverses the group order.
    pub(crate) fn reverse_groups(&mut self) {
        self.groups.reverse();
    }

    // --- Section registry ---

    /// Section registry (read-only).
    #[must_use]
    pub fn sections(&self) -> &SectionRegistry {
        &self.sections
    }

    /// Returns the section data, attached or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is not in the registry arena.
    pub fn section(&self, id: SectionId) -> Result<&SectionData, ModelError> {
        self.sections.get(id)
    }

    /// Appends a new section.
    pub(crate) fn add_section(&mut self, data: SectionData) -> SectionId {
        self.sections.add(data)
    }

    /// Re-attaches a detached section at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is unknown or already attached.
    pub(crate) fn attach_section(&mut self, id: SectionId, index: usize) -> Result<(), ModelError> {
        self.sections.attach(id, index)
    }

    /// Detaches a section with no members, returning its position.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is not attached or still has members.
    pub(crate) fn detach_section(&mut self, id: SectionId) -> Result<usize, ModelError> {
        let members = self.sections.attached(id)?.member_count();
        if members > 0 {
            return Err(ModelError::NotEmpty {
                kind: "section",
                members,
            });
        }
        self.sections.detach(id)
    }

    /// Drops a detached section from the registry arena.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is unknown or still attached.
    pub(crate) fn discard_section(&mut self, id: SectionId) -> Result<SectionData, ModelError> {
        self.sections.discard(id)
    }

    /// Replaces a section's calibration, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is not attached or the calibration
    /// is degenerate for its orientation.
    pub(crate) fn calibrate_section(
        &mut self,
        id: SectionId,
        calibration: Option<Calibration>,
    ) -> Result<Option<Calibration>, ModelError> {
        let section = self.sections.attached_mut(id)?;
        if let Some(c) = &calibration {
            if !c.is_valid_for(section.orientation()) {
                return Err(ModelError::DegenerateCalibration);
            }
        }
        Ok(section.set_calibration(calibration))
    }

    /// Moves a section by `delta` positions, clamped to the registry bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is not attached.
    pub(crate) fn move_section(
        &mut self,
        id: SectionId,
        delta: isize,
    ) -> Result<Option<usize>, ModelError> {
        self.sections.move_by(id, delta)
    }

    // --- Volume of interest ---

    #[must_use]
    pub fn voi(&self) -> Option<&Voi> {
        self.voi.as_ref()
    }

    /// Replaces the VOI wholesale, returning the previous one.
    pub(crate) fn set_voi(&mut self, voi: Option<Voi>) -> Option<Voi> {
        std::mem::replace(&mut self.voi, voi)
    }

    /// Returns `true` if a VOI is defined and contains `p`.
    #[must_use]
    pub fn voi_contains(&self, p: &Point3) -> bool {
        self.voi.as_ref().is_some_and(|v| v.contains(p))
    }

    /// VOI enclosing every resolvable node, if any.
    #[must_use]
    pub fn node_bounds(&self) -> Option<Voi> {
        let points: Vec<Point3> = self
            .node_order
            .iter()
            .filter_map(|&n| self.node_point(n))
            .collect();
        Voi::enclosing(&points)
    }

    // --- Identity ---

    /// Assigns dense IDs `0..n` in container order to every element kind.
    ///
    /// Call before anything that depends on numeric identity.
    pub fn reset_ids(&mut self) {
        for (i, &id) in self.node_order.iter().enumerate() {
            if let Some(n) = self.nodes.get_mut(id) {
                n.set_id(i);
            }
        }
        for (i, &id) in self.facet_order.iter().enumerate() {
            if let Some(f) = self.facets.get_mut(id) {
                f.set_id(i);
            }
        }
        for (i, &id) in self.region_order.iter().enumerate() {
            if let Some(r) = self.regions.get_mut(id) {
                r.set_id(i);
            }
        }
        self.sections.reset_ids();
        self.groups.reset_ids();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{cross_section, off, Fixture};

    #[test]
    fn add_node_registers_with_group_and_section() {
        let mut store = ModelStore::new();
        let g = store.add_group(GroupData::new("g", Color::default()));
        let s = store.add_section(cross_section());
        let n = store
            .add_node(NodeData::new(
                NodePosition::OnSection {
                    section: s,
                    pixel: Point2::new(1.0, 2.0),
                },
                g,
            ))
            .unwrap();
        assert_eq!(store.group(g).unwrap().nodes(), &[n]);
        assert_eq!(store.section(s).unwrap().nodes(), &[n]);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn add_node_to_detached_group_fails() {
        let mut store = ModelStore::new();
        let g = store.add_group(GroupData::new("g", Color::default()));
        store.detach_group(g).unwrap();
        let err = store.add_node(off(g, 0.0, 0.0, 0.0)).unwrap_err();
        assert_eq!(err, ModelError::Detached("group"));
    }

    #[test]
    fn facet_back_references() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        let c = fx.node(0.0, 1.0, 0.0);
        let f = fx.facet(&[a, b, c]);
        for n in [a, b, c] {
            assert_eq!(fx.store.node(n).unwrap().facets(), &[f]);
        }
        assert_eq!(fx.store.group(fx.group).unwrap().facets(), &[f]);
    }

    #[test]
    fn facet_with_repeated_node_links_once() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        let f = fx.facet(&[a, b, a]);
        assert_eq!(fx.store.node(a).unwrap().facets(), &[f]);
        fx.store.detach_facet(f).unwrap();
        assert!(fx.store.node(a).unwrap().facets().is_empty());
    }

    #[test]
    fn detach_node_in_use_fails() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        fx.facet(&[a, b]);
        assert_eq!(fx.store.detach_node(a).unwrap_err(), ModelError::NodeInUse(1));
    }

    #[test]
    fn detach_attach_restores_order() {
        let mut fx = Fixture::new();
        let ids: Vec<NodeId> = (0..4).map(|i| fx.node(f64::from(i), 0.0, 0.0)).collect();
        let p1 = fx.store.detach_node(ids[1]).unwrap();
        let p2 = fx.store.detach_node(ids[2]).unwrap();
        assert_eq!(fx.store.node_ids(), &[ids[0], ids[3]]);
        fx.store.attach_node(ids[2], &p2).unwrap();
        fx.store.attach_node(ids[1], &p1).unwrap();
        assert_eq!(fx.store.node_ids(), &ids[..]);
        assert_eq!(fx.store.group(fx.group).unwrap().nodes(), &ids[..]);
    }

    #[test]
    fn facet_sections_follow_nodes() {
        let mut fx = Fixture::new();
        let s = fx.store.add_section(cross_section());
        let a = fx.on_section(s, 10.0, 10.0);
        let b = fx.on_section(s, 20.0, 10.0);
        let c = fx.node(5.0, 5.0, 5.0);
        let f = fx.facet(&[a, b, c]);
        assert_eq!(fx.store.facet(f).unwrap().sections(), &[s]);
        assert_eq!(fx.store.section(s).unwrap().facets(), &[f]);
        assert_eq!(fx.store.detach_section(s).unwrap_err(), ModelError::NotEmpty {
            kind: "section",
            members: 3
        });
    }

    #[test]
    fn replace_facet_nodes_and_restore() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        let c = fx.node(0.0, 1.0, 0.0);
        let d = fx.node(1.0, 1.0, 0.0);
        let f0 = fx.facet(&[a, b, c]);
        let f1 = fx.facet(&[b, c, d]);
        let (old, place) = fx.store.replace_facet_nodes(f0, vec![d, b, c], None).unwrap();
        assert_eq!(fx.store.facet_ids(), &[f0, f1]);
        assert!(fx.store.node(a).unwrap().facets().is_empty());
        assert_eq!(fx.store.node(d).unwrap().facets(), &[f1, f0]);
        fx.store.replace_facet_nodes(f0, old, Some(&place)).unwrap();
        assert_eq!(fx.store.node(a).unwrap().facets(), &[f0]);
        assert_eq!(fx.store.node(d).unwrap().facets(), &[f1]);
        assert_eq!(fx.store.node(b).unwrap().facets(), &[f0, f1]);
    }

    #[test]
    fn reassign_group_round_trip() {
        let mut fx = Fixture::new();
        let other = fx.store.add_group(GroupData::new("other", Color::default()));
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        let (old, at) = fx.store.reassign_group(a.into(), other, None).unwrap();
        assert_eq!((old, at), (fx.group, 0));
        assert_eq!(fx.store.group(fx.group).unwrap().nodes(), &[b]);
        assert_eq!(fx.store.node(a).unwrap().group(), other);
        fx.store.reassign_group(a.into(), old, Some(at)).unwrap();
        assert_eq!(fx.store.group(fx.group).unwrap().nodes(), &[a, b]);
        assert!(fx.store.group(other).unwrap().nodes().is_empty());
    }

    #[test]
    fn find_closest_node_breaks_ties_by_order() {
        let mut fx = Fixture::new();
        let q = fx.node(0.0, 0.0, 0.0);
        let first = fx.node(1.0, 0.0, 0.0);
        let _second = fx.node(-1.0, 0.0, 0.0);
        let _far = fx.node(5.0, 0.0, 0.0);
        assert_eq!(fx.store.find_closest_node(q), Some(first));
    }

    #[test]
    fn find_closest_node_alone() {
        let mut fx = Fixture::new();
        let q = fx.node(0.0, 0.0, 0.0);
        assert_eq!(fx.store.find_closest_node(q), None);
    }

    #[test]
    fn reset_ids_assign_container_order() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        let c = fx.node(2.0, 0.0, 0.0);
        fx.store.detach_node(a).unwrap();
        fx.store.reset_ids();
        assert_eq!(fx.store.node(b).unwrap().id(), 0);
        assert_eq!(fx.store.node(c).unwrap().id(), 1);
    }

    #[test]
    fn voi_queries() {
        let mut store = ModelStore::new();
        assert!(!store.voi_contains(&Point3::origin()));
        store.set_voi(Some(Voi::new((-1.0, 1.0), (-1.0, 1.0), (-1.0, 1.0))));
        assert!(store.voi_contains(&Point3::origin()));
        assert!(!store.voi_contains(&Point3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn node_bounds_skip_unresolved_nodes() {
        let mut fx = Fixture::new();
        assert!(fx.store.node_bounds().is_none());
        fx.node(1.0, -2.0, 3.0);
        fx.node(-1.0, 4.0, 0.5);
        let s = fx.store.add_section(SectionData::new(
            SectionOrientation::Depth,
            SectionContent::Blank {
                width: 10.0,
                height: 10.0,
            },
        ));
        fx.on_section(s, 500.0, 500.0);
        let bounds = fx.store.node_bounds().unwrap();
        assert_eq!(bounds.limits(), [-1.0, 1.0, -2.0, 4.0, 0.5, 3.0]);
    }

    #[test]
    fn on_section_nodes_resolve_only_when_calibrated() {
        let mut fx = Fixture::new();
        let s = fx
            .store
            .add_section(SectionData::new(
                SectionOrientation::Depth,
                SectionContent::Blank {
                    width: 10.0,
                    height: 10.0,
                },
            ));
        let n = fx.on_section(s, 5.0, 5.0);
        assert!(fx.store.node_point(n).is_none());
        fx.store
            .calibrate_section(
                s,
                Some(Calibration::new(
                    [Point2::new(0.0, 0.0), Point2::new(10.0, 10.0)],
                    [Point3::new(0.0, 0.0, 3.0), Point3::new(100.0, 100.0, 3.0)],
                )),
            )
            .unwrap();
        assert_eq!(fx.store.node_point(n), Some(Point3::new(50.0, 50.0, 3.0)));
    }
}
