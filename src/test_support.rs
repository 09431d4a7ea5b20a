//! Shared fixtures for unit tests.

#![allow(clippy::unwrap_used)]

use crate::math::{Point2, Point3};
use crate::model::{
    Calibration, Color, FacetData, FacetId, GroupData, GroupId, ModelStore, NodeData, NodeId,
    NodePosition, RegionData, RegionId, SectionContent, SectionData, SectionId,
    SectionOrientation,
};

/// Routes `tracing` output to the test harness; honours `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Off-section node data at `(x, y, z)`.
pub(crate) fn off(group: GroupId, x: f64, y: f64, z: f64) -> NodeData {
    NodeData::new(
        NodePosition::OffSection {
            point: Point3::new(x, y, z),
        },
        group,
    )
}

/// A cross section whose pixel `(x, y)` maps to model `(x, 0, -y)`.
pub(crate) fn cross_section() -> SectionData {
    SectionData::new(
        SectionOrientation::Cross,
        SectionContent::Blank {
            width: 100.0,
            height: 100.0,
        },
    )
    .with_calibration(Calibration::new(
        [Point2::new(0.0, 0.0), Point2::new(100.0, 100.0)],
        [Point3::new(0.0, 0.0, 0.0), Point3::new(100.0, 0.0, -100.0)],
    ))
    .unwrap()
}

/// A store with one group, plus helpers to populate it.
pub(crate) struct Fixture {
    pub store: ModelStore,
    pub group: GroupId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut store = ModelStore::new();
        let group = store.add_group(GroupData::new("default", Color::new(200, 50, 50)));
        Self { store, group }
    }

    pub fn node(&mut self, x: f64, y: f64, z: f64) -> NodeId {
        self.store.add_node(off(self.group, x, y, z)).unwrap()
    }

    pub fn on_section(&mut self, section: SectionId, x: f64, y: f64) -> NodeId {
        self.store
            .add_node(NodeData::new(
                NodePosition::OnSection {
                    section,
                    pixel: Point2::new(x, y),
                },
                self.group,
            ))
            .unwrap()
    }

    pub fn facet(&mut self, nodes: &[NodeId]) -> FacetId {
        self.store
            .add_facet(FacetData::new(nodes.to_vec(), self.group))
            .unwrap()
    }

    pub fn region(&mut self, section: SectionId, x: f64, y: f64, control: bool) -> RegionId {
        self.store
            .add_region(RegionData::new(Point2::new(x, y), control, section, self.group))
            .unwrap()
    }

    /// Closed tetrahedron surface: four nodes, four triangles.
    pub fn tetrahedron(&mut self) -> ([NodeId; 4], [FacetId; 4]) {
        let a = self.node(0.0, 0.0, 0.0);
        let b = self.node(1.0, 0.0, 0.0);
        let c = self.node(0.0, 1.0, 0.0);
        let d = self.node(0.0, 0.0, 1.0);
        let f = [
            self.facet(&[a, c, b]),
            self.facet(&[a, b, d]),
            self.facet(&[b, c, d]),
            self.facet(&[c, a, d]),
        ];
        ([a, b, c, d], f)
    }
}

type NodeRow = (Option<usize>, [f64; 3], bool, usize, Vec<usize>);
type FacetRow = (Vec<usize>, bool, usize, Vec<usize>);
type RegionRow = ([f64; 2], bool, usize, usize);
type GroupRow = (String, Color, Vec<usize>, Vec<usize>, Vec<usize>);
type SectionRow = (Option<Calibration>, Vec<usize>, Vec<usize>, Vec<usize>);

/// Key-independent picture of the whole store: every cross-reference is
/// expressed as a position in the relevant container order.
#[derive(Debug, PartialEq)]
pub(crate) struct Snapshot {
    nodes: Vec<NodeRow>,
    facets: Vec<FacetRow>,
    regions: Vec<RegionRow>,
    groups: Vec<GroupRow>,
    sections: Vec<SectionRow>,
}

fn positions<K: PartialEq + Copy>(order: &[K], keys: &[K]) -> Vec<usize> {
    keys.iter()
        .map(|k| order.iter().position(|o| o == k).unwrap())
        .collect()
}

pub(crate) fn snapshot(store: &ModelStore) -> Snapshot {
    let nodes = store.node_ids();
    let facets = store.facet_ids();
    let regions = store.region_ids();
    let groups = store.groups().ids();
    let sections = store.sections().ids();
    Snapshot {
        nodes: store
            .nodes()
            .map(|(_, n)| {
                let (section, coords) = match n.position() {
                    NodePosition::OnSection { section, pixel } => {
                        (positions(sections, &[*section]).first().copied(), [pixel.x, pixel.y, 0.0])
                    }
                    NodePosition::OffSection { point } => (None, [point.x, point.y, point.z]),
                };
                (
                    section,
                    coords,
                    n.boundary(),
                    positions(groups, &[n.group()])[0],
                    positions(facets, n.facets()),
                )
            })
            .collect(),
        facets: store
            .facets()
            .map(|(_, f)| {
                (
                    positions(nodes, f.nodes()),
                    f.boundary(),
                    positions(groups, &[f.group()])[0],
                    positions(sections, f.sections()),
                )
            })
            .collect(),
        regions: store
            .regions()
            .map(|(_, r)| {
                (
                    [r.pixel().x, r.pixel().y],
                    r.is_control(),
                    positions(groups, &[r.group()])[0],
                    positions(sections, &[r.section()])[0],
                )
            })
            .collect(),
        groups: store
            .groups()
            .iter()
            .map(|(_, g)| {
                (
                    g.name().to_string(),
                    g.color(),
                    positions(nodes, g.nodes()),
                    positions(facets, g.facets()),
                    positions(regions, g.regions()),
                )
            })
            .collect(),
        sections: store
            .sections()
            .iter()
            .map(|(_, s)| {
                (
                    s.calibration().copied(),
                    positions(nodes, s.nodes()),
                    positions(facets, s.facets()),
                    positions(regions, s.regions()),
                )
            })
            .collect(),
    }
}
