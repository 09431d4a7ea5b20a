//! Version-independent parse result and the model rebuild step.

use tracing::debug;

use crate::error::{ModelError, SessionError};
use crate::math::{Point2, Point3};
use crate::model::{
    Calibration, Color, FacetData, FacetId, GroupData, GroupId, ModelStore, NodeData, NodeId,
    NodePosition, RegionData, SectionContent, SectionData, SectionId, SectionOrientation, Voi,
};

use super::reader::{LineReader, Tokens};

/// Where a node definition places the node.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RawPosition {
    Pixel(Point2),
    Point(Point3),
}

#[derive(Debug)]
pub(crate) struct RawNode {
    pub line: usize,
    pub position: RawPosition,
    pub boundary: bool,
}

/// Section and group of a node, by position in their blocks.
#[derive(Debug)]
pub(crate) struct RawLink {
    pub line: usize,
    pub section: Option<usize>,
    pub group: usize,
}

#[derive(Debug)]
pub(crate) struct RawRegion {
    pub line: usize,
    pub pixel: Point2,
    pub control: bool,
}

#[derive(Debug)]
pub(crate) struct RawSection {
    pub line: usize,
    pub orientation: SectionOrientation,
    pub content: SectionContent,
    pub calibration: Option<Calibration>,
}

#[derive(Debug)]
pub(crate) struct RawGroup {
    pub name: String,
    pub color: Color,
}

#[derive(Debug)]
pub(crate) struct RawFacet {
    pub line: usize,
    pub nodes: Vec<usize>,
    pub group: usize,
    pub boundary: bool,
    /// Sections the facet was saved as touching, when the layout records them.
    pub sections: Option<Vec<usize>>,
}

/// Facet back-references of one node, when the layout records them.
#[derive(Debug)]
pub(crate) struct RawNodeFacets {
    pub line: usize,
    pub facets: Vec<usize>,
}

/// Everything a session decoder reads before the model is rebuilt.
#[derive(Debug, Default)]
pub(crate) struct RawModel {
    pub nodes: Vec<RawNode>,
    pub regions: Vec<RawRegion>,
    pub sections: Vec<RawSection>,
    pub groups: Vec<RawGroup>,
    pub node_links: Vec<RawLink>,
    pub facets: Vec<RawFacet>,
    pub region_links: Vec<RawLink>,
    pub node_facets: Option<Vec<RawNodeFacets>>,
    pub voi: Option<Voi>,
}

fn lookup<K: Copy>(
    keys: &[K],
    index: usize,
    what: &'static str,
    line: usize,
) -> Result<K, SessionError> {
    keys.get(index)
        .copied()
        .ok_or(SessionError::IndexOutOfRange {
            line,
            what,
            index,
            count: keys.len(),
        })
}

fn rejected(line: usize) -> impl Fn(ModelError) -> SessionError {
    move |source| SessionError::Rejected { line, source }
}

fn inconsistent(line: usize, message: impl Into<String>) -> SessionError {
    SessionError::InconsistentLink {
        line,
        message: message.into(),
    }
}

impl RawModel {
    /// Rebuilds the model, checking every cross-reference.
    pub(crate) fn build(self) -> Result<ModelStore, SessionError> {
        let mut store = ModelStore::new();

        let mut sections: Vec<SectionId> = Vec::with_capacity(self.sections.len());
        for raw in self.sections {
            let mut data = SectionData::new(raw.orientation, raw.content);
            if let Some(c) = raw.calibration {
                data = data.with_calibration(c).map_err(rejected(raw.line))?;
            }
            sections.push(store.add_section(data));
        }

        let groups: Vec<GroupId> = self
            .groups
            .into_iter()
            .map(|g| store.add_group(GroupData::new(g.name, g.color)))
            .collect();

        let mut nodes: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        for (raw, link) in self.nodes.into_iter().zip(self.node_links) {
            let group = lookup(&groups, link.group, "group", link.line)?;
            let section = link
                .section
                .map(|s| lookup(&sections, s, "section", link.line))
                .transpose()?;
            let position = match (raw.position, section) {
                (RawPosition::Pixel(pixel), Some(section)) => {
                    NodePosition::OnSection { section, pixel }
                }
                (RawPosition::Point(point), None) => NodePosition::OffSection { point },
                (RawPosition::Pixel(_), None) => {
                    return Err(inconsistent(link.line, "pixel node has no section"));
                }
                (RawPosition::Point(_), Some(_)) => {
                    return Err(inconsistent(link.line, "spatial node names a section"));
                }
            };
            let data = NodeData::new(position, group).with_boundary(raw.boundary);
            nodes.push(store.add_node(data).map_err(rejected(raw.line))?);
        }

        for (raw, link) in self.regions.into_iter().zip(self.region_links) {
            let group = lookup(&groups, link.group, "group", link.line)?;
            let Some(section) = link.section else {
                return Err(inconsistent(link.line, "region has no section"));
            };
            let section = lookup(&sections, section, "section", link.line)?;
            store
                .add_region(RegionData::new(raw.pixel, raw.control, section, group))
                .map_err(rejected(raw.line))?;
        }

        let mut facets: Vec<FacetId> = Vec::with_capacity(self.facets.len());
        for raw in self.facets {
            let group = lookup(&groups, raw.group, "group", raw.line)?;
            let members = raw
                .nodes
                .iter()
                .map(|&n| lookup(&nodes, n, "node", raw.line))
                .collect::<Result<Vec<_>, _>>()?;
            let data = FacetData::new(members, group).with_boundary(raw.boundary);
            let id = store.add_facet(data).map_err(rejected(raw.line))?;
            if let Some(saved) = raw.sections {
                let saved = saved
                    .iter()
                    .map(|&s| lookup(&sections, s, "section", raw.line))
                    .collect::<Result<Vec<_>, _>>()?;
                if store.facet(id).map_err(rejected(raw.line))?.sections() != saved.as_slice() {
                    return Err(inconsistent(
                        raw.line,
                        "facet sections do not match its nodes",
                    ));
                }
            }
            facets.push(id);
        }

        if let Some(node_facets) = self.node_facets {
            for (raw, &node) in node_facets.into_iter().zip(&nodes) {
                let order = raw
                    .facets
                    .iter()
                    .map(|&f| lookup(&facets, f, "facet", raw.line))
                    .collect::<Result<Vec<_>, _>>()?;
                store.reorder_node_facets(node, order).map_err(|_| {
                    inconsistent(raw.line, "node facets do not match the facet block")
                })?;
            }
        }

        store.set_voi(self.voi);
        debug!(
            nodes = nodes.len(),
            facets = facets.len(),
            regions = store.region_count(),
            groups = groups.len(),
            sections = sections.len(),
            "model rebuilt"
        );
        Ok(store)
    }
}

/// `cx1 cy1 cx2 cy2 tx1 ty1 tz1 tx2 ty2 tz2`, or `null`.
pub(crate) fn read_calibration(t: &mut Tokens<'_>) -> Result<Option<Calibration>, SessionError> {
    if t.take_null() {
        return Ok(None);
    }
    let clicked = [read_pixel(t)?, read_pixel(t)?];
    let typed = [read_point(t)?, read_point(t)?];
    Ok(Some(Calibration::new(clicked, typed)))
}

pub(crate) fn write_calibration(calibration: Option<&Calibration>) -> String {
    match calibration {
        None => "null".to_string(),
        Some(c) => {
            let [c1, c2] = c.clicked;
            let [t1, t2] = c.typed;
            format!(
                "{} {} {} {} {} {} {} {} {} {}",
                c1.x, c1.y, c2.x, c2.y, t1.x, t1.y, t1.z, t2.x, t2.y, t2.z
            )
        }
    }
}

pub(crate) fn read_pixel(t: &mut Tokens<'_>) -> Result<Point2, SessionError> {
    Ok(Point2::new(t.f64("pixel x")?, t.f64("pixel y")?))
}

pub(crate) fn read_point(t: &mut Tokens<'_>) -> Result<Point3, SessionError> {
    Ok(Point3::new(t.f64("x")?, t.f64("y")?, t.f64("z")?))
}

/// `x1 x2 y1 y2 z1 z2`, or `null`.
pub(crate) fn read_voi(t: &mut Tokens<'_>) -> Result<Option<Voi>, SessionError> {
    if t.take_null() {
        return Ok(None);
    }
    let mut limits = [0.0; 6];
    for v in &mut limits {
        *v = t.f64("volume limit")?;
    }
    let [x1, x2, y1, y2, z1, z2] = limits;
    Ok(Some(Voi::new((x1, x2), (y1, y2), (z1, z2))))
}

pub(crate) fn write_voi(voi: Option<&Voi>) -> String {
    match voi {
        None => "null".to_string(),
        Some(v) => v
            .limits()
            .iter()
            .map(f64::to_string)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Double-quotes `text`, escaping quotes, backslashes and line breaks so
/// the result fits on one line and survives trimming.
pub(crate) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// `section|null group` line linking an element to its section and group.
pub(crate) fn read_link(reader: &mut LineReader<'_>, what: &str) -> Result<RawLink, SessionError> {
    let mut t = reader.tokens(what)?;
    let section = t.opt_usize("section")?;
    let group = t.usize("group")?;
    let line = t.line();
    t.finish()?;
    Ok(RawLink {
        line,
        section,
        group,
    })
}

/// Reads `count` indices following a leading count token.
pub(crate) fn read_indices(t: &mut Tokens<'_>, what: &str) -> Result<Vec<usize>, SessionError> {
    let n = t.usize(what)?;
    (0..n).map(|_| t.usize(what)).collect()
}
