//! Current layout. Option blocks are written by their owners.

use std::io::Write;

use crate::error::{Result, SessionError};
use crate::model::{
    Color, GroupId, ModelStore, NodePosition, SectionContent, SectionId, SectionOrientation,
};
use crate::options::{
    FileIoOptions, InteractionOptions, OptionBlock, SessionOptions, ViewingOptions,
};

use super::raw::{
    quote, read_calibration, read_indices, read_link, read_pixel, read_point, read_voi,
    write_calibration, write_voi, RawFacet, RawGroup, RawModel, RawNode, RawNodeFacets,
    RawPosition, RawRegion, RawSection,
};
use super::reader::LineReader;
use super::Session;

pub(super) const VERSION: i64 = 3;

fn flag(b: bool) -> u8 {
    u8::from(b)
}

fn join(indices: impl ExactSizeIterator<Item = usize>) -> String {
    let mut out = indices.len().to_string();
    for i in indices {
        out.push(' ');
        out.push_str(&i.to_string());
    }
    out
}

fn write_option_block<B: OptionBlock>(block: &B, out: &mut impl Write) -> Result<()> {
    writeln!(out, "# {}", B::TITLE)?;
    block.write_block(out)?;
    Ok(())
}

/// Writes the model and options. IDs must have been reset.
pub(super) fn encode(
    model: &ModelStore,
    options: &SessionOptions,
    out: &mut impl Write,
) -> Result<()> {
    let group = |g: GroupId| -> Result<usize> { Ok(model.group(g)?.id()) };
    let section = |s: SectionId| -> Result<usize> { Ok(model.section(s)?.id()) };

    writeln!(out, "{VERSION}")?;
    writeln!(out, "# plcmesh session")?;

    writeln!(out, "# nodes")?;
    writeln!(out, "{}", model.node_count())?;
    for (_, node) in model.nodes() {
        let b = flag(node.boundary());
        match node.position() {
            NodePosition::OnSection { pixel, .. } => {
                writeln!(out, "pixel {} {} {b}", pixel.x, pixel.y)?;
            }
            NodePosition::OffSection { point } => {
                writeln!(out, "point {} {} {} {b}", point.x, point.y, point.z)?;
            }
        }
    }

    writeln!(out, "# regions")?;
    writeln!(out, "{}", model.region_count())?;
    for (_, region) in model.regions() {
        let p = region.pixel();
        writeln!(out, "{} {} {}", p.x, p.y, flag(region.is_control()))?;
    }

    writeln!(out, "# sections")?;
    writeln!(out, "{}", model.sections().len())?;
    for (_, data) in model.sections().iter() {
        let orientation = match data.orientation() {
            SectionOrientation::Cross => "cross",
            SectionOrientation::Depth => "depth",
        };
        match data.content() {
            SectionContent::Image { path } => {
                writeln!(out, "{orientation} image")?;
                writeln!(out, "path {}", quote(&path.to_string_lossy()))?;
            }
            SectionContent::Blank { width, height } => {
                writeln!(out, "{orientation} blank {width} {height}")?;
            }
            SectionContent::Snapshot { path } => {
                writeln!(out, "{orientation} snapshot")?;
                writeln!(out, "path {}", quote(&path.to_string_lossy()))?;
            }
        }
        writeln!(out, "{}", write_calibration(data.calibration()))?;
    }

    writeln!(out, "# groups")?;
    writeln!(out, "{}", model.groups().len())?;
    for (_, data) in model.groups().iter() {
        let Color { r, g, b } = data.color();
        writeln!(out, "name {}", quote(data.name()))?;
        writeln!(out, "{r} {g} {b}")?;
    }

    writeln!(out, "# node links")?;
    for (_, node) in model.nodes() {
        match node.section() {
            Some(s) => writeln!(out, "{} {}", section(s)?, group(node.group())?)?,
            None => writeln!(out, "null {}", group(node.group())?)?,
        }
    }

    writeln!(out, "# facet links")?;
    writeln!(out, "{}", model.facet_count())?;
    for (_, facet) in model.facets() {
        let nodes = facet
            .nodes()
            .iter()
            .map(|&n| model.node(n).map(|d| d.id()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let sections = facet
            .sections()
            .iter()
            .map(|&s| section(s))
            .collect::<Result<Vec<_>>>()?;
        writeln!(
            out,
            "{} {} {} {}",
            flag(facet.boundary()),
            group(facet.group())?,
            join(nodes.into_iter()),
            join(sections.into_iter())
        )?;
    }

    writeln!(out, "# region links")?;
    for (_, region) in model.regions() {
        writeln!(out, "{} {}", section(region.section())?, group(region.group())?)?;
    }

    writeln!(out, "# node facets")?;
    for (_, node) in model.nodes() {
        let facets = node
            .facets()
            .iter()
            .map(|&f| model.facet(f).map(|d| d.id()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        writeln!(out, "{}", join(facets.into_iter()))?;
    }

    writeln!(out, "# volume of interest")?;
    writeln!(out, "{}", write_voi(model.voi()))?;

    write_option_block(&options.viewing, out)?;
    write_option_block(&options.interaction, out)?;
    write_option_block(&options.file_io, out)?;
    Ok(())
}

pub(super) fn decode(reader: &mut LineReader<'_>) -> std::result::Result<Session, SessionError> {
    let mut raw = RawModel::default();

    let node_count = reader.count("node count")?;
    for _ in 0..node_count {
        let mut t = reader.tokens("node")?;
        let position = match t.word("node kind")? {
            "pixel" => RawPosition::Pixel(read_pixel(&mut t)?),
            "point" => RawPosition::Point(read_point(&mut t)?),
            other => return Err(t.malformed(format!("unknown node kind '{other}'"))),
        };
        let boundary = t.flag("boundary")?;
        let line = t.line();
        t.finish()?;
        raw.nodes.push(RawNode {
            line,
            position,
            boundary,
        });
    }

    let region_count = reader.count("region count")?;
    for _ in 0..region_count {
        let mut t = reader.tokens("region")?;
        let pixel = read_pixel(&mut t)?;
        let control = t.flag("control flag")?;
        let line = t.line();
        t.finish()?;
        raw.regions.push(RawRegion {
            line,
            pixel,
            control,
        });
    }

    let section_count = reader.count("section count")?;
    for _ in 0..section_count {
        let mut t = reader.tokens("section")?;
        let line = t.line();
        let orientation = match t.word("orientation")? {
            "cross" => SectionOrientation::Cross,
            "depth" => SectionOrientation::Depth,
            other => return Err(t.malformed(format!("unknown orientation '{other}'"))),
        };
        let kind = t.word("content kind")?;
        let content = match kind {
            "blank" => {
                let width = t.f64("width")?;
                let height = t.f64("height")?;
                t.finish()?;
                SectionContent::Blank { width, height }
            }
            "image" | "snapshot" => {
                t.finish()?;
                let path = reader.quoted("path")?.into();
                if kind == "image" {
                    SectionContent::Image { path }
                } else {
                    SectionContent::Snapshot { path }
                }
            }
            other => return Err(t.malformed(format!("unknown section content '{other}'"))),
        };
        let mut t = reader.tokens("calibration")?;
        let calibration = read_calibration(&mut t)?;
        t.finish()?;
        raw.sections.push(RawSection {
            line,
            orientation,
            content,
            calibration,
        });
    }

    let group_count = reader.count("group count")?;
    for _ in 0..group_count {
        let name = reader.quoted("name")?;
        let mut t = reader.tokens("group color")?;
        let color = Color::new(t.u8("red")?, t.u8("green")?, t.u8("blue")?);
        t.finish()?;
        raw.groups.push(RawGroup { name, color });
    }

    for _ in 0..node_count {
        raw.node_links.push(read_link(reader, "node link")?);
    }

    let facet_count = reader.count("facet count")?;
    for _ in 0..facet_count {
        let mut t = reader.tokens("facet link")?;
        let boundary = t.flag("boundary")?;
        let group = t.usize("group")?;
        let nodes = read_indices(&mut t, "node")?;
        let sections = read_indices(&mut t, "section")?;
        let line = t.line();
        t.finish()?;
        raw.facets.push(RawFacet {
            line,
            nodes,
            group,
            boundary,
            sections: Some(sections),
        });
    }

    for _ in 0..region_count {
        raw.region_links.push(read_link(reader, "region link")?);
    }

    let mut node_facets = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let mut t = reader.tokens("node facets")?;
        let facets = read_indices(&mut t, "facet")?;
        let line = t.line();
        t.finish()?;
        node_facets.push(RawNodeFacets { line, facets });
    }
    raw.node_facets = Some(node_facets);

    let mut t = reader.tokens("volume of interest")?;
    raw.voi = read_voi(&mut t)?;
    t.finish()?;

    let options = SessionOptions {
        viewing: ViewingOptions::read_block(reader)?,
        interaction: InteractionOptions::read_block(reader)?,
        file_io: FileIoOptions::read_block(reader)?,
    };

    Ok(Session {
        model: raw.build()?,
        options,
    })
}
