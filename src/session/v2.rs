//! Second layout: unit-range colors, boundary markers and fixed option
//! lines, but no facet sections and no node facet block.
//!
//! ```text
//! 2
//! <nodes>      x y z b | px py null b
//! <regions>    px py control
//! <sections>   cross|depth image + path line | cross|depth blank w h, then calibration
//! <groups>     r g b (0..1), then name line
//! <node links> section|null group
//! <facets>     b group k n1..nk
//! <region links>
//! voi
//! show_nodes show_facets show_regions node_size edge_width
//! picking_distance auto_facet_factor ndim
//! start_index
//! ```

use crate::error::SessionError;
use crate::math::{Point2, Point3};
use crate::model::{Color, SectionContent, SectionOrientation};
use crate::options::{
    read_ndim, FileIoOptions, InteractionOptions, SessionOptions, ViewingOptions,
};

use super::raw::{
    read_calibration, read_indices, read_link, read_voi, RawFacet, RawGroup, RawModel, RawNode,
    RawPosition, RawRegion, RawSection,
};
use super::reader::LineReader;
use super::Session;

pub(super) fn decode(reader: &mut LineReader<'_>) -> Result<Session, SessionError> {
    let mut raw = RawModel::default();

    let node_count = reader.count("node count")?;
    for _ in 0..node_count {
        let mut t = reader.tokens("node")?;
        let x = t.f64("x")?;
        let y = t.f64("y")?;
        let position = if t.take_null() {
            RawPosition::Pixel(Point2::new(x, y))
        } else {
            RawPosition::Point(Point3::new(x, y, t.f64("z")?))
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
        let pixel = Point2::new(t.f64("pixel x")?, t.f64("pixel y")?);
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
        let content = match t.word("content kind")? {
            "image" => {
                t.finish()?;
                SectionContent::Image {
                    path: reader.text("path")?.into(),
                }
            }
            "blank" => {
                let width = t.f64("width")?;
                let height = t.f64("height")?;
                t.finish()?;
                SectionContent::Blank { width, height }
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
        let mut t = reader.tokens("group color")?;
        let color = Color::from_unit(t.f64("red")?, t.f64("green")?, t.f64("blue")?);
        t.finish()?;
        let name = reader.text("name")?.to_string();
        raw.groups.push(RawGroup { name, color });
    }

    for _ in 0..node_count {
        raw.node_links.push(read_link(reader, "node link")?);
    }

    let facet_count = reader.count("facet count")?;
    for _ in 0..facet_count {
        let mut t = reader.tokens("facet")?;
        let boundary = t.flag("boundary")?;
        let group = t.usize("group")?;
        let nodes = read_indices(&mut t, "node")?;
        let line = t.line();
        t.finish()?;
        raw.facets.push(RawFacet {
            line,
            nodes,
            group,
            boundary,
            sections: None,
        });
    }

    for _ in 0..region_count {
        raw.region_links.push(read_link(reader, "region link")?);
    }

    let mut t = reader.tokens("volume of interest")?;
    raw.voi = read_voi(&mut t)?;
    t.finish()?;

    let mut t = reader.tokens("viewing options")?;
    let viewing = ViewingOptions {
        show_nodes: t.flag("show nodes")?,
        show_facets: t.flag("show facets")?,
        show_regions: t.flag("show regions")?,
        node_size: t.f64("node size")?,
        edge_width: t.f64("edge width")?,
        ..ViewingOptions::default()
    };
    t.finish()?;

    let mut t = reader.tokens("interaction options")?;
    let interaction = InteractionOptions {
        picking_distance: t.f64("picking distance")?,
        auto_facet_factor: t.f64("auto facet factor")?,
        ndim: read_ndim(&mut t)?,
        ..InteractionOptions::default()
    };
    t.finish()?;

    let mut t = reader.tokens("file i/o options")?;
    let file_io = FileIoOptions {
        start_index: t.usize("start index")?,
        ..FileIoOptions::default()
    };
    t.finish()?;

    Ok(Session {
        model: raw.build()?,
        options: SessionOptions {
            viewing,
            interaction,
            file_io,
        },
    })
}
