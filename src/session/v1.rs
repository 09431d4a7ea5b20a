//! First layout: image cross sections only, no boundary markers, a single
//! option line.
//!
//! ```text
//! 1
//! <nodes>      x y z | px py null
//! <regions>    px py control
//! <sections>   path line, then calibration
//! <groups>     r g b (0..1), then name line
//! <node links> section|null group
//! <facets>     group k n1..nk
//! <region links>
//! voi
//! picking_distance auto_facet_factor
//! ```

use crate::error::SessionError;
use crate::math::{Point2, Point3};
use crate::model::{Color, SectionContent, SectionOrientation};
use crate::options::{InteractionOptions, SessionOptions};

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
        let line = t.line();
        t.finish()?;
        raw.nodes.push(RawNode {
            line,
            position,
            boundary: false,
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
        let path = reader.text("path")?.into();
        let line = reader.line();
        let mut t = reader.tokens("calibration")?;
        let calibration = read_calibration(&mut t)?;
        t.finish()?;
        raw.sections.push(RawSection {
            line,
            orientation: SectionOrientation::Cross,
            content: SectionContent::Image { path },
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
        let group = t.usize("group")?;
        let nodes = read_indices(&mut t, "node")?;
        let line = t.line();
        t.finish()?;
        raw.facets.push(RawFacet {
            line,
            nodes,
            group,
            boundary: false,
            sections: None,
        });
    }

    for _ in 0..region_count {
        raw.region_links.push(read_link(reader, "region link")?);
    }

    let mut t = reader.tokens("volume of interest")?;
    raw.voi = read_voi(&mut t)?;
    t.finish()?;

    let mut t = reader.tokens("options")?;
    let interaction = InteractionOptions {
        picking_distance: t.f64("picking distance")?,
        auto_facet_factor: t.f64("auto facet factor")?,
        ..InteractionOptions::default()
    };
    t.finish()?;

    Ok(Session {
        model: raw.build()?,
        options: SessionOptions {
            interaction,
            ..SessionOptions::default()
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    const SAMPLE: &str = "\
1
2
10 20 null
1 2 3
0
1
path core.png
0 0 100 100 0 0 0 100 0 -100
1
0 0 1
name blue
0 0
null 0
1
0 2 0 1
-1 1 -2 2 -3 3
2 1.25
";

    #[test]
    fn oldest_layout_decodes() {
        let mut reader = LineReader::new(SAMPLE);
        assert_eq!(reader.count("version").unwrap(), 1);
        let session = decode(&mut reader).unwrap();
        let model = &session.model;
        let (first, _) = model.nodes().next().unwrap();
        assert_eq!(model.node_point(first), Some(Point3::new(10.0, 0.0, -20.0)));
        assert_eq!(model.facet_count(), 1);
        assert!(model.voi().unwrap().contains(&Point3::new(0.0, 0.0, 0.0)));
        assert_eq!(session.options.interaction.picking_distance, 2.0);
        assert_eq!(session.options.interaction.ndim, 3);
    }

    #[test]
    fn truncated_input_is_unexpected_end() {
        let cut = &SAMPLE[..SAMPLE.find("name blue").unwrap()];
        let mut reader = LineReader::new(cut);
        reader.count("version").unwrap();
        assert!(matches!(
            decode(&mut reader),
            Err(SessionError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn pixel_node_without_section_is_inconsistent() {
        let text = SAMPLE.replacen("0 0\nnull 0", "null 0\nnull 0", 1);
        let mut reader = LineReader::new(&text);
        reader.count("version").unwrap();
        assert!(matches!(
            decode(&mut reader),
            Err(SessionError::InconsistentLink { .. })
        ));
    }
}
