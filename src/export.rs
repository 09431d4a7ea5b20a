//! TetGen `.node` / `.poly` output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::{ExportError, Result};
use crate::math::Point3;
use crate::model::ModelStore;

/// Parameters controlling PLC export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportParams {
    /// Number given to the first node, facet, hole and region.
    pub start_index: usize,
    /// Digits after the decimal point; `None` writes the shortest exact form.
    pub precision: Option<usize>,
}

impl ExportParams {
    fn number(&self, v: f64) -> String {
        match self.precision {
            Some(p) => format!("{v:.p$}"),
            None => v.to_string(),
        }
    }

    fn point(&self, p: &Point3) -> String {
        format!("{} {} {}", self.number(p.x), self.number(p.y), self.number(p.z))
    }
}

/// Resolved geometry ready to be written.
struct Resolved {
    nodes: Vec<(Point3, bool)>,
    holes: Vec<Point3>,
    /// Material point and the position of its group.
    regions: Vec<(Point3, usize)>,
}

/// Writes the model as a piecewise linear complex for TetGen.
#[derive(Debug, Default)]
pub struct ExportPlc {
    params: ExportParams,
}

impl ExportPlc {
    #[must_use]
    pub fn new(params: ExportParams) -> Self {
        Self { params }
    }

    fn resolve(store: &ModelStore) -> std::result::Result<Resolved, ExportError> {
        let mut nodes = Vec::with_capacity(store.node_count());
        for (i, (id, node)) in store.nodes().enumerate() {
            let p = store.node_point(id).ok_or(ExportError::UnresolvedNode(i))?;
            nodes.push((p, node.boundary()));
        }
        let mut holes = Vec::new();
        let mut regions = Vec::new();
        for (i, (id, region)) in store.regions().enumerate() {
            let p = store.region_point(id).ok_or(ExportError::UnresolvedRegion(i))?;
            if region.is_control() {
                holes.push(p);
            } else {
                let group = store.groups().position(region.group()).unwrap_or_default();
                regions.push((p, group));
            }
        }
        Ok(Resolved {
            nodes,
            holes,
            regions,
        })
    }

    /// Writes the node list. Resets model IDs first.
    ///
    /// # Errors
    ///
    /// Returns an error if a node cannot be resolved or the output fails.
    pub fn write_node(&self, store: &mut ModelStore, out: &mut impl Write) -> Result<()> {
        store.reset_ids();
        let resolved = Self::resolve(store)?;
        self.write_nodes(&resolved, out)
    }

    fn write_nodes(&self, resolved: &Resolved, out: &mut impl Write) -> Result<()> {
        writeln!(out, "# plcmesh node list")?;
        writeln!(out, "{} 3 0 1", resolved.nodes.len())?;
        for (i, (p, boundary)) in resolved.nodes.iter().enumerate() {
            writeln!(
                out,
                "{} {} {}",
                i + self.params.start_index,
                self.params.point(p),
                u8::from(*boundary)
            )?;
        }
        Ok(())
    }

    /// Writes the facet, hole and region lists. Node indices refer to the
    /// companion `.node` file. Resets model IDs first.
    ///
    /// # Errors
    ///
    /// Returns an error if an element cannot be resolved or the output fails.
    pub fn write_poly(&self, store: &mut ModelStore, out: &mut impl Write) -> Result<()> {
        store.reset_ids();
        let resolved = Self::resolve(store)?;
        self.write_polys(store, &resolved, out)
    }

    /// IDs must have been reset.
    fn write_polys(
        &self,
        store: &ModelStore,
        resolved: &Resolved,
        out: &mut impl Write,
    ) -> Result<()> {
        let start = self.params.start_index;
        writeln!(out, "# part 1: nodes in the .node file")?;
        writeln!(out, "0 3 0 1")?;

        writeln!(out, "# part 2: facets")?;
        writeln!(out, "{} 1", store.facet_count())?;
        for (_, facet) in store.facets() {
            writeln!(out, "1 0 {}", u8::from(facet.boundary()))?;
            let mut line = facet.len().to_string();
            for &n in facet.nodes() {
                line.push(' ');
                line.push_str(&(store.node(n)?.id() + start).to_string());
            }
            writeln!(out, "{line}")?;
        }

        writeln!(out, "# part 3: holes")?;
        writeln!(out, "{}", resolved.holes.len())?;
        for (i, p) in resolved.holes.iter().enumerate() {
            writeln!(out, "{} {}", i + start, self.params.point(p))?;
        }

        writeln!(out, "# part 4: regions")?;
        writeln!(out, "{}", resolved.regions.len())?;
        for (i, (p, group)) in resolved.regions.iter().enumerate() {
            writeln!(out, "{} {} {group} -1", i + start, self.params.point(p))?;
        }
        Ok(())
    }

    /// Writes `<base>.node` and `<base>.poly`. Resets model IDs first.
    ///
    /// Nothing is written if any node or region cannot be resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails or a file cannot be written.
    pub fn execute(&self, store: &mut ModelStore, base: impl AsRef<Path>) -> Result<()> {
        store.reset_ids();
        let resolved = Self::resolve(store)?;
        let base = base.as_ref();
        let create = |ext: &str| -> std::result::Result<BufWriter<File>, ExportError> {
            Ok(BufWriter::new(File::create(base.with_extension(ext))?))
        };

        let mut node = create("node")?;
        self.write_nodes(&resolved, &mut node)?;
        node.flush()?;

        let mut poly = create("poly")?;
        self.write_polys(store, &resolved, &mut poly)?;
        poly.flush()?;

        info!(
            base = %base.display(),
            nodes = resolved.nodes.len(),
            facets = store.facet_count(),
            holes = resolved.holes.len(),
            regions = resolved.regions.len(),
            "plc exported"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::PlcError;
    use crate::model::{SectionContent, SectionData, SectionOrientation};
    use crate::test_support::{cross_section, Fixture};

    fn write(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut out = Vec::new();
        f(&mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn tetrahedron_exports_nodes_and_facets() {
        let mut fx = Fixture::new();
        fx.tetrahedron();
        let export = ExportPlc::new(ExportParams {
            start_index: 1,
            precision: Some(2),
        });
        let node = write(|o| export.write_node(&mut fx.store, o).unwrap());
        let lines: Vec<&str> = node.lines().collect();
        assert_eq!(lines[1], "4 3 0 1");
        assert_eq!(lines[2], "1 0.00 0.00 0.00 0");
        assert_eq!(lines[5], "4 0.00 0.00 1.00 0");

        let poly = write(|o| export.write_poly(&mut fx.store, o).unwrap());
        assert!(poly.contains("\n4 1\n1 0 0\n3 1 3 2\n"));
        assert!(poly.contains("# part 3: holes\n0\n"));
    }

    #[test]
    fn stale_ids_are_renumbered_before_writing() {
        let mut fx = Fixture::new();
        let stray = fx.node(9.0, 9.0, 9.0);
        fx.tetrahedron();
        fx.store.reset_ids();
        fx.store.detach_node(stray).unwrap();
        let export = ExportPlc::new(ExportParams {
            start_index: 1,
            precision: None,
        });
        let poly = write(|o| export.write_poly(&mut fx.store, o).unwrap());
        assert!(poly.contains("\n4 1\n1 0 0\n3 1 3 2\n"));
    }

    #[test]
    fn regions_and_control_points_are_split() {
        let mut fx = Fixture::new();
        let s = fx.store.add_section(cross_section());
        fx.region(s, 10.0, 20.0, false);
        fx.region(s, 30.0, 40.0, true);
        let poly = write(|o| ExportPlc::default().write_poly(&mut fx.store, o).unwrap());
        assert!(poly.contains("# part 3: holes\n1\n0 30 0 -40\n"));
        assert!(poly.contains("# part 4: regions\n1\n0 10 0 -20 0 -1\n"));
    }

    #[test]
    fn uncalibrated_node_fails() {
        let mut fx = Fixture::new();
        let s = fx.store.add_section(SectionData::new(
            SectionOrientation::Cross,
            SectionContent::Blank {
                width: 1.0,
                height: 1.0,
            },
        ));
        fx.node(0.0, 0.0, 0.0);
        fx.on_section(s, 1.0, 1.0);
        let err = ExportPlc::default()
            .write_node(&mut fx.store, &mut Vec::<u8>::new())
            .unwrap_err();
        assert!(matches!(err, PlcError::Export(ExportError::UnresolvedNode(1))));
    }

    #[test]
    fn files_are_written_side_by_side() {
        let mut fx = Fixture::new();
        fx.tetrahedron();
        let dir = std::env::temp_dir().join(format!("plcmesh-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("model");
        ExportPlc::default().execute(&mut fx.store, &base).unwrap();
        let node = std::fs::read_to_string(base.with_extension("node")).unwrap();
        let poly = std::fs::read_to_string(base.with_extension("poly")).unwrap();
        assert!(node.contains("\n4 3 0 1\n"));
        assert!(poly.contains("\n4 1\n"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
