//! Option blocks owned by the subsystems that consume them.
//!
//! Each block writes and reads its own `key value` lines inside a session
//! file, so a subsystem can grow new options without touching the codec.

use std::io::{self, Write};

use crate::check::CheckParams;
use crate::error::SessionError;
use crate::export::ExportParams;
use crate::model::Color;
use crate::session::{LineReader, Tokens};
use crate::synthesis::SynthesisParams;

/// A self-serializing block of session options.
pub(crate) trait OptionBlock: Sized {
    /// Comment marker written before the block.
    const TITLE: &'static str;

    /// Appends the block's lines.
    fn write_block(&self, out: &mut impl Write) -> io::Result<()>;

    /// Reads the lines written by [`OptionBlock::write_block`].
    fn read_block(reader: &mut LineReader<'_>) -> Result<Self, SessionError>;
}

/// Display toggles and sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewingOptions {
    pub show_nodes: bool,
    pub show_facets: bool,
    pub show_regions: bool,
    pub node_size: f64,
    pub edge_width: f64,
    pub background: Color,
}

impl Default for ViewingOptions {
    fn default() -> Self {
        Self {
            show_nodes: true,
            show_facets: true,
            show_regions: true,
            node_size: 4.0,
            edge_width: 1.0,
            background: Color::new(255, 255, 255),
        }
    }
}

fn flag(b: bool) -> u8 {
    u8::from(b)
}

/// Reads one `key value...` line and rejects trailing fields.
fn entry<'a, T>(
    reader: &mut LineReader<'a>,
    key: &str,
    read: impl FnOnce(&mut Tokens<'a>) -> Result<T, SessionError>,
) -> Result<T, SessionError> {
    let mut tokens = reader.keyed(key)?;
    let value = read(&mut tokens)?;
    tokens.finish()?;
    Ok(value)
}

/// Checking dimension; only 2 and 3 are meaningful.
pub(crate) fn read_ndim(t: &mut Tokens<'_>) -> Result<usize, SessionError> {
    let ndim = t.usize("dimension")?;
    if (2..=3).contains(&ndim) {
        Ok(ndim)
    } else {
        Err(t.malformed(format!("dimension must be 2 or 3, got {ndim}")))
    }
}

impl OptionBlock for ViewingOptions {
    const TITLE: &'static str = "viewing options";

    fn write_block(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "show_nodes {}", flag(self.show_nodes))?;
        writeln!(out, "show_facets {}", flag(self.show_facets))?;
        writeln!(out, "show_regions {}", flag(self.show_regions))?;
        writeln!(out, "node_size {}", self.node_size)?;
        writeln!(out, "edge_width {}", self.edge_width)?;
        let Color { r, g, b } = self.background;
        writeln!(out, "background {r} {g} {b}")
    }

    fn read_block(reader: &mut LineReader<'_>) -> Result<Self, SessionError> {
        Ok(Self {
            show_nodes: entry(reader, "show_nodes", |t| t.flag("flag"))?,
            show_facets: entry(reader, "show_facets", |t| t.flag("flag"))?,
            show_regions: entry(reader, "show_regions", |t| t.flag("flag"))?,
            node_size: entry(reader, "node_size", |t| t.f64("node size"))?,
            edge_width: entry(reader, "edge_width", |t| t.f64("edge width"))?,
            background: entry(reader, "background", |t| {
                Ok(Color::new(t.u8("red")?, t.u8("green")?, t.u8("blue")?))
            })?,
        })
    }
}

/// Picking and checking preferences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionOptions {
    pub picking_distance: f64,
    pub auto_facet_factor: f64,
    pub ndim: usize,
    pub planarity_tolerance: f64,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        let synthesis = SynthesisParams::default();
        let check = CheckParams::default();
        Self {
            picking_distance: synthesis.picking_distance,
            auto_facet_factor: synthesis.auto_facet_factor,
            ndim: check.ndim,
            planarity_tolerance: check.planarity_tolerance,
        }
    }
}

impl InteractionOptions {
    #[must_use]
    pub fn synthesis_params(&self) -> SynthesisParams {
        SynthesisParams {
            picking_distance: self.picking_distance,
            auto_facet_factor: self.auto_facet_factor,
        }
    }

    #[must_use]
    pub fn check_params(&self) -> CheckParams {
        CheckParams {
            ndim: self.ndim,
            planarity_tolerance: self.planarity_tolerance,
        }
    }
}

impl OptionBlock for InteractionOptions {
    const TITLE: &'static str = "interaction options";

    fn write_block(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "picking_distance {}", self.picking_distance)?;
        writeln!(out, "auto_facet_factor {}", self.auto_facet_factor)?;
        writeln!(out, "ndim {}", self.ndim)?;
        writeln!(out, "planarity_tolerance {}", self.planarity_tolerance)
    }

    fn read_block(reader: &mut LineReader<'_>) -> Result<Self, SessionError> {
        Ok(Self {
            picking_distance: entry(reader, "picking_distance", |t| t.f64("distance"))?,
            auto_facet_factor: entry(reader, "auto_facet_factor", |t| t.f64("factor"))?,
            ndim: entry(reader, "ndim", read_ndim)?,
            planarity_tolerance: entry(reader, "planarity_tolerance", |t| t.f64("tolerance"))?,
        })
    }
}

/// Export file preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileIoOptions {
    pub start_index: usize,
    /// Digits after the decimal point; `None` writes the shortest exact form.
    pub precision: Option<usize>,
}

impl FileIoOptions {
    #[must_use]
    pub fn export_params(&self) -> ExportParams {
        ExportParams {
            start_index: self.start_index,
            precision: self.precision,
        }
    }
}

impl OptionBlock for FileIoOptions {
    const TITLE: &'static str = "file i/o options";

    fn write_block(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "start_index {}", self.start_index)?;
        match self.precision {
            Some(p) => writeln!(out, "precision {p}"),
            None => writeln!(out, "precision null"),
        }
    }

    fn read_block(reader: &mut LineReader<'_>) -> Result<Self, SessionError> {
        Ok(Self {
            start_index: entry(reader, "start_index", |t| t.usize("index"))?,
            precision: entry(reader, "precision", |t| t.opt_usize("precision"))?,
        })
    }
}

/// Every option block stored in a session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionOptions {
    pub viewing: ViewingOptions,
    pub interaction: InteractionOptions,
    pub file_io: FileIoOptions,
}
