use std::path::PathBuf;

use crate::error::ModelError;
use crate::math::{Point2, Point3, Vector3, TOLERANCE};

use super::facet::FacetId;
use super::node::NodeId;
use super::region::RegionId;
use super::registry::{Registry, RegistryEntry};

slotmap::new_key_type! {
    /// Unique identifier for a section in the section registry.
    pub struct SectionId;
}

/// Orientation of the section plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionOrientation {
    /// Vertical plane: pixel x runs along the horizontal trace, pixel y
    /// maps to elevation.
    Cross,
    /// Horizontal plane: pixel x/y map to easting/northing at a fixed
    /// elevation.
    Depth,
}

/// What the section displays.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    /// A digitized image file.
    Image { path: PathBuf },
    /// An empty canvas of the given pixel size.
    Blank { width: f64, height: f64 },
    /// A captured view of the 3D model.
    Snapshot { path: PathBuf },
}

/// Two clicked pixels paired with two typed model-space points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub clicked: [Point2; 2],
    pub typed: [Point3; 2],
}

impl Calibration {
    #[must_use]
    pub fn new(clicked: [Point2; 2], typed: [Point3; 2]) -> Self {
        Self { clicked, typed }
    }

    /// Returns `true` if the pairs define an invertible map for `orientation`.
    #[must_use]
    pub fn is_valid_for(&self, orientation: SectionOrientation) -> bool {
        let [c1, c2] = self.clicked;
        let [t1, t2] = self.typed;
        if (c2.x - c1.x).abs() < TOLERANCE || (c2.y - c1.y).abs() < TOLERANCE {
            return false;
        }
        match orientation {
            SectionOrientation::Cross => {
                horizontal(&(t2 - t1)).norm() >= TOLERANCE && (t2.z - t1.z).abs() >= TOLERANCE
            }
            SectionOrientation::Depth => {
                (t2.x - t1.x).abs() >= TOLERANCE && (t2.y - t1.y).abs() >= TOLERANCE
            }
        }
    }

    /// Maps a pixel to model space.
    #[must_use]
    pub fn to_model(&self, orientation: SectionOrientation, pixel: &Point2) -> Point3 {
        let [c1, c2] = self.clicked;
        let [t1, t2] = self.typed;
        let fx = (pixel.x - c1.x) / (c2.x - c1.x);
        let fy = (pixel.y - c1.y) / (c2.y - c1.y);
        match orientation {
            SectionOrientation::Cross => {
                let trace = horizontal(&(t2 - t1));
                let z = t1.z + fy * (t2.z - t1.z);
                let p = t1 + trace * fx;
                Point3::new(p.x, p.y, z)
            }
            SectionOrientation::Depth => Point3::new(
                t1.x + fx * (t2.x - t1.x),
                t1.y + fy * (t2.y - t1.y),
                t1.z,
            ),
        }
    }

    /// Maps a model-space point back to pixel space, projecting it onto
    /// the section plane first.
    #[must_use]
    pub fn to_pixel(&self, orientation: SectionOrientation, point: &Point3) -> Point2 {
        let [c1, c2] = self.clicked;
        let [t1, t2] = self.typed;
        let (fx, fy) = match orientation {
            SectionOrientation::Cross => {
                let trace = horizontal(&(t2 - t1));
                let d = horizontal(&(point - t1));
                (
                    d.dot(&trace) / trace.norm_squared(),
                    (point.z - t1.z) / (t2.z - t1.z),
                )
            }
            SectionOrientation::Depth => (
                (point.x - t1.x) / (t2.x - t1.x),
                (point.y - t1.y) / (t2.y - t1.y),
            ),
        };
        Point2::new(c1.x + fx * (c2.x - c1.x), c1.y + fy * (c2.y - c1.y))
    }
}

fn horizontal(v: &Vector3) -> Vector3 {
    Vector3::new(v.x, v.y, 0.0)
}

/// A calibrated drawing surface.
///
/// Member lists mirror group membership for fast per-section lookup; the
/// model store keeps them in step.
#[derive(Debug, Clone)]
pub struct SectionData {
    orientation: SectionOrientation,
    content: SectionContent,
    calibration: Option<Calibration>,
    nodes: Vec<NodeId>,
    facets: Vec<FacetId>,
    regions: Vec<RegionId>,
    id: usize,
    attached: bool,
}

impl SectionData {
    /// Creates an uncalibrated section.
    #[must_use]
    pub fn new(orientation: SectionOrientation, content: SectionContent) -> Self {
        Self {
            orientation,
            content,
            calibration: None,
            nodes: Vec::new(),
            facets: Vec::new(),
            regions: Vec::new(),
            id: 0,
            attached: false,
        }
    }

    /// Attaches a calibration.
    ///
    /// # Errors
    ///
    /// Returns an error if the calibration is degenerate for this orientation.
    pub fn with_calibration(mut self, calibration: Calibration) -> Result<Self, ModelError> {
        if !calibration.is_valid_for(self.orientation) {
            return Err(ModelError::DegenerateCalibration);
        }
        self.calibration = Some(calibration);
        Ok(self)
    }

    #[must_use]
    pub fn orientation(&self) -> SectionOrientation {
        self.orientation
    }

    #[must_use]
    pub fn content(&self) -> &SectionContent {
        &self.content
    }

    #[must_use]
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    /// Resolves a pixel to model space; `None` until calibrated.
    #[must_use]
    pub fn pixel_to_model(&self, pixel: &Point2) -> Option<Point3> {
        self.calibration
            .map(|c| c.to_model(self.orientation, pixel))
    }

    /// Projects a model-space point to pixel space; `None` until calibrated.
    #[must_use]
    pub fn model_to_pixel(&self, point: &Point3) -> Option<Point2> {
        self.calibration
            .map(|c| c.to_pixel(self.orientation, point))
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

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.nodes.len() + self.facets.len() + self.regions.len()
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn set_calibration(
        &mut self,
        calibration: Option<Calibration>,
    ) -> Option<Calibration> {
        std::mem::replace(&mut self.calibration, calibration)
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

impl RegistryEntry for SectionData {
    const KIND: &'static str = "section";

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

/// Ordered section collection.
pub type SectionRegistry = Registry<SectionId, SectionData>;
