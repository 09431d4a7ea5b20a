use crate::math::Point2;

use super::group::GroupId;
use super::section::SectionId;

slotmap::new_key_type! {
    /// Unique identifier for a region point in the model store.
    pub struct RegionId;
}

/// A material or control point placed on a section.
#[derive(Debug, Clone)]
pub struct RegionData {
    pixel: Point2,
    control: bool,
    section: SectionId,
    group: GroupId,
    id: usize,
    attached: bool,
}

impl RegionData {
    /// Creates a region point. `control` selects a control point over a
    /// material point.
    #[must_use]
    pub fn new(pixel: Point2, control: bool, section: SectionId, group: GroupId) -> Self {
        Self {
            pixel,
            control,
            section,
            group,
            id: 0,
            attached: false,
        }
    }

    #[must_use]
    pub fn pixel(&self) -> Point2 {
        self.pixel
    }

    #[must_use]
    pub fn is_control(&self) -> bool {
        self.control
    }

    #[must_use]
    pub fn section(&self) -> SectionId {
        self.section
    }

    #[must_use]
    pub fn group(&self) -> GroupId {
        self.group
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub(crate) fn set_pixel(&mut self, pixel: Point2) {
        self.pixel = pixel;
    }

    pub(crate) fn set_group(&mut self, group: GroupId) {
        self.group = group;
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    pub(crate) fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }
}
