use crate::error::Result;
use crate::math::Point2;
use crate::model::{ModelStore, RegionData, RegionId};
use crate::selection::SelectionContext;

use super::{ensure_fresh, take_state, Command};

/// Adds a region or control point.
#[derive(Debug)]
pub struct AddRegion {
    pending: Option<RegionData>,
    created: Option<RegionId>,
}

impl AddRegion {
    #[must_use]
    pub fn new(data: RegionData) -> Self {
        Self {
            pending: Some(data),
            created: None,
        }
    }

    /// Point at `pixel` on the current section, in the current group.
    #[must_use]
    pub fn on_section(ctx: &SelectionContext, pixel: Point2, control: bool) -> Option<Self> {
        Some(Self::new(RegionData::new(
            pixel,
            control,
            ctx.current_section?,
            ctx.current_group?,
        )))
    }

    #[must_use]
    pub fn created(&self) -> Option<RegionId> {
        self.created
    }
}

impl Command for AddRegion {
    fn name(&self) -> &str {
        "add region"
    }

    fn check(&self, store: &ModelStore) -> bool {
        let Some(data) = &self.pending else {
            return false;
        };
        store.groups().contains(data.group())
            && store.sections().contains(data.section())
            && store
                .section(data.section())
                .is_ok_and(|s| s.is_calibrated())
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.created, "add region")?;
        let data = take_state(&mut self.pending, "add region")?;
        match store.add_region(data.clone()) {
            Ok(id) => {
                self.created = Some(id);
                Ok(())
            }
            Err(err) => {
                self.pending = Some(data);
                Err(err.into())
            }
        }
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let id = take_state(&mut self.created, "add region")?;
        store.detach_region(id)?;
        self.pending = Some(store.discard_region(id)?);
        Ok(())
    }
}

/// Moves a region point within its section.
#[derive(Debug)]
pub struct MoveRegion {
    region: RegionId,
    pixel: Point2,
    previous: Option<Point2>,
}

impl MoveRegion {
    #[must_use]
    pub fn new(region: RegionId, pixel: Point2) -> Self {
        Self {
            region,
            pixel,
            previous: None,
        }
    }
}

impl Command for MoveRegion {
    fn name(&self) -> &str {
        "move region"
    }

    fn check(&self, store: &ModelStore) -> bool {
        store.contains_region(self.region)
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.previous, "move region")?;
        self.previous = Some(store.set_region_pixel(self.region, self.pixel)?);
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let previous = take_state(&mut self.previous, "move region")?;
        store.set_region_pixel(self.region, previous)?;
        Ok(())
    }
}
