use crate::error::{ModelError, Result};
use crate::model::{Calibration, ModelStore, SectionData, SectionId};

use super::{ensure_fresh, take_state, Command};

/// Appends a new section.
#[derive(Debug)]
pub struct AddSection {
    pending: Option<SectionData>,
    created: Option<SectionId>,
}

impl AddSection {
    #[must_use]
    pub fn new(data: SectionData) -> Self {
        Self {
            pending: Some(data),
            created: None,
        }
    }

    #[must_use]
    pub fn created(&self) -> Option<SectionId> {
        self.created
    }
}

impl Command for AddSection {
    fn name(&self) -> &str {
        "add section"
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.created, "add section")?;
        let data = take_state(&mut self.pending, "add section")?;
        self.created = Some(store.add_section(data));
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let id = take_state(&mut self.created, "add section")?;
        store.detach_section(id)?;
        self.pending = Some(store.discard_section(id)?);
        Ok(())
    }
}

/// Removes a section that no node, facet or region refers to.
#[derive(Debug)]
pub struct RemoveSection {
    section: SectionId,
    index: Option<usize>,
}

impl RemoveSection {
    #[must_use]
    pub fn new(section: SectionId) -> Self {
        Self {
            section,
            index: None,
        }
    }
}

impl Command for RemoveSection {
    fn name(&self) -> &str {
        "remove section"
    }

    fn check(&self, store: &ModelStore) -> bool {
        store.sections().contains(self.section)
            && store
                .section(self.section)
                .is_ok_and(|s| s.member_count() == 0)
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.index, "remove section")?;
        self.index = Some(store.detach_section(self.section)?);
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let index = take_state(&mut self.index, "remove section")?;
        store.attach_section(self.section, index)?;
        Ok(())
    }
}

/// Sets or clears a section's calibration.
///
/// Pixel coordinates of on-section elements are kept, so their model
/// positions follow the new calibration.
#[derive(Debug)]
pub struct CalibrateSection {
    section: SectionId,
    calibration: Option<Calibration>,
    previous: Option<Option<Calibration>>,
}

impl CalibrateSection {
    #[must_use]
    pub fn new(section: SectionId, calibration: Option<Calibration>) -> Self {
        Self {
            section,
            calibration,
            previous: None,
        }
    }
}

impl Command for CalibrateSection {
    fn name(&self) -> &str {
        "calibrate section"
    }

    fn check(&self, store: &ModelStore) -> bool {
        let Ok(section) = store.section(self.section) else {
            return false;
        };
        store.sections().contains(self.section)
            && self
                .calibration
                .as_ref()
                .is_none_or(|c| c.is_valid_for(section.orientation()))
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.previous, "calibrate section")?;
        self.previous = Some(store.calibrate_section(self.section, self.calibration)?);
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let previous = take_state(&mut self.previous, "calibrate section")?;
        store.calibrate_section(self.section, previous)?;
        Ok(())
    }
}

/// Moves a section by a signed number of positions, clamped to the
/// registry bounds.
#[derive(Debug)]
pub struct MoveSection {
    section: SectionId,
    delta: isize,
    moved: Option<(usize, usize)>,
}

impl MoveSection {
    #[must_use]
    pub fn new(section: SectionId, delta: isize) -> Self {
        Self {
            section,
            delta,
            moved: None,
        }
    }

    /// Position the section would move to, or `None` if it would not move.
    #[must_use]
    pub fn target(&self, store: &ModelStore) -> Option<usize> {
        let from = store.sections().position(self.section)?;
        let last = store.sections().len().saturating_sub(1);
        let to = from.saturating_add_signed(self.delta).min(last);
        (to != from).then_some(to)
    }
}

impl Command for MoveSection {
    fn name(&self) -> &str {
        "move section"
    }

    fn check(&self, store: &ModelStore) -> bool {
        self.target(store).is_some()
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.moved, "move section")?;
        let from = store
            .sections()
            .position(self.section)
            .ok_or(ModelError::Detached("section"))?;
        let to = store.move_section(self.section, self.delta)?.unwrap_or(from);
        self.moved = Some((from, to));
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let (from, to) = take_state(&mut self.moved, "move section")?;
        #[allow(clippy::cast_possible_wrap)]
        let back = from as isize - to as isize;
        store.move_section(self.section, back)?;
        Ok(())
    }
}
