use std::collections::VecDeque;

use tracing::{debug, info};

use crate::error::Result;
use crate::model::ModelStore;

use super::Command;

/// Number of commands kept for undo.
pub const UNDO_CAPACITY: usize = 32;

/// Bounded stack of executed commands.
///
/// Pushing onto a full history silently drops the oldest entry.
#[derive(Debug)]
pub struct UndoHistory {
    entries: VecDeque<Box<dyn Command>>,
    capacity: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::with_capacity(UNDO_CAPACITY)
    }
}

impl UndoHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history holding at most `capacity` commands (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Name of the command `undo` would revert, for confirmation prompts.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.entries.back().map(|c| c.name())
    }

    /// Records an already-executed command.
    pub fn push(&mut self, command: Box<dyn Command>) {
        if self.entries.len() == self.capacity {
            if let Some(dropped) = self.entries.pop_front() {
                debug!(command = dropped.name(), "undo history full, dropping oldest");
            }
        }
        self.entries.push_back(command);
    }

    /// Checks, executes and records a command.
    ///
    /// Returns `false` without touching the store when the check fails.
    ///
    /// # Errors
    ///
    /// Returns an error if execution fails; nothing is recorded.
    pub fn execute(
        &mut self,
        mut command: Box<dyn Command>,
        store: &mut ModelStore,
    ) -> Result<bool> {
        if !command.check(store) {
            debug!(command = command.name(), "check failed, not executed");
            return Ok(false);
        }
        command.execute(store)?;
        info!(command = command.name(), "executed");
        self.push(command);
        Ok(true)
    }

    /// Pops and reverts the most recent command, returning its name.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails to undo; it is not re-pushed.
    pub fn undo(&mut self, store: &mut ModelStore) -> Result<Option<String>> {
        let Some(mut command) = self.entries.pop_back() else {
            return Ok(None);
        };
        command.undo(store)?;
        info!(command = command.name(), "undone");
        Ok(Some(command.name().to_string()))
    }

    /// Forgets every recorded command.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::{AddGroup, RenameGroup};
    use crate::model::{Color, GroupData};
    use crate::test_support::{init_tracing, snapshot, Fixture};

    #[test]
    fn capacity_drops_oldest_silently() {
        init_tracing();
        let mut fx = Fixture::new();
        let mut history = UndoHistory::new();
        for i in 0..=UNDO_CAPACITY {
            let cmd = AddGroup::new(GroupData::new(format!("g{i}"), Color::default()));
            assert!(history.execute(Box::new(cmd), &mut fx.store).unwrap());
        }
        assert_eq!(history.len(), UNDO_CAPACITY);
        while history.undo(&mut fx.store).unwrap().is_some() {}
        // The first group can no longer be undone.
        let names: Vec<&str> = fx.store.groups().iter().map(|(_, g)| g.name()).collect();
        assert_eq!(names, ["default", "g0"]);
    }

    #[test]
    fn failed_check_is_not_recorded() {
        let mut fx = Fixture::new();
        let before = snapshot(&fx.store);
        let mut history = UndoHistory::new();
        let cmd = RenameGroup::new(fx.group, "default");
        assert!(!history.execute(Box::new(cmd), &mut fx.store).unwrap());
        assert!(history.is_empty());
        assert_eq!(snapshot(&fx.store), before);
    }

    #[test]
    fn undo_reports_name() {
        let mut fx = Fixture::new();
        let mut history = UndoHistory::new();
        history
            .execute(Box::new(RenameGroup::new(fx.group, "rocks")), &mut fx.store)
            .unwrap();
        assert_eq!(history.last_name(), Some("rename group"));
        assert_eq!(
            history.undo(&mut fx.store).unwrap().as_deref(),
            Some("rename group")
        );
        assert_eq!(fx.store.group(fx.group).unwrap().name(), "default");
        assert_eq!(history.undo(&mut fx.store).unwrap(), None);
    }
}
