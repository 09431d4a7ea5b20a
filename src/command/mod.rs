//! Reversible model mutations.
//!
//! Every change to a [`ModelStore`] goes through a [`Command`]: the command
//! captures what it needs to put the store back exactly as it found it, and
//! an [`UndoHistory`] keeps the most recent ones around.

mod facet;
mod group;
mod history;
mod membership;
mod node;
mod region;
mod removal;
mod section;
mod voi;

pub use facet::{AddFacet, ReverseFacets};
pub use group::{
    AddGroup, MergeGroups, MoveGroup, RecolorGroup, RemoveGroup, RenameGroup, ReverseGroups,
    SplitGroup,
};
pub use history::{UndoHistory, UNDO_CAPACITY};
pub use membership::{BoundaryChange, ChangeBoundary, ChangeGroup};
pub use node::{AddNode, MergeNodes, MoveNode};
pub use region::{AddRegion, MoveRegion};
pub use removal::RemoveElements;
pub use section::{AddSection, CalibrateSection, MoveSection, RemoveSection};
pub use voi::SetVoi;

use std::fmt;

use tracing::debug;

use crate::error::{CommandError, Result};
use crate::model::ModelStore;

/// A reversible mutation of the model.
///
/// `undo` after `execute` restores every list and back-reference the
/// command touched to its prior order. Only one command runs at a time.
pub trait Command: fmt::Debug {
    /// Display name, used for undo prompts.
    fn name(&self) -> &str;

    /// Returns `true` if the command may be executed against `store`.
    ///
    /// A command whose check fails must not be executed or pushed.
    fn check(&self, store: &ModelStore) -> bool {
        let _ = store;
        true
    }

    /// Applies the mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if the command was already executed or the store
    /// rejects the change; the store is left as it was.
    fn execute(&mut self, store: &mut ModelStore) -> Result<()>;

    /// Reverts the mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if the command has not been executed.
    fn undo(&mut self, store: &mut ModelStore) -> Result<()>;
}

/// Ordered composite of commands, reported under one name.
///
/// Children execute in order and undo in reverse order. If a child fails,
/// the children already executed are undone before the error is returned.
#[derive(Debug)]
pub struct CommandVector {
    name: String,
    children: Vec<Box<dyn Command>>,
    executed: bool,
}

impl CommandVector {
    /// Creates an empty composite.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            executed: false,
        }
    }

    /// Appends a child command.
    pub fn push(&mut self, command: impl Command + 'static) {
        self.children.push(Box::new(command));
    }

    /// Appends a boxed child command.
    pub fn push_boxed(&mut self, command: Box<dyn Command>) {
        self.children.push(command);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Command for CommandVector {
    fn name(&self) -> &str {
        &self.name
    }

    /// Every child must pass its own check against the current store.
    fn check(&self, store: &ModelStore) -> bool {
        !self.children.is_empty() && self.children.iter().all(|c| c.check(store))
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        if self.executed {
            return Err(CommandError::AlreadyExecuted(self.name.clone()).into());
        }
        for i in 0..self.children.len() {
            if let Err(err) = self.children[i].execute(store) {
                debug!(command = %self.name, child = i, "rolling back composite");
                for child in self.children[..i].iter_mut().rev() {
                    child.undo(store)?;
                }
                return Err(err);
            }
        }
        self.executed = true;
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        if !self.executed {
            return Err(CommandError::NotExecuted(self.name.clone()).into());
        }
        for child in self.children.iter_mut().rev() {
            child.undo(store)?;
        }
        self.executed = false;
        Ok(())
    }
}

/// Fails with [`CommandError::AlreadyExecuted`] when `state` is set.
fn ensure_fresh<T>(state: &Option<T>, name: &str) -> Result<()> {
    if state.is_some() {
        return Err(CommandError::AlreadyExecuted(name.to_string()).into());
    }
    Ok(())
}

/// Fails unless the command's executed flag equals `expected`.
fn ensure_state(executed: bool, expected: bool, name: &str) -> Result<()> {
    match (executed, expected) {
        (true, false) => Err(CommandError::AlreadyExecuted(name.to_string()).into()),
        (false, true) => Err(CommandError::NotExecuted(name.to_string()).into()),
        _ => Ok(()),
    }
}

/// Takes the recorded undo state or fails with [`CommandError::NotExecuted`].
fn take_state<T>(state: &mut Option<T>, name: &str) -> Result<T> {
    state
        .take()
        .ok_or_else(|| CommandError::NotExecuted(name.to_string()).into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::model::{Color, GroupData, NodePosition};
    use crate::test_support::{snapshot, Fixture};

    #[test]
    fn vector_executes_in_order_and_undoes_in_reverse() {
        let mut fx = Fixture::new();
        let before = snapshot(&fx.store);
        let mut cmd = CommandVector::new("add two groups");
        cmd.push(AddGroup::new(GroupData::new("a", Color::default())));
        cmd.push(AddGroup::new(GroupData::new("b", Color::default())));
        assert!(cmd.check(&fx.store));
        cmd.execute(&mut fx.store).unwrap();
        let names: Vec<&str> = fx.store.groups().iter().map(|(_, g)| g.name()).collect();
        assert_eq!(names, ["default", "a", "b"]);
        cmd.undo(&mut fx.store).unwrap();
        assert_eq!(snapshot(&fx.store), before);
        assert_eq!(cmd.name(), "add two groups");
    }

    #[test]
    fn vector_rolls_back_on_failure() {
        let mut fx = Fixture::new();
        let n = fx.node(0.0, 0.0, 0.0);
        let before = snapshot(&fx.store);
        let mut cmd = CommandVector::new("broken");
        cmd.push(MoveNode::new(
            n,
            NodePosition::OffSection {
                point: Point3::new(1.0, 1.0, 1.0),
            },
        ));
        cmd.push(RemoveGroup::new(fx.group));
        assert!(cmd.execute(&mut fx.store).is_err());
        assert_eq!(snapshot(&fx.store), before);
    }

    #[test]
    fn empty_vector_fails_check() {
        let fx = Fixture::new();
        assert!(!CommandVector::new("nothing").check(&fx.store));
    }

    #[test]
    fn double_execute_is_rejected() {
        let mut fx = Fixture::new();
        let mut cmd = AddGroup::new(GroupData::new("a", Color::default()));
        cmd.execute(&mut fx.store).unwrap();
        assert!(cmd.execute(&mut fx.store).is_err());
        cmd.undo(&mut fx.store).unwrap();
        assert!(cmd.undo(&mut fx.store).is_err());
    }
}
