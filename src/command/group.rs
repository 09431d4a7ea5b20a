use tracing::debug;

use crate::error::Result;
use crate::model::{Color, ElementId, GroupData, GroupId, ModelStore};
use crate::selection::SelectionContext;

use super::membership::{reassign_all, restore_all};
use super::{ensure_fresh, ensure_state, take_state, Command};

/// Appends a new group.
#[derive(Debug)]
pub struct AddGroup {
    pending: Option<GroupData>,
    created: Option<GroupId>,
}

impl AddGroup {
    #[must_use]
    pub fn new(data: GroupData) -> Self {
        Self {
            pending: Some(data),
            created: None,
        }
    }

    #[must_use]
    pub fn created(&self) -> Option<GroupId> {
        self.created
    }
}

impl Command for AddGroup {
    fn name(&self) -> &str {
        "add group"
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.created, "add group")?;
        let data = take_state(&mut self.pending, "add group")?;
        self.created = Some(store.add_group(data));
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let id = take_state(&mut self.created, "add group")?;
        store.detach_group(id)?;
        self.pending = Some(store.discard_group(id)?);
        Ok(())
    }
}

/// Removes an empty group.
#[derive(Debug)]
pub struct RemoveGroup {
    group: GroupId,
    index: Option<usize>,
}

impl RemoveGroup {
    #[must_use]
    pub fn new(group: GroupId) -> Self {
        Self { group, index: None }
    }
}

impl Command for RemoveGroup {
    fn name(&self) -> &str {
        "remove group"
    }

    fn check(&self, store: &ModelStore) -> bool {
        store.groups().contains(self.group)
            && store.group(self.group).is_ok_and(|g| g.member_count() == 0)
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.index, "remove group")?;
        self.index = Some(store.detach_group(self.group)?);
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let index = take_state(&mut self.index, "remove group")?;
        store.attach_group(self.group, index)?;
        Ok(())
    }
}

/// Renames a group.
#[derive(Debug)]
pub struct RenameGroup {
    group: GroupId,
    name: String,
    previous: Option<String>,
}

impl RenameGroup {
    #[must_use]
    pub fn new(group: GroupId, name: impl Into<String>) -> Self {
        Self {
            group,
            name: name.into(),
            previous: None,
        }
    }
}

impl Command for RenameGroup {
    fn name(&self) -> &str {
        "rename group"
    }

    fn check(&self, store: &ModelStore) -> bool {
        store.groups().contains(self.group)
            && store.group(self.group).is_ok_and(|g| g.name() != self.name)
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.previous, "rename group")?;
        self.previous = Some(store.rename_group(self.group, self.name.clone())?);
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let previous = take_state(&mut self.previous, "rename group")?;
        store.rename_group(self.group, previous)?;
        Ok(())
    }
}

/// Recolors a group.
#[derive(Debug)]
pub struct RecolorGroup {
    group: GroupId,
    color: Color,
    previous: Option<Color>,
}

impl RecolorGroup {
    #[must_use]
    pub fn new(group: GroupId, color: Color) -> Self {
        Self {
            group,
            color,
            previous: None,
        }
    }
}

impl Command for RecolorGroup {
    fn name(&self) -> &str {
        "recolor group"
    }

    fn check(&self, store: &ModelStore) -> bool {
        store.groups().contains(self.group)
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.previous, "recolor group")?;
        self.previous = Some(store.recolor_group(self.group, self.color)?);
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let previous = take_state(&mut self.previous, "recolor group")?;
        store.recolor_group(self.group, previous)?;
        Ok(())
    }
}

/// Moves a group up or down the paint order.
#[derive(Debug)]
pub struct MoveGroup {
    group: GroupId,
    delta: isize,
    moved: Option<(usize, usize)>,
}

impl MoveGroup {
    #[must_use]
    pub fn new(group: GroupId, delta: isize) -> Self {
        Self {
            group,
            delta,
            moved: None,
        }
    }

    /// Position the group would move to, or `None` if it would not move.
    #[must_use]
    pub fn target(&self, store: &ModelStore) -> Option<usize> {
        let from = store.groups().position(self.group)?;
        let last = store.groups().len().saturating_sub(1);
        let to = from.saturating_add_signed(self.delta).min(last);
        (to != from).then_some(to)
    }
}

impl Command for MoveGroup {
    fn name(&self) -> &str {
        "move group"
    }

    /// Fails when the move would leave the group where it is.
    fn check(&self, store: &ModelStore) -> bool {
        self.target(store).is_some()
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.moved, "move group")?;
        let from = store
            .groups()
            .position(self.group)
            .ok_or(crate::error::ModelError::Detached("group"))?;
        if let Some(to) = store.move_group(self.group, self.delta)? {
            self.moved = Some((from, to));
        } else {
            self.moved = Some((from, from));
        }
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let (from, to) = take_state(&mut self.moved, "move group")?;
        #[allow(clippy::cast_possible_wrap)]
        let back = from as isize - to as isize;
        store.move_group(self.group, back)?;
        Ok(())
    }
}

/// Reverses the group order.
#[derive(Debug, Default)]
pub struct ReverseGroups {
    executed: bool,
}

impl ReverseGroups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Command for ReverseGroups {
    fn name(&self) -> &str {
        "reverse group order"
    }

    fn check(&self, store: &ModelStore) -> bool {
        store.groups().len() > 1
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_state(self.executed, false, "reverse group order")?;
        store.reverse_groups();
        self.executed = true;
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_state(self.executed, true, "reverse group order")?;
        store.reverse_groups();
        self.executed = false;
        Ok(())
    }
}

fn members(data: &GroupData) -> Vec<ElementId> {
    data.nodes()
        .iter()
        .map(|&n| ElementId::Node(n))
        .chain(data.facets().iter().map(|&f| ElementId::Facet(f)))
        .chain(data.regions().iter().map(|&r| ElementId::Region(r)))
        .collect()
}

/// Moves every member of `source` into `target`, then removes `source`.
///
/// Callers holding `source` in a selection should drop it after execution
/// (see [`MergeGroups::removed_group`]).
#[derive(Debug)]
pub struct MergeGroups {
    source: GroupId,
    target: GroupId,
    done: Option<(Vec<(ElementId, GroupId, usize)>, usize)>,
}

impl MergeGroups {
    #[must_use]
    pub fn new(source: GroupId, target: GroupId) -> Self {
        Self {
            source,
            target,
            done: None,
        }
    }

    /// The group this command removes from the registry.
    #[must_use]
    pub fn removed_group(&self) -> GroupId {
        self.source
    }

    /// Points a selection that was on the source group at the target, then
    /// drops whatever else the store no longer holds.
    pub fn update_selection(&self, store: &ModelStore, ctx: &mut SelectionContext) {
        ctx.redirect_group(self.source, self.target);
        ctx.repair(store);
    }
}

impl Command for MergeGroups {
    fn name(&self) -> &str {
        "merge groups"
    }

    fn check(&self, store: &ModelStore) -> bool {
        self.source != self.target
            && store.groups().contains(self.source)
            && store.groups().contains(self.target)
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.done, "merge groups")?;
        let elements = members(store.group(self.source)?);
        let moved = reassign_all(store, &elements, self.target)?;
        match store.detach_group(self.source) {
            Ok(index) => {
                debug!(elements = moved.len(), "groups merged");
                self.done = Some((moved, index));
                Ok(())
            }
            Err(err) => {
                restore_all(store, moved)?;
                Err(err.into())
            }
        }
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let (moved, index) = take_state(&mut self.done, "merge groups")?;
        store.attach_group(self.source, index)?;
        restore_all(store, moved)
    }
}

/// Moves chosen members of a group into a new group placed right after it.
#[derive(Debug)]
pub struct SplitGroup {
    source: GroupId,
    elements: Vec<ElementId>,
    pending: Option<GroupData>,
    done: Option<(GroupId, Vec<(ElementId, GroupId, usize)>)>,
}

impl SplitGroup {
    #[must_use]
    pub fn new(source: GroupId, elements: Vec<ElementId>, data: GroupData) -> Self {
        Self {
            source,
            elements,
            pending: Some(data),
            done: None,
        }
    }

    #[must_use]
    pub fn created(&self) -> Option<GroupId> {
        self.done.as_ref().map(|(g, _)| *g)
    }
}

impl Command for SplitGroup {
    fn name(&self) -> &str {
        "split group"
    }

    /// Every element must currently belong to the source group.
    fn check(&self, store: &ModelStore) -> bool {
        self.pending.is_some()
            && store.groups().contains(self.source)
            && !self.elements.is_empty()
            && self
                .elements
                .iter()
                .all(|&e| store.group_of(e).is_ok_and(|g| g == self.source))
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.done, "split group")?;
        let source_at = store
            .groups()
            .position(self.source)
            .ok_or(crate::error::ModelError::Detached("group"))?;
        let data = take_state(&mut self.pending, "split group")?;
        let created = store.add_group(data);
        let last = store.groups().len() - 1;
        #[allow(clippy::cast_possible_wrap)]
        let delta = (source_at + 1) as isize - last as isize;
        store.move_group(created, delta)?;
        match reassign_all(store, &self.elements, created) {
            Ok(moved) => {
                self.done = Some((created, moved));
                Ok(())
            }
            Err(err) => {
                store.detach_group(created)?;
                self.pending = Some(store.discard_group(created)?);
                Err(err)
            }
        }
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let (created, moved) = take_state(&mut self.done, "split group")?;
        restore_all(store, moved)?;
        store.detach_group(created)?;
        self.pending = Some(store.discard_group(created)?);
        Ok(())
    }
}
