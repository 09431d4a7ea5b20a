use tracing::debug;

use crate::error::Result;
use crate::model::{ElementId, GroupId, ModelStore};

use super::{ensure_fresh, take_state, Command};

/// Moves elements into another group.
#[derive(Debug)]
pub struct ChangeGroup {
    elements: Vec<ElementId>,
    group: GroupId,
    moved: Option<Vec<(ElementId, GroupId, usize)>>,
}

impl ChangeGroup {
    #[must_use]
    pub fn new(elements: Vec<ElementId>, group: GroupId) -> Self {
        Self {
            elements,
            group,
            moved: None,
        }
    }
}

/// Moves each element into `group` (appending) and records where it came
/// from. Rolls back on failure.
pub(crate) fn reassign_all(
    store: &mut ModelStore,
    elements: &[ElementId],
    group: GroupId,
) -> Result<Vec<(ElementId, GroupId, usize)>> {
    let mut moved = Vec::with_capacity(elements.len());
    for &e in elements {
        match store.reassign_group(e, group, None) {
            Ok((old, at)) => moved.push((e, old, at)),
            Err(err) => {
                restore_all(store, moved)?;
                return Err(err.into());
            }
        }
    }
    Ok(moved)
}

/// Inverse of [`reassign_all`].
pub(crate) fn restore_all(
    store: &mut ModelStore,
    moved: Vec<(ElementId, GroupId, usize)>,
) -> Result<()> {
    for (e, old, at) in moved.into_iter().rev() {
        store.reassign_group(e, old, Some(at))?;
    }
    Ok(())
}

fn is_attached(store: &ModelStore, element: ElementId) -> bool {
    match element {
        ElementId::Node(n) => store.contains_node(n),
        ElementId::Facet(f) => store.contains_facet(f),
        ElementId::Region(r) => store.contains_region(r),
    }
}

impl Command for ChangeGroup {
    fn name(&self) -> &str {
        "change group"
    }

    /// The target group is attached and at least one element would move.
    fn check(&self, store: &ModelStore) -> bool {
        store.groups().contains(self.group)
            && self.elements.iter().all(|&e| is_attached(store, e))
            && self
                .elements
                .iter()
                .any(|&e| store.group_of(e).is_ok_and(|g| g != self.group))
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.moved, "change group")?;
        let moved = reassign_all(store, &self.elements, self.group)?;
        debug!(elements = moved.len(), "group changed");
        self.moved = Some(moved);
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        restore_all(store, take_state(&mut self.moved, "change group")?)
    }
}

/// How a boundary marker changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryChange {
    Toggle,
    Set(bool),
}

impl BoundaryChange {
    fn apply(self, current: bool) -> bool {
        match self {
            Self::Toggle => !current,
            Self::Set(v) => v,
        }
    }
}

/// Changes the boundary markers of nodes and facets.
///
/// Region points carry no boundary marker and are ignored.
#[derive(Debug)]
pub struct ChangeBoundary {
    targets: Vec<ElementId>,
    change: BoundaryChange,
    previous: Option<Vec<(ElementId, bool)>>,
}

impl ChangeBoundary {
    #[must_use]
    pub fn new(targets: Vec<ElementId>, change: BoundaryChange) -> Self {
        let targets = targets
            .into_iter()
            .filter(|e| !matches!(e, ElementId::Region(_)))
            .collect();
        Self {
            targets,
            change,
            previous: None,
        }
    }

    fn set(store: &mut ModelStore, element: ElementId, value: bool) -> Result<bool> {
        Ok(match element {
            ElementId::Node(n) => store.set_node_boundary(n, value)?,
            ElementId::Facet(f) => store.set_facet_boundary(f, value)?,
            ElementId::Region(_) => value,
        })
    }

    fn current(store: &ModelStore, element: ElementId) -> Result<bool> {
        Ok(match element {
            ElementId::Node(n) => store.node(n)?.boundary(),
            ElementId::Facet(f) => store.facet(f)?.boundary(),
            ElementId::Region(_) => false,
        })
    }
}

impl Command for ChangeBoundary {
    fn name(&self) -> &str {
        "change boundary marker"
    }

    fn check(&self, store: &ModelStore) -> bool {
        !self.targets.is_empty() && self.targets.iter().all(|&e| is_attached(store, e))
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.previous, "change boundary marker")?;
        let mut previous = Vec::with_capacity(self.targets.len());
        for &e in &self.targets {
            let value = self.change.apply(Self::current(store, e)?);
            previous.push((e, Self::set(store, e, value)?));
        }
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let previous = take_state(&mut self.previous, "change boundary marker")?;
        for (e, value) in previous.into_iter().rev() {
            Self::set(store, e, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Color, GroupData};
    use crate::test_support::{snapshot, Fixture};

    #[test]
    fn change_group_round_trip() {
        let mut fx = Fixture::new();
        let other = fx.store.add_group(GroupData::new("other", Color::default()));
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        let c = fx.node(2.0, 0.0, 0.0);
        let f = fx.facet(&[a, b, c]);
        let before = snapshot(&fx.store);
        let mut cmd = ChangeGroup::new(vec![c.into(), a.into(), f.into()], other);
        assert!(cmd.check(&fx.store));
        cmd.execute(&mut fx.store).unwrap();
        assert_eq!(fx.store.group(other).unwrap().nodes(), &[c, a]);
        assert_eq!(fx.store.group(fx.group).unwrap().nodes(), &[b]);
        assert_eq!(fx.store.facet(f).unwrap().group(), other);
        cmd.undo(&mut fx.store).unwrap();
        assert_eq!(snapshot(&fx.store), before);
    }

    #[test]
    fn change_group_to_same_group_fails_check() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        assert!(!ChangeGroup::new(vec![a.into()], fx.group).check(&fx.store));
    }

    #[test]
    fn toggle_boundary_round_trip() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        let b = fx.node(1.0, 0.0, 0.0);
        let f = fx.facet(&[a, b]);
        fx.store.set_node_boundary(b, true).unwrap();
        let before = snapshot(&fx.store);
        let mut cmd =
            ChangeBoundary::new(vec![a.into(), b.into(), f.into()], BoundaryChange::Toggle);
        cmd.execute(&mut fx.store).unwrap();
        assert!(fx.store.node(a).unwrap().boundary());
        assert!(!fx.store.node(b).unwrap().boundary());
        assert!(fx.store.facet(f).unwrap().boundary());
        cmd.undo(&mut fx.store).unwrap();
        assert_eq!(snapshot(&fx.store), before);
    }

    #[test]
    fn set_boundary_false() {
        let mut fx = Fixture::new();
        let a = fx.node(0.0, 0.0, 0.0);
        fx.store.set_node_boundary(a, true).unwrap();
        let mut cmd = ChangeBoundary::new(vec![a.into()], BoundaryChange::Set(false));
        cmd.execute(&mut fx.store).unwrap();
        assert!(!fx.store.node(a).unwrap().boundary());
        cmd.undo(&mut fx.store).unwrap();
        assert!(fx.store.node(a).unwrap().boundary());
    }
}
