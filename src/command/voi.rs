use crate::error::Result;
use crate::model::{ModelStore, Voi};

use super::{ensure_fresh, take_state, Command};

/// Sets or clears the volume of interest.
#[derive(Debug)]
pub struct SetVoi {
    voi: Option<Voi>,
    previous: Option<Option<Voi>>,
}

impl SetVoi {
    #[must_use]
    pub fn new(voi: Option<Voi>) -> Self {
        Self {
            voi,
            previous: None,
        }
    }

    /// VOI fitted around every node that resolves to model space, or
    /// `None` when no node does.
    #[must_use]
    pub fn fit_nodes(store: &ModelStore) -> Option<Self> {
        store.node_bounds().map(|voi| Self::new(Some(voi)))
    }
}

impl Command for SetVoi {
    fn name(&self) -> &str {
        if self.voi.is_some() {
            "set volume of interest"
        } else {
            "clear volume of interest"
        }
    }

    /// Fails when the VOI would not change.
    fn check(&self, store: &ModelStore) -> bool {
        store.voi() != self.voi.as_ref()
    }

    fn execute(&mut self, store: &mut ModelStore) -> Result<()> {
        ensure_fresh(&self.previous, "set volume of interest")?;
        self.previous = Some(store.set_voi(self.voi));
        Ok(())
    }

    fn undo(&mut self, store: &mut ModelStore) -> Result<()> {
        let previous = take_state(&mut self.previous, "set volume of interest")?;
        store.set_voi(previous);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::test_support::{snapshot, Fixture};

    #[test]
    fn set_and_clear_round_trip() {
        let mut fx = Fixture::new();
        fx.node(0.0, 0.0, 0.0);
        let before = snapshot(&fx.store);

        let unit = Voi::new((-1.0, 1.0), (-1.0, 1.0), (-1.0, 1.0));
        let mut set = SetVoi::new(Some(unit));
        assert!(set.check(&fx.store));
        set.execute(&mut fx.store).unwrap();
        assert_eq!(fx.store.voi(), Some(&unit));
        assert!(!SetVoi::new(Some(unit)).check(&fx.store));

        let mut clear = SetVoi::new(None);
        assert_eq!(clear.name(), "clear volume of interest");
        clear.execute(&mut fx.store).unwrap();
        assert!(fx.store.voi().is_none());
        clear.undo(&mut fx.store).unwrap();
        assert_eq!(fx.store.voi(), Some(&unit));

        set.undo(&mut fx.store).unwrap();
        assert!(fx.store.voi().is_none());
        assert_eq!(snapshot(&fx.store), before);
    }

    #[test]
    fn fit_nodes_encloses_resolved_nodes() {
        let mut fx = Fixture::new();
        assert!(SetVoi::fit_nodes(&fx.store).is_none());
        fx.node(2.0, 0.0, -1.0);
        fx.node(-2.0, 3.0, 1.0);
        let mut cmd = SetVoi::fit_nodes(&fx.store).unwrap();
        cmd.execute(&mut fx.store).unwrap();
        assert!(fx.store.voi_contains(&Point3::new(0.0, 1.5, 0.0)));
        assert!(!fx.store.voi_contains(&Point3::new(0.0, 4.0, 0.0)));
    }
}
