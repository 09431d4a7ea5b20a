use crate::math::Point3;

/// Axis-aligned volume of interest.
///
/// Always normalized so that `x1 <= x2`, `y1 <= y2`, `z1 <= z2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voi {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    z1: f64,
    z2: f64,
}

impl Voi {
    /// Creates a VOI from per-axis limits given in any order.
    #[must_use]
    pub fn new(x: (f64, f64), y: (f64, f64), z: (f64, f64)) -> Self {
        Self {
            x1: x.0.min(x.1),
            x2: x.0.max(x.1),
            y1: y.0.min(y.1),
            y2: y.0.max(y.1),
            z1: z.0.min(z.1),
            z2: z.0.max(z.1),
        }
    }

    /// Smallest VOI enclosing all `points`, or `None` for an empty set.
    #[must_use]
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = *it.next()?;
        let (lo, hi) = it.fold((first, first), |(lo, hi), p| {
            (
                Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        });
        Some(Self::new((lo.x, hi.x), (lo.y, hi.y), (lo.z, hi.z)))
    }

    /// Limits as `[x1, x2, y1, y2, z1, z2]`.
    #[must_use]
    pub fn limits(&self) -> [f64; 6] {
        [self.x1, self.x2, self.y1, self.y2, self.z1, self.z2]
    }

    #[must_use]
    pub fn min(&self) -> Point3 {
        Point3::new(self.x1, self.y1, self.z1)
    }

    #[must_use]
    pub fn max(&self) -> Point3 {
        Point3::new(self.x2, self.y2, self.z2)
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, p: &Point3) -> bool {
        (self.x1..=self.x2).contains(&p.x)
            && (self.y1..=self.y2).contains(&p.y)
            && (self.z1..=self.z2).contains(&p.z)
    }

    /// Clamps `p` into the box.
    #[must_use]
    pub fn snap(&self, p: &Point3) -> Point3 {
        Point3::new(
            p.x.clamp(self.x1, self.x2),
            p.y.clamp(self.y1, self.y2),
            p.z.clamp(self.z1, self.z2),
        )
    }

    /// Snaps each coordinate of `p` to a box face when it lies within
    /// `distance` of that face.
    #[must_use]
    pub fn snap_to_faces(&self, p: &Point3, distance: f64) -> Point3 {
        let snap = |v: f64, lo: f64, hi: f64| {
            if (v - lo).abs() <= distance {
                lo
            } else if (v - hi).abs() <= distance {
                hi
            } else {
                v
            }
        };
        Point3::new(
            snap(p.x, self.x1, self.x2),
            snap(p.y, self.y1, self.y2),
            snap(p.z, self.z1, self.z2),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_limits() {
        let voi = Voi::new((5.0, 1.0), (0.0, 2.0), (3.0, -3.0));
        assert_eq!(voi.limits(), [1.0, 5.0, 0.0, 2.0, -3.0, 3.0]);
    }

    #[test]
    fn containment_is_inclusive() {
        let voi = Voi::new((0.0, 1.0), (0.0, 1.0), (0.0, 1.0));
        assert!(voi.contains(&Point3::new(1.0, 0.0, 0.5)));
        assert!(!voi.contains(&Point3::new(1.0001, 0.0, 0.5)));
    }

    #[test]
    fn snapping() {
        let voi = Voi::new((0.0, 10.0), (0.0, 10.0), (0.0, 10.0));
        assert_eq!(voi.snap(&Point3::new(-1.0, 5.0, 12.0)), Point3::new(0.0, 5.0, 10.0));
        assert_eq!(
            voi.snap_to_faces(&Point3::new(0.2, 5.0, 9.9), 0.5),
            Point3::new(0.0, 5.0, 10.0)
        );
    }

    #[test]
    fn enclosing_points() {
        let pts = [Point3::new(1.0, -2.0, 3.0), Point3::new(-1.0, 2.0, 0.0)];
        let voi = Voi::enclosing(&pts).unwrap();
        assert_eq!(voi.limits(), [-1.0, 1.0, -2.0, 2.0, 0.0, 3.0]);
        assert!(Voi::enclosing(&[]).is_none());
    }
}
