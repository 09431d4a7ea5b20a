use super::{Point3, Vector3, TOLERANCE};

/// Arithmetic mean of a point set, or `None` when the set is empty.
#[must_use]
pub fn centroid(points: &[Point3]) -> Option<Point3> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    Some(Point3::from(sum / n))
}

/// Length of the diagonal of the axis-aligned box around `points`.
#[must_use]
pub fn extent(points: &[Point3]) -> f64 {
    let Some(first) = points.first() else {
        return 0.0;
    };
    let (min, max) = points.iter().skip(1).fold((*first, *first), |(lo, hi), p| {
        (
            Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
            Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
        )
    });
    (max - min).norm()
}

/// Unit polygon normal by Newell's method.
///
/// Returns `None` for fewer than three points or when the polygon has
/// no area (all points collinear or coincident).
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Option<Vector3> {
    if points.len() < 3 {
        return None;
    }
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    let len = normal.norm();
    if len < TOLERANCE {
        return None;
    }
    Some(normal / len)
}

/// Returns `true` if every point lies on one line, within `rel_tol` of the
/// point set's extent.
///
/// Point sets with fewer than three points are trivially collinear.
#[must_use]
pub fn is_collinear(points: &[Point3], rel_tol: f64) -> bool {
    if points.len() < 3 {
        return true;
    }
    let scale = extent(points);
    if scale < TOLERANCE {
        return true;
    }
    let origin = points[0];
    // Farthest point from the first one fixes the line direction.
    let Some(far) = points
        .iter()
        .max_by(|a, b| {
            (*a - origin)
                .norm()
                .partial_cmp(&(*b - origin).norm())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .copied()
    else {
        return true;
    };
    let dir = (far - origin) / (far - origin).norm();
    let tol = rel_tol * scale;
    points.iter().all(|p| {
        let d = p - origin;
        (d - dir * d.dot(&dir)).norm() <= tol
    })
}

/// Returns `true` if every point lies within `rel_tol` (relative to the
/// point set's extent) of the plane through the first three points.
///
/// When the first three points are collinear, the first later point that
/// spans a plane with the first two is used instead. Fully collinear sets
/// are reported planar; callers test collinearity separately.
#[must_use]
pub fn is_planar(points: &[Point3], rel_tol: f64) -> bool {
    if points.len() <= 3 {
        return true;
    }
    let scale = extent(points);
    if scale < TOLERANCE {
        return true;
    }
    let a = points[0];
    let b = points[1];
    let ab = b - a;
    let normal = points[2..].iter().find_map(|c| {
        let n = ab.cross(&(c - a));
        let len = n.norm();
        (len > rel_tol * scale * scale).then(|| n / len)
    });
    let Some(normal) = normal else {
        return true;
    };
    let tol = rel_tol * scale;
    points.iter().all(|p| (p - a).dot(&normal).abs() <= tol)
}
