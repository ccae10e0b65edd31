use nalgebra::SymmetricEigen;

use crate::math::distance_3d::triangle_normal;
use crate::math::predicates::{FilteredPredicates, Orientation, Predicates};
use crate::math::{centroid, Matrix3, Point2, Point3, Vector2, Vector3};

use super::ConvexHull;

/// A rotated bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Point3,
    /// Orthonormal box axes.
    pub axes: [Vector3; 3],
    /// Half edge lengths along [`axes`](Self::axes).
    pub half_extents: Vector3,
}

impl OrientedBox {
    /// Small bounding box around `points`.
    ///
    /// Candidate frames are the world axes, the principal axes of the points
    /// and, for each distinct facet normal of their convex hull, the
    /// minimum-area rectangle of the points projected along that normal. The
    /// smallest candidate wins. `None` for no points.
    ///
    /// Every candidate encloses the points, so the volume is an upper bound
    /// on the true minimum. It is exact whenever the optimal box has a face
    /// flush with a hull facet, which covers boxes and extruded footprints.
    /// Boxes touching the hull only along edges, as in O'Rourke's
    /// edge-pair search, are not tried.
    #[must_use]
    pub fn new(points: &[Point3]) -> Option<Self> {
        Self::with_hull(points, &ConvexHull::new(points))
    }

    /// Same as [`new`](Self::new) with a precomputed hull of `points`.
    #[must_use]
    pub fn with_hull(points: &[Point3], hull: &ConvexHull) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let support: &[Point3] = if hull.is_empty() {
            points
        } else {
            hull.vertices()
        };

        let mut best = Self::from_axes(support, [Vector3::x(), Vector3::y(), Vector3::z()]);
        let mut consider = |candidate: Self| {
            if candidate.volume() < best.volume() {
                best = candidate;
            }
        };

        if let Some(axes) = principal_axes(support) {
            consider(Self::from_axes(support, axes));
        }

        let mut normals: Vec<Vector3> = Vec::new();
        for [a, b, c] in hull.mesh().iter_corners() {
            let n = triangle_normal(&a, &b, &c);
            let len = n.norm();
            if len <= f64::EPSILON {
                continue;
            }
            let n = n / len;
            if normals.iter().any(|m| m.dot(&n).abs() > 1.0 - 1e-9) {
                continue;
            }
            normals.push(n);
            if let Some(axes) = caliper_axes(support, &n) {
                consider(Self::from_axes(support, axes));
            }
        }
        Some(best)
    }

    /// Tight box around `points` in the given orthonormal frame.
    fn from_axes(points: &[Point3], axes: [Vector3; 3]) -> Self {
        let mut lo = Vector3::repeat(f64::INFINITY);
        let mut hi = Vector3::repeat(f64::NEG_INFINITY);
        for p in points {
            for (i, axis) in axes.iter().enumerate() {
                let t = p.coords.dot(axis);
                lo[i] = lo[i].min(t);
                hi[i] = hi[i].max(t);
            }
        }
        let mid = (lo + hi) * 0.5;
        let center = Point3::from(axes[0] * mid.x + axes[1] * mid.y + axes[2] * mid.z);
        Self {
            center,
            axes,
            half_extents: (hi - lo) * 0.5,
        }
    }

    /// Full edge lengths.
    #[must_use]
    pub fn extents(&self) -> Vector3 {
        self.half_extents * 2.0
    }

    #[must_use]
    pub fn volume(&self) -> f64 {
        let e = self.extents();
        e.x * e.y * e.z
    }

    /// Total area of the six faces.
    #[must_use]
    pub fn area(&self) -> f64 {
        let e = self.extents();
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }
}

fn principal_axes(points: &[Point3]) -> Option<[Vector3; 3]> {
    let center = centroid(points)?;
    let mut covariance = Matrix3::zeros();
    for p in points {
        let d = p - center;
        covariance += d * d.transpose();
    }
    let eigen = SymmetricEigen::new(covariance);
    let a0: Vector3 = eigen.eigenvectors.column(0).into_owned();
    let a1: Vector3 = eigen.eigenvectors.column(1).into_owned();
    let a0 = a0.try_normalize(f64::EPSILON)?;
    let a1 = (a1 - a0 * a0.dot(&a1)).try_normalize(f64::EPSILON)?;
    Some([a0, a1, a0.cross(&a1)])
}

/// Frame whose third axis is `normal` and whose first two axes bound the
/// minimum-area rectangle of the points projected onto the normal's plane.
fn caliper_axes(points: &[Point3], normal: &Vector3) -> Option<[Vector3; 3]> {
    let reference = if normal.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = normal.cross(&reference).normalize();
    let v = normal.cross(&u);
    let projected: Vec<Point2> = points
        .iter()
        .map(|p| Point2::new(p.coords.dot(&u), p.coords.dot(&v)))
        .collect();

    let hull = convex_hull_2d(&projected, &FilteredPredicates);
    if hull.len() < 3 {
        return None;
    }

    let mut best: Option<(f64, Vector2)> = None;
    for i in 0..hull.len() {
        let Some(e) = (hull[(i + 1) % hull.len()] - hull[i]).try_normalize(f64::EPSILON) else {
            continue;
        };
        let perp = Vector2::new(-e.y, e.x);
        let (mut lo_e, mut hi_e, mut lo_p, mut hi_p) =
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        for q in &hull {
            let (s, t) = (q.coords.dot(&e), q.coords.dot(&perp));
            lo_e = lo_e.min(s);
            hi_e = hi_e.max(s);
            lo_p = lo_p.min(t);
            hi_p = hi_p.max(t);
        }
        let area = (hi_e - lo_e) * (hi_p - lo_p);
        match best {
            Some((smallest, _)) if smallest <= area => {}
            _ => best = Some((area, e)),
        }
    }

    let (_, e) = best?;
    let a0 = u * e.x + v * e.y;
    let a1 = u * -e.y + v * e.x;
    Some([a0, a1, *normal])
}

/// Counter-clockwise convex hull (monotone chain), collinear points dropped.
fn convex_hull_2d(points: &[Point2], predicates: &impl Predicates) -> Vec<Point2> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<Point2> = Vec::with_capacity(sorted.len() * 2);
    for p in &sorted {
        while hull.len() >= 2
            && predicates.orient2d(&hull[hull.len() - 2], &hull[hull.len() - 1], p)
                != Orientation::Positive
        {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && predicates.orient2d(&hull[hull.len() - 2], &hull[hull.len() - 1], p)
                != Orientation::Positive
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}
