//! Geometric predicates with a certified floating-point error bound.
//!
//! Every predicate evaluates its determinant in plain `f64` and compares the
//! result against a static forward-error bound (Shewchuk's stage-A bounds).
//! A determinant whose magnitude is inside the bound cannot be trusted to
//! carry the right sign, so it is reported as [`Orientation::Degenerate`]
//! instead of guessed.

use super::{Point2, Point3};

/// Sign of an orientation determinant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Counter-clockwise in 2D, or above the oriented plane in 3D.
    Positive,
    /// Clockwise in 2D, or below the oriented plane in 3D.
    Negative,
    /// Collinear / coplanar within the certified error bound.
    Degenerate,
}

/// Capability interface for the orientation predicates used by the
/// triangulation, containment and hull code.
pub trait Predicates {
    /// Orientation of `c` relative to the directed line `a -> b`.
    fn orient2d(&self, a: &Point2, b: &Point2, c: &Point2) -> Orientation;

    /// Orientation of `d` relative to the plane through `a, b, c`, whose
    /// normal is `(b - a) x (c - a)`.
    fn orient3d(&self, a: &Point3, b: &Point3, c: &Point3, d: &Point3) -> Orientation;
}

const EPSILON: f64 = f64::EPSILON * 0.5;
const CCW_ERRBOUND: f64 = (3.0 + 16.0 * EPSILON) * EPSILON;
const O3D_ERRBOUND: f64 = (7.0 + 56.0 * EPSILON) * EPSILON;

/// Floating-point predicates filtered by a static error bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilteredPredicates;

impl Predicates for FilteredPredicates {
    fn orient2d(&self, a: &Point2, b: &Point2, c: &Point2) -> Orientation {
        let det_left = (a.x - c.x) * (b.y - c.y);
        let det_right = (a.y - c.y) * (b.x - c.x);
        let det = det_left - det_right;
        let bound = CCW_ERRBOUND * (det_left.abs() + det_right.abs());
        classify(det, bound)
    }

    fn orient3d(&self, a: &Point3, b: &Point3, c: &Point3, d: &Point3) -> Orientation {
        let ad = a - d;
        let bd = b - d;
        let cd = c - d;

        let bc = bd.y * cd.z - bd.z * cd.y;
        let ca = cd.y * ad.z - cd.z * ad.y;
        let ab = ad.y * bd.z - ad.z * bd.y;
        let det = ad.x * bc + bd.x * ca + cd.x * ab;

        let permanent = ((bd.y * cd.z).abs() + (bd.z * cd.y).abs()) * ad.x.abs()
            + ((cd.y * ad.z).abs() + (cd.z * ad.y).abs()) * bd.x.abs()
            + ((ad.y * bd.z).abs() + (ad.z * bd.y).abs()) * cd.x.abs();
        let bound = O3D_ERRBOUND * permanent;

        // The determinant above is positive when `d` lies below the plane.
        match classify(det, bound) {
            Orientation::Positive => Orientation::Negative,
            Orientation::Negative => Orientation::Positive,
            Orientation::Degenerate => Orientation::Degenerate,
        }
    }
}

fn classify(det: f64, bound: f64) -> Orientation {
    if det > bound {
        Orientation::Positive
    } else if det < -bound {
        Orientation::Negative
    } else {
        Orientation::Degenerate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orient2d_signs() {
        let pr = FilteredPredicates;
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        assert_eq!(pr.orient2d(&a, &b, &Point2::new(0.5, 1.0)), Orientation::Positive);
        assert_eq!(pr.orient2d(&a, &b, &Point2::new(0.5, -1.0)), Orientation::Negative);
        assert_eq!(pr.orient2d(&a, &b, &Point2::new(3.0, 0.0)), Orientation::Degenerate);
    }

    #[test]
    fn orient2d_nearly_collinear_is_not_guessed() {
        let pr = FilteredPredicates;
        let a = Point2::new(0.1, 0.1);
        let b = Point2::new(0.3, 0.3);
        let c = Point2::new(0.7, 0.7 + 1e-17);
        assert_eq!(pr.orient2d(&a, &b, &c), Orientation::Degenerate);
    }

    #[test]
    fn orient3d_signs() {
        let pr = FilteredPredicates;
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        assert_eq!(
            pr.orient3d(&a, &b, &c, &Point3::new(0.2, 0.2, 1.0)),
            Orientation::Positive
        );
        assert_eq!(
            pr.orient3d(&a, &b, &c, &Point3::new(0.2, 0.2, -1.0)),
            Orientation::Negative
        );
        assert_eq!(
            pr.orient3d(&a, &b, &c, &Point3::new(5.0, -3.0, 0.0)),
            Orientation::Degenerate
        );
    }
}
