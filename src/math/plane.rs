use nalgebra::SymmetricEigen;

use super::{centroid, Matrix3, Point2, Point3, Vector3, SNAP_TOLERANCE};

/// An infinite plane in 3D space with a local 2D frame.
///
/// Implicit form: `a*x + b*y + c*z + d = 0` with `(a, b, c)` the unit normal.
/// Parametric form: `P(u, v) = origin + u * u_dir + v * v_dir`, where
/// `u_dir x v_dir = normal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
    d: f64,
}

impl Default for Plane {
    /// The plane `z = 0`.
    fn default() -> Self {
        Self::from_normal_unchecked(Point3::origin(), Vector3::z())
    }
}

impl Plane {
    /// Creates a plane from a point on it and a unit normal.
    ///
    /// The U and V directions are computed automatically.
    fn from_normal_unchecked(origin: Point3, normal: Vector3) -> Self {
        // Choose a reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u_dir = normal.cross(&reference).normalize();
        let v_dir = normal.cross(&u_dir);
        Self {
            origin,
            u_dir,
            v_dir,
            normal,
            d: -normal.dot(&origin.coords),
        }
    }

    /// Least-squares best-fit plane through `points`.
    ///
    /// The normal is the eigenvector of the smallest eigenvalue of the
    /// points' covariance matrix. Normal components below [`SNAP_TOLERANCE`]
    /// are snapped to zero and the plane is re-normalized; a plane with no
    /// snapped component is returned as fitted.
    ///
    /// The normal is oriented so that its dominant component is positive,
    /// which makes the result independent of the order of `points`.
    ///
    /// Fewer than 3 points yields the default plane. Collinear input yields
    /// a plane through the line with an arbitrary orientation around it.
    #[must_use]
    pub fn fit(points: &[Point3]) -> Self {
        Self::fit_with_tolerance(points, SNAP_TOLERANCE)
    }

    /// Same as [`fit`](Self::fit) with a custom snapping tolerance.
    #[must_use]
    pub fn fit_with_tolerance(points: &[Point3], snap_tolerance: f64) -> Self {
        if points.len() < 3 {
            return Self::default();
        }
        let Some(center) = centroid(points) else {
            return Self::default();
        };

        let mut covariance = Matrix3::zeros();
        for p in points {
            let d = p - center;
            covariance += d * d.transpose();
        }

        let eigen = SymmetricEigen::new(covariance);
        let mut smallest = 0;
        for i in 1..3 {
            if eigen.eigenvalues[i] < eigen.eigenvalues[smallest] {
                smallest = i;
            }
        }
        let normal: Vector3 = eigen.eigenvectors.column(smallest).into_owned();
        let len = normal.norm();
        if !len.is_finite() || len < SNAP_TOLERANCE {
            return Self::default();
        }
        let normal = canonical_sign(normal / len);
        let d = -normal.dot(&center.coords);

        let (normal, d) = snap_coefficients(normal, d, snap_tolerance);
        // Project the centroid onto the (possibly snapped) plane.
        let origin = center - normal * (normal.dot(&center.coords) + d);
        Self::from_normal_unchecked(origin, normal)
    }

    /// Returns a point on the plane (the projected centroid for fitted planes).
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the unit normal vector.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the implicit coefficients `(a, b, c, d)`.
    #[must_use]
    pub fn coefficients(&self) -> [f64; 4] {
        [self.normal.x, self.normal.y, self.normal.z, self.d]
    }

    /// Signed distance from `point` to the plane, positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) + self.d
    }

    /// Projects a 3D point into the plane's local 2D frame.
    #[must_use]
    pub fn to_2d(&self, point: &Point3) -> Point2 {
        let diff = point - self.origin;
        Point2::new(diff.dot(&self.u_dir), diff.dot(&self.v_dir))
    }

    /// Lifts a point of the local 2D frame back onto the plane.
    #[must_use]
    pub fn to_3d(&self, point: &Point2) -> Point3 {
        self.origin + self.u_dir * point.x + self.v_dir * point.y
    }
}

/// Flips `normal` so its largest-magnitude component is positive. Ties are
/// broken towards z, then y, then x.
fn canonical_sign(normal: Vector3) -> Vector3 {
    let max = normal.x.abs().max(normal.y.abs()).max(normal.z.abs());
    let dominant = [2usize, 1, 0]
        .into_iter()
        .find(|&i| normal[i].abs() >= max - 1e-9)
        .unwrap_or(2);
    if normal[dominant] < 0.0 {
        -normal
    } else {
        normal
    }
}

fn snap_coefficients(normal: Vector3, d: f64, tolerance: f64) -> (Vector3, f64) {
    let mut snapped = normal;
    let mut updated = false;
    for i in 0..3 {
        if snapped[i].abs() < tolerance {
            snapped[i] = 0.0;
            updated = true;
        }
    }
    if !updated {
        return (normal, d);
    }
    let len = snapped.norm();
    (snapped / len, d / len)
}
