use super::{Point3, Vector3};

/// Area of the triangle `a, b, c`.
#[must_use]
pub fn triangle_area(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    (b - a).cross(&(c - a)).norm() * 0.5
}

/// Unnormalized normal `(b - a) x (c - a)` of the triangle `a, b, c`.
#[must_use]
pub fn triangle_normal(a: &Point3, b: &Point3, c: &Point3) -> Vector3 {
    (b - a).cross(&(c - a))
}

/// Signed volume of the tetrahedron `(apex, a, b, c)`.
///
/// Positive when `apex` lies below the triangle, i.e. on the side opposite
/// its winding normal.
#[must_use]
pub fn signed_tetra_volume(apex: &Point3, a: &Point3, b: &Point3, c: &Point3) -> f64 {
    let da = a - apex;
    let db = b - apex;
    let dc = c - apex;
    da.dot(&db.cross(&dc)) / 6.0
}

/// Closest point to `p` on the triangle `a, b, c`.
///
/// Voronoi-region walk over the triangle's vertices, edges and face.
#[must_use]
pub fn closest_point_on_triangle(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> Point3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = va + vb + vc;
    if denom.abs() < f64::MIN_POSITIVE {
        // Degenerate triangle: all regions collapsed onto a segment.
        return *a;
    }
    let v = vb / denom;
    let w = vc / denom;
    a + ab * v + ac * w
}

/// Squared distance from `p` to the triangle `a, b, c`.
#[must_use]
pub fn point_triangle_distance_squared(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> f64 {
    (closest_point_on_triangle(p, a, b, c) - p).norm_squared()
}
