use crate::math::distance_3d::point_triangle_distance_squared;
use crate::math::Point3;
use crate::mesh::TriangleMesh;

/// Euclidean distance from `p` to the triangle `a, b, c`.
#[must_use]
pub fn point_triangle_distance(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> f64 {
    point_triangle_distance_squared(p, a, b, c).sqrt()
}

/// Distance from `p` to the nearest triangle of `mesh`.
///
/// Infinite for an empty mesh.
#[must_use]
pub fn distance_to_mesh(p: &Point3, mesh: &TriangleMesh) -> f64 {
    mesh.iter_corners()
        .map(|[a, b, c]| point_triangle_distance_squared(p, &a, &b, &c))
        .fold(f64::INFINITY, f64::min)
        .sqrt()
}
