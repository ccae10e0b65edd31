//! Indexed triangle meshes and the solid assembly pipeline built on them:
//! soup repair, consistent winding, hole patching and the voxel wrap used
//! as a closed fallback for containment tests.

mod adjacency;
mod holes;
mod repair;
mod solid;
mod winding;
mod wrap;

pub use adjacency::MeshAdjacency;
pub use holes::{detect_holes, fill_holes, BoundaryLoop, HoleFillParams, HoleFillReport};
pub use repair::{repair_soup, RepairParams, RepairReport};
pub use solid::{BuildReport, MeshSelector, Solid, SolidBuilder, SolidParams};
pub use winding::orient_outward;
pub use wrap::{wrap_mesh, WrapParams};

use crate::math::distance_3d::{signed_tetra_volume, triangle_area};
use crate::math::Point3;
use crate::operations::query::Aabb;

/// An indexed triangle mesh owning its vertex buffer.
///
/// Every index of [`triangles`](Self::triangles) addresses
/// [`points`](Self::points); constructors that accept foreign index data
/// drop the triangles that violate this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub points: Vec<Point3>,
    /// Triangles as index triples, wound counter-clockwise seen from outside.
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Creates a mesh, dropping triangles that reference missing points.
    #[must_use]
    pub fn new(points: Vec<Point3>, mut triangles: Vec<[u32; 3]>) -> Self {
        let len = points.len();
        triangles.retain(|t| t.iter().all(|&i| (i as usize) < len));
        Self { points, triangles }
    }

    /// Whether the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Corner positions of triangle `i`.
    #[must_use]
    pub fn corners(&self, i: usize) -> [Point3; 3] {
        let [a, b, c] = self.triangles[i];
        [
            self.points[a as usize],
            self.points[b as usize],
            self.points[c as usize],
        ]
    }

    /// Iterates the corner positions of every triangle.
    pub fn iter_corners(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        (0..self.triangles.len()).map(|i| self.corners(i))
    }

    /// Total surface area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.iter_corners()
            .map(|[a, b, c]| triangle_area(&a, &b, &c))
            .sum()
    }

    /// Sum of the signed tetrahedra spanned by `apex` and every triangle.
    ///
    /// For a closed mesh the sum does not depend on `apex` and is positive
    /// when the triangles face outward.
    #[must_use]
    pub fn signed_volume(&self, apex: &Point3) -> f64 {
        self.iter_corners()
            .map(|[a, b, c]| signed_tetra_volume(apex, &a, &b, &c))
            .sum()
    }

    /// Enclosed volume, measured against the origin and made non-negative.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume(&Point3::origin()).abs()
    }

    /// Bounding box of the referenced vertices, or `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(
            self.triangles
                .iter()
                .flatten()
                .map(|&i| &self.points[i as usize]),
        )
    }

    /// Edge-to-face adjacency of the mesh.
    #[must_use]
    pub fn adjacency(&self) -> MeshAdjacency {
        MeshAdjacency::build(&self.triangles)
    }

    /// Whether every edge is shared by at least two triangles.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.is_empty() && self.adjacency().is_closed()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::TriangleMesh;
    use crate::math::Point3;

    /// Axis-aligned box `[0, x] × [0, y] × [0, z]`, outward wound.
    pub fn box_mesh(x: f64, y: f64, z: f64) -> TriangleMesh {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(x, 0.0, 0.0),
            Point3::new(x, y, 0.0),
            Point3::new(0.0, y, 0.0),
            Point3::new(0.0, 0.0, z),
            Point3::new(x, 0.0, z),
            Point3::new(x, y, z),
            Point3::new(0.0, y, z),
        ];
        let triangles = vec![
            [0, 3, 2],
            [0, 2, 1],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [1, 2, 6],
            [1, 6, 5],
            [2, 3, 7],
            [2, 7, 6],
            [3, 0, 4],
            [3, 4, 7],
        ];
        TriangleMesh::new(points, triangles)
    }

    /// The unit box with its top face removed.
    pub fn open_box() -> TriangleMesh {
        let mut mesh = box_mesh(1.0, 1.0, 1.0);
        mesh.triangles.drain(2..4);
        mesh
    }
}
