use crate::math::distance_3d::point_triangle_distance_squared;
use crate::math::predicates::{FilteredPredicates, Orientation, Predicates};
use crate::math::{Point3, Vector3};
use crate::mesh::TriangleMesh;

use super::Aabb;

/// Classification of a point relative to a closed mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClassification {
    Inside,
    Outside,
    OnBoundary,
}

/// Ray-casting point classifier over a closed triangle mesh.
///
/// A segment is cast from the query point far past the mesh and its
/// crossings with the triangles are counted: odd means inside. Crossing
/// tests use orientation predicates only. When a ray grazes an edge or a
/// vertex, or runs within a triangle's plane, the next direction is tried.
pub struct PointClassifier<'a, P: Predicates = FilteredPredicates> {
    mesh: &'a TriangleMesh,
    bounds: Option<Aabb>,
    boundary_tolerance: f64,
    predicates: P,
}

/// Ray directions, chosen off the coordinate axes and planes so that
/// axis-aligned building geometry is rarely grazed.
const DIRECTIONS: [[f64; 3]; 5] = [
    [0.573_576_4, 0.210_843_2, 0.791_619_9],
    [-0.317_310_5, 0.894_427_1, 0.315_487_9],
    [0.661_437_8, -0.531_004_2, -0.529_150_3],
    [-0.812_403_8, -0.376_587_1, 0.445_435_9],
    [0.127_183_2, -0.951_337_8, 0.280_621_6],
];

impl<'a> PointClassifier<'a> {
    /// Creates a classifier with the default predicates.
    #[must_use]
    pub fn new(mesh: &'a TriangleMesh) -> Self {
        Self::with_predicates(mesh, FilteredPredicates)
    }
}

impl<'a, P: Predicates> PointClassifier<'a, P> {
    /// Creates a classifier with custom predicates.
    #[must_use]
    pub fn with_predicates(mesh: &'a TriangleMesh, predicates: P) -> Self {
        let bounds = mesh.bounds();
        let scale = bounds.map_or(1.0, |b| b.diagonal().max(1.0));
        Self {
            mesh,
            bounds,
            boundary_tolerance: 1e-9 * scale,
            predicates,
        }
    }

    /// Classifies `point` against the mesh.
    ///
    /// An empty mesh classifies everything as outside, and so does a point
    /// for which every ray direction is degenerate.
    #[must_use]
    pub fn classify(&self, point: &Point3) -> PointClassification {
        let Some(bounds) = self.bounds else {
            return PointClassification::Outside;
        };
        if !bounds.expanded(self.boundary_tolerance).contains(point) {
            return PointClassification::Outside;
        }

        let tol_sq = self.boundary_tolerance * self.boundary_tolerance;
        if self
            .mesh
            .iter_corners()
            .any(|[a, b, c]| point_triangle_distance_squared(point, &a, &b, &c) <= tol_sq)
        {
            return PointClassification::OnBoundary;
        }

        let reach = 2.0 * (bounds.diagonal() + (point - bounds.center()).norm()) + 1.0;
        for dir in &DIRECTIONS {
            let far = point + Vector3::new(dir[0], dir[1], dir[2]) * reach;
            if let Some(crossings) = self.count_crossings(point, &far) {
                return if crossings % 2 == 1 {
                    PointClassification::Inside
                } else {
                    PointClassification::Outside
                };
            }
        }
        PointClassification::Outside
    }

    /// Crossings of the segment `from -> to` with the mesh, or `None` when
    /// the segment touches an edge, a vertex or a triangle's plane.
    fn count_crossings(&self, from: &Point3, to: &Point3) -> Option<usize> {
        let pr = &self.predicates;
        let mut crossings = 0;
        for [a, b, c] in self.mesh.iter_corners() {
            let side_from = pr.orient3d(&a, &b, &c, from);
            let side_to = pr.orient3d(&a, &b, &c, to);
            if side_to == Orientation::Degenerate {
                return None;
            }
            // `from` is off the triangle, so touching its plane there is a miss.
            if side_from == Orientation::Degenerate || side_from == side_to {
                continue;
            }

            let edges = [
                pr.orient3d(from, to, &a, &b),
                pr.orient3d(from, to, &b, &c),
                pr.orient3d(from, to, &c, &a),
            ];
            let positive = edges.iter().filter(|&&o| o == Orientation::Positive).count();
            let negative = edges.iter().filter(|&&o| o == Orientation::Negative).count();
            if positive > 0 && negative > 0 {
                continue;
            }
            if positive + negative < 3 {
                return None;
            }
            crossings += 1;
        }
        Some(crossings)
    }
}

/// Classifies `point` against `mesh` with the default predicates.
#[must_use]
pub fn classify_point(point: &Point3, mesh: &TriangleMesh) -> PointClassification {
    PointClassifier::new(mesh).classify(point)
}
