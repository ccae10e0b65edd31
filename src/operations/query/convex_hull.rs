use std::collections::HashMap;

use chull::ConvexHullWrapper;
use tracing::debug;

use crate::math::distance_3d::{signed_tetra_volume, triangle_area};
use crate::math::{centroid, Point3};
use crate::mesh::TriangleMesh;

use super::Aabb;

/// Convex hull of a point set as an outward-wound triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct ConvexHull {
    mesh: TriangleMesh,
    volume: f64,
    area: f64,
}

impl ConvexHull {
    /// Computes the hull of `points`.
    ///
    /// Fewer than four points, or points that do not span a volume, give
    /// an empty hull with zero volume and area.
    #[must_use]
    pub fn new(points: &[Point3]) -> Self {
        if points.len() < 4 {
            return Self::default();
        }
        let input: Vec<Vec<f64>> = points.iter().map(|p| vec![p.x, p.y, p.z]).collect();
        let hull = match ConvexHullWrapper::try_new(&input, None) {
            Ok(hull) => hull,
            Err(err) => {
                debug!(?err, points = points.len(), "convex hull is degenerate");
                return Self::default();
            }
        };

        // The wrapper hands back every input point; keep the facet corners.
        let (vertices, indices) = hull.vertices_indices();
        let mut remap: HashMap<usize, u32> = HashMap::new();
        let mut hull_points = Vec::new();
        let mut corners = Vec::with_capacity(indices.len());
        for &i in &indices {
            #[allow(clippy::cast_possible_truncation)]
            let next = hull_points.len() as u32;
            let index = *remap.entry(i).or_insert_with(|| {
                let v = &vertices[i];
                hull_points.push(Point3::new(v[0], v[1], v[2]));
                next
            });
            corners.push(index);
        }
        let Some(inside) = centroid(&hull_points) else {
            return Self::default();
        };

        let mut triangles = Vec::with_capacity(corners.len() / 3);
        let mut volume = 0.0;
        let mut area = 0.0;
        for tri in corners.chunks_exact(3) {
            let [ia, ib, ic] = [tri[0], tri[1], tri[2]];
            let (a, b, c) = (
                hull_points[ia as usize],
                hull_points[ib as usize],
                hull_points[ic as usize],
            );
            let tetra = signed_tetra_volume(&inside, &a, &b, &c);
            volume += tetra.abs();
            area += triangle_area(&a, &b, &c);
            // The hull centroid must lie below every outward facet.
            triangles.push(if tetra < 0.0 { [ia, ic, ib] } else { [ia, ib, ic] });
        }

        let scale = Aabb::from_points(&hull_points).map_or(0.0, |b| b.diagonal());
        if !volume.is_finite() || volume <= 1e-12 * scale.powi(3) {
            return Self::default();
        }
        Self {
            mesh: TriangleMesh::new(hull_points, triangles),
            volume,
            area,
        }
    }

    /// Enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Surface area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// The hull surface.
    #[must_use]
    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    /// The hull's vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.mesh.points
    }

    /// Whether the hull has no volume.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube_with_interior_points() -> Vec<Point3> {
        let mut pts = Vec::new();
        for &x in &[0.0, 2.0] {
            for &y in &[0.0, 2.0] {
                for &z in &[0.0, 2.0] {
                    pts.push(p(x, y, z));
                }
            }
        }
        pts.push(p(1.0, 1.0, 1.0));
        pts.push(p(0.5, 1.5, 0.7));
        pts
    }

    #[test]
    fn hull_of_cube_points() {
        let hull = ConvexHull::new(&cube_with_interior_points());
        assert_relative_eq!(hull.volume(), 8.0, epsilon = 1e-9);
        assert_relative_eq!(hull.area(), 24.0, epsilon = 1e-9);
        assert_eq!(hull.vertices().len(), 8);
        assert!(hull.mesh().signed_volume(&p(1.0, 1.0, 1.0)) > 0.0);
    }

    #[test]
    fn hull_of_l_shape_fills_the_notch() {
        // L-shaped prism footprint: (0,0) (2,0) (2,1) (1,1) (1,2) (0,2), height 1.
        let footprint = [
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ];
        let pts: Vec<Point3> = footprint
            .iter()
            .flat_map(|&(x, y)| [p(x, y, 0.0), p(x, y, 1.0)])
            .collect();
        let hull = ConvexHull::new(&pts);
        assert_relative_eq!(hull.volume(), 3.5, epsilon = 1e-9);
    }

    #[test]
    fn flat_points_give_empty_hull() {
        let pts = [
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(1.0, 1.0, 0.0),
        ];
        let hull = ConvexHull::new(&pts);
        assert!(hull.is_empty());
        assert_eq!(hull.volume(), 0.0);
    }
}
