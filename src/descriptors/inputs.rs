use std::f64::consts::PI;

use rayon::prelude::*;
use tracing::debug;

use crate::math::{centroid, Point3};
use crate::mesh::{MeshSelector, Solid};
use crate::operations::query::{distance_to_mesh, ConvexHull, EnclosingBall, OrientedBox};
use crate::sampling::SampleGenerator;

/// Every statistic the descriptor formulas draw on, computed once per solid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorInputs {
    /// Whether the solid had no triangles; every descriptor is then zero.
    pub empty: bool,
    pub area: f64,
    pub volume: f64,
    pub hull_volume: f64,
    pub obb_volume: f64,
    pub obb_area: f64,
    /// Radius of the smallest ball around the boundary vertices.
    pub ball_radius: f64,
    /// Radius of the sphere with the solid's volume.
    pub equivalent_radius: f64,
    /// Mean distance of the surface samples to their centroid.
    pub surface_mean_distance: f64,
    /// Mean of `|distance to centroid - equivalent_radius|` over the
    /// surface samples.
    pub surface_mean_deviation: f64,
    /// Mean distance of the interior samples to their centroid.
    pub volume_mean_distance: f64,
    /// Mean squared distance of the interior samples to their centroid.
    pub volume_mean_squared_distance: f64,
    /// Largest distance from an interior sample to the surface.
    pub max_surface_distance: f64,
    /// Mean distance from the interior samples to the surface.
    pub mean_surface_distance: f64,
    /// Mean distance between pairs of subsampled interior points.
    pub mean_pairwise_distance: f64,
    pub surface_samples: usize,
    pub volume_samples: usize,
}

impl DescriptorInputs {
    /// Samples `solid` and gathers its bounding primitives and statistics.
    #[must_use]
    pub fn compute(solid: &Solid, generator: &mut SampleGenerator) -> Self {
        if solid.is_empty() {
            return Self {
                empty: true,
                ..Self::default()
            };
        }

        let area = solid.area();
        let volume = solid.volume();
        let equivalent_radius = (3.0 * volume / (4.0 * PI)).cbrt();

        let boundary = solid.shell_points();
        let hull = ConvexHull::new(boundary);
        let (obb_volume, obb_area) = OrientedBox::with_hull(boundary, &hull)
            .map_or((0.0, 0.0), |obb| (obb.volume(), obb.area()));
        let ball_radius = EnclosingBall::new(boundary).map_or(0.0, |ball| ball.radius);

        let surface = solid.surface_samples(generator);
        let (surface_mean_distance, surface_mean_deviation) =
            radial_statistics(surface, equivalent_radius);

        let interior = solid.volume_samples(generator);
        let (volume_mean_distance, volume_mean_squared_distance) = spread(interior);

        let mesh = solid.mesh(MeshSelector::Original);
        let depths: Vec<f64> = interior
            .par_iter()
            .map(|q| distance_to_mesh(q, mesh))
            .collect();
        let max_surface_distance = depths.iter().copied().fold(0.0, f64::max);
        let mean_surface_distance = mean(depths.iter().copied());

        let cohesion_set = generator.subsample(interior);
        let mean_pairwise_distance = mean_pairwise(&cohesion_set);

        let inputs = Self {
            empty: false,
            area,
            volume,
            hull_volume: hull.volume(),
            obb_volume,
            obb_area,
            ball_radius,
            equivalent_radius,
            surface_mean_distance,
            surface_mean_deviation,
            volume_mean_distance,
            volume_mean_squared_distance,
            max_surface_distance,
            mean_surface_distance,
            mean_pairwise_distance,
            surface_samples: surface.len(),
            volume_samples: interior.len(),
        };
        debug!(?inputs, "descriptor inputs");
        inputs
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

/// Mean centroid distance and mean deviation of that distance from `radius`.
fn radial_statistics(points: &[Point3], radius: f64) -> (f64, f64) {
    let Some(c) = centroid(points) else {
        return (0.0, 0.0);
    };
    let distances: Vec<f64> = points.iter().map(|p| (p - c).norm()).collect();
    (
        mean(distances.iter().copied()),
        mean(distances.iter().map(|d| (d - radius).abs())),
    )
}

/// Mean and mean squared centroid distance.
fn spread(points: &[Point3]) -> (f64, f64) {
    let Some(c) = centroid(points) else {
        return (0.0, 0.0);
    };
    (
        mean(points.iter().map(|p| (p - c).norm())),
        mean(points.iter().map(|p| (p - c).norm_squared())),
    )
}

#[allow(clippy::cast_precision_loss)]
fn mean_pairwise(points: &[Point3]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    // Row sums are collected in order so the total does not depend on how
    // the work was split.
    let rows: Vec<f64> = points
        .par_iter()
        .enumerate()
        .map(|(i, p)| points[i + 1..].iter().map(|q| (p - q).norm()).sum::<f64>())
        .collect();
    rows.iter().sum::<f64>() / (n * (n - 1) / 2) as f64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn radial_statistics_of_a_ring() {
        let ring = [p(2.0, 0.0, 0.0), p(-2.0, 0.0, 0.0), p(0.0, 2.0, 0.0), p(0.0, -2.0, 0.0)];
        let (mean_distance, deviation) = radial_statistics(&ring, 1.5);
        assert_relative_eq!(mean_distance, 2.0, epsilon = 1e-12);
        assert_relative_eq!(deviation, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn spread_of_two_points() {
        let (d, d2) = spread(&[p(-1.0, 0.0, 0.0), p(1.0, 0.0, 0.0)]);
        assert_relative_eq!(d, 1.0, epsilon = 1e-12);
        assert_relative_eq!(d2, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pairwise_mean_of_a_triangle() {
        let pts = [p(0.0, 0.0, 0.0), p(3.0, 0.0, 0.0), p(0.0, 4.0, 0.0)];
        assert_relative_eq!(mean_pairwise(&pts), 4.0, epsilon = 1e-12);
        assert_eq!(mean_pairwise(&pts[..1]), 0.0);
    }

    #[test]
    fn empty_sets_give_zero() {
        assert_eq!(radial_statistics(&[], 1.0), (0.0, 0.0));
        assert_eq!(spread(&[]), (0.0, 0.0));
        assert_eq!(mean(std::iter::empty()), 0.0);
    }
}
