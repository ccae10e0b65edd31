//! Monte Carlo point sampling on and inside a solid.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::math::distance_3d::triangle_area;
use crate::math::Point3;
use crate::mesh::TriangleMesh;
use crate::operations::query::{Aabb, PointClassification, PointClassifier};

/// Parameters for [`SampleGenerator`].
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    /// Surface samples per unit area.
    pub surface_density: f64,
    /// Interior samples per unit volume.
    pub volume_density: f64,
    /// Lower bound on the surface sample count of a non-empty surface.
    pub min_surface_samples: usize,
    /// Lower bound on the interior target of a non-empty solid.
    pub min_volume_samples: usize,
    /// Upper bound on the interior target.
    pub max_volume_samples: usize,
    /// Rejection sampling gives up after this many candidates.
    pub max_attempts: usize,
    /// Whether the boundary vertices join the surface samples.
    pub include_vertices: bool,
    /// Interior samples used for the mean pairwise distance.
    pub cohesion_samples: usize,
    /// Fixed seed for reproducible samples; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            surface_density: 1.0,
            volume_density: 1.0,
            min_surface_samples: 500,
            min_volume_samples: 500,
            max_volume_samples: 20_000,
            max_attempts: 500_000,
            include_vertices: true,
            cohesion_samples: 1_000,
            seed: None,
        }
    }
}

impl SamplingParams {
    /// Sets the surface density.
    #[must_use]
    pub fn with_surface_density(mut self, surface_density: f64) -> Self {
        self.surface_density = surface_density;
        self
    }

    /// Sets the interior density.
    #[must_use]
    pub fn with_volume_density(mut self, volume_density: f64) -> Self {
        self.volume_density = volume_density;
        self
    }

    /// Sets the sample count floors.
    #[must_use]
    pub fn with_min_samples(mut self, surface: usize, volume: usize) -> Self {
        self.min_surface_samples = surface;
        self.min_volume_samples = volume;
        self
    }

    /// Sets the interior sample cap.
    #[must_use]
    pub fn with_max_volume_samples(mut self, max_volume_samples: usize) -> Self {
        self.max_volume_samples = max_volume_samples;
        self
    }

    /// Sets the rejection sampling budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Includes or excludes the boundary vertices from surface samples.
    #[must_use]
    pub fn with_include_vertices(mut self, include_vertices: bool) -> Self {
        self.include_vertices = include_vertices;
        self
    }

    /// Sets the cohesion subsample size.
    #[must_use]
    pub fn with_cohesion_samples(mut self, cohesion_samples: usize) -> Self {
        self.cohesion_samples = cohesion_samples;
        self
    }

    /// Fixes the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Random point generator owning its random source.
pub struct SampleGenerator {
    rng: StdRng,
    params: SamplingParams,
}

impl SampleGenerator {
    /// Creates a generator, seeded from `params.seed` when present.
    #[must_use]
    pub fn new(params: SamplingParams) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, params }
    }

    /// Uniform samples over the triangles of `mesh`, followed by `vertices`
    /// when `include_vertices` is set.
    ///
    /// The sample count is `ceil(area * surface_density)`, raised to
    /// `min_surface_samples`. Triangles are picked through the cumulative
    /// area distribution.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn surface_samples(&mut self, mesh: &TriangleMesh, vertices: &[Point3]) -> Vec<Point3> {
        let mut cumulative = Vec::with_capacity(mesh.triangle_count());
        let mut total = 0.0;
        for [a, b, c] in mesh.iter_corners() {
            total += triangle_area(&a, &b, &c);
            cumulative.push(total);
        }

        let mut samples = Vec::new();
        if total > 0.0 && total.is_finite() {
            let count = ((total * self.params.surface_density).ceil() as usize)
                .max(self.params.min_surface_samples);
            samples.reserve(count + vertices.len());
            for _ in 0..count {
                let target = self.rng.gen::<f64>() * total;
                let tri = cumulative
                    .partition_point(|&c| c <= target)
                    .min(cumulative.len() - 1);
                let [a, b, c] = mesh.corners(tri);
                samples.push(self.point_in_triangle(&a, &b, &c));
            }
        }
        if self.params.include_vertices {
            samples.extend_from_slice(vertices);
        }
        debug!(samples = samples.len(), area = total, "sampled surface");
        samples
    }

    fn point_in_triangle(&mut self, a: &Point3, b: &Point3, c: &Point3) -> Point3 {
        let r1 = self.rng.gen::<f64>().sqrt();
        let r2 = self.rng.gen::<f64>();
        Point3::from(a.coords * (1.0 - r1) + b.coords * (r1 * (1.0 - r2)) + c.coords * (r1 * r2))
    }

    /// Rejection samples strictly inside `containment`, drawn uniformly
    /// from `bounds`.
    ///
    /// Stops at `ceil(volume * volume_density)` accepted points, clamped to
    /// `[min_volume_samples, max_volume_samples]`, or when `max_attempts`
    /// candidates have been drawn.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn volume_samples(
        &mut self,
        bounds: &Aabb,
        containment: &TriangleMesh,
        volume: f64,
    ) -> Vec<Point3> {
        if !(volume > 0.0 && volume.is_finite()) || containment.is_empty() {
            return Vec::new();
        }
        let target = ((volume * self.params.volume_density).ceil() as usize)
            .max(self.params.min_volume_samples)
            .min(self.params.max_volume_samples);

        let classifier = PointClassifier::new(containment);
        let mut samples = Vec::with_capacity(target);
        let mut attempts = 0;
        while samples.len() < target && attempts < self.params.max_attempts {
            attempts += 1;
            let candidate = Point3::new(
                self.uniform(bounds.min.x, bounds.max.x),
                self.uniform(bounds.min.y, bounds.max.y),
                self.uniform(bounds.min.z, bounds.max.z),
            );
            if classifier.classify(&candidate) == PointClassification::Inside {
                samples.push(candidate);
            }
        }

        if samples.len() < target {
            warn!(
                accepted = samples.len(),
                target, attempts, "interior sampling ran out of attempts"
            );
        } else {
            debug!(samples = samples.len(), attempts, "sampled interior");
        }
        samples
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }

    /// Up to `cohesion_samples` points picked from `points` without
    /// replacement.
    pub fn subsample(&mut self, points: &[Point3]) -> Vec<Point3> {
        let n = self.params.cohesion_samples;
        if points.len() <= n {
            return points.to_vec();
        }
        rand::seq::index::sample(&mut self.rng, points.len(), n)
            .into_iter()
            .map(|i| points[i])
            .collect()
    }
}
