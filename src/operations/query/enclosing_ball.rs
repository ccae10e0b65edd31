use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::math::predicates::{FilteredPredicates, Orientation, Predicates};
use crate::math::{Matrix3, Point3, Vector3};

const SHUFFLE_SEED: u64 = 0x5eed_ba11;

/// A sphere given by center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnclosingBall {
    pub center: Point3,
    pub radius: f64,
}

impl EnclosingBall {
    /// Smallest ball containing every point, or `None` for no points.
    ///
    /// Welzl's algorithm in its iterative move-to-front form over a
    /// shuffled copy of the input. The shuffle uses a fixed seed, so the
    /// result only depends on the points.
    #[must_use]
    pub fn new(points: &[Point3]) -> Option<Self> {
        let first = *points.first()?;
        let mut pts = points.to_vec();
        pts.shuffle(&mut StdRng::seed_from_u64(SHUFFLE_SEED));

        let mut ball = Self::point(first);
        for (i, &p) in pts.iter().enumerate() {
            if !ball.contains(&p) {
                ball = with_one(&pts[..i], p);
            }
        }
        Some(ball)
    }

    fn point(center: Point3) -> Self {
        Self {
            center,
            radius: 0.0,
        }
    }

    fn diametral(a: Point3, b: Point3) -> Self {
        Self {
            center: nalgebra::center(&a, &b),
            radius: (b - a).norm() * 0.5,
        }
    }

    /// Whether `point` is inside, with a small relative slack.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        let slack = 1e-12 * (1.0 + self.radius);
        (point - self.center).norm() <= self.radius + slack
    }
}

fn with_one(pts: &[Point3], q: Point3) -> EnclosingBall {
    let mut ball = EnclosingBall::point(q);
    for (j, &p) in pts.iter().enumerate() {
        if !ball.contains(&p) {
            ball = with_two(&pts[..j], q, p);
        }
    }
    ball
}

fn with_two(pts: &[Point3], q1: Point3, q2: Point3) -> EnclosingBall {
    let mut ball = EnclosingBall::diametral(q1, q2);
    for (k, &p) in pts.iter().enumerate() {
        if !ball.contains(&p) {
            ball = with_three(&pts[..k], q1, q2, p);
        }
    }
    ball
}

fn with_three(pts: &[Point3], q1: Point3, q2: Point3, q3: Point3) -> EnclosingBall {
    let mut ball = circumball(q1, q2, q3);
    for p in pts {
        if !ball.contains(p) {
            ball = through_four(q1, q2, q3, *p);
        }
    }
    ball
}

/// Smallest ball with `a`, `b`, `c` on its boundary. Collinear input
/// degrades to the ball over the farthest pair.
fn circumball(a: Point3, b: Point3, c: Point3) -> EnclosingBall {
    let ab = b - a;
    let ac = c - a;
    let n = ab.cross(&ac);
    let denom = 2.0 * n.norm_squared();
    if denom <= f64::EPSILON * ab.norm_squared() * ac.norm_squared() {
        return farthest_pair(&[a, b, c]);
    }
    let offset = (n.cross(&ab) * ac.norm_squared() + ac.cross(&n) * ab.norm_squared()) / denom;
    EnclosingBall {
        center: a + offset,
        radius: offset.norm(),
    }
}

/// Ball with all four points on or inside its boundary. Coplanar input
/// degrades to the smallest lower-order ball covering all four.
fn through_four(a: Point3, b: Point3, c: Point3, d: Point3) -> EnclosingBall {
    let coplanar = FilteredPredicates.orient3d(&a, &b, &c, &d) == Orientation::Degenerate;
    if !coplanar {
        let rows = [b - a, c - a, d - a];
        let m = Matrix3::from_rows(&[
            rows[0].transpose(),
            rows[1].transpose(),
            rows[2].transpose(),
        ]);
        let rhs = Vector3::new(
            rows[0].norm_squared(),
            rows[1].norm_squared(),
            rows[2].norm_squared(),
        ) * 0.5;
        if let Some(offset) = m.lu().solve(&rhs) {
            return EnclosingBall {
                center: a + offset,
                radius: offset.norm(),
            };
        }
    }
    smallest_covering(&[a, b, c, d])
}

fn farthest_pair(points: &[Point3]) -> EnclosingBall {
    let mut best = EnclosingBall::point(points[0]);
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            let ball = EnclosingBall::diametral(points[i], points[j]);
            if ball.radius > best.radius {
                best = ball;
            }
        }
    }
    best
}

fn smallest_covering(points: &[Point3; 4]) -> EnclosingBall {
    let mut candidates = Vec::with_capacity(10);
    for i in 0..4 {
        for j in i + 1..4 {
            candidates.push(EnclosingBall::diametral(points[i], points[j]));
            for k in j + 1..4 {
                candidates.push(circumball(points[i], points[j], points[k]));
            }
        }
    }
    candidates
        .into_iter()
        .filter(|ball| points.iter().all(|p| ball.contains(p)))
        .min_by(|x, y| x.radius.total_cmp(&y.radius))
        .unwrap_or_else(|| farthest_pair(points))
}
