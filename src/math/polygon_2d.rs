use super::predicates::{Orientation, Predicates};
use super::Point2;

/// Computes the signed area of a polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Returns `true` if the closed polygon winds counter-clockwise.
#[must_use]
pub fn is_counterclockwise(points: &[Point2]) -> bool {
    signed_area_2d(points) > 0.0
}

/// Returns `true` if the closed polygon is simple: at least 3 vertices, no
/// repeated vertex, and no two edges meeting anywhere except consecutive
/// edges at their shared endpoint.
#[must_use]
pub fn is_simple(points: &[Point2], predicates: &impl Predicates) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if points[i] == points[j] {
                return false;
            }
        }
    }

    for i in 0..n {
        let a0 = &points[i];
        let a1 = &points[(i + 1) % n];
        for j in (i + 1)..n {
            let b0 = &points[j];
            let b1 = &points[(j + 1) % n];
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                // Consecutive edges may only share their common endpoint.
                let (shared, other_a, other_b) = if j == i + 1 {
                    (a1, a0, b1)
                } else {
                    (a0, a1, b0)
                };
                if folds_back(shared, other_a, other_b, predicates) {
                    return false;
                }
            } else if segments_intersect(a0, a1, b0, b1, predicates) {
                return false;
            }
        }
    }
    true
}

/// Two edges leaving `shared` towards `a` and `b` overlap when they are
/// collinear and point the same way.
fn folds_back(shared: &Point2, a: &Point2, b: &Point2, predicates: &impl Predicates) -> bool {
    if predicates.orient2d(shared, a, b) != Orientation::Degenerate {
        return false;
    }
    (a - shared).dot(&(b - shared)) > 0.0
}

/// Closed-segment intersection test, touching included.
#[must_use]
pub fn segments_intersect(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
    predicates: &impl Predicates,
) -> bool {
    let o1 = predicates.orient2d(a0, a1, b0);
    let o2 = predicates.orient2d(a0, a1, b1);
    let o3 = predicates.orient2d(b0, b1, a0);
    let o4 = predicates.orient2d(b0, b1, a1);

    if o1 != o2 && o3 != o4 && !has_degenerate(&[o1, o2, o3, o4]) {
        return true;
    }

    (o1 == Orientation::Degenerate && on_segment(a0, a1, b0))
        || (o2 == Orientation::Degenerate && on_segment(a0, a1, b1))
        || (o3 == Orientation::Degenerate && on_segment(b0, b1, a0))
        || (o4 == Orientation::Degenerate && on_segment(b0, b1, a1))
}

fn has_degenerate(orientations: &[Orientation]) -> bool {
    orientations.contains(&Orientation::Degenerate)
}

/// Whether `p`, already known collinear with `a -> b`, lies within its box.
fn on_segment(a: &Point2, b: &Point2, p: &Point2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
