//! Hole detection and patching.
//!
//! Each boundary cycle is patched by ear clipping in the cycle's best-fit
//! plane. Oversized patch triangles are refined by centroid insertion and
//! the inserted vertices are faired with an umbrella operator while the
//! cycle itself stays fixed.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use super::adjacency::edge_direction;
use super::TriangleMesh;
use crate::math::distance_3d::triangle_area;
use crate::math::plane::Plane;
use crate::math::polygon_2d::signed_area_2d;
use crate::math::predicates::{FilteredPredicates, Orientation, Predicates};
use crate::math::{Point2, Point3, Vector3};

/// Parameters for [`fill_holes`].
#[derive(Debug, Clone, Copy)]
pub struct HoleFillParams {
    /// Whether open meshes are patched at all.
    pub enabled: bool,
    /// Cycles with more edges than this are left open.
    pub max_boundary_edges: usize,
    /// Whether large patch triangles are subdivided.
    pub refine: bool,
    /// Umbrella smoothing passes over inserted vertices.
    pub fairing_iterations: usize,
}

impl Default for HoleFillParams {
    fn default() -> Self {
        Self {
            enabled: true,
            max_boundary_edges: 10_000,
            refine: true,
            fairing_iterations: 20,
        }
    }
}

impl HoleFillParams {
    /// Enables or disables hole filling.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the largest cycle that is patched.
    #[must_use]
    pub fn with_max_boundary_edges(mut self, max_boundary_edges: usize) -> Self {
        self.max_boundary_edges = max_boundary_edges;
        self
    }

    /// Enables or disables refinement.
    #[must_use]
    pub fn with_refine(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }

    /// Sets the number of fairing passes.
    #[must_use]
    pub fn with_fairing_iterations(mut self, fairing_iterations: usize) -> Self {
        self.fairing_iterations = fairing_iterations;
        self
    }
}

/// A closed cycle of boundary edges, following the winding of the faces
/// that own them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryLoop {
    pub vertices: Vec<u32>,
}

impl BoundaryLoop {
    /// Number of edges (and vertices) in the loop.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Per-cycle outcome of [`fill_holes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoleFillReport {
    /// Boundary cycles found.
    pub holes: usize,
    /// Cycles patched.
    pub filled: usize,
    /// Cycles left open, with their edge counts.
    pub failed: Vec<usize>,
    /// Boundary edges that could not be chained into a cycle.
    pub dangling_edges: usize,
    pub added_triangles: usize,
    pub added_points: usize,
}

/// Traces the boundary cycles of a consistently wound mesh.
///
/// Returns the cycles and the number of boundary edges left over.
#[must_use]
pub fn detect_holes(mesh: &TriangleMesh) -> (Vec<BoundaryLoop>, usize) {
    let adjacency = mesh.adjacency();

    // Directed boundary edges, in the direction their face runs them.
    let mut outgoing: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    let mut total = 0;
    for ((a, b), faces) in &adjacency.edge_to_faces {
        if faces.len() != 1 {
            continue;
        }
        let tri = &mesh.triangles[faces[0] as usize];
        let (from, to) = match edge_direction(tri, *a, *b) {
            Some(true) => (*a, *b),
            _ => (*b, *a),
        };
        outgoing.entry(from).or_default().push(to);
        total += 1;
    }
    for targets in outgoing.values_mut() {
        targets.sort_unstable();
    }

    let mut used: HashSet<(u32, u32)> = HashSet::new();
    let mut loops = Vec::new();
    let starts: Vec<(u32, u32)> = outgoing
        .iter()
        .flat_map(|(&from, targets)| targets.iter().map(move |&to| (from, to)))
        .collect();

    for (start, first) in starts {
        if used.contains(&(start, first)) {
            continue;
        }
        used.insert((start, first));
        let mut vertices = vec![start];
        let mut current = first;
        let mut closed = false;
        while let Some(next) = outgoing
            .get(&current)
            .and_then(|ts| ts.iter().copied().find(|&t| !used.contains(&(current, t))))
        {
            vertices.push(current);
            used.insert((current, next));
            if next == start {
                closed = true;
                break;
            }
            current = next;
        }
        if closed && vertices.len() >= 3 {
            loops.push(BoundaryLoop { vertices });
        } else {
            warn!(start, edges = vertices.len(), "boundary chain does not close");
        }
    }

    let chained: usize = loops.iter().map(BoundaryLoop::edge_count).sum();
    (loops, total - chained)
}

/// Patches every boundary cycle of `mesh` in place.
pub fn fill_holes(mesh: &mut TriangleMesh, params: &HoleFillParams) -> HoleFillReport {
    let (loops, dangling_edges) = detect_holes(mesh);
    let mut report = HoleFillReport {
        holes: loops.len(),
        dangling_edges,
        ..HoleFillReport::default()
    };

    for boundary in &loops {
        if boundary.edge_count() > params.max_boundary_edges {
            warn!(edges = boundary.edge_count(), "hole too large to patch");
            report.failed.push(boundary.edge_count());
            continue;
        }
        let points_before = mesh.points.len();
        let patch = patch_hole(mesh, boundary, params);
        if patch.is_empty() {
            warn!(edges = boundary.edge_count(), "hole could not be patched");
            report.failed.push(boundary.edge_count());
            continue;
        }
        report.filled += 1;
        report.added_triangles += patch.len();
        report.added_points += mesh.points.len() - points_before;
        mesh.triangles.extend(patch);
    }

    debug!(?report, "filled holes");
    report
}

/// Builds the patch for one cycle, appending any inserted vertices to
/// `mesh.points`. Returned triangles run each cycle edge opposite to the
/// face that owns it.
fn patch_hole(
    mesh: &mut TriangleMesh,
    boundary: &BoundaryLoop,
    params: &HoleFillParams,
) -> Vec<[u32; 3]> {
    let mut polygon = boundary.vertices.clone();
    polygon.reverse();

    let mut triangles = ear_clip(&mesh.points, &polygon);
    if triangles.is_empty() || !params.refine {
        return triangles;
    }

    let first_inserted = mesh.points.len();
    let mean_edge = mean_edge_length(&mesh.points, &polygon);
    refine(&mut mesh.points, &mut triangles, mean_edge);
    fair(&mut mesh.points, &triangles, first_inserted, params.fairing_iterations);
    triangles
}

/// Ear clipping of `polygon` (global indices) projected onto its best-fit
/// plane. Falls back to a fan over the remaining vertices when no ear can
/// be found.
fn ear_clip(points: &[Point3], polygon: &[u32]) -> Vec<[u32; 3]> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    let positions: Vec<Point3> = polygon.iter().map(|&i| points[i as usize]).collect();
    let plane = Plane::fit(&positions);
    let projected: Vec<Point2> = positions.iter().map(|p| plane.to_2d(p)).collect();

    let area = signed_area_2d(&projected);
    let winding = if area > 0.0 {
        Orientation::Positive
    } else if area < 0.0 {
        Orientation::Negative
    } else {
        return fan(polygon, &(0..polygon.len()).collect::<Vec<_>>());
    };

    let predicates = FilteredPredicates;
    let mut remaining: Vec<usize> = (0..polygon.len()).collect();
    let mut triangles = Vec::with_capacity(polygon.len() - 2);

    while remaining.len() > 3 {
        let n = remaining.len();
        let corners = |i: usize| (remaining[(i + n - 1) % n], remaining[i], remaining[(i + 1) % n]);
        let ear = (0..n).find(|&i| {
            let (prev, curr, next) = corners(i);
            is_ear(&predicates, &projected, winding, prev, curr, next, &remaining)
        });
        let Some(i) = ear else {
            triangles.extend(fan(polygon, &remaining));
            return triangles;
        };
        let (prev, curr, next) = corners(i);
        triangles.push([polygon[prev], polygon[curr], polygon[next]]);
        remaining.remove(i);
    }
    triangles.push([
        polygon[remaining[0]],
        polygon[remaining[1]],
        polygon[remaining[2]],
    ]);
    triangles
}

fn is_ear(
    predicates: &impl Predicates,
    projected: &[Point2],
    winding: Orientation,
    prev: usize,
    curr: usize,
    next: usize,
    remaining: &[usize],
) -> bool {
    let (a, b, c) = (&projected[prev], &projected[curr], &projected[next]);
    if predicates.orient2d(a, b, c) != winding {
        return false;
    }
    remaining.iter().all(|&k| {
        if k == prev || k == curr || k == next {
            return true;
        }
        let q = &projected[k];
        // Pinched cycles revisit a position; a copy of a corner is not inside.
        if q == a || q == b || q == c {
            return true;
        }
        let outside = |o: Orientation| o != winding;
        outside(predicates.orient2d(a, b, q))
            || outside(predicates.orient2d(b, c, q))
            || outside(predicates.orient2d(c, a, q))
    })
}

fn fan(polygon: &[u32], remaining: &[usize]) -> Vec<[u32; 3]> {
    remaining
        .windows(2)
        .skip(1)
        .map(|w| [polygon[remaining[0]], polygon[w[0]], polygon[w[1]]])
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn mean_edge_length(points: &[Point3], polygon: &[u32]) -> f64 {
    let n = polygon.len();
    let total: f64 = (0..n)
        .map(|i| {
            let a = points[polygon[i] as usize];
            let b = points[polygon[(i + 1) % n] as usize];
            (b - a).norm()
        })
        .sum();
    total / n as f64
}

/// Splits triangles much larger than an equilateral triangle of edge
/// `mean_edge` at their centroid until none is left or the round limit is
/// reached.
#[allow(clippy::cast_possible_truncation)]
fn refine(points: &mut Vec<Point3>, triangles: &mut Vec<[u32; 3]>, mean_edge: f64) {
    const MAX_ROUNDS: usize = 4;
    let limit = 2.0 * (3.0_f64.sqrt() / 4.0) * mean_edge * mean_edge;
    if limit.is_nan() || limit <= 0.0 {
        return;
    }

    for _ in 0..MAX_ROUNDS {
        let mut split = false;
        let mut next = Vec::with_capacity(triangles.len());
        for &[a, b, c] in triangles.iter() {
            let (pa, pb, pc) = (points[a as usize], points[b as usize], points[c as usize]);
            if triangle_area(&pa, &pb, &pc) <= limit {
                next.push([a, b, c]);
                continue;
            }
            let m = points.len() as u32;
            points.push(Point3::from((pa.coords + pb.coords + pc.coords) / 3.0));
            next.extend([[a, b, m], [b, c, m], [c, a, m]]);
            split = true;
        }
        *triangles = next;
        if !split {
            break;
        }
    }
}

/// Umbrella-operator smoothing of the vertices with index `>= first_free`.
/// Every other vertex is held fixed.
#[allow(clippy::cast_precision_loss)]
fn fair(points: &mut [Point3], triangles: &[[u32; 3]], first_free: usize, iterations: usize) {
    if first_free >= points.len() {
        return;
    }
    let mut neighbors: HashMap<u32, HashSet<u32>> = HashMap::new();
    for tri in triangles {
        for i in 0..3 {
            let (u, v) = (tri[i], tri[(i + 1) % 3]);
            if u as usize >= first_free {
                neighbors.entry(u).or_default().insert(v);
            }
            if v as usize >= first_free {
                neighbors.entry(v).or_default().insert(u);
            }
        }
    }
    let mut free: Vec<(u32, Vec<u32>)> = neighbors
        .into_iter()
        .map(|(v, set)| {
            let mut ring: Vec<u32> = set.into_iter().collect();
            ring.sort_unstable();
            (v, ring)
        })
        .collect();
    free.sort_unstable_by_key(|(v, _)| *v);

    for _ in 0..iterations {
        let updated: Vec<Point3> = free
            .iter()
            .map(|(_, ring)| {
                let sum = ring
                    .iter()
                    .fold(Vector3::zeros(), |acc, &n| acc + points[n as usize].coords);
                Point3::from(sum / ring.len() as f64)
            })
            .collect();
        for ((v, _), p) in free.iter().zip(updated) {
            points[*v as usize] = p;
        }
    }
}
