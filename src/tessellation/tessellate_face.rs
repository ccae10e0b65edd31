use std::collections::{BTreeMap, BTreeSet, VecDeque};

use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{
    ConstrainedDelaunayTriangulation, HasPosition, InsertionError, Point2 as SpadePoint2,
    Triangulation,
};
use tracing::{debug, warn};

use crate::error::{Result, TessellationError};
use crate::math::plane::Plane;
use crate::math::polygon_2d::{is_counterclockwise, is_simple};
use crate::math::predicates::FilteredPredicates;
use crate::math::{Point2, Point3};
use crate::topology::{check_ring, BoundaryModel, FaceId, Ring};

use super::{FaceTriangulation, TessellationParams};

/// A CDT vertex remembering which model point it came from.
#[derive(Debug, Clone, Copy)]
struct RingVertex {
    position: SpadePoint2<f64>,
    index: u32,
}

impl HasPosition for RingVertex {
    type Scalar = f64;

    fn position(&self) -> SpadePoint2<f64> {
        self.position
    }
}

type Cdt = ConstrainedDelaunayTriangulation<RingVertex>;

/// Triangulates a (possibly holed) planar face of the boundary model.
pub struct TessellateFace {
    face: FaceId,
    params: TessellationParams,
}

impl TessellateFace {
    /// Creates a new `TessellateFace` operation.
    #[must_use]
    pub fn new(face: FaceId, params: TessellationParams) -> Self {
        Self { face, params }
    }

    /// Executes the triangulation.
    ///
    /// A malformed face is not an error: it comes back with no triangles and
    /// the reason in [`FaceTriangulation::rejection`].
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist in the model.
    pub fn execute(&self, model: &BoundaryModel) -> Result<FaceTriangulation> {
        let face = model.face(self.face)?;
        let result = triangulate_rings(&face.rings, model.points(), &self.params);
        if let Some(reason) = &result.rejection {
            warn!(face = ?self.face, %reason, "face rejected");
        }
        Ok(result)
    }
}

/// Triangulates one face given as rings of indices into `points`.
///
/// The plane is fitted to the outer ring only. Every ring edge becomes a
/// constraint of a 2D constrained Delaunay triangulation in that plane, and
/// triangles at odd nesting depth are kept. Output triangles carry the
/// original point indices and follow the outer ring's winding.
///
/// Vertices and constraints are inserted in index order, so the result does
/// not depend on where a ring starts. Coincident points weld to the smallest
/// index.
#[must_use]
pub fn triangulate_rings(
    rings: &[Ring],
    points: &[Point3],
    params: &TessellationParams,
) -> FaceTriangulation {
    match try_triangulate(rings, points, params) {
        Ok(result) => result,
        Err(reason) => FaceTriangulation::rejected(reason),
    }
}

fn try_triangulate(
    rings: &[Ring],
    points: &[Point3],
    params: &TessellationParams,
) -> std::result::Result<FaceTriangulation, TessellationError> {
    let outer = rings.first().ok_or(TessellationError::MissingOuterRing)?;
    if outer.len() < 3 {
        return Err(TessellationError::TooFewVertices(outer.len()));
    }
    for ring in rings {
        check_ring(ring, points.len())?;
    }

    // Fitting over the sorted distinct indices makes the plane, and so every
    // projected coordinate, independent of where and which way the ring
    // starts.
    let fit_points: Vec<Point3> = outer
        .iter()
        .copied()
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .map(|i| points[i as usize])
        .collect();
    let plane = Plane::fit_with_tolerance(&fit_points, params.snap_tolerance);

    let outer_2d: Vec<Point2> = outer
        .iter()
        .map(|&i| plane.to_2d(&points[i as usize]))
        .collect();
    if !is_simple(&outer_2d, &FilteredPredicates) {
        return Err(TessellationError::NonSimpleOuterRing);
    }
    let reversed = !is_counterclockwise(&outer_2d);

    let mut active: Vec<&Ring> = Vec::with_capacity(rings.len());
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 && ring.len() < 3 {
            debug!(len = ring.len(), "skipping degenerate hole ring");
            continue;
        }
        active.push(ring);
    }

    let mut cdt = Cdt::new();
    let welded = insert_vertices(&mut cdt, &active, points, &plane)?;
    insert_constraints(&mut cdt, &active, &welded)?;

    let levels = nesting_levels(&cdt);
    let mut triangles = Vec::new();
    for face in cdt.inner_faces() {
        let in_domain = levels[face.fix().index()].is_some_and(|level| level % 2 == 1);
        if !in_domain {
            continue;
        }
        let [a, b, c] = face.vertices().map(|v| v.data().index);
        if reversed {
            triangles.push([a, c, b]);
        } else {
            triangles.push([a, b, c]);
        }
    }

    Ok(FaceTriangulation {
        triangles,
        reversed,
        rejection: None,
    })
}

/// Inserts every ring vertex into the CDT in ascending index order.
///
/// Points landing on an existing vertex are welded to it, so the smallest
/// index among coincident points survives. Returns the surviving index of
/// every ring index, and its vertex handle.
fn insert_vertices(
    cdt: &mut Cdt,
    rings: &[&Ring],
    points: &[Point3],
    plane: &Plane,
) -> std::result::Result<BTreeMap<u32, (u32, FixedVertexHandle)>, TessellationError> {
    let indices: BTreeSet<u32> = rings.iter().flat_map(|r| r.iter().copied()).collect();
    let mut welded = BTreeMap::new();
    for index in indices {
        let p = plane.to_2d(&points[index as usize]);
        let position = SpadePoint2::new(p.x, p.y);
        let entry = match cdt.locate_vertex(position) {
            Some(existing) => (existing.data().index, existing.fix()),
            None => {
                let handle = cdt
                    .insert(RingVertex { position, index })
                    .map_err(|e: InsertionError| TessellationError::Insertion(format!("{e:?}")))?;
                (index, handle)
            }
        };
        welded.insert(index, entry);
    }
    Ok(welded)
}

/// Adds every ring edge as a constraint.
///
/// Edges are deduplicated over welded indices and added in sorted order, so
/// the triangulation does not depend on where or which way a ring starts.
fn insert_constraints(
    cdt: &mut Cdt,
    rings: &[&Ring],
    welded: &BTreeMap<u32, (u32, FixedVertexHandle)>,
) -> std::result::Result<(), TessellationError> {
    let mut edges: BTreeMap<(u32, u32), (FixedVertexHandle, FixedVertexHandle)> = BTreeMap::new();
    for ring in rings {
        for (i, &a) in ring.iter().enumerate() {
            let b = ring[(i + 1) % ring.len()];
            let (Some(&(ia, ha)), Some(&(ib, hb))) = (welded.get(&a), welded.get(&b)) else {
                continue;
            };
            if ia == ib {
                continue;
            }
            let key = if ia < ib { (ia, ib) } else { (ib, ia) };
            let handles = if ia < ib { (ha, hb) } else { (hb, ha) };
            edges.insert(key, handles);
        }
    }

    for ((from, to), (ha, hb)) in edges {
        if !cdt.can_add_constraint(ha, hb) {
            return Err(TessellationError::CrossingConstraint { from, to });
        }
        cdt.add_constraint(ha, hb);
    }
    Ok(())
}

/// Assigns a nesting level to every inner face of the CDT.
///
/// The level of a face is the least number of constraint edges crossed to
/// reach it from the unbounded face. Regions joined by unconstrained edges
/// share a level, so the walk is a 0-1 breadth-first search: same-level
/// neighbours go to the front of the work queue, next-level neighbours to the
/// back. The result is indexed by fixed face index; unreachable faces stay
/// `None`.
fn nesting_levels(cdt: &Cdt) -> Vec<Option<u32>> {
    let mut levels: Vec<Option<u32>> = vec![None; cdt.num_all_faces()];
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    // Seed: inner faces adjacent to the outer face
    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let level = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            relax(&mut levels, &mut queue, inner.fix(), level, level > 0);
        }
    }

    while let Some((face_fix, level)) = queue.pop_front() {
        if levels[face_fix.index()] != Some(level) {
            // Stale entry, the face was reached at a lower level since.
            continue;
        }
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let crosses = cdt.is_constraint_edge(edge.as_undirected().fix());
            let next = level + u32::from(crosses);
            relax(&mut levels, &mut queue, neighbor.fix(), next, crosses);
        }
    }

    levels
}

fn relax(
    levels: &mut [Option<u32>],
    queue: &mut VecDeque<(FixedFaceHandle<InnerTag>, u32)>,
    face: FixedFaceHandle<InnerTag>,
    level: u32,
    crosses: bool,
) {
    let idx = face.index();
    if levels[idx].is_some_and(|known| known <= level) {
        return;
    }
    levels[idx] = Some(level);
    if crosses {
        queue.push_back((face, level));
    } else {
        queue.push_front((face, level));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::distance_3d::{triangle_area, triangle_normal};
    use crate::math::Vector3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn triangulate(rings: &[Ring], points: &[Point3]) -> FaceTriangulation {
        triangulate_rings(rings, points, &TessellationParams::default())
    }

    fn area(result: &FaceTriangulation, points: &[Point3]) -> f64 {
        result
            .triangles
            .iter()
            .map(|t| {
                triangle_area(
                    &points[t[0] as usize],
                    &points[t[1] as usize],
                    &points[t[2] as usize],
                )
            })
            .sum()
    }

    /// Triangles with their cyclic order kept, starting at the smallest index.
    fn canonical(triangles: &[[u32; 3]]) -> Vec<[u32; 3]> {
        let mut out: Vec<[u32; 3]> = triangles
            .iter()
            .map(|t| {
                let k = (0..3).min_by_key(|&i| t[i]).unwrap();
                [t[k], t[(k + 1) % 3], t[(k + 2) % 3]]
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Triangles as unordered vertex sets.
    fn unordered(triangles: &[[u32; 3]]) -> Vec<[u32; 3]> {
        let mut out: Vec<[u32; 3]> = triangles
            .iter()
            .map(|t| {
                let mut s = *t;
                s.sort_unstable();
                s
            })
            .collect();
        out.sort_unstable();
        out
    }

    fn irregular_points() -> Vec<Point3> {
        vec![
            p(0.0, 0.0, 1.0),
            p(6.0, 0.4, 1.0),
            p(6.3, 5.1, 1.0),
            p(3.1, 2.2, 1.0),
            p(0.2, 5.7, 1.0),
        ]
    }

    #[test]
    fn triangle_produces_one_triangle() {
        let pts = vec![p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(2.0, 3.0, 0.0)];
        let result = triangulate(&[vec![0, 1, 2]], &pts);
        assert!(!result.is_rejected());
        assert_eq!(result.triangles.len(), 1);
        assert!(!result.reversed);
    }

    #[test]
    fn square_with_hole_excludes_hole() {
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(10.0, 0.0, 0.0),
            p(10.0, 10.0, 0.0),
            p(0.0, 10.0, 0.0),
            p(3.0, 3.0, 0.0),
            p(3.0, 7.0, 0.0),
            p(7.0, 7.0, 0.0),
            p(7.0, 3.0, 0.0),
        ];
        let result = triangulate(&[vec![0, 1, 2, 3], vec![4, 5, 6, 7]], &pts);
        assert!(!result.is_rejected());
        let total = area(&result, &pts);
        assert!((total - 84.0).abs() < 1e-9, "expected 84, got {total}");
        for t in &result.triangles {
            let c = (pts[t[0] as usize].coords + pts[t[1] as usize].coords + pts[t[2] as usize].coords)
                / 3.0;
            let in_hole = c.x > 3.0 && c.x < 7.0 && c.y > 3.0 && c.y < 7.0;
            assert!(!in_hole, "triangle {t:?} lies in the hole");
        }
    }

    #[test]
    fn ring_rotation_gives_same_triangles() {
        let pts = irregular_points();
        let a = triangulate(&[vec![0, 1, 2, 3, 4]], &pts);
        let b = triangulate(&[vec![2, 3, 4, 0, 1]], &pts);
        assert_eq!(a.triangles.len(), 3);
        assert_eq!(canonical(&a.triangles), canonical(&b.triangles));
        assert_eq!(a.reversed, b.reversed);
    }

    fn rotated(ring: &[u32], start: usize) -> Ring {
        ring.iter().cycle().skip(start).take(ring.len()).copied().collect()
    }

    /// Triangulates `ring` from every start vertex and checks the triangles
    /// never change.
    fn assert_start_invariant(ring: &[u32], points: &[Point3], expected: usize) {
        let first = triangulate(&[ring.to_vec()], points);
        assert_eq!(first.triangles.len(), expected);
        for start in 1..ring.len() {
            let other = triangulate(&[rotated(ring, start)], points);
            assert_eq!(canonical(&first.triangles), canonical(&other.triangles), "start {start}");
            assert_eq!(first.reversed, other.reversed);
        }
    }

    #[test]
    fn square_is_independent_of_ring_start() {
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ];
        assert_start_invariant(&[0, 1, 2, 3], &pts, 2);
        assert_start_invariant(&[3, 2, 1, 0], &pts, 2);

        let forward = triangulate(&[vec![0, 1, 2, 3]], &pts);
        let backward = triangulate(&[vec![2, 1, 0, 3]], &pts);
        assert_eq!(unordered(&forward.triangles), unordered(&backward.triangles));
    }

    #[test]
    fn wall_is_independent_of_ring_start() {
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(4.0, 0.0, 0.0),
            p(4.0, 0.0, 3.0),
            p(0.0, 0.0, 3.0),
        ];
        assert_start_invariant(&[0, 1, 2, 3], &pts, 2);
        let result = triangulate(&[vec![2, 3, 0, 1]], &pts);
        assert!((area(&result, &pts) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn rectangle_with_hole_is_independent_of_ring_starts() {
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(10.0, 0.0, 0.0),
            p(10.0, 6.0, 0.0),
            p(0.0, 6.0, 0.0),
            p(3.0, 2.0, 0.0),
            p(7.0, 2.0, 0.0),
            p(7.0, 4.0, 0.0),
            p(3.0, 4.0, 0.0),
        ];
        let outer = [0, 1, 2, 3];
        let hole = [7, 6, 5, 4];
        let first = triangulate(&[outer.to_vec(), hole.to_vec()], &pts);
        assert!(!first.is_rejected());
        assert!((area(&first, &pts) - 52.0).abs() < 1e-9);
        for outer_start in 0..outer.len() {
            for hole_start in 0..hole.len() {
                let rings = [rotated(&outer, outer_start), rotated(&hole, hole_start)];
                let other = triangulate(&rings, &pts);
                assert_eq!(
                    canonical(&first.triangles),
                    canonical(&other.triangles),
                    "outer start {outer_start}, hole start {hole_start}"
                );
            }
        }
    }

    #[test]
    fn ring_reversal_only_flips_orientation() {
        let pts = irregular_points();
        let a = triangulate(&[vec![0, 1, 2, 3, 4]], &pts);
        let b = triangulate(&[vec![4, 3, 2, 1, 0]], &pts);
        assert_ne!(a.reversed, b.reversed);
        assert_eq!(unordered(&a.triangles), unordered(&b.triangles));
    }

    #[test]
    fn self_intersecting_outer_ring_is_rejected() {
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
        ];
        let result = triangulate(&[vec![0, 1, 2, 3]], &pts);
        assert!(result.triangles.is_empty());
        assert_eq!(result.rejection, Some(TessellationError::NonSimpleOuterRing));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let pts = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)];
        let result = triangulate(&[vec![0, 1, 7]], &pts);
        assert!(result.triangles.is_empty());
        assert!(matches!(
            result.rejection,
            Some(TessellationError::PointIndex(_))
        ));
    }

    #[test]
    fn missing_or_short_outer_ring_is_rejected() {
        let pts = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)];
        assert_eq!(
            triangulate(&[], &pts).rejection,
            Some(TessellationError::MissingOuterRing)
        );
        assert_eq!(
            triangulate(&[vec![0, 1]], &pts).rejection,
            Some(TessellationError::TooFewVertices(2))
        );
    }

    #[test]
    fn wall_triangles_follow_ring_winding() {
        // Ring runs +x then +z, so its normal points towards -y.
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(4.0, 0.0, 0.0),
            p(4.0, 0.0, 3.0),
            p(0.0, 0.0, 3.0),
        ];
        let result = triangulate(&[vec![0, 1, 2, 3]], &pts);
        assert_eq!(result.triangles.len(), 2);
        for t in &result.triangles {
            let n = triangle_normal(&pts[t[0] as usize], &pts[t[1] as usize], &pts[t[2] as usize]);
            assert!(n.dot(&Vector3::new(0.0, -1.0, 0.0)) > 0.0);
        }
    }

    #[test]
    fn coincident_points_weld_to_smallest_index() {
        // The hole starts at point 4, a duplicate of corner point 0.
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(8.0, 0.0, 0.0),
            p(8.0, 8.0, 0.0),
            p(0.0, 8.0, 0.0),
            p(0.0, 0.0, 0.0),
            p(4.0, 2.0, 0.0),
            p(2.0, 4.0, 0.0),
        ];
        let result = triangulate(&[vec![0, 1, 2, 3], vec![4, 5, 6]], &pts);
        assert!(!result.is_rejected());
        let indices: Vec<u32> = result.triangles.iter().flatten().copied().collect();
        assert!(!indices.contains(&4));
        assert!(indices.contains(&0));
        let total = area(&result, &pts);
        assert!((total - 58.0).abs() < 1e-9, "expected 58, got {total}");
    }

    #[test]
    fn weld_ignores_which_ring_lists_a_point_first() {
        // Point 0 duplicates the outer corner 6 and opens the hole ring.
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(4.0, 2.0, 0.0),
            p(2.0, 4.0, 0.0),
            p(8.0, 0.0, 0.0),
            p(8.0, 8.0, 0.0),
            p(0.0, 8.0, 0.0),
            p(0.0, 0.0, 0.0),
        ];
        let result = triangulate(&[vec![6, 3, 4, 5], vec![0, 1, 2]], &pts);
        assert!(!result.is_rejected());
        let indices: Vec<u32> = result.triangles.iter().flatten().copied().collect();
        assert!(indices.contains(&0));
        assert!(!indices.contains(&6));
        assert!((area(&result, &pts) - 58.0).abs() < 1e-9);
    }

    #[test]
    fn tilted_face_area_is_preserved() {
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(4.0, 0.0, 0.0),
            p(4.0, 3.0, 4.0),
            p(0.0, 3.0, 4.0),
        ];
        let result = triangulate(&[vec![0, 1, 2, 3]], &pts);
        // 4 wide, 5 along the slope
        assert!((area(&result, &pts) - 20.0).abs() < 1e-9);
    }
}
