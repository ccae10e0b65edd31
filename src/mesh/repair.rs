//! Triangle soup repair: index validation, vertex welding, degenerate and
//! duplicate removal, compaction and orientation.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::winding::orient_outward;
use super::TriangleMesh;
use crate::math::distance_3d::triangle_area;
use crate::math::Point3;

/// Parameters for [`repair_soup`].
#[derive(Debug, Clone, Copy)]
pub struct RepairParams {
    /// Points closer than this are merged into the first of them.
    /// Zero merges only bit-identical coordinates.
    pub weld_epsilon: f64,
    /// Triangles with a smaller area are dropped.
    pub area_threshold: f64,
}

impl Default for RepairParams {
    fn default() -> Self {
        Self {
            weld_epsilon: 1e-6,
            area_threshold: 1e-12,
        }
    }
}

impl RepairParams {
    /// Sets the welding distance.
    #[must_use]
    pub fn with_weld_epsilon(mut self, weld_epsilon: f64) -> Self {
        self.weld_epsilon = weld_epsilon;
        self
    }

    /// Sets the minimum triangle area.
    #[must_use]
    pub fn with_area_threshold(mut self, area_threshold: f64) -> Self {
        self.area_threshold = area_threshold;
        self
    }
}

/// What [`repair_soup`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub invalid_triangles: usize,
    pub welded_points: usize,
    pub degenerate_triangles: usize,
    pub duplicate_triangles: usize,
    pub unreferenced_points: usize,
    pub flipped_faces: usize,
}

impl RepairReport {
    /// Whether the soup came out unchanged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Repairs a triangle soup into a compact, consistently oriented mesh.
///
/// Steps, in order:
/// 1. drop triangles with an out-of-range index;
/// 2. weld points within `weld_epsilon` (the lowest index survives with
///    its own coordinates);
/// 3. drop triangles with a repeated vertex or an area below
///    `area_threshold`;
/// 4. drop repeated triangles over the same vertex set, either winding
///    (the first one survives);
/// 5. drop unreferenced points, keeping the survivors' relative order;
/// 6. orient every connected component consistently and outward.
///
/// Applying it to its own output returns a bit-identical mesh.
#[must_use]
pub fn repair_soup(
    points: &[Point3],
    triangles: &[[u32; 3]],
    params: &RepairParams,
) -> (TriangleMesh, RepairReport) {
    let mut report = RepairReport::default();

    let len = points.len();
    let mut soup: Vec<[u32; 3]> = triangles
        .iter()
        .filter(|t| t.iter().all(|&i| (i as usize) < len))
        .copied()
        .collect();
    report.invalid_triangles = triangles.len() - soup.len();

    let (remap, welded) = weld_points(points, params.weld_epsilon);
    report.welded_points = welded;
    for tri in &mut soup {
        for i in tri.iter_mut() {
            *i = remap[*i as usize];
        }
    }

    let before = soup.len();
    soup.retain(|&[a, b, c]| {
        a != b
            && b != c
            && a != c
            && triangle_area(
                &points[a as usize],
                &points[b as usize],
                &points[c as usize],
            ) >= params.area_threshold
    });
    report.degenerate_triangles = before - soup.len();

    let before = soup.len();
    let mut seen = HashSet::with_capacity(soup.len());
    soup.retain(|tri| {
        let mut key = *tri;
        key.sort_unstable();
        seen.insert(key)
    });
    report.duplicate_triangles = before - soup.len();

    let (points, unreferenced) = compact(points, &mut soup);
    report.unreferenced_points = unreferenced;

    let mut mesh = TriangleMesh {
        points,
        triangles: soup,
    };
    report.flipped_faces = orient_outward(&mut mesh);

    debug!(
        triangles = mesh.triangles.len(),
        points = mesh.points.len(),
        ?report,
        "repaired triangle soup"
    );
    (mesh, report)
}

type Cell = (i64, i64, i64);

#[allow(clippy::cast_possible_truncation)]
fn cell_of(p: &Point3, size: f64) -> Cell {
    (
        (p.x / size).floor() as i64,
        (p.y / size).floor() as i64,
        (p.z / size).floor() as i64,
    )
}

/// Maps every point to its representative. A point becomes a
/// representative when no earlier representative lies within `epsilon`, so
/// representatives are pairwise farther apart than `epsilon`.
#[allow(clippy::cast_possible_truncation)]
fn weld_points(points: &[Point3], epsilon: f64) -> (Vec<u32>, usize) {
    let mut remap = Vec::with_capacity(points.len());
    let mut merged = 0;

    if epsilon <= 0.0 || !epsilon.is_finite() {
        let mut exact: HashMap<[u64; 3], u32> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
            let rep = *exact.entry(key).or_insert(i as u32);
            if rep != i as u32 {
                merged += 1;
            }
            remap.push(rep);
        }
        return (remap, merged);
    }

    let mut grid: HashMap<Cell, Vec<u32>> = HashMap::new();
    for (i, p) in points.iter().enumerate() {
        let (cx, cy, cz) = cell_of(p, epsilon);
        let mut found = None;
        'search: for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(reps) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &rep in reps {
                        if (points[rep as usize] - p).norm() <= epsilon {
                            found = Some(rep);
                            break 'search;
                        }
                    }
                }
            }
        }
        match found {
            Some(rep) => {
                merged += 1;
                remap.push(rep);
            }
            None => {
                grid.entry((cx, cy, cz)).or_default().push(i as u32);
                remap.push(i as u32);
            }
        }
    }
    (remap, merged)
}

/// Drops unreferenced points and rewrites `triangles` to the new indices.
#[allow(clippy::cast_possible_truncation)]
fn compact(points: &[Point3], triangles: &mut [[u32; 3]]) -> (Vec<Point3>, usize) {
    let mut used = vec![false; points.len()];
    for &i in triangles.iter().flatten() {
        used[i as usize] = true;
    }

    let mut new_index = vec![u32::MAX; points.len()];
    let mut kept = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        if used[i] {
            new_index[i] = kept.len() as u32;
            kept.push(*p);
        }
    }
    for i in triangles.iter_mut().flatten() {
        *i = new_index[*i as usize];
    }
    let removed = points.len() - kept.len();
    (kept, removed)
}
