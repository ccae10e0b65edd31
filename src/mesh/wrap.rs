//! Voxel shape wrapping: a closed, outward-wound surface around an
//! arbitrary (possibly open) triangle mesh.
//!
//! The surface is voxelized, morphologically closed with a ball of radius
//! alpha (openings narrower than about twice alpha get sealed) and the
//! faces between solid and exterior voxels are emitted.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use super::TriangleMesh;
use crate::error::{MeshError, Result};
use crate::math::distance_3d::point_triangle_distance_squared;
use crate::math::{Point3, Vector3};
use crate::operations::query::Aabb;

/// Grid cells across one alpha.
const CELLS_PER_ALPHA: usize = 2;

/// Parameters for [`wrap_mesh`].
#[derive(Debug, Clone, Copy)]
pub struct WrapParams {
    /// Alpha (the sealing radius) is the bounding-box diagonal divided by
    /// this.
    pub relative_alpha: f64,
    /// Dilation offset is the bounding-box diagonal divided by this.
    pub relative_offset: f64,
    /// Largest grid the wrap may allocate.
    pub max_cells: usize,
}

impl Default for WrapParams {
    fn default() -> Self {
        Self {
            relative_alpha: 10.0,
            relative_offset: 300.0,
            max_cells: 4_000_000,
        }
    }
}

impl WrapParams {
    /// Sets the relative feature size.
    #[must_use]
    pub fn with_relative_alpha(mut self, relative_alpha: f64) -> Self {
        self.relative_alpha = relative_alpha;
        self
    }

    /// Sets the relative dilation offset.
    #[must_use]
    pub fn with_relative_offset(mut self, relative_offset: f64) -> Self {
        self.relative_offset = relative_offset;
        self
    }

    /// Sets the grid size limit.
    #[must_use]
    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }
}

type Ijk = (usize, usize, usize);

struct Grid {
    origin: Point3,
    size: f64,
    dims: [usize; 3],
}

impl Grid {
    fn len(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    fn index(&self, (i, j, k): Ijk) -> usize {
        (k * self.dims[1] + j) * self.dims[0] + i
    }

    fn ijk(&self, index: usize) -> Ijk {
        let i = index % self.dims[0];
        let j = (index / self.dims[0]) % self.dims[1];
        let k = index / (self.dims[0] * self.dims[1]);
        (i, j, k)
    }

    #[allow(clippy::cast_precision_loss)]
    fn center(&self, (i, j, k): Ijk) -> Point3 {
        let offset = Vector3::new(i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5);
        self.origin + offset * self.size
    }

    #[allow(clippy::cast_precision_loss)]
    fn corner(&self, (i, j, k): Ijk) -> Point3 {
        self.origin + Vector3::new(i as f64, j as f64, k as f64) * self.size
    }

    /// Cell range covering `[lo, hi]` along `axis`, clamped to the grid.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn range(&self, lo: f64, hi: f64, axis: usize) -> (usize, usize) {
        let to_cell = |x: f64| ((x - self.origin[axis]) / self.size).floor().max(0.0) as usize;
        let last = self.dims[axis] - 1;
        (to_cell(lo).min(last), to_cell(hi).min(last))
    }

    fn step(&self, (i, j, k): Ijk, (di, dj, dk): (isize, isize, isize)) -> Option<Ijk> {
        let ni = i.checked_add_signed(di)?;
        let nj = j.checked_add_signed(dj)?;
        let nk = k.checked_add_signed(dk)?;
        (ni < self.dims[0] && nj < self.dims[1] && nk < self.dims[2]).then_some((ni, nj, nk))
    }
}

/// Wraps `mesh` in a closed surface made of voxel faces.
///
/// With `d` the bounding-box diagonal, alpha is `d / relative_alpha` and
/// the grid spacing is half of alpha. A cell is occupied when its center
/// lies within `d / relative_offset` plus half a cell diagonal of the
/// surface. The occupied set is closed with a ball of radius alpha: it is
/// dilated, the exterior is flood-filled from the grid corner (the padding
/// keeps it empty), and the exterior is grown back by alpha, sparing
/// occupied cells. Every non-exterior cell is solid.
///
/// # Errors
///
/// Returns [`MeshError::EmptySoup`] for a mesh without extent and
/// [`MeshError::GridTooLarge`] when the grid would exceed `max_cells`.
pub fn wrap_mesh(mesh: &TriangleMesh, params: &WrapParams) -> Result<TriangleMesh> {
    let bounds = mesh.bounds().ok_or(MeshError::EmptySoup)?;
    let diagonal = bounds.diagonal();
    if !(diagonal.is_finite() && diagonal > 0.0) {
        return Err(MeshError::EmptySoup.into());
    }

    let alpha = diagonal / params.relative_alpha.max(1.0);
    #[allow(clippy::cast_precision_loss)]
    let size = alpha / CELLS_PER_ALPHA as f64;
    let offset = diagonal / params.relative_offset.max(1.0);
    let reach = offset + size * 3.0_f64.sqrt() * 0.5;
    let grid = allocate(&bounds, size, reach, params.max_cells)?;

    let occupied = occupancy(&grid, mesh, reach);
    let dilated = grow(&grid, &occupied, CELLS_PER_ALPHA);
    let exterior = flood_exterior(&grid, &dilated);
    let mut exterior = grow(&grid, &exterior, CELLS_PER_ALPHA);
    for (cell, &occ) in exterior.iter_mut().zip(&occupied) {
        *cell &= !occ;
    }
    let wrapped = extract_surface(&grid, &exterior);

    debug!(
        cells = grid.len(),
        cell_size = size,
        offset,
        triangles = wrapped.triangles.len(),
        "wrapped open mesh"
    );
    Ok(wrapped)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn allocate(bounds: &Aabb, size: f64, reach: f64, max_cells: usize) -> Result<Grid> {
    // Dilation must not reach the flood-fill seed in the corner.
    let pad = reach + (CELLS_PER_ALPHA + 2) as f64 * size;
    let origin = bounds.min - Vector3::repeat(pad);
    let extent = bounds.extent() + Vector3::repeat(2.0 * pad);
    let dims = [0, 1, 2].map(|axis| ((extent[axis] / size).ceil() as usize).max(1) + 1);
    let cells = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .unwrap_or(usize::MAX);
    if cells > max_cells {
        return Err(MeshError::GridTooLarge {
            cells,
            limit: max_cells,
        }
        .into());
    }
    Ok(Grid { origin, size, dims })
}

fn occupancy(grid: &Grid, mesh: &TriangleMesh, reach: f64) -> Vec<bool> {
    let mut occupied = vec![false; grid.len()];
    let reach_sq = reach * reach;
    for [a, b, c] in mesh.iter_corners() {
        let lo = a.inf(&b).inf(&c);
        let hi = a.sup(&b).sup(&c);
        let (i0, i1) = grid.range(lo.x - reach, hi.x + reach, 0);
        let (j0, j1) = grid.range(lo.y - reach, hi.y + reach, 1);
        let (k0, k1) = grid.range(lo.z - reach, hi.z + reach, 2);
        for k in k0..=k1 {
            for j in j0..=j1 {
                for i in i0..=i1 {
                    let idx = grid.index((i, j, k));
                    if occupied[idx] {
                        continue;
                    }
                    let center = grid.center((i, j, k));
                    occupied[idx] = point_triangle_distance_squared(&center, &a, &b, &c) <= reach_sq;
                }
            }
        }
    }
    occupied
}

const FACE_NEIGHBORS: [(isize, isize, isize); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// Cells within Chebyshev distance `steps` of a `seed` cell.
fn grow(grid: &Grid, seed: &[bool], steps: usize) -> Vec<bool> {
    let mut reached = seed.to_vec();
    let mut frontier: Vec<usize> = (0..seed.len()).filter(|&i| seed[i]).collect();
    for _ in 0..steps {
        let mut next = Vec::new();
        for &idx in &frontier {
            let cell = grid.ijk(idx);
            for di in -1..=1 {
                for dj in -1..=1 {
                    for dk in -1..=1 {
                        let Some(n) = grid.step(cell, (di, dj, dk)) else {
                            continue;
                        };
                        let n = grid.index(n);
                        if !reached[n] {
                            reached[n] = true;
                            next.push(n);
                        }
                    }
                }
            }
        }
        frontier = next;
    }
    reached
}

fn flood_exterior(grid: &Grid, blocked: &[bool]) -> Vec<bool> {
    let mut exterior = vec![false; grid.len()];
    if blocked[0] {
        return exterior;
    }
    exterior[0] = true;
    let mut queue = VecDeque::from([(0, 0, 0)]);
    while let Some(cell) = queue.pop_front() {
        for dir in FACE_NEIGHBORS {
            let Some(next) = grid.step(cell, dir) else {
                continue;
            };
            let idx = grid.index(next);
            if !blocked[idx] && !exterior[idx] {
                exterior[idx] = true;
                queue.push_back(next);
            }
        }
    }
    exterior
}

/// Corner offsets of the cell face pointing along each of
/// [`FACE_NEIGHBORS`], counter-clockwise seen from outside the cell.
const FACE_CORNERS: [[Ijk; 4]; 6] = [
    [(1, 0, 0), (1, 1, 0), (1, 1, 1), (1, 0, 1)],
    [(0, 0, 0), (0, 0, 1), (0, 1, 1), (0, 1, 0)],
    [(0, 1, 0), (0, 1, 1), (1, 1, 1), (1, 1, 0)],
    [(0, 0, 0), (1, 0, 0), (1, 0, 1), (0, 0, 1)],
    [(0, 0, 1), (1, 0, 1), (1, 1, 1), (0, 1, 1)],
    [(0, 0, 0), (0, 1, 0), (1, 1, 0), (1, 0, 0)],
];

#[allow(clippy::cast_possible_truncation)]
fn extract_surface(grid: &Grid, exterior: &[bool]) -> TriangleMesh {
    let mut vertex_ids: HashMap<Ijk, u32> = HashMap::new();
    let mut points = Vec::new();
    let mut triangles = Vec::new();

    for idx in 0..grid.len() {
        if exterior[idx] {
            continue;
        }
        let (i, j, k) = grid.ijk(idx);
        for (dir, corners) in FACE_NEIGHBORS.iter().zip(&FACE_CORNERS) {
            let exposed = grid
                .step((i, j, k), *dir)
                .map_or(true, |n| exterior[grid.index(n)]);
            if !exposed {
                continue;
            }
            let quad = corners.map(|(di, dj, dk)| {
                let key = (i + di, j + dj, k + dk);
                *vertex_ids.entry(key).or_insert_with(|| {
                    points.push(grid.corner(key));
                    (points.len() - 1) as u32
                })
            });
            triangles.push([quad[0], quad[1], quad[2]]);
            triangles.push([quad[0], quad[2], quad[3]]);
        }
    }
    TriangleMesh::new(points, triangles)
}
