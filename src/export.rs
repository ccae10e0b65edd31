//! Plain-text mesh export for diagnostics.

use std::io::Write;

use crate::error::Result;
use crate::math::Point3;
use crate::mesh::TriangleMesh;

/// Writes `points` and `triangles` as Wavefront OBJ: one `v x y z` line per
/// point with five decimals, then one 1-based `f i j k` line per triangle.
///
/// # Errors
///
/// Returns [`ShapeIndexError::Io`](crate::ShapeIndexError::Io) if writing
/// fails.
pub fn write_obj<W: Write>(points: &[Point3], triangles: &[[u32; 3]], writer: &mut W) -> Result<()> {
    for p in points {
        writeln!(writer, "v {:.5} {:.5} {:.5}", p.x, p.y, p.z)?;
    }
    for [a, b, c] in triangles {
        writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    Ok(())
}

/// Writes `mesh` with [`write_obj`].
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_mesh_obj<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> Result<()> {
    write_obj(&mesh.points, &mesh.triangles, writer)
}
