use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::topology::{BoundaryModel, GeometryId};

use super::{TessellateFace, TessellationParams};

/// The triangle soup of one geometry, before any repair.
#[derive(Debug, Clone, Default)]
pub struct SolidSoup {
    /// Triangles as index triples into the model's point array.
    pub triangles: Vec<[u32; 3]>,
    /// Every point index referenced by a ring of the geometry, once each,
    /// in ascending order. Rejected faces still contribute their points.
    pub shell_points: Vec<u32>,
    /// Faces that produced triangles (or were legitimately empty).
    pub faces_accepted: usize,
    /// Faces rejected by the triangulator.
    pub faces_rejected: usize,
}

/// Triangulates every face of every shell of a geometry into one soup.
pub struct TessellateSolid {
    geometry: GeometryId,
    params: TessellationParams,
}

impl TessellateSolid {
    /// Creates a new `TessellateSolid` operation.
    #[must_use]
    pub fn new(geometry: GeometryId, params: TessellationParams) -> Self {
        Self { geometry, params }
    }

    /// Executes the tessellation, returning the combined soup.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry, or one of its shells or faces, is
    /// missing from the model. Malformed faces are not errors.
    pub fn execute(&self, model: &BoundaryModel) -> Result<SolidSoup> {
        let geometry = model.geometry(self.geometry)?;
        let n_points = model.points().len();

        let mut soup = SolidSoup::default();
        let mut shell_points = BTreeSet::new();
        for &shell_id in &geometry.shells {
            let shell = model.shell(shell_id)?;
            for &face_id in &shell.faces {
                let face = model.face(face_id)?;
                shell_points.extend(
                    face.rings
                        .iter()
                        .flatten()
                        .copied()
                        .filter(|&i| (i as usize) < n_points),
                );

                let result = TessellateFace::new(face_id, self.params).execute(model)?;
                if result.is_rejected() {
                    soup.faces_rejected += 1;
                } else {
                    soup.faces_accepted += 1;
                    soup.triangles.extend(result.triangles);
                }
            }
        }
        soup.shell_points = shell_points.into_iter().collect();

        debug!(
            object = %geometry.object_id,
            lod = %geometry.lod,
            triangles = soup.triangles.len(),
            accepted = soup.faces_accepted,
            rejected = soup.faces_rejected,
            "tessellated geometry"
        );
        Ok(soup)
    }
}
