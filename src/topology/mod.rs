pub mod face;
pub mod shell;
pub mod solid;

pub use face::{FaceData, FaceId, Ring};
pub use shell::{ShellData, ShellId};
pub use solid::{GeometryData, GeometryId};

use crate::error::{PointIndexError, TopologyError};
use crate::math::Point3;
use slotmap::SlotMap;

/// Central arena that owns the shared point array and every boundary entity
/// of a city model.
///
/// Entities reference each other via typed IDs (generational indices);
/// rings reference points by plain index into [`points`](Self::points).
#[derive(Debug, Default)]
pub struct BoundaryModel {
    points: Vec<Point3>,
    faces: SlotMap<FaceId, FaceData>,
    shells: SlotMap<ShellId, ShellData>,
    geometries: SlotMap<GeometryId, GeometryData>,
    order: Vec<GeometryId>,
}

impl BoundaryModel {
    /// Creates a new, empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Point operations ---

    /// Appends a point and returns its index.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_point(&mut self, point: Point3) -> u32 {
        self.points.push(point);
        (self.points.len() - 1) as u32
    }

    /// Appends points and returns the index of the first one.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_points(&mut self, points: impl IntoIterator<Item = Point3>) -> u32 {
        let first = self.points.len() as u32;
        self.points.extend(points);
        first
    }

    /// The shared point array.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    // --- Face operations ---

    /// Inserts a face and returns its ID.
    pub fn add_face(&mut self, data: FaceData) -> FaceId {
        self.faces.insert(data)
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    // --- Shell operations ---

    /// Inserts a shell and returns its ID.
    pub fn add_shell(&mut self, data: ShellData) -> ShellId {
        self.shells.insert(data)
    }

    /// Returns a reference to the shell data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn shell(&self, id: ShellId) -> Result<&ShellData, TopologyError> {
        self.shells
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("shell".into()))
    }

    // --- Geometry operations ---

    /// Inserts a geometry and returns its ID.
    pub fn add_geometry(&mut self, data: GeometryData) -> GeometryId {
        let id = self.geometries.insert(data);
        self.order.push(id);
        id
    }

    /// Inserts a geometry given as nested boundaries: shells, then faces,
    /// then rings of point indices (ring 0 of a face is the outer boundary).
    pub fn add_boundaries(
        &mut self,
        object_id: impl Into<String>,
        lod: impl Into<String>,
        boundaries: Vec<Vec<Vec<Ring>>>,
    ) -> GeometryId {
        let mut shells = Vec::with_capacity(boundaries.len());
        for shell in boundaries {
            let faces = shell
                .into_iter()
                .map(|rings| self.add_face(FaceData { rings }))
                .collect();
            shells.push(self.add_shell(ShellData { faces }));
        }
        self.add_geometry(GeometryData {
            object_id: object_id.into(),
            lod: lod.into(),
            shells,
        })
    }

    /// Returns a reference to the geometry data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn geometry(&self, id: GeometryId) -> Result<&GeometryData, TopologyError> {
        self.geometries
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("geometry".into()))
    }

    /// Geometry IDs in insertion order.
    #[must_use]
    pub fn geometry_ids(&self) -> &[GeometryId] {
        &self.order
    }

    /// Geometries with their IDs, in insertion order.
    pub fn geometries(&self) -> impl Iterator<Item = (GeometryId, &GeometryData)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.geometries.get(id).map(|g| (id, g)))
    }

    /// Number of geometries in the model.
    #[must_use]
    pub fn geometry_count(&self) -> usize {
        self.order.len()
    }

    /// Checks that every ring of the geometry references an existing point.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range index, or an error if an entity is
    /// missing.
    pub fn validate_indices(&self, id: GeometryId) -> Result<(), TopologyError> {
        let geometry = self.geometry(id)?;
        for &shell_id in &geometry.shells {
            for &face_id in &self.shell(shell_id)?.faces {
                for ring in &self.face(face_id)?.rings {
                    check_ring(ring, self.points.len())?;
                }
            }
        }
        Ok(())
    }
}

/// Checks that every index of `ring` addresses one of `len` points.
///
/// # Errors
///
/// Returns the first out-of-range index.
pub fn check_ring(ring: &[u32], len: usize) -> Result<(), PointIndexError> {
    match ring.iter().find(|&&i| i as usize >= len) {
        Some(&index) => Err(PointIndexError { index, len }),
        None => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square_model() -> (BoundaryModel, GeometryId) {
        let mut model = BoundaryModel::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            model.add_point(Point3::new(x, y, 0.0));
        }
        let id = model.add_boundaries("b1", "2.2", vec![vec![vec![vec![0, 1, 2, 3]]]]);
        (model, id)
    }

    #[test]
    fn nested_boundaries_are_stored() {
        let (model, id) = square_model();
        let geometry = model.geometry(id).unwrap();
        assert_eq!(geometry.object_id, "b1");
        assert_eq!(geometry.lod, "2.2");
        assert_eq!(geometry.shells.len(), 1);
        let shell = model.shell(geometry.shells[0]).unwrap();
        let face = model.face(shell.faces[0]).unwrap();
        assert_eq!(face.outer_ring().unwrap(), &vec![0, 1, 2, 3]);
        assert!(face.inner_rings().is_empty());
    }

    #[test]
    fn insertion_order_is_kept() {
        let (mut model, first) = square_model();
        let second = model.add_boundaries("b2", "1.2", vec![]);
        assert_eq!(model.geometry_ids(), &[first, second]);
        assert_eq!(model.geometry_count(), 2);
        let ids: Vec<_> = model.geometries().map(|(_, g)| g.object_id.as_str()).collect();
        assert_eq!(ids, ["b1", "b2"]);
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let (mut model, _) = square_model();
        let bad = model.add_boundaries("bad", "2.2", vec![vec![vec![vec![0, 1, 9]]]]);
        let err = model.validate_indices(bad).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::PointIndex(PointIndexError { index: 9, len: 4 })
        ));
    }

    #[test]
    fn bulk_points_are_appended() {
        let (mut model, _) = square_model();
        let first = model.add_points([Point3::new(0.0, 0.0, 1.0), Point3::new(1.0, 0.0, 1.0)]);
        assert_eq!(first, 4);
        assert_eq!(model.points().len(), 6);
    }

    #[test]
    fn valid_indices_pass() {
        let (model, id) = square_model();
        assert!(model.validate_indices(id).is_ok());
    }
}
