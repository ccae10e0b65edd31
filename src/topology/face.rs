slotmap::new_key_type! {
    /// Unique identifier for a face in the boundary model.
    pub struct FaceId;
}

/// A closed ring of indices into the model's point array. The closing edge
/// from the last vertex back to the first is implicit.
pub type Ring = Vec<u32>;

/// Data associated with a polygonal face.
///
/// The first ring is the outer boundary; any further rings are holes. All
/// rings are assumed approximately coplanar.
#[derive(Debug, Clone, Default)]
pub struct FaceData {
    /// Outer ring followed by hole rings.
    pub rings: Vec<Ring>,
}

impl FaceData {
    /// The outer boundary ring, if any.
    #[must_use]
    pub fn outer_ring(&self) -> Option<&Ring> {
        self.rings.first()
    }

    /// The hole rings.
    #[must_use]
    pub fn inner_rings(&self) -> &[Ring] {
        self.rings.get(1..).unwrap_or(&[])
    }
}
