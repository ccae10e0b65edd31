use super::shell::ShellId;

slotmap::new_key_type! {
    /// Unique identifier for a geometry instance in the boundary model.
    pub struct GeometryId;
}

/// One geometry of a city object at one level of detail.
///
/// The first shell is the outer shell; additional shells are interior
/// voids. Descriptors are computed over the union of all shells.
#[derive(Debug, Clone)]
pub struct GeometryData {
    /// Identifier of the owning city object.
    pub object_id: String,
    /// Level-of-detail label, used only for output.
    pub lod: String,
    /// Shells of the geometry.
    pub shells: Vec<ShellId>,
}
