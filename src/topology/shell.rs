use super::face::FaceId;

slotmap::new_key_type! {
    /// Unique identifier for a shell in the boundary model.
    pub struct ShellId;
}

/// Data associated with a shell.
///
/// A shell is a set of faces forming (ideally) one closed surface. Nothing
/// enforces closedness here; the solid builder repairs what it can.
#[derive(Debug, Clone, Default)]
pub struct ShellData {
    /// The faces that make up this shell.
    pub faces: Vec<FaceId>,
}
