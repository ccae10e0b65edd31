mod tessellate_face;
mod tessellate_solid;

pub use tessellate_face::{triangulate_rings, TessellateFace};
pub use tessellate_solid::{SolidSoup, TessellateSolid};

use crate::error::TessellationError;
use crate::math::SNAP_TOLERANCE;

/// Parameters controlling face triangulation.
#[derive(Debug, Clone, Copy)]
pub struct TessellationParams {
    /// Fitted plane coefficients below this magnitude are snapped to zero.
    pub snap_tolerance: f64,
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self {
            snap_tolerance: SNAP_TOLERANCE,
        }
    }
}

impl TessellationParams {
    /// Sets the plane coefficient snapping tolerance.
    #[must_use]
    pub fn with_snap_tolerance(mut self, snap_tolerance: f64) -> Self {
        self.snap_tolerance = snap_tolerance;
        self
    }
}

/// Result of triangulating one polygonal face.
///
/// Triangles are index triples into the model's shared point array, wound
/// like the face's outer ring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceTriangulation {
    /// Accepted triangles.
    pub triangles: Vec<[u32; 3]>,
    /// `true` when the outer ring runs clockwise in the fitted plane's frame.
    pub reversed: bool,
    /// Why the face was rejected, if it was. A rejected face has no triangles.
    pub rejection: Option<TessellationError>,
}

impl FaceTriangulation {
    /// A rejected face: no triangles.
    #[must_use]
    pub fn rejected(reason: TessellationError) -> Self {
        Self {
            triangles: Vec::new(),
            reversed: false,
            rejection: Some(reason),
        }
    }

    /// Whether the face was rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}
