use std::cell::OnceCell;

use tracing::{debug, warn};

use super::{fill_holes, repair_soup, wrap_mesh, HoleFillParams, HoleFillReport};
use super::{RepairParams, RepairReport, TriangleMesh, WrapParams};
use crate::math::Point3;
use crate::sampling::SampleGenerator;
use crate::tessellation::SolidSoup;

/// Which of a solid's meshes an accessor resolves to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MeshSelector {
    /// The repaired soup, possibly open.
    #[default]
    Original,
    /// The repaired soup with its boundary cycles patched.
    Patched,
    /// The closed voxel wrap around the surface.
    Wrapped,
}

/// Parameters for [`SolidBuilder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SolidParams {
    pub repair: RepairParams,
    pub holes: HoleFillParams,
    pub wrap: WrapParams,
}

impl SolidParams {
    /// Sets the repair parameters.
    #[must_use]
    pub fn with_repair(mut self, repair: RepairParams) -> Self {
        self.repair = repair;
        self
    }

    /// Sets the hole filling parameters.
    #[must_use]
    pub fn with_holes(mut self, holes: HoleFillParams) -> Self {
        self.holes = holes;
        self
    }

    /// Sets the wrapping parameters.
    #[must_use]
    pub fn with_wrap(mut self, wrap: WrapParams) -> Self {
        self.wrap = wrap;
        self
    }
}

/// What happened while a solid was assembled.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Triangles in the soup handed to the builder.
    pub input_triangles: usize,
    pub repair: RepairReport,
    /// Whether the repaired soup was closed.
    pub closed: bool,
    /// Edges of the repaired soup shared by more than two triangles.
    pub non_manifold_edges: usize,
    /// Hole filling outcome, when it ran.
    pub holes: Option<HoleFillReport>,
    /// Whether patching closed the mesh.
    pub patched_closed: bool,
    /// Whether a wrap was built.
    pub wrapped: bool,
    /// Why wrapping failed, if it did.
    pub wrap_error: Option<String>,
    /// Whether the solid ended up with no triangles.
    pub empty: bool,
}

/// A repaired solid with its derived meshes and cached measurements.
///
/// Area and volume come from the original mesh and are fixed at
/// construction. The containment mesh used for inside tests and the
/// current mesh reported to callers are selected independently.
#[derive(Debug)]
pub struct Solid {
    original: TriangleMesh,
    patched: Option<TriangleMesh>,
    wrapped: Option<TriangleMesh>,
    containment: MeshSelector,
    current: MeshSelector,
    shell_points: Vec<Point3>,
    area: f64,
    volume: f64,
    report: BuildReport,
    surface_samples: OnceCell<Vec<Point3>>,
    volume_samples: OnceCell<Vec<Point3>>,
}

impl Solid {
    fn empty(shell_points: Vec<Point3>, report: BuildReport) -> Self {
        Self {
            original: TriangleMesh::default(),
            patched: None,
            wrapped: None,
            containment: MeshSelector::Original,
            current: MeshSelector::Original,
            shell_points,
            area: 0.0,
            volume: 0.0,
            report,
            surface_samples: OnceCell::new(),
            volume_samples: OnceCell::new(),
        }
    }

    /// Surface area of the original mesh.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Enclosed volume of the original mesh, never negative.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Whether the solid has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// The boundary vertices of the geometry's rings.
    #[must_use]
    pub fn shell_points(&self) -> &[Point3] {
        &self.shell_points
    }

    #[must_use]
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// The selected mesh, or the original when that mesh was never built.
    #[must_use]
    pub fn mesh(&self, selector: MeshSelector) -> &TriangleMesh {
        let mesh = match selector {
            MeshSelector::Original => None,
            MeshSelector::Patched => self.patched.as_ref(),
            MeshSelector::Wrapped => self.wrapped.as_ref(),
        };
        mesh.unwrap_or(&self.original)
    }

    /// Whether `selector` names a mesh this solid owns.
    #[must_use]
    pub fn has_mesh(&self, selector: MeshSelector) -> bool {
        match selector {
            MeshSelector::Original => true,
            MeshSelector::Patched => self.patched.is_some(),
            MeshSelector::Wrapped => self.wrapped.is_some(),
        }
    }

    #[must_use]
    pub fn containment(&self) -> MeshSelector {
        self.containment
    }

    /// The mesh used for inside/outside tests.
    #[must_use]
    pub fn containment_mesh(&self) -> &TriangleMesh {
        self.mesh(self.containment)
    }

    #[must_use]
    pub fn current(&self) -> MeshSelector {
        self.current
    }

    /// The mesh reported to callers, e.g. for export.
    #[must_use]
    pub fn current_mesh(&self) -> &TriangleMesh {
        self.mesh(self.current)
    }

    /// Switches the current mesh. Returns `false`, leaving the selection
    /// unchanged, when the solid has no such mesh.
    pub fn set_current(&mut self, selector: MeshSelector) -> bool {
        if !self.has_mesh(selector) {
            return false;
        }
        self.current = selector;
        true
    }

    /// Surface samples of the original mesh, generated on first use.
    pub fn surface_samples(&self, generator: &mut SampleGenerator) -> &[Point3] {
        self.surface_samples
            .get_or_init(|| generator.surface_samples(&self.original, &self.shell_points))
    }

    /// Interior samples of the containment mesh, generated on first use.
    pub fn volume_samples(&self, generator: &mut SampleGenerator) -> &[Point3] {
        self.volume_samples.get_or_init(|| {
            let containment = self.containment_mesh();
            match containment.bounds() {
                Some(bounds) => generator.volume_samples(&bounds, containment, self.volume),
                None => Vec::new(),
            }
        })
    }
}

/// Assembles a [`Solid`] from a geometry's triangle soup.
pub struct SolidBuilder {
    params: SolidParams,
}

impl SolidBuilder {
    #[must_use]
    pub fn new(params: SolidParams) -> Self {
        Self { params }
    }

    /// Repairs the soup, measures it and, when it is open, patches or wraps
    /// it into a closed mesh for containment tests.
    ///
    /// `points` is the model's shared point array the soup indexes into.
    /// Never fails: an empty soup yields an empty solid and every fallback
    /// failure is recorded in the [`BuildReport`].
    #[must_use]
    pub fn build(&self, points: &[Point3], soup: &SolidSoup) -> Solid {
        let shell_points: Vec<Point3> = soup
            .shell_points
            .iter()
            .filter_map(|&i| points.get(i as usize).copied())
            .collect();
        let mut report = BuildReport {
            input_triangles: soup.triangles.len(),
            ..BuildReport::default()
        };

        let (original, repair) = repair_soup(points, &soup.triangles, &self.params.repair);
        report.repair = repair;
        if original.is_empty() {
            warn!(
                input = report.input_triangles,
                "solid has no triangles after repair"
            );
            report.empty = true;
            return Solid::empty(shell_points, report);
        }

        let apex = original.points[0];
        let area = original.area();
        let volume = original.signed_volume(&apex).abs();

        let mut patched = None;
        let mut wrapped = None;
        let mut containment = MeshSelector::Original;
        let adjacency = original.adjacency();
        report.closed = adjacency.is_closed();
        report.non_manifold_edges = adjacency.non_manifold_edges().count();
        if report.non_manifold_edges > 0 {
            warn!(edges = report.non_manifold_edges, "solid has non-manifold edges");
        }

        if !report.closed {
            if self.params.holes.enabled {
                let mut mesh = original.clone();
                report.holes = Some(fill_holes(&mut mesh, &self.params.holes));
                report.patched_closed = mesh.is_closed();
                if report.patched_closed {
                    containment = MeshSelector::Patched;
                }
                patched = Some(mesh);
            }

            if containment == MeshSelector::Original {
                let source = patched.as_ref().unwrap_or(&original);
                match wrap_mesh(source, &self.params.wrap) {
                    Ok(mesh) => {
                        report.wrapped = true;
                        containment = MeshSelector::Wrapped;
                        wrapped = Some(mesh);
                    }
                    Err(err) => {
                        warn!(%err, "wrapping failed; containment uses the open mesh");
                        report.wrap_error = Some(err.to_string());
                    }
                }
            }
        }

        debug!(
            triangles = original.triangle_count(),
            area,
            volume,
            closed = report.closed,
            ?containment,
            "built solid"
        );

        Solid {
            original,
            patched,
            wrapped,
            containment,
            current: MeshSelector::Original,
            shell_points,
            area,
            volume,
            report,
            surface_samples: OnceCell::new(),
            volume_samples: OnceCell::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::{box_mesh, open_box};
    use crate::sampling::SamplingParams;
    use approx::assert_relative_eq;

    fn soup_of(mesh: &TriangleMesh) -> SolidSoup {
        SolidSoup {
            triangles: mesh.triangles.clone(),
            shell_points: (0..mesh.points.len() as u32).collect(),
            faces_accepted: mesh.triangle_count(),
            faces_rejected: 0,
        }
    }

    fn build(mesh: &TriangleMesh, params: SolidParams) -> Solid {
        SolidBuilder::new(params).build(&mesh.points, &soup_of(mesh))
    }

    #[test]
    fn closed_box_contains_itself() {
        let solid = build(&box_mesh(2.0, 3.0, 4.0), SolidParams::default());
        assert_relative_eq!(solid.area(), 52.0, epsilon = 1e-9);
        assert_relative_eq!(solid.volume(), 24.0, epsilon = 1e-9);
        assert!(solid.report().closed);
        assert_eq!(solid.containment(), MeshSelector::Original);
        assert_eq!(solid.current(), MeshSelector::Original);
        assert!(!solid.has_mesh(MeshSelector::Patched));
        assert_eq!(solid.shell_points().len(), 8);
    }

    #[test]
    fn open_box_is_patched_but_measured_open() {
        let solid = build(&open_box(), SolidParams::default());
        // Five faces of the unit box: the patch does not count.
        assert_relative_eq!(solid.area(), 5.0, epsilon = 1e-9);
        assert!(!solid.report().closed);
        assert!(solid.report().patched_closed);
        assert_eq!(solid.containment(), MeshSelector::Patched);
        assert_eq!(solid.current(), MeshSelector::Original);
        assert!(solid.containment_mesh().is_closed());
    }

    #[test]
    fn fin_triangle_is_reported_as_non_manifold() {
        let mut mesh = box_mesh(1.0, 1.0, 1.0);
        mesh.points.push(Point3::new(0.5, -1.0, 0.0));
        mesh.triangles.push([0, 1, 8]);
        let solid = build(&mesh, SolidParams::default());
        assert_eq!(solid.report().non_manifold_edges, 1);
        assert!(!solid.report().closed);

        let closed = build(&box_mesh(1.0, 1.0, 1.0), SolidParams::default());
        assert_eq!(closed.report().non_manifold_edges, 0);
    }

    #[test]
    fn open_box_is_wrapped_when_patching_is_off() {
        let params = SolidParams::default()
            .with_holes(HoleFillParams::default().with_enabled(false))
            .with_wrap(WrapParams::default().with_relative_alpha(2.0));
        let solid = build(&open_box(), params);
        assert!(solid.report().holes.is_none());
        assert!(solid.report().wrapped);
        assert_eq!(solid.containment(), MeshSelector::Wrapped);
        assert!(solid.containment_mesh().is_closed());
    }

    #[test]
    fn failed_wrap_is_recorded() {
        let params = SolidParams::default()
            .with_holes(HoleFillParams::default().with_enabled(false))
            .with_wrap(WrapParams::default().with_max_cells(8));
        let solid = build(&open_box(), params);
        assert!(!solid.report().wrapped);
        assert!(solid.report().wrap_error.is_some());
        assert_eq!(solid.containment(), MeshSelector::Original);
    }

    #[test]
    fn current_selector_only_moves_to_owned_meshes() {
        let mut solid = build(&box_mesh(1.0, 1.0, 1.0), SolidParams::default());
        assert!(!solid.set_current(MeshSelector::Wrapped));
        assert_eq!(solid.current(), MeshSelector::Original);

        let mut open = build(&open_box(), SolidParams::default());
        assert!(open.set_current(MeshSelector::Patched));
        assert_eq!(open.current(), MeshSelector::Patched);
        assert_eq!(open.containment(), MeshSelector::Patched);
        assert!(open.current_mesh().triangle_count() > open.mesh(MeshSelector::Original).triangle_count());
    }

    #[test]
    fn empty_soup_gives_an_empty_solid() {
        let solid = SolidBuilder::new(SolidParams::default()).build(&[], &SolidSoup::default());
        assert!(solid.is_empty());
        assert!(solid.report().empty);
        assert_eq!(solid.area(), 0.0);
        assert_eq!(solid.volume(), 0.0);

        let mut generator = SampleGenerator::new(SamplingParams::default().with_seed(1));
        assert!(solid.volume_samples(&mut generator).is_empty());
    }

    #[test]
    fn samples_are_cached() {
        let solid = build(&box_mesh(1.0, 1.0, 1.0), SolidParams::default());
        let mut generator = SampleGenerator::new(SamplingParams::default().with_seed(5));
        let first = solid.surface_samples(&mut generator).to_vec();
        let second = solid.surface_samples(&mut generator).to_vec();
        assert_eq!(first, second);
        assert_eq!(first.len(), 500 + 8);
        assert_eq!(solid.volume_samples(&mut generator).len(), 500);
    }
}
