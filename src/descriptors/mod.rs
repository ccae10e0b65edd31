//! Named shape descriptors.
//!
//! [`DESCRIPTORS`] is the single registry of descriptor names and formulas;
//! both [`descriptor_names`] and [`compute_descriptors`] iterate it, so a
//! descriptor cannot be listed without being computed or the reverse.
//!
//! Notation: `V` volume, `A` area, `r` radius of the sphere of volume `V`.

mod inputs;

pub use inputs::DescriptorInputs;

use std::f64::consts::PI;

/// A named descriptor and the formula computing it.
#[derive(Clone, Copy)]
pub struct Descriptor {
    pub name: &'static str,
    pub compute: fn(&DescriptorInputs) -> f64,
}

impl std::fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Descriptor").field("name", &self.name).finish()
    }
}

/// Every descriptor, in output order.
pub static DESCRIPTORS: &[Descriptor] = &[
    Descriptor { name: "area", compute: area },
    Descriptor { name: "volume", compute: volume },
    Descriptor { name: "convexity", compute: convexity },
    Descriptor { name: "cubeness", compute: cubeness },
    Descriptor { name: "rectangularity", compute: rectangularity },
    Descriptor { name: "cuboidindex", compute: cuboid_index },
    Descriptor { name: "hemisphericality", compute: hemisphericality },
    Descriptor { name: "fractality", compute: fractality },
    Descriptor { name: "dispersion", compute: dispersion },
    Descriptor { name: "roughness", compute: roughness },
    Descriptor { name: "proximity", compute: proximity },
    Descriptor { name: "spin", compute: spin },
    Descriptor { name: "range", compute: range },
    Descriptor { name: "girth", compute: girth },
    Descriptor { name: "depth", compute: depth },
    Descriptor { name: "cohesion", compute: cohesion },
    Descriptor { name: "circumference", compute: circumference },
];

/// Names of every descriptor, in output order.
pub fn descriptor_names() -> impl Iterator<Item = &'static str> {
    DESCRIPTORS.iter().map(|d| d.name)
}

/// Evaluates every descriptor over `inputs`.
///
/// An empty solid, and any formula that is not finite, reports `0.0`.
#[must_use]
pub fn compute_descriptors(inputs: &DescriptorInputs) -> ShapeDescriptors {
    let values = DESCRIPTORS
        .iter()
        .map(|d| {
            let value = if inputs.empty { 0.0 } else { (d.compute)(inputs) };
            (d.name, if value.is_finite() { value } else { 0.0 })
        })
        .collect();
    ShapeDescriptors { values }
}

/// Descriptor values of one solid, in registry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeDescriptors {
    values: Vec<(&'static str, f64)>,
}

impl ShapeDescriptors {
    /// The value of the descriptor called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.iter().find(|(n, _)| *n == name).map(|&(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.values.iter().copied()
    }

    /// Values alone, in registry order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.values.iter().map(|&(_, v)| v).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn area(i: &DescriptorInputs) -> f64 {
    i.area
}

fn volume(i: &DescriptorInputs) -> f64 {
    i.volume
}

fn convexity(i: &DescriptorInputs) -> f64 {
    i.volume / i.hull_volume
}

fn cubeness(i: &DescriptorInputs) -> f64 {
    6.0 * i.volume.powf(2.0 / 3.0) / i.area
}

fn rectangularity(i: &DescriptorInputs) -> f64 {
    i.volume / i.obb_volume
}

fn cuboid_index(i: &DescriptorInputs) -> f64 {
    (i.volume / i.obb_volume).powf(2.0 / 3.0) * i.obb_area / i.area
}

fn hemisphericality(i: &DescriptorInputs) -> f64 {
    3.0 * (2.0 * PI).sqrt() * i.volume / i.area.powf(1.5)
}

fn fractality(i: &DescriptorInputs) -> f64 {
    1.0 - i.volume.ln() / (1.5 * i.area.ln())
}

fn dispersion(i: &DescriptorInputs) -> f64 {
    1.0 - i.surface_mean_deviation / i.surface_mean_distance
}

fn roughness(i: &DescriptorInputs) -> f64 {
    i.surface_mean_distance.powi(3) * 48.735 / (i.volume + i.area.powf(1.5))
}

fn proximity(i: &DescriptorInputs) -> f64 {
    0.75 * i.equivalent_radius / i.volume_mean_distance
}

fn spin(i: &DescriptorInputs) -> f64 {
    0.6 * i.equivalent_radius.powi(2) / i.volume_mean_squared_distance
}

fn range(i: &DescriptorInputs) -> f64 {
    i.equivalent_radius / i.ball_radius
}

fn girth(i: &DescriptorInputs) -> f64 {
    i.max_surface_distance / i.equivalent_radius
}

fn depth(i: &DescriptorInputs) -> f64 {
    4.0 * i.mean_surface_distance / i.equivalent_radius
}

fn cohesion(i: &DescriptorInputs) -> f64 {
    (36.0 / 35.0) * i.equivalent_radius / i.mean_pairwise_distance
}

fn circumference(i: &DescriptorInputs) -> f64 {
    4.0 * PI * i.equivalent_radius.powi(2) / i.area
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cube() -> DescriptorInputs {
        DescriptorInputs {
            area: 6.0,
            volume: 1.0,
            hull_volume: 1.0,
            obb_volume: 1.0,
            obb_area: 6.0,
            ball_radius: 3.0_f64.sqrt() / 2.0,
            equivalent_radius: (3.0 / (4.0 * PI)).cbrt(),
            ..DescriptorInputs::default()
        }
    }

    #[test]
    fn names_follow_the_registry() {
        let names: Vec<_> = descriptor_names().collect();
        assert_eq!(names.len(), 17);
        assert_eq!(names[0], "area");
        assert_eq!(names[16], "circumference");
        let computed = compute_descriptors(&unit_cube());
        assert!(computed.iter().map(|(n, _)| n).eq(names.iter().copied()));
    }

    #[test]
    fn unit_cube_ratios() {
        let d = compute_descriptors(&unit_cube());
        for name in ["convexity", "cubeness", "rectangularity", "cuboidindex"] {
            assert_relative_eq!(d.get(name).unwrap(), 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(
            d.get("hemisphericality").unwrap(),
            3.0 * (2.0 * PI).sqrt() / 6.0_f64.powf(1.5),
            epsilon = 1e-12
        );
        // ln(1) = 0.
        assert_relative_eq!(d.get("fractality").unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn a_sphere_is_maximally_circumferential() {
        let r: f64 = 2.0;
        let inputs = DescriptorInputs {
            area: 4.0 * PI * r * r,
            volume: 4.0 / 3.0 * PI * r.powi(3),
            equivalent_radius: r,
            ball_radius: r,
            ..DescriptorInputs::default()
        };
        let d = compute_descriptors(&inputs);
        assert_relative_eq!(d.get("circumference").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(d.get("range").unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn undefined_ratios_report_zero() {
        // No samples: every sample-based denominator is zero.
        let d = compute_descriptors(&unit_cube());
        for name in ["dispersion", "proximity", "spin", "cohesion"] {
            assert_eq!(d.get(name), Some(0.0), "{name}");
        }
    }

    #[test]
    fn empty_solid_reports_zero_everywhere() {
        let inputs = DescriptorInputs {
            empty: true,
            ..unit_cube()
        };
        let d = compute_descriptors(&inputs);
        assert_eq!(d.len(), DESCRIPTORS.len());
        assert!(d.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(compute_descriptors(&unit_cube()).get("sphericity").is_none());
    }
}
