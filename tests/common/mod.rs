#![allow(dead_code, clippy::cast_possible_truncation)]

use shapeindex::math::Point3;
use shapeindex::topology::{BoundaryModel, GeometryId, Ring};

/// Installs a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn add_ring(model: &mut BoundaryModel, ring: &[(f64, f64)], z: f64) -> Vec<u32> {
    ring.iter()
        .map(|&(x, y)| model.add_point(Point3::new(x, y, z)))
        .collect()
}

/// Walls joining the bottom ring `b` to the top ring `t`, facing away from
/// the solid. `inner` walls bound a courtyard and face into it.
fn walls(b: &[u32], t: &[u32], inner: bool) -> Vec<Vec<Ring>> {
    let n = b.len();
    (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            let quad = if inner {
                vec![b[j], b[i], t[i], t[j]]
            } else {
                vec![b[i], b[j], t[j], t[i]]
            };
            vec![quad]
        })
        .collect()
}

/// Faces of a vertical prism over a counter-clockwise footprint with
/// counter-clockwise courtyards, outward wound: bottom, top, then walls.
pub fn prism_shell(
    model: &mut BoundaryModel,
    outer: &[(f64, f64)],
    holes: &[&[(f64, f64)]],
    height: f64,
) -> Vec<Vec<Ring>> {
    let outer_bottom = add_ring(model, outer, 0.0);
    let outer_top = add_ring(model, outer, height);
    let hole_rings: Vec<(Vec<u32>, Vec<u32>)> = holes
        .iter()
        .map(|h| (add_ring(model, h, 0.0), add_ring(model, h, height)))
        .collect();

    let mut bottom: Vec<Ring> = vec![outer_bottom.iter().rev().copied().collect()];
    let mut top: Vec<Ring> = vec![outer_top.clone()];
    for (b, t) in &hole_rings {
        bottom.push(b.iter().rev().copied().collect());
        top.push(t.clone());
    }

    let mut shell = vec![bottom, top];
    shell.extend(walls(&outer_bottom, &outer_top, false));
    for (b, t) in &hole_rings {
        shell.extend(walls(b, t, true));
    }
    shell
}

/// Adds a prism geometry to `model`.
pub fn add_prism(
    model: &mut BoundaryModel,
    id: &str,
    outer: &[(f64, f64)],
    holes: &[&[(f64, f64)]],
    height: f64,
) -> GeometryId {
    let shell = prism_shell(model, outer, holes, height);
    model.add_boundaries(id, "2.2", vec![shell])
}

pub const UNIT_SQUARE: [(f64, f64); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

pub const L_FOOTPRINT: [(f64, f64); 6] = [
    (0.0, 0.0),
    (2.0, 0.0),
    (2.0, 1.0),
    (1.0, 1.0),
    (1.0, 2.0),
    (0.0, 2.0),
];
