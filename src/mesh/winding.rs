//! Consistent and outward triangle winding.

use std::collections::VecDeque;

use tracing::debug;

use super::adjacency::{edge_direction, edge_key, MeshAdjacency};
use super::TriangleMesh;
use crate::math::distance_3d::signed_tetra_volume;
use crate::math::{centroid, Point3};

/// Orients every connected component consistently and then outward.
///
/// Within a component, a BFS over shared edges flips each newly reached
/// face so that it traverses the shared edge opposite to its parent. A
/// component whose signed volume (measured against its own vertex
/// centroid) is negative is then flipped as a whole.
///
/// The traversal order only depends on the triangle order, so running this
/// on its own output flips nothing. Returns the number of flipped faces.
pub fn orient_outward(mesh: &mut TriangleMesh) -> usize {
    if mesh.triangles.is_empty() {
        return 0;
    }
    let components = fix_winding_order(&mut mesh.triangles);
    let bfs_flips = components.flipped;

    let mut outward_flips = 0;
    for component in &components.faces {
        if component_volume(mesh, component) < 0.0 {
            for &face in component {
                mesh.triangles[face as usize].swap(1, 2);
            }
            outward_flips += component.len();
        }
    }

    debug!(
        components = components.faces.len(),
        bfs_flips, outward_flips, "oriented triangle soup"
    );
    bfs_flips + outward_flips
}

struct Components {
    faces: Vec<Vec<u32>>,
    flipped: usize,
}

#[allow(clippy::cast_possible_truncation)]
fn fix_winding_order(triangles: &mut [[u32; 3]]) -> Components {
    let adjacency = MeshAdjacency::build(triangles);
    let mut visited = vec![false; triangles.len()];
    let mut components = Vec::new();
    let mut flipped = 0;

    for start in 0..triangles.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut component = vec![start as u32];
        let mut queue = VecDeque::from([start as u32]);

        while let Some(face) = queue.pop_front() {
            // `face` already carries its final winding here.
            let tri = triangles[face as usize];
            // Edges in key order so the traversal ignores the current winding.
            let mut edges = [
                edge_key(tri[0], tri[1]),
                edge_key(tri[1], tri[2]),
                edge_key(tri[2], tri[0]),
            ];
            edges.sort_unstable();
            for (a, b) in edges {
                let neighbors = adjacency.faces_of_edge(a, b);
                let forward = edge_direction(&tri, a, b);
                for &neighbor in neighbors {
                    if visited[neighbor as usize] {
                        continue;
                    }
                    visited[neighbor as usize] = true;
                    let other = &mut triangles[neighbor as usize];
                    if edge_direction(other, a, b) == forward {
                        other.swap(1, 2);
                        flipped += 1;
                    }
                    component.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }
        components.push(component);
    }

    Components {
        faces: components,
        flipped,
    }
}

fn component_volume(mesh: &TriangleMesh, faces: &[u32]) -> f64 {
    let vertices: Vec<Point3> = faces
        .iter()
        .flat_map(|&f| mesh.triangles[f as usize])
        .map(|i| mesh.points[i as usize])
        .collect();
    let apex = centroid(&vertices).unwrap_or_else(Point3::origin);
    faces
        .iter()
        .map(|&f| {
            let [a, b, c] = mesh.corners(f as usize);
            signed_tetra_volume(&apex, &a, &b, &c)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::box_mesh;

    #[test]
    fn consistent_box_is_untouched() {
        let mut mesh = box_mesh(1.0, 1.0, 1.0);
        let before = mesh.clone();
        assert_eq!(orient_outward(&mut mesh), 0);
        assert_eq!(mesh, before);
    }

    #[test]
    fn inverted_box_is_turned_outward() {
        let mut mesh = box_mesh(1.0, 2.0, 3.0);
        for tri in &mut mesh.triangles {
            tri.swap(1, 2);
        }
        assert!(mesh.signed_volume(&Point3::origin()) < 0.0);
        assert_eq!(orient_outward(&mut mesh), 12);
        assert!(mesh.signed_volume(&Point3::origin()) > 0.0);
    }

    #[test]
    fn single_flipped_face_is_fixed() {
        let mut mesh = box_mesh(1.0, 1.0, 1.0);
        mesh.triangles[7].swap(0, 1);
        orient_outward(&mut mesh);
        assert_eq!(mesh.triangles.len(), 12);
        assert!((mesh.signed_volume(&Point3::origin()) - 1.0).abs() < 1e-12);
        let adjacency = mesh.adjacency();
        for (&(a, b), faces) in &adjacency.edge_to_faces {
            let t0 = mesh.triangles[faces[0] as usize];
            let t1 = mesh.triangles[faces[1] as usize];
            assert_ne!(edge_direction(&t0, a, b), edge_direction(&t1, a, b));
        }
    }

    #[test]
    fn second_pass_flips_nothing() {
        let mut mesh = box_mesh(2.0, 1.0, 1.0);
        mesh.triangles[0].swap(1, 2);
        mesh.triangles[5].swap(1, 2);
        orient_outward(&mut mesh);
        assert_eq!(orient_outward(&mut mesh), 0);
    }
}
