use std::collections::HashMap;

/// Undirected edge key with the smaller vertex first.
pub(crate) fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Edge-to-face incidence of an indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct MeshAdjacency {
    /// Faces incident to each undirected edge, in triangle order.
    pub edge_to_faces: HashMap<(u32, u32), Vec<u32>>,
}

impl MeshAdjacency {
    /// Builds the adjacency of `triangles`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn build(triangles: &[[u32; 3]]) -> Self {
        let mut edge_to_faces: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
        for (face, tri) in triangles.iter().enumerate() {
            for i in 0..3 {
                edge_to_faces
                    .entry(edge_key(tri[i], tri[(i + 1) % 3]))
                    .or_default()
                    .push(face as u32);
            }
        }
        Self { edge_to_faces }
    }

    /// Faces sharing the undirected edge `a-b`.
    #[must_use]
    pub fn faces_of_edge(&self, a: u32, b: u32) -> &[u32] {
        self.edge_to_faces
            .get(&edge_key(a, b))
            .map_or(&[], Vec::as_slice)
    }

    /// Edges used by exactly one face, as undirected keys.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(&edge, _)| edge)
    }

    /// Edges used by more than two faces.
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() > 2)
            .map(|(&edge, _)| edge)
    }

    /// Whether no edge is a boundary edge.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.boundary_edges().next().is_none()
    }
}

/// Whether `tri` runs along `a -> b`. `None` when the edge is not in `tri`.
pub(crate) fn edge_direction(tri: &[u32; 3], a: u32, b: u32) -> Option<bool> {
    for i in 0..3 {
        let (u, v) = (tri[i], tri[(i + 1) % 3]);
        if u == a && v == b {
            return Some(true);
        }
        if u == b && v == a {
            return Some(false);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_triangles_share_one_edge() {
        let adjacency = MeshAdjacency::build(&[[0, 1, 2], [1, 0, 3]]);
        assert_eq!(adjacency.faces_of_edge(1, 0), &[0, 1]);
        assert_eq!(adjacency.boundary_edges().count(), 4);
        assert!(!adjacency.is_closed());
    }

    #[test]
    fn fin_edge_is_non_manifold() {
        let adjacency = MeshAdjacency::build(&[[0, 1, 2], [1, 0, 3], [0, 1, 4]]);
        let fins: Vec<_> = adjacency.non_manifold_edges().collect();
        assert_eq!(fins, vec![(0, 1)]);
    }

    #[test]
    fn directions() {
        assert_eq!(edge_direction(&[0, 1, 2], 2, 0), Some(true));
        assert_eq!(edge_direction(&[0, 1, 2], 0, 2), Some(false));
        assert_eq!(edge_direction(&[0, 1, 2], 0, 3), None);
    }
}
