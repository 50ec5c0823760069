//! Quadratic 10-node tetrahedron.
//!
//! In barycentric coordinates L1..L4 (summing to 1):
//!
//! ```text
//! vertex a:        N_a  = L_a (2 L_a - 1)
//! edge (a, b):     N_ab = 4 L_a L_b
//! ```
//!
//! Nodes 5-10 sit on edges 1-2, 2-3, 3-1, 1-4, 2-4, 3-4, in that order.

use crate::element::ShapeFunctions;

/// Vertex pairs spanned by the mid-edge nodes 5-10 (0-based).
pub const EDGES: [[usize; 2]; 6] = [[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]];

/// Barycentric coordinates of the 10 nodes, in archive order.
pub const NODE_COORDS: [[f64; 4]; 10] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
    [0.5, 0.5, 0.0, 0.0],
    [0.0, 0.5, 0.5, 0.0],
    [0.5, 0.0, 0.5, 0.0],
    [0.5, 0.0, 0.0, 0.5],
    [0.0, 0.5, 0.0, 0.5],
    [0.0, 0.0, 0.5, 0.5],
];

/// Quadratic tetrahedron shape functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tet10;

impl Tet10 {
    /// Weights of the 10 nodes at barycentric `l`.
    pub fn shape_functions(l: [f64; 4]) -> [f64; 10] {
        let mut n = [0.0; 10];
        for (a, &la) in l.iter().enumerate() {
            n[a] = la * (2.0 * la - 1.0);
        }
        for (e, &[a, b]) in EDGES.iter().enumerate() {
            n[4 + e] = 4.0 * l[a] * l[b];
        }
        n
    }
}

impl ShapeFunctions for Tet10 {
    fn n_nodes(&self) -> usize {
        10
    }

    fn natural_dim(&self) -> usize {
        4
    }

    fn weights(&self, natural: &[f64]) -> Vec<f64> {
        Self::shape_functions([natural[0], natural[1], natural[2], natural[3]]).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_edge_nodes_lie_between_their_vertices() {
        for (e, &[a, b]) in EDGES.iter().enumerate() {
            let mid = NODE_COORDS[4 + e];
            for k in 0..4 {
                let expected = 0.5 * (NODE_COORDS[a][k] + NODE_COORDS[b][k]);
                assert_eq!(mid[k], expected);
            }
        }
    }

    #[test]
    fn test_nodal_values_are_kronecker() {
        for (a, &l) in NODE_COORDS.iter().enumerate() {
            let n = Tet10::shape_functions(l);
            for (b, &v) in n.iter().enumerate() {
                assert_relative_eq!(v, if a == b { 1.0 } else { 0.0 }, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_vertices_negative_at_centroid() {
        let n = Tet10::shape_functions([0.25; 4]);
        assert!(n[..4].iter().all(|&v| (v + 0.125).abs() < 1e-15));
        assert!(n[4..].iter().all(|&v| (v - 0.25).abs() < 1e-15));
        let interior: f64 = Tet10.weights(&[0.1, 0.2, 0.3, 0.4]).iter().sum();
        assert_relative_eq!(interior, 1.0, epsilon = 1e-14);
    }
}
