//! Serendipity 20-node brick (C3D20R).
//!
//! Eight corners and twelve mid-edge nodes. With `s_a = ξ_a ξ + η_a η + ζ_a ζ`:
//!
//! ```text
//! corner a:              (1 + ξ_a ξ)(1 + η_a η)(1 + ζ_a ζ)(s_a - 2) / 8
//! mid-edge a, ξ_a = 0:   (1 - ξ²)(1 + η_a η)(1 + ζ_a ζ) / 4
//! ```
//!
//! and likewise for nodes with η_a = 0 or ζ_a = 0. Mid-edge nodes are listed
//! bottom face, top face, then vertical edges.
//!
//! ```text
//!        8-----15------7
//!       /|            /|
//!     16 |          14 |
//!     /  20         /  19
//!    5-----13------6   |
//!    |   |         |   |
//!    |   4-----11--|---3
//!   17  /         18  /
//!    | 12          | 10
//!    |/            |/
//!    1------9------2
//! ```

use crate::element::ShapeFunctions;

/// Natural coordinates (ξ, η, ζ) for each of the 20 nodes.
pub const NODE_COORDS: [[f64; 3]; 20] = [
    // Corner nodes (same ordering as Hex8)
    [-1.0, -1.0, -1.0], // 1
    [1.0, -1.0, -1.0],  // 2
    [1.0, 1.0, -1.0],   // 3
    [-1.0, 1.0, -1.0],  // 4
    [-1.0, -1.0, 1.0],  // 5
    [1.0, -1.0, 1.0],   // 6
    [1.0, 1.0, 1.0],    // 7
    [-1.0, 1.0, 1.0],   // 8
    // Mid-edge nodes on the bottom face (ζ = -1)
    [0.0, -1.0, -1.0], // 9  (edge 1-2)
    [1.0, 0.0, -1.0],  // 10 (edge 2-3)
    [0.0, 1.0, -1.0],  // 11 (edge 3-4)
    [-1.0, 0.0, -1.0], // 12 (edge 4-1)
    // Mid-edge nodes on the top face (ζ = +1)
    [0.0, -1.0, 1.0], // 13 (edge 5-6)
    [1.0, 0.0, 1.0],  // 14 (edge 6-7)
    [0.0, 1.0, 1.0],  // 15 (edge 7-8)
    [-1.0, 0.0, 1.0], // 16 (edge 8-5)
    // Mid-edge nodes on vertical edges (ζ = 0)
    [-1.0, -1.0, 0.0], // 17 (edge 1-5)
    [1.0, -1.0, 0.0],  // 18 (edge 2-6)
    [1.0, 1.0, 0.0],   // 19 (edge 3-7)
    [-1.0, 1.0, 0.0],  // 20 (edge 4-8)
];

/// Serendipity brick shape functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hex20;

impl Hex20 {
    /// Weights of the 20 nodes at (ξ, η, ζ).
    pub fn shape_functions(xi: f64, eta: f64, zeta: f64) -> [f64; 20] {
        let p = [xi, eta, zeta];
        let mut n = [0.0; 20];
        for (w, node) in n.iter_mut().zip(NODE_COORDS.iter()) {
            // (1 - x²) along the axis a mid-edge node is centered on
            let factor = |d: usize| {
                if node[d] == 0.0 {
                    1.0 - p[d] * p[d]
                } else {
                    1.0 + node[d] * p[d]
                }
            };
            let product = factor(0) * factor(1) * factor(2);

            *w = if node.contains(&0.0) {
                product / 4.0
            } else {
                let s = node[0] * xi + node[1] * eta + node[2] * zeta;
                product * (s - 2.0) / 8.0
            };
        }
        n
    }
}

impl ShapeFunctions for Hex20 {
    fn n_nodes(&self) -> usize {
        NODE_COORDS.len()
    }

    fn natural_dim(&self) -> usize {
        3
    }

    fn weights(&self, natural: &[f64]) -> Vec<f64> {
        Self::shape_functions(natural[0], natural[1], natural[2]).to_vec()
    }
}
