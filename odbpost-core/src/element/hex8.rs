//! Trilinear 8-node brick.
//!
//! Used by C3D8, C3D8R and C3D8I alike: the shape functions are the same,
//! only the sampled natural points differ (see [`ElementFamily`]).
//!
//! ```text
//! N_a(ξ, η, ζ) = (1 + ξ_a ξ)(1 + η_a η)(1 + ζ_a ζ) / 8
//! ```
//!
//! Corners 1-4 lie on the ζ = -1 face, counter-clockwise seen from +ζ,
//! starting at (-1, -1). Corners 5-8 repeat the pattern on ζ = +1.
//!
//! [`ElementFamily`]: crate::element::ElementFamily

use crate::element::ShapeFunctions;

/// Natural coordinates (ξ, η, ζ) of the corners, in archive order.
pub const NODE_COORDS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Trilinear brick shape functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hex8;

impl Hex8 {
    /// Weights of the 8 corners at (ξ, η, ζ).
    pub fn shape_functions(xi: f64, eta: f64, zeta: f64) -> [f64; 8] {
        NODE_COORDS.map(|[a, b, c]| (1.0 + a * xi) * (1.0 + b * eta) * (1.0 + c * zeta) / 8.0)
    }
}

impl ShapeFunctions for Hex8 {
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
