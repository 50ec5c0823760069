//! Linear 4-node tetrahedron. The weights are the barycentric coordinates.

use crate::element::ShapeFunctions;

/// Linear tetrahedron shape functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tet4;

impl Tet4 {
    /// Weights of the 4 vertices at barycentric (L1, L2, L3, L4).
    pub fn shape_functions(l: [f64; 4]) -> [f64; 4] {
        l
    }
}

impl ShapeFunctions for Tet4 {
    fn n_nodes(&self) -> usize {
        4
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

    #[test]
    fn test_weights_equal_barycentric_coordinates() {
        assert_eq!(Tet4.weights(&[0.1, 0.2, 0.3, 0.4]), vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(Tet4::shape_functions([0.25; 4]), [0.25; 4]);
    }
}
