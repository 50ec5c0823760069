//! Centroid and Gauss point tables in natural coordinates.
//!
//! Points are listed in the order the result archive reports integration
//! point values, so the n-th table entry corresponds to sample ordinal n+1.
//!
//! - Hexahedra: ξ, η, ζ ∈ [-1, 1]³, ξ varying fastest
//! - Tetrahedra: barycentric (L1, L2, L3, L4) with ΣLi = 1
//!
//! # Usage
//!
//! ```
//! use odbpost_core::element::gauss::{HEX_2X2X2, TET_4POINT};
//!
//! for gp in HEX_2X2X2.iter() {
//!     // gp.natural(3) gives (ξ, η, ζ)
//!     assert_eq!(gp.natural(3).len(), 3);
//! }
//! for gp in TET_4POINT.iter() {
//!     let sum: f64 = gp.natural(4).iter().sum();
//!     assert!((sum - 1.0).abs() < 1e-12);
//! }
//! ```

/// A Gauss quadrature point with natural coordinates and weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussPoint {
    /// Natural coordinates.
    /// - For hexahedral: [ξ, η, ζ, 0] in [-1, 1]³
    /// - For tetrahedral: [L1, L2, L3, L4] (barycentric, sum=1)
    pub coords: [f64; 4],
    /// Integration weight.
    pub weight: f64,
}

impl GaussPoint {
    /// Create a new Gauss point.
    pub const fn new(coords: [f64; 4], weight: f64) -> Self {
        Self { coords, weight }
    }

    /// The first `dim` natural coordinates.
    #[inline]
    pub fn natural(&self, dim: usize) -> &[f64] {
        &self.coords[..dim.min(4)]
    }
}

/// 1/√3, the 2-point Gauss-Legendre abscissa.
pub const INV_SQRT3: f64 = 0.577_350_269_189_625_8;

/// Major barycentric coordinate of the 4-point tetrahedral rule.
pub const TET_ALPHA: f64 = 0.585_410_20;

/// Minor barycentric coordinate of the 4-point tetrahedral rule.
pub const TET_BETA: f64 = 0.138_196_60;

const P: f64 = INV_SQRT3;
const M: f64 = -INV_SQRT3;

/// Hexahedral centroid, also the single point of reduced integration.
///
/// Weight = volume of [-1,1]³.
pub static HEX_CENTROID: [GaussPoint; 1] = [GaussPoint::new([0.0, 0.0, 0.0, 0.0], 8.0)];

/// 2×2×2 hexahedral Gauss rule (Hex8 full integration and Hex20R).
pub static HEX_2X2X2: [GaussPoint; 8] = [
    GaussPoint::new([M, M, M, 0.0], 1.0),
    GaussPoint::new([P, M, M, 0.0], 1.0),
    GaussPoint::new([M, P, M, 0.0], 1.0),
    GaussPoint::new([P, P, M, 0.0], 1.0),
    GaussPoint::new([M, M, P, 0.0], 1.0),
    GaussPoint::new([P, M, P, 0.0], 1.0),
    GaussPoint::new([M, P, P, 0.0], 1.0),
    GaussPoint::new([P, P, P, 0.0], 1.0),
];

/// Tetrahedral centroid, also the single point of the linear rule.
///
/// Weight = volume of the unit tetrahedron.
pub static TET_CENTROID: [GaussPoint; 1] =
    [GaussPoint::new([0.25, 0.25, 0.25, 1.0 - 0.25 - 0.25 - 0.25], 1.0 / 6.0)];

/// 4-point tetrahedral rule (degree 2) used by quadratic tetrahedra.
///
/// The fourth coordinate is dependent on the first three.
pub static TET_4POINT: [GaussPoint; 4] = [
    GaussPoint::new(
        [TET_ALPHA, TET_BETA, TET_BETA, 1.0 - TET_ALPHA - TET_BETA - TET_BETA],
        1.0 / 24.0,
    ),
    GaussPoint::new(
        [TET_BETA, TET_ALPHA, TET_BETA, 1.0 - TET_BETA - TET_ALPHA - TET_BETA],
        1.0 / 24.0,
    ),
    GaussPoint::new(
        [TET_BETA, TET_BETA, TET_ALPHA, 1.0 - TET_BETA - TET_BETA - TET_ALPHA],
        1.0 / 24.0,
    ),
    GaussPoint::new(
        [TET_BETA, TET_BETA, TET_BETA, 1.0 - TET_BETA - TET_BETA - TET_BETA],
        1.0 / 24.0,
    ),
];
