//! Element families and their shape functions.
//!
//! Archive element type names are resolved once into an [`ElementFamily`].
//! Each supported family maps to a [`ShapeFunctions`] implementation and to
//! the natural-coordinate tables in [`gauss`].
//!
//! # Submodules
//!
//! - [`gauss`] - Centroid and integration point tables
//! - [`hex8`], [`hex20`], [`tet4`], [`tet10`] - Shape function sets

use crate::types::SamplePosition;

pub mod gauss;
pub mod hex20;
pub mod hex8;
pub mod tet10;
pub mod tet4;

pub use gauss::GaussPoint;
pub use hex20::Hex20;
pub use hex8::Hex8;
pub use tet10::Tet10;
pub use tet4::Tet4;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Isoparametric interpolation for one element shape.
///
/// Implementations use the archive's native node ordering.
pub trait ShapeFunctions: Send + Sync {
    /// Number of nodes in this element.
    fn n_nodes(&self) -> usize;

    /// Number of natural coordinates (3 for hexahedra, 4 barycentric for
    /// tetrahedra).
    fn natural_dim(&self) -> usize;

    /// Evaluate one weight per node at a natural coordinate.
    ///
    /// `natural` must have exactly [`natural_dim`](Self::natural_dim) entries.
    fn weights(&self, natural: &[f64]) -> Vec<f64>;
}

/// Element families with a known shape-function set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementFamily {
    /// 8-node brick, full integration (C3D8, C3D8H).
    Hex8Linear,
    /// 8-node brick, reduced integration (C3D8R, C3D8RH).
    Hex8Reduced,
    /// 8-node brick with incompatible modes (C3D8I, C3D8IH).
    Hex8Incompatible,
    /// 20-node serendipity brick, reduced integration (C3D20R, C3D20RH).
    Hex20Serendipity,
    /// 4-node tetrahedron (C3D4, C3D4H).
    Tet4Linear,
    /// 10-node tetrahedron (C3D10, C3D10H, C3D10M, C3D10MH).
    Tet10Quadratic,
    /// Anything else; carries the archive's type name.
    Unsupported(String),
}

impl ElementFamily {
    /// Resolve an archive element type name.
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "C3D8" | "C3D8H" => ElementFamily::Hex8Linear,
            "C3D8R" | "C3D8RH" => ElementFamily::Hex8Reduced,
            "C3D8I" | "C3D8IH" => ElementFamily::Hex8Incompatible,
            "C3D20R" | "C3D20RH" => ElementFamily::Hex20Serendipity,
            "C3D4" | "C3D4H" => ElementFamily::Tet4Linear,
            "C3D10" | "C3D10H" | "C3D10M" | "C3D10MH" => ElementFamily::Tet10Quadratic,
            _ => ElementFamily::Unsupported(name.to_owned()),
        }
    }

    /// Whether a shape-function set exists for this family.
    pub fn is_supported(&self) -> bool {
        !matches!(self, ElementFamily::Unsupported(_))
    }

    /// Shape functions for this family.
    pub fn shape_functions(&self) -> Option<&'static dyn ShapeFunctions> {
        match self {
            ElementFamily::Hex8Linear
            | ElementFamily::Hex8Reduced
            | ElementFamily::Hex8Incompatible => Some(&Hex8),
            ElementFamily::Hex20Serendipity => Some(&Hex20),
            ElementFamily::Tet4Linear => Some(&Tet4),
            ElementFamily::Tet10Quadratic => Some(&Tet10),
            ElementFamily::Unsupported(_) => None,
        }
    }

    /// Number of nodes, or `None` for unsupported families.
    pub fn n_nodes(&self) -> Option<usize> {
        self.shape_functions().map(|sf| sf.n_nodes())
    }

    /// Natural-coordinate dimensionality, or `None` for unsupported families.
    pub fn natural_dim(&self) -> Option<usize> {
        self.shape_functions().map(|sf| sf.natural_dim())
    }

    /// Natural coordinates sampled at `position`.
    ///
    /// Unsupported families have no table and return an empty slice.
    pub fn natural_points(&self, position: SamplePosition) -> &'static [GaussPoint] {
        use SamplePosition::{Centroid, IntegrationPoint};
        match (self, position) {
            // Reduced bricks sample their single point at the centroid
            (ElementFamily::Hex8Reduced, _) => &gauss::HEX_CENTROID[..],
            (
                ElementFamily::Hex8Linear
                | ElementFamily::Hex8Incompatible
                | ElementFamily::Hex20Serendipity,
                Centroid,
            ) => &gauss::HEX_CENTROID[..],
            (
                ElementFamily::Hex8Linear
                | ElementFamily::Hex8Incompatible
                | ElementFamily::Hex20Serendipity,
                IntegrationPoint,
            ) => &gauss::HEX_2X2X2[..],
            (ElementFamily::Tet4Linear, _) => &gauss::TET_CENTROID[..],
            (ElementFamily::Tet10Quadratic, Centroid) => &gauss::TET_CENTROID[..],
            (ElementFamily::Tet10Quadratic, IntegrationPoint) => &gauss::TET_4POINT[..],
            (ElementFamily::Unsupported(_), _) => &[],
        }
    }

    /// Number of sample points produced at `position`.
    ///
    /// Unsupported families always produce a single (degenerate) point.
    pub fn sample_count(&self, position: SamplePosition) -> usize {
        self.natural_points(position).len().max(1)
    }
}

impl std::fmt::Display for ElementFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementFamily::Hex8Linear => write!(f, "Hex8"),
            ElementFamily::Hex8Reduced => write!(f, "Hex8R"),
            ElementFamily::Hex8Incompatible => write!(f, "Hex8I"),
            ElementFamily::Hex20Serendipity => write!(f, "Hex20R"),
            ElementFamily::Tet4Linear => write!(f, "Tet4"),
            ElementFamily::Tet10Quadratic => write!(f, "Tet10"),
            ElementFamily::Unsupported(name) => write!(f, "unsupported ({name})"),
        }
    }
}
