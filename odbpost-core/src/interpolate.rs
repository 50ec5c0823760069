//! Physical coordinates of element sample points.
//!
//! Given an element's current nodal coordinates (in the archive's node order)
//! the physical location of a natural coordinate is the shape-function
//! weighted sum of the nodes:
//!
//! ```text
//! x(ξ) = Σ N_i(ξ) x_i
//! ```

use crate::element::{ElementFamily, ShapeFunctions};
use crate::error::{Error, Result};
use crate::types::{Point3, SamplePosition};

/// Sample points computed for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledPoints {
    /// Physical coordinates, in sample ordinal order.
    pub points: Vec<Point3>,
}

impl SampledPoints {
    /// Number of sample points.
    pub fn count(&self) -> usize {
        self.points.len()
    }
}

/// Evaluate the centroid or integration point locations of one element.
///
/// Unsupported families log a warning and yield one point at the origin so
/// that a batch extraction keeps running.
///
/// # Errors
///
/// [`Error::InvalidInput`] if `nodal_coords` does not hold exactly one
/// coordinate per node of `family`.
pub fn evaluate(
    family: &ElementFamily,
    nodal_coords: &[Point3],
    position: SamplePosition,
) -> Result<SampledPoints> {
    let Some(sf) = family.shape_functions() else {
        log::warn!("Element type {family} is not supported, writing zeros for its coordinates");
        return Ok(SampledPoints {
            points: vec![Point3::zeros()],
        });
    };
    check_node_count(family, sf, nodal_coords)?;

    let dim = sf.natural_dim();
    let points = family
        .natural_points(position)
        .iter()
        .map(|gp| weighted_sum(&sf.weights(gp.natural(dim)), nodal_coords))
        .collect();

    Ok(SampledPoints { points })
}

/// Shape-function weights of `family` at an arbitrary natural coordinate.
///
/// # Errors
///
/// - [`Error::UnsupportedElementType`] for families without shape functions
/// - [`Error::InvalidInput`] if `natural` has the wrong dimensionality
pub fn shape_function_weights(family: &ElementFamily, natural: &[f64]) -> Result<Vec<f64>> {
    let sf = family
        .shape_functions()
        .ok_or_else(|| Error::UnsupportedElementType(family.to_string()))?;

    if natural.len() != sf.natural_dim() {
        return Err(Error::InvalidInput(format!(
            "{} expects {} natural coordinates, got {}",
            family,
            sf.natural_dim(),
            natural.len()
        )));
    }

    Ok(sf.weights(natural))
}

/// Map one natural coordinate of an element to physical space.
pub fn interpolate_at(
    family: &ElementFamily,
    nodal_coords: &[Point3],
    natural: &[f64],
) -> Result<Point3> {
    let weights = shape_function_weights(family, natural)?;
    if nodal_coords.len() != weights.len() {
        return Err(node_count_error(family, weights.len(), nodal_coords.len()));
    }
    Ok(weighted_sum(&weights, nodal_coords))
}

fn check_node_count(
    family: &ElementFamily,
    sf: &dyn ShapeFunctions,
    nodal_coords: &[Point3],
) -> Result<()> {
    if nodal_coords.len() != sf.n_nodes() {
        return Err(node_count_error(family, sf.n_nodes(), nodal_coords.len()));
    }
    Ok(())
}

fn node_count_error(family: &ElementFamily, expected: usize, got: usize) -> Error {
    Error::InvalidInput(format!(
        "Element type {family} requires {expected} nodal coordinates, got {got}"
    ))
}

fn weighted_sum(weights: &[f64], nodal_coords: &[Point3]) -> Point3 {
    weights
        .iter()
        .zip(nodal_coords)
        .fold(Point3::zeros(), |acc, (&w, x)| acc + x * w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{hex20, hex8, tet10};
    use approx::assert_relative_eq;

    const SUPPORTED: [ElementFamily; 6] = [
        ElementFamily::Hex8Linear,
        ElementFamily::Hex8Reduced,
        ElementFamily::Hex8Incompatible,
        ElementFamily::Hex20Serendipity,
        ElementFamily::Tet4Linear,
        ElementFamily::Tet10Quadratic,
    ];

    /// Cube with corners at ±1, so physical and natural coordinates agree.
    fn bi_unit_hex8() -> Vec<Point3> {
        hex8::NODE_COORDS
            .iter()
            .map(|&[x, y, z]| Point3::new(x, y, z))
            .collect()
    }

    /// Distorted brick, corner nodes only.
    fn skewed_hex8() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.1, 0.0),
            Point3::new(2.2, 1.5, 0.1),
            Point3::new(-0.1, 1.2, 0.0),
            Point3::new(0.1, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.3),
            Point3::new(2.1, 1.4, 1.2),
            Point3::new(0.0, 1.1, 0.9),
        ]
    }

    fn unit_tet4() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]
    }

    /// Physical nodes obtained by mapping natural node positions through an
    /// affine map, so every node sits where its natural coordinate says.
    fn affine_hex20() -> Vec<Point3> {
        hex20::NODE_COORDS
            .iter()
            .map(|&[xi, eta, zeta]| {
                Point3::new(3.0 + 2.0 * xi, -1.0 + 0.5 * eta, 4.0 * zeta + 0.25 * xi)
            })
            .collect()
    }

    fn affine_tet10() -> Vec<Point3> {
        let corners = unit_tet4();
        tet10::NODE_COORDS
            .iter()
            .map(|l| (0..4).fold(Point3::zeros(), |acc, k| acc + corners[k] * l[k] * 2.0))
            .collect()
    }

    #[test]
    fn test_partition_of_unity_at_every_table_point() {
        use SamplePosition::{Centroid, IntegrationPoint};

        for family in SUPPORTED.iter() {
            let dim = family.natural_dim().unwrap();
            for position in [Centroid, IntegrationPoint] {
                for gp in family.natural_points(position) {
                    let w = shape_function_weights(family, gp.natural(dim)).unwrap();
                    let sum: f64 = w.iter().sum();
                    assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_hex8_reproduces_corner_nodes() {
        let coords = skewed_hex8();
        for i in 0..8 {
            let natural = hex8::NODE_COORDS[i];
            let x = interpolate_at(&ElementFamily::Hex8Linear, &coords, &natural).unwrap();
            assert_relative_eq!(x, coords[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tet4_reproduces_vertices() {
        let coords = vec![
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(4.0, 2.0, 3.0),
            Point3::new(1.0, 6.0, 3.0),
            Point3::new(1.0, 2.0, 8.0),
        ];
        for i in 0..4 {
            let mut natural = [0.0; 4];
            natural[i] = 1.0;
            let x = interpolate_at(&ElementFamily::Tet4Linear, &coords, &natural).unwrap();
            assert_relative_eq!(x, coords[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_hex20_reproduces_nodes() {
        let coords = affine_hex20();
        for (i, natural) in hex20::NODE_COORDS.iter().enumerate() {
            let x = interpolate_at(&ElementFamily::Hex20Serendipity, &coords, natural).unwrap();
            assert_relative_eq!(x, coords[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tet10_reproduces_nodes() {
        let coords = affine_tet10();
        for (i, natural) in tet10::NODE_COORDS.iter().enumerate() {
            let x = interpolate_at(&ElementFamily::Tet10Quadratic, &coords, natural).unwrap();
            assert_relative_eq!(x, coords[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_centroid_equals_integration_point_for_single_point_families() {
        let hex = skewed_hex8();
        let tet = unit_tet4();
        for (family, coords) in [
            (ElementFamily::Hex8Reduced, &hex),
            (ElementFamily::Tet4Linear, &tet),
            (ElementFamily::from_type_name("C3D4H"), &tet),
        ] {
            let c = evaluate(&family, coords, SamplePosition::Centroid).unwrap();
            let ip = evaluate(&family, coords, SamplePosition::IntegrationPoint).unwrap();
            assert_eq!(c.count(), 1);
            assert_eq!(c, ip);
        }
    }

    #[test]
    fn test_unit_cube_integration_points() {
        let coords = bi_unit_hex8();
        let sampled =
            evaluate(&ElementFamily::Hex8Linear, &coords, SamplePosition::IntegrationPoint)
                .unwrap();
        assert_eq!(sampled.count(), 8);

        let g = 1.0 / 3.0_f64.sqrt();
        for (k, p) in sampled.points.iter().enumerate() {
            // ξ varies fastest, then η, then ζ
            let signs = [
                if k & 1 == 0 { -1.0 } else { 1.0 },
                if k & 2 == 0 { -1.0 } else { 1.0 },
                if k & 4 == 0 { -1.0 } else { 1.0 },
            ];
            for d in 0..3 {
                assert_relative_eq!(p[d], signs[d] * g, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_hex20_centroid_of_affine_element() {
        let coords = affine_hex20();
        let sampled =
            evaluate(&ElementFamily::Hex20Serendipity, &coords, SamplePosition::Centroid).unwrap();
        assert_eq!(sampled.count(), 1);
        assert_relative_eq!(sampled.points[0], Point3::new(3.0, -1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_tet10_integration_points_inside_element() {
        let coords = affine_tet10();
        let sampled =
            evaluate(&ElementFamily::Tet10Quadratic, &coords, SamplePosition::IntegrationPoint)
                .unwrap();
        assert_eq!(sampled.count(), 4);

        // Straight-sided element: the mapping is affine, so the points average
        // to the centroid of the (scaled) tetrahedron.
        let mean = sampled.points.iter().sum::<Point3>() / 4.0;
        assert_relative_eq!(mean, Point3::new(0.5, 0.5, 0.5), epsilon = 1e-7);
    }

    #[test]
    fn test_unsupported_family_yields_origin() {
        let family = ElementFamily::from_type_name("S4R");
        let coords = vec![Point3::new(1.0, 1.0, 1.0); 4];
        let sampled = evaluate(&family, &coords, SamplePosition::IntegrationPoint).unwrap();
        assert_eq!(sampled.points, vec![Point3::zeros()]);
        assert_eq!(sampled.count(), 1);
    }

    #[test]
    fn test_wrong_node_count_is_invalid_input() {
        let coords = unit_tet4();
        let err = evaluate(&ElementFamily::Hex8Linear, &coords, SamplePosition::Centroid)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_wrong_natural_dim_is_invalid_input() {
        let err = shape_function_weights(&ElementFamily::Tet10Quadratic, &[0.0, 0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = shape_function_weights(&ElementFamily::Unsupported("T3D2".into()), &[0.0])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedElementType(_)));
    }
}
