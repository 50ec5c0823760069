//! Core data types shared by the resolver and the reconciler.
//!
//! This module defines:
//! - Geometric primitives (points)
//! - Nodal coordinates tagged by label and instance
//! - Field-value records as delivered by a result archive
//! - Sample positions within an element

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = Vector3<f64>;

/// A computed sample location (centroid or integration point).
pub type SamplePoint = Point3;

/// Where inside an element a field is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SamplePosition {
    /// Single point at the element center.
    Centroid,
    /// The element's quadrature points.
    IntegrationPoint,
}

/// Storage precision the archive used for a record.
///
/// Values are always widened to `f64` once read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Precision {
    /// 32-bit floats.
    Single,
    /// 64-bit floats.
    #[default]
    Double,
}

/// Coordinates of one node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodalCoordinate {
    /// Node label, unique within its instance.
    pub label: i64,
    /// Owning instance, if the archive reports one.
    pub instance: Option<String>,
    /// Position.
    pub xyz: Point3,
}

impl NodalCoordinate {
    /// Create a nodal coordinate.
    pub fn new(label: i64, instance: Option<&str>, xyz: Point3) -> Self {
        Self {
            label,
            instance: instance.map(str::to_owned),
            xyz,
        }
    }
}

/// Identifies an entity (node or element) across instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    /// Owning instance name.
    pub instance: String,
    /// Label within the instance.
    pub label: i64,
}

impl EntityKey {
    /// Create a new key.
    pub fn new(instance: impl Into<String>, label: i64) -> Self {
        Self {
            instance: instance.into(),
            label,
        }
    }
}

/// One field value for one sample of one entity.
///
/// Records for a multi-sample entity are contiguous in the archive's output,
/// but nothing marks where one entity stops and the next begins.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    /// Owning instance name.
    pub instance: String,
    /// Node or element label.
    pub label: i64,
    /// 1-based sample ordinal within the entity.
    pub sample: usize,
    /// Precision the archive stored the value in.
    pub precision: Precision,
    /// Field components.
    pub channels: Vec<f64>,
}

impl FieldRecord {
    /// Create a double precision record.
    pub fn new(instance: impl Into<String>, label: i64, sample: usize, channels: Vec<f64>) -> Self {
        Self {
            instance: instance.into(),
            label,
            sample,
            precision: Precision::Double,
            channels,
        }
    }

    /// Set the precision of the record.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Whether two records belong to the same entity.
    #[inline]
    pub fn same_entity(&self, other: &FieldRecord) -> bool {
        self.label == other.label && self.instance == other.instance
    }

    /// Key of the entity this record belongs to.
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.instance.clone(), self.label)
    }

    /// Interpret the first three channels as a position.
    ///
    /// Used for native coordinate fields, which carry one point per record.
    pub fn as_point(&self) -> Option<Point3> {
        match self.channels.as_slice() {
            [x, y, z, ..] => Some(Point3::new(*x, *y, *z)),
            [x, y] => Some(Point3::new(*x, *y, 0.0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_entity() {
        let a = FieldRecord::new("Part-1", 10, 1, vec![1.0]);
        let b = FieldRecord::new("Part-1", 10, 2, vec![2.0]);
        let c = FieldRecord::new("Part-2", 10, 1, vec![3.0]);
        assert!(a.same_entity(&b));
        assert!(!a.same_entity(&c));
    }

    #[test]
    fn test_record_as_point() {
        let r = FieldRecord::new("Part-1", 1, 1, vec![1.0, 2.0, 3.0]);
        assert_eq!(r.as_point(), Some(Point3::new(1.0, 2.0, 3.0)));

        // 2D coordinate fields lie in the z = 0 plane
        let r = FieldRecord::new("Part-1", 1, 1, vec![1.0, 2.0]);
        assert_eq!(r.as_point(), Some(Point3::new(1.0, 2.0, 0.0)));

        let r = FieldRecord::new("Part-1", 1, 1, vec![1.0]);
        assert_eq!(r.as_point(), None);
    }

    #[test]
    fn test_entity_key_ordering() {
        let mut keys = vec![
            EntityKey::new("B", 1),
            EntityKey::new("A", 2),
            EntityKey::new("A", 1),
        ];
        keys.sort();
        assert_eq!(keys[0], EntityKey::new("A", 1));
        assert_eq!(keys[2], EntityKey::new("B", 1));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_coordinates_are_serializable() {
        fn assert_serde<T: Serialize + for<'de> Deserialize<'de>>() {}
        assert_serde::<NodalCoordinate>();
        assert_serde::<crate::resolve::InstanceNodes>();
    }
}
