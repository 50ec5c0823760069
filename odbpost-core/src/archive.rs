//! Interface to the simulation result archive.
//!
//! The archive itself (file format, upgrades, key enumeration) lives outside
//! this crate. Everything the engine needs from it goes through
//! [`ResultArchive`]; [`memory::MemoryArchive`] holds already decoded data.

use crate::error::Result;
use crate::mesh::ElementConnectivity;
use crate::types::{FieldRecord, NodalCoordinate, SamplePosition};

pub mod memory;

pub use memory::MemoryArchive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Field holding nodal displacements.
pub const DISPLACEMENT_FIELD: &str = "U";

/// Field holding current coordinates, when the analysis requested it.
pub const COORDINATE_FIELD: &str = "COORD";

/// Selects an analysis step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StepKey {
    /// Position in step order; negative values count from the end.
    Index(isize),
    /// Step name.
    Name(String),
}

/// Selects a frame within a step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameKey {
    /// Position in frame order; negative values count from the end.
    Index(isize),
    /// Step time; the closest frame is used.
    Time(f64),
}

/// A resolved (step, frame) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRef {
    /// Step position.
    pub step: usize,
    /// Frame position within the step.
    pub frame: usize,
}

/// Where field values are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldPosition {
    /// At the nodes.
    Nodal,
    /// Integration point values extrapolated to the nodes, unaveraged.
    ElementNodal,
    /// At the element centroid.
    Centroid,
    /// At each integration point.
    IntegrationPoint,
}

impl FieldPosition {
    /// The element sample position, for element-based positions.
    pub fn sample_position(self) -> Option<SamplePosition> {
        match self {
            FieldPosition::Centroid => Some(SamplePosition::Centroid),
            FieldPosition::IntegrationPoint => Some(SamplePosition::IntegrationPoint),
            FieldPosition::Nodal | FieldPosition::ElementNodal => None,
        }
    }

    /// Whether values are reported per node.
    pub fn is_nodal(self) -> bool {
        matches!(self, FieldPosition::Nodal | FieldPosition::ElementNodal)
    }
}

impl From<SamplePosition> for FieldPosition {
    fn from(position: SamplePosition) -> Self {
        match position {
            SamplePosition::Centroid => FieldPosition::Centroid,
            SamplePosition::IntegrationPoint => FieldPosition::IntegrationPoint,
        }
    }
}

/// Labels belonging to one instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LabelGroup {
    /// Instance name.
    pub instance: String,
    /// Node or element labels.
    pub labels: Vec<i64>,
}

impl LabelGroup {
    /// Create a label group.
    pub fn new(instance: impl Into<String>, labels: Vec<i64>) -> Self {
        Self {
            instance: instance.into(),
            labels,
        }
    }
}

/// The entities a query covers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Region {
    /// A node or element set stored in the archive.
    Named(String),
    /// Explicit labels per instance.
    Labels(Vec<LabelGroup>),
}

/// A resolved node or element set, partitioned by instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySet {
    /// Label groups, one per instance.
    pub groups: Vec<LabelGroup>,
}

impl EntitySet {
    /// Create a set from label groups.
    pub fn new(groups: Vec<LabelGroup>) -> Self {
        Self { groups }
    }

    /// A set spanning a single instance.
    pub fn single(instance: impl Into<String>, labels: Vec<i64>) -> Self {
        Self::new(vec![LabelGroup::new(instance, labels)])
    }

    /// Total number of entities.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.labels.len()).sum()
    }

    /// Whether the set holds no entities.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Instance names, in set order.
    pub fn instance_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.instance.as_str())
    }

    /// Whether the set contains an entity.
    pub fn contains(&self, instance: &str, label: i64) -> bool {
        self.groups
            .iter()
            .any(|g| g.instance == instance && g.labels.contains(&label))
    }
}

/// Read access to a simulation result archive.
pub trait ResultArchive {
    /// Resolve a step/frame selection.
    fn resolve_frame(&self, step: &StepKey, frame: &FrameKey) -> Result<FrameRef>;

    /// Resolve a region into a node set.
    fn node_set(&self, region: &Region) -> Result<EntitySet>;

    /// Resolve a region into an element set.
    fn element_set(&self, region: &Region) -> Result<EntitySet>;

    /// Undeformed coordinates of the given nodes of one instance, in the
    /// order requested.
    fn nodal_coordinates(&self, instance: &str, labels: &[i64]) -> Result<Vec<NodalCoordinate>>;

    /// Connectivity of one element.
    fn element_connectivity(&self, instance: &str, label: i64) -> Result<ElementConnectivity>;

    /// Whether a field exists in a frame.
    fn has_field(&self, frame: FrameRef, field: &str) -> bool;

    /// Field values of `field` over `set`, in archive order.
    fn field_records(
        &self,
        frame: FrameRef,
        set: &EntitySet,
        field: &str,
        position: FieldPosition,
    ) -> Result<Vec<FieldRecord>>;

    /// Current coordinates, aligned record-for-record with
    /// [`field_records`](Self::field_records) over the same set and position.
    fn native_coordinates(
        &self,
        frame: FrameRef,
        set: &EntitySet,
        position: FieldPosition,
    ) -> Result<Vec<FieldRecord>> {
        self.field_records(frame, set, COORDINATE_FIELD, position)
    }

    /// `(time, value)` pairs of one history output of a step.
    ///
    /// `region` names the history region (e.g. `Node PART-1.12`), `output`
    /// the variable within it (e.g. `RF2`).
    fn history_output(
        &self,
        step: &StepKey,
        region: &str,
        output: &str,
    ) -> Result<Vec<(f64, f64)>>;
}
