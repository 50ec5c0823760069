//! Element connectivity as reported by the result archive.
//!
//! Node labels are only unique within an instance, and an element may use
//! nodes of several instances, so every connectivity entry carries the
//! instance of each of its nodes.

use std::collections::HashMap;

use crate::archive::ResultArchive;
use crate::element::ElementFamily;
use crate::error::{Error, Result};
use crate::types::{EntityKey, FieldRecord, SamplePosition};

/// Element connectivity - ordered node labels for an element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementConnectivity {
    /// Archive element type name (e.g. `C3D8R`).
    pub element_type: String,
    /// Node labels in the element's native ordering.
    pub node_labels: Vec<i64>,
    /// Owning instance of each node, parallel to `node_labels`.
    pub node_instances: Vec<String>,
}

/// Nodes of one element that live in the same instance.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePartition {
    /// Instance owning the nodes.
    pub instance: String,
    /// Node labels, in element order.
    pub labels: Vec<i64>,
    /// Position of each label in the element's connectivity.
    pub positions: Vec<usize>,
}

impl ElementConnectivity {
    /// Create a connectivity entry whose nodes all belong to `instance`.
    pub fn new(element_type: impl Into<String>, instance: &str, node_labels: Vec<i64>) -> Self {
        let node_instances = vec![instance.to_owned(); node_labels.len()];
        Self {
            element_type: element_type.into(),
            node_labels,
            node_instances,
        }
    }

    /// Element family resolved from the type name.
    pub fn family(&self) -> ElementFamily {
        ElementFamily::from_type_name(&self.element_type)
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.node_labels.len()
    }

    /// Group node labels by owning instance.
    ///
    /// Partitions are listed in order of first appearance; `positions` lets
    /// the caller put resolved coordinates back in the original node order.
    pub fn partition_by_instance(&self) -> Result<Vec<NodePartition>> {
        if self.node_instances.len() != self.node_labels.len() {
            return Err(Error::StructuralInconsistency(format!(
                "element of type {} lists {} nodes but {} node instance names",
                self.element_type,
                self.node_labels.len(),
                self.node_instances.len()
            )));
        }

        let mut partitions: Vec<NodePartition> = Vec::new();
        for (pos, (&label, instance)) in self
            .node_labels
            .iter()
            .zip(&self.node_instances)
            .enumerate()
        {
            match partitions.iter_mut().find(|p| &p.instance == instance) {
                Some(p) => {
                    p.labels.push(label);
                    p.positions.push(pos);
                }
                None => partitions.push(NodePartition {
                    instance: instance.clone(),
                    labels: vec![label],
                    positions: vec![pos],
                }),
            }
        }
        Ok(partitions)
    }
}

/// Connectivity of every element referenced by a record batch.
#[derive(Debug, Clone, Default)]
pub struct ElementCatalog {
    elements: HashMap<EntityKey, ElementConnectivity>,
}

impl ElementCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch connectivity for each distinct element appearing in `records`.
    pub fn load<A: ResultArchive + ?Sized>(archive: &A, records: &[FieldRecord]) -> Result<Self> {
        let mut catalog = Self::new();
        let mut prev: Option<&FieldRecord> = None;
        for record in records {
            if prev.is_some_and(|p| p.same_entity(record)) {
                continue;
            }
            prev = Some(record);

            let key = record.key();
            if !catalog.elements.contains_key(&key) {
                let conn = archive.element_connectivity(&record.instance, record.label)?;
                catalog.elements.insert(key, conn);
            }
        }
        log::debug!("Loaded connectivity for {} elements", catalog.len());
        Ok(catalog)
    }

    /// Add or replace one element.
    pub fn insert(&mut self, key: EntityKey, connectivity: ElementConnectivity) {
        self.elements.insert(key, connectivity);
    }

    /// Connectivity of one element.
    pub fn get(&self, key: &EntityKey) -> Option<&ElementConnectivity> {
        self.elements.get(key)
    }

    /// Elements in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &ElementConnectivity)> {
        self.elements.iter()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Expected sample counts for the reconciler.
    pub fn hints(&self, position: SamplePosition) -> ShapeHints {
        let mut hints = ShapeHints::new(position);
        for (key, conn) in &self.elements {
            hints.insert(key.clone(), conn.family());
        }
        hints
    }
}

/// Element family of each entity, used to size entity runs.
#[derive(Debug, Clone)]
pub struct ShapeHints {
    position: SamplePosition,
    families: HashMap<EntityKey, ElementFamily>,
}

impl ShapeHints {
    /// Create empty hints for a sample position.
    pub fn new(position: SamplePosition) -> Self {
        Self {
            position,
            families: HashMap::new(),
        }
    }

    /// No hints at all; runs are delimited by label changes only.
    pub fn none() -> Self {
        Self::new(SamplePosition::Centroid)
    }

    /// Record the family of one entity.
    pub fn insert(&mut self, key: EntityKey, family: ElementFamily) {
        self.families.insert(key, family);
    }

    /// Record the family of one entity (builder form).
    pub fn with(mut self, key: EntityKey, family: ElementFamily) -> Self {
        self.insert(key, family);
        self
    }

    /// Number of samples the entity is expected to report.
    ///
    /// `None` when the entity is unknown or its family is unsupported; the
    /// run then ends only when the label changes.
    pub fn expected_samples(&self, key: &EntityKey) -> Option<usize> {
        self.families
            .get(key)
            .filter(|f| f.is_supported())
            .map(|f| f.sample_count(self.position))
    }
}
