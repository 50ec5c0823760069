//! In-memory result archive.
//!
//! Holds geometry, sets and field records that were already decoded by some
//! other reader. Field records are returned in insertion order, which plays
//! the role of the archive's native ordering.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::archive::{
    EntitySet, FieldPosition, FrameKey, FrameRef, Region, ResultArchive, StepKey,
};
use crate::error::{Error, Result};
use crate::mesh::ElementConnectivity;
use crate::types::{FieldRecord, NodalCoordinate, Point3};

#[derive(Debug, Clone, Default)]
struct InstanceData {
    nodes: HashMap<i64, Point3>,
    elements: HashMap<i64, ElementConnectivity>,
}

#[derive(Debug, Clone)]
struct Frame {
    time: f64,
    fields: HashMap<(String, FieldPosition), Vec<FieldRecord>>,
}

#[derive(Debug, Clone)]
struct Step {
    name: String,
    frames: Vec<Frame>,
    history: HashMap<(String, String), Vec<(f64, f64)>>,
}

/// Result archive backed by in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    instances: BTreeMap<String, InstanceData>,
    node_sets: HashMap<String, EntitySet>,
    element_sets: HashMap<String, EntitySet>,
    steps: Vec<Step>,
}

impl MemoryArchive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with its undeformed coordinates.
    pub fn add_node(&mut self, instance: &str, label: i64, xyz: Point3) {
        self.instance_mut(instance).nodes.insert(label, xyz);
    }

    /// Add several nodes of one instance.
    pub fn add_nodes(&mut self, instance: &str, nodes: impl IntoIterator<Item = (i64, Point3)>) {
        self.instance_mut(instance).nodes.extend(nodes);
    }

    /// Add an element.
    pub fn add_element(&mut self, instance: &str, label: i64, connectivity: ElementConnectivity) {
        self.instance_mut(instance)
            .elements
            .insert(label, connectivity);
    }

    /// Register a named node set.
    pub fn add_node_set(&mut self, name: &str, set: EntitySet) {
        self.node_sets.insert(name.to_owned(), set);
    }

    /// Register a named element set.
    pub fn add_element_set(&mut self, name: &str, set: EntitySet) {
        self.element_sets.insert(name.to_owned(), set);
    }

    /// Append a step, returning its position.
    pub fn add_step(&mut self, name: &str) -> usize {
        self.steps.push(Step {
            name: name.to_owned(),
            frames: Vec::new(),
            history: HashMap::new(),
        });
        self.steps.len() - 1
    }

    /// Append a frame at `time` to a step.
    pub fn add_frame(&mut self, step: usize, time: f64) -> Result<FrameRef> {
        let s = self
            .steps
            .get_mut(step)
            .ok_or_else(|| Error::Archive(format!("step {step} does not exist")))?;
        s.frames.push(Frame {
            time,
            fields: HashMap::new(),
        });
        Ok(FrameRef {
            step,
            frame: s.frames.len() - 1,
        })
    }

    /// Store the records of a field output, in archive order.
    pub fn add_field(
        &mut self,
        frame: FrameRef,
        field: &str,
        position: FieldPosition,
        records: Vec<FieldRecord>,
    ) -> Result<()> {
        let f = self.frame_mut(frame)?;
        f.fields.insert((field.to_owned(), position), records);
        Ok(())
    }

    /// Store a history output of a step as `(time, value)` pairs.
    pub fn add_history_output(
        &mut self,
        step: usize,
        region: &str,
        output: &str,
        data: Vec<(f64, f64)>,
    ) -> Result<()> {
        let s = self
            .steps
            .get_mut(step)
            .ok_or_else(|| Error::Archive(format!("step {step} does not exist")))?;
        s.history.insert((region.to_owned(), output.to_owned()), data);
        Ok(())
    }

    fn resolve_step(&self, step: &StepKey) -> Result<usize> {
        match step {
            StepKey::Index(i) => wrap_index(*i, self.steps.len()),
            StepKey::Name(name) => self.steps.iter().position(|s| &s.name == name),
        }
        .ok_or_else(|| Error::Archive(format!("step {step:?} does not exist")))
    }

    fn instance_mut(&mut self, instance: &str) -> &mut InstanceData {
        self.instances.entry(instance.to_owned()).or_default()
    }

    fn instance(&self, instance: &str) -> Result<&InstanceData> {
        self.instances
            .get(instance)
            .ok_or_else(|| Error::Archive(format!("instance {instance:?} does not exist")))
    }

    fn frame(&self, frame: FrameRef) -> Result<&Frame> {
        self.steps
            .get(frame.step)
            .and_then(|s| s.frames.get(frame.frame))
            .ok_or_else(|| Error::Archive(format!("frame {frame:?} does not exist")))
    }

    fn frame_mut(&mut self, frame: FrameRef) -> Result<&mut Frame> {
        self.steps
            .get_mut(frame.step)
            .and_then(|s| s.frames.get_mut(frame.frame))
            .ok_or_else(|| Error::Archive(format!("frame {frame:?} does not exist")))
    }

    fn resolve_set(
        sets: &HashMap<String, EntitySet>,
        region: &Region,
        kind: &str,
    ) -> Result<EntitySet> {
        match region {
            Region::Named(name) => sets
                .get(name)
                .cloned()
                .ok_or_else(|| Error::Archive(format!("no {kind} set named {name:?}"))),
            Region::Labels(groups) => Ok(EntitySet::new(groups.clone())),
        }
    }
}

/// Resolve a possibly negative index into `0..len`.
fn wrap_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())?
    } else {
        index as usize
    };
    (resolved < len).then_some(resolved)
}

impl ResultArchive for MemoryArchive {
    fn resolve_frame(&self, step: &StepKey, frame: &FrameKey) -> Result<FrameRef> {
        let step_idx = self.resolve_step(step)?;

        let frames = &self.steps[step_idx].frames;
        let frame_idx = match frame {
            FrameKey::Index(i) => wrap_index(*i, frames.len()),
            FrameKey::Time(t) => frames
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| (a.time - t).abs().total_cmp(&(b.time - t).abs()))
                .map(|(i, _)| i),
        }
        .ok_or_else(|| Error::Archive(format!("frame {frame:?} does not exist")))?;

        log::debug!(
            "Resolved frame {} of step {:?} at step time {}",
            frame_idx,
            self.steps[step_idx].name,
            frames[frame_idx].time
        );
        Ok(FrameRef {
            step: step_idx,
            frame: frame_idx,
        })
    }

    fn node_set(&self, region: &Region) -> Result<EntitySet> {
        Self::resolve_set(&self.node_sets, region, "node")
    }

    fn element_set(&self, region: &Region) -> Result<EntitySet> {
        Self::resolve_set(&self.element_sets, region, "element")
    }

    fn nodal_coordinates(&self, instance: &str, labels: &[i64]) -> Result<Vec<NodalCoordinate>> {
        let data = self.instance(instance)?;
        labels
            .iter()
            .map(|&label| {
                data.nodes
                    .get(&label)
                    .map(|&xyz| NodalCoordinate::new(label, Some(instance), xyz))
                    .ok_or_else(|| {
                        Error::Archive(format!("node {label} not found in instance {instance:?}"))
                    })
            })
            .collect()
    }

    fn element_connectivity(&self, instance: &str, label: i64) -> Result<ElementConnectivity> {
        self.instance(instance)?
            .elements
            .get(&label)
            .cloned()
            .ok_or_else(|| {
                Error::Archive(format!("element {label} not found in instance {instance:?}"))
            })
    }

    fn has_field(&self, frame: FrameRef, field: &str) -> bool {
        self.frame(frame)
            .map(|f| f.fields.keys().any(|(name, _)| name == field))
            .unwrap_or(false)
    }

    fn field_records(
        &self,
        frame: FrameRef,
        set: &EntitySet,
        field: &str,
        position: FieldPosition,
    ) -> Result<Vec<FieldRecord>> {
        let records = self
            .frame(frame)?
            .fields
            .get(&(field.to_owned(), position))
            .ok_or_else(|| {
                Error::Archive(format!("field {field:?} is not available at {position:?}"))
            })?;

        let members: HashSet<(&str, i64)> = set
            .groups
            .iter()
            .flat_map(|g| g.labels.iter().map(move |&l| (g.instance.as_str(), l)))
            .collect();

        Ok(records
            .iter()
            .filter(|r| members.contains(&(r.instance.as_str(), r.label)))
            .cloned()
            .collect())
    }

    fn history_output(
        &self,
        step: &StepKey,
        region: &str,
        output: &str,
    ) -> Result<Vec<(f64, f64)>> {
        let step = &self.steps[self.resolve_step(step)?];
        step.history
            .get(&(region.to_owned(), output.to_owned()))
            .cloned()
            .ok_or_else(|| {
                Error::Archive(format!(
                    "no history output {output:?} in region {region:?} of step {:?}",
                    step.name
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive_with_frames() -> MemoryArchive {
        let mut archive = MemoryArchive::new();
        let load = archive.add_step("Load");
        archive.add_frame(load, 0.0).unwrap();
        archive.add_frame(load, 0.5).unwrap();
        archive.add_frame(load, 1.0).unwrap();
        let unload = archive.add_step("Unload");
        archive.add_frame(unload, 0.0).unwrap();
        archive
    }

    #[test]
    fn test_resolve_frame_by_index() {
        let archive = archive_with_frames();
        let f = archive
            .resolve_frame(&StepKey::Index(0), &FrameKey::Index(-1))
            .unwrap();
        assert_eq!(f, FrameRef { step: 0, frame: 2 });

        let f = archive
            .resolve_frame(&StepKey::Index(-1), &FrameKey::Index(0))
            .unwrap();
        assert_eq!(f, FrameRef { step: 1, frame: 0 });

        assert!(archive
            .resolve_frame(&StepKey::Index(2), &FrameKey::Index(0))
            .is_err());
        assert!(archive
            .resolve_frame(&StepKey::Index(0), &FrameKey::Index(-4))
            .is_err());
    }

    #[test]
    fn test_resolve_frame_by_closest_time() {
        let archive = archive_with_frames();
        let f = archive
            .resolve_frame(&StepKey::Name("Load".into()), &FrameKey::Time(0.6))
            .unwrap();
        assert_eq!(f, FrameRef { step: 0, frame: 1 });
    }

    #[test]
    fn test_field_records_filtered_by_set() {
        let mut archive = archive_with_frames();
        let frame = FrameRef { step: 0, frame: 0 };
        archive
            .add_field(
                frame,
                "S",
                FieldPosition::Centroid,
                vec![
                    FieldRecord::new("A", 1, 1, vec![1.0]),
                    FieldRecord::new("A", 2, 1, vec![2.0]),
                    FieldRecord::new("B", 1, 1, vec![3.0]),
                ],
            )
            .unwrap();

        let set = EntitySet::new(vec![
            crate::archive::LabelGroup::new("B", vec![1]),
            crate::archive::LabelGroup::new("A", vec![1]),
        ]);
        let records = archive
            .field_records(frame, &set, "S", FieldPosition::Centroid)
            .unwrap();
        // archive order, not set order
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].instance, "A");
        assert_eq!(records[1].instance, "B");

        assert!(archive.has_field(frame, "S"));
        assert!(!archive.has_field(frame, "COORD"));
        assert!(archive
            .field_records(frame, &set, "S", FieldPosition::IntegrationPoint)
            .is_err());
    }

    #[test]
    fn test_nodal_coordinates_in_requested_order() {
        let mut archive = MemoryArchive::new();
        archive.add_nodes(
            "A",
            [(1, Point3::new(0.0, 0.0, 0.0)), (2, Point3::new(1.0, 0.0, 0.0))],
        );
        let nodes = archive.nodal_coordinates("A", &[2, 1]).unwrap();
        assert_eq!(nodes[0].label, 2);
        assert_eq!(nodes[0].instance.as_deref(), Some("A"));
        assert_eq!(nodes[1].xyz, Point3::zeros());
        assert!(archive.nodal_coordinates("A", &[3]).is_err());
        assert!(archive.nodal_coordinates("B", &[1]).is_err());
    }

    #[test]
    fn test_history_output_by_step_key() {
        let mut archive = archive_with_frames();
        archive
            .add_history_output(1, "Node PART-1.7", "RF2", vec![(0.0, 0.0), (1.0, -4.5)])
            .unwrap();

        let data = archive
            .history_output(&StepKey::Name("Unload".into()), "Node PART-1.7", "RF2")
            .unwrap();
        assert_eq!(data, vec![(0.0, 0.0), (1.0, -4.5)]);
        let data = archive
            .history_output(&StepKey::Index(-1), "Node PART-1.7", "RF2")
            .unwrap();
        assert_eq!(data.len(), 2);

        assert!(archive
            .history_output(&StepKey::Index(0), "Node PART-1.7", "RF2")
            .is_err());
        assert!(archive
            .history_output(&StepKey::Index(1), "Node PART-1.7", "U2")
            .is_err());
        assert!(archive.add_history_output(5, "Assembly", "ALLIE", Vec::new()).is_err());
    }
}
