//! End-to-end field extraction.
//!
//! Ties the archive, the coordinate resolver and the reconciler together:
//! resolve the frame and the region, fetch the field records, find the
//! coordinates of every sample, and reconcile everything into a table.

use std::collections::HashMap;

use crate::archive::{FieldPosition, FrameKey, Region, ResultArchive, StepKey};
use crate::error::{Error, Result};
use crate::mesh::{ElementCatalog, ShapeHints};
use crate::options::ExtractOptions;
use crate::reconcile::reconcile;
use crate::resolve::{deformed_node_coordinates, InstanceNodes, SampleLocator};
use crate::table::ReconciledTable;
use crate::types::{EntityKey, FieldRecord, Point3, Precision};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What to extract from the archive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldRequest {
    /// Step selection.
    pub step: StepKey,
    /// Frame selection within the step.
    pub frame: FrameKey,
    /// Node or element region.
    pub region: Region,
    /// Field output name (e.g. `S`, `LE`, `U`).
    pub field: String,
    /// Where the field is reported.
    pub position: FieldPosition,
}

impl FieldRequest {
    /// Request `field` over `region` in the last frame of the last step.
    pub fn new(field: impl Into<String>, position: FieldPosition, region: Region) -> Self {
        Self {
            step: StepKey::Index(-1),
            frame: FrameKey::Index(-1),
            region,
            field: field.into(),
            position,
        }
    }

    /// Select the step.
    pub fn with_step(mut self, step: StepKey) -> Self {
        self.step = step;
        self
    }

    /// Select the frame.
    pub fn with_frame(mut self, frame: FrameKey) -> Self {
        self.frame = frame;
        self
    }
}

/// Extract an element field at centroids or integration points.
///
/// Rows hold `[label, x, y, z, channel...]`, with `x, y, z` the deformed
/// position of the sample.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if the request's position is not an element
///   position
/// - [`Error::EmptySubset`] if the region or the field over it is empty
/// - anything the resolver, the reconciler or the archive reports
pub fn extract_element_field<A: ResultArchive + ?Sized>(
    archive: &A,
    request: &FieldRequest,
    options: &ExtractOptions,
) -> Result<ReconciledTable> {
    let position = request.position.sample_position().ok_or_else(|| {
        Error::InvalidInput(format!(
            "{:?} is not an element sample position",
            request.position
        ))
    })?;

    let frame = archive.resolve_frame(&request.step, &request.frame)?;
    let set = archive.element_set(&request.region)?;
    if set.is_empty() {
        return Err(Error::EmptySubset("element set holds no elements".into()));
    }

    let records = archive.field_records(frame, &set, &request.field, request.position)?;
    if records.is_empty() {
        return Err(Error::EmptySubset(format!(
            "field {} has no values over the element set",
            request.field
        )));
    }
    log_precision(&request.field, &records);
    log::info!(
        "Extracting {} at {:?}: {} records over {} elements",
        request.field,
        request.position,
        records.len(),
        set.len()
    );

    let catalog = ElementCatalog::load(archive, &records)?;
    let hints = catalog.hints(position);
    let locator = SampleLocator::new(archive, frame, &set, position, &catalog, options)?;

    reconcile(&records, &hints, options, |run| locator.locate(run))
}

/// Extract a nodal or element-nodal field.
///
/// Each node is one entity located at its deformed position. Element-nodal
/// values are not averaged: a node lists one sample per adjacent element.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if the request's position is not nodal
/// - [`Error::EmptySubset`] if the region or the field over it is empty
/// - [`Error::StructuralInconsistency`] if a record refers to a node whose
///   coordinates were not resolved
pub fn extract_node_field<A: ResultArchive + ?Sized>(
    archive: &A,
    request: &FieldRequest,
    options: &ExtractOptions,
) -> Result<ReconciledTable> {
    if !request.position.is_nodal() {
        return Err(Error::InvalidInput(format!(
            "{:?} is not a nodal position",
            request.position
        )));
    }
    if request.position == FieldPosition::ElementNodal {
        log::warn!(
            "{} at element nodal position is not averaged across elements",
            request.field
        );
    }

    let frame = archive.resolve_frame(&request.step, &request.frame)?;
    let set = archive.node_set(&request.region)?;
    if set.is_empty() {
        return Err(Error::EmptySubset("node set holds no nodes".into()));
    }

    let records = archive.field_records(frame, &set, &request.field, request.position)?;
    if records.is_empty() {
        return Err(Error::EmptySubset(format!(
            "field {} has no values over the node set",
            request.field
        )));
    }
    log_precision(&request.field, &records);

    let coords: HashMap<EntityKey, Point3> =
        deformed_node_coordinates(archive, frame, &set, options)?
            .into_iter()
            .flat_map(|inst| {
                let instance = inst.instance;
                inst.nodes
                    .into_iter()
                    .map(move |n| (EntityKey::new(instance.clone(), n.label), n.xyz))
            })
            .collect();

    let records = group_node_samples(records);
    reconcile(&records, &ShapeHints::none(), options, |run| {
        let xyz = coords.get(&run.key()).ok_or_else(|| {
            Error::StructuralInconsistency(format!(
                "no coordinates resolved for node {} of {}",
                run.label(),
                run.instance()
            ))
        })?;
        Ok(vec![*xyz; run.width])
    })
}

/// Deformed coordinates of the nodes of a region.
pub fn extract_deformed_nodes<A: ResultArchive + ?Sized>(
    archive: &A,
    step: &StepKey,
    frame: &FrameKey,
    region: &Region,
    options: &ExtractOptions,
) -> Result<Vec<InstanceNodes>> {
    let frame = archive.resolve_frame(step, frame)?;
    let set = archive.node_set(region)?;
    deformed_node_coordinates(archive, frame, &set, options)
}

/// `(time, value)` pairs of a history output.
///
/// # Errors
///
/// - [`Error::EmptySubset`] if the output holds no data points
/// - anything the archive reports for an unknown step, region or output
pub fn extract_history<A: ResultArchive + ?Sized>(
    archive: &A,
    step: &StepKey,
    region: &str,
    output: &str,
) -> Result<Vec<(f64, f64)>> {
    let data = archive.history_output(step, region, output)?;
    if data.is_empty() {
        return Err(Error::EmptySubset(format!(
            "history output {output} of {region} holds no data"
        )));
    }
    log::info!(
        "Read {} points of history output {} from {}",
        data.len(),
        output,
        region
    );
    Ok(data)
}

/// Gather the records of each node, in order of first appearance, and
/// number them 1, 2, ...
///
/// Element-nodal output lists nodes element by element, so one node's
/// contributions are scattered through the batch.
fn group_node_samples(records: Vec<FieldRecord>) -> Vec<FieldRecord> {
    let mut slots: HashMap<EntityKey, usize> = HashMap::new();
    let mut groups: Vec<Vec<FieldRecord>> = Vec::new();
    for record in records {
        let slot = *slots.entry(record.key()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(record);
    }

    groups
        .into_iter()
        .flat_map(|group| {
            group.into_iter().enumerate().map(|(k, mut record)| {
                record.sample = k + 1;
                record
            })
        })
        .collect()
}

fn log_precision(field: &str, records: &[FieldRecord]) {
    let single = records
        .iter()
        .filter(|r| r.precision == Precision::Single)
        .count();
    if single > 0 {
        log::debug!(
            "{} of {} {} records were stored in single precision",
            single,
            records.len(),
            field
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_samples_grouped_per_node() {
        // two elements sharing nodes 1 and 2 of P
        let records = vec![
            FieldRecord::new("P", 1, 1, vec![1.0]),
            FieldRecord::new("P", 2, 1, vec![2.0]),
            FieldRecord::new("Q", 2, 1, vec![5.0]),
            FieldRecord::new("P", 1, 1, vec![3.0]),
            FieldRecord::new("P", 2, 1, vec![4.0]),
        ];
        let grouped = group_node_samples(records);
        let keys: Vec<(&str, i64, usize, f64)> = grouped
            .iter()
            .map(|r| (r.instance.as_str(), r.label, r.sample, r.channels[0]))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("P", 1, 1, 1.0),
                ("P", 1, 2, 3.0),
                ("P", 2, 1, 2.0),
                ("P", 2, 2, 4.0),
                ("Q", 2, 1, 5.0),
            ]
        );
    }

    #[test]
    fn test_request_defaults_to_last_frame() {
        let req = FieldRequest::new("S", FieldPosition::Centroid, Region::Named("ALL".into()));
        assert_eq!(req.step, StepKey::Index(-1));
        assert_eq!(req.frame, FrameKey::Index(-1));
        let req = req.with_frame(FrameKey::Time(0.5));
        assert_eq!(req.frame, FrameKey::Time(0.5));
    }
}
