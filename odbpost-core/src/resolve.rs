//! Current (deformed) coordinates of nodes and element sample points.
//!
//! Two sources are possible. When the frame carries a coordinate field the
//! values are read directly. Otherwise node positions are the undeformed
//! coordinates plus the displacement field, and sample points are
//! interpolated from them with the element's shape functions.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::archive::{
    EntitySet, FieldPosition, FrameRef, LabelGroup, ResultArchive, COORDINATE_FIELD,
    DISPLACEMENT_FIELD,
};
use crate::error::{Error, Result};
use crate::interpolate::evaluate;
use crate::mesh::ElementCatalog;
use crate::options::ExtractOptions;
use crate::reconcile::EntityRun;
use crate::types::{EntityKey, FieldRecord, NodalCoordinate, Point3, SamplePosition};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Deformed coordinates of the nodes of one instance, in set order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstanceNodes {
    /// Instance name.
    pub instance: String,
    /// Node coordinates.
    pub nodes: Vec<NodalCoordinate>,
}

/// How sample coordinates are obtained for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateStrategy {
    /// Read from the archive's coordinate field.
    NativeField,
    /// Interpolated from deformed node positions.
    ShapeFunctions,
}

/// Deformed coordinates of every node in `set`.
///
/// Field records are expected in the same order as the set's labels; a
/// record out of position is searched for in the whole batch unless
/// [`ExtractOptions::strict_ordering`] is set.
///
/// # Errors
///
/// - [`Error::EmptySubset`] if the set or the coordinate/displacement field
///   over it is empty
/// - [`Error::StructuralInconsistency`] if the archive returns coordinates for
///   a different number of nodes or for another instance, or a node has no
///   field record
/// - [`Error::OrderingMismatch`] on a misplaced record in strict mode
pub fn deformed_node_coordinates<A: ResultArchive + ?Sized>(
    archive: &A,
    frame: FrameRef,
    set: &EntitySet,
    options: &ExtractOptions,
) -> Result<Vec<InstanceNodes>> {
    if set.is_empty() {
        return Err(Error::EmptySubset("node set holds no nodes".into()));
    }

    let (field, native, records) = match fetch_native(archive, frame, set, FieldPosition::Nodal) {
        Some(records) => (COORDINATE_FIELD, true, records),
        None => (
            DISPLACEMENT_FIELD,
            false,
            archive.field_records(frame, set, DISPLACEMENT_FIELD, FieldPosition::Nodal)?,
        ),
    };
    if records.is_empty() {
        return Err(Error::EmptySubset(format!(
            "field {field} has no values over the node set"
        )));
    }
    log::trace!("Resolving {} nodes from field {}", set.len(), field);

    let total = set.len();
    let mut cursor = 0;
    let mut out = Vec::with_capacity(set.groups.len());

    for group in &set.groups {
        let initial = archive.nodal_coordinates(&group.instance, &group.labels)?;
        if initial.len() != group.labels.len() {
            return Err(Error::StructuralInconsistency(format!(
                "instance {} returned {} coordinates for {} nodes",
                group.instance,
                initial.len(),
                group.labels.len()
            )));
        }

        let mut nodes = Vec::with_capacity(initial.len());
        for node in initial {
            if let Some(other) = node.instance.as_deref().filter(|i| *i != group.instance) {
                return Err(Error::StructuralInconsistency(format!(
                    "node {} requested from instance {} but reported by {}",
                    node.label, group.instance, other
                )));
            }

            let record = find_aligned(
                &records,
                cursor,
                &group.instance,
                node.label,
                None,
                options.strict_ordering,
            )?;
            cursor += 1;

            let xyz = if native {
                record_point(record)?
            } else {
                node.xyz + displacement(record)
            };
            nodes.push(NodalCoordinate::new(node.label, Some(&group.instance), xyz));
            options.report_progress("Resolved nodes", cursor, total);
        }

        out.push(InstanceNodes {
            instance: group.instance.clone(),
            nodes,
        });
    }
    Ok(out)
}

/// Native coordinate records of `set`, or `None` when there are none.
fn fetch_native<A: ResultArchive + ?Sized>(
    archive: &A,
    frame: FrameRef,
    set: &EntitySet,
    position: FieldPosition,
) -> Option<Vec<FieldRecord>> {
    if !archive.has_field(frame, COORDINATE_FIELD) {
        return None;
    }
    match archive.native_coordinates(frame, set, position) {
        Ok(records) if !records.is_empty() => Some(records),
        Ok(_) => None,
        Err(e) => {
            log::debug!("No usable {COORDINATE_FIELD} at {position:?}: {e}");
            None
        }
    }
}

/// Find the record of (`instance`, `label`), expecting it at `index`.
///
/// `sample` narrows the match to one sample ordinal.
pub(crate) fn find_aligned<'r>(
    records: &'r [FieldRecord],
    index: usize,
    instance: &str,
    label: i64,
    sample: Option<usize>,
    strict: bool,
) -> Result<&'r FieldRecord> {
    let is_target = |r: &FieldRecord| {
        r.label == label && r.instance == instance && sample.map_or(true, |s| r.sample == s)
    };

    if let Some(r) = records.get(index).filter(|&r| is_target(r)) {
        return Ok(r);
    }
    if strict {
        return Err(Error::OrderingMismatch {
            instance: Some(instance.to_owned()),
            label,
        });
    }

    log::debug!("Record for label {label} of {instance} is not at position {index}, searching");
    records.iter().find(|&r| is_target(r)).ok_or_else(|| {
        Error::StructuralInconsistency(format!(
            "no field record for label {label} of instance {instance}"
        ))
    })
}

fn displacement(record: &FieldRecord) -> Point3 {
    let mut u = Point3::zeros();
    for (d, &v) in record.channels.iter().take(3).enumerate() {
        u[d] = v;
    }
    u
}

fn record_point(record: &FieldRecord) -> Result<Point3> {
    record.as_point().ok_or_else(|| {
        Error::StructuralInconsistency(format!(
            "coordinate record for label {} of {} has {} channels",
            record.label,
            record.instance,
            record.channels.len()
        ))
    })
}

/// Resolves sample coordinates for the entity runs of one element query.
///
/// The strategy is picked once, when the locator is built. Interpolation
/// resolves every node of the catalog up front, instance by instance in
/// ascending label order.
pub struct SampleLocator<'a> {
    position: SamplePosition,
    catalog: &'a ElementCatalog,
    options: &'a ExtractOptions,
    strategy: CoordinateStrategy,
    native: Vec<FieldRecord>,
    nodes: HashMap<EntityKey, Point3>,
}

impl<'a> SampleLocator<'a> {
    /// Build a locator for element samples of `set`.
    pub fn new<A: ResultArchive + ?Sized>(
        archive: &A,
        frame: FrameRef,
        set: &EntitySet,
        position: SamplePosition,
        catalog: &'a ElementCatalog,
        options: &'a ExtractOptions,
    ) -> Result<Self> {
        let field_position = FieldPosition::from(position);
        let (strategy, native, nodes) = match fetch_native(archive, frame, set, field_position) {
            Some(native) => (CoordinateStrategy::NativeField, native, HashMap::new()),
            None => (
                CoordinateStrategy::ShapeFunctions,
                Vec::new(),
                resolve_catalog_nodes(archive, frame, catalog, options)?,
            ),
        };
        log::info!("Sample coordinates from {strategy:?} at {position:?}");

        Ok(Self {
            position,
            catalog,
            options,
            strategy,
            native,
            nodes,
        })
    }

    /// The strategy in use.
    pub fn strategy(&self) -> CoordinateStrategy {
        self.strategy
    }

    /// Coordinates of each sample of `run`, indexed by ordinal - 1.
    pub fn locate(&self, run: &EntityRun<'_>) -> Result<Vec<Point3>> {
        match self.strategy {
            CoordinateStrategy::NativeField => self.locate_native(run),
            CoordinateStrategy::ShapeFunctions => self.locate_interpolated(run),
        }
    }

    fn locate_native(&self, run: &EntityRun<'_>) -> Result<Vec<Point3>> {
        let mut points = vec![Point3::zeros(); run.width];
        for (offset, record) in run.records.iter().enumerate() {
            let coord = find_aligned(
                &self.native,
                run.start + offset,
                &record.instance,
                record.label,
                Some(record.sample),
                self.options.strict_ordering,
            )?;
            if let Some(slot) = points.get_mut(record.sample - 1) {
                *slot = record_point(coord)?;
            }
        }
        Ok(points)
    }

    fn locate_interpolated(&self, run: &EntityRun<'_>) -> Result<Vec<Point3>> {
        let key = run.key();
        let conn = self.catalog.get(&key).ok_or_else(|| {
            Error::StructuralInconsistency(format!(
                "no connectivity for element {} of {}",
                key.label, key.instance
            ))
        })?;
        let family = conn.family();
        if !family.is_supported() {
            return Ok(evaluate(&family, &[], self.position)?.points);
        }

        let nodal = conn
            .node_labels
            .iter()
            .zip(&conn.node_instances)
            .map(|(&label, instance)| {
                self.nodes
                    .get(&EntityKey::new(instance.as_str(), label))
                    .copied()
                    .ok_or_else(|| {
                        Error::StructuralInconsistency(format!(
                            "node {label} of {instance} used by element {} was not resolved",
                            key.label
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(evaluate(&family, &nodal, self.position)?.points)
    }
}

/// Deformed coordinates of every node used by a supported element of
/// `catalog`.
fn resolve_catalog_nodes<A: ResultArchive + ?Sized>(
    archive: &A,
    frame: FrameRef,
    catalog: &ElementCatalog,
    options: &ExtractOptions,
) -> Result<HashMap<EntityKey, Point3>> {
    let mut labels: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
    for (_, conn) in catalog.iter().filter(|(_, c)| c.family().is_supported()) {
        for part in conn.partition_by_instance()? {
            labels.entry(part.instance).or_default().extend(part.labels);
        }
    }
    if labels.is_empty() {
        return Ok(HashMap::new());
    }

    let set = EntitySet::new(
        labels
            .into_iter()
            .map(|(instance, l)| LabelGroup::new(instance, l.into_iter().collect()))
            .collect(),
    );
    log::debug!(
        "Resolving {} nodes of {} elements for interpolation",
        set.len(),
        catalog.len()
    );

    Ok(deformed_node_coordinates(archive, frame, &set, options)?
        .into_iter()
        .flat_map(|inst| {
            let instance = inst.instance;
            inst.nodes
                .into_iter()
                .map(move |n| (EntityKey::new(instance.clone(), n.label), n.xyz))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;
    use approx::assert_relative_eq;

    fn archive_with_displacements(records: Vec<FieldRecord>) -> (MemoryArchive, FrameRef) {
        let mut archive = MemoryArchive::new();
        archive.add_nodes(
            "P",
            [
                (1, Point3::new(0.0, 0.0, 0.0)),
                (2, Point3::new(1.0, 0.0, 0.0)),
                (3, Point3::new(0.0, 1.0, 0.0)),
            ],
        );
        let step = archive.add_step("Step-1");
        let frame = archive.add_frame(step, 1.0).unwrap();
        archive
            .add_field(frame, DISPLACEMENT_FIELD, FieldPosition::Nodal, records)
            .unwrap();
        (archive, frame)
    }

    #[test]
    fn test_initial_plus_displacement() {
        let (archive, frame) = archive_with_displacements(vec![
            FieldRecord::new("P", 1, 1, vec![0.1, 0.0, 0.0]),
            FieldRecord::new("P", 2, 1, vec![0.0, 0.2, 0.0]),
            FieldRecord::new("P", 3, 1, vec![0.0, 0.0, 0.3]),
        ]);
        let set = EntitySet::single("P", vec![1, 2, 3]);
        let out =
            deformed_node_coordinates(&archive, frame, &set, &ExtractOptions::default()).unwrap();
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].nodes[1].xyz, Point3::new(1.0, 0.2, 0.0));
        assert_relative_eq!(out[0].nodes[2].xyz, Point3::new(0.0, 1.0, 0.3));
    }

    #[test]
    fn test_out_of_order_records_fall_back_to_search() {
        let (archive, frame) = archive_with_displacements(vec![
            FieldRecord::new("P", 3, 1, vec![0.0, 0.0, 0.3]),
            FieldRecord::new("P", 1, 1, vec![0.1, 0.0, 0.0]),
        ]);
        let set = EntitySet::single("P", vec![1, 3]);
        let out =
            deformed_node_coordinates(&archive, frame, &set, &ExtractOptions::default()).unwrap();
        assert_relative_eq!(out[0].nodes[0].xyz, Point3::new(0.1, 0.0, 0.0));
        assert_relative_eq!(out[0].nodes[1].xyz, Point3::new(0.0, 1.0, 0.3));

        let err = deformed_node_coordinates(&archive, frame, &set, &ExtractOptions::default().strict())
            .unwrap_err();
        assert_eq!(
            err,
            Error::OrderingMismatch {
                instance: Some("P".into()),
                label: 1
            }
        );
    }

    #[test]
    fn test_missing_record_is_inconsistent() {
        let (archive, frame) =
            archive_with_displacements(vec![FieldRecord::new("P", 1, 1, vec![0.0, 0.0, 0.0])]);
        // node 2 is in the set but has no displacement record
        let set = EntitySet::new(vec![LabelGroup::new("P", vec![1, 2])]);
        let err = deformed_node_coordinates(&archive, frame, &set, &ExtractOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::StructuralInconsistency(_)));
    }

    #[test]
    fn test_empty_set_and_field() {
        let (archive, frame) = archive_with_displacements(Vec::new());
        let opts = ExtractOptions::default();
        let err = deformed_node_coordinates(&archive, frame, &EntitySet::default(), &opts)
            .unwrap_err();
        assert!(matches!(err, Error::EmptySubset(_)));

        let err = deformed_node_coordinates(&archive, frame, &EntitySet::single("P", vec![1]), &opts)
            .unwrap_err();
        assert!(matches!(err, Error::EmptySubset(_)));
    }

    #[test]
    fn test_native_coordinates_preferred() {
        let (mut archive, frame) =
            archive_with_displacements(vec![FieldRecord::new("P", 1, 1, vec![9.0, 9.0, 9.0])]);
        archive
            .add_field(
                frame,
                COORDINATE_FIELD,
                FieldPosition::Nodal,
                vec![FieldRecord::new("P", 1, 1, vec![5.0, 6.0, 7.0])],
            )
            .unwrap();
        let set = EntitySet::single("P", vec![1]);
        let out =
            deformed_node_coordinates(&archive, frame, &set, &ExtractOptions::default()).unwrap();
        assert_eq!(out[0].nodes[0].xyz, Point3::new(5.0, 6.0, 7.0));
    }

    #[test]
    fn test_find_aligned_with_sample() {
        let records = vec![
            FieldRecord::new("P", 4, 1, vec![1.0]),
            FieldRecord::new("P", 4, 2, vec![2.0]),
        ];
        let r = find_aligned(&records, 0, "P", 4, Some(2), false).unwrap();
        assert_eq!(r.channels, vec![2.0]);
        assert!(find_aligned(&records, 0, "Q", 4, None, false).is_err());
    }

    #[test]
    fn test_locator_strategy_from_coordinate_position() {
        let (mut archive, frame) = archive_with_displacements(vec![
            FieldRecord::new("P", 1, 1, vec![0.0; 3]),
            FieldRecord::new("P", 2, 1, vec![0.0; 3]),
            FieldRecord::new("P", 3, 1, vec![0.0; 3]),
        ]);
        archive.add_node("P", 4, Point3::new(0.0, 0.0, 1.0));
        archive
            .add_field(
                frame,
                COORDINATE_FIELD,
                FieldPosition::Centroid,
                vec![FieldRecord::new("P", 9, 1, vec![1.0, 2.0, 3.0])],
            )
            .unwrap();
        let mut catalog = ElementCatalog::new();
        catalog.insert(
            EntityKey::new("P", 9),
            crate::mesh::ElementConnectivity::new("C3D4", "P", vec![3, 1, 2]),
        );
        let set = EntitySet::single("P", vec![9]);
        let opts = ExtractOptions::default().strict();

        let locator =
            SampleLocator::new(&archive, frame, &set, SamplePosition::Centroid, &catalog, &opts)
                .unwrap();
        assert_eq!(locator.strategy(), CoordinateStrategy::NativeField);

        // no COORD at integration points, and node 4 has no displacement
        catalog.insert(
            EntityKey::new("P", 9),
            crate::mesh::ElementConnectivity::new("C3D4", "P", vec![3, 1, 2, 4]),
        );
        let err = SampleLocator::new(
            &archive,
            frame,
            &set,
            SamplePosition::IntegrationPoint,
            &catalog,
            &ExtractOptions::default(),
        )
        .err();
        assert!(matches!(err, Some(Error::StructuralInconsistency(_))));
    }
}
