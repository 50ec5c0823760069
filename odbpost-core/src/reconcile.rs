//! Turn a flat record stream into a [`ReconciledTable`].
//!
//! The archive hands over records without any marker between entities. A
//! run (all samples of one entity) is recognised by consecutive records
//! sharing instance and label, capped by the sample count the entity's
//! element family predicts.
//!
//! Two passes are made over the records:
//!
//! 1. Sizing: split the stream into runs, validate channel widths and
//!    sample ordinals, and find the largest run width.
//! 2. Fill: locate the coordinates of each run and write
//!    `[label, x, y, z, channel...]` rows into a zeroed dense buffer.

use crate::error::{Error, Result};
use crate::mesh::ShapeHints;
use crate::options::ExtractOptions;
use crate::table::{EntityMeta, ReconciledTable, LEADING_COLUMNS};
use crate::types::{EntityKey, FieldRecord, Point3};

/// All consecutive records of one entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityRun<'a> {
    /// Entity index in encounter order.
    pub index: usize,
    /// Position of the run's first record in the batch.
    pub start: usize,
    /// The run's records.
    pub records: &'a [FieldRecord],
    /// Samples the entity occupies.
    pub width: usize,
}

impl<'a> EntityRun<'a> {
    /// Owning instance.
    pub fn instance(&self) -> &'a str {
        &self.records[0].instance
    }

    /// Entity label.
    pub fn label(&self) -> i64 {
        self.records[0].label
    }

    /// Entity key.
    pub fn key(&self) -> EntityKey {
        self.records[0].key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    ExpectNewEntity,
    AccumulateSamples { expected: Option<usize>, seen: usize },
}

#[derive(Debug, Clone, Copy)]
struct RunBounds {
    start: usize,
    len: usize,
    expected: Option<usize>,
}

impl RunBounds {
    fn width(&self) -> usize {
        self.expected.unwrap_or(self.len).max(self.len)
    }
}

/// Reconcile a record batch into an instance-grouped, zero-padded table.
///
/// `locate` is called once per entity run and returns the run's sample
/// coordinates in ordinal order; missing coordinates are written as zeros.
///
/// # Errors
///
/// - [`Error::EmptySubset`] if `records` is empty
/// - [`Error::StructuralInconsistency`] on a channel width differing from the
///   first record's, or sample ordinals that do not start at 1, do not
///   increase, or overflow the run
/// - anything `locate` returns
pub fn reconcile<F>(
    records: &[FieldRecord],
    hints: &ShapeHints,
    options: &ExtractOptions,
    mut locate: F,
) -> Result<ReconciledTable>
where
    F: FnMut(&EntityRun<'_>) -> Result<Vec<Point3>>,
{
    let first = records
        .first()
        .ok_or_else(|| Error::EmptySubset("no field records to reconcile".into()))?;
    let channel_width = first.channels.len();

    let runs = size_runs(records, hints, channel_width)?;
    let max_samples = runs.iter().map(RunBounds::width).max().unwrap_or(1);
    let row_width = LEADING_COLUMNS + channel_width;
    log::debug!(
        "Sized {} records into {} entities of up to {} samples",
        records.len(),
        runs.len(),
        max_samples
    );

    let mut values = vec![0.0; runs.len() * max_samples * row_width];
    let mut entities = Vec::with_capacity(runs.len());
    let total = runs.len();

    for (index, bounds) in runs.iter().enumerate() {
        let run = EntityRun {
            index,
            start: bounds.start,
            records: &records[bounds.start..bounds.start + bounds.len],
            width: bounds.width(),
        };
        let coords = locate(&run)?;

        let base = index * max_samples * row_width;
        for record in run.records {
            let k = record.sample - 1;
            let xyz = coords.get(k).copied().unwrap_or_else(Point3::zeros);
            let row = &mut values[base + k * row_width..base + (k + 1) * row_width];
            row[0] = record.label as f64;
            row[1..LEADING_COLUMNS].copy_from_slice(xyz.as_slice());
            row[LEADING_COLUMNS..].copy_from_slice(&record.channels);
        }

        entities.push(EntityMeta {
            label: run.label(),
            instance: run.instance().to_owned(),
            samples: run.width,
        });
        options.report_progress("Reconciled entities", index + 1, total);
    }

    Ok(ReconciledTable::from_dense(
        entities,
        max_samples,
        row_width,
        values,
    ))
}

/// Sizing pass: split the batch into runs and validate it.
fn size_runs(
    records: &[FieldRecord],
    hints: &ShapeHints,
    channel_width: usize,
) -> Result<Vec<RunBounds>> {
    let mut runs: Vec<RunBounds> = Vec::new();
    let mut state = ScanState::ExpectNewEntity;

    for (i, record) in records.iter().enumerate() {
        if record.channels.len() != channel_width {
            return Err(Error::StructuralInconsistency(format!(
                "record {} (label {} of {}) has {} channels, expected {}",
                i,
                record.label,
                record.instance,
                record.channels.len(),
                channel_width
            )));
        }

        state = match state {
            ScanState::AccumulateSamples { expected, seen }
                if records[i - 1].same_entity(record) =>
            {
                if let Some(run) = runs.last_mut() {
                    run.len += 1;
                }
                ScanState::AccumulateSamples {
                    expected,
                    seen: seen + 1,
                }
            }
            _ => {
                let expected = hints.expected_samples(&record.key());
                runs.push(RunBounds {
                    start: i,
                    len: 1,
                    expected,
                });
                ScanState::AccumulateSamples { expected, seen: 1 }
            }
        };

        if let ScanState::AccumulateSamples {
            expected: Some(n),
            seen,
        } = state
        {
            if seen >= n {
                state = ScanState::ExpectNewEntity;
            }
        }
    }

    for run in &runs {
        check_ordinals(&records[run.start..run.start + run.len], run.width())?;
    }
    Ok(runs)
}

fn check_ordinals(run: &[FieldRecord], width: usize) -> Result<()> {
    let mut prev = 0;
    for record in run {
        let ordinal = record.sample;
        let valid = if prev == 0 {
            ordinal == 1
        } else {
            ordinal > prev
        };
        if !valid || ordinal > width {
            return Err(Error::StructuralInconsistency(format!(
                "sample {} of label {} in {} is out of sequence (previous {}, run width {})",
                ordinal, record.label, record.instance, prev, width
            )));
        }
        prev = ordinal;
    }
    Ok(())
}
