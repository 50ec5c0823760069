//! Reconciled output table.
//!
//! Values live in one dense buffer laid out `[entity][sample][column]`, with
//! entities in the order they were first met. Per-instance views index into
//! that buffer, so nothing ragged is ever stored.
//!
//! Each row holds `[label, x, y, z, channel...]`. Samples past an entity's
//! own run are zero rows.

use crate::error::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Columns that precede the field channels in every row.
pub const LEADING_COLUMNS: usize = 4;

/// Per-entity metadata.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityMeta {
    /// Node or element label.
    pub label: i64,
    /// Owning instance.
    pub instance: String,
    /// Samples the entity itself occupies (before padding).
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct InstanceBlock {
    name: String,
    entities: Vec<usize>,
}

/// Field values grouped by instance and zero-padded to a common sample count.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReconciledTable {
    blocks: Vec<InstanceBlock>,
    entities: Vec<EntityMeta>,
    max_samples: usize,
    row_width: usize,
    values: Vec<f64>,
}

/// One entity flattened into a single output row.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    /// Label, then `[x, y, z, channel...]` for every sample.
    pub values: Vec<f64>,
    /// Instance name, present when the table spans several instances.
    pub instance: Option<String>,
}

/// Receives a reconciled table one instance at a time.
pub trait TableSink {
    /// Write every entity of one instance.
    ///
    /// `entities` is indexed `[entity][sample][column]`.
    fn write(&mut self, instance: &str, entities: &[Vec<Vec<f64>>], header: &[String])
        -> Result<()>;
}

impl ReconciledTable {
    /// Assemble a table from its dense buffer.
    ///
    /// Instances are ordered by name; entities keep their position in
    /// `entities` within each instance.
    pub(crate) fn from_dense(
        entities: Vec<EntityMeta>,
        max_samples: usize,
        row_width: usize,
        values: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(values.len(), entities.len() * max_samples * row_width);

        let mut names: Vec<&str> = entities.iter().map(|e| e.instance.as_str()).collect();
        names.sort_unstable();
        names.dedup();

        let mut blocks: Vec<InstanceBlock> = names
            .into_iter()
            .map(|name| InstanceBlock {
                name: name.to_owned(),
                entities: Vec::new(),
            })
            .collect();
        for (idx, meta) in entities.iter().enumerate() {
            if let Ok(b) = blocks.binary_search_by(|b| b.name.cmp(&meta.instance)) {
                blocks[b].entities.push(idx);
            }
        }

        Self {
            blocks,
            entities,
            max_samples,
            row_width,
            values,
        }
    }

    /// Instance names, sorted.
    pub fn instance_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.name.as_str())
    }

    /// Number of instances.
    pub fn n_instances(&self) -> usize {
        self.blocks.len()
    }

    /// View of one instance.
    pub fn instance(&self, name: &str) -> Option<InstanceView<'_>> {
        self.blocks
            .iter()
            .find(|b| b.name == name)
            .map(|block| InstanceView { table: self, block })
    }

    /// Views of every instance, sorted by name.
    pub fn instances(&self) -> impl Iterator<Item = InstanceView<'_>> {
        self.blocks
            .iter()
            .map(move |block| InstanceView { table: self, block })
    }

    /// Total number of entities.
    pub fn n_entities(&self) -> usize {
        self.entities.len()
    }

    /// Sample count every entity is padded to.
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Columns per row.
    pub fn row_width(&self) -> usize {
        self.row_width
    }

    /// Field channels per row.
    pub fn channel_width(&self) -> usize {
        self.row_width.saturating_sub(LEADING_COLUMNS)
    }

    fn entity_view(&self, index: usize) -> EntityView<'_> {
        let stride = self.max_samples * self.row_width;
        EntityView {
            meta: &self.entities[index],
            row_width: self.row_width,
            values: &self.values[index * stride..(index + 1) * stride],
        }
    }

    /// Nested copy indexed `[instance][entity][sample][column]`.
    pub fn to_nested(&self) -> Vec<Vec<Vec<Vec<f64>>>> {
        self.instances().map(|inst| inst.to_nested()).collect()
    }

    /// One row per entity: the label once, then every sample without its
    /// label column.
    pub fn flat_rows(&self) -> Vec<FlatRow> {
        let tag = self.n_instances() > 1;
        let mut rows = Vec::with_capacity(self.n_entities());
        for inst in self.instances() {
            for entity in inst.entities() {
                let mut values =
                    Vec::with_capacity(1 + self.max_samples * (self.row_width - 1));
                values.push(entity.label() as f64);
                for row in entity.rows() {
                    values.extend_from_slice(&row[1..]);
                }
                rows.push(FlatRow {
                    values,
                    instance: tag.then(|| inst.name().to_owned()),
                });
            }
        }
        rows
    }

    /// Header matching [`flat_rows`](Self::flat_rows).
    ///
    /// `base` names the label column followed by the per-sample columns.
    /// With several samples each per-sample column is repeated as
    /// `<name>_IP<k>`; an `Instance` column is appended for tables that span
    /// several instances.
    pub fn expanded_header<S: AsRef<str>>(&self, base: &[S]) -> Vec<String> {
        let mut header: Vec<String> = Vec::new();
        match base.split_first() {
            Some((label, rest)) if self.max_samples > 1 => {
                header.push(label.as_ref().to_owned());
                for k in 0..self.max_samples {
                    header.extend(rest.iter().map(|col| format!("{}_IP{k}", col.as_ref())));
                }
            }
            _ => header.extend(base.iter().map(|col| col.as_ref().to_owned())),
        }
        if self.n_instances() > 1 {
            header.push("Instance".to_owned());
        }
        header
    }

    /// Stream every instance to a sink, in name order.
    pub fn write_to<T: TableSink + ?Sized>(&self, sink: &mut T, header: &[String]) -> Result<()> {
        for inst in self.instances() {
            log::debug!("Writing {} entities of instance {}", inst.len(), inst.name());
            sink.write(inst.name(), &inst.to_nested(), header)?;
        }
        Ok(())
    }
}

/// The entities of one instance.
#[derive(Debug, Clone, Copy)]
pub struct InstanceView<'a> {
    table: &'a ReconciledTable,
    block: &'a InstanceBlock,
}

impl<'a> InstanceView<'a> {
    /// Instance name.
    pub fn name(&self) -> &'a str {
        &self.block.name
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.block.entities.len()
    }

    /// Whether the instance holds no entities.
    pub fn is_empty(&self) -> bool {
        self.block.entities.is_empty()
    }

    /// Entity at position `j`, in first-seen order.
    pub fn entity(&self, j: usize) -> Option<EntityView<'a>> {
        self.block
            .entities
            .get(j)
            .map(|&idx| self.table.entity_view(idx))
    }

    /// Entities in first-seen order.
    pub fn entities(&self) -> impl Iterator<Item = EntityView<'a>> + 'a {
        let table = self.table;
        let block = self.block;
        block.entities.iter().map(move |&idx| table.entity_view(idx))
    }

    /// Nested copy indexed `[entity][sample][column]`.
    pub fn to_nested(&self) -> Vec<Vec<Vec<f64>>> {
        self.entities()
            .map(|e| e.rows().map(<[f64]>::to_vec).collect())
            .collect()
    }
}

/// The padded sample rows of one entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityView<'a> {
    meta: &'a EntityMeta,
    row_width: usize,
    values: &'a [f64],
}

impl<'a> EntityView<'a> {
    /// Node or element label.
    pub fn label(&self) -> i64 {
        self.meta.label
    }

    /// Owning instance.
    pub fn instance(&self) -> &'a str {
        &self.meta.instance
    }

    /// Samples the entity occupies before padding.
    pub fn samples(&self) -> usize {
        self.meta.samples
    }

    /// Row of sample `k` (0-based), padding included.
    pub fn sample(&self, k: usize) -> Option<&'a [f64]> {
        let start = k * self.row_width;
        self.values.get(start..start + self.row_width)
    }

    /// Every row, padding included.
    pub fn rows(&self) -> impl Iterator<Item = &'a [f64]> {
        self.values.chunks_exact(self.row_width.max(1))
    }
}
