/*
 * Copyright 2026 QueryCtx Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use crate::catalog::{AttributeId, CatalogView, RelationId, RelationSchema};
use crate::config::ContextOptions;
use crate::error::{QueryCtxError, Result};
use crate::scheduler::{OperatorIndex, SchedulerChannel, SchedulerMessage};
use crate::spec::InsertDestinationSpec;
use crate::storage::{Block, BlockId, StorageManager, Tuple};
use parking_lot::Mutex;
use tracing::debug;

/// A block that reached capacity (or was flushed) and was reported to the scheduler.
#[derive(Debug)]
pub struct FilledBlock {
    block: Block,
    partition: u32,
    rows: Vec<Tuple>,
}

impl FilledBlock {
    pub fn block_id(&self) -> BlockId {
        self.block.id()
    }

    pub fn partition(&self) -> u32 {
        self.partition
    }

    pub fn rows(&self) -> &[Tuple] {
        &self.rows
    }
}

#[derive(Debug)]
struct OpenBlock {
    block: Block,
    rows: Vec<Tuple>,
}

#[derive(Debug, Default)]
struct DestinationState {
    open: Vec<Option<OpenBlock>>,
    filled: Vec<FilledBlock>,
}

/// Target relation for operator output.
///
/// Rows are appended into blocks of a fixed row capacity, one open block per
/// partition. A block that fills up is announced with
/// [`SchedulerMessage::BlockFilled`] so downstream operators can consume it.
#[derive(Debug)]
pub struct InsertDestination {
    relation: RelationSchema,
    operator_index: OperatorIndex,
    block_capacity_rows: usize,
    partition_attribute: Option<AttributeId>,
    storage: StorageManager,
    scheduler: SchedulerChannel,
    state: Mutex<DestinationState>,
}

impl InsertDestination {
    pub fn new(
        spec: &InsertDestinationSpec,
        catalog: &dyn CatalogView,
        storage: &StorageManager,
        scheduler: &SchedulerChannel,
        options: &ContextOptions,
    ) -> Result<Self> {
        let relation = catalog.relation(spec.relation_id).ok_or_else(|| {
            QueryCtxError::Catalog(format!("relation {} does not exist", spec.relation_id))
        })?;

        let num_partitions = match &spec.partitioning {
            Some(p) => {
                if !relation.has_attribute(p.attribute_id) {
                    return Err(QueryCtxError::Catalog(format!(
                        "partition attribute {} does not exist in relation '{}'",
                        p.attribute_id, relation.name
                    )));
                }
                if p.num_partitions > options.max_partitions {
                    return Err(QueryCtxError::Construction(format!(
                        "{} partitions exceed the limit of {}",
                        p.num_partitions, options.max_partitions
                    )));
                }
                p.num_partitions.max(1)
            }
            None => 1,
        };
        let block_capacity_rows = match spec.block_capacity_rows {
            Some(0) => {
                return Err(QueryCtxError::Construction(
                    "block capacity must be positive".to_string(),
                ));
            }
            Some(rows) => rows,
            None => options
                .default_block_capacity_rows
                .min((storage.block_size_bytes() / relation.tuple_size_estimate()).max(1)),
        };

        let mut open = Vec::new();
        for _ in 0..num_partitions {
            open.push(Some(OpenBlock {
                block: storage.allocate_default_block()?,
                rows: Vec::new(),
            }));
        }

        Ok(Self {
            relation: relation.clone(),
            operator_index: spec.operator_index,
            block_capacity_rows,
            partition_attribute: spec.partitioning.as_ref().map(|p| p.attribute_id),
            storage: storage.clone(),
            scheduler: scheduler.clone(),
            state: Mutex::new(DestinationState {
                open,
                filled: Vec::new(),
            }),
        })
    }

    pub fn relation_id(&self) -> RelationId {
        self.relation.id
    }

    pub fn operator_index(&self) -> OperatorIndex {
        self.operator_index
    }

    pub fn block_capacity_rows(&self) -> usize {
        self.block_capacity_rows
    }

    pub fn num_partitions(&self) -> usize {
        self.state.lock().open.len()
    }

    pub fn num_filled_blocks(&self) -> usize {
        self.state.lock().filled.len()
    }

    fn partition_of(&self, tuple: &Tuple, num_partitions: usize) -> usize {
        let Some(attr) = self.partition_attribute else {
            return 0;
        };
        let mut key = Vec::new();
        if let Some(v) = tuple.values().get(attr as usize) {
            v.encode_key(&mut key);
        }
        crc32fast::hash(&key) as usize % num_partitions
    }

    /// Append one row after conforming it to the relation's schema.
    pub fn insert_tuple(&self, tuple: Tuple) -> Result<()> {
        let tuple = tuple.conform_to(&self.relation)?;
        let mut state = self.state.lock();
        let partition = self.partition_of(&tuple, state.open.len());

        let slot = &mut state.open[partition];
        let open = match slot {
            Some(open) => open,
            None => slot.insert(OpenBlock {
                block: self.storage.allocate_default_block()?,
                rows: Vec::new(),
            }),
        };
        open.rows.push(tuple);
        if open.rows.len() >= self.block_capacity_rows {
            if let Some(full) = slot.take() {
                self.report(&mut state, partition, full);
            }
        }
        Ok(())
    }

    pub fn insert_tuples(&self, tuples: impl IntoIterator<Item = Tuple>) -> Result<usize> {
        let mut n = 0;
        for tuple in tuples {
            self.insert_tuple(tuple)?;
            n += 1;
        }
        Ok(n)
    }

    /// Report every partially filled block. Empty blocks stay open.
    pub fn flush(&self) {
        let mut state = self.state.lock();
        for partition in 0..state.open.len() {
            let has_rows = state.open[partition]
                .as_ref()
                .is_some_and(|open| !open.rows.is_empty());
            if !has_rows {
                continue;
            }
            if let Some(open) = state.open[partition].take() {
                self.report(&mut state, partition, open);
            }
        }
    }

    /// Hand every reported block to the caller.
    pub fn take_filled_blocks(&self) -> Vec<FilledBlock> {
        std::mem::take(&mut self.state.lock().filled)
    }

    fn report(&self, state: &mut DestinationState, partition: usize, open: OpenBlock) {
        let rows = open.rows.len();
        let block_id = open.block.id();
        debug!(
            relation_id = self.relation.id,
            block_id, rows, partition, "insert destination block filled"
        );
        state.filled.push(FilledBlock {
            block: open.block,
            partition: partition as u32,
            rows: open.rows,
        });
        self.scheduler.notify(SchedulerMessage::BlockFilled {
            operator_index: self.operator_index,
            relation_id: self.relation.id,
            block_id,
            rows,
        });
    }
}
