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

use crate::catalog::{AttributeId, CatalogView, RelationId};
use crate::context::handle::BloomFilterId;
use crate::error::{QueryCtxError, Result};
use crate::scheduler::{OperatorIndex, SchedulerChannel, SchedulerMessage};
use crate::spec::JoinHashTableSpec;
use crate::storage::{Block, StorageManager};
use crate::types::Value;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use tracing::debug;

/// Multi-map from the encoded join key of a build row to the build rows.
///
/// Built by many work orders at once through a shared borrow, then probed
/// concurrently once [`finish_build`](Self::finish_build) has been announced.
#[derive(Debug)]
pub struct JoinHashTable {
    build_relation_id: RelationId,
    key_attributes: Vec<AttributeId>,
    operator_index: OperatorIndex,
    build_bloom_filter: Option<BloomFilterId>,
    rows_per_block: usize,
    storage: StorageManager,
    scheduler: SchedulerChannel,
    entries: RwLock<Entries>,
    blocks: Mutex<Vec<Block>>,
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<Vec<u8>, Vec<Vec<Value>>>,
    num_rows: usize,
}

impl JoinHashTable {
    pub fn new(
        spec: &JoinHashTableSpec,
        catalog: &dyn CatalogView,
        storage: &StorageManager,
        scheduler: &SchedulerChannel,
    ) -> Result<Self> {
        let relation = catalog.relation(spec.build_relation_id).ok_or_else(|| {
            QueryCtxError::Catalog(format!(
                "build relation {} does not exist",
                spec.build_relation_id
            ))
        })?;
        if spec.key_attributes.is_empty() {
            return Err(QueryCtxError::Catalog(
                "join hash table needs at least one key attribute".to_string(),
            ));
        }
        if let Some(missing) = spec
            .key_attributes
            .iter()
            .find(|a| !relation.has_attribute(**a))
        {
            return Err(QueryCtxError::Catalog(format!(
                "key attribute {missing} does not exist in relation '{}'",
                relation.name
            )));
        }

        let rows_per_block = (storage.block_size_bytes() / relation.tuple_size_estimate()).max(1);
        let first = storage.allocate_default_block()?;

        Ok(Self {
            build_relation_id: spec.build_relation_id,
            key_attributes: spec.key_attributes.clone(),
            operator_index: spec.operator_index,
            build_bloom_filter: spec.build_bloom_filter,
            rows_per_block,
            storage: storage.clone(),
            scheduler: scheduler.clone(),
            entries: RwLock::new(Entries {
                map: HashMap::with_capacity(spec.estimated_num_entries.min(1 << 16)),
                num_rows: 0,
            }),
            blocks: Mutex::new(vec![first]),
        })
    }

    pub fn build_relation_id(&self) -> RelationId {
        self.build_relation_id
    }

    pub fn key_attributes(&self) -> &[AttributeId] {
        &self.key_attributes
    }

    /// Bloom filter the build side should also populate with each key.
    pub fn build_bloom_filter(&self) -> Option<BloomFilterId> {
        self.build_bloom_filter
    }

    /// Encoded join key of a build row, or `None` when any key value is NULL.
    pub fn build_key(&self, row: &[Value]) -> Result<Option<Vec<u8>>> {
        let mut key = Vec::new();
        for attr in &self.key_attributes {
            let v = row.get(*attr as usize).ok_or_else(|| {
                QueryCtxError::Eval(format!("build row has no attribute {attr}"))
            })?;
            if v.is_null() {
                return Ok(None);
            }
            v.encode_key(&mut key);
        }
        Ok(Some(key))
    }

    /// Returns false when the row was skipped because its key holds a NULL.
    pub fn insert_row(&self, row: Vec<Value>) -> Result<bool> {
        let Some(key) = self.build_key(&row)? else {
            return Ok(false);
        };
        let mut entries = self.entries.write();
        {
            let mut blocks = self.blocks.lock();
            if entries.num_rows + 1 > blocks.len() * self.rows_per_block {
                blocks.push(self.storage.allocate_default_block()?);
            }
        }
        entries.map.entry(key).or_default().push(row);
        entries.num_rows += 1;
        Ok(true)
    }

    /// Build rows whose key equals `key_values` (one value per key attribute).
    pub fn probe(&self, key_values: &[Value]) -> Vec<Vec<Value>> {
        if key_values.iter().any(Value::is_null) {
            return Vec::new();
        }
        let mut key = Vec::new();
        for v in key_values {
            v.encode_key(&mut key);
        }
        self.entries
            .read()
            .map
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().num_rows == 0
    }

    pub fn num_distinct_keys(&self) -> usize {
        self.entries.read().map.len()
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.lock().len()
    }

    /// Tell the scheduler the build side is complete.
    pub fn finish_build(&self) {
        let entries = self.len();
        debug!(
            operator_index = self.operator_index,
            entries, "join hash table build complete"
        );
        self.scheduler.notify(SchedulerMessage::JoinBuildComplete {
            operator_index: self.operator_index,
            entries,
        });
    }
}
