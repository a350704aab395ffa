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

use crate::catalog::{CatalogView, RelationId};
use crate::error::{QueryCtxError, Result};
use crate::expr::{Predicate, RelationRow, Scalar};
use crate::spec::{AggregateFunction, AggregationStateSpec};
use crate::storage::{Block, StorageManager};
use crate::types::{DataType, Value};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundAggregate {
    pub function: AggregateFunction,
    pub argument: Option<Scalar>,
}

impl BoundAggregate {
    pub fn output_type(&self) -> DataType {
        let arg_type = self.argument.as_ref().map(Scalar::data_type);
        match self.function {
            AggregateFunction::CountStar | AggregateFunction::Count => DataType::Int64,
            AggregateFunction::Sum => match arg_type {
                Some(DataType::Float64) => DataType::Float64,
                _ => DataType::Int64,
            },
            AggregateFunction::Avg => DataType::Float64,
            AggregateFunction::Min | AggregateFunction::Max => arg_type.unwrap_or(DataType::Null),
        }
    }
}

/// Running state of one aggregate within one group.
#[derive(Debug, Clone, Default)]
pub(crate) struct Accumulator {
    count: i64,
    sum_i64: i64,
    sum_f64: f64,
    float_seen: bool,
    min: Option<Value>,
    max: Option<Value>,
}

impl Accumulator {
    /// `value` is ignored by `COUNT(*)`; every other function skips NULL.
    pub(crate) fn update(&mut self, function: AggregateFunction, value: &Value) -> Result<()> {
        if function == AggregateFunction::CountStar {
            self.count = self.count.saturating_add(1);
            return Ok(());
        }
        if value.is_null() {
            return Ok(());
        }
        match function {
            AggregateFunction::CountStar | AggregateFunction::Count => {
                self.count = self.count.saturating_add(1);
            }
            AggregateFunction::Sum | AggregateFunction::Avg => {
                self.count = self.count.saturating_add(1);
                if let Some(i) = value.as_i64() {
                    self.sum_i64 = self.sum_i64.saturating_add(i);
                } else if let Some(f) = value.as_f64() {
                    self.float_seen = true;
                    self.sum_f64 += f;
                } else {
                    return Err(QueryCtxError::Eval(
                        "SUM/AVG require numeric values".to_string(),
                    ));
                }
            }
            AggregateFunction::Min => {
                let replace = match &self.min {
                    Some(cur) => value.lt(cur)?,
                    None => true,
                };
                if replace {
                    self.min = Some(value.clone());
                }
            }
            AggregateFunction::Max => {
                let replace = match &self.max {
                    Some(cur) => value.gt(cur)?,
                    None => true,
                };
                if replace {
                    self.max = Some(value.clone());
                }
            }
        }
        Ok(())
    }

    pub(crate) fn finish(&self, function: AggregateFunction) -> Value {
        match function {
            AggregateFunction::CountStar | AggregateFunction::Count => Value::Int64(self.count),
            AggregateFunction::Sum if self.count == 0 => Value::Null,
            AggregateFunction::Sum if self.float_seen => {
                Value::Float64(self.sum_f64 + self.sum_i64 as f64)
            }
            AggregateFunction::Sum => Value::Int64(self.sum_i64),
            AggregateFunction::Avg if self.count == 0 => Value::Null,
            AggregateFunction::Avg => {
                Value::Float64((self.sum_f64 + self.sum_i64 as f64) / self.count as f64)
            }
            AggregateFunction::Min => self.min.clone().unwrap_or(Value::Null),
            AggregateFunction::Max => self.max.clone().unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Default)]
struct GroupTable {
    index: HashMap<Vec<u8>, usize>,
    groups: Vec<(Vec<Value>, Vec<Accumulator>)>,
}

/// Hash aggregation over one input relation.
///
/// Any number of work orders may call [`aggregate_rows`](Self::aggregate_rows)
/// through a shared borrow; the group table is merged under an internal lock.
#[derive(Debug)]
pub struct AggregationState {
    relation_id: RelationId,
    group_by: Vec<Scalar>,
    aggregates: Vec<BoundAggregate>,
    filter: Option<Predicate>,
    table: Mutex<GroupTable>,
    block: Block,
}

impl AggregationState {
    pub fn new(
        spec: &AggregationStateSpec,
        catalog: &dyn CatalogView,
        storage: &StorageManager,
    ) -> Result<Self> {
        if catalog.relation(spec.relation_id).is_none() {
            return Err(QueryCtxError::Catalog(format!(
                "relation {} does not exist",
                spec.relation_id
            )));
        }
        let group_by = spec
            .group_by
            .iter()
            .map(|s| Scalar::bind(s, catalog))
            .collect::<Result<Vec<_>>>()?;
        let aggregates = spec
            .aggregates
            .iter()
            .map(|a| {
                Ok(BoundAggregate {
                    function: a.function,
                    argument: a
                        .argument
                        .as_ref()
                        .map(|s| Scalar::bind(s, catalog))
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let filter = spec
            .filter
            .as_ref()
            .map(|p| Predicate::bind(p, catalog))
            .transpose()?;
        let block = storage.allocate_default_block()?;

        Ok(Self {
            relation_id: spec.relation_id,
            group_by,
            aggregates,
            filter,
            table: Mutex::new(GroupTable {
                index: HashMap::with_capacity(spec.estimated_num_groups.min(1 << 16)),
                groups: Vec::with_capacity(spec.estimated_num_groups.min(1 << 16)),
            }),
            block,
        })
    }

    pub fn relation_id(&self) -> RelationId {
        self.relation_id
    }

    pub fn aggregates(&self) -> &[BoundAggregate] {
        &self.aggregates
    }

    pub fn block_id(&self) -> crate::storage::BlockId {
        self.block.id()
    }

    pub fn num_groups(&self) -> usize {
        self.table.lock().groups.len()
    }

    /// Fold a batch of input rows into the group table; returns rows accepted by the filter.
    ///
    /// A batch is applied as a whole: on error the group table is left as it was.
    pub fn aggregate_rows(&self, rows: &[Vec<Value>]) -> Result<usize> {
        let mut batch = Vec::with_capacity(rows.len());
        for values in rows {
            let row = RelationRow::new(self.relation_id, values);
            if let Some(filter) = &self.filter {
                if !filter.matches(&row)? {
                    continue;
                }
            }
            let key = self
                .group_by
                .iter()
                .map(|s| s.eval(&row))
                .collect::<Result<Vec<_>>>()?;
            let args = self
                .aggregates
                .iter()
                .map(|a| match &a.argument {
                    Some(arg) => arg.eval(&row),
                    None => Ok(Value::Null),
                })
                .collect::<Result<Vec<_>>>()?;
            batch.push((key, args));
        }

        let accepted = batch.len();
        let mut table = self.table.lock();
        // Updates land on copies and are committed only once the whole batch succeeds.
        let mut touched: HashMap<usize, Vec<Accumulator>> = HashMap::new();
        let mut new_index: HashMap<Vec<u8>, usize> = HashMap::new();
        let mut new_groups: Vec<(Vec<u8>, Vec<Value>, Vec<Accumulator>)> = Vec::new();
        for (key, args) in batch {
            let mut key_bytes = Vec::new();
            for v in &key {
                v.encode_key(&mut key_bytes);
            }
            let slots = match table.index.get(&key_bytes).copied() {
                Some(pos) => touched
                    .entry(pos)
                    .or_insert_with(|| table.groups[pos].1.clone()),
                None => {
                    let idx = *new_index.entry(key_bytes.clone()).or_insert_with(|| {
                        let fresh = vec![Accumulator::default(); self.aggregates.len()];
                        new_groups.push((key_bytes, key, fresh));
                        new_groups.len() - 1
                    });
                    &mut new_groups[idx].2
                }
            };
            for ((agg, acc), arg) in self.aggregates.iter().zip(slots.iter_mut()).zip(&args) {
                acc.update(agg.function, arg)?;
            }
        }

        for (pos, slots) in touched {
            table.groups[pos].1 = slots;
        }
        for (key_bytes, key, slots) in new_groups {
            let pos = table.groups.len();
            table.index.insert(key_bytes, pos);
            table.groups.push((key, slots));
        }
        Ok(accepted)
    }

    /// One row per group: group-by values followed by aggregate results.
    pub fn finalize(self) -> Vec<Vec<Value>> {
        let mut table = self.table.into_inner();
        if self.group_by.is_empty() && table.groups.is_empty() {
            table
                .groups
                .push((Vec::new(), vec![Accumulator::default(); self.aggregates.len()]));
        }

        table
            .groups
            .into_iter()
            .map(|(mut out, slots)| {
                out.extend(
                    self.aggregates
                        .iter()
                        .zip(&slots)
                        .map(|(agg, acc)| acc.finish(agg.function)),
                );
                out
            })
            .collect()
    }
}
