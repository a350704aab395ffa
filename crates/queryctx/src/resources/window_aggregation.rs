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
use crate::expr::{RelationRow, Scalar};
use crate::resources::aggregation::Accumulator;
use crate::spec::{
    AggregateFunction, FrameMode, ScalarSpec, WindowAggregationSpec, WindowFrameSpec,
    WindowFunction, UNBOUNDED,
};
use crate::types::Value;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Buffers the input of a window aggregation until all of it has arrived.
#[derive(Debug)]
pub struct WindowAggregationState {
    input_relation_id: RelationId,
    function: WindowFunction,
    argument: Option<Scalar>,
    partition_by: Vec<Scalar>,
    order_by: Vec<Scalar>,
    frame: WindowFrameSpec,
    rows: Mutex<Vec<Vec<Value>>>,
}

struct Keyed {
    order: Vec<Value>,
    arg: Value,
    row: Vec<Value>,
}

impl WindowAggregationState {
    pub fn bind(spec: &WindowAggregationSpec, catalog: &dyn CatalogView) -> Result<Self> {
        if catalog.relation(spec.input_relation_id).is_none() {
            return Err(QueryCtxError::Catalog(format!(
                "relation {} does not exist",
                spec.input_relation_id
            )));
        }
        let bind_all = |items: &[ScalarSpec]| {
            items
                .iter()
                .map(|s| Scalar::bind(s, catalog))
                .collect::<Result<Vec<_>>>()
        };
        Ok(Self {
            input_relation_id: spec.input_relation_id,
            function: spec.function,
            argument: spec
                .argument
                .as_ref()
                .map(|s| Scalar::bind(s, catalog))
                .transpose()?,
            partition_by: bind_all(spec.partition_by.as_slice())?,
            order_by: bind_all(spec.order_by.as_slice())?,
            frame: spec.frame,
            rows: Mutex::new(Vec::new()),
        })
    }

    pub fn input_relation_id(&self) -> RelationId {
        self.input_relation_id
    }

    pub fn function(&self) -> WindowFunction {
        self.function
    }

    pub fn frame(&self) -> WindowFrameSpec {
        self.frame
    }

    pub fn accumulate_rows(&self, rows: impl IntoIterator<Item = Vec<Value>>) {
        self.rows.lock().extend(rows);
    }

    pub fn num_buffered_rows(&self) -> usize {
        self.rows.lock().len()
    }

    /// Every buffered row extended with its window value, grouped by
    /// partition (in order of first appearance) and sorted within each.
    pub fn finalize(mut self) -> Result<Vec<Vec<Value>>> {
        let rows = std::mem::take(self.rows.get_mut());

        let mut partition_index: HashMap<Vec<u8>, usize> = HashMap::new();
        let mut partitions: Vec<Vec<Keyed>> = Vec::new();
        for row in rows {
            let accessor = RelationRow::new(self.input_relation_id, &row);
            let mut key = Vec::new();
            for p in &self.partition_by {
                p.eval(&accessor)?.encode_key(&mut key);
            }
            let order = self
                .order_by
                .iter()
                .map(|s| s.eval(&accessor))
                .collect::<Result<Vec<_>>>()?;
            let arg = match &self.argument {
                Some(a) => a.eval(&accessor)?,
                None => Value::Null,
            };
            let pos = *partition_index.entry(key).or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
            partitions[pos].push(Keyed { order, arg, row });
        }

        let mut out = Vec::new();
        for mut partition in partitions {
            sort_partition(&mut partition)?;
            let values = self.window_values(&partition)?;
            for (keyed, value) in partition.into_iter().zip(values) {
                let mut row = keyed.row;
                row.push(value);
                out.push(row);
            }
        }
        Ok(out)
    }

    fn window_values(&self, partition: &[Keyed]) -> Result<Vec<Value>> {
        let function = match self.function {
            WindowFunction::RowNumber => {
                return Ok((1..=partition.len() as i64).map(Value::Int64).collect());
            }
            WindowFunction::Sum => AggregateFunction::Sum,
            WindowFunction::Avg => AggregateFunction::Avg,
            WindowFunction::Count => AggregateFunction::Count,
            WindowFunction::Min => AggregateFunction::Min,
            WindowFunction::Max => AggregateFunction::Max,
        };

        let mut out = Vec::with_capacity(partition.len());
        for i in 0..partition.len() {
            let (lo, hi) = self.frame_bounds(partition, i)?;
            let mut acc = Accumulator::default();
            for keyed in partition.iter().take(hi + 1).skip(lo) {
                acc.update(function, &keyed.arg)?;
            }
            out.push(acc.finish(function));
        }
        Ok(out)
    }

    /// Inclusive frame `[lo, hi]` of row `i`; empty frames come back as `lo > hi`.
    fn frame_bounds(&self, partition: &[Keyed], i: usize) -> Result<(usize, usize)> {
        let last = partition.len() - 1;
        match self.frame.mode {
            FrameMode::Rows => {
                let lo = match offset(self.frame.num_preceding)? {
                    None => 0,
                    Some(p) => i.saturating_sub(p),
                };
                let hi = match offset(self.frame.num_following)? {
                    None => last,
                    Some(f) => i.saturating_add(f).min(last),
                };
                Ok((lo, hi))
            }
            FrameMode::Range => {
                let peers_start = (0..=i)
                    .rev()
                    .take_while(|&j| partition[j].order == partition[i].order)
                    .last()
                    .unwrap_or(i);
                let peers_end = (i..=last)
                    .take_while(|&j| partition[j].order == partition[i].order)
                    .last()
                    .unwrap_or(i);
                let lo = match offset(self.frame.num_preceding)? {
                    None => 0,
                    Some(0) => peers_start,
                    Some(_) => return Err(range_offset_error()),
                };
                let hi = match offset(self.frame.num_following)? {
                    None => last,
                    Some(0) => peers_end,
                    Some(_) => return Err(range_offset_error()),
                };
                Ok((lo, hi))
            }
        }
    }
}

fn offset(bound: i64) -> Result<Option<usize>> {
    if bound == UNBOUNDED {
        return Ok(None);
    }
    usize::try_from(bound)
        .map(Some)
        .map_err(|_| QueryCtxError::Eval(format!("invalid window frame bound {bound}")))
}

fn range_offset_error() -> QueryCtxError {
    QueryCtxError::Eval("RANGE frames only support UNBOUNDED or CURRENT ROW bounds".to_string())
}

// NULL order keys sort last.
fn sort_partition(partition: &mut [Keyed]) -> Result<()> {
    let mut failure = None;
    partition.sort_by(|l, r| {
        for (lv, rv) in l.order.iter().zip(&r.order) {
            let ord = match (lv.is_null(), rv.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => match lv.compare(rv) {
                    Ok(ord) => ord,
                    Err(e) => {
                        failure.get_or_insert(e);
                        Ordering::Equal
                    }
                },
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
