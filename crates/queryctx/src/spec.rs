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

//! Planner-produced description of the resources one query needs.
//!
//! Each section is an ordered list; the k-th entry of a section is addressed
//! by handle k in the constructed [`QueryContext`](crate::context::QueryContext).

use crate::catalog::{AttributeId, RelationId};
use crate::context::handle::BloomFilterId;
use crate::error::Result;
use crate::scheduler::OperatorIndex;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Frame bound meaning "to the edge of the partition".
pub const UNBOUNDED: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarSpec {
    Attribute {
        relation_id: RelationId,
        attribute_id: AttributeId,
    },
    Literal(Value),
    Binary {
        op: ArithmeticOp,
        left: Box<ScalarSpec>,
        right: Box<ScalarSpec>,
    },
    Negate(Box<ScalarSpec>),
}

impl ScalarSpec {
    pub fn attribute(relation_id: RelationId, attribute_id: AttributeId) -> Self {
        Self::Attribute {
            relation_id,
            attribute_id,
        }
    }

    pub fn literal(value: Value) -> Self {
        Self::Literal(value)
    }

    pub fn binary(op: ArithmeticOp, left: ScalarSpec, right: ScalarSpec) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateSpec {
    True,
    False,
    Comparison {
        op: ComparisonOp,
        left: ScalarSpec,
        right: ScalarSpec,
    },
    Conjunction(Vec<PredicateSpec>),
    Disjunction(Vec<PredicateSpec>),
    Negation(Box<PredicateSpec>),
    IsNull(ScalarSpec),
}

impl PredicateSpec {
    pub fn compare(op: ComparisonOp, left: ScalarSpec, right: ScalarSpec) -> Self {
        Self::Comparison { op, left, right }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    CountStar,
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub function: AggregateFunction,
    #[serde(default)]
    pub argument: Option<ScalarSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationStateSpec {
    pub relation_id: RelationId,
    #[serde(default)]
    pub group_by: Vec<ScalarSpec>,
    pub aggregates: Vec<AggregateSpec>,
    #[serde(default)]
    pub filter: Option<PredicateSpec>,
    #[serde(default)]
    pub estimated_num_groups: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloomFilterSpec {
    pub size_bytes: usize,
    pub num_hash_functions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorFunctionSpec {
    pub function_name: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSpec {
    pub attribute_id: AttributeId,
    pub num_partitions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertDestinationSpec {
    pub relation_id: RelationId,
    pub operator_index: OperatorIndex,
    #[serde(default)]
    pub block_capacity_rows: Option<usize>,
    #[serde(default)]
    pub partitioning: Option<PartitionSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinHashTableSpec {
    pub build_relation_id: RelationId,
    pub key_attributes: Vec<AttributeId>,
    pub operator_index: OperatorIndex,
    #[serde(default)]
    pub estimated_num_entries: usize,
    /// Bloom filter the build side also populates, from the bloom filter section.
    #[serde(default)]
    pub build_bloom_filter: Option<BloomFilterId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingSpec {
    pub expr: ScalarSpec,
    #[serde(default = "default_true")]
    pub ascending: bool,
    #[serde(default)]
    pub nulls_first: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortConfigSpec {
    pub order_by: Vec<OrderingSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleSpec {
    pub values: Vec<Value>,
    /// Relation the row targets; its schema is enforced when present.
    #[serde(default)]
    pub relation_id: Option<RelationId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAssignmentSpec {
    pub attribute_id: AttributeId,
    pub value: ScalarSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateGroupSpec {
    pub relation_id: RelationId,
    pub assignments: Vec<UpdateAssignmentSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFunction {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    RowNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameMode {
    Rows,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFrameSpec {
    pub mode: FrameMode,
    /// [`UNBOUNDED`] or a non-negative offset.
    pub num_preceding: i64,
    /// [`UNBOUNDED`] or a non-negative offset.
    pub num_following: i64,
}

impl Default for WindowFrameSpec {
    /// `RANGE BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW`
    fn default() -> Self {
        Self {
            mode: FrameMode::Range,
            num_preceding: UNBOUNDED,
            num_following: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAggregationSpec {
    pub input_relation_id: RelationId,
    pub function: WindowFunction,
    #[serde(default)]
    pub argument: Option<ScalarSpec>,
    #[serde(default)]
    pub partition_by: Vec<ScalarSpec>,
    #[serde(default)]
    pub order_by: Vec<ScalarSpec>,
    #[serde(default)]
    pub frame: WindowFrameSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContextSpec {
    #[serde(default)]
    pub aggregation_states: Vec<AggregationStateSpec>,
    #[serde(default)]
    pub bloom_filters: Vec<BloomFilterSpec>,
    #[serde(default)]
    pub generator_functions: Vec<GeneratorFunctionSpec>,
    #[serde(default)]
    pub insert_destinations: Vec<InsertDestinationSpec>,
    #[serde(default)]
    pub join_hash_tables: Vec<JoinHashTableSpec>,
    #[serde(default)]
    pub predicates: Vec<PredicateSpec>,
    #[serde(default)]
    pub scalar_groups: Vec<Vec<ScalarSpec>>,
    #[serde(default)]
    pub sort_configs: Vec<SortConfigSpec>,
    #[serde(default)]
    pub tuples: Vec<TupleSpec>,
    #[serde(default)]
    pub update_groups: Vec<UpdateGroupSpec>,
    #[serde(default)]
    pub window_aggregation_states: Vec<WindowAggregationSpec>,
}

impl QueryContextSpec {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json_slice(&bytes)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

fn default_true() -> bool {
    true
}
