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

//! Stateful execution resources owned by a query context.

pub mod aggregation;
pub mod bloom_filter;
pub mod generator;
pub mod insert_destination;
pub mod join_hash_table;
pub mod sort_config;
pub mod window_aggregation;

#[cfg(test)]
mod tests;

pub use aggregation::{AggregationState, BoundAggregate};
pub use bloom_filter::BloomFilter;
pub use generator::{GeneratorFunction, GeneratorFunctionHandle};
pub use insert_destination::{FilledBlock, InsertDestination};
pub use join_hash_table::JoinHashTable;
pub use sort_config::{OrderBy, SortConfiguration};
pub use window_aggregation::WindowAggregationState;
