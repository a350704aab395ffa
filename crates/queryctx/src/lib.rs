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

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod expr;
pub mod fault;
pub mod resources;
pub mod scheduler;
pub mod spec;
pub mod storage;
pub mod types;
pub mod util;

pub use catalog::{CatalogDatabase, CatalogView};
pub use config::ContextOptions;
pub use context::handle::{
    AggregationStateId, BloomFilterId, GeneratorFunctionId, InsertDestinationId, JoinHashTableId,
    PredicateId, ScalarGroupId, SortConfigId, TupleId, UpdateGroupId, WindowAggregationStateId,
};
pub use context::{check, validate, QueryContext, ValidationError};
pub use error::{QueryCtxError, Result};
pub use scheduler::{SchedulerChannel, SchedulerMessage};
pub use spec::QueryContextSpec;
pub use storage::StorageManager;
