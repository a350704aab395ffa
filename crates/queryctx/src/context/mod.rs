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

//! The per-query registry of execution resources.

pub mod handle;
pub mod pool;
pub mod validate;

#[cfg(test)]
mod tests;

use crate::catalog::{AttributeId, CatalogView};
use crate::config::ContextOptions;
use crate::error::{QueryCtxError, Result};
use crate::expr::{Predicate, Scalar};
use crate::resources::{
    AggregationState, BloomFilter, GeneratorFunctionHandle, InsertDestination, JoinHashTable,
    SortConfiguration, WindowAggregationState,
};
use crate::scheduler::SchedulerChannel;
use crate::spec::{QueryContextSpec, TupleSpec, UpdateGroupSpec};
use crate::storage::{StorageManager, Tuple};
use handle::{
    AggregationStateId, BloomFilterId, GeneratorFunctionId, InsertDestinationId, JoinHashTableId,
    PredicateId, ScalarGroupId, SortConfigId, TupleId, UpdateGroupId, WindowAggregationStateId,
};
use pool::{
    AggregationStates, BloomFilters, GeneratorFunctions, InsertDestinations, JoinHashTables,
    Pool, Predicates, ScalarGroups, SortConfigs, Tuples, UpdateGroups, WindowAggregationStates,
};
use std::collections::HashMap;
use std::fmt;
use tracing::info;

pub use validate::{check, validate, ValidationError};

/// Length and live-slot count of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSummary {
    pub pool: &'static str,
    pub len: usize,
    pub live: usize,
}

impl fmt::Display for PoolSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}/{} live", self.pool, self.live, self.len)
    }
}

/// Owns every stateful resource one query needs, addressed by typed handles.
///
/// Built once from a validated [`QueryContextSpec`], then shared by all work
/// orders of the query. Shared borrows may run concurrently from any thread.
/// Releasing or destroying a slot needs `&mut self`, so no work order can
/// still hold a borrow of the registry when that happens.
///
/// Accessing a slot that is out of range, or that was already released or
/// destroyed, is a caller defect: it is logged at `error` and returned as
/// [`QueryCtxError::HandleOutOfRange`] or [`QueryCtxError::SlotVacated`].
#[derive(Debug)]
pub struct QueryContext {
    aggregation_states: Pool<AggregationStates>,
    bloom_filters: Pool<BloomFilters>,
    generator_functions: Pool<GeneratorFunctions>,
    insert_destinations: Pool<InsertDestinations>,
    join_hash_tables: Pool<JoinHashTables>,
    predicates: Pool<Predicates>,
    scalar_groups: Pool<ScalarGroups>,
    sort_configs: Pool<SortConfigs>,
    tuples: Pool<Tuples>,
    update_groups: Pool<UpdateGroups>,
    window_aggregation_states: Pool<WindowAggregationStates>,
}

fn build<S, T>(
    pool: &'static str,
    specs: &[S],
    mut make: impl FnMut(&S) -> Result<T>,
) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        let item = make(spec)
            .map_err(|e| QueryCtxError::Construction(format!("{pool} #{index}: {e}")))?;
        out.push(item);
    }
    Ok(out)
}

impl QueryContext {
    pub fn new(
        spec: &QueryContextSpec,
        catalog: &dyn CatalogView,
        storage: &StorageManager,
        scheduler: &SchedulerChannel,
    ) -> Result<Self> {
        Self::with_options(spec, catalog, storage, scheduler, &ContextOptions::default())
    }

    /// Build every resource in description order.
    ///
    /// The descriptions are assumed to have passed [`validate`]; anything
    /// that still fails to bind, and any storage allocation failure, aborts
    /// construction. Blocks reserved before the failure are returned to the
    /// storage manager as the partially built resources drop.
    pub fn with_options(
        spec: &QueryContextSpec,
        catalog: &dyn CatalogView,
        storage: &StorageManager,
        scheduler: &SchedulerChannel,
        options: &ContextOptions,
    ) -> Result<Self> {
        let aggregation_states = build("aggregation state", &spec.aggregation_states, |s| {
            AggregationState::new(s, catalog, storage)
        })?;
        let bloom_filters = build("bloom filter", &spec.bloom_filters, |s| {
            BloomFilter::new(s, storage)
        })?;
        let generator_functions = build(
            "generator function",
            &spec.generator_functions,
            GeneratorFunctionHandle::resolve,
        )?;
        let insert_destinations = build("insert destination", &spec.insert_destinations, |s| {
            InsertDestination::new(s, catalog, storage, scheduler, options)
        })?;
        let join_hash_tables = build("join hash table", &spec.join_hash_tables, |s| {
            JoinHashTable::new(s, catalog, storage, scheduler)
        })?;
        let predicates = build("predicate", &spec.predicates, |s| {
            Predicate::bind(s, catalog)
        })?;
        let scalar_groups = build("scalar group", &spec.scalar_groups, |group| {
            group
                .iter()
                .map(|s| Scalar::bind(s, catalog))
                .collect::<Result<Vec<_>>>()
        })?;
        let sort_configs = build("sort configuration", &spec.sort_configs, |s| {
            SortConfiguration::bind(s, catalog)
        })?;
        let tuples = build("tuple", &spec.tuples, |s| build_tuple(s, catalog))?;
        let update_groups = build("update group", &spec.update_groups, |s| {
            build_update_group(s, catalog)
        })?;
        let window_aggregation_states = build(
            "window aggregation state",
            &spec.window_aggregation_states,
            |s| WindowAggregationState::bind(s, catalog),
        )?;

        let ctx = Self {
            aggregation_states: Pool::from_items(aggregation_states),
            bloom_filters: Pool::from_items(bloom_filters),
            generator_functions: Pool::from_items(generator_functions),
            insert_destinations: Pool::from_items(insert_destinations),
            join_hash_tables: Pool::from_items(join_hash_tables),
            predicates: Pool::from_items(predicates),
            scalar_groups: Pool::from_items(scalar_groups),
            sort_configs: Pool::from_items(sort_configs),
            tuples: Pool::from_items(tuples),
            update_groups: Pool::from_items(update_groups),
            window_aggregation_states: Pool::from_items(window_aggregation_states),
        };
        info!(
            aggregation_states = ctx.aggregation_states.len(),
            bloom_filters = ctx.bloom_filters.len(),
            generator_functions = ctx.generator_functions.len(),
            insert_destinations = ctx.insert_destinations.len(),
            join_hash_tables = ctx.join_hash_tables.len(),
            predicates = ctx.predicates.len(),
            scalar_groups = ctx.scalar_groups.len(),
            sort_configs = ctx.sort_configs.len(),
            tuples = ctx.tuples.len(),
            update_groups = ctx.update_groups.len(),
            window_aggregation_states = ctx.window_aggregation_states.len(),
            storage_bytes_in_use = storage.stats().bytes_in_use,
            "query context constructed"
        );
        Ok(ctx)
    }

    // Aggregation states: borrow, release, destroy.

    pub fn is_valid_aggregation_state_id(&self, id: AggregationStateId) -> bool {
        self.aggregation_states.contains(id)
    }

    pub fn aggregation_state(&self, id: AggregationStateId) -> Result<&AggregationState> {
        self.aggregation_states.get(id)
    }

    /// Hand the state to the caller, typically to finalize it.
    pub fn release_aggregation_state(
        &mut self,
        id: AggregationStateId,
    ) -> Result<AggregationState> {
        self.aggregation_states.take(id)
    }

    pub fn destroy_aggregation_state(&mut self, id: AggregationStateId) -> Result<()> {
        self.aggregation_states.destroy(id)
    }

    // Bloom filters: borrow, mutable borrow, destroy.

    pub fn is_valid_bloom_filter_id(&self, id: BloomFilterId) -> bool {
        self.bloom_filters.contains(id)
    }

    pub fn bloom_filter(&self, id: BloomFilterId) -> Result<&BloomFilter> {
        self.bloom_filters.get(id)
    }

    pub fn bloom_filter_mut(&mut self, id: BloomFilterId) -> Result<&mut BloomFilter> {
        self.bloom_filters.get_mut(id)
    }

    pub fn destroy_bloom_filter(&mut self, id: BloomFilterId) -> Result<()> {
        self.bloom_filters.destroy(id)
    }

    pub fn is_valid_generator_function_id(&self, id: GeneratorFunctionId) -> bool {
        self.generator_functions.contains(id)
    }

    pub fn generator_function_handle(
        &self,
        id: GeneratorFunctionId,
    ) -> Result<&GeneratorFunctionHandle> {
        self.generator_functions.get(id)
    }

    // Insert destinations: `None` is never a valid destination.

    pub fn is_valid_insert_destination_id(&self, id: Option<InsertDestinationId>) -> bool {
        id.is_some_and(|id| self.insert_destinations.contains(id))
    }

    pub fn insert_destination(
        &self,
        id: Option<InsertDestinationId>,
    ) -> Result<Option<&InsertDestination>> {
        id.map(|id| self.insert_destinations.get(id)).transpose()
    }

    pub fn destroy_insert_destination(&mut self, id: Option<InsertDestinationId>) -> Result<()> {
        match id {
            Some(id) => self.insert_destinations.destroy(id),
            None => Ok(()),
        }
    }

    pub fn is_valid_join_hash_table_id(&self, id: JoinHashTableId) -> bool {
        self.join_hash_tables.contains(id)
    }

    pub fn join_hash_table(&self, id: JoinHashTableId) -> Result<&JoinHashTable> {
        self.join_hash_tables.get(id)
    }

    pub fn destroy_join_hash_table(&mut self, id: JoinHashTableId) -> Result<()> {
        self.join_hash_tables.destroy(id)
    }

    // Predicates: `None` means "no filter" and is always valid.

    pub fn is_valid_predicate(&self, id: Option<PredicateId>) -> bool {
        id.map_or(true, |id| self.predicates.contains(id))
    }

    pub fn predicate(&self, id: Option<PredicateId>) -> Result<Option<&Predicate>> {
        id.map(|id| self.predicates.get(id)).transpose()
    }

    pub fn is_valid_scalar_group_id(&self, id: Option<ScalarGroupId>) -> bool {
        id.is_some_and(|id| self.scalar_groups.contains(id))
    }

    pub fn scalar_group(&self, id: Option<ScalarGroupId>) -> Result<Option<&[Scalar]>> {
        id.map(|id| self.scalar_groups.get(id).map(Vec::as_slice))
            .transpose()
    }

    pub fn is_valid_sort_config_id(&self, id: SortConfigId) -> bool {
        self.sort_configs.contains(id)
    }

    pub fn sort_config(&self, id: SortConfigId) -> Result<&SortConfiguration> {
        self.sort_configs.get(id)
    }

    pub fn is_valid_tuple_id(&self, id: TupleId) -> bool {
        self.tuples.contains(id)
    }

    pub fn release_tuple(&mut self, id: TupleId) -> Result<Tuple> {
        self.tuples.take(id)
    }

    pub fn is_valid_update_group_id(&self, id: UpdateGroupId) -> bool {
        self.update_groups.contains(id)
    }

    pub fn update_group(&self, id: UpdateGroupId) -> Result<&HashMap<AttributeId, Scalar>> {
        self.update_groups.get(id)
    }

    // Window aggregation states: borrow, release.

    pub fn is_valid_window_aggregation_state_id(&self, id: WindowAggregationStateId) -> bool {
        self.window_aggregation_states.contains(id)
    }

    pub fn window_aggregation_state(
        &self,
        id: WindowAggregationStateId,
    ) -> Result<&WindowAggregationState> {
        self.window_aggregation_states.get(id)
    }

    pub fn release_window_aggregation_state(
        &mut self,
        id: WindowAggregationStateId,
    ) -> Result<WindowAggregationState> {
        self.window_aggregation_states.take(id)
    }

    pub fn summary(&self) -> Vec<PoolSummary> {
        fn row<K: pool::SlotKind>(pool: &'static str, p: &Pool<K>) -> PoolSummary {
            PoolSummary {
                pool,
                len: p.len(),
                live: p.live_count(),
            }
        }
        vec![
            row("aggregation states", &self.aggregation_states),
            row("bloom filters", &self.bloom_filters),
            row("generator functions", &self.generator_functions),
            row("insert destinations", &self.insert_destinations),
            row("join hash tables", &self.join_hash_tables),
            row("predicates", &self.predicates),
            row("scalar groups", &self.scalar_groups),
            row("sort configurations", &self.sort_configs),
            row("tuples", &self.tuples),
            row("update groups", &self.update_groups),
            row("window aggregation states", &self.window_aggregation_states),
        ]
    }
}

fn build_tuple(spec: &TupleSpec, catalog: &dyn CatalogView) -> Result<Tuple> {
    let tuple = Tuple::new(spec.values.clone());
    match spec.relation_id {
        Some(id) => {
            let relation = catalog
                .relation(id)
                .ok_or_else(|| QueryCtxError::Catalog(format!("relation {id} does not exist")))?;
            tuple.conform_to(relation)
        }
        None => Ok(tuple),
    }
}

fn build_update_group(
    spec: &UpdateGroupSpec,
    catalog: &dyn CatalogView,
) -> Result<HashMap<AttributeId, Scalar>> {
    spec.assignments
        .iter()
        .map(|a| Ok((a.attribute_id, Scalar::bind(&a.value, catalog)?)))
        .collect()
}
