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

//! Structural checks a [`QueryContextSpec`] must pass before construction.

use crate::catalog::{CatalogView, RelationId, RelationSchema};
use crate::config::ContextOptions;
use crate::context::handle::Handle;
use crate::expr::{Predicate, Scalar};
use crate::resources::GeneratorFunctionHandle;
use crate::spec::{
    AggregateFunction, AggregationStateSpec, BloomFilterSpec, FrameMode, InsertDestinationSpec,
    JoinHashTableSpec, QueryContextSpec, ScalarSpec, SortConfigSpec, TupleSpec, UpdateGroupSpec,
    WindowAggregationSpec, WindowFunction, UNBOUNDED,
};
use crate::storage::Tuple;
use std::collections::HashSet;
use thiserror::Error;

pub const MAX_BLOOM_FILTER_HASH_FUNCTIONS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{pool} #{index}: {reason}")]
pub struct ValidationError {
    pub pool: &'static str,
    pub index: usize,
    pub reason: String,
}

type Check = std::result::Result<(), String>;

/// True when every description in `spec` is well-formed against `catalog`.
pub fn validate(spec: &QueryContextSpec, catalog: &dyn CatalogView) -> bool {
    check(spec, catalog).is_ok()
}

pub fn check(
    spec: &QueryContextSpec,
    catalog: &dyn CatalogView,
) -> std::result::Result<(), ValidationError> {
    check_with_options(spec, catalog, &ContextOptions::default())
}

/// Report the first malformed description, in section order.
pub fn check_with_options(
    spec: &QueryContextSpec,
    catalog: &dyn CatalogView,
    options: &ContextOptions,
) -> std::result::Result<(), ValidationError> {
    section("aggregation state", &spec.aggregation_states, |s| {
        check_aggregation_state(s, catalog)
    })?;
    section("bloom filter", &spec.bloom_filters, |s| {
        check_bloom_filter(s, options)
    })?;
    section("generator function", &spec.generator_functions, |s| {
        GeneratorFunctionHandle::resolve(s)
            .map(|_| ())
            .map_err(|e| e.to_string())
    })?;
    section("insert destination", &spec.insert_destinations, |s| {
        check_insert_destination(s, catalog, options)
    })?;
    section("join hash table", &spec.join_hash_tables, |s| {
        check_join_hash_table(s, catalog, spec.bloom_filters.len())
    })?;
    section("predicate", &spec.predicates, |s| {
        Predicate::bind(s, catalog)
            .map(|_| ())
            .map_err(|e| e.to_string())
    })?;
    section("scalar group", &spec.scalar_groups, |s| {
        s.iter().try_for_each(|scalar| bind(scalar, catalog).map(|_| ()))
    })?;
    section("sort configuration", &spec.sort_configs, |s| {
        check_sort_config(s, catalog)
    })?;
    section("tuple", &spec.tuples, |s| check_tuple(s, catalog))?;
    section("update group", &spec.update_groups, |s| {
        check_update_group(s, catalog)
    })?;
    section("window aggregation state", &spec.window_aggregation_states, |s| {
        check_window_aggregation(s, catalog)
    })?;
    Ok(())
}

fn section<T>(
    pool: &'static str,
    items: &[T],
    check: impl Fn(&T) -> Check,
) -> std::result::Result<(), ValidationError> {
    for (index, item) in items.iter().enumerate() {
        check(item).map_err(|reason| ValidationError {
            pool,
            index,
            reason,
        })?;
    }
    Ok(())
}

fn relation(
    catalog: &dyn CatalogView,
    id: RelationId,
) -> std::result::Result<&RelationSchema, String> {
    catalog
        .relation(id)
        .ok_or_else(|| format!("relation {id} does not exist"))
}

fn bind(scalar: &ScalarSpec, catalog: &dyn CatalogView) -> std::result::Result<Scalar, String> {
    Scalar::bind(scalar, catalog).map_err(|e| e.to_string())
}

/// Bind a scalar that may only read attributes of `relation_id`.
fn bind_local(scalar: &ScalarSpec, catalog: &dyn CatalogView, relation_id: RelationId) -> Check {
    let bound = bind(scalar, catalog)?;
    if !bound.references_only(relation_id) {
        return Err(format!(
            "expression {bound} reads attributes outside relation {relation_id}"
        ));
    }
    Ok(())
}

fn check_aggregation_state(spec: &AggregationStateSpec, catalog: &dyn CatalogView) -> Check {
    relation(catalog, spec.relation_id)?;
    for g in &spec.group_by {
        bind_local(g, catalog, spec.relation_id)?;
    }
    if spec.aggregates.is_empty() {
        return Err("at least one aggregate is required".to_string());
    }
    for agg in &spec.aggregates {
        match (agg.function, &agg.argument) {
            (AggregateFunction::CountStar, None) => {}
            (AggregateFunction::CountStar, Some(_)) => {
                return Err("COUNT(*) takes no argument".to_string());
            }
            (f, None) => return Err(format!("{f:?} requires an argument")),
            (_, Some(arg)) => bind_local(arg, catalog, spec.relation_id)?,
        }
    }
    if let Some(filter) = &spec.filter {
        let bound = Predicate::bind(filter, catalog).map_err(|e| e.to_string())?;
        if !bound.references_only(spec.relation_id) {
            return Err("filter reads attributes outside the input relation".to_string());
        }
    }
    Ok(())
}

fn check_bloom_filter(spec: &BloomFilterSpec, options: &ContextOptions) -> Check {
    if spec.size_bytes == 0 || spec.size_bytes > options.max_bloom_filter_bytes {
        return Err(format!(
            "size {} must be in 1..={} bytes",
            spec.size_bytes, options.max_bloom_filter_bytes
        ));
    }
    if !(1..=MAX_BLOOM_FILTER_HASH_FUNCTIONS).contains(&spec.num_hash_functions) {
        return Err(format!(
            "{} hash functions, expected 1..={MAX_BLOOM_FILTER_HASH_FUNCTIONS}",
            spec.num_hash_functions
        ));
    }
    Ok(())
}

fn check_insert_destination(
    spec: &InsertDestinationSpec,
    catalog: &dyn CatalogView,
    options: &ContextOptions,
) -> Check {
    let rel = relation(catalog, spec.relation_id)?;
    if let Some(p) = &spec.partitioning {
        if !rel.has_attribute(p.attribute_id) {
            return Err(format!(
                "partition attribute {} does not exist in relation '{}'",
                p.attribute_id, rel.name
            ));
        }
        if p.num_partitions == 0 || p.num_partitions > options.max_partitions {
            return Err(format!(
                "partition count {} must be in 1..={}",
                p.num_partitions, options.max_partitions
            ));
        }
    }
    if spec.block_capacity_rows == Some(0) {
        return Err("block capacity must be positive".to_string());
    }
    Ok(())
}

fn check_join_hash_table(
    spec: &JoinHashTableSpec,
    catalog: &dyn CatalogView,
    num_bloom_filters: usize,
) -> Check {
    let rel = relation(catalog, spec.build_relation_id)?;
    if spec.key_attributes.is_empty() {
        return Err("at least one key attribute is required".to_string());
    }
    let mut seen = HashSet::new();
    for attr in &spec.key_attributes {
        if !rel.has_attribute(*attr) {
            return Err(format!(
                "key attribute {attr} does not exist in relation '{}'",
                rel.name
            ));
        }
        if !seen.insert(*attr) {
            return Err(format!("key attribute {attr} is repeated"));
        }
    }
    if let Some(bf) = spec.build_bloom_filter {
        if bf.get() as usize >= num_bloom_filters {
            return Err(format!(
                "{bf} is outside the {num_bloom_filters} configured bloom filters"
            ));
        }
    }
    Ok(())
}

fn check_sort_config(spec: &SortConfigSpec, catalog: &dyn CatalogView) -> Check {
    if spec.order_by.is_empty() {
        return Err("at least one ordering item is required".to_string());
    }
    spec.order_by
        .iter()
        .try_for_each(|o| bind(&o.expr, catalog).map(|_| ()))
}

fn check_tuple(spec: &TupleSpec, catalog: &dyn CatalogView) -> Check {
    if spec.values.is_empty() {
        return Err("a tuple needs at least one value".to_string());
    }
    if let Some(id) = spec.relation_id {
        let rel = relation(catalog, id)?;
        Tuple::new(spec.values.clone())
            .conform_to(rel)
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn check_update_group(spec: &UpdateGroupSpec, catalog: &dyn CatalogView) -> Check {
    let rel = relation(catalog, spec.relation_id)?;
    if spec.assignments.is_empty() {
        return Err("at least one assignment is required".to_string());
    }
    let mut seen = HashSet::new();
    for a in &spec.assignments {
        if !rel.has_attribute(a.attribute_id) {
            return Err(format!(
                "attribute {} does not exist in relation '{}'",
                a.attribute_id, rel.name
            ));
        }
        if !seen.insert(a.attribute_id) {
            return Err(format!("attribute {} is assigned twice", a.attribute_id));
        }
        bind_local(&a.value, catalog, spec.relation_id)?;
    }
    Ok(())
}

fn check_window_aggregation(spec: &WindowAggregationSpec, catalog: &dyn CatalogView) -> Check {
    relation(catalog, spec.input_relation_id)?;
    match (spec.function, &spec.argument) {
        (WindowFunction::RowNumber, Some(_)) => {
            return Err("ROW_NUMBER takes no argument".to_string());
        }
        (WindowFunction::RowNumber, None) => {}
        (f, None) => return Err(format!("{f:?} requires an argument")),
        (_, Some(arg)) => bind_local(arg, catalog, spec.input_relation_id)?,
    }
    for s in spec.partition_by.iter().chain(&spec.order_by) {
        bind_local(s, catalog, spec.input_relation_id)?;
    }

    let frame = spec.frame;
    for bound in [frame.num_preceding, frame.num_following] {
        if bound != UNBOUNDED && bound < 0 {
            return Err(format!("frame bound {bound} must be UNBOUNDED (-1) or >= 0"));
        }
    }
    if frame.mode == FrameMode::Range {
        if spec.order_by.is_empty() {
            return Err("a RANGE frame needs at least one order key".to_string());
        }
        if ![UNBOUNDED, 0].contains(&frame.num_preceding)
            || ![UNBOUNDED, 0].contains(&frame.num_following)
        {
            return Err("RANGE frame bounds must be UNBOUNDED or CURRENT ROW".to_string());
        }
    }
    Ok(())
}
