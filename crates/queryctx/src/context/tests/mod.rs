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

mod property_tests;

use crate::catalog::{CatalogDatabase, Column, RelationId};
use crate::config::ContextOptions;
use crate::context::handle::BloomFilterId;
use crate::context::QueryContext;
use crate::scheduler::{SchedulerChannel, SchedulerMessage};
use crate::spec::{
    AggregateFunction, AggregateSpec, AggregationStateSpec, BloomFilterSpec, ComparisonOp,
    GeneratorFunctionSpec, InsertDestinationSpec, JoinHashTableSpec, OrderingSpec,
    PredicateSpec, QueryContextSpec, ScalarSpec, SortConfigSpec, TupleSpec,
    UpdateAssignmentSpec, UpdateGroupSpec, WindowAggregationSpec, WindowFrameSpec,
    WindowFunction,
};
use crate::storage::StorageManager;
use crate::types::{DataType, Value};
use tokio::sync::mpsc::UnboundedReceiver;

pub(super) struct Fixture {
    pub catalog: CatalogDatabase,
    pub orders: RelationId,
    pub customers: RelationId,
    pub storage: StorageManager,
    pub scheduler: SchedulerChannel,
    pub rx: UnboundedReceiver<SchedulerMessage>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_options(&ContextOptions::default())
    }

    pub fn with_options(options: &ContextOptions) -> Self {
        let mut catalog = CatalogDatabase::new("tpch");
        let orders = catalog
            .create_relation(
                "orders",
                vec![
                    Column::new("o_orderkey", DataType::Int64, false),
                    Column::new("o_custkey", DataType::Int64, false),
                    Column::new("o_totalprice", DataType::Float64, false),
                    Column::new("o_comment", DataType::Varchar(44), true),
                ],
            )
            .expect("create orders");
        let customers = catalog
            .create_relation(
                "customer",
                vec![
                    Column::new("c_custkey", DataType::Int64, false),
                    Column::new("c_name", DataType::Text, false),
                ],
            )
            .expect("create customer");
        let (scheduler, rx) = SchedulerChannel::new();
        Self {
            catalog,
            orders,
            customers,
            storage: StorageManager::new(options),
            scheduler,
            rx,
        }
    }

    pub fn build(&self, spec: &QueryContextSpec) -> crate::error::Result<QueryContext> {
        QueryContext::new(spec, &self.catalog, &self.storage, &self.scheduler)
    }

    pub fn count_per_customer(&self) -> AggregationStateSpec {
        AggregationStateSpec {
            relation_id: self.orders,
            group_by: vec![ScalarSpec::attribute(self.orders, 1)],
            aggregates: vec![
                AggregateSpec {
                    function: AggregateFunction::CountStar,
                    argument: None,
                },
                AggregateSpec {
                    function: AggregateFunction::Sum,
                    argument: Some(ScalarSpec::attribute(self.orders, 2)),
                },
            ],
            filter: None,
            estimated_num_groups: 8,
        }
    }

    pub fn customer_join(&self, bloom_filter: Option<BloomFilterId>) -> JoinHashTableSpec {
        JoinHashTableSpec {
            build_relation_id: self.customers,
            key_attributes: vec![0],
            operator_index: 4,
            estimated_num_entries: 8,
            build_bloom_filter: bloom_filter,
        }
    }

    pub fn price_above(&self, price: f64) -> PredicateSpec {
        PredicateSpec::compare(
            ComparisonOp::Greater,
            ScalarSpec::attribute(self.orders, 2),
            ScalarSpec::literal(Value::Float64(price)),
        )
    }

    /// One or more descriptions of every kind.
    pub fn full_spec(&self) -> QueryContextSpec {
        QueryContextSpec {
            aggregation_states: vec![self.count_per_customer(), self.count_per_customer()],
            bloom_filters: vec![BloomFilterSpec {
                size_bytes: 1024,
                num_hash_functions: 3,
            }],
            generator_functions: vec![GeneratorFunctionSpec {
                function_name: "generate_series".to_string(),
                args: vec![Value::Int64(1), Value::Int64(10)],
            }],
            insert_destinations: vec![InsertDestinationSpec {
                relation_id: self.orders,
                operator_index: 7,
                block_capacity_rows: Some(2),
                partitioning: None,
            }],
            join_hash_tables: vec![
                self.customer_join(Some(BloomFilterId::new(0))),
                self.customer_join(None),
                self.customer_join(None),
            ],
            predicates: vec![self.price_above(100.0)],
            scalar_groups: vec![vec![
                ScalarSpec::attribute(self.orders, 0),
                ScalarSpec::attribute(self.orders, 2),
            ]],
            sort_configs: vec![SortConfigSpec {
                order_by: vec![OrderingSpec {
                    expr: ScalarSpec::attribute(self.orders, 2),
                    ascending: false,
                    nulls_first: false,
                }],
            }],
            tuples: vec![TupleSpec {
                values: vec![
                    Value::Int64(1),
                    Value::Int32(2),
                    Value::Float64(3.5),
                    Value::Null,
                ],
                relation_id: Some(self.orders),
            }],
            update_groups: vec![UpdateGroupSpec {
                relation_id: self.orders,
                assignments: vec![UpdateAssignmentSpec {
                    attribute_id: 3,
                    value: ScalarSpec::literal(Value::Text("updated".into())),
                }],
            }],
            window_aggregation_states: vec![WindowAggregationSpec {
                input_relation_id: self.orders,
                function: WindowFunction::RowNumber,
                argument: None,
                partition_by: vec![ScalarSpec::attribute(self.orders, 1)],
                order_by: vec![ScalarSpec::attribute(self.orders, 2)],
                frame: WindowFrameSpec::default(),
            }],
        }
    }
}

pub(super) fn order(key: i64, cust: i64, price: f64) -> Vec<Value> {
    vec![
        Value::Int64(key),
        Value::Int64(cust),
        Value::Float64(price),
        Value::Null,
    ]
}
