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

use super::{sale, sales_catalog, storage};
use crate::resources::AggregationState;
use crate::spec::{
    AggregateFunction, AggregateSpec, AggregationStateSpec, ArithmeticOp, ComparisonOp,
    PredicateSpec, ScalarSpec,
};
use crate::types::{DataType, Value};

fn agg(function: AggregateFunction, argument: Option<ScalarSpec>) -> AggregateSpec {
    AggregateSpec { function, argument }
}

fn per_region_spec(relation_id: u32) -> AggregationStateSpec {
    AggregationStateSpec {
        relation_id,
        group_by: vec![ScalarSpec::attribute(relation_id, 0)],
        aggregates: vec![
            agg(AggregateFunction::CountStar, None),
            agg(AggregateFunction::Count, Some(ScalarSpec::attribute(relation_id, 2))),
            agg(AggregateFunction::Sum, Some(ScalarSpec::attribute(relation_id, 1))),
            agg(AggregateFunction::Avg, Some(ScalarSpec::attribute(relation_id, 1))),
            agg(AggregateFunction::Min, Some(ScalarSpec::attribute(relation_id, 2))),
            agg(AggregateFunction::Max, Some(ScalarSpec::attribute(relation_id, 2))),
        ],
        filter: None,
        estimated_num_groups: 4,
    }
}

#[test]
fn groups_rows_and_skips_nulls() {
    let (db, sales) = sales_catalog();
    let storage = storage();
    let state = AggregationState::new(&per_region_spec(sales), &db, &storage).expect("state");
    assert_eq!(state.aggregates()[3].output_type(), DataType::Float64);

    state
        .aggregate_rows(&[
            sale("east", 10, Some(1)),
            sale("west", 5, None),
            sale("east", 20, Some(4)),
        ])
        .expect("aggregate");
    assert_eq!(state.num_groups(), 2);

    let rows = state.finalize();
    assert_eq!(
        rows[0],
        vec![
            Value::Text("east".into()),
            Value::Int64(2),
            Value::Int64(2),
            Value::Int64(30),
            Value::Float64(15.0),
            Value::Int32(1),
            Value::Int32(4),
        ]
    );
    assert_eq!(
        rows[1],
        vec![
            Value::Text("west".into()),
            Value::Int64(1),
            Value::Int64(0),
            Value::Int64(5),
            Value::Float64(5.0),
            Value::Null,
            Value::Null,
        ]
    );
}

#[test]
fn filter_is_applied_before_grouping() {
    let (db, sales) = sales_catalog();
    let storage = storage();
    let mut spec = per_region_spec(sales);
    spec.filter = Some(PredicateSpec::compare(
        ComparisonOp::Greater,
        ScalarSpec::attribute(sales, 1),
        ScalarSpec::literal(Value::Int64(7)),
    ));
    let state = AggregationState::new(&spec, &db, &storage).expect("state");
    let accepted = state
        .aggregate_rows(&[sale("east", 10, Some(1)), sale("west", 5, None)])
        .expect("aggregate");
    assert_eq!(accepted, 1);
    assert_eq!(state.finalize().len(), 1);
}

#[test]
fn global_aggregate_over_no_rows_yields_one_row() {
    let (db, sales) = sales_catalog();
    let storage = storage();
    let spec = AggregationStateSpec {
        relation_id: sales,
        group_by: Vec::new(),
        aggregates: vec![
            agg(AggregateFunction::CountStar, None),
            agg(AggregateFunction::Sum, Some(ScalarSpec::attribute(sales, 1))),
        ],
        filter: None,
        estimated_num_groups: 0,
    };
    let state = AggregationState::new(&spec, &db, &storage).expect("state");
    assert_eq!(state.finalize(), vec![vec![Value::Int64(0), Value::Null]]);
}

#[test]
fn concurrent_batches_merge_into_one_table() {
    let (db, sales) = sales_catalog();
    let storage = storage();
    let state = AggregationState::new(&per_region_spec(sales), &db, &storage).expect("state");

    std::thread::scope(|s| {
        for t in 0..4 {
            let state = &state;
            s.spawn(move || {
                let batch = (0..50)
                    .map(|i| sale(if i % 2 == 0 { "east" } else { "west" }, t, Some(1)))
                    .collect::<Vec<_>>();
                state.aggregate_rows(&batch).expect("aggregate");
            });
        }
    });

    let rows = state.finalize();
    assert_eq!(rows.len(), 2);
    for row in rows {
        assert_eq!(row[1], Value::Int64(100));
    }
}

#[test]
fn state_holds_a_block_until_dropped() {
    let (db, sales) = sales_catalog();
    let storage = storage();
    let state = AggregationState::new(&per_region_spec(sales), &db, &storage).expect("state");
    assert_eq!(storage.stats().blocks_in_use, 1);
    drop(state);
    assert_eq!(storage.stats().blocks_in_use, 0);
}

#[test]
fn failed_batch_leaves_groups_untouched() {
    let (db, sales) = sales_catalog();
    let storage = storage();
    // inf * (amount - 7) is NaN for amount 7, which MAX cannot order.
    let scaled = ScalarSpec::binary(
        ArithmeticOp::Multiply,
        ScalarSpec::literal(Value::Float64(f64::INFINITY)),
        ScalarSpec::binary(
            ArithmeticOp::Subtract,
            ScalarSpec::attribute(sales, 1),
            ScalarSpec::literal(Value::Int64(7)),
        ),
    );
    let spec = AggregationStateSpec {
        relation_id: sales,
        group_by: vec![ScalarSpec::attribute(sales, 0)],
        aggregates: vec![
            agg(AggregateFunction::CountStar, None),
            agg(AggregateFunction::Max, Some(scaled)),
        ],
        filter: None,
        estimated_num_groups: 2,
    };
    let state = AggregationState::new(&spec, &db, &storage).expect("state");
    state
        .aggregate_rows(&[sale("east", 10, None)])
        .expect("first batch");

    let err = state
        .aggregate_rows(&[sale("east", 12, None), sale("west", 5, None), sale("east", 7, None)])
        .expect_err("NaN is not comparable");
    assert!(err.to_string().contains("NaN"));
    assert_eq!(state.num_groups(), 1);

    let rows = state.finalize();
    assert_eq!(
        rows,
        vec![vec![
            Value::Text("east".into()),
            Value::Int64(1),
            Value::Float64(f64::INFINITY),
        ]]
    );
}
