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

use queryctx::catalog::Column;
use queryctx::spec::{
    AggregateFunction, AggregateSpec, AggregationStateSpec, InsertDestinationSpec,
    JoinHashTableSpec, PartitionSpec, ScalarSpec,
};
use queryctx::storage::Tuple;
use queryctx::types::{DataType, Value};
use queryctx::{
    AggregationStateId, CatalogDatabase, ContextOptions, InsertDestinationId, JoinHashTableId,
    QueryContext, QueryContextSpec, SchedulerChannel, SchedulerMessage, StorageManager,
};
use std::collections::HashMap;
use std::thread;

const WORKERS: i64 = 4;
const ROWS_PER_WORKER: i64 = 500;

fn events_catalog() -> CatalogDatabase {
    let mut catalog = CatalogDatabase::new("telemetry");
    catalog
        .create_relation(
            "events",
            vec![
                Column::new("device", DataType::Int64, false),
                Column::new("reading", DataType::Int64, false),
            ],
        )
        .expect("events");
    catalog
}

fn event(worker: i64, i: i64) -> Vec<Value> {
    vec![Value::Int64(i % 10), Value::Int64(worker * ROWS_PER_WORKER + i)]
}

fn plan() -> QueryContextSpec {
    QueryContextSpec {
        aggregation_states: vec![AggregationStateSpec {
            relation_id: 0,
            group_by: vec![ScalarSpec::attribute(0, 0)],
            aggregates: vec![
                AggregateSpec {
                    function: AggregateFunction::CountStar,
                    argument: None,
                },
                AggregateSpec {
                    function: AggregateFunction::Max,
                    argument: Some(ScalarSpec::attribute(0, 1)),
                },
            ],
            filter: None,
            estimated_num_groups: 10,
        }],
        insert_destinations: vec![InsertDestinationSpec {
            relation_id: 0,
            operator_index: 1,
            block_capacity_rows: Some(50),
            partitioning: Some(PartitionSpec {
                attribute_id: 0,
                num_partitions: 4,
            }),
        }],
        join_hash_tables: vec![JoinHashTableSpec {
            build_relation_id: 0,
            key_attributes: vec![1],
            operator_index: 2,
            estimated_num_entries: 0,
            build_bloom_filter: None,
        }],
        ..QueryContextSpec::default()
    }
}

#[test]
fn workers_share_one_context() {
    let catalog = events_catalog();
    let options = ContextOptions {
        block_size_bytes: 4096,
        ..ContextOptions::default()
    };
    let storage = StorageManager::new(&options);
    let (scheduler, mut rx) = SchedulerChannel::new();
    let mut ctx = QueryContext::with_options(&plan(), &catalog, &storage, &scheduler, &options)
        .expect("construct");

    let shared = &ctx;
    thread::scope(|s| {
        for worker in 0..WORKERS {
            s.spawn(move || {
                let rows: Vec<Vec<Value>> =
                    (0..ROWS_PER_WORKER).map(|i| event(worker, i)).collect();
                let join = shared
                    .join_hash_table(JoinHashTableId::new(0))
                    .expect("join");
                for row in &rows {
                    assert!(join.insert_row(row.clone()).expect("build"));
                }
                shared
                    .aggregation_state(AggregationStateId::new(0))
                    .expect("aggregation")
                    .aggregate_rows(&rows)
                    .expect("aggregate");
                shared
                    .insert_destination(Some(InsertDestinationId::new(0)))
                    .expect("destination")
                    .expect("present")
                    .insert_tuples(rows.into_iter().map(Tuple::new))
                    .expect("insert");
            });
        }
    });

    let total = (WORKERS * ROWS_PER_WORKER) as usize;
    let join = ctx.join_hash_table(JoinHashTableId::new(0)).expect("join");
    assert_eq!(join.len(), total);
    assert_eq!(join.num_distinct_keys(), total);
    assert_eq!(join.probe(&[Value::Int64(1042)]), vec![event(2, 42)]);

    let dest = ctx
        .insert_destination(Some(InsertDestinationId::new(0)))
        .expect("destination")
        .expect("present");
    dest.flush();
    let blocks = dest.take_filled_blocks();
    assert_eq!(blocks.iter().map(|b| b.rows().len()).sum::<usize>(), total);
    let mut partition_of_device = HashMap::new();
    for block in &blocks {
        for tuple in block.rows() {
            let device = format!("{:?}", tuple.values()[0]);
            let previous = partition_of_device.insert(device, block.partition());
            assert!(previous.map_or(true, |p| p == block.partition()));
        }
    }
    let mut notified = 0;
    while let Ok(SchedulerMessage::BlockFilled { rows, .. }) = rx.try_recv() {
        notified += rows;
    }
    assert_eq!(notified, total);

    let state = ctx
        .release_aggregation_state(AggregationStateId::new(0))
        .expect("release");
    let mut groups = state.finalize();
    groups.sort_by_key(|row| match row[0] {
        Value::Int64(device) => device,
        _ => i64::MIN,
    });
    assert_eq!(groups.len(), 10);
    for (device, row) in groups.iter().enumerate() {
        assert_eq!(row[0], Value::Int64(device as i64));
        assert_eq!(row[1], Value::Int64(WORKERS * ROWS_PER_WORKER / 10));
        let last_worker = WORKERS - 1;
        let max_i = ROWS_PER_WORKER - 10 + device as i64;
        assert_eq!(row[2], Value::Int64(last_worker * ROWS_PER_WORKER + max_i));
    }

    drop(blocks);
    drop(ctx);
    assert_eq!(storage.stats().bytes_in_use, 0);
}
