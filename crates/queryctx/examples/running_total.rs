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
    GeneratorFunctionSpec, ScalarSpec, WindowAggregationSpec, WindowFrameSpec, WindowFunction,
};
use queryctx::types::{DataType, Value};
use queryctx::{
    CatalogDatabase, ContextOptions, GeneratorFunctionId, QueryContext, QueryContextSpec,
    SchedulerChannel, StorageManager, WindowAggregationStateId,
};

fn main() -> queryctx::Result<()> {
    tracing_subscriber::fmt::init();

    let mut catalog = CatalogDatabase::new("demo");
    let days = catalog.create_relation(
        "daily_sales",
        vec![
            Column::new("day", DataType::Int32, false),
            Column::new("amount", DataType::Int64, false),
        ],
    )?;

    let spec = QueryContextSpec {
        generator_functions: vec![GeneratorFunctionSpec {
            function_name: "generate_series".to_string(),
            args: vec![Value::Int32(1), Value::Int32(7)],
        }],
        window_aggregation_states: vec![WindowAggregationSpec {
            input_relation_id: days,
            function: WindowFunction::Sum,
            argument: Some(ScalarSpec::attribute(days, 1)),
            partition_by: vec![],
            order_by: vec![ScalarSpec::attribute(days, 0)],
            frame: WindowFrameSpec::default(),
        }],
        ..QueryContextSpec::default()
    };

    queryctx::check(&spec, &catalog)?;

    let options = ContextOptions::from_env()?;
    let storage = StorageManager::new(&options);
    let (scheduler, _rx) = SchedulerChannel::new();
    let mut ctx = QueryContext::with_options(&spec, &catalog, &storage, &scheduler, &options)?;
    for pool in ctx.summary() {
        println!("{pool}");
    }

    let series = ctx.generator_function_handle(GeneratorFunctionId::new(0))?;
    let rows: Vec<Vec<Value>> = series
        .generate()
        .into_iter()
        .map(|row| {
            let amount = match row[0] {
                Value::Int32(day) => i64::from(day) * 10,
                _ => 0,
            };
            vec![row[0].clone(), Value::Int64(amount)]
        })
        .collect();

    let id = WindowAggregationStateId::new(0);
    ctx.window_aggregation_state(id)?.accumulate_rows(rows);
    for row in ctx.release_window_aggregation_state(id)?.finalize()? {
        println!("{row:?}");
    }
    Ok(())
}
