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

#![no_main]

use libfuzzer_sys::fuzz_target;
use queryctx::catalog::Column;
use queryctx::types::DataType;
use queryctx::{
    validate, CatalogDatabase, ContextOptions, QueryContext, QueryContextSpec, SchedulerChannel,
    StorageManager,
};

fuzz_target!(|data: &[u8]| {
    let Ok(spec) = QueryContextSpec::from_json_slice(data) else {
        return;
    };
    let mut catalog = CatalogDatabase::new("fuzz");
    let _ = catalog.create_relation(
        "r",
        vec![
            Column::new("a", DataType::Int64, false),
            Column::new("b", DataType::Int32, true),
        ],
    );
    if !validate(&spec, &catalog) {
        return;
    }

    let options = ContextOptions {
        block_size_bytes: 1024,
        storage_budget_bytes: Some(1 << 20),
        ..ContextOptions::default()
    };
    let storage = StorageManager::new(&options);
    let (scheduler, _rx) = SchedulerChannel::new();
    if let Ok(ctx) = QueryContext::with_options(&spec, &catalog, &storage, &scheduler, &options) {
        let _ = ctx.summary();
    }
    assert_eq!(storage.stats().bytes_in_use, 0);
});
