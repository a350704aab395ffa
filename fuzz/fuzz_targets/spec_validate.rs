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
use queryctx::{check, validate, CatalogDatabase, QueryContextSpec};

fn catalog() -> CatalogDatabase {
    let mut catalog = CatalogDatabase::new("fuzz");
    let _ = catalog.create_relation(
        "r",
        vec![
            Column::new("a", DataType::Int64, false),
            Column::new("b", DataType::Float64, true),
            Column::new("c", DataType::Text, true),
        ],
    );
    catalog
}

fuzz_target!(|data: &[u8]| {
    let Ok(spec) = QueryContextSpec::from_json_slice(data) else {
        return;
    };
    let catalog = catalog();
    assert_eq!(validate(&spec, &catalog), check(&spec, &catalog).is_ok());
});
