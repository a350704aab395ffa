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

mod aggregation_tests;

use crate::catalog::{CatalogDatabase, Column, RelationId};
use crate::config::ContextOptions;
use crate::storage::StorageManager;
use crate::types::{DataType, Value};

/// `sales(region text, amount int64, qty int32 null)`
pub(super) fn sales_catalog() -> (CatalogDatabase, RelationId) {
    let mut db = CatalogDatabase::new("shop");
    let sales = db
        .create_relation(
            "sales",
            vec![
                Column::new("region", DataType::Text, false),
                Column::new("amount", DataType::Int64, false),
                Column::new("qty", DataType::Int32, true),
            ],
        )
        .expect("create sales");
    (db, sales)
}

pub(super) fn sale(region: &str, amount: i64, qty: Option<i32>) -> Vec<Value> {
    vec![
        Value::Text(region.to_string()),
        Value::Int64(amount),
        qty.map_or(Value::Null, Value::Int32),
    ]
}

pub(super) fn storage() -> StorageManager {
    StorageManager::new(&ContextOptions::default())
}
