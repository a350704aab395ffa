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


use crate::catalog::{CatalogDatabase, Column, RelationId};
use crate::types::DataType;

/// `orders(id int64, qty int32, price float64, placed datetime, note text null)`
/// and `items(order_id int64, sku text)`.
pub(super) fn orders_catalog() -> (CatalogDatabase, RelationId, RelationId) {
    let mut db = CatalogDatabase::new("shop");
    let orders = db
        .create_relation(
            "orders",
            vec![
                Column::new("id", DataType::Int64, false),
                Column::new("qty", DataType::Int32, false),
                Column::new("price", DataType::Float64, false),
                Column::new("placed", DataType::Datetime, false),
                Column::new("note", DataType::Text, true),
            ],
        )
        .expect("create orders");
    let items = db
        .create_relation(
            "items",
            vec![
                Column::new("order_id", DataType::Int64, false),
                Column::new("sku", DataType::Text, false),
            ],
        )
        .expect("create items");
    (db, orders, items)
}
