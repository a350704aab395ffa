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

use crate::catalog::{CatalogDatabase, CatalogView, Column};
use crate::types::DataType;
use tempfile::tempdir;

fn users_columns() -> Vec<Column> {
    vec![
        Column::new("id", DataType::Int64, false),
        Column::new("name", DataType::Varchar(32), true),
        Column::new("joined", DataType::Datetime, true),
    ]
}

#[test]
fn catalog_assigns_positional_attribute_ids() {
    let mut db = CatalogDatabase::new("db");
    let users = db
        .create_relation("users", users_columns())
        .expect("create users");
    let orders = db
        .create_relation("orders", vec![Column::new("id", DataType::Int64, false)])
        .expect("create orders");
    assert_ne!(users, orders);

    let rel = db.relation(users).expect("users exists");
    assert_eq!(rel.num_attributes(), 3);
    assert_eq!(rel.attribute(1).map(|a| a.name.as_str()), Some("name"));
    assert_eq!(rel.attribute_by_name("joined").map(|a| a.id), Some(2));
    assert!(rel.attribute(3).is_none());
    assert_eq!(rel.tuple_size_estimate(), 8 + 32 + 8);
}

#[test]
fn catalog_rejects_duplicates() {
    let mut db = CatalogDatabase::new("db");
    db.create_relation("users", users_columns())
        .expect("create users");
    let err = db
        .create_relation("users", users_columns())
        .expect_err("duplicate relation");
    assert!(err.to_string().contains("already exists"));

    let err = db
        .create_relation(
            "dups",
            vec![
                Column::new("a", DataType::Int32, false),
                Column::new("a", DataType::Int64, false),
            ],
        )
        .expect_err("duplicate attribute");
    assert!(err.to_string().contains("duplicate attribute"));
}

#[test]
fn catalog_drop_and_list_relations() {
    let mut db = CatalogDatabase::new("db");
    db.create_relation("b", users_columns()).expect("create b");
    db.create_relation("a", users_columns()).expect("create a");

    let names = db
        .list_relations()
        .iter()
        .map(|r| r.name.clone())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);

    db.drop_relation("a").expect("drop a");
    assert!(db.relation_by_name("a").is_none());
    assert!(db.relation_by_name("b").is_some());
    assert!(db.drop_relation("a").is_err());
}

#[test]
fn catalog_persist_reload() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("catalog.json");

    let mut db = CatalogDatabase::new("persisted");
    let id = db
        .create_relation("users", users_columns())
        .expect("create users");
    db.persist(&path).expect("persist");

    let loaded = CatalogDatabase::load(&path).expect("load");
    assert_eq!(loaded, db);
    assert_eq!(loaded.name(), "persisted");
    assert_eq!(loaded.relation(id).map(|r| r.name.as_str()), Some("users"));
}

#[test]
fn catalog_load_rejects_garbage() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, b"{not json").expect("write");
    let err = CatalogDatabase::load(&path).expect_err("garbage catalog");
    assert!(err.to_string().contains("invalid catalog file"));
}
