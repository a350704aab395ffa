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

use crate::config::ContextOptions;
use crate::fault;
use crate::storage::StorageManager;
use std::sync::Arc;
use std::thread;

fn budgeted(budget: usize) -> StorageManager {
    StorageManager::new(&ContextOptions {
        block_size_bytes: 100,
        storage_budget_bytes: Some(budget),
        ..ContextOptions::default()
    })
}

#[test]
fn dropping_a_block_returns_its_bytes() {
    let storage = budgeted(1_000);
    let a = storage.allocate_default_block().expect("block a");
    let b = storage.allocate_block(250).expect("block b");
    assert_ne!(a.id(), b.id());
    assert_eq!(b.size_bytes(), 250);

    let stats = storage.stats();
    assert_eq!(stats.bytes_in_use, 350);
    assert_eq!(stats.blocks_in_use, 2);

    drop(a);
    let stats = storage.stats();
    assert_eq!(stats.bytes_in_use, 250);
    assert_eq!(stats.blocks_in_use, 1);
    assert_eq!(stats.peak_bytes, 350);
    assert_eq!(stats.blocks_allocated_total, 2);
}

#[test]
fn budget_exhaustion_is_an_error() {
    let storage = budgeted(150);
    let _held = storage.allocate_default_block().expect("first block");
    let err = storage
        .allocate_default_block()
        .expect_err("second block exceeds budget");
    assert!(err.to_string().contains("budget exhausted"));
    assert_eq!(storage.stats().blocks_in_use, 1);
}

#[test]
fn failpoint_fails_allocation() {
    let storage = StorageManager::new(&ContextOptions::default());
    fault::set_failpoint(fault::STORAGE_ALLOCATE_BLOCK, 1);
    let _first = storage.allocate_default_block().expect("first passes");
    let err = storage
        .allocate_default_block()
        .expect_err("second trips failpoint");
    assert!(err.to_string().contains("injected failure"));
    fault::clear_all_failpoints();
    assert_eq!(storage.stats().blocks_in_use, 1);
}

#[test]
fn concurrent_allocations_are_accounted() {
    let storage = Arc::new(StorageManager::new(&ContextOptions {
        block_size_bytes: 10,
        ..ContextOptions::default()
    }));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let storage = Arc::clone(&storage);
        handles.push(thread::spawn(move || {
            let blocks = (0..50)
                .map(|_| storage.allocate_default_block().expect("allocate"))
                .collect::<Vec<_>>();
            blocks.len()
        }));
    }
    for handle in handles {
        assert_eq!(handle.join().expect("thread join"), 50);
    }

    let stats = storage.stats();
    assert_eq!(stats.blocks_in_use, 0);
    assert_eq!(stats.bytes_in_use, 0);
    assert_eq!(stats.blocks_allocated_total, 400);
}
