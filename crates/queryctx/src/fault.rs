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

//! Named failpoints for exercising failure paths in tests.
//!
//! Failpoints are armed per thread. Registry construction runs on a single
//! thread, so a test arms a point and constructs on the same thread without
//! disturbing tests running in parallel.

use std::cell::RefCell;
use std::collections::HashMap;

pub const STORAGE_ALLOCATE_BLOCK: &str = "storage.allocate_block";

thread_local! {
    static FAILPOINTS: RefCell<HashMap<String, usize>> = RefCell::new(HashMap::new());
}

/// Arm `name` so that it lets `hits_before_fail` calls through and fails the next one.
pub fn set_failpoint(name: &str, hits_before_fail: usize) {
    FAILPOINTS.with(|points| {
        points.borrow_mut().insert(name.to_string(), hits_before_fail);
    });
}

pub fn clear_failpoint(name: &str) {
    FAILPOINTS.with(|points| {
        points.borrow_mut().remove(name);
    });
}

pub fn clear_all_failpoints() {
    FAILPOINTS.with(|points| points.borrow_mut().clear());
}

pub fn should_fail(name: &str) -> bool {
    FAILPOINTS.with(|points| {
        let mut points = points.borrow_mut();
        let Some(remaining) = points.get_mut(name) else {
            return false;
        };

        if *remaining == 0 {
            points.remove(name);
            return true;
        }

        *remaining -= 1;
        false
    })
}
