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

//! Typed slot handles, one newtype per pool.

use crate::error::{QueryCtxError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw wire value of an absent optional handle.
pub const NO_HANDLE: i32 = -1;

/// Implemented by every handle newtype.
pub trait Handle: Copy + fmt::Debug {
    /// Human-readable pool name used in errors and logs.
    const POOL: &'static str;

    fn index(self) -> usize;
    fn get(self) -> u32;
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $pool:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(id: u32) -> Self {
                Self(id)
            }
        }

        impl Handle for $name {
            const POOL: &'static str = $pool;

            fn index(self) -> usize {
                self.0 as usize
            }

            fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $pool, self.0)
            }
        }
    };
}

// Kinds whose handle may be absent: -1 on the wire, `None` in Rust.
macro_rules! optional_handle {
    ($name:ident) => {
        impl $name {
            /// Decode a raw signed handle; `-1` is `None`, other negatives are rejected.
            pub fn from_raw(raw: i32) -> Result<Option<Self>> {
                match raw {
                    NO_HANDLE => Ok(None),
                    r if r >= 0 => Ok(Some(Self(r as u32))),
                    r => Err(QueryCtxError::InvalidHandle {
                        pool: <Self as Handle>::POOL,
                        raw: r,
                    }),
                }
            }

            pub fn to_raw(handle: Option<Self>) -> i32 {
                match handle {
                    Some(h) => i32::try_from(h.0).unwrap_or(i32::MAX),
                    None => NO_HANDLE,
                }
            }
        }
    };
}

define_handle!(AggregationStateId, "aggregation state");
define_handle!(BloomFilterId, "bloom filter");
define_handle!(GeneratorFunctionId, "generator function");
define_handle!(InsertDestinationId, "insert destination");
define_handle!(JoinHashTableId, "join hash table");
define_handle!(PredicateId, "predicate");
define_handle!(ScalarGroupId, "scalar group");
define_handle!(SortConfigId, "sort configuration");
define_handle!(TupleId, "tuple");
define_handle!(UpdateGroupId, "update group");
define_handle!(WindowAggregationStateId, "window aggregation state");

optional_handle!(InsertDestinationId);
optional_handle!(PredicateId);
optional_handle!(ScalarGroupId);
