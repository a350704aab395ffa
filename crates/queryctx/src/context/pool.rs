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

//! Fixed-length slot pools with per-kind access capabilities.
//!
//! A pool's length is decided at construction and never changes. Which
//! operations a pool exposes is decided by the capability markers its kind
//! implements, so calling e.g. `take` on a borrow-only pool does not compile:
//!
//! ```compile_fail
//! use queryctx::context::handle::SortConfigId;
//! use queryctx::context::pool::{Pool, SortConfigs};
//!
//! let mut pool: Pool<SortConfigs> = Pool::from_items(Vec::new());
//! let _ = pool.take(SortConfigId::new(0));
//! ```

use crate::catalog::AttributeId;
use crate::context::handle::{
    AggregationStateId, BloomFilterId, GeneratorFunctionId, Handle, InsertDestinationId,
    JoinHashTableId, PredicateId, ScalarGroupId, SortConfigId, TupleId, UpdateGroupId,
    WindowAggregationStateId,
};
use crate::error::{QueryCtxError, Result};
use crate::expr::{Predicate, Scalar};
use crate::resources::{
    AggregationState, BloomFilter, GeneratorFunctionHandle, InsertDestination, JoinHashTable,
    SortConfiguration, WindowAggregationState,
};
use crate::storage::Tuple;
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::{debug, error};

/// A resource kind: what a slot holds and how it is addressed.
pub trait SlotKind {
    type Item;
    type Id: Handle;
}

/// Repeatable shared access.
pub trait Borrow: SlotKind {}
/// Repeatable exclusive access.
pub trait BorrowMut: SlotKind {}
/// One-time handover of the slot content to the caller.
pub trait Transfer: SlotKind {}
/// One-time early release of the slot content.
pub trait Destroy: SlotKind {}

macro_rules! slot_kind {
    ($(#[$meta:meta])* $kind:ident, $id:ty, $item:ty $(; $($cap:ident),+)?) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub enum $kind {}

        impl SlotKind for $kind {
            type Item = $item;
            type Id = $id;
        }

        $($(impl $cap for $kind {})+)?
    };
}

slot_kind!(AggregationStates, AggregationStateId, AggregationState; Borrow, Transfer, Destroy);
slot_kind!(BloomFilters, BloomFilterId, BloomFilter; Borrow, BorrowMut, Destroy);
slot_kind!(GeneratorFunctions, GeneratorFunctionId, GeneratorFunctionHandle; Borrow);
slot_kind!(InsertDestinations, InsertDestinationId, InsertDestination; Borrow, Destroy);
slot_kind!(JoinHashTables, JoinHashTableId, JoinHashTable; Borrow, Destroy);
slot_kind!(Predicates, PredicateId, Predicate; Borrow);
slot_kind!(ScalarGroups, ScalarGroupId, Vec<Scalar>; Borrow);
slot_kind!(SortConfigs, SortConfigId, SortConfiguration; Borrow);
slot_kind!(Tuples, TupleId, Tuple; Transfer);
slot_kind!(UpdateGroups, UpdateGroupId, HashMap<AttributeId, Scalar>; Borrow);
slot_kind!(
    WindowAggregationStates,
    WindowAggregationStateId,
    WindowAggregationState;
    Borrow,
    Transfer
);

pub struct Pool<K: SlotKind> {
    slots: Vec<Option<K::Item>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: SlotKind> std::fmt::Debug for Pool<K>
where
    K::Item: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("pool", &<K::Id as Handle>::POOL)
            .field("slots", &self.slots)
            .finish()
    }
}

impl<K: SlotKind> Pool<K> {
    pub fn from_items(items: Vec<K::Item>) -> Self {
        Self {
            slots: items.into_iter().map(Some).collect(),
            _kind: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bounds check only; a vacated slot still counts.
    pub fn contains(&self, id: K::Id) -> bool {
        id.index() < self.slots.len()
    }

    /// Slots whose content has not been transferred or destroyed.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn check_range(&self, id: K::Id) -> Result<usize> {
        let idx = id.index();
        if idx < self.slots.len() {
            return Ok(idx);
        }
        error!(
            pool = <K::Id as Handle>::POOL,
            id = id.get(),
            len = self.slots.len(),
            "handle out of range"
        );
        Err(QueryCtxError::HandleOutOfRange {
            pool: <K::Id as Handle>::POOL,
            id: id.get(),
            len: self.slots.len(),
        })
    }

    fn vacated(id: K::Id) -> QueryCtxError {
        error!(
            pool = <K::Id as Handle>::POOL,
            id = id.get(),
            "slot accessed after release or destroy"
        );
        QueryCtxError::SlotVacated {
            pool: <K::Id as Handle>::POOL,
            id: id.get(),
        }
    }
}

impl<K: Borrow> Pool<K> {
    pub fn get(&self, id: K::Id) -> Result<&K::Item> {
        let idx = self.check_range(id)?;
        self.slots[idx].as_ref().ok_or_else(|| Self::vacated(id))
    }
}

impl<K: BorrowMut> Pool<K> {
    pub fn get_mut(&mut self, id: K::Id) -> Result<&mut K::Item> {
        let idx = self.check_range(id)?;
        self.slots[idx].as_mut().ok_or_else(|| Self::vacated(id))
    }
}

impl<K: Transfer> Pool<K> {
    pub fn take(&mut self, id: K::Id) -> Result<K::Item> {
        let idx = self.check_range(id)?;
        let item = self.slots[idx].take().ok_or_else(|| Self::vacated(id))?;
        debug!(pool = <K::Id as Handle>::POOL, id = id.get(), "slot released");
        Ok(item)
    }
}

impl<K: Destroy> Pool<K> {
    pub fn destroy(&mut self, id: K::Id) -> Result<()> {
        let idx = self.check_range(id)?;
        drop(self.slots[idx].take().ok_or_else(|| Self::vacated(id))?);
        debug!(pool = <K::Id as Handle>::POOL, id = id.get(), "slot destroyed");
        Ok(())
    }
}
