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

use super::Fixture;
use crate::context::handle::{
    BloomFilterId, InsertDestinationId, PredicateId, ScalarGroupId, TupleId,
};
use crate::error::QueryCtxError;
use crate::spec::{BloomFilterSpec, QueryContextSpec, TupleSpec};
use crate::types::Value;
use proptest::prelude::*;

fn tuples_spec(n: usize) -> QueryContextSpec {
    QueryContextSpec {
        tuples: (0..n)
            .map(|i| TupleSpec {
                values: vec![Value::Int64(i as i64)],
                relation_id: None,
            })
            .collect(),
        bloom_filters: vec![
            BloomFilterSpec {
                size_bytes: 64,
                num_hash_functions: 2,
            };
            n
        ],
        ..QueryContextSpec::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn validity_is_a_bounds_check(n in 0_usize..12, probe in 0_u32..32) {
        let fx = Fixture::new();
        let ctx = fx.build(&tuples_spec(n)).expect("construct");
        let in_range = (probe as usize) < n;
        prop_assert_eq!(ctx.is_valid_tuple_id(TupleId::new(probe)), in_range);
        prop_assert_eq!(ctx.is_valid_bloom_filter_id(BloomFilterId::new(probe)), in_range);
        prop_assert_eq!(ctx.bloom_filter(BloomFilterId::new(probe)).is_ok(), in_range);
    }

    #[test]
    fn raw_sentinel_decoding(raw in -64_i32..64) {
        let fx = Fixture::new();
        let ctx = fx.build(&fx.full_spec()).expect("construct");
        match PredicateId::from_raw(raw) {
            Ok(None) => {
                prop_assert_eq!(raw, -1);
                prop_assert!(ctx.is_valid_predicate(None));
                prop_assert!(!ctx.is_valid_scalar_group_id(ScalarGroupId::from_raw(raw).expect("sentinel")));
                prop_assert!(!ctx.is_valid_insert_destination_id(InsertDestinationId::from_raw(raw).expect("sentinel")));
            }
            Ok(Some(id)) => {
                prop_assert!(raw >= 0);
                prop_assert_eq!(PredicateId::to_raw(Some(id)), raw);
                prop_assert_eq!(ctx.is_valid_predicate(Some(id)), raw == 0);
            }
            Err(err) => {
                prop_assert!(raw < -1);
                let is_invalid_handle = matches!(err, QueryCtxError::InvalidHandle { .. });
                prop_assert!(is_invalid_handle);
            }
        }
    }

    #[test]
    fn tuples_transfer_exactly_once(n in 1_usize..10, order in proptest::collection::vec(0_u32..10, 1..30)) {
        let fx = Fixture::new();
        let mut ctx = fx.build(&tuples_spec(n)).expect("construct");
        let mut taken = vec![false; n];
        for raw in order {
            let id = TupleId::new(raw);
            let result = ctx.release_tuple(id);
            match taken.get_mut(raw as usize) {
                None => {
                    let out_of_range = matches!(result, Err(QueryCtxError::HandleOutOfRange { .. }));
                    prop_assert!(out_of_range);
                }
                Some(seen) if *seen => {
                    let vacated = matches!(result, Err(QueryCtxError::SlotVacated { .. }));
                    prop_assert!(vacated);
                }
                Some(seen) => {
                    *seen = true;
                    let tuple = result.expect("first release");
                    prop_assert_eq!(tuple.values(), &[Value::Int64(i64::from(raw))][..]);
                }
            }
            // Validity never changes with transfers.
            prop_assert_eq!(ctx.is_valid_tuple_id(id), (raw as usize) < n);
        }
    }

    #[test]
    fn teardown_releases_remaining_blocks(n in 0_usize..8, destroyed in proptest::collection::vec(any::<bool>(), 8)) {
        let fx = Fixture::new();
        let mut ctx = fx.build(&tuples_spec(n)).expect("construct");
        prop_assert_eq!(fx.storage.stats().blocks_in_use, n);
        let mut remaining = n;
        for (i, destroy) in destroyed.iter().take(n).enumerate() {
            if *destroy {
                ctx.destroy_bloom_filter(BloomFilterId::new(i as u32)).expect("destroy");
                remaining -= 1;
            }
        }
        prop_assert_eq!(fx.storage.stats().blocks_in_use, remaining);
        drop(ctx);
        prop_assert_eq!(fx.storage.stats().blocks_in_use, 0);
        prop_assert_eq!(fx.storage.stats().bytes_in_use, 0);
    }
}
