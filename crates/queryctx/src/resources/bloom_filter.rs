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

use crate::error::{QueryCtxError, Result};
use crate::spec::BloomFilterSpec;
use crate::storage::{Block, StorageManager};
use crate::types::Value;

/// Bit array probed by `num_hash_functions` seeded CRC32 hashes.
///
/// Filled by the build side of a join while it holds the filter exclusively,
/// then probed concurrently through shared borrows.
#[derive(Debug)]
pub struct BloomFilter {
    bits: Vec<u8>,
    num_hash_functions: u32,
    num_inserted: usize,
    block: Block,
}

impl BloomFilter {
    pub fn new(spec: &BloomFilterSpec, storage: &StorageManager) -> Result<Self> {
        if spec.size_bytes == 0 || spec.num_hash_functions == 0 {
            return Err(QueryCtxError::Construction(
                "bloom filter needs a non-zero size and at least one hash function".to_string(),
            ));
        }
        let block = storage.allocate_block(spec.size_bytes)?;
        Ok(Self {
            bits: vec![0; spec.size_bytes],
            num_hash_functions: spec.num_hash_functions,
            num_inserted: 0,
            block,
        })
    }

    pub fn size_bytes(&self) -> usize {
        self.bits.len()
    }

    pub fn num_hash_functions(&self) -> u32 {
        self.num_hash_functions
    }

    pub fn num_inserted(&self) -> usize {
        self.num_inserted
    }

    pub fn block_id(&self) -> crate::storage::BlockId {
        self.block.id()
    }

    pub fn insert(&mut self, key: &[u8]) {
        for bit in bit_positions(key, self.num_hash_functions, self.bits.len() * 8) {
            self.bits[bit / 8] |= 1 << (bit % 8);
        }
        self.num_inserted += 1;
    }

    /// False means definitely absent.
    pub fn contains(&self, key: &[u8]) -> bool {
        bit_positions(key, self.num_hash_functions, self.bits.len() * 8)
            .all(|bit| self.bits[bit / 8] & (1 << (bit % 8)) != 0)
    }

    pub fn insert_values(&mut self, values: &[Value]) {
        self.insert(&encode(values));
    }

    pub fn contains_values(&self, values: &[Value]) -> bool {
        self.contains(&encode(values))
    }

    /// Fraction of bits set.
    pub fn fill_ratio(&self) -> f64 {
        let set: u32 = self.bits.iter().map(|b| b.count_ones()).sum();
        f64::from(set) / (self.bits.len() * 8) as f64
    }
}

fn encode(values: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in values {
        v.encode_key(&mut out);
    }
    out
}

fn bit_positions(key: &[u8], num_hashes: u32, num_bits: usize) -> impl Iterator<Item = usize> + '_ {
    (0..num_hashes).map(move |seed| {
        let mut hasher = crc32fast::Hasher::new_with_initial(seed.wrapping_mul(0x9E37_79B9));
        hasher.update(key);
        hasher.finalize() as usize % num_bits
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextOptions;

    fn filter(size_bytes: usize, k: u32) -> (StorageManager, BloomFilter) {
        let storage = StorageManager::new(&ContextOptions::default());
        let bf = BloomFilter::new(
            &BloomFilterSpec {
                size_bytes,
                num_hash_functions: k,
            },
            &storage,
        )
        .expect("bloom filter");
        (storage, bf)
    }

    #[test]
    fn inserted_keys_are_always_found() {
        let (_storage, mut bf) = filter(256, 3);
        for i in 0..100i64 {
            bf.insert_values(&[Value::Int64(i)]);
        }
        for i in 0..100i64 {
            assert!(bf.contains_values(&[Value::Int64(i)]));
        }
        assert_eq!(bf.num_inserted(), 100);
        assert!(bf.fill_ratio() > 0.0 && bf.fill_ratio() < 1.0);
    }

    #[test]
    fn empty_filter_contains_nothing() {
        let (_storage, bf) = filter(64, 4);
        assert!(!bf.contains(b"anything"));
    }

    #[test]
    fn filter_reserves_and_returns_its_bytes() {
        let (storage, bf) = filter(4096, 2);
        assert_eq!(storage.stats().bytes_in_use, 4096);
        drop(bf);
        assert_eq!(storage.stats().bytes_in_use, 0);
    }

    #[test]
    fn zero_sized_filter_is_rejected() {
        let storage = StorageManager::new(&ContextOptions::default());
        let err = BloomFilter::new(
            &BloomFilterSpec {
                size_bytes: 0,
                num_hash_functions: 1,
            },
            &storage,
        )
        .expect_err("zero size");
        assert!(err.to_string().contains("non-zero size"));
        assert_eq!(storage.stats().blocks_in_use, 0);
    }
}
