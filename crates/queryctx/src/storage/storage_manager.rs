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
use crate::error::{QueryCtxError, Result};
use crate::fault;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

pub type BlockId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub bytes_in_use: usize,
    pub blocks_in_use: usize,
    pub peak_bytes: usize,
    pub blocks_allocated_total: u64,
}

#[derive(Debug)]
struct StorageInner {
    block_size_bytes: usize,
    budget_bytes: Option<usize>,
    next_block_id: AtomicU64,
    stats: Mutex<StorageStats>,
}

/// Hands out budgeted block reservations to the resources a query owns.
///
/// A [`Block`] gives its bytes back when dropped, so whichever owner ends up
/// holding a resource (the registry, or a caller after a transfer) releases
/// its storage by dropping it.
#[derive(Debug, Clone)]
pub struct StorageManager {
    inner: Arc<StorageInner>,
}

impl StorageManager {
    pub fn new(options: &ContextOptions) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                block_size_bytes: options.block_size_bytes,
                budget_bytes: options.storage_budget_bytes,
                next_block_id: AtomicU64::new(1),
                stats: Mutex::new(StorageStats::default()),
            }),
        }
    }

    pub fn block_size_bytes(&self) -> usize {
        self.inner.block_size_bytes
    }

    pub fn allocate_default_block(&self) -> Result<Block> {
        self.allocate_block(self.inner.block_size_bytes)
    }

    pub fn allocate_block(&self, size_bytes: usize) -> Result<Block> {
        if fault::should_fail(fault::STORAGE_ALLOCATE_BLOCK) {
            return Err(QueryCtxError::Storage(format!(
                "injected failure allocating {size_bytes} bytes"
            )));
        }

        {
            let mut stats = self.inner.stats.lock();
            let requested = stats.bytes_in_use.saturating_add(size_bytes);
            if let Some(budget) = self.inner.budget_bytes {
                if requested > budget {
                    return Err(QueryCtxError::Storage(format!(
                        "storage budget exhausted: {} of {budget} bytes in use, {size_bytes} requested",
                        stats.bytes_in_use
                    )));
                }
            }
            stats.bytes_in_use = requested;
            stats.blocks_in_use += 1;
            stats.peak_bytes = stats.peak_bytes.max(requested);
            stats.blocks_allocated_total += 1;
        }

        let id = self.inner.next_block_id.fetch_add(1, Ordering::Relaxed);
        debug!(block_id = id, size_bytes, "allocated block");
        Ok(Block {
            id,
            size_bytes,
            owner: Arc::clone(&self.inner),
        })
    }

    pub fn stats(&self) -> StorageStats {
        *self.inner.stats.lock()
    }
}

/// A reservation of `size_bytes` from a [`StorageManager`].
#[derive(Debug)]
pub struct Block {
    id: BlockId,
    size_bytes: usize,
    owner: Arc<StorageInner>,
}

impl Block {
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        let mut stats = self.owner.stats.lock();
        stats.bytes_in_use = stats.bytes_in_use.saturating_sub(self.size_bytes);
        stats.blocks_in_use = stats.blocks_in_use.saturating_sub(1);
    }
}
