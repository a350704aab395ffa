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
use std::str::FromStr;

pub const ENV_BLOCK_SIZE_BYTES: &str = "QUERYCTX_BLOCK_SIZE_BYTES";
pub const ENV_BLOCK_CAPACITY_ROWS: &str = "QUERYCTX_BLOCK_CAPACITY_ROWS";
pub const ENV_STORAGE_BUDGET_BYTES: &str = "QUERYCTX_STORAGE_BUDGET_BYTES";
pub const ENV_MAX_BLOOM_FILTER_BYTES: &str = "QUERYCTX_MAX_BLOOM_FILTER_BYTES";
pub const ENV_MAX_PARTITIONS: &str = "QUERYCTX_MAX_PARTITIONS";

/// Knobs shared by the storage manager and the resources a query context builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// Bytes reserved per storage block.
    pub block_size_bytes: usize,
    /// Rows an insert destination places in a block before reporting it full.
    pub default_block_capacity_rows: usize,
    /// Upper bound on bytes the storage manager hands out; `None` is unbounded.
    pub storage_budget_bytes: Option<usize>,
    pub max_bloom_filter_bytes: usize,
    /// Largest partition count an insert destination may ask for.
    pub max_partitions: u32,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            block_size_bytes: 64 * 1024,
            default_block_capacity_rows: 1024,
            storage_budget_bytes: None,
            max_bloom_filter_bytes: 16 * 1024 * 1024,
            max_partitions: 1024,
        }
    }
}

impl ContextOptions {
    /// Defaults overridden by any `QUERYCTX_*` environment variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut opts = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_BLOCK_SIZE_BYTES)? {
            opts.block_size_bytes = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_BLOCK_CAPACITY_ROWS)? {
            opts.default_block_capacity_rows = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_STORAGE_BUDGET_BYTES)? {
            opts.storage_budget_bytes = Some(v);
        }
        if let Some(v) = parse_var(&lookup, ENV_MAX_BLOOM_FILTER_BYTES)? {
            opts.max_bloom_filter_bytes = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_MAX_PARTITIONS)? {
            opts.max_partitions = v;
        }
        if opts.block_size_bytes == 0 || opts.default_block_capacity_rows == 0 {
            return Err(QueryCtxError::Construction(
                "block size and block capacity must be positive".to_string(),
            ));
        }
        Ok(opts)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| QueryCtxError::Construction(format!("invalid value '{raw}' for {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_overrides_defaults() {
        let vars = HashMap::from([
            (ENV_BLOCK_CAPACITY_ROWS, "8"),
            (ENV_STORAGE_BUDGET_BYTES, " 4096 "),
        ]);
        let opts =
            ContextOptions::from_lookup(|k| vars.get(k).map(|v| v.to_string())).expect("options");
        assert_eq!(opts.default_block_capacity_rows, 8);
        assert_eq!(opts.storage_budget_bytes, Some(4096));
        assert_eq!(opts.block_size_bytes, ContextOptions::default().block_size_bytes);
    }

    #[test]
    fn malformed_value_is_rejected() {
        let err = ContextOptions::from_lookup(|k| {
            (k == ENV_BLOCK_SIZE_BYTES).then(|| "lots".to_string())
        })
        .expect_err("non-numeric block size");
        assert!(err.to_string().contains(ENV_BLOCK_SIZE_BYTES));
    }

    #[test]
    fn partition_limit_comes_from_the_environment() {
        assert_eq!(ContextOptions::default().max_partitions, 1024);
        let opts = ContextOptions::from_lookup(|k| {
            (k == ENV_MAX_PARTITIONS).then(|| "16".to_string())
        })
        .expect("options");
        assert_eq!(opts.max_partitions, 16);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(ContextOptions::from_lookup(|k| {
            (k == ENV_BLOCK_CAPACITY_ROWS).then(|| "0".to_string())
        })
        .is_err());
    }
}
