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

use crate::context::validate::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryCtxError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("invalid query context description: {0}")]
    Validation(#[from] ValidationError),

    #[error("query context construction failed: {0}")]
    Construction(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{pool} handle {id} out of range (pool holds {len} slots)")]
    HandleOutOfRange {
        pool: &'static str,
        id: u32,
        len: usize,
    },

    #[error("{pool} slot {id} was already released or destroyed")]
    SlotVacated { pool: &'static str, id: u32 },

    #[error("raw handle {raw} is not a valid {pool} handle")]
    InvalidHandle { pool: &'static str, raw: i32 },

    #[error("evaluation error: {0}")]
    Eval(String),
}

impl QueryCtxError {
    /// True for errors that signal a caller breaking the slot access contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::HandleOutOfRange { .. } | Self::SlotVacated { .. } | Self::InvalidHandle { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, QueryCtxError>;
