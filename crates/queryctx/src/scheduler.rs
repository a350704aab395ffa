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

//! One-way notification path from owned resources to the scheduler.

use crate::catalog::RelationId;
use crate::storage::BlockId;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// Index of the relational operator a resource works on behalf of.
pub type OperatorIndex = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerMessage {
    /// An insert destination finished writing a block.
    BlockFilled {
        operator_index: OperatorIndex,
        relation_id: RelationId,
        block_id: BlockId,
        rows: usize,
    },
    /// A join hash table's build side is complete and may be probed.
    JoinBuildComplete {
        operator_index: OperatorIndex,
        entries: usize,
    },
}

#[derive(Debug, Clone)]
pub struct SchedulerChannel {
    sender: UnboundedSender<SchedulerMessage>,
}

impl SchedulerChannel {
    pub fn new() -> (Self, UnboundedReceiver<SchedulerMessage>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn from_sender(sender: UnboundedSender<SchedulerMessage>) -> Self {
        Self { sender }
    }

    /// Never blocks. A scheduler that already went away only costs a warning.
    pub fn notify(&self, message: SchedulerMessage) {
        debug!(?message, "notifying scheduler");
        if let Err(err) = self.sender.send(message) {
            warn!(message = ?err.0, "scheduler channel closed, dropping notification");
        }
    }
}
