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

use crate::catalog::{AttributeId, RelationId};
use crate::types::Value;

/// Source of attribute values for expression evaluation.
pub trait RowAccessor {
    fn value(&self, relation_id: RelationId, attribute_id: AttributeId) -> Option<&Value>;
}

/// One row of a single relation, attributes in positional order.
#[derive(Debug, Clone, Copy)]
pub struct RelationRow<'a> {
    pub relation_id: RelationId,
    pub values: &'a [Value],
}

impl<'a> RelationRow<'a> {
    pub fn new(relation_id: RelationId, values: &'a [Value]) -> Self {
        Self {
            relation_id,
            values,
        }
    }
}

impl RowAccessor for RelationRow<'_> {
    fn value(&self, relation_id: RelationId, attribute_id: AttributeId) -> Option<&Value> {
        if relation_id != self.relation_id {
            return None;
        }
        self.values.get(attribute_id as usize)
    }
}

/// A build row paired with a probe row, as seen by a join predicate.
#[derive(Debug, Clone, Copy)]
pub struct JoinedRow<'a> {
    pub left: RelationRow<'a>,
    pub right: RelationRow<'a>,
}

impl RowAccessor for JoinedRow<'_> {
    fn value(&self, relation_id: RelationId, attribute_id: AttributeId) -> Option<&Value> {
        self.left
            .value(relation_id, attribute_id)
            .or_else(|| self.right.value(relation_id, attribute_id))
    }
}
