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

use crate::catalog::RelationSchema;
use crate::error::{QueryCtxError, Result};
use crate::types::Value;
use serde::{Deserialize, Serialize};

/// One literal row, e.g. the payload of an `INSERT ... VALUES` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    values: Vec<Value>,
}

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cast every value to its attribute's type, enforcing arity and nullability.
    pub fn conform_to(&self, relation: &RelationSchema) -> Result<Tuple> {
        if self.values.len() != relation.attributes.len() {
            return Err(QueryCtxError::Eval(format!(
                "value count {} does not match relation '{}' attribute count {}",
                self.values.len(),
                relation.name,
                relation.attributes.len()
            )));
        }

        let mut out = Vec::with_capacity(self.values.len());
        for (value, attribute) in self.values.iter().zip(&relation.attributes) {
            if value.is_null() && !attribute.nullable {
                return Err(QueryCtxError::Eval(format!(
                    "attribute '{}' is not nullable",
                    attribute.name
                )));
            }
            out.push(value.cast_to(&attribute.data_type)?);
        }
        Ok(Tuple { values: out })
    }
}
