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

use crate::types::DataType;
use serde::{Deserialize, Serialize};

pub type RelationId = u32;
/// Position of an attribute within its relation.
pub type AttributeId = u32;

/// Attribute definition used when creating a relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: &str, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            nullable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSchema {
    pub id: RelationId,
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl RelationSchema {
    pub fn attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.attributes.get(id as usize)
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has_attribute(&self, id: AttributeId) -> bool {
        (id as usize) < self.attributes.len()
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn tuple_size_estimate(&self) -> usize {
        self.attributes
            .iter()
            .map(|a| match a.data_type {
                DataType::Boolean => 1,
                DataType::Int32 => 4,
                DataType::Int64 => 8,
                DataType::Float64 => 8,
                DataType::Datetime => 8,
                DataType::DatetimeInterval => 8,
                DataType::YearMonthInterval => 8,
                DataType::Varchar(n) => n as usize,
                DataType::Text => 24,
                DataType::Null => 0,
            })
            .sum::<usize>()
            .max(1)
    }
}
