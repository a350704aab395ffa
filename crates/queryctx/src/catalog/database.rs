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

use crate::catalog::schema::{Attribute, Column, RelationId, RelationSchema};
use crate::error::{QueryCtxError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Read-only resolution of relation and attribute references.
pub trait CatalogView {
    fn relation(&self, id: RelationId) -> Option<&RelationSchema>;

    fn relation_by_name(&self, name: &str) -> Option<&RelationSchema>;
}

/// In-memory catalog of one database's relations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDatabase {
    name: String,
    next_relation_id: RelationId,
    relations: BTreeMap<RelationId, RelationSchema>,
}

impl CatalogDatabase {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            next_relation_id: 0,
            relations: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| QueryCtxError::Catalog(format!("invalid catalog file: {e}")))
    }

    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let encoded = serde_json::to_vec_pretty(self)?;
        fs::write(path, encoded)?;
        Ok(())
    }

    pub fn create_relation(&mut self, name: &str, columns: Vec<Column>) -> Result<RelationId> {
        if self.relation_by_name(name).is_some() {
            return Err(QueryCtxError::Catalog(format!(
                "relation '{name}' already exists"
            )));
        }
        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx].iter().any(|c| c.name == column.name) {
                return Err(QueryCtxError::Catalog(format!(
                    "duplicate attribute '{}' in relation '{name}'",
                    column.name
                )));
            }
        }

        let id = self.next_relation_id;
        self.next_relation_id = self.next_relation_id.saturating_add(1);
        let attributes = columns
            .into_iter()
            .enumerate()
            .map(|(pos, c)| Attribute {
                id: pos as u32,
                name: c.name,
                data_type: c.data_type,
                nullable: c.nullable,
            })
            .collect();
        self.relations.insert(
            id,
            RelationSchema {
                id,
                name: name.to_string(),
                attributes,
            },
        );
        Ok(id)
    }

    pub fn drop_relation(&mut self, name: &str) -> Result<()> {
        let id = self
            .relation_by_name(name)
            .map(|r| r.id)
            .ok_or_else(|| QueryCtxError::Catalog(format!("relation '{name}' does not exist")))?;
        self.relations.remove(&id);
        Ok(())
    }

    pub fn list_relations(&self) -> Vec<&RelationSchema> {
        let mut out = self.relations.values().collect::<Vec<_>>();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

impl CatalogView for CatalogDatabase {
    fn relation(&self, id: RelationId) -> Option<&RelationSchema> {
        self.relations.get(&id)
    }

    fn relation_by_name(&self, name: &str) -> Option<&RelationSchema> {
        self.relations.values().find(|r| r.name == name)
    }
}
