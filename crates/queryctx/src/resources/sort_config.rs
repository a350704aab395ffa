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

use crate::catalog::{CatalogView, RelationId};
use crate::error::{QueryCtxError, Result};
use crate::expr::{RelationRow, RowAccessor, Scalar};
use crate::spec::SortConfigSpec;
use crate::types::Value;
use crate::util::strings::join_to_string;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Scalar,
    pub ascending: bool,
    pub nulls_first: bool,
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} NULLS {}",
            self.expr,
            if self.ascending { "ASC" } else { "DESC" },
            if self.nulls_first { "FIRST" } else { "LAST" }
        )
    }
}

/// Ordering used by sort and top-k operators.
#[derive(Debug, Clone, PartialEq)]
pub struct SortConfiguration {
    order_by: Vec<OrderBy>,
}

impl SortConfiguration {
    pub fn bind(spec: &SortConfigSpec, catalog: &dyn CatalogView) -> Result<Self> {
        if spec.order_by.is_empty() {
            return Err(QueryCtxError::Catalog(
                "sort configuration needs at least one ordering item".to_string(),
            ));
        }
        let order_by = spec
            .order_by
            .iter()
            .map(|o| {
                Ok(OrderBy {
                    expr: Scalar::bind(&o.expr, catalog)?,
                    ascending: o.ascending,
                    nulls_first: o.nulls_first,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { order_by })
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn compare_rows(
        &self,
        left: &dyn RowAccessor,
        right: &dyn RowAccessor,
    ) -> Result<Ordering> {
        for item in &self.order_by {
            let ord = compare_keys(item, &item.expr.eval(left)?, &item.expr.eval(right)?)?;
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(Ordering::Equal)
    }

    /// Stable sort of rows belonging to `relation_id`.
    pub fn sort_rows(&self, relation_id: RelationId, rows: &mut Vec<Vec<Value>>) -> Result<()> {
        let mut keyed = Vec::with_capacity(rows.len());
        for row in rows.drain(..) {
            let accessor = RelationRow::new(relation_id, &row);
            let keys = self
                .order_by
                .iter()
                .map(|item| item.expr.eval(&accessor))
                .collect::<Result<Vec<_>>>()?;
            keyed.push((keys, row));
        }

        let mut failure = None;
        keyed.sort_by(|(l, _), (r, _)| {
            for ((item, lv), rv) in self.order_by.iter().zip(l).zip(r) {
                match compare_keys(item, lv, rv) {
                    Ok(Ordering::Equal) => continue,
                    Ok(ord) => return ord,
                    Err(e) => {
                        failure.get_or_insert(e);
                        return Ordering::Equal;
                    }
                }
            }
            Ordering::Equal
        });
        rows.extend(keyed.into_iter().map(|(_, row)| row));
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// NULL placement does not flip with the direction.
fn compare_keys(item: &OrderBy, left: &Value, right: &Value) -> Result<Ordering> {
    let ord = match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) if item.nulls_first => Ordering::Less,
        (true, false) => Ordering::Greater,
        (false, true) if item.nulls_first => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = left.compare(right)?;
            if item.ascending {
                ord
            } else {
                ord.reverse()
            }
        }
    };
    Ok(ord)
}

impl fmt::Display for SortConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ORDER BY {}", join_to_string(&self.order_by, ", "))
    }
}
