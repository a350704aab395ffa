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
use crate::expr::row::RowAccessor;
use crate::expr::scalar::Scalar;
use crate::spec::{ComparisonOp, PredicateSpec};
use crate::types::DataType;
use std::cmp::Ordering;

/// A bound boolean filter. Comparisons involving NULL never match.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    True,
    False,
    Comparison {
        op: ComparisonOp,
        left: Scalar,
        right: Scalar,
    },
    Conjunction(Vec<Predicate>),
    Disjunction(Vec<Predicate>),
    Negation(Box<Predicate>),
    IsNull(Scalar),
}

impl Predicate {
    pub fn bind(spec: &PredicateSpec, catalog: &dyn CatalogView) -> Result<Self> {
        Ok(match spec {
            PredicateSpec::True => Self::True,
            PredicateSpec::False => Self::False,
            PredicateSpec::Comparison { op, left, right } => {
                let left = Scalar::bind(left, catalog)?;
                let right = Scalar::bind(right, catalog)?;
                if !comparable(&left.data_type(), &right.data_type()) {
                    return Err(QueryCtxError::Catalog(format!(
                        "cannot compare {:?} with {:?}",
                        left.data_type(),
                        right.data_type()
                    )));
                }
                Self::Comparison {
                    op: *op,
                    left,
                    right,
                }
            }
            PredicateSpec::Conjunction(items) => Self::Conjunction(
                items
                    .iter()
                    .map(|p| Self::bind(p, catalog))
                    .collect::<Result<_>>()?,
            ),
            PredicateSpec::Disjunction(items) => Self::Disjunction(
                items
                    .iter()
                    .map(|p| Self::bind(p, catalog))
                    .collect::<Result<_>>()?,
            ),
            PredicateSpec::Negation(inner) => Self::Negation(Box::new(Self::bind(inner, catalog)?)),
            PredicateSpec::IsNull(scalar) => Self::IsNull(Scalar::bind(scalar, catalog)?),
        })
    }

    pub fn references_only(&self, relation_id: RelationId) -> bool {
        match self {
            Self::True | Self::False => true,
            Self::Comparison { left, right, .. } => {
                left.references_only(relation_id) && right.references_only(relation_id)
            }
            Self::Conjunction(items) | Self::Disjunction(items) => {
                items.iter().all(|p| p.references_only(relation_id))
            }
            Self::Negation(inner) => inner.references_only(relation_id),
            Self::IsNull(scalar) => scalar.references_only(relation_id),
        }
    }

    pub fn matches(&self, row: &dyn RowAccessor) -> Result<bool> {
        match self {
            Self::True => Ok(true),
            Self::False => Ok(false),
            Self::Comparison { op, left, right } => {
                let l = left.eval(row)?;
                let r = right.eval(row)?;
                if l.is_null() || r.is_null() {
                    return Ok(false);
                }
                let ord = l.compare(&r)?;
                Ok(match op {
                    ComparisonOp::Equal => ord == Ordering::Equal,
                    ComparisonOp::NotEqual => ord != Ordering::Equal,
                    ComparisonOp::Less => ord == Ordering::Less,
                    ComparisonOp::LessOrEqual => ord != Ordering::Greater,
                    ComparisonOp::Greater => ord == Ordering::Greater,
                    ComparisonOp::GreaterOrEqual => ord != Ordering::Less,
                })
            }
            Self::Conjunction(items) => {
                for p in items {
                    if !p.matches(row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Disjunction(items) => {
                for p in items {
                    if p.matches(row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Negation(inner) => Ok(!inner.matches(row)?),
            Self::IsNull(scalar) => Ok(scalar.eval(row)?.is_null()),
        }
    }
}

fn comparable(left: &DataType, right: &DataType) -> bool {
    use DataType::*;
    match (left, right) {
        (Null, _) | (_, Null) => true,
        (l, r) if l.is_numeric() && r.is_numeric() => true,
        (Text | Varchar(_), Text | Varchar(_)) => true,
        (l, r) => l == r,
    }
}
