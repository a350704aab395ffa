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

//! Scalar expressions bound against the catalog.

use crate::catalog::{AttributeId, CatalogView, RelationId};
use crate::error::{QueryCtxError, Result};
use crate::expr::row::RowAccessor;
use crate::spec::{ArithmeticOp, ScalarSpec};
use crate::types::{DataType, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Attribute {
        relation_id: RelationId,
        attribute_id: AttributeId,
        data_type: DataType,
    },
    Literal(Value),
    Binary {
        op: ArithmeticOp,
        left: Box<Scalar>,
        right: Box<Scalar>,
        data_type: DataType,
    },
    Negate(Box<Scalar>),
}

impl Scalar {
    /// Resolve attribute references and type-check operators.
    pub fn bind(spec: &ScalarSpec, catalog: &dyn CatalogView) -> Result<Self> {
        match spec {
            ScalarSpec::Attribute {
                relation_id,
                attribute_id,
            } => {
                let relation = catalog.relation(*relation_id).ok_or_else(|| {
                    QueryCtxError::Catalog(format!("relation {relation_id} does not exist"))
                })?;
                let attribute = relation.attribute(*attribute_id).ok_or_else(|| {
                    QueryCtxError::Catalog(format!(
                        "attribute {attribute_id} does not exist in relation '{}'",
                        relation.name
                    ))
                })?;
                Ok(Self::Attribute {
                    relation_id: *relation_id,
                    attribute_id: *attribute_id,
                    data_type: attribute.data_type.clone(),
                })
            }
            ScalarSpec::Literal(v) => Ok(Self::Literal(v.clone())),
            ScalarSpec::Binary { op, left, right } => {
                let left = Self::bind(left, catalog)?;
                let right = Self::bind(right, catalog)?;
                let data_type = arithmetic_type(*op, &left.data_type(), &right.data_type())
                    .ok_or_else(|| {
                        QueryCtxError::Catalog(format!(
                            "unsupported '{}' operands: {:?} and {:?}",
                            op_symbol(*op),
                            left.data_type(),
                            right.data_type()
                        ))
                    })?;
                Ok(Self::Binary {
                    op: *op,
                    left: Box::new(left),
                    right: Box::new(right),
                    data_type,
                })
            }
            ScalarSpec::Negate(inner) => {
                let inner = Self::bind(inner, catalog)?;
                match inner.data_type() {
                    DataType::Int32
                    | DataType::Int64
                    | DataType::Float64
                    | DataType::DatetimeInterval
                    | DataType::YearMonthInterval
                    | DataType::Null => Ok(Self::Negate(Box::new(inner))),
                    other => Err(QueryCtxError::Catalog(format!(
                        "cannot negate a {other:?} expression"
                    ))),
                }
            }
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Attribute { data_type, .. } | Self::Binary { data_type, .. } => {
                data_type.clone()
            }
            Self::Literal(v) => v.data_type(),
            Self::Negate(inner) => inner.data_type(),
        }
    }

    /// True when every attribute reference points into `relation_id`.
    pub fn references_only(&self, relation_id: RelationId) -> bool {
        match self {
            Self::Attribute {
                relation_id: rel, ..
            } => *rel == relation_id,
            Self::Literal(_) => true,
            Self::Binary { left, right, .. } => {
                left.references_only(relation_id) && right.references_only(relation_id)
            }
            Self::Negate(inner) => inner.references_only(relation_id),
        }
    }

    pub fn eval(&self, row: &dyn RowAccessor) -> Result<Value> {
        match self {
            Self::Attribute {
                relation_id,
                attribute_id,
                ..
            } => row
                .value(*relation_id, *attribute_id)
                .cloned()
                .ok_or_else(|| {
                    QueryCtxError::Eval(format!(
                        "attribute {relation_id}.{attribute_id} is not available in the row"
                    ))
                }),
            Self::Literal(v) => Ok(v.clone()),
            Self::Binary {
                op, left, right, ..
            } => {
                let l = left.eval(row)?;
                let r = right.eval(row)?;
                apply_arithmetic(*op, &l, &r)
            }
            Self::Negate(inner) => negate(&inner.eval(row)?),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute {
                relation_id,
                attribute_id,
                ..
            } => write!(f, "${relation_id}.{attribute_id}"),
            Self::Literal(v) => write!(f, "{v}"),
            Self::Binary {
                op, left, right, ..
            } => write!(f, "({left} {} {right})", op_symbol(*op)),
            Self::Negate(inner) => write!(f, "-{inner}"),
        }
    }
}

fn op_symbol(op: ArithmeticOp) -> &'static str {
    match op {
        ArithmeticOp::Add => "+",
        ArithmeticOp::Subtract => "-",
        ArithmeticOp::Multiply => "*",
        ArithmeticOp::Divide => "/",
    }
}

/// Static result type of `left op right`, or `None` if the operands do not combine.
pub fn arithmetic_type(op: ArithmeticOp, left: &DataType, right: &DataType) -> Option<DataType> {
    use DataType::*;

    if matches!(left, Null) || matches!(right, Null) {
        return Some(Null);
    }
    if left.is_numeric() && right.is_numeric() {
        return Some(match (left, right) {
            (Int32, Int32) => Int32,
            (Float64, _) | (_, Float64) => Float64,
            _ => Int64,
        });
    }

    match (op, left, right) {
        (ArithmeticOp::Add, Datetime, DatetimeInterval | YearMonthInterval)
        | (ArithmeticOp::Add, DatetimeInterval | YearMonthInterval, Datetime)
        | (ArithmeticOp::Subtract, Datetime, DatetimeInterval | YearMonthInterval) => {
            Some(Datetime)
        }
        (ArithmeticOp::Subtract, Datetime, Datetime) => Some(DatetimeInterval),
        (ArithmeticOp::Add | ArithmeticOp::Subtract, DatetimeInterval, DatetimeInterval) => {
            Some(DatetimeInterval)
        }
        (ArithmeticOp::Add | ArithmeticOp::Subtract, YearMonthInterval, YearMonthInterval) => {
            Some(YearMonthInterval)
        }
        (ArithmeticOp::Multiply, DatetimeInterval, n)
        | (ArithmeticOp::Multiply, n, DatetimeInterval)
            if n.is_numeric() =>
        {
            Some(DatetimeInterval)
        }
        (ArithmeticOp::Multiply, YearMonthInterval, n)
        | (ArithmeticOp::Multiply, n, YearMonthInterval)
            if n.is_numeric() =>
        {
            Some(YearMonthInterval)
        }
        (ArithmeticOp::Divide, DatetimeInterval, n) if n.is_numeric() => Some(DatetimeInterval),
        (ArithmeticOp::Divide, YearMonthInterval, n) if n.is_numeric() => {
            Some(YearMonthInterval)
        }
        _ => None,
    }
}

/// Evaluate `left op right`. NULL on either side yields NULL.
pub fn apply_arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    match op {
        ArithmeticOp::Add => eval_add(left, right),
        ArithmeticOp::Subtract => eval_sub(left, right),
        ArithmeticOp::Multiply => eval_mul(left, right),
        ArithmeticOp::Divide => eval_div(left, right),
    }
}

fn unsupported(symbol: &str, left: &Value, right: &Value) -> QueryCtxError {
    QueryCtxError::Eval(format!(
        "unsupported '{symbol}' operands: {:?} and {:?}",
        left.data_type(),
        right.data_type()
    ))
}

fn eval_add(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int32(l), Value::Int32(r)) => Ok(Value::Int32(l.saturating_add(*r))),
        (Value::Datetime(l), Value::DatetimeInterval(r)) => Ok(Value::Datetime(*l + *r)),
        (Value::DatetimeInterval(l), Value::Datetime(r)) => Ok(Value::Datetime(*l + *r)),
        (Value::Datetime(l), Value::YearMonthInterval(r)) => {
            Ok(Value::Datetime(l.add_year_month(*r)?))
        }
        (Value::YearMonthInterval(l), Value::Datetime(r)) => {
            Ok(Value::Datetime(r.add_year_month(*l)?))
        }
        (Value::DatetimeInterval(l), Value::DatetimeInterval(r)) => {
            Ok(Value::DatetimeInterval(*l + *r))
        }
        (Value::YearMonthInterval(l), Value::YearMonthInterval(r)) => {
            Ok(Value::YearMonthInterval(*l + *r))
        }
        _ => numeric(left, right, i64::saturating_add, |l, r| l + r)
            .ok_or_else(|| unsupported("+", left, right)),
    }
}

fn eval_sub(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int32(l), Value::Int32(r)) => Ok(Value::Int32(l.saturating_sub(*r))),
        (Value::Datetime(l), Value::DatetimeInterval(r)) => Ok(Value::Datetime(*l - *r)),
        (Value::Datetime(l), Value::YearMonthInterval(r)) => {
            Ok(Value::Datetime(l.sub_year_month(*r)?))
        }
        (Value::Datetime(l), Value::Datetime(r)) => Ok(Value::DatetimeInterval(*l - *r)),
        (Value::DatetimeInterval(l), Value::DatetimeInterval(r)) => {
            Ok(Value::DatetimeInterval(*l - *r))
        }
        (Value::YearMonthInterval(l), Value::YearMonthInterval(r)) => {
            Ok(Value::YearMonthInterval(*l - *r))
        }
        _ => numeric(left, right, i64::saturating_sub, |l, r| l - r)
            .ok_or_else(|| unsupported("-", left, right)),
    }
}

fn eval_mul(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int32(l), Value::Int32(r)) => Ok(Value::Int32(l.saturating_mul(*r))),
        (Value::DatetimeInterval(iv), n) | (n, Value::DatetimeInterval(iv)) => {
            match (n.as_i64(), n.as_f64()) {
                (Some(k), _) => Ok(Value::DatetimeInterval(*iv * k)),
                (None, Some(k)) => Ok(Value::DatetimeInterval(*iv * k)),
                _ => Err(unsupported("*", left, right)),
            }
        }
        (Value::YearMonthInterval(iv), n) | (n, Value::YearMonthInterval(iv)) => {
            match (n.as_i64(), n.as_f64()) {
                (Some(k), _) => Ok(Value::YearMonthInterval(*iv * k)),
                (None, Some(k)) => Ok(Value::YearMonthInterval(*iv * k)),
                _ => Err(unsupported("*", left, right)),
            }
        }
        _ => numeric(left, right, i64::saturating_mul, |l, r| l * r)
            .ok_or_else(|| unsupported("*", left, right)),
    }
}

fn eval_div(left: &Value, right: &Value) -> Result<Value> {
    let is_zero = match right {
        Value::Int32(v) => *v == 0,
        Value::Int64(v) => *v == 0,
        Value::Float64(v) => *v == 0.0,
        _ => false,
    };
    if is_zero {
        return Err(QueryCtxError::Eval("division by zero".to_string()));
    }

    match (left, right) {
        (Value::Int32(l), Value::Int32(r)) => l
            .checked_div(*r)
            .map(Value::Int32)
            .ok_or_else(division_overflow),
        (Value::DatetimeInterval(iv), n) => match (n.as_i64(), n.as_f64()) {
            (Some(k), _) => iv
                .checked_div(k)
                .map(Value::DatetimeInterval)
                .ok_or_else(|| QueryCtxError::Eval("interval division overflow".to_string())),
            (None, Some(k)) => Ok(Value::DatetimeInterval(*iv / k)),
            _ => Err(unsupported("/", left, right)),
        },
        (Value::YearMonthInterval(iv), n) => match (n.as_i64(), n.as_f64()) {
            (Some(k), _) => iv
                .checked_div(k)
                .map(Value::YearMonthInterval)
                .ok_or_else(|| QueryCtxError::Eval("interval division overflow".to_string())),
            (None, Some(k)) => Ok(Value::YearMonthInterval(*iv / k)),
            _ => Err(unsupported("/", left, right)),
        },
        _ => {
            if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
                return l.checked_div(r).map(Value::Int64).ok_or_else(division_overflow);
            }
            // Integer pairs returned above; only float division reaches here.
            numeric(left, right, i64::wrapping_div, |l, r| l / r)
                .ok_or_else(|| unsupported("/", left, right))
        }
    }
}

fn division_overflow() -> QueryCtxError {
    QueryCtxError::Eval("integer division overflow".to_string())
}

/// Mixed-width integer and float arithmetic; `Int32 op Int32` is handled by callers.
fn numeric(
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Option<Value> {
    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        return Some(Value::Int64(int_op(l, r)));
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => Some(Value::Float64(float_op(l, r))),
        _ => None,
    }
}

fn negate(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Int32(v) => Ok(Value::Int32(v.saturating_neg())),
        Value::Int64(v) => Ok(Value::Int64(v.saturating_neg())),
        Value::Float64(v) => Ok(Value::Float64(-v)),
        Value::DatetimeInterval(v) => Ok(Value::DatetimeInterval(-*v)),
        Value::YearMonthInterval(v) => Ok(Value::YearMonthInterval(-*v)),
        other => Err(QueryCtxError::Eval(format!(
            "cannot negate {:?}",
            other.data_type()
        ))),
    }
}
