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
use crate::types::datetime::{DatetimeIntervalLit, DatetimeLit, YearMonthIntervalLit};
use crate::util::strings::{double_to_string_with_significant_digits, escape_special_chars};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float64,
    Text,
    Varchar(u32),
    Datetime,
    DatetimeInterval,
    YearMonthInterval,
    Null,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Float64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Text(String),
    Datetime(DatetimeLit),
    DatetimeInterval(DatetimeIntervalLit),
    YearMonthInterval(YearMonthIntervalLit),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Boolean(_) => DataType::Boolean,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Text(_) => DataType::Text,
            Self::Datetime(_) => DataType::Datetime,
            Self::DatetimeInterval(_) => DataType::DatetimeInterval,
            Self::YearMonthInterval(_) => DataType::YearMonthInterval,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int32(v) => Some(f64::from(*v)),
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Append a self-delimiting byte encoding used for hashing and grouping.
    ///
    /// Integers of both widths encode identically so `Int32(1)` and `Int64(1)`
    /// land in the same group or hash bucket.
    pub fn encode_key(&self, out: &mut Vec<u8>) {
        match self {
            Self::Null => out.push(0),
            Self::Boolean(v) => out.extend_from_slice(&[1, u8::from(*v)]),
            Self::Int32(_) | Self::Int64(_) => {
                out.push(2);
                out.extend_from_slice(&self.as_i64().unwrap_or_default().to_le_bytes());
            }
            Self::Float64(v) => {
                out.push(3);
                out.extend_from_slice(&v.to_bits().to_le_bytes());
            }
            Self::Text(v) => {
                out.push(4);
                out.extend_from_slice(&(v.len() as u32).to_le_bytes());
                out.extend_from_slice(v.as_bytes());
            }
            Self::Datetime(v) => {
                out.push(5);
                out.extend_from_slice(&v.ticks.to_le_bytes());
            }
            Self::DatetimeInterval(v) => {
                out.push(6);
                out.extend_from_slice(&v.micros.to_le_bytes());
            }
            Self::YearMonthInterval(v) => {
                out.push(7);
                out.extend_from_slice(&v.months.to_le_bytes());
            }
        }
    }

    pub fn cast_to(&self, target: &DataType) -> Result<Value> {
        if self.is_null() {
            return Ok(Value::Null);
        }

        let out = match (self, target) {
            (Value::Boolean(v), DataType::Boolean) => Value::Boolean(*v),
            (Value::Int32(v), DataType::Int32) => Value::Int32(*v),
            (Value::Int64(v), DataType::Int64) => Value::Int64(*v),
            (Value::Float64(v), DataType::Float64) => Value::Float64(*v),
            (Value::Text(v), DataType::Text | DataType::Varchar(_)) => Value::Text(v.clone()),
            (Value::Datetime(v), DataType::Datetime) => Value::Datetime(*v),
            (Value::DatetimeInterval(v), DataType::DatetimeInterval) => {
                Value::DatetimeInterval(*v)
            }
            (Value::YearMonthInterval(v), DataType::YearMonthInterval) => {
                Value::YearMonthInterval(*v)
            }

            (Value::Int32(v), DataType::Int64) => Value::Int64(i64::from(*v)),
            (Value::Int64(v), DataType::Int32) => {
                let narrowed = i32::try_from(*v)
                    .map_err(|_| QueryCtxError::Eval("cast int64->int32 overflow".to_string()))?;
                Value::Int32(narrowed)
            }
            (Value::Int32(v), DataType::Float64) => Value::Float64(f64::from(*v)),
            (Value::Int64(v), DataType::Float64) => Value::Float64(*v as f64),
            (Value::Int64(v), DataType::Datetime) => Value::Datetime(DatetimeLit { ticks: *v }),

            (Value::Text(v), DataType::Int32) => Value::Int32(
                v.trim()
                    .parse()
                    .map_err(|_| QueryCtxError::Eval("cast text->int32 failed".to_string()))?,
            ),
            (Value::Text(v), DataType::Int64) => Value::Int64(
                v.trim()
                    .parse()
                    .map_err(|_| QueryCtxError::Eval("cast text->int64 failed".to_string()))?,
            ),
            (Value::Text(v), DataType::Float64) => Value::Float64(
                v.trim()
                    .parse()
                    .map_err(|_| QueryCtxError::Eval("cast text->float64 failed".to_string()))?,
            ),

            (v, DataType::Text | DataType::Varchar(_)) => Value::Text(v.to_string()),

            _ => {
                return Err(QueryCtxError::Eval(format!(
                    "unsupported cast from {:?} to {:?}",
                    self.data_type(),
                    target
                )));
            }
        };

        if let (DataType::Varchar(limit), Value::Text(s)) = (target, &out) {
            if s.len() > *limit as usize {
                return Err(QueryCtxError::Eval("varchar length exceeded".to_string()));
            }
        }

        Ok(out)
    }

    /// Three-way comparison of two non-null values of comparable types.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        let out = match (self, other) {
            (Value::Null, _) | (_, Value::Null) => {
                return Err(QueryCtxError::Eval("cannot compare NULL values".to_string()));
            }
            (Value::Boolean(l), Value::Boolean(r)) => l.cmp(r),
            (Value::Text(l), Value::Text(r)) => l.cmp(r),
            (Value::Datetime(l), Value::Datetime(r)) => l.cmp(r),
            (Value::DatetimeInterval(l), Value::DatetimeInterval(r)) => l.cmp(r),
            (Value::YearMonthInterval(l), Value::YearMonthInterval(r)) => l.cmp(r),
            (l, r) => match (l.as_i64(), r.as_i64()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => match (l.as_f64(), r.as_f64()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(|| {
                        QueryCtxError::Eval("cannot compare NaN values".to_string())
                    })?,
                    _ => {
                        return Err(QueryCtxError::Eval(format!(
                            "cannot compare {:?} and {:?}",
                            l.data_type(),
                            r.data_type()
                        )));
                    }
                },
            },
        };
        Ok(out)
    }

    pub fn eq(&self, other: &Value) -> Result<bool> {
        Ok(self.compare(other)? == Ordering::Equal)
    }

    pub fn lt(&self, other: &Value) -> Result<bool> {
        Ok(self.compare(other)? == Ordering::Less)
    }

    pub fn gt(&self, other: &Value) -> Result<bool> {
        Ok(self.compare(other)? == Ordering::Greater)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{}", double_to_string_with_significant_digits(*v, 6)),
            Value::Text(v) => write!(f, "'{}'", escape_special_chars(v)),
            Value::Datetime(v) => write!(f, "{v}"),
            Value::DatetimeInterval(v) => write!(f, "{v}"),
            Value::YearMonthInterval(v) => write!(f, "{v}"),
        }
    }
}
