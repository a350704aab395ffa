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

use crate::types::{DataType, DatetimeIntervalLit, DatetimeLit, Value, YearMonthIntervalLit};
use std::cmp::Ordering;

#[test]
fn value_casts_and_comparisons_work() {
    let v = Value::Int32(42);
    let casted = v.cast_to(&DataType::Int64).expect("cast int32->int64");
    assert_eq!(casted, Value::Int64(42));

    let text = Value::Text("123".to_string());
    let parsed = text.cast_to(&DataType::Int32).expect("cast text->int32");
    assert_eq!(parsed, Value::Int32(123));

    assert!(Value::Int32(1).lt(&Value::Int64(2)).expect("lt"));
    assert!(Value::Int64(2).gt(&Value::Int32(1)).expect("gt"));
    assert!(Value::Int64(2).lt(&Value::Float64(2.5)).expect("mixed lt"));
    assert!(Value::Text("a".to_string())
        .eq(&Value::Text("a".to_string()))
        .expect("eq"));
}

#[test]
fn value_invalid_cast_fails() {
    let err = Value::Text("abc".to_string())
        .cast_to(&DataType::Int32)
        .expect_err("invalid cast should fail");
    assert!(err.to_string().contains("cast text->int32 failed"));

    let err = Value::Int64(i64::MAX)
        .cast_to(&DataType::Int32)
        .expect_err("narrowing overflow");
    assert!(err.to_string().contains("overflow"));

    assert!(Value::Text("too long".to_string())
        .cast_to(&DataType::Varchar(3))
        .is_err());
}

#[test]
fn null_casts_to_null_and_refuses_comparison() {
    assert_eq!(
        Value::Null.cast_to(&DataType::Int64).expect("null cast"),
        Value::Null
    );
    assert!(Value::Null.compare(&Value::Int32(1)).is_err());
}

#[test]
fn temporal_values_compare_within_their_kind() {
    let a = Value::Datetime(DatetimeLit::from_epoch_seconds(10));
    let b = Value::Datetime(DatetimeLit::from_epoch_seconds(20));
    assert_eq!(a.compare(&b).expect("cmp"), Ordering::Less);

    let iv = Value::DatetimeInterval(DatetimeIntervalLit::from_seconds(1));
    assert!(a.compare(&iv).is_err());
}

#[test]
fn key_encoding_unifies_integer_widths() {
    let mut narrow = Vec::new();
    Value::Int32(7).encode_key(&mut narrow);
    let mut wide = Vec::new();
    Value::Int64(7).encode_key(&mut wide);
    assert_eq!(narrow, wide);

    let mut text = Vec::new();
    Value::Text("7".to_string()).encode_key(&mut text);
    assert_ne!(text, wide);
}

#[test]
fn display_escapes_text_and_formats_temporal_values() {
    assert_eq!(Value::Text("a\nb".to_string()).to_string(), "'a\\nb'");
    assert_eq!(Value::Float64(3.124355123).to_string(), "3.124355");
    assert_eq!(
        Value::Datetime(DatetimeLit::from_epoch_seconds(1_704_067_200)).to_string(),
        "2024-01-01T00:00:00"
    );
    assert_eq!(
        Value::YearMonthInterval(YearMonthIntervalLit::from_years_months(1, 2)).to_string(),
        "1 year 2 mons"
    );
    assert_eq!(
        Value::DatetimeInterval(DatetimeIntervalLit { micros: 90_061_000_001 }).to_string(),
        "1 day 01:01:01.000001"
    );
}
