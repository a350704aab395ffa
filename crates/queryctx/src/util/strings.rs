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

use std::fmt::{Display, Write};

pub fn to_lower(s: &str) -> String {
    s.to_ascii_lowercase()
}

/// Replace control characters and backslashes with their escaped spelling.
pub fn escape_special_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn join_to_string<I>(items: I, separator: &str) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    let mut out = String::new();
    for (idx, item) in items.into_iter().enumerate() {
        if idx > 0 {
            out.push_str(separator);
        }
        let _ = write!(out, "{item}");
    }
    out
}

pub fn to_zero_padded_string(val: u64, pad_width: usize) -> String {
    format!("{val:0pad_width$}")
}

/// Print `val` keeping `significant_digits` digits of the fractional part,
/// counted from its first non-zero digit when `|val| < 1`.
///
/// `3.124355123` with 3 digits prints `3.124`; `0.00000000323411` prints
/// `0.00000000323`.
pub fn double_to_string_with_significant_digits(val: f64, significant_digits: usize) -> String {
    if !val.is_finite() {
        return val.to_string();
    }
    if val == 0.0 {
        return "0".to_string();
    }
    let magnitude = val.abs();
    let decimals = if magnitude >= 1.0 {
        significant_digits
    } else {
        let leading_zeros = (-magnitude.log10().floor()) as usize - 1;
        leading_zeros + significant_digits
    };
    format!("{val:.decimals$}")
}
