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

use crate::catalog::Column;
use crate::error::{QueryCtxError, Result};
use crate::spec::GeneratorFunctionSpec;
use crate::types::{DataType, Value};
use crate::util::strings::to_lower;

/// A table-generating function resolved by name.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorFunction {
    /// `generate_series(start, end[, step])`, inclusive of `end`.
    GenerateSeries {
        start: i64,
        end: i64,
        step: i64,
        data_type: DataType,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorFunctionHandle {
    name: String,
    args: Vec<Value>,
    function: GeneratorFunction,
}

impl GeneratorFunctionHandle {
    /// Look up the function (case-insensitively) and check its arguments.
    pub fn resolve(spec: &GeneratorFunctionSpec) -> Result<Self> {
        let name = to_lower(&spec.function_name);
        let function = match name.as_str() {
            "generate_series" => resolve_generate_series(&spec.args)?,
            _ => {
                return Err(QueryCtxError::Catalog(format!(
                    "unknown generator function '{}'",
                    spec.function_name
                )));
            }
        };
        Ok(Self {
            name,
            args: spec.args.clone(),
            function,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn function(&self) -> &GeneratorFunction {
        &self.function
    }

    pub fn output_schema(&self) -> Vec<Column> {
        match &self.function {
            GeneratorFunction::GenerateSeries { data_type, .. } => {
                vec![Column::new(&self.name, data_type.clone(), false)]
            }
        }
    }

    pub fn num_rows(&self) -> usize {
        match self.function {
            GeneratorFunction::GenerateSeries {
                start, end, step, ..
            } => {
                if (step > 0 && start > end) || (step < 0 && start < end) {
                    return 0;
                }
                let span = (i128::from(end) - i128::from(start)) / i128::from(step);
                usize::try_from(span + 1).unwrap_or(usize::MAX)
            }
        }
    }

    /// Materialize every generated row.
    pub fn generate(&self) -> Vec<Vec<Value>> {
        match self.function {
            GeneratorFunction::GenerateSeries {
                start,
                step,
                ref data_type,
                ..
            } => {
                let mut out = Vec::with_capacity(self.num_rows().min(1 << 16));
                let mut current = i128::from(start);
                for _ in 0..self.num_rows() {
                    // Bounded by `end`, so the narrowing never truncates.
                    let v = current as i64;
                    out.push(vec![match data_type {
                        DataType::Int32 => Value::Int32(v as i32),
                        _ => Value::Int64(v),
                    }]);
                    current += i128::from(step);
                }
                out
            }
        }
    }
}

fn resolve_generate_series(args: &[Value]) -> Result<GeneratorFunction> {
    if !(2..=3).contains(&args.len()) {
        return Err(QueryCtxError::Catalog(format!(
            "generate_series takes 2 or 3 arguments, got {}",
            args.len()
        )));
    }
    let mut ints = Vec::with_capacity(args.len());
    for arg in args {
        let v = arg.as_i64().ok_or_else(|| {
            QueryCtxError::Catalog(format!(
                "generate_series arguments must be integers, got {:?}",
                arg.data_type()
            ))
        })?;
        ints.push(v);
    }
    let step = ints.get(2).copied().unwrap_or(1);
    if step == 0 {
        return Err(QueryCtxError::Catalog(
            "generate_series step must be non-zero".to_string(),
        ));
    }
    let data_type = if args.iter().all(|a| matches!(a, Value::Int32(_))) {
        DataType::Int32
    } else {
        DataType::Int64
    };
    Ok(GeneratorFunction::GenerateSeries {
        start: ints[0],
        end: ints[1],
        step,
        data_type,
    })
}
