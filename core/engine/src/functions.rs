//! FILENAME: core/engine/src/functions.rs
//! PURPOSE: Built-in spreadsheet function library.
//! CONTEXT: Aggregates (SUM, AVERAGE, MIN, MAX, COUNT, COUNTA), logical
//! (IF, AND, OR, NOT), math (ABS, ROUND, INT, SQRT, POWER, MOD) and text
//! (LEN, UPPER, LOWER, TRIM, CONCATENATE, CONCAT, LEFT, RIGHT, MID).
//! Unknown names evaluate to #NAME?.
//!
//! Aggregates skip text, booleans and blanks found inside ranges, but coerce
//! scalar arguments (`SUM("3", TRUE)` is 4). Errors inside arguments propagate.

use crate::cell::CellError;
use crate::evaluator::{EvalResult, Evaluator};
use parser::Expression;

type FnResult = Result<EvalResult, CellError>;

impl Evaluator<'_> {
    pub(crate) fn call_function(&mut self, name: &str, args: &[Expression]) -> EvalResult {
        match self.dispatch(name, args) {
            Ok(result) => result,
            Err(e) => EvalResult::Error(e),
        }
    }

    fn dispatch(&mut self, name: &str, args: &[Expression]) -> FnResult {
        match name.to_ascii_uppercase().as_str() {
            // Aggregate functions
            "SUM" => {
                let numbers = self.numeric_args(args)?;
                Ok(EvalResult::Number(numbers.iter().sum()))
            }
            "AVERAGE" => {
                let numbers = self.numeric_args(args)?;
                if numbers.is_empty() {
                    return Err(CellError::Div0);
                }
                Ok(EvalResult::Number(numbers.iter().sum::<f64>() / numbers.len() as f64))
            }
            "MIN" => {
                let numbers = self.numeric_args(args)?;
                Ok(EvalResult::Number(
                    numbers.into_iter().reduce(f64::min).unwrap_or(0.0),
                ))
            }
            "MAX" => {
                let numbers = self.numeric_args(args)?;
                Ok(EvalResult::Number(
                    numbers.into_iter().reduce(f64::max).unwrap_or(0.0),
                ))
            }
            "COUNT" => {
                let count = self
                    .all_values(args)
                    .iter()
                    .filter(|v| matches!(v, EvalResult::Number(_)))
                    .count();
                Ok(EvalResult::Number(count as f64))
            }
            "COUNTA" => {
                let count = self
                    .all_values(args)
                    .iter()
                    .filter(|v| !matches!(v, EvalResult::Empty))
                    .count();
                Ok(EvalResult::Number(count as f64))
            }

            // Logical functions
            "IF" => self.fn_if(args),
            "AND" => {
                let flags = self.boolean_args(args)?;
                Ok(EvalResult::Boolean(flags.into_iter().all(|b| b)))
            }
            "OR" => {
                let flags = self.boolean_args(args)?;
                Ok(EvalResult::Boolean(flags.into_iter().any(|b| b)))
            }
            "NOT" => {
                arity(args, 1, 1)?;
                let value = self.scalar_arg(&args[0])?;
                let flag = value.as_boolean().ok_or(CellError::Value)?;
                Ok(EvalResult::Boolean(!flag))
            }

            // Math functions
            "ABS" => {
                arity(args, 1, 1)?;
                Ok(EvalResult::Number(self.number_arg(&args[0])?.abs()))
            }
            "ROUND" => {
                arity(args, 1, 2)?;
                let number = self.number_arg(&args[0])?;
                let digits = match args.get(1) {
                    Some(arg) => self.number_arg(arg)?.trunc() as i32,
                    None => 0,
                };
                let factor = 10f64.powi(digits);
                Ok(EvalResult::Number((number * factor).round() / factor))
            }
            "INT" => {
                arity(args, 1, 1)?;
                Ok(EvalResult::Number(self.number_arg(&args[0])?.floor()))
            }
            "SQRT" => {
                arity(args, 1, 1)?;
                let number = self.number_arg(&args[0])?;
                if number < 0.0 {
                    return Err(CellError::Value);
                }
                Ok(EvalResult::Number(number.sqrt()))
            }
            "POWER" => {
                arity(args, 2, 2)?;
                let base = self.number_arg(&args[0])?;
                let exponent = self.number_arg(&args[1])?;
                let result = base.powf(exponent);
                if !result.is_finite() {
                    return Err(CellError::Value);
                }
                Ok(EvalResult::Number(result))
            }
            "MOD" => {
                arity(args, 2, 2)?;
                let number = self.number_arg(&args[0])?;
                let divisor = self.number_arg(&args[1])?;
                if divisor == 0.0 {
                    return Err(CellError::Div0);
                }
                // Result takes the sign of the divisor
                Ok(EvalResult::Number(number - divisor * (number / divisor).floor()))
            }

            // Text functions
            "LEN" => {
                arity(args, 1, 1)?;
                let text = self.text_arg(&args[0])?;
                Ok(EvalResult::Number(text.chars().count() as f64))
            }
            "UPPER" => {
                arity(args, 1, 1)?;
                Ok(EvalResult::Text(self.text_arg(&args[0])?.to_uppercase()))
            }
            "LOWER" => {
                arity(args, 1, 1)?;
                Ok(EvalResult::Text(self.text_arg(&args[0])?.to_lowercase()))
            }
            "TRIM" => {
                arity(args, 1, 1)?;
                let text = self.text_arg(&args[0])?;
                Ok(EvalResult::Text(
                    text.split_whitespace().collect::<Vec<_>>().join(" "),
                ))
            }
            "CONCATENATE" | "CONCAT" => {
                let mut joined = String::new();
                for arg in args {
                    for item in self.evaluate(arg).flatten() {
                        if let EvalResult::Error(e) = item {
                            return Err(e);
                        }
                        joined.push_str(&item.as_text());
                    }
                }
                Ok(EvalResult::Text(joined))
            }
            "LEFT" => {
                arity(args, 1, 2)?;
                let text = self.text_arg(&args[0])?;
                let count = self.count_arg(args.get(1))?;
                Ok(EvalResult::Text(text.chars().take(count).collect()))
            }
            "RIGHT" => {
                arity(args, 1, 2)?;
                let text = self.text_arg(&args[0])?;
                let count = self.count_arg(args.get(1))?;
                let skip = text.chars().count().saturating_sub(count);
                Ok(EvalResult::Text(text.chars().skip(skip).collect()))
            }
            "MID" => {
                arity(args, 3, 3)?;
                let text = self.text_arg(&args[0])?;
                let start = self.number_arg(&args[1])?;
                if start < 1.0 {
                    return Err(CellError::Value);
                }
                let count = self.count_arg(Some(&args[2]))?;
                Ok(EvalResult::Text(
                    text.chars().skip(start as usize - 1).take(count).collect(),
                ))
            }

            _ => Err(CellError::Name),
        }
    }

    fn fn_if(&mut self, args: &[Expression]) -> FnResult {
        arity(args, 2, 3)?;
        let condition = self.scalar_arg(&args[0])?;
        let condition = condition.as_boolean().ok_or(CellError::Value)?;

        // Only the chosen branch is evaluated
        if condition {
            Ok(self.evaluate(&args[1]).into_scalar())
        } else if let Some(otherwise) = args.get(2) {
            Ok(self.evaluate(otherwise).into_scalar())
        } else {
            Ok(EvalResult::Boolean(false))
        }
    }

    // ========================================================================
    // ARGUMENT HELPERS
    // ========================================================================

    fn scalar_arg(&mut self, arg: &Expression) -> FnResult {
        match self.evaluate(arg).into_scalar() {
            EvalResult::Error(e) => Err(e),
            value => Ok(value),
        }
    }

    fn number_arg(&mut self, arg: &Expression) -> Result<f64, CellError> {
        self.scalar_arg(arg)?.as_number().ok_or(CellError::Value)
    }

    fn text_arg(&mut self, arg: &Expression) -> Result<String, CellError> {
        Ok(self.scalar_arg(arg)?.as_text())
    }

    /// Optional non-negative character count, defaulting to 1.
    fn count_arg(&mut self, arg: Option<&Expression>) -> Result<usize, CellError> {
        let Some(arg) = arg else {
            return Ok(1);
        };
        let n = self.number_arg(arg)?;
        if n < 0.0 {
            return Err(CellError::Value);
        }
        Ok(n as usize)
    }

    fn numeric_args(&mut self, args: &[Expression]) -> Result<Vec<f64>, CellError> {
        let mut numbers = Vec::new();
        for arg in args {
            match self.evaluate(arg) {
                EvalResult::Array(items) => {
                    for item in EvalResult::Array(items).flatten() {
                        match item {
                            EvalResult::Error(e) => return Err(e),
                            EvalResult::Number(n) => numbers.push(n),
                            _ => {}
                        }
                    }
                }
                EvalResult::Error(e) => return Err(e),
                EvalResult::Empty => {}
                scalar => numbers.push(scalar.as_number().ok_or(CellError::Value)?),
            }
        }
        Ok(numbers)
    }

    /// All values, flattened. Errors are kept as values (COUNT skips them).
    fn all_values(&mut self, args: &[Expression]) -> Vec<EvalResult> {
        args.iter()
            .flat_map(|arg| self.evaluate(arg).flatten())
            .collect()
    }

    fn boolean_args(&mut self, args: &[Expression]) -> Result<Vec<bool>, CellError> {
        if args.is_empty() {
            return Err(CellError::Value);
        }
        let mut flags = Vec::new();
        for arg in args {
            match self.evaluate(arg) {
                EvalResult::Array(items) => {
                    for item in EvalResult::Array(items).flatten() {
                        match item {
                            EvalResult::Error(e) => return Err(e),
                            EvalResult::Boolean(b) => flags.push(b),
                            EvalResult::Number(n) => flags.push(n != 0.0),
                            _ => {}
                        }
                    }
                }
                EvalResult::Error(e) => return Err(e),
                scalar => flags.push(scalar.as_boolean().ok_or(CellError::Value)?),
            }
        }
        if flags.is_empty() {
            return Err(CellError::Value);
        }
        Ok(flags)
    }
}

fn arity(args: &[Expression], min: usize, max: usize) -> Result<(), CellError> {
    if args.len() < min || args.len() > max {
        Err(CellError::Value)
    } else {
        Ok(())
    }
}
