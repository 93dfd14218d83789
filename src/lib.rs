// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
//! # RustedMathSolver
//!
//! Turns loosely written textbook mathematics into unambiguous symbolic expressions and runs
//! simplify, factor, expand, differentiate, integrate, solve and evaluate on them.
//!
//! ```
//! use RustedMathSolver::dispatch::operation::{OperationRequest, OperationTag};
//! use RustedMathSolver::solver::MathSolver;
//! let solver = MathSolver::default();
//! let output = solver
//!     .process("2x + 3 = 7", &OperationRequest::new().operation(OperationTag::Solve))
//!     .unwrap();
//! assert_eq!(output.to_string(), "x = 2");
//! ```
pub mod Utils;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod solver;
pub mod symbolic;

use crate::error::MathError;
use crate::input::router::RoutedInput;
use crate::solver::MathSolver;

/// Normalizes, routes and parses `raw` with the default configuration.
pub fn normalize_and_parse(raw: &str) -> Result<RoutedInput, MathError> {
    MathSolver::default().route(raw, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_and_parse() {
        let routed = normalize_and_parse("3x^2 + sinx").unwrap();
        assert_eq!(routed.normalized[0].as_str(), "3*x**2+sin(x)");
        assert!(matches!(normalize_and_parse("(("), Err(MathError::MalformedInput { .. })));
    }
}
