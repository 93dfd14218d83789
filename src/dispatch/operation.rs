//! Request and result types of the dispatcher.
use std::fmt;

use strum_macros::{Display, EnumIter, EnumString};

use crate::error::MathError;
use crate::symbolic::symbolic_engine::{Expr, format_number};
use crate::symbolic::symbolic_solve::Solution;

/// the closed set of operations; parses from user labels, case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum OperationTag {
    #[strum(to_string = "Simplify", serialize = "simp")]
    Simplify,
    #[strum(to_string = "Factor", serialize = "factorize")]
    Factor,
    Expand,
    #[strum(to_string = "Differentiate", serialize = "diff", serialize = "derivative", serialize = "d")]
    Differentiate,
    #[strum(to_string = "Integrate", serialize = "integral", serialize = "int")]
    Integrate,
    Solve,
    #[strum(to_string = "Evaluate", serialize = "eval", serialize = "subs")]
    Evaluate,
}

/// what the caller asks for; every field is optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationRequest {
    /// `None` runs the operation detected by the router
    pub operation: Option<OperationTag>,
    pub target: Option<String>,
    /// (name, value text) pairs for Evaluate
    pub substitutions: Vec<(String, String)>,
}

impl OperationRequest {
    pub fn new() -> Self {
        OperationRequest::default()
    }

    pub fn operation(mut self, operation: OperationTag) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn substitute(mut self, name: &str, value: &str) -> Self {
        self.substitutions.push((name.to_string(), value.to_string()));
        self
    }

    pub fn substitutions(mut self, pairs: Vec<(String, String)>) -> Self {
        self.substitutions.extend(pairs);
        self
    }
}

/// outcome of solving an equation without free symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EquationClass {
    /// holds for every value
    Identity,
    /// holds for no value
    Contradiction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Expression(Expr),
    /// the engine found no closed form; `∫ integrand d(variable)`
    UnevaluatedIntegral { integrand: Expr, variable: String },
    Solutions(Vec<Solution>),
    Classification(EquationClass),
    Numeric(f64),
    PartiallyNumeric(Expr),
}

impl Payload {
    /// Renders the payload; numbers are rounded to `precision` significant digits.
    pub fn render(&self, precision: usize) -> String {
        match self {
            Payload::Numeric(value) => format_number(round_significant(*value, precision)),
            other => other.to_string(),
        }
    }
}

/// rounds to `digits` significant digits
pub fn round_significant(value: f64, digits: usize) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(digits as i32 - 1 - magnitude);
    if !scale.is_finite() || scale == 0.0 {
        return value;
    }
    (value * scale).round() / scale
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Payload::Expression(e) | Payload::PartiallyNumeric(e) => write!(f, "{}", e),
            Payload::UnevaluatedIntegral { integrand, variable } => {
                write!(f, "Integral({}, {})", integrand, variable)
            }
            Payload::Solutions(solutions) if solutions.is_empty() => write!(f, "no solutions"),
            Payload::Solutions(solutions) => {
                let list: Vec<String> = solutions.iter().map(|s| s.to_string()).collect();
                write!(f, "{{{}}}", list.join(", "))
            }
            Payload::Classification(class) => write!(f, "{}", class),
            Payload::Numeric(value) => write!(f, "{}", format_number(*value)),
        }
    }
}

/// one successful dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutput {
    pub operation: OperationTag,
    /// variable the operation acted on, if it needed one
    pub target: Option<String>,
    pub payload: Payload,
    pub warnings: Vec<String>,
}

impl fmt::Display for OperationOutput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.target, &self.payload) {
            (Some(var), Payload::Solutions(solutions)) if !solutions.is_empty() => {
                let list: Vec<String> = solutions.iter().map(|s| format!("{} = {}", var, s)).collect();
                write!(f, "{}", list.join(", "))
            }
            _ => write!(f, "{}", self.payload),
        }
    }
}

pub type OperationResult = Result<OperationOutput, MathError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_tags_parse_from_labels() {
        assert_eq!(OperationTag::from_str("solve").unwrap(), OperationTag::Solve);
        assert_eq!(OperationTag::from_str("FACTOR").unwrap(), OperationTag::Factor);
        assert_eq!(OperationTag::from_str("diff").unwrap(), OperationTag::Differentiate);
        assert_eq!(OperationTag::from_str("Eval").unwrap(), OperationTag::Evaluate);
        assert!(OperationTag::from_str("plot").is_err());
        for tag in OperationTag::iter() {
            assert_eq!(OperationTag::from_str(&tag.to_string()).unwrap(), tag);
        }
    }

    #[test]
    fn test_request_builder() {
        let request = OperationRequest::new()
            .operation(OperationTag::Evaluate)
            .substitute("x", "3");
        assert_eq!(request.operation, Some(OperationTag::Evaluate));
        assert_eq!(request.substitutions, vec![("x".to_string(), "3".to_string())]);
        assert_eq!(request.target, None);
    }

    #[test]
    fn test_output_display() {
        let output = OperationOutput {
            operation: OperationTag::Solve,
            target: Some("x".to_string()),
            payload: Payload::Solutions(vec![
                Solution::Exact(Expr::Const(-2.0)),
                Solution::Exact(Expr::Const(2.0)),
            ]),
            warnings: Vec::new(),
        };
        assert_eq!(output.to_string(), "x = -2, x = 2");
        assert_eq!(Payload::Solutions(Vec::new()).to_string(), "no solutions");
        assert_eq!(Payload::Classification(EquationClass::Identity).to_string(), "Identity");
    }

    #[test]
    fn test_numeric_rendering() {
        assert_eq!(Payload::Numeric(10.0).render(10), "10");
        assert_eq!(Payload::Numeric(std::f64::consts::PI).render(4), "3.142");
        assert_eq!(round_significant(0.000123456, 3), 0.000123);
    }
}
