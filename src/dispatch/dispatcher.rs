//! # Operation Dispatcher
//!
//! Runs one operation on a routed input through the [`AlgebraEngine`] trait and packages the
//! typed result. Equations are reduced to `left - right` for every operation except Solve.
//! Dispatch holds no state between requests and never retries: the engine is deterministic.
use std::collections::HashMap;

use log::{debug, info};

use crate::dispatch::operation::{
    EquationClass, OperationOutput, OperationRequest, OperationResult, OperationTag, Payload,
};
use crate::error::MathError;
use crate::input::normalizer::normalize;
use crate::input::registry::{Binding, FunctionSet, SymbolTable, is_identifier};
use crate::input::router::RoutedInput;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_traits::{AlgebraEngine, Evaluation, IntegralOutcome};

/// below this magnitude a constant equation counts as `0 = 0`
pub const ZERO_TOLERANCE: f64 = 1e-12;

pub struct Dispatcher<'a> {
    engine: &'a dyn AlgebraEngine,
    functions: &'a FunctionSet,
}

impl<'a> Dispatcher<'a> {
    pub fn new(engine: &'a dyn AlgebraEngine, functions: &'a FunctionSet) -> Self {
        Dispatcher { engine, functions }
    }

    /// Runs the requested operation, or the one the router detected.
    /// # Arguments
    /// * `routed` - output of the router for this input
    /// * `request` - operation, target variable and substitutions chosen by the caller
    /// # Returns
    /// exactly one output, or the error that stopped the operation
    pub fn dispatch(&self, routed: &RoutedInput, request: &OperationRequest) -> OperationResult {
        let operation = request.operation.unwrap_or(routed.detected);
        debug!("dispatching {} on `{}`", operation, routed.raw);
        let mut warnings = routed.warnings.clone();
        let (target, payload) = match operation {
            OperationTag::Simplify => (None, Payload::Expression(self.engine.simplify(&routed.form.reduced()))),
            OperationTag::Factor => (None, Payload::Expression(self.engine.factor(&routed.form.reduced()))),
            OperationTag::Expand => (None, Payload::Expression(self.engine.expand(&routed.form.reduced()))),
            OperationTag::Differentiate => {
                let var = resolve_target(routed, request)?;
                let derivative = self.engine.differentiate(&routed.form.reduced(), &var);
                (Some(var), Payload::Expression(derivative))
            }
            OperationTag::Integrate => {
                let var = resolve_target(routed, request)?;
                let payload = match self.engine.integrate(&routed.form.reduced(), &var) {
                    IntegralOutcome::Closed(integral) => Payload::Expression(integral),
                    IntegralOutcome::Unevaluated { integrand, variable } => {
                        warnings.push(format!("no closed form for the integral of {}", integrand));
                        Payload::UnevaluatedIntegral { integrand, variable }
                    }
                };
                (Some(var), payload)
            }
            OperationTag::Solve => self.solve(routed, request)?,
            OperationTag::Evaluate => (None, self.evaluate(routed, request, &mut warnings)?),
        };
        info!("{} of `{}` -> {}", operation, routed.raw, payload);
        Ok(OperationOutput {
            operation,
            target,
            payload,
            warnings,
        })
    }

    fn solve(&self, routed: &RoutedInput, request: &OperationRequest) -> Result<(Option<String>, Payload), MathError> {
        let reduced = self.engine.simplify(&routed.form.reduced());
        if self.engine.free_symbols(&reduced).is_empty() {
            let value = match self.engine.evaluate(&reduced, &HashMap::new())? {
                Evaluation::Numeric(value) => value,
                Evaluation::PartiallyNumeric(rest) => {
                    return Err(MathError::OperationUnsupported(format!("`{}` is not a number", rest)));
                }
            };
            let class = if value.abs() < ZERO_TOLERANCE {
                EquationClass::Identity
            } else {
                EquationClass::Contradiction
            };
            return Ok((None, Payload::Classification(class)));
        }
        let var = resolve_target(routed, request)?;
        let solutions = self.engine.solve(&reduced, &var)?;
        Ok((Some(var), Payload::Solutions(solutions)))
    }

    fn evaluate(
        &self,
        routed: &RoutedInput,
        request: &OperationRequest,
        warnings: &mut Vec<String>,
    ) -> Result<Payload, MathError> {
        let expr = routed.form.reduced();
        let present = self.engine.free_symbols(&expr);
        let mut values: HashMap<String, Expr> = HashMap::new();
        for (name, value_text) in &request.substitutions {
            if !is_identifier(name) || self.functions.is_reserved(name) {
                return Err(MathError::malformed("only variables can be substituted", name.as_str()));
            }
            if !present.contains(name) {
                warnings.push(format!("`{}` does not occur in the expression", name));
            }
            values.insert(name.clone(), self.parse_value(value_text)?);
        }
        match self.engine.evaluate(&expr, &values)? {
            Evaluation::Numeric(value) => Ok(Payload::Numeric(value)),
            Evaluation::PartiallyNumeric(rest) => Ok(Payload::PartiallyNumeric(rest)),
        }
    }

    /// a substitution value goes through the same normalization as the input
    fn parse_value(&self, value_text: &str) -> Result<Expr, MathError> {
        let text = normalize(value_text, self.functions)?;
        let table = SymbolTable::register_variables(&[&text], &[], self.functions);
        self.engine.parse(&text, &table)
    }
}

/// directive variable, then the caller's, then the first free symbol in registry order
fn resolve_target(routed: &RoutedInput, request: &OperationRequest) -> Result<String, MathError> {
    let candidate = routed
        .directive
        .as_ref()
        .map(|d| d.variable.clone())
        .or_else(|| request.target.clone())
        .or_else(|| routed.table.symbols().first().cloned())
        .ok_or_else(|| {
            MathError::NoTargetVariable(format!("`{}` has no variable", routed.raw.trim()))
        })?;
    match routed.table.lookup(&candidate) {
        Some(Binding::Symbol) => Ok(candidate),
        Some(_) => Err(MathError::NoTargetVariable(format!(
            "`{}` is a builtin name; rename the variable",
            candidate
        ))),
        None if is_identifier(&candidate) => Ok(candidate),
        None => Err(MathError::NoTargetVariable(format!(
            "`{}` is not a valid variable name",
            candidate
        ))),
    }
}
