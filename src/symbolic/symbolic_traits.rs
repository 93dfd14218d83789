// ALGEBRA ENGINE TRAIT //////////////////////////////////////////////////////////////
// The dispatcher talks to the computer algebra library only through `AlgebraEngine`.
// `NativeEngine` implements it on top of the `Expr` tree; other engines plug in here.

use std::collections::HashMap;

use log::debug;

use crate::error::MathError;
use crate::input::normalizer::NormalizedText;
use crate::input::registry::SymbolTable;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_factor::DEFAULT_EXPAND_POWER;
pub use crate::symbolic::symbolic_integration::IntegralOutcome;
use crate::symbolic::symbolic_solve::Solution;

/// sample values used by the numeric equivalence check
const SAMPLE_POINTS: [f64; 12] = [0.7, 1.3, -0.6, 2.1, 0.35, 3.7, -1.7, 1.9, 0.55, 2.9, 1.15, 4.3];
const MIN_VALID_SAMPLES: usize = 3;
const SAMPLE_TOLERANCE: f64 = 1e-8;

/// value of an `Evaluate` request
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Numeric(f64),
    /// some symbols stayed free; constant subtrees are folded
    PartiallyNumeric(Expr),
}

/// operations the dispatcher needs from a computer algebra library
pub trait AlgebraEngine: Send + Sync {
    fn name(&self) -> &str;
    fn parse(&self, text: &NormalizedText, table: &SymbolTable) -> Result<Expr, MathError>;
    fn free_symbols(&self, expr: &Expr) -> Vec<String>;
    fn simplify(&self, expr: &Expr) -> Expr;
    fn factor(&self, expr: &Expr) -> Expr;
    fn expand(&self, expr: &Expr) -> Expr;
    fn differentiate(&self, expr: &Expr, var: &str) -> Expr;
    fn integrate(&self, expr: &Expr, var: &str) -> IntegralOutcome;
    fn solve(&self, expr: &Expr, var: &str) -> Result<Vec<Solution>, MathError>;
    fn evaluate(&self, expr: &Expr, values: &HashMap<String, Expr>) -> Result<Evaluation, MathError>;
    fn equivalent(&self, a: &Expr, b: &Expr) -> bool;
}

///////////////// IMPLEMENTATION OF THE TRAIT FOR THE NATIVE ENGINE /////////////////////////
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEngine {
    /// largest integer power of a sum that `expand` multiplies out
    pub max_expand_power: u32,
}

impl NativeEngine {
    pub fn new(max_expand_power: u32) -> Self {
        NativeEngine { max_expand_power }
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        NativeEngine::new(DEFAULT_EXPAND_POWER)
    }
}

impl AlgebraEngine for NativeEngine {
    fn name(&self) -> &str {
        "native"
    }

    fn parse(&self, text: &NormalizedText, table: &SymbolTable) -> Result<Expr, MathError> {
        Expr::parse_expression_func(text, table)
    }

    fn free_symbols(&self, expr: &Expr) -> Vec<String> {
        expr.free_symbols()
    }

    fn simplify(&self, expr: &Expr) -> Expr {
        expr.simplify()
    }

    fn factor(&self, expr: &Expr) -> Expr {
        expr.factor(self.max_expand_power)
    }

    fn expand(&self, expr: &Expr) -> Expr {
        expr.expand(self.max_expand_power)
    }

    fn differentiate(&self, expr: &Expr, var: &str) -> Expr {
        expr.diff(var).simplify()
    }

    fn integrate(&self, expr: &Expr, var: &str) -> IntegralOutcome {
        expr.integrate_or_defer(var)
    }

    fn solve(&self, expr: &Expr, var: &str) -> Result<Vec<Solution>, MathError> {
        expr.solve(var)
    }

    fn evaluate(&self, expr: &Expr, values: &HashMap<String, Expr>) -> Result<Evaluation, MathError> {
        let substituted = values
            .iter()
            .fold(expr.clone(), |acc, (name, value)| acc.substitute_variable(name, value))
            .simplify();
        if substituted.free_symbols().is_empty() {
            return match substituted.eval_constant() {
                Some(value) => Ok(Evaluation::Numeric(value)),
                None => Err(MathError::OperationUnsupported(format!(
                    "`{}` has no finite value",
                    expr
                ))),
            };
        }
        debug!("evaluation left free symbols in {}", substituted);
        Ok(Evaluation::PartiallyNumeric(substituted.evalf().simplify()))
    }

    fn equivalent(&self, a: &Expr, b: &Expr) -> bool {
        a.equivalent(b)
    }
}

impl Expr {
    /// Mathematical equality: the expanded difference simplifies to zero, or both sides agree
    /// at every sample point where they are defined (at least three are required).
    pub fn equivalent(&self, other: &Expr) -> bool {
        let difference = (self.clone() - other.clone()).expand(DEFAULT_EXPAND_POWER);
        if difference.is_zero() {
            return true;
        }
        let mut symbols = self.free_symbols();
        for name in other.free_symbols() {
            if !symbols.contains(&name) {
                symbols.push(name);
            }
        }
        let mut valid = 0;
        for k in 0..SAMPLE_POINTS.len() {
            let values: HashMap<String, f64> = symbols
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), SAMPLE_POINTS[(k + 5 * i) % SAMPLE_POINTS.len()]))
                .collect();
            let (Some(a), Some(b)) = (self.eval_expression(&values), other.eval_expression(&values)) else {
                continue;
            };
            if !a.is_finite() || !b.is_finite() {
                continue;
            }
            if (a - b).abs() > SAMPLE_TOLERANCE * a.abs().max(b.abs()).max(1.0) {
                return false;
            }
            valid += 1;
        }
        valid >= MIN_VALID_SAMPLES
    }
}

//___________________________________TESTS____________________________________

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::normalizer::normalize;
    use crate::input::registry::FunctionSet;

    fn parse(engine: &dyn AlgebraEngine, raw: &str) -> Expr {
        let functions = FunctionSet::builtin();
        let text = normalize(raw, &functions).unwrap();
        let table = SymbolTable::register_variables(&[&text], &[], &functions);
        engine.parse(&text, &table).unwrap()
    }

    #[test]
    fn test_engine_is_object_safe() {
        let engine: Box<dyn AlgebraEngine> = Box::new(NativeEngine::default());
        assert_eq!(engine.name(), "native");
        let e = parse(engine.as_ref(), "3x^2 + 2x");
        assert_eq!(engine.differentiate(&e, "x").to_string(), "6*x + 2");
        assert_eq!(engine.free_symbols(&e), vec!["x".to_string()]);
    }

    #[test]
    fn test_expand_power_limit_comes_from_engine() {
        let e = parse(&NativeEngine::new(2), "(x+1)^3");
        assert_eq!(NativeEngine::new(2).expand(&e).to_string(), "(x + 1)^3");
        assert_eq!(
            NativeEngine::new(3).expand(&e).to_string(),
            "x^3 + 3*x^2 + 3*x + 1"
        );
    }

    #[test]
    fn test_evaluate() {
        let engine = NativeEngine::default();
        let e = parse(&engine, "x^2+1");
        let mut values = HashMap::new();
        values.insert("x".to_string(), Expr::Const(3.0));
        assert_eq!(engine.evaluate(&e, &values), Ok(Evaluation::Numeric(10.0)));

        let e = parse(&engine, "x*y + 2");
        match engine.evaluate(&e, &values).unwrap() {
            Evaluation::PartiallyNumeric(rest) => assert_eq!(rest.to_string(), "3*y + 2"),
            other => panic!("unexpected {:?}", other),
        }

        let e = parse(&engine, "1/x");
        values.insert("x".to_string(), Expr::Const(0.0));
        assert!(matches!(
            engine.evaluate(&e, &values),
            Err(MathError::OperationUnsupported(_))
        ));
    }

    #[test]
    fn test_equivalence() {
        let x = Expr::var("x");
        let a = (x.clone() + Expr::Const(1.0)).pow(Expr::Const(2.0));
        let b = x.clone().pow(Expr::Const(2.0)) + Expr::Const(2.0) * x.clone() + Expr::Const(1.0);
        assert!(a.equivalent(&b));
        let s = Expr::sin(x.clone().boxed()).pow(Expr::Const(2.0));
        let c = Expr::Const(1.0) - Expr::cos(x.clone().boxed()).pow(Expr::Const(2.0));
        assert!(s.equivalent(&c));
        assert!(!a.equivalent(&(b + Expr::Const(1.0))));
        assert!(!Expr::sin(x.clone().boxed()).equivalent(&x));
    }

    #[test]
    fn test_equivalence_needs_defined_samples() {
        // ln(-x^2 - 1) is undefined everywhere on the reals
        let x = Expr::var("x");
        let undefined = (-(x.clone().pow(Expr::Const(2.0))) - Expr::Const(1.0)).ln();
        assert!(!undefined.equivalent(&(undefined.clone() + x)));
    }
}
