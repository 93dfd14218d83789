//! Analytical differentiation and numeric evaluation of [`Expr`] trees.
//!
//! `diff` applies the textbook rules node by node (sum, product, quotient, general power and
//! chain rule); the result is left unsimplified so callers decide when to canonicalize.
//! Evaluation maps every free symbol through a value table; subtrees without free symbols can
//! be folded on their own with `evalf`.
use std::collections::HashMap;

use crate::symbolic::symbolic_engine::Expr;

fn one() -> Expr {
    Expr::Const(1.0)
}

impl Expr {
    /// derivative with respect to `var`
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => lhs.diff(var) + rhs.diff(var),
            Expr::Sub(lhs, rhs) => lhs.diff(var) - rhs.diff(var),
            Expr::Mul(lhs, rhs) => {
                lhs.diff(var) * rhs.as_ref().clone() + lhs.as_ref().clone() * rhs.diff(var)
            }
            Expr::Div(lhs, rhs) => {
                (lhs.diff(var) * rhs.as_ref().clone() - rhs.diff(var) * lhs.as_ref().clone())
                    / rhs.as_ref().clone().pow(Expr::Const(2.0))
            }
            Expr::Pow(base, exp) => {
                let base = base.as_ref().clone();
                let exp = exp.as_ref().clone();
                if !exp.contains_variable(var) {
                    // n * b^(n-1) * b'
                    exp.clone() * base.clone().pow(exp - one()) * base.diff(var)
                } else if !base.contains_variable(var) {
                    // b^e * ln(b) * e'
                    base.clone().pow(exp.clone()) * base.ln() * exp.diff(var)
                } else {
                    base.clone().pow(exp.clone())
                        * (exp.diff(var) * base.clone().ln()
                            + exp * base.diff(var) / base)
                }
            }
            Expr::Exp(arg) => Expr::Exp(arg.clone()) * arg.diff(var),
            Expr::Ln(arg) => arg.diff(var) / arg.as_ref().clone(),
            Expr::sin(arg) => Expr::cos(arg.clone()) * arg.diff(var),
            Expr::cos(arg) => -(Expr::sin(arg.clone())) * arg.diff(var),
            Expr::tg(arg) => {
                arg.diff(var) / Expr::cos(arg.clone()).pow(Expr::Const(2.0))
            }
            Expr::ctg(arg) => {
                -(arg.diff(var)) / Expr::sin(arg.clone()).pow(Expr::Const(2.0))
            }
            Expr::arcsin(arg) => {
                arg.diff(var) / (one() - arg.as_ref().clone().pow(Expr::Const(2.0))).sqrt()
            }
            Expr::arccos(arg) => {
                -(arg.diff(var)) / (one() - arg.as_ref().clone().pow(Expr::Const(2.0))).sqrt()
            }
            Expr::arctg(arg) => {
                arg.diff(var) / (one() + arg.as_ref().clone().pow(Expr::Const(2.0)))
            }
            Expr::sinh(arg) => Expr::cosh(arg.clone()) * arg.diff(var),
            Expr::cosh(arg) => Expr::sinh(arg.clone()) * arg.diff(var),
            Expr::tanh(arg) => {
                arg.diff(var) / Expr::cosh(arg.clone()).pow(Expr::Const(2.0))
            }
        }
    }

    /// partial derivatives with respect to every variable, in sorted variable order
    pub fn diff_multi(&self) -> Vec<Expr> {
        self.all_arguments_are_variables()
            .iter()
            .map(|var| self.diff(var))
            .collect()
    }

    /// numeric value given values for the free symbols; `None` if a symbol is missing
    pub fn eval_expression(&self, values: &HashMap<String, f64>) -> Option<f64> {
        let value = match self {
            Expr::Var(name) => *values.get(name)?,
            Expr::Const(c) => *c,
            Expr::Add(lhs, rhs) => lhs.eval_expression(values)? + rhs.eval_expression(values)?,
            Expr::Sub(lhs, rhs) => lhs.eval_expression(values)? - rhs.eval_expression(values)?,
            Expr::Mul(lhs, rhs) => lhs.eval_expression(values)? * rhs.eval_expression(values)?,
            Expr::Div(lhs, rhs) => lhs.eval_expression(values)? / rhs.eval_expression(values)?,
            Expr::Pow(base, exp) => {
                let b = base.eval_expression(values)?;
                let e = exp.eval_expression(values)?;
                if e == 0.5 { b.sqrt() } else { b.powf(e) }
            }
            Expr::Exp(arg) => arg.eval_expression(values)?.exp(),
            Expr::Ln(arg) => arg.eval_expression(values)?.ln(),
            Expr::sin(arg) => arg.eval_expression(values)?.sin(),
            Expr::cos(arg) => arg.eval_expression(values)?.cos(),
            Expr::tg(arg) => arg.eval_expression(values)?.tan(),
            Expr::ctg(arg) => 1.0 / arg.eval_expression(values)?.tan(),
            Expr::arcsin(arg) => arg.eval_expression(values)?.asin(),
            Expr::arccos(arg) => arg.eval_expression(values)?.acos(),
            Expr::arctg(arg) => arg.eval_expression(values)?.atan(),
            Expr::sinh(arg) => arg.eval_expression(values)?.sinh(),
            Expr::cosh(arg) => arg.eval_expression(values)?.cosh(),
            Expr::tanh(arg) => arg.eval_expression(values)?.tanh(),
        };
        Some(value)
    }

    /// value of an expression without free symbols, if finite
    pub fn eval_constant(&self) -> Option<f64> {
        self.eval_expression(&HashMap::new())
            .filter(|v| v.is_finite())
    }

    /// folds every subtree that has no free symbols into a constant
    pub fn evalf(&self) -> Expr {
        if let Some(value) = self.eval_constant() {
            return Expr::Const(value);
        }
        self.map_args(|child| child.evalf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn test_diff_power_rule() {
        let e = Expr::Const(3.0) * x().pow(Expr::Const(2.0));
        assert_eq!(e.diff("x").simplify().to_string(), "6*x");
    }

    #[test]
    fn test_diff_chain_rule() {
        let e = Expr::sin(x().pow(Expr::Const(2.0)).boxed());
        assert_eq!(e.diff("x").simplify().to_string(), "2*x*cos(x^2)");
        assert_eq!(Expr::sin(x().boxed()).diff("x").simplify().to_string(), "cos(x)");
    }

    #[test]
    fn test_diff_variable_exponent() {
        // d/dx 2^x = 2^x * ln(2)
        let e = Expr::Const(2.0).pow(x());
        let d = e.diff("x");
        let mut values = HashMap::new();
        values.insert("x".to_string(), 1.5);
        assert_relative_eq!(
            d.eval_expression(&values).unwrap(),
            2f64.powf(1.5) * 2f64.ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_diff_of_other_variable_is_zero() {
        assert_eq!(Expr::var("y").diff("x").simplify(), Expr::Const(0.0));
    }

    #[test]
    fn test_eval_expression() {
        let e = x().pow(Expr::Const(2.0)) + Expr::var("y");
        let mut values = HashMap::new();
        values.insert("x".to_string(), 2.0);
        assert_eq!(e.eval_expression(&values), None);
        values.insert("y".to_string(), 3.0);
        assert_eq!(e.eval_expression(&values), Some(7.0));
    }

    #[test]
    fn test_evalf_folds_constant_subtrees() {
        let e = Expr::Ln(Expr::Const(8.0).boxed()) / Expr::Const(2.0).ln() * x();
        let folded = e.evalf();
        match folded {
            Expr::Mul(lhs, rhs) => {
                assert_relative_eq!(lhs.as_const().unwrap(), 3.0, epsilon = 1e-12);
                assert_eq!(*rhs, x());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
