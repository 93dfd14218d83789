//! Equation solving for `expr = 0`.
//!
//! Strategies, tried in order:
//! 1. the expression is brought over a common denominator and the numerator expanded;
//! 2. a numerator polynomial in the target is solved through [`Polynomial::roots`]; quadratics
//!    with an irrational discriminant keep their roots in surd form;
//! 3. a numerator linear in the target with symbolic coefficients gives `-b/a`;
//! 4. a numerator with a single occurrence of the target is inverted function by function.
//!
//! Candidates where the denominator vanishes are removed, as are duplicates.
use std::f64::consts::PI;
use std::fmt;

use log::{debug, info};
use num_complex::Complex64;

use crate::error::MathError;
use crate::symbolic::symbolic_engine::{Expr, format_number};
use crate::symbolic::symbolic_factor::DEFAULT_EXPAND_POWER;
use crate::symbolic::symbolic_polynomial::Polynomial;

const ROOT_TOLERANCE: f64 = 1e-9;

/// one root of an equation
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    Exact(Expr),
    Complex(Complex64),
}

impl Solution {
    /// numeric value of a real solution
    pub fn value(&self) -> Option<f64> {
        match self {
            Solution::Exact(expr) => expr.eval_constant(),
            Solution::Complex(_) => None,
        }
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Solution::Exact(expr) => write!(f, "{}", expr),
            Solution::Complex(z) => {
                let re = format_number(z.re);
                let im = format_number(z.im.abs());
                let sign = if z.im < 0.0 { '-' } else { '+' };
                match (z.re == 0.0, z.im.abs() == 1.0) {
                    (true, true) => write!(f, "{}I", if z.im < 0.0 { "-" } else { "" }),
                    (true, false) => write!(f, "{}{}*I", if z.im < 0.0 { "-" } else { "" }, im),
                    (false, true) => write!(f, "{} {} I", re, sign),
                    (false, false) => write!(f, "{} {} {}*I", re, sign, im),
                }
            }
        }
    }
}

impl Expr {
    /// Roots of `self = 0` with respect to `var`.
    /// # Returns
    /// real roots ascending, then complex roots; `OperationUnsupported` when no strategy applies
    pub fn solve(&self, var: &str) -> Result<Vec<Solution>, MathError> {
        let simplified = self.simplify();
        if !simplified.contains_variable(var) {
            return Err(MathError::OperationUnsupported(format!(
                "`{}` does not depend on {}",
                simplified, var
            )));
        }
        let (numerator, denominator) = over_common_denominator(&simplified, var);
        let numerator = numerator.expand(DEFAULT_EXPAND_POWER);
        debug!("solving {} = 0 for {} (denominator {})", numerator, var, denominator);
        let candidates = if let Some(poly) = numerator.to_polynomial(var) {
            if poly.degree() == 0 {
                if poly.is_zero() {
                    return Err(MathError::OperationUnsupported(format!(
                        "every value of {} satisfies the equation",
                        var
                    )));
                }
                Vec::new()
            } else {
                polynomial_solutions(&poly)
            }
        } else if let Some(root) = linear_solution(&numerator, var) {
            vec![Solution::Exact(root)]
        } else if numerator.count_variable(var) == 1 {
            isolate(numerator.clone(), Expr::Const(0.0), var)
                .into_iter()
                .map(|root| root.simplify())
                .filter(|root| satisfies(&numerator, var, root))
                .map(Solution::Exact)
                .collect()
        } else {
            return Err(MathError::OperationUnsupported(format!(
                "no solving strategy for {} = 0 in {}",
                numerator, var
            )));
        };
        let mut solutions: Vec<Solution> = Vec::new();
        for candidate in candidates {
            if is_pole(&denominator, var, &candidate) {
                info!("dropping {} = {}: the denominator vanishes there", var, candidate);
                continue;
            }
            if !solutions.iter().any(|s| s.to_string() == candidate.to_string()) {
                solutions.push(candidate);
            }
        }
        Ok(solutions)
    }
}

/// numerator and denominator of a sum of fractions
fn over_common_denominator(expr: &Expr, var: &str) -> (Expr, Expr) {
    let terms = expr.sum_terms();
    let mut denominators: Vec<Expr> = Vec::new();
    for term in &terms {
        let (_, rest) = term.split_coefficient();
        if let Expr::Div(_, d) = &rest {
            if d.contains_variable(var) && !denominators.iter().any(|k| k == d.as_ref()) {
                denominators.push(d.as_ref().clone());
            }
        }
    }
    let Some(common) = denominators.into_iter().reduce(|acc, d| acc * d) else {
        return (expr.clone(), Expr::Const(1.0));
    };
    let numerator = terms
        .into_iter()
        .map(|term| (term * common.clone()).simplify())
        .reduce(|acc, term| acc + term)
        .unwrap_or(Expr::Const(0.0))
        .simplify();
    (numerator, common.simplify())
}

/// square-free part: `n = s^2 * r`
fn split_square(n: i64) -> (i64, i64) {
    let mut s = 1;
    let mut r = n;
    let mut k = 2;
    while k * k <= r {
        while r % (k * k) == 0 {
            r /= k * k;
            s *= k;
        }
        k += 1;
    }
    (s, r)
}

fn polynomial_solutions(poly: &Polynomial) -> Vec<Solution> {
    if poly.degree() == 2 && poly.is_integral() {
        let (c, b, a) = (poly.coeffs[0], poly.coeffs[1], poly.coeffs[2]);
        let discriminant = (b * b - 4.0 * a * c).round() as i64;
        if discriminant > 0 {
            let (s, r) = split_square(discriminant);
            if r != 1 {
                // (-b ± s*sqrt(r)) / 2a
                let center = Expr::Const(-b / (2.0 * a));
                let spread = Expr::Const((s as f64 / (2.0 * a)).abs()) * Expr::Const(r as f64).sqrt();
                return vec![
                    Solution::Exact((center.clone() - spread.clone()).simplify()),
                    Solution::Exact((center + spread).simplify()),
                ];
            }
        }
    }
    poly.roots()
        .into_iter()
        .map(|z| {
            if z.im.abs() < ROOT_TOLERANCE {
                Solution::Exact(Expr::Const(z.re))
            } else {
                Solution::Complex(z)
            }
        })
        .collect()
}

/// `-b/a` for `a*var + b` with coefficients free of `var`
fn linear_solution(numerator: &Expr, var: &str) -> Option<Expr> {
    let slope = numerator.diff(var).simplify();
    if slope.contains_variable(var) || slope.is_zero() {
        return None;
    }
    let intercept = numerator.substitute_variable(var, &Expr::Const(0.0)).simplify();
    Some((-intercept / slope).simplify())
}

/// inverts the single occurrence of `var` in `lhs = rhs`
fn isolate(lhs: Expr, rhs: Expr, var: &str) -> Vec<Expr> {
    let two = || Expr::Const(2.0);
    match lhs {
        Expr::Var(ref name) if name == var => vec![rhs],
        Expr::Add(a, b) => {
            if a.contains_variable(var) {
                isolate(*a, rhs - *b, var)
            } else {
                isolate(*b, rhs - *a, var)
            }
        }
        Expr::Sub(a, b) => {
            if a.contains_variable(var) {
                isolate(*a, rhs + *b, var)
            } else {
                isolate(*b, *a - rhs, var)
            }
        }
        Expr::Mul(a, b) => {
            if a.contains_variable(var) {
                isolate(*a, rhs / *b, var)
            } else {
                isolate(*b, rhs / *a, var)
            }
        }
        Expr::Div(a, b) => {
            if a.contains_variable(var) {
                isolate(*a, rhs * *b, var)
            } else {
                isolate(*b, *a / rhs, var)
            }
        }
        Expr::Pow(base, exp) => {
            if base.contains_variable(var) {
                match exp.as_const() {
                    Some(n) if n.fract() == 0.0 && (n as i64) % 2 == 0 => {
                        let root = rhs.pow(Expr::Const(1.0 / n));
                        let mut out = isolate((*base).clone(), root.clone(), var);
                        out.extend(isolate(*base, -root, var));
                        out
                    }
                    Some(n) => isolate(*base, rhs.pow(Expr::Const(1.0 / n)), var),
                    None => isolate(*base, rhs.pow(Expr::Const(1.0) / *exp), var),
                }
            } else {
                isolate(*exp, rhs.ln() / (*base).ln(), var)
            }
        }
        Expr::Exp(a) => isolate(*a, rhs.ln(), var),
        Expr::Ln(a) => isolate(*a, rhs.exp(), var),
        Expr::sin(a) => {
            let principal = Expr::arcsin(rhs.boxed());
            let mut out = isolate((*a).clone(), principal.clone(), var);
            out.extend(isolate(*a, Expr::Const(PI) - principal, var));
            out
        }
        Expr::cos(a) => {
            let principal = Expr::arccos(rhs.boxed());
            let mut out = isolate((*a).clone(), principal.clone(), var);
            out.extend(isolate(*a, Expr::Const(2.0 * PI) - principal, var));
            out
        }
        Expr::tg(a) => isolate(*a, Expr::arctg(rhs.boxed()), var),
        Expr::ctg(a) => isolate(*a, Expr::arctg((Expr::Const(1.0) / rhs).boxed()), var),
        Expr::arcsin(a) => isolate(*a, Expr::sin(rhs.boxed()), var),
        Expr::arccos(a) => isolate(*a, Expr::cos(rhs.boxed()), var),
        Expr::arctg(a) => isolate(*a, Expr::tg(rhs.boxed()), var),
        // asinh(r) = ln(r + sqrt(r^2 + 1))
        Expr::sinh(a) => {
            let inverse = (rhs.clone() + (rhs.pow(two()) + Expr::Const(1.0)).sqrt()).ln();
            isolate(*a, inverse, var)
        }
        Expr::cosh(a) => {
            let inverse = (rhs.clone() + (rhs.pow(two()) - Expr::Const(1.0)).sqrt()).ln();
            let mut out = isolate((*a).clone(), inverse.clone(), var);
            out.extend(isolate(*a, -inverse, var));
            out
        }
        // atanh(r) = ln((1 + r)/(1 - r))/2
        Expr::tanh(a) => {
            let inverse =
                ((Expr::Const(1.0) + rhs.clone()) / (Expr::Const(1.0) - rhs)).ln() / two();
            isolate(*a, inverse, var)
        }
        Expr::Var(_) | Expr::Const(_) => Vec::new(),
    }
}

/// drops roots that are undefined or that do not satisfy the equation
fn satisfies(numerator: &Expr, var: &str, root: &Expr) -> bool {
    if root.free_symbols().is_empty() {
        let Some(value) = root.eval_constant() else {
            return false;
        };
        if let Some(residual) = numerator.set_variable(var, value).eval_constant() {
            return residual.abs() <= 1e-7 * value.abs().max(1.0);
        }
        return false;
    }
    true
}

fn is_pole(denominator: &Expr, var: &str, candidate: &Solution) -> bool {
    if !denominator.contains_variable(var) {
        return false;
    }
    match candidate {
        Solution::Exact(root) => denominator
            .substitute_variable(var, root)
            .simplify()
            .eval_constant()
            .is_some_and(|v| v.abs() < ROOT_TOLERANCE),
        Solution::Complex(z) => denominator
            .to_polynomial(var)
            .is_some_and(|p| p.eval_complex(*z).norm() < ROOT_TOLERANCE),
    }
}
