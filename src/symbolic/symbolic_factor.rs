//! Expansion and factorization.
//!
//! `expand` distributes products over sums and multiplies out integer powers of sums up to a
//! configurable exponent. `factor` pulls out the numeric content and common monomials, and
//! splits univariate polynomials over their rational roots.
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_polynomial::{Polynomial, gcd_i64};

/// largest integer power of a sum that `expand` multiplies out
pub const DEFAULT_EXPAND_POWER: u32 = 12;

fn is_sum(expr: &Expr) -> bool {
    matches!(expr, Expr::Add(..) | Expr::Sub(..))
}

fn join_sum(terms: Vec<Expr>) -> Expr {
    let mut iter = terms.into_iter();
    let Some(first) = iter.next() else {
        return Expr::Const(0.0);
    };
    iter.fold(first, |acc, term| acc + term)
}

fn distribute(lhs: &Expr, rhs: &Expr) -> Expr {
    let left = lhs.sum_terms();
    let right = rhs.sum_terms();
    let mut products = Vec::with_capacity(left.len() * right.len());
    for a in &left {
        for b in &right {
            products.push(a.clone() * b.clone());
        }
    }
    join_sum(products)
}

impl Expr {
    /// distributes products and integer powers of sums, then simplifies
    pub fn expand(&self, max_power: u32) -> Expr {
        self.expand_inner(max_power).simplify()
    }

    fn expand_inner(&self, max_power: u32) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => lhs.expand_inner(max_power) + rhs.expand_inner(max_power),
            Expr::Sub(lhs, rhs) => lhs.expand_inner(max_power) - rhs.expand_inner(max_power),
            Expr::Mul(lhs, rhs) => {
                distribute(&lhs.expand_inner(max_power), &rhs.expand_inner(max_power))
            }
            Expr::Div(lhs, rhs) => {
                let denominator = rhs.expand_inner(max_power);
                let terms = lhs
                    .expand_inner(max_power)
                    .sum_terms()
                    .into_iter()
                    .map(|term| term / denominator.clone())
                    .collect();
                join_sum(terms)
            }
            Expr::Pow(base, exp) => {
                let base = base.expand_inner(max_power);
                match exp.as_ref() {
                    Expr::Const(n)
                        if n.fract() == 0.0 && *n >= 2.0 && *n <= max_power as f64 && is_sum(&base) =>
                    {
                        let mut acc = base.clone();
                        for _ in 1..(*n as u32) {
                            acc = distribute(&acc, &base).simplify_once();
                        }
                        acc
                    }
                    _ => base.pow(exp.expand_inner(max_power)),
                }
            }
            _ => match self.function_arg() {
                Some(arg) => self.with_function_arg(arg.expand_inner(max_power)),
                None => self.clone(),
            },
        }
    }

    /// factored form; expressions that do not factor come back simplified
    pub fn factor(&self, max_power: u32) -> Expr {
        let simplified = self.simplify();
        if let Expr::Div(numerator, denominator) = &simplified {
            return Expr::Div(
                numerator.factor(max_power).boxed(),
                denominator.factor(max_power).boxed(),
            );
        }
        let expanded = simplified.expand(max_power);
        if let Some(factored) = factor_univariate(&expanded) {
            return factored;
        }
        match factor_common_terms(&expanded) {
            Some(factored) => factored,
            None => simplified,
        }
    }
}

fn factor_univariate(expr: &Expr) -> Option<Expr> {
    let vars = expr.free_symbols();
    if vars.len() != 1 {
        return None;
    }
    let poly = expr.to_polynomial(&vars[0])?;
    if poly.degree() == 0 {
        return None;
    }
    Some(factor_polynomial(&poly))
}

/// content, powers of the variable, rational linear factors and an irreducible remainder
pub fn factor_polynomial(poly: &Polynomial) -> Expr {
    let var = poly.var.clone();
    let x = Expr::Var(var.clone());
    let mut content = if poly.is_integral() {
        let g = poly
            .coeffs
            .iter()
            .map(|c| c.round() as i64)
            .fold(0, gcd_i64)
            .max(1) as f64;
        if poly.leading() < 0.0 { -g } else { g }
    } else {
        poly.leading()
    };
    let mut rest = poly.scale(1.0 / content);
    let mut factors: Vec<(Expr, u32)> = Vec::new();
    let mut zero_roots = 0;
    while rest.degree() > 0 && rest.coeffs[0] == 0.0 {
        rest = Polynomial::new(&var, rest.coeffs[1..].to_vec());
        zero_roots += 1;
    }
    if zero_roots > 0 {
        factors.push((x.clone(), zero_roots));
    }
    if rest.is_integral() {
        for (p, q) in rest.rational_roots() {
            let root = p as f64 / q as f64;
            let mut multiplicity = 0;
            while rest.degree() > 0 && rest.vanishes_at(root) {
                rest = rest.deflate(root).scale(1.0 / q as f64);
                multiplicity += 1;
            }
            if multiplicity > 0 {
                let linear = Polynomial::new(&var, vec![-(p as f64), q as f64]);
                factors.push((linear.to_expr(), multiplicity));
            }
        }
    }
    if rest.degree() >= 1 {
        factors.push((rest.to_expr(), 1));
    } else {
        content *= rest.coeffs[0];
    }
    let product = factors
        .into_iter()
        .map(|(f, m)| if m == 1 { f } else { f.pow(Expr::Const(m as f64)) })
        .reduce(|acc, f| acc * f)
        .unwrap_or(Expr::Const(1.0));
    (Expr::Const(content) * product).simplify_once()
}

/// (base, numeric exponent) factors of a product term
fn monomial_factors(term: &Expr) -> Vec<(String, Expr, f64)> {
    match term {
        Expr::Mul(lhs, rhs) => {
            let mut out = monomial_factors(lhs);
            out.extend(monomial_factors(rhs));
            out
        }
        Expr::Pow(base, exp) => match exp.as_ref() {
            Expr::Const(n) => vec![(base.to_string(), base.as_ref().clone(), *n)],
            _ => vec![(term.to_string(), term.clone(), 1.0)],
        },
        Expr::Const(c) if *c == 1.0 => Vec::new(),
        _ => vec![(term.to_string(), term.clone(), 1.0)],
    }
}

fn factor_common_terms(expanded: &Expr) -> Option<Expr> {
    let terms = expanded.sum_terms();
    if terms.len() < 2 {
        return None;
    }
    let parsed: Vec<(f64, Vec<(String, Expr, f64)>)> = terms
        .iter()
        .map(|term| {
            let (c, rest) = term.split_coefficient();
            (c, monomial_factors(&rest))
        })
        .collect();
    let mut common: Vec<(Expr, f64)> = Vec::new();
    for (key, base, _) in &parsed[0].1 {
        let min_exponent = parsed
            .iter()
            .map(|(_, factors)| {
                factors
                    .iter()
                    .filter(|(k, _, _)| k == key)
                    .map(|(_, _, n)| *n)
                    .sum::<f64>()
            })
            .fold(f64::INFINITY, f64::min);
        if min_exponent > 0.0 && !common.iter().any(|(b, _)| b.to_string() == *key) {
            common.push((base.clone(), min_exponent));
        }
    }
    let integral = parsed
        .iter()
        .all(|(c, _)| c.fract() == 0.0 && c.abs() < 1e12);
    let mut numeric = if integral {
        parsed
            .iter()
            .map(|(c, _)| *c as i64)
            .fold(0, gcd_i64)
            .max(1) as f64
    } else {
        1.0
    };
    if parsed[0].0 < 0.0 {
        numeric = -numeric;
    }
    if common.is_empty() && numeric.abs() == 1.0 {
        return None;
    }
    let common_expr = common
        .into_iter()
        .fold(Expr::Const(numeric), |acc, (base, n)| acc * base.pow(Expr::Const(n)))
        .simplify();
    let inner = join_sum(
        terms
            .into_iter()
            .map(|term| (term / common_expr.clone()).simplify())
            .collect(),
    )
    .simplify();
    let inner = factor_univariate(&inner).unwrap_or(inner);
    Some((common_expr * inner).simplify_once())
}
