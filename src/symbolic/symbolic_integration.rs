use log::debug;

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_factor::DEFAULT_EXPAND_POWER;

/// result of an indefinite integration request
#[derive(Debug, Clone, PartialEq)]
pub enum IntegralOutcome {
    /// antiderivative without the constant of integration
    Closed(Expr),
    /// no closed form was found; the integral is returned as posed
    Unevaluated { integrand: Expr, variable: String },
}

impl Expr {
    /// SYMBOLIC INTEGRATION

    /// Indefinite integral with respect to `var`, without the constant of integration.
    /// The integrand is simplified and integrated term by term; when a term has no table
    /// form the expanded integrand gets a second attempt.
    pub fn integrate(&self, var: &str) -> Result<Expr, String> {
        let simplified = self.simplify();
        let integral = match simplified.integrate_sum(var) {
            Ok(result) => result,
            Err(first) => {
                let expanded = simplified.expand(DEFAULT_EXPAND_POWER);
                if expanded == simplified {
                    return Err(first);
                }
                expanded.integrate_sum(var)?
            }
        };
        Ok(integral.simplify())
    }

    /// like `integrate`, but a missing closed form is a value, not an error
    pub fn integrate_or_defer(&self, var: &str) -> IntegralOutcome {
        match self.integrate(var) {
            Ok(integral) => IntegralOutcome::Closed(integral),
            Err(reason) => {
                debug!("integral left unevaluated: {}", reason);
                IntegralOutcome::Unevaluated {
                    integrand: self.simplify(),
                    variable: var.to_string(),
                }
            }
        }
    }

    // ∫ (f ± g) dx = ∫ f dx ± ∫ g dx
    fn integrate_sum(&self, var: &str) -> Result<Expr, String> {
        let mut terms = self.sum_terms().into_iter();
        let Some(first) = terms.next() else {
            return Ok(Expr::Const(0.0));
        };
        let mut acc = first.integrate_term(var)?;
        for term in terms {
            acc = acc + term.integrate_term(var)?;
        }
        Ok(acc)
    }

    fn integrate_term(&self, var: &str) -> Result<Expr, String> {
        let x = Expr::Var(var.to_string());
        // ∫ c dx = c*x
        if !self.contains_variable(var) {
            return Ok(self.clone() * x);
        }
        let (constant, factors) = split_factors(self, var);
        let integral = match factors.as_slice() {
            [single] => integrate_factor(single, var)?,
            [a, b] => integrate_pair(a, b, var)
                .or_else(|| integrate_pair(b, a, var))
                .or_else(|| integrate_log_derivative(&factors, var))
                .ok_or_else(|| format!("no table integral for {} d{}", self, var))?,
            _ => integrate_log_derivative(&factors, var)
                .ok_or_else(|| format!("no table integral for {} d{}", self, var))?,
        };
        Ok(if constant.is_one() { integral } else { constant * integral })
    }
}

fn invert(factor: Expr) -> Expr {
    match factor {
        Expr::Pow(base, exp) => match *exp {
            Expr::Const(n) => Expr::Pow(base, Expr::Const(-n).boxed()),
            other => Expr::Pow(base, (-other).boxed()),
        },
        Expr::Exp(arg) => Expr::Exp((-*arg).boxed()),
        other => Expr::Pow(other.boxed(), Expr::Const(-1.0).boxed()),
    }
}

/// constant part and the factors that depend on `var`; quotients become negative powers
fn split_factors(term: &Expr, var: &str) -> (Expr, Vec<Expr>) {
    fn walk(expr: &Expr, var: &str, inverted: bool, constants: &mut Vec<Expr>, factors: &mut Vec<Expr>) {
        match expr {
            Expr::Mul(lhs, rhs) => {
                walk(lhs, var, inverted, constants, factors);
                walk(rhs, var, inverted, constants, factors);
            }
            Expr::Div(lhs, rhs) => {
                walk(lhs, var, inverted, constants, factors);
                walk(rhs, var, !inverted, constants, factors);
            }
            _ => {
                let factor = if inverted { invert(expr.clone()) } else { expr.clone() };
                if expr.contains_variable(var) {
                    factors.push(factor);
                } else {
                    constants.push(factor);
                }
            }
        }
    }
    let mut constants = Vec::new();
    let mut factors = Vec::new();
    walk(term, var, false, &mut constants, &mut factors);
    let constant = constants
        .into_iter()
        .reduce(|acc, c| acc * c)
        .map(|c| c.simplify())
        .unwrap_or(Expr::Const(1.0));
    (constant, factors)
}

/// `d(arg)/d(var)` when the argument is linear in `var`
fn linear_slope(arg: &Expr, var: &str) -> Option<Expr> {
    let slope = arg.diff(var).simplify();
    if slope.contains_variable(var) || slope.is_zero() {
        None
    } else {
        Some(slope)
    }
}

/// exponent of a monomial `var^n`
fn monomial_power(expr: &Expr, var: &str) -> Option<f64> {
    match expr {
        Expr::Var(name) if name == var => Some(1.0),
        Expr::Pow(base, exp) => match (base.as_ref(), exp.as_ref()) {
            (Expr::Var(name), Expr::Const(n)) if name == var => Some(*n),
            _ => None,
        },
        _ => None,
    }
}

fn integrate_factor(factor: &Expr, var: &str) -> Result<Expr, String> {
    let x = Expr::Var(var.to_string());
    let fail = || format!("no table integral for {} d{}", factor, var);
    match factor {
        // ∫ x dx = x²/2
        Expr::Var(_) => Ok(x.pow(Expr::Const(2.0)) / Expr::Const(2.0)),
        Expr::Add(..) | Expr::Sub(..) => factor.integrate_sum(var),
        Expr::Pow(base, exp) => integrate_power(factor, base, exp, var).ok_or_else(fail),
        _ => {
            let arg = factor.function_arg().ok_or_else(fail)?;
            let u = arg.clone();
            let slope = linear_slope(arg, var).ok_or_else(fail)?;
            let one = Expr::Const(1.0);
            let antiderivative = match factor {
                Expr::Exp(_) => u.exp(),
                // ∫ ln(u) du = u*ln(u) - u
                Expr::Ln(_) => u.clone() * u.clone().ln() - u,
                Expr::sin(_) => -Expr::cos(u.boxed()),
                Expr::cos(_) => Expr::sin(u.boxed()),
                Expr::tg(_) => -Expr::cos(u.boxed()).ln(),
                Expr::ctg(_) => Expr::sin(u.boxed()).ln(),
                Expr::sinh(_) => Expr::cosh(u.boxed()),
                Expr::cosh(_) => Expr::sinh(u.boxed()),
                Expr::tanh(_) => Expr::cosh(u.boxed()).ln(),
                Expr::arcsin(_) => {
                    u.clone() * Expr::arcsin(u.clone().boxed())
                        + (one - u.pow(Expr::Const(2.0))).sqrt()
                }
                Expr::arccos(_) => {
                    u.clone() * Expr::arccos(u.clone().boxed())
                        - (one - u.pow(Expr::Const(2.0))).sqrt()
                }
                Expr::arctg(_) => {
                    u.clone() * Expr::arctg(u.clone().boxed())
                        - (one + u.pow(Expr::Const(2.0))).ln() / Expr::Const(2.0)
                }
                _ => return Err(fail()),
            };
            Ok(antiderivative / slope)
        }
    }
}

fn integrate_power(factor: &Expr, base: &Expr, exp: &Expr, var: &str) -> Option<Expr> {
    if !exp.contains_variable(var) {
        if let Some(slope) = linear_slope(base, var) {
            let n = exp.as_const()?;
            // ∫ u^(-1) du = ln(u)
            if n == -1.0 {
                return Some(base.clone().ln() / slope);
            }
            // ∫ u^n du = u^(n+1)/(n+1)
            let raised = Expr::Const(n + 1.0);
            return Some(base.clone().pow(raised.clone()) / (raised * slope));
        }
        if exp.as_const() == Some(-1.0) {
            return integrate_log_derivative(std::slice::from_ref(factor), var);
        }
        return None;
    }
    // ∫ b^u du = b^u / ln(b)
    if base.contains_variable(var) {
        return None;
    }
    let b = base.eval_constant()?;
    if b <= 0.0 || b == 1.0 {
        return None;
    }
    let slope = linear_slope(exp, var)?;
    Some(factor.clone() / (base.clone().ln() * slope))
}

/// ∫ f'(x)/f(x) dx = ln(f(x)), allowing a constant multiple of f'
fn integrate_log_derivative(factors: &[Expr], var: &str) -> Option<Expr> {
    let position = factors.iter().position(|f| {
        matches!(f, Expr::Pow(_, exp) if exp.as_const() == Some(-1.0))
    })?;
    let Expr::Pow(inner, _) = &factors[position] else {
        return None;
    };
    let rest = factors
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != position)
        .map(|(_, f)| f.clone())
        .reduce(|acc, f| acc * f)
        .unwrap_or(Expr::Const(1.0));
    let derivative = inner.diff(var).simplify();
    if derivative.is_zero() {
        return None;
    }
    let ratio = (rest / derivative).simplify();
    if ratio.contains_variable(var) {
        return None;
    }
    Some(ratio * inner.as_ref().clone().ln())
}

/// integration by parts for `x^n * g(x)`
fn integrate_pair(monomial: &Expr, other: &Expr, var: &str) -> Option<Expr> {
    let n = monomial_power(monomial, var)?;
    match other {
        Expr::Ln(arg) if matches!(arg.as_ref(), Expr::Var(name) if name == var) => {
            Some(integrate_xn_times_ln_x(n, var))
        }
        Expr::Exp(arg) | Expr::sin(arg) | Expr::cos(arg) => {
            if n < 0.0 || n.fract() != 0.0 {
                return None;
            }
            let slope = linear_slope(arg, var)?;
            Some(match other {
                Expr::Exp(_) => integrate_xn_times_exp(n as u32, arg, &slope, var),
                Expr::sin(_) => integrate_xn_times_trig(n as u32, arg, &slope, var, true),
                _ => integrate_xn_times_trig(n as u32, arg, &slope, var, false),
            })
        }
        _ => None,
    }
}

fn power_of(var: &str, n: u32) -> Expr {
    let x = Expr::Var(var.to_string());
    match n {
        0 => Expr::Const(1.0),
        1 => x,
        _ => x.pow(Expr::Const(n as f64)),
    }
}

/// ∫ x^n e^u dx = x^n e^u / a - (n/a) ∫ x^(n-1) e^u dx, with u = a*x + b
fn integrate_xn_times_exp(n: u32, u: &Expr, slope: &Expr, var: &str) -> Expr {
    let exp_u = Expr::Exp(u.clone().boxed());
    if n == 0 {
        return exp_u / slope.clone();
    }
    let first = power_of(var, n) * exp_u / slope.clone();
    let rest = Expr::Const(n as f64) / slope.clone() * integrate_xn_times_exp(n - 1, u, slope, var);
    first - rest
}

/// ∫ x^n sin(u) dx = -x^n cos(u)/a + (n/a) ∫ x^(n-1) cos(u) dx
/// ∫ x^n cos(u) dx =  x^n sin(u)/a - (n/a) ∫ x^(n-1) sin(u) dx
fn integrate_xn_times_trig(n: u32, u: &Expr, slope: &Expr, var: &str, sine: bool) -> Expr {
    let sin_u = Expr::sin(u.clone().boxed());
    let cos_u = Expr::cos(u.clone().boxed());
    if n == 0 {
        return if sine { -cos_u / slope.clone() } else { sin_u / slope.clone() };
    }
    let xn = power_of(var, n);
    let lower = Expr::Const(n as f64) / slope.clone() * integrate_xn_times_trig(n - 1, u, slope, var, !sine);
    if sine {
        lower - xn * cos_u / slope.clone()
    } else {
        xn * sin_u / slope.clone() - lower
    }
}

/// ∫ x^n ln(x) dx = x^(n+1) * [ln(x)/(n+1) - 1/(n+1)²]
fn integrate_xn_times_ln_x(n: f64, var: &str) -> Expr {
    let x = Expr::Var(var.to_string());
    let ln_x = x.clone().ln();
    if n == -1.0 {
        // ∫ ln(x)/x dx = (ln(x))²/2
        return ln_x.pow(Expr::Const(2.0)) / Expr::Const(2.0);
    }
    let m = n + 1.0;
    x.pow(Expr::Const(m)) * (ln_x / Expr::Const(m) - Expr::Const(1.0 / (m * m)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var("x")
    }
    fn c(v: f64) -> Expr {
        Expr::Const(v)
    }

    fn assert_antiderivative(integrand: Expr) {
        let integral = integrand
            .integrate("x")
            .unwrap_or_else(|e| panic!("{} failed: {}", integrand, e));
        assert!(
            integral.diff("x").equivalent(&integrand),
            "d/dx {} is not {}",
            integral,
            integrand
        );
    }

    #[test]
    fn test_integrate_polynomial() {
        assert_eq!((c(3.0) * x().pow(c(2.0))).integrate("x").unwrap().to_string(), "x^3");
        assert_antiderivative(x().pow(c(3.0)) - c(2.0) * x() + c(7.0));
        assert_antiderivative(x().sqrt());
    }

    #[test]
    fn test_integrate_reciprocal() {
        assert_eq!((c(1.0) / x()).integrate("x").unwrap().to_string(), "log(x)");
        assert_antiderivative(c(1.0) / (c(2.0) * x() + c(3.0)));
    }

    #[test]
    fn test_integrate_linear_arguments() {
        assert_eq!(
            Expr::Exp((c(2.0) * x()).boxed()).integrate("x").unwrap().to_string(),
            "exp(2*x)/2"
        );
        assert_eq!(Expr::cos(x().boxed()).integrate("x").unwrap().to_string(), "sin(x)");
        assert_antiderivative(Expr::sin((c(3.0) * x() - c(1.0)).boxed()));
        assert_antiderivative(Expr::tg(x().boxed()));
        assert_antiderivative(Expr::cosh((c(2.0) * x()).boxed()));
        assert_antiderivative(Expr::Ln(x().boxed()));
        assert_antiderivative(c(2.0).pow(x()));
    }

    #[test]
    fn test_integrate_by_parts() {
        assert_antiderivative(x() * Expr::Exp(x().boxed()));
        assert_antiderivative(x().pow(c(2.0)) * Expr::Exp((c(3.0) * x()).boxed()));
        assert_antiderivative(x() * Expr::sin(x().boxed()));
        assert_antiderivative(x().pow(c(2.0)) * Expr::cos(x().boxed()));
        assert_antiderivative(x().pow(c(2.0)) * Expr::Ln(x().boxed()));
        assert_antiderivative(Expr::Ln(x().boxed()) / x());
    }

    #[test]
    fn test_integrate_log_derivative() {
        // 2x/(x^2+1)
        assert_antiderivative(c(2.0) * x() / (x().pow(c(2.0)) + c(1.0)));
    }

    #[test]
    fn test_integrate_needs_expansion() {
        assert_antiderivative((x() + c(1.0)).pow(c(2.0)) * x());
    }

    #[test]
    fn test_other_symbols_are_constants() {
        let integral = (Expr::var("a") * x()).integrate("x").unwrap();
        assert!(integral.equivalent(&(Expr::var("a") * x().pow(c(2.0)) / c(2.0))));
    }

    #[test]
    fn test_unevaluated_integral() {
        let integrand = Expr::Exp(x().pow(c(2.0)).boxed());
        assert!(integrand.integrate("x").is_err());
        assert_eq!(
            integrand.integrate_or_defer("x"),
            IntegralOutcome::Unevaluated {
                integrand: integrand.clone(),
                variable: "x".to_string()
            }
        );
        assert!((Expr::sin(x().boxed()) / x()).integrate("x").is_err());
    }
}
