//! Dense univariate polynomials with `f64` coefficients.
//!
//! Used by the engine wherever an expression turns out to be polynomial in one variable:
//! fraction cancellation in `simplify`, rational-root factoring and polynomial solving.
//! Roots come from closed forms up to degree two, from exact rational candidates, and from a
//! Durand-Kerner iteration for whatever remains.
use num_complex::Complex64;

use crate::symbolic::symbolic_engine::Expr;

const EPS: f64 = 1e-10;
const MAX_POWER: f64 = 64.0;
const DK_ITERATIONS: usize = 2000;

/// `coeffs[i]` multiplies `var^i`
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    pub var: String,
    pub coeffs: Vec<f64>,
}

impl Polynomial {
    pub fn new(var: &str, coeffs: Vec<f64>) -> Self {
        let mut p = Polynomial {
            var: var.to_string(),
            coeffs,
        };
        p.trim();
        p
    }

    pub fn constant(var: &str, c: f64) -> Self {
        Polynomial::new(var, vec![c])
    }

    pub fn monomial(var: &str) -> Self {
        Polynomial::new(var, vec![0.0, 1.0])
    }

    fn scale_of(coeffs: &[f64]) -> f64 {
        coeffs.iter().fold(0.0f64, |m, c| m.max(c.abs())).max(1.0)
    }

    /// drops leading coefficients below an absolute tolerance
    fn trim(&mut self) {
        while self.coeffs.len() > 1 && self.coeffs.last().is_some_and(|c| c.abs() <= EPS) {
            self.coeffs.pop();
        }
        if self.coeffs.is_empty() {
            self.coeffs.push(0.0);
        }
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0].abs() < EPS
    }

    pub fn leading(&self) -> f64 {
        self.coeffs.last().copied().unwrap_or(0.0)
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    pub fn eval_complex(&self, z: Complex64) -> Complex64 {
        self.coeffs
            .iter()
            .rev()
            .fold(Complex64::new(0.0, 0.0), |acc, c| acc * z + c)
    }

    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let n = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..n)
            .map(|i| self.coeffs.get(i).unwrap_or(&0.0) + other.coeffs.get(i).unwrap_or(&0.0))
            .collect();
        Polynomial::new(&self.var, coeffs)
    }

    pub fn sub(&self, other: &Polynomial) -> Polynomial {
        self.add(&other.scale(-1.0))
    }

    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        let mut coeffs = vec![0.0; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Polynomial::new(&self.var, coeffs)
    }

    pub fn scale(&self, factor: f64) -> Polynomial {
        Polynomial::new(&self.var, self.coeffs.iter().map(|c| c * factor).collect())
    }

    pub fn powi(&self, n: u32) -> Polynomial {
        (0..n).fold(Polynomial::constant(&self.var, 1.0), |acc, _| acc.mul(self))
    }

    pub fn monic(&self) -> Polynomial {
        let lead = self.leading();
        if lead.abs() < EPS {
            self.clone()
        } else {
            self.scale(1.0 / lead)
        }
    }

    pub fn derivative(&self) -> Polynomial {
        if self.degree() == 0 {
            return Polynomial::constant(&self.var, 0.0);
        }
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| c * i as f64)
            .collect();
        Polynomial::new(&self.var, coeffs)
    }

    /// quotient and remainder; `None` for a zero divisor
    pub fn div_rem(&self, divisor: &Polynomial) -> Option<(Polynomial, Polynomial)> {
        if divisor.is_zero() {
            return None;
        }
        let scale = Polynomial::scale_of(&self.coeffs);
        let mut remainder = self.coeffs.clone();
        let d = divisor.degree();
        if self.degree() < d {
            return Some((Polynomial::constant(&self.var, 0.0), self.clone()));
        }
        let mut quotient = vec![0.0; self.degree() - d + 1];
        for k in (0..quotient.len()).rev() {
            let factor = remainder[k + d] / divisor.leading();
            quotient[k] = factor;
            for (j, c) in divisor.coeffs.iter().enumerate() {
                remainder[k + j] -= factor * c;
            }
        }
        remainder.truncate(d.max(1));
        for c in remainder.iter_mut() {
            if c.abs() <= 1e-9 * scale {
                *c = 0.0;
            }
        }
        Some((
            Polynomial::new(&self.var, quotient),
            Polynomial::new(&self.var, remainder),
        ))
    }

    /// monic greatest common divisor
    pub fn gcd(&self, other: &Polynomial) -> Polynomial {
        let mut a = self.monic();
        let mut b = other.monic();
        while !b.is_zero() {
            let Some((_, r)) = a.div_rem(&b) else {
                break;
            };
            a = b;
            b = r.monic();
        }
        a.monic()
    }

    pub fn is_integral(&self) -> bool {
        self.coeffs
            .iter()
            .all(|c| (c - c.round()).abs() < 1e-9 && c.abs() < 1e12)
    }

    /// synthetic division by `(var - root)`
    pub fn deflate(&self, root: f64) -> Polynomial {
        let n = self.degree();
        let mut quotient = vec![0.0; n];
        let mut carry = 0.0;
        for i in (1..=n).rev() {
            carry = carry * root + self.coeffs[i];
            quotient[i - 1] = carry;
        }
        Polynomial::new(&self.var, quotient)
    }

    pub(crate) fn vanishes_at(&self, x: f64) -> bool {
        let scale: f64 = self
            .coeffs
            .iter()
            .enumerate()
            .map(|(i, c)| c.abs() * x.abs().powi(i as i32))
            .sum::<f64>()
            .max(1.0);
        self.eval(x).abs() <= 1e-9 * scale
    }

    /// candidate roots `p/q` (reduced) of an integral polynomial
    pub fn rational_roots(&self) -> Vec<(i64, i64)> {
        if !self.is_integral() || self.degree() == 0 {
            return Vec::new();
        }
        let a0 = self.coeffs[0].round().abs() as i64;
        let an = self.leading().round().abs() as i64;
        if a0 == 0 || a0 > 10_000_000 || an > 10_000_000 {
            return Vec::new();
        }
        let mut found = Vec::new();
        for p in divisors(a0) {
            for q in divisors(an) {
                if gcd_i64(p, q) != 1 {
                    continue;
                }
                for sign in [1, -1] {
                    let candidate = (sign * p, q);
                    if self.vanishes_at(candidate.0 as f64 / candidate.1 as f64) && !found.contains(&candidate) {
                        found.push(candidate);
                    }
                }
            }
        }
        found.sort_by(|a, b| {
            (a.0 as f64 / a.1 as f64)
                .partial_cmp(&(b.0 as f64 / b.1 as f64))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        found
    }

    /// all complex roots with multiplicity; reals ascending first, then complex pairs
    pub fn roots(&self) -> Vec<Complex64> {
        let mut remaining = self.clone();
        let mut roots: Vec<Complex64> = Vec::new();
        while remaining.degree() > 0 && remaining.coeffs[0].abs() < EPS {
            roots.push(Complex64::new(0.0, 0.0));
            remaining = Polynomial::new(&remaining.var, remaining.coeffs[1..].to_vec());
        }
        if remaining.is_integral() {
            for (p, q) in remaining.rational_roots() {
                let r = p as f64 / q as f64;
                while remaining.degree() > 0 && remaining.vanishes_at(r) {
                    roots.push(Complex64::new(r, 0.0));
                    remaining = remaining.deflate(r);
                }
            }
        }
        match remaining.degree() {
            0 => {}
            1 => roots.push(Complex64::new(-remaining.coeffs[0] / remaining.coeffs[1], 0.0)),
            2 => roots.extend(quadratic_roots(remaining.coeffs[2], remaining.coeffs[1], remaining.coeffs[0])),
            _ => roots.extend(durand_kerner(&remaining)),
        }
        let mut roots: Vec<Complex64> = roots.into_iter().map(clean_root).collect();
        roots.sort_by(|a, b| {
            let a_key = (a.im != 0.0, a.re, a.im);
            let b_key = (b.im != 0.0, b.re, b.im);
            a_key.partial_cmp(&b_key).unwrap_or(std::cmp::Ordering::Equal)
        });
        roots
    }

    /// descending-power sum in canonical form
    pub fn to_expr(&self) -> Expr {
        let x = Expr::Var(self.var.clone());
        let mut terms = self
            .coeffs
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, c)| **c != 0.0)
            .map(|(i, c)| {
                let power = match i {
                    0 => Expr::Const(1.0),
                    1 => x.clone(),
                    _ => x.clone().pow(Expr::Const(i as f64)),
                };
                Expr::Const(*c) * power
            });
        let Some(first) = terms.next() else {
            return Expr::Const(0.0);
        };
        terms.fold(first, |acc, term| acc + term).simplify_once()
    }
}

fn divisors(n: i64) -> Vec<i64> {
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut i = 1;
    while i * i <= n {
        if n % i == 0 {
            small.push(i);
            if i != n / i {
                large.push(n / i);
            }
        }
        i += 1;
    }
    small.extend(large.into_iter().rev());
    small
}

pub fn gcd_i64(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<Complex64> {
    let discriminant = b * b - 4.0 * a * c;
    if discriminant >= 0.0 {
        let sq = discriminant.sqrt();
        vec![
            Complex64::new((-b - sq) / (2.0 * a), 0.0),
            Complex64::new((-b + sq) / (2.0 * a), 0.0),
        ]
    } else {
        let sq = (-discriminant).sqrt();
        vec![
            Complex64::new(-b / (2.0 * a), -sq / (2.0 * a)),
            Complex64::new(-b / (2.0 * a), sq / (2.0 * a)),
        ]
    }
}

fn durand_kerner(p: &Polynomial) -> Vec<Complex64> {
    let monic = p.monic();
    let n = monic.degree();
    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (0..n).map(|k| seed.powu(k as u32)).collect();
    for _ in 0..DK_ITERATIONS {
        let mut max_step: f64 = 0.0;
        for i in 0..n {
            let mut denominator = Complex64::new(1.0, 0.0);
            for j in 0..n {
                if i != j {
                    denominator *= roots[i] - roots[j];
                }
            }
            if denominator.norm() < 1e-300 {
                roots[i] += Complex64::new(1e-6, 1e-6);
                continue;
            }
            let step = monic.eval_complex(roots[i]) / denominator;
            roots[i] -= step;
            max_step = max_step.max(step.norm());
        }
        if max_step < 1e-15 {
            break;
        }
    }
    roots
}

/// rounds away floating noise: parts close to a nonzero integer, and parts negligible next to
/// the other one. A small real root is kept as it is.
pub fn clean_root(z: Complex64) -> Complex64 {
    let snap = |v: f64| {
        let nearest = v.round();
        if nearest != 0.0 && (v - nearest).abs() < 1e-9f64.max(1e-12 * v.abs()) {
            nearest + 0.0
        } else {
            v
        }
    };
    let negligible = 1e-9 * z.norm().max(1.0);
    let im = if z.im.abs() < negligible { 0.0 } else { snap(z.im) };
    let re = if im != 0.0 && z.re.abs() < negligible {
        0.0
    } else {
        snap(z.re)
    };
    Complex64::new(re, im)
}

impl Expr {
    /// polynomial view with numeric coefficients, if the expression is one
    pub fn to_polynomial(&self, var: &str) -> Option<Polynomial> {
        match self {
            Expr::Var(name) if name == var => Some(Polynomial::monomial(var)),
            e if !e.contains_variable(var) => e.eval_constant().map(|c| Polynomial::constant(var, c)),
            Expr::Add(lhs, rhs) => Some(lhs.to_polynomial(var)?.add(&rhs.to_polynomial(var)?)),
            Expr::Sub(lhs, rhs) => Some(lhs.to_polynomial(var)?.sub(&rhs.to_polynomial(var)?)),
            Expr::Mul(lhs, rhs) => Some(lhs.to_polynomial(var)?.mul(&rhs.to_polynomial(var)?)),
            Expr::Div(lhs, rhs) => {
                if rhs.contains_variable(var) {
                    return None;
                }
                let c = rhs.eval_constant()?;
                if c == 0.0 {
                    return None;
                }
                Some(lhs.to_polynomial(var)?.scale(1.0 / c))
            }
            Expr::Pow(base, exp) => {
                if exp.contains_variable(var) {
                    return None;
                }
                let n = exp.eval_constant()?;
                if n < 0.0 || n.fract() != 0.0 || n > MAX_POWER {
                    return None;
                }
                Some(base.to_polynomial(var)?.powi(n as u32))
            }
            _ => None,
        }
    }

    /// divides numerator and denominator of a univariate fraction by their polynomial gcd
    pub fn cancel_common_factors(&self) -> Option<Expr> {
        let Expr::Div(numer, denom) = self else {
            return None;
        };
        let mut vars = numer.free_symbols();
        for v in denom.free_symbols() {
            if !vars.contains(&v) {
                vars.push(v);
            }
        }
        if vars.len() != 1 {
            return None;
        }
        let var = &vars[0];
        let pn = numer.to_polynomial(var)?;
        let pd = denom.to_polynomial(var)?;
        if pd.degree() == 0 || pn.is_zero() {
            return None;
        }
        let g = pn.gcd(&pd);
        if g.degree() == 0 {
            return None;
        }
        let (qn, _) = pn.div_rem(&g)?;
        let (qd, _) = pd.div_rem(&g)?;
        Some((qn.to_expr() / qd.to_expr()).simplify_once())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(coeffs: &[f64]) -> Polynomial {
        Polynomial::new("x", coeffs.to_vec())
    }

    #[test]
    fn test_arithmetic() {
        let a = p(&[1.0, 1.0]);
        let b = p(&[-1.0, 1.0]);
        assert_eq!(a.mul(&b), p(&[-1.0, 0.0, 1.0]));
        assert_eq!(a.add(&b), p(&[0.0, 2.0]));
        assert_eq!(a.powi(2), p(&[1.0, 2.0, 1.0]));
        assert_eq!(p(&[1.0, 2.0, 3.0]).derivative(), p(&[2.0, 6.0]));
    }

    #[test]
    fn test_div_rem_and_gcd() {
        let num = p(&[-1.0, 0.0, 1.0]);
        let den = p(&[-1.0, 1.0]);
        let (q, r) = num.div_rem(&den).unwrap();
        assert_eq!(q, p(&[1.0, 1.0]));
        assert!(r.is_zero());
        assert_eq!(num.gcd(&p(&[1.0, 2.0, 1.0])), p(&[1.0, 1.0]));
    }

    #[test]
    fn test_rational_roots() {
        // 2x^2 - 3x + 1 = (2x - 1)(x - 1)
        assert_eq!(p(&[1.0, -3.0, 2.0]).rational_roots(), vec![(1, 2), (1, 1)]);
    }

    #[test]
    fn test_roots_real_and_complex() {
        let roots = p(&[-4.0, 0.0, 1.0]).roots();
        assert_eq!(roots, vec![Complex64::new(-2.0, 0.0), Complex64::new(2.0, 0.0)]);
        let roots = p(&[1.0, 0.0, 1.0]).roots();
        assert_eq!(roots, vec![Complex64::new(0.0, -1.0), Complex64::new(0.0, 1.0)]);
    }

    #[test]
    fn test_durand_kerner_irrational_cubic() {
        // x^3 - 2 has one real root 2^(1/3)
        let roots = p(&[-2.0, 0.0, 0.0, 1.0]).roots();
        assert_eq!(roots.len(), 3);
        assert_relative_eq!(roots[0].re, 2f64.powf(1.0 / 3.0), epsilon = 1e-9);
        assert_eq!(roots[0].im, 0.0);
        for root in &roots {
            assert!(p(&[-2.0, 0.0, 0.0, 1.0]).eval_complex(*root).norm() < 1e-8);
        }
    }

    #[test]
    fn test_large_coefficients_keep_the_degree() {
        let big = p(&[-1e10, 0.0, 1.0]);
        assert_eq!(big.degree(), 2);
        assert_eq!(big.roots(), vec![Complex64::new(-1e5, 0.0), Complex64::new(1e5, 0.0)]);
        assert_eq!(p(&[0.0, 2e10, 1.0]).degree(), 2);
        assert_eq!(p(&[1e-3, 1e-11]).degree(), 0);
    }

    #[test]
    fn test_clean_root_keeps_small_roots() {
        assert_eq!(clean_root(Complex64::new(1e-10, 0.0)), Complex64::new(1e-10, 0.0));
        assert_eq!(clean_root(Complex64::new(3.0 + 1e-12, 1e-14)), Complex64::new(3.0, 0.0));
        assert_eq!(clean_root(Complex64::new(1e-15, 2.0)), Complex64::new(0.0, 2.0));
        let roots = p(&[-1.0, 1e10]).roots();
        assert_relative_eq!(roots[0].re, 1e-10, max_relative = 1e-12);
    }

    #[test]
    fn test_large_fraction_cancels() {
        let x = Expr::var("x");
        let e = (x.clone().pow(Expr::Const(2.0)) - Expr::Const(1e10)) / (x - Expr::Const(1e5));
        let cancelled = e.cancel_common_factors().expect("common factor");
        assert_eq!(cancelled.to_polynomial("x"), Some(p(&[1e5, 1.0])));
    }

    #[test]
    fn test_to_polynomial() {
        let x = Expr::var("x");
        let e = (x.clone() + Expr::Const(1.0)).pow(Expr::Const(2.0)) / Expr::Const(2.0);
        assert_eq!(e.to_polynomial("x"), Some(p(&[0.5, 1.0, 0.5])));
        assert_eq!(Expr::sin(x.boxed()).to_polynomial("x"), None);
    }
}
