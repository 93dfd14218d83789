//! # Symbolic Engine Module
//!
//! Core expression tree of the native algebra engine. Every operation the dispatcher
//! forwards (simplify, expand, factor, differentiate, integrate, solve, evaluate) works on
//! the [`Expr`] enum defined here.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - free symbols such as "x", "y", "x_1"
//! - **Constants**: `Const(f64)` - numerical constants
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`, `tg`, `ctg`, `arcsin`, `arccos`, `arctg`,
//!   `sinh`, `cosh`, `tanh`
//!
//! ### Key Methods
//! - `map_args(f)` - rebuild a node with transformed children
//! - `substitute_variable(var, expr)` / `set_variable(var, value)` - substitution
//! - `free_symbols()` - symbols in first-appearance order
//! - `negated()` - positive counterpart of a syntactically negative expression
//!
//! ## Interesting Code Features
//!
//! 1. **Operator Overloading**: `std::ops` traits give natural syntax: `x.clone() + y * z`
//! 2. **Precedence-aware Display**: only the brackets the reader needs are printed; the
//!    printed form is valid input for the normalizer, so results can be fed back in
//! 3. **Non-standard Variant Names**: mathematical notation (tg, ctg) for the tree, while
//!    `Display` prints the conventional names (tan, cot, asin, log)

#![allow(non_camel_case_types)]

use std::collections::HashMap;
use std::fmt;

/// symbolic expression
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Var(String),
    Const(f64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Exp(Box<Expr>),
    Ln(Box<Expr>),
    sin(Box<Expr>),
    cos(Box<Expr>),
    tg(Box<Expr>),
    ctg(Box<Expr>),
    arcsin(Box<Expr>),
    arccos(Box<Expr>),
    arctg(Box<Expr>),
    sinh(Box<Expr>),
    cosh(Box<Expr>),
    tanh(Box<Expr>),
}

impl Expr {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    pub fn sqrt(self) -> Expr {
        Expr::Pow(self.boxed(), Expr::Const(0.5).boxed())
    }

    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(c) if *c == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(c) if *c == 1.0)
    }

    /// conventional printed name of a one-argument function node
    pub fn function_name(&self) -> Option<&'static str> {
        let name = match self {
            Expr::Exp(_) => "exp",
            Expr::Ln(_) => "log",
            Expr::sin(_) => "sin",
            Expr::cos(_) => "cos",
            Expr::tg(_) => "tan",
            Expr::ctg(_) => "cot",
            Expr::arcsin(_) => "asin",
            Expr::arccos(_) => "acos",
            Expr::arctg(_) => "atan",
            Expr::sinh(_) => "sinh",
            Expr::cosh(_) => "cosh",
            Expr::tanh(_) => "tanh",
            _ => return None,
        };
        Some(name)
    }

    /// argument of a one-argument function node
    pub fn function_arg(&self) -> Option<&Expr> {
        match self {
            Expr::Exp(arg)
            | Expr::Ln(arg)
            | Expr::sin(arg)
            | Expr::cos(arg)
            | Expr::tg(arg)
            | Expr::ctg(arg)
            | Expr::arcsin(arg)
            | Expr::arccos(arg)
            | Expr::arctg(arg)
            | Expr::sinh(arg)
            | Expr::cosh(arg)
            | Expr::tanh(arg) => Some(arg),
            _ => None,
        }
    }

    /// same function node applied to a new argument; other nodes are returned unchanged
    pub fn with_function_arg(&self, arg: Expr) -> Expr {
        let arg = arg.boxed();
        match self {
            Expr::Exp(_) => Expr::Exp(arg),
            Expr::Ln(_) => Expr::Ln(arg),
            Expr::sin(_) => Expr::sin(arg),
            Expr::cos(_) => Expr::cos(arg),
            Expr::tg(_) => Expr::tg(arg),
            Expr::ctg(_) => Expr::ctg(arg),
            Expr::arcsin(_) => Expr::arcsin(arg),
            Expr::arccos(_) => Expr::arccos(arg),
            Expr::arctg(_) => Expr::arctg(arg),
            Expr::sinh(_) => Expr::sinh(arg),
            Expr::cosh(_) => Expr::cosh(arg),
            Expr::tanh(_) => Expr::tanh(arg),
            _ => self.clone(),
        }
    }

    /// rebuilds the node with `f` applied to each direct child
    pub fn map_args<F: FnMut(&Expr) -> Expr>(&self, mut f: F) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Sub(lhs, rhs) => Expr::Sub(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Mul(lhs, rhs) => Expr::Mul(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Div(lhs, rhs) => Expr::Div(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Pow(base, exp) => Expr::Pow(f(base).boxed(), f(exp).boxed()),
            _ => match self.function_arg() {
                Some(arg) => self.with_function_arg(f(arg)),
                None => self.clone(),
            },
        }
    }

    fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Var(_) | Expr::Const(_) => Vec::new(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => vec![lhs, rhs],
            _ => self.function_arg().into_iter().collect(),
        }
    }

    /// replaces the variable with a numeric value
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        match self {
            Expr::Var(name) if name == var => Expr::Const(value),
            _ => self.map_args(|child| child.set_variable(var, value)),
        }
    }

    pub fn set_variable_from_map(&self, values: &HashMap<String, f64>) -> Expr {
        match self {
            Expr::Var(name) => match values.get(name) {
                Some(value) => Expr::Const(*value),
                None => self.clone(),
            },
            _ => self.map_args(|child| child.set_variable_from_map(values)),
        }
    }

    /// replaces the variable with an expression
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            _ => self.map_args(|child| child.substitute_variable(var, expr)),
        }
    }

    pub fn contains_variable(&self, var: &str) -> bool {
        match self {
            Expr::Var(name) => name == var,
            _ => self.children().iter().any(|child| child.contains_variable(var)),
        }
    }

    /// number of occurrences of the variable in the tree
    pub fn count_variable(&self, var: &str) -> usize {
        match self {
            Expr::Var(name) => usize::from(name == var),
            _ => self.children().iter().map(|child| child.count_variable(var)).sum(),
        }
    }

    /// free symbols in order of first appearance
    pub fn free_symbols(&self) -> Vec<String> {
        fn collect(expr: &Expr, acc: &mut Vec<String>) {
            match expr {
                Expr::Var(name) => {
                    if !acc.contains(name) {
                        acc.push(name.clone());
                    }
                }
                _ => expr.children().into_iter().for_each(|child| collect(child, acc)),
            }
        }
        let mut acc = Vec::new();
        collect(self, &mut acc);
        acc
    }

    /// sorted, deduplicated variable names
    pub fn all_arguments_are_variables(&self) -> Vec<String> {
        let mut vars = self.free_symbols();
        vars.sort();
        vars
    }

    /// node count, used to pick the smaller of equivalent forms
    pub fn complexity(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|child| child.complexity())
            .sum::<usize>()
    }

    /// if the expression is written with a leading minus, its positive counterpart
    pub fn negated(&self) -> Option<Expr> {
        match self {
            Expr::Const(c) if *c < 0.0 => Some(Expr::Const(-c)),
            Expr::Mul(lhs, rhs) => match lhs.as_ref() {
                Expr::Const(c) if *c == -1.0 => Some(rhs.as_ref().clone()),
                Expr::Const(c) if *c < 0.0 => Some(Expr::Mul(Expr::Const(-c).boxed(), rhs.clone())),
                _ => None,
            },
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => 1,
            Expr::Mul(..) | Expr::Div(..) => 2,
            Expr::Const(c) if *c < 0.0 => 2,
            Expr::Pow(_, exp) if is_half(exp) => 5,
            Expr::Pow(..) => 3,
            _ => 4,
        }
    }
}

fn is_half(expr: &Expr) -> bool {
    matches!(expr, Expr::Const(c) if *c == 0.5)
}

/// prints integers without a fractional part and removes the sign of negative zero
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// `p/q` with a small denominator, when `value` is such a fraction
pub fn small_fraction(value: f64) -> Option<(i64, i64)> {
    if value.fract() == 0.0 || !value.is_finite() {
        return None;
    }
    (2..=1000i64).find_map(|q| {
        let p = value * q as f64;
        if (p - p.round()).abs() < 1e-9 * q as f64 && p.abs() < 1e12 {
            Some((p.round() as i64, q))
        } else {
            None
        }
    })
}

struct Wrapped<'a>(&'a Expr, bool);

impl fmt::Display for Wrapped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.1 {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

fn wrap(expr: &Expr, needed: bool) -> Wrapped<'_> {
    Wrapped(expr, needed)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", format_number(*val)),
            Expr::Add(lhs, rhs) => match rhs.negated() {
                Some(positive) => write!(f, "{} - {}", lhs, wrap(&positive, positive.precedence() <= 1)),
                None => write!(f, "{} + {}", lhs, rhs),
            },
            Expr::Sub(lhs, rhs) => write!(
                f,
                "{} - {}",
                lhs,
                wrap(rhs, rhs.precedence() <= 1 || rhs.negated().is_some())
            ),
            Expr::Mul(lhs, rhs) => {
                if let Expr::Const(c) = lhs.as_ref() {
                    if *c == -1.0 {
                        return write!(
                            f,
                            "-{}",
                            wrap(rhs, rhs.precedence() <= 1 || rhs.negated().is_some())
                        );
                    }
                    if let Some((p, q)) = small_fraction(*c) {
                        let rhs_text = wrap(rhs, rhs.precedence() < 2 || rhs.negated().is_some());
                        return match p {
                            1 => write!(f, "{}/{}", rhs_text, q),
                            -1 => write!(f, "-{}/{}", rhs_text, q),
                            _ => write!(f, "{}*{}/{}", p, rhs_text, q),
                        };
                    }
                }
                write!(
                    f,
                    "{}*{}",
                    wrap(lhs, lhs.precedence() < 2),
                    wrap(rhs, rhs.precedence() < 2 || rhs.negated().is_some())
                )
            }
            Expr::Div(lhs, rhs) => write!(
                f,
                "{}/{}",
                wrap(lhs, lhs.precedence() < 2),
                wrap(rhs, rhs.precedence() <= 2 || rhs.negated().is_some())
            ),
            Expr::Pow(base, exp) => {
                if is_half(exp) {
                    write!(f, "sqrt({})", base)
                } else {
                    write!(
                        f,
                        "{}^{}",
                        wrap(base, base.precedence() <= 3 || base.negated().is_some()),
                        wrap(exp, exp.precedence() < 3 || exp.negated().is_some())
                    )
                }
            }
            _ => match (self.function_name(), self.function_arg()) {
                (Some(name), Some(arg)) => write!(f, "{}({})", name, arg),
                _ => write!(f, "{:?}", self),
            },
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Expr::Const(-1.0).boxed(), self.boxed())
    }
}
