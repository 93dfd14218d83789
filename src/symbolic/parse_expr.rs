//! Turns normalized text into an [`Expr`] tree.
//!
//! Splitting order (lowest binding first): rightmost top-level binary `+`/`-`, rightmost
//! top-level `*`/`/`, unary sign, leftmost top-level `**` (right associative), then calls,
//! bracketed groups, numbers and names. Every name is resolved through the request's
//! [`SymbolTable`].
use std::f64::consts::PI;

use log::error;

use crate::error::MathError;
use crate::input::normalizer::NormalizedText;
use crate::input::registry::{Binding, BuiltinConstant, BuiltinFunction, SymbolTable};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{
    brackets_balanced, find_pair_to_this_bracket, split_outside_brackets, strip_enclosing_brackets,
};

impl Expr {
    /// parses normalized text, resolving names through the table
    pub fn parse_expression_func(text: &NormalizedText, table: &SymbolTable) -> Result<Expr, MathError> {
        let input = text.as_str();
        if !brackets_balanced(input) {
            return Err(MathError::Parse(format!("unbalanced brackets in `{}`", input)));
        }
        Parser { table }.sum(input)
    }
}

struct Parser<'a> {
    table: &'a SymbolTable,
}

fn ends_operand(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ')' || c == '.' || c == '_'
}

/// byte positions of top-level operator chars, paired with whether the char before
/// the operator (ignoring spaces) closes an operand
fn top_level_operators(s: &str, ops: &[char]) -> Vec<(usize, char, bool)> {
    let mut depth = 0i64;
    let mut found = Vec::new();
    let mut last_significant: Option<char> = None;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if depth == 0 && ops.contains(&c) => {
                found.push((i, c, last_significant.is_some_and(ends_operand)));
            }
            _ => {}
        }
        if !c.is_whitespace() {
            last_significant = Some(c);
        }
    }
    found
}

impl Parser<'_> {
    fn sum(&self, s: &str) -> Result<Expr, MathError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MathError::Parse("missing operand".to_string()));
        }
        let split = top_level_operators(s, &['+', '-'])
            .into_iter()
            .rev()
            .find(|(i, _, binary)| *binary && !s[..*i].ends_with("**") && !s[..*i].trim_end().ends_with('*') && !s[..*i].trim_end().ends_with('/'));
        match split {
            Some((i, op, _)) => {
                let lhs = self.sum(&s[..i])?;
                let rhs = self.product(&s[i + 1..])?;
                Ok(if op == '+' { lhs + rhs } else { lhs - rhs })
            }
            None => self.product(s),
        }
    }

    fn product(&self, s: &str) -> Result<Expr, MathError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MathError::Parse("missing operand".to_string()));
        }
        let bytes = s.as_bytes();
        let split = top_level_operators(s, &['*', '/'])
            .into_iter()
            .rev()
            .find(|(i, c, _)| {
                let part_of_power = *c == '*'
                    && ((*i > 0 && bytes[*i - 1] == b'*') || bytes.get(*i + 1) == Some(&b'*'));
                !part_of_power
            });
        match split {
            Some((i, op, _)) => {
                let lhs = self.product(&s[..i])?;
                let rhs = self.unary(&s[i + 1..])?;
                Ok(if op == '*' { lhs * rhs } else { lhs / rhs })
            }
            None => self.unary(s),
        }
    }

    fn unary(&self, s: &str) -> Result<Expr, MathError> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix('-') {
            let operand = self.unary(rest)?;
            return Ok(match operand {
                Expr::Const(c) => Expr::Const(-c),
                other => -other,
            });
        }
        if let Some(rest) = s.strip_prefix('+') {
            return self.unary(rest);
        }
        self.power(s)
    }

    fn power(&self, s: &str) -> Result<Expr, MathError> {
        let mut depth = 0i64;
        let bytes = s.as_bytes();
        for (i, c) in s.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                '*' if depth == 0 && bytes.get(i + 1) == Some(&b'*') => {
                    let base = self.atom(&s[..i])?;
                    let exponent = self.unary(&s[i + 2..])?;
                    return Ok(base.pow(exponent));
                }
                _ => {}
            }
        }
        self.atom(s)
    }

    fn atom(&self, s: &str) -> Result<Expr, MathError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MathError::Parse("missing operand".to_string()));
        }
        if let Some(inner) = strip_enclosing_brackets(s) {
            return self.sum(inner);
        }
        if s.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            return s
                .parse::<f64>()
                .map(Expr::Const)
                .map_err(|_| MathError::Parse(format!("invalid number `{}`", s)));
        }
        if let Some(open) = s.find('(') {
            let name = &s[..open];
            if find_pair_to_this_bracket(s, open) != Some(s.len() - 1) || !is_name(name) {
                return Err(MathError::Parse(format!("unexpected token in `{}`", s)));
            }
            let inner = &s[open + 1..s.len() - 1];
            return self.call(name, inner);
        }
        if is_name(s) {
            return self.name(s);
        }
        Err(MathError::Parse(format!("unexpected token `{}`", s)))
    }

    fn name(&self, name: &str) -> Result<Expr, MathError> {
        match self.table.lookup(name) {
            Some(Binding::Symbol) => Ok(Expr::Var(name.to_string())),
            Some(Binding::Constant(BuiltinConstant::Pi)) => Ok(Expr::Const(PI)),
            Some(Binding::Constant(BuiltinConstant::E)) => Ok(Expr::Const(1.0).exp()),
            Some(Binding::Function(_)) => Err(MathError::Parse(format!(
                "function `{}` used without arguments",
                name
            ))),
            None => {
                error!("name `{}` has no binding in the symbol table", name);
                Err(MathError::UndefinedName(name.to_string()))
            }
        }
    }

    fn call(&self, name: &str, inner: &str) -> Result<Expr, MathError> {
        let function = match self.table.lookup(name) {
            Some(Binding::Function(f)) => *f,
            Some(_) => {
                return Err(MathError::Parse(format!("`{}` is not a function", name)));
            }
            None => {
                error!("function `{}` has no binding in the symbol table", name);
                return Err(MathError::UndefinedName(name.to_string()));
            }
        };
        let args = split_outside_brackets(inner, ',')
            .into_iter()
            .map(|arg| self.sum(arg))
            .collect::<Result<Vec<Expr>, MathError>>()?;
        let arity = function.arity();
        if !arity.contains(&args.len()) {
            let expected = if arity.start() == arity.end() {
                arity.start().to_string()
            } else {
                format!("{} to {}", arity.start(), arity.end())
            };
            return Err(MathError::Parse(format!(
                "`{}` expects {} argument(s), got {}",
                name,
                expected,
                args.len()
            )));
        }
        Ok(apply_builtin(function, args))
    }
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// tree for a builtin call with an arity-checked argument list
fn apply_builtin(function: BuiltinFunction, mut args: Vec<Expr>) -> Expr {
    let base = if args.len() > 1 { args.pop() } else { None };
    let arg = args.pop().unwrap_or(Expr::Const(0.0)).boxed();
    match function {
        BuiltinFunction::Sin => Expr::sin(arg),
        BuiltinFunction::Cos => Expr::cos(arg),
        BuiltinFunction::Tan => Expr::tg(arg),
        BuiltinFunction::Cot => Expr::ctg(arg),
        BuiltinFunction::Sec => Expr::Const(1.0) / Expr::cos(arg),
        BuiltinFunction::Csc => Expr::Const(1.0) / Expr::sin(arg),
        BuiltinFunction::Asin => Expr::arcsin(arg),
        BuiltinFunction::Acos => Expr::arccos(arg),
        BuiltinFunction::Atan => Expr::arctg(arg),
        BuiltinFunction::Sinh => Expr::sinh(arg),
        BuiltinFunction::Cosh => Expr::cosh(arg),
        BuiltinFunction::Tanh => Expr::tanh(arg),
        BuiltinFunction::Exp => Expr::Exp(arg),
        BuiltinFunction::Sqrt => Expr::Pow(arg, Expr::Const(0.5).boxed()),
        BuiltinFunction::Log => match base {
            Some(base) => Expr::Ln(arg) / base.ln(),
            None => Expr::Ln(arg),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::normalizer::normalize;
    use crate::input::registry::FunctionSet;

    fn parse(raw: &str) -> Result<Expr, MathError> {
        let functions = FunctionSet::builtin();
        let text = normalize(raw, &functions)?;
        let table = SymbolTable::register_variables(&[&text], &[], &functions);
        Expr::parse_expression_func(&text, &table)
    }

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(
            parse("1 + 2*x").unwrap(),
            Expr::Const(1.0) + Expr::Const(2.0) * x()
        );
        assert_eq!(
            parse("x - 1 + 2").unwrap(),
            (x() - Expr::Const(1.0)) + Expr::Const(2.0)
        );
        assert_eq!(
            parse("8/2/2").unwrap(),
            (Expr::Const(8.0) / Expr::Const(2.0)) / Expr::Const(2.0)
        );
        assert_eq!(
            parse("2^3^2").unwrap(),
            Expr::Const(2.0).pow(Expr::Const(3.0).pow(Expr::Const(2.0)))
        );
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        assert_eq!(parse("-x^2").unwrap(), -(x().pow(Expr::Const(2.0))));
        assert_eq!(parse("x^-1").unwrap(), x().pow(Expr::Const(-1.0)));
        assert_eq!(parse("2*-3").unwrap(), Expr::Const(2.0) * Expr::Const(-3.0));
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(parse("sinx").unwrap(), Expr::sin(x().boxed()));
        assert_eq!(parse("tg(x)").unwrap(), Expr::tg(x().boxed()));
        assert_eq!(parse("sqrt(x)").unwrap(), x().sqrt());
        assert_eq!(parse("pi").unwrap(), Expr::Const(PI));
        assert_eq!(parse("e").unwrap(), Expr::Const(1.0).exp());
        assert_eq!(
            parse("log(8, 2)").unwrap(),
            Expr::Ln(Expr::Const(8.0).boxed()) / Expr::Const(2.0).ln()
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("2+*3"), Err(MathError::Parse(_))));
        assert!(matches!(parse("x+"), Err(MathError::Parse(_))));
        assert!(matches!(parse("sin(1,2)"), Err(MathError::Parse(_))));
        assert_eq!(
            parse("log(1,000, 10)"),
            Err(MathError::Parse("`log` expects 1 to 2 argument(s), got 3".to_string()))
        );
        assert_eq!(
            parse("sin(1,2)"),
            Err(MathError::Parse("`sin` expects 1 argument(s), got 2".to_string()))
        );
    }

    #[test]
    fn test_unbound_name_is_undefined() {
        let functions = FunctionSet::builtin();
        let text = NormalizedText::new_unchecked("x+y");
        let table = SymbolTable::register_variables(&[&NormalizedText::new_unchecked("x")], &[], &functions);
        assert_eq!(
            Expr::parse_expression_func(&text, &table),
            Err(MathError::UndefinedName("y".to_string()))
        );
    }
}
