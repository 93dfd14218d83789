//! # Expression Router
//!
//! Decides what a raw input *is* before anything is computed: a differentiation or
//! integration directive (`d/dx sinx`, `diff(x^2 y)`, `integrate(x^2, x)`, `diff: x^3`),
//! an equation (`2x + 3 = 7`) or a plain expression. Each side is normalized, the request's
//! [`SymbolTable`] is built and the engine parses the result into a [`ParsedForm`].
//!
//! Rules are tried in a fixed order and the first one that matches wins.
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::Regex;

use crate::config::{AmbiguityPolicy, SolverConfig};
use crate::dispatch::operation::OperationTag;
use crate::error::MathError;
use crate::input::normalizer::{NormalizedText, normalize};
use crate::input::registry::{FunctionSet, SymbolTable, is_identifier};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_traits::AlgebraEngine;
use crate::symbolic::utils::{find_pair_to_this_bracket, split_outside_brackets};

static D_DX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*d\s*/\s*d\s*([A-Za-z])(.*)$").expect("d/dx pattern"));

static CALL_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(diff|integrate)\s*\(").expect("directive call pattern"));

static PREFIX_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(diff|integrate)\s*:(.*)$").expect("directive prefix pattern"));

/// an expression, or an equation kept as its two sides
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedForm {
    Expression(Expr),
    Equation { left: Expr, right: Expr },
}

impl ParsedForm {
    /// `left - right` for equations, the expression itself otherwise
    pub fn reduced(&self) -> Expr {
        match self {
            ParsedForm::Expression(e) => e.clone(),
            ParsedForm::Equation { left, right } => left.clone() - right.clone(),
        }
    }

    pub fn is_equation(&self) -> bool {
        matches!(self, ParsedForm::Equation { .. })
    }

    /// `left = right` for equations
    pub fn describe(&self) -> String {
        match self {
            ParsedForm::Expression(e) => e.to_string(),
            ParsedForm::Equation { left, right } => format!("{} = {}", left, right),
        }
    }
}

/// operation and variable implied by the shape of the input
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub operation: OperationTag,
    pub variable: String,
}

/// everything the dispatcher needs about one input
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedInput {
    pub raw: String,
    /// one entry per side
    pub normalized: Vec<NormalizedText>,
    pub form: ParsedForm,
    pub table: SymbolTable,
    pub directive: Option<Directive>,
    /// operation used when the request does not name one
    pub detected: OperationTag,
    pub warnings: Vec<String>,
}

/// a directive before its variable has been settled
struct PendingDirective<'r> {
    operation: OperationTag,
    body: &'r str,
    /// fixed by the input itself (`d/dx`, `diff(f, x)`)
    variable: Option<String>,
}

pub struct Router<'a> {
    engine: &'a dyn AlgebraEngine,
    functions: &'a FunctionSet,
    config: &'a SolverConfig,
}

impl<'a> Router<'a> {
    pub fn new(engine: &'a dyn AlgebraEngine, functions: &'a FunctionSet, config: &'a SolverConfig) -> Self {
        Router {
            engine,
            functions,
            config,
        }
    }

    /// Routes one raw input.
    /// # Arguments
    /// * `raw` - text as typed
    /// * `requested` - variable the caller asked for, registered as a symbol even if absent
    /// # Returns
    /// the parsed form with its symbol table, directive and auto-detected operation
    pub fn route(&self, raw: &str, requested: Option<&str>) -> Result<RoutedInput, MathError> {
        if raw.trim().is_empty() {
            return Err(MathError::malformed("empty input", raw));
        }
        if let Some(name) = requested {
            if !is_identifier(name) {
                return Err(MathError::NoTargetVariable(format!(
                    "`{}` is not a valid variable name",
                    name
                )));
            }
        }
        match self.detect_directive(raw)? {
            Some(pending) => self.route_directive(raw, pending, requested),
            None => match find_equals(raw) {
                Some(pos) => self.route_equation(raw, pos, requested),
                None => self.route_expression(raw, requested),
            },
        }
    }

    fn detect_directive<'r>(&self, raw: &'r str) -> Result<Option<PendingDirective<'r>>, MathError> {
        if let Some(caps) = D_DX.captures(raw) {
            let (Some(letter), Some(rest)) = (caps.get(1), caps.get(2)) else {
                return Ok(None);
            };
            debug!("d/d{} directive", letter.as_str());
            return Ok(Some(PendingDirective {
                operation: OperationTag::Differentiate,
                body: rest.as_str(),
                variable: Some(letter.as_str().to_string()),
            }));
        }
        if let Some(caps) = CALL_DIRECTIVE.captures(raw) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                return Ok(None);
            };
            let open = whole.end() - 1;
            // only a call spanning the whole input is a directive; `diff(x)*2` is not
            if find_pair_to_this_bracket(raw, open) == Some(raw.trim_end().len() - 1) {
                let inner = &raw[open + 1..raw.trim_end().len() - 1];
                let parts = split_outside_brackets(inner, ',');
                let (body, variable) = match parts.as_slice() {
                    [body] => (*body, None),
                    [body, var] if is_identifier(var.trim()) => (*body, Some(var.trim().to_string())),
                    _ => {
                        return Err(MathError::malformed(
                            format!("{}(...) takes an expression and an optional variable", name.as_str()),
                            inner,
                        ));
                    }
                };
                return Ok(Some(PendingDirective {
                    operation: directive_operation(name.as_str()),
                    body,
                    variable,
                }));
            }
        }
        if let Some(caps) = PREFIX_DIRECTIVE.captures(raw) {
            let (Some(name), Some(body)) = (caps.get(1), caps.get(2)) else {
                return Ok(None);
            };
            return Ok(Some(PendingDirective {
                operation: directive_operation(name.as_str()),
                body: body.as_str(),
                variable: None,
            }));
        }
        Ok(None)
    }

    fn route_directive(
        &self,
        raw: &str,
        pending: PendingDirective,
        requested: Option<&str>,
    ) -> Result<RoutedInput, MathError> {
        let text = normalize(pending.body, self.functions)?;
        let mut warnings = Vec::new();
        let variable = match pending.variable {
            Some(v) => {
                if let Some(r) = requested.filter(|r| *r != v) {
                    warnings.push(format!("the input names `{}`, requested `{}` is ignored", v, r));
                }
                v
            }
            None => self.choose_variable(&text, requested, &mut warnings)?,
        };
        let mut names = vec![variable.as_str()];
        names.extend(requested.filter(|r| *r != variable));
        let table = SymbolTable::register_variables(&[&text], &names, self.functions);
        self.shadowing_warnings(&table, &mut warnings);
        let expr = self.engine.parse(&text, &table)?;
        info!("{} directive on `{}` with respect to {}", pending.operation, expr, variable);
        Ok(RoutedInput {
            raw: raw.to_string(),
            normalized: vec![text],
            form: ParsedForm::Expression(expr),
            table,
            directive: Some(Directive {
                operation: pending.operation,
                variable,
            }),
            detected: pending.operation,
            warnings,
        })
    }

    /// variable of a directive that does not name one
    fn choose_variable(
        &self,
        text: &NormalizedText,
        requested: Option<&str>,
        warnings: &mut Vec<String>,
    ) -> Result<String, MathError> {
        if let Some(r) = requested {
            return Ok(r.to_string());
        }
        let found = SymbolTable::register_variables(&[text], &[], self.functions);
        match found.symbols() {
            [] => Ok(self.config.default_variable.clone()),
            [only] => Ok(only.clone()),
            several => match self.config.ambiguity_policy {
                AmbiguityPolicy::FirstInRegistryOrder => {
                    let chosen = several[0].clone();
                    let message = format!(
                        "several variables ({}); using `{}`",
                        several.join(", "),
                        chosen
                    );
                    warn!("{}", message);
                    warnings.push(message);
                    Ok(chosen)
                }
                AmbiguityPolicy::Reject => Err(MathError::NoTargetVariable(format!(
                    "`{}` has several variables ({}); name one",
                    text,
                    several.join(", ")
                ))),
            },
        }
    }

    fn route_equation(&self, raw: &str, pos: usize, requested: Option<&str>) -> Result<RoutedInput, MathError> {
        let (left_raw, right_raw) = (&raw[..pos], &raw[pos + 1..]);
        if left_raw.trim().is_empty() || right_raw.trim().is_empty() {
            return Err(MathError::malformed("equation side is empty", raw.trim()));
        }
        let left_text = normalize(left_raw, self.functions)?;
        let right_text = normalize(right_raw, self.functions)?;
        let names: Vec<&str> = requested.into_iter().collect();
        let table = SymbolTable::register_variables(&[&left_text, &right_text], &names, self.functions);
        let mut warnings = Vec::new();
        self.shadowing_warnings(&table, &mut warnings);
        let left = self.engine.parse(&left_text, &table)?;
        let right = self.engine.parse(&right_text, &table)?;
        debug!("equation {} = {}", left, right);
        Ok(RoutedInput {
            raw: raw.to_string(),
            normalized: vec![left_text, right_text],
            form: ParsedForm::Equation { left, right },
            table,
            directive: None,
            detected: OperationTag::Solve,
            warnings,
        })
    }

    fn route_expression(&self, raw: &str, requested: Option<&str>) -> Result<RoutedInput, MathError> {
        let text = normalize(raw, self.functions)?;
        let names: Vec<&str> = requested.into_iter().collect();
        let table = SymbolTable::register_variables(&[&text], &names, self.functions);
        let mut warnings = Vec::new();
        self.shadowing_warnings(&table, &mut warnings);
        let expr = self.engine.parse(&text, &table)?;
        Ok(RoutedInput {
            raw: raw.to_string(),
            normalized: vec![text],
            form: ParsedForm::Expression(expr),
            table,
            directive: None,
            detected: OperationTag::Simplify,
            warnings,
        })
    }

    fn shadowing_warnings(&self, table: &SymbolTable, warnings: &mut Vec<String>) {
        if !self.config.warn_on_shadowing {
            return;
        }
        for name in table.shadowed() {
            let message = format!("`{}` is a builtin name and cannot be a variable; rename it", name);
            warn!("{}", message);
            warnings.push(message);
        }
    }
}

fn directive_operation(name: &str) -> OperationTag {
    if name == "integrate" {
        OperationTag::Integrate
    } else {
        OperationTag::Differentiate
    }
}

/// byte position of the first top-level `=` that is not part of `==`, `<=`, `>=` or `!=`
pub fn find_equals(raw: &str) -> Option<usize> {
    let mut depth = 0i64;
    let mut previous: Option<char> = None;
    let mut chars = raw.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '=' if depth == 0 => {
                let next = chars.peek().map(|(_, n)| *n);
                if next == Some('=') {
                    // skip the second half of `==`
                    chars.next();
                    previous = Some('=');
                    continue;
                }
                if !matches!(previous, Some('<') | Some('>') | Some('!') | Some('=')) {
                    return Some(i);
                }
            }
            _ => {}
        }
        previous = Some(c);
    }
    None
}
