//! # Function/Symbol Registry
//!
//! Builtin function and constant names, and the per-request [`SymbolTable`] that binds every
//! identifier of a normalized text either to a builtin or to a free symbol.
//!
//! Builtins always win a name collision: a requested variable that spells a builtin is not
//! registered as a symbol but recorded as *shadowed*, so the caller can warn the user and ask
//! for a rename.
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::input::normalizer::NormalizedText;

/// functions the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BuiltinFunction {
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Log,
    Sqrt,
}

impl BuiltinFunction {
    /// accepted argument counts; `log(x, b)` takes an optional base
    pub fn arity(&self) -> std::ops::RangeInclusive<usize> {
        match self {
            BuiltinFunction::Log => 1..=2,
            _ => 1..=1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BuiltinConstant {
    Pi,
    E,
}

/// alternative spellings found in textbooks
pub const FUNCTION_ALIASES: &[(&str, BuiltinFunction)] = &[
    ("ln", BuiltinFunction::Log),
    ("tg", BuiltinFunction::Tan),
    ("ctg", BuiltinFunction::Cot),
    ("arcsin", BuiltinFunction::Asin),
    ("arccos", BuiltinFunction::Acos),
    ("arctan", BuiltinFunction::Atan),
    ("arctg", BuiltinFunction::Atan),
];

/// the set of names the normalizer has to recognise inside alphabetic runs
#[derive(Debug, Clone)]
pub struct FunctionSet {
    functions: HashMap<String, BuiltinFunction>,
    constants: HashMap<String, BuiltinConstant>,
    /// function names, longest first
    by_length: Vec<String>,
}

impl FunctionSet {
    pub fn builtin() -> Self {
        let mut functions: HashMap<String, BuiltinFunction> = BuiltinFunction::iter()
            .map(|f| (f.to_string(), f))
            .collect();
        for (alias, f) in FUNCTION_ALIASES {
            functions.insert(alias.to_string(), *f);
        }
        let constants = BuiltinConstant::iter().map(|c| (c.to_string(), c)).collect();
        let mut by_length: Vec<String> = functions.keys().cloned().collect();
        by_length.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        FunctionSet {
            functions,
            constants,
            by_length,
        }
    }

    pub fn function(&self, name: &str) -> Option<BuiltinFunction> {
        self.functions.get(name).copied()
    }

    pub fn constant(&self, name: &str) -> Option<BuiltinConstant> {
        self.constants.get(name).copied()
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.functions.contains_key(name) || self.constants.contains_key(name)
    }

    /// longest function name that `text` starts with
    pub fn longest_function_at<'a>(&'a self, text: &str) -> Option<&'a str> {
        self.by_length
            .iter()
            .find(|name| text.starts_with(name.as_str()))
            .map(|name| name.as_str())
    }

    /// multi-letter constant (`pi`) that `text` starts with
    pub fn multi_letter_constant_at<'a>(&'a self, text: &str) -> Option<&'a str> {
        self.constants
            .keys()
            .filter(|name| name.len() > 1)
            .find(|name| text.starts_with(name.as_str()))
            .map(|name| name.as_str())
    }

    /// true when some function name ends `word`; used to tell call brackets from grouping
    pub fn ends_with_function(&self, word: &str) -> bool {
        self.by_length.iter().any(|name| word.ends_with(name.as_str()))
    }
}

impl Default for FunctionSet {
    fn default() -> Self {
        FunctionSet::builtin()
    }
}

/// what a name stands for inside one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Function(BuiltinFunction),
    Constant(BuiltinConstant),
    Symbol,
}

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+(?:_(?:\d+|[A-Za-z]))?").expect("identifier pattern"));

static IDENTIFIER_EXACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*(?:_(?:\d+|[A-Za-z]))?$").expect("identifier pattern"));

/// true for names that may serve as a variable
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER_EXACT.is_match(name)
}

/// per-request name bindings
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTable {
    bindings: BTreeMap<String, Binding>,
    symbols: Vec<String>,
    shadowed: Vec<String>,
}

impl SymbolTable {
    /// table holding only the builtins
    pub fn seeded(functions: &FunctionSet) -> Self {
        let mut bindings = BTreeMap::new();
        for (name, f) in &functions.functions {
            bindings.insert(name.clone(), Binding::Function(*f));
        }
        for (name, c) in &functions.constants {
            bindings.insert(name.clone(), Binding::Constant(*c));
        }
        SymbolTable {
            bindings,
            symbols: Vec::new(),
            shadowed: Vec::new(),
        }
    }

    /// Builds the table for one request.
    /// # Arguments
    /// * `texts` - the normalized sides of the input (one for expressions, two for equations)
    /// * `requested` - names the caller wants treated as variables even if absent from the text
    /// # Returns
    /// table with every non-builtin identifier bound to a symbol, symbols kept in canonical order
    pub fn register_variables(
        texts: &[&NormalizedText],
        requested: &[&str],
        functions: &FunctionSet,
    ) -> Self {
        let mut table = SymbolTable::seeded(functions);
        let mut found: Vec<String> = Vec::new();
        for text in texts {
            for m in IDENTIFIER.find_iter(text.as_str()) {
                let name = m.as_str();
                if functions.is_reserved(name) {
                    continue;
                }
                if !found.iter().any(|n| n == name) {
                    found.push(name.to_string());
                }
            }
        }
        let mut requested_symbols: Vec<String> = Vec::new();
        for name in requested {
            if functions.is_reserved(name) {
                if !table.shadowed.iter().any(|n| n == name) {
                    table.shadowed.push(name.to_string());
                }
            } else if !requested_symbols.iter().any(|n| n == name) {
                requested_symbols.push(name.to_string());
            }
        }
        found.retain(|name| !requested_symbols.contains(name));
        found.sort_by(|a, b| canonical_rank(a).cmp(&canonical_rank(b)));
        for name in requested_symbols.into_iter().chain(found) {
            table.bindings.insert(name.clone(), Binding::Symbol);
            table.symbols.push(name);
        }
        table
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(self.bindings.get(name), Some(Binding::Symbol))
    }

    /// free symbols in canonical order
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// requested names that collided with a builtin
    pub fn shadowed(&self) -> &[String] {
        &self.shadowed
    }

    /// resolves a textual name to a builtin function, including aliases
    pub fn function(&self, name: &str) -> Option<BuiltinFunction> {
        match self.bindings.get(name) {
            Some(Binding::Function(f)) => Some(*f),
            _ => BuiltinFunction::from_str(name).ok(),
        }
    }
}

/// `x`, `y`, `t` first, then alphabetical
fn canonical_rank(name: &str) -> (usize, String) {
    let rank = match name {
        "x" => 0,
        "y" => 1,
        "t" => 2,
        _ => 3,
    };
    (rank, name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> NormalizedText {
        NormalizedText::new_unchecked(s)
    }

    #[test]
    fn test_builtin_functions_are_bound() {
        let functions = FunctionSet::builtin();
        let table = SymbolTable::seeded(&functions);
        for f in BuiltinFunction::iter() {
            assert_eq!(table.lookup(f.as_ref()), Some(&Binding::Function(f)));
        }
        assert_eq!(table.lookup("ln"), Some(&Binding::Function(BuiltinFunction::Log)));
        assert_eq!(table.lookup("pi"), Some(&Binding::Constant(BuiltinConstant::Pi)));
    }

    #[test]
    fn test_register_variables_finds_symbols_in_canonical_order() {
        let functions = FunctionSet::builtin();
        let t = text("b*t+sin(y)+x+a");
        let table = SymbolTable::register_variables(&[&t], &[], &functions);
        assert_eq!(table.symbols(), &["x", "y", "t", "a", "b"]);
        assert!(table.is_symbol("a"));
        assert!(!table.is_symbol("sin"));
    }

    #[test]
    fn test_requested_names_come_first_and_are_registered_even_if_absent() {
        let functions = FunctionSet::builtin();
        let t = text("x+y");
        let table = SymbolTable::register_variables(&[&t], &["z", "y"], &functions);
        assert_eq!(table.symbols(), &["z", "y", "x"]);
    }

    #[test]
    fn test_requested_builtin_is_shadowed_not_registered() {
        let functions = FunctionSet::builtin();
        let t = text("e*x");
        let table = SymbolTable::register_variables(&[&t], &["e"], &functions);
        assert_eq!(table.shadowed(), &["e"]);
        assert_eq!(table.lookup("e"), Some(&Binding::Constant(BuiltinConstant::E)));
        assert_eq!(table.symbols(), &["x"]);
    }

    #[test]
    fn test_subscripted_identifiers() {
        let functions = FunctionSet::builtin();
        let t = text("x_1+x_2*y");
        let table = SymbolTable::register_variables(&[&t], &[], &functions);
        assert_eq!(table.symbols(), &["y", "x_1", "x_2"]);
    }

    #[test]
    fn test_longest_function_match() {
        let functions = FunctionSet::builtin();
        assert_eq!(functions.longest_function_at("asinx"), Some("asin"));
        assert_eq!(functions.longest_function_at("coshx"), Some("cosh"));
        assert_eq!(functions.longest_function_at("arcsinx"), Some("arcsin"));
        assert_eq!(functions.longest_function_at("xsin"), None);
        assert!(functions.ends_with_function("2log"));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("x"));
        assert!(is_identifier("x_1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("x y"));
        assert!(!is_identifier("x_"));
        assert!(!is_identifier("x_12a"));
    }
}
