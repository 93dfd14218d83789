//! # Tokenizer Normalizer
//!
//! Rewrites loosely written textbook notation (`3x^2`, `sinx`, `2(x+1)`, `1,000`) into the
//! unambiguous grammar of the algebra engine (`3*x**2`, `sin(x)`, `2*(x+1)`, `1000`).
//!
//! The rewrite is an explicit ordered pipeline of [`NormalizationStage`]s, each a pure
//! string-to-string function, followed by validation. Stages work on regex lexemes
//! (see [`crate::input::lexer`]) so that `**` stays one token and a later stage never
//! re-splits what an earlier one produced.
use std::fmt;
use std::sync::LazyLock;

use log::{debug, trace};
use regex::Regex;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::error::MathError;
use crate::input::lexer::{Lexeme, lex};
use crate::input::registry::FunctionSet;
use crate::symbolic::utils::first_unmatched_bracket;

/// text that contains only tokens of the engine grammar
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedText(String);

impl NormalizedText {
    #[cfg(test)]
    pub(crate) fn new_unchecked(text: impl Into<String>) -> Self {
        NormalizedText(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// rewriting stages in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum NormalizationStage {
    OperatorGlyphs,
    ThousandsSeparators,
    Whitespace,
    FunctionCalls,
    AdjacentOperands,
    ParenthesisProducts,
}

impl NormalizationStage {
    pub fn apply(&self, text: &str, functions: &FunctionSet) -> String {
        match self {
            NormalizationStage::OperatorGlyphs => replace_operator_glyphs(text),
            NormalizationStage::ThousandsSeparators => strip_thousands_separators(text, functions),
            NormalizationStage::Whitespace => collapse_whitespace(text),
            NormalizationStage::FunctionCalls => bracket_function_arguments(text, functions),
            NormalizationStage::AdjacentOperands => insert_adjacent_products(text, functions),
            NormalizationStage::ParenthesisProducts => insert_parenthesis_products(text, functions),
        }
    }
}

/// Runs every stage and validates the result.
/// # Arguments
/// * `raw` - text as the user typed it
/// * `functions` - names that may appear as function calls or constants
/// # Returns
/// normalized text, or `MalformedInput` naming the offending fragment
pub fn normalize(raw: &str, functions: &FunctionSet) -> Result<NormalizedText, MathError> {
    if raw.trim().is_empty() {
        return Err(MathError::malformed("empty input", raw));
    }
    let mut text = raw.to_string();
    for stage in NormalizationStage::iter() {
        text = stage.apply(&text, functions);
        trace!("{}: {}", stage, text);
    }
    validate(&text, functions)?;
    debug!("normalized `{}` -> `{}`", raw, text);
    Ok(NormalizedText(text))
}

const GLYPHS: &[(char, &str)] = &[
    ('×', "*"),
    ('✕', "*"),
    ('·', "*"),
    ('⋅', "*"),
    ('∗', "*"),
    ('÷', "/"),
    ('∕', "/"),
    ('⁄', "/"),
    ('−', "-"),
    ('–', "-"),
    ('—', "-"),
    ('‒', "-"),
    ('﹣', "-"),
    ('²', "^2"),
    ('³', "^3"),
];

pub fn replace_operator_glyphs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match GLYPHS.iter().find(|(glyph, _)| *glyph == c) {
            Some((_, replacement)) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out.replace('^', "**")
}

/// removes `1,000`-style separators (a comma between digits, followed by exactly three digits)
/// but keeps commas that separate call arguments
pub fn strip_thousands_separators(text: &str, functions: &FunctionSet) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    // one entry per open bracket: does it belong to a function call
    let mut calls: Vec<bool> = Vec::new();
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' => {
                let reversed: String = chars[..i]
                    .iter()
                    .rev()
                    .skip_while(|ch| ch.is_whitespace())
                    .take_while(|ch| ch.is_ascii_alphabetic())
                    .collect();
                let word: String = reversed.chars().rev().collect();
                calls.push(!word.is_empty() && functions.ends_with_function(&word));
                out.push(c);
            }
            ')' => {
                calls.pop();
                out.push(c);
            }
            ',' => {
                let group = chars[i + 1..].iter().take_while(|ch| ch.is_ascii_digit()).count();
                let flanked = i > 0 && chars[i - 1].is_ascii_digit() && group == 3;
                let in_call = calls.last().copied().unwrap_or(false);
                if !(flanked && !in_call) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// piece of an alphabetic run
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Function(String),
    Constant(String),
    Letter(String),
}

impl Piece {
    fn text(&self) -> &str {
        match self {
            Piece::Function(s) | Piece::Constant(s) | Piece::Letter(s) => s,
        }
    }

    fn is_function(&self) -> bool {
        matches!(self, Piece::Function(_))
    }
}

/// greedy left-to-right split: longest function name, then multi-letter constant, then a
/// single letter; a `_suffix` stays attached to the last piece
fn split_word(word: &str, functions: &FunctionSet) -> Vec<Piece> {
    let (letters, subscript) = match word.find('_') {
        Some(pos) => word.split_at(pos),
        None => (word, ""),
    };
    let mut pieces = Vec::new();
    let mut pos = 0;
    while pos < letters.len() {
        let rest = &letters[pos..];
        if let Some(name) = functions.longest_function_at(rest) {
            pieces.push(Piece::Function(name.to_string()));
            pos += name.len();
        } else if let Some(name) = functions.multi_letter_constant_at(rest) {
            pieces.push(Piece::Constant(name.to_string()));
            pos += name.len();
        } else {
            let letter = &rest[..1];
            if functions.constant(letter).is_some() {
                pieces.push(Piece::Constant(letter.to_string()));
            } else {
                pieces.push(Piece::Letter(letter.to_string()));
            }
            pos += 1;
        }
    }
    if !subscript.is_empty() {
        if let Some(last) = pieces.pop() {
            pieces.push(Piece::Letter(format!("{}{}", last.text(), subscript)));
        }
    }
    pieces
}

/// `**atom` right after an implicit argument, so `sin x^2` reads as `sin(x**2)`
fn take_power_suffix(lexemes: &[Lexeme], idx: &mut usize, functions: &FunctionSet) -> String {
    if !matches!(lexemes.get(*idx), Some(Lexeme::Power)) {
        return String::new();
    }
    let mut j = *idx + 1;
    let mut suffix = "**".to_string();
    if let Some(Lexeme::Operator('-')) = lexemes.get(j) {
        suffix.push('-');
        j += 1;
    }
    match lexemes.get(j) {
        Some(Lexeme::Number(n)) => {
            suffix.push_str(n);
            j += 1;
        }
        Some(Lexeme::Word(w)) if !split_word(w, functions).iter().any(Piece::is_function) => {
            suffix.push_str(w);
            j += 1;
        }
        Some(Lexeme::Open) => {
            let mut depth = 0i64;
            let mut close = None;
            for (k, lexeme) in lexemes.iter().enumerate().skip(j) {
                match lexeme {
                    Lexeme::Open => depth += 1,
                    Lexeme::Close => {
                        depth -= 1;
                        if depth == 0 {
                            close = Some(k);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            let Some(close) = close else {
                return String::new();
            };
            for lexeme in &lexemes[j..=close] {
                suffix.push_str(&lexeme.text());
            }
            j = close + 1;
        }
        _ => return String::new(),
    }
    *idx = j;
    suffix
}

/// implicit argument after a spaced function name: adjacent numbers and letters, with an
/// optional leading minus; a word that continues with another function name is cut there
fn take_argument(
    lexemes: &mut [Lexeme],
    start: usize,
    functions: &FunctionSet,
) -> Option<(String, usize)> {
    let mut idx = start;
    let mut argument = String::new();
    if let Some(Lexeme::Operator('-')) = lexemes.get(idx) {
        argument.push('-');
        idx += 1;
    }
    let mut operands = 0;
    while let Some(lexeme) = lexemes.get(idx).cloned() {
        match lexeme {
            Lexeme::Number(n) => {
                argument.push_str(&n);
                operands += 1;
                idx += 1;
            }
            Lexeme::Word(w) => {
                let pieces = split_word(&w, functions);
                let plain = pieces.iter().take_while(|p| !p.is_function()).count();
                if plain == 0 {
                    break;
                }
                argument.extend(pieces[..plain].iter().map(Piece::text));
                operands += 1;
                if plain < pieces.len() {
                    lexemes[idx] = Lexeme::Word(pieces[plain..].iter().map(Piece::text).collect());
                    break;
                }
                idx += 1;
            }
            _ => break,
        }
    }
    if operands == 0 {
        return None;
    }
    argument.push_str(&take_power_suffix(lexemes, &mut idx, functions));
    Some((argument, idx))
}

pub fn bracket_function_arguments(text: &str, functions: &FunctionSet) -> String {
    let mut lexemes = lex(text);
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;
    while i < lexemes.len() {
        let Lexeme::Word(word) = lexemes[i].clone() else {
            out.push_str(&lexemes[i].text());
            i += 1;
            continue;
        };
        i += 1;
        let pieces = split_word(&word, functions);
        let mut k = 0;
        while k < pieces.len() {
            let Piece::Function(name) = &pieces[k] else {
                out.push_str(pieces[k].text());
                k += 1;
                continue;
            };
            let glued_end = pieces[k + 1..]
                .iter()
                .position(Piece::is_function)
                .map_or(pieces.len(), |p| k + 1 + p);
            if glued_end > k + 1 {
                // sinx, sinxy, sinxcosx
                let mut argument: String = pieces[k + 1..glued_end].iter().map(Piece::text).collect();
                if glued_end == pieces.len() {
                    argument.push_str(&take_power_suffix(&lexemes, &mut i, functions));
                }
                out.push_str(&format!("{}({})", name, argument));
                k = glued_end;
                continue;
            }
            k += 1;
            if k < pieces.len() {
                out.push_str(name);
                continue;
            }
            let mut look = i;
            if matches!(lexemes.get(look), Some(Lexeme::Space)) {
                look += 1;
            }
            if matches!(lexemes.get(look), Some(Lexeme::Open)) {
                out.push_str(name);
                i = look;
            } else if let Some((argument, next)) = take_argument(&mut lexemes, look, functions) {
                out.push_str(&format!("{}({})", name, argument));
                i = next;
            } else {
                out.push_str(name);
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Previous {
    Nothing,
    Number,
    Identifier,
    Function,
    Close,
}

pub fn insert_adjacent_products(text: &str, functions: &FunctionSet) -> String {
    let lexemes = lex(text);
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev = Previous::Nothing;
    let mut pending_space = false;
    for lexeme in &lexemes {
        let separator = |prev: Previous, pending_space: bool| {
            if matches!(prev, Previous::Number | Previous::Identifier) {
                "*"
            } else if pending_space {
                " "
            } else {
                ""
            }
        };
        match lexeme {
            Lexeme::Space => {
                pending_space = true;
                continue;
            }
            Lexeme::Word(word) => {
                for piece in split_word(word, functions) {
                    out.push_str(separator(prev, pending_space));
                    pending_space = false;
                    out.push_str(piece.text());
                    prev = if piece.is_function() {
                        Previous::Function
                    } else {
                        Previous::Identifier
                    };
                }
            }
            Lexeme::Number(n) => {
                // `1..2` stays glued for validation to reject
                if prev == Previous::Number && !pending_space {
                    out.push_str(n);
                    continue;
                }
                out.push_str(separator(prev, pending_space));
                pending_space = false;
                out.push_str(n);
                prev = Previous::Number;
            }
            other => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                out.push_str(&other.text());
                prev = if matches!(other, Lexeme::Close) {
                    Previous::Close
                } else {
                    Previous::Nothing
                };
            }
        }
    }
    out
}

pub fn insert_parenthesis_products(text: &str, functions: &FunctionSet) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev = Previous::Nothing;
    for lexeme in lex(text) {
        match lexeme {
            Lexeme::Space => continue,
            Lexeme::Open => {
                if matches!(prev, Previous::Close | Previous::Number | Previous::Identifier) {
                    out.push('*');
                }
                out.push('(');
                prev = Previous::Nothing;
            }
            Lexeme::Word(w) => {
                if prev == Previous::Close {
                    out.push('*');
                }
                out.push_str(&w);
                prev = if functions.function(&w).is_some() {
                    Previous::Function
                } else {
                    Previous::Identifier
                };
            }
            Lexeme::Number(n) => {
                if prev == Previous::Close {
                    out.push('*');
                }
                out.push_str(&n);
                prev = Previous::Number;
            }
            Lexeme::Close => {
                out.push(')');
                prev = Previous::Close;
            }
            other => {
                out.push_str(&other.text());
                prev = Previous::Nothing;
            }
        }
    }
    out
}

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_+\-*/(). ,]+").expect("character class pattern"));

pub fn validate(text: &str, functions: &FunctionSet) -> Result<(), MathError> {
    if text.trim().is_empty() {
        return Err(MathError::malformed("nothing left after normalization", text));
    }
    if let Some(m) = DISALLOWED.find(text) {
        return Err(MathError::malformed(
            format!("unexpected character(s) `{}`", m.as_str()),
            m.as_str(),
        ));
    }
    if let Some(pos) = first_unmatched_bracket(text) {
        let offending = if text[pos..].starts_with(')') {
            ")"
        } else {
            &text[pos..]
        };
        return Err(MathError::malformed("unbalanced parentheses", offending));
    }
    let lexemes = lex(text);
    let mut calls: Vec<bool> = Vec::new();
    for (idx, lexeme) in lexemes.iter().enumerate() {
        match lexeme {
            Lexeme::Number(n) => {
                if let Some(Lexeme::Number(next)) = lexemes.get(idx + 1) {
                    let literal = format!("{}{}", n, next);
                    return Err(MathError::malformed(
                        format!("`{}` is not a number", literal),
                        literal.as_str(),
                    ));
                }
            }
            Lexeme::Other('_') => {
                return Err(MathError::malformed(
                    "`_` must introduce a subscript such as x_1 or x_a",
                    "_",
                ));
            }
            Lexeme::Other(c) => {
                let offending = c.to_string();
                return Err(MathError::malformed(
                    format!("stray `{}`", c),
                    offending.as_str(),
                ));
            }
            Lexeme::Word(word) => {
                let pieces = split_word(word, functions);
                let last = pieces.len().saturating_sub(1);
                let next_is_open = matches!(lexemes.get(idx + 1), Some(Lexeme::Open));
                for (n, piece) in pieces.iter().enumerate() {
                    if piece.is_function() && !(n == last && next_is_open) {
                        return Err(MathError::malformed(
                            format!("function `{}` is missing its argument", piece.text()),
                            piece.text(),
                        ));
                    }
                }
            }
            Lexeme::Open => {
                let is_call = idx > 0
                    && matches!(&lexemes[idx - 1], Lexeme::Word(w) if functions.function(w).is_some());
                calls.push(is_call);
            }
            Lexeme::Close => {
                calls.pop();
            }
            Lexeme::Comma => {
                if !calls.last().copied().unwrap_or(false) {
                    return Err(MathError::malformed("comma outside a function call", ","));
                }
            }
            _ => {}
        }
    }
    Ok(())
}
