//! Regex lexer shared by the normalization stages. `**` is always one lexeme, so a stage that
//! inserts `*` never splits an exponent operator produced by an earlier stage.
use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum Lexeme {
    Number(String),
    /// alphabetic run with an optional subscript: `_` and digits, or `_` and one letter
    Word(String),
    Power,
    Operator(char),
    Open,
    Close,
    Comma,
    Space,
    Other(char),
}

static LEXEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)(?P<num>\d+(?:\.\d*)?|\.\d+)|(?P<word>[A-Za-z]+(?:_(?:\d+|[A-Za-z]))?)|(?P<pow>\*\*)|(?P<space>\s+)|(?P<other>.)",
    )
    .expect("lexeme pattern")
});

pub fn lex(text: &str) -> Vec<Lexeme> {
    LEXEME
        .captures_iter(text)
        .filter_map(|caps| {
            if let Some(m) = caps.name("num") {
                Some(Lexeme::Number(m.as_str().to_string()))
            } else if let Some(m) = caps.name("word") {
                Some(Lexeme::Word(m.as_str().to_string()))
            } else if caps.name("pow").is_some() {
                Some(Lexeme::Power)
            } else if caps.name("space").is_some() {
                Some(Lexeme::Space)
            } else {
                caps.name("other")
                    .and_then(|m| m.as_str().chars().next())
                    .map(|c| match c {
                        '+' | '-' | '*' | '/' => Lexeme::Operator(c),
                        '(' => Lexeme::Open,
                        ')' => Lexeme::Close,
                        ',' => Lexeme::Comma,
                        other => Lexeme::Other(other),
                    })
            }
        })
        .collect()
}

impl Lexeme {
    pub fn text(&self) -> String {
        match self {
            Lexeme::Number(s) | Lexeme::Word(s) => s.clone(),
            Lexeme::Power => "**".to_string(),
            Lexeme::Operator(c) | Lexeme::Other(c) => c.to_string(),
            Lexeme::Open => "(".to_string(),
            Lexeme::Close => ")".to_string(),
            Lexeme::Comma => ",".to_string(),
            Lexeme::Space => " ".to_string(),
        }
    }
}
