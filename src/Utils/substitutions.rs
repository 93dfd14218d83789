//! parse substitution lists like "x = 2, y = log(8, 2), z: pi/2" into (name, value) pairs.
//! Values are kept as text; commas inside brackets belong to the value, so function calls with
//! several arguments survive. The caller normalizes and parses each value like any other input.
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, multispace0, space0},
    combinator::{all_consuming, recognize},
    error::{Error, ErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, separated_pair},
};

use crate::error::MathError;

/// Parses a variable name (a letter, then letters, digits or `_`)
fn parse_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(alpha1, many0(alt((alphanumeric1, tag("_")))))).parse(input)
}

/// Parses a value up to the next comma outside brackets or the next `=`
fn parse_value(input: &str) -> IResult<&str, &str> {
    let mut depth = 0usize;
    let mut end = input.len();
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => {
                end = i;
                break;
            }
            ')' => depth -= 1,
            '=' => {
                end = i;
                break;
            }
            ',' if depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    let value = input[..end].trim();
    if value.is_empty() {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::TakeWhile1)));
    }
    Ok((&input[end..], value))
}

/// Parses `name = value` or `name: value`
fn parse_assignment(input: &str) -> IResult<&str, (&str, &str)> {
    let separator = delimited(space0, alt((tag("="), tag(":"))), space0);
    separated_pair(parse_name, separator, parse_value).parse(input)
}

/// Splits a substitution list into (name, value) pairs in input order.
/// An empty list is valid; a repeated name is an error.
pub fn parse_substitutions(input: &str) -> Result<Vec<(String, String)>, MathError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    let separator = delimited(multispace0, tag(","), multispace0);
    let mut parser = all_consuming(delimited(
        multispace0,
        separated_list1(separator, parse_assignment),
        multispace0,
    ));
    let (_, pairs) = parser.parse(input).map_err(|_| {
        MathError::malformed("substitutions must look like `x = 2, y = 3`", input.trim())
    })?;
    let mut out: Vec<(String, String)> = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        if out.iter().any(|(n, _)| n == name) {
            return Err(MathError::malformed("variable substituted twice", name));
        }
        out.push((name.to_string(), value.to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter().map(|(n, v)| (n.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_simple_list() {
        assert_eq!(
            parse_substitutions("x=2, y = 3.5").unwrap(),
            pairs(&[("x", "2"), ("y", "3.5")])
        );
        assert_eq!(parse_substitutions("   ").unwrap(), Vec::new());
    }

    #[test]
    fn test_values_keep_bracketed_commas() {
        assert_eq!(
            parse_substitutions("x = log(8, 2), t: pi/2, x_1 = (1+2)*3").unwrap(),
            pairs(&[("x", "log(8, 2)"), ("t", "pi/2"), ("x_1", "(1+2)*3")])
        );
    }

    #[test]
    fn test_malformed_lists() {
        for text in ["x", "x=", "=2", "x=2,", "x=2 y=3", "x=2)", "x=1, x=2"] {
            assert!(
                matches!(parse_substitutions(text), Err(MathError::MalformedInput { .. })),
                "{:?} was accepted",
                text
            );
        }
    }
}
