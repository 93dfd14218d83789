use crate::input::normalizer::normalize;
use crate::input::registry::{FunctionSet, SymbolTable};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_factor::DEFAULT_EXPAND_POWER;
use crate::symbolic::symbolic_solve::Solution;
use approx::assert_relative_eq;
use std::collections::HashMap;
//___________________________________TESTS____________________________________

fn parse(raw: &str) -> Expr {
    let functions = FunctionSet::builtin();
    let text = normalize(raw, &functions).unwrap();
    let table = SymbolTable::register_variables(&[&text], &[], &functions);
    Expr::parse_expression_func(&text, &table).unwrap()
}

#[test]
fn test_operator_overloading() {
    let x = Expr::var("x");
    let expr = x.clone() + Expr::Const(2.0);
    assert_eq!(expr, Expr::Add(x.clone().boxed(), Expr::Const(2.0).boxed()));
    let expr = -x.clone();
    assert_eq!(expr, Expr::Mul(Expr::Const(-1.0).boxed(), x.boxed()));
}

#[test]
fn test_display_reparses_to_the_same_value() {
    for raw in [
        "3x^2 - 2x + 1",
        "sin(x)^2/(1 + x)",
        "-(x + 1)^3",
        "2^-x",
        "sqrt(x + 1)*exp(-x)",
        "x/(y*z)",
        "log(x, 2) + atan(x/2)",
    ] {
        let e = parse(raw);
        let again = parse(&e.to_string());
        assert!(e.equivalent(&again), "{} printed as {}", raw, e);
    }
}

#[test]
fn test_free_symbols_in_first_seen_order() {
    let e = parse("z*y + x");
    assert_eq!(e.free_symbols(), vec!["z", "y", "x"]);
    assert_eq!(e.all_arguments_are_variables(), vec!["x", "y", "z"]);
}

#[test]
fn test_substitution() {
    let e = parse("x^2 + y");
    let replaced = e.substitute_variable("y", &parse("2x"));
    assert_eq!(replaced.simplify().to_string(), "x^2 + 2*x");
    let mut values = HashMap::new();
    values.insert("x".to_string(), 2.0);
    assert_eq!(replaced.set_variable_from_map(&values).simplify(), Expr::Const(8.0));
}

#[test]
fn test_expand_then_factor_round_trip() {
    for raw in ["(x+1)(x-2)", "(2x-1)^2", "x(x+3)(x-3)", "3(x+1)^2(x-4)", "(x^2+1)(x+2)"] {
        let original = parse(raw);
        let expanded = original.expand(DEFAULT_EXPAND_POWER);
        let factored = expanded.factor(DEFAULT_EXPAND_POWER);
        assert!(factored.equivalent(&original), "{} came back as {}", raw, factored);
    }
}

#[test]
fn test_derivative_of_integral() {
    for raw in ["x^3 + 2x", "sin(2x) + cos x", "x e^x", "1/(x+1)", "x^2 ln x", "exp(3x - 1)"] {
        let f = parse(raw);
        let integral = f.integrate("x").unwrap();
        assert!(integral.diff("x").equivalent(&f), "∫ {} dx = {}", raw, integral);
    }
}

#[test]
fn test_solve_parsed_equation_sides() {
    let reduced = parse("2x + 3") - parse("7");
    assert_eq!(reduced.solve("x").unwrap(), vec![Solution::Exact(Expr::Const(2.0))]);
    let reduced = parse("x^2") - parse("4");
    let roots: Vec<f64> = reduced
        .solve("x")
        .unwrap()
        .iter()
        .filter_map(|s| s.value())
        .collect();
    assert_eq!(roots, vec![-2.0, 2.0]);
}

#[test]
fn test_numeric_evaluation_of_constants() {
    assert_relative_eq!(parse("2pi").eval_constant().unwrap(), 2.0 * std::f64::consts::PI);
    assert_relative_eq!(parse("e^2").eval_constant().unwrap(), std::f64::consts::E.powi(2), epsilon = 1e-12);
    assert_relative_eq!(parse("log(8, 2)").eval_constant().unwrap(), 3.0, epsilon = 1e-12);
    assert_eq!(parse("1/0").eval_constant(), None);
}
