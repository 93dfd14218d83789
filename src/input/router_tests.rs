use crate::config::{AmbiguityPolicy, SolverConfig};
use crate::dispatch::operation::OperationTag;
use crate::error::MathError;
use crate::input::registry::FunctionSet;
use crate::input::router::*;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_traits::NativeEngine;

fn route_with(config: &SolverConfig, raw: &str, requested: Option<&str>) -> Result<RoutedInput, MathError> {
    let engine = NativeEngine::default();
    let functions = FunctionSet::builtin();
    Router::new(&engine, &functions, config).route(raw, requested)
}

fn route(raw: &str) -> RoutedInput {
    route_with(&SolverConfig::default(), raw, None)
        .unwrap_or_else(|e| panic!("`{}` failed to route: {}", raw, e))
}

#[test]
fn test_equation_is_split_at_the_equals_sign() {
    let routed = route("2x + 3 = 7");
    assert_eq!(routed.normalized[0].as_str(), "2*x+3");
    assert_eq!(routed.normalized[1].as_str(), "7");
    match &routed.form {
        ParsedForm::Equation { left, right } => {
            assert_eq!(left.to_string(), "2*x + 3");
            assert_eq!(right, &Expr::Const(7.0));
        }
        other => panic!("expected an equation, got {:?}", other),
    }
    assert_eq!(routed.detected, OperationTag::Solve);
    assert_eq!(routed.directive, None);
    assert_eq!(routed.form.reduced().to_string(), "2*x + 3 - 7");
}

#[test]
fn test_d_dx_directive() {
    let routed = route("d/dx sinx");
    assert_eq!(
        routed.directive,
        Some(Directive {
            operation: OperationTag::Differentiate,
            variable: "x".to_string()
        })
    );
    assert_eq!(routed.form, ParsedForm::Expression(Expr::sin(Expr::var("x").boxed())));
    assert_eq!(routed.detected, OperationTag::Differentiate);
    let routed = route("d / dt t^2");
    assert_eq!(routed.directive.map(|d| d.variable), Some("t".to_string()));
}

#[test]
fn test_directive_variable_is_registered_even_when_absent() {
    let routed = route("d/dy x^2");
    assert!(routed.table.is_symbol("y"));
    assert_eq!(routed.table.symbols(), &["y", "x"]);
}

#[test]
fn test_diff_call_with_single_or_no_symbol() {
    let routed = route("diff(t^3)");
    assert_eq!(routed.directive.map(|d| d.variable), Some("t".to_string()));
    assert!(routed.warnings.is_empty());
    let routed = route("diff(5)");
    assert_eq!(routed.directive.map(|d| d.variable), Some("x".to_string()));
}

#[test]
fn test_diff_call_with_several_symbols_follows_policy() {
    let routed = route("diff(y x^2)");
    assert_eq!(routed.directive.map(|d| d.variable), Some("x".to_string()));
    assert_eq!(routed.warnings.len(), 1);

    let strict = SolverConfig {
        ambiguity_policy: AmbiguityPolicy::Reject,
        ..SolverConfig::default()
    };
    assert!(matches!(
        route_with(&strict, "diff(y x^2)", None),
        Err(MathError::NoTargetVariable(_))
    ));
    let routed = route_with(&strict, "diff(y x^2)", Some("y")).unwrap();
    assert_eq!(routed.directive.map(|d| d.variable), Some("y".to_string()));
    assert!(routed.warnings.is_empty());
}

#[test]
fn test_diff_and_integrate_calls_with_explicit_variable() {
    let routed = route("diff(x*y, y)");
    assert_eq!(routed.directive.map(|d| d.variable), Some("y".to_string()));
    let routed = route("integrate(x^2, x)");
    assert_eq!(
        routed.directive,
        Some(Directive {
            operation: OperationTag::Integrate,
            variable: "x".to_string()
        })
    );
    assert_eq!(routed.detected, OperationTag::Integrate);
    assert!(matches!(
        route_with(&SolverConfig::default(), "diff(x, 2)", None),
        Err(MathError::MalformedInput { .. })
    ));
}

#[test]
fn test_labelled_prefixes() {
    let routed = route("integrate: sinx");
    assert_eq!(routed.detected, OperationTag::Integrate);
    assert_eq!(routed.normalized[0].as_str(), "sin(x)");
    let routed = route("diff: x^3");
    assert_eq!(routed.detected, OperationTag::Differentiate);
}

#[test]
fn test_plain_expression_defaults_to_simplify() {
    let routed = route("3x^2 + sinx");
    assert_eq!(routed.normalized[0].as_str(), "3*x**2+sin(x)");
    assert_eq!(routed.detected, OperationTag::Simplify);
    assert!(!routed.form.is_equation());
}

#[test]
fn test_directive_overrides_requested_variable_with_warning() {
    let routed = route_with(&SolverConfig::default(), "d/dx x*y", Some("y")).unwrap();
    assert_eq!(routed.directive.map(|d| d.variable), Some("x".to_string()));
    assert_eq!(routed.warnings.len(), 1);
    assert!(routed.table.is_symbol("y"));
}

#[test]
fn test_requested_builtin_is_reported_as_shadowed() {
    let routed = route_with(&SolverConfig::default(), "e*x", Some("e")).unwrap();
    assert_eq!(routed.table.shadowed(), &["e"]);
    assert!(routed.warnings[0].contains("`e`"));
    let quiet = SolverConfig {
        warn_on_shadowing: false,
        ..SolverConfig::default()
    };
    let routed = route_with(&quiet, "e*x", Some("e")).unwrap();
    assert!(routed.warnings.is_empty());
}

#[test]
fn test_malformed_inputs() {
    let config = SolverConfig::default();
    for raw in ["((", "", "   ", "= 3", "x =", "d/dx", "x = y = 2"] {
        assert!(
            matches!(route_with(&config, raw, None), Err(MathError::MalformedInput { .. })),
            "{:?} was accepted",
            raw
        );
    }
    assert!(matches!(
        route_with(&config, "x", Some("2x")),
        Err(MathError::NoTargetVariable(_))
    ));
}

#[test]
fn test_find_equals_skips_comparisons_and_brackets() {
    assert_eq!(find_equals("a = b"), Some(2));
    assert_eq!(find_equals("x == 2"), None);
    assert_eq!(find_equals("x <= 2"), None);
    assert_eq!(find_equals("x >= 2"), None);
    assert_eq!(find_equals("x != 2"), None);
    assert_eq!(find_equals("(x = 1)"), None);
    assert_eq!(find_equals("x<=1 = y"), Some(5));
}
