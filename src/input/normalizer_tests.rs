#[cfg(test)]
mod tests {
    use crate::error::MathError;
    use crate::input::normalizer::*;
    use crate::input::registry::FunctionSet;

    fn norm(raw: &str) -> String {
        let functions = FunctionSet::builtin();
        normalize(raw, &functions)
            .unwrap_or_else(|e| panic!("`{}` failed to normalize: {}", raw, e))
            .into_string()
    }

    fn norm_err(raw: &str) -> MathError {
        let functions = FunctionSet::builtin();
        normalize(raw, &functions).unwrap_err()
    }

    #[test]
    fn test_power_and_implicit_multiplication() {
        assert_eq!(norm("3x^2"), "3*x**2");
        assert_eq!(norm("2x + 3"), "2*x+3");
        assert_eq!(norm("xy"), "x*y");
        assert_eq!(norm("2 x"), "2*x");
        assert_eq!(norm("x2"), "x*2");
    }

    #[test]
    fn test_function_spellings_converge() {
        assert_eq!(norm("sinx"), "sin(x)");
        assert_eq!(norm("sin x"), "sin(x)");
        assert_eq!(norm("sin(x)"), "sin(x)");
        assert_eq!(norm("sin (x)"), "sin(x)");
    }

    #[test]
    fn test_longest_function_name_wins() {
        assert_eq!(norm("asinx"), "asin(x)");
        assert_eq!(norm("coshx"), "cosh(x)");
        assert_eq!(norm("arcsinx"), "arcsin(x)");
    }

    #[test]
    fn test_glued_arguments() {
        assert_eq!(norm("sinxy"), "sin(x*y)");
        assert_eq!(norm("sinxcosx"), "sin(x)*cos(x)");
        assert_eq!(norm("cost"), "cos(t)");
        assert_eq!(norm("2sinx"), "2*sin(x)");
        assert_eq!(norm("xsinx"), "x*sin(x)");
    }

    #[test]
    fn test_spaced_arguments() {
        assert_eq!(norm("sin 2x"), "sin(2*x)");
        assert_eq!(norm("sin x + 1"), "sin(x)+1");
        assert_eq!(norm("sin x^2"), "sin(x**2)");
        assert_eq!(norm("log 8"), "log(8)");
        assert_eq!(norm("sin xcosx"), "sin(x)*cos(x)");
    }

    #[test]
    fn test_parenthesis_products() {
        assert_eq!(norm("2(x+1)"), "2*(x+1)");
        assert_eq!(norm("(x+1)(x-1)"), "(x+1)*(x-1)");
        assert_eq!(norm("(x+1)x"), "(x+1)*x");
        assert_eq!(norm("(x+1) 2"), "(x+1)*2");
        assert_eq!(norm("x(x+1)"), "x*(x+1)");
    }

    #[test]
    fn test_constants() {
        assert_eq!(norm("e^x"), "e**x");
        assert_eq!(norm("2pi r"), "2*pi*r");
        assert_eq!(norm("pi(r+1)"), "pi*(r+1)");
    }

    #[test]
    fn test_operator_glyphs() {
        assert_eq!(norm("6 × 7"), "6*7");
        assert_eq!(norm("8 ÷ 2"), "8/2");
        assert_eq!(norm("5 − 3"), "5-3");
        assert_eq!(norm("x²"), "x**2");
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(norm("1,000 + 2,500"), "1000+2500");
        assert_eq!(norm("1,000,000"), "1000000");
        assert_eq!(norm("log(8,2)"), "log(8,2)");
        assert_eq!(norm("log(1,000, 10)"), "log(1,000,10)");
        let functions = FunctionSet::builtin();
        assert_eq!(strip_thousands_separators("max(1,2)", &functions), "max(1,2)");
        assert_eq!(strip_thousands_separators("12,3456", &functions), "12,3456");
        assert!(matches!(norm_err("max(1,2)"), MathError::MalformedInput { .. }));
        assert!(matches!(norm_err("1,23"), MathError::MalformedInput { .. }));
    }

    #[test]
    fn test_stage_functions_individually() {
        let functions = FunctionSet::builtin();
        assert_eq!(replace_operator_glyphs("x^2·y"), "x**2*y");
        assert_eq!(strip_thousands_separators("(1,000)", &functions), "(1000)");
        assert_eq!(collapse_whitespace("  2   x \t+ 1 "), "2 x + 1");
        assert_eq!(bracket_function_arguments("tanx", &functions), "tan(x)");
        assert_eq!(insert_adjacent_products("3x y", &functions), "3*x*y");
        assert_eq!(insert_parenthesis_products(")(", &functions), ")*(");
    }

    #[test]
    fn test_malformed_inputs() {
        match norm_err("((") {
            MathError::MalformedInput { offending, .. } => assert_eq!(offending, "(("),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(matches!(norm_err(""), MathError::MalformedInput { .. }));
        assert!(matches!(norm_err("   "), MathError::MalformedInput { .. }));
        assert!(matches!(norm_err("x)"), MathError::MalformedInput { .. }));
        assert!(matches!(norm_err("2 $ 3"), MathError::MalformedInput { .. }));
        assert!(matches!(norm_err("sin + 1"), MathError::MalformedInput { .. }));
        assert!(matches!(norm_err("(1, 2)"), MathError::MalformedInput { .. }));
    }

    #[test]
    fn test_malformed_number_literals() {
        match norm_err("1..2") {
            MathError::MalformedInput { offending, .. } => assert_eq!(offending, "1..2"),
            other => panic!("unexpected error {:?}", other),
        }
        match norm_err("1.2.3 + x") {
            MathError::MalformedInput { offending, .. } => assert_eq!(offending, "1.2.3"),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(matches!(norm_err("x + ."), MathError::MalformedInput { .. }));
        assert_eq!(norm("1. 2"), "1.*2");
    }

    #[test]
    fn test_subscripts() {
        assert_eq!(norm("x_1y"), "x_1*y");
        assert_eq!(norm("2x_1 + x_a"), "2*x_1+x_a");
        for raw in ["x_", "x__1", "_x", "sin(x_)"] {
            match norm_err(raw) {
                MathError::MalformedInput { offending, .. } => assert_eq!(offending, "_", "{}", raw),
                other => panic!("`{}` gave {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_equals_sign_is_not_accepted_by_the_normalizer() {
        assert!(matches!(norm_err("x=1"), MathError::MalformedInput { .. }));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["3x^2 + 2x - 5", "sinxcosx", "2(x+1)(x-1)", "e^x + pi", "log(8, 2)"] {
            let once = norm(raw);
            assert_eq!(norm(&once), once, "not idempotent for `{}`", raw);
        }
    }

    #[test]
    fn test_output_has_no_caret_and_no_implicit_adjacency() {
        let functions = FunctionSet::builtin();
        let inputs = [
            "2x^3", "ab(c)", "x^(2y)", "(2)(3)x", "4ab^2c", "x_1y", "y(x)^2", "10xy2",
        ];
        for raw in inputs {
            let text = normalize(raw, &functions)
                .unwrap_or_else(|e| panic!("`{}` failed to normalize: {}", raw, e))
                .into_string();
            assert!(!text.contains('^'), "caret left in {}", text);
            let chars: Vec<char> = text.chars().collect();
            for pair in chars.windows(2) {
                let digit_letter = pair[0].is_ascii_digit() && pair[1].is_ascii_alphabetic();
                assert!(!digit_letter, "digit-letter adjacency in {}", text);
                assert!(!(pair[0] == ')' && pair[1] == '('), "bracket adjacency in {}", text);
            }
        }
    }
}
