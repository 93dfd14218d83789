/// turns normalized text into a symbolic expression, resolving every name through the
/// per-request symbol table
///
///# Example
/// ```
/// use RustedMathSolver::input::normalizer::normalize;
/// use RustedMathSolver::input::registry::{FunctionSet, SymbolTable};
/// use RustedMathSolver::symbolic::symbolic_engine::Expr;
/// let functions = FunctionSet::builtin();
/// let text = normalize("3x^2 + sinx", &functions).unwrap();
/// let table = SymbolTable::register_variables(&[&text], &[], &functions);
/// let parsed_expression = Expr::parse_expression_func(&text, &table).unwrap();
/// println!("parsed_expression {}", parsed_expression);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// the expression tree, its printing, substitution and analytical derivatives
///# Example
/// ```
/// use RustedMathSolver::symbolic::symbolic_engine::Expr;
/// let x = Expr::var("x");
/// let f = Expr::sin(x.clone().pow(Expr::Const(2.0)).boxed());
/// let df_dx = f.diff("x").simplify();
/// assert_eq!(df_dx.to_string(), "2*x*cos(x^2)");
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
pub mod symbolic_engine_derivatives;
/// canonical form: like terms, like factors, constant folding, fraction cancellation
pub mod symbolic_simplify;
/// dense univariate polynomials and their roots
pub mod symbolic_polynomial;
///________________________________________________________________________________________________________________________________________________
/// expansion and factorization
/// Example#
/// ```
/// use RustedMathSolver::symbolic::symbolic_engine::Expr;
/// use RustedMathSolver::symbolic::symbolic_factor::DEFAULT_EXPAND_POWER;
/// let x = Expr::var("x");
/// let e = x.clone().pow(Expr::Const(2.0)) - Expr::Const(5.0) * x + Expr::Const(6.0);
/// assert_eq!(e.factor(DEFAULT_EXPAND_POWER).to_string(), "(x - 2)*(x - 3)");
/// ```
pub mod symbolic_factor;
/// table integrals and integration by parts
pub mod symbolic_integration;
/// roots of `expr = 0`
pub mod symbolic_solve;
/// the engine trait the dispatcher works against
pub mod symbolic_traits;
///______________________________________________________________________________________________________________________________________________
/// the collection of utility functions mainly for bracket parsing and proceeding
/// _____________________________________________________________________________________________________________________________________________
pub mod utils;

#[cfg(test)]
mod symbolic_engine_tests;
