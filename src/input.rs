//! From raw textbook notation to a parsed, routed request.
/// regex lexemes of the engine grammar
pub mod lexer;
/// the ordered normalization pipeline
pub mod normalizer;
/// builtin names and the per-request symbol table
pub mod registry;
/// directive / equation / expression detection
pub mod router;

#[cfg(test)]
mod normalizer_tests;
#[cfg(test)]
mod router_tests;
