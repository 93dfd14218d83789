//! different utility modules used throughout the project
/// terminal and file logging configured from a `loglevel` string
pub mod logger;
/// session history kept by the caller
pub mod history;
/// parse substitution lists like "x = 2, y = log(8, 2)" into (name, value) pairs
pub mod substitutions;
