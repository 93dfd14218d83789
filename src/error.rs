//! Error taxonomy shared by the normalizer, the router, the dispatcher and the symbolic engine.
//!
//! Every failure crosses the library boundary as a [`MathError`] value; nothing is retried
//! because symbolic computation is deterministic and only a corrected request can succeed.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Normalization could not produce text in the engine grammar
    /// (empty input, unbalanced parentheses, stray characters, bare function names).
    #[error("Malformed input: {message} (near `{offending}`)")]
    MalformedInput { message: String, offending: String },
    /// The engine rejected normalized text.
    #[error("Parse error: {0}")]
    Parse(String),
    /// Differentiate / Integrate / Solve without a resolvable variable.
    #[error("No target variable: {0}")]
    NoTargetVariable(String),
    /// An identifier without a symbol-table entry. Signals a registry bug, not a user error.
    #[error("Undefined name: {0}")]
    UndefinedName(String),
    /// The engine could not complete the operation.
    #[error("Operation unsupported: {0}")]
    OperationUnsupported(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MathError {
    pub fn malformed(message: impl Into<String>, offending: impl Into<String>) -> Self {
        MathError::MalformedInput {
            message: message.into(),
            offending: offending.into(),
        }
    }

    /// Short user-facing hint on how to fix the request.
    pub fn guidance(&self) -> &'static str {
        match self {
            MathError::MalformedInput { .. } => "check the expression and retype it",
            MathError::Parse(_) => "the expression is not valid, e.g. an operator is missing an operand",
            MathError::NoTargetVariable(_) => "specify the variable explicitly, e.g. --var x",
            MathError::UndefinedName(_) => "internal error while resolving names",
            MathError::OperationUnsupported(_) => "try another operation or rewrite the expression",
            MathError::Config(_) => "fix the configuration file",
        }
    }
}
