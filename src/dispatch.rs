//! Operation dispatch on routed inputs.
/// request, payload and result types
pub mod operation;
/// runs one operation through the algebra engine
pub mod dispatcher;
/// correct-and-solve: the normalized input next to its result
pub mod report;
