//! "Correct and solve": shows how a loosely written input was read before reporting the result
//! of the operation the router detected for it.
use std::fmt;

use itertools::Itertools;

use crate::dispatch::dispatcher::Dispatcher;
use crate::dispatch::operation::{OperationOutput, OperationRequest};
use crate::error::MathError;
use crate::input::router::Router;

#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub original: String,
    /// normalized text, equation sides joined by ` = `
    pub corrected: String,
    /// the parsed form as the engine prints it
    pub interpreted: String,
    pub output: OperationOutput,
}

impl SolveReport {
    /// true when normalization changed more than whitespace
    pub fn was_corrected(&self) -> bool {
        let squeeze = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        squeeze(&self.original) != squeeze(&self.corrected)
    }

    /// (label, value) lines of the report in display order
    pub fn rows(&self, precision: usize) -> Vec<(String, String)> {
        let mut rows = vec![
            ("input".to_string(), self.original.clone()),
            ("corrected".to_string(), self.corrected.clone()),
            ("interpreted".to_string(), self.interpreted.clone()),
            ("operation".to_string(), self.output.operation.to_string()),
        ];
        if let Some(var) = &self.output.target {
            rows.push(("variable".to_string(), var.clone()));
        }
        rows.push(("result".to_string(), self.output.payload.render(precision)));
        for warning in &self.output.warnings {
            rows.push(("warning".to_string(), warning.clone()));
        }
        rows
    }
}

impl fmt::Display for SolveReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = self
            .rows(15)
            .iter()
            .map(|(label, value)| format!("{:>11}: {}", label, value))
            .join("\n");
        write!(f, "{}", text)
    }
}

/// Normalizes, routes and runs the detected operation.
/// # Arguments
/// * `raw` - input as typed
/// * `target` - variable for Differentiate/Integrate/Solve when the input does not imply one
pub fn correct_and_solve(
    router: &Router,
    dispatcher: &Dispatcher,
    raw: &str,
    target: Option<&str>,
) -> Result<SolveReport, MathError> {
    let routed = router.route(raw, target)?;
    let mut request = OperationRequest::new();
    if let Some(var) = target {
        request = request.target(var);
    }
    let output = dispatcher.dispatch(&routed, &request)?;
    Ok(SolveReport {
        original: raw.trim().to_string(),
        corrected: routed.normalized.iter().map(|t| t.as_str()).join(" = "),
        interpreted: routed.form.describe(),
        output,
    })
}
