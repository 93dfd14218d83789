//! `MathSolver` bundles an engine, the builtin names and a configuration so that callers can
//! go from raw text to a result in one call.
use log::info;

use crate::config::SolverConfig;
use crate::dispatch::dispatcher::Dispatcher;
use crate::dispatch::operation::{OperationRequest, OperationResult};
use crate::dispatch::report::{SolveReport, correct_and_solve};
use crate::error::MathError;
use crate::input::registry::FunctionSet;
use crate::input::router::{RoutedInput, Router};
use crate::symbolic::symbolic_traits::{AlgebraEngine, NativeEngine};

pub struct MathSolver {
    engine: Box<dyn AlgebraEngine>,
    functions: FunctionSet,
    config: SolverConfig,
}

impl MathSolver {
    /// solver on the native engine, expansion bounded by `config.max_expand_power`
    pub fn new(config: SolverConfig) -> Self {
        let engine = NativeEngine::new(config.max_expand_power);
        MathSolver::with_engine(Box::new(engine), config)
    }

    pub fn with_engine(engine: Box<dyn AlgebraEngine>, config: SolverConfig) -> Self {
        info!("solver on the {} engine", engine.name());
        MathSolver {
            engine,
            functions: FunctionSet::builtin(),
            config,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn engine(&self) -> &dyn AlgebraEngine {
        self.engine.as_ref()
    }

    pub fn router(&self) -> Router<'_> {
        Router::new(self.engine.as_ref(), &self.functions, &self.config)
    }

    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(self.engine.as_ref(), &self.functions)
    }

    pub fn route(&self, raw: &str, target: Option<&str>) -> Result<RoutedInput, MathError> {
        self.router().route(raw, target)
    }

    /// routes `raw` and runs the request on it
    pub fn process(&self, raw: &str, request: &OperationRequest) -> OperationResult {
        let routed = self.route(raw, request.target.as_deref())?;
        self.dispatcher().dispatch(&routed, request)
    }

    pub fn report(&self, raw: &str, target: Option<&str>) -> Result<SolveReport, MathError> {
        correct_and_solve(&self.router(), &self.dispatcher(), raw, target)
    }
}

impl Default for MathSolver {
    fn default() -> Self {
        MathSolver::new(SolverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::operation::{OperationTag, Payload};

    #[test]
    fn test_process() {
        let solver = MathSolver::default();
        let output = solver
            .process("x^2+1", &OperationRequest::new().operation(OperationTag::Evaluate).substitute("x", "3"))
            .unwrap();
        assert_eq!(output.payload, Payload::Numeric(10.0));
        assert!(solver.process("((", &OperationRequest::new()).is_err());
    }

    #[test]
    fn test_expand_limit_follows_config() {
        let config = SolverConfig {
            max_expand_power: 2,
            ..SolverConfig::default()
        };
        let solver = MathSolver::new(config);
        let request = OperationRequest::new().operation(OperationTag::Expand);
        let output = solver.process("(x+1)^3", &request).unwrap();
        assert_eq!(output.payload.to_string(), "(x + 1)^3");
        let output = MathSolver::default().process("(x+1)^3", &request).unwrap();
        assert_eq!(output.payload.to_string(), "x^3 + 3*x^2 + 3*x + 1");
    }

    #[test]
    fn test_custom_engine() {
        let solver = MathSolver::with_engine(Box::new(NativeEngine::new(4)), SolverConfig::default());
        assert_eq!(solver.engine().name(), "native");
        let report = solver.report("sinx + sinx", None).unwrap();
        assert_eq!(report.output.payload.to_string(), "2*sin(x)");
    }
}
