use crate::errors::CoreEngineError;

/// Resultado abstracto de ejecutar un componente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRunResult {
    Success { output: String },
    Failure { error: CoreEngineError },
}

impl StepRunResult {
    pub fn success(output: impl Into<String>) -> Self {
        StepRunResult::Success { output: output.into() }
    }
}

impl From<Result<String, CoreEngineError>> for StepRunResult {
    fn from(r: Result<String, CoreEngineError>) -> Self {
        match r {
            Ok(output) => StepRunResult::Success { output },
            Err(error) => StepRunResult::Failure { error },
        }
    }
}
