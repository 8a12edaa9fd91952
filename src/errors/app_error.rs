use step_core::{CompileError, CoreEngineError, DefinitionError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid usage: {0}")]
    Usage(String),
    #[error("unknown pipeline '{0}'")]
    UnknownPipeline(String),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Engine(#[from] CoreEngineError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Código de salida del proceso: 2 uso, 4 no encontrado/rechazado, 5 fallo.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::Usage(_) => 2,
            AppError::UnknownPipeline(_)
            | AppError::Definition(_)
            | AppError::Compile(CompileError::Definition(_))
            | AppError::Engine(CoreEngineError::UnknownComponent(_))
            | AppError::Engine(CoreEngineError::UnknownArgument(_))
            | AppError::Engine(CoreEngineError::MissingParameter(_)) => 4,
            _ => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(AppError::Usage("x".into()).exit_code(), 2);
        assert_eq!(AppError::UnknownPipeline("p".into()).exit_code(), 4);
        let cycle = CompileError::Definition(DefinitionError::Cycle { path: vec!["a".into(), "a".into()] });
        assert_eq!(AppError::from(cycle).exit_code(), 4);
        let failed = CoreEngineError::StepFailed { task_id: "t".into(),
                                                   message: "boom".into() };
        assert_eq!(AppError::from(failed).exit_code(), 5);
    }

    #[test]
    fn io_variant_from() {
        let err: AppError = std::io::Error::other("disk full").into();
        assert_eq!(err.to_string(), "io error: disk full");
        assert_eq!(AppError::UnknownPipeline("nope".into()).to_string(), "unknown pipeline 'nope'");
    }
}
