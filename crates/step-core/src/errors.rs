//! Errores del core, uno por capa.
//!
//! - `DefinitionError`: wiring inválido detectado al construir la definición
//!   (tiempo de definición). Siempre fatal.
//! - `CompileError`: fallos al compilar/persistir el documento.
//! - `CoreEngineError`: fallos del runner local al ejecutar steps.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DefinitionError {
    #[error("invalid name '{0}': expected lowercase letters, digits and '-'")]
    InvalidName(String),
    #[error("invalid component name '{0}': expected an identifier")]
    InvalidComponentName(String),
    #[error("pipeline '{0}' declares no tasks")]
    EmptyPipeline(String),
    #[error("component '{0}' registered twice")]
    DuplicateComponent(String),
    #[error("unknown component '{0}'")]
    UnknownComponent(String),
    #[error("parameter '{0}' declared twice")]
    DuplicateParameter(String),
    #[error("task '{task}' does not bind required input '{input}'")]
    MissingInput { task: String, input: String },
    #[error("task '{task}' binds input '{input}' which its component does not declare")]
    UnexpectedInput { task: String, input: String },
    #[error("task '{task}' references undeclared parameter '{parameter}'")]
    UnknownParameter { task: String, parameter: String },
    #[error("'{referrer}' references undeclared task '{task}'")]
    UnknownTask { referrer: String, task: String },
    #[error("task '{task}' uses an output handle from another pipeline (producer '{producer}')")]
    ForeignHandle { task: String, producer: String },
    #[error("dependency cycle: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error("serialize workflow document: {0}")]
    Serialize(String),
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreEngineError {
    #[error("missing required input '{0}'")]
    MissingInputs(String),
    #[error("step '{task_id}' failed: {message}")]
    StepFailed { task_id: String, message: String },
    #[error("component '{0}' is not registered")]
    UnknownComponent(String),
    #[error("pipeline parameter '{0}' has no default and no argument")]
    MissingParameter(String),
    #[error("argument '{0}' does not match any pipeline parameter")]
    UnknownArgument(String),
    #[error("step panicked: {0}")]
    Panicked(String),
    #[error("internal: {0}")]
    Internal(String),
}
