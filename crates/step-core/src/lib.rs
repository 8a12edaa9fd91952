//! step-core: declaración, compilación y ejecución local de pipelines.
//!
//! Un pipeline es un DAG de tareas; cada tarea invoca un componente (función
//! de inputs string a un output string). El builder valida el cableado, el
//! compilador emite un documento YAML determinista para un orquestador de
//! contenedores y `LocalRunner` ejecuta la definición en proceso.
pub mod compiler;
pub mod component;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod pipeline;
pub mod registry;
pub mod repo;

pub use compiler::{load_document, Compiler, WorkflowDocument};
pub use component::{run_contained, ComponentDefinition, ComponentSpec, FnComponent, StepContext, StepRunResult, StepStatus};
pub use engine::{LocalRunner, RunOutcome};
pub use errors::{CompileError, CoreEngineError, DefinitionError};
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use pipeline::{DependencyGraph, InputValue, OutputHandle, PipelineBuilder, PipelineDefinition, TaskHandle, NO_INPUTS};
pub use registry::ComponentRegistry;
pub use repo::{InMemoryRunRepository, RunInstance, RunRepository};
