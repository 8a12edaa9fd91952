//! Definición de pipelines: handles, builder, definición validada y grafo.

pub mod builder;
pub mod definition;
pub mod graph;
pub mod handle;

pub use builder::{is_pipeline_name, PipelineBuilder};
pub use definition::{InputBinding, ParameterSpec, PipelineDefinition, TaskSpec};
pub use graph::DependencyGraph;
pub use handle::{InputValue, OutputHandle, TaskHandle, NO_INPUTS};
