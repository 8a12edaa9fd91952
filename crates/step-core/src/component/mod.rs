//! Componentes: la unidad de trabajo de un pipeline.
//!
//! Un componente es una función pura de 0..n inputs string a un único output
//! string. El único efecto observable permitido es logging de diagnóstico.
//! Este módulo define:
//! - `ComponentDefinition`: interfaz neutral usada por builder, compilador y
//!   runner local.
//! - `ComponentSpec`: metadata (imagen, inputs) que se registra y compila.
//! - `StepContext` y `StepRunResult` para la ejecución.
//! - `FnComponent` y la macro `component!` para declarar componentes sin
//!   boilerplate.

pub mod definition;
pub mod function;
pub mod macros;
mod context;
mod run_result;
mod status;

pub use context::StepContext;
pub use definition::{is_component_name, run_contained, ComponentDefinition, ComponentSpec};
pub use function::FnComponent;
pub use run_result::StepRunResult;
pub use status::StepStatus;
