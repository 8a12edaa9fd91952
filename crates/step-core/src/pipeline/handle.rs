//! Handles simbólicos usados al cablear un pipeline.
//!
//! En tiempo de definición ningún step se ejecuta: `task.output()` no es un
//! valor sino una referencia a "el output que producirá esa tarea". El builder
//! la convierte en una arista del grafo al construir la definición.

use uuid::Uuid;

/// Referencia al output (aún no calculado) de una tarea.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputHandle {
    pub(crate) builder_id: Uuid,
    pub(crate) task_id: String,
}

impl OutputHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

/// Tarea declarada en un `PipelineBuilder`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub(crate) builder_id: Uuid,
    pub(crate) task_id: String,
}

impl TaskHandle {
    pub fn id(&self) -> &str {
        &self.task_id
    }

    pub fn output(&self) -> OutputHandle {
        OutputHandle { builder_id: self.builder_id,
                       task_id: self.task_id.clone() }
    }
}

/// Valor ligado a un input de tarea al declarar el pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputValue {
    /// Literal fijado en la definición.
    Constant(String),
    /// Parámetro de pipeline, resuelto al lanzar el run.
    Parameter(String),
    /// Output de otra tarea.
    Output(OutputHandle),
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        InputValue::Constant(s.to_string())
    }
}

impl From<String> for InputValue {
    fn from(s: String) -> Self {
        InputValue::Constant(s)
    }
}

impl From<OutputHandle> for InputValue {
    fn from(h: OutputHandle) -> Self {
        InputValue::Output(h)
    }
}

impl From<&OutputHandle> for InputValue {
    fn from(h: &OutputHandle) -> Self {
        InputValue::Output(h.clone())
    }
}

/// Conveniencia para tareas sin inputs: `builder.task(&StepA, NO_INPUTS)`.
pub const NO_INPUTS: [(&str, InputValue); 0] = [];
