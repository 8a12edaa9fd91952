use indexmap::IndexMap;

use crate::errors::CoreEngineError;

/// Contexto de ejecución entregado a `ComponentDefinition::run`.
#[derive(Debug, Clone, Default)]
pub struct StepContext {
    pub task_id: String,
    pub inputs: IndexMap<String, String>, // valores ya resueltos, en orden de declaración
}

impl StepContext {
    pub fn new(task_id: impl Into<String>, inputs: IndexMap<String, String>) -> Self {
        Self { task_id: task_id.into(),
               inputs }
    }

    pub fn input(&self, name: &str) -> Result<&str, CoreEngineError> {
        self.inputs
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| CoreEngineError::MissingInputs(name.to_string()))
    }
}
