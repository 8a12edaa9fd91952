//! Definición inmutable de un pipeline.
//!
//! Sólo se obtiene a través de `PipelineBuilder::build`, que valida el
//! cableado completo. Una `PipelineDefinition` existente es por lo tanto
//! siempre un DAG con todas sus referencias resueltas.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::graph::DependencyGraph;
use crate::component::ComponentSpec;
use crate::hashing::hash_value;

/// Origen del valor de un input, ya resuelto a ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InputBinding {
    Constant(String),
    Parameter(String),
    TaskOutput(String),
}

/// Parámetro de pipeline (string) con default opcional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub default: Option<String>,
}

/// Una invocación de componente dentro del pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: String,
    pub component: String,
    /// En el orden de inputs del componente.
    pub inputs: IndexMap<String, InputBinding>,
    /// Dependencias explícitas sin paso de datos.
    pub after: Vec<String>,
}

impl TaskSpec {
    /// Tareas de las que depende (por datos o por `after`), sin duplicados.
    pub fn upstream(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let from_inputs = self.inputs.values().filter_map(|b| match b {
                                                  InputBinding::TaskOutput(t) => Some(t.as_str()),
                                                  _ => None,
                                              });
        for t in from_inputs.chain(self.after.iter().map(String::as_str)) {
            if !out.contains(&t) {
                out.push(t);
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct PipelineDefinition {
    name: String,
    description: String,
    parameters: IndexMap<String, ParameterSpec>,
    components: IndexMap<String, ComponentSpec>,
    tasks: IndexMap<String, TaskSpec>,
    output: Option<String>,
    graph: DependencyGraph,
    definition_hash: String,
}

impl PipelineDefinition {
    pub(crate) fn new(name: String,
                      description: String,
                      parameters: IndexMap<String, ParameterSpec>,
                      components: IndexMap<String, ComponentSpec>,
                      tasks: IndexMap<String, TaskSpec>,
                      output: Option<String>,
                      graph: DependencyGraph)
                      -> Self {
        let structure = json!({
            "name": name,
            "description": description,
            "parameters": parameters.values().collect::<Vec<_>>(),
            "components": components.values().collect::<Vec<_>>(),
            "tasks": tasks.values().collect::<Vec<_>>(),
            "output": output,
        });
        let definition_hash = hash_value(&structure);
        Self { name,
               description,
               parameters,
               components,
               tasks,
               output,
               graph,
               definition_hash }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.values()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.get(name)
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components.values()
    }

    pub fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.get(name)
    }

    /// Tareas en orden de declaración.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.values()
    }

    pub fn task(&self, id: &str) -> Option<&TaskSpec> {
        self.tasks.get(id)
    }

    /// Tarea cuyo output es el output del pipeline.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn definition_hash(&self) -> &str {
        &self.definition_hash
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
