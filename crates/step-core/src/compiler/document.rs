//! Documento de workflow declarativo.
//!
//! Forma inspirada en la representación intermedia v2 de la plataforma
//! externa: componentes, executors (contenedor por componente) y un DAG raíz
//! con las tareas, sus inputs y `dependentTasks`. Todos los mapas son
//! `BTreeMap` para que la serialización sea determinista.
//!
//! Los enums de binding se modelan como structs con campos opcionales: YAML
//! no tiene una representación natural para enums externamente etiquetados.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{CompileError, DefinitionError};
use crate::pipeline::DependencyGraph;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    pub pipeline_info: PipelineInfo,
    pub schema_version: String,
    pub sdk_version: String,
    pub definition_hash: String,
    pub components: BTreeMap<String, ComponentEntry>,
    pub deployment_spec: DeploymentSpec,
    pub root: RootSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentEntry {
    pub executor_label: String,
    #[serde(default, skip_serializing_if = "ParameterDefinitions::is_empty")]
    pub input_definitions: ParameterDefinitions,
    #[serde(default, skip_serializing_if = "ParameterDefinitions::is_empty")]
    pub output_definitions: ParameterDefinitions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDefinitions {
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterType>,
}

impl ParameterDefinitions {
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterType {
    pub parameter_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ParameterType {
    pub fn string(default_value: Option<String>) -> Self {
        Self { parameter_type: "STRING".to_string(),
               default_value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub executors: BTreeMap<String, ExecutorSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorSpec {
    pub container: ContainerSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootSpec {
    pub dag: DagSpec,
    #[serde(default, skip_serializing_if = "ParameterDefinitions::is_empty")]
    pub input_definitions: ParameterDefinitions,
    #[serde(default, skip_serializing_if = "ParameterDefinitions::is_empty")]
    pub output_definitions: ParameterDefinitions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagSpec {
    pub tasks: BTreeMap<String, DagTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<DagOutputs>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DagTask {
    pub component_ref: NameRef,
    pub task_info: NameRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependent_tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "TaskInputs::is_empty")]
    pub inputs: TaskInputs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInputs {
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterBinding>,
}

impl TaskInputs {
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// Exactamente uno de los campos está presente.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_value: Option<RuntimeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_input_parameter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_output_parameter: Option<TaskOutputParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeValue {
    pub constant: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutputParameter {
    pub producer_task: String,
    pub output_parameter_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagOutputs {
    pub parameters: BTreeMap<String, DagOutputParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DagOutputParameter {
    pub value_from_parameter: ValueFromParameter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueFromParameter {
    pub producer_subtask: String,
    pub output_parameter_key: String,
}

impl WorkflowDocument {
    pub fn to_yaml(&self) -> Result<String, CompileError> {
        serde_yaml::to_string(self).map_err(|e| CompileError::Serialize(e.to_string()))
    }

    pub fn from_yaml(text: &str) -> Result<Self, CompileError> {
        serde_yaml::from_str(text).map_err(|e| CompileError::Serialize(e.to_string()))
    }

    pub fn task_ids(&self) -> Vec<&str> {
        self.root.dag.tasks.keys().map(String::as_str).collect()
    }

    /// Tarea que produce el output del pipeline, si lo hay.
    pub fn output_task(&self) -> Option<&str> {
        self.root
            .dag
            .outputs
            .as_ref()
            .and_then(|o| o.parameters.values().next())
            .map(|p| p.value_from_parameter.producer_subtask.as_str())
    }

    /// Reconstruye el grafo a partir de `dependentTasks` y de los productores
    /// referenciados por los inputs. Un documento con referencias colgantes o
    /// ciclos es inválido aunque haya sido escrito a mano.
    pub fn graph(&self) -> Result<DependencyGraph, DefinitionError> {
        for (id, task) in &self.root.dag.tasks {
            let component = self.components
                                .get(&task.component_ref.name)
                                .ok_or_else(|| DefinitionError::UnknownComponent(format!("{} (task '{}')", task.component_ref.name, id)))?;
            self.check_bindings(id, task, component)?;
        }
        let nodes = self.root.dag.tasks.iter().map(|(id, task)| {
                                                   let mut ups: Vec<&str> = task.dependent_tasks.iter().map(String::as_str).collect();
                                                   for b in task.inputs.parameters.values() {
                                                       if let Some(t) = &b.task_output_parameter {
                                                           ups.push(t.producer_task.as_str());
                                                       }
                                                   }
                                                   (id.clone(), ups)
                                               });
        let graph = DependencyGraph::new(nodes)?;
        if let Some(out) = self.output_task() {
            if !graph.contains(out) {
                return Err(DefinitionError::UnknownTask { referrer: "pipeline output".into(),
                                                          task: out.to_string() });
            }
        }
        Ok(graph)
    }

    /// Cada input del componente ligado exactamente una vez y cada
    /// `componentInputParameter` declarado en `root.inputDefinitions`.
    fn check_bindings(&self, id: &str, task: &DagTask, component: &ComponentEntry) -> Result<(), DefinitionError> {
        let declared = &component.input_definitions.parameters;
        if let Some(input) = task.inputs.parameters.keys().find(|k| !declared.contains_key(*k)) {
            return Err(DefinitionError::UnexpectedInput { task: id.to_string(),
                                                          input: input.clone() });
        }
        if let Some(input) = declared.keys().find(|k| !task.inputs.parameters.contains_key(*k)) {
            return Err(DefinitionError::MissingInput { task: id.to_string(),
                                                       input: input.clone() });
        }
        for binding in task.inputs.parameters.values() {
            if let Some(p) = &binding.component_input_parameter {
                if !self.root.input_definitions.parameters.contains_key(p) {
                    return Err(DefinitionError::UnknownParameter { task: id.to_string(),
                                                                   parameter: p.clone() });
                }
            }
        }
        Ok(())
    }
}
