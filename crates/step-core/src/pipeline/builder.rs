//! Builder para `PipelineDefinition`.
//!
//! Declarar el pipeline es cablear, no ejecutar: `task` registra una
//! invocación y devuelve un `TaskHandle` cuyo `output()` puede pasarse como
//! input de la siguiente tarea. Todos los errores de cableado se acumulan y se
//! reportan en `build`, que es el único punto donde nace una definición.
//!
//! ```ignore
//! let mut p = PipelineBuilder::new("hello-pipeline-v2");
//! let recipient = p.parameter("recipient", Some("World"));
//! let hello = p.task(&SayHello::new(), [("name", recipient)]);
//! let processed = p.task(&ProcessGreeting::new(), [("greeting", hello.output())]);
//! p.output(processed.output());
//! let definition = p.build()?;
//! ```

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;
use uuid::Uuid;

use super::definition::{InputBinding, ParameterSpec, PipelineDefinition, TaskSpec};
use super::graph::DependencyGraph;
use super::handle::{InputValue, OutputHandle, TaskHandle};
use crate::component::{ComponentDefinition, ComponentSpec};
use crate::errors::DefinitionError;

struct PendingTask {
    component: String,
    inputs: Vec<(String, InputValue)>,
    after: Vec<(String, Option<Uuid>)>,
}

pub struct PipelineBuilder {
    id: Uuid,
    name: String,
    description: String,
    parameters: IndexMap<String, ParameterSpec>,
    components: IndexMap<String, ComponentSpec>,
    tasks: IndexMap<String, PendingTask>,
    output: Option<OutputHandle>,
    errors: Vec<DefinitionError>,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(),
               name: name.into(),
               description: String::new(),
               parameters: IndexMap::new(),
               components: IndexMap::new(),
               tasks: IndexMap::new(),
               output: None,
               errors: Vec::new() }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declara un parámetro de pipeline y devuelve la referencia para ligarlo
    /// a inputs.
    pub fn parameter(&mut self, name: &str, default: Option<&str>) -> InputValue {
        if self.parameters.contains_key(name) {
            self.errors.push(DefinitionError::DuplicateParameter(name.to_string()));
        } else {
            self.parameters.insert(name.to_string(),
                                   ParameterSpec { name: name.to_string(),
                                                   default: default.map(str::to_string) });
        }
        InputValue::Parameter(name.to_string())
    }

    /// Declara una invocación de `component`. El id de tarea se deriva del
    /// nombre del componente (`say_hello` -> `say-hello`, luego `say-hello-2`, ...).
    pub fn task<C, I, K, V>(&mut self, component: &C, bindings: I) -> TaskHandle
        where C: ComponentDefinition + ?Sized,
              I: IntoIterator<Item = (K, V)>,
              K: Into<String>,
              V: Into<InputValue>
    {
        let spec = component.spec();
        match self.components.get(&spec.name) {
            Some(existing) if *existing != spec => {
                self.errors.push(DefinitionError::DuplicateComponent(spec.name.clone()));
            }
            Some(_) => {}
            None => {
                self.components.insert(spec.name.clone(), spec.clone());
            }
        }

        let task_id = self.next_task_id(&spec.name);
        let inputs = bindings.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        debug!("pipeline '{}': declare task '{}' ({})", self.name, task_id, spec.name);
        self.tasks.insert(task_id.clone(),
                          PendingTask { component: spec.name,
                                        inputs,
                                        after: Vec::new() });
        TaskHandle { builder_id: self.id,
                     task_id }
    }

    /// `task` corre después de `upstream` aunque no consuma su output.
    pub fn after(&mut self, task: &TaskHandle, upstream: &TaskHandle) -> &mut Self {
        self.push_after(task, upstream.task_id.clone(), Some(upstream.builder_id));
        self
    }

    /// Igual que `after` pero por id; el id se valida en `build`.
    pub fn after_id(&mut self, task: &TaskHandle, upstream_id: &str) -> &mut Self {
        self.push_after(task, upstream_id.to_string(), None);
        self
    }

    fn push_after(&mut self, task: &TaskHandle, upstream: String, builder: Option<Uuid>) {
        match self.tasks.get_mut(&task.task_id) {
            Some(pending) if task.builder_id == self.id => pending.after.push((upstream, builder)),
            _ => self.errors.push(DefinitionError::ForeignHandle { task: task.task_id.clone(),
                                                                   producer: upstream }),
        }
    }

    /// Designa el output del pipeline.
    pub fn output(&mut self, handle: OutputHandle) -> &mut Self {
        self.output = Some(handle);
        self
    }

    fn next_task_id(&self, component: &str) -> String {
        let base = component.to_ascii_lowercase().replace('_', "-");
        let base = base.trim_matches('-').to_string();
        let base = if base.is_empty() { "task".to_string() } else { base };
        if !self.tasks.contains_key(&base) {
            return base;
        }
        (2..).map(|n| format!("{base}-{n}"))
             .find(|candidate| !self.tasks.contains_key(candidate))
             .unwrap_or(base)
    }

    /// Valida el cableado y produce la definición. El primer error encontrado
    /// se reporta; no se produce definición parcial.
    pub fn build(self) -> Result<PipelineDefinition, DefinitionError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        if !is_pipeline_name(&self.name) {
            return Err(DefinitionError::InvalidName(self.name));
        }
        if self.tasks.is_empty() {
            return Err(DefinitionError::EmptyPipeline(self.name));
        }

        let mut tasks: IndexMap<String, TaskSpec> = IndexMap::with_capacity(self.tasks.len());
        for (task_id, pending) in &self.tasks {
            let spec = self.components
                           .get(&pending.component)
                           .ok_or_else(|| DefinitionError::UnknownComponent(pending.component.clone()))?;
            let task = resolve_task(self.id, task_id, pending, spec, &self.parameters, &self.tasks)?;
            tasks.insert(task_id.clone(), task);
        }

        let graph = DependencyGraph::new(tasks.values().map(|t| (t.id.clone(), t.upstream())))?;

        let output = match self.output {
            Some(h) => {
                if h.builder_id != self.id {
                    return Err(DefinitionError::ForeignHandle { task: "pipeline output".into(),
                                                                producer: h.task_id });
                }
                if !tasks.contains_key(&h.task_id) {
                    return Err(DefinitionError::UnknownTask { referrer: "pipeline output".into(),
                                                              task: h.task_id });
                }
                Some(h.task_id)
            }
            // Sin output explícito: si hay un único terminal, su output es el del pipeline.
            None => match graph.terminals().as_slice() {
                [only] => Some(only.to_string()),
                _ => None,
            },
        };

        debug!("pipeline '{}': built {} tasks, {} edges", self.name, tasks.len(), graph.edges().len());
        Ok(PipelineDefinition::new(self.name,
                                   self.description,
                                   self.parameters,
                                   self.components,
                                   tasks,
                                   output,
                                   graph))
    }
}

fn resolve_task(builder_id: Uuid,
                task_id: &str,
                pending: &PendingTask,
                spec: &ComponentSpec,
                parameters: &IndexMap<String, ParameterSpec>,
                declared: &IndexMap<String, PendingTask>)
                -> Result<TaskSpec, DefinitionError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for (input, _) in &pending.inputs {
        if !spec.inputs.contains(input) || !seen.insert(input.as_str()) {
            return Err(DefinitionError::UnexpectedInput { task: task_id.to_string(),
                                                          input: input.clone() });
        }
    }

    let mut inputs = IndexMap::with_capacity(spec.inputs.len());
    for input in &spec.inputs {
        let value = pending.inputs
                           .iter()
                           .find(|(k, _)| k == input)
                           .map(|(_, v)| v)
                           .ok_or_else(|| DefinitionError::MissingInput { task: task_id.to_string(),
                                                                          input: input.clone() })?;
        let binding = match value {
            InputValue::Constant(c) => InputBinding::Constant(c.clone()),
            InputValue::Parameter(p) => {
                if !parameters.contains_key(p) {
                    return Err(DefinitionError::UnknownParameter { task: task_id.to_string(),
                                                                   parameter: p.clone() });
                }
                InputBinding::Parameter(p.clone())
            }
            InputValue::Output(h) => {
                if h.builder_id != builder_id {
                    return Err(DefinitionError::ForeignHandle { task: task_id.to_string(),
                                                                producer: h.task_id.clone() });
                }
                if !declared.contains_key(&h.task_id) {
                    return Err(DefinitionError::UnknownTask { referrer: task_id.to_string(),
                                                              task: h.task_id.clone() });
                }
                InputBinding::TaskOutput(h.task_id.clone())
            }
        };
        inputs.insert(input.clone(), binding);
    }

    let mut after = Vec::with_capacity(pending.after.len());
    for (upstream, origin) in &pending.after {
        if origin.is_some_and(|b| b != builder_id) {
            return Err(DefinitionError::ForeignHandle { task: task_id.to_string(),
                                                        producer: upstream.clone() });
        }
        if !declared.contains_key(upstream) {
            return Err(DefinitionError::UnknownTask { referrer: task_id.to_string(),
                                                      task: upstream.clone() });
        }
        if !after.contains(upstream) {
            after.push(upstream.clone());
        }
    }

    Ok(TaskSpec { id: task_id.to_string(),
                  component: spec.name.clone(),
                  inputs,
                  after })
}

/// `[a-z0-9][a-z0-9-]*`
pub fn is_pipeline_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::FnComponent;
    use crate::pipeline::NO_INPUTS;

    fn source(name: &str) -> FnComponent {
        let n = name.to_string();
        FnComponent::new(name, &[], move |_| Ok(n.clone()))
    }

    fn unary(name: &str, input: &str) -> FnComponent {
        let key = input.to_string();
        FnComponent::new(name, &[input], move |ctx| Ok(ctx.input(&key)?.to_string()))
    }

    #[test]
    fn repeated_component_gets_suffixed_ids() {
        let mut p = PipelineBuilder::new("ids");
        let a = p.task(&source("step_a"), NO_INPUTS);
        let b = p.task(&source("step_a"), NO_INPUTS);
        let c = p.task(&source("step_a"), NO_INPUTS);
        assert_eq!((a.id(), b.id(), c.id()), ("step-a", "step-a-2", "step-a-3"));
        let def = p.build().expect("valid");
        assert_eq!(def.len(), 3);
        assert_eq!(def.components().count(), 1);
        assert_eq!(def.component("step_a").map(|c| c.inputs.len()), Some(0));
        assert!(def.component("step-a").is_none());
        // Tres terminales: sin output implícito.
        assert_eq!(def.output(), None);
    }

    #[test]
    fn missing_and_unexpected_inputs_are_rejected() {
        let mut p = PipelineBuilder::new("missing");
        p.task(&unary("echo", "text"), NO_INPUTS);
        assert_eq!(p.build().unwrap_err(),
                   DefinitionError::MissingInput { task: "echo".into(),
                                                   input: "text".into() });

        let mut p = PipelineBuilder::new("unexpected");
        p.task(&unary("echo", "text"), [("text", "a"), ("other", "b")]);
        assert_eq!(p.build().unwrap_err(),
                   DefinitionError::UnexpectedInput { task: "echo".into(),
                                                      input: "other".into() });
    }

    #[test]
    fn unknown_parameter_and_duplicate_parameter() {
        let mut p = PipelineBuilder::new("params");
        p.task(&unary("echo", "text"), [("text", InputValue::Parameter("nope".into()))]);
        assert_eq!(p.build().unwrap_err(),
                   DefinitionError::UnknownParameter { task: "echo".into(),
                                                       parameter: "nope".into() });

        let mut p = PipelineBuilder::new("params");
        p.parameter("x", None);
        p.parameter("x", Some("1"));
        p.task(&source("s"), NO_INPUTS);
        assert_eq!(p.build().unwrap_err(), DefinitionError::DuplicateParameter("x".into()));
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let mut other = PipelineBuilder::new("other");
        let foreign = other.task(&source("s"), NO_INPUTS);

        let mut p = PipelineBuilder::new("main");
        p.task(&unary("echo", "text"), [("text", foreign.output())]);
        assert!(matches!(p.build().unwrap_err(), DefinitionError::ForeignHandle { .. }));
    }

    #[test]
    fn after_id_can_close_a_cycle() {
        let mut p = PipelineBuilder::new("cyclic");
        let a = p.task(&source("a"), NO_INPUTS);
        let b = p.task(&unary("b", "x"), [("x", a.output())]);
        p.after_id(&a, b.id());
        match p.build().unwrap_err() {
            DefinitionError::Cycle { path } => assert_eq!(path, vec!["a", "b", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn after_id_to_undeclared_task_is_rejected() {
        let mut p = PipelineBuilder::new("dangling");
        let a = p.task(&source("a"), NO_INPUTS);
        p.after_id(&a, "ghost");
        assert_eq!(p.build().unwrap_err(),
                   DefinitionError::UnknownTask { referrer: "a".into(),
                                                  task: "ghost".into() });
    }

    #[test]
    fn invalid_and_empty_pipelines() {
        assert_eq!(PipelineBuilder::new("Bad_Name").build().unwrap_err(),
                   DefinitionError::InvalidName("Bad_Name".into()));
        assert_eq!(PipelineBuilder::new("empty").build().unwrap_err(),
                   DefinitionError::EmptyPipeline("empty".into()));
    }

    #[test]
    fn conflicting_component_specs_with_same_name() {
        let mut p = PipelineBuilder::new("conflict");
        p.task(&source("dup"), NO_INPUTS);
        p.task(&unary("dup", "x"), [("x", "1")]);
        assert_eq!(p.build().unwrap_err(), DefinitionError::DuplicateComponent("dup".into()));
    }

    #[test]
    fn definition_hash_ignores_builder_identity() {
        let build = || {
            let mut p = PipelineBuilder::new("stable").description("d");
            let name = p.parameter("name", Some("World"));
            let a = p.task(&unary("greet", "name"), [("name", name)]);
            p.task(&unary("shout", "text"), [("text", a.output())]);
            p.build().expect("valid")
        };
        assert_eq!(build().definition_hash(), build().definition_hash());
    }
}
