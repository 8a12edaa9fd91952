//! Runner local: ejecuta una `PipelineDefinition` en proceso.
//!
//! No es un scheduler de contenedores. Recorre las waves del grafo en orden;
//! dentro de una wave las tareas corren en el pool de rayon y publican su
//! output en un `DashMap` compartido. La wave siguiente no empieza hasta que
//! todas las de la actual terminaron, así que cada input `TaskOutput` ya está
//! disponible cuando se lee, y se pasa tal cual (byte a byte).
//!
//! Stop-on-failure: la primera wave con un fallo cierra el run. Un panic dentro
//! de un componente cuenta como fallo de esa tarea. Las tareas fallidas reciben
//! `StepFailed`, las que no llegaron a correr `StepSkipped`
//! y el run termina con `RunFailed`.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use log::{debug, error, info};
use rayon::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::component::{run_contained, ComponentDefinition, StepContext, StepRunResult};
use crate::constants::ENGINE_VERSION;
use crate::errors::CoreEngineError;
use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use crate::hashing::{hash_str, hash_value};
use crate::pipeline::{InputBinding, PipelineDefinition};
use crate::registry::ComponentRegistry;
use crate::repo::{InMemoryRunRepository, RunInstance, RunRepository};

/// Resultado de un run exitoso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub run_id: Uuid,
    /// Output de cada tarea, en orden de declaración.
    pub outputs: IndexMap<String, String>,
    pub pipeline_output: Option<String>,
    pub run_fingerprint: String,
}

struct StepResult {
    output: String,
    input_hashes: Vec<String>,
}

pub struct LocalRunner<E = InMemoryEventStore, R = InMemoryRunRepository>
    where E: EventStore,
          R: RunRepository
{
    registry: ComponentRegistry,
    event_store: E,
    repository: R,
    last_run_id: Option<Uuid>,
}

impl LocalRunner<InMemoryEventStore, InMemoryRunRepository> {
    /// Runner con stores en memoria.
    pub fn new(registry: ComponentRegistry) -> Self {
        Self::with_stores(registry, InMemoryEventStore::default(), InMemoryRunRepository::new())
    }
}

impl<E: EventStore> LocalRunner<E, InMemoryRunRepository> {
    pub fn with_store(registry: ComponentRegistry, event_store: E) -> Self {
        Self::with_stores(registry, event_store, InMemoryRunRepository::new())
    }
}

impl<E, R> LocalRunner<E, R>
    where E: EventStore,
          R: RunRepository
{
    pub fn with_stores(registry: ComponentRegistry, event_store: E, repository: R) -> Self {
        Self { registry,
               event_store,
               repository,
               last_run_id: None }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn event_store(&self) -> &E {
        &self.event_store
    }

    pub fn last_run_id(&self) -> Option<Uuid> {
        self.last_run_id
    }

    pub fn events_for(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.event_store.list(run_id)
    }

    /// Estado por tarea reconstruido desde los eventos del run.
    pub fn instance(&self, run_id: Uuid, definition: &PipelineDefinition) -> RunInstance {
        let events = self.event_store.list(run_id);
        self.repository.load(run_id, &events, definition)
    }

    /// Variante compacta de los eventos de un run.
    pub fn event_variants(&self, run_id: Uuid) -> Vec<&'static str> {
        self.event_store
            .list(run_id)
            .iter()
            .map(|e| match e.kind {
                RunEventKind::RunInitialized { .. } => "I",
                RunEventKind::StepStarted { .. } => "S",
                RunEventKind::StepFinished { .. } => "F",
                RunEventKind::StepFailed { .. } => "X",
                RunEventKind::StepSkipped { .. } => "K",
                RunEventKind::RunCompleted { .. } => "C",
                RunEventKind::RunFailed { .. } => "R",
            })
            .collect()
    }

    /// Ejecuta el pipeline completo. `arguments` sobrescribe defaults de
    /// parámetros.
    pub fn run(&mut self,
               definition: &PipelineDefinition,
               arguments: &IndexMap<String, String>)
               -> Result<RunOutcome, CoreEngineError> {
        let parameters = resolve_parameters(definition, arguments)?;

        let mut components: HashMap<&str, Arc<dyn ComponentDefinition>> = HashMap::new();
        for task in definition.tasks() {
            let c = self.registry
                        .get(&task.component)
                        .ok_or_else(|| CoreEngineError::UnknownComponent(task.component.clone()))?;
            components.insert(task.id.as_str(), c);
        }

        let run_id = Uuid::new_v4();
        self.last_run_id = Some(run_id);
        info!("run {}: pipeline '{}' started ({} tasks)", run_id, definition.name(), definition.len());
        self.event_store
            .append_kind(run_id,
                         RunEventKind::RunInitialized { pipeline: definition.name().to_string(),
                                                        definition_hash: definition.definition_hash().to_string(),
                                                        task_count: definition.len() });

        let outputs: DashMap<String, String> = DashMap::new();
        let mut step_fingerprints: Vec<String> = Vec::with_capacity(definition.len());

        for (wave_idx, wave) in definition.graph().waves().into_iter().enumerate() {
            debug!("run {}: wave {} -> {:?}", run_id, wave_idx, wave);
            for task_id in &wave {
                self.event_store
                    .append_kind(run_id, RunEventKind::StepStarted { task_id: task_id.to_string() });
            }

            // `collect` sobre un par_iter indexado conserva el orden de la wave.
            let results: Vec<(&str, Result<StepResult, CoreEngineError>)> =
                wave.par_iter()
                    .map(|&task_id| {
                        let res = execute_task(definition, task_id, &components, &parameters, &outputs);
                        if let Ok(r) = &res {
                            outputs.insert(task_id.to_string(), r.output.clone());
                        }
                        (task_id, res)
                    })
                    .collect();

            let mut first_failure: Option<(String, CoreEngineError)> = None;
            for (task_id, res) in results {
                match res {
                    Ok(step) => {
                        let output_hash = hash_str(&step.output);
                        let fingerprint = step_fingerprint(definition, task_id, &step.input_hashes, &output_hash);
                        debug!("run {}: step '{}' finished ({} bytes)", run_id, task_id, step.output.len());
                        self.event_store.append_kind(run_id,
                                                     RunEventKind::StepFinished { task_id: task_id.to_string(),
                                                                                  output_hash,
                                                                                  fingerprint: fingerprint.clone() });
                        step_fingerprints.push(fingerprint);
                    }
                    Err(err) => {
                        error!("run {}: step '{}' failed: {}", run_id, task_id, err);
                        self.event_store.append_kind(run_id,
                                                     RunEventKind::StepFailed { task_id: task_id.to_string(),
                                                                                error: err.clone() });
                        if first_failure.is_none() {
                            first_failure = Some((task_id.to_string(), err));
                        }
                    }
                }
            }

            if let Some((failed_task, err)) = first_failure {
                return Err(self.abort_run(run_id, definition, failed_task, err, wave_idx));
            }
        }

        let run_fingerprint = hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "definition_hash": definition.definition_hash(),
            "step_fingerprints": step_fingerprints,
        }));
        self.event_store
            .append_kind(run_id, RunEventKind::RunCompleted { run_fingerprint: run_fingerprint.clone() });

        let ordered: IndexMap<String, String> =
            definition.tasks()
                      .filter_map(|t| outputs.get(&t.id).map(|o| (t.id.clone(), o.value().clone())))
                      .collect();
        let pipeline_output = definition.output().and_then(|t| ordered.get(t).cloned());
        info!("run {}: pipeline '{}' completed", run_id, definition.name());
        Ok(RunOutcome { run_id,
                        outputs: ordered,
                        pipeline_output,
                        run_fingerprint })
    }

    fn abort_run(&mut self,
                 run_id: Uuid,
                 definition: &PipelineDefinition,
                 failed_task: String,
                 err: CoreEngineError,
                 wave_idx: usize)
                 -> CoreEngineError {
        let waves = definition.graph().waves();
        let mut skipped = 0usize;
        for later in waves.iter().skip(wave_idx + 1).flatten() {
            self.event_store.append_kind(run_id,
                                         RunEventKind::StepSkipped { task_id: later.to_string(),
                                                                     blocked_by: failed_task.clone() });
            skipped += 1;
        }
        self.event_store
            .append_kind(run_id, RunEventKind::RunFailed { task_id: failed_task.clone() });
        info!("run {}: pipeline '{}' stopped at '{}' ({} skipped)",
              run_id,
              definition.name(),
              failed_task,
              skipped);
        match err {
            e @ CoreEngineError::StepFailed { .. } => e,
            other => CoreEngineError::StepFailed { task_id: failed_task,
                                                   message: other.to_string() },
        }
    }
}

fn resolve_parameters(definition: &PipelineDefinition,
                      arguments: &IndexMap<String, String>)
                      -> Result<HashMap<String, String>, CoreEngineError> {
    if let Some(unknown) = arguments.keys().find(|k| definition.parameter(k).is_none()) {
        return Err(CoreEngineError::UnknownArgument(unknown.clone()));
    }
    definition.parameters()
              .map(|p| {
                  arguments.get(&p.name)
                           .or(p.default.as_ref())
                           .map(|v| (p.name.clone(), v.clone()))
                           .ok_or_else(|| CoreEngineError::MissingParameter(p.name.clone()))
              })
              .collect()
}

fn execute_task(definition: &PipelineDefinition,
                task_id: &str,
                components: &HashMap<&str, Arc<dyn ComponentDefinition>>,
                parameters: &HashMap<String, String>,
                outputs: &DashMap<String, String>)
                -> Result<StepResult, CoreEngineError> {
    let task = definition.task(task_id)
                         .ok_or_else(|| CoreEngineError::Internal(format!("task '{task_id}' not in definition")))?;
    let component = components.get(task_id)
                              .ok_or_else(|| CoreEngineError::UnknownComponent(task.component.clone()))?;

    let mut inputs = IndexMap::with_capacity(task.inputs.len());
    for (name, binding) in &task.inputs {
        let value = match binding {
            InputBinding::Constant(c) => c.clone(),
            InputBinding::Parameter(p) => parameters.get(p)
                                                    .cloned()
                                                    .ok_or_else(|| CoreEngineError::MissingParameter(p.clone()))?,
            InputBinding::TaskOutput(producer) => outputs.get(producer)
                                                         .map(|o| o.value().clone())
                                                         .ok_or_else(|| {
                                                             CoreEngineError::Internal(format!("output of '{producer}' not available for '{task_id}'"))
                                                         })?,
        };
        inputs.insert(name.clone(), value);
    }
    let input_hashes: Vec<String> = inputs.values().map(|v| hash_str(v)).collect();

    let ctx = StepContext::new(task_id, inputs);
    match run_contained(&**component, &ctx) {
        StepRunResult::Success { output } => Ok(StepResult { output,
                                                             input_hashes }),
        StepRunResult::Failure { error } => Err(CoreEngineError::StepFailed { task_id: task_id.to_string(),
                                                                              message: error.to_string() }),
    }
}

fn step_fingerprint(definition: &PipelineDefinition, task_id: &str, input_hashes: &[String], output_hash: &str) -> String {
    hash_value(&json!({
        "engine_version": ENGINE_VERSION,
        "definition_hash": definition.definition_hash(),
        "task_id": task_id,
        "input_hashes": input_hashes,
        "output_hash": output_hash,
    }))
}
