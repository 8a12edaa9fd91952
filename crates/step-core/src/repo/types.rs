//! Estado reconstruido de un run (`RunInstance`).
//!
//! El repositorio aplica un replay lineal: consume eventos en orden y
//! actualiza el slot de cada tarea. No guarda outputs completos (sólo hashes).
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::component::StepStatus;
use crate::event::{RunEvent, RunEventKind};
use crate::pipeline::PipelineDefinition;

#[derive(Debug, Clone, PartialEq)]
pub struct RunInstance {
    pub id: Uuid,
    pub steps: Vec<StepSlot>,
    pub completed: bool,
    pub failed: bool,
}

impl RunInstance {
    pub fn slot(&self, task_id: &str) -> Option<&StepSlot> {
        self.steps.iter().find(|s| s.task_id == task_id)
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

/// Estado de una tarea en la instancia.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSlot {
    pub task_id: String,
    pub status: StepStatus,
    pub output_hash: Option<String>,
    pub fingerprint: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Trait para reconstruir (`replay`) el estado de un run a partir de eventos.
pub trait RunRepository {
    fn load(&self, run_id: Uuid, events: &[RunEvent], definition: &PipelineDefinition) -> RunInstance;
}

#[derive(Debug, Default)]
pub struct InMemoryRunRepository;

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self
    }
}

impl RunRepository for InMemoryRunRepository {
    fn load(&self, run_id: Uuid, events: &[RunEvent], definition: &PipelineDefinition) -> RunInstance {
        let mut steps: Vec<StepSlot> = definition.tasks()
                                                 .map(|t| StepSlot { task_id: t.id.clone(),
                                                                     status: StepStatus::Pending,
                                                                     output_hash: None,
                                                                     fingerprint: None,
                                                                     started_at: None,
                                                                     finished_at: None })
                                                 .collect();
        let mut completed = false;
        let mut failed = false;
        for ev in events {
            match &ev.kind {
                RunEventKind::RunInitialized { .. } => {}
                RunEventKind::StepStarted { task_id } => {
                    if let Some(slot) = steps.iter_mut().find(|s| &s.task_id == task_id) {
                        slot.status = StepStatus::Running;
                        slot.started_at = Some(ev.ts);
                    }
                }
                RunEventKind::StepFinished { task_id,
                                             output_hash,
                                             fingerprint } => {
                    if let Some(slot) = steps.iter_mut().find(|s| &s.task_id == task_id) {
                        slot.status = StepStatus::FinishedOk;
                        slot.output_hash = Some(output_hash.clone());
                        slot.fingerprint = Some(fingerprint.clone());
                        slot.finished_at = Some(ev.ts);
                    }
                }
                RunEventKind::StepFailed { task_id, .. } => {
                    if let Some(slot) = steps.iter_mut().find(|s| &s.task_id == task_id) {
                        slot.status = StepStatus::Failed;
                        slot.finished_at = Some(ev.ts);
                    }
                }
                RunEventKind::StepSkipped { task_id, .. } => {
                    if let Some(slot) = steps.iter_mut().find(|s| &s.task_id == task_id) {
                        slot.status = StepStatus::Skipped;
                    }
                }
                RunEventKind::RunCompleted { .. } => completed = true,
                RunEventKind::RunFailed { .. } => failed = true,
            }
        }
        RunInstance { id: run_id,
                      steps,
                      completed,
                      failed }
    }
}
