//! Tipos de evento de un run local y estructura `RunEvent`.
//!
//! Rol:
//! - Cada ejecución del `LocalRunner` emite eventos a un `EventStore`
//!   append-only.
//! - Estos eventos permiten reconstruir el estado por tarea (replay) sin
//!   depender de estructuras mutables compartidas.
//! - El orden de eventos dentro de una wave sigue el orden de declaración,
//!   independientemente del scheduling de threads.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreEngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de un `run_id`: fija la definición ejecutada.
    RunInitialized { pipeline: String, definition_hash: String, task_count: usize },
    /// Una tarea comenzó. No implica éxito.
    StepStarted { task_id: String },
    /// Una tarea terminó; el output viaja como hash (el valor queda en el outcome).
    StepFinished { task_id: String, output_hash: String, fingerprint: String },
    StepFailed { task_id: String, error: CoreEngineError },
    /// La tarea no se ejecutó porque `blocked_by` falló antes.
    StepSkipped { task_id: String, blocked_by: String },
    /// Cierre exitoso con fingerprint agregado (fingerprints de steps en orden topológico).
    RunCompleted { run_fingerprint: String },
    RunFailed { task_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>, // metadato (no entra en fingerprint)
}
