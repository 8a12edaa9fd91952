use serde::{Deserialize, Serialize};

/// Estado de una tarea durante una ejecución local.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Running`
/// - `Running` -> `FinishedOk`
/// - `Running` -> `Failed`
/// - `Pending` -> `Skipped` (una dependencia falló)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// La tarea está pendiente de ejecución.
    Pending,
    /// La tarea está en ejecución.
    Running,
    /// La tarea finalizó correctamente.
    FinishedOk,
    /// La tarea falló.
    Failed,
    /// La tarea no se ejecutó porque el run se detuvo antes.
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::FinishedOk | StepStatus::Failed | StepStatus::Skipped)
    }
}
