use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use super::{StepContext, StepRunResult};
use crate::constants::DEFAULT_BASE_IMAGE;
use crate::errors::CoreEngineError;

/// Metadata de un componente tal como la ve el executor externo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub name: String,
    pub description: String,
    pub base_image: String,
    /// Nombres de input en orden de declaración.
    pub inputs: Vec<String>,
}

/// Trait que define un componente. Implementaciones deben ser puras respecto a sus inputs.
pub trait ComponentDefinition: Send + Sync {
    /// Identificador estable y único dentro del registry.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Imagen de contenedor que el executor externo usará para este componente.
    fn base_image(&self) -> &str {
        DEFAULT_BASE_IMAGE
    }

    /// Inputs declarados, en orden.
    fn input_names(&self) -> Vec<String>;

    /// Ejecución pura. Sólo puede leer `ctx`.
    fn run(&self, ctx: &StepContext) -> StepRunResult;

    fn spec(&self) -> ComponentSpec {
        ComponentSpec { name: self.name().to_string(),
                        description: self.description().to_string(),
                        base_image: self.base_image().to_string(),
                        inputs: self.input_names() }
    }
}

/// Ejecuta `component` y convierte un panic en `Failure { Panicked }`: el fallo
/// queda confinado a esta invocación.
pub fn run_contained<C>(component: &C, ctx: &StepContext) -> StepRunResult
    where C: ComponentDefinition + ?Sized
{
    match catch_unwind(AssertUnwindSafe(|| component.run(ctx))) {
        Ok(result) => result,
        Err(payload) => StepRunResult::Failure { error: CoreEngineError::Panicked(panic_message(payload.as_ref())) },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_component_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}
