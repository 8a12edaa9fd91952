//! Componente respaldado por un closure.
//!
//! Es la forma "dato plano" de un componente: identificador + metadata +
//! referencia a función. Útil para componentes ad-hoc y en tests.

use std::fmt;
use std::sync::Arc;

use super::{ComponentDefinition, StepContext, StepRunResult};
use crate::constants::DEFAULT_BASE_IMAGE;
use crate::errors::CoreEngineError;

type StepFn = dyn Fn(&StepContext) -> Result<String, CoreEngineError> + Send + Sync;

#[derive(Clone)]
pub struct FnComponent {
    name: String,
    description: String,
    base_image: String,
    inputs: Vec<String>,
    func: Arc<StepFn>,
}

impl FnComponent {
    pub fn new<F>(name: impl Into<String>, inputs: &[&str], func: F) -> Self
        where F: Fn(&StepContext) -> Result<String, CoreEngineError> + Send + Sync + 'static
    {
        Self { name: name.into(),
               description: String::new(),
               base_image: DEFAULT_BASE_IMAGE.to_string(),
               inputs: inputs.iter().map(|s| s.to_string()).collect(),
               func: Arc::new(func) }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.base_image = image.into();
        self
    }
}

impl fmt::Debug for FnComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnComponent")
         .field("name", &self.name)
         .field("base_image", &self.base_image)
         .field("inputs", &self.inputs)
         .finish_non_exhaustive()
    }
}

impl ComponentDefinition for FnComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn base_image(&self) -> &str {
        &self.base_image
    }

    fn input_names(&self) -> Vec<String> {
        self.inputs.clone()
    }

    fn run(&self, ctx: &StepContext) -> StepRunResult {
        (self.func)(ctx).into()
    }
}
