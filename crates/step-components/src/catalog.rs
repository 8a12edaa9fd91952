//! Catálogo: registry con todos los componentes + pipelines con nombre.

use std::fmt;

use step_core::{ComponentRegistry, DefinitionError, PipelineDefinition};

use crate::pipelines::{hello_pipeline, ml_pipeline, multi_step_pipeline, HELLO_PIPELINE, ML_PIPELINE, MULTI_STEP_PIPELINE};
use crate::steps::{AnalyzeData, CleanData, GenerateData, GenerateReport, ProcessGreeting, SayHello, StepA, StepB, StepC};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogOptions {
    /// Semilla para los componentes que muestrean números aleatorios.
    pub seed: Option<u64>,
}

pub type BuildFn = fn(&CatalogOptions) -> Result<PipelineDefinition, DefinitionError>;

#[derive(Clone)]
pub struct PipelineEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub build: BuildFn,
}

impl fmt::Debug for PipelineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineEntry")
         .field("name", &self.name)
         .field("description", &self.description)
         .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub options: CatalogOptions,
    pub registry: ComponentRegistry,
    pub pipelines: Vec<PipelineEntry>,
}

impl Catalog {
    pub fn pipeline(&self, name: &str) -> Option<&PipelineEntry> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.pipelines.iter().map(|p| p.name).collect()
    }

    /// Construye la definición del pipeline `name`. `Ok(None)` si no existe.
    pub fn build(&self, name: &str) -> Result<Option<PipelineDefinition>, DefinitionError> {
        self.pipeline(name).map(|p| (p.build)(&self.options)).transpose()
    }
}

pub fn catalog(options: &CatalogOptions) -> Result<Catalog, DefinitionError> {
    let mut registry = ComponentRegistry::new();
    registry.register(SayHello::new())?;
    registry.register(ProcessGreeting::new())?;
    registry.register(StepA::new())?;
    registry.register(StepB::new())?;
    registry.register(StepC::new())?;
    registry.register(GenerateData::new(options.seed))?;
    registry.register(CleanData::new(options.seed))?;
    registry.register(AnalyzeData::new(options.seed))?;
    registry.register(GenerateReport::new())?;

    let pipelines = vec![PipelineEntry { name: HELLO_PIPELINE,
                                         description: "say_hello -> process_greeting, parameter recipient",
                                         build: hello_pipeline },
                         PipelineEntry { name: MULTI_STEP_PIPELINE,
                                         description: "step_a_op -> step_b_op -> step_c_op",
                                         build: multi_step_pipeline },
                         PipelineEntry { name: ML_PIPELINE,
                                         description: "generate -> clean -> analyze -> report",
                                         build: ml_pipeline }];
    log::debug!("catalog: {} components, {} pipelines", registry.len(), pipelines.len());
    Ok(Catalog { options: *options,
                 registry,
                 pipelines })
}
