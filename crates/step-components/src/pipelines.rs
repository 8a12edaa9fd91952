//! Constructores de los pipelines de ejemplo.
//!
//! Cada función declara el pipeline con `PipelineBuilder` y devuelve la
//! definición validada. Ninguna ejecuta nada.

use step_core::{DefinitionError, PipelineBuilder, PipelineDefinition, NO_INPUTS};

use crate::catalog::CatalogOptions;
use crate::steps::{AnalyzeData, CleanData, GenerateData, GenerateReport, ProcessGreeting, SayHello, StepA, StepB, StepC};

pub const HELLO_PIPELINE: &str = "hello-pipeline-v2";
pub const MULTI_STEP_PIPELINE: &str = "v2-multi-step-pipeline";
pub const ML_PIPELINE: &str = "ml-pipeline-no-emojis-v2";

/// Saludo parametrizado por `recipient` (default `World`).
pub fn hello_pipeline(_options: &CatalogOptions) -> Result<PipelineDefinition, DefinitionError> {
    let mut p = PipelineBuilder::new(HELLO_PIPELINE).description("KFP v2 hello world pipeline with data passing");
    let recipient = p.parameter("recipient", Some("World"));
    let hello = p.task(&SayHello::new(), [("name", recipient)]);
    let processed = p.task(&ProcessGreeting::new(), [("greeting", hello.output())]);
    p.output(processed.output());
    p.build()
}

/// Cadena lineal A -> B -> C.
pub fn multi_step_pipeline(_options: &CatalogOptions) -> Result<PipelineDefinition, DefinitionError> {
    let mut p = PipelineBuilder::new(MULTI_STEP_PIPELINE).description("KFP v2 multi-step pipeline with data passing");
    let a = p.task(&StepA::new(), NO_INPUTS);
    let b = p.task(&StepB::new(), [("message_from_a", a.output())]);
    let c = p.task(&StepC::new(), [("message_from_b", b.output())]);
    p.output(c.output());
    p.build()
}

pub fn ml_pipeline(options: &CatalogOptions) -> Result<PipelineDefinition, DefinitionError> {
    let mut p = PipelineBuilder::new(ML_PIPELINE).description("ML data processing pipeline using KFP v2 syntax");
    let data = p.task(&GenerateData::new(options.seed), NO_INPUTS);
    let clean = p.task(&CleanData::new(options.seed), [("data_summary", data.output())]);
    let analysis = p.task(&AnalyzeData::new(options.seed), [("clean_data_summary", clean.output())]);
    let report = p.task(&GenerateReport::new(), [("analysis_summary", analysis.output())]);
    p.output(report.output());
    p.build()
}
