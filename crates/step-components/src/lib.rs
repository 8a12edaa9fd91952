//! step-components: componentes y pipelines de ejemplo sobre `step-core`.
//!
//! - `steps`: componentes declarados con `component!` (hello, multi-step y el
//!   pipeline sintético de datos de temperatura).
//! - `pipelines`: constructores de cada `PipelineDefinition`.
//! - `catalog`: registry con todos los componentes y los pipelines por nombre,
//!   usado por el CLI (`list`, `compile`, `run`, `exec`).

pub mod catalog;
pub mod pipelines;
pub mod steps;

pub use catalog::{catalog, Catalog, CatalogOptions, PipelineEntry};
