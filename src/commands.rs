//! Implementación de los subcomandos. Cada uno escribe en `out` y devuelve
//! `AppError` en fallo; `main` decide el código de salida.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};
use serde::Serialize;
use step_components::{catalog, Catalog, CatalogOptions};
use step_core::{load_document, run_contained, Compiler, CoreEngineError, LocalRunner, StepContext, StepRunResult};
use uuid::Uuid;

use crate::cli::Command;
use crate::config::AppConfig;
use crate::errors::AppError;

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    pipeline: &'a str,
    run_id: Uuid,
    outputs: &'a IndexMap<String, String>,
    pipeline_output: Option<&'a str>,
    run_fingerprint: &'a str,
}

pub fn execute<W: Write>(command: Command, config: &AppConfig, out: &mut W) -> Result<(), AppError> {
    match command {
        Command::List => list(config, out),
        Command::Compile { pipelines, all, out: dest, image } => {
            let dest = dest.unwrap_or_else(|| config.output_dir.clone());
            let image = image.or_else(|| config.base_image.clone());
            compile(config, &pipelines, all, &dest, image, out).map(|_| ())
        }
        Command::Run { pipeline, params, seed, json } => run(config, &pipeline, params, seed, json, out),
        Command::Exec { component, inputs, output_path } => exec(config, &component, inputs, output_path.as_deref(), out),
        Command::Inspect { file } => inspect(&file, out),
    }
}

fn load_catalog(seed: Option<u64>) -> Result<Catalog, AppError> {
    Ok(catalog(&CatalogOptions { seed })?)
}

pub fn list<W: Write>(config: &AppConfig, out: &mut W) -> Result<(), AppError> {
    let cat = load_catalog(config.seed)?;
    writeln!(out, "pipelines:")?;
    for entry in &cat.pipelines {
        let def = (entry.build)(&cat.options)?;
        writeln!(out, "  {:<28} {} tasks  {}", entry.name, def.len(), entry.description)?;
    }
    writeln!(out, "components:")?;
    for spec in cat.registry.specs() {
        writeln!(out, "  {:<20} ({}) [{}]", spec.name, spec.inputs.join(", "), spec.base_image)?;
    }
    Ok(())
}

pub fn compile<W: Write>(config: &AppConfig,
                         pipelines: &[String],
                         all: bool,
                         dest: &Path,
                         image: Option<String>,
                         out: &mut W)
                         -> Result<Vec<PathBuf>, AppError> {
    let cat = load_catalog(config.seed)?;
    let names: Vec<String> = if all {
        cat.names().into_iter().map(str::to_string).collect()
    } else if pipelines.is_empty() {
        return Err(AppError::Usage("name at least one pipeline or pass --all".into()));
    } else {
        pipelines.to_vec()
    };
    if names.len() > 1 && dest.extension().is_some_and(|e| e == "yaml" || e == "yml") {
        return Err(AppError::Usage(format!("{} is a file path but {} pipelines were requested", dest.display(), names.len())));
    }

    let compiler = match image {
        Some(img) => Compiler::new().with_image_override(img),
        None => Compiler::new(),
    };
    let mut written = Vec::with_capacity(names.len());
    for name in &names {
        let def = cat.build(name)?.ok_or_else(|| AppError::UnknownPipeline(name.clone()))?;
        let path = compiler.compile(&def, dest)?;
        writeln!(out, "{} -> {}", name, path.display())?;
        written.push(path);
    }
    Ok(written)
}

pub fn run<W: Write>(config: &AppConfig,
                     pipeline: &str,
                     params: Vec<(String, String)>,
                     seed: Option<u64>,
                     json: bool,
                     out: &mut W)
                     -> Result<(), AppError> {
    let cat = load_catalog(seed.or(config.seed))?;
    let def = cat.build(pipeline)?.ok_or_else(|| AppError::UnknownPipeline(pipeline.to_string()))?;
    let arguments: IndexMap<String, String> = params.into_iter().collect();

    let mut runner = LocalRunner::new(cat.registry);
    let outcome = runner.run(&def, &arguments)?;
    if json {
        let report = RunReport { pipeline,
                                 run_id: outcome.run_id,
                                 outputs: &outcome.outputs,
                                 pipeline_output: outcome.pipeline_output.as_deref(),
                                 run_fingerprint: &outcome.run_fingerprint };
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }
    for (task, output) in &outcome.outputs {
        writeln!(out, "{task}: {output}")?;
    }
    if let Some(result) = &outcome.pipeline_output {
        writeln!(out, "output: {result}")?;
    }
    info!("run {} fingerprint {}", outcome.run_id, outcome.run_fingerprint);
    Ok(())
}

/// Ejecuta un componente aislado: entrypoint de los executors compilados.
pub fn exec<W: Write>(config: &AppConfig,
                      component: &str,
                      inputs: Vec<(String, String)>,
                      output_path: Option<&Path>,
                      out: &mut W)
                      -> Result<(), AppError> {
    let cat = load_catalog(config.seed)?;
    let definition = cat.registry.require(component)?;
    let declared = definition.input_names();
    if let Some((unexpected, _)) = inputs.iter().find(|(k, _)| !declared.contains(k)) {
        return Err(AppError::Usage(format!("component '{component}' has no input '{unexpected}'")));
    }

    let ctx = StepContext::new(component, inputs.into_iter().collect());
    let output = match run_contained(&*definition, &ctx) {
        StepRunResult::Success { output } => output,
        StepRunResult::Failure { error } => {
            return Err(CoreEngineError::StepFailed { task_id: component.to_string(),
                                                     message: error.to_string() }.into())
        }
    };
    match output_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &output)?;
            debug!("exec {}: {} bytes -> {}", component, output.len(), path.display());
        }
        None => writeln!(out, "{output}")?,
    }
    Ok(())
}

pub fn inspect<W: Write>(file: &Path, out: &mut W) -> Result<(), AppError> {
    let doc = load_document(file)?;
    let graph = doc.graph()?;
    writeln!(out, "pipeline: {}", doc.pipeline_info.name)?;
    writeln!(out, "definition hash: {}", doc.definition_hash)?;
    writeln!(out, "tasks ({}):", graph.len())?;
    for task in graph.topological_order() {
        let deps = graph.dependencies_of(task);
        if deps.is_empty() {
            writeln!(out, "  {task}")?;
        } else {
            writeln!(out, "  {task} <- {}", deps.join(", "))?;
        }
    }
    writeln!(out, "edges: {}", graph.edges().len())?;
    writeln!(out, "waves: {}", graph.waves().len())?;
    if let Some(task) = doc.output_task() {
        writeln!(out, "output: {task}")?;
    }
    Ok(())
}
