//! Compilador: `PipelineDefinition` -> documento de workflow persistido.
//!
//! Transformación pura sin reintentos: cualquier error es de definición y se
//! reporta de inmediato. El documento se renderiza completo en memoria antes
//! de tocar el disco, y se escribe vía archivo temporal + rename, así un fallo
//! nunca deja un documento parcial.

pub mod document;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

pub use document::WorkflowDocument;
use document::{ComponentEntry, ContainerSpec, DagOutputParameter, DagOutputs, DagSpec, DagTask, DeploymentSpec,
               ExecutorSpec, NameRef, ParameterBinding, ParameterDefinitions, ParameterType, PipelineInfo, RootSpec,
               RuntimeValue, TaskInputs, TaskOutputParameter, ValueFromParameter};

use crate::component::ComponentSpec;
use crate::constants::{DOCUMENT_EXTENSION, OUTPUT_KEY, SCHEMA_VERSION, SDK_VERSION};
use crate::errors::{CompileError, DefinitionError};
use crate::pipeline::{InputBinding, PipelineDefinition};

/// Programa que el contenedor ejecuta para correr un único componente.
pub const EXECUTOR_COMMAND: [&str; 2] = ["stepflow", "exec"];

#[derive(Debug, Clone, Default)]
pub struct Compiler {
    image_override: Option<String>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fuerza una imagen para todos los executors (p.ej. una imagen propia con
    /// el binario `stepflow`).
    pub fn with_image_override(mut self, image: impl Into<String>) -> Self {
        self.image_override = Some(image.into());
        self
    }

    pub fn compile_to_document(&self, definition: &PipelineDefinition) -> Result<WorkflowDocument, CompileError> {
        let mut components = BTreeMap::new();
        let mut executors = BTreeMap::new();
        for spec in definition.components() {
            components.insert(component_key(&spec.name), component_entry(spec));
            executors.insert(executor_key(&spec.name), self.executor(spec));
        }

        let mut tasks = BTreeMap::new();
        for task in definition.tasks() {
            let parameters = task.inputs
                                 .iter()
                                 .map(|(input, binding)| (input.clone(), parameter_binding(binding)))
                                 .collect();
            let dependent_tasks = definition.graph()
                                            .dependencies_of(&task.id)
                                            .into_iter()
                                            .map(str::to_string)
                                            .collect();
            tasks.insert(task.id.clone(),
                         DagTask { component_ref: NameRef { name: component_key(&task.component) },
                                   task_info: NameRef { name: task.id.clone() },
                                   dependent_tasks,
                                   inputs: TaskInputs { parameters } });
        }

        let outputs = definition.output().map(|producer| DagOutputs {
            parameters: BTreeMap::from([(OUTPUT_KEY.to_string(),
                                         DagOutputParameter { value_from_parameter: ValueFromParameter { producer_subtask: producer.to_string(),
                                                                                                          output_parameter_key: OUTPUT_KEY.to_string() } })]),
        });
        let output_definitions = match outputs {
            Some(_) => string_output(),
            None => ParameterDefinitions::default(),
        };
        let input_definitions =
            ParameterDefinitions { parameters: definition.parameters()
                                                         .map(|p| (p.name.clone(), ParameterType::string(p.default.clone())))
                                                         .collect() };

        let doc = WorkflowDocument { pipeline_info: PipelineInfo { name: definition.name().to_string(),
                                                                   description: definition.description().to_string() },
                                     schema_version: SCHEMA_VERSION.to_string(),
                                     sdk_version: SDK_VERSION.to_string(),
                                     definition_hash: definition.definition_hash().to_string(),
                                     components,
                                     deployment_spec: DeploymentSpec { executors },
                                     root: RootSpec { dag: DagSpec { tasks, outputs },
                                                      input_definitions,
                                                      output_definitions } };

        // El documento debe describir el mismo DAG que la definición.
        let graph = doc.graph()?;
        if graph.edges().len() != definition.graph().edges().len() {
            return Err(CompileError::Serialize(format!("document for '{}' lost dependency edges", definition.name())));
        }
        Ok(doc)
    }

    pub fn compile_to_string(&self, definition: &PipelineDefinition) -> Result<String, CompileError> {
        self.compile_to_document(definition)?.to_yaml()
    }

    /// Compila y persiste. `destination` es un directorio (el archivo se nombra
    /// con `document_file_name`) o una ruta explícita `.yaml`/`.yml`.
    pub fn compile(&self, definition: &PipelineDefinition, destination: impl AsRef<Path>) -> Result<PathBuf, CompileError> {
        let rendered = self.compile_to_string(definition)?;
        let path = resolve_destination(destination.as_ref(), definition.name());
        write_atomically(&path, &rendered)?;
        info!("compiled pipeline '{}' ({} tasks) -> {}", definition.name(), definition.len(), path.display());
        Ok(path)
    }

    /// Variante que recibe la función que declara el pipeline: los errores de
    /// definición se propagan sin escribir nada.
    pub fn compile_fn<F>(&self, pipeline: F, destination: impl AsRef<Path>) -> Result<PathBuf, CompileError>
        where F: FnOnce() -> Result<PipelineDefinition, DefinitionError>
    {
        let definition = pipeline()?;
        self.compile(&definition, destination)
    }

    fn executor(&self, spec: &ComponentSpec) -> ExecutorSpec {
        let mut args = vec!["--component".to_string(), spec.name.clone()];
        for input in &spec.inputs {
            args.push("--input".to_string());
            args.push(format!("{input}={{{{$.inputs.parameters['{input}']}}}}"));
        }
        args.push("--output-path".to_string());
        args.push(format!("{{{{$.outputs.parameters['{OUTPUT_KEY}'].output_file}}}}"));
        let image = self.image_override.clone().unwrap_or_else(|| spec.base_image.clone());
        ExecutorSpec { container: ContainerSpec { image,
                                                  command: EXECUTOR_COMMAND.iter().map(|s| s.to_string()).collect(),
                                                  args } }
    }
}

/// Nombre de archivo determinista para un pipeline.
pub fn document_file_name(pipeline_name: &str) -> String {
    format!("{pipeline_name}.{DOCUMENT_EXTENSION}")
}

pub fn load_document(path: impl AsRef<Path>) -> Result<WorkflowDocument, CompileError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| CompileError::Io { path: path.to_path_buf(),
                                                                             source })?;
    WorkflowDocument::from_yaml(&text)
}

fn component_key(component: &str) -> String {
    format!("comp-{}", component.replace('_', "-"))
}

fn executor_key(component: &str) -> String {
    format!("exec-{}", component.replace('_', "-"))
}

fn string_output() -> ParameterDefinitions {
    ParameterDefinitions { parameters: BTreeMap::from([(OUTPUT_KEY.to_string(), ParameterType::string(None))]) }
}

fn component_entry(spec: &ComponentSpec) -> ComponentEntry {
    let inputs = spec.inputs.iter().map(|i| (i.clone(), ParameterType::string(None))).collect();
    ComponentEntry { executor_label: executor_key(&spec.name),
                     input_definitions: ParameterDefinitions { parameters: inputs },
                     output_definitions: string_output() }
}

fn parameter_binding(binding: &InputBinding) -> ParameterBinding {
    match binding {
        InputBinding::Constant(c) => ParameterBinding { runtime_value: Some(RuntimeValue { constant: c.clone() }),
                                                        ..Default::default() },
        InputBinding::Parameter(p) => ParameterBinding { component_input_parameter: Some(p.clone()),
                                                         ..Default::default() },
        InputBinding::TaskOutput(t) => {
            ParameterBinding { task_output_parameter: Some(TaskOutputParameter { producer_task: t.clone(),
                                                                                 output_parameter_key: OUTPUT_KEY.to_string() }),
                               ..Default::default() }
        }
    }
}

fn resolve_destination(destination: &Path, pipeline_name: &str) -> PathBuf {
    let explicit_file = destination.extension()
                                   .and_then(|e| e.to_str())
                                   .is_some_and(|e| e == "yaml" || e == "yml");
    if explicit_file && !destination.is_dir() {
        destination.to_path_buf()
    } else {
        destination.join(document_file_name(pipeline_name))
    }
}

fn write_atomically(path: &Path, contents: &str) -> Result<(), CompileError> {
    let io_err = |source| CompileError::Io { path: path.to_path_buf(),
                                             source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("yaml.tmp");
    fs::write(&tmp, contents).map_err(io_err)?;
    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(source));
    }
    debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::FnComponent;
    use crate::pipeline::{PipelineBuilder, NO_INPUTS};

    fn hello_definition() -> PipelineDefinition {
        let say = FnComponent::new("say_hello", &["name"], |ctx| Ok(format!("Hello, {}!", ctx.input("name")?)));
        let process = FnComponent::new("process_greeting", &["greeting"], |ctx| Ok(ctx.input("greeting")?.to_string()));
        let mut p = PipelineBuilder::new("hello-pipeline-v2").description("hello world with data passing");
        let recipient = p.parameter("recipient", Some("World"));
        let hello = p.task(&say, [("name", recipient)]);
        let processed = p.task(&process, [("greeting", hello.output())]);
        p.output(processed.output());
        p.build().expect("valid pipeline")
    }

    #[test]
    fn document_wires_parameters_and_task_outputs() {
        let doc = Compiler::new().compile_to_document(&hello_definition()).expect("compile");
        assert_eq!(doc.pipeline_info.name, "hello-pipeline-v2");
        assert_eq!(doc.task_ids(), vec!["process-greeting", "say-hello"]);

        let say = &doc.root.dag.tasks["say-hello"];
        assert_eq!(say.component_ref.name, "comp-say-hello");
        assert!(say.dependent_tasks.is_empty());
        assert_eq!(say.inputs.parameters["name"].component_input_parameter.as_deref(), Some("recipient"));

        let process = &doc.root.dag.tasks["process-greeting"];
        assert_eq!(process.dependent_tasks, vec!["say-hello".to_string()]);
        let producer = process.inputs.parameters["greeting"].task_output_parameter.as_ref().expect("task output");
        assert_eq!(producer.producer_task, "say-hello");
        assert_eq!(producer.output_parameter_key, OUTPUT_KEY);

        assert_eq!(doc.output_task(), Some("process-greeting"));
        assert_eq!(doc.root.input_definitions.parameters["recipient"].default_value.as_deref(), Some("World"));
        let exec = &doc.deployment_spec.executors["exec-say-hello"].container;
        assert_eq!(exec.image, crate::constants::DEFAULT_BASE_IMAGE);
        assert_eq!(exec.command, vec!["stepflow", "exec"]);
        assert!(exec.args.contains(&"say_hello".to_string()));
    }

    #[test]
    fn image_override_applies_to_every_executor() {
        let doc = Compiler::new().with_image_override("registry.local/stepflow:1")
                                 .compile_to_document(&hello_definition())
                                 .expect("compile");
        assert!(doc.deployment_spec
                   .executors
                   .values()
                   .all(|e| e.container.image == "registry.local/stepflow:1"));
    }

    #[test]
    fn yaml_round_trips_and_is_stable() {
        let compiler = Compiler::new();
        let def = hello_definition();
        let first = compiler.compile_to_string(&def).expect("yaml");
        let second = compiler.compile_to_string(&def).expect("yaml");
        assert_eq!(first, second);
        assert!(first.contains("taskOutputParameter"));
        let parsed = WorkflowDocument::from_yaml(&first).expect("parse");
        assert_eq!(parsed, compiler.compile_to_document(&def).expect("doc"));
    }

    #[test]
    fn edited_document_with_broken_wiring_is_rejected() {
        let doc = Compiler::new().compile_to_document(&hello_definition()).expect("compile");

        let mut no_param = doc.clone();
        no_param.root.input_definitions.parameters.clear();
        assert_eq!(no_param.graph().unwrap_err(),
                   DefinitionError::UnknownParameter { task: "say-hello".into(),
                                                       parameter: "recipient".into() });

        let mut unbound = doc.clone();
        if let Some(task) = unbound.root.dag.tasks.get_mut("process-greeting") {
            task.inputs.parameters.clear();
        }
        assert_eq!(unbound.graph().unwrap_err(),
                   DefinitionError::MissingInput { task: "process-greeting".into(),
                                                   input: "greeting".into() });

        let mut extra = doc;
        if let Some(task) = extra.root.dag.tasks.get_mut("say-hello") {
            task.inputs.parameters.insert("volume".into(), ParameterBinding::default());
        }
        assert_eq!(extra.graph().unwrap_err(),
                   DefinitionError::UnexpectedInput { task: "say-hello".into(),
                                                      input: "volume".into() });
    }

    #[test]
    fn destination_resolution() {
        assert_eq!(resolve_destination(Path::new("out"), "p"), PathBuf::from("out/p.yaml"));
        assert_eq!(resolve_destination(Path::new("out/custom.yml"), "p"), PathBuf::from("out/custom.yml"));
        assert_eq!(document_file_name("v2-multi-step-pipeline"), "v2-multi-step-pipeline.yaml");
    }

    #[test]
    fn single_source_pipeline_has_no_inputs_section() {
        let only = FnComponent::new("only", &[], |_| Ok("x".to_string()));
        let mut p = PipelineBuilder::new("single");
        p.task(&only, NO_INPUTS);
        let def = p.build().expect("valid");
        let doc = Compiler::new().compile_to_document(&def).expect("compile");
        assert!(doc.root.dag.tasks["only"].inputs.is_empty());
        assert!(doc.root.input_definitions.is_empty());
        assert_eq!(doc.output_task(), Some("only"));
    }
}
