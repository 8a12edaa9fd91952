//! Ejecución local de pipelines.
//!
//! `LocalRunner` corre una `PipelineDefinition` en proceso, wave por wave,
//! registrando eventos en un `EventStore`.

pub mod runner;

pub use runner::{LocalRunner, RunOutcome};

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::component::{FnComponent, StepStatus};
    use crate::errors::CoreEngineError;
    use crate::event::EventStore;
    use crate::pipeline::{PipelineBuilder, NO_INPUTS};
    use crate::registry::ComponentRegistry;

    fn registry() -> (ComponentRegistry, FnComponent, FnComponent, FnComponent) {
        let source = FnComponent::new("source", &[], |_| Ok("  raw\tbytes \n".to_string()));
        let echo = FnComponent::new("echo", &["value"], |ctx| Ok(ctx.input("value")?.to_string()));
        let boom = FnComponent::new("boom", &["value"], |ctx| {
            Err(CoreEngineError::Internal(format!("cannot handle '{}'", ctx.input("value")?)))
        });
        let mut reg = ComponentRegistry::new();
        reg.register(source.clone()).expect("registro source");
        reg.register(echo.clone()).expect("registro echo");
        reg.register(boom.clone()).expect("registro boom");
        (reg, source, echo, boom)
    }

    #[test]
    fn output_passes_byte_for_byte() {
        let (reg, source, echo, _) = registry();
        let mut p = PipelineBuilder::new("bytes");
        let s = p.task(&source, NO_INPUTS);
        let e = p.task(&echo, [("value", s.output())]);
        p.output(e.output());
        let def = p.build().expect("definición válida");

        let mut runner = LocalRunner::new(reg);
        let outcome = runner.run(&def, &IndexMap::new()).expect("run ok");
        assert_eq!(outcome.pipeline_output.as_deref(), Some("  raw\tbytes \n"));
        assert_eq!(outcome.outputs.len(), 2);
        assert_eq!(runner.event_variants(outcome.run_id), vec!["I", "S", "F", "S", "F", "C"]);

        let instance = runner.instance(outcome.run_id, &def);
        assert!(instance.completed);
        assert_eq!(instance.count(StepStatus::FinishedOk), 2);
    }

    #[test]
    fn failure_stops_run_and_skips_downstream() {
        let (reg, source, echo, boom) = registry();
        let mut p = PipelineBuilder::new("fails");
        let s = p.task(&source, NO_INPUTS);
        let b = p.task(&boom, [("value", s.output())]);
        p.task(&echo, [("value", b.output())]);
        let def = p.build().expect("definición válida");

        let mut runner = LocalRunner::new(reg);
        let err = runner.run(&def, &IndexMap::new()).expect_err("debe fallar");
        assert!(matches!(err, CoreEngineError::StepFailed { ref task_id, .. } if task_id == "boom"));

        let run_id = runner.last_run_id().expect("run registrado");
        assert_eq!(runner.event_variants(run_id), vec!["I", "S", "F", "S", "X", "K", "R"]);
        let instance = runner.instance(run_id, &def);
        assert!(instance.failed);
        assert_eq!(instance.slot("echo").map(|s| s.status), Some(StepStatus::Skipped));
    }

    #[test]
    fn panicking_step_fails_the_run_like_an_error() {
        let (mut reg, source, echo, _) = registry();
        let bad = FnComponent::new("bad", &["value"], |ctx| {
            let n: usize = ctx.input("value")?.parse().unwrap();
            Ok(n.to_string())
        });
        reg.register(bad.clone()).expect("registro bad");
        let mut p = PipelineBuilder::new("panics");
        let s = p.task(&source, NO_INPUTS);
        let b = p.task(&bad, [("value", s.output())]);
        p.task(&echo, [("value", b.output())]);
        let def = p.build().expect("definición válida");

        let mut runner = LocalRunner::new(reg);
        assert!(runner.registry().contains("bad"));
        let err = runner.run(&def, &IndexMap::new()).expect_err("debe fallar");
        match err {
            CoreEngineError::StepFailed { task_id, message } => {
                assert_eq!(task_id, "bad");
                assert!(message.starts_with("step panicked: "), "{message}");
            }
            other => panic!("se esperaba StepFailed, llegó {other:?}"),
        }

        let run_id = runner.last_run_id().expect("run registrado");
        assert_eq!(runner.event_variants(run_id), vec!["I", "S", "F", "S", "X", "K", "R"]);
        assert_eq!(runner.event_store().list(run_id).len(), 7);
        let instance = runner.instance(run_id, &def);
        assert!(instance.failed && !instance.completed);
        assert_eq!(instance.slot("bad").map(|s| s.status), Some(StepStatus::Failed));
        assert!(instance.steps.iter().all(|s| s.status.is_terminal()));
    }

    #[test]
    fn parameters_resolve_from_arguments_or_defaults() {
        let (reg, _, echo, _) = registry();
        let mut p = PipelineBuilder::new("params");
        let who = p.parameter("who", Some("World"));
        p.task(&echo, [("value", who)]);
        let def = p.build().expect("definición válida");

        let mut runner = LocalRunner::new(reg);
        let default_run = runner.run(&def, &IndexMap::new()).expect("run ok");
        assert_eq!(default_run.pipeline_output.as_deref(), Some("World"));

        let mut args = IndexMap::new();
        args.insert("who".to_string(), "Ada".to_string());
        let custom = runner.run(&def, &args).expect("run ok");
        assert_eq!(custom.pipeline_output.as_deref(), Some("Ada"));
        assert_ne!(default_run.run_fingerprint, custom.run_fingerprint);

        args.insert("nope".to_string(), "x".to_string());
        assert_eq!(runner.run(&def, &args), Err(CoreEngineError::UnknownArgument("nope".into())));
    }

    #[test]
    fn missing_parameter_and_unknown_component_fail_before_start() {
        let (reg, _, echo, _) = registry();
        let mut p = PipelineBuilder::new("required");
        let who = p.parameter("who", None);
        p.task(&echo, [("value", who)]);
        let def = p.build().expect("definición válida");
        let mut runner = LocalRunner::new(reg);
        assert_eq!(runner.run(&def, &IndexMap::new()), Err(CoreEngineError::MissingParameter("who".into())));
        assert!(runner.last_run_id().is_none());

        let mut empty = LocalRunner::new(ComponentRegistry::new());
        let mut args = IndexMap::new();
        args.insert("who".to_string(), "x".to_string());
        assert_eq!(empty.run(&def, &args), Err(CoreEngineError::UnknownComponent("echo".into())));
    }

    #[test]
    fn fingerprint_is_stable_across_runs() {
        let (reg, source, echo, _) = registry();
        let mut p = PipelineBuilder::new("stable");
        let s = p.task(&source, NO_INPUTS);
        p.task(&echo, [("value", s.output())]);
        let def = p.build().expect("definición válida");
        let mut runner = LocalRunner::new(reg);
        let a = runner.run(&def, &IndexMap::new()).expect("run ok");
        let b = runner.run(&def, &IndexMap::new()).expect("run ok");
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.run_fingerprint, b.run_fingerprint);
    }
}
