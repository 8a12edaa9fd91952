use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use step_core::{component, ComponentRegistry, EventStore, LocalRunner, PipelineBuilder, RunEvent, RunEventKind, StepStatus,
                NO_INPUTS};
use uuid::Uuid;

component! {
    component Seed {
        name: "seed",
        inputs: [],
        fields { value: String },
        run(me) {
            me.value.clone()
        }
    }
}

component! {
    component Wrap {
        name: "wrap",
        description: "Envuelve el input entre corchetes",
        inputs: [text],
        run(_me) {
            format!("[{text}]")
        }
    }
}

component! {
    component Join {
        name: "join",
        inputs: [left, right],
        run(_me) {
            format!("{left}|{right}")
        }
    }
}

/// Store que además cuenta cuántos eventos se escribieron.
#[derive(Default)]
struct CountingStore {
    events: HashMap<Uuid, Vec<RunEvent>>,
    appended: Arc<AtomicUsize>,
}

impl EventStore for CountingStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent {
        self.appended.fetch_add(1, Ordering::SeqCst);
        let list = self.events.entry(run_id).or_default();
        let ev = RunEvent { seq: list.len() as u64,
                            run_id,
                            kind,
                            ts: chrono::Utc::now() };
        list.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.events.get(&run_id).cloned().unwrap_or_default()
    }
}

fn registry() -> ComponentRegistry {
    let mut reg = ComponentRegistry::new();
    reg.register(Seed::new("x".into())).expect("seed");
    reg.register(Wrap::new()).expect("wrap");
    reg.register(Join::new()).expect("join");
    reg
}

#[test]
fn diamond_runs_in_three_waves() {
    let seed = Seed::new("x".into());
    let mut p = PipelineBuilder::new("diamond");
    let s = p.task(&seed, NO_INPUTS);
    let l = p.task(&Wrap::new(), [("text", s.output())]);
    let r = p.task(&Wrap::new(), [("text", s.output())]);
    let j = p.task(&Join::new(), [("left", l.output()), ("right", r.output())]);
    p.output(j.output());
    let def = p.build().expect("diamante válido");
    assert_eq!(def.graph().waves(), vec![vec!["seed"], vec!["wrap", "wrap-2"], vec!["join"]]);

    let appended = Arc::new(AtomicUsize::new(0));
    let store = CountingStore { events: HashMap::new(),
                                appended: appended.clone() };
    let mut runner = LocalRunner::with_store(registry(), store);
    let outcome = runner.run(&def, &IndexMap::new()).expect("run ok");

    assert_eq!(outcome.pipeline_output.as_deref(), Some("[x]|[x]"));
    let order: Vec<&str> = outcome.outputs.keys().map(String::as_str).collect();
    assert_eq!(order, vec!["seed", "wrap", "wrap-2", "join"]);
    // wave 2: ambos StepStarted antes de cualquier StepFinished
    assert_eq!(runner.event_variants(outcome.run_id), vec!["I", "S", "F", "S", "S", "F", "F", "S", "F", "C"]);
    assert_eq!(appended.load(Ordering::SeqCst), 10);

    let instance = runner.instance(outcome.run_id, &def);
    assert!(instance.steps.iter().all(|s| s.status == StepStatus::FinishedOk && s.fingerprint.is_some()));
}

#[test]
fn constant_inputs_reach_the_component_unchanged() {
    let mut p = PipelineBuilder::new("constants");
    p.task(&Join::new(), [("left", "  a "), ("right", "b\n")]);
    let def = p.build().expect("válido");
    let mut runner = LocalRunner::new(registry());
    let outcome = runner.run(&def, &IndexMap::new()).expect("run ok");
    assert_eq!(outcome.pipeline_output.as_deref(), Some("  a |b\n"));
}

#[test]
fn step_events_carry_output_hash() {
    let mut p = PipelineBuilder::new("hashes");
    p.task(&Wrap::new(), [("text", "hola")]);
    let def = p.build().expect("válido");
    let mut runner = LocalRunner::new(registry());
    let outcome = runner.run(&def, &IndexMap::new()).expect("run ok");
    let finished = runner.events_for(outcome.run_id)
                         .into_iter()
                         .find_map(|e| match e.kind {
                             RunEventKind::StepFinished { output_hash, .. } => Some(output_hash),
                             _ => None,
                         })
                         .expect("StepFinished");
    assert_eq!(finished, step_core::hashing::hash_str("[hola]"));
}
