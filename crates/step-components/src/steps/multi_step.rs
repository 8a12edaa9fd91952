use step_core::component;

component! {
    component StepA {
        name: "step_a_op",
        description: "First step: produce the initial message",
        inputs: [],
        run(_me) {
            let message = "Hello from Step A".to_string();
            log::info!(target: "step", "Step A: {message}");
            message
        }
    }
}

component! {
    component StepB {
        name: "step_b_op",
        description: "Second step: process the message from step A",
        inputs: [message_from_a],
        run(_me) {
            let message = format!("Step B processed: {message_from_a}");
            log::info!(target: "step", "Step B: {message}");
            message
        }
    }
}

component! {
    component StepC {
        name: "step_c_op",
        description: "Final step: close the chain",
        inputs: [message_from_b],
        run(_me) {
            let message = format!("Step C final: {message_from_b} -> Pipeline Complete!");
            log::info!(target: "step", "Step C: {message}");
            message
        }
    }
}
