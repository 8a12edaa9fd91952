//! Componentes del pipeline "hello": saludo + procesamiento del saludo.

use step_core::component;

component! {
    component SayHello {
        name: "say_hello",
        description: "Say hello to someone",
        inputs: [name],
        run(_me) {
            let greeting = format!("Hello, {name}!");
            log::info!(target: "step", "{greeting}");
            greeting
        }
    }
}

component! {
    component ProcessGreeting {
        name: "process_greeting",
        description: "Process the greeting message",
        inputs: [greeting],
        run(_me) {
            let processed = format!("Processed: {greeting} (via KFP v2.0)");
            log::info!(target: "step", "{processed}");
            processed
        }
    }
}
