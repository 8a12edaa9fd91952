//! Macro utilitaria para declarar componentes sin boilerplate.
//!
//! Exportada en la raíz del crate:
//!   use step_core::component;
//!
//! Cada input declarado queda disponible en el cuerpo como `&str` con el mismo
//! nombre. El cuerpo es un bloque que evalúa a `String` (el output). Si un
//! input no llega en el contexto, el step falla con `MissingInputs` antes de
//! ejecutar el cuerpo.
//!
//! ```ignore
//! component! {
//!     component SayHello {
//!         name: "say_hello",
//!         description: "Say hello to someone",
//!         inputs: [name],
//!         run(_me) {
//!             format!("Hello, {name}!")
//!         }
//!     }
//! }
//! ```

#[macro_export]
macro_rules! component {
    // ---------------- Componente con fields ----------------
    (
        component $ty:ident {
            name: $name:expr,
            $(description: $desc:expr,)?
            $(image: $image:expr,)?
            inputs: [$($input:ident),* $(,)?],
            fields { $($fname:ident : $fty:ty),+ $(,)? },
            run($self_ident:ident) $body:block
        }
    ) => {
        #[derive(Clone, Debug)]
        pub struct $ty { $(pub $fname: $fty),+ }
        impl $ty { pub fn new($($fname : $fty),+) -> Self { Self { $($fname),+ } } }
        $crate::component!(@impl $ty, $name, [$($desc)?], [$($image)?], [$($input),*], $self_ident, $body);
    };

    // ---------------- Componente unit (sin fields) ----------------
    (
        component $ty:ident {
            name: $name:expr,
            $(description: $desc:expr,)?
            $(image: $image:expr,)?
            inputs: [$($input:ident),* $(,)?],
            run($self_ident:ident) $body:block
        }
    ) => {
        #[derive(Clone, Debug, Default)]
        pub struct $ty;
        impl $ty { pub fn new() -> Self { Self } }
        $crate::component!(@impl $ty, $name, [$($desc)?], [$($image)?], [$($input),*], $self_ident, $body);
    };

    (@impl $ty:ident, $name:expr, [$($desc:expr)?], [$($image:expr)?], [$($input:ident),*], $self_ident:ident, $body:block) => {
        impl $crate::component::ComponentDefinition for $ty {
            fn name(&self) -> &str { $name }
            fn description(&self) -> &str { $crate::component!(@or [$($desc)?], "") }
            fn base_image(&self) -> &str { $crate::component!(@or [$($image)?], $crate::constants::DEFAULT_BASE_IMAGE) }
            fn input_names(&self) -> Vec<String> {
                vec![$(stringify!($input).to_string()),*]
            }
            #[allow(unused_variables)]
            fn run(&self, ctx: &$crate::component::StepContext) -> $crate::component::StepRunResult {
                let $self_ident = self;
                let result = (|| -> Result<String, $crate::errors::CoreEngineError> {
                    $(let $input: &str = ctx.input(stringify!($input))?;)*
                    let out: String = $body;
                    Ok(out)
                })();
                result.into()
            }
        }
    };

    (@or [$value:expr], $default:expr) => { $value };
    (@or [], $default:expr) => { $default };
}
