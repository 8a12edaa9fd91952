//! stepflow: aplicación sobre `step-core` y `step-components`.
//!
//! - `config`: variables de entorno (`.env` incluido).
//! - `cli`: definición de la línea de comandos.
//! - `commands`: implementación de `list`, `compile`, `run`, `exec`, `inspect`.
//! - `errors`: `AppError` y códigos de salida.

pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;

pub use config::AppConfig;
pub use errors::AppError;
