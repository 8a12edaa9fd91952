//! Constantes del core.
//!
//! Algunos de estos valores participan en el cálculo de fingerprints y en el
//! documento compilado. Cambiarlos altera la reproducibilidad: `ENGINE_VERSION`
//! entra en el hash de cada step ejecutado localmente y `SCHEMA_VERSION` queda
//! escrito en cada documento.

/// Versión lógica del runner local. Se incluye en los fingerprints de step.
pub const ENGINE_VERSION: &str = "S1.0";

/// Versión del esquema del documento de workflow emitido por el compilador.
pub const SCHEMA_VERSION: &str = "2.1.0";

/// Identificador del SDK que escribe el documento.
pub const SDK_VERSION: &str = concat!("stepflow-", env!("CARGO_PKG_VERSION"));

/// Imagen de contenedor por defecto para componentes que no declaran una.
pub const DEFAULT_BASE_IMAGE: &str = "python:3.9-slim";

/// Clave del único parámetro de salida de cada componente.
pub const OUTPUT_KEY: &str = "Output";

/// Extensión del documento compilado.
pub const DOCUMENT_EXTENSION: &str = "yaml";
