//! Configuración de la aplicación desde variables de entorno.
//!
//! `.env` se carga una sola vez (perezoso). Variables:
//! - `STEPFLOW_OUTPUT_DIR`: directorio destino de `compile` (default `.`).
//! - `STEPFLOW_BASE_IMAGE`: imagen que reemplaza la de todos los executors.
//! - `STEPFLOW_SEED`: semilla para los componentes aleatorios.

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use thiserror::Error;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const OUTPUT_DIR_VAR: &str = "STEPFLOW_OUTPUT_DIR";
pub const BASE_IMAGE_VAR: &str = "STEPFLOW_BASE_IMAGE";
pub const SEED_VAR: &str = "STEPFLOW_SEED";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub base_image: Option<String>,
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { output_dir: PathBuf::from("."),
               base_image: None,
               seed: None }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    /// Valores vacíos cuentan como no definidos.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let output_dir = get(OUTPUT_DIR_VAR).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        let base_image = get(BASE_IMAGE_VAR);
        let seed = match get(SEED_VAR) {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| ConfigError::Invalid { var: SEED_VAR,
                                                                                     value: raw.clone() })?),
            None => None,
        };
        Ok(Self { output_dir,
                  base_image,
                  seed })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(AppConfig::from_lookup(lookup(&[])), Ok(AppConfig::default()));
    }

    #[test]
    fn reads_all_variables() {
        let cfg = AppConfig::from_lookup(lookup(&[(OUTPUT_DIR_VAR, "out"), (BASE_IMAGE_VAR, "img:1"), (SEED_VAR, " 42 ")]))
            .expect("config válida");
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.base_image.as_deref(), Some("img:1"));
        assert_eq!(cfg.seed, Some(42));
    }

    #[test]
    fn invalid_seed_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[(SEED_VAR, "abc")])).expect_err("seed inválida");
        assert_eq!(err.to_string(), "STEPFLOW_SEED: invalid value 'abc'");
    }
}
