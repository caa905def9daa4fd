//! Env-driven configuration for the service, the CLI and the library clients.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binaries. Everything except the API key has a usable default.
use std::env;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base: String,
    pub image_model: String,
    pub chat_model: String,
    pub output_dir: PathBuf,
    pub api_host: String,
    pub api_port: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            output_dir: PathBuf::from("./books"),
            api_host: "127.0.0.1".to_string(),
            api_port: "8190".to_string(),
        }
    }
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Config::default();
        Config {
            api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            api_base: get("GEMINI_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            image_model: get("IMAGE_MODEL").unwrap_or(defaults.image_model),
            chat_model: get("CHAT_MODEL").unwrap_or(defaults.chat_model),
            output_dir: get("OUTPUT_DIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
            api_host: get("API_HOST").unwrap_or(defaults.api_host),
            api_port: get("API_PORT").unwrap_or(defaults.api_port),
        }
    }

    pub fn require_api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("GEMINI_API_KEY (or API_KEY) environment variable is not set.".to_string()))
    }

    pub fn log_env_vars(&self) {
        let key = match &self.api_key {
            Some(k) if k.chars().count() > 4 => {
                let tail: String = k.chars().skip(k.chars().count() - 4).collect();
                format!("****{}", tail)
            }
            Some(_) => "****".to_string(),
            None => "<unset>".to_string(),
        };
        tracing::info!("GEMINI_API_KEY: {}", key);
        tracing::info!("GEMINI_API_BASE: {}", self.api_base);
        tracing::info!("IMAGE_MODEL: {}", self.image_model);
        tracing::info!("CHAT_MODEL: {}", self.chat_model);
        tracing::info!("OUTPUT_DIR: {}", self.output_dir.display());
        tracing::info!("API_HOST: {}", self.api_host);
        tracing::info!("API_PORT: {}", self.api_port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = Config::from_lookup(lookup(&[]));
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(cfg.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(cfg.api_port, "8190");
        assert!(matches!(cfg.require_api_key(), Err(AppError::Config(_))));
    }

    #[test]
    fn api_key_falls_back_to_legacy_name() {
        let cfg = Config::from_lookup(lookup(&[("API_KEY", "legacy"), ("GEMINI_API_KEY", "  ")]));
        assert_eq!(cfg.require_api_key().unwrap(), "legacy");
    }

    #[test]
    fn api_base_is_trimmed() {
        let cfg = Config::from_lookup(lookup(&[("GEMINI_API_BASE", "http://localhost:9000/v1/")]));
        assert_eq!(cfg.api_base, "http://localhost:9000/v1");
    }
}
