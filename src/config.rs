//! Runtime configuration, read from the environment (and a `.env` file if present).

use crate::database::default_db_path;
use std::path::PathBuf;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GROQ_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Settings for the store and the external collaborators
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub pexels_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            groq_api_key: None,
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            pexels_api_key: None,
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read configuration from the process environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            database_path: get("SNAP2COOK_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            groq_api_key: get("GROQ_API_KEY"),
            groq_model: get("GROQ_MODEL").unwrap_or(defaults.groq_model),
            pexels_api_key: get("PEXELS_API_KEY"),
        };

        if config.gemini_api_key.is_none() {
            log::warn!("GEMINI_API_KEY not set; scanning is disabled");
        }
        if config.groq_api_key.is_none() {
            log::warn!("GROQ_API_KEY not set; recipe suggestions are disabled");
        }
        if config.pexels_api_key.is_none() {
            log::warn!("PEXELS_API_KEY not set; using placeholder images");
        }
        config
    }
}
