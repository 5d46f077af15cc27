//! Pipeline configuration.
//!
//! Three layers, later wins: built-in defaults, an optional TOML file
//! (`--config` or `TUTOR_CONFIG`), then `TUTOR_*` environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use coordination::escalation::MAX_REGENERATIONS;
use coordination::{ModelCatalog, ModelId, VerifierConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_CONFIG: &str = "TUTOR_CONFIG";
pub const ENV_GENERATOR_URL: &str = "TUTOR_GENERATOR_URL";
pub const ENV_GENERATOR_API_KEY: &str = "TUTOR_GENERATOR_API_KEY";
pub const ENV_RETRIEVER_URL: &str = "TUTOR_RETRIEVER_URL";
pub const ENV_MAX_REGENERATIONS: &str = "TUTOR_MAX_REGENERATIONS";
pub const ENV_GENERATION_TIMEOUT_SECS: &str = "TUTOR_GENERATION_TIMEOUT_SECS";
pub const ENV_RETRIEVAL_TIMEOUT_SECS: &str = "TUTOR_RETRIEVAL_TIMEOUT_SECS";
pub const ENV_BIND: &str = "TUTOR_BIND";
/// Prefix for per-model name overrides, e.g. `TUTOR_MODEL_FAST`.
pub const ENV_MODEL_PREFIX: &str = "TUTOR_MODEL_";

pub const DEFAULT_BIND: &str = "127.0.0.1:7870";
pub const DEFAULT_TOP_K: usize = 6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: String, value: String },
}

/// OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorEndpoint {
    /// Base URL; `None` selects the offline stub generator.
    pub url: Option<String>,
    pub api_key: Option<String>,
}

/// Retrieval service endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverEndpoint {
    /// Base URL; `None` disables retrieval.
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Regeneration bound; never above the built-in maximum.
    pub max_regenerations: u32,
    pub generation_timeout_secs: u64,
    pub retrieval_timeout_secs: u64,
    /// Whole-request budget checked between attempts.
    pub request_deadline_secs: Option<u64>,
    pub retrieval_top_k: usize,
    pub generator: GeneratorEndpoint,
    pub retriever: RetrieverEndpoint,
    /// Deployed model names keyed by logical model id (`fast`, `math_specialist`, ...).
    pub models: HashMap<String, String>,
    pub server: ServerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_regenerations: MAX_REGENERATIONS,
            generation_timeout_secs: 60,
            retrieval_timeout_secs: 10,
            request_deadline_secs: None,
            retrieval_top_k: DEFAULT_TOP_K,
            generator: GeneratorEndpoint::default(),
            retriever: RetrieverEndpoint::default(),
            models: HashMap::new(),
            server: ServerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load all three layers. `path` takes precedence over `TUTOR_CONFIG`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from));
        let config = match file {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.normalized())
    }

    /// Apply `TUTOR_*` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_GENERATOR_URL) {
            self.generator.url = Some(url);
        }
        if let Some(key) = lookup(ENV_GENERATOR_API_KEY) {
            self.generator.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_RETRIEVER_URL) {
            self.retriever.url = Some(url);
        }
        if let Some(n) = parse_env(&lookup, ENV_MAX_REGENERATIONS)? {
            self.max_regenerations = n;
        }
        if let Some(secs) = parse_env(&lookup, ENV_GENERATION_TIMEOUT_SECS)? {
            self.generation_timeout_secs = secs;
        }
        if let Some(secs) = parse_env(&lookup, ENV_RETRIEVAL_TIMEOUT_SECS)? {
            self.retrieval_timeout_secs = secs;
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.server.bind = bind;
        }
        for id in ModelId::ALL {
            if let Some(name) = lookup(&format!("{ENV_MODEL_PREFIX}{}", id.env_suffix())) {
                self.models.insert(id.to_string(), name);
            }
        }
        Ok(self.normalized())
    }

    fn normalized(mut self) -> Self {
        if self.max_regenerations > MAX_REGENERATIONS {
            tracing::warn!(
                requested = self.max_regenerations,
                max = MAX_REGENERATIONS,
                "max_regenerations clamped"
            );
            self.max_regenerations = MAX_REGENERATIONS;
        }
        self.retrieval_top_k = self.retrieval_top_k.max(1);
        self
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval_timeout_secs)
    }

    pub fn request_deadline(&self) -> Option<Duration> {
        self.request_deadline_secs.map(Duration::from_secs)
    }

    pub fn catalog(&self) -> ModelCatalog {
        let mut catalog = ModelCatalog::new();
        for (key, name) in &self.models {
            match ModelId::ALL.into_iter().find(|id| id.to_string() == *key) {
                Some(id) => catalog.set(id, name.clone()),
                None => tracing::warn!(model = %key, "unknown model id in config; ignored"),
            }
        }
        catalog
    }

    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig::default().with_max_regenerations(self.max_regenerations)
    }
}

fn parse_env<F, T>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value,
            }),
    }
}
