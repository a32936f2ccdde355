//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.iacforge.toml` in the working directory
//! 4. `~/.config/iacforge/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::constants;
use crate::env::Env;
use crate::models::ProviderName;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("limits.{field} must be at least {min}, got {value}")]
    LimitTooSmall {
        field: &'static str,
        value: usize,
        min: usize,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub limits: LimitsConfig,
    pub storage: StorageConfig,
    pub generation: GenerationConfig,
    /// Verbose error bodies in handler responses.
    pub debug: bool,
}

/// LLM provider configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: ProviderName,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: ProviderName::Anthropic,
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: None,
            api_key: None,
        }
    }
}

/// Quotas applied while collecting files and building the analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_files_per_project: usize,
    pub max_total_files: usize,
    pub max_bytes_per_file: usize,
    pub max_total_bytes: usize,
    pub max_line_chars: usize,
    pub payload_ceiling_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_files_per_project: constants::MAX_FILES_PER_PROJECT,
            max_total_files: constants::MAX_TOTAL_FILES,
            max_bytes_per_file: constants::MAX_BYTES_PER_FILE,
            max_total_bytes: constants::MAX_TOTAL_BYTES,
            max_line_chars: constants::MAX_LINE_CHARS,
            payload_ceiling_bytes: constants::PAYLOAD_CEILING_BYTES,
        }
    }
}

/// Blob store configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: String,
    /// Directory holding one sub-directory per bucket.
    pub root: Option<PathBuf>,
    /// Key used to sign presigned URLs.
    pub signing_key: Option<String>,
    pub upload_url_expiry_secs: u64,
    pub artifact_url_expiry_secs: u64,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("root", &self.root)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "[REDACTED]"))
            .field("upload_url_expiry_secs", &self.upload_url_expiry_secs)
            .field("artifact_url_expiry_secs", &self.artifact_url_expiry_secs)
            .finish()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: constants::DEFAULT_BUCKET.to_string(),
            root: None,
            signing_key: None,
            upload_url_expiry_secs: constants::UPLOAD_URL_EXPIRY_SECS,
            artifact_url_expiry_secs: constants::ARTIFACT_URL_EXPIRY_SECS,
        }
    }
}

impl StorageConfig {
    /// Storage directory, falling back to the platform data dir.
    pub fn resolved_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(constants::CONFIG_DIR)
                .join("storage")
        })
    }
}

/// Generation handler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Project name interpolated into generated workflows and scripts.
    pub project_name: String,
    /// Region used in cost prompts; `None` uses the cloud's default.
    pub pricing_region: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            project_name: "app".to_string(),
            pricing_region: None,
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, local config, then applies
    /// environment variable overrides.
    pub fn load(dir: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        if let Some(dir) = dir {
            let local_path = dir.join(constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        config.apply_env_vars(env);
        config.limits.validate()?;

        Ok(config)
    }

    /// Load a config from a specific file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    fn merge(&mut self, other: Config) {
        let default_provider = ProviderConfig::default();
        if other.provider.name != default_provider.name {
            self.provider.name = other.provider.name;
        }
        if other.provider.model != default_provider.model {
            self.provider.model = other.provider.model;
        }
        if other.provider.base_url.is_some() {
            self.provider.base_url = other.provider.base_url;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }

        self.limits.merge(other.limits);

        let default_storage = StorageConfig::default();
        if other.storage.bucket != default_storage.bucket {
            self.storage.bucket = other.storage.bucket;
        }
        if other.storage.root.is_some() {
            self.storage.root = other.storage.root;
        }
        if other.storage.signing_key.is_some() {
            self.storage.signing_key = other.storage.signing_key;
        }
        if other.storage.upload_url_expiry_secs != default_storage.upload_url_expiry_secs {
            self.storage.upload_url_expiry_secs = other.storage.upload_url_expiry_secs;
        }
        if other.storage.artifact_url_expiry_secs != default_storage.artifact_url_expiry_secs {
            self.storage.artifact_url_expiry_secs = other.storage.artifact_url_expiry_secs;
        }

        if other.generation.project_name != GenerationConfig::default().project_name {
            self.generation.project_name = other.generation.project_name;
        }
        if other.generation.pricing_region.is_some() {
            self.generation.pricing_region = other.generation.pricing_region;
        }

        if other.debug {
            self.debug = true;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Ok(val) = env.var(constants::ENV_PROVIDER) {
            if let Ok(name) = val.parse::<ProviderName>() {
                self.provider.name = name;
            } else {
                warn!("ignoring invalid {} value: {val}", constants::ENV_PROVIDER);
            }
        }
        if let Ok(val) = env.var(constants::ENV_MODEL) {
            self.provider.model = val;
        }
        if let Ok(val) = env.var(constants::ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }

        let api_key = env
            .var(constants::ENV_API_KEY)
            .or_else(|_| env.var(self.provider.name.api_key_env_var()))
            .ok();
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }

        if let Ok(val) = env.var(constants::ENV_BUCKET) {
            self.storage.bucket = val;
        }
        if let Ok(val) = env.var(constants::ENV_STORAGE_DIR) {
            self.storage.root = Some(PathBuf::from(val));
        }
        if let Ok(val) = env.var(constants::ENV_SIGNING_KEY) {
            self.storage.signing_key = Some(val);
        }

        if env.var(constants::ENV_DEBUG).is_ok() {
            match env.flag(constants::ENV_DEBUG) {
                Some(flag) => self.debug = flag,
                None => warn!("ignoring invalid {} value", constants::ENV_DEBUG),
            }
        }
    }
}

impl LimitsConfig {
    /// The per-file ceiling must leave room for the truncation marker.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = crate::sanitize::TRUNCATION_MARKER.len();
        if self.max_bytes_per_file < min {
            return Err(ConfigError::LimitTooSmall {
                field: "max_bytes_per_file",
                value: self.max_bytes_per_file,
                min,
            });
        }
        Ok(())
    }

    fn merge(&mut self, other: LimitsConfig) {
        let defaults = LimitsConfig::default();
        if other.max_files_per_project != defaults.max_files_per_project {
            self.max_files_per_project = other.max_files_per_project;
        }
        if other.max_total_files != defaults.max_total_files {
            self.max_total_files = other.max_total_files;
        }
        if other.max_bytes_per_file != defaults.max_bytes_per_file {
            self.max_bytes_per_file = other.max_bytes_per_file;
        }
        if other.max_total_bytes != defaults.max_total_bytes {
            self.max_total_bytes = other.max_total_bytes;
        }
        if other.max_line_chars != defaults.max_line_chars {
            self.max_line_chars = other.max_line_chars;
        }
        if other.payload_ceiling_bytes != defaults.payload_ceiling_bytes {
            self.payload_ceiling_bytes = other.payload_ceiling_bytes;
        }
    }
}
