//! Runtime configuration
//!
//! Every setting is a command-line flag with an environment fallback, so the
//! tool can be driven from a shell profile or a CI job alike.

use clap::Args;
use metaforge_codegen::{DEFAULT_API_VERSION, GeneratorConfig};
use metaforge_core::{ForgeError, ForgeResult, Validatable};
use std::path::PathBuf;
use std::time::Duration;

/// Default model used for prompt parsing
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Base URL of the generative language API
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Project manifest that marks an SFDX project root
pub const PROJECT_MANIFEST: &str = "sfdx-project.json";

/// Settings shared by all subcommands
#[derive(Debug, Clone, Args)]
pub struct ForgeConfig {
    /// API key for the model service
    #[arg(long, env = "AI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model used for prompt parsing
    #[arg(long, env = "METAFORGE_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Base URL of the model API
    #[arg(long, env = "METAFORGE_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,

    /// SFDX project the metadata is deployed from
    #[arg(long, env = "METAFORGE_PROJECT_DIR", default_value = ".", global = true)]
    pub project_dir: PathBuf,

    /// Org alias or username passed to `--target-org`
    #[arg(long, env = "SF_TARGET_ORG", global = true)]
    pub target_org: Option<String>,

    /// Salesforce CLI executable
    #[arg(long, env = "SF_BIN", default_value = "sf", global = true)]
    pub sf_bin: String,

    /// Model call timeout in seconds
    #[arg(long, env = "METAFORGE_MODEL_TIMEOUT", default_value_t = 60, global = true)]
    pub model_timeout: u64,

    /// Timeout of each deployment step in seconds
    #[arg(long, env = "METAFORGE_DEPLOY_TIMEOUT", default_value_t = 600, global = true)]
    pub deploy_timeout: u64,

    /// Attempts for the model call (transient failures only)
    #[arg(long, env = "METAFORGE_MODEL_RETRIES", default_value_t = 3, global = true)]
    pub model_retries: u32,

    /// Metadata API version written to the manifest
    #[arg(long, env = "METAFORGE_API_VERSION", default_value = DEFAULT_API_VERSION, global = true)]
    pub api_version: String,

    /// Keep per-request staging directories
    #[arg(long, global = true)]
    pub keep_staging: bool,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            project_dir: PathBuf::from("."),
            target_org: None,
            sf_bin: "sf".to_string(),
            model_timeout: 60,
            deploy_timeout: 600,
            model_retries: 3,
            api_version: DEFAULT_API_VERSION.to_string(),
            keep_staging: false,
        }
    }
}

impl ForgeConfig {
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout)
    }

    pub fn deploy_timeout(&self) -> Duration {
        Duration::from_secs(self.deploy_timeout)
    }

    /// The API key, or a configuration error naming the variable
    pub fn require_api_key(&self) -> ForgeResult<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ForgeError::MissingConfig("AI_API_KEY".to_string()))
    }

    /// Path of `sfdx-project.json` in the project dir
    pub fn project_manifest(&self) -> PathBuf {
        self.project_dir.join(PROJECT_MANIFEST)
    }

    /// Renderer configuration for this project
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::new()
            .with_output_dir(&self.project_dir)
            .with_api_version(&self.api_version)
    }
}

impl Validatable for ForgeConfig {
    fn validate(&self) -> ForgeResult<()> {
        if self.model.trim().is_empty() {
            return Err(ForgeError::InvalidConfig("model name is empty".into()));
        }
        if self.sf_bin.trim().is_empty() {
            return Err(ForgeError::InvalidConfig("SF_BIN is empty".into()));
        }
        if self.model_timeout == 0 || self.deploy_timeout == 0 {
            return Err(ForgeError::InvalidConfig("timeouts must be at least one second".into()));
        }
        if self.model_retries == 0 {
            return Err(ForgeError::InvalidConfig("model retries must be at least 1".into()));
        }

        let valid_version = self
            .api_version
            .split_once('.')
            .is_some_and(|(major, minor)| {
                major.parse::<u32>().is_ok() && minor.parse::<u32>().is_ok()
            });
        if !valid_version {
            return Err(ForgeError::InvalidConfig(format!(
                "API version '{}' is not of the form NN.N",
                self.api_version
            )));
        }

        Ok(())
    }
}
