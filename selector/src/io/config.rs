//! Selector configuration stored in `.selector.toml` at the repository root.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::io::env_file::load_env_file;

/// Default config location, relative to the repository root.
pub const DEFAULT_CONFIG_PATH: &str = ".selector.toml";

/// Selector configuration (TOML).
///
/// Every field is optional; a repository without a config file gets the
/// defaults below, which match a conventional Rails + RSpec layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectorConfig {
    /// Dotenv file holding the API credential.
    pub env_file: String,

    /// Variable name of the API credential.
    pub api_key_var: String,

    /// Base URL of the OpenAI-compatible API.
    pub api_base_url: String,

    pub model: String,

    /// Sampling temperature; left out of requests when unset, since some
    /// models only accept their default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    pub request_timeout_secs: u64,

    /// Only diff sections touching these top-level paths are shown to the model.
    pub diff_prefixes: Vec<String>,

    pub spec_dir: String,

    pub spec_suffix: String,

    /// Diff text beyond this many bytes is cut from prompts.
    pub diff_budget_bytes: usize,

    pub test: TestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TestConfig {
    /// Command that receives `path:line` identifiers as trailing arguments.
    pub command: Vec<String>,

    pub timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "bundle".to_string(),
                "exec".to_string(),
                "rspec".to_string(),
            ],
            timeout_secs: 60 * 60,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            env_file: ".env.development.local".to_string(),
            api_key_var: "OPENAI_API_KEY".to_string(),
            api_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1".to_string(),
            temperature: None,
            request_timeout_secs: 300,
            diff_prefixes: ["app/", "lib/", "config/", "db/", "spec/"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            spec_dir: "spec".to_string(),
            spec_suffix: "_spec.rb".to_string(),
            diff_budget_bytes: 200_000,
            test: TestConfig::default(),
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api_key_var.trim().is_empty() {
            return Err(anyhow!("api_key_var must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must not be empty"));
        }
        if self
            .temperature
            .is_some_and(|t| !(0.0..=2.0).contains(&t))
        {
            return Err(anyhow!("temperature must be between 0 and 2"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.diff_budget_bytes == 0 {
            return Err(anyhow!("diff_budget_bytes must be > 0"));
        }
        if self.spec_suffix.is_empty() {
            return Err(anyhow!("spec_suffix must not be empty"));
        }
        if self.test.command.is_empty() || self.test.command[0].trim().is_empty() {
            return Err(anyhow!("test.command must be a non-empty array"));
        }
        if self.test.timeout_secs == 0 {
            return Err(anyhow!("test.timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// Program name of the test command (first element).
    pub fn test_program(&self) -> &str {
        &self.test.command[0]
    }

    /// Resolve the API credential.
    ///
    /// The env file under `root` takes precedence; the process environment is
    /// consulted only when the file does not define the variable.
    pub fn resolve_api_key(&self, root: &Path) -> Result<String> {
        let env_path = root.join(&self.env_file);
        let from_file = load_env_file(&env_path)?
            .and_then(|vars| vars.get(&self.api_key_var).cloned())
            .filter(|value| !value.trim().is_empty());
        if let Some(key) = from_file {
            debug!(path = %env_path.display(), "api key loaded from env file");
            return Ok(key);
        }
        match std::env::var(&self.api_key_var) {
            Ok(key) if !key.trim().is_empty() => {
                debug!(var = %self.api_key_var, "api key loaded from environment");
                Ok(key)
            }
            _ => Err(anyhow!(
                "{} not set (add it to {})",
                self.api_key_var,
                env_path.display()
            )),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SelectorConfig::default()`.
pub fn load_config(path: &Path) -> Result<SelectorConfig> {
    if !path.exists() {
        let cfg = SelectorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SelectorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
