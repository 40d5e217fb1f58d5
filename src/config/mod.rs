use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod validator;

use crate::agents::config::{LlmProviderConfig, RemoteRuntimeConfig, RuntimeKind};
use crate::agents::orchestrator::OrchestratorOptions;
use crate::cli::Cli;

/// Prefix of environment variable overrides, e.g. `BUYING_ASSISTANT__SERVER__PORT`
pub const ENV_PREFIX: &str = "BUYING_ASSISTANT";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a product research analyst and buying consultant. \
Ask clarifying questions when a request is vague. Otherwise research current prices, \
compare the strongest options, point out card offers that lower the effective price, \
and finish with a clear recommendation.";

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub sessions: SessionSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory served for paths outside the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentSettings {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub runtime: RuntimeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// File holding the system prompt, relative to the configuration file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_timeout_seconds: Option<u64>,
    #[serde(default = "default_context_label")]
    pub context_label: String,
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
    #[serde(default = "default_error_prefix")]
    pub error_prefix: String,
    #[serde(default)]
    pub llm: LlmProviderConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteRuntimeConfig>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            user_id: default_user_id(),
            runtime: RuntimeKind::default(),
            system_prompt: None,
            system_prompt_file: None,
            turn_timeout_seconds: None,
            context_label: default_context_label(),
            fallback_reply: default_fallback_reply(),
            error_prefix: default_error_prefix(),
            llm: LlmProviderConfig::default(),
            remote: None,
        }
    }
}

impl AgentSettings {
    /// The system prompt to send, falling back to the built-in one
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            app_name: self.app_name.clone(),
            user_id: self.user_id.clone(),
            context_label: self.context_label.clone(),
            fallback_reply: self.fallback_reply.clone(),
            error_prefix: self.error_prefix.clone(),
            turn_timeout: self.turn_timeout_seconds.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionSettings {
    /// History entries kept per session; older ones are dropped
    #[serde(default = "default_max_history")]
    pub max_history_messages: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sessions: Option<usize>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_history_messages: default_max_history(),
            max_sessions: None,
        }
    }
}

fn default_app_name() -> String {
    "buying_assistant".to_string()
}

fn default_user_id() -> String {
    "default_user".to_string()
}

fn default_context_label() -> String {
    "Cards".to_string()
}

fn default_fallback_reply() -> String {
    "No response generated".to_string()
}

fn default_error_prefix() -> String {
    "Error communicating with agent".to_string()
}

fn default_max_history() -> usize {
    100
}

impl Settings {
    /// Create settings from CLI arguments (config file, then environment, then CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::read(&cli.config)?;

        // Apply CLI overrides (CLI > env vars > config file)
        settings.apply_cli_overrides(cli);

        settings.finish(&cli.config)
    }

    /// Load settings from a configuration file and the environment
    pub fn load(config_path: &Path) -> Result<Self, anyhow::Error> {
        let settings = Self::read(config_path)?;
        settings.finish(config_path)
    }

    fn read(config_path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .add_source(File::from(config_path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn finish(mut self, config_path: &Path) -> Result<Self, anyhow::Error> {
        let root = config_path.parent().unwrap_or_else(|| Path::new("."));
        self.load_system_prompt(root)?;

        // Validate configuration
        validator::ConfigValidator::validate(&self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;

        Ok(self)
    }

    /// Apply CLI argument overrides to settings
    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(dir) = &cli.static_dir {
            self.server.static_dir = Some(dir.clone());
        }
        if let Some(runtime) = cli.runtime {
            self.agent.runtime = runtime;
        }
        if let Some(model) = &cli.model {
            self.agent.llm.model = model.clone();
        }
        if let Some(url) = &cli.remote_url {
            match &mut self.agent.remote {
                Some(remote) => remote.base_url = url.clone(),
                None => {
                    self.agent.remote = Some(RemoteRuntimeConfig {
                        base_url: url.clone(),
                        timeout_seconds: 300,
                        streaming: false,
                    })
                }
            }
        }
    }

    fn load_system_prompt(&mut self, root: &Path) -> Result<(), anyhow::Error> {
        if self.agent.system_prompt.is_some() {
            return Ok(());
        }
        if let Some(file) = &self.agent.system_prompt_file {
            let path = if file.is_absolute() {
                file.clone()
            } else {
                root.join(file)
            };
            let prompt = std::fs::read_to_string(&path).map_err(|e| {
                anyhow::anyhow!("Failed to read system prompt {}: {}", path.display(), e)
            })?;
            tracing::info!("Loaded system prompt from {}", path.display());
            self.agent.system_prompt = Some(prompt);
        }
        Ok(())
    }
}
