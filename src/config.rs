use std::time::Duration;

use clap::Parser;
use clap::builder::BoolishValueParser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::gateway::GatewayOptions;
use crate::llm::provider::DEFAULT_AZURE_API_VERSION;
use crate::llm::{LlmSettings, Provider, SamplingParams};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "SERVER_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Enable debug logging (accepts true/false, 1/0, yes/no, on/off)
    #[arg(long, env = "MEDCHAT_DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: Option<bool>,

    /// Base URL of the completion API
    #[arg(long, env = "LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    /// Model name
    #[arg(long, env = "LLM_MODEL")]
    pub llm_model: Option<String>,

    /// API key for the completion provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Azure deployment name
    #[arg(long, env = "AZURE_DEPLOYMENT_NAME")]
    pub azure_deployment: Option<String>,

    /// Azure API version
    #[arg(long, env = "AZURE_API_VERSION")]
    pub azure_api_version: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub log_json: bool,
}

#[derive(Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub deployment_name: Option<String>,
    pub api_version: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("deployment_name", &self.deployment_name)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("presence_penalty", &self.presence_penalty)
            .field("frequency_penalty", &self.frequency_penalty)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub history_window: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5001)?
            .set_default("server.debug", false)?
            .set_default("server.log_json", false)?
            .set_default("llm.base_url", "https://api.openai.com")?
            .set_default("llm.model", "gpt-4")?
            .set_default("llm.api_version", DEFAULT_AZURE_API_VERSION)?
            .set_default("llm.timeout_secs", 30)?
            .set_default("llm.max_tokens", 1000)?
            .set_default("llm.temperature", 0.5)?
            .set_default("llm.presence_penalty", 0.6)?
            .set_default("llm.frequency_penalty", 0.2)?
            .set_default("chat.history_window", 10)?;

        // 2. Config file: explicit path, else an optional ./medchat.{yaml,toml,json}
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("medchat").required(false)),
        };

        // 3. Environment variables, e.g. MEDCHAT_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("MEDCHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags and their env aliases win over everything else
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(debug) = cli.debug {
            builder = builder.set_override("server.debug", debug)?;
        }
        if let Some(url) = cli.llm_base_url {
            builder = builder.set_override("llm.base_url", url)?;
        }
        if let Some(model) = cli.llm_model {
            builder = builder.set_override("llm.model", model)?;
        }
        if let Some(key) = cli.api_key {
            builder = builder.set_override("llm.api_key", key)?;
        }
        if let Some(deployment) = cli.azure_deployment {
            builder = builder.set_override("llm.deployment_name", deployment)?;
        }
        if let Some(version) = cli.azure_api_version {
            builder = builder.set_override("llm.api_version", version)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }

    /// Address the HTTP server binds to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Resolve and validate the completion provider settings.
    ///
    /// A missing API key is fatal, as is an Azure endpoint without a
    /// deployment name.
    pub fn llm_settings(&self) -> Result<LlmSettings, ConfigError> {
        let llm = &self.llm;

        let api_key = llm
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::Message("OPENAI_API_KEY is required".to_string()))?
            .to_string();

        if llm.base_url.trim().is_empty() {
            return Err(ConfigError::Message("llm.base_url cannot be empty".to_string()));
        }
        if llm.model.trim().is_empty() {
            return Err(ConfigError::Message("llm.model cannot be empty".to_string()));
        }

        let mut provider = Provider::detect_from_url(&llm.base_url);
        if let Provider::AzureOpenAI { .. } = provider {
            let deployment_name = llm
                .deployment_name
                .clone()
                .filter(|d| !d.trim().is_empty())
                .ok_or_else(|| {
                    ConfigError::Message(
                        "AZURE_DEPLOYMENT_NAME is required for Azure OpenAI".to_string(),
                    )
                })?;
            provider = Provider::AzureOpenAI {
                deployment_name,
                api_version: llm.api_version.clone(),
            };
        }

        Ok(LlmSettings {
            base_url: llm.base_url.clone(),
            api_key,
            model: llm.model.clone(),
            provider,
        })
    }

    /// Gateway tunables derived from the `llm` and `chat` sections.
    #[must_use]
    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            history_window: self.chat.history_window,
            provider_timeout: Duration::from_secs(self.llm.timeout_secs),
            sampling: SamplingParams {
                max_tokens: self.llm.max_tokens,
                temperature: self.llm.temperature,
                presence_penalty: self.llm.presence_penalty,
                frequency_penalty: self.llm.frequency_penalty,
            },
        }
    }
}
