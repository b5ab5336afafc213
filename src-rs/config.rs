use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::provider_base::ClientOptions;

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name (e.g., "openai", "claude", "ollama")
    pub name: String,

    /// Base URL for the LLM API
    pub base_url: String,

    /// API key for authentication
    #[serde(default)]
    pub api_key: String,

    /// Environment variable consulted when `api_key` is empty
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// List of supported models
    #[serde(default)]
    pub models: Vec<String>,
}

impl ProviderConfig {
    pub fn resolved_api_key(&self) -> String {
        if !self.api_key.trim().is_empty() {
            return self.api_key.clone();
        }
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .unwrap_or_default()
    }

    pub fn kind(&self) -> Option<LLMProvider> {
        LLMProvider::from_name(&self.name)
    }
}

/// Defaults for the review form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDefaults {
    #[serde(default = "default_true")]
    pub stream_output: bool,
    #[serde(default)]
    pub per_file_analysis: bool,
    #[serde(default)]
    pub analyze_whole_file: bool,
    #[serde(default = "default_true")]
    pub ignore_tests: bool,
    #[serde(default)]
    pub default_model: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for ReviewDefaults {
    fn default() -> Self {
        Self {
            stream_output: true,
            per_file_analysis: false,
            analyze_whole_file: false,
            ignore_tests: true,
            default_model: None,
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_chunk_timeout_secs")]
    pub chunk_timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_chunk_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            chunk_timeout_secs: default_chunk_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl HttpConfig {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            chunk_timeout: Duration::from_secs(self.chunk_timeout_secs.max(1)),
            max_tokens: self.max_tokens,
        }
    }
}

/// A named review prompt. `system` becomes the system message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub system: String,
}

/// User override configuration (restricted fields)
#[derive(Deserialize)]
pub struct UserOverrideConfig {
    pub providers: Option<Vec<ProviderConfig>>,
    pub review: Option<ReviewDefaults>,
    pub http: Option<HttpConfig>,
    pub prompt_templates: Option<Vec<PromptTemplate>>,
}

/// Global application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub review: ReviewDefaults,

    #[serde(default)]
    pub http: HttpConfig,

    /// List of providers
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    #[serde(default)]
    pub prompt_templates: Vec<PromptTemplate>,
}

impl AppConfig {
    /// Load configuration with layered strategy:
    /// 1. Defaults (Embedded Config.toml)
    /// 2. User Config (~/.lemma/config.toml)
    /// 3. Project Config (./.lemma/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = Self::from_toml_str(include_str!("../Config.toml"))
            .context("Failed to parse embedded Config.toml")?;

        if let Some(home) = dirs::home_dir() {
            let user_path = home.join(".lemma").join("config.toml");
            Self::apply_patch(&mut config, user_path);
        }

        let project_path = Path::new(".lemma").join("config.toml");
        Self::apply_patch(&mut config, project_path);

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub(crate) fn apply_patch<P: AsRef<Path>>(config: &mut AppConfig, path: P) {
        let path = path.as_ref();
        if !path.exists() {
            return;
        }
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to read config patch at {}: {}", path.display(), e);
                return;
            }
        };
        match toml::from_str::<UserOverrideConfig>(&content) {
            Ok(patch) => config.merge(patch),
            Err(e) => {
                log::warn!("Failed to parse config patch at {}: {}", path.display(), e);
            }
        }
    }

    /// Providers replace by name; templates replace by name; sections replace wholesale.
    pub(crate) fn merge(&mut self, patch: UserOverrideConfig) {
        if let Some(providers) = patch.providers {
            for p in providers {
                if p.name.trim().is_empty() {
                    continue;
                }
                match self.providers.iter_mut().find(|c| c.name == p.name) {
                    Some(existing) => *existing = p,
                    None => self.providers.push(p),
                }
            }
        }
        if let Some(templates) = patch.prompt_templates {
            for t in templates {
                match self.prompt_templates.iter_mut().find(|c| c.name == t.name) {
                    Some(existing) => *existing = t,
                    None => self.prompt_templates.push(t),
                }
            }
        }
        if let Some(review) = patch.review {
            self.review = review;
        }
        if let Some(http) = patch.http {
            self.http = http;
        }
    }

    pub fn to_public(&self) -> PublicAppConfig {
        PublicAppConfig {
            review: self.review.clone(),
            providers: self
                .providers
                .iter()
                .map(|p| PublicProviderConfig {
                    name: p.name.clone(),
                    base_url: p.base_url.clone(),
                    models: p.models.clone(),
                })
                .collect(),
            prompt_templates: self.prompt_templates.iter().map(|t| t.name.clone()).collect(),
        }
    }
}

/// Configuration safe to hand to the UI (no keys).
#[derive(Debug, Clone, Serialize)]
pub struct PublicAppConfig {
    pub review: ReviewDefaults,
    pub providers: Vec<PublicProviderConfig>,
    pub prompt_templates: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicProviderConfig {
    pub name: String,
    pub base_url: String,
    pub models: Vec<String>,
}

/// Which client serves a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub client_type: LLMProvider,
    pub provider_name: String,
    pub model_name: String,
}

impl ModelConfig {
    /// Resolves `model` (plain name or `provider:model`) against the
    /// configured providers, falling back to name prefixes.
    pub fn from_model_name(model: &str, providers: &[ProviderConfig]) -> Self {
        let model = model.trim();

        if let Some((provider, name)) = model.split_once(':') {
            if let Some(config) = providers.iter().find(|p| p.name == provider) {
                return Self {
                    client_type: config.kind().unwrap_or_else(|| infer_provider(name)),
                    provider_name: config.name.clone(),
                    model_name: name.to_string(),
                };
            }
            if let Some(kind) = LLMProvider::from_name(provider) {
                return Self {
                    client_type: kind,
                    provider_name: provider_name_for(kind, providers),
                    model_name: name.to_string(),
                };
            }
        }

        if let Some(config) = providers.iter().find(|p| p.models.iter().any(|m| m == model)) {
            return Self {
                client_type: config.kind().unwrap_or_else(|| infer_provider(model)),
                provider_name: config.name.clone(),
                model_name: model.to_string(),
            };
        }

        let kind = infer_provider(model);
        Self {
            client_type: kind,
            provider_name: provider_name_for(kind, providers),
            model_name: model.to_string(),
        }
    }
}

fn infer_provider(model: &str) -> LLMProvider {
    let lower = model.to_lowercase();
    if lower.starts_with("claude") {
        return LLMProvider::Claude;
    }
    let openai_prefixes = ["gpt-", "chatgpt", "o1", "o3", "o4"];
    if openai_prefixes.iter().any(|p| lower.starts_with(p)) {
        return LLMProvider::OpenAI;
    }
    LLMProvider::Generic
}

fn provider_name_for(kind: LLMProvider, providers: &[ProviderConfig]) -> String {
    providers
        .iter()
        .find(|p| p.kind() == Some(kind))
        .map(|p| p.name.clone())
        .unwrap_or_else(|| kind.provider_name().to_string())
}
