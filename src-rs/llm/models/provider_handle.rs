use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ModelConfig, ProviderConfig};
use crate::cons::provider_cons::LLMProvider;

use super::claude::ClaudeClient;
use super::ollama::OllamaClient;
use super::openai::OpenAiClient;
pub use super::provider_base::{ChunkStream, ClientOptions, Message, ProviderClient};

pub enum AnyProviderClient {
    Claude(ClaudeClient),
    OpenAI(OpenAiClient),
    Ollama(OllamaClient),
}

impl ProviderClient for AnyProviderClient {
    fn provider(&self) -> LLMProvider {
        match self {
            AnyProviderClient::Claude(c) => c.provider(),
            AnyProviderClient::OpenAI(c) => c.provider(),
            AnyProviderClient::Ollama(c) => c.provider(),
        }
    }

    fn model_name(&self) -> &str {
        match self {
            AnyProviderClient::Claude(c) => ProviderClient::model_name(c),
            AnyProviderClient::OpenAI(c) => ProviderClient::model_name(c),
            AnyProviderClient::Ollama(c) => ProviderClient::model_name(c),
        }
    }

    async fn stream_chat(&self, messages: Vec<Message>) -> Result<ChunkStream> {
        match self {
            AnyProviderClient::Claude(c) => c.stream_chat(messages).await,
            AnyProviderClient::OpenAI(c) => c.stream_chat(messages).await,
            AnyProviderClient::Ollama(c) => c.stream_chat(messages).await,
        }
    }

    async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        match self {
            AnyProviderClient::Claude(c) => c.chat(messages).await,
            AnyProviderClient::OpenAI(c) => c.chat(messages).await,
            AnyProviderClient::Ollama(c) => c.chat(messages).await,
        }
    }
}

pub fn create_client(
    provider: LLMProvider,
    base_url: String,
    api_key: String,
    model_name: String,
    options: ClientOptions,
) -> AnyProviderClient {
    match provider {
        LLMProvider::Claude => AnyProviderClient::Claude(
            ClaudeClient::new(base_url, api_key, model_name).with_options(options),
        ),
        LLMProvider::OpenAI => AnyProviderClient::OpenAI(
            OpenAiClient::new(base_url, api_key, model_name).with_options(options),
        ),
        LLMProvider::Generic => AnyProviderClient::Ollama(
            OllamaClient::new(base_url, api_key, model_name).with_options(options),
        ),
    }
}

/// Builds clients on demand and reuses them per (provider, model).
#[derive(Default)]
pub struct ProviderClientFactory {
    cache: HashMap<(String, String), Arc<AnyProviderClient>>,
}

impl ProviderClientFactory {
    pub fn get_or_create(
        &mut self,
        model: &ModelConfig,
        provider_configs: &[ProviderConfig],
        options: ClientOptions,
    ) -> Result<Arc<AnyProviderClient>> {
        let key = (model.provider_name.clone(), model.model_name.clone());

        if let Some(existing) = self.cache.get(&key) {
            return Ok(Arc::clone(existing));
        }

        let config = provider_configs
            .iter()
            .find(|c| c.name == model.provider_name)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Provider not configured: {}:{}",
                    model.provider_name,
                    model.model_name
                )
            })?;

        log::debug!(
            "Creating {} client for {} at {}",
            model.client_type,
            model.model_name,
            config.base_url
        );
        let client = create_client(
            model.client_type,
            config.base_url.clone(),
            config.resolved_api_key(),
            model.model_name.clone(),
            options,
        );

        let client = Arc::new(client);
        self.cache.insert(key, Arc::clone(&client));
        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
