use crate::config::{ModelConfig, ProviderConfig};
use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::provider_base::ClientOptions;
use crate::llm::models::provider_handle::{create_client, ProviderClientFactory, ProviderClient};

#[cfg(test)]
mod tests {
    use super::*;

    fn providers() -> Vec<ProviderConfig> {
        vec![
            ProviderConfig {
                name: "openai".to_string(),
                base_url: "http://localhost:1234/v1".to_string(),
                api_key: "k".to_string(),
                api_key_env: None,
                models: vec!["gpt-4o-mini".to_string()],
            },
            ProviderConfig {
                name: "ollama".to_string(),
                base_url: "http://localhost:11434".to_string(),
                api_key: String::new(),
                api_key_env: None,
                models: vec!["llama3.1".to_string()],
            },
        ]
    }

    #[test]
    fn create_client_picks_wire_client_by_provider() {
        for kind in [LLMProvider::OpenAI, LLMProvider::Claude, LLMProvider::Generic] {
            let client = create_client(
                kind,
                "http://localhost".to_string(),
                String::new(),
                "m".to_string(),
                ClientOptions::default(),
            );
            assert_eq!(client.provider(), kind);
            assert_eq!(client.model_name(), "m");
        }
    }

    #[test]
    fn factory_reuses_clients_per_provider_and_model() {
        let providers = providers();
        let mut factory = ProviderClientFactory::default();

        let model = ModelConfig::from_model_name("gpt-4o-mini", &providers);
        let a = factory
            .get_or_create(&model, &providers, ClientOptions::default())
            .expect("client");
        let b = factory
            .get_or_create(&model, &providers, ClientOptions::default())
            .expect("client");
        assert!(std::sync::Arc::ptr_eq(&a, &b));

        let other = ModelConfig::from_model_name("llama3.1", &providers);
        let c = factory
            .get_or_create(&other, &providers, ClientOptions::default())
            .expect("client");
        assert_eq!(c.provider(), LLMProvider::Generic);
        assert_eq!(factory.len(), 2);
    }

    #[test]
    fn factory_rejects_unconfigured_provider() {
        let mut factory = ProviderClientFactory::default();
        let model = ModelConfig::from_model_name("claude-3-5-haiku-latest", &providers());
        assert!(factory
            .get_or_create(&model, &providers(), ClientOptions::default())
            .is_err());
        assert!(factory.is_empty());
    }
}
