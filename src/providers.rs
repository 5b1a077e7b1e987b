use std::sync::Arc;

use chat_provider::ChatProvider;
use chat_provider_mock::MockProvider;
use chat_provider_openai::{OpenAiChatProvider, OpenAiProviderConfig};

use crate::config::{NavvyConfig, ProviderKind};
use crate::error::NavvyError;

/// Builds the provider selected by `config`.
pub fn provider_for_config(config: &NavvyConfig) -> Result<Arc<dyn ChatProvider>, NavvyError> {
    match config.provider {
        ProviderKind::Mock => Ok(Arc::new(MockProvider::default())),
        ProviderKind::OpenAi => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                NavvyError::Config(
                    "OPENAI_API_KEY is not set; export it or run with --provider mock".to_string(),
                )
            })?;

            let mut provider_config = OpenAiProviderConfig::new(api_key, config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider_config = provider_config.with_base_url(base_url.clone());
            }
            if let Some(timeout) = config.timeout {
                provider_config = provider_config.with_timeout(timeout);
            }

            Ok(Arc::new(OpenAiChatProvider::new(provider_config)?))
        }
    }
}
