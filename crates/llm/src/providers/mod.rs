pub mod openai;

use std::time::Duration;

use ringkas_core::config::SummarizerConfig;

use crate::provider::{LlmError, LlmProvider};

/// Create the upstream provider from config. The API key must be set.
pub fn create_provider(config: &SummarizerConfig) -> Result<Box<dyn LlmProvider>, LlmError> {
    let api_key = config
        .api_key
        .as_ref()
        .ok_or_else(|| LlmError::NotConfigured("OPENROUTER_API_KEY not set".into()))?;

    if !config.api_url.starts_with("http://") && !config.api_url.starts_with("https://") {
        return Err(LlmError::NotConfigured(format!(
            "SUMMARIZER_API_URL must be an http(s) URL, got '{}'",
            config.api_url
        )));
    }

    Ok(Box::new(openai::OpenAiProvider::new(
        api_key.clone(),
        config.model.clone(),
        config.api_url.clone(),
        Duration::from_secs(config.timeout_secs),
    )?))
}
