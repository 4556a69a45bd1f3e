//! Application configuration builders.
//!
//! Constructs the summarizer and shared state from `Config`.

use anyhow::Context;
use tracing::info;

use ringkas_llm::Summarizer;

use crate::state::AppState;

/// Load configuration from `.env` and environment variables.
pub fn load_config() -> ringkas_core::Config {
    ringkas_core::config::load_dotenv();
    ringkas_core::Config::from_env()
}

/// Build the shared state. Fails when the upstream API key is missing.
pub fn build_state(config: &ringkas_core::Config) -> anyhow::Result<AppState> {
    let summarizer = Summarizer::from_config(&config.summarizer)
        .context("summarizer could not be created (is OPENROUTER_API_KEY set?)")?;
    info!(
        "Summarizer ready: model={}, timeout={}s",
        summarizer.model(),
        config.summarizer.timeout_secs
    );
    Ok(AppState::new(summarizer, config.limits.clone()))
}
