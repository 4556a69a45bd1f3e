use ringkas_core::config::LimitsConfig;
use ringkas_llm::Summarizer;

/// Shared, read-only per-process state. Nothing in here changes after startup.
pub struct AppState {
    pub summarizer: Summarizer,
    pub limits: LimitsConfig,
}

impl AppState {
    pub fn new(summarizer: Summarizer, limits: LimitsConfig) -> Self {
        Self { summarizer, limits }
    }
}
