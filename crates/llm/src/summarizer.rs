use ringkas_core::config::SummarizerConfig;
use tracing::{debug, info};

use crate::provider::{LlmError, LlmProvider, Message};

/// System instruction sent with every request.
pub const SYSTEM_PROMPT: &str =
    "Buat ringkasan singkat dan akurat dari teks berikut, fokus pada poin-poin utama.";

/// Prefix of the user message; the (possibly truncated) text follows it.
pub const USER_PROMPT_PREFIX: &str = "Buat ringkasan dari teks berikut: ";

/// Turns plain text into a summary with a single upstream completion.
pub struct Summarizer {
    provider: Box<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_input_chars: usize,
}

impl Summarizer {
    pub fn new(provider: Box<dyn LlmProvider>, config: &SummarizerConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_input_chars: config.max_input_chars,
        }
    }

    /// Build from config, creating the upstream provider.
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(config)?;
        Ok(Self::new(provider, config))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The messages sent upstream for `text`, after truncation.
    pub fn build_messages(&self, text: &str) -> Vec<Message> {
        let (text, truncated) = truncate_chars(text, self.max_input_chars);
        if truncated {
            info!(
                limit = self.max_input_chars,
                "Input text truncated to {} characters before summarizing",
                self.max_input_chars
            );
        }

        vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!("{USER_PROMPT_PREFIX}{text}")),
        ]
    }

    /// Summarize `text`. The first completion is returned with surrounding
    /// whitespace removed.
    pub async fn summarize(&self, text: &str) -> Result<String, LlmError> {
        let messages = self.build_messages(text);

        let response = self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await?;

        debug!("LLM response: {}", response);
        Ok(response.trim().to_string())
    }
}

/// Cut `text` to at most `max_chars` characters. Returns whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::provider::Role;

    type Calls = Arc<Mutex<Vec<(Vec<Message>, f32, u32)>>>;

    /// Records every request and answers with a fixed result.
    struct StubProvider {
        calls: Calls,
        reply: fn() -> Result<String, LlmError>,
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        async fn complete(
            &self,
            messages: Vec<Message>,
            temperature: f32,
            max_tokens: u32,
        ) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((messages, temperature, max_tokens));
            (self.reply)()
        }
    }

    fn summarizer(reply: fn() -> Result<String, LlmError>) -> (Summarizer, Calls) {
        let calls = Calls::default();
        let provider = StubProvider {
            calls: calls.clone(),
            reply,
        };
        (Summarizer::new(Box::new(provider), &SummarizerConfig::default()), calls)
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("héllo", 5), ("héllo", false));
        assert_eq!(truncate_chars("", 3), ("", false));
        assert_eq!(truncate_chars("🎉🎉🎉", 1), ("🎉", true));
    }

    #[tokio::test]
    async fn trims_the_completion() {
        let (s, _) = summarizer(|| Ok("  Hello  ".to_string()));
        assert_eq!(s.summarize("Lorem ipsum").await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn sends_system_and_user_messages_with_sampling_params() {
        let (s, calls) = summarizer(|| Ok("ok".to_string()));
        s.summarize("Lorem ipsum dolor").await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (messages, temperature, max_tokens) = &calls[0];
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(
            messages[1].content,
            format!("{USER_PROMPT_PREFIX}Lorem ipsum dolor")
        );
        assert!((*temperature - 0.7).abs() < 1e-6);
        assert_eq!(*max_tokens, 500);
    }

    #[tokio::test]
    async fn long_input_is_truncated_before_sending() {
        let (s, calls) = summarizer(|| Ok("ok".to_string()));
        let input = "a".repeat(6_000);
        s.summarize(&input).await.unwrap();

        let calls = calls.lock().unwrap();
        let user = &calls[0].0[1].content;
        let sent = user.strip_prefix(USER_PROMPT_PREFIX).unwrap();
        assert_eq!(sent.chars().count(), 5_000);
        assert!(user.chars().count() <= 5_000 + USER_PROMPT_PREFIX.chars().count());
    }

    #[tokio::test]
    async fn input_at_limit_is_untouched() {
        let (s, calls) = summarizer(|| Ok("ok".to_string()));
        let input = "ä".repeat(5_000);
        s.summarize(&input).await.unwrap();

        let calls = calls.lock().unwrap();
        assert!(calls[0].0[1].content.ends_with(&input));
    }

    #[tokio::test]
    async fn provider_errors_propagate_unchanged() {
        let (s, _) = summarizer(|| {
            Err(LlmError::ApiError {
                status: 502,
                body: "bad gateway".into(),
            })
        });
        let err = s.summarize("teks").await.unwrap_err();
        assert!(matches!(err, LlmError::ApiError { status: 502, .. }));
    }

    #[test]
    fn model_comes_from_config() {
        let (s, _) = summarizer(|| Ok(String::new()));
        assert_eq!(s.model(), ringkas_core::config::DEFAULT_MODEL);
    }
}
