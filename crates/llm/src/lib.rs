pub mod provider;
pub mod providers;
pub mod summarizer;

pub use provider::{LlmError, LlmProvider, Message, Role};
pub use summarizer::Summarizer;
