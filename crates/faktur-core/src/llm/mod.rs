//! Language-model collaborator.
//!
//! The pipeline only needs one operation from a model: answer a system and a
//! user message with text. Anything that can do that implements
//! [`CompletionBackend`].

mod openai;
pub mod prompts;

pub use openai::OpenAiClient;
pub use prompts::Prompt;

use crate::error::LlmError;

/// A chat-completion backend.
pub trait CompletionBackend {
    /// Send one system + user exchange and return the assistant's text.
    fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;

    /// Short description for logs.
    fn describe(&self) -> String {
        "completion backend".to_string()
    }
}

impl<T: CompletionBackend + ?Sized> CompletionBackend for &T {
    fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        (**self).complete(system, user)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: CompletionBackend + ?Sized> CompletionBackend for Box<T> {
    fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        (**self).complete(system, user)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Cut `text` to at most `max_chars` characters without splitting one.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
