mod ollama;
mod responder;
mod scripted;

use thiserror::Error;

pub use ollama::{OllamaConfig, OllamaGenerator, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
pub use responder::{ReplyOutcome, Responder, APOLOGY_REPLY, UNAVAILABLE_REPLY};
pub use scripted::ScriptedGenerator;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("cannot reach generation service at {0}")]
    Connection(String),
    #[error("generation request timed out after {0}s")]
    Timeout(u64),
    #[error("generation service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("http client error: {0}")]
    Http(String),
    #[error("unreadable generation response: {0}")]
    ResponseParsing(String),
}

/// A non-streaming text completion backend.
pub trait TextGenerator: Send + Sync {
    fn model_name(&self) -> &str;

    /// Returns the generated text. An empty string means the backend
    /// answered but produced nothing.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone)]
pub enum Generator {
    Ollama(OllamaGenerator),
    Scripted(ScriptedGenerator),
}

impl Generator {
    pub fn ollama(config: &OllamaConfig) -> Result<Self, LlmError> {
        Ok(Self::Ollama(OllamaGenerator::new(config)?))
    }
}

impl TextGenerator for Generator {
    fn model_name(&self) -> &str {
        match self {
            Generator::Ollama(generator) => generator.model_name(),
            Generator::Scripted(generator) => generator.model_name(),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        match self {
            Generator::Ollama(generator) => generator.generate(prompt).await,
            Generator::Scripted(generator) => generator.generate(prompt).await,
        }
    }
}
