use medicheck_core::{build_prompt, Language};
use tracing::warn;

use crate::{LlmError, TextGenerator};

pub const APOLOGY_REPLY: &str = "I apologize, but I cannot provide a response at this time. Please consult a healthcare professional.";
pub const UNAVAILABLE_REPLY: &str = "I apologize, but I cannot connect to the AI service at this time. Please consult a healthcare professional for your symptoms.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Generated(String),
    /// The service answered without text.
    Empty,
    Unavailable(LlmError),
}

impl ReplyOutcome {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Generated(_))
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) => text,
            Self::Empty => APOLOGY_REPLY.to_string(),
            Self::Unavailable(_) => UNAVAILABLE_REPLY.to_string(),
        }
    }
}

/// Single best-effort model call per message. Never fails outward.
#[derive(Debug, Clone)]
pub struct Responder<G> {
    generator: G,
}

impl<G> Responder<G>
where
    G: TextGenerator,
{
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn respond(&self, message: &str, language: Language) -> ReplyOutcome {
        let prompt = build_prompt(language, message);

        match self.generator.generate(&prompt).await {
            Ok(text) if text.is_empty() => ReplyOutcome::Empty,
            Ok(text) => ReplyOutcome::Generated(text),
            Err(error) => {
                warn!(
                    model = %self.generator.model_name(),
                    error = %error,
                    "generation service unavailable, using fallback reply"
                );
                ReplyOutcome::Unavailable(error)
            }
        }
    }

    pub async fn generate_reply(&self, message: &str, language: Language) -> String {
        self.respond(message, language).await.into_text()
    }
}
