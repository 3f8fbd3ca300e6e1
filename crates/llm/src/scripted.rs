use std::sync::Arc;

use parking_lot::Mutex;

use crate::{LlmError, TextGenerator};

/// Fixed-outcome generator that records every prompt it receives.
#[derive(Debug, Clone)]
pub struct ScriptedGenerator {
    outcome: Result<String, LlmError>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::with_outcome(Ok(text.into()))
    }

    pub fn failing(error: LlmError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<String, LlmError>) -> Self {
        Self {
            outcome,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().push(prompt.to_string());
        self.outcome.clone()
    }
}
