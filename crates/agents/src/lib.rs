use std::sync::Arc;
use std::time::Instant;

use medicheck_core::triage::matched_keyword;
use medicheck_core::{
    classify_urgency, select_suggestions, ChatInput, SymptomQuery, TriageError, TriageResponse,
};
use medicheck_llm::{Responder, TextGenerator};
use medicheck_observability::AppMetrics;
use tracing::{info, instrument};

/// Turns one symptom description into `{reply, urgency, suggestions}`.
/// Holds no per-request state; clones share the generator and counters.
#[derive(Clone)]
pub struct TriageAgent<G>
where
    G: TextGenerator,
{
    responder: Arc<Responder<G>>,
    metrics: Arc<AppMetrics>,
}

impl<G> TriageAgent<G>
where
    G: TextGenerator,
{
    pub fn new(generator: G, metrics: Arc<AppMetrics>) -> Self {
        Self {
            responder: Arc::new(Responder::new(generator)),
            metrics,
        }
    }

    pub fn model_name(&self) -> &str {
        self.responder.generator().model_name()
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    #[instrument(skip(self, input))]
    pub async fn handle_chat(&self, input: ChatInput) -> Result<TriageResponse, TriageError> {
        self.metrics.inc_request();

        let query = SymptomQuery::try_from(input).inspect_err(|_| self.metrics.inc_rejected())?;
        Ok(self.triage(query).await)
    }

    pub async fn triage(&self, query: SymptomQuery) -> TriageResponse {
        let started = Instant::now();

        let urgency = classify_urgency(&query.message);
        self.metrics.record_urgency(urgency);

        let suggestions = select_suggestions(urgency, query.language);

        self.metrics.inc_generation_call();
        let outcome = self.responder.respond(&query.message, query.language).await;
        let degraded = outcome.is_degraded();
        if degraded {
            self.metrics.inc_degraded_reply();
        }

        self.metrics.observe_latency(started.elapsed());
        info!(
            language = %query.language.as_key(),
            urgency = %urgency.as_str(),
            keyword = matched_keyword(&query.message).unwrap_or("-"),
            degraded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "symptom triage handled"
        );

        TriageResponse {
            reply: outcome.into_text(),
            urgency,
            suggestions,
        }
    }
}
