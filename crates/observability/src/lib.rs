use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use medicheck_core::UrgencyTier;
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    rejected_total: AtomicU64,
    generation_calls_total: AtomicU64,
    degraded_replies_total: AtomicU64,
    urgency_low_total: AtomicU64,
    urgency_medium_total: AtomicU64,
    urgency_high_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub rejected_total: u64,
    pub generation_calls_total: u64,
    pub degraded_replies_total: u64,
    pub urgency_low_total: u64,
    pub urgency_medium_total: u64,
    pub urgency_high_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_generation_call(&self) {
        self.generation_calls_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_degraded_reply(&self) {
        self.degraded_replies_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_urgency(&self, tier: UrgencyTier) {
        let counter = match tier {
            UrgencyTier::Low => &self.urgency_low_total,
            UrgencyTier::Medium => &self.urgency_medium_total,
            UrgencyTier::High => &self.urgency_high_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let generation_calls = self.generation_calls_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            generation_calls_total: generation_calls,
            degraded_replies_total: self.degraded_replies_total.load(Ordering::Relaxed),
            urgency_low_total: self.urgency_low_total.load(Ordering::Relaxed),
            urgency_medium_total: self.urgency_medium_total.load(Ordering::Relaxed),
            urgency_high_total: self.urgency_high_total.load(Ordering::Relaxed),
            // Only triaged requests record a latency.
            avg_latency_millis: if generation_calls == 0 {
                0.0
            } else {
                latency as f64 / generation_calls as f64
            },
        }
    }
}

/// Where the JSON log lines go. Commands that print results on stdout log to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
}

pub fn init_tracing(service_name: &str) {
    init_tracing_to(service_name, LogTarget::Stdout);
}

pub fn init_tracing_to(service_name: &str, target: LogTarget) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,medicheck_api=info,medicheck_agents=info,medicheck_llm=info,tower_http=info",
                service_name
            ))
        });

        let builder = tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true);

        match target {
            LogTarget::Stdout => builder.with_writer(std::io::stdout).init(),
            LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
        }
    });
}
