use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::pipeline::init::InitPhase;

/// One line of the JSONL phase trace.
#[derive(Debug, Serialize)]
pub struct PhaseEvent {
    pub timestamp_ms: u128,
    pub phase: InitPhase,

    pub elapsed_ms: Option<u64>,
    pub tokens: Option<usize>,

    pub detail: Option<String>,
}

impl PhaseEvent {
    pub fn now(phase: InitPhase) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            phase,
            elapsed_ms: None,
            tokens: None,
            detail: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(elapsed.as_millis() as u64);
        self
    }

    pub fn with_tokens(mut self, tokens: usize) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
