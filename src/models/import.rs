use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Aggregate result of one import run. `created <= total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ImportReport {
    pub created: usize,
    pub total: usize,
}

impl ImportReport {
    pub fn record(&mut self, outcome: &CreationOutcome) {
        self.total += 1;
        if outcome.is_success() {
            self.created += 1;
        }
    }
}

/// Classified result of a single account-creation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CreationOutcome {
    Success(Value),
    Failure(String),
}

impl CreationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CreationOutcome::Success(_))
    }
}
