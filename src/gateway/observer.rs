//! Transaction observation hooks
//!
//! Observers are fire-and-forget: they cannot fail and never change the
//! outcome of a transaction.

use crate::core::error::ErrorCode;
use std::fmt;
use std::time::Duration;

/// How a transaction ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// The gateway approved it
    Approved,
    /// The gateway answered with a failure
    Declined,
    /// It never got a usable gateway answer
    Failed,
}

impl TransactionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionOutcome::Approved => "approved",
            TransactionOutcome::Declined => "declined",
            TransactionOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in the pipeline an error was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Duplicate,
    Validation,
    Network,
    Parse,
    Gateway,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Duplicate => "duplicate",
            FailureStage::Validation => "validation_error",
            FailureStage::Network => "network_error",
            FailureStage::Parse => "parse_error",
            FailureStage::Gateway => "gateway_error",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait TransactionObserver: Send + Sync {
    /// Called once per transaction with its kind (`sale`, `refund`, ...)
    fn on_transaction(&self, kind: &str, outcome: TransactionOutcome, elapsed: Duration);

    /// Called for every error, before [`on_transaction`](Self::on_transaction)
    fn on_error(&self, kind: &str, stage: FailureStage, code: ErrorCode);
}

/// Emits observations as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TransactionObserver for TracingObserver {
    fn on_transaction(&self, kind: &str, outcome: TransactionOutcome, elapsed: Duration) {
        tracing::info!(
            kind,
            outcome = %outcome,
            duration_ms = elapsed.as_millis() as u64,
            "transaction processed"
        );
    }

    fn on_error(&self, kind: &str, stage: FailureStage, code: ErrorCode) {
        tracing::warn!(kind, stage = %stage, code = %code, "transaction error");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TransactionObserver for NoopObserver {
    fn on_transaction(&self, _kind: &str, _outcome: TransactionOutcome, _elapsed: Duration) {}

    fn on_error(&self, _kind: &str, _stage: FailureStage, _code: ErrorCode) {}
}
