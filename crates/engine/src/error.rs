use thiserror::Error;

use chronicle_store::StoreError;

/// Errors from assembling the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine was misconfigured (e.g. missing required stores).
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Failures of a single restoration attempt.
///
/// All variants except a failed audit writeback (which is logged, not
/// returned) leave the backing stores untouched: nothing is written on the
/// failure paths.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// No record is addressed by the supplied rollback token.
    #[error("no record found for the supplied rollback token")]
    TokenNotFound,

    /// The addressed record captured no pre-change snapshot (e.g. it
    /// describes a creation), so there is no state to restore.
    #[error("record {0} has no previous state to restore")]
    NoPreviousState(String),

    /// The addressed record carries no resource reference (auth event).
    #[error("record {0} has no resource to restore")]
    MissingResource(String),

    /// A store read failed while resolving the record or live entity.
    #[error("restore lookup failed: {0}")]
    Lookup(StoreError),

    /// Saving the restored snapshot failed; no partial state was left.
    #[error("restore write failed: {0}")]
    Write(StoreError),

    /// A restoration step exceeded the per-step timeout.
    #[error("restore step timed out: {0}")]
    StepTimeout(&'static str),
}
