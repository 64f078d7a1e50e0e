//! Error types for instance loading and the evolutionary loop.

use thiserror::Error;

/// Errors raised while building or parsing a TSP instance.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("Cannot read instance: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },
    #[error("Invalid distance matrix: {0}")]
    InvalidMatrix(String),
}

impl InstanceError {
    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse { line, msg: msg.into() }
    }
}

/// Errors raised by the solver.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("InvalidConfiguration: {0}")]
    InvalidConfiguration(String),
    #[error("SelectionContractViolation: {reason}")]
    SelectionContractViolation { reason: String },
    #[error("FitnessContractViolation: expected {expected} values, got {got}")]
    FitnessContractViolation { expected: usize, got: usize },
    #[error(transparent)]
    Instance(#[from] InstanceError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SolverError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub(crate) fn selection(reason: impl Into<String>) -> Self {
        Self::SelectionContractViolation { reason: reason.into() }
    }
}

pub type Result<T, E = SolverError> = std::result::Result<T, E>;
