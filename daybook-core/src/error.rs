use thiserror::Error;

/// Failures surfaced to the user, one per retryable step.
#[derive(Debug, Error)]
pub enum DaybookError {
    /// The AI service could not be reached or its reply was unusable.
    #[error("could not extract expenses: {0}")]
    Extraction(String),
    /// A record or user input had the wrong shape.
    #[error("invalid expense: {0}")]
    Validation(String),
    /// The ledger could not be read or written.
    #[error("ledger unavailable: {0}")]
    Persistence(String),
}

/// Interaction step a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Extract,
    Review,
    Save,
}

impl DaybookError {
    pub fn step(&self) -> Step {
        match self {
            DaybookError::Extraction(_) => Step::Extract,
            DaybookError::Validation(_) => Step::Review,
            DaybookError::Persistence(_) => Step::Save,
        }
    }

    /// Short hint on what the user can retry.
    pub fn retry_hint(&self) -> &'static str {
        match self.step() {
            Step::Extract => "rephrase the description and try again",
            Step::Review => "correct the entry and submit it again",
            Step::Save => "check the ledger location and confirm again",
        }
    }
}

pub type Result<T> = std::result::Result<T, DaybookError>;
