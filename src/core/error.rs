use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("unknown phase '{0}', expected one of: debt, emergency, retirement")]
    UnknownPhase(String),

    #[error("{0}")]
    Usage(String),

    /// Help text requested on the command line; not a failure.
    #[error("{0}")]
    Help(String),

    #[error("failed to render plan: {0}")]
    Render(String),
}

impl PlannerError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
