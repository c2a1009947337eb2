use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("{field} {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl PlanError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PlanError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            PlanError::InvalidField { field, .. } => *field,
        }
    }
}
