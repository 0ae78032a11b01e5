use thiserror::Error;

/// A content rule rejected user input before it reached the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{field} must not be empty")]
    Blank { field: &'static str },
    #[error("{field} is invalid: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl DomainError {
    pub fn blank(field: &'static str) -> Self {
        Self::Blank { field }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }

    /// The input field the rule applies to.
    pub fn field(&self) -> &'static str {
        match self {
            DomainError::Blank { field } | DomainError::Invalid { field, .. } => field,
        }
    }
}
