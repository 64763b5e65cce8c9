//! Typed outcome of service write operations.

use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Expected domain failure of a write. Storage faults are not represented
/// here; they propagate as `RepoError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    Validation(ValidationError),
    /// A uniqueness rule rejected the write.
    Constraint(String),
}

impl Display for AttemptFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Constraint(message) => write!(f, "constraint violation: {message}"),
        }
    }
}

impl Error for AttemptFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Constraint(_) => None,
        }
    }
}

impl From<ValidationError> for AttemptFailure {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Result of a create/save/delete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Succeeded(T),
    /// A before-interceptor vetoed the write; storage was not touched.
    Cancelled(T),
    Failed(AttemptFailure),
}

impl<T> Attempt<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Failed(AttemptFailure::Constraint(_)))
    }

    pub fn failure(&self) -> Option<&AttemptFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// The succeeded value, if any.
    pub fn succeeded(self) -> Option<T> {
        match self {
            Self::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attempt<U> {
        match self {
            Self::Succeeded(value) => Attempt::Succeeded(f(value)),
            Self::Cancelled(value) => Attempt::Cancelled(f(value)),
            Self::Failed(failure) => Attempt::Failed(failure),
        }
    }
}
