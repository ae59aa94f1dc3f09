//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// identifiers, lookups, modeling gaps). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. a guard clause rejected it).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// An aggregate or projection received an event it declares no transition for.
    ///
    /// This is a modeling bug (or a corrupted stream), never a recoverable condition.
    #[error("Event '{event}' cannot be applied to '{target}'")]
    UnknownEvent { target: String, event: String },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// `target` is the aggregate/projection type name, `event` the event's short name.
    pub fn unknown_event(target: impl Into<String>, event: impl Into<String>) -> Self {
        Self::UnknownEvent {
            target: target.into(),
            event: event.into(),
        }
    }

    pub fn is_unknown_event(&self) -> bool {
        matches!(self, Self::UnknownEvent { .. })
    }

    /// Stable problem-type code, e.g. `"Domain.Validation"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Domain.Validation",
            Self::InvalidId(_) => "Domain.InvalidId",
            Self::NotFound => "Domain.NotFound",
            Self::UnknownEvent { .. } => "Domain.UnknownEvent",
        }
    }

    /// Describe this error for clients; `domain` names where it occurred.
    pub fn to_error_info(&self, domain: impl Into<String>) -> ErrorInfo {
        let message = match self {
            Self::Validation(_) => "Validation failed",
            Self::InvalidId(_) => "Invalid identifier",
            Self::NotFound => "Resource not found",
            Self::UnknownEvent { .. } => "Event cannot be applied",
        };
        ErrorInfo::new(self.code(), message, self.to_string(), domain)
    }
}

/// Serializable description of an application error.
///
/// `message` summarizes the problem type in general, `reason` explains this
/// occurrence and `domain` identifies the instance where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub reason: String,
    pub domain: String,
}

impl ErrorInfo {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        reason: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            reason: reason.into(),
            domain: domain.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_names_event_and_target() {
        let err = DomainError::unknown_event("User", "UserLoggedIn");
        assert_eq!(err.to_string(), "Event 'UserLoggedIn' cannot be applied to 'User'");
        assert!(err.is_unknown_event());
    }

    #[test]
    fn constructors_wrap_messages() {
        assert_eq!(
            DomainError::validation("Email cannot be empty").to_string(),
            "validation failed: Email cannot be empty"
        );
        assert!(!DomainError::not_found().is_unknown_event());
    }

    #[test]
    fn error_info_describes_the_occurrence() {
        let info = DomainError::validation("Email cannot be empty").to_error_info("Identity.User.Email");

        assert_eq!(
            info,
            ErrorInfo::new(
                "Domain.Validation",
                "Validation failed",
                "validation failed: Email cannot be empty",
                "Identity.User.Email",
            )
        );
    }

    #[test]
    fn error_info_serializes_with_flat_fields() {
        let info = DomainError::unknown_event("User", "UserLoggedIn").to_error_info("Identity.User");

        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "code": "Domain.UnknownEvent",
                "message": "Event cannot be applied",
                "reason": "Event 'UserLoggedIn' cannot be applied to 'User'",
                "domain": "Identity.User",
            })
        );
    }
}
