/// Domain-level error taxonomy
///
/// Services in this crate return `ServiceError`. The HTTP layer maps each
/// variant onto a status code; nothing here knows about HTTP.

use serde::Serialize;

use crate::auth::access::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input failed validation; carries every violation found
    #[error("{}", join_messages(.0))]
    Validation(Vec<FieldViolation>),

    /// Unique value already taken
    #[error("{0}")]
    Conflict(String),

    /// Identity could not be established (bad credentials, bad token)
    #[error("{0}")]
    Auth(String),

    /// Identity established but not allowed
    #[error(transparent)]
    Authorization(#[from] AuthzError),

    #[error("{0}")]
    NotFound(String),

    /// Server misconfiguration; fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl ServiceError {
    /// Validation error for a single field
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation(vec![FieldViolation::new(field, message)])
    }
}

fn join_messages(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Flattens derive-validator errors into field violations, ordered by field
pub fn violations_from(errors: &validator::ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldViolation {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field)),
            })
        })
        .collect();
    violations.sort_by(|a, b| a.field.cmp(&b.field));
    violations
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(violations_from(&errors))
    }
}
