use std::fmt;

use super::coerce::CoerceError;
use super::extract::ExtractError;
use crate::validation::ValidationErrors;

/// Why binding failed.
#[derive(Debug, Clone, PartialEq)]
pub enum BindErrorKind {
    /// Free-form message, e.g. a body hook failure.
    Message(String),
    Extract(ExtractError),
    Coerce(CoerceError),
    MultipleValues,
    CountMismatch { expected: usize, got: usize },
    Enum { allowed: Vec<String> },
    Validation(ValidationErrors),
}

impl fmt::Display for BindErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindErrorKind::Message(message) => f.write_str(message),
            BindErrorKind::Extract(err) => err.fmt(f),
            BindErrorKind::Coerce(err) => err.fmt(f),
            BindErrorKind::MultipleValues => f.write_str("multiple values not supported"),
            BindErrorKind::CountMismatch { expected, got } => {
                write!(f, "parameter expect {} values, got {}", expected, got)
            }
            BindErrorKind::Enum { allowed } => write!(
                f,
                "parameter has not an acceptable value, enum=[{}]",
                allowed.join(" ")
            ),
            BindErrorKind::Validation(errs) => errs.fmt(f),
        }
    }
}

/// Error raised while binding a request into a handler input.
///
/// Distinguishes binding failures from errors returned by handlers, so an
/// error hook can downcast to it and answer differently.
#[derive(Debug, Clone, PartialEq)]
pub struct BindError {
    field: Option<&'static str>,
    type_name: Option<&'static str>,
    kind: BindErrorKind,
}

impl BindError {
    /// Failure tied to one field of `type_name`.
    #[must_use]
    pub fn field(field: &'static str, type_name: &'static str, kind: BindErrorKind) -> Self {
        BindError {
            field: Some(field),
            type_name: Some(type_name),
            kind,
        }
    }

    /// Failure not tied to a field, such as an unreadable body.
    #[must_use]
    pub fn message(type_name: Option<&'static str>, message: impl Into<String>) -> Self {
        BindError {
            field: None,
            type_name,
            kind: BindErrorKind::Message(message.into()),
        }
    }

    #[must_use]
    pub fn validation(type_name: &'static str, errors: ValidationErrors) -> Self {
        BindError {
            field: None,
            type_name: Some(type_name),
            kind: BindErrorKind::Validation(errors),
        }
    }

    #[must_use]
    pub fn field_name(&self) -> Option<&'static str> {
        self.field
    }

    #[must_use]
    pub fn type_name(&self) -> Option<&'static str> {
        self.type_name
    }

    #[must_use]
    pub fn kind(&self) -> &BindErrorKind {
        &self.kind
    }

    /// Per-field failures when this error comes from validation.
    #[must_use]
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match &self.kind {
            BindErrorKind::Validation(errs) => Some(errs),
            _ => None,
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.field, self.type_name) {
            (Some(field), Some(type_name)) => write!(
                f,
                "binding error on field '{}' of type '{}': {}",
                field, type_name, self.kind
            ),
            _ => write!(f, "binding error: {}", self.kind),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            BindErrorKind::Extract(err) => Some(err),
            BindErrorKind::Coerce(err) => Some(err),
            BindErrorKind::Validation(errs) => Some(errs),
            _ => None,
        }
    }
}
