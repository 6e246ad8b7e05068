//! Validated domain models shared across repositories and rules services.
//!
//! # Responsibility
//! - Define the entity and value types that form the public contract.
//! - Provide field-level validation invoked on every write and read path.
//!
//! # Invariants
//! - Identifiers are caller-supplied stable strings matching `ID_RE`.
//! - Validation never performs I/O.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod audit;
pub mod concentration;
pub mod region;
pub mod world;

static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:-]{0,127}$").expect("valid id regex"));
static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));

/// Field-level validation failure for any entity or request value.
///
/// Variants carry the entity and field names verbatim so the transport layer
/// can render them to callers without translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent or empty.
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
    /// An identifier does not match the accepted shape.
    MalformedId {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    /// A numeric field is outside its permitted range.
    OutOfRange {
        entity: &'static str,
        field: &'static str,
        message: String,
    },
    /// A field holds a value the operation cannot accept.
    InvalidValue {
        entity: &'static str,
        field: &'static str,
        message: String,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { entity, field } => {
                write!(f, "{entity}: missing required field `{field}`")
            }
            Self::MalformedId {
                entity,
                field,
                value,
            } => write!(f, "{entity}: malformed identifier `{value}` in `{field}`"),
            Self::OutOfRange {
                entity,
                field,
                message,
            } => write!(f, "{entity}: `{field}` out of range: {message}"),
            Self::InvalidValue {
                entity,
                field,
                message,
            } => write!(f, "{entity}: invalid `{field}`: {message}"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn validate_id(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField { entity, field });
    }
    if !ID_RE.is_match(value) {
        return Err(ValidationError::MalformedId {
            entity,
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn validate_non_empty(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { entity, field });
    }
    Ok(())
}

pub(crate) fn validate_color(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField { entity, field });
    }
    if !COLOR_RE.is_match(value) {
        return Err(ValidationError::InvalidValue {
            entity,
            field,
            message: format!("`{value}` is not a #RRGGBB color"),
        });
    }
    Ok(())
}
