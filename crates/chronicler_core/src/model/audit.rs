//! Audit trail records.
//!
//! # Responsibility
//! - Define the append-only audit row and the unsaved event value written by
//!   every mutating operation.
//!
//! # Invariants
//! - `id` is store-assigned and strictly increasing.
//! - Audit rows are never updated or deleted by normal operation.

use crate::model::{validate_non_empty, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    pub action: String,
    pub actor_id: Option<String>,
    pub target_id: Option<String>,
    /// Structured payload sufficient to reconstruct what changed.
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Unsaved audit event, recorded inside the transaction of the mutation it
/// describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub action: String,
    pub actor_id: Option<String>,
    pub target_id: Option<String>,
    pub detail: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_non_empty("audit", "action", &self.action)
    }
}
