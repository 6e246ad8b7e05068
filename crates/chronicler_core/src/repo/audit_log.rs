//! Append-only audit recorder.
//!
//! # Responsibility
//! - Persist one audit record per mutating operation across repositories
//!   and the rules service.
//!
//! # Invariants
//! - `append` is called inside the transaction of the mutation it describes,
//!   so the record and the entity write commit or roll back together.
//! - No read/query contract lives here; the trail is served by plain
//!   filtered reads elsewhere.

use crate::model::audit::{AuditEvent, AuditLog};
use crate::repo::{to_json_text, RepoResult};
use chrono::Utc;
use rusqlite::{params, Connection};

pub const ACTION_WORLD_CREATED: &str = "world_created";
pub const ACTION_WORLD_ENVIRONMENT_UPDATED: &str = "world_environment_updated";
pub const ACTION_REGION_CREATED: &str = "region_created";
pub const ACTION_REGION_OWNERSHIP_UPDATED: &str = "region_ownership_updated";
pub const ACTION_CONCENTRATION_STARTED: &str = "concentration_started";
pub const ACTION_CONCENTRATION_BROKEN: &str = "concentration_broken";

/// Appends one audit record and returns it with its assigned id.
///
/// Accepts any live connection handle; callers holding an open
/// `Transaction` pass it directly so the append joins that transaction.
pub fn append(conn: &Connection, event: &AuditEvent) -> RepoResult<AuditLog> {
    event.validate()?;

    let created_at = Utc::now();
    let detail_text = match &event.detail {
        Some(value) => Some(to_json_text("audit_log.detail", value)?),
        None => None,
    };

    conn.execute(
        "INSERT INTO audit_log (action, actor_id, target_id, detail, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            event.action.as_str(),
            event.actor_id.as_deref(),
            event.target_id.as_deref(),
            detail_text.as_deref(),
            created_at.to_rfc3339(),
        ],
    )?;

    Ok(AuditLog {
        id: conn.last_insert_rowid(),
        action: event.action.clone(),
        actor_id: event.actor_id.clone(),
        target_id: event.target_id.clone(),
        detail: event.detail.clone(),
        created_at,
    })
}
