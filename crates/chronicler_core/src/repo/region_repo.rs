//! Region repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs over the `regions` table, including political
//!   ownership transfers.
//!
//! # Invariants
//! - `owner_nation_id` and `control_level` change in one statement; a reader
//!   never observes one without the other.
//! - Read paths re-validate persisted state instead of masking drift.
//! - Every mutation appends one audit record in the same transaction.

use crate::model::audit::AuditEvent;
use crate::model::region::{Region, RegionId};
use crate::model::validate_id;
use crate::repo::audit_log::{self, ACTION_REGION_CREATED, ACTION_REGION_OWNERSHIP_UPDATED};
use crate::repo::{
    ensure_schema_current, map_constraint_violation, parse_timestamp_column, RepoError, RepoResult,
};
use chrono::Utc;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use serde_json::json;

const REGION_SELECT_SQL: &str = "SELECT
    id,
    world_id,
    name,
    region_type,
    centroid_x,
    centroid_y,
    color,
    owner_nation_id,
    control_level,
    created_at,
    updated_at
FROM regions";

/// Repository interface for region persistence.
pub trait RegionRepository {
    fn create_region(&self, region: &Region, actor: Option<&str>) -> RepoResult<RegionId>;
    fn get_region(&self, id: &str) -> RepoResult<Option<Region>>;
    fn list_regions_by_world(&self, world_id: &str) -> RepoResult<Vec<Region>>;
    fn list_regions_by_owner(&self, nation_id: &str) -> RepoResult<Vec<Region>>;
    /// Transfers political control. `owner_nation_id = None` unclaims the
    /// region; `control_level` is always set explicitly alongside the owner.
    /// Returns the updated region.
    fn update_ownership(
        &self,
        id: &str,
        owner_nation_id: Option<&str>,
        control_level: i32,
        actor: Option<&str>,
    ) -> RepoResult<Region>;
}

/// SQLite-backed region repository.
pub struct SqliteRegionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegionRepository<'conn> {
    /// Binds to a connection, rejecting schemas that are not current.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_current(conn)?;
        Ok(Self { conn })
    }
}

impl RegionRepository for SqliteRegionRepository<'_> {
    fn create_region(&self, region: &Region, actor: Option<&str>) -> RepoResult<RegionId> {
        region.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO regions (
                id,
                world_id,
                name,
                region_type,
                centroid_x,
                centroid_y,
                color,
                owner_nation_id,
                control_level,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                region.id.as_str(),
                region.world_id.as_str(),
                region.name.as_str(),
                region.kind.as_str(),
                region.centroid_x,
                region.centroid_y,
                region.color.as_str(),
                region.owner_nation_id.as_deref(),
                i64::from(region.control_level),
                region.created_at.to_rfc3339(),
                region.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|err| map_constraint_violation("region", &region.id, err))?;

        audit_log::append(
            &tx,
            &AuditEvent {
                action: ACTION_REGION_CREATED.to_string(),
                actor_id: actor.map(str::to_string),
                target_id: Some(region.id.clone()),
                detail: Some(json!({
                    "worldId": region.world_id,
                    "name": region.name,
                    "type": region.kind,
                })),
            },
        )?;

        tx.commit()?;
        Ok(region.id.clone())
    }

    fn get_region(&self, id: &str) -> RepoResult<Option<Region>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REGION_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_region_row(row)?));
        }

        Ok(None)
    }

    fn list_regions_by_world(&self, world_id: &str) -> RepoResult<Vec<Region>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REGION_SELECT_SQL}
             WHERE world_id = ?1
             ORDER BY name ASC, id ASC;"
        ))?;

        let mut rows = stmt.query([world_id])?;
        let mut regions = Vec::new();
        while let Some(row) = rows.next()? {
            regions.push(parse_region_row(row)?);
        }

        Ok(regions)
    }

    fn list_regions_by_owner(&self, nation_id: &str) -> RepoResult<Vec<Region>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REGION_SELECT_SQL}
             WHERE owner_nation_id = ?1
             ORDER BY name ASC, id ASC;"
        ))?;

        let mut rows = stmt.query([nation_id])?;
        let mut regions = Vec::new();
        while let Some(row) = rows.next()? {
            regions.push(parse_region_row(row)?);
        }

        Ok(regions)
    }

    fn update_ownership(
        &self,
        id: &str,
        owner_nation_id: Option<&str>,
        control_level: i32,
        actor: Option<&str>,
    ) -> RepoResult<Region> {
        if let Some(owner) = owner_nation_id {
            validate_id("region", "ownerNationId", owner)?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE regions
             SET owner_nation_id = ?2,
                 control_level = ?3,
                 updated_at = ?4
             WHERE id = ?1;",
            params![
                id,
                owner_nation_id,
                i64::from(control_level),
                Utc::now().to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "region",
                id: id.to_string(),
            });
        }

        audit_log::append(
            &tx,
            &AuditEvent {
                action: ACTION_REGION_OWNERSHIP_UPDATED.to_string(),
                actor_id: actor.map(str::to_string),
                target_id: Some(id.to_string()),
                detail: Some(json!({
                    "ownerNationId": owner_nation_id,
                    "controlLevel": control_level,
                })),
            },
        )?;

        let region = tx.query_row(
            &format!("{REGION_SELECT_SQL} WHERE id = ?1;"),
            [id],
            |row| Ok(parse_region_row(row)),
        )??;

        tx.commit()?;
        Ok(region)
    }
}

fn parse_region_row(row: &Row<'_>) -> RepoResult<Region> {
    let created_at_text: String = row.get("created_at")?;
    let updated_at_text: String = row.get("updated_at")?;

    let region = Region {
        id: row.get("id")?,
        world_id: row.get("world_id")?,
        name: row.get("name")?,
        kind: row.get("region_type")?,
        centroid_x: row.get("centroid_x")?,
        centroid_y: row.get("centroid_y")?,
        color: row.get("color")?,
        owner_nation_id: row.get("owner_nation_id")?,
        control_level: crate::repo::parse_int_column(
            "regions.control_level",
            row.get("control_level")?,
        )?,
        created_at: parse_timestamp_column("regions.created_at", &created_at_text)?,
        updated_at: parse_timestamp_column("regions.updated_at", &updated_at_text)?,
    };
    region.validate()?;
    Ok(region)
}
