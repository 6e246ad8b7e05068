//! World repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable persistence APIs over the `worlds` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `World::validate()` before SQL mutations.
//! - Read paths re-validate persisted state instead of masking drift.
//! - Every mutation appends one audit record in the same transaction.

use crate::model::audit::AuditEvent;
use crate::model::validate_non_empty;
use crate::model::world::{World, WorldId};
use crate::repo::audit_log::{self, ACTION_WORLD_CREATED, ACTION_WORLD_ENVIRONMENT_UPDATED};
use crate::repo::{
    ensure_schema_current, map_constraint_violation, parse_json_column, parse_timestamp_column,
    to_json_text, RepoError, RepoResult,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde_json::json;
use std::collections::BTreeMap;

const WORLD_SELECT_SQL: &str = "SELECT
    id,
    name,
    seed,
    width,
    height,
    environment,
    created_at,
    updated_at
FROM worlds";

/// Repository interface for world persistence.
pub trait WorldRepository {
    fn create_world(&self, world: &World, actor: Option<&str>) -> RepoResult<WorldId>;
    fn get_world(&self, id: &str) -> RepoResult<Option<World>>;
    fn list_worlds(&self) -> RepoResult<Vec<World>>;
    /// Merges environment attributes into the stored map. An empty value
    /// removes its key. Returns the updated world.
    fn update_environment(
        &self,
        id: &str,
        entries: &BTreeMap<String, String>,
        actor: Option<&str>,
    ) -> RepoResult<World>;
}

/// SQLite-backed world repository.
pub struct SqliteWorldRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWorldRepository<'conn> {
    /// Binds to a connection, rejecting schemas that are not current.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_current(conn)?;
        Ok(Self { conn })
    }
}

impl WorldRepository for SqliteWorldRepository<'_> {
    fn create_world(&self, world: &World, actor: Option<&str>) -> RepoResult<WorldId> {
        world.validate()?;

        let environment = to_json_text("worlds.environment", &world.environment)?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO worlds (id, name, seed, width, height, environment, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                world.id.as_str(),
                world.name.as_str(),
                world.seed,
                i64::from(world.width),
                i64::from(world.height),
                environment,
                world.created_at.to_rfc3339(),
                world.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|err| map_constraint_violation("world", &world.id, err))?;

        audit_log::append(
            &tx,
            &AuditEvent {
                action: ACTION_WORLD_CREATED.to_string(),
                actor_id: actor.map(str::to_string),
                target_id: Some(world.id.clone()),
                detail: Some(json!({
                    "name": world.name,
                    "seed": world.seed,
                    "width": world.width,
                    "height": world.height,
                })),
            },
        )?;

        tx.commit()?;
        Ok(world.id.clone())
    }

    fn get_world(&self, id: &str) -> RepoResult<Option<World>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{WORLD_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_world_row(row)?));
        }

        Ok(None)
    }

    fn list_worlds(&self) -> RepoResult<Vec<World>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{WORLD_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;

        let mut rows = stmt.query([])?;
        let mut worlds = Vec::new();
        while let Some(row) = rows.next()? {
            worlds.push(parse_world_row(row)?);
        }

        Ok(worlds)
    }

    fn update_environment(
        &self,
        id: &str,
        entries: &BTreeMap<String, String>,
        actor: Option<&str>,
    ) -> RepoResult<World> {
        for key in entries.keys() {
            validate_non_empty("world", "environment key", key)?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let stored: Option<String> = tx
            .query_row(
                "SELECT environment FROM worlds WHERE id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(stored) = stored else {
            return Err(RepoError::NotFound {
                entity: "world",
                id: id.to_string(),
            });
        };

        let mut environment: BTreeMap<String, String> =
            parse_json_column("worlds.environment", &stored)?;
        for (key, value) in entries {
            if value.is_empty() {
                environment.remove(key);
            } else {
                environment.insert(key.clone(), value.clone());
            }
        }

        tx.execute(
            "UPDATE worlds
             SET environment = ?2,
                 updated_at = ?3
             WHERE id = ?1;",
            params![
                id,
                to_json_text("worlds.environment", &environment)?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        audit_log::append(
            &tx,
            &AuditEvent {
                action: ACTION_WORLD_ENVIRONMENT_UPDATED.to_string(),
                actor_id: actor.map(str::to_string),
                target_id: Some(id.to_string()),
                detail: Some(json!({ "entries": entries })),
            },
        )?;

        let world = tx.query_row(&format!("{WORLD_SELECT_SQL} WHERE id = ?1;"), [id], |row| {
            Ok(parse_world_row(row))
        })??;

        tx.commit()?;
        Ok(world)
    }
}

fn parse_world_row(row: &Row<'_>) -> RepoResult<World> {
    let environment_text: String = row.get("environment")?;
    let created_at_text: String = row.get("created_at")?;
    let updated_at_text: String = row.get("updated_at")?;

    let world = World {
        id: row.get("id")?,
        name: row.get("name")?,
        seed: row.get("seed")?,
        width: crate::repo::parse_int_column("worlds.width", row.get("width")?)?,
        height: crate::repo::parse_int_column("worlds.height", row.get("height")?)?,
        environment: parse_json_column("worlds.environment", &environment_text)?,
        created_at: parse_timestamp_column("worlds.created_at", &created_at_text)?,
        updated_at: parse_timestamp_column("worlds.updated_at", &updated_at_text)?,
    };
    world.validate()?;
    Ok(world)
}
