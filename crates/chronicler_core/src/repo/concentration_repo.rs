//! Concentration-state repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own the row mapping for active concentration entries.
//! - Expose row primitives the rules service composes inside its own
//!   transactions.
//!
//! # Invariants
//! - `character_id` is the primary key: at most one active row per
//!   character.
//! - Rows are inserted and deleted whole; the break flow is the only
//!   mutation path.

use crate::model::concentration::{CharacterId, ConcentrationState};
use crate::repo::{
    ensure_schema_current, map_constraint_violation, parse_int_column, parse_json_column,
    to_json_text, RepoResult,
};
use rusqlite::{params, Connection, Row};

const CONCENTRATION_SELECT_SQL: &str = "SELECT
    character_id,
    active_spell,
    spell_level,
    target_ids,
    started_at_round,
    max_duration_rounds,
    save_dc_base
FROM concentration_states";

/// Repository interface for concentration lookups.
pub trait ConcentrationRepository {
    fn get_active(&self, character_id: &str) -> RepoResult<Option<ConcentrationState>>;
    fn list_active(&self) -> RepoResult<Vec<ConcentrationState>>;
}

/// SQLite-backed concentration repository.
pub struct SqliteConcentrationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConcentrationRepository<'conn> {
    /// Binds to a connection, rejecting schemas that are not current.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_current(conn)?;
        Ok(Self { conn })
    }
}

impl ConcentrationRepository for SqliteConcentrationRepository<'_> {
    fn get_active(&self, character_id: &str) -> RepoResult<Option<ConcentrationState>> {
        get_state(self.conn, character_id)
    }

    fn list_active(&self) -> RepoResult<Vec<ConcentrationState>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONCENTRATION_SELECT_SQL} ORDER BY character_id ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut states = Vec::new();
        while let Some(row) = rows.next()? {
            states.push(parse_state_row(row)?);
        }

        Ok(states)
    }
}

/// Reads one character's active entry. Works inside an open transaction.
pub(crate) fn get_state(
    conn: &Connection,
    character_id: &str,
) -> RepoResult<Option<ConcentrationState>> {
    let mut stmt = conn.prepare(&format!(
        "{CONCENTRATION_SELECT_SQL} WHERE character_id = ?1;"
    ))?;

    let mut rows = stmt.query([character_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_state_row(row)?));
    }

    Ok(None)
}

/// Inserts a validated entry. Works inside an open transaction.
pub(crate) fn insert_state(conn: &Connection, state: &ConcentrationState) -> RepoResult<()> {
    state.validate()?;

    conn.execute(
        "INSERT INTO concentration_states (
            character_id,
            active_spell,
            spell_level,
            target_ids,
            started_at_round,
            max_duration_rounds,
            save_dc_base
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            state.character_id.as_str(),
            state.active_spell.as_str(),
            i64::from(state.spell_level),
            to_json_text("concentration_states.target_ids", &state.target_ids)?,
            i64::from(state.started_at_round),
            state.max_duration_rounds.map(i64::from),
            i64::from(state.save_dc_base),
        ],
    )
    .map_err(|err| map_constraint_violation("concentration", &state.character_id, err))?;

    Ok(())
}

/// Removes one character's entry, reporting whether a row existed. Works
/// inside an open transaction.
pub(crate) fn delete_state(conn: &Connection, character_id: &CharacterId) -> RepoResult<bool> {
    let changed = conn.execute(
        "DELETE FROM concentration_states WHERE character_id = ?1;",
        [character_id.as_str()],
    )?;
    Ok(changed > 0)
}

fn parse_state_row(row: &Row<'_>) -> RepoResult<ConcentrationState> {
    let target_ids_text: String = row.get("target_ids")?;
    let max_duration: Option<i64> = row.get("max_duration_rounds")?;

    let state = ConcentrationState {
        character_id: row.get("character_id")?,
        active_spell: row.get("active_spell")?,
        spell_level: parse_int_column("concentration_states.spell_level", row.get("spell_level")?)?,
        target_ids: parse_json_column("concentration_states.target_ids", &target_ids_text)?,
        started_at_round: parse_int_column(
            "concentration_states.started_at_round",
            row.get("started_at_round")?,
        )?,
        max_duration_rounds: match max_duration {
            Some(value) => Some(parse_int_column(
                "concentration_states.max_duration_rounds",
                value,
            )?),
            None => None,
        },
        save_dc_base: parse_int_column(
            "concentration_states.save_dc_base",
            row.get("save_dc_base")?,
        )?,
    };
    state.validate()?;
    Ok(state)
}
