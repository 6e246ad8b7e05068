//! Concentration rules service.
//!
//! # Responsibility
//! - Drive the per-character concentration state machine: start, check,
//!   break.
//! - Delegate all row access to the concentration repository primitives.
//!
//! # Invariants
//! - Starting a new spell ends the prior episode with reason `new_spell`,
//!   recorded before the new row is written, in one transaction.
//! - A break request is validated before any state is touched.
//! - Saving-throw inputs arrive already rolled; this service never
//!   generates dice.

use crate::model::audit::AuditEvent;
use crate::model::concentration::{
    BreakConcentrationRequest, BreakReason, ConcentrationCheckResult, ConcentrationState,
};
use crate::model::ValidationError;
use crate::repo::audit_log::{self, ACTION_CONCENTRATION_BROKEN, ACTION_CONCENTRATION_STARTED};
use crate::repo::{concentration_repo, ensure_schema_current, RepoResult};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde_json::json;

/// Computes the save difficulty for a damage-triggered concentration check:
/// the higher of the rule floor and half the damage taken.
pub fn concentration_save_dc(save_dc_base: u32, damage_amount: u32) -> u32 {
    save_dc_base.max(damage_amount / 2)
}

/// Use-case service for the concentration state machine.
pub struct ConcentrationService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ConcentrationService<'conn> {
    /// Binds to a connection, rejecting schemas that are not current.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_current(conn)?;
        Ok(Self { conn })
    }

    /// Begins a new concentration episode for one character.
    ///
    /// Any prior active entry for that character is ended with reason
    /// `new_spell` and audited before the new row becomes visible. Returns
    /// the replaced prior state, if there was one.
    pub fn start_concentration(
        &self,
        state: &ConcentrationState,
        actor: Option<&str>,
    ) -> RepoResult<Option<ConcentrationState>> {
        state.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let previous = concentration_repo::get_state(&tx, &state.character_id)?;
        if let Some(previous) = &previous {
            concentration_repo::delete_state(&tx, &previous.character_id)?;
            audit_log::append(
                &tx,
                &AuditEvent {
                    action: ACTION_CONCENTRATION_BROKEN.to_string(),
                    actor_id: actor.map(str::to_string),
                    target_id: Some(previous.character_id.clone()),
                    detail: Some(json!({
                        "spell": previous.active_spell,
                        "reason": BreakReason::NewSpell.as_str(),
                        "replacedBy": state.active_spell,
                    })),
                },
            )?;
        }

        concentration_repo::insert_state(&tx, state)?;
        audit_log::append(
            &tx,
            &AuditEvent {
                action: ACTION_CONCENTRATION_STARTED.to_string(),
                actor_id: actor.map(str::to_string),
                target_id: Some(state.character_id.clone()),
                detail: Some(json!({
                    "spell": state.active_spell,
                    "spellLevel": state.spell_level,
                    "startedAtRound": state.started_at_round,
                    "maxDurationRounds": state.max_duration_rounds,
                    "saveDcBase": state.save_dc_base,
                })),
            },
        )?;

        tx.commit()?;
        Ok(previous)
    }

    /// Resolves a break request against the character's active entry.
    ///
    /// With no active entry this is a non-error no-op: the result reports
    /// nothing broken and the audit log is left untouched.
    pub fn break_concentration(
        &self,
        request: &BreakConcentrationRequest,
        actor: Option<&str>,
    ) -> RepoResult<ConcentrationCheckResult> {
        request.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let Some(active) = concentration_repo::get_state(&tx, &request.character_id)? else {
            return Ok(ConcentrationCheckResult::no_active(&request.character_id));
        };

        match request.reason {
            BreakReason::Damage => self.resolve_damage_check(tx, &active, request, actor),
            BreakReason::Duration => self.resolve_duration_expiry(tx, &active, request, actor),
            BreakReason::Incapacitated | BreakReason::Death | BreakReason::Voluntary => {
                end_episode(
                    tx,
                    &active,
                    actor,
                    json!({
                        "spell": active.active_spell,
                        "reason": request.reason.as_str(),
                    }),
                )?;
                Ok(ConcentrationCheckResult {
                    character_id: active.character_id.clone(),
                    spell: Some(active.active_spell.clone()),
                    broken: true,
                    reason: Some(request.reason),
                    save_roll: None,
                    save_dc: None,
                    save_total: None,
                    damage_amount: None,
                    constitution_modifier: None,
                })
            }
            BreakReason::NewSpell | BreakReason::FailedSave => {
                Err(ValidationError::InvalidValue {
                    entity: "break_concentration",
                    field: "reason",
                    message: format!(
                        "`{}` is derived during resolution and cannot be requested",
                        request.reason.as_str()
                    ),
                }
                .into())
            }
        }
    }

    /// Reads one character's active entry without touching state.
    pub fn active_concentration(
        &self,
        character_id: &str,
    ) -> RepoResult<Option<ConcentrationState>> {
        concentration_repo::get_state(self.conn, character_id)
    }

    fn resolve_damage_check(
        &self,
        tx: Transaction<'_>,
        active: &ConcentrationState,
        request: &BreakConcentrationRequest,
        actor: Option<&str>,
    ) -> RepoResult<ConcentrationCheckResult> {
        let (damage_amount, save_roll) = match (request.damage_amount, request.save_roll) {
            (Some(damage_amount), Some(save_roll)) => (damage_amount, save_roll),
            _ => {
                return Err(ValidationError::MissingField {
                    entity: "break_concentration",
                    field: "damageAmount",
                }
                .into());
            }
        };

        let save_dc = concentration_save_dc(active.save_dc_base, damage_amount);
        let save_total = i64::from(save_roll) + i64::from(request.constitution_modifier);
        let broken = save_total < i64::from(save_dc);

        if broken {
            end_episode(
                tx,
                active,
                actor,
                json!({
                    "spell": active.active_spell,
                    "reason": BreakReason::FailedSave.as_str(),
                    "damageAmount": damage_amount,
                    "saveRoll": save_roll,
                    "saveDc": save_dc,
                    "saveTotal": save_total,
                    "constitutionModifier": request.constitution_modifier,
                }),
            )?;
        }

        Ok(ConcentrationCheckResult {
            character_id: active.character_id.clone(),
            spell: Some(active.active_spell.clone()),
            broken,
            reason: broken.then_some(BreakReason::FailedSave),
            save_roll: Some(save_roll),
            save_dc: Some(save_dc),
            save_total: Some(save_total),
            damage_amount: Some(damage_amount),
            constitution_modifier: Some(request.constitution_modifier),
        })
    }

    fn resolve_duration_expiry(
        &self,
        tx: Transaction<'_>,
        active: &ConcentrationState,
        request: &BreakConcentrationRequest,
        actor: Option<&str>,
    ) -> RepoResult<ConcentrationCheckResult> {
        let Some(current_round) = request.current_round else {
            return Err(ValidationError::MissingField {
                entity: "break_concentration",
                field: "currentRound",
            }
            .into());
        };

        let expired = match active.max_duration_rounds {
            Some(max_duration) => {
                current_round.saturating_sub(active.started_at_round) >= max_duration
            }
            None => false,
        };

        if expired {
            end_episode(
                tx,
                active,
                actor,
                json!({
                    "spell": active.active_spell,
                    "reason": BreakReason::Duration.as_str(),
                    "startedAtRound": active.started_at_round,
                    "currentRound": current_round,
                    "maxDurationRounds": active.max_duration_rounds,
                }),
            )?;
        }

        Ok(ConcentrationCheckResult {
            character_id: active.character_id.clone(),
            spell: Some(active.active_spell.clone()),
            broken: expired,
            reason: expired.then_some(BreakReason::Duration),
            save_roll: None,
            save_dc: None,
            save_total: None,
            damage_amount: None,
            constitution_modifier: None,
        })
    }
}

/// Removes the active row and its `concentration_broken` record, committing
/// both together.
fn end_episode(
    tx: Transaction<'_>,
    active: &ConcentrationState,
    actor: Option<&str>,
    detail: serde_json::Value,
) -> RepoResult<()> {
    concentration_repo::delete_state(&tx, &active.character_id)?;
    audit_log::append(
        &tx,
        &AuditEvent {
            action: ACTION_CONCENTRATION_BROKEN.to_string(),
            actor_id: actor.map(str::to_string),
            target_id: Some(active.character_id.clone()),
            detail: Some(detail),
        },
    )?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::concentration_save_dc;

    #[test]
    fn save_dc_uses_floor_for_low_damage() {
        assert_eq!(concentration_save_dc(10, 4), 10);
        assert_eq!(concentration_save_dc(10, 19), 10);
    }

    #[test]
    fn save_dc_ties_at_twice_the_floor() {
        assert_eq!(concentration_save_dc(10, 20), 10);
    }

    #[test]
    fn save_dc_uses_half_damage_above_the_floor() {
        assert_eq!(concentration_save_dc(10, 30), 15);
        assert_eq!(concentration_save_dc(10, 31), 15);
        assert_eq!(concentration_save_dc(12, 30), 15);
    }
}
