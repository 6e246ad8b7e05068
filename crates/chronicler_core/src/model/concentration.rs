//! Concentration domain model and rules-facing value types.
//!
//! # Responsibility
//! - Define the active-concentration record and the request/result values
//!   exchanged with the rules service.
//!
//! # Invariants
//! - A character holds at most one active concentration at a time.
//! - `spell_level` stays within 0..=9.
//! - A `damage` break request always carries the damage amount and the
//!   caller-rolled d20 before it reaches storage.

use crate::model::{validate_id, validate_non_empty, ValidationError};
use serde::{Deserialize, Serialize};

/// Stable identifier for a character. Characters live outside this crate;
/// concentration rows hold only the reference.
pub type CharacterId = String;

/// Game-rule floor for concentration save difficulty.
pub const DEFAULT_SAVE_DC_BASE: u32 = 10;

const MAX_SPELL_LEVEL: u8 = 9;

/// Active concentration entry for one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationState {
    pub character_id: CharacterId,
    pub active_spell: String,
    /// Spell slot level, 0 (cantrip) through 9.
    pub spell_level: u8,
    /// Characters affected by the sustained effect.
    #[serde(default)]
    pub target_ids: Vec<CharacterId>,
    /// Round number concentration began. A fresh start begins a new episode
    /// with a new value.
    pub started_at_round: u32,
    /// Round count before the effect lapses on its own. `None` holds until
    /// broken.
    pub max_duration_rounds: Option<u32>,
    /// Floor for concentration save difficulty.
    pub save_dc_base: u32,
}

impl ConcentrationState {
    /// Creates an entry with defaults: no targets, indefinite duration,
    /// save DC floor of 10.
    pub fn new(
        character_id: impl Into<CharacterId>,
        active_spell: impl Into<String>,
        spell_level: u8,
        started_at_round: u32,
    ) -> Self {
        Self {
            character_id: character_id.into(),
            active_spell: active_spell.into(),
            spell_level,
            target_ids: Vec::new(),
            started_at_round,
            max_duration_rounds: None,
            save_dc_base: DEFAULT_SAVE_DC_BASE,
        }
    }

    /// Validates structural and semantic invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("concentration", "characterId", &self.character_id)?;
        validate_non_empty("concentration", "activeSpell", &self.active_spell)?;
        if self.spell_level > MAX_SPELL_LEVEL {
            return Err(ValidationError::OutOfRange {
                entity: "concentration",
                field: "spellLevel",
                message: format!("{} exceeds maximum {MAX_SPELL_LEVEL}", self.spell_level),
            });
        }
        for target in &self.target_ids {
            validate_id("concentration", "targetIds", target)?;
        }
        if self.max_duration_rounds == Some(0) {
            return Err(ValidationError::OutOfRange {
                entity: "concentration",
                field: "maxDurationRounds",
                message: "must be at least 1 round when set".to_string(),
            });
        }
        if self.save_dc_base == 0 {
            return Err(ValidationError::OutOfRange {
                entity: "concentration",
                field: "saveDcBase",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Why a concentration episode ended (or is being asked to end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakReason {
    /// Damage taken; resolves through a saving throw.
    Damage,
    /// Character became incapacitated.
    Incapacitated,
    /// Character died.
    Death,
    /// A new concentration spell replaced the old one.
    NewSpell,
    /// Caster chose to drop the effect.
    Voluntary,
    /// The effect ran out its maximum duration.
    Duration,
    /// The saving throw against damage failed.
    FailedSave,
}

impl BreakReason {
    /// Stable wire/storage name for this reason.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Damage => "damage",
            Self::Incapacitated => "incapacitated",
            Self::Death => "death",
            Self::NewSpell => "new_spell",
            Self::Voluntary => "voluntary",
            Self::Duration => "duration",
            Self::FailedSave => "failed_save",
        }
    }
}

/// Request to end (or test) one character's concentration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakConcentrationRequest {
    pub character_id: CharacterId,
    pub reason: BreakReason,
    /// Damage that triggered the check. Required when `reason` is `damage`.
    pub damage_amount: Option<u32>,
    /// Caller-rolled d20 result. Required when `reason` is `damage`.
    pub save_roll: Option<u32>,
    /// Constitution modifier added to the roll.
    #[serde(default)]
    pub constitution_modifier: i32,
    /// Current round number. Required when `reason` is `duration`.
    pub current_round: Option<u32>,
}

impl BreakConcentrationRequest {
    /// Creates a request with no save/round inputs attached.
    pub fn new(character_id: impl Into<CharacterId>, reason: BreakReason) -> Self {
        Self {
            character_id: character_id.into(),
            reason,
            damage_amount: None,
            save_roll: None,
            constitution_modifier: 0,
            current_round: None,
        }
    }

    /// Validates the request before any state is touched.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("break_concentration", "characterId", &self.character_id)?;
        match self.reason {
            BreakReason::Damage => {
                match self.damage_amount {
                    None => {
                        return Err(ValidationError::MissingField {
                            entity: "break_concentration",
                            field: "damageAmount",
                        });
                    }
                    Some(0) => {
                        return Err(ValidationError::OutOfRange {
                            entity: "break_concentration",
                            field: "damageAmount",
                            message: "must be at least 1".to_string(),
                        });
                    }
                    Some(_) => {}
                }
                match self.save_roll {
                    None => {
                        return Err(ValidationError::MissingField {
                            entity: "break_concentration",
                            field: "saveRoll",
                        });
                    }
                    Some(roll) if !(1..=20).contains(&roll) => {
                        return Err(ValidationError::OutOfRange {
                            entity: "break_concentration",
                            field: "saveRoll",
                            message: format!("{roll} is not a d20 result"),
                        });
                    }
                    Some(_) => {}
                }
            }
            BreakReason::Duration => {
                if self.current_round.is_none() {
                    return Err(ValidationError::MissingField {
                        entity: "break_concentration",
                        field: "currentRound",
                    });
                }
            }
            BreakReason::NewSpell | BreakReason::FailedSave => {
                return Err(ValidationError::InvalidValue {
                    entity: "break_concentration",
                    field: "reason",
                    message: format!(
                        "`{}` is derived during resolution and cannot be requested",
                        self.reason.as_str()
                    ),
                });
            }
            BreakReason::Incapacitated | BreakReason::Death | BreakReason::Voluntary => {}
        }
        Ok(())
    }
}

/// Outcome of a single concentration check or break attempt. Computed,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationCheckResult {
    pub character_id: CharacterId,
    /// Spell that was being sustained. `None` when the character had no
    /// active concentration.
    pub spell: Option<String>,
    pub broken: bool,
    /// Reason the episode ended. `None` while concentration holds.
    pub reason: Option<BreakReason>,
    pub save_roll: Option<u32>,
    pub save_dc: Option<u32>,
    pub save_total: Option<i64>,
    pub damage_amount: Option<u32>,
    pub constitution_modifier: Option<i32>,
}

impl ConcentrationCheckResult {
    /// Result for a character with no active concentration entry.
    pub(crate) fn no_active(character_id: &str) -> Self {
        Self {
            character_id: character_id.to_string(),
            spell: None,
            broken: false,
            reason: None,
            save_roll: None,
            save_dc: None,
            save_total: None,
            damage_amount: None,
            constitution_modifier: None,
        }
    }
}
