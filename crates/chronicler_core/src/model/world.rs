//! World domain model.
//!
//! # Responsibility
//! - Define the top-level campaign world record and its validation rules.
//! - Model open-ended environment attributes without losing type safety.
//!
//! # Invariants
//! - `width` and `height` are strictly positive.
//! - `environment` keys are non-empty; unrecognized keys are permitted.

use crate::model::{validate_id, validate_non_empty, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Stable identifier for a campaign world. Supplied by callers; stable for
/// the lifetime of the world.
pub type WorldId = String;

/// Environment attribute keys the assistant understands today. Callers may
/// store additional keys; these are merely the recognized vocabulary.
pub const RECOGNIZED_ENVIRONMENT_KEYS: &[&str] =
    &["date", "time_of_day", "season", "weather", "lighting"];

/// Top-level campaign world record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct World {
    /// Stable global ID used for linking regions and auditing.
    pub id: WorldId,
    pub name: String,
    /// Deterministic generation seed.
    pub seed: i64,
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Free-form environment attributes (date, weather, lighting, ...).
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl World {
    /// Creates a new world with a generated stable ID and current timestamps.
    pub fn new(name: impl Into<String>, seed: i64, width: u32, height: u32) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, seed, width, height)
    }

    /// Creates a new world with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: impl Into<WorldId>,
        name: impl Into<String>,
        seed: i64,
        width: u32,
        height: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            seed,
            width,
            height,
            environment: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates structural and semantic invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("world", "id", &self.id)?;
        validate_non_empty("world", "name", &self.name)?;
        if self.width == 0 {
            return Err(ValidationError::OutOfRange {
                entity: "world",
                field: "width",
                message: "must be greater than 0".to_string(),
            });
        }
        if self.height == 0 {
            return Err(ValidationError::OutOfRange {
                entity: "world",
                field: "height",
                message: "must be greater than 0".to_string(),
            });
        }
        for key in self.environment.keys() {
            if key.trim().is_empty() {
                return Err(ValidationError::MissingField {
                    entity: "world",
                    field: "environment key",
                });
            }
        }
        Ok(())
    }
}
