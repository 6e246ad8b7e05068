//! Region domain model.
//!
//! # Responsibility
//! - Define the geographic/political region record owned by one world.
//!
//! # Invariants
//! - A region belongs to exactly one world for its whole lifetime.
//! - `owner_nation_id` and `control_level` change together; `None` owner
//!   means the region is unclaimed.

use crate::model::world::WorldId;
use crate::model::{validate_color, validate_id, validate_non_empty, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a region.
pub type RegionId = String;

/// Stable identifier for a controlling faction. Nation records live outside
/// this crate; regions hold only the reference.
pub type NationId = String;

/// Geographic region with political ownership state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: RegionId,
    /// Owning world. Never changes after creation.
    pub world_id: WorldId,
    pub name: String,
    /// Terrain/settlement category. Serialized as `type` to match the
    /// external contract naming.
    #[serde(rename = "type")]
    pub kind: String,
    pub centroid_x: f64,
    pub centroid_y: f64,
    /// Display color in `#RRGGBB` form.
    pub color: String,
    /// Controlling faction; `None` means unclaimed.
    pub owner_nation_id: Option<NationId>,
    /// Degree of political control. Defaults to 0 for new regions.
    #[serde(default)]
    pub control_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Region {
    /// Creates a new unclaimed region with a generated stable ID.
    pub fn new(
        world_id: impl Into<WorldId>,
        name: impl Into<String>,
        kind: impl Into<String>,
        centroid_x: f64,
        centroid_y: f64,
        color: impl Into<String>,
    ) -> Self {
        Self::with_id(
            Uuid::new_v4().to_string(),
            world_id,
            name,
            kind,
            centroid_x,
            centroid_y,
            color,
        )
    }

    /// Creates a new unclaimed region with a caller-provided stable ID.
    pub fn with_id(
        id: impl Into<RegionId>,
        world_id: impl Into<WorldId>,
        name: impl Into<String>,
        kind: impl Into<String>,
        centroid_x: f64,
        centroid_y: f64,
        color: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            world_id: world_id.into(),
            name: name.into(),
            kind: kind.into(),
            centroid_x,
            centroid_y,
            color: color.into(),
            owner_nation_id: None,
            control_level: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates structural and semantic invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("region", "id", &self.id)?;
        validate_id("region", "worldId", &self.world_id)?;
        validate_non_empty("region", "name", &self.name)?;
        validate_non_empty("region", "type", &self.kind)?;
        validate_color("region", "color", &self.color)?;
        if !self.centroid_x.is_finite() || !self.centroid_y.is_finite() {
            return Err(ValidationError::OutOfRange {
                entity: "region",
                field: "centroid",
                message: "coordinates must be finite".to_string(),
            });
        }
        if let Some(owner) = &self.owner_nation_id {
            validate_id("region", "ownerNationId", owner)?;
        }
        Ok(())
    }
}
