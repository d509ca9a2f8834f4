//! Persisted record types: plot definitions, plot state, player profiles.
//!
//! Persisted records are schema-versioned and mutated only by whole-value
//! replacement (copy-on-write) so cache/persistence diffing stays safe.

use serde::{Deserialize, Serialize};

use tycoon_logic::config::{PLOT_FLOOR_Y, RATING_MAX, STARTING_CASH};
use tycoon_logic::geom::{Aabb, Vec3};
use tycoon_logic::placed::PlacedItem;

pub type PlotId = u32;
pub type PlayerId = String;

pub const PLOT_STATE_SCHEMA_VERSION: u32 = 1;
pub const PLAYER_PROFILE_SCHEMA_VERSION: u32 = 1;

/// Immutable plot definition: bounds, spawn, entrance. Built once at startup
/// from static configuration; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotDefinition {
    pub plot_id: PlotId,
    pub bounds: Aabb,
    pub spawn: Vec3,
    pub entrance: Vec3,
}

impl PlotDefinition {
    /// Floor height for building on this plot.
    pub fn floor_y(&self) -> f32 {
        self.bounds.min.y
    }
}

/// Full per-plot persisted state: placed items, restaurant open flag, rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotState {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub updated_at: u64,
    #[serde(default)]
    pub owner_id: Option<PlayerId>,
    #[serde(default)]
    pub placed_items: Vec<PlacedItem>,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub rating: f32,
}

impl PlotState {
    /// Fresh state for a plot that has never been persisted.
    pub fn new(owner_id: Option<PlayerId>, now: u64) -> Self {
        Self {
            schema_version: PLOT_STATE_SCHEMA_VERSION,
            updated_at: now,
            owner_id,
            placed_items: Vec::new(),
            is_open: false,
            rating: 0.0,
        }
    }

    /// Rating clamped into [0, RATING_MAX]; applied on every rating change.
    pub fn clamp_rating(rating: f32) -> f32 {
        rating.clamp(0.0, RATING_MAX)
    }
}

/// Per-player persisted profile. The engine only touches the fields below,
/// through [`ProfilePatch`], never unrelated profile data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub updated_at: u64,
    #[serde(default)]
    pub cash: i64,
    #[serde(default)]
    pub unlocks: Vec<String>,
    #[serde(default)]
    pub staff: Vec<String>,
    #[serde(default)]
    pub plot_id: Option<PlotId>,
    #[serde(default)]
    pub restaurant_open: bool,
}

impl PlayerProfile {
    /// Fresh profile: starting cash and the starter dish unlocked.
    pub fn new(now: u64) -> Self {
        Self {
            schema_version: PLAYER_PROFILE_SCHEMA_VERSION,
            updated_at: now,
            cash: STARTING_CASH,
            unlocks: vec!["dish_burger".to_string()],
            staff: Vec::new(),
            plot_id: None,
            restaurant_open: false,
        }
    }
}

/// Narrow update contract for profiles: only the listed fields can change,
/// and an update replaces the whole record (no in-place mutation).
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub cash: Option<i64>,
    pub unlocks: Option<Vec<String>>,
    pub staff: Option<Vec<String>>,
    pub plot_id: Option<Option<PlotId>>,
    pub restaurant_open: Option<bool>,
}

impl ProfilePatch {
    pub fn cash(value: i64) -> Self {
        Self {
            cash: Some(value),
            ..Self::default()
        }
    }

    pub fn plot(plot_id: Option<PlotId>) -> Self {
        Self {
            plot_id: Some(plot_id),
            ..Self::default()
        }
    }

    pub fn restaurant_open(open: bool) -> Self {
        Self {
            restaurant_open: Some(open),
            ..Self::default()
        }
    }

    /// Apply this patch to a copy of `profile`, stamping version and time.
    pub fn apply(self, profile: &PlayerProfile, now: u64) -> PlayerProfile {
        let mut updated = profile.clone();
        if let Some(cash) = self.cash {
            updated.cash = cash;
        }
        if let Some(unlocks) = self.unlocks {
            updated.unlocks = unlocks;
        }
        if let Some(staff) = self.staff {
            updated.staff = staff;
        }
        if let Some(plot_id) = self.plot_id {
            updated.plot_id = plot_id;
        }
        if let Some(open) = self.restaurant_open {
            updated.restaurant_open = open;
        }
        updated.schema_version = PLAYER_PROFILE_SCHEMA_VERSION;
        updated.updated_at = now;
        updated
    }
}

/// Default world-space height used when a plot definition is unavailable.
pub fn default_ground_y() -> f32 {
    PLOT_FLOOR_Y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_touches_only_named_fields() {
        let profile = PlayerProfile::new(100);
        let updated = ProfilePatch::cash(42).apply(&profile, 200);
        assert_eq!(updated.cash, 42);
        assert_eq!(updated.unlocks, profile.unlocks);
        assert_eq!(updated.plot_id, None);
        assert_eq!(updated.updated_at, 200);
    }

    #[test]
    fn patch_can_clear_plot_assignment() {
        let mut profile = PlayerProfile::new(0);
        profile.plot_id = Some(3);
        let updated = ProfilePatch::plot(None).apply(&profile, 1);
        assert_eq!(updated.plot_id, None);
    }

    #[test]
    fn rating_clamps_to_range() {
        assert_eq!(PlotState::clamp_rating(-0.3), 0.0);
        assert_eq!(PlotState::clamp_rating(9.0), RATING_MAX);
        assert_eq!(PlotState::clamp_rating(2.5), 2.5);
    }
}
