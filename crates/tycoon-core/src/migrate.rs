//! Storage keys and lenient document decoding.
//!
//! Stored documents are plain JSON with every field defaulted, so records
//! written by older builds decode cleanly and get re-stamped with the current
//! schema version on their next write.

use log::warn;

use crate::store::Document;
use crate::types::{
    PlayerProfile, PlotId, PlotState, PLAYER_PROFILE_SCHEMA_VERSION, PLOT_STATE_SCHEMA_VERSION,
};

pub fn plot_state_key(plot_id: PlotId) -> String {
    format!("plotState:{plot_id}")
}

pub fn profile_key(player_id: &str) -> String {
    format!("profile:{player_id}")
}

impl Document for PlotState {
    fn migrate(value: serde_json::Value) -> Self {
        let mut state: PlotState = match serde_json::from_value(value) {
            Ok(state) => state,
            Err(e) => {
                warn!("unreadable plot state document, resetting: {e}");
                PlotState::new(None, 0)
            }
        };
        if state.schema_version > PLOT_STATE_SCHEMA_VERSION {
            warn!(
                "plot state schema {} is newer than supported {}",
                state.schema_version, PLOT_STATE_SCHEMA_VERSION
            );
        }
        state.rating = PlotState::clamp_rating(state.rating);
        state
    }

    fn stamp(&mut self, now: u64) {
        self.schema_version = PLOT_STATE_SCHEMA_VERSION;
        self.updated_at = now;
    }
}

impl Document for PlayerProfile {
    fn migrate(value: serde_json::Value) -> Self {
        let mut profile: PlayerProfile = match serde_json::from_value(value) {
            Ok(profile) => profile,
            Err(e) => {
                warn!("unreadable profile document, resetting: {e}");
                PlayerProfile::new(0)
            }
        };
        if profile.schema_version > PLAYER_PROFILE_SCHEMA_VERSION {
            warn!(
                "profile schema {} is newer than supported {}",
                profile.schema_version, PLAYER_PROFILE_SCHEMA_VERSION
            );
        }
        // Pre-versioning profiles may predate the unlock list.
        if profile.unlocks.is_empty() {
            profile.unlocks.push("dish_burger".to_string());
        }
        profile
    }

    fn stamp(&mut self, now: u64) {
        self.schema_version = PLAYER_PROFILE_SCHEMA_VERSION;
        self.updated_at = now;
    }
}
