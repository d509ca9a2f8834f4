//! Per-player build session state.
//!
//! A session tracks what the player is doing with the build tools right now:
//! nothing, previewing a catalog item, or hunting for something to delete.
//! Ghost and highlight visuals are owned by the session and torn down on
//! every mode change so a stale ghost can never outlive its mode.

use tycoon_logic::geom::{Rotation, Vec3};

use crate::surface::WorldSurface;
use crate::types::{PlayerId, PlotId};

/// What the build tools are currently doing for this player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    Idle,
    /// Previewing `catalog_id` under the cursor.
    Place { catalog_id: String },
    /// Highlighting placed items for deletion.
    Delete,
}

/// Snapped preview for the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preview {
    pub position: Vec3,
    pub valid: bool,
}

#[derive(Debug)]
pub struct BuildSession {
    pub player_id: PlayerId,
    pub plot_id: Option<PlotId>,
    pub mode: BuildMode,
    pub rotation: Rotation,
    /// Player pose driving the pointer ray.
    pub position: Vec3,
    pub look: Vec3,
    /// Result of the last preview tick; place commands commit this.
    pub preview: Option<Preview>,
    /// Placed item currently highlighted for deletion.
    pub delete_target: Option<String>,
    /// Ghost visual handle, if one is up.
    pub(crate) ghost: Option<u64>,
    /// Visual currently carrying the delete highlight tint.
    pub(crate) highlight: Option<u64>,
}

impl BuildSession {
    pub fn new(player_id: impl Into<PlayerId>) -> Self {
        Self {
            player_id: player_id.into(),
            plot_id: None,
            mode: BuildMode::Idle,
            rotation: Rotation::Deg0,
            position: Vec3::ZERO,
            look: Vec3::new(0.0, -1.0, 0.0),
            preview: None,
            delete_target: None,
            ghost: None,
            highlight: None,
        }
    }

    pub fn set_pose(&mut self, position: Vec3, look: Vec3) {
        self.position = position;
        self.look = look;
    }

    /// Switch to placement preview for `catalog_id`. Rotation carries over
    /// between selections within one session.
    pub fn enter_place<S: WorldSurface>(&mut self, surface: &mut S, catalog_id: impl Into<String>) {
        self.clear_visuals(surface);
        self.mode = BuildMode::Place {
            catalog_id: catalog_id.into(),
        };
        self.preview = None;
        self.delete_target = None;
    }

    pub fn enter_delete<S: WorldSurface>(&mut self, surface: &mut S) {
        self.clear_visuals(surface);
        self.mode = BuildMode::Delete;
        self.preview = None;
        self.delete_target = None;
    }

    pub fn exit_to_idle<S: WorldSurface>(&mut self, surface: &mut S) {
        self.clear_visuals(surface);
        self.mode = BuildMode::Idle;
        self.preview = None;
        self.delete_target = None;
    }

    /// Advance the preview rotation one quarter turn.
    pub fn rotate(&mut self) {
        self.rotation = self.rotation.next();
    }

    /// Tear down ghost and highlight visuals. Highlight clearing resets the
    /// tint rather than despawning; the visual belongs to the placed item.
    pub(crate) fn clear_visuals<S: WorldSurface>(&mut self, surface: &mut S) {
        if let Some(ghost) = self.ghost.take() {
            surface.despawn_visual(ghost);
        }
        if let Some(highlight) = self.highlight.take() {
            surface.set_visual_tint(highlight, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{NullSurface, RecordingSurface, Tint};
    use tycoon_logic::geom::Quat;

    #[test]
    fn mode_changes_reset_preview_state() {
        let mut surface = NullSurface::default();
        let mut session = BuildSession::new("p1");
        session.enter_place(&mut surface, "table");
        session.preview = Some(Preview {
            position: Vec3::ZERO,
            valid: true,
        });
        session.enter_delete(&mut surface);
        assert_eq!(session.preview, None);
        assert_eq!(session.mode, BuildMode::Delete);
    }

    #[test]
    fn rotation_survives_reselect() {
        let mut surface = NullSurface::default();
        let mut session = BuildSession::new("p1");
        session.rotate();
        session.enter_place(&mut surface, "chair");
        assert_eq!(session.rotation, Rotation::Deg90);
    }

    #[test]
    fn exit_despawns_ghost_and_clears_highlight() {
        let mut surface = RecordingSurface::new();
        let mut session = BuildSession::new("p1");
        let ghost = surface.spawn_visual("g", Vec3::ZERO, Quat::IDENTITY);
        let placed = surface.spawn_visual("t", Vec3::ZERO, Quat::IDENTITY);
        surface.set_visual_tint(placed, Some(Tint::DELETE_TARGET));
        session.ghost = Some(ghost);
        session.highlight = Some(placed);

        session.exit_to_idle(&mut surface);
        assert_eq!(surface.despawned, vec![ghost]);
        assert_eq!(surface.visuals[&placed].tint, None);
        assert_eq!(session.ghost, None);
    }
}
