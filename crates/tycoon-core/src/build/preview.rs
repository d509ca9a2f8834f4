//! Tick-driven preview pipeline.
//!
//! Every build tick: build the pointer ray from the player pose, ask the
//! world surface for a physics hit, resolve it to a floor point, snap to the
//! plot grid and validate. The result lands in the session so the next place
//! command commits exactly what the player saw.

use tycoon_logic::catalog::{catalog_item, CatalogItem};
use tycoon_logic::config::GRID_CELL_SIZE;
use tycoon_logic::geom::Vec3;
use tycoon_logic::grid::{
    clamp_to_plot, grid_cell_from_world, occupied_cells, overlaps_existing, placed_footprint,
    point_in_plot, snap_to_plot_grid,
};
use tycoon_logic::placed::PlacedItem;
use tycoon_logic::raycast::{
    pointer_ray, resolve_build_surface, rotation_to_quaternion, RAY_LENGTH,
};

use crate::build::session::{BuildMode, BuildSession, Preview};
use crate::surface::{Tint, WorldSurface};
use crate::types::PlotDefinition;

/// How far from the aimed cell delete targeting will reach for the nearest
/// item when the cell itself is empty.
const DELETE_SNAP_RADIUS: f32 = GRID_CELL_SIZE * 1.5;

/// Resolve the snapped build point for the current pose. Shared by the
/// placement preview and delete targeting. Aiming past the plot edge clamps
/// to the nearest border cell rather than going invalid.
fn surface_point<S: WorldSurface>(
    def: &PlotDefinition,
    session: &BuildSession,
    surface: &S,
) -> Vec3 {
    let ray = pointer_ray(session.position, session.look);
    let hit = surface.raycast(&ray, RAY_LENGTH);
    let point = resolve_build_surface(hit, &ray, def.floor_y());
    // Clamp before snapping so edge aims land on the border cell center.
    let mut snapped = snap_to_plot_grid(&def.bounds, clamp_to_plot(&def.bounds, point));
    snapped.y = def.floor_y();
    snapped
}

/// Compute the preview for a placement candidate.
pub fn compute_preview<S: WorldSurface>(
    def: &PlotDefinition,
    placed: &[PlacedItem],
    item: &CatalogItem,
    session: &BuildSession,
    surface: &S,
) -> Preview {
    let position = surface_point(def, session, surface);
    let valid = point_in_plot(&def.bounds, position)
        && !overlaps_existing(position, item.footprint, session.rotation, placed, None);
    Preview { position, valid }
}

/// The placed item under the cursor: the one whose footprint covers the
/// snapped cell, or failing that the nearest item within a short reach, so
/// slightly-off aims still pick something up.
pub fn delete_target<S: WorldSurface>(
    def: &PlotDefinition,
    placed: &[PlacedItem],
    session: &BuildSession,
    surface: &S,
) -> Option<String> {
    let point = surface_point(def, session, surface);
    let cell = grid_cell_from_world(point);
    if let Some(item) = placed.iter().find(|item| {
        occupied_cells(item.position, placed_footprint(item), item.rotation).contains(&cell)
    }) {
        return Some(item.id.clone());
    }
    placed
        .iter()
        .map(|item| (item, point.distance_xz(&item.position)))
        .filter(|(_, distance)| *distance <= DELETE_SNAP_RADIUS)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(item, _)| item.id.clone())
}

/// Advance one session's preview state and visuals for this tick.
pub fn tick_session<S: WorldSurface>(
    session: &mut BuildSession,
    def: &PlotDefinition,
    placed: &[PlacedItem],
    surface: &mut S,
) {
    match session.mode.clone() {
        BuildMode::Idle => {}
        BuildMode::Place { catalog_id } => {
            let Some(item) = catalog_item(&catalog_id) else {
                // Selection no longer exists in the catalog; drop the mode.
                session.exit_to_idle(surface);
                return;
            };
            let preview = compute_preview(def, placed, item, session, surface);
            let rotation = rotation_to_quaternion(session.rotation);
            let ghost = match session.ghost {
                Some(ghost) => {
                    surface.set_visual_pose(ghost, preview.position, rotation);
                    ghost
                }
                None => {
                    let ghost = surface.spawn_visual(item.model_uri, preview.position, rotation);
                    session.ghost = Some(ghost);
                    ghost
                }
            };
            let tint = if preview.valid {
                Tint::GHOST_VALID
            } else {
                Tint::GHOST_INVALID
            };
            surface.set_visual_tint(ghost, Some(tint));
            session.preview = Some(preview);
        }
        BuildMode::Delete => {
            let target = delete_target(def, placed, session, surface);
            let target_visual = target
                .as_deref()
                .and_then(|id| placed.iter().find(|item| item.id == id))
                .and_then(|item| item.visual);
            if session.highlight != target_visual {
                if let Some(old) = session.highlight.take() {
                    surface.set_visual_tint(old, None);
                }
                if let Some(new) = target_visual {
                    surface.set_visual_tint(new, Some(Tint::DELETE_TARGET));
                    session.highlight = Some(new);
                }
            }
            session.delete_target = target;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plots::default_plots;
    use crate::surface::{NullSurface, RecordingSurface};
    use tycoon_logic::catalog::item_types;
    use tycoon_logic::geom::{Quat, Rotation};

    fn plot() -> PlotDefinition {
        default_plots().remove(0)
    }

    fn placed(id: &str, catalog_id: &str, pos: Vec3, visual: Option<u64>) -> PlacedItem {
        PlacedItem {
            id: id.to_string(),
            catalog_id: catalog_id.to_string(),
            position: pos,
            rotation: Rotation::Deg0,
            created_at: 0,
            visual,
        }
    }

    fn session_at(x: f32, z: f32) -> BuildSession {
        let mut session = BuildSession::new("p1");
        // Hover above the point, looking straight down.
        session.set_pose(Vec3::new(x, 6.0, z), Vec3::new(0.0, -1.0, 0.0));
        session
    }

    #[test]
    fn preview_snaps_to_cell_center_on_floor() {
        let def = plot();
        let surface = NullSurface::default();
        let item = catalog_item(item_types::CHAIR).unwrap();
        let session = session_at(-4.2, 2.9);
        let preview = compute_preview(&def, &[], item, &session, &surface);
        assert_eq!(preview.position, Vec3::new(-4.5, def.floor_y(), 2.5));
        assert!(preview.valid);
    }

    #[test]
    fn aim_past_the_edge_clamps_to_the_border_cell() {
        let def = plot();
        let surface = NullSurface::default();
        let item = catalog_item(item_types::CHAIR).unwrap();
        let session = session_at(def.bounds.min.x - 8.0, 5.0);
        let preview = compute_preview(&def, &[], item, &session, &surface);
        assert_eq!(preview.position, Vec3::new(-4.5, def.floor_y(), 5.5));
        assert!(preview.valid);

        let session = session_at(def.bounds.max.x + 8.0, 5.0);
        let preview = compute_preview(&def, &[], item, &session, &surface);
        assert_eq!(preview.position, Vec3::new(4.5, def.floor_y(), 5.5));
        assert!(preview.valid);
    }

    #[test]
    fn preview_invalid_over_occupied_cell() {
        let def = plot();
        let surface = NullSurface::default();
        let item = catalog_item(item_types::CHAIR).unwrap();
        let existing = vec![placed(
            "a",
            item_types::STOVE,
            Vec3::new(-4.5, def.floor_y(), 2.5),
            None,
        )];
        let session = session_at(-4.4, 2.6);
        let preview = compute_preview(&def, &existing, item, &session, &surface);
        assert!(!preview.valid);
    }

    #[test]
    fn wall_hit_falls_back_to_floor_cell() {
        let def = plot();
        // Physics reports a hit well above the floor (a wall face).
        let surface = RecordingSurface::hitting(Vec3::new(-2.5, def.floor_y() + 3.0, 4.5));
        let item = catalog_item(item_types::CHAIR).unwrap();
        let session = session_at(-2.3, 4.4);
        let preview = compute_preview(&def, &[], item, &session, &surface);
        assert_eq!(preview.position.y, def.floor_y());
        assert_eq!(preview.position, Vec3::new(-2.5, def.floor_y(), 4.5));
    }

    #[test]
    fn tick_spawns_then_moves_one_ghost() {
        let def = plot();
        let mut surface = RecordingSurface::new();
        let mut session = session_at(-4.2, 2.9);
        session.enter_place(&mut surface, item_types::CHAIR);

        tick_session(&mut session, &def, &[], &mut surface);
        assert_eq!(surface.visual_count(), 1);
        let ghost = session.ghost.unwrap();

        session.set_pose(Vec3::new(-2.2, 6.0, 4.9), Vec3::new(0.0, -1.0, 0.0));
        tick_session(&mut session, &def, &[], &mut surface);
        assert_eq!(surface.visual_count(), 1);
        assert_eq!(
            surface.visuals[&ghost].position,
            Vec3::new(-2.5, def.floor_y(), 4.5)
        );
        assert_eq!(surface.visuals[&ghost].tint, Some(Tint::GHOST_VALID));
    }

    #[test]
    fn delete_mode_highlights_item_under_cursor() {
        let def = plot();
        let mut surface = RecordingSurface::new();
        let visual = surface.spawn_visual("m", Vec3::new(-4.5, 1.0, 2.5), Quat::IDENTITY);
        let items = vec![placed(
            "victim",
            item_types::CHAIR,
            Vec3::new(-4.5, def.floor_y(), 2.5),
            Some(visual),
        )];
        let mut session = session_at(-4.4, 2.6);
        session.enter_delete(&mut surface);

        tick_session(&mut session, &def, &items, &mut surface);
        assert_eq!(session.delete_target.as_deref(), Some("victim"));
        assert_eq!(surface.visuals[&visual].tint, Some(Tint::DELETE_TARGET));

        // Move off the item: highlight clears.
        session.set_pose(Vec3::new(-1.5, 6.0, 8.5), Vec3::new(0.0, -1.0, 0.0));
        tick_session(&mut session, &def, &items, &mut surface);
        assert_eq!(session.delete_target, None);
        assert_eq!(surface.visuals[&visual].tint, None);
    }

    #[test]
    fn delete_reaches_the_nearest_item_when_the_cell_is_empty() {
        let def = plot();
        let mut surface = NullSurface::default();
        let items = vec![placed(
            "lone",
            item_types::CHAIR,
            Vec3::new(-4.5, def.floor_y(), 2.5),
            None,
        )];
        // One cell off the item: nearest-within-reach still finds it.
        let mut session = session_at(-3.5, 2.5);
        session.enter_delete(&mut surface);
        tick_session(&mut session, &def, &items, &mut surface);
        assert_eq!(session.delete_target.as_deref(), Some("lone"));

        // Two cells off is out of reach.
        session.set_pose(Vec3::new(-2.5, 6.0, 2.5), Vec3::new(0.0, -1.0, 0.0));
        tick_session(&mut session, &def, &items, &mut surface);
        assert_eq!(session.delete_target, None);
    }

    #[test]
    fn delete_prefers_the_covered_cell_over_a_nearer_neighbor() {
        let def = plot();
        let surface = NullSurface::default();
        // Table covers the aimed cell; the chair one cell over is closer to
        // the table's anchor than the table itself, but the cell wins.
        let items = vec![
            placed("t", item_types::TABLE, Vec3::new(-4.5, def.floor_y(), 2.5), None),
            placed("c", item_types::CHAIR, Vec3::new(-2.5, def.floor_y(), 2.5), None),
        ];
        let session = session_at(-3.5, 2.5);
        assert_eq!(
            delete_target(&def, &items, &session, &surface).as_deref(),
            Some("t")
        );
    }

    #[test]
    fn multi_cell_item_is_targetable_on_any_cell() {
        let def = plot();
        let mut surface = NullSurface::default();
        let items = vec![placed(
            "t",
            item_types::TABLE,
            Vec3::new(-4.5, def.floor_y(), 2.5),
            None,
        )];
        // Table spans two cells along x; aim at the second one.
        let mut session = session_at(-3.5, 2.5);
        session.enter_delete(&mut surface);
        tick_session(&mut session, &def, &items, &mut surface);
        assert_eq!(session.delete_target.as_deref(), Some("t"));
    }
}
