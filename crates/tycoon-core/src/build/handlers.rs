//! Server-side build command handlers.
//!
//! Every handler re-validates against the live cached plot record at commit
//! time; the preview shown on the client is advisory. A rejection leaves
//! plot state, profile and visuals untouched.

use log::info;
use rand::Rng;

use tycoon_logic::catalog::catalog_item;
use tycoon_logic::config::REFUND_RATIO;
use tycoon_logic::grid::{overlaps_existing, point_in_plot};
use tycoon_logic::placed::PlacedItem;
use tycoon_logic::raycast::rotation_to_quaternion;
use tycoon_logic::zones::has_minimum_setup;

use crate::build::session::{BuildMode, BuildSession};
use crate::errors::Rejection;
use crate::plot_state::PlotStateStore;
use crate::profile::ProfileStore;
use crate::store::KvBackend;
use crate::surface::WorldSurface;
use crate::types::{PlotId, ProfilePatch};

/// Result of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub placed_item_id: String,
    pub refund: i64,
}

fn new_item_id() -> String {
    format!("item_{:016x}", rand::thread_rng().gen::<u64>())
}

/// Claim `plot_id` for the session's player. Idempotent for the existing
/// owner; rejected while someone else holds the plot.
pub fn claim_plot<B: KvBackend>(
    plot_states: &mut PlotStateStore,
    profiles: &mut ProfileStore,
    backend: &B,
    session: &mut BuildSession,
    plot_id: PlotId,
    now: u64,
) -> Result<(), Rejection> {
    if plot_states.definition(plot_id).is_none() {
        return Err(Rejection::UnknownPlot);
    }
    let state = plot_states.ensure(backend, plot_id, now).clone();
    match state.owner_id.as_deref() {
        Some(owner) if owner != session.player_id => return Err(Rejection::NotPlotOwner),
        Some(_) => {}
        None => {
            let mut updated = state;
            updated.owner_id = Some(session.player_id.clone());
            plot_states.write(plot_id, updated, now);
            info!("plot {plot_id} claimed by {}", session.player_id);
        }
    }
    session.plot_id = Some(plot_id);
    profiles.patch(backend, &session.player_id, ProfilePatch::plot(Some(plot_id)), now);
    Ok(())
}

/// Commit the session's current preview as a placement.
pub fn place_item<B: KvBackend, S: WorldSurface>(
    plot_states: &mut PlotStateStore,
    profiles: &mut ProfileStore,
    backend: &B,
    surface: &mut S,
    session: &mut BuildSession,
    now: u64,
) -> Result<PlacedItem, Rejection> {
    let plot_id = session.plot_id.ok_or(Rejection::NoPlot)?;
    let def = plot_states
        .definition(plot_id)
        .ok_or(Rejection::UnknownPlot)?
        .clone();

    let catalog_id = match &session.mode {
        BuildMode::Place { catalog_id } => catalog_id.clone(),
        _ => return Err(Rejection::NoSelection),
    };
    let preview = session.preview.ok_or(Rejection::NoSelection)?;

    let state = plot_states.ensure(backend, plot_id, now).clone();
    if state.owner_id.as_deref() != Some(session.player_id.as_str()) {
        return Err(Rejection::NotPlotOwner);
    }
    let item = catalog_item(&catalog_id).ok_or(Rejection::UnknownItem(catalog_id.clone()))?;

    // The preview may be a tick stale; validate against the record we are
    // about to replace, not against what the client saw.
    if !point_in_plot(&def.bounds, preview.position) {
        return Err(Rejection::OutOfBounds);
    }
    if overlaps_existing(
        preview.position,
        item.footprint,
        session.rotation,
        &state.placed_items,
        None,
    ) {
        return Err(Rejection::Overlap);
    }

    profiles.try_spend(backend, &session.player_id, item.cost, now)?;

    // Paid for; everything past this point must succeed.
    let visual = surface.spawn_visual(
        item.model_uri,
        preview.position,
        rotation_to_quaternion(session.rotation),
    );
    let placed = PlacedItem {
        id: new_item_id(),
        catalog_id,
        position: preview.position,
        rotation: session.rotation,
        created_at: now,
        visual: Some(visual),
    };
    let mut updated = state;
    updated.placed_items.push(placed.clone());
    plot_states.write(plot_id, updated, now);
    info!(
        "placed {} ({}) on plot {plot_id} for ${}",
        placed.id, placed.catalog_id, item.cost
    );
    Ok(placed)
}

/// Delete a placed item: the explicit id if given, otherwise the session's
/// highlighted target. Refunds half the catalog cost, floored.
pub fn delete_item<B: KvBackend, S: WorldSurface>(
    plot_states: &mut PlotStateStore,
    profiles: &mut ProfileStore,
    backend: &B,
    surface: &mut S,
    session: &mut BuildSession,
    target: Option<String>,
    now: u64,
) -> Result<DeleteOutcome, Rejection> {
    let plot_id = session.plot_id.ok_or(Rejection::NoPlot)?;
    if plot_states.definition(plot_id).is_none() {
        return Err(Rejection::UnknownPlot);
    }
    let target_id = target
        .or_else(|| session.delete_target.clone())
        .ok_or(Rejection::NoDeleteTarget)?;

    let state = plot_states.ensure(backend, plot_id, now).clone();
    if state.owner_id.as_deref() != Some(session.player_id.as_str()) {
        return Err(Rejection::NotPlotOwner);
    }
    let index = state
        .placed_items
        .iter()
        .position(|i| i.id == target_id)
        .ok_or_else(|| Rejection::ItemNotFound(target_id.clone()))?;

    let mut updated = state;
    let removed = updated.placed_items.remove(index);
    // Items whose catalog entry has since vanished refund nothing.
    let refund = catalog_item(&removed.catalog_id)
        .map(|item| (item.cost as f64 * REFUND_RATIO).floor() as i64)
        .unwrap_or(0);

    if let Some(visual) = removed.visual {
        if session.highlight == Some(visual) {
            session.highlight = None;
        }
        surface.despawn_visual(visual);
    }
    session.delete_target = None;
    plot_states.write(plot_id, updated, now);
    profiles.credit(backend, &session.player_id, refund, now);
    info!("deleted {} from plot {plot_id}, refunded ${refund}", removed.id);
    Ok(DeleteOutcome {
        placed_item_id: removed.id,
        refund,
    })
}

/// Open or close the restaurant. Opening requires the minimum setup (one
/// stove, one table); closing is always allowed.
pub fn set_open<B: KvBackend>(
    plot_states: &mut PlotStateStore,
    profiles: &mut ProfileStore,
    backend: &B,
    session: &BuildSession,
    open: bool,
    now: u64,
) -> Result<bool, Rejection> {
    let plot_id = session.plot_id.ok_or(Rejection::NoPlot)?;
    if plot_states.definition(plot_id).is_none() {
        return Err(Rejection::UnknownPlot);
    }
    let state = plot_states.ensure(backend, plot_id, now).clone();
    if state.owner_id.as_deref() != Some(session.player_id.as_str()) {
        return Err(Rejection::NotPlotOwner);
    }
    if open && !has_minimum_setup(&state.placed_items) {
        return Err(Rejection::SetupIncomplete);
    }
    let mut updated = state;
    updated.is_open = open;
    plot_states.write(plot_id, updated, now);
    profiles.patch(
        backend,
        &session.player_id,
        ProfilePatch::restaurant_open(open),
        now,
    );
    info!("plot {plot_id} is now {}", if open { "open" } else { "closed" });
    Ok(open)
}
