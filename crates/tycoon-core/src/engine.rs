//! Tycoon engine - main entry point wiring every subsystem together.
//!
//! One engine instance owns the storage backend, the world surface, the
//! plot/profile caches, every player's build session, the per-plot sims and
//! the NPC population. The hosting runtime drives it with pose updates,
//! commands and a frequent `update(now, delta_ms)` call; everything else is
//! internal cadence.

use std::collections::HashMap;

use log::info;

use tycoon_logic::catalog::catalog_item;
use tycoon_logic::config::{
    menu_dish, SIM_RATING_SUCCESS_DELTA, SIM_RATING_WALKOUT_PENALTY, SIM_TICK_INTERVAL_MS,
};
use tycoon_logic::geom::Vec3;
use tycoon_logic::placed::PlacedItem;
use tycoon_logic::raycast::rotation_to_quaternion;

use crate::build::handlers::{claim_plot, delete_item, place_item, set_open};
use crate::build::preview::tick_session;
use crate::build::{BuildCommand, BuildSession};
use crate::errors::Rejection;
use crate::plot_state::PlotStateStore;
use crate::plots::default_plots;
use crate::profile::ProfileStore;
use crate::sim::interact::interact;
use crate::sim::npc::NpcPopulation;
use crate::sim::state::PlotSimState;
use crate::sim::tick::{tick_plot, SimEvent};
use crate::sim::InteractOutcome;
use crate::store::{KvBackend, MemoryKv};
use crate::surface::{NullSurface, WorldSurface};
use crate::types::{PlayerId, PlayerProfile, PlotDefinition, PlotId, PlotState};

/// Something observable that the engine did, for harnesses and UIs.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PlotClaimed { plot_id: PlotId, player_id: PlayerId },
    ItemPlaced { plot_id: PlotId, placed_item_id: String, catalog_id: String },
    ItemDeleted { plot_id: PlotId, placed_item_id: String, refund: i64 },
    RestaurantOpened { plot_id: PlotId },
    RestaurantClosed { plot_id: PlotId },
    Sim { plot_id: PlotId, event: SimEvent },
}

/// The authoritative game engine.
pub struct TycoonEngine<B = MemoryKv, S = NullSurface> {
    backend: B,
    surface: S,
    plot_states: PlotStateStore,
    profiles: ProfileStore,
    sessions: HashMap<PlayerId, BuildSession>,
    sims: HashMap<PlotId, PlotSimState>,
    /// Order each player is carrying. In-memory only; hands empty on rejoin.
    carrying: HashMap<PlayerId, u64>,
    npcs: NpcPopulation,
    events: Vec<EngineEvent>,
    now: u64,
}

impl TycoonEngine<MemoryKv, NullSurface> {
    /// Engine with in-memory storage and no world: tests and harnesses.
    pub fn headless() -> Self {
        Self::new(MemoryKv::new(), NullSurface::default(), default_plots())
    }
}

impl<B: KvBackend, S: WorldSurface> TycoonEngine<B, S> {
    pub fn new(backend: B, surface: S, plots: Vec<PlotDefinition>) -> Self {
        Self {
            backend,
            surface,
            plot_states: PlotStateStore::new(plots),
            profiles: ProfileStore::new(),
            sessions: HashMap::new(),
            sims: HashMap::new(),
            carrying: HashMap::new(),
            npcs: NpcPopulation::new(),
            events: Vec::new(),
            now: 0,
        }
    }

    // --- Player lifecycle ---

    /// A player joins: reattach them to the plot their profile remembers,
    /// otherwise claim the first free one. Returns `None` when every plot is
    /// taken; the player stays in the lobby with no plot on their profile.
    pub fn join(&mut self, player_id: &str) -> Option<PlotId> {
        let now = self.now;
        let saved_plot = self.profiles.ensure(&self.backend, player_id, now).plot_id;
        let session = self
            .sessions
            .entry(player_id.to_string())
            .or_insert_with(|| BuildSession::new(player_id));

        // Reattach when the saved plot is still theirs.
        if let Some(plot_id) = saved_plot {
            if self.plot_states.definition(plot_id).is_some() {
                self.plot_states.ensure(&self.backend, plot_id, now);
                if self.plot_states.is_owner(plot_id, player_id) {
                    session.plot_id = Some(plot_id);
                    self.events.push(EngineEvent::PlotClaimed {
                        plot_id,
                        player_id: player_id.to_string(),
                    });
                    info!("{player_id} reattached to plot {plot_id}");
                    return Some(plot_id);
                }
            }
        }

        // Claim the first unowned plot.
        let candidates: Vec<PlotId> = self
            .plot_states
            .definitions()
            .iter()
            .map(|d| d.plot_id)
            .collect();
        for plot_id in candidates {
            self.plot_states.ensure(&self.backend, plot_id, now);
            let free = self
                .plot_states
                .get(plot_id)
                .map(|s| s.owner_id.is_none())
                .unwrap_or(false);
            if !free {
                continue;
            }
            if claim_plot(
                &mut self.plot_states,
                &mut self.profiles,
                &self.backend,
                session,
                plot_id,
                now,
            )
            .is_ok()
            {
                self.events.push(EngineEvent::PlotClaimed {
                    plot_id,
                    player_id: player_id.to_string(),
                });
                return Some(plot_id);
            }
        }

        // World is full: lobby, and drop any stale plot from the profile.
        self.profiles
            .patch(&self.backend, player_id, crate::types::ProfilePatch::plot(None), now);
        info!("{player_id} joined the lobby, no plot free");
        None
    }

    /// A player disconnects: their restaurant closes, their NPCs despawn,
    /// and everything dirty is flushed immediately.
    pub fn leave(&mut self, player_id: &str) {
        let now = self.now;
        self.carrying.remove(player_id);
        let Some(mut session) = self.sessions.remove(player_id) else {
            return;
        };
        session.exit_to_idle(&mut self.surface);
        if let Some(plot_id) = session.plot_id {
            if self.plot_states.is_owner(plot_id, player_id) {
                if let Err(e) = set_open(
                    &mut self.plot_states,
                    &mut self.profiles,
                    &self.backend,
                    &session,
                    false,
                    now,
                ) {
                    info!("close on leave skipped for plot {plot_id}: {e}");
                }
                self.close_plot_sim(plot_id);
            }
        }
        self.flush();
        info!("{player_id} left");
    }

    /// Latest player position and look direction; drives the pointer ray.
    pub fn update_player_pose(&mut self, player_id: &str, position: Vec3, look: Vec3) {
        if let Some(session) = self.sessions.get_mut(player_id) {
            session.set_pose(position, look);
        }
    }

    // --- Commands ---

    pub fn command(&mut self, player_id: &str, command: BuildCommand) -> Result<(), Rejection> {
        let now = self.now;
        let session = self
            .sessions
            .get_mut(player_id)
            .ok_or(Rejection::NoPlot)?;
        match command {
            BuildCommand::SelectItem { catalog_id } => {
                if catalog_item(&catalog_id).is_none() {
                    return Err(Rejection::UnknownItem(catalog_id));
                }
                session.enter_place(&mut self.surface, catalog_id);
                Ok(())
            }
            BuildCommand::Rotate => {
                session.rotate();
                Ok(())
            }
            BuildCommand::Place => {
                let placed = place_item(
                    &mut self.plot_states,
                    &mut self.profiles,
                    &self.backend,
                    &mut self.surface,
                    session,
                    now,
                )?;
                let plot_id = session.plot_id.unwrap_or_default();
                self.events.push(EngineEvent::ItemPlaced {
                    plot_id,
                    placed_item_id: placed.id,
                    catalog_id: placed.catalog_id,
                });
                Ok(())
            }
            BuildCommand::StartDelete => {
                session.enter_delete(&mut self.surface);
                Ok(())
            }
            BuildCommand::Delete { placed_item_id } => {
                let outcome = delete_item(
                    &mut self.plot_states,
                    &mut self.profiles,
                    &self.backend,
                    &mut self.surface,
                    session,
                    placed_item_id,
                    now,
                )?;
                let plot_id = session.plot_id.unwrap_or_default();
                self.events.push(EngineEvent::ItemDeleted {
                    plot_id,
                    placed_item_id: outcome.placed_item_id,
                    refund: outcome.refund,
                });
                Ok(())
            }
            BuildCommand::Cancel => {
                session.exit_to_idle(&mut self.surface);
                Ok(())
            }
        }
    }

    /// Open or close the player's restaurant.
    pub fn set_restaurant_open(&mut self, player_id: &str, open: bool) -> Result<(), Rejection> {
        let now = self.now;
        let session = self.sessions.get(player_id).ok_or(Rejection::NoPlot)?;
        let plot_id = session.plot_id.ok_or(Rejection::NoPlot)?;
        set_open(
            &mut self.plot_states,
            &mut self.profiles,
            &self.backend,
            session,
            open,
            now,
        )?;
        if open {
            self.sims.insert(plot_id, PlotSimState::new(plot_id, now));
            self.events.push(EngineEvent::RestaurantOpened { plot_id });
        } else {
            self.close_plot_sim(plot_id);
            self.events.push(EngineEvent::RestaurantClosed { plot_id });
        }
        Ok(())
    }

    /// Player presses interact: cook or pick up at a stove, deliver the
    /// carried order at its customer's table.
    pub fn interact(&mut self, player_id: &str) -> Result<InteractOutcome, Rejection> {
        let now = self.now;
        let session = self.sessions.get(player_id).ok_or(Rejection::NoPlot)?;
        let plot_id = session.plot_id.ok_or(Rejection::NoPlot)?;
        let position = session.position;
        let state = self
            .plot_states
            .get(plot_id)
            .ok_or(Rejection::UnknownPlot)?
            .clone();
        let sim = self.sims.get_mut(&plot_id).ok_or(Rejection::NothingNearby)?;
        let mut carried = self.carrying.get(player_id).copied();
        let result = interact(sim, &state, &mut carried, position, now);
        // Write the hands back even on a rejection; a stale carry clears.
        match carried {
            Some(order_id) => {
                self.carrying.insert(player_id.to_string(), order_id);
            }
            None => {
                self.carrying.remove(player_id);
            }
        }
        let (outcome, event) = result?;

        if let InteractOutcome::Served { price, .. } = outcome {
            self.apply_service_result(plot_id, &state, price, true);
        }
        self.events.push(EngineEvent::Sim { plot_id, event });
        Ok(outcome)
    }

    // --- Update loop ---

    /// Advance the whole engine to `now`. Call at NPC-tick frequency; the
    /// slower cadences (sim passes, flush debounce) gate themselves.
    pub fn update(&mut self, now: u64, delta_ms: u64) {
        self.now = now;
        self.tick_previews();
        self.tick_sims(now);

        let open_plots: Vec<(PlotDefinition, Vec<PlacedItem>)> = self
            .plot_states
            .definitions()
            .iter()
            .filter_map(|def| {
                let state = self.plot_states.get(def.plot_id)?;
                state
                    .is_open
                    .then(|| (def.clone(), state.placed_items.clone()))
            })
            .collect();
        self.npcs.update(&open_plots, now, delta_ms, &mut self.surface);

        self.plot_states.flush_due(&mut self.backend, now);
        self.profiles.flush_due(&mut self.backend, now);
    }

    fn tick_previews(&mut self) {
        for session in self.sessions.values_mut() {
            let Some(plot_id) = session.plot_id else {
                continue;
            };
            let Some(def) = self.plot_states.definition(plot_id).cloned() else {
                continue;
            };
            let placed = self
                .plot_states
                .get(plot_id)
                .map(|s| s.placed_items.clone())
                .unwrap_or_default();
            tick_session(session, &def, &placed, &mut self.surface);
        }
    }

    fn tick_sims(&mut self, now: u64) {
        let due: Vec<PlotId> = self
            .sims
            .values()
            .filter(|sim| now.saturating_sub(sim.last_tick_at) >= SIM_TICK_INTERVAL_MS)
            .map(|sim| sim.plot_id)
            .collect();
        for plot_id in due {
            let Some(state) = self.plot_states.get(plot_id).cloned() else {
                continue;
            };
            let dishes = self.dishes_for(&state);
            let Some(sim) = self.sims.get_mut(&plot_id) else {
                continue;
            };
            let events = tick_plot(sim, &state, &dishes, now);
            for event in events {
                if matches!(event, SimEvent::Walkout { .. }) {
                    self.apply_service_result(plot_id, &state, 0, false);
                }
                self.events.push(EngineEvent::Sim { plot_id, event });
            }
        }
    }

    /// Dishes new orders may ask for: the owner's unlocked ids that exist on
    /// the menu. The tick picks one at random per order.
    fn dishes_for(&self, state: &PlotState) -> Vec<String> {
        state
            .owner_id
            .as_deref()
            .and_then(|owner| self.profiles.get(owner))
            .map(|profile| {
                profile
                    .unlocks
                    .iter()
                    .filter(|dish| menu_dish(dish).is_some())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Apply the money/rating consequences of a completed or failed order.
    fn apply_service_result(&mut self, plot_id: PlotId, state: &PlotState, price: i64, success: bool) {
        let now = self.now;
        let mut updated = match self.plot_states.get(plot_id) {
            Some(current) => current.clone(),
            None => return,
        };
        let delta = if success {
            SIM_RATING_SUCCESS_DELTA
        } else {
            -SIM_RATING_WALKOUT_PENALTY
        };
        updated.rating = PlotState::clamp_rating(updated.rating + delta);
        self.plot_states.write(plot_id, updated, now);
        if success && price > 0 {
            if let Some(owner) = state.owner_id.as_deref() {
                self.profiles.credit(&self.backend, owner, price, now);
            }
        }
    }

    fn close_plot_sim(&mut self, plot_id: PlotId) {
        self.sims.remove(&plot_id);
        // The next opening restarts order ids, so a held order would alias.
        if let Some(owner) = self.plot_states.get(plot_id).and_then(|s| s.owner_id.clone()) {
            self.carrying.remove(&owner);
        }
        self.npcs.despawn_plot(plot_id, &mut self.surface);
    }

    /// Respawn world visuals for every placed item on `plot_id` and refresh
    /// the stored handles. Used after loading state that has none.
    fn rebuild_plot_visuals(&mut self, plot_id: PlotId) {
        let now = self.now;
        let Some(state) = self.plot_states.get(plot_id) else {
            return;
        };
        let mut updated = state.clone();
        for item in updated.placed_items.iter_mut() {
            item.visual = catalog_item(&item.catalog_id).map(|entry| {
                self.surface.spawn_visual(
                    entry.model_uri,
                    item.position,
                    rotation_to_quaternion(item.rotation),
                )
            });
        }
        self.plot_states.write(plot_id, updated, now);
    }

    // --- Introspection ---

    pub fn plot_state(&self, plot_id: PlotId) -> Option<&PlotState> {
        self.plot_states.get(plot_id)
    }

    pub fn profile(&self, player_id: &str) -> Option<&PlayerProfile> {
        self.profiles.get(player_id)
    }

    pub fn sim(&self, plot_id: PlotId) -> Option<&PlotSimState> {
        self.sims.get(&plot_id)
    }

    pub fn session(&self, player_id: &str) -> Option<&BuildSession> {
        self.sessions.get(player_id)
    }

    /// Order the player is carrying, if any.
    pub fn carrying(&self, player_id: &str) -> Option<u64> {
        self.carrying.get(player_id).copied()
    }

    pub fn npc_count(&self) -> usize {
        self.npcs.count()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Drain the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Flush everything dirty to storage immediately (shutdown path).
    pub fn flush(&mut self) {
        let now = self.now;
        self.plot_states.flush_all(&mut self.backend, now);
        self.profiles.flush_all(&mut self.backend, now);
    }

    pub(crate) fn cached_plot_states(&self) -> Vec<(PlotId, PlotState)> {
        self.plot_states
            .definitions()
            .iter()
            .filter_map(|def| {
                self.plot_states
                    .get(def.plot_id)
                    .map(|state| (def.plot_id, state.clone()))
            })
            .collect()
    }

    pub(crate) fn cached_profiles(&self) -> Vec<(PlayerId, PlayerProfile)> {
        self.profiles.cached()
    }

    pub(crate) fn sims_for_snapshot(&self) -> Vec<PlotSimState> {
        self.sims.values().cloned().collect()
    }

    pub(crate) fn npc_snapshots(&self) -> Vec<crate::sim::npc::NpcSnapshot> {
        self.npcs.snapshot()
    }

    /// Save the live world (sims and NPCs included) to a writer.
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), crate::persistence::SnapshotError> {
        crate::persistence::save_world(writer, self)
    }

    /// Restore a live world saved with [`Self::save`].
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), crate::persistence::SnapshotError> {
        crate::persistence::load_world(reader, self)
    }

    pub(crate) fn restore_snapshot(
        &mut self,
        now: u64,
        sims: Vec<PlotSimState>,
        npcs: Vec<crate::sim::npc::NpcSnapshot>,
        plot_states: Vec<(PlotId, PlotState)>,
        profiles: Vec<(PlayerId, PlayerProfile)>,
    ) {
        self.now = now;
        self.sims = sims.into_iter().map(|s| (s.plot_id, s)).collect();
        self.npcs = NpcPopulation::new();
        self.npcs.restore(npcs, &mut self.surface);
        for (plot_id, state) in plot_states {
            self.plot_states.write(plot_id, state, now);
            // Snapshot visual handles are stale; respawn everything.
            self.rebuild_plot_visuals(plot_id);
        }
        for (player_id, profile) in profiles {
            self.profiles.patch(
                &self.backend,
                &player_id,
                crate::types::ProfilePatch {
                    cash: Some(profile.cash),
                    unlocks: Some(profile.unlocks),
                    staff: Some(profile.staff),
                    plot_id: Some(profile.plot_id),
                    restaurant_open: Some(profile.restaurant_open),
                },
                now,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tycoon_logic::catalog::item_types;
    use tycoon_logic::config::STARTING_CASH;

    fn engine_with_player() -> TycoonEngine {
        let mut engine = TycoonEngine::headless();
        engine.update(1_000, 33);
        assert_eq!(engine.join("p1"), Some(0));
        engine
    }

    fn place(engine: &mut TycoonEngine, catalog_id: &str, x: f32, z: f32) {
        engine
            .command(
                "p1",
                BuildCommand::SelectItem {
                    catalog_id: catalog_id.to_string(),
                },
            )
            .unwrap();
        engine.update_player_pose("p1", Vec3::new(x, 6.0, z), Vec3::new(0.0, -1.0, 0.0));
        let now = engine.now() + 33;
        engine.update(now, 33);
        engine.command("p1", BuildCommand::Place).unwrap();
    }

    #[test]
    fn join_claims_first_free_plot_and_creates_profile() {
        let engine = engine_with_player();
        assert_eq!(
            engine.plot_state(0).unwrap().owner_id.as_deref(),
            Some("p1")
        );
        assert_eq!(engine.profile("p1").unwrap().plot_id, Some(0));
        assert_eq!(engine.profile("p1").unwrap().cash, STARTING_CASH);
    }

    #[test]
    fn rejoin_reattaches_to_the_owned_plot() {
        let mut engine = engine_with_player();
        engine.leave("p1");
        assert_eq!(engine.join("p1"), Some(0));
        assert_eq!(
            engine.plot_state(0).unwrap().owner_id.as_deref(),
            Some("p1")
        );
        assert_eq!(engine.session("p1").unwrap().plot_id, Some(0));
    }

    #[test]
    fn join_with_no_free_plot_lands_in_the_lobby() {
        let mut engine = engine_with_player();
        assert_eq!(engine.join("p2"), None);
        assert_eq!(engine.profile("p2").unwrap().plot_id, None);
        // Lobby players have a session but no plot to build on.
        assert_eq!(
            engine.command("p2", BuildCommand::Place).unwrap_err(),
            Rejection::NoPlot
        );
    }

    #[test]
    fn full_build_and_open_flow() {
        let mut engine = engine_with_player();
        place(&mut engine, item_types::STOVE, -4.2, 2.9);
        place(&mut engine, item_types::TABLE, -1.2, 5.9);
        engine.set_restaurant_open("p1", true).unwrap();
        assert!(engine.plot_state(0).unwrap().is_open);
        assert!(engine.sim(0).is_some());
        let events = engine.take_events();
        assert!(events.contains(&EngineEvent::RestaurantOpened { plot_id: 0 }));
    }

    #[test]
    fn open_without_setup_is_rejected() {
        let mut engine = engine_with_player();
        assert_eq!(
            engine.set_restaurant_open("p1", true).unwrap_err(),
            Rejection::SetupIncomplete
        );
    }

    #[test]
    fn unknown_item_selection_is_rejected() {
        let mut engine = engine_with_player();
        let err = engine
            .command(
                "p1",
                BuildCommand::SelectItem {
                    catalog_id: "jukebox".to_string(),
                },
            )
            .unwrap_err();
        assert_eq!(err, Rejection::UnknownItem("jukebox".to_string()));
    }

    #[test]
    fn commands_without_session_are_rejected() {
        let mut engine = TycoonEngine::headless();
        assert_eq!(
            engine.command("ghost", BuildCommand::Rotate).unwrap_err(),
            Rejection::NoPlot
        );
    }

    #[test]
    fn leave_closes_restaurant_and_clears_session() {
        let mut engine = engine_with_player();
        place(&mut engine, item_types::STOVE, -4.2, 2.9);
        place(&mut engine, item_types::TABLE, -1.2, 5.9);
        engine.set_restaurant_open("p1", true).unwrap();
        engine.leave("p1");
        assert!(!engine.plot_state(0).unwrap().is_open);
        assert!(engine.sim(0).is_none());
        assert!(engine.session("p1").is_none());
        // Ownership persists across sessions.
        assert_eq!(
            engine.plot_state(0).unwrap().owner_id.as_deref(),
            Some("p1")
        );
    }
}
