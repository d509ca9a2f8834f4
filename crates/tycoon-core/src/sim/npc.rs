//! Ambient NPC population.
//!
//! NPCs are pure flavor: they spawn at an open plot's entrance (or a placed
//! spawn marker), wander to a random table, linger, and despawn. They never
//! join the order flow. The population lives in a `hecs` world; systems
//! collect updates first and apply them after, since the world cannot be
//! mutated mid-query.

use std::collections::HashMap;

use hecs::{Entity, World};
use log::debug;
use rand::seq::{IteratorRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use tycoon_logic::catalog::item_types;
use tycoon_logic::config::{
    NPC_ARRIVE_CLEANUP_DELAY_MS, NPC_MAX_CONCURRENT, NPC_MOVEMENT_SPEED, NPC_SPAWNER_TICK_MS,
    NPC_SPAWN_INTERVAL_MS,
};
use tycoon_logic::geom::{Quat, Vec3};
use tycoon_logic::motion::{step_toward, MotionStep};
use tycoon_logic::placed::PlacedItem;
use tycoon_logic::zones::seating_zones;

use crate::surface::{Tint, WorldSurface};
use crate::types::{PlotDefinition, PlotId};

/// Model used for every ambient NPC body.
pub const NPC_MODEL_URI: &str = "models/npcs/customer.gltf";

fn plot_center(def: &PlotDefinition) -> Vec3 {
    Vec3::new(
        (def.bounds.min.x + def.bounds.max.x) * 0.5,
        def.floor_y(),
        (def.bounds.min.z + def.bounds.max.z) * 0.5,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcAgent {
    pub plot_id: PlotId,
    pub spawned_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NpcPosition(pub Vec3);

/// Where the NPC is wandering to. Removed on arrival.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NpcTarget(pub Vec3);

/// Arrival timestamp; despawn comes a fixed linger after this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrivedAt(pub u64);

/// Handle of the NPC's body visual on the world surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpcVisual(pub u64);

/// One NPC, flattened for the world snapshot. Visual handles are not saved;
/// bodies are respawned on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcSnapshot {
    pub agent: NpcAgent,
    pub position: Vec3,
    pub target: Option<Vec3>,
    pub arrived_at: Option<u64>,
}

/// The whole ambient population across all plots.
pub struct NpcPopulation {
    world: World,
    last_spawn: HashMap<PlotId, u64>,
    last_spawner_tick: u64,
}

impl Default for NpcPopulation {
    fn default() -> Self {
        Self::new()
    }
}

impl NpcPopulation {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            last_spawn: HashMap::new(),
            last_spawner_tick: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.world.len() as usize
    }

    pub fn count_for_plot(&self, plot_id: PlotId) -> usize {
        self.world
            .query::<&NpcAgent>()
            .iter()
            .filter(|(_, agent)| agent.plot_id == plot_id)
            .count()
    }

    /// Advance the population: spawn on cadence for open plots, move
    /// everyone, clean up lingerers.
    pub fn update<S: WorldSurface>(
        &mut self,
        open_plots: &[(PlotDefinition, Vec<PlacedItem>)],
        now: u64,
        delta_ms: u64,
        surface: &mut S,
    ) {
        if now.saturating_sub(self.last_spawner_tick) >= NPC_SPAWNER_TICK_MS {
            self.last_spawner_tick = now;
            self.spawner(open_plots, now, surface);
        }
        self.movement(now, delta_ms, surface);
        self.cleanup(now, surface);
    }

    fn spawner<S: WorldSurface>(
        &mut self,
        open_plots: &[(PlotDefinition, Vec<PlacedItem>)],
        now: u64,
        surface: &mut S,
    ) {
        let mut rng = rand::thread_rng();
        for (def, placed) in open_plots {
            let last = *self.last_spawn.entry(def.plot_id).or_insert(now);
            if now.saturating_sub(last) < NPC_SPAWN_INTERVAL_MS {
                continue;
            }
            // Over the cap: skip this interval entirely, no queueing.
            self.last_spawn.insert(def.plot_id, now);
            if self.count_for_plot(def.plot_id) >= NPC_MAX_CONCURRENT {
                continue;
            }
            // Wander toward a random table; the plot center when nothing is
            // placed yet.
            let target = seating_zones(placed)
                .choose(&mut rng)
                .map(|z| Vec3::new(z.position.x, def.floor_y(), z.position.z))
                .unwrap_or_else(|| plot_center(def));
            // Placed spawn markers override the entrance.
            let position = placed
                .iter()
                .filter(|i| i.catalog_id == item_types::SPAWN_POINT)
                .choose(&mut rng)
                .map(|i| i.position)
                .unwrap_or(def.entrance);
            let visual = surface.spawn_visual(NPC_MODEL_URI, position, Quat::IDENTITY);
            surface.set_visual_tint(visual, Some(Tint::NPC_BODY));
            self.world.spawn((
                NpcAgent {
                    plot_id: def.plot_id,
                    spawned_at: now,
                },
                NpcPosition(position),
                NpcTarget(target),
                NpcVisual(visual),
            ));
            debug!("npc spawned on plot {}", def.plot_id);
        }
    }

    fn movement<S: WorldSurface>(&mut self, now: u64, delta_ms: u64, surface: &mut S) {
        // Collect first; the world cannot be mutated while iterating.
        let mut updates: Vec<(Entity, Vec3, bool, Option<u64>)> = Vec::new();
        for (entity, (pos, target, visual)) in self
            .world
            .query::<(&NpcPosition, &NpcTarget, Option<&NpcVisual>)>()
            .iter()
        {
            let (new_pos, arrived) =
                match step_toward(pos.0, target.0, NPC_MOVEMENT_SPEED, delta_ms) {
                    MotionStep::Moving(p) => (p, false),
                    MotionStep::Arrived(p) => (p, true),
                };
            updates.push((entity, new_pos, arrived, visual.map(|v| v.0)));
        }

        for (entity, new_pos, arrived, visual) in updates {
            if let Ok(mut pos) = self.world.get::<&mut NpcPosition>(entity) {
                pos.0 = new_pos;
            }
            if let Some(visual) = visual {
                surface.set_visual_pose(visual, new_pos, Quat::IDENTITY);
            }
            if arrived {
                let _ = self.world.remove_one::<NpcTarget>(entity);
                let _ = self.world.insert_one(entity, ArrivedAt(now));
            }
        }
    }

    fn cleanup<S: WorldSurface>(&mut self, now: u64, surface: &mut S) {
        let expired: Vec<(Entity, Option<u64>)> = self
            .world
            .query::<(&ArrivedAt, Option<&NpcVisual>)>()
            .iter()
            .filter(|(_, (arrived, _))| now >= arrived.0 + NPC_ARRIVE_CLEANUP_DELAY_MS)
            .map(|(entity, (_, visual))| (entity, visual.map(|v| v.0)))
            .collect();
        for (entity, visual) in expired {
            if let Some(visual) = visual {
                surface.despawn_visual(visual);
            }
            let _ = self.world.despawn(entity);
        }
    }

    /// Remove every NPC on `plot_id` immediately (plot closed or released).
    pub fn despawn_plot<S: WorldSurface>(&mut self, plot_id: PlotId, surface: &mut S) {
        let doomed: Vec<(Entity, Option<u64>)> = self
            .world
            .query::<(&NpcAgent, Option<&NpcVisual>)>()
            .iter()
            .filter(|(_, (agent, _))| agent.plot_id == plot_id)
            .map(|(entity, (_, visual))| (entity, visual.map(|v| v.0)))
            .collect();
        for (entity, visual) in doomed {
            if let Some(visual) = visual {
                surface.despawn_visual(visual);
            }
            let _ = self.world.despawn(entity);
        }
        self.last_spawn.remove(&plot_id);
    }

    /// Flatten the population for a world snapshot.
    pub fn snapshot(&self) -> Vec<NpcSnapshot> {
        self.world
            .query::<(&NpcAgent, &NpcPosition, Option<&NpcTarget>, Option<&ArrivedAt>)>()
            .iter()
            .map(|(_, (agent, pos, target, arrived))| NpcSnapshot {
                agent: *agent,
                position: pos.0,
                target: target.map(|t| t.0),
                arrived_at: arrived.map(|a| a.0),
            })
            .collect()
    }

    /// Rebuild the population from a snapshot, respawning bodies.
    pub fn restore<S: WorldSurface>(&mut self, snapshots: Vec<NpcSnapshot>, surface: &mut S) {
        for snap in snapshots {
            let visual = surface.spawn_visual(NPC_MODEL_URI, snap.position, Quat::IDENTITY);
            surface.set_visual_tint(visual, Some(Tint::NPC_BODY));
            let entity = self.world.spawn((
                snap.agent,
                NpcPosition(snap.position),
                NpcVisual(visual),
            ));
            if let Some(target) = snap.target {
                let _ = self.world.insert_one(entity, NpcTarget(target));
            }
            if let Some(arrived_at) = snap.arrived_at {
                let _ = self.world.insert_one(entity, ArrivedAt(arrived_at));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plots::default_plots;
    use crate::surface::RecordingSurface;
    use tycoon_logic::geom::Rotation;

    fn open_plot() -> Vec<(PlotDefinition, Vec<PlacedItem>)> {
        default_plots().into_iter().map(|def| (def, Vec::new())).collect()
    }

    fn placed(id: &str, catalog_id: &str, x: f32, z: f32) -> PlacedItem {
        PlacedItem {
            id: id.to_string(),
            catalog_id: catalog_id.to_string(),
            position: Vec3::new(x, 1.0, z),
            rotation: Rotation::Deg0,
            created_at: 0,
            visual: None,
        }
    }

    fn run(pop: &mut NpcPopulation, plots: &[(PlotDefinition, Vec<PlacedItem>)], surface: &mut RecordingSurface, from: u64, to: u64, step: u64) -> u64 {
        let mut now = from;
        while now < to {
            now += step;
            pop.update(plots, now, step, surface);
        }
        now
    }

    #[test]
    fn spawns_on_interval_up_to_cap() {
        let plots = open_plot();
        let mut pop = NpcPopulation::new();
        let mut surface = RecordingSurface::new();

        // First interval elapses: one NPC.
        let now = run(&mut pop, &plots, &mut surface, 0, NPC_SPAWN_INTERVAL_MS + 200, 100);
        assert_eq!(pop.count_for_plot(0), 1);
        assert_eq!(surface.visual_count(), 1);

        // Long before anyone arrives-and-expires, the cap holds.
        run(&mut pop, &plots, &mut surface, now, now + 10 * NPC_SPAWN_INTERVAL_MS, 100);
        assert!(pop.count_for_plot(0) <= NPC_MAX_CONCURRENT);
    }

    #[test]
    fn closed_plots_spawn_nothing() {
        let mut pop = NpcPopulation::new();
        let mut surface = RecordingSurface::new();
        run(&mut pop, &[], &mut surface, 0, 10 * NPC_SPAWN_INTERVAL_MS, 100);
        assert_eq!(pop.count(), 0);
    }

    #[test]
    fn npcs_move_away_from_the_entrance() {
        let plots = open_plot();
        let entrance = plots[0].0.entrance;
        let mut pop = NpcPopulation::new();
        let mut surface = RecordingSurface::new();
        let now = run(&mut pop, &plots, &mut surface, 0, NPC_SPAWN_INTERVAL_MS + 200, 100);
        run(&mut pop, &plots, &mut surface, now, now + 2_000, 33);

        let positions: Vec<Vec3> = pop.snapshot().iter().map(|s| s.position).collect();
        assert_eq!(positions.len(), 1);
        assert!(positions[0].distance(&entrance) > 0.4);
    }

    #[test]
    fn empty_plot_npcs_head_for_the_center() {
        let plots = open_plot();
        let center = plot_center(&plots[0].0);
        let mut pop = NpcPopulation::new();
        let mut surface = RecordingSurface::new();
        run(&mut pop, &plots, &mut surface, 0, NPC_SPAWN_INTERVAL_MS + 200, 100);

        let snaps = pop.snapshot();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].target, Some(center));
    }

    #[test]
    fn npcs_head_for_a_table_when_one_is_placed() {
        let mut plots = open_plot();
        let floor = plots[0].0.floor_y();
        plots[0].1.push(placed("t1", item_types::TABLE, -1.5, 5.5));
        let mut pop = NpcPopulation::new();
        let mut surface = RecordingSurface::new();
        run(&mut pop, &plots, &mut surface, 0, NPC_SPAWN_INTERVAL_MS + 200, 100);

        let snaps = pop.snapshot();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].target, Some(Vec3::new(-1.5, floor, 5.5)));
    }

    #[test]
    fn spawn_marker_overrides_the_entrance() {
        let mut plots = open_plot();
        let marker = Vec3::new(3.5, 1.0, 9.5);
        plots[0]
            .1
            .push(placed("m1", item_types::SPAWN_POINT, marker.x, marker.z));
        let mut pop = NpcPopulation::new();
        let mut surface = RecordingSurface::new();
        // Zero delta: the spawn happens but nobody moves off their point.
        let mut now = 0;
        while now < NPC_SPAWN_INTERVAL_MS + 200 {
            now += 100;
            pop.update(&plots, now, 0, &mut surface);
        }
        let snaps = pop.snapshot();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].position, marker);
    }

    #[test]
    fn arrived_npcs_despawn_after_linger() {
        let mut pop = NpcPopulation::new();
        let mut surface = RecordingSurface::new();
        // One NPC already standing on its target.
        let at = Vec3::new(0.5, 1.0, 5.5);
        pop.restore(
            vec![NpcSnapshot {
                agent: NpcAgent {
                    plot_id: 0,
                    spawned_at: 0,
                },
                position: at,
                target: Some(at),
                arrived_at: None,
            }],
            &mut surface,
        );

        pop.update(&[], 100, 33, &mut surface);
        assert_eq!(pop.count(), 1);
        pop.update(&[], 100 + NPC_ARRIVE_CLEANUP_DELAY_MS, 33, &mut surface);
        assert_eq!(pop.count(), 0);
        assert_eq!(surface.visual_count(), 0);
    }

    #[test]
    fn despawn_plot_clears_only_that_plot() {
        let mut pop = NpcPopulation::new();
        let mut surface = RecordingSurface::new();
        let at = Vec3::new(0.5, 1.0, 5.5);
        for plot_id in [0u32, 1] {
            pop.restore(
                vec![NpcSnapshot {
                    agent: NpcAgent {
                        plot_id,
                        spawned_at: 0,
                    },
                    position: at,
                    target: None,
                    arrived_at: None,
                }],
                &mut surface,
            );
        }
        pop.despawn_plot(0, &mut surface);
        assert_eq!(pop.count_for_plot(0), 0);
        assert_eq!(pop.count_for_plot(1), 1);
        assert_eq!(surface.visual_count(), 1);
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let plots = open_plot();
        let mut pop = NpcPopulation::new();
        let mut surface = RecordingSurface::new();
        run(&mut pop, &plots, &mut surface, 0, 2 * NPC_SPAWN_INTERVAL_MS + 200, 100);
        let snaps = pop.snapshot();
        assert!(!snaps.is_empty());

        let mut restored = NpcPopulation::new();
        let mut surface2 = RecordingSurface::new();
        restored.restore(snaps.clone(), &mut surface2);
        assert_eq!(restored.count(), snaps.len());
        assert_eq!(surface2.visual_count(), snaps.len());
    }
}
