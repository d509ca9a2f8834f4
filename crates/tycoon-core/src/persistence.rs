//! Whole-world snapshot save/load.
//!
//! Separate from the per-record JSON store: this captures the *live* world
//! in one bincode blob, in-flight sims and ambient NPCs included, for
//! headless harness runs and server migration. Versioned; a mismatched
//! version refuses to load rather than guessing.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::engine::TycoonEngine;
use crate::sim::npc::NpcSnapshot;
use crate::sim::state::PlotSimState;
use crate::store::KvBackend;
use crate::surface::WorldSurface;
use crate::types::{PlayerId, PlayerProfile, PlotId, PlotState};

/// Version number for the snapshot format (increment when it changes).
const SNAPSHOT_VERSION: u32 = 1;

/// Serializable snapshot of the whole engine world.
#[derive(Serialize, Deserialize)]
pub struct SnapshotData {
    pub version: u32,
    pub now: u64,
    pub plot_states: Vec<(PlotId, PlotState)>,
    pub profiles: Vec<(PlayerId, PlayerProfile)>,
    pub sims: Vec<PlotSimState>,
    pub npcs: Vec<NpcSnapshot>,
}

/// Write the engine's world to `writer`.
pub fn save_world<W, B, S>(writer: W, engine: &TycoonEngine<B, S>) -> Result<(), SnapshotError>
where
    W: Write,
    B: KvBackend,
    S: WorldSurface,
{
    let data = SnapshotData {
        version: SNAPSHOT_VERSION,
        now: engine.now(),
        plot_states: engine.cached_plot_states(),
        profiles: engine.cached_profiles(),
        sims: engine.sims_for_snapshot(),
        npcs: engine.npc_snapshots(),
    };
    bincode::serialize_into(writer, &data)?;
    Ok(())
}

/// Restore a world saved with [`save_world`] into `engine`.
pub fn load_world<R, B, S>(reader: R, engine: &mut TycoonEngine<B, S>) -> Result<(), SnapshotError>
where
    R: Read,
    B: KvBackend,
    S: WorldSurface,
{
    let data: SnapshotData = bincode::deserialize_from(reader)?;
    if data.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: data.version,
        });
    }
    engine.restore_snapshot(data.now, data.sims, data.npcs, data.plot_states, data.profiles);
    Ok(())
}

/// Errors that can occur during snapshot save/load.
#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SnapshotError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SnapshotError::Bincode(e)
    }
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "IO error: {}", e),
            SnapshotError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SnapshotError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Snapshot version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SnapshotError {}
