//! Placed item record: one grid-aligned structure on a plot.

use serde::{Deserialize, Serialize};

use crate::geom::{Rotation, Vec3};

/// A structure placed on a plot. Owned exclusively by the plot state that
/// contains it; created by a successful place, removed by a successful delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    /// Unique per plot (`item_<random hex>`).
    pub id: String,
    /// Catalog id this was placed from.
    pub catalog_id: String,
    /// Grid-aligned world position (cell center).
    pub position: Vec3,
    /// Y-axis rotation in quarter turns.
    #[serde(default)]
    pub rotation: Rotation,
    /// Creation time (ms since epoch).
    pub created_at: u64,
    /// Runtime visual handle, used only to despawn the visual. Never consulted
    /// for state decisions; stale after a restart until visuals are rebuilt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<u64>,
}
