//! Grid snap and cell occupancy for placement.
//!
//! All placement is plot-relative: a world hit is translated into plot-local
//! space, floor-divided onto the grid, re-centered on the cell, and translated
//! back, so every placement lands on a deterministic cell center regardless of
//! where inside the cell the pointer hit. Overlap is a pure set-intersection
//! test over integer cell coordinates, with no partial-cell or adjacency logic.

use std::collections::HashSet;

use crate::catalog::{catalog_item, Footprint};
use crate::config::GRID_CELL_SIZE;
use crate::geom::{Aabb, GridCell, Rotation, Vec3};
use crate::placed::PlacedItem;

/// Integer cell containing a world position.
pub fn grid_cell_from_world(pos: Vec3) -> GridCell {
    let s = GRID_CELL_SIZE;
    GridCell {
        x: (pos.x / s).floor() as i32,
        z: (pos.z / s).floor() as i32,
    }
}

/// Snap a world hit to the plot-local grid, returning the world-space cell
/// center. Vertical coordinate is preserved.
pub fn snap_to_plot_grid(bounds: &Aabb, world_hit: Vec3) -> Vec3 {
    let origin = bounds.min;
    let s = GRID_CELL_SIZE;
    let local_x = world_hit.x - origin.x;
    let local_z = world_hit.z - origin.z;
    Vec3 {
        x: origin.x + (local_x / s).floor() * s + s * 0.5,
        y: world_hit.y,
        z: origin.z + (local_z / s).floor() * s + s * 0.5,
    }
}

/// Clamp a position to plot bounds horizontally; keep y.
pub fn clamp_to_plot(bounds: &Aabb, pos: Vec3) -> Vec3 {
    Vec3 {
        x: pos.x.clamp(bounds.min.x, bounds.max.x),
        y: pos.y,
        z: pos.z.clamp(bounds.min.z, bounds.max.z),
    }
}

/// Full 3D containment test against plot bounds.
pub fn point_in_plot(bounds: &Aabb, pos: Vec3) -> bool {
    bounds.contains(pos)
}

/// Grid cells occupied by an item at `pos` with the given footprint and
/// rotation. Width and depth swap for quarter turns before the w×d rectangle
/// is enumerated, anchored at the position's cell.
pub fn occupied_cells(pos: Vec3, footprint: Footprint, rotation: Rotation) -> Vec<GridCell> {
    let anchor = grid_cell_from_world(pos);
    let (w, d) = if rotation.is_quarter_turn() {
        (footprint.d, footprint.w)
    } else {
        (footprint.w, footprint.d)
    };
    let mut cells = Vec::with_capacity((w * d).max(0) as usize);
    for ix in 0..w {
        for iz in 0..d {
            cells.push(GridCell {
                x: anchor.x + ix,
                z: anchor.z + iz,
            });
        }
    }
    cells
}

/// True iff the two cell sets intersect.
pub fn cells_overlap(a: &[GridCell], b: &[GridCell]) -> bool {
    let set: HashSet<GridCell> = a.iter().copied().collect();
    b.iter().any(|c| set.contains(c))
}

/// Footprint for an already-placed item, via its catalog entry. Unknown
/// catalog ids (removed from the catalog after placement) fall back to 1×1.
pub fn placed_footprint(item: &PlacedItem) -> Footprint {
    catalog_item(&item.catalog_id)
        .map(|c| c.footprint)
        .unwrap_or(Footprint::SINGLE)
}

/// Would an item at `pos` with `footprint`/`rotation` overlap any existing
/// placement? O(n) over placed items. `exclude` skips one id, for
/// re-validating an item against the list that already contains it.
pub fn overlaps_existing(
    pos: Vec3,
    footprint: Footprint,
    rotation: Rotation,
    existing: &[PlacedItem],
    exclude: Option<&str>,
) -> bool {
    let candidate = occupied_cells(pos, footprint, rotation);
    existing
        .iter()
        .filter(|item| exclude != Some(item.id.as_str()))
        .any(|item| {
            let other = occupied_cells(item.position, placed_footprint(item), item.rotation);
            cells_overlap(&candidate, &other)
        })
}
