//! Static plot definitions.
//!
//! Plots are laid out in a row along x, each a PLOT_GRID_SIZE square of grid
//! cells sitting on the map floor. Built once at startup; the definitions are
//! never mutated.

use tycoon_logic::config::{GRID_CELL_SIZE, PLOT_BUILD_HEIGHT, PLOT_FLOOR_Y, PLOT_GRID_SIZE};
use tycoon_logic::geom::{Aabb, Vec3};

use crate::types::{PlotDefinition, PlotId};

/// Number of plots in the default world.
pub const PLOT_COUNT: usize = 1;

/// Gap between neighboring plots (world units).
const PLOT_GAP: f32 = 4.0;

/// Min corner of plot 0, aligned to the shipped restaurant map.
const FIRST_PLOT_MIN_X: f32 = -5.0;
const FIRST_PLOT_MIN_Z: f32 = 2.0;

fn plot_at(plot_id: PlotId, min_x: f32, min_z: f32) -> PlotDefinition {
    let floor_y = PLOT_FLOOR_Y;
    let stride = PLOT_GRID_SIZE as f32 * GRID_CELL_SIZE;
    // Max sits half a cell inside the far edge so snapped cell centers of the
    // last row/column still pass the containment test.
    let max_x = min_x + stride - GRID_CELL_SIZE * 0.5;
    let max_z = min_z + stride - GRID_CELL_SIZE * 0.5;
    let mid_x = min_x + (stride / 2.0).floor();
    let mid_z = min_z + (stride / 2.0).floor();

    PlotDefinition {
        plot_id,
        bounds: Aabb::new(
            Vec3::new(min_x, floor_y, min_z),
            Vec3::new(max_x, floor_y + PLOT_BUILD_HEIGHT, max_z),
        ),
        spawn: Vec3::new(mid_x, floor_y + 1.0, mid_z),
        entrance: Vec3::new(mid_x, floor_y, min_z - 0.5),
    }
}

/// Build the static plot table.
pub fn build_plots(count: usize) -> Vec<PlotDefinition> {
    let stride = PLOT_GRID_SIZE as f32 * GRID_CELL_SIZE + PLOT_GAP;
    (0..count)
        .map(|i| {
            plot_at(
                i as PlotId,
                FIRST_PLOT_MIN_X + i as f32 * stride,
                FIRST_PLOT_MIN_Z,
            )
        })
        .collect()
}

/// The default world layout.
pub fn default_plots() -> Vec<PlotDefinition> {
    build_plots(PLOT_COUNT)
}
