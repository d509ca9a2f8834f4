//! Tuning constants: grid, economy, sim timers, NPC limits.
//!
//! Times are milliseconds, money is whole dollars, rating is a 0..=RATING_MAX
//! float. Everything the engine needs to balance lives here.

/// Side length of one placement grid cell (world units).
pub const GRID_CELL_SIZE: f32 = 1.0;
/// Plot width/depth in grid cells.
pub const PLOT_GRID_SIZE: i32 = 10;
/// Floor height for plots (top of the ground layer).
pub const PLOT_FLOOR_Y: f32 = 1.0;
/// Vertical build limit above the plot floor.
pub const PLOT_BUILD_HEIGHT: f32 = 9.0;

/// Cash a fresh profile starts with.
pub const STARTING_CASH: i64 = 500;
/// Fraction of the original cost refunded on delete (floored).
pub const REFUND_RATIO: f64 = 0.5;
/// Debounce delay before dirty records are flushed to storage.
pub const SAVE_DEBOUNCE_MS: u64 = 3_000;
/// Rating ceiling; floor is always 0.
pub const RATING_MAX: f32 = 5.0;

// --- Simulation ---
/// Interval between sim passes for an open plot.
pub const SIM_TICK_INTERVAL_MS: u64 = 500;
/// Customer spawn interval while the restaurant is open.
pub const SIM_CUSTOMER_SPAWN_INTERVAL_MS: u64 = 12_000;
/// Delay after spawn before the customer "arrives" and an order is created.
pub const SIM_ORDER_CREATE_DELAY_MS: u64 = 3_000;
/// Customer walks out if the order is not completed this long after creation.
pub const SIM_PATIENCE_MS: u64 = 45_000;
/// Default cook time when the dish does not override it.
pub const SIM_COOK_TIME_MS: u64 = 8_000;
/// Interaction radius for stoves and tables.
pub const SIM_INTERACT_RADIUS: f32 = 2.5;
/// Rating change on a delivered order (capped at RATING_MAX).
pub const SIM_RATING_SUCCESS_DELTA: f32 = 0.02;
/// Rating change on a walkout (floored at 0).
pub const SIM_RATING_WALKOUT_PENALTY: f32 = 0.05;

// --- NPCs ---
/// NPC spawn interval while the restaurant is open.
pub const NPC_SPAWN_INTERVAL_MS: u64 = 6_000;
/// Max concurrent NPCs per plot; spawns beyond this are skipped, not queued.
pub const NPC_MAX_CONCURRENT: usize = 5;
/// NPC movement speed (units/second).
pub const NPC_MOVEMENT_SPEED: f32 = 3.0;
/// How long an NPC lingers at its target before despawn.
pub const NPC_ARRIVE_CLEANUP_DELAY_MS: u64 = 8_000;
/// NPC spawner cadence inside the engine update loop.
pub const NPC_SPAWNER_TICK_MS: u64 = 100;

/// A priced menu entry. Cook time overrides [`SIM_COOK_TIME_MS`] when set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dish {
    pub price: i64,
    pub cook_time_ms: Option<u64>,
}

/// Dish id -> menu entry. Unlocks reference these ids.
pub fn menu_dish(dish_id: &str) -> Option<Dish> {
    match dish_id {
        "dish_burger" => Some(Dish {
            price: 15,
            cook_time_ms: Some(8_000),
        }),
        _ => None,
    }
}

/// Effective cook time for a dish id (menu override or the default).
pub fn cook_time_ms(dish_id: &str) -> u64 {
    menu_dish(dish_id)
        .and_then(|d| d.cook_time_ms)
        .unwrap_or(SIM_COOK_TIME_MS)
}
