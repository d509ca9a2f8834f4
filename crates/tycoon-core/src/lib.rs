//! Tycoon Core - Restaurant Plot Simulation & Build Engine
//!
//! The authoritative server logic for a multiplayer restaurant tycoon:
//! players claim a plot, place structures on a grid, and run a timed
//! customer/order/NPC simulation against those structures.
//!
//! # Architecture
//!
//! - **Plot state store**: in-memory write-back cache over a storage backend,
//!   mutated only by whole-record replacement, flushed on a debounce timer.
//! - **Build sessions**: per-player state machine driving the
//!   raycast -> snap -> validate -> preview pipeline each tick, plus the
//!   server-side place/delete validation.
//! - **Simulation**: per-plot tick engine (customers, orders, cooking,
//!   walkouts) and a bounded NPC population living in a `hecs` world.
//! - **World surface**: narrow trait over the hosting runtime (raycasts and
//!   visuals); the engine itself never touches physics or rendering.
//!
//! # Example
//!
//! ```rust,no_run
//! use tycoon_core::engine::TycoonEngine;
//! use tycoon_logic::geom::Vec3;
//!
//! let mut engine = TycoonEngine::headless();
//! engine.join("player-1").expect("a plot is free");
//! engine.update_player_pose("player-1", Vec3::new(0.0, 2.0, 5.0), Vec3::new(0.0, -1.0, 0.0));
//!
//! let mut now = 0u64;
//! loop {
//!     now += 33;
//!     engine.update(now, 33);
//! }
//! ```

pub mod build;
pub mod engine;
pub mod errors;
pub mod migrate;
pub mod persistence;
pub mod plot_state;
pub mod plots;
pub mod profile;
pub mod sim;
pub mod store;
pub mod surface;
pub mod types;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::engine::TycoonEngine;
    pub use crate::errors::Rejection;
    pub use crate::surface::{NullSurface, WorldSurface};
    pub use crate::types::*;
}
