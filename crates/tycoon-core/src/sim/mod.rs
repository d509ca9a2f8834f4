//! Restaurant simulation: customers, orders and ambient NPCs.
//!
//! The sim is authoritative and runs entirely from engine updates. Customer
//! and order flow is plain data in [`state`], advanced by [`tick`] on a fixed
//! cadence; player service actions go through [`interact`]; the ambient NPC
//! population lives in a `hecs` world in [`npc`]. Money and rating changes
//! are emitted as events and applied by the engine, never from inside the
//! tick.

pub mod interact;
pub mod npc;
pub mod state;
pub mod tick;

pub use interact::InteractOutcome;
pub use npc::NpcPopulation;
pub use state::{Customer, Order, OrderStatus, PlotSimState};
pub use tick::SimEvent;
