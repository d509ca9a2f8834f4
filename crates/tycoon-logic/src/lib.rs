//! Pure game logic for the restaurant tycoon server.
//!
//! This crate contains all plot/build/sim logic that is independent of any
//! engine, storage, or runtime. Functions take plain data and return results,
//! making them unit-testable and portable between the server engine and
//! native validation tools.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Placeable item definitions (cost, footprint, rotation) |
//! | [`config`] | Tuning constants (grid, economy, sim timers, NPC limits) |
//! | [`geom`] | Vec3 / AABB / grid cell / rotation primitives |
//! | [`grid`] | Plot-relative snapping, bounds clamping, cell occupancy |
//! | [`motion`] | Constant-speed linear motion with arrival detection |
//! | [`placed`] | Placed item record shared by grid and zone logic |
//! | [`raycast`] | Pointer ray and ground-plane placement surface math |
//! | [`zones`] | Functional zones (cooking, seating) derived from placements |

pub mod catalog;
pub mod config;
pub mod geom;
pub mod grid;
pub mod motion;
pub mod placed;
pub mod raycast;
pub mod zones;
