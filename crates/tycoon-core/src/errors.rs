//! Error taxonomy: validation rejections and storage failures.
//!
//! Rejections are reported to the caller with a machine-checkable code and a
//! short human message; they never mutate state and are never fatal. Storage
//! failures are retried through the dirty-set mechanism and never surface to
//! players.

use std::fmt;

/// A command was rejected by server-side validation. Nothing was mutated.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// No plot with that id exists.
    UnknownPlot,
    /// Caller does not own the plot.
    NotPlotOwner,
    /// Item type is not in the build catalog.
    UnknownItem(String),
    /// Caller cannot afford the item.
    InsufficientFunds { cost: i64, cash: i64 },
    /// Snapped position falls outside plot bounds.
    OutOfBounds,
    /// Footprint overlaps an existing placement.
    Overlap,
    /// No placed item with that id on the plot.
    ItemNotFound(String),
    /// Restaurant needs at least one stove and one table before opening.
    SetupIncomplete,
    /// Caller has no plot assigned.
    NoPlot,
    /// No item selected / no valid preview position to place at.
    NoSelection,
    /// No delete target under the cursor and none supplied.
    NoDeleteTarget,
    /// Nothing within interaction range, or nothing actionable there.
    NothingNearby,
    /// The stove already has an order on it.
    StoveBusy,
    /// Carried order belongs to a different table.
    WrongTable,
    /// Carried order no longer exists or is no longer deliverable.
    OrderStale,
}

impl Rejection {
    /// Stable machine-checkable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::UnknownPlot => "invalid_plot",
            Rejection::NotPlotOwner => "not_owner",
            Rejection::UnknownItem(_) => "unknown_item",
            Rejection::InsufficientFunds { .. } => "insufficient_funds",
            Rejection::OutOfBounds => "out_of_bounds",
            Rejection::Overlap => "overlap",
            Rejection::ItemNotFound(_) => "item_not_found",
            Rejection::SetupIncomplete => "setup_incomplete",
            Rejection::NoPlot => "no_plot",
            Rejection::NoSelection => "no_selection",
            Rejection::NoDeleteTarget => "no_delete_target",
            Rejection::NothingNearby => "nothing_nearby",
            Rejection::StoveBusy => "stove_busy",
            Rejection::WrongTable => "wrong_table",
            Rejection::OrderStale => "order_stale",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownPlot => write!(f, "Invalid plot"),
            Rejection::NotPlotOwner => write!(f, "You do not own this plot"),
            Rejection::UnknownItem(item) => write!(f, "Unknown item: {item}"),
            Rejection::InsufficientFunds { cost, cash } => {
                write!(f, "Not enough cash (need ${cost}, have ${cash})")
            }
            Rejection::OutOfBounds => write!(f, "Outside plot bounds"),
            Rejection::Overlap => write!(f, "Overlaps existing item"),
            Rejection::ItemNotFound(id) => write!(f, "Item not found: {id}"),
            Rejection::SetupIncomplete => {
                write!(f, "Place at least one stove and one table, then open")
            }
            Rejection::NoPlot => write!(f, "You need a plot first"),
            Rejection::NoSelection => write!(f, "Select an item and aim at a valid spot"),
            Rejection::NoDeleteTarget => write!(f, "No target to delete"),
            Rejection::NothingNearby => write!(f, "Nothing to do here"),
            Rejection::StoveBusy => write!(f, "Still cooking"),
            Rejection::WrongTable => write!(f, "Go to the customer's table"),
            Rejection::OrderStale => write!(f, "That order is gone"),
        }
    }
}

impl std::error::Error for Rejection {}

/// Durable-storage failure. Transient by assumption; the write-back caches
/// re-mark failed records dirty and retry on the next flush cycle.
#[derive(Debug)]
pub enum StorageError {
    Backend(String),
    Encode(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Backend(msg) => write!(f, "storage backend error: {msg}"),
            StorageError::Encode(e) => write!(f, "document encode error: {e}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Encode(e)
    }
}
