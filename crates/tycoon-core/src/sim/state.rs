//! Per-plot simulation state: customers, orders and stove occupancy.
//!
//! Plain serializable data. Customers and orders keep their records after
//! completion or walkout, carrying a terminal status and timestamps; the
//! whole sim is dropped when the restaurant closes, so the lists stay
//! bounded by one opening.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::PlotId;

/// A customer somewhere between arriving and leaving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: u64,
    pub spawned_at: u64,
    /// Table the customer sat at (placed item id).
    pub seat_id: String,
    /// Absolute walkout time, fixed at spawn.
    pub patience_deadline: u64,
    /// Set once the customer has ordered.
    pub order_id: Option<u64>,
    /// Served or walked out. Terminal; the record stays in the list.
    pub left: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Waiting for someone to start cooking at a stove.
    Pending,
    /// On a stove.
    InProgress,
    /// Cooked; waiting for pickup and delivery.
    Ready,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub customer_id: u64,
    pub dish_id: String,
    /// Table to deliver at; copied from the customer.
    pub seat_id: String,
    pub created_at: u64,
    pub status: OrderStatus,
    pub started_at: Option<u64>,
    pub ready_at: Option<u64>,
    pub completed_at: Option<u64>,
}

/// Everything the simulation tracks for one plot between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSimState {
    pub plot_id: PlotId,
    next_id: u64,
    pub last_spawn_at: u64,
    pub last_tick_at: u64,
    pub customers: Vec<Customer>,
    pub orders: Vec<Order>,
    /// Stove placed item id -> the order currently on it. One slot per stove.
    pub stove_orders: HashMap<String, u64>,
    pub served_count: u64,
    pub walkout_count: u64,
}

impl PlotSimState {
    pub fn new(plot_id: PlotId, now: u64) -> Self {
        Self {
            plot_id,
            next_id: 0,
            // First customer arrives one full interval after opening.
            last_spawn_at: now,
            last_tick_at: now,
            customers: Vec::new(),
            orders: Vec::new(),
            stove_orders: HashMap::new(),
            served_count: 0,
            walkout_count: 0,
        }
    }

    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn customer(&self, id: u64) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn customer_mut(&mut self, id: u64) -> Option<&mut Customer> {
        self.customers.iter_mut().find(|c| c.id == id)
    }

    pub fn order(&self, id: u64) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn order_mut(&mut self, id: u64) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == id)
    }

    /// Oldest order in the given status, by creation time.
    pub fn oldest_pending(&self) -> Option<&Order> {
        self.orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .min_by_key(|o| o.created_at)
    }

    pub fn oldest_ready(&self) -> Option<&Order> {
        self.orders
            .iter()
            .filter(|o| o.status == OrderStatus::Ready)
            .min_by_key(|o| o.created_at)
    }

    /// Drop any stove binding pointing at `order_id`.
    pub fn free_stove_of(&mut self, order_id: u64) {
        self.stove_orders.retain(|_, bound| *bound != order_id);
    }
}
