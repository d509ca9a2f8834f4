//! Fixed-cadence simulation pass for one plot.
//!
//! Each pass does four things in order: seat a new customer if the interval
//! has elapsed, turn arrived customers into pending orders, finish whatever
//! the stoves are cooking, and walk out anyone whose patience ran out.
//! Money and rating are not touched here; the caller applies the returned
//! events.

use log::{debug, warn};
use rand::seq::SliceRandom;

use tycoon_logic::config::{
    cook_time_ms, SIM_CUSTOMER_SPAWN_INTERVAL_MS, SIM_ORDER_CREATE_DELAY_MS, SIM_PATIENCE_MS,
};
use tycoon_logic::zones::seating_zones;

use crate::sim::state::{Customer, Order, OrderStatus, PlotSimState};
use crate::types::PlotState;

/// Something that happened during a sim pass or an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    CustomerArrived { customer_id: u64 },
    OrderCreated { order_id: u64, customer_id: u64, dish_id: String },
    CookingStarted { order_id: u64 },
    OrderReady { order_id: u64 },
    OrderPickedUp { order_id: u64 },
    OrderServed { order_id: u64, customer_id: u64, price: i64 },
    Walkout { order_id: u64, customer_id: u64 },
}

/// Advance one plot's customer/order flow to `now`. `dishes` are the menu
/// ids new orders may ask for; a restaurant with no seats or no dishes
/// gets no customers.
pub fn tick_plot(
    sim: &mut PlotSimState,
    state: &PlotState,
    dishes: &[String],
    now: u64,
) -> Vec<SimEvent> {
    let mut events = Vec::new();
    sim.last_tick_at = now;

    let seats = seating_zones(&state.placed_items);
    if seats.is_empty() || dishes.is_empty() {
        return events;
    }
    let mut rng = rand::thread_rng();

    // 1. Customer arrival. Seats rotate round-robin over everyone who has
    //    visited this opening, leavers included.
    if state.is_open && now.saturating_sub(sim.last_spawn_at) >= SIM_CUSTOMER_SPAWN_INTERVAL_MS {
        sim.last_spawn_at = now;
        let seat = &seats[sim.customers.len() % seats.len()];
        let customer_id = sim.next_id();
        sim.customers.push(Customer {
            id: customer_id,
            spawned_at: now,
            seat_id: seat.placed_item_id.clone(),
            patience_deadline: now + SIM_ORDER_CREATE_DELAY_MS + SIM_PATIENCE_MS,
            order_id: None,
            left: false,
        });
        events.push(SimEvent::CustomerArrived { customer_id });
    }

    // 2. Seated customers place orders after the settle-in delay.
    let due: Vec<(u64, String)> = sim
        .customers
        .iter()
        .filter(|c| !c.left && c.order_id.is_none() && now >= c.spawned_at + SIM_ORDER_CREATE_DELAY_MS)
        .map(|c| (c.id, c.seat_id.clone()))
        .collect();
    for (customer_id, seat_id) in due {
        let dish_id = match dishes.choose(&mut rng) {
            Some(dish) => dish.clone(),
            None => continue,
        };
        let order_id = sim.next_id();
        sim.orders.push(Order {
            id: order_id,
            customer_id,
            dish_id: dish_id.clone(),
            seat_id,
            created_at: now,
            status: OrderStatus::Pending,
            started_at: None,
            ready_at: None,
            completed_at: None,
        });
        if let Some(customer) = sim.customer_mut(customer_id) {
            customer.order_id = Some(order_id);
        }
        events.push(SimEvent::OrderCreated {
            order_id,
            customer_id,
            dish_id,
        });
    }

    // 3. Stoves finish cooking. A stale binding (order gone or no longer
    //    in progress) is dropped so the stove frees up.
    let bindings: Vec<(String, u64)> = sim
        .stove_orders
        .iter()
        .map(|(stove, order)| (stove.clone(), *order))
        .collect();
    for (stove_id, order_id) in bindings {
        let progress = sim
            .order(order_id)
            .and_then(|o| (o.status == OrderStatus::InProgress).then_some(o.started_at))
            .flatten();
        let Some(started_at) = progress else {
            warn!(
                "dropping stale stove binding {stove_id} -> order {order_id} on plot {}",
                sim.plot_id
            );
            sim.stove_orders.remove(&stove_id);
            continue;
        };
        let cook_time = sim
            .order(order_id)
            .map(|o| cook_time_ms(&o.dish_id))
            .unwrap_or_default();
        if now >= started_at + cook_time {
            if let Some(order) = sim.order_mut(order_id) {
                order.status = OrderStatus::Ready;
                order.ready_at = Some(now);
            }
            sim.stove_orders.remove(&stove_id);
            events.push(SimEvent::OrderReady { order_id });
        }
    }

    // 4. Patience runs out, in any order status short of delivery.
    let expired: Vec<(u64, u64)> = sim
        .customers
        .iter()
        .filter(|c| !c.left && c.order_id.is_some() && now > c.patience_deadline)
        .map(|c| (c.id, c.order_id.unwrap_or_default()))
        .collect();
    for (customer_id, order_id) in expired {
        if let Some(customer) = sim.customer_mut(customer_id) {
            customer.left = true;
        }
        if let Some(order) = sim.order_mut(order_id) {
            if !order.status.is_terminal() {
                order.status = OrderStatus::Failed;
                order.completed_at = Some(now);
            }
        }
        sim.free_stove_of(order_id);
        sim.walkout_count += 1;
        debug!(
            "walkout on plot {}: order {order_id} waited too long",
            sim.plot_id
        );
        events.push(SimEvent::Walkout {
            order_id,
            customer_id,
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use tycoon_logic::catalog::item_types;
    use tycoon_logic::config::SIM_COOK_TIME_MS;
    use tycoon_logic::geom::{Rotation, Vec3};
    use tycoon_logic::placed::PlacedItem;

    const DISH: &str = "dish_burger";

    fn placed(id: &str, catalog_id: &str, x: f32) -> PlacedItem {
        PlacedItem {
            id: id.to_string(),
            catalog_id: catalog_id.to_string(),
            position: Vec3::new(x, 1.0, 3.5),
            rotation: Rotation::Deg0,
            created_at: 0,
            visual: None,
        }
    }

    fn restaurant() -> PlotState {
        let mut state = PlotState::new(Some("p1".to_string()), 0);
        state.placed_items.push(placed("s1", item_types::STOVE, 0.5));
        state.placed_items.push(placed("t1", item_types::TABLE, 2.5));
        state.is_open = true;
        state
    }

    fn dishes() -> Vec<String> {
        vec![DISH.to_string()]
    }

    fn spawn_and_order(sim: &mut PlotSimState, state: &PlotState, start: u64) -> (u64, u64) {
        let spawn_at = start + SIM_CUSTOMER_SPAWN_INTERVAL_MS;
        let events = tick_plot(sim, state, &dishes(), spawn_at);
        let customer_id = match &events[0] {
            SimEvent::CustomerArrived { customer_id } => *customer_id,
            other => panic!("expected arrival, got {other:?}"),
        };
        let events = tick_plot(sim, state, &dishes(), spawn_at + SIM_ORDER_CREATE_DELAY_MS);
        let order_id = events
            .iter()
            .find_map(|e| match e {
                SimEvent::OrderCreated { order_id, .. } => Some(*order_id),
                _ => None,
            })
            .unwrap();
        (customer_id, order_id)
    }

    #[test]
    fn closed_plot_spawns_nobody() {
        let mut state = restaurant();
        state.is_open = false;
        let mut sim = PlotSimState::new(0, 0);
        let events = tick_plot(&mut sim, &state, &dishes(), 10 * SIM_CUSTOMER_SPAWN_INTERVAL_MS);
        assert!(events.is_empty());
        assert!(sim.customers.is_empty());
    }

    #[test]
    fn no_seats_means_no_customers() {
        let mut state = restaurant();
        state.placed_items.retain(|i| i.catalog_id != item_types::TABLE);
        let mut sim = PlotSimState::new(0, 0);
        let events = tick_plot(&mut sim, &state, &dishes(), 10 * SIM_CUSTOMER_SPAWN_INTERVAL_MS);
        assert!(events.is_empty());
        assert!(sim.customers.is_empty());
    }

    #[test]
    fn empty_menu_means_no_customers() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let events = tick_plot(&mut sim, &state, &[], 10 * SIM_CUSTOMER_SPAWN_INTERVAL_MS);
        assert!(events.is_empty());
        assert!(sim.customers.is_empty());
    }

    #[test]
    fn first_customer_waits_a_full_interval() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        assert!(tick_plot(&mut sim, &state, &dishes(), SIM_CUSTOMER_SPAWN_INTERVAL_MS - 1).is_empty());
        let events = tick_plot(&mut sim, &state, &dishes(), SIM_CUSTOMER_SPAWN_INTERVAL_MS);
        assert!(matches!(events[0], SimEvent::CustomerArrived { .. }));
    }

    #[test]
    fn customer_is_seated_with_a_patience_deadline() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let spawn_at = SIM_CUSTOMER_SPAWN_INTERVAL_MS;
        tick_plot(&mut sim, &state, &dishes(), spawn_at);
        let customer = &sim.customers[0];
        assert_eq!(customer.seat_id, "t1");
        assert_eq!(
            customer.patience_deadline,
            spawn_at + SIM_ORDER_CREATE_DELAY_MS + SIM_PATIENCE_MS
        );
    }

    #[test]
    fn seats_rotate_round_robin() {
        let mut state = restaurant();
        state.placed_items.push(placed("t2", item_types::TABLE, 5.5));
        let mut sim = PlotSimState::new(0, 0);
        let mut now = 0;
        for _ in 0..2 {
            now += SIM_CUSTOMER_SPAWN_INTERVAL_MS;
            tick_plot(&mut sim, &state, &dishes(), now);
        }
        assert_eq!(sim.customers.len(), 2);
        assert_ne!(sim.customers[0].seat_id, sim.customers[1].seat_id);
    }

    #[test]
    fn order_follows_arrival_after_delay() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let (customer_id, order_id) = spawn_and_order(&mut sim, &state, 0);
        let order = sim.order(order_id).unwrap();
        assert_eq!(order.customer_id, customer_id);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.seat_id, sim.customer(customer_id).unwrap().seat_id);
        assert_eq!(sim.customer(customer_id).unwrap().order_id, Some(order_id));
    }

    #[test]
    fn stove_finishes_after_cook_time_and_frees_up() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let (_, order_id) = spawn_and_order(&mut sim, &state, 0);
        let started_at = sim.last_tick_at;
        {
            let order = sim.order_mut(order_id).unwrap();
            order.status = OrderStatus::InProgress;
            order.started_at = Some(started_at);
        }
        sim.stove_orders.insert("s1".to_string(), order_id);

        let before = started_at + SIM_COOK_TIME_MS - 1;
        assert!(tick_plot(&mut sim, &state, &dishes(), before).is_empty());
        assert!(sim.stove_orders.contains_key("s1"));

        let events = tick_plot(&mut sim, &state, &dishes(), started_at + SIM_COOK_TIME_MS);
        assert!(events.contains(&SimEvent::OrderReady { order_id }));
        let order = sim.order(order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Ready);
        assert_eq!(order.ready_at, Some(started_at + SIM_COOK_TIME_MS));
        assert!(sim.stove_orders.is_empty());
    }

    #[test]
    fn stale_stove_binding_is_dropped() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        sim.stove_orders.insert("s1".to_string(), 999);
        tick_plot(&mut sim, &state, &dishes(), 1_000);
        assert!(sim.stove_orders.is_empty());
    }

    #[test]
    fn patience_expiry_walks_the_customer_out() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let (customer_id, order_id) = spawn_and_order(&mut sim, &state, 0);
        let deadline = sim.customer(customer_id).unwrap().patience_deadline;
        let events = tick_plot(&mut sim, &state, &dishes(), deadline + 1);
        assert!(events.contains(&SimEvent::Walkout {
            order_id,
            customer_id
        }));
        // Records stay, with terminal markers.
        let customer = sim.customer(customer_id).unwrap();
        assert!(customer.left);
        let order = sim.order(order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.completed_at, Some(deadline + 1));
        assert_eq!(sim.walkout_count, 1);
    }

    #[test]
    fn walkout_fires_exactly_once() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let (customer_id, _) = spawn_and_order(&mut sim, &state, 0);
        let deadline = sim.customer(customer_id).unwrap().patience_deadline;
        tick_plot(&mut sim, &state, &dishes(), deadline + 1);
        let again = tick_plot(&mut sim, &state, &dishes(), deadline + 2);
        assert!(!again.iter().any(|e| matches!(e, SimEvent::Walkout { .. })));
        assert_eq!(sim.walkout_count, 1);
    }

    #[test]
    fn walkout_frees_the_stove() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let (customer_id, order_id) = spawn_and_order(&mut sim, &state, 0);
        {
            let order = sim.order_mut(order_id).unwrap();
            order.status = OrderStatus::InProgress;
            order.started_at = Some(order.created_at);
        }
        sim.stove_orders.insert("s1".to_string(), order_id);
        // Cooking started too late to finish before the deadline.
        let deadline = sim.customer(customer_id).unwrap().patience_deadline;
        sim.order_mut(order_id).unwrap().started_at = Some(deadline);
        tick_plot(&mut sim, &state, &dishes(), deadline + 1);
        assert!(sim.stove_orders.is_empty());
        assert_eq!(sim.order(order_id).unwrap().status, OrderStatus::Failed);
    }

    #[test]
    fn spawns_keep_cadence_over_time() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let mut arrivals = 0;
        let mut now = 0;
        for _ in 0..100 {
            now += 1_000;
            for event in tick_plot(&mut sim, &state, &dishes(), now) {
                if matches!(event, SimEvent::CustomerArrived { .. }) {
                    arrivals += 1;
                }
            }
        }
        // 100 seconds at one spawn per 12: eight arrivals.
        assert_eq!(arrivals, 8);
    }
}
