//! Player service interactions.
//!
//! Empty-handed, an interact press resolves against the nearest stove in
//! range: a free stove starts cooking the oldest pending order, a finished
//! one hands its dish over. Carrying a dish, the only move left is delivery
//! at the ordering customer's own table. Range checks use horizontal
//! distance so floor height never matters.

use tycoon_logic::config::{menu_dish, SIM_INTERACT_RADIUS};
use tycoon_logic::geom::Vec3;
use tycoon_logic::zones::{cooking_zones, seating_zones, ZonePoint};

use crate::errors::Rejection;
use crate::sim::state::{OrderStatus, PlotSimState};
use crate::sim::tick::SimEvent;
use crate::types::PlotState;

/// What an interact press accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractOutcome {
    StartedCooking { order_id: u64 },
    PickedUp { order_id: u64 },
    Served { order_id: u64, customer_id: u64, price: i64 },
}

fn nearest_in_range(zones: &[ZonePoint], from: Vec3) -> Option<&ZonePoint> {
    zones
        .iter()
        .filter(|z| from.distance_xz(&z.position) <= SIM_INTERACT_RADIUS)
        .min_by(|a, b| {
            from.distance_xz(&a.position)
                .total_cmp(&from.distance_xz(&b.position))
        })
}

/// Resolve an interact press at `player_pos` against the plot's zones.
/// `carried` is the player's hands: the ready order they are holding, if
/// any. A stale carry (order gone or no longer ready) is dropped.
pub fn interact(
    sim: &mut PlotSimState,
    state: &PlotState,
    carried: &mut Option<u64>,
    player_pos: Vec3,
    now: u64,
) -> Result<(InteractOutcome, SimEvent), Rejection> {
    if let Some(order_id) = *carried {
        return deliver(sim, state, carried, order_id, player_pos, now);
    }

    let zones = cooking_zones(&state.placed_items);
    let stove = nearest_in_range(&zones, player_pos).ok_or(Rejection::NothingNearby)?;
    let stove_id = stove.placed_item_id.clone();

    if let Some(&bound_id) = sim.stove_orders.get(&stove_id) {
        // One slot per stove: hand over a finished dish or wait.
        if sim.order(bound_id).map(|o| o.status) == Some(OrderStatus::Ready) {
            sim.stove_orders.remove(&stove_id);
            *carried = Some(bound_id);
            return Ok((
                InteractOutcome::PickedUp { order_id: bound_id },
                SimEvent::OrderPickedUp { order_id: bound_id },
            ));
        }
        return Err(Rejection::StoveBusy);
    }

    if let Some(order_id) = sim.oldest_pending().map(|o| o.id) {
        if let Some(order) = sim.order_mut(order_id) {
            order.status = OrderStatus::InProgress;
            order.started_at = Some(now);
        }
        sim.stove_orders.insert(stove_id, order_id);
        return Ok((
            InteractOutcome::StartedCooking { order_id },
            SimEvent::CookingStarted { order_id },
        ));
    }
    if let Some(order_id) = sim.oldest_ready().map(|o| o.id) {
        sim.free_stove_of(order_id);
        *carried = Some(order_id);
        return Ok((
            InteractOutcome::PickedUp { order_id },
            SimEvent::OrderPickedUp { order_id },
        ));
    }
    Err(Rejection::NothingNearby)
}

fn deliver(
    sim: &mut PlotSimState,
    state: &PlotState,
    carried: &mut Option<u64>,
    order_id: u64,
    player_pos: Vec3,
    now: u64,
) -> Result<(InteractOutcome, SimEvent), Rejection> {
    let seat_id = match sim.order(order_id) {
        Some(order) if order.status == OrderStatus::Ready => order.seat_id.clone(),
        _ => {
            *carried = None;
            return Err(Rejection::OrderStale);
        }
    };
    let at_seat = seating_zones(&state.placed_items).iter().any(|z| {
        z.placed_item_id == seat_id && player_pos.distance_xz(&z.position) <= SIM_INTERACT_RADIUS
    });
    if !at_seat {
        return Err(Rejection::WrongTable);
    }

    let customer_id = match sim.order_mut(order_id) {
        Some(order) => {
            order.status = OrderStatus::Completed;
            order.completed_at = Some(now);
            order.customer_id
        }
        None => {
            *carried = None;
            return Err(Rejection::OrderStale);
        }
    };
    if let Some(customer) = sim.customer_mut(customer_id) {
        customer.left = true;
    }
    sim.served_count += 1;
    *carried = None;
    let price = sim
        .order(order_id)
        .and_then(|o| menu_dish(&o.dish_id))
        .map(|d| d.price)
        .unwrap_or(0);
    Ok((
        InteractOutcome::Served {
            order_id,
            customer_id,
            price,
        },
        SimEvent::OrderServed {
            order_id,
            customer_id,
            price,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Customer, Order};
    use tycoon_logic::catalog::item_types;
    use tycoon_logic::geom::Rotation;
    use tycoon_logic::placed::PlacedItem;

    fn placed(id: &str, catalog_id: &str, x: f32, z: f32) -> PlacedItem {
        PlacedItem {
            id: id.to_string(),
            catalog_id: catalog_id.to_string(),
            position: Vec3::new(x, 1.0, z),
            rotation: Rotation::Deg0,
            created_at: 0,
            visual: None,
        }
    }

    fn restaurant() -> PlotState {
        let mut state = PlotState::new(Some("p1".to_string()), 0);
        state.placed_items.push(placed("s1", item_types::STOVE, 0.5, 0.5));
        state.placed_items.push(placed("t1", item_types::TABLE, 6.5, 6.5));
        state.is_open = true;
        state
    }

    fn push_order(sim: &mut PlotSimState, seat_id: &str, status: OrderStatus) -> u64 {
        let customer_id = sim.next_id();
        let order_id = sim.next_id();
        sim.customers.push(Customer {
            id: customer_id,
            spawned_at: 0,
            seat_id: seat_id.to_string(),
            patience_deadline: 1_000_000,
            order_id: Some(order_id),
            left: false,
        });
        sim.orders.push(Order {
            id: order_id,
            customer_id,
            dish_id: "dish_burger".to_string(),
            seat_id: seat_id.to_string(),
            created_at: 0,
            status,
            started_at: None,
            ready_at: None,
            completed_at: None,
        });
        order_id
    }

    const AT_STOVE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };
    const AT_TABLE: Vec3 = Vec3 { x: 6.0, y: 1.0, z: 6.0 };

    #[test]
    fn stove_interaction_starts_cooking_and_binds_the_stove() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let order_id = push_order(&mut sim, "t1", OrderStatus::Pending);
        let mut carried = None;
        let (outcome, _) = interact(&mut sim, &state, &mut carried, AT_STOVE, 500).unwrap();
        assert_eq!(outcome, InteractOutcome::StartedCooking { order_id });
        let order = sim.order(order_id).unwrap();
        assert_eq!(order.status, OrderStatus::InProgress);
        assert_eq!(order.started_at, Some(500));
        assert_eq!(sim.stove_orders.get("s1"), Some(&order_id));
        assert_eq!(carried, None);
    }

    #[test]
    fn second_pending_order_waits_for_the_stove() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let first = push_order(&mut sim, "t1", OrderStatus::Pending);
        let second = push_order(&mut sim, "t1", OrderStatus::Pending);
        let mut carried = None;
        let (outcome, _) = interact(&mut sim, &state, &mut carried, AT_STOVE, 100).unwrap();
        assert_eq!(outcome, InteractOutcome::StartedCooking { order_id: first });
        // The single stove is occupied; the next press cannot start another.
        let err = interact(&mut sim, &state, &mut carried, AT_STOVE, 200).unwrap_err();
        assert_eq!(err, Rejection::StoveBusy);
        assert_eq!(sim.order(second).unwrap().status, OrderStatus::Pending);
        assert_eq!(sim.stove_orders.len(), 1);
    }

    #[test]
    fn ready_order_is_picked_up_at_the_stove() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let order_id = push_order(&mut sim, "t1", OrderStatus::Ready);
        let mut carried = None;
        let (outcome, event) = interact(&mut sim, &state, &mut carried, AT_STOVE, 100).unwrap();
        assert_eq!(outcome, InteractOutcome::PickedUp { order_id });
        assert_eq!(event, SimEvent::OrderPickedUp { order_id });
        assert_eq!(carried, Some(order_id));
    }

    #[test]
    fn pickup_from_a_bound_stove_frees_it() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let order_id = push_order(&mut sim, "t1", OrderStatus::Ready);
        sim.stove_orders.insert("s1".to_string(), order_id);
        let mut carried = None;
        let (outcome, _) = interact(&mut sim, &state, &mut carried, AT_STOVE, 100).unwrap();
        assert_eq!(outcome, InteractOutcome::PickedUp { order_id });
        assert!(sim.stove_orders.is_empty());
        assert_eq!(carried, Some(order_id));
    }

    #[test]
    fn delivery_lands_at_the_ordering_customers_table() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let order_id = push_order(&mut sim, "t1", OrderStatus::Ready);
        let mut carried = Some(order_id);
        let (outcome, _) = interact(&mut sim, &state, &mut carried, AT_TABLE, 900).unwrap();
        assert_eq!(
            outcome,
            InteractOutcome::Served {
                order_id,
                customer_id: order_id - 1,
                price: 15,
            }
        );
        assert_eq!(carried, None);
        assert_eq!(sim.served_count, 1);
        // Records stay, marked terminal.
        let order = sim.order(order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.completed_at, Some(900));
        assert!(sim.customer(order.customer_id).unwrap().left);
    }

    #[test]
    fn delivery_at_the_wrong_table_is_rejected() {
        let mut state = restaurant();
        state.placed_items.push(placed("t2", item_types::TABLE, 0.5, 6.5));
        let mut sim = PlotSimState::new(0, 0);
        let order_id = push_order(&mut sim, "t2", OrderStatus::Ready);
        let mut carried = Some(order_id);
        // Standing at t1, but the customer sits at t2.
        let err = interact(&mut sim, &state, &mut carried, AT_TABLE, 100).unwrap_err();
        assert_eq!(err, Rejection::WrongTable);
        assert_eq!(carried, Some(order_id));
        let (outcome, _) =
            interact(&mut sim, &state, &mut carried, Vec3::new(0.5, 1.0, 6.0), 200).unwrap();
        assert!(matches!(outcome, InteractOutcome::Served { .. }));
    }

    #[test]
    fn stale_carry_is_dropped() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        let mut carried = Some(999);
        let err = interact(&mut sim, &state, &mut carried, AT_TABLE, 100).unwrap_err();
        assert_eq!(err, Rejection::OrderStale);
        assert_eq!(carried, None);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        push_order(&mut sim, "t1", OrderStatus::Pending);
        let mut carried = None;
        let err =
            interact(&mut sim, &state, &mut carried, Vec3::new(50.0, 1.0, 50.0), 0).unwrap_err();
        assert_eq!(err, Rejection::NothingNearby);
    }

    #[test]
    fn empty_handed_at_a_table_does_nothing() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        push_order(&mut sim, "t1", OrderStatus::Ready);
        let mut carried = None;
        let err = interact(&mut sim, &state, &mut carried, AT_TABLE, 0).unwrap_err();
        assert_eq!(err, Rejection::NothingNearby);
    }

    #[test]
    fn interaction_height_is_ignored() {
        let state = restaurant();
        let mut sim = PlotSimState::new(0, 0);
        push_order(&mut sim, "t1", OrderStatus::Pending);
        let mut carried = None;
        // Standing on a raised tile right next to the stove.
        assert!(interact(&mut sim, &state, &mut carried, Vec3::new(1.0, 4.0, 1.0), 0).is_ok());
    }
}
