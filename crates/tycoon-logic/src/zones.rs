//! Functional zones derived from placed items, not geometry.
//!
//! A stove is a cooking zone, a table is a seating (and pickup) zone. Zones
//! are keyed by the placed item id so the simulation can address one table
//! rather than a raw coordinate. Stateless, recomputed on demand.

use crate::catalog::item_types;
use crate::geom::Vec3;
use crate::placed::PlacedItem;

/// A zone anchor: position plus the placed item that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePoint {
    pub position: Vec3,
    pub placed_item_id: String,
}

/// Which functional role a placed item fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    Cooking,
    Seating,
}

fn zones_of(items: &[PlacedItem], catalog_id: &str) -> Vec<ZonePoint> {
    items
        .iter()
        .filter(|item| item.catalog_id == catalog_id)
        .map(|item| ZonePoint {
            position: item.position,
            placed_item_id: item.id.clone(),
        })
        .collect()
}

/// Cooking zones: one per placed stove.
pub fn cooking_zones(items: &[PlacedItem]) -> Vec<ZonePoint> {
    zones_of(items, item_types::STOVE)
}

/// Seating/pickup zones: one per placed table.
pub fn seating_zones(items: &[PlacedItem]) -> Vec<ZonePoint> {
    zones_of(items, item_types::TABLE)
}

/// The single order zone: first table, or the plot entrance if none.
pub fn order_zone(items: &[PlacedItem], entrance: Vec3) -> ZonePoint {
    seating_zones(items)
        .into_iter()
        .next()
        .unwrap_or(ZonePoint {
            position: entrance,
            placed_item_id: "__entrance__".to_string(),
        })
}

/// Minimum viable setup: at least one stove and one table. Gates opening.
pub fn has_minimum_setup(items: &[PlacedItem]) -> bool {
    let stoves = items
        .iter()
        .filter(|i| i.catalog_id == item_types::STOVE)
        .count();
    let tables = items
        .iter()
        .filter(|i| i.catalog_id == item_types::TABLE)
        .count();
    stoves >= 1 && tables >= 1
}

/// Resolve a placed item id to its zone kind and position, if it is a zone.
pub fn zone_by_placed_id(items: &[PlacedItem], placed_item_id: &str) -> Option<(ZoneKind, Vec3)> {
    let item = items.iter().find(|i| i.id == placed_item_id)?;
    match item.catalog_id.as_str() {
        item_types::STOVE => Some((ZoneKind::Cooking, item.position)),
        item_types::TABLE => Some((ZoneKind::Seating, item.position)),
        _ => None,
    }
}
