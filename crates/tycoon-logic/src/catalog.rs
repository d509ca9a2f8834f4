//! Build catalog: the static table of placeable structures.
//!
//! Catalog ids double as functional roles: the zone deriver keys off
//! `item_types::STOVE` and `item_types::TABLE`, not geometry.

use serde::{Deserialize, Serialize};

/// Well-known catalog ids. Zones and NPC targeting match on these.
pub mod item_types {
    pub const FLOOR_TILE: &str = "floor_tile";
    pub const WALL_SEGMENT: &str = "wall_segment";
    pub const TABLE: &str = "table";
    pub const CHAIR: &str = "chair";
    pub const STOVE: &str = "stove";
    /// Optional explicit NPC spawn marker; plots fall back to their entrance.
    pub const SPAWN_POINT: &str = "spawn_point";
}

/// Grid footprint in cells before rotation (width along x, depth along z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub w: i32,
    pub d: i32,
}

impl Footprint {
    pub const SINGLE: Self = Self { w: 1, d: 1 };

    pub const fn new(w: i32, d: i32) -> Self {
        Self { w, d }
    }
}

/// A placeable structure definition. Static, no state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogItem {
    pub item_type: &'static str,
    pub cost: i64,
    pub footprint: Footprint,
    pub rotation_support: bool,
    /// Model URI handed to the world surface when spawning visuals.
    pub model_uri: &'static str,
}

pub const BUILD_CATALOG: [CatalogItem; 5] = [
    CatalogItem {
        item_type: item_types::FLOOR_TILE,
        cost: 10,
        footprint: Footprint::new(1, 1),
        rotation_support: true,
        model_uri: "models/structures/slabs/grass slab.gltf",
    },
    CatalogItem {
        item_type: item_types::WALL_SEGMENT,
        cost: 25,
        footprint: Footprint::new(1, 1),
        rotation_support: true,
        model_uri: "models/structures/slabs/granite slab.gltf",
    },
    CatalogItem {
        item_type: item_types::TABLE,
        cost: 50,
        footprint: Footprint::new(2, 1),
        rotation_support: true,
        model_uri: "models/structures/slabs/granite slab.gltf",
    },
    CatalogItem {
        item_type: item_types::CHAIR,
        cost: 30,
        footprint: Footprint::new(1, 1),
        rotation_support: true,
        model_uri: "models/structures/slabs/grass flower slab.gltf",
    },
    CatalogItem {
        item_type: item_types::STOVE,
        cost: 100,
        footprint: Footprint::new(1, 1),
        rotation_support: true,
        model_uri: "models/structures/slabs/granite slab.gltf",
    },
];

/// Look up a catalog item by id.
pub fn catalog_item(item_type: &str) -> Option<&'static CatalogItem> {
    BUILD_CATALOG.iter().find(|i| i.item_type == item_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_every_entry() {
        for item in &BUILD_CATALOG {
            assert_eq!(catalog_item(item.item_type), Some(item));
        }
        assert!(catalog_item("jukebox").is_none());
    }

    #[test]
    fn table_is_the_only_multi_cell_item() {
        let table = catalog_item(item_types::TABLE).unwrap();
        assert_eq!(table.footprint, Footprint::new(2, 1));
        for item in BUILD_CATALOG.iter().filter(|i| i.item_type != item_types::TABLE) {
            assert_eq!(item.footprint, Footprint::SINGLE);
        }
    }
}
