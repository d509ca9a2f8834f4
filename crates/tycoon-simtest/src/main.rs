//! Tycoon Headless Simulation Harness
//!
//! Validates build and simulation logic without a game runtime.
//! Runs entirely in-process: no storage service, no networking, no
//! rendering.
//!
//! Usage:
//!   cargo run -p tycoon-simtest
//!   cargo run -p tycoon-simtest -- --verbose

use tycoon_core::build::BuildCommand;
use tycoon_core::engine::{EngineEvent, TycoonEngine};
use tycoon_core::sim::{InteractOutcome, OrderStatus, SimEvent};
use tycoon_logic::catalog::{catalog_item, item_types, BUILD_CATALOG};
use tycoon_logic::config::{
    menu_dish, GRID_CELL_SIZE, PLOT_GRID_SIZE, RATING_MAX, STARTING_CASH,
};
use tycoon_logic::geom::{Rotation, Vec3};
use tycoon_logic::grid::{occupied_cells, snap_to_plot_grid};
use tycoon_logic::raycast::{intersect_ground_plane, pointer_ray, resolve_build_surface};

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail,
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Tycoon Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Build catalog consistency
    results.extend(validate_catalog(verbose));

    // 2. Grid math sweep
    results.extend(validate_grid(verbose));

    // 3. Pointer ray resolution
    results.extend(validate_raycast(verbose));

    // 4. Full restaurant service loop
    results.extend(validate_service_loop(verbose));

    // 5. Walkout economics
    results.extend(validate_walkouts(verbose));

    // 6. World snapshot roundtrip
    results.extend(validate_snapshot(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(_verbose: bool) -> Vec<TestResult> {
    println!("--- Build Catalog ---");
    let mut results = Vec::new();

    results.push(check(
        "catalog_costs_positive",
        BUILD_CATALOG.iter().all(|i| i.cost > 0),
        format!("{} items priced", BUILD_CATALOG.len()),
    ));

    let footprint_cells_ok = BUILD_CATALOG
        .iter()
        .all(|i| i.footprint.w >= 1 && i.footprint.d >= 1);
    results.push(check(
        "catalog_footprints_positive",
        footprint_cells_ok,
        "every footprint covers at least one cell".into(),
    ));

    let zone_roles =
        catalog_item(item_types::STOVE).is_some() && catalog_item(item_types::TABLE).is_some();
    results.push(check(
        "catalog_has_zone_roles",
        zone_roles,
        "stove and table entries present".into(),
    ));

    let burger = menu_dish("dish_burger");
    results.push(check(
        "menu_has_starter_dish",
        burger.map(|d| d.price > 0).unwrap_or(false),
        format!("dish_burger: {:?}", burger),
    ));

    results
}

// ── 2. Grid ─────────────────────────────────────────────────────────────

fn validate_grid(_verbose: bool) -> Vec<TestResult> {
    println!("--- Grid Math ---");
    let mut results = Vec::new();
    let plots = tycoon_core::plots::default_plots();
    let bounds = plots[0].bounds;

    // Snap every point of a dense sweep and verify idempotence.
    let mut stable = true;
    let mut samples = 0;
    let mut x = bounds.min.x;
    while x <= bounds.max.x {
        let mut z = bounds.min.z;
        while z <= bounds.max.z {
            let p = Vec3::new(x, bounds.min.y, z);
            let snapped = snap_to_plot_grid(&bounds, p);
            let twice = snap_to_plot_grid(&bounds, snapped);
            if snapped != twice {
                stable = false;
            }
            samples += 1;
            z += 0.37;
        }
        x += 0.37;
    }
    results.push(check(
        "snap_is_idempotent",
        stable,
        format!("{samples} sample points"),
    ));

    // The plot holds exactly PLOT_GRID_SIZE^2 distinct cells.
    let mut cells = std::collections::HashSet::new();
    for ix in 0..PLOT_GRID_SIZE {
        for iz in 0..PLOT_GRID_SIZE {
            let p = Vec3::new(
                bounds.min.x + (ix as f32 + 0.3) * GRID_CELL_SIZE,
                bounds.min.y,
                bounds.min.z + (iz as f32 + 0.3) * GRID_CELL_SIZE,
            );
            let snapped = snap_to_plot_grid(&bounds, p);
            cells.insert(((snapped.x * 10.0) as i64, (snapped.z * 10.0) as i64));
        }
    }
    results.push(check(
        "plot_cell_count",
        cells.len() == (PLOT_GRID_SIZE * PLOT_GRID_SIZE) as usize,
        format!("{} distinct cells", cells.len()),
    ));

    // Rotation swaps footprints for quarter turns.
    let table = catalog_item(item_types::TABLE).expect("table in catalog");
    let pos = Vec3::new(0.5, 1.0, 0.5);
    let flat = occupied_cells(pos, table.footprint, Rotation::Deg0);
    let turned = occupied_cells(pos, table.footprint, Rotation::Deg90);
    results.push(check(
        "rotation_swaps_span",
        flat != turned && flat.len() == turned.len(),
        format!("{:?} vs {:?}", flat, turned),
    ));

    results
}

// ── 3. Raycast ──────────────────────────────────────────────────────────

fn validate_raycast(_verbose: bool) -> Vec<TestResult> {
    println!("--- Pointer Rays ---");
    let mut results = Vec::new();

    // Every look direction must resolve to *some* point on the ground plane.
    let mut resolved = 0;
    let mut total = 0;
    for pitch in -8..=8 {
        for yaw in 0..16 {
            total += 1;
            let theta = yaw as f32 * std::f32::consts::TAU / 16.0;
            let look = Vec3::new(
                theta.cos(),
                pitch as f32 / 8.0,
                theta.sin(),
            );
            let ray = pointer_ray(Vec3::new(0.0, 5.0, 0.0), look);
            let hit = resolve_build_surface(None, &ray, 1.0);
            if (hit.y - 1.0).abs() < 1e-4 {
                resolved += 1;
            }
        }
    }
    results.push(check(
        "ray_always_resolves",
        resolved == total,
        format!("{resolved}/{total} directions landed on the plane"),
    ));

    // Downward rays land directly under the eye.
    let ray = pointer_ray(Vec3::new(3.0, 10.0, 7.0), Vec3::new(0.0, -1.0, 0.0));
    let hit = intersect_ground_plane(&ray, 1.0);
    results.push(check(
        "down_ray_lands_below",
        hit == Vec3::new(3.0, 1.0, 7.0),
        format!("{hit:?}"),
    ));

    results
}

// ── 4. Service loop ─────────────────────────────────────────────────────

const DOWN: Vec3 = Vec3 {
    x: 0.0,
    y: -1.0,
    z: 0.0,
};

fn place(engine: &mut TycoonEngine, catalog_id: &str, x: f32, z: f32) -> bool {
    if engine
        .command(
            "p1",
            BuildCommand::SelectItem {
                catalog_id: catalog_id.to_string(),
            },
        )
        .is_err()
    {
        return false;
    }
    engine.update_player_pose("p1", Vec3::new(x, 6.0, z), DOWN);
    let now = engine.now() + 33;
    engine.update(now, 33);
    engine.command("p1", BuildCommand::Place).is_ok()
}

fn open_restaurant() -> Option<TycoonEngine> {
    let mut engine = TycoonEngine::headless();
    engine.update(1_000, 33);
    engine.join("p1")?;
    if !place(&mut engine, item_types::STOVE, -4.2, 2.9) {
        return None;
    }
    if !place(&mut engine, item_types::TABLE, -1.2, 5.9) {
        return None;
    }
    engine.set_restaurant_open("p1", true).ok()?;
    engine.take_events();
    Some(engine)
}

fn run_until<F>(engine: &mut TycoonEngine, max_ms: u64, pred: F) -> bool
where
    F: Fn(&SimEvent) -> bool,
{
    let deadline = engine.now() + max_ms;
    while engine.now() < deadline {
        let now = engine.now() + 100;
        engine.update(now, 100);
        for event in engine.take_events() {
            if let EngineEvent::Sim { event, .. } = event {
                if pred(&event) {
                    return true;
                }
            }
        }
    }
    false
}

fn validate_service_loop(verbose: bool) -> Vec<TestResult> {
    println!("--- Service Loop ---");
    let mut results = Vec::new();

    let Some(mut engine) = open_restaurant() else {
        results.push(check("restaurant_setup", false, "setup failed".into()));
        return results;
    };
    let cash_after_build = engine.profile("p1").map(|p| p.cash).unwrap_or(0);
    results.push(check(
        "build_costs_deducted",
        cash_after_build == STARTING_CASH - 150,
        format!("${cash_after_build} after stove + table"),
    ));

    let ordered = run_until(&mut engine, 30_000, |e| {
        matches!(e, SimEvent::OrderCreated { .. })
    });
    results.push(check("customer_orders", ordered, "order created".into()));

    engine.update_player_pose("p1", Vec3::new(-4.5, 2.0, 2.5), DOWN);
    let cooking = matches!(
        engine.interact("p1"),
        Ok(InteractOutcome::StartedCooking { .. })
    );
    results.push(check("stove_starts_cooking", cooking, "interact at stove".into()));

    // A second press cannot start another order on the same stove.
    let busy = matches!(engine.interact("p1"), Err(ref e) if e.code() == "stove_busy");
    results.push(check("stove_is_single_slot", busy, "second press rejected".into()));

    let ready = run_until(&mut engine, 20_000, |e| {
        matches!(e, SimEvent::OrderReady { .. })
    });
    results.push(check("dish_cooks", ready, "order reached ready".into()));

    let picked_up = matches!(
        engine.interact("p1"),
        Ok(InteractOutcome::PickedUp { .. })
    );
    results.push(check("dish_picked_up", picked_up, "collected at stove".into()));

    engine.update_player_pose("p1", Vec3::new(-1.5, 2.0, 5.5), DOWN);
    let served = matches!(
        engine.interact("p1"),
        Ok(InteractOutcome::Served { price: 15, .. })
    );
    results.push(check("table_serves", served, "delivered at the table".into()));

    let cash = engine.profile("p1").map(|p| p.cash).unwrap_or(0);
    let rating = engine.plot_state(0).map(|s| s.rating).unwrap_or(-1.0);
    results.push(check(
        "revenue_and_rating",
        cash == cash_after_build + 15 && (rating - 0.02).abs() < 1e-6 && rating <= RATING_MAX,
        format!("cash ${cash}, rating {rating:.2}"),
    ));

    if verbose {
        println!("  npcs alive at end: {}", engine.npc_count());
    }
    results
}

// ── 5. Walkouts ─────────────────────────────────────────────────────────

fn validate_walkouts(_verbose: bool) -> Vec<TestResult> {
    println!("--- Walkouts ---");
    let mut results = Vec::new();

    let Some(mut engine) = open_restaurant() else {
        results.push(check("restaurant_setup", false, "setup failed".into()));
        return results;
    };

    let walked = run_until(&mut engine, 120_000, |e| {
        matches!(e, SimEvent::Walkout { .. })
    });
    results.push(check("impatient_customer_leaves", walked, "walkout seen".into()));

    let rating = engine.plot_state(0).map(|s| s.rating).unwrap_or(-1.0);
    results.push(check(
        "rating_floors_at_zero",
        rating == 0.0,
        format!("rating {rating:.2} after penalty from zero"),
    ));

    let cash = engine.profile("p1").map(|p| p.cash).unwrap_or(0);
    results.push(check(
        "no_revenue_on_walkout",
        cash == STARTING_CASH - 150,
        format!("${cash}"),
    ));

    // The leaver and their failed order stay on the books.
    let retained = engine
        .sim(0)
        .map(|sim| {
            sim.customers.iter().filter(|c| c.left).any(|c| {
                c.order_id
                    .and_then(|id| sim.order(id))
                    .map(|o| o.status == OrderStatus::Failed)
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false);
    results.push(check(
        "walkout_records_retained",
        retained,
        "failed orders kept with terminal status".into(),
    ));

    results
}

// ── 6. Snapshot ─────────────────────────────────────────────────────────

fn validate_snapshot(_verbose: bool) -> Vec<TestResult> {
    println!("--- Snapshot ---");
    let mut results = Vec::new();

    let Some(mut engine) = open_restaurant() else {
        results.push(check("restaurant_setup", false, "setup failed".into()));
        return results;
    };
    run_until(&mut engine, 20_000, |_| false);

    let mut buffer = Vec::new();
    let saved = engine.save(&mut buffer).is_ok();
    results.push(check(
        "snapshot_saves",
        saved && !buffer.is_empty(),
        format!("{} bytes", buffer.len()),
    ));

    let mut loaded = TycoonEngine::headless();
    let ok = loaded.load(&buffer[..]).is_ok();
    let same_world = loaded.plot_state(0).map(|s| s.placed_items.len())
        == engine.plot_state(0).map(|s| s.placed_items.len())
        && loaded.npc_count() == engine.npc_count()
        && loaded.now() == engine.now();
    results.push(check(
        "snapshot_restores",
        ok && same_world,
        format!(
            "{} items, {} npcs",
            loaded.plot_state(0).map(|s| s.placed_items.len()).unwrap_or(0),
            loaded.npc_count()
        ),
    ));

    results
}
