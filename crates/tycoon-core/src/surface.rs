//! World surface abstraction.
//!
//! The engine never talks to physics or rendering directly. Everything it
//! needs from the hosting runtime fits behind [`WorldSurface`]: one raycast
//! per build tick and a handful of visual operations for ghosts, placed
//! models and NPC bodies. Headless runs use [`NullSurface`]; tests use
//! [`RecordingSurface`] to assert on the calls the engine made.

use tycoon_logic::geom::{Quat, Vec3};
use tycoon_logic::raycast::PointerRay;

/// RGB tint applied to a visual, or `None` to clear back to the base model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Tint {
    /// Ghost preview over a valid placement.
    pub const GHOST_VALID: Tint = Tint { r: 200, g: 255, b: 200 };
    /// Ghost preview over an invalid placement.
    pub const GHOST_INVALID: Tint = Tint { r: 255, g: 180, b: 180 };
    /// Highlight on the current delete target.
    pub const DELETE_TARGET: Tint = Tint { r: 255, g: 255, b: 0 };
    /// Ambient NPC body color.
    pub const NPC_BODY: Tint = Tint { r: 150, g: 200, b: 255 };
}

/// Narrow interface to the hosting runtime.
///
/// Visual handles are opaque u64s owned by the surface; the engine stores
/// them but never interprets them.
pub trait WorldSurface {
    /// Cast a ray against world geometry. Returns the hit point, if any
    /// within `max_distance`.
    fn raycast(&self, ray: &PointerRay, max_distance: f32) -> Option<Vec3>;

    /// Spawn a visual for `model_uri` and return its handle.
    fn spawn_visual(&mut self, model_uri: &str, position: Vec3, rotation: Quat) -> u64;

    /// Remove a previously spawned visual. Unknown handles are ignored.
    fn despawn_visual(&mut self, visual: u64);

    /// Move/rotate an existing visual.
    fn set_visual_pose(&mut self, visual: u64, position: Vec3, rotation: Quat);

    /// Tint an existing visual, or clear the tint with `None`.
    fn set_visual_tint(&mut self, visual: u64, tint: Option<Tint>);
}

/// Surface that hits nothing and renders nothing. Raycasts miss, so build
/// targeting falls back to the ground-plane intersection.
#[derive(Debug, Default)]
pub struct NullSurface {
    next_id: u64,
}

impl WorldSurface for NullSurface {
    fn raycast(&self, _ray: &PointerRay, _max_distance: f32) -> Option<Vec3> {
        None
    }

    fn spawn_visual(&mut self, _model_uri: &str, _position: Vec3, _rotation: Quat) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn despawn_visual(&mut self, _visual: u64) {}

    fn set_visual_pose(&mut self, _visual: u64, _position: Vec3, _rotation: Quat) {}

    fn set_visual_tint(&mut self, _visual: u64, _tint: Option<Tint>) {}
}

/// A spawned visual as the [`RecordingSurface`] last saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVisual {
    pub model_uri: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub tint: Option<Tint>,
}

/// Test/harness surface: records every visual call and answers raycasts from
/// a scripted queue (missing entries fall back to `fixed_hit`).
#[derive(Debug, Default)]
pub struct RecordingSurface {
    next_id: u64,
    pub visuals: std::collections::HashMap<u64, RecordedVisual>,
    pub despawned: Vec<u64>,
    pub fixed_hit: Option<Vec3>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface whose raycasts always hit `point`.
    pub fn hitting(point: Vec3) -> Self {
        Self {
            fixed_hit: Some(point),
            ..Self::default()
        }
    }

    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }
}

impl WorldSurface for RecordingSurface {
    fn raycast(&self, _ray: &PointerRay, _max_distance: f32) -> Option<Vec3> {
        self.fixed_hit
    }

    fn spawn_visual(&mut self, model_uri: &str, position: Vec3, rotation: Quat) -> u64 {
        self.next_id += 1;
        self.visuals.insert(
            self.next_id,
            RecordedVisual {
                model_uri: model_uri.to_string(),
                position,
                rotation,
                tint: None,
            },
        );
        self.next_id
    }

    fn despawn_visual(&mut self, visual: u64) {
        self.visuals.remove(&visual);
        self.despawned.push(visual);
    }

    fn set_visual_pose(&mut self, visual: u64, position: Vec3, rotation: Quat) {
        if let Some(v) = self.visuals.get_mut(&visual) {
            v.position = position;
            v.rotation = rotation;
        }
    }

    fn set_visual_tint(&mut self, visual: u64, tint: Option<Tint>) {
        if let Some(v) = self.visuals.get_mut(&visual) {
            v.tint = tint;
        }
    }
}
