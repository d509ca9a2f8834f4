//! Pointer ray and placement surface math.
//!
//! The server has no screen cursor: the pointer ray starts at the player and
//! follows the look direction. A physics raycast (done by the host runtime)
//! supplies a hit point; hits well above the plot floor are treated as walls,
//! not walkable surfaces, and fall back to the ground-plane intersection so
//! the preview always has a placement target.

use crate::geom::{Quat, Rotation, Vec3};

/// Maximum distance a pointer ray reaches.
pub const RAY_LENGTH: f32 = 50.0;

/// A physics hit more than this far above the floor is treated as a wall.
pub const FLOOR_VS_WALL_THRESHOLD: f32 = 0.5;

/// Ray from the player toward where they are looking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Build the pointer ray from player position and (possibly unnormalized)
/// look direction.
pub fn pointer_ray(position: Vec3, look_direction: Vec3) -> PointerRay {
    let len = look_direction.length();
    let direction = if len > 0.0 {
        look_direction * (1.0 / len)
    } else {
        // Degenerate look vector: point straight down so the ray still
        // produces a plane hit under the player.
        Vec3::new(0.0, -1.0, 0.0)
    };
    PointerRay {
        origin: position,
        direction,
    }
}

/// Intersect the ray with the horizontal plane `y = ground_y`.
///
/// A ray parallel to the plane, or one whose intersection lies behind the
/// origin or beyond [`RAY_LENGTH`], resolves to the point on the plane
/// directly below the origin so the preview still has a target.
pub fn intersect_ground_plane(ray: &PointerRay, ground_y: f32) -> Vec3 {
    let below = Vec3::new(ray.origin.x, ground_y, ray.origin.z);
    if ray.direction.y.abs() < 1e-6 {
        return below;
    }
    let t = (ground_y - ray.origin.y) / ray.direction.y;
    if !(0.0..=RAY_LENGTH).contains(&t) {
        return below;
    }
    Vec3 {
        x: ray.origin.x + t * ray.direction.x,
        y: ground_y,
        z: ray.origin.z + t * ray.direction.z,
    }
}

/// Resolve the build surface point from an optional physics hit.
///
/// The physics hit wins unless it sits more than [`FLOOR_VS_WALL_THRESHOLD`]
/// above the floor (a wall); a wall hit or a miss falls back to the ground
/// plane.
pub fn resolve_build_surface(physics_hit: Option<Vec3>, ray: &PointerRay, ground_y: f32) -> Vec3 {
    match physics_hit {
        Some(hit) if hit.y <= ground_y + FLOOR_VS_WALL_THRESHOLD => hit,
        _ => intersect_ground_plane(ray, ground_y),
    }
}

/// Y-axis quaternion for a placement rotation, for visual orientation.
pub fn rotation_to_quaternion(rotation: Rotation) -> Quat {
    let rad = (rotation.degrees() as f32).to_radians();
    Quat {
        x: 0.0,
        y: (rad / 2.0).sin(),
        z: 0.0,
        w: (rad / 2.0).cos(),
    }
}
