//! Constant-speed linear motion with arrival detection.
//!
//! One step per tick: move toward the target at `speed` scaled by elapsed
//! time; when the remaining distance is within the arrival threshold (or the
//! step would overshoot), snap exactly to the target and report arrival.
//! Frame-rate independent; callers pass elapsed milliseconds.

use crate::geom::Vec3;

/// Distance at which a mover counts as arrived.
pub const ARRIVAL_THRESHOLD: f32 = 0.5;

/// Outcome of advancing a mover by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionStep {
    /// Still traveling; new position.
    Moving(Vec3),
    /// Reached the target; position snapped exactly onto it.
    Arrived(Vec3),
}

impl MotionStep {
    pub fn position(&self) -> Vec3 {
        match *self {
            MotionStep::Moving(p) | MotionStep::Arrived(p) => p,
        }
    }
}

/// Advance `position` toward `target` at `speed` units/second over
/// `delta_ms` milliseconds.
pub fn step_toward(position: Vec3, target: Vec3, speed: f32, delta_ms: u64) -> MotionStep {
    let to_target = target - position;
    let remaining = to_target.length();
    if remaining <= ARRIVAL_THRESHOLD {
        return MotionStep::Arrived(target);
    }

    let step = speed * (delta_ms as f32 / 1000.0);
    if step >= remaining {
        return MotionStep::Arrived(target);
    }

    let direction = to_target * (1.0 / remaining);
    MotionStep::Moving(position + direction * step)
}
