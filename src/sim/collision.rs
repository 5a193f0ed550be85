//! Collision queries for the player's square footprint
//!
//! The player is an axis-aligned square of side `CUBE_SIZE`. Obstacles are
//! axis-aligned squares too, so overlap is a per-axis interval test on the
//! Minkowski sum of the two half extents.

use glam::Vec2;

use super::scene::Obstacle;
use crate::consts::*;

/// Whether the player center at `point` lies inside the reachable area
#[inline]
pub fn in_bounds(point: Vec2) -> bool {
    point.x >= MIN_X && point.x <= MAX_X && point.y >= MIN_Y && point.y <= MAX_Y
}

/// Whether the player footprint centered at `point` overlaps `obstacle`
#[inline]
pub fn overlaps(point: Vec2, obstacle: &Obstacle) -> bool {
    let reach = CUBE_SIZE / 2.0 + obstacle.half_size();
    (point.x - obstacle.x).abs() < reach && (point.y - obstacle.y).abs() < reach
}

/// Check whether the player can occupy `point`
///
/// Returns true (blocked) outside the reachable area or when the footprint
/// overlaps any obstacle. Touching edges is not an overlap.
pub fn will_collide(point: Vec2, obstacles: &[Obstacle]) -> bool {
    if !in_bounds(point) {
        return true;
    }
    obstacles.iter().any(|o| overlaps(point, o))
}

/// Unit vector pointing away from every obstacle within reach
///
/// Per-obstacle unit directions are summed first and the sum is normalized
/// once. Returns zero when nothing is within reach or the pushes cancel.
pub fn collision_normal(point: Vec2, obstacles: &[Obstacle]) -> Vec2 {
    let mut sum = Vec2::ZERO;

    for obstacle in obstacles {
        let away = point - obstacle.center();
        let distance = away.length();
        let reach = CUBE_SIZE / 2.0 + obstacle.half_size() + NORMAL_MARGIN;

        // Coincident centers have no direction
        if distance > 0.0 && distance < reach {
            sum += away / distance;
        }
    }

    sum.normalize_or_zero()
}
