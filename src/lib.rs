//! Wayfarer - a top-down scene exploration game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (collision, navigation, scenes, pickups)
//! - `session`: Loading/Ready state machine tying the simulation to storage
//! - `persistence`: Snapshot save/load over pluggable key/value stores
//! - `platform`: Hosts (console driver on native, browser bindings on wasm)
//! - `tuning`: Data-driven movement configuration

pub mod persistence;
pub mod platform;
pub mod session;
pub mod sim;
pub mod tuning;

pub use session::{Phase, Session};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// World rectangle in logical units (orthographic camera bounds)
    pub const WORLD_LEFT: f32 = -2.0;
    pub const WORLD_RIGHT: f32 = 2.0;
    pub const WORLD_TOP: f32 = 2.0;
    pub const WORLD_BOTTOM: f32 = -2.0;

    /// Side of the player's square footprint
    pub const CUBE_SIZE: f32 = 0.3;

    /// Reachable area for the player center (world inset by half the footprint)
    pub const MIN_X: f32 = WORLD_LEFT + CUBE_SIZE / 2.0;
    pub const MAX_X: f32 = WORLD_RIGHT - CUBE_SIZE / 2.0;
    pub const MIN_Y: f32 = WORLD_BOTTOM + CUBE_SIZE / 2.0;
    pub const MAX_Y: f32 = WORLD_TOP - CUBE_SIZE / 2.0;

    /// Per-tick step size; the direct path advances half of it
    pub const STEP: f32 = 0.2;
    /// Distance under which the player counts as arrived
    pub const ARRIVAL_EPSILON: f32 = 0.01;
    /// Corner navigation step as a fraction of STEP
    pub const CORNER_STEP_FACTOR: f32 = 0.3;
    /// Deflections tried around the bearing, in priority order
    pub const CORNER_ANGLES_DEG: [f32; 6] = [30.0, -30.0, 45.0, -45.0, 60.0, -60.0];

    /// Pickup radius as a fraction of CUBE_SIZE
    pub const PICKUP_RADIUS_FACTOR: f32 = 0.7;

    /// Band along the left/right world edge that triggers an exit
    pub const EXIT_MARGIN: f32 = 0.2;
    /// Inset from the opposite edge when entering a new scene
    pub const ENTRY_MARGIN: f32 = 0.3;

    /// Extra reach for collision normal sampling
    pub const NORMAL_MARGIN: f32 = 0.1;

    /// Target offset for a directional move request
    pub const MOVE_OFFSET: f32 = 0.2;
}

/// Clamp a point into the reachable player area
#[inline]
pub fn clamp_to_world(p: Vec2) -> Vec2 {
    use consts::*;
    Vec2::new(p.x.clamp(MIN_X, MAX_X), p.y.clamp(MIN_Y, MAX_Y))
}

/// Convert a tap in screen pixels (origin top-left, y down) to world coordinates
pub fn screen_to_world(sx: f32, sy: f32, width: f32, height: f32) -> Vec2 {
    use consts::*;
    if width <= 0.0 || height <= 0.0 {
        return Vec2::new(
            (WORLD_LEFT + WORLD_RIGHT) / 2.0,
            (WORLD_TOP + WORLD_BOTTOM) / 2.0,
        );
    }
    let x = WORLD_LEFT + (sx / width) * (WORLD_RIGHT - WORLD_LEFT);
    let y = WORLD_TOP - (sy / height) * (WORLD_TOP - WORLD_BOTTOM);
    Vec2::new(x, y)
}

/// Serde adapter storing a `Vec2` as `{ "x": .., "y": .. }`
pub mod xy {
    use glam::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xy {
        x: f32,
        y: f32,
    }

    pub fn serialize<S: Serializer>(v: &Vec2, serializer: S) -> Result<S::Ok, S::Error> {
        Xy { x: v.x, y: v.y }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec2, D::Error> {
        let Xy { x, y } = Xy::deserialize(deserializer)?;
        Ok(Vec2::new(x, y))
    }
}
