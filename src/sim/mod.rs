//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One discrete step per tick, no wall-clock time
//! - Fixed candidate order in navigation
//! - Stable iteration order (scene data order, sorted collected ids)
//! - No rendering, storage or platform dependencies

pub mod collision;
pub mod nav;
pub mod scene;
pub mod state;
pub mod tick;

pub use collision::{collision_normal, in_bounds, will_collide};
pub use nav::{NavStage, NavStep, resolve_step, safe_destination};
pub use scene::{Exit, Exits, Obstacle, PickupTemplate, Scene, SceneError, SceneRegistry};
pub use state::{
    CollectedSet, Edge, Facing, GameEvent, GameState, ParseFacingError, PickupCounts, PlayerState,
    Snapshot,
};
pub use tick::{SimError, TickOutcome, crossed_exit, tick};
