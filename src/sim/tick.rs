//! Discrete simulation tick
//!
//! One call per rendered frame. Order within a tick:
//! 1. Exit crossing (a transition ends the tick)
//! 2. Movement toward the pending target
//! 3. Pickup collection at the new position

use glam::Vec2;
use thiserror::Error;

use super::nav::{NavStage, resolve_step};
use super::scene::{Exit, PickupTemplate, Scene, SceneRegistry};
use super::state::{Edge, Facing, GameState};
use crate::consts::{WORLD_LEFT, WORLD_RIGHT};
use crate::tuning::Tuning;

/// Faults that abort a tick; the caller treats them as a stall
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("scene {0} is not in the registry")]
    MissingScene(usize),
    #[error("player position ({0}, {1}) is not finite")]
    NonFinitePosition(f32, f32),
}

/// What a tick did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutcome {
    pub transitioned: bool,
    pub moved: bool,
    /// Pickups collected this tick
    pub collected: usize,
    /// Cascade stage used, if a target was pending
    pub stage: Option<NavStage>,
}

impl TickOutcome {
    /// Whether anything persisted changed
    pub fn changed(&self) -> bool {
        self.transitioned || self.moved || self.collected > 0
    }
}

/// Advance the game state by one tick
pub fn tick(
    state: &mut GameState,
    registry: &SceneRegistry,
    tuning: &Tuning,
) -> Result<TickOutcome, SimError> {
    let scene = registry
        .get(state.scene_index)
        .ok_or(SimError::MissingScene(state.scene_index))?;

    let pos = state.player.position;
    if !pos.is_finite() {
        return Err(SimError::NonFinitePosition(pos.x, pos.y));
    }

    // Exits are checked against the position before this tick's movement
    if let Some((exit, edge)) = crossed_exit(scene, pos, tuning) {
        state.transition_to(exit.scene, Some(edge), pos.y, registry, tuning);
        return Ok(TickOutcome {
            transitioned: true,
            ..Default::default()
        });
    }

    let mut outcome = TickOutcome::default();
    apply_movement(state, scene, tuning, &mut outcome);
    outcome.collected = collect_nearby(state, scene, tuning);

    Ok(outcome)
}

/// Exit whose edge band contains `pos`; left wins over right
pub fn crossed_exit(scene: &Scene, pos: Vec2, tuning: &Tuning) -> Option<(Exit, Edge)> {
    if pos.x <= WORLD_LEFT + tuning.exit_margin {
        if let Some(exit) = scene.exits.left.filter(|e| e.admits(pos.y)) {
            return Some((exit, Edge::Left));
        }
    }
    if pos.x >= WORLD_RIGHT - tuning.exit_margin {
        if let Some(exit) = scene.exits.right.filter(|e| e.admits(pos.y)) {
            return Some((exit, Edge::Right));
        }
    }
    None
}

fn apply_movement(state: &mut GameState, scene: &Scene, tuning: &Tuning, outcome: &mut TickOutcome) {
    let player = &mut state.player;

    let Some(target) = player.target else {
        player.stride_ticks = 0;
        return;
    };

    let step = resolve_step(player.position, target, &scene.obstacles, tuning);
    outcome.stage = Some(step.stage);

    if !step.moved() || step.pos == player.position {
        // Arrived, or every candidate was blocked
        player.target = None;
        player.stride_ticks = 0;
        return;
    }

    player.facing = Facing::from_delta(target - player.position);
    player.position = step.pos;
    player.stride_ticks = player.stride_ticks.saturating_add(1);
    outcome.moved = true;

    if player.position.distance(target) < tuning.arrival_epsilon {
        player.target = None;
    }
}

fn collect_nearby(state: &mut GameState, scene: &Scene, tuning: &Tuning) -> usize {
    let pos = state.player.position;
    let radius = tuning.pickup_radius();

    let nearby: Vec<&PickupTemplate> = scene
        .pickups
        .iter()
        .filter(|p| !state.is_collected(&p.id) && p.position().distance(pos) < radius)
        .collect();

    nearby.into_iter().filter(|p| state.collect(p)).count()
}
