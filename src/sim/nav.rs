//! Per-tick path resolution toward a requested destination
//!
//! No search: each tick walks an ordered fallback cascade and takes the
//! first free candidate.
//!
//! 1. Direct step along the bearing (half the step size, capped at the
//!    remaining distance)
//! 2. Slide along X only, then Y only (a zero-length slide stalls)
//! 3. Corner deflections around the bearing, in the tuned priority order
//! 4. Stall in place
//!
//! The order is fixed so replays are reproducible; it is not a
//! nearest-angle search.

use glam::Vec2;

use super::collision::will_collide;
use super::scene::Obstacle;
use crate::tuning::Tuning;

/// Which cascade stage produced a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavStage {
    /// Already within arrival distance; no movement
    Arrived,
    Direct,
    SlideX,
    SlideY,
    /// Deflected by the given angle (degrees) from the bearing
    Corner(f32),
    /// Every candidate was blocked; no movement
    Stalled,
}

/// Outcome of resolving one tick of movement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavStep {
    pub pos: Vec2,
    pub stage: NavStage,
}

impl NavStep {
    fn stay(pos: Vec2, stage: NavStage) -> Self {
        Self { pos, stage }
    }

    /// Whether the player actually moved
    pub fn moved(&self) -> bool {
        !matches!(self.stage, NavStage::Arrived | NavStage::Stalled)
    }
}

/// Resolve the next position toward `target`, reporting the stage used
pub fn resolve_step(current: Vec2, target: Vec2, obstacles: &[Obstacle], tuning: &Tuning) -> NavStep {
    let delta = target - current;
    let distance = delta.length();

    if distance < tuning.arrival_epsilon {
        return NavStep::stay(current, NavStage::Arrived);
    }

    let dir = delta / distance;

    if let Some(pos) = direct_step(current, dir, distance, obstacles, tuning) {
        return NavStep {
            pos,
            stage: NavStage::Direct,
        };
    }

    if let Some(step) = slide_step(current, dir, obstacles, tuning) {
        return step;
    }

    if let Some(step) = corner_step(current, delta, obstacles, tuning) {
        return step;
    }

    log::debug!("Navigation stalled at ({:.3}, {:.3})", current.x, current.y);
    NavStep::stay(current, NavStage::Stalled)
}

/// Next safe position toward `target`; returns `current` when arrived or stalled
pub fn safe_destination(current: Vec2, target: Vec2, obstacles: &[Obstacle], tuning: &Tuning) -> Vec2 {
    resolve_step(current, target, obstacles, tuning).pos
}

fn direct_step(
    current: Vec2,
    dir: Vec2,
    distance: f32,
    obstacles: &[Obstacle],
    tuning: &Tuning,
) -> Option<Vec2> {
    let step = tuning.direct_step().min(distance);
    let candidate = current + dir * step;
    (!will_collide(candidate, obstacles)).then_some(candidate)
}

fn slide_step(current: Vec2, dir: Vec2, obstacles: &[Obstacle], tuning: &Tuning) -> Option<NavStep> {
    let step = tuning.slide_step();
    let candidates = [
        (Vec2::new(current.x + dir.x * step, current.y), NavStage::SlideX),
        (Vec2::new(current.x, current.y + dir.y * step), NavStage::SlideY),
    ];

    let (pos, stage) = candidates
        .into_iter()
        .find(|(candidate, _)| !will_collide(*candidate, obstacles))?;

    // A zero axis component slides nowhere; the cascade still ends here
    if pos == current {
        log::debug!("Navigation stalled at ({:.3}, {:.3})", current.x, current.y);
        return Some(NavStep::stay(current, NavStage::Stalled));
    }
    Some(NavStep { pos, stage })
}

fn corner_step(current: Vec2, delta: Vec2, obstacles: &[Obstacle], tuning: &Tuning) -> Option<NavStep> {
    let step = tuning.corner_step();
    let bearing = delta.y.atan2(delta.x);

    tuning.corner_angles_deg.iter().find_map(|&offset_deg| {
        let angle = bearing + offset_deg.to_radians();
        let candidate = current + Vec2::new(angle.cos(), angle.sin()) * step;
        (!will_collide(candidate, obstacles)).then_some(NavStep {
            pos: candidate,
            stage: NavStage::Corner(offset_deg),
        })
    })
}
