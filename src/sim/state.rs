//! Game state and core simulation types
//!
//! Everything a save needs is projected into `Snapshot`; everything else
//! (pending target, facing, stride counter, queued events) is transient.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scene::{PickupTemplate, Scene, SceneRegistry};
use crate::clamp_to_world;
use crate::tuning::Tuning;

/// Direction the player sprite faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    /// Unit vector in world space (y up)
    pub fn unit(self) -> Vec2 {
        match self {
            Facing::Up => Vec2::Y,
            Facing::Down => Vec2::NEG_Y,
            Facing::Left => Vec2::NEG_X,
            Facing::Right => Vec2::X,
        }
    }

    /// Facing along the dominant axis of `delta` (ties go vertical)
    pub fn from_delta(delta: Vec2) -> Self {
        if delta.x.abs() > delta.y.abs() {
            if delta.x > 0.0 { Facing::Right } else { Facing::Left }
        } else if delta.y > 0.0 {
            Facing::Up
        } else {
            Facing::Down
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown direction '{0}'")]
pub struct ParseFacingError(pub String);

impl FromStr for Facing {
    type Err = ParseFacingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" | "u" => Ok(Facing::Up),
            "down" | "d" => Ok(Facing::Down),
            "left" | "l" => Ok(Facing::Left),
            "right" | "r" => Ok(Facing::Right),
            _ => Err(ParseFacingError(s.to_string())),
        }
    }
}

/// A scene edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// The single live player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub position: Vec2,
    /// Pending destination; latest request wins
    pub target: Option<Vec2>,
    pub facing: Facing,
    /// Consecutive ticks spent moving (0 while idle); drives walk animation
    pub stride_ticks: u32,
}

impl PlayerState {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            target: None,
            facing: Facing::default(),
            stride_ticks: 0,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.stride_ticks > 0
    }
}

/// Pickup ids collected so far, across all scenes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedSet {
    ids: BTreeSet<String>,
}

impl CollectedSet {
    pub fn is_collected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns true if `id` was not collected before
    pub fn mark_collected(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// Accumulated pickup value per type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickupCounts {
    counts: BTreeMap<String, f64>,
}

impl PickupCounts {
    /// Value collected for `kind` (0 if none)
    pub fn get(&self, kind: &str) -> f64 {
        self.counts.get(kind).copied().unwrap_or(0.0)
    }

    /// Add to a counter; negative or non-finite amounts are refused
    pub fn add(&mut self, kind: &str, amount: f64) {
        if !amount.is_finite() || amount < 0.0 {
            log::warn!("Refusing pickup amount {} for '{}'", amount, kind);
            return;
        }
        *self.counts.entry(kind.to_string()).or_insert(0.0) += amount;
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.counts
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Durable projection of the game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub pickup_counts: BTreeMap<String, f64>,
    pub collected_pickup_ids: Vec<String>,
    pub current_scene: usize,
    #[serde(with = "crate::xy")]
    pub player_position: Vec2,
}

/// Events for the presentation layer, drained by the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    #[serde(rename_all = "camelCase")]
    PickupCollected {
        id: String,
        #[serde(rename = "type")]
        kind: String,
        value: f64,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    SceneChanged {
        from_scene: usize,
        to_scene: usize,
        /// Edge the player left through; `None` for direct jumps
        entry_edge: Option<Edge>,
    },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Always a valid registry index
    pub scene_index: usize,
    pub player: PlayerState,
    collected: CollectedSet,
    counts: PickupCounts,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Fresh game at the start scene's spawn
    pub fn new(registry: &SceneRegistry) -> Self {
        let start = registry.get_or_first(0);
        Self {
            scene_index: 0,
            player: PlayerState::at(start.player_start),
            collected: CollectedSet::default(),
            counts: PickupCounts::default(),
            events: Vec::new(),
        }
    }

    /// Rebuild state from a save, repairing anything the registry can't honor
    pub fn from_snapshot(snapshot: Snapshot, registry: &SceneRegistry) -> Self {
        let mut state = Self::new(registry);

        let scene_valid = snapshot.current_scene < registry.len();
        if scene_valid {
            state.scene_index = snapshot.current_scene;
        } else {
            log::warn!(
                "Saved scene {} does not exist, falling back to scene 0",
                snapshot.current_scene
            );
        }

        let spawn = registry.get_or_first(state.scene_index).player_start;
        state.player.position = if scene_valid && snapshot.player_position.is_finite() {
            snapshot.player_position
        } else {
            spawn
        };

        for id in &snapshot.collected_pickup_ids {
            if registry.contains_pickup(id) {
                state.collected.mark_collected(id);
            } else {
                log::warn!("Dropping unknown collected pickup '{}'", id);
            }
        }

        for (kind, amount) in &snapshot.pickup_counts {
            state.counts.add(kind, *amount);
        }

        state
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            pickup_counts: self.counts.as_map().clone(),
            collected_pickup_ids: self.collected.iter().map(str::to_string).collect(),
            current_scene: self.scene_index,
            player_position: self.player.position,
        }
    }

    pub fn collected(&self) -> &CollectedSet {
        &self.collected
    }

    pub fn counts(&self) -> &PickupCounts {
        &self.counts
    }

    pub fn is_collected(&self, id: &str) -> bool {
        self.collected.is_collected(id)
    }

    /// Record a destination, replacing any pending one
    pub fn set_target(&mut self, target: Vec2) {
        if !target.is_finite() {
            log::warn!("Ignoring non-finite target ({}, {})", target.x, target.y);
            return;
        }
        self.player.target = Some(target);
    }

    /// Step request in a fixed direction: faces it and targets a fixed offset
    pub fn request_move(&mut self, facing: Facing, tuning: &Tuning) {
        self.player.facing = facing;
        let target = self.player.position + facing.unit() * tuning.move_offset;
        self.set_target(target);
    }

    /// Move to another scene; `entry_edge` is the edge the player left through
    pub fn transition_to(
        &mut self,
        scene_index: usize,
        entry_edge: Option<Edge>,
        y: f32,
        registry: &SceneRegistry,
        tuning: &Tuning,
    ) {
        use crate::consts::{WORLD_LEFT, WORLD_RIGHT};

        let from_scene = self.scene_index;
        let to_scene = if scene_index < registry.len() {
            scene_index
        } else {
            log::warn!("Transition to missing scene {}, using scene 0", scene_index);
            0
        };
        let scene = registry.get_or_first(to_scene);

        let x = match entry_edge {
            Some(Edge::Left) => WORLD_RIGHT - tuning.entry_margin,
            Some(Edge::Right) => WORLD_LEFT + tuning.entry_margin,
            _ => scene.player_start.x,
        };

        self.scene_index = to_scene;
        self.player.position = clamp_to_world(Vec2::new(x, y));
        self.player.target = None;
        self.player.stride_ticks = 0;

        log::info!("Scene {} -> {} ({:?})", from_scene, to_scene, entry_edge);
        self.events.push(GameEvent::SceneChanged {
            from_scene,
            to_scene,
            entry_edge,
        });
    }

    /// Mark a pickup collected and credit its value; false if already taken
    pub fn collect(&mut self, pickup: &PickupTemplate) -> bool {
        if !self.collected.mark_collected(&pickup.id) {
            return false;
        }
        self.counts.add(&pickup.kind, pickup.value);

        log::info!("Collected '{}' ({} +{})", pickup.id, pickup.kind, pickup.value);
        self.events.push(GameEvent::PickupCollected {
            id: pickup.id.clone(),
            kind: pickup.kind.clone(),
            value: pickup.value,
            message: pickup.message.clone(),
        });
        true
    }

    /// Pickups in `scene` that have not been collected
    pub fn visible_pickups<'a>(&'a self, scene: &'a Scene) -> impl Iterator<Item = &'a PickupTemplate> {
        scene
            .pickups
            .iter()
            .filter(move |p| !self.collected.is_collected(&p.id))
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
