//! Scene descriptors and the read-only scene registry
//!
//! Scenes are authored as JSON and never mutated at runtime. Index 0 is the
//! start scene. Bad exit data is sanitized to "no exit" at load time so the
//! simulation never has to second-guess it.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors building a scene registry
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to parse scene data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scene registry is empty")]
    Empty,
}

/// Axis-aligned square obstacle centered at (x, y)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self { x, y, size }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn half_size(&self) -> f32 {
        self.size / 2.0
    }
}

/// Immutable pickup template; collection state lives in the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupTemplate {
    /// Globally unique across all scenes
    pub id: String,
    pub x: f32,
    pub y: f32,
    /// Counter bucket this pickup feeds ("coin", "key", ...)
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    #[serde(default)]
    pub message: String,
}

impl PickupTemplate {
    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// A scene-boundary trigger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exit {
    /// Target scene index
    pub scene: usize,
    /// Inclusive range the crossing coordinate must fall in
    #[serde(default)]
    pub y_range: Option<[f32; 2]>,
}

impl Exit {
    pub fn new(scene: usize) -> Self {
        Self {
            scene,
            y_range: None,
        }
    }

    pub fn with_y_range(mut self, min: f32, max: f32) -> Self {
        self.y_range = Some([min, max]);
        self
    }

    /// Whether a crossing at `y` may use this exit
    pub fn admits(&self, y: f32) -> bool {
        match self.y_range {
            Some([min, max]) => y >= min && y <= max,
            None => true,
        }
    }
}

/// Exits per edge (`None` = no exit)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawExits")]
pub struct Exits {
    pub left: Option<Exit>,
    pub right: Option<Exit>,
    pub top: Option<Exit>,
    pub bottom: Option<Exit>,
}

impl Exits {
    fn edges_mut(&mut self) -> [(&'static str, &mut Option<Exit>); 4] {
        [
            ("left", &mut self.left),
            ("right", &mut self.right),
            ("top", &mut self.top),
            ("bottom", &mut self.bottom),
        ]
    }
}

/// Exit data as authored; anything that isn't a well-formed exit becomes `None`
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawExits {
    left: Option<serde_json::Value>,
    right: Option<serde_json::Value>,
    top: Option<serde_json::Value>,
    bottom: Option<serde_json::Value>,
}

impl From<RawExits> for Exits {
    fn from(raw: RawExits) -> Self {
        fn lenient(edge: &str, value: Option<serde_json::Value>) -> Option<Exit> {
            let value = value?;
            if value.is_null() {
                return None;
            }
            match serde_json::from_value::<Exit>(value) {
                Ok(exit) => Some(exit),
                Err(e) => {
                    log::warn!("Ignoring malformed {} exit: {}", edge, e);
                    None
                }
            }
        }

        Self {
            left: lenient("left", raw.left),
            right: lenient("right", raw.right),
            top: lenient("top", raw.top),
            bottom: lenient("bottom", raw.bottom),
        }
    }
}

/// A bounded world segment with its own obstacles, pickups and exits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub id: usize,
    #[serde(default, with = "crate::xy")]
    pub player_start: Vec2,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub pickups: Vec<PickupTemplate>,
    #[serde(default)]
    pub exits: Exits,
}

impl Scene {
    pub fn new(id: usize, player_start: Vec2) -> Self {
        Self {
            id,
            player_start,
            obstacles: Vec::new(),
            pickups: Vec::new(),
            exits: Exits::default(),
        }
    }
}

const BUILTIN_SCENES: [&str; 2] = [
    include_str!("../../scenes/scene0.json"),
    include_str!("../../scenes/scene1.json"),
];

/// Ordered, immutable collection of scenes
#[derive(Debug, Clone)]
pub struct SceneRegistry {
    scenes: Vec<Scene>,
}

impl SceneRegistry {
    /// Build a registry, sanitizing exit data against the scene count
    pub fn from_scenes(mut scenes: Vec<Scene>) -> Result<Self, SceneError> {
        if scenes.is_empty() {
            return Err(SceneError::Empty);
        }

        let count = scenes.len();
        let mut seen_ids = HashSet::new();
        for (index, scene) in scenes.iter_mut().enumerate() {
            for (edge, slot) in scene.exits.edges_mut() {
                if let Some(exit) = slot.as_mut() {
                    if exit.scene >= count {
                        log::warn!(
                            "Scene {}: {} exit targets missing scene {}, treating as no exit",
                            index,
                            edge,
                            exit.scene
                        );
                        *slot = None;
                        continue;
                    }
                    if let Some([min, max]) = exit.y_range {
                        if min > max {
                            log::warn!("Scene {}: {} exit yRange inverted, swapping", index, edge);
                            exit.y_range = Some([max, min]);
                        }
                    }
                }
            }

            for pickup in &scene.pickups {
                if !seen_ids.insert(pickup.id.clone()) {
                    log::warn!("Scene {}: duplicate pickup id '{}'", index, pickup.id);
                }
            }
        }

        Ok(Self { scenes })
    }

    /// Parse an ordered JSON array of scenes
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let scenes: Vec<Scene> = serde_json::from_str(json)?;
        Self::from_scenes(scenes)
    }

    /// The scenes shipped with the game
    pub fn builtin() -> Result<Self, SceneError> {
        let scenes = BUILTIN_SCENES
            .iter()
            .map(|json| serde_json::from_str::<Scene>(json))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_scenes(scenes)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// Scene at `index`, falling back to the start scene
    pub fn get_or_first(&self, index: usize) -> &Scene {
        self.scenes.get(index).unwrap_or(&self.scenes[0])
    }

    pub fn contains_pickup(&self, id: &str) -> bool {
        self.scenes
            .iter()
            .any(|s| s.pickups.iter().any(|p| p.id == id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = SceneRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 2);

        let start = registry.get(0).unwrap();
        assert_eq!(start.player_start, Vec2::ZERO);
        assert_eq!(start.obstacles, vec![Obstacle::new(0.5, 0.0, 0.5)]);
        assert_eq!(start.pickups.len(), 3);
        assert_eq!(start.pickups[0].id, "coin_1");
        assert_eq!(start.pickups[1].kind, "key");

        let left = start.exits.left.unwrap();
        assert_eq!(left.scene, 1);
        assert_eq!(left.y_range, Some([-0.5, 0.5]));
        assert!(start.exits.right.is_none());

        let second = registry.get(1).unwrap();
        assert_eq!(second.exits.right.unwrap().scene, 0);
        assert!(registry.contains_pickup("special_gem"));
        assert!(!registry.contains_pickup("nope"));
    }

    #[test]
    fn test_exit_admits_y_range() {
        let exit = Exit::new(1).with_y_range(-0.5, 0.5);
        assert!(exit.admits(0.0));
        assert!(exit.admits(0.5));
        assert!(!exit.admits(0.51));
        assert!(Exit::new(1).admits(100.0));
    }

    #[test]
    fn test_malformed_exit_is_no_exit() {
        let json = r#"[{
            "id": 0,
            "playerStart": {"x": 0, "y": 0},
            "exits": {"left": {"target": 3}, "right": {"scene": 0}}
        }]"#;
        let registry = SceneRegistry::from_json(json).unwrap();
        let scene = registry.get(0).unwrap();
        assert!(scene.exits.left.is_none());
        assert_eq!(scene.exits.right, Some(Exit::new(0)));
    }

    #[test]
    fn test_out_of_range_exit_sanitized() {
        let mut scene = Scene::new(0, Vec2::ZERO);
        scene.exits.left = Some(Exit::new(7));
        scene.exits.right = Some(Exit::new(0).with_y_range(1.0, -1.0));

        let registry = SceneRegistry::from_scenes(vec![scene]).unwrap();
        let exits = registry.get(0).unwrap().exits;
        assert!(exits.left.is_none());
        assert_eq!(exits.right.unwrap().y_range, Some([-1.0, 1.0]));
    }

    #[test]
    fn test_missing_fields_default() {
        let registry = SceneRegistry::from_json(r#"[{}]"#).unwrap();
        let scene = registry.get(0).unwrap();
        assert_eq!(scene.player_start, Vec2::ZERO);
        assert!(scene.obstacles.is_empty());
        assert_eq!(scene.exits, Exits::default());
    }

    #[test]
    fn test_get_or_first_falls_back() {
        let registry = SceneRegistry::builtin().unwrap();
        assert_eq!(registry.get_or_first(99).id, 0);
        assert_eq!(registry.get_or_first(1).id, 1);
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert!(matches!(
            SceneRegistry::from_scenes(Vec::new()),
            Err(SceneError::Empty)
        ));
    }
}
