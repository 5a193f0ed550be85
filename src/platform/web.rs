//! Browser bindings
//!
//! The page owns rendering and the animation frame loop; it calls
//! `tick()` once per frame and pulls state back as JSON.

use std::sync::Arc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::persistence::{LocalStorageStore, MemoryStore, PersistError, SaveStore};
use crate::session::Session;
use crate::sim::{Facing, SceneRegistry};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A second init (e.g. hot reload) is harmless
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Wayfarer starting...");
}

/// LocalStorage when the browser allows it, memory otherwise
enum WebStore {
    Local(LocalStorageStore),
    Memory(MemoryStore),
}

impl SaveStore for WebStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError> {
        match self {
            WebStore::Local(s) => s.get_item(key),
            WebStore::Memory(s) => s.get_item(key),
        }
    }

    fn set_items(&mut self, items: &[(&str, String)]) -> Result<(), PersistError> {
        match self {
            WebStore::Local(s) => s.set_items(items),
            WebStore::Memory(s) => s.set_items(items),
        }
    }

    fn remove_items(&mut self, keys: &[&str]) -> Result<(), PersistError> {
        match self {
            WebStore::Local(s) => s.remove_items(keys),
            WebStore::Memory(s) => s.remove_items(keys),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerView {
    x: f32,
    y: f32,
    facing: Facing,
    moving: bool,
    stride_ticks: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameView<'a> {
    scene: usize,
    player: PlayerView,
    obstacles: &'a [crate::sim::Obstacle],
    pickups: Vec<&'a crate::sim::PickupTemplate>,
    counts: &'a std::collections::BTreeMap<String, f64>,
}

fn to_json<T: Serialize>(value: &T, fallback: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("JSON encode failed: {}", e);
        fallback.to_string()
    })
}

#[wasm_bindgen]
pub struct WebGame {
    session: Session<WebStore>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebGame, JsValue> {
        let registry =
            SceneRegistry::builtin().map_err(|e| JsValue::from_str(&e.to_string()))?;
        let store = match LocalStorageStore::open() {
            Ok(store) => WebStore::Local(store),
            Err(e) => {
                log::warn!("{}; progress will not be saved", e);
                WebStore::Memory(MemoryStore::new())
            }
        };

        let mut session = Session::new(Arc::new(registry), Tuning::load(), store);
        session.initialize();
        Ok(WebGame { session })
    }

    /// Pointer/touch in canvas pixels
    pub fn tap(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.session.tap(x, y, width, height);
    }

    /// Directional step; false for an unknown direction name
    pub fn move_dir(&mut self, dir: &str) -> bool {
        match dir.parse::<Facing>() {
            Ok(facing) => {
                self.session.request_move(facing);
                true
            }
            Err(e) => {
                log::debug!("{}", e);
                false
            }
        }
    }

    /// Advance one frame; true if anything visible changed
    pub fn tick(&mut self) -> bool {
        self.session.tick().changed()
    }

    pub fn has_save(&self) -> bool {
        self.session.has_save()
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn snapshot_json(&self) -> String {
        to_json(&self.session.snapshot(), "{}")
    }

    /// Everything the renderer needs for the current frame
    pub fn frame_json(&self) -> String {
        let player = &self.session.state().player;
        let view = FrameView {
            scene: self.session.state().scene_index,
            player: PlayerView {
                x: player.position.x,
                y: player.position.y,
                facing: player.facing,
                moving: player.is_moving(),
                stride_ticks: player.stride_ticks,
            },
            obstacles: &self.session.scene().obstacles,
            pickups: self.session.visible_pickups().collect(),
            counts: self.session.state().counts().as_map(),
        };
        to_json(&view, "{}")
    }

    pub fn drain_events_json(&mut self) -> String {
        to_json(&self.session.drain_events(), "[]")
    }
}
