//! Save/load of the game snapshot over key/value stores
//!
//! Features:
//! - One JSON value per logical field, each under its own key
//! - A save is present only when all four keys are readable
//! - Whole-snapshot writes in a single store call
//! - Backends: in-memory, files (native), background writer (native),
//!   LocalStorage (web)

#[cfg(not(target_arch = "wasm32"))]
pub mod background;
#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local_storage;
pub mod memory;

#[cfg(not(target_arch = "wasm32"))]
pub use background::BackgroundStore;
#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::sim::Snapshot;

pub const KEY_PICKUP_COUNTS: &str = "wayfarer_pickup_counts";
pub const KEY_COLLECTED_PICKUPS: &str = "wayfarer_collected_pickups";
pub const KEY_CURRENT_SCENE: &str = "wayfarer_current_scene";
pub const KEY_PLAYER_POSITION: &str = "wayfarer_player_position";

/// Every key a snapshot occupies
pub const SNAPSHOT_KEYS: [&str; 4] = [
    KEY_PICKUP_COUNTS,
    KEY_COLLECTED_PICKUPS,
    KEY_CURRENT_SCENE,
    KEY_PLAYER_POSITION,
];

/// Persistence failures
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode {key}: {source}")]
    Decode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("background writer has stopped")]
    WriterStopped,
}

/// String key/value storage
pub trait SaveStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Write several keys as one logical unit
    fn set_items(&mut self, items: &[(&str, String)]) -> Result<(), PersistError>;

    /// Remove keys; absent keys are not an error
    fn remove_items(&mut self, keys: &[&str]) -> Result<(), PersistError>;
}

/// Player position stored with the same `{x,y}` shape as `Snapshot`
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct StoredPoint(#[serde(with = "crate::xy")] glam::Vec2);

fn encode<T: Serialize>(key: &'static str, value: &T) -> Result<(&'static str, String), PersistError> {
    serde_json::to_string(value)
        .map(|json| (key, json))
        .map_err(|source| PersistError::Encode { key, source })
}

fn decode<T: DeserializeOwned>(key: &'static str, json: &str) -> Result<T, PersistError> {
    serde_json::from_str(json).map_err(|source| PersistError::Decode { key, source })
}

/// Write the whole snapshot in one store call
pub fn save_snapshot<S: SaveStore + ?Sized>(store: &mut S, snapshot: &Snapshot) -> Result<(), PersistError> {
    let position = StoredPoint(snapshot.player_position);
    let items = [
        encode(KEY_PICKUP_COUNTS, &snapshot.pickup_counts)?,
        encode(KEY_COLLECTED_PICKUPS, &snapshot.collected_pickup_ids)?,
        encode(KEY_CURRENT_SCENE, &snapshot.current_scene)?,
        encode(KEY_PLAYER_POSITION, &position)?,
    ];
    store.set_items(&items)
}

/// Read a snapshot; `Ok(None)` unless all four keys are present
pub fn load_snapshot<S: SaveStore + ?Sized>(store: &S) -> Result<Option<Snapshot>, PersistError> {
    let counts = store.get_item(KEY_PICKUP_COUNTS)?;
    let collected = store.get_item(KEY_COLLECTED_PICKUPS)?;
    let scene = store.get_item(KEY_CURRENT_SCENE)?;
    let position = store.get_item(KEY_PLAYER_POSITION)?;

    let (Some(counts), Some(collected), Some(scene), Some(position)) =
        (counts, collected, scene, position)
    else {
        return Ok(None);
    };

    let pickup_counts: BTreeMap<String, f64> = decode(KEY_PICKUP_COUNTS, &counts)?;
    let collected_pickup_ids: Vec<String> = decode(KEY_COLLECTED_PICKUPS, &collected)?;
    let current_scene: usize = decode(KEY_CURRENT_SCENE, &scene)?;
    let StoredPoint(player_position) = decode(KEY_PLAYER_POSITION, &position)?;

    Ok(Some(Snapshot {
        pickup_counts,
        collected_pickup_ids,
        current_scene,
        player_position,
    }))
}

/// Remove every snapshot key
pub fn clear_snapshot<S: SaveStore + ?Sized>(store: &mut S) -> Result<(), PersistError> {
    store.remove_items(&SNAPSHOT_KEYS)
}

/// Whether a save exists (checks the scene key only)
pub fn has_save<S: SaveStore + ?Sized>(store: &S) -> Result<bool, PersistError> {
    Ok(store.get_item(KEY_CURRENT_SCENE)?.is_some())
}
