//! Game session: the Loading/Ready state machine
//!
//! A session owns the game state, the scene registry and a save store.
//! It starts in [`Phase::Loading`]; [`Session::initialize`] reads the save
//! (or starts fresh) and moves to [`Phase::Ready`]. Until then every
//! gameplay operation is a no-op.
//!
//! Saving is best-effort. Store failures are logged and never reach the
//! caller, and a faulting tick stalls the player instead of propagating.

use std::sync::Arc;

use glam::Vec2;

use crate::persistence::{self, SaveStore};
use crate::screen_to_world;
use crate::sim::{
    self, Edge, Facing, GameEvent, GameState, NavStage, PickupTemplate, Scene, SceneRegistry,
    Snapshot, TickOutcome,
};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
}

pub struct Session<S: SaveStore> {
    registry: Arc<SceneRegistry>,
    tuning: Tuning,
    store: S,
    state: GameState,
    phase: Phase,
}

impl<S: SaveStore> Session<S> {
    pub fn new(registry: Arc<SceneRegistry>, tuning: Tuning, store: S) -> Self {
        let state = GameState::new(&registry);
        Self {
            registry,
            tuning,
            store,
            state,
            phase: Phase::Loading,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// Restore from the store if a complete save exists, else start fresh
    pub fn initialize(&mut self) {
        self.state = match persistence::load_snapshot(&self.store) {
            Ok(Some(snapshot)) => {
                log::info!(
                    "Restored save: scene {}, {} pickups collected",
                    snapshot.current_scene,
                    snapshot.collected_pickup_ids.len()
                );
                GameState::from_snapshot(snapshot, &self.registry)
            }
            Ok(None) => {
                log::info!("No save found, starting fresh");
                GameState::new(&self.registry)
            }
            Err(e) => {
                log::warn!("Could not read save, starting fresh: {}", e);
                GameState::new(&self.registry)
            }
        };
        self.phase = Phase::Ready;
    }

    pub fn set_target(&mut self, target: Vec2) {
        if !self.is_ready() {
            log::debug!("Ignoring target while loading");
            return;
        }
        self.state.set_target(target);
    }

    /// Target the world point under a screen-space tap
    pub fn tap(&mut self, screen_x: f32, screen_y: f32, width: f32, height: f32) {
        self.set_target(screen_to_world(screen_x, screen_y, width, height));
    }

    pub fn request_move(&mut self, facing: Facing) {
        if !self.is_ready() {
            return;
        }
        self.state.request_move(facing, &self.tuning);
    }

    /// Advance one tick and save if anything changed
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_ready() {
            return TickOutcome::default();
        }

        match sim::tick(&mut self.state, &self.registry, &self.tuning) {
            Ok(outcome) => {
                if outcome.changed() {
                    self.persist();
                }
                outcome
            }
            Err(e) => {
                log::error!("Tick failed, stalling: {}", e);
                self.state.player.target = None;
                self.state.player.stride_ticks = 0;
                TickOutcome {
                    stage: Some(NavStage::Stalled),
                    ..Default::default()
                }
            }
        }
    }

    pub fn transition_to(&mut self, scene_index: usize, entry_edge: Option<Edge>, y: f32) {
        if !self.is_ready() {
            return;
        }
        self.state
            .transition_to(scene_index, entry_edge, y, &self.registry, &self.tuning);
        self.persist();
    }

    /// Write the current snapshot; failures are logged only
    pub fn persist(&mut self) {
        if !self.is_ready() {
            return;
        }
        let snapshot = self.state.to_snapshot();
        if let Err(e) = persistence::save_snapshot(&mut self.store, &snapshot) {
            log::warn!("Save failed: {}", e);
        }
    }

    /// Erase the save and return to a fresh game
    pub fn reset(&mut self) {
        if let Err(e) = persistence::clear_snapshot(&mut self.store) {
            log::warn!("Could not clear save: {}", e);
        }
        self.state = GameState::new(&self.registry);
        log::info!("Game reset");
    }

    pub fn has_save(&self) -> bool {
        persistence::has_save(&self.store).unwrap_or_else(|e| {
            log::warn!("Could not check for save: {}", e);
            false
        })
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.to_snapshot()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn scene(&self) -> &Scene {
        self.registry.get_or_first(self.state.scene_index)
    }

    pub fn visible_pickups(&self) -> impl Iterator<Item = &PickupTemplate> {
        self.state.visible_pickups(self.scene())
    }

    pub fn registry(&self) -> &Arc<SceneRegistry> {
        &self.registry
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, PersistError};
    use std::collections::BTreeMap;

    struct BrokenStore;

    impl SaveStore for BrokenStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>, PersistError> {
            Err(PersistError::Backend("disk on fire".into()))
        }

        fn set_items(&mut self, _items: &[(&str, String)]) -> Result<(), PersistError> {
            Err(PersistError::Backend("disk on fire".into()))
        }

        fn remove_items(&mut self, _keys: &[&str]) -> Result<(), PersistError> {
            Err(PersistError::Backend("disk on fire".into()))
        }
    }

    fn registry() -> Arc<SceneRegistry> {
        Arc::new(SceneRegistry::builtin().unwrap())
    }

    fn ready_session() -> Session<MemoryStore> {
        let mut session = Session::new(registry(), Tuning::default(), MemoryStore::new());
        session.initialize();
        session
    }

    fn run_until_idle<S: SaveStore>(session: &mut Session<S>, max_ticks: usize) {
        for _ in 0..max_ticks {
            if session.state().player.target.is_none() {
                return;
            }
            session.tick();
        }
        panic!("player never stopped");
    }

    #[test]
    fn test_loading_ignores_gameplay() {
        let mut session = Session::new(registry(), Tuning::default(), MemoryStore::new());
        assert_eq!(session.phase(), Phase::Loading);

        session.set_target(Vec2::new(1.0, 1.0));
        assert_eq!(session.tick(), TickOutcome::default());
        assert!(session.state().player.target.is_none());
        assert!(session.store().is_empty());

        session.initialize();
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[test]
    fn test_fresh_start() {
        let session = ready_session();
        let snapshot = session.snapshot();

        assert_eq!(snapshot.current_scene, 0);
        assert!(snapshot.pickup_counts.is_empty());
        assert!(snapshot.collected_pickup_ids.is_empty());
        assert_eq!(snapshot.player_position, session.registry().get_or_first(0).player_start);
        assert!(!session.has_save());
    }

    #[test]
    fn test_moving_tick_saves() {
        let mut session = ready_session();
        session.set_target(Vec2::new(-1.0, 0.0));
        session.tick();

        assert!(session.has_save());
        let saved = persistence::load_snapshot(session.store()).unwrap();
        assert_eq!(saved, Some(session.snapshot()));
    }

    #[test]
    fn test_idle_tick_does_not_save() {
        let mut session = ready_session();
        session.tick();
        assert!(!session.has_save());
    }

    #[test]
    fn test_restores_existing_save() {
        let mut store = MemoryStore::new();
        let snapshot = Snapshot {
            pickup_counts: BTreeMap::from([("coin".to_string(), 1.0)]),
            collected_pickup_ids: vec!["coin_1".into()],
            current_scene: 1,
            player_position: Vec2::new(0.2, -0.1),
        };
        persistence::save_snapshot(&mut store, &snapshot).unwrap();

        let mut session = Session::new(registry(), Tuning::default(), store);
        session.initialize();

        assert_eq!(session.snapshot(), snapshot);
        assert_eq!(session.scene().id, 1);
    }

    #[test]
    fn test_collects_and_persists_across_sessions() {
        let mut session = ready_session();
        let coin = session
            .visible_pickups()
            .find(|p| p.kind == "coin")
            .cloned()
            .unwrap();

        session.set_target(coin.position());
        run_until_idle(&mut session, 200);

        let events = session.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::PickupCollected { id, .. } if *id == coin.id
        )));
        assert!(session.visible_pickups().all(|p| p.id != coin.id));

        let store = session.store().clone();
        let mut resumed = Session::new(registry(), Tuning::default(), store);
        resumed.initialize();
        assert!(resumed.state().is_collected(&coin.id));
        assert_eq!(resumed.state().counts().get("coin"), coin.value);
    }

    #[test]
    fn test_transition_persists_and_emits() {
        let mut session = ready_session();
        session.transition_to(1, Some(Edge::Right), 0.5);

        assert_eq!(session.snapshot().current_scene, 1);
        assert_eq!(
            persistence::load_snapshot(session.store())
                .unwrap()
                .map(|s| s.current_scene),
            Some(1)
        );
        assert!(matches!(
            session.drain_events().as_slice(),
            [GameEvent::SceneChanged { from_scene: 0, to_scene: 1, .. }]
        ));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = ready_session();
        session.transition_to(1, None, 0.0);
        assert!(session.has_save());

        session.reset();
        assert!(!session.has_save());
        assert!(session.store().is_empty());
        assert_eq!(session.snapshot().current_scene, 0);
        assert!(session.is_ready());
    }

    #[test]
    fn test_broken_store_is_best_effort() {
        let mut session = Session::new(registry(), Tuning::default(), BrokenStore);
        session.initialize();
        assert!(session.is_ready());
        assert_eq!(session.snapshot().current_scene, 0);

        session.set_target(Vec2::new(-1.0, 0.0));
        let outcome = session.tick();
        assert!(outcome.moved);
        assert!(!session.has_save());

        session.reset();
        assert_eq!(session.snapshot().current_scene, 0);
    }

    #[test]
    fn test_fault_becomes_stall() {
        let mut session = ready_session();
        session.state.player.position = Vec2::new(f32::NAN, 0.0);
        session.state.player.target = Some(Vec2::new(1.0, 1.0));

        let outcome = session.tick();
        assert_eq!(outcome.stage, Some(NavStage::Stalled));
        assert!(session.state().player.target.is_none());
    }

    #[test]
    fn test_move_request_targets_offset() {
        let mut session = ready_session();
        let start = session.state().player.position;
        session.request_move(Facing::Up);

        assert_eq!(session.state().player.facing, Facing::Up);
        let target = session.state().player.target.unwrap();
        assert!((target - (start + Vec2::new(0.0, 0.2))).length() < 1e-6);
    }
}
