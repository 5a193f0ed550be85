//! End-to-end play through the public API with an on-disk save

use std::path::Path;
use std::sync::Arc;

use glam::Vec2;
use wayfarer::persistence::{BackgroundStore, FileStore};
use wayfarer::sim::{Edge, GameEvent, SceneRegistry};
use wayfarer::{Phase, Session, Tuning};

type DiskSession = Session<BackgroundStore<FileStore>>;

fn open(dir: &Path) -> DiskSession {
    let registry = Arc::new(SceneRegistry::builtin().unwrap());
    let mut session = Session::new(registry, Tuning::default(), BackgroundStore::new(FileStore::new(dir)));
    assert_eq!(session.phase(), Phase::Loading);
    session.initialize();
    session
}

fn walk(session: &mut DiskSession, target: Vec2) {
    session.set_target(target);
    for _ in 0..500 {
        if session.state().player.target.is_none() {
            return;
        }
        session.tick();
    }
    panic!("walk to {:?} never finished", target);
}

fn walk_until_scene(session: &mut DiskSession, target: Vec2, scene: usize) {
    session.set_target(target);
    for _ in 0..200 {
        session.tick();
        if session.state().scene_index == scene {
            return;
        }
    }
    panic!("never reached scene {}", scene);
}

#[test]
fn test_explore_save_resume_reset() {
    let tmp = tempfile::tempdir().unwrap();

    {
        let mut session = open(tmp.path());
        assert!(!session.has_save());
        assert_eq!(session.state().player.position, Vec2::ZERO);

        walk(&mut session, Vec2::new(-1.0, 1.0));
        assert!(session.state().player.position.distance(Vec2::new(-1.0, 1.0)) < 0.01);
        let events = session.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            GameEvent::PickupCollected { id, value, .. } if id == "coin_1" && *value == 1.0
        ));

        walk(&mut session, Vec2::new(-1.0, 0.0));
        // Aim inside the exit band so the last step can't end against the wall
        walk_until_scene(&mut session, Vec2::new(-1.82, 0.0), 1);
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::SceneChanged {
                from_scene: 0,
                to_scene: 1,
                entry_edge: Some(Edge::Left),
            }]
        );
        assert!((session.state().player.position.x - 1.7).abs() < 1e-5);
        assert!(session.has_save());
    }

    // Dropping the session drained the writer; a new one resumes
    let mut session = open(tmp.path());
    assert_eq!(session.state().scene_index, 1);
    assert!(session.state().is_collected("coin_1"));
    assert_eq!(session.state().counts().get("coin"), 1.0);
    assert!((session.state().player.position.x - 1.7).abs() < 1e-5);

    walk_until_scene(&mut session, Vec2::new(1.82, 0.0), 0);
    assert!(session.visible_pickups().all(|p| p.id != "coin_1"));
    assert_eq!(session.visible_pickups().count(), 2);

    session.reset();
    assert!(!session.has_save());
    drop(session);

    let fresh = open(tmp.path());
    assert_eq!(fresh.state().scene_index, 0);
    assert!(fresh.state().collected().is_empty());
    assert!(fresh.state().counts().is_empty());
}

#[test]
fn test_partial_save_starts_fresh() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("wayfarer_current_scene.json"), "1").unwrap();

    let session = open(tmp.path());
    // The scene key alone counts as a save, but it can't be restored
    assert!(session.has_save());
    assert_eq!(session.state().scene_index, 0);
    assert_eq!(session.state().player.position, Vec2::ZERO);
}
