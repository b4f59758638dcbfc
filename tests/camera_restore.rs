//! Camera switching and preference persistence.

mod common;

use common::{FakePick, TestWorld};
use glam::Vec2;
use mapview::prefs::{PrefStore, Prefs};
use mapview::{FrameResult, MapView};

fn frame(mv: &mut MapView, world: &TestWorld) -> mapview::Frame {
    let mut px = FakePick::background();
    let mut out = Vec::new();
    match mv.draw(world, &mut px, &mut out) {
        FrameResult::Ready(f) => f,
        FrameResult::Loading(cause) => panic!("frame unexpectedly loading: {cause}"),
    }
}

fn view_with(prefs: Prefs) -> MapView {
    MapView::new(Vec2::new(800.0, 600.0), Vec2::ZERO, PrefStore::in_memory(prefs))
}

#[test]
fn persisted_ortho_exact_restores_identical_matrices() {
    let world = TestWorld::grid(3);
    let prefs = Prefs {
        defcam: Some("ortho".into()),
        camargs: vec!["-e".into()],
        ..Prefs::default()
    };
    let mut a = view_with(prefs.clone());
    let mut b = view_with(prefs);
    for _ in 0..5 {
        a.tick(0.016, &world);
        b.tick(0.016, &world);
    }
    let fa = frame(&mut a, &world);
    let fb = frame(&mut b, &world);
    assert_eq!(fa.view, fb.view);
    assert_eq!(fa.proj, fb.proj);
}

#[test]
fn unknown_persisted_camera_falls_back_to_default() {
    let world = TestWorld::grid(3);
    let prefs = Prefs {
        defcam: Some("topdown".into()),
        ..Prefs::default()
    };
    let mut broken = view_with(prefs);
    let mut stock = view_with(Prefs::default());
    for _ in 0..5 {
        broken.tick(0.016, &world);
        stock.tick(0.016, &world);
    }
    let fa = frame(&mut broken, &world);
    let fb = frame(&mut stock, &world);
    assert_eq!(fa.view, fb.view);
    assert_eq!(fa.proj, fb.proj);
}

#[test]
fn cam_command_switches_and_persists() {
    let dir = std::env::temp_dir().join(format!("mapview-prefs-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("prefs.json");
    let _ = std::fs::remove_file(&path);

    let world = TestWorld::grid(3);
    let store = PrefStore::load(&path).unwrap();
    let mut mv = MapView::new(Vec2::new(800.0, 600.0), Vec2::ZERO, store);
    mv.command("cam", &["follow".to_owned()]).unwrap();
    mv.tick(0.016, &world);
    let follow_frame = frame(&mut mv, &world);

    // A fresh view restores the persisted camera and projects identically.
    let store = PrefStore::load(&path).unwrap();
    assert_eq!(store.vals.defcam.as_deref(), Some("follow"));
    let mut restored = MapView::new(Vec2::new(800.0, 600.0), Vec2::ZERO, store);
    restored.tick(0.016, &world);
    let restored_frame = frame(&mut restored, &world);
    assert_eq!(follow_frame.view, restored_frame.view);
    assert_eq!(follow_frame.proj, restored_frame.proj);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn bad_camera_name_is_rejected_without_switching() {
    let world = TestWorld::grid(3);
    let mut mv = view_with(Prefs::default());
    mv.tick(0.016, &world);
    let before = frame(&mut mv, &world);
    assert!(mv.command("cam", &["topdown".to_owned()]).is_err());
    let after = frame(&mut mv, &world);
    assert_eq!(before.view, after.view);
    assert_eq!(before.proj, after.proj);
}
