use glam::Vec3;
use kite_inspector::config::InspectorConfig;
use kite_inspector::events::{InspectorEvent, Topic};
use kite_inspector::scene::{EntityDefinition, EntityId, HostScene, Markers, ObjectId};
use kite_inspector::{Inspector, InspectorModule, StartupPhase};
use serde_json::json;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

fn components(entries: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    entries.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
}

fn camera_entity(scene: &mut HostScene) -> (EntityId, ObjectId) {
    let entity = scene.create_entity(&EntityDefinition {
        element: "camera-rig".to_string(),
        components: components(&[("camera", json!({ "active": true }))]),
    });
    let camera = scene
        .entity(entity)
        .and_then(|record| record.object)
        .and_then(|wrapper| scene.children(wrapper).first().copied())
        .expect("camera object spawned");
    scene.finish_entity_load(entity);
    (entity, camera)
}

fn light_entity(scene: &mut HostScene) -> EntityId {
    let entity = scene.create_entity(&EntityDefinition {
        element: "key-light".to_string(),
        components: components(&[("light", json!({ "type": "point" }))]),
    });
    scene.finish_entity_load(entity);
    entity
}

/// Host scene with an active camera entity and one light, fully loaded.
fn ready_scene() -> (HostScene, EntityId, ObjectId, EntityId) {
    let mut scene = HostScene::new();
    let (cam_entity, camera) = camera_entity(&mut scene);
    let light = light_entity(&mut scene);
    scene.set_active_camera(camera);
    scene.finish_load();
    (scene, cam_entity, camera, light)
}

struct CameraProbe {
    seen: Rc<RefCell<Option<ObjectId>>>,
}

impl InspectorModule for CameraProbe {
    fn name(&self) -> &str {
        "camera-probe"
    }

    fn init(&mut self, scene: &mut HostScene) {
        *self.seen.borrow_mut() = scene.active_camera();
    }
}

#[test]
fn startup_reaches_ready_and_opens() {
    let (mut scene, _, camera, _) = ready_scene();
    let mut inspector = Inspector::new(InspectorConfig::default());
    inspector.attach(&mut scene);
    inspector.pump(&mut scene);

    assert_eq!(inspector.startup_phase(), StartupPhase::Ready);
    assert!(inspector.opened());
    assert!(scene.is_paused());
    assert!(inspector.shortcuts().is_enabled());

    // One helper per typed object: camera frustum plus point light.
    assert_eq!(inspector.helpers().helper_count(), 2);
    let frustum = inspector.helpers().helper_for(camera).expect("frustum helper");
    assert!(!frustum.visible);

    let editor_camera = inspector.camera_rig().editor_camera().expect("editor camera injected");
    assert_eq!(scene.active_camera(), Some(editor_camera));
    assert_ne!(Some(camera), scene.active_camera());
}

#[test]
fn editor_camera_gets_the_default_pose() {
    let (mut scene, _, _, _) = ready_scene();
    let mut inspector = Inspector::new(InspectorConfig::default());
    inspector.attach(&mut scene);
    inspector.pump(&mut scene);

    let editor_camera = inspector.camera_rig().editor_camera().expect("editor camera");
    let object = scene.object(editor_camera).expect("editor camera object");
    let position = Vec3::from(object.world_transform.translation);
    assert!((position - Vec3::new(0.0, 1.6, 2.0)).length() < 1e-4);

    let camera = object.camera.expect("camera state");
    assert_eq!(camera.near, 0.01);
    assert_eq!(camera.far, 10_000.0);
    assert!(camera.active);
    assert!(object.is_inspector_internal());
}

#[test]
fn startup_defers_until_a_camera_becomes_active() {
    let mut scene = HostScene::new();
    light_entity(&mut scene);
    scene.finish_load();

    let mut inspector = Inspector::new(InspectorConfig::default());
    inspector.attach(&mut scene);
    inspector.pump(&mut scene);
    assert_eq!(inspector.startup_phase(), StartupPhase::WaitingForCamera);
    assert!(!inspector.opened());
    assert!(inspector.helpers().is_empty());

    let (_, camera) = camera_entity(&mut scene);
    scene.set_active_camera(camera);
    inspector.pump(&mut scene);
    assert_eq!(inspector.startup_phase(), StartupPhase::Ready);
    assert!(inspector.opened());
    assert!(inspector.helpers().helper_count() >= 2);
}

#[test]
fn startup_defers_until_the_scene_loads() {
    let mut scene = HostScene::new();
    let (_, camera) = camera_entity(&mut scene);
    scene.set_active_camera(camera);

    let mut inspector = Inspector::new(InspectorConfig::default());
    inspector.attach(&mut scene);
    inspector.pump(&mut scene);
    assert_eq!(inspector.startup_phase(), StartupPhase::WaitingForScene);

    scene.finish_load();
    inspector.pump(&mut scene);
    assert_eq!(inspector.startup_phase(), StartupPhase::Ready);
}

#[test]
fn modules_initialize_only_after_the_editor_camera_exists() {
    let (mut scene, _, _, _) = ready_scene();
    let seen = Rc::new(RefCell::new(None));
    let mut inspector = Inspector::new(InspectorConfig::default());
    inspector.register_module(Box::new(CameraProbe { seen: Rc::clone(&seen) }));

    inspector.attach(&mut scene);
    inspector.pump(&mut scene);

    let editor_camera = inspector.camera_rig().editor_camera();
    assert!(editor_camera.is_some());
    assert_eq!(*seen.borrow(), editor_camera);
}

#[test]
fn open_then_close_emits_mode_changes_in_order() {
    let mut scene = HostScene::new();
    let mut inspector = Inspector::new(InspectorConfig::default());
    assert!(!inspector.opened());

    let modes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&modes);
    inspector.bus_mut().on(Topic::ModeChanged, move |event| {
        if let InspectorEvent::ModeChanged { active } = event {
            sink.borrow_mut().push(*active);
        }
    });

    inspector.open(&mut scene, None);
    inspector.close(&mut scene);
    inspector.pump(&mut scene);

    assert!(!inspector.opened());
    assert_eq!(*modes.borrow(), vec![true, false]);
}

#[test]
fn mode_changes_drive_helper_layer_visibility() {
    let (mut scene, _, _, _) = ready_scene();
    let mut inspector = Inspector::new(InspectorConfig::default());
    inspector.attach(&mut scene);
    inspector.pump(&mut scene);
    assert!(inspector.helpers().layer_visible());

    inspector.close(&mut scene);
    inspector.pump(&mut scene);
    assert!(!inspector.helpers().layer_visible());

    inspector.toggle(&mut scene);
    inspector.pump(&mut scene);
    assert!(inspector.helpers().layer_visible());
}

#[test]
fn default_camera_marker_is_swapped_and_restored() {
    let (mut scene, _, camera, _) = ready_scene();
    scene.object_mut(camera).expect("camera object").markers.insert(Markers::DEFAULT_CAMERA);

    let mut inspector = Inspector::new(InspectorConfig::default());
    inspector.attach(&mut scene);
    inspector.pump(&mut scene);

    let markers = scene.object(camera).expect("camera object").markers;
    assert!(markers.contains(Markers::ORIGINAL_CAMERA));
    assert!(markers.contains(Markers::INSPECTOR_DEFAULT_CAMERA));
    assert!(!markers.contains(Markers::DEFAULT_CAMERA));
    assert!(inspector.camera_rig().was_default_camera());

    inspector.detach(&mut scene);
    inspector.pump(&mut scene);

    let markers = scene.object(camera).expect("camera object").markers;
    assert!(markers.contains(Markers::DEFAULT_CAMERA));
    assert!(!markers.contains(Markers::INSPECTOR_DEFAULT_CAMERA));
    assert!(!markers.contains(Markers::ORIGINAL_CAMERA));
    assert_eq!(scene.active_camera(), Some(camera));
}

#[test]
fn embedded_mode_is_removed_while_open_and_restored_on_close() {
    let (mut scene, _, _, _) = ready_scene();
    scene.set_embedded(true);

    let mut inspector = Inspector::new(InspectorConfig::default());
    inspector.attach(&mut scene);
    inspector.pump(&mut scene);
    assert!(!scene.is_embedded());

    inspector.close(&mut scene);
    inspector.pump(&mut scene);
    assert!(scene.is_embedded());
}

#[test]
fn mocap_replay_skips_pausing_the_scene() {
    let (mut scene, _, _, _) = ready_scene();
    scene.set_mocap_replay(true);
    scene.enter_immersive();

    let mut inspector = Inspector::new(InspectorConfig::default());
    inspector.attach(&mut scene);
    inspector.pump(&mut scene);

    assert!(inspector.opened());
    assert!(!scene.is_paused());
    assert!(scene.in_immersive());
}

#[test]
fn clear_restores_the_editor_camera_pose_and_deselects() {
    let (mut scene, cam_entity, _, _) = ready_scene();
    let mut inspector = Inspector::new(InspectorConfig::default());
    inspector.attach(&mut scene);
    inspector.pump(&mut scene);

    inspector.select_entity(&scene, Some(cam_entity));
    inspector.pump(&mut scene);

    let editor_camera = inspector.camera_rig().editor_camera().expect("editor camera");
    let original_pose = inspector.camera_rig().original_pose().expect("pose recorded");
    scene.object_mut(editor_camera).expect("editor camera object").world_transform =
        glam::Affine3A::from_translation(Vec3::new(9.0, 9.0, 9.0));

    let cleared = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&cleared);
    inspector.bus_mut().on(Topic::InspectorCleared, move |_| {
        *sink.borrow_mut() += 1;
    });
    inspector.clear(&mut scene);
    inspector.pump(&mut scene);

    assert_eq!(scene.object(editor_camera).expect("editor camera object").world_transform, original_pose);
    assert_eq!(inspector.selection().selected_object(), None);
    assert_eq!(*cleared.borrow(), 1);
}

#[test]
fn startup_stall_is_reported_against_the_configured_bound() {
    let mut scene = HostScene::new();
    let config = InspectorConfig { startup_wait_ms: Some(0), ..InspectorConfig::default() };
    let mut inspector = Inspector::new(config);
    inspector.attach(&mut scene);
    inspector.pump(&mut scene);

    assert_eq!(inspector.startup_phase(), StartupPhase::WaitingForScene);
    assert!(inspector.startup_stalled());
}
