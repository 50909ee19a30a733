use anyhow::{Context, Result};
use kite_inspector::config::InspectorConfig;
use kite_inspector::input::Input;
use kite_inspector::scene::{EntityDefinition, HostScene, Markers};
use kite_inspector::Inspector;
use serde_json::json;
use std::collections::BTreeMap;
use winit::keyboard::{Key, NamedKey, SmolStr};

fn components(entries: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    entries.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
}

/// Scripted host session exercising the overlay end to end: attach over a
/// lit scene with a default camera, select the camera entity, create a new
/// entity, toggle, and detach.
fn main() -> Result<()> {
    env_logger::init();

    let mut scene = HostScene::new();
    let camera_entity = scene.create_entity(&EntityDefinition {
        element: "camera-rig".to_string(),
        components: components(&[("camera", json!({ "active": true }))]),
    });
    let camera_object = scene
        .entity(camera_entity)
        .and_then(|entity| entity.object)
        .and_then(|wrapper| scene.children(wrapper).first().copied())
        .context("camera entity spawns a camera object")?;
    if let Some(object) = scene.object_mut(camera_object) {
        object.markers.insert(Markers::DEFAULT_CAMERA);
    }
    scene.finish_entity_load(camera_entity);
    scene.set_active_camera(camera_object);

    let light_entity = scene.create_entity(&EntityDefinition {
        element: "key-light".to_string(),
        components: components(&[("light", json!({ "type": "point" }))]),
    });
    scene.finish_entity_load(light_entity);
    scene.finish_load();

    let mut inspector = Inspector::new(InspectorConfig::load_or_default("config/inspector.json"));
    inspector.attach(&mut scene);
    inspector.pump(&mut scene);
    log::info!(
        "attached: opened={} helpers={} paused={}",
        inspector.opened(),
        inspector.helpers().helper_count(),
        scene.is_paused()
    );

    inspector.select_entity(&scene, Some(camera_entity));
    inspector.pump(&mut scene);
    log::info!("camera entity selected, frustum helper visible={}", inspector.selection().camera_helper_visible());

    let box_entity = inspector.create_new_entity(
        &mut scene,
        &EntityDefinition {
            element: "box".to_string(),
            components: components(&[("geometry", json!({ "primitive": "box" }))]),
        },
    );
    scene.finish_entity_load(box_entity);
    inspector.pump(&mut scene);
    log::info!("created entity selected={:?}", inspector.selection().selected_entity());

    inspector.toggle(&mut scene);
    inspector.pump(&mut scene);
    log::info!("toggled: opened={} paused={}", inspector.opened(), scene.is_paused());

    // Reopen through the keyboard chord, as the host event loop would.
    let mut input = Input::new();
    input.apply_key(&Key::Named(NamedKey::Control), true);
    input.apply_key(&Key::Named(NamedKey::Alt), true);
    input.apply_key(&Key::Character(SmolStr::new("i")), true);
    if input.take_toggle_inspector() {
        inspector.toggle(&mut scene);
        inspector.pump(&mut scene);
    }
    log::info!("chord toggled: opened={}", inspector.opened());

    inspector.detach(&mut scene);
    inspector.pump(&mut scene);
    log::info!("detached: active camera restored={}", scene.active_camera() == Some(camera_object));
    Ok(())
}
