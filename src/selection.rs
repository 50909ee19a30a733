use crate::events::{EventBus, InspectorEvent};
use crate::scene::{Aabb, EntityId, HostScene, ObjectId};

/// Tracks what is currently selected: an object, optionally the entity that
/// owns it, plus the derived bounding-box proxy and camera-helper
/// visibility. Created once per overlay and only ever reset, never dropped.
#[derive(Debug, Default)]
pub struct SelectionManager {
    selected_object: Option<ObjectId>,
    selected_entity: Option<EntityId>,
    bbox: Option<Aabb>,
    camera_helper_visible: bool,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_object(&self) -> Option<ObjectId> {
        self.selected_object
    }

    pub fn selected_entity(&self) -> Option<EntityId> {
        self.selected_entity
    }

    pub fn bbox(&self) -> Option<Aabb> {
        self.bbox
    }

    pub fn camera_helper_visible(&self) -> bool {
        self.camera_helper_visible
    }

    /// Sole mutator of the selected object. Re-selecting the current value
    /// is a no-op; otherwise the bounding-box proxy is recomputed and the
    /// change is published, including `None` for deselection. Returns
    /// whether the selection actually changed.
    pub fn select(&mut self, scene: &HostScene, object: Option<ObjectId>, bus: &mut EventBus) -> bool {
        if self.selected_object == object {
            return false;
        }
        self.selected_object = object;
        self.bbox = object.and_then(|id| scene.world_bounds(id));
        bus.emit(InspectorEvent::ObjectSelected { object });
        true
    }

    pub fn deselect(&mut self, scene: &HostScene, bus: &mut EventBus) {
        self.select(scene, None, bus);
    }

    /// Entity selection initiated locally; publishes `EntitySelected`.
    /// `camera_entity` is the entity owning the camera the overlay adopted.
    pub fn select_entity(
        &mut self,
        scene: &HostScene,
        entity: Option<EntityId>,
        camera_entity: Option<EntityId>,
        bus: &mut EventBus,
    ) {
        self.apply_entity_selection(scene, entity, camera_entity, true, bus);
    }

    /// Entity selection arriving from an `EntitySelected` event. Skips the
    /// re-emit so the wiring cannot feed back on itself.
    pub fn select_entity_from_event(
        &mut self,
        scene: &HostScene,
        entity: Option<EntityId>,
        camera_entity: Option<EntityId>,
        bus: &mut EventBus,
    ) {
        self.apply_entity_selection(scene, entity, camera_entity, false, bus);
    }

    fn apply_entity_selection(
        &mut self,
        scene: &HostScene,
        entity: Option<EntityId>,
        camera_entity: Option<EntityId>,
        emit: bool,
        bus: &mut EventBus,
    ) {
        self.selected_entity = entity;
        let object = entity.and_then(|id| scene.entity(id)).and_then(|record| record.object);
        self.select(scene, object, bus);
        if emit {
            bus.emit(InspectorEvent::EntitySelected { entity });
        }
        self.camera_helper_visible = entity.is_some() && entity == camera_entity;
    }

    /// Resolves `id` against the effective active camera first, then the
    /// full graph (detached-from-view subtrees included). An id that
    /// resolves to nothing deselects the object and leaves the selected
    /// entity untouched.
    pub fn select_by_id(&mut self, scene: &HostScene, id: ObjectId, bus: &mut EventBus) {
        if scene.active_camera() == Some(id) {
            self.select(scene, Some(id), bus);
            return;
        }
        let resolved = scene.object(id).map(|_| id);
        self.select(scene, resolved, bus);
    }

    pub fn reset(&mut self) {
        self.selected_object = None;
        self.selected_entity = None;
        self.bbox = None;
        self.camera_helper_visible = false;
    }
}
