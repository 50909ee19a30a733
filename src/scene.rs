use bitflags::bitflags;
use glam::{Affine3A, Vec3};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::collections::BTreeMap;

new_key_type! {
    pub struct ObjectId;
    pub struct EntityId;
}

const HOST_CAMERA_NEAR: f32 = 0.005;
const HOST_CAMERA_FAR: f32 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Camera,
    PointLight,
    DirectionalLight,
    SpotLight,
    HemisphereLight,
    SkinnedMesh,
    Other,
}

impl TypeTag {
    pub fn label(self) -> &'static str {
        match self {
            TypeTag::Camera => "camera",
            TypeTag::PointLight => "point light",
            TypeTag::DirectionalLight => "directional light",
            TypeTag::SpotLight => "spot light",
            TypeTag::HemisphereLight => "hemisphere light",
            TypeTag::SkinnedMesh => "skinned mesh",
            TypeTag::Other => "other",
        }
    }

    /// Derives the tag a declarative component map implies for the typed
    /// child object an entity spawns.
    fn from_components(components: &BTreeMap<String, serde_json::Value>) -> TypeTag {
        if components.contains_key("camera") {
            return TypeTag::Camera;
        }
        if components.contains_key("skinned-mesh") {
            return TypeTag::SkinnedMesh;
        }
        if let Some(light) = components.get("light") {
            return match light.get("type").and_then(|v| v.as_str()) {
                Some("point") => TypeTag::PointLight,
                Some("spot") => TypeTag::SpotLight,
                Some("hemisphere") => TypeTag::HemisphereLight,
                _ => TypeTag::DirectionalLight,
            };
        }
        TypeTag::Other
    }
}

bitflags! {
    /// Marker attributes carried by scene objects. These survive for the
    /// whole object lifetime and are readable by host and overlay alike.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Markers: u32 {
        /// Created by the overlay; traversal and helper derivation skip it.
        const INSPECTOR_INTERNAL = 1 << 0;
        /// The camera that was active before the overlay attached.
        const ORIGINAL_CAMERA = 1 << 1;
        /// Framework-assigned default camera, auto-removed by the host when
        /// a competing camera appears.
        const DEFAULT_CAMERA = 1 << 2;
        /// Replacement for `DEFAULT_CAMERA` while the overlay holds a
        /// competing camera.
        const INSPECTOR_DEFAULT_CAMERA = 1 << 3;
        /// The editor-owned camera node.
        const INSPECTOR_CAMERA = 1 << 4;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SceneFlags: u32 {
        const EMBEDDED = 1 << 0;
        const MOCAP_REPLAY = 1 << 1;
        const OVERLAY_ACTIVE = 1 << 2;
    }
}

/// Axis-aligned bounding box in whatever space its owner defines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    pub fn from_half_extents(half_extents: Vec3) -> Self {
        Self { min: -half_extents, max: half_extents }
    }

    pub fn union(self, other: Aabb) -> Aabb {
        Aabb { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn transformed(&self, matrix: &Affine3A) -> Aabb {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];
        let mut min = matrix.transform_point3(corners[0]);
        let mut max = min;
        for corner in &corners[1..] {
            let p = matrix.transform_point3(*corner);
            min = min.min(p);
            max = max.max(p);
        }
        Aabb { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub near: f32,
    pub far: f32,
    pub active: bool,
}

/// A node in the host-owned primary graph. The overlay reads these and only
/// writes markers and transforms it owns (the editor camera pose).
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub tag: TypeTag,
    pub parent: Option<ObjectId>,
    pub children: Vec<ObjectId>,
    pub entity: Option<EntityId>,
    pub world_transform: Affine3A,
    pub markers: Markers,
    pub visible: bool,
    pub bounds: Option<Aabb>,
    pub camera: Option<CameraState>,
}

impl SceneObject {
    pub fn new(name: &str, tag: TypeTag) -> Self {
        Self {
            name: name.to_string(),
            tag,
            parent: None,
            children: Vec::new(),
            entity: None,
            world_transform: Affine3A::IDENTITY,
            markers: Markers::empty(),
            visible: true,
            bounds: None,
            camera: None,
        }
    }

    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_camera(mut self, near: f32, far: f32, active: bool) -> Self {
        self.camera = Some(CameraState { near, far, active });
        self
    }

    pub fn with_markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_transform(mut self, transform: Affine3A) -> Self {
        self.world_transform = transform;
        self
    }

    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn is_inspector_internal(&self) -> bool {
        self.markers.contains(Markers::INSPECTOR_INTERNAL)
    }
}

/// Host-framework owner of a scene object, carrying the declarative
/// component map it was built from.
#[derive(Debug, Clone)]
pub struct Entity {
    pub element: String,
    pub components: BTreeMap<String, serde_json::Value>,
    pub object: Option<ObjectId>,
    pub loaded: bool,
}

/// Declarative entity description consumed by `create_entity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub element: String,
    #[serde(default)]
    pub components: BTreeMap<String, serde_json::Value>,
}

/// One batched childList mutation record.
#[derive(Debug, Clone, Default)]
pub struct Mutation {
    pub removed: SmallVec<[EntityId; 4]>,
}

/// Asynchronous host signals, drained by the overlay's `pump`.
#[derive(Debug, Clone)]
pub enum SceneNotice {
    Loaded,
    CameraSetActive { object: ObjectId },
    ComponentInitialized { object: ObjectId, component: String },
    EntityLoaded { entity: EntityId },
    ChildDetached { object: ObjectId },
    ModelLoaded { object: ObjectId },
    DomModified { mutations: Vec<Mutation> },
}

/// The primary scene graph plus the host-side state the overlay coordinates
/// with: pause/play, display modes, the active camera, and the notice queue.
pub struct HostScene {
    objects: SlotMap<ObjectId, SceneObject>,
    entities: SlotMap<EntityId, Entity>,
    root: ObjectId,
    active_camera: Option<ObjectId>,
    flags: SceneFlags,
    loaded: bool,
    paused: bool,
    immersive: bool,
    resize_requests: u32,
    notices: Vec<SceneNotice>,
}

impl HostScene {
    pub fn new() -> Self {
        let mut objects = SlotMap::with_key();
        let root = objects.insert(SceneObject::new("scene", TypeTag::Other));
        Self {
            objects,
            entities: SlotMap::with_key(),
            root,
            active_camera: None,
            flags: SceneFlags::empty(),
            loaded: false,
            paused: false,
            immersive: false,
            resize_requests: 0,
            notices: Vec::new(),
        }
    }

    pub fn root(&self) -> ObjectId {
        self.root
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id)
    }

    pub fn contains_object(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.objects.get(id).map(|object| object.children.as_slice()).unwrap_or(&[])
    }

    /// Appends `object` under `parent`. A camera-capable object queues its
    /// component-initialized notice, modeling the host's asynchronous
    /// component setup.
    pub fn spawn_object(&mut self, parent: ObjectId, mut object: SceneObject) -> ObjectId {
        object.parent = Some(parent);
        let has_camera = object.camera.is_some();
        let id = self.objects.insert(object);
        if let Some(parent_object) = self.objects.get_mut(parent) {
            parent_object.children.push(id);
        }
        if has_camera {
            self.notices.push(SceneNotice::ComponentInitialized { object: id, component: "camera".to_string() });
        }
        id
    }

    /// Builds an entity from a declarative definition: a wrapper node under
    /// the root, plus a typed child when the components imply one. The
    /// entity stays unloaded until the host calls [`finish_entity_load`].
    ///
    /// [`finish_entity_load`]: HostScene::finish_entity_load
    pub fn create_entity(&mut self, definition: &EntityDefinition) -> EntityId {
        let entity = self.entities.insert(Entity {
            element: definition.element.clone(),
            components: definition.components.clone(),
            object: None,
            loaded: false,
        });
        let root = self.root;
        let wrapper =
            self.spawn_object(root, SceneObject::new(&definition.element, TypeTag::Other).with_entity(entity));

        let tag = TypeTag::from_components(&definition.components);
        if tag != TypeTag::Other || definition.components.contains_key("geometry") {
            let mut child = SceneObject::new(&definition.element, tag).with_entity(entity);
            if tag == TypeTag::Camera {
                child = child.with_camera(HOST_CAMERA_NEAR, HOST_CAMERA_FAR, false);
            }
            if definition.components.contains_key("geometry") {
                child = child.with_bounds(Aabb::from_half_extents(Vec3::splat(0.5)));
            }
            self.spawn_object(wrapper, child);
        }

        if let Some(record) = self.entities.get_mut(entity) {
            record.object = Some(wrapper);
        }
        entity
    }

    /// Registers a host-built entity over an already-spawned object and its
    /// descendants.
    pub fn register_entity(&mut self, element: &str, object: ObjectId) -> EntityId {
        let entity = self.entities.insert(Entity {
            element: element.to_string(),
            components: BTreeMap::new(),
            object: Some(object),
            loaded: true,
        });
        for id in self.subtree(object) {
            if let Some(node) = self.objects.get_mut(id) {
                if node.entity.is_none() || id == object {
                    node.entity = Some(entity);
                }
            }
        }
        entity
    }

    pub fn finish_entity_load(&mut self, entity: EntityId) {
        if let Some(record) = self.entities.get_mut(entity) {
            record.loaded = true;
            self.notices.push(SceneNotice::EntityLoaded { entity });
        }
    }

    pub fn finish_load(&mut self) {
        self.loaded = true;
        self.notices.push(SceneNotice::Loaded);
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Detaches `object` and its subtree, dropping the entities it owned.
    /// Queues both the child-detached notice and the batched mutation record
    /// an observer of the host document would deliver.
    pub fn detach(&mut self, object: ObjectId) {
        let subtree = self.subtree(object);
        if subtree.is_empty() {
            return;
        }
        if let Some(parent) = self.objects.get(object).and_then(|node| node.parent) {
            if let Some(parent_object) = self.objects.get_mut(parent) {
                parent_object.children.retain(|child| *child != object);
            }
        }
        if self.active_camera.is_some_and(|camera| subtree.contains(&camera)) {
            self.active_camera = None;
        }
        let mut removed: SmallVec<[EntityId; 4]> = SmallVec::new();
        for id in subtree {
            if let Some(node) = self.objects.remove(id) {
                if let Some(entity) = node.entity {
                    if !removed.contains(&entity) {
                        removed.push(entity);
                    }
                    self.entities.remove(entity);
                }
            }
        }
        self.notices.push(SceneNotice::ChildDetached { object });
        self.notices.push(SceneNotice::DomModified { mutations: vec![Mutation { removed }] });
    }

    pub fn set_active_camera(&mut self, object: ObjectId) {
        if let Some(previous) = self.active_camera {
            if let Some(camera) = self.objects.get_mut(previous).and_then(|node| node.camera.as_mut()) {
                camera.active = false;
            }
        }
        if let Some(camera) = self.objects.get_mut(object).and_then(|node| node.camera.as_mut()) {
            camera.active = true;
        }
        self.active_camera = Some(object);
        self.notices.push(SceneNotice::CameraSetActive { object });
    }

    pub fn active_camera(&self) -> Option<ObjectId> {
        self.active_camera
    }

    pub fn active_camera_entity(&self) -> Option<EntityId> {
        self.active_camera.and_then(|id| self.objects.get(id)).and_then(|node| node.entity)
    }

    pub fn notify_model_loaded(&mut self, object: ObjectId) {
        self.notices.push(SceneNotice::ModelLoaded { object });
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn play(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn enter_immersive(&mut self) {
        self.immersive = true;
    }

    pub fn exit_immersive(&mut self) {
        self.immersive = false;
    }

    pub fn in_immersive(&self) -> bool {
        self.immersive
    }

    pub fn set_embedded(&mut self, embedded: bool) {
        self.flags.set(SceneFlags::EMBEDDED, embedded);
    }

    pub fn is_embedded(&self) -> bool {
        self.flags.contains(SceneFlags::EMBEDDED)
    }

    pub fn set_mocap_replay(&mut self, replaying: bool) {
        self.flags.set(SceneFlags::MOCAP_REPLAY, replaying);
    }

    pub fn is_mocap_replay(&self) -> bool {
        self.flags.contains(SceneFlags::MOCAP_REPLAY)
    }

    pub fn set_overlay_active(&mut self, active: bool) {
        self.flags.set(SceneFlags::OVERLAY_ACTIVE, active);
    }

    pub fn is_overlay_active(&self) -> bool {
        self.flags.contains(SceneFlags::OVERLAY_ACTIVE)
    }

    pub fn resize(&mut self) {
        self.resize_requests += 1;
    }

    pub fn resize_requests(&self) -> u32 {
        self.resize_requests
    }

    pub fn take_notices(&mut self) -> Vec<SceneNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Depth-first ids of `id` and every descendant. Empty when `id` is
    /// stale.
    pub fn subtree(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(object) = self.objects.get(current) else { continue };
            out.push(current);
            stack.extend(object.children.iter().rev().copied());
        }
        out
    }

    /// World-space bounds of `id`'s subtree, `None` when no geometry exists
    /// under it.
    pub fn world_bounds(&self, id: ObjectId) -> Option<Aabb> {
        let mut result: Option<Aabb> = None;
        for current in self.subtree(id) {
            let Some(object) = self.objects.get(current) else { continue };
            if let Some(bounds) = object.bounds {
                let world = bounds.transformed(&object.world_transform);
                result = Some(match result {
                    Some(acc) => acc.union(world),
                    None => world,
                });
            }
        }
        result
    }
}

impl Default for HostScene {
    fn default() -> Self {
        Self::new()
    }
}
