use crate::events::{EventBus, InspectorEvent};
use crate::scene::{HostScene, ObjectId, TypeTag};
use std::collections::BTreeMap;

pub(crate) const PICKER_RADIUS: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelperKind {
    CameraFrustum,
    PointLight,
    DirectionalLight,
    SpotLight,
    HemisphereLight,
    Skeleton,
}

impl HelperKind {
    /// Closed dispatch from source type tag to helper kind. Unsupported tags
    /// get no helper.
    pub fn from_tag(tag: TypeTag) -> Option<HelperKind> {
        match tag {
            TypeTag::Camera => Some(HelperKind::CameraFrustum),
            TypeTag::PointLight => Some(HelperKind::PointLight),
            TypeTag::DirectionalLight => Some(HelperKind::DirectionalLight),
            TypeTag::SpotLight => Some(HelperKind::SpotLight),
            TypeTag::HemisphereLight => Some(HelperKind::HemisphereLight),
            TypeTag::SkinnedMesh => Some(HelperKind::Skeleton),
            TypeTag::Other => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HelperKind::CameraFrustum => "camera frustum",
            HelperKind::PointLight => "point light",
            HelperKind::DirectionalLight => "directional light",
            HelperKind::SpotLight => "spot light",
            HelperKind::HemisphereLight => "hemisphere light",
            HelperKind::Skeleton => "skeleton",
        }
    }
}

/// Invisible pickable proxy embedded in every helper so the host's pointer
/// picking resolves hits back to the source object.
#[derive(Debug, Clone)]
pub struct Picker {
    pub source: ObjectId,
    pub radius: f32,
    pub visible: bool,
}

impl Picker {
    fn new(source: ObjectId) -> Self {
        Self { source, radius: PICKER_RADIUS, visible: false }
    }
}

#[derive(Debug, Clone)]
pub struct Helper {
    pub kind: HelperKind,
    pub source: ObjectId,
    pub parent: ObjectId,
    pub visible: bool,
    pub picker: Picker,
}

/// Derived graph of visual proxies, grouped by the source object's parent.
/// Groups are recomputed per parent batch: installing a helper replaces the
/// entire prior group under that parent.
pub struct HelperRegistry {
    groups: BTreeMap<ObjectId, BTreeMap<ObjectId, Helper>>,
    camera_helper: Option<ObjectId>,
    layer_visible: bool,
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self { groups: BTreeMap::new(), camera_helper: None, layer_visible: true }
    }

    /// Traverses `root` and every descendant, deriving helpers for each
    /// qualifying object. Unconditional: repeated calls re-derive the same
    /// set at cost proportional to subtree size.
    pub fn add_object(&mut self, scene: &HostScene, root: ObjectId, bus: &mut EventBus) {
        for id in scene.subtree(root) {
            if self.is_overlay_internal(scene, id) {
                continue;
            }
            self.add_helper(scene, id, bus);
        }
    }

    fn is_overlay_internal(&self, scene: &HostScene, id: ObjectId) -> bool {
        let Some(object) = scene.object(id) else { return true };
        if object.is_inspector_internal() {
            return true;
        }
        object
            .entity
            .and_then(|entity| scene.entity(entity))
            .and_then(|entity| entity.object)
            .and_then(|owner| scene.object(owner))
            .is_some_and(|owner| owner.is_inspector_internal())
    }

    /// Derives a helper for `object`. Unsupported tag or missing parent is a
    /// no-op. The prior helper group under the same parent is discarded
    /// wholesale before the new helper is installed; that replacement emits
    /// no removal notifications.
    pub fn add_helper(&mut self, scene: &HostScene, object: ObjectId, bus: &mut EventBus) {
        let Some(node) = scene.object(object) else { return };
        let Some(kind) = HelperKind::from_tag(node.tag) else { return };
        let Some(parent) = node.parent else { return };

        let mut helper = Helper { kind, source: object, parent, visible: true, picker: Picker::new(object) };
        if kind == HelperKind::CameraFrustum {
            helper.visible = false;
            self.camera_helper = Some(object);
        }
        self.replace_group(parent, [(object, helper)]);
        log::trace!("derived {} helper for {:?}", kind.label(), object);
        bus.emit(InspectorEvent::HelperAdded { source: object, kind });
    }

    /// Atomically clears the group under `parent` and installs `entries`.
    /// No observer sees a partially rebuilt group.
    pub fn replace_group(&mut self, parent: ObjectId, entries: impl IntoIterator<Item = (ObjectId, Helper)>) {
        let group: BTreeMap<ObjectId, Helper> = entries.into_iter().collect();
        if group.is_empty() {
            self.groups.remove(&parent);
        } else {
            self.groups.insert(parent, group);
        }
    }

    /// Tears down the helper group registered under `parent` (the id of a
    /// removed object, keyed as a parent: this removes helpers of its
    /// children, not a helper of the object itself). Missing group is a
    /// silent no-op.
    pub fn remove_helpers(&mut self, parent: ObjectId, bus: &mut EventBus) {
        let Some(group) = self.groups.remove(&parent) else { return };
        for (source, helper) in group {
            bus.emit(InspectorEvent::HelperRemoved { source, kind: helper.kind });
        }
    }

    /// Tears down every group, with removal notifications.
    pub fn remove_all(&mut self, bus: &mut EventBus) {
        let parents: Vec<ObjectId> = self.groups.keys().copied().collect();
        for parent in parents {
            self.remove_helpers(parent, bus);
        }
        self.camera_helper = None;
    }

    pub fn set_layer_visible(&mut self, visible: bool) {
        self.layer_visible = visible;
    }

    pub fn layer_visible(&self) -> bool {
        self.layer_visible
    }

    pub fn camera_helper(&self) -> Option<ObjectId> {
        self.camera_helper
    }

    pub fn set_camera_helper_visible(&mut self, visible: bool) {
        let Some(source) = self.camera_helper else { return };
        for group in self.groups.values_mut() {
            if let Some(helper) = group.get_mut(&source) {
                helper.visible = visible;
            }
        }
    }

    pub fn group(&self, parent: ObjectId) -> Option<&BTreeMap<ObjectId, Helper>> {
        self.groups.get(&parent)
    }

    pub fn helper_for(&self, source: ObjectId) -> Option<&Helper> {
        self.groups.values().find_map(|group| group.get(&source))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Helper> {
        self.groups.values().flat_map(|group| group.values())
    }

    pub fn helper_count(&self) -> usize {
        self.groups.values().map(|group| group.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
