use super::*;

/// Editor camera context: which camera the host had, which one the overlay
/// injected, and what must be restored on detach.
#[derive(Debug, Default)]
pub struct CameraRig {
    pub(crate) host_camera: Option<ObjectId>,
    pub(crate) editor_camera: Option<ObjectId>,
    pub(crate) was_default_camera: bool,
    pub(crate) original_pose: Option<Affine3A>,
}

impl CameraRig {
    pub fn host_camera(&self) -> Option<ObjectId> {
        self.host_camera
    }

    pub fn editor_camera(&self) -> Option<ObjectId> {
        self.editor_camera
    }

    pub fn was_default_camera(&self) -> bool {
        self.was_default_camera
    }

    pub fn original_pose(&self) -> Option<Affine3A> {
        self.original_pose
    }
}

pub(crate) fn editor_camera_pose(config: &CameraConfig) -> Affine3A {
    Affine3A::look_at_rh(config.position_vec3(), config.target_vec3(), Vec3::Y).inverse()
}

impl Inspector {
    /// Adopts the host camera and injects the editor camera. Returns false
    /// when the scene exposes no active camera yet and startup must park.
    ///
    /// The host camera gets a durable marker so it stays identifiable, and a
    /// framework-assigned default tag is swapped for an overlay-owned one so
    /// the host does not auto-delete it once a competing camera appears.
    pub(crate) fn adopt_host_camera(&mut self, scene: &mut HostScene) -> bool {
        let Some(host_camera) = scene.active_camera() else { return false };

        if let Some(object) = scene.object_mut(host_camera) {
            object.markers.insert(Markers::ORIGINAL_CAMERA);
            if object.markers.contains(Markers::DEFAULT_CAMERA) {
                object.markers.remove(Markers::DEFAULT_CAMERA);
                object.markers.insert(Markers::INSPECTOR_DEFAULT_CAMERA);
                self.rig.was_default_camera = true;
            }
        }
        self.rig.host_camera = Some(host_camera);

        let pose = editor_camera_pose(&self.config.camera);
        let camera = SceneObject::new("inspector-camera", TypeTag::Camera)
            .with_markers(Markers::INSPECTOR_INTERNAL | Markers::INSPECTOR_CAMERA)
            .with_camera(self.config.camera.near, self.config.camera.far, true)
            .with_transform(pose);
        let root = scene.root();
        let editor_camera = scene.spawn_object(root, camera);
        self.rig.editor_camera = Some(editor_camera);
        self.rig.original_pose = Some(pose);
        log::debug!("editor camera injected, awaiting camera component init");
        true
    }

    /// Runs once the editor camera's camera component reports initialized:
    /// applies the default pose and makes it the effective active camera.
    pub(crate) fn activate_editor_camera(&mut self, scene: &mut HostScene) {
        let Some(editor_camera) = self.rig.editor_camera else { return };
        if let Some(pose) = self.rig.original_pose {
            if let Some(object) = scene.object_mut(editor_camera) {
                object.world_transform = pose;
            }
        }
        scene.set_active_camera(editor_camera);
    }

    /// Copies the editor camera's original pose back onto the effective
    /// active camera and deselects.
    pub fn clear(&mut self, scene: &mut HostScene) {
        if let (Some(pose), Some(active)) = (self.rig.original_pose, scene.active_camera()) {
            if let Some(object) = scene.object_mut(active) {
                object.world_transform = pose;
            }
        }
        self.deselect(scene);
        self.bus.emit(InspectorEvent::InspectorCleared);
    }

    /// Restores the host camera as active, undoes the marker swap, and
    /// detaches the editor camera node.
    pub(crate) fn restore_host_camera(&mut self, scene: &mut HostScene) {
        if let Some(host_camera) = self.rig.host_camera.take() {
            if let Some(object) = scene.object_mut(host_camera) {
                object.markers.remove(Markers::ORIGINAL_CAMERA);
                if self.rig.was_default_camera {
                    object.markers.remove(Markers::INSPECTOR_DEFAULT_CAMERA);
                    object.markers.insert(Markers::DEFAULT_CAMERA);
                }
            }
            if scene.contains_object(host_camera) {
                scene.set_active_camera(host_camera);
            }
        }
        if let Some(editor_camera) = self.rig.editor_camera.take() {
            scene.detach(editor_camera);
        }
        self.rig.was_default_camera = false;
        self.rig.original_pose = None;
    }
}
