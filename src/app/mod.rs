use crate::config::{CameraConfig, InspectorConfig};
use crate::events::{EventBus, InspectorEvent};
use crate::helpers::HelperRegistry;
use crate::scene::{
    EntityDefinition, EntityId, HostScene, Markers, ObjectId, SceneNotice, SceneObject, TypeTag,
};
use crate::selection::SelectionManager;
use crate::shortcuts::{ShortcutState, Shortcuts};

use glam::{Affine3A, Vec3};
use std::time::{Duration, Instant};

mod camera_tooling;

pub use camera_tooling::CameraRig;

/// Startup is a chain of one-shot waits: each phase parks until the host
/// delivers the notice that resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    WaitingForScene,
    WaitingForCamera,
    WaitingForCameraInit,
    Ready,
}

/// Opaque services (asset, component, and shader loaders among them) the
/// host constructs at startup. The overlay only guarantees their `init` runs
/// after a camera exists.
pub trait InspectorModule {
    fn name(&self) -> &str;
    fn init(&mut self, scene: &mut HostScene);
}

/// The overlay context: owns the helper registry, selection state, camera
/// rig, and event bus, and reacts to host notices through [`pump`]. One
/// instance per host scene, constructed by the integration layer and passed
/// alongside the scene it mirrors.
///
/// [`pump`]: Inspector::pump
pub struct Inspector {
    pub(crate) config: InspectorConfig,
    pub(crate) bus: EventBus,
    pub(crate) helpers: HelperRegistry,
    pub(crate) selection: SelectionManager,
    pub(crate) rig: CameraRig,
    opened: bool,
    phase: StartupPhase,
    removed_embedded: bool,
    shortcuts: Box<dyn Shortcuts>,
    modules: Vec<Box<dyn InspectorModule>>,
    attached_at: Option<Instant>,
    stall_reported: bool,
}

impl Inspector {
    pub fn new(config: InspectorConfig) -> Self {
        Self::with_shortcuts(config, Box::new(ShortcutState::default()))
    }

    pub fn with_shortcuts(config: InspectorConfig, shortcuts: Box<dyn Shortcuts>) -> Self {
        Self {
            config,
            bus: EventBus::new(),
            helpers: HelperRegistry::new(),
            selection: SelectionManager::new(),
            rig: CameraRig::default(),
            opened: false,
            phase: StartupPhase::WaitingForScene,
            removed_embedded: false,
            shortcuts,
            modules: Vec::new(),
            attached_at: None,
            stall_reported: false,
        }
    }

    pub fn opened(&self) -> bool {
        self.opened
    }

    pub fn startup_phase(&self) -> StartupPhase {
        self.phase
    }

    pub fn startup_stalled(&self) -> bool {
        self.stall_reported
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn camera_rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn shortcuts(&self) -> &dyn Shortcuts {
        self.shortcuts.as_ref()
    }

    pub fn register_module(&mut self, module: Box<dyn InspectorModule>) {
        self.modules.push(module);
    }

    /// Attaches the overlay to the host scene. When the scene has not
    /// finished loading yet, initialization parks until its `Loaded` notice.
    pub fn attach(&mut self, scene: &mut HostScene) {
        self.attached_at = Some(Instant::now());
        self.stall_reported = false;
        if scene.is_loaded() {
            self.on_scene_loaded(scene);
        } else {
            self.phase = StartupPhase::WaitingForScene;
            log::debug!("inspector waiting for scene load");
        }
    }

    fn on_scene_loaded(&mut self, scene: &mut HostScene) {
        if self.adopt_host_camera(scene) {
            self.phase = StartupPhase::WaitingForCameraInit;
        } else {
            self.phase = StartupPhase::WaitingForCamera;
            log::debug!("inspector waiting for an active camera");
        }
    }

    fn on_editor_camera_ready(&mut self, scene: &mut HostScene) {
        self.activate_editor_camera(scene);
        self.init_ui(scene);
    }

    fn init_ui(&mut self, scene: &mut HostScene) {
        self.phase = StartupPhase::Ready;
        self.selection.reset();

        // Seed helpers from the entity wrappers two levels below the root,
        // the layer where the host parks entity subtrees.
        let root = scene.root();
        let wrappers: Vec<ObjectId> = scene.children(root).to_vec();
        for wrapper in wrappers {
            let seeds: Vec<ObjectId> = scene.children(wrapper).to_vec();
            for seed in seeds {
                self.add_object(scene, seed);
            }
        }

        let mut modules = std::mem::take(&mut self.modules);
        for module in &mut modules {
            log::info!("initializing module <{}>", module.name());
            module.init(scene);
        }
        self.modules = modules;

        self.bus.emit(InspectorEvent::WindowResized);
        self.open(scene, None);
    }

    /// Drains host notices and bus events until both are quiescent. All
    /// overlay state transitions run synchronously inside this call.
    pub fn pump(&mut self, scene: &mut HostScene) {
        loop {
            let notices = scene.take_notices();
            if notices.is_empty() && self.bus.is_idle() {
                break;
            }
            for notice in notices {
                self.apply_notice(scene, notice);
            }
            for event in self.bus.dispatch() {
                self.apply_event(scene, &event);
            }
        }
        self.check_startup_stall();
    }

    fn apply_notice(&mut self, scene: &mut HostScene, notice: SceneNotice) {
        match notice {
            SceneNotice::Loaded => {
                if self.phase == StartupPhase::WaitingForScene {
                    self.on_scene_loaded(scene);
                }
            }
            SceneNotice::CameraSetActive { .. } => {
                if self.phase == StartupPhase::WaitingForCamera {
                    self.on_scene_loaded(scene);
                }
            }
            SceneNotice::ComponentInitialized { object, component } => {
                if self.phase == StartupPhase::WaitingForCameraInit
                    && component == "camera"
                    && Some(object) == self.rig.editor_camera()
                {
                    self.on_editor_camera_ready(scene);
                }
            }
            SceneNotice::EntityLoaded { entity } => {
                if self.phase == StartupPhase::Ready {
                    self.add_entity(scene, entity);
                }
            }
            SceneNotice::ChildDetached { object } => self.remove_object(scene, object),
            SceneNotice::ModelLoaded { object } => self.add_object(scene, object),
            SceneNotice::DomModified { mutations } => {
                for mutation in &mutations {
                    let Some(selected) = self.selection.selected_entity() else { continue };
                    if mutation.removed.contains(&selected) {
                        self.select_entity(scene, None);
                    }
                }
            }
        }
    }

    fn apply_event(&mut self, scene: &mut HostScene, event: &InspectorEvent) {
        match event {
            InspectorEvent::EntitySelected { entity } => {
                self.select_entity_from_event(scene, *entity);
            }
            InspectorEvent::ModeChanged { active } => {
                self.helpers.set_layer_visible(*active);
            }
            InspectorEvent::CreateNewEntity { definition } => {
                self.create_new_entity(scene, definition);
            }
            InspectorEvent::ComponentChanged { entity } => {
                if let Some(object) = scene.entity(*entity).and_then(|record| record.object) {
                    self.add_object(scene, object);
                }
            }
            _ => {}
        }
    }

    /// Opens the overlay: pauses the host scene, takes over display modes,
    /// and enables shortcuts. `focus` pre-selects an entity.
    pub fn open(&mut self, scene: &mut HostScene, focus: Option<EntityId>) {
        self.opened = true;
        self.bus.emit(InspectorEvent::ModeChanged { active: true });

        if !scene.is_mocap_replay() {
            scene.pause();
            scene.exit_immersive();
        }
        if scene.is_embedded() {
            scene.set_embedded(false);
            self.removed_embedded = true;
        }
        scene.set_overlay_active(true);
        scene.resize();
        self.shortcuts.enable();

        if focus.is_some() {
            self.select_entity(scene, focus);
        }
        log::info!("inspector opened");
    }

    /// Closes the overlay and gives control back to the host scene.
    pub fn close(&mut self, scene: &mut HostScene) {
        self.opened = false;
        self.bus.emit(InspectorEvent::ModeChanged { active: false });

        scene.play();
        if self.removed_embedded {
            scene.set_embedded(true);
            self.removed_embedded = false;
        }
        scene.set_overlay_active(false);
        scene.resize();
        self.shortcuts.disable();
        log::info!("inspector closed");
    }

    pub fn toggle(&mut self, scene: &mut HostScene) {
        if self.opened {
            self.close(scene);
        } else {
            self.open(scene, None);
        }
    }

    /// Derives helpers for `object`'s subtree and publishes the structural
    /// change.
    pub fn add_object(&mut self, scene: &HostScene, object: ObjectId) {
        self.helpers.add_object(scene, object, &mut self.bus);
        self.bus.emit(InspectorEvent::ObjectAdded { object });
        self.bus.emit(InspectorEvent::SceneGraphChanged);
    }

    /// Tears down the helpers registered under a removed object. The object
    /// itself is deleted by the host.
    pub fn remove_object(&mut self, _scene: &HostScene, object: ObjectId) {
        self.helpers.remove_helpers(object, &mut self.bus);
        self.bus.emit(InspectorEvent::ObjectRemoved { object });
    }

    fn add_entity(&mut self, scene: &HostScene, entity: EntityId) {
        if let Some(object) = scene.entity(entity).and_then(|record| record.object) {
            self.add_object(scene, object);
        }
        self.select_entity(scene, Some(entity));
    }

    /// Appends a new entity built from a declarative definition. Helper
    /// derivation and selection happen once the host reports the entity
    /// loaded.
    pub fn create_new_entity(&mut self, scene: &mut HostScene, definition: &EntityDefinition) -> EntityId {
        let entity = scene.create_entity(definition);
        log::debug!("created entity <{}>", definition.element);
        entity
    }

    pub fn select_entity(&mut self, scene: &HostScene, entity: Option<EntityId>) {
        let camera_entity = self.host_camera_entity(scene);
        self.selection.select_entity(scene, entity, camera_entity, &mut self.bus);
        self.sync_camera_helper();
    }

    fn select_entity_from_event(&mut self, scene: &HostScene, entity: Option<EntityId>) {
        let camera_entity = self.host_camera_entity(scene);
        self.selection.select_entity_from_event(scene, entity, camera_entity, &mut self.bus);
        self.sync_camera_helper();
    }

    pub fn select_by_id(&mut self, scene: &HostScene, id: ObjectId) {
        self.selection.select_by_id(scene, id, &mut self.bus);
    }

    pub fn deselect(&mut self, scene: &HostScene) {
        self.selection.deselect(scene, &mut self.bus);
    }

    /// Detaches the overlay: restores the host camera and its markers,
    /// removes the derived helper graph, and resets selection.
    pub fn detach(&mut self, scene: &mut HostScene) {
        if self.opened {
            self.close(scene);
        }
        self.restore_host_camera(scene);
        self.helpers.remove_all(&mut self.bus);
        self.selection.reset();
        self.phase = StartupPhase::WaitingForScene;
        self.attached_at = None;
        self.stall_reported = false;
        log::info!("inspector detached");
    }

    fn host_camera_entity(&self, scene: &HostScene) -> Option<EntityId> {
        self.rig.host_camera().and_then(|id| scene.object(id)).and_then(|object| object.entity)
    }

    fn sync_camera_helper(&mut self) {
        self.helpers.set_camera_helper_visible(self.selection.camera_helper_visible());
    }

    fn check_startup_stall(&mut self) {
        if self.phase == StartupPhase::Ready || self.stall_reported {
            return;
        }
        let Some(limit) = self.config.startup_wait_ms else { return };
        let Some(attached_at) = self.attached_at else { return };
        if attached_at.elapsed() >= Duration::from_millis(limit) {
            self.stall_reported = true;
            log::warn!("inspector startup still in {:?} after {limit}ms", self.phase);
        }
    }
}
