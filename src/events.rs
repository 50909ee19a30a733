use crate::helpers::HelperKind;
use crate::scene::{EntityDefinition, EntityId, ObjectId};
use std::collections::{HashMap, VecDeque};
use std::fmt;

#[derive(Debug, Clone)]
pub enum InspectorEvent {
    ObjectAdded { object: ObjectId },
    ObjectRemoved { object: ObjectId },
    HelperAdded { source: ObjectId, kind: HelperKind },
    HelperRemoved { source: ObjectId, kind: HelperKind },
    ObjectSelected { object: Option<ObjectId> },
    EntitySelected { entity: Option<EntityId> },
    ModeChanged { active: bool },
    SceneGraphChanged,
    CreateNewEntity { definition: EntityDefinition },
    ComponentChanged { entity: EntityId },
    InspectorCleared,
    WindowResized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    ObjectAdded,
    ObjectRemoved,
    HelperAdded,
    HelperRemoved,
    ObjectSelected,
    EntitySelected,
    ModeChanged,
    SceneGraphChanged,
    CreateNewEntity,
    ComponentChanged,
    InspectorCleared,
    WindowResized,
}

impl InspectorEvent {
    pub fn topic(&self) -> Topic {
        match self {
            InspectorEvent::ObjectAdded { .. } => Topic::ObjectAdded,
            InspectorEvent::ObjectRemoved { .. } => Topic::ObjectRemoved,
            InspectorEvent::HelperAdded { .. } => Topic::HelperAdded,
            InspectorEvent::HelperRemoved { .. } => Topic::HelperRemoved,
            InspectorEvent::ObjectSelected { .. } => Topic::ObjectSelected,
            InspectorEvent::EntitySelected { .. } => Topic::EntitySelected,
            InspectorEvent::ModeChanged { .. } => Topic::ModeChanged,
            InspectorEvent::SceneGraphChanged => Topic::SceneGraphChanged,
            InspectorEvent::CreateNewEntity { .. } => Topic::CreateNewEntity,
            InspectorEvent::ComponentChanged { .. } => Topic::ComponentChanged,
            InspectorEvent::InspectorCleared => Topic::InspectorCleared,
            InspectorEvent::WindowResized => Topic::WindowResized,
        }
    }
}

impl fmt::Display for InspectorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectorEvent::ObjectAdded { object } => write!(f, "ObjectAdded object={object:?}"),
            InspectorEvent::ObjectRemoved { object } => write!(f, "ObjectRemoved object={object:?}"),
            InspectorEvent::HelperAdded { source, kind } => {
                write!(f, "HelperAdded source={source:?} kind={}", kind.label())
            }
            InspectorEvent::HelperRemoved { source, kind } => {
                write!(f, "HelperRemoved source={source:?} kind={}", kind.label())
            }
            InspectorEvent::ObjectSelected { object } => write!(f, "ObjectSelected object={object:?}"),
            InspectorEvent::EntitySelected { entity } => write!(f, "EntitySelected entity={entity:?}"),
            InspectorEvent::ModeChanged { active } => write!(f, "ModeChanged active={active}"),
            InspectorEvent::SceneGraphChanged => write!(f, "SceneGraphChanged"),
            InspectorEvent::CreateNewEntity { definition } => {
                write!(f, "CreateNewEntity element={}", definition.element)
            }
            InspectorEvent::ComponentChanged { entity } => write!(f, "ComponentChanged entity={entity:?}"),
            InspectorEvent::InspectorCleared => write!(f, "InspectorCleared"),
            InspectorEvent::WindowResized => write!(f, "WindowResized"),
        }
    }
}

type Handler = Box<dyn FnMut(&InspectorEvent)>;

/// Named-topic bus. Emission only enqueues; delivery happens in emission
/// order when the orchestrator calls [`EventBus::dispatch`], so every handler
/// runs on the same control flow that mutates overlay state.
#[derive(Default)]
pub struct EventBus {
    queue: VecDeque<InspectorEvent>,
    subscribers: HashMap<Topic, Vec<Handler>>,
    once: HashMap<Topic, Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, topic: Topic, handler: impl FnMut(&InspectorEvent) + 'static) {
        self.subscribers.entry(topic).or_default().push(Box::new(handler));
    }

    /// One-shot subscription: the handler resolves on the first matching
    /// event and is then dropped.
    pub fn once(&mut self, topic: Topic, handler: impl FnMut(&InspectorEvent) + 'static) {
        self.once.entry(topic).or_default().push(Box::new(handler));
    }

    pub fn emit(&mut self, event: InspectorEvent) {
        self.queue.push_back(event);
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Delivers every queued event to its subscribers and returns the batch.
    pub fn dispatch(&mut self) -> Vec<InspectorEvent> {
        let batch: Vec<InspectorEvent> = self.queue.drain(..).collect();
        for event in &batch {
            let topic = event.topic();
            if let Some(handlers) = self.subscribers.get_mut(&topic) {
                for handler in handlers.iter_mut() {
                    handler(event);
                }
            }
            if let Some(mut handlers) = self.once.remove(&topic) {
                for handler in handlers.iter_mut() {
                    handler(event);
                }
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn dispatch_preserves_emission_order() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.on(Topic::ModeChanged, move |event| {
            if let InspectorEvent::ModeChanged { active } = event {
                sink.borrow_mut().push(*active);
            }
        });
        bus.emit(InspectorEvent::ModeChanged { active: true });
        bus.emit(InspectorEvent::ModeChanged { active: false });
        bus.dispatch();
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn once_resolves_a_single_time() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        bus.once(Topic::SceneGraphChanged, move |_| {
            *sink.borrow_mut() += 1;
        });
        bus.emit(InspectorEvent::SceneGraphChanged);
        bus.emit(InspectorEvent::SceneGraphChanged);
        bus.dispatch();
        assert_eq!(*count.borrow(), 1);
    }
}
