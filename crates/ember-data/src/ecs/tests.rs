// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::*;
use ember_core::{ComponentId, EntityId, ServiceTag};
use std::any::Any;
use std::sync::{Arc, Mutex};

// --- DUMMY COMPONENTS FOR TESTING ---

const TRANSFORM: ServiceTag = ServiceTag::from_name("transform");
const RENDER: ServiceTag = ServiceTag::from_name("render");
const PHYSICS: ServiceTag = ServiceTag::from_name("physics");

type CallLog = Arc<Mutex<Vec<String>>>;

/// A component whose services and activation outcome are configured per test.
struct Probe {
    label: &'static str,
    provides: Vec<ServiceTag>,
    requires: Vec<ServiceTag>,
    incompatible: Vec<ServiceTag>,
    fail_activation: bool,
    owner: Option<EntityId>,
    log: CallLog,
}

impl Probe {
    fn new(label: &'static str, log: &CallLog) -> Self {
        Self {
            label,
            provides: Vec::new(),
            requires: Vec::new(),
            incompatible: Vec::new(),
            fail_activation: false,
            owner: None,
            log: log.clone(),
        }
    }

    fn provides(mut self, tag: ServiceTag) -> Self {
        self.provides.push(tag);
        self
    }

    fn requires(mut self, tag: ServiceTag) -> Self {
        self.requires.push(tag);
        self
    }

    fn incompatible_with(mut self, tag: ServiceTag) -> Self {
        self.incompatible.push(tag);
        self
    }

    fn failing(mut self) -> Self {
        self.fail_activation = true;
        self
    }

    fn record(&self, call: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}.{call}", self.label));
    }
}

impl Component for Probe {
    fn provided_services(&self) -> Vec<ServiceTag> {
        self.provides.clone()
    }

    fn required_services(&self) -> Vec<ServiceTag> {
        self.requires.clone()
    }

    fn incompatible_services(&self) -> Vec<ServiceTag> {
        self.incompatible.clone()
    }

    fn attached(&mut self, owner: EntityId) {
        self.owner = Some(owner);
    }

    fn detached(&mut self) {
        self.owner = None;
    }

    fn init(&mut self, _owner: EntityId) {
        self.record("init");
    }

    fn activate(&mut self) -> Result<(), ActivationError> {
        if self.fail_activation {
            return Err(ActivationError::new(format!("{} refused", self.label)));
        }
        self.record("activate");
        Ok(())
    }

    fn deactivate(&mut self) {
        self.record("deactivate");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Marker(u32);

impl Component for Marker {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn entity_with_id(raw: u64) -> Entity {
    Entity::with_id(EntityId::from_raw(raw), "test")
}

// --- TESTS ---

#[test]
fn test_new_entity_starts_constructed() {
    let entity = Entity::new("player");
    assert_eq!(entity.state(), EntityState::Constructed);
    assert_eq!(entity.name(), "player");
    assert!(entity.id().is_valid());
    assert_eq!(entity.component_count(), 0);
}

#[test]
fn test_component_ids_are_assigned_in_attach_order() {
    let mut entity = entity_with_id(7);
    let a = entity.create_component(Marker(1)).unwrap();
    let b = entity.create_component(Marker(2)).unwrap();
    assert_ne!(a, b);

    let ids: Vec<_> = entity.components().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![a, b]);
}

#[test]
fn test_attach_hands_out_owner_and_detach_clears_it() {
    let log = CallLog::default();
    let mut entity = entity_with_id(42);
    let id = entity
        .add_component(Box::new(Probe::new("p", &log)))
        .unwrap();

    let probe = entity.find_component::<Probe>().unwrap();
    assert_eq!(probe.owner, Some(EntityId::from_raw(42)));

    let removed = entity.remove_component(id).unwrap();
    let probe = removed.as_any().downcast_ref::<Probe>().unwrap();
    assert_eq!(probe.owner, None, "detached components forget their owner");
    assert_eq!(entity.component_count(), 0);
}

#[test]
fn test_set_id_only_before_init() {
    let mut entity = entity_with_id(1);
    entity.create_component(Marker(0)).unwrap();
    entity.set_id(EntityId::from_raw(2)).unwrap();
    assert_eq!(entity.id(), EntityId::from_raw(2));

    entity.init().unwrap();
    let err = entity.set_id(EntityId::from_raw(3)).unwrap_err();
    assert!(matches!(
        err,
        EntityError::InvalidState {
            operation: "set_id",
            state: EntityState::Init
        }
    ));
    assert_eq!(entity.id(), EntityId::from_raw(2));
}

#[test]
fn test_init_runs_once_in_insertion_order() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    entity
        .create_component(Probe::new("b", &log).requires(TRANSFORM))
        .unwrap();
    entity
        .create_component(Probe::new("a", &log).provides(TRANSFORM))
        .unwrap();

    entity.init().unwrap();
    assert_eq!(entity.state(), EntityState::Init);
    assert_eq!(calls(&log), vec!["b.init", "a.init"]);

    assert!(entity.init().is_err(), "init is allowed only once");
}

#[test]
fn test_component_added_after_init_is_initialized_immediately() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    entity.init().unwrap();

    entity.create_component(Probe::new("late", &log)).unwrap();
    assert_eq!(calls(&log), vec!["late.init"]);
}

#[test]
fn test_active_entity_rejects_structural_changes() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    let id = entity.create_component(Probe::new("a", &log)).unwrap();
    entity.init().unwrap();
    entity.activate().unwrap();

    let rejected = entity
        .add_component(Box::new(Marker(9)))
        .unwrap_err();
    assert!(matches!(
        rejected.error,
        EntityError::InvalidState {
            state: EntityState::Active,
            ..
        }
    ));
    assert!(
        rejected.component.as_any().downcast_ref::<Marker>().is_some(),
        "the refused component is handed back"
    );

    assert!(entity.remove_component(id).is_err());
    assert!(entity.swap_components(id, Box::new(Marker(1))).is_err());
    assert_eq!(entity.component_count(), 1);

    entity.deactivate().unwrap();
    assert!(entity.create_component(Marker(9)).is_ok(), "Init accepts new components");
}

#[test]
fn test_self_incompatible_component_is_rejected() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    let rejected = entity
        .add_component(Box::new(
            Probe::new("odd", &log)
                .provides(PHYSICS)
                .incompatible_with(PHYSICS),
        ))
        .unwrap_err();

    assert!(matches!(
        rejected.error,
        EntityError::InvalidDescriptor { .. }
    ));
    assert_eq!(entity.component_count(), 0);
}

#[test]
fn test_activation_order_follows_services() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    entity
        .create_component(Probe::new("renderer", &log).requires(TRANSFORM).provides(RENDER))
        .unwrap();
    entity
        .create_component(Probe::new("camera", &log).requires(RENDER))
        .unwrap();
    entity
        .create_component(Probe::new("transform", &log).provides(TRANSFORM))
        .unwrap();

    entity.init().unwrap();
    log.lock().unwrap().clear();

    entity.activate().unwrap();
    entity.deactivate().unwrap();

    assert_eq!(
        calls(&log),
        vec![
            "transform.activate",
            "renderer.activate",
            "camera.activate",
            "camera.deactivate",
            "renderer.deactivate",
            "transform.deactivate",
        ]
    );
    assert_eq!(entity.state(), EntityState::Init);
}

#[test]
fn test_dependency_evaluation_is_cached_until_invalidated() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    let renderer = entity
        .create_component(Probe::new("renderer", &log).requires(TRANSFORM))
        .unwrap();
    assert!(entity.activation_order().is_none());

    let err = entity.evaluate_dependencies().unwrap_err();
    assert_eq!(
        err,
        DependencyError::MissingRequired {
            services: vec![TRANSFORM]
        }
    );

    let transform = entity
        .create_component(Probe::new("transform", &log).provides(TRANSFORM))
        .unwrap();
    assert_eq!(
        entity.evaluate_dependencies().unwrap(),
        vec![transform, renderer]
    );
    assert_eq!(entity.activation_order(), Some(&[transform, renderer][..]));

    entity.invalidate_dependencies();
    assert!(entity.activation_order().is_none());
}

#[test]
fn test_missing_dependency_blocks_activation_without_side_effects() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    entity
        .create_component(Probe::new("renderer", &log).requires(TRANSFORM))
        .unwrap();
    entity.init().unwrap();
    log.lock().unwrap().clear();

    let err = entity.activate().unwrap_err();
    assert!(matches!(
        err,
        EntityError::Dependency(DependencyError::MissingRequired { .. })
    ));
    assert_eq!(entity.state(), EntityState::Init);
    assert!(calls(&log).is_empty());
}

#[test]
fn test_cyclic_dependency_blocks_activation() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    let a = entity
        .create_component(Probe::new("a", &log).provides(TRANSFORM).requires(RENDER))
        .unwrap();
    let b = entity
        .create_component(Probe::new("b", &log).provides(RENDER).requires(TRANSFORM))
        .unwrap();
    entity.init().unwrap();

    let err = entity.activate().unwrap_err();
    match err {
        EntityError::Dependency(DependencyError::CyclicDependency { components }) => {
            assert_eq!(components, vec![a, b]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(entity.state(), EntityState::Init);
}

#[test]
fn test_incompatible_components_block_activation() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    let rigid = entity
        .create_component(Probe::new("rigid", &log).provides(PHYSICS))
        .unwrap();
    let kinematic = entity
        .create_component(Probe::new("kinematic", &log).incompatible_with(PHYSICS))
        .unwrap();
    entity.init().unwrap();

    match entity.activate().unwrap_err() {
        EntityError::Dependency(DependencyError::Incompatible(found)) => {
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].provider, rigid);
            assert_eq!(found[0].rejecter, kinematic);
            assert_eq!(found[0].services, vec![PHYSICS]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_failed_activation_keeps_activated_prefix() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    entity
        .create_component(Probe::new("transform", &log).provides(TRANSFORM))
        .unwrap();
    let broken = entity
        .create_component(Probe::new("renderer", &log).requires(TRANSFORM).failing())
        .unwrap();
    entity
        .create_component(Probe::new("audio", &log))
        .unwrap();
    entity.init().unwrap();
    log.lock().unwrap().clear();

    match entity.activate().unwrap_err() {
        EntityError::ActivationFailed { component, .. } => assert_eq!(component, broken),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(entity.state(), EntityState::Active);
    assert_eq!(calls(&log), vec!["transform.activate"]);

    entity.deactivate().unwrap();
    assert_eq!(
        calls(&log),
        vec!["transform.activate", "transform.deactivate"],
        "only the activated prefix is torn down"
    );
}

#[test]
fn test_swap_components_keeps_id_and_position() {
    let log = CallLog::default();
    let mut entity = entity_with_id(5);
    let first = entity.create_component(Marker(1)).unwrap();
    let second = entity.create_component(Marker(2)).unwrap();

    let old = entity
        .swap_components(first, Box::new(Probe::new("new", &log)))
        .unwrap();
    assert_eq!(old.as_any().downcast_ref::<Marker>().map(|m| m.0), Some(1));

    let ids: Vec<_> = entity.components().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(entity
        .component(first)
        .and_then(|c| c.as_any().downcast_ref::<Probe>())
        .is_some());

    let Err(rejected) = entity.swap_components(ComponentId::from_raw(99), Box::new(Marker(3)))
    else {
        panic!("swapping an unknown component must fail");
    };
    assert!(matches!(rejected.error, EntityError::ComponentNotFound(_)));
}

#[test]
fn test_find_components_by_type() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    entity.create_component(Marker(1)).unwrap();
    entity.create_component(Probe::new("p", &log)).unwrap();
    entity.create_component(Marker(2)).unwrap();

    let markers: Vec<u32> = entity.find_components::<Marker>().iter().map(|m| m.0).collect();
    assert_eq!(markers, vec![1, 2]);
    assert_eq!(entity.find_component::<Marker>().map(|m| m.0), Some(1));

    entity.find_component_mut::<Marker>().unwrap().0 = 10;
    assert_eq!(entity.find_component::<Marker>().map(|m| m.0), Some(10));
}

#[test]
fn test_is_component_ready_to_add_reports_blockers() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    let rigid = entity
        .create_component(Probe::new("rigid", &log).provides(PHYSICS))
        .unwrap();

    let renderer = Probe::new("renderer", &log).requires(TRANSFORM);
    let report = entity.is_component_ready_to_add(&renderer);
    assert_eq!(report.missing_services, vec![TRANSFORM]);
    assert!(!report.is_ready());

    let kinematic = Probe::new("kinematic", &log).incompatible_with(PHYSICS);
    let report = entity.is_component_ready_to_add(&kinematic);
    assert_eq!(report.incompatible_components, vec![rigid]);

    let plain = Marker(0);
    assert!(entity.is_component_ready_to_add(&plain).is_ready());
}

#[test]
fn test_dropping_active_entity_deactivates_components() {
    let log = CallLog::default();
    let mut entity = entity_with_id(1);
    entity
        .create_component(Probe::new("a", &log).provides(TRANSFORM))
        .unwrap();
    entity
        .create_component(Probe::new("b", &log).requires(TRANSFORM))
        .unwrap();
    entity.init().unwrap();
    entity.activate().unwrap();
    log.lock().unwrap().clear();

    entity.destroy();
    assert_eq!(calls(&log), vec!["b.deactivate", "a.deactivate"]);
}
