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

use ember_core::{EntityId, ServiceTag};
use ember_data::ecs::{Component, Entity, EntityError, EntityState};
use std::any::Any;
use std::sync::{Arc, Mutex};

const TRANSFORM_SERVICE: ServiceTag = ServiceTag::from_name("transform");
const RENDER_SERVICE: ServiceTag = ServiceTag::from_name("render");

type Journal = Arc<Mutex<Vec<&'static str>>>;

struct Transform {
    journal: Journal,
}

impl Component for Transform {
    fn provided_services(&self) -> Vec<ServiceTag> {
        vec![TRANSFORM_SERVICE]
    }

    fn activate(&mut self) -> Result<(), ember_data::ecs::ActivationError> {
        self.journal.lock().unwrap().push("Transform.activate");
        Ok(())
    }

    fn deactivate(&mut self) {
        self.journal.lock().unwrap().push("Transform.deactivate");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Renderer {
    journal: Journal,
}

impl Component for Renderer {
    fn provided_services(&self) -> Vec<ServiceTag> {
        vec![RENDER_SERVICE]
    }

    fn required_services(&self) -> Vec<ServiceTag> {
        vec![TRANSFORM_SERVICE]
    }

    fn activate(&mut self) -> Result<(), ember_data::ecs::ActivationError> {
        self.journal.lock().unwrap().push("Renderer.activate");
        Ok(())
    }

    fn deactivate(&mut self) {
        self.journal.lock().unwrap().push("Renderer.deactivate");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn run_lifecycle(renderer_first: bool) -> Vec<&'static str> {
    let journal = Journal::default();
    let mut entity = Entity::new("camera_rig");

    let transform = Transform {
        journal: journal.clone(),
    };
    let renderer = Renderer {
        journal: journal.clone(),
    };
    if renderer_first {
        entity.create_component(renderer).unwrap();
        entity.create_component(transform).unwrap();
    } else {
        entity.create_component(transform).unwrap();
        entity.create_component(renderer).unwrap();
    }

    entity.init().unwrap();
    entity.activate().unwrap();
    assert_eq!(entity.state(), EntityState::Active);
    entity.deactivate().unwrap();
    assert_eq!(entity.state(), EntityState::Init);

    let calls = journal.lock().unwrap().clone();
    calls
}

#[test]
fn test_transform_activates_before_renderer_in_either_insertion_order() {
    let expected = vec![
        "Transform.activate",
        "Renderer.activate",
        "Renderer.deactivate",
        "Transform.deactivate",
    ];

    assert_eq!(run_lifecycle(false), expected);
    assert_eq!(run_lifecycle(true), expected);
}

#[test]
fn test_entity_can_cycle_activation_repeatedly() {
    let journal = Journal::default();
    let mut entity = Entity::with_id(EntityId::from_raw(11), "cycler");
    entity
        .create_component(Renderer {
            journal: journal.clone(),
        })
        .unwrap();
    entity
        .create_component(Transform {
            journal: journal.clone(),
        })
        .unwrap();
    entity.init().unwrap();

    for _ in 0..3 {
        entity.activate().unwrap();
        entity.deactivate().unwrap();
    }

    assert_eq!(journal.lock().unwrap().len(), 12);
}

#[test]
fn test_lifecycle_calls_out_of_order_are_refused() {
    let mut entity = Entity::new("strict");

    assert!(matches!(
        entity.activate(),
        Err(EntityError::InvalidState {
            operation: "activate",
            state: EntityState::Constructed
        })
    ));
    assert!(matches!(
        entity.deactivate(),
        Err(EntityError::InvalidState {
            operation: "deactivate",
            ..
        })
    ));

    entity.init().unwrap();
    entity.activate().unwrap();
    assert!(entity.activate().is_err());
    assert!(entity.init().is_err());
    assert_eq!(entity.state(), EntityState::Active);
}

#[test]
fn test_removing_provider_after_deactivation_breaks_dependencies() {
    let journal = Journal::default();
    let mut entity = Entity::new("rig");
    let transform = entity
        .create_component(Transform {
            journal: journal.clone(),
        })
        .unwrap();
    entity
        .create_component(Renderer {
            journal: journal.clone(),
        })
        .unwrap();
    entity.init().unwrap();
    entity.activate().unwrap();
    entity.deactivate().unwrap();

    let removed = entity.remove_component(transform).unwrap();
    assert!(removed.as_any().downcast_ref::<Transform>().is_some());

    let err = entity.activate().unwrap_err();
    assert!(matches!(err, EntityError::Dependency(_)));
    assert_eq!(entity.state(), EntityState::Init);
}
