// Copyright 2024 OctoFHIR Team
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

//! Integration tests for provider registration and value resolution

use std::sync::Arc;
use std::thread;

use event_values::{
    Accessor, EventValueError, EventValueRegistry, JsonOccurrence, ProviderRegistration,
    ResolutionPhase, TimeState, TypeHierarchy, Value, accessor,
};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use serde_json::json;

fn hierarchy() -> TypeHierarchy {
    TypeHierarchy::new()
        .with_type("Event", ["Object"])
        .with_type("Move", ["Event"])
        .with_type("Teleport", ["Move"])
        .with_type("Damage", ["Event"])
        .with_type("FatalDamage", ["Damage"])
        .with_type("Location", ["Object"])
        .with_type("Number", ["Object"])
}

fn read(field: &'static str, ty: &'static str) -> Accessor {
    accessor(move |occurrence| {
        let json = occurrence.downcast_ref::<JsonOccurrence>()?;
        Some(Value::new(ty, json.field(field)?.clone()))
    })
}

/// P1 at present, P2 at past, both Move#Location at priority 15
#[fixture]
fn movement() -> (EventValueRegistry, Accessor, Accessor) {
    let mut registry = EventValueRegistry::new(Arc::new(hierarchy()));
    let p1 = read("to", "Location");
    let p2 = read("from", "Location");
    registry
        .register_with_priority("Move", "Location", Arc::clone(&p1), TimeState::Present, 15)
        .unwrap();
    registry
        .register_with_priority("Move", "Location", Arc::clone(&p2), TimeState::Past, 15)
        .unwrap();
    registry.close_registrations();
    (registry, p1, p2)
}

#[rstest]
#[case::past_uses_past_provider(TimeState::Past, "from", TimeState::Past)]
#[case::present(TimeState::Present, "to", TimeState::Present)]
#[case::future_falls_back_to_present(TimeState::Future, "to", TimeState::Present)]
fn test_time_qualified_resolution(
    movement: (EventValueRegistry, Accessor, Accessor),
    #[case] time: TimeState,
    #[case] expected_field: &str,
    #[case] answered_by: TimeState,
) {
    let (registry, p1, p2) = movement;
    let getter = registry
        .resolve(&"Move".into(), &"Location".into(), time)
        .unwrap()
        .unwrap();

    let expected = if expected_field == "from" { &p2 } else { &p1 };
    assert!(Arc::ptr_eq(getter.provider().accessor(), expected));
    assert_eq!(getter.time(), answered_by);

    let occurrence = JsonOccurrence::new("Move", json!({"from": "a", "to": "b"}));
    let value = getter.get(&occurrence).unwrap();
    let expected_value = if expected_field == "from" { "a" } else { "b" };
    assert_eq!(value.as_json(), Some(&json!(expected_value)));
}

#[rstest]
fn test_time_states_reported(movement: (EventValueRegistry, Accessor, Accessor)) {
    let (registry, _, _) = movement;
    assert!(registry.has_time_states(&"Move".into(), &"Location".into()));
    assert!(registry.has_time_states(&"Teleport".into(), &"Location".into()));
    assert!(!registry.has_time_states(&"Damage".into(), &"Location".into()));
}

#[rstest]
fn test_resolution_is_deterministic(movement: (EventValueRegistry, Accessor, Accessor)) {
    let (registry, _, _) = movement;
    let first = registry
        .resolve(&"Teleport".into(), &"Location".into(), TimeState::Future)
        .unwrap()
        .unwrap();
    for _ in 0..10 {
        let again = registry
            .resolve(&"Teleport".into(), &"Location".into(), TimeState::Future)
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(
            again.provider().accessor(),
            first.provider().accessor()
        ));
        assert_eq!(again.phase(), first.phase());
        assert_eq!(again.time(), first.time());
    }
}

#[rstest]
#[case::exact_provider_first(0)]
#[case::exact_provider_last(40)]
fn test_exclusion_precedence(#[case] other_priority: i32) {
    let mut registry = EventValueRegistry::new(Arc::new(hierarchy()));
    registry
        .register_with_priority(
            "Event",
            "Number",
            read("amount", "Number"),
            TimeState::Present,
            other_priority,
        )
        .unwrap();
    ProviderRegistration::new("Damage", "Number", read("amount", "Number"))
        .excluding(["FatalDamage"], "cannot read amount of fatal damage")
        .register(&mut registry)
        .unwrap();

    let err = registry
        .resolve(&"FatalDamage".into(), &"Number".into(), TimeState::Present)
        .unwrap_err();
    assert!(err.is_user_facing());
    assert_eq!(err.error_code().code_str(), "EV0003");
    match err {
        EventValueError::Excluded { message, .. } => {
            assert_eq!(message, "cannot read amount of fatal damage")
        }
        other => panic!("unexpected error {other:?}"),
    }

    // the past query falls back to present and hits the same exclusion
    assert!(
        registry
            .resolve(&"FatalDamage".into(), &"Number".into(), TimeState::Past)
            .is_err()
    );

    let getter = registry
        .resolve(&"Damage".into(), &"Number".into(), TimeState::Present)
        .unwrap();
    assert!(getter.is_some());
}

#[test]
fn test_sort_invariant_and_no_duplicates() {
    let mut registry = EventValueRegistry::new(Arc::new(hierarchy()));
    let shared = read("to", "Location");
    for priority in [15, -3, 0, 27, -15, 8, 15] {
        registry
            .register_with_priority(
                "Move",
                "Location",
                Arc::clone(&shared),
                TimeState::Present,
                priority,
            )
            .unwrap();
    }
    // the second 15 is a structural duplicate
    assert_eq!(registry.providers(TimeState::Present).len(), 6);

    let ranks: Vec<u32> = registry
        .providers(TimeState::Present)
        .iter()
        .map(|p| p.priority().unsigned_abs())
        .collect();
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "{ranks:?}");
}

#[test]
fn test_unknown_combination_is_silent_absence() {
    let registry = EventValueRegistry::new(Arc::new(hierarchy()));
    for time in TimeState::ALL {
        assert!(
            registry
                .resolve(&"Move".into(), &"Number".into(), time)
                .unwrap()
                .is_none()
        );
    }
}

#[test]
fn test_narrower_provider_resolves_with_runtime_check() {
    let mut registry = EventValueRegistry::new(Arc::new(hierarchy()));
    registry
        .register_value("Teleport", "Location", read("target", "Location"))
        .unwrap();

    let getter = registry
        .resolve(&"Move".into(), &"Object".into(), TimeState::Present)
        .unwrap()
        .unwrap();
    assert_eq!(getter.phase(), ResolutionPhase::Covariant);

    let teleport = JsonOccurrence::new("Teleport", json!({"target": "spawn"}));
    let walk = JsonOccurrence::new("Move", json!({"target": "spawn"}));
    assert!(getter.get(&teleport).is_some());
    assert!(getter.get(&walk).is_none());
}

#[test]
fn test_closed_registry_is_shared_across_threads() {
    let mut registry = EventValueRegistry::new(Arc::new(hierarchy()));
    registry
        .register_value("Move", "Location", read("to", "Location"))
        .unwrap();
    registry.close_registrations();
    let registry = Arc::new(registry);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let occurrence = JsonOccurrence::new("Teleport", json!({"to": i}));
                registry
                    .get_value(&occurrence, &"Location".into(), TimeState::Present)
                    .unwrap()
                    .and_then(|v| v.as_json().cloned())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(json!(i)));
    }
}
