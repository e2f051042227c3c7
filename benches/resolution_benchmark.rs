//! Resolution benchmarks
//!
//! Measures each resolution phase and the present fallback against a registry
//! with a realistic number of providers per time state.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use event_values::{
    ConverterRegistry, EventValueRegistry, JsonOccurrence, TimeState, TypeHierarchy, TypeName,
    TypeOracle, Value, accessor,
};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

const OCCURRENCE_KINDS: usize = 50;

fn build_registry() -> EventValueRegistry {
    let mut types = TypeHierarchy::new()
        .with_type("Event", ["Object"])
        .with_type("Move", ["Event"])
        .with_type("Teleport", ["Move"])
        .with_type("Entity", ["Object"])
        .with_type("Player", ["Entity"])
        .with_type("Location", ["Object"])
        .with_type("World", ["Object"]);
    for i in 0..OCCURRENCE_KINDS {
        types.declare(format!("Event{i}"), ["Event"]);
    }
    let oracle: Arc<dyn TypeOracle> = Arc::new(types);

    let mut converters = ConverterRegistry::new(Arc::clone(&oracle));
    converters.register_fn("Location", "World", |value| {
        Some(Value::new("World", value.as_json()?.get("world")?.clone()))
    });

    let mut registry = EventValueRegistry::with_converters(oracle, Arc::new(converters));
    for i in 0..OCCURRENCE_KINDS {
        for time in TimeState::ALL {
            registry
                .register_value_at(
                    format!("Event{i}"),
                    "Location",
                    accessor(|_| None),
                    time,
                )
                .expect("register location provider");
        }
    }
    registry
        .register_fn("Move", "Location", |occurrence| {
            let json = occurrence.downcast_ref::<JsonOccurrence>()?;
            Some(Value::new("Location", json.field("to")?.clone()))
        })
        .expect("register move provider");
    registry
        .register_fn("Teleport", "Player", |_| Some(Value::new("Player", ())))
        .expect("register teleport provider");
    registry.close_registrations();
    registry
}

fn bench_phases(c: &mut Criterion) {
    let registry = build_registry();
    let queries: &[(&str, &str, &str)] = &[
        ("exact", "Move", "Location"),
        ("covariant", "Teleport", "Entity"),
        ("narrowed", "Move", "Player"),
        ("converted", "Move", "World"),
        ("absent", "Move", "Entity"),
    ];

    let mut group = c.benchmark_group("resolve");
    for (name, occurrence, value) in queries {
        let occurrence = TypeName::new(occurrence);
        let value = TypeName::new(value);
        group.bench_with_input(BenchmarkId::new("present", name), name, |b, _| {
            b.iter(|| {
                black_box(registry.resolve(
                    black_box(&occurrence),
                    black_box(&value),
                    TimeState::Present,
                ))
            })
        });
    }
    group.finish();
}

fn bench_fallback_and_get(c: &mut Criterion) {
    let registry = build_registry();
    let occurrence = JsonOccurrence::new("Move", json!({"to": {"world": "nether"}}));
    let world = TypeName::new("World");
    let move_kind = TypeName::new("Move");
    let location = TypeName::new("Location");

    c.bench_function("resolve_future_fallback", |b| {
        b.iter(|| {
            black_box(registry.resolve(
                black_box(&move_kind),
                black_box(&location),
                TimeState::Future,
            ))
        })
    });

    c.bench_function("get_value_converted", |b| {
        b.iter(|| black_box(registry.get_value(&occurrence, &world, TimeState::Present)))
    });
}

criterion_group!(benches, bench_phases, bench_fallback_and_get);
criterion_main!(benches);
