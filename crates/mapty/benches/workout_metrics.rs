use std::hint::black_box;

use chrono::Local;
use criterion::{Criterion, criterion_group, criterion_main};
use mapty::domains::{WorkoutFactory, WorkoutType, geo};
use mapty::store::{MemoryPersistence, WorkoutStore};
use mapty_client::Coordinate;

const HOME: Coordinate = Coordinate::new(-122.42, 37.77);
const CLICK: Coordinate = Coordinate::new(-122.41, 37.78);

fn bench_distance(c: &mut Criterion) {
    c.bench_function("distance_miles", |b| {
        b.iter(|| geo::distance_miles(black_box(HOME), black_box(CLICK)))
    });
}

fn bench_build(c: &mut Criterion) {
    let factory = WorkoutFactory::default();
    let now = Local::now();
    c.bench_function("build_running_workout", |b| {
        b.iter(|| factory.build_typed(HOME, black_box(CLICK), WorkoutType::Running, None, &now))
    });
    c.bench_function("build_cycling_workout", |b| {
        b.iter(|| factory.build_typed(HOME, black_box(CLICK), WorkoutType::Cycling, Some(42.0), &now))
    });
}

fn bench_store_add(c: &mut Criterion) {
    let factory = WorkoutFactory::default();
    let now = Local::now();
    let workouts: Vec<_> = (0..100)
        .map(|i| {
            let at = Coordinate::new(CLICK.lng + f64::from(i) * 0.001, CLICK.lat);
            let mut w = factory.build_typed(HOME, at, WorkoutType::Running, None, &now);
            w.id = mapty::WorkoutId::new(u64::from(i as u32));
            w
        })
        .collect();

    c.bench_function("store_add_100", |b| {
        b.iter(|| {
            let mut store = WorkoutStore::open(MemoryPersistence::new());
            for w in &workouts {
                store.add(w.clone()).expect("add");
            }
            store.len()
        })
    });
}

criterion_group!(benches, bench_distance, bench_build, bench_store_add);
criterion_main!(benches);
