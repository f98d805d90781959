//! Historian throughput benchmarks.
//!
//! The engine appends once per tick and trend readers query tails
//! concurrently; both paths must stay far below the tick budget.

use criterion::{Criterion, criterion_group, criterion_main};

use tanksim_core::config::DisturbanceKind;
use tanksim_core::snapshot::{ControllerSnapshot, Snapshot};
use tanksim_engine::historian::{DEFAULT_CAPACITY, Historian};

fn snapshot(t: f64) -> Snapshot {
    Snapshot {
        t,
        level: 2.5,
        inlet_flow: 1.0,
        outlet_flow: 1.0,
        valve_position: 0.5,
        controllers: vec![ControllerSnapshot {
            setpoint: 2.5,
            error: 0.0,
            output: 0.5,
        }],
        inlet_mode: DisturbanceKind::Constant,
    }
}

fn bench_append_at_capacity(c: &mut Criterion) {
    let mut historian = Historian::new(DEFAULT_CAPACITY);
    for n in 0..DEFAULT_CAPACITY {
        historian.append(snapshot(n as f64));
    }
    let mut t = DEFAULT_CAPACITY as f64;

    c.bench_function("historian_append_evicting", |b| {
        b.iter(|| {
            t += 1.0;
            historian.append(snapshot(t));
            std::hint::black_box(historian.len())
        })
    });
}

fn bench_range_query(c: &mut Criterion) {
    let mut historian = Historian::new(DEFAULT_CAPACITY);
    for n in 0..DEFAULT_CAPACITY {
        historian.append(snapshot(n as f64));
    }

    c.bench_function("historian_range_5min", |b| {
        b.iter(|| std::hint::black_box(historian.range(300.0).len()))
    });
}

criterion_group!(benches, bench_append_at_capacity, bench_range_query);
criterion_main!(benches);
