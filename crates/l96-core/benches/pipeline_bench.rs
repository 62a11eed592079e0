// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Pipeline Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! End-to-end truth run and ensemble throughput on a reduced system.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use l96_core::{forcing_sweep, run_ensemble, Simulation};
use l96_types::LorenzParams;

fn bench_params() -> LorenzParams {
    LorenzParams {
        num_steps: 5_000,
        burn_in: 500,
        skip: 5,
        ..Default::default()
    }
}

// ── Simulation.run() ────────────────────────────────────────────────

fn bench_simulation_5k_steps(c: &mut Criterion) {
    let sim = Simulation::new(bench_params()).unwrap();
    c.bench_function("simulation_5k_steps", |b| b.iter(|| black_box(sim.run().unwrap())));
}

// ── run_ensemble() ──────────────────────────────────────────────────

fn bench_ensemble_4_members(c: &mut Criterion) {
    let members = forcing_sweep(&bench_params(), &[10.0, 18.0, 24.0, 30.0]);
    c.bench_function("ensemble_4x5k_steps", |b| {
        b.iter(|| black_box(run_ensemble(&members, None).unwrap()))
    });
}

criterion_group!(benches, bench_simulation_5k_steps, bench_ensemble_4_members);
criterion_main!(benches);
