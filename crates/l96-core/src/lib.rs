// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Truth-run driver and end-to-end pipeline for the Lorenz-96 GAN
//! kernel: integrate the two-scale system, retain the post-burn-in
//! trajectory, build training windows and tables, publish outputs.
//!
//! # Invariants
//!
//! 1. **Validation is eager**: every configuration error surfaces from
//!    `Pipeline::new` / `Simulation::new`, before any integration step.
//!
//! 2. **Divergence is fatal**: the first non-finite or out-of-bound state
//!    aborts the run with `L96Error::Unstable` naming its step. Values are
//!    never clamped.
//!
//! 3. **All or nothing on disk**: outputs are staged beside their
//!    destinations and renamed into place only after every one of them
//!    was written. A failed rename restores the whole group.
//!
//! 4. **Determinism**: identical parameters and initial condition give
//!    bit-identical trajectories, whether run alone or inside an ensemble.

pub mod ensemble;
pub mod observer;
pub mod pipeline;
pub mod simulation;

pub use ensemble::{
    forcing_sweep, perturbed_members, regime_members, run_ensemble, EnsembleMember,
};
pub use observer::{ExternalProgress, LogProgress, Progress, ProgressHistory, ProgressObserver};
pub use pipeline::{target_channel, Pipeline, RunOutput};
pub use simulation::Simulation;
