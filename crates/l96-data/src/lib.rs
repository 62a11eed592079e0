// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Trajectory Data
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! From raw integration output to training tensors.
//!
//! Architecture:
//!   - TrajectoryStore: append-only history, burn-in + stride retention
//!   - Trajectory: immutable, time-major retained history
//!   - WindowPlan: index-based (conditioning, target) window sequence
//!   - WindowSet: every window of a run, flattened for export
//!   - LaggedTable: flat per-example table for the GAN trainer
//!   - TableScaling: per-column mean/std of the table

pub mod scaling;
pub mod store;
pub mod table;
pub mod windows;

pub use scaling::{ChannelScaling, TableScaling};
pub use store::{Retention, Trajectory, TrajectoryStore};
pub use table::{lag_columns, LaggedTable, TableSpec};
pub use windows::{TargetChannel, WindowPlan, WindowSample, WindowSet, WindowSpec};
