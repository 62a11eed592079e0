// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Physics Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Two-scale Lorenz-96 physics: state layout, vector field, and the
//! fixed-step RK4 integrator with divergence detection.

pub mod model;
pub mod params;
pub mod rk4;
pub mod state;

pub use l96_types::{ring_index, Layout};
pub use model::{TwoScaleL96, VectorField};
pub use params::{steps_for_days, Regime};
pub use rk4::{rk4_step, Integrator, Rk4Scratch};
pub use state::{InitialCondition, State};
