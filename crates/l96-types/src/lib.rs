// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, run configuration, and error hierarchy for the
//! Lorenz-96 GAN kernel: the truth-run integrator and the windowing
//! pipeline that feeds the GAN trainer.

pub mod config;
pub mod error;
pub mod layout;

pub use config::{
    DiscriminatorShape, Downsample, GanConfig, GeneratorShape, LorenzParams, NetworkStructure,
    OutputMode, RunConfig,
};
pub use error::{L96Error, L96Result};
pub use layout::{ring_index, Layout};
