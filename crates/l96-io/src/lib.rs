// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Output Writers
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Persisting trajectories, window sets and training tables.
//!
//! netCDF files go through the `netcdf` crate, CSV is written directly.
//! Every file is published atomically: a destination holds either its
//! previous contents or the complete new file, and a group committed with
//! [`commit_all`] lands together or not at all.

pub mod atomic;
pub mod csv;
mod nc;
pub mod trajectory_nc;
pub mod windows_nc;

pub use atomic::{commit_all, publish, stage, stage_path, StagedFile};
pub use csv::{
    publish_scaling_csv, publish_table_csv, publish_trajectory_csv, publish_windows_csv,
    trajectory_header, write_scaling_csv, write_table_csv, write_trajectory_csv,
    write_windows_csv,
};
pub use trajectory_nc::{read_trajectory_nc, stage_trajectory_nc, write_trajectory_nc};
pub use windows_nc::{read_windows_nc, stage_windows_nc, write_windows_nc};
