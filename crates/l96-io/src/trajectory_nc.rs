// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Trajectory netCDF Output
// ─────────────────────────────────────────────────────────────────────
//! Trajectory ⇄ netCDF-4 file mapping.
//!
//! Dimensions `time`, `slow_index`, `fast_index`; variables
//! `step(time)`, `time(time)`, the index coordinates, `X(time, slow_index)`
//! and `Y(time, slow_index, fast_index)`. With J = 0, `fast_index` is an
//! unlimited dimension holding no records and `Y` is omitted, so every
//! file carries the same dimensions. Values are stored as doubles, so a
//! write/read cycle is bit-exact.

use std::path::Path;

use l96_data::Trajectory;
use l96_types::{L96Error, L96Result, Layout, LorenzParams};

use crate::atomic::{stage_path, StagedFile};
use crate::nc::{add_dim, open, put_f64, put_u64, write_error, Reader};

const TITLE: &str = "Two-scale Lorenz-96 truth trajectory";

fn define(
    file: &mut netcdf::FileMut,
    traj: &Trajectory,
    params: Option<&LorenzParams>,
) -> Result<(), netcdf::Error> {
    let layout = traj.layout();
    file.add_dimension("time", traj.len())?;
    file.add_dimension("slow_index", layout.k)?;
    add_dim(file, "fast_index", layout.j)?;

    file.add_attribute("title", TITLE)?;
    file.add_attribute("K", layout.k as u64)?;
    file.add_attribute("J", layout.j as u64)?;
    file.add_attribute("time_step", traj.dt())?;
    if let Some(p) = params {
        file.add_attribute("h", p.h)?;
        file.add_attribute("b", p.b)?;
        file.add_attribute("c", p.c)?;
        file.add_attribute("F", p.f)?;
        file.add_attribute("num_steps", p.num_steps)?;
        file.add_attribute("burn_in", p.burn_in)?;
        file.add_attribute("skip", p.skip)?;
    }

    let times: Vec<f64> = traj.times().collect();
    let slow_index: Vec<u64> = (0..layout.k as u64).collect();
    let fast_index: Vec<u64> = (0..layout.j as u64).collect();
    put_u64(file, "step", &["time"], Some("integration step index"), traj.steps())?;
    put_f64(file, "time", &["time"], Some("model time (step * time_step)"), &times)?;
    put_u64(file, "slow_index", &["slow_index"], None, &slow_index)?;
    put_u64(file, "fast_index", &["fast_index"], None, &fast_index)?;
    put_f64(file, "X", &["time", "slow_index"], Some("slow variables"), traj.slow_values())?;
    if layout.j > 0 {
        put_f64(
            file,
            "Y",
            &["time", "slow_index", "fast_index"],
            Some("fast variables"),
            traj.fast_values(),
        )?;
    }
    Ok(())
}

/// Write `traj` next to `dest` without touching `dest`.
pub fn stage_trajectory_nc(
    dest: &Path,
    traj: &Trajectory,
    params: Option<&LorenzParams>,
) -> L96Result<StagedFile> {
    if traj.is_empty() {
        return Err(L96Error::Validation(
            "cannot write an empty trajectory to netCDF".to_string(),
        ));
    }
    stage_path(dest, |tmp| {
        let mut file = netcdf::create(tmp).map_err(|e| write_error(dest, e))?;
        define(&mut file, traj, params).map_err(|e| write_error(dest, e))
    })
}

/// Atomically write `traj` as netCDF to `path`.
pub fn write_trajectory_nc(
    path: &Path,
    traj: &Trajectory,
    params: Option<&LorenzParams>,
) -> L96Result<()> {
    stage_trajectory_nc(path, traj, params)?.commit()?;
    log::info!(
        "wrote {} states (K={}, J={}) to {}",
        traj.len(),
        traj.layout().k,
        traj.layout().j,
        path.display()
    );
    Ok(())
}

/// Read a trajectory written by [`write_trajectory_nc`].
pub fn read_trajectory_nc(path: &Path) -> L96Result<Trajectory> {
    let file = open(path)?;
    let r = Reader { path, file: &file };
    let k = r.usize_attribute("K")?;
    let j = r.usize_attribute("J")?;
    let dt = r.f64_attribute("time_step")?;
    if r.dim_len("fast_index")? != j {
        return Err(r.format_error(format!("fast_index does not match J = {j}")));
    }

    let steps = r.u64_values("step")?;
    let slow = r.f64_values("X")?;
    let fast = if j > 0 { r.f64_values("Y")? } else { Vec::new() };
    Trajectory::from_parts(Layout::new(k, j), dt, steps, slow, fast)
        .map_err(|e| r.format_error(format!("inconsistent trajectory dataset: {e}")))
}
