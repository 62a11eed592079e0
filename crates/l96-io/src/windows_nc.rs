// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Window Set netCDF Output
// ─────────────────────────────────────────────────────────────────────
//! Window set ⇄ netCDF-4 file mapping.
//!
//! Dimensions `window`, `cond_len`, `num_outputs`; variables
//! `slow_index(window)`, `anchor(window)`, `step(window)`, `time(window)`,
//! `cond(window, cond_len)` and `target(window, num_outputs)`. An empty
//! set keeps `window` as an unlimited dimension with no records.

use std::path::Path;

use l96_data::{TargetChannel, WindowSet};
use l96_types::L96Result;

use crate::atomic::{stage_path, StagedFile};
use crate::nc::{add_dim, open, put_f64, put_u64, write_error, Reader};

fn to_u64(values: &[usize]) -> Vec<u64> {
    values.iter().map(|&v| v as u64).collect()
}

fn define(file: &mut netcdf::FileMut, set: &WindowSet) -> Result<(), netcdf::Error> {
    add_dim(file, "window", set.len())?;
    file.add_dimension("cond_len", set.cond_len)?;
    file.add_dimension("num_outputs", set.target_len)?;

    file.add_attribute("title", "Lorenz-96 GAN training windows")?;
    file.add_attribute("target", set.target.name())?;
    if let TargetChannel::Fast { sub_index } = set.target {
        file.add_attribute("target_sub_index", sub_index as u64)?;
    }

    let window = ["window"];
    put_u64(
        file,
        "slow_index",
        &window,
        Some("slow variable of the window"),
        &to_u64(&set.slow_index),
    )?;
    put_u64(
        file,
        "anchor",
        &window,
        Some("retained trajectory index of the anchor"),
        &to_u64(&set.anchor),
    )?;
    put_u64(file, "step", &window, Some("integration step of the anchor"), &set.step)?;
    put_f64(file, "time", &window, Some("model time of the anchor"), &set.time)?;
    put_f64(
        file,
        "cond",
        &["window", "cond_len"],
        Some("slow values X_a, X_a-1, ..."),
        &set.conditioning,
    )?;
    put_f64(file, "target", &["window", "num_outputs"], Some("target values"), &set.targets)?;
    Ok(())
}

/// Write `set` next to `dest` without touching `dest`.
pub fn stage_windows_nc(dest: &Path, set: &WindowSet) -> L96Result<StagedFile> {
    stage_path(dest, |tmp| {
        let mut file = netcdf::create(tmp).map_err(|e| write_error(dest, e))?;
        define(&mut file, set).map_err(|e| write_error(dest, e))
    })
}

/// Atomically write `set` as netCDF to `path`.
pub fn write_windows_nc(path: &Path, set: &WindowSet) -> L96Result<()> {
    stage_windows_nc(path, set)?.commit()?;
    log::info!("wrote {} windows to {}", set.len(), path.display());
    Ok(())
}

fn to_usize(r: &Reader<'_>, name: &str) -> L96Result<Vec<usize>> {
    r.u64_values(name)?
        .into_iter()
        .map(|v| {
            usize::try_from(v).map_err(|_| r.format_error(format!("{name} value {v} out of range")))
        })
        .collect()
}

/// Read a window set written by [`write_windows_nc`].
pub fn read_windows_nc(path: &Path) -> L96Result<WindowSet> {
    let file = open(path)?;
    let r = Reader { path, file: &file };
    let target = match r.str_attribute("target")?.as_str() {
        "slow" => TargetChannel::Slow,
        "fast_mean" => TargetChannel::FastMean,
        "fast_block" => TargetChannel::FastBlock,
        "fast" => TargetChannel::Fast {
            sub_index: r.usize_attribute("target_sub_index")?,
        },
        other => return Err(r.format_error(format!("unknown target channel {other:?}"))),
    };
    let len = r.dim_len("window")?;
    let mut set = WindowSet {
        cond_len: r.dim_len("cond_len")?,
        target_len: r.dim_len("num_outputs")?,
        target,
        slow_index: Vec::new(),
        anchor: Vec::new(),
        step: Vec::new(),
        time: Vec::new(),
        conditioning: Vec::new(),
        targets: Vec::new(),
    };
    // An empty set has no records to read.
    if len > 0 {
        set.slow_index = to_usize(&r, "slow_index")?;
        set.anchor = to_usize(&r, "anchor")?;
        set.step = r.u64_values("step")?;
        set.time = r.f64_values("time")?;
        set.conditioning = r.f64_values("cond")?;
        set.targets = r.f64_values("target")?;
    }
    let consistent = set.anchor.len() == len
        && set.conditioning.len() == len * set.cond_len
        && set.targets.len() == len * set.target_len;
    if !consistent {
        return Err(r.format_error(format!("window arrays do not match {len} windows")));
    }
    Ok(set)
}
