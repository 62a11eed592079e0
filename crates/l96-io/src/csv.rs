// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — CSV Output
// ─────────────────────────────────────────────────────────────────────
//! Comma-separated exports: the combined trajectory, the lagged training
//! table, the window set and the per-block scaling values.
//!
//! Floats use Rust's shortest round-trip formatting, so parsing a cell
//! back yields the identical `f64`.

use std::io::Write;
use std::path::Path;

use l96_data::{ChannelScaling, LaggedTable, Trajectory, WindowSet};
use l96_types::{L96Result, Layout};

use crate::atomic::publish;

/// `step, time, X_0 … X_{K-1}, Y_0_0 … Y_{K-1}_{J-1}`.
pub fn trajectory_header(layout: Layout) -> Vec<String> {
    let mut h = Vec::with_capacity(2 + layout.state_len());
    h.push("step".to_string());
    h.push("time".to_string());
    h.extend((0..layout.k).map(|i| format!("X_{i}")));
    for i in 0..layout.k {
        h.extend((0..layout.j).map(|j| format!("Y_{i}_{j}")));
    }
    h
}

fn write_cells<W: Write + ?Sized>(w: &mut W, cells: &[f64]) -> std::io::Result<()> {
    for v in cells {
        write!(w, ",{v}")?;
    }
    Ok(())
}

/// One row per retained state.
pub fn write_trajectory_csv<W: Write + ?Sized>(w: &mut W, traj: &Trajectory) -> std::io::Result<()> {
    writeln!(w, "{}", trajectory_header(traj.layout()).join(","))?;
    for n in 0..traj.len() {
        write!(w, "{},{}", traj.step(n), traj.time(n))?;
        write_cells(w, traj.slow_at(n))?;
        write_cells(w, traj.fast_at(n))?;
        writeln!(w)?;
    }
    Ok(())
}

pub fn write_table_csv<W: Write + ?Sized>(w: &mut W, table: &LaggedTable) -> std::io::Result<()> {
    writeln!(w, "{}", table.header().join(","))?;
    for row in 0..table.len() {
        write!(w, "{},{},{}", table.x_index(row), table.step(row), table.time(row))?;
        write_cells(w, table.cond_row(row))?;
        write_cells(w, table.target_row(row))?;
        writeln!(w)?;
    }
    Ok(())
}

/// One row per window, in set order.
pub fn write_windows_csv<W: Write + ?Sized>(w: &mut W, set: &WindowSet) -> std::io::Result<()> {
    writeln!(w, "{}", set.header().join(","))?;
    for n in 0..set.len() {
        write!(w, "{},{},{},{}", set.slow_index[n], set.anchor[n], set.step[n], set.time[n])?;
        write_cells(w, set.cond_row(n))?;
        write_cells(w, set.target_row(n))?;
        writeln!(w)?;
    }
    Ok(())
}

/// `Channel,mean,std` with the block's single channel `0`.
pub fn write_scaling_csv<W: Write + ?Sized>(w: &mut W, scaling: &ChannelScaling) -> std::io::Result<()> {
    writeln!(w, "Channel,mean,std")?;
    writeln!(w, "0,{},{}", scaling.mean, scaling.std)
}

/// Atomically publish the trajectory CSV.
pub fn publish_trajectory_csv(path: &Path, traj: &Trajectory) -> L96Result<()> {
    publish(path, |w| write_trajectory_csv(w, traj))?;
    log::info!("wrote {} trajectory rows to {}", traj.len(), path.display());
    Ok(())
}

pub fn publish_table_csv(path: &Path, table: &LaggedTable) -> L96Result<()> {
    publish(path, |w| write_table_csv(w, table))?;
    log::info!("wrote {} table rows to {}", table.len(), path.display());
    Ok(())
}

pub fn publish_windows_csv(path: &Path, set: &WindowSet) -> L96Result<()> {
    publish(path, |w| write_windows_csv(w, set))?;
    log::info!("wrote {} windows to {}", set.len(), path.display());
    Ok(())
}

pub fn publish_scaling_csv(path: &Path, scaling: &ChannelScaling) -> L96Result<()> {
    publish(path, |w| write_scaling_csv(w, scaling))?;
    log::info!("wrote scaling values to {}", path.display());
    Ok(())
}
