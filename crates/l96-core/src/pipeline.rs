// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Run Pipeline
// ─────────────────────────────────────────────────────────────────────
//! validate → integrate → finalize → export → publish.
//!
//! Every output file is staged next to its destination first and the
//! group is committed with [`commit_all`], so a failed run leaves the
//! previous outputs untouched, including a failure between two renames.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use l96_data::{
    LaggedTable, TableScaling, TableSpec, TargetChannel, Trajectory, WindowPlan, WindowSet,
    WindowSpec,
};
use l96_io::{
    commit_all, stage, stage_trajectory_nc, stage_windows_nc, write_scaling_csv, write_table_csv,
    write_trajectory_csv, write_windows_csv, StagedFile,
};
use l96_physics::InitialCondition;
use l96_types::{GanConfig, L96Error, L96Result, OutputMode, RunConfig};

use crate::observer::ProgressObserver;
use crate::simulation::Simulation;

/// Target channel matching the GAN output mode: the `J` fast values of
/// the anchor's block in sample mode, their mean in mean mode.
pub fn target_channel(gan: &GanConfig) -> TargetChannel {
    match gan.output {
        OutputMode::Sample => TargetChannel::FastBlock,
        OutputMode::Mean => TargetChannel::FastMean,
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub trajectory: Trajectory,
    /// Windows of every `slow_stride`-th slow variable.
    pub windows: WindowSet,
    pub table: LaggedTable,
    /// Scaling of the table's X and Y blocks.
    pub scaling: TableScaling,
    /// Destinations written, in publish order.
    pub published: Vec<PathBuf>,
}

impl RunOutput {
    /// Window plan over the trajectory for one slow variable.
    pub fn window_plan(&self, gan: &GanConfig, slow_index: usize) -> L96Result<WindowPlan<'_>> {
        WindowPlan::new(
            &self.trajectory,
            WindowSpec::from_gan(gan, slow_index, target_channel(gan)),
        )
    }
}

/// Configured end-to-end run.
pub struct Pipeline {
    config: RunConfig,
    initial: InitialCondition,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl Pipeline {
    /// Validates the whole configuration eagerly.
    pub fn new(config: RunConfig) -> L96Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            initial: InitialCondition::default(),
            observer: None,
        })
    }

    /// Load and validate a JSON run configuration.
    pub fn from_json_file(path: &Path) -> L96Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| L96Error::io(path, e))?;
        Self::new(RunConfig::from_json(&text)?)
    }

    pub fn with_initial(mut self, initial: InitialCondition) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn simulation(&self) -> L96Result<Simulation> {
        let mut sim = Simulation::new(self.config.lorenz.clone())?.with_initial(self.initial.clone());
        if let Some(obs) = &self.observer {
            sim = sim.with_observer(Arc::clone(obs));
        }
        Ok(sim)
    }

    /// Integrate and build the in-memory products without writing files.
    pub fn compute(&self) -> L96Result<RunOutput> {
        let gan = &self.config.gan;
        let trajectory = self.simulation()?.run()?;

        let windows = WindowSet::collect(&trajectory, gan, target_channel(gan))?;
        log::info!(
            "{} windows (C={}, W={}, t_skip={}, slow_stride={})",
            windows.len(),
            gan.num_cond_inputs(),
            gan.num_outputs(),
            gan.t_skip,
            gan.slow_stride
        );

        let table = LaggedTable::build(&trajectory, &TableSpec::from_gan(gan))?;
        let scaling = table.scaling();
        log::info!("lagged table: {} rows × {} columns", table.len(), table.header().len());

        Ok(RunOutput {
            trajectory,
            windows,
            table,
            scaling,
            published: Vec::new(),
        })
    }

    /// Full run: compute, then publish every configured output.
    pub fn run(&self) -> L96Result<RunOutput> {
        let mut out = self.compute()?;
        out.published = self.publish(&out)?;
        Ok(out)
    }

    /// Stage all outputs, then commit them as one group.
    ///
    /// Order: trajectory netCDF, trajectory CSV, the optional table and
    /// window files, then the X and Y scaling values under `gan_path`.
    pub fn publish(&self, out: &RunOutput) -> L96Result<Vec<PathBuf>> {
        let cfg = &self.config;
        let mut staged: Vec<StagedFile> = Vec::new();

        ensure_parent(&cfg.output_nc_file)?;
        staged.push(stage_trajectory_nc(&cfg.output_nc_file, &out.trajectory, Some(&cfg.lorenz))?);
        staged.push(stage_in(&cfg.output_csv_file, |w| {
            write_trajectory_csv(w, &out.trajectory)
        })?);
        if let Some(path) = &cfg.output_table_file {
            staged.push(stage_in(path, |w| write_table_csv(w, &out.table))?);
        }
        if let Some(path) = &cfg.output_windows_nc_file {
            ensure_parent(path)?;
            staged.push(stage_windows_nc(path, &out.windows)?);
        }
        if let Some(path) = &cfg.output_windows_csv_file {
            staged.push(stage_in(path, |w| write_windows_csv(w, &out.windows))?);
        }
        let (x_path, y_path) = cfg.gan.scaling_paths();
        staged.push(stage_in(&x_path, |w| write_scaling_csv(w, &out.scaling.conditioning))?);
        staged.push(stage_in(&y_path, |w| write_scaling_csv(w, &out.scaling.target))?);

        let published = commit_all(staged)?;
        for path in &published {
            log::info!("published {}", path.display());
        }
        Ok(published)
    }
}

fn ensure_parent(dest: &Path) -> L96Result<()> {
    if let Some(dir) = dest.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| L96Error::io(dir, e))?;
    }
    Ok(())
}

/// Create the destination directory if needed, then stage.
fn stage_in<F>(dest: &Path, write: F) -> L96Result<StagedFile>
where
    F: FnOnce(&mut dyn std::io::Write) -> std::io::Result<()>,
{
    ensure_parent(dest)?;
    stage(dest, write)
}
