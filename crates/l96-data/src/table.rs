// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Lagged Training Table
// ─────────────────────────────────────────────────────────────────────
//! Flat per-example table in the layout the GAN trainer reads:
//!
//!   x_index, step, time, X_t, X_t-1, …, X_t-(C-1), Y_0 … Y_{J-1}
//!
//! (or a single `Y_mean` target column in mean mode). One row per slow
//! index `i ∈ {0, slow_stride, …} < K` and trajectory index
//! `t ∈ {C−1, C−1+t_skip, …} < L`, ordered by slow index then time.

use l96_types::{GanConfig, L96Error, L96Result, OutputMode};

use crate::scaling::TableScaling;
use crate::store::Trajectory;

/// Row selection and target layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Conditioning lags C (including lag 0).
    pub lags: usize,
    pub t_skip: usize,
    pub slow_stride: usize,
    pub output: OutputMode,
}

impl TableSpec {
    pub fn from_gan(gan: &GanConfig) -> Self {
        Self {
            lags: gan.num_cond_inputs(),
            t_skip: gan.t_skip,
            slow_stride: gan.slow_stride,
            output: gan.output,
        }
    }

    fn validate(&self) -> L96Result<()> {
        if self.lags < 1 || self.t_skip < 1 || self.slow_stride < 1 {
            return Err(L96Error::Config(format!(
                "table lags/t_skip/slow_stride must be >= 1, got {}/{}/{}",
                self.lags, self.t_skip, self.slow_stride
            )));
        }
        Ok(())
    }
}

/// Column names of the conditioning block: `X_t`, `X_t-1`, …
pub fn lag_columns(lags: usize) -> Vec<String> {
    (0..lags)
        .map(|l| {
            if l == 0 {
                "X_t".to_string()
            } else {
                format!("X_t-{l}")
            }
        })
        .collect()
}

/// Materialized lagged table.
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedTable {
    cond_columns: Vec<String>,
    target_columns: Vec<String>,
    x_index: Vec<usize>,
    steps: Vec<u64>,
    times: Vec<f64>,
    /// rows × lags
    cond: Vec<f64>,
    /// rows × target width
    target: Vec<f64>,
}

impl LaggedTable {
    /// Build the table from a finalized trajectory.
    pub fn build(traj: &Trajectory, spec: &TableSpec) -> L96Result<Self> {
        spec.validate()?;
        let layout = traj.layout();
        if layout.j == 0 {
            return Err(L96Error::Config(
                "lagged table needs J >= 1 for its fast targets".to_string(),
            ));
        }

        let cond_columns = lag_columns(spec.lags);
        let target_columns: Vec<String> = match spec.output {
            OutputMode::Sample => (0..layout.j).map(|j| format!("Y_{j}")).collect(),
            OutputMode::Mean => vec!["Y_mean".to_string()],
        };

        let mut table = Self {
            cond_columns,
            target_columns,
            x_index: Vec::new(),
            steps: Vec::new(),
            times: Vec::new(),
            cond: Vec::new(),
            target: Vec::new(),
        };

        if traj.len() < spec.lags {
            log::warn!(
                "trajectory of {} states is shorter than {} conditioning lags; lagged table is empty",
                traj.len(),
                spec.lags
            );
            return Ok(table);
        }

        let per_slow = (traj.len() - spec.lags) / spec.t_skip + 1;
        let slow_count = layout.k.div_ceil(spec.slow_stride);
        let rows = per_slow * slow_count;
        table.x_index.reserve(rows);
        table.steps.reserve(rows);
        table.times.reserve(rows);
        table.cond.reserve(rows * spec.lags);
        table.target.reserve(rows * table.target_columns.len());

        for i in (0..layout.k).step_by(spec.slow_stride) {
            for t in (spec.lags - 1..traj.len()).step_by(spec.t_skip) {
                table.x_index.push(i);
                table.steps.push(traj.step(t));
                table.times.push(traj.time(t));
                for lag in 0..spec.lags {
                    table.cond.push(traj.x(t - lag, i));
                }
                match spec.output {
                    OutputMode::Sample => table.target.extend_from_slice(traj.fast_block_at(t, i)),
                    OutputMode::Mean => table.target.push(traj.fast_block_mean(t, i)),
                }
            }
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.x_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_index.is_empty()
    }

    pub fn cond_columns(&self) -> &[String] {
        &self.cond_columns
    }

    pub fn target_columns(&self) -> &[String] {
        &self.target_columns
    }

    /// Full header: `x_index, step, time`, conditioning, target.
    pub fn header(&self) -> Vec<String> {
        let mut h = vec!["x_index".to_string(), "step".to_string(), "time".to_string()];
        h.extend(self.cond_columns.iter().cloned());
        h.extend(self.target_columns.iter().cloned());
        h
    }

    pub fn x_index(&self, row: usize) -> usize {
        self.x_index[row]
    }

    pub fn step(&self, row: usize) -> u64 {
        self.steps[row]
    }

    pub fn time(&self, row: usize) -> f64 {
        self.times[row]
    }

    pub fn cond_row(&self, row: usize) -> &[f64] {
        let w = self.cond_columns.len();
        &self.cond[row * w..(row + 1) * w]
    }

    pub fn target_row(&self, row: usize) -> &[f64] {
        let w = self.target_columns.len();
        &self.target[row * w..(row + 1) * w]
    }

    /// Conditioning block, row-major.
    pub fn cond_values(&self) -> &[f64] {
        &self.cond
    }

    /// Target block, row-major.
    pub fn target_values(&self) -> &[f64] {
        &self.target
    }

    /// Mean/std of the conditioning and target blocks.
    pub fn scaling(&self) -> TableScaling {
        TableScaling::fit(&self.cond, &self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use l96_types::Layout;

    /// X_i(t) = 100·t + i, Y_{i,j}(t) = 1000·t + 10·i + j.
    fn ramp(len: usize, k: usize, j: usize) -> Trajectory {
        let layout = Layout::new(k, j);
        let steps: Vec<u64> = (0..len as u64).map(|t| 10 + 5 * t).collect();
        let mut slow = Vec::new();
        let mut fast = Vec::new();
        for t in 0..len {
            for i in 0..k {
                slow.push(100.0 * t as f64 + i as f64);
                for jj in 0..j {
                    fast.push(1000.0 * t as f64 + 10.0 * i as f64 + jj as f64);
                }
            }
        }
        Trajectory::from_parts(layout, 0.001, steps, slow, fast).unwrap()
    }

    fn spec(lags: usize, t_skip: usize, slow_stride: usize, output: OutputMode) -> TableSpec {
        TableSpec {
            lags,
            t_skip,
            slow_stride,
            output,
        }
    }

    #[test]
    fn test_lag_column_names() {
        assert_eq!(lag_columns(3), vec!["X_t", "X_t-1", "X_t-2"]);
    }

    #[test]
    fn test_row_count_and_order() {
        let traj = ramp(20, 4, 2);
        let table = LaggedTable::build(&traj, &spec(3, 5, 2, OutputMode::Sample)).unwrap();
        // t ∈ {2, 7, 12, 17} for slow indices {0, 2}
        assert_eq!(table.len(), 8);
        assert_eq!(table.x_index(0), 0);
        assert_eq!(table.x_index(4), 2);
        assert_eq!(table.step(1), 10 + 5 * 7);
    }

    #[test]
    fn test_lags_run_backwards_in_time() {
        let traj = ramp(20, 4, 2);
        let table = LaggedTable::build(&traj, &spec(3, 5, 1, OutputMode::Sample)).unwrap();
        // Row 1: slow index 0, t = 7.
        assert_eq!(table.cond_row(1), &[700.0, 600.0, 500.0]);
        assert_eq!(table.target_row(1), &[7000.0, 7001.0]);
    }

    #[test]
    fn test_mean_mode_single_target_column() {
        let traj = ramp(10, 2, 4);
        let table = LaggedTable::build(&traj, &spec(2, 1, 1, OutputMode::Mean)).unwrap();
        assert_eq!(table.target_columns(), &["Y_mean".to_string()]);
        // Slow index 1 at t = 1: mean(1010..=1013) = 1011.5
        let row = table.len() / 2;
        assert_eq!(table.x_index(row), 1);
        assert_eq!(table.target_row(row), &[1011.5]);
    }

    #[test]
    fn test_header_layout() {
        let traj = ramp(10, 2, 2);
        let table = LaggedTable::build(&traj, &spec(2, 1, 1, OutputMode::Sample)).unwrap();
        assert_eq!(
            table.header(),
            vec!["x_index", "step", "time", "X_t", "X_t-1", "Y_0", "Y_1"]
        );
    }

    #[test]
    fn test_short_trajectory_gives_empty_table() {
        let traj = ramp(2, 2, 2);
        let table = LaggedTable::build(&traj, &spec(3, 1, 1, OutputMode::Sample)).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.header().len(), 3 + 3 + 2);
    }

    #[test]
    fn test_requires_fast_variables() {
        let traj = ramp(10, 2, 0);
        assert!(LaggedTable::build(&traj, &spec(2, 1, 1, OutputMode::Sample)).is_err());
    }
}
