// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Run Configuration
// ─────────────────────────────────────────────────────────────────────

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{L96Error, L96Result};
use crate::layout::Layout;

/// Parameters of the two-scale Lorenz-96 truth run.
///
/// One immutable value per simulation; nothing reads these from globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LorenzParams {
    /// Number of slow (X) variables.
    /// Default: 8.
    #[serde(rename = "K")]
    pub k: usize,

    /// Number of fast (Y) variables per slow variable.
    /// Default: 32.
    #[serde(rename = "J")]
    pub j: usize,

    /// Coupling constant.
    /// Default: 1.0.
    pub h: f64,

    /// Spatial-scale ratio.
    /// Default: 10.0.
    pub b: f64,

    /// Time-scale ratio.
    /// Default: 10.0.
    pub c: f64,

    /// Forcing term.
    /// Default: 30.0.
    #[serde(rename = "F")]
    pub f: f64,

    /// Integration step Δt in model time units.
    /// Default: 0.001.
    pub time_step: f64,

    /// Number of states produced, counting the initial condition.
    /// Default: 1_000_000.
    pub num_steps: u64,

    /// Retention stride applied after burn-in.
    /// Default: 5.
    pub skip: u64,

    /// Leading steps discarded before retention starts.
    /// Default: 2000.
    pub burn_in: u64,

    /// Any |value| above this counts as divergence.
    /// Default: 1.0e4.
    #[serde(default = "default_divergence_bound")]
    pub divergence_bound: f64,
}

fn default_divergence_bound() -> f64 {
    1.0e4
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self {
            k: 8,
            j: 32,
            h: 1.0,
            b: 10.0,
            c: 10.0,
            f: 30.0,
            time_step: 0.001,
            num_steps: 1_000_000,
            skip: 5,
            burn_in: 2000,
            divergence_bound: default_divergence_bound(),
        }
    }
}

impl LorenzParams {
    pub fn layout(&self) -> Layout {
        Layout::new(self.k, self.j)
    }

    /// Coupling coefficient h·c/b shared by both tendencies.
    #[inline]
    pub fn coupling(&self) -> f64 {
        self.h * self.c / self.b
    }

    /// Length of the finalized trajectory: ⌈(num_steps − burn_in) / skip⌉.
    pub fn retained_len(&self) -> usize {
        if self.skip == 0 || self.burn_in >= self.num_steps {
            return 0;
        }
        let span = self.num_steps - self.burn_in;
        span.div_ceil(self.skip) as usize
    }

    /// Validate the integration parameters.
    pub fn validate(&self) -> L96Result<()> {
        if self.k < 1 {
            return Err(L96Error::Config(format!("K must be >= 1, got {}", self.k)));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(L96Error::Config(format!(
                "time_step must be finite and > 0, got {}",
                self.time_step
            )));
        }
        for (name, value) in [("h", self.h), ("b", self.b), ("c", self.c), ("F", self.f)] {
            if !value.is_finite() {
                return Err(L96Error::Config(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if self.b == 0.0 {
            return Err(L96Error::Config(
                "b must be non-zero (coupling is h·c/b)".to_string(),
            ));
        }
        if self.num_steps == 0 {
            return Err(L96Error::Config("num_steps must be > 0".to_string()));
        }
        if self.burn_in >= self.num_steps {
            return Err(L96Error::Config(format!(
                "burn_in must be < num_steps, got burn_in={} num_steps={}",
                self.burn_in, self.num_steps
            )));
        }
        if self.skip < 1 {
            return Err(L96Error::Config(format!(
                "skip must be >= 1, got {}",
                self.skip
            )));
        }
        if !(self.divergence_bound.is_finite() && self.divergence_bound > 0.0) {
            return Err(L96Error::Config(format!(
                "divergence_bound must be finite and > 0, got {}",
                self.divergence_bound
            )));
        }
        Ok(())
    }
}

/// Neural network family the trainer builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStructure {
    Conv,
    Dense,
}

/// What the generator learns to emit for one slow variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// The full fast block Y_{i,0..J}.
    Sample,
    /// The block mean of Y_{i,·}.
    Mean,
}

/// Reduction applied to each group of `x_skip` fast samples in a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Downsample {
    /// Keep the first sample of every group.
    #[default]
    First,
    /// Average every group.
    Mean,
}

/// Generator shape block. Only the two input/output counts are read by
/// the kernel; the rest is carried through for the trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorShape {
    pub num_cond_inputs: usize,
    pub num_random_inputs: usize,
    pub num_outputs: usize,
    pub activation: String,
    pub min_conv_filters: usize,
    pub min_data_width: usize,
    pub filter_width: usize,
}

impl Default for GeneratorShape {
    fn default() -> Self {
        Self {
            num_cond_inputs: 3,
            num_random_inputs: 13,
            num_outputs: 32,
            activation: "relu".to_string(),
            min_conv_filters: 32,
            min_data_width: 4,
            filter_width: 4,
        }
    }
}

/// Discriminator shape block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscriminatorShape {
    pub num_cond_inputs: usize,
    pub num_sample_inputs: usize,
    pub activation: String,
    pub min_conv_filters: usize,
    pub min_data_width: usize,
    pub filter_width: usize,
}

impl Default for DiscriminatorShape {
    fn default() -> Self {
        Self {
            num_cond_inputs: 3,
            num_sample_inputs: 32,
            activation: "relu".to_string(),
            min_conv_filters: 32,
            min_data_width: 4,
            filter_width: 4,
        }
    }
}

/// GAN section: windowing strides plus the trainer's opaque settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanConfig {
    pub structure: NetworkStructure,

    /// Stride between consecutive window anchors (trajectory indices).
    /// Default: 10.
    pub t_skip: usize,

    /// Decimation stride inside a window's fast target channel.
    /// Default: 1.
    pub x_skip: usize,

    /// Stride over slow indices when building the lagged table.
    /// Default: 1.
    #[serde(default = "default_stride")]
    pub slow_stride: usize,

    pub output: OutputMode,

    /// How `x_skip` groups are reduced.
    /// Default: first-of-group.
    #[serde(default)]
    pub downsample: Downsample,

    pub generator: GeneratorShape,
    pub discriminator: DiscriminatorShape,

    pub gan_path: PathBuf,
    pub batch_size: usize,
    pub gan_index: usize,
    pub loss: String,
    pub num_epochs: Vec<usize>,
    pub metrics: Vec<String>,
}

fn default_stride() -> usize {
    1
}

impl Default for GanConfig {
    fn default() -> Self {
        Self {
            structure: NetworkStructure::Conv,
            t_skip: 10,
            x_skip: 1,
            slow_stride: default_stride(),
            output: OutputMode::Sample,
            downsample: Downsample::First,
            generator: GeneratorShape::default(),
            discriminator: DiscriminatorShape::default(),
            gan_path: PathBuf::from("./exp"),
            batch_size: 64,
            gan_index: 0,
            loss: "binary_crossentropy".to_string(),
            num_epochs: vec![1, 5, 10],
            metrics: vec!["accuracy".to_string()],
        }
    }
}

impl GanConfig {
    /// Conditioning length handed to the trainer.
    pub fn num_cond_inputs(&self) -> usize {
        self.generator.num_cond_inputs
    }

    /// Target length handed to the trainer.
    pub fn num_outputs(&self) -> usize {
        self.generator.num_outputs
    }

    /// `(X, Y)` scaling-value files under `gan_path`, numbered by
    /// `gan_index`.
    pub fn scaling_paths(&self) -> (PathBuf, PathBuf) {
        let index = self.gan_index;
        (
            self.gan_path.join(format!("gan_X_scaling_values_{index:04}.csv")),
            self.gan_path.join(format!("gan_Y_scaling_values_{index:04}.csv")),
        )
    }

    /// Trajectory states one window needs: conditioning history before
    /// the anchor plus the target span from it.
    pub fn window_extent(&self) -> usize {
        let span = match self.output {
            OutputMode::Sample => 1,
            OutputMode::Mean => self.num_outputs().saturating_mul(self.x_skip),
        };
        self.num_cond_inputs().saturating_sub(1).saturating_add(span)
    }

    /// Validate the section on its own.
    pub fn validate(&self) -> L96Result<()> {
        if self.t_skip < 1 {
            return Err(L96Error::Config(format!(
                "t_skip must be >= 1, got {}",
                self.t_skip
            )));
        }
        if self.x_skip < 1 {
            return Err(L96Error::Config(format!(
                "x_skip must be >= 1, got {}",
                self.x_skip
            )));
        }
        if self.slow_stride < 1 {
            return Err(L96Error::Config(format!(
                "slow_stride must be >= 1, got {}",
                self.slow_stride
            )));
        }
        if self.num_cond_inputs() < 1 {
            return Err(L96Error::Config(
                "generator.num_cond_inputs must be >= 1".to_string(),
            ));
        }
        if self.num_outputs() < 1 {
            return Err(L96Error::Config(
                "generator.num_outputs must be >= 1".to_string(),
            ));
        }
        if self.generator.num_cond_inputs != self.discriminator.num_cond_inputs {
            return Err(L96Error::Config(format!(
                "generator.num_cond_inputs ({}) != discriminator.num_cond_inputs ({})",
                self.generator.num_cond_inputs, self.discriminator.num_cond_inputs
            )));
        }
        if self.generator.num_outputs != self.discriminator.num_sample_inputs {
            return Err(L96Error::Config(format!(
                "generator.num_outputs ({}) != discriminator.num_sample_inputs ({})",
                self.generator.num_outputs, self.discriminator.num_sample_inputs
            )));
        }
        if self.batch_size < 1 {
            return Err(L96Error::Config("batch_size must be >= 1".to_string()));
        }
        Ok(())
    }

    /// Cross-check the GAN section against the integration parameters.
    pub fn validate_against(&self, lorenz: &LorenzParams) -> L96Result<()> {
        if lorenz.j == 0 {
            return Err(L96Error::Config(
                "J must be >= 1 to build fast-variable training targets".to_string(),
            ));
        }
        match self.output {
            OutputMode::Sample if self.num_outputs() != lorenz.j => {
                return Err(L96Error::Config(format!(
                    "output=sample needs num_outputs == J, got num_outputs={} J={}",
                    self.num_outputs(),
                    lorenz.j
                )));
            }
            OutputMode::Mean if self.num_outputs() != 1 => {
                return Err(L96Error::Config(format!(
                    "output=mean needs num_outputs == 1, got {}",
                    self.num_outputs()
                )));
            }
            _ => {}
        }
        if self.slow_stride > lorenz.k {
            return Err(L96Error::Config(format!(
                "slow_stride ({}) exceeds K ({})",
                self.slow_stride, lorenz.k
            )));
        }

        let available = lorenz.retained_len();
        if self.num_cond_inputs() > available {
            return Err(L96Error::Config(format!(
                "num_cond_inputs ({}) exceeds the retained trajectory length ({available})",
                self.num_cond_inputs()
            )));
        }
        if self.output == OutputMode::Sample && self.x_skip > 1 {
            log::warn!(
                "x_skip = {} has no effect in output=sample mode: the target is one fast block per anchor",
                self.x_skip
            );
        }
        let extent = self.window_extent();
        if extent > available {
            return Err(L96Error::Config(format!(
                "window extent ({extent} states of history and target) exceeds the retained trajectory length ({available})"
            )));
        }
        Ok(())
    }
}

/// Top-level run configuration: integration, GAN boundary, destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub lorenz: LorenzParams,
    pub gan: GanConfig,
    pub output_nc_file: PathBuf,
    pub output_csv_file: PathBuf,
    /// Lagged per-example table consumed by the trainer.
    #[serde(default)]
    pub output_table_file: Option<PathBuf>,
    /// Window set as a netCDF dataset.
    #[serde(default)]
    pub output_windows_nc_file: Option<PathBuf>,
    /// Window set as CSV.
    #[serde(default)]
    pub output_windows_csv_file: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            lorenz: LorenzParams::default(),
            gan: GanConfig::default(),
            output_nc_file: PathBuf::from("./exp/lorenz_output.nc"),
            output_csv_file: PathBuf::from("./exp/lorenz_combined_output.csv"),
            output_table_file: None,
            output_windows_nc_file: None,
            output_windows_csv_file: None,
        }
    }
}

impl RunConfig {
    /// Validate every section and their cross-constraints.
    pub fn validate(&self) -> L96Result<()> {
        self.lorenz.validate()?;
        self.gan.validate()?;
        self.gan.validate_against(&self.lorenz)
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> L96Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| L96Error::Config(format!("JSON parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_run() -> RunConfig {
        RunConfig {
            lorenz: LorenzParams {
                num_steps: 1000,
                burn_in: 100,
                skip: 5,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_default_run_config_is_valid() {
        RunConfig::default().validate().unwrap();
    }

    #[test]
    fn test_retained_len_is_ceiling() {
        let p = LorenzParams {
            num_steps: 1000,
            burn_in: 100,
            skip: 7,
            ..Default::default()
        };
        // 900 / 7 = 128.57 → 129
        assert_eq!(p.retained_len(), 129);
        let exact = LorenzParams {
            num_steps: 1000,
            burn_in: 100,
            skip: 5,
            ..Default::default()
        };
        assert_eq!(exact.retained_len(), 180);
    }

    #[test]
    fn test_burn_in_not_below_num_steps_rejected() {
        let p = LorenzParams {
            num_steps: 100,
            burn_in: 100,
            ..Default::default()
        };
        let err = p.validate().unwrap_err().to_string();
        assert!(err.contains("burn_in"), "{err}");
    }

    #[test]
    fn test_non_positive_time_step_rejected() {
        for dt in [0.0, -0.001, f64::NAN] {
            let p = LorenzParams {
                time_step: dt,
                ..Default::default()
            };
            assert!(p.validate().is_err(), "time_step={dt} accepted");
        }
    }

    #[test]
    fn test_zero_k_and_zero_skip_rejected() {
        let p = LorenzParams {
            k: 0,
            ..Default::default()
        };
        assert!(p.validate().is_err());
        let p = LorenzParams {
            skip: 0,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_zero_j_is_valid_for_integration() {
        let p = LorenzParams {
            j: 0,
            ..Default::default()
        };
        p.validate().unwrap();
    }

    #[test]
    fn test_sample_mode_requires_num_outputs_equal_j() {
        let mut cfg = small_run();
        cfg.lorenz.j = 16;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("num_outputs == J"), "{err}");
    }

    #[test]
    fn test_mean_mode_requires_single_output() {
        let mut cfg = small_run();
        cfg.gan.output = OutputMode::Mean;
        assert!(cfg.validate().is_err());
        cfg.gan.generator.num_outputs = 1;
        cfg.gan.discriminator.num_sample_inputs = 1;
        cfg.validate().unwrap();
    }

    #[test]
    fn test_mismatched_generator_discriminator_rejected() {
        let mut cfg = small_run();
        cfg.gan.discriminator.num_cond_inputs = 4;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("num_cond_inputs"), "{err}");
    }

    #[test]
    fn test_window_longer_than_trajectory_rejected() {
        let mut cfg = small_run();
        cfg.lorenz.num_steps = 102; // one retained state, three conditioning lags
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("exceeds the retained trajectory length"), "{err}");
    }

    #[test]
    fn test_x_skip_widens_mean_window() {
        let mut cfg = small_run();
        cfg.gan.output = OutputMode::Mean;
        cfg.gan.generator.num_outputs = 1;
        cfg.gan.discriminator.num_sample_inputs = 1;
        // 180 retained states; 2 lags of history + 179 does not fit.
        cfg.gan.x_skip = 179;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("window extent (181"), "{err}");
        cfg.gan.x_skip = 178;
        cfg.validate().unwrap();
    }

    #[test]
    fn test_sample_window_extent_ignores_x_skip() {
        let mut gan = GanConfig::default();
        assert_eq!(gan.window_extent(), 3);
        gan.x_skip = 50;
        assert_eq!(gan.window_extent(), 3);
    }

    #[test]
    fn test_scaling_paths_follow_gan_index() {
        let gan = GanConfig {
            gan_path: PathBuf::from("/runs/exp"),
            gan_index: 7,
            ..Default::default()
        };
        let (x, y) = gan.scaling_paths();
        assert_eq!(x, PathBuf::from("/runs/exp/gan_X_scaling_values_0007.csv"));
        assert_eq!(y, PathBuf::from("/runs/exp/gan_Y_scaling_values_0007.csv"));
    }

    #[test]
    fn test_from_json_roundtrip_keys() {
        let json = r#"{
            "lorenz": {"K": 4, "J": 8, "h": 1.0, "b": 10.0, "c": 10.0, "F": 30.0,
                       "time_step": 0.001, "num_steps": 5000, "skip": 5, "burn_in": 200},
            "gan": {"structure": "dense", "t_skip": 10, "x_skip": 1, "output": "sample",
                    "generator": {"num_cond_inputs": 3, "num_random_inputs": 13, "num_outputs": 8,
                                  "activation": "relu", "min_conv_filters": 32,
                                  "min_data_width": 4, "filter_width": 4},
                    "discriminator": {"num_cond_inputs": 3, "num_sample_inputs": 8,
                                      "activation": "relu", "min_conv_filters": 32,
                                      "min_data_width": 4, "filter_width": 4},
                    "gan_path": "./exp", "batch_size": 64, "gan_index": 0,
                    "loss": "binary_crossentropy", "num_epochs": [1, 5, 10],
                    "metrics": ["accuracy"]},
            "output_nc_file": "./exp/lorenz_output.nc",
            "output_csv_file": "./exp/lorenz_combined_output.csv"
        }"#;
        let cfg = RunConfig::from_json(json).unwrap();
        assert_eq!(cfg.lorenz.k, 4);
        assert_eq!(cfg.lorenz.f, 30.0);
        assert_eq!(cfg.lorenz.divergence_bound, 1.0e4);
        assert_eq!(cfg.gan.structure, NetworkStructure::Dense);
        assert_eq!(cfg.gan.downsample, Downsample::First);
        assert_eq!(cfg.gan.slow_stride, 1);
        assert!(cfg.output_table_file.is_none());
        assert!(cfg.output_windows_nc_file.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn test_from_json_bad_input() {
        let err = RunConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, L96Error::Config(_)));
    }
}
