// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Window Plans
// ─────────────────────────────────────────────────────────────────────
//! Aligned (conditioning, target) windows over a finalized trajectory.
//!
//! A window anchored at trajectory index `a` reads:
//!   - conditioning: X_a, X_{a-1}, …, X_{a-C+1} at native resolution
//!   - target:       `W` values starting at `a`; fast channels are read
//!                   over `W · x_skip` states and reduced group-wise,
//!                   a fast block is the `J` values Y_{i,·} at `a`
//!
//! Anchors are the multiples of `t_skip` with `a ≥ C - 1` and
//! `a + span ≤ L`. Windows without a full conditioning history or that
//! would run past the end are dropped, never padded.
//!
//! `WindowPlan` is a pure function of `(Trajectory, WindowSpec)`: every
//! sample is computed from its index, so the sequence can be re-walked
//! or materialized in parallel and always comes out identical.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use l96_types::{Downsample, GanConfig, L96Error, L96Result, Layout};

use crate::store::Trajectory;

/// Which series a window's target is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetChannel {
    /// X_i itself.
    Slow,
    /// Y_{i,sub_index} over time.
    Fast { sub_index: usize },
    /// Block mean of Y_{i,·} over time.
    FastMean,
    /// The whole block Y_{i,0..J} at the anchor.
    FastBlock,
}

impl TargetChannel {
    pub fn is_fast(&self) -> bool {
        !matches!(self, TargetChannel::Slow)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TargetChannel::Slow => "slow",
            TargetChannel::Fast { .. } => "fast",
            TargetChannel::FastMean => "fast_mean",
            TargetChannel::FastBlock => "fast_block",
        }
    }
}

/// Shape and strides of one window family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub slow_index: usize,
    /// Conditioning length C.
    pub cond_len: usize,
    /// Target length W.
    pub target_len: usize,
    /// Stride between anchors.
    pub t_skip: usize,
    /// Decimation stride of fast targets.
    pub x_skip: usize,
    pub target: TargetChannel,
    pub downsample: Downsample,
}

impl WindowSpec {
    /// Windows shaped by the GAN section for slow variable `slow_index`.
    pub fn from_gan(gan: &GanConfig, slow_index: usize, target: TargetChannel) -> Self {
        Self {
            slow_index,
            cond_len: gan.num_cond_inputs(),
            target_len: gan.num_outputs(),
            t_skip: gan.t_skip,
            x_skip: gan.x_skip,
            target,
            downsample: gan.downsample,
        }
    }

    /// Trajectory states covered by the target channel, anchor included.
    pub fn span(&self) -> usize {
        match self.target {
            TargetChannel::Slow => self.target_len,
            TargetChannel::FastBlock => 1,
            TargetChannel::Fast { .. } | TargetChannel::FastMean => {
                self.target_len * self.x_skip
            }
        }
    }

    /// Smallest anchor with a full conditioning history.
    pub fn first_anchor(&self) -> usize {
        let history = self.cond_len.saturating_sub(1);
        history.div_ceil(self.t_skip) * self.t_skip
    }

    /// Windows that fit in a trajectory of `len` states.
    pub fn count_for(&self, len: usize) -> usize {
        let first = self.first_anchor();
        match len.checked_sub(first + self.span()) {
            Some(room) => room / self.t_skip + 1,
            None => 0,
        }
    }

    pub fn validate(&self, layout: Layout) -> L96Result<()> {
        if self.cond_len < 1 || self.target_len < 1 {
            return Err(L96Error::Config(format!(
                "window lengths must be >= 1, got cond_len={} target_len={}",
                self.cond_len, self.target_len
            )));
        }
        if self.t_skip < 1 || self.x_skip < 1 {
            return Err(L96Error::Config(format!(
                "window strides must be >= 1, got t_skip={} x_skip={}",
                self.t_skip, self.x_skip
            )));
        }
        if self.slow_index >= layout.k {
            return Err(L96Error::Config(format!(
                "slow_index {} out of range for K={}",
                self.slow_index, layout.k
            )));
        }
        match self.target {
            TargetChannel::Slow => {}
            TargetChannel::FastMean if layout.j == 0 => {
                return Err(L96Error::Config(
                    "fast-mean target needs J >= 1".to_string(),
                ));
            }
            TargetChannel::FastBlock if self.target_len != layout.j || layout.j == 0 => {
                return Err(L96Error::Config(format!(
                    "fast-block target needs target_len == J >= 1, got target_len={} J={}",
                    self.target_len, layout.j
                )));
            }
            TargetChannel::Fast { sub_index } if sub_index >= layout.j => {
                return Err(L96Error::Config(format!(
                    "fast sub_index {sub_index} out of range for J={}",
                    layout.j
                )));
            }
            _ => {}
        }
        Ok(())
    }
}

/// One training example handed to the GAN trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSample {
    /// Trajectory index shared by both channels.
    pub anchor: usize,
    /// Integration step of the anchor.
    pub step: u64,
    /// Model time of the anchor.
    pub time: f64,
    /// `cond_len` slow values, newest first.
    pub conditioning: Vec<f64>,
    /// `target_len` values.
    pub target: Vec<f64>,
}

/// Index-based, restartable sequence of window samples.
#[derive(Debug, Clone)]
pub struct WindowPlan<'a> {
    traj: &'a Trajectory,
    spec: WindowSpec,
    first: usize,
    count: usize,
}

impl<'a> WindowPlan<'a> {
    /// Plan windows over `traj`. A trajectory shorter than one window
    /// gives an empty plan and a warning, not an error.
    pub fn new(traj: &'a Trajectory, spec: WindowSpec) -> L96Result<Self> {
        spec.validate(traj.layout())?;
        let first = spec.first_anchor();
        let count = spec.count_for(traj.len());
        if count == 0 {
            log::warn!(
                "trajectory of {} states is shorter than one window (first anchor {}, span {}); no windows produced",
                traj.len(),
                first,
                spec.span()
            );
        }
        Ok(Self {
            traj,
            spec,
            first,
            count,
        })
    }

    pub fn spec(&self) -> &WindowSpec {
        &self.spec
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn anchor_unchecked(&self, n: usize) -> usize {
        self.first + n * self.spec.t_skip
    }

    /// Anchor of window `n`.
    pub fn anchor(&self, n: usize) -> Option<usize> {
        (n < self.count).then(|| self.anchor_unchecked(n))
    }

    pub fn anchors(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.count).map(move |n| self.anchor_unchecked(n))
    }

    /// Scalar series behind the time-indexed targets.
    fn target_series(&self, t: usize) -> f64 {
        let i = self.spec.slow_index;
        match self.spec.target {
            TargetChannel::Slow => self.traj.x(t, i),
            TargetChannel::Fast { sub_index } => self.traj.y(t, i, sub_index),
            TargetChannel::FastMean | TargetChannel::FastBlock => self.traj.fast_block_mean(t, i),
        }
    }

    fn build(&self, anchor: usize) -> WindowSample {
        let spec = &self.spec;
        let i = spec.slow_index;
        let conditioning = (0..spec.cond_len)
            .map(|lag| self.traj.x(anchor - lag, i))
            .collect();

        let target = match spec.target {
            TargetChannel::FastBlock => self.traj.fast_block_at(anchor, i).to_vec(),
            TargetChannel::Slow => (anchor..anchor + spec.target_len)
                .map(|t| self.target_series(t))
                .collect(),
            TargetChannel::Fast { .. } | TargetChannel::FastMean => {
                let g = spec.x_skip;
                (0..spec.target_len)
                    .map(|w| {
                        let start = anchor + w * g;
                        match spec.downsample {
                            Downsample::First => self.target_series(start),
                            Downsample::Mean => {
                                (start..start + g).map(|t| self.target_series(t)).sum::<f64>()
                                    / g as f64
                            }
                        }
                    })
                    .collect()
            }
        };

        WindowSample {
            anchor,
            step: self.traj.step(anchor),
            time: self.traj.time(anchor),
            conditioning,
            target,
        }
    }

    /// Window `n`, or `None` past the end.
    pub fn sample(&self, n: usize) -> Option<WindowSample> {
        self.anchor(n).map(|a| self.build(a))
    }

    /// Walk the plan from the start. Each call is a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = WindowSample> + '_ {
        self.anchors().map(move |a| self.build(a))
    }

    /// Materialize every sample in parallel, in plan order.
    pub fn par_collect(&self) -> Vec<WindowSample> {
        (0..self.count)
            .into_par_iter()
            .map(|n| self.build(self.anchor_unchecked(n)))
            .collect()
    }

    /// Row-major `(len × cond_len, len × target_len)` arrays for batching.
    pub fn to_arrays(&self) -> (Vec<f64>, Vec<f64>) {
        let mut cond = Vec::with_capacity(self.count * self.spec.cond_len);
        let mut target = Vec::with_capacity(self.count * self.spec.target_len);
        for sample in self.iter() {
            cond.extend_from_slice(&sample.conditioning);
            target.extend_from_slice(&sample.target);
        }
        (cond, target)
    }
}

/// Every window of a run, across the selected slow variables, flattened
/// for export. Rows are ordered by slow index, then anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSet {
    pub cond_len: usize,
    pub target_len: usize,
    pub target: TargetChannel,
    pub slow_index: Vec<usize>,
    pub anchor: Vec<usize>,
    pub step: Vec<u64>,
    pub time: Vec<f64>,
    /// `len × cond_len`, row-major.
    pub conditioning: Vec<f64>,
    /// `len × target_len`, row-major.
    pub targets: Vec<f64>,
}

impl WindowSet {
    /// Windows of every `slow_stride`-th slow variable shaped by `gan`.
    pub fn collect(traj: &Trajectory, gan: &GanConfig, target: TargetChannel) -> L96Result<Self> {
        let stride = gan.slow_stride.max(1);
        let mut set = Self {
            cond_len: gan.num_cond_inputs(),
            target_len: gan.num_outputs(),
            target,
            slow_index: Vec::new(),
            anchor: Vec::new(),
            step: Vec::new(),
            time: Vec::new(),
            conditioning: Vec::new(),
            targets: Vec::new(),
        };
        for i in (0..traj.layout().k).step_by(stride) {
            let plan = WindowPlan::new(traj, WindowSpec::from_gan(gan, i, target))?;
            for sample in plan.par_collect() {
                set.slow_index.push(i);
                set.anchor.push(sample.anchor);
                set.step.push(sample.step);
                set.time.push(sample.time);
                set.conditioning.extend_from_slice(&sample.conditioning);
                set.targets.extend_from_slice(&sample.target);
            }
        }
        log::debug!(
            "collected {} {} windows (C={}, W={})",
            set.len(),
            target.name(),
            set.cond_len,
            set.target_len
        );
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.anchor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchor.is_empty()
    }

    pub fn cond_row(&self, n: usize) -> &[f64] {
        &self.conditioning[n * self.cond_len..(n + 1) * self.cond_len]
    }

    pub fn target_row(&self, n: usize) -> &[f64] {
        &self.targets[n * self.target_len..(n + 1) * self.target_len]
    }

    /// `slow_index,anchor,step,time,cond_0…,target_0…`
    pub fn header(&self) -> Vec<String> {
        let mut cols = vec![
            "slow_index".to_string(),
            "anchor".to_string(),
            "step".to_string(),
            "time".to_string(),
        ];
        cols.extend((0..self.cond_len).map(|c| format!("cond_{c}")));
        cols.extend((0..self.target_len).map(|w| format!("target_{w}")));
        cols
    }
}
