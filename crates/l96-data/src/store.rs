// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Trajectory Store
// ─────────────────────────────────────────────────────────────────────
//! Per-step history accumulation, burn-in trimming and retention stride.
//!
//! `TrajectoryStore` is the only mutable stage: it is appended to during
//! integration and consumed by `finalize`, which hands back an immutable
//! `Trajectory`. Writers and window plans only ever see the latter.

use serde::{Deserialize, Serialize};

use l96_physics::State;
use l96_types::{L96Error, L96Result, Layout};

/// Burn-in + stride retention rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retention {
    pub burn_in: u64,
    pub skip: u64,
}

impl Retention {
    pub fn new(burn_in: u64, skip: u64) -> L96Result<Self> {
        if skip < 1 {
            return Err(L96Error::Config(format!("skip must be >= 1, got {skip}")));
        }
        Ok(Self { burn_in, skip })
    }

    /// `step ≥ burn_in` and `(step − burn_in) % skip == 0`.
    #[inline]
    pub fn keeps(&self, step: u64) -> bool {
        step >= self.burn_in && (step - self.burn_in) % self.skip == 0
    }

    /// Whether every step `other` keeps is also kept by `self`.
    pub fn covers(&self, other: &Retention) -> bool {
        other.burn_in >= self.burn_in
            && (other.burn_in - self.burn_in) % self.skip == 0
            && other.skip % self.skip == 0
    }
}

/// Append-only history of integrated states.
#[derive(Debug, Clone)]
pub struct TrajectoryStore {
    layout: Layout,
    dt: f64,
    /// Applied at record time when set.
    prefilter: Option<Retention>,
    steps: Vec<u64>,
    slow: Vec<f64>,
    fast: Vec<f64>,
}

impl TrajectoryStore {
    /// Keep every recorded state.
    pub fn dense(layout: Layout, dt: f64) -> Self {
        Self {
            layout,
            dt,
            prefilter: None,
            steps: Vec::new(),
            slow: Vec::new(),
            fast: Vec::new(),
        }
    }

    /// Drop states at record time that `finalize(burn_in, skip)` would
    /// discard, sized for `expected` retained states.
    pub fn retaining(layout: Layout, dt: f64, retention: Retention, expected: usize) -> Self {
        Self {
            layout,
            dt,
            prefilter: Some(retention),
            steps: Vec::with_capacity(expected),
            slow: Vec::with_capacity(expected * layout.n_slow()),
            fast: Vec::with_capacity(expected * layout.n_fast()),
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Number of states currently held.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append the state produced at `step`. Steps must strictly increase.
    pub fn record(&mut self, step: u64, state: &State) -> L96Result<()> {
        if state.layout() != self.layout {
            return Err(L96Error::Validation(format!(
                "state layout {:?} does not match store layout {:?}",
                state.layout(),
                self.layout
            )));
        }
        if let Some(&last) = self.steps.last() {
            if step <= last {
                return Err(L96Error::Validation(format!(
                    "step indices must increase: got {step} after {last}"
                )));
            }
        }
        if let Some(r) = self.prefilter {
            if !r.keeps(step) {
                return Ok(());
            }
        }
        self.steps.push(step);
        self.slow.extend_from_slice(state.slow());
        self.fast.extend_from_slice(state.fast());
        Ok(())
    }

    /// Keep `step ≥ burn_in` with `(step − burn_in) % skip == 0`, in order.
    pub fn finalize(self, burn_in: u64, skip: u64) -> L96Result<Trajectory> {
        let want = Retention::new(burn_in, skip)?;
        if let Some(have) = self.prefilter {
            if !have.covers(&want) {
                return Err(L96Error::Config(format!(
                    "store retained burn_in={} skip={}; cannot finalize with burn_in={burn_in} skip={skip}",
                    have.burn_in, have.skip
                )));
            }
            if have == want {
                return Trajectory::from_parts(self.layout, self.dt, self.steps, self.slow, self.fast);
            }
        }

        let k = self.layout.n_slow();
        let kj = self.layout.n_fast();
        let mut steps = Vec::new();
        let mut slow = Vec::new();
        let mut fast = Vec::new();
        for (n, &step) in self.steps.iter().enumerate() {
            if want.keeps(step) {
                steps.push(step);
                slow.extend_from_slice(&self.slow[n * k..(n + 1) * k]);
                fast.extend_from_slice(&self.fast[n * kj..(n + 1) * kj]);
            }
        }
        Trajectory::from_parts(self.layout, self.dt, steps, slow, fast)
    }
}

/// Immutable retained history, time-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    layout: Layout,
    dt: f64,
    steps: Vec<u64>,
    /// len × K
    slow: Vec<f64>,
    /// len × K·J
    fast: Vec<f64>,
}

impl Trajectory {
    /// Assemble from raw buffers, checking their shapes.
    pub fn from_parts(
        layout: Layout,
        dt: f64,
        steps: Vec<u64>,
        slow: Vec<f64>,
        fast: Vec<f64>,
    ) -> L96Result<Self> {
        let len = steps.len();
        if slow.len() != len * layout.n_slow() {
            return Err(L96Error::Validation(format!(
                "slow buffer has {} values, expected {len}×{}",
                slow.len(),
                layout.n_slow()
            )));
        }
        if fast.len() != len * layout.n_fast() {
            return Err(L96Error::Validation(format!(
                "fast buffer has {} values, expected {len}×{}",
                fast.len(),
                layout.n_fast()
            )));
        }
        if steps.windows(2).any(|w| w[1] <= w[0]) {
            return Err(L96Error::Validation(
                "trajectory step indices must strictly increase".to_string(),
            ));
        }
        Ok(Self {
            layout,
            dt,
            steps,
            slow,
            fast,
        })
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Integration step Δt of the run that produced this trajectory.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Integration step indices of the retained states.
    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    pub fn step(&self, n: usize) -> u64 {
        self.steps[n]
    }

    /// Model time of retained state `n`.
    pub fn time(&self, n: usize) -> f64 {
        self.steps[n] as f64 * self.dt
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.steps.iter().map(move |&s| s as f64 * self.dt)
    }

    /// All slow values, time-major.
    pub fn slow_values(&self) -> &[f64] {
        &self.slow
    }

    /// All fast values, time-major.
    pub fn fast_values(&self) -> &[f64] {
        &self.fast
    }

    pub fn slow_at(&self, n: usize) -> &[f64] {
        let k = self.layout.n_slow();
        &self.slow[n * k..(n + 1) * k]
    }

    pub fn fast_at(&self, n: usize) -> &[f64] {
        let kj = self.layout.n_fast();
        &self.fast[n * kj..(n + 1) * kj]
    }

    /// Y_{i,·} at retained state `n`.
    pub fn fast_block_at(&self, n: usize, i: usize) -> &[f64] {
        &self.fast_at(n)[self.layout.fast_block(i)]
    }

    #[inline]
    pub fn x(&self, n: usize, i: usize) -> f64 {
        self.slow[n * self.layout.n_slow() + i]
    }

    #[inline]
    pub fn y(&self, n: usize, i: usize, j: usize) -> f64 {
        self.fast[n * self.layout.n_fast() + self.layout.fast_flat(i, j)]
    }

    /// Mean of Y_{i,·} at retained state `n`; 0 when J = 0.
    pub fn fast_block_mean(&self, n: usize, i: usize) -> f64 {
        let block = self.fast_block_at(n, i);
        if block.is_empty() {
            return 0.0;
        }
        block.iter().sum::<f64>() / block.len() as f64
    }

    /// Rebuild the full state at retained index `n`.
    pub fn state_at(&self, n: usize) -> L96Result<State> {
        State::from_parts(self.layout, self.slow_at(n), self.fast_at(n))
    }
}
