// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — State Vector
// ─────────────────────────────────────────────────────────────────────
//! Flat two-scale state: K slow values followed by K·J fast values.

use serde::{Deserialize, Serialize};

use l96_types::{L96Error, L96Result, Layout, LorenzParams};

/// One snapshot of the coupled system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    layout: Layout,
    /// `[X_0 .. X_{K-1}, Y_{0,0} .. Y_{K-1,J-1}]`
    values: Vec<f64>,
}

impl State {
    /// All-zero state.
    pub fn zeros(layout: Layout) -> Self {
        Self {
            layout,
            values: vec![0.0; layout.state_len()],
        }
    }

    /// Build from separate slow and fast vectors.
    pub fn from_parts(layout: Layout, slow: &[f64], fast: &[f64]) -> L96Result<Self> {
        if slow.len() != layout.n_slow() {
            return Err(L96Error::Validation(format!(
                "slow vector has {} values, layout expects {}",
                slow.len(),
                layout.n_slow()
            )));
        }
        if fast.len() != layout.n_fast() {
            return Err(L96Error::Validation(format!(
                "fast vector has {} values, layout expects {}",
                fast.len(),
                layout.n_fast()
            )));
        }
        let mut values = Vec::with_capacity(layout.state_len());
        values.extend_from_slice(slow);
        values.extend_from_slice(fast);
        Ok(Self { layout, values })
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn slow(&self) -> &[f64] {
        &self.values[..self.layout.k]
    }

    pub fn fast(&self) -> &[f64] {
        &self.values[self.layout.k..]
    }

    pub fn slow_mut(&mut self) -> &mut [f64] {
        let k = self.layout.k;
        &mut self.values[..k]
    }

    pub fn fast_mut(&mut self) -> &mut [f64] {
        let k = self.layout.k;
        &mut self.values[k..]
    }

    /// Y_{i,j}.
    pub fn y(&self, i: usize, j: usize) -> f64 {
        self.fast()[self.layout.fast_flat(i, j)]
    }

    /// Describe the first component that is non-finite or beyond `bound`.
    pub fn first_violation(&self, bound: f64) -> Option<String> {
        let k = self.layout.k;
        let j = self.layout.j;
        self.values
            .iter()
            .position(|v| !v.is_finite() || v.abs() > bound)
            .map(|pos| {
                let v = self.values[pos];
                if pos < k {
                    format!("X[{pos}] = {v}")
                } else {
                    let n = pos - k;
                    format!("Y[{},{}] = {v}", n / j, n % j)
                }
            })
    }
}

/// How the truth run is seeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialCondition {
    /// X_0 = 1, Y_0 = 1, everything else zero.
    #[default]
    Impulse,
    /// X_i = F, Y = 0, plus `perturbation` on X_0 (and Y_0 when J > 0).
    PerturbedEquilibrium { perturbation: f64 },
    /// Caller-supplied vectors.
    Explicit { slow: Vec<f64>, fast: Vec<f64> },
}

impl InitialCondition {
    /// Materialize the initial state for `params`.
    pub fn build(&self, params: &LorenzParams) -> L96Result<State> {
        let layout = params.layout();
        match self {
            InitialCondition::Impulse => {
                let mut s = State::zeros(layout);
                s.slow_mut()[0] = 1.0;
                if layout.n_fast() > 0 {
                    s.fast_mut()[0] = 1.0;
                }
                Ok(s)
            }
            InitialCondition::PerturbedEquilibrium { perturbation } => {
                if !perturbation.is_finite() {
                    return Err(L96Error::Validation(format!(
                        "perturbation must be finite, got {perturbation}"
                    )));
                }
                let mut s = State::zeros(layout);
                s.slow_mut().fill(params.f);
                s.slow_mut()[0] += perturbation;
                if layout.n_fast() > 0 {
                    s.fast_mut()[0] += perturbation;
                }
                Ok(s)
            }
            InitialCondition::Explicit { slow, fast } => {
                let s = State::from_parts(layout, slow, fast)?;
                if let Some(bad) = s.first_violation(f64::MAX) {
                    return Err(L96Error::Validation(format!(
                        "initial condition is not finite: {bad}"
                    )));
                }
                Ok(s)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(k: usize, j: usize) -> LorenzParams {
        LorenzParams {
            k,
            j,
            ..Default::default()
        }
    }

    #[test]
    fn test_impulse_initial_condition() {
        let s = InitialCondition::Impulse.build(&params(8, 4)).unwrap();
        assert_eq!(s.slow()[0], 1.0);
        assert_eq!(s.fast()[0], 1.0);
        assert_eq!(s.slow().iter().filter(|&&v| v != 0.0).count(), 1);
        assert_eq!(s.fast().iter().filter(|&&v| v != 0.0).count(), 1);
    }

    #[test]
    fn test_impulse_without_fast_variables() {
        let s = InitialCondition::Impulse.build(&params(5, 0)).unwrap();
        assert!(s.fast().is_empty());
        assert_eq!(s.values().len(), 5);
    }

    #[test]
    fn test_perturbed_equilibrium() {
        let p = params(4, 2);
        let s = InitialCondition::PerturbedEquilibrium { perturbation: 0.01 }
            .build(&p)
            .unwrap();
        assert!((s.slow()[0] - (p.f + 0.01)).abs() < 1e-12);
        assert_eq!(s.slow()[1], p.f);
        assert!((s.fast()[0] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_length_checked() {
        let ic = InitialCondition::Explicit {
            slow: vec![0.0; 3],
            fast: vec![0.0; 8],
        };
        assert!(ic.build(&params(4, 2)).is_err());
    }

    #[test]
    fn test_explicit_nan_rejected() {
        let ic = InitialCondition::Explicit {
            slow: vec![0.0, f64::NAN],
            fast: vec![],
        };
        assert!(ic.build(&params(2, 0)).is_err());
    }

    #[test]
    fn test_first_violation_names_fast_index() {
        let layout = Layout::new(2, 3);
        let mut s = State::zeros(layout);
        s.fast_mut()[layout.fast_flat(1, 2)] = f64::INFINITY;
        let msg = s.first_violation(100.0).unwrap();
        assert!(msg.starts_with("Y[1,2]"), "{msg}");
    }

    #[test]
    fn test_first_violation_bound() {
        let layout = Layout::new(3, 0);
        let s = State::from_parts(layout, &[1.0, -250.0, 2.0], &[]).unwrap();
        assert!(s.first_violation(1000.0).is_none());
        assert_eq!(s.first_violation(100.0).unwrap(), "X[1] = -250");
    }
}
