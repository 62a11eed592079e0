// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Two-Scale Vector Field
// ─────────────────────────────────────────────────────────────────────
//! Tendencies of the two-timescale Lorenz-96 system:
//!
//!   dX_i/dt     = −X_{i−1}(X_{i−2} − X_{i+1}) − X_i + F − (h·c/b)·Σ_j Y_{i,j}
//!   dY_{i,j}/dt = −c·b·Y_{i,j+1}(Y_{i,j+2} − Y_{i,j−1}) − c·Y_{i,j} + (h·c/b)·X_i
//!
//! Slow indices wrap modulo K; fast neighbours wrap on the single K·J ring.
//! With J = 0 the fast term vanishes and the slow equation is the
//! single-scale Lorenz-96 model.

use rayon::prelude::*;

use l96_types::{Layout, LorenzParams};

/// Fast ring length above which fast tendencies are computed in parallel.
const PAR_FAST_THRESHOLD: usize = 1 << 14;

/// Autonomous ODE right-hand side over a flat state vector.
pub trait VectorField: Send + Sync {
    /// Length of the state vector.
    fn dim(&self) -> usize;

    /// Write d(state)/dt into `out`. Both slices have length `dim()`.
    fn eval(&self, state: &[f64], out: &mut [f64]);
}

/// The two-scale Lorenz-96 system for one fixed parameter set.
#[derive(Debug, Clone)]
pub struct TwoScaleL96 {
    layout: Layout,
    forcing: f64,
    /// h·c/b
    coupling: f64,
    /// c·b
    advection: f64,
    /// c
    damping: f64,
}

impl TwoScaleL96 {
    pub fn new(params: &LorenzParams) -> Self {
        Self {
            layout: params.layout(),
            forcing: params.f,
            coupling: params.coupling(),
            advection: params.c * params.b,
            damping: params.c,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Slow tendencies only; `fast` may be empty when J = 0.
    pub fn slow_tendencies(&self, slow: &[f64], fast: &[f64], dslow: &mut [f64]) {
        let layout = self.layout;
        for (i, d) in dslow.iter_mut().enumerate() {
            let xm1 = slow[layout.slow_neighbor(i, -1)];
            let xm2 = slow[layout.slow_neighbor(i, -2)];
            let xp1 = slow[layout.slow_neighbor(i, 1)];
            let block_sum: f64 = fast[layout.fast_block(i)].iter().sum();
            *d = -xm1 * (xm2 - xp1) - slow[i] + self.forcing - self.coupling * block_sum;
        }
    }

    #[inline]
    fn fast_tendency(&self, n: usize, slow: &[f64], fast: &[f64]) -> f64 {
        let layout = self.layout;
        let yp1 = fast[layout.fast_neighbor(n, 1)];
        let yp2 = fast[layout.fast_neighbor(n, 2)];
        let ym1 = fast[layout.fast_neighbor(n, -1)];
        let owner = n / layout.j;
        -self.advection * yp1 * (yp2 - ym1) - self.damping * fast[n] + self.coupling * slow[owner]
    }

    /// Fast tendencies; a no-op when J = 0.
    pub fn fast_tendencies(&self, slow: &[f64], fast: &[f64], dfast: &mut [f64]) {
        if self.layout.j == 0 {
            return;
        }
        // Each slot reads only the previous state, so the parallel path is
        // bit-identical to the sequential one.
        if dfast.len() >= PAR_FAST_THRESHOLD {
            dfast
                .par_iter_mut()
                .enumerate()
                .for_each(|(n, d)| *d = self.fast_tendency(n, slow, fast));
        } else {
            for (n, d) in dfast.iter_mut().enumerate() {
                *d = self.fast_tendency(n, slow, fast);
            }
        }
    }
}

impl VectorField for TwoScaleL96 {
    fn dim(&self) -> usize {
        self.layout.state_len()
    }

    fn eval(&self, state: &[f64], out: &mut [f64]) {
        let k = self.layout.k;
        let (slow, fast) = state.split_at(k);
        let (dslow, dfast) = out.split_at_mut(k);
        self.slow_tendencies(slow, fast, dslow);
        self.fast_tendencies(slow, fast, dfast);
    }
}
