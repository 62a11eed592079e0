// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Scaling Values
// ─────────────────────────────────────────────────────────────────────
//! Mean/standard-deviation scaling of the trainer's input blocks.
//!
//! The conditioning block (`X`) and the target block (`Y`) are each one
//! channel: a single mean/std over every value of the block. The trainer
//! normalizes with these and inverts them on generated samples.

use serde::{Deserialize, Serialize};

/// Mean and population standard deviation of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelScaling {
    pub mean: f64,
    pub std: f64,
}

impl ChannelScaling {
    /// Fit over `values`. An empty or constant channel gets std = 1 so
    /// normalization stays finite.
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { mean: 0.0, std: 1.0 };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        if std > 0.0 && std.is_finite() {
            Self { mean, std }
        } else {
            log::warn!("channel has zero variance (mean {mean:.4}); using std = 1");
            Self { mean, std: 1.0 }
        }
    }

    pub fn normalize(&self, values: &mut [f64]) {
        for v in values.iter_mut() {
            *v = (*v - self.mean) / self.std;
        }
    }

    pub fn denormalize(&self, values: &mut [f64]) {
        for v in values.iter_mut() {
            *v = *v * self.std + self.mean;
        }
    }
}

/// Scaling of a lagged table's conditioning (`X`) and target (`Y`) blocks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableScaling {
    pub conditioning: ChannelScaling,
    pub target: ChannelScaling,
}

impl TableScaling {
    pub fn fit(conditioning: &[f64], target: &[f64]) -> Self {
        Self {
            conditioning: ChannelScaling::fit(conditioning),
            target: ChannelScaling::fit(target),
        }
    }
}
