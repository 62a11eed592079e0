// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Progress Observers
// ─────────────────────────────────────────────────────────────────────
//! Progress reporting hooks for long truth runs.
//!
//! The simulation driver hands a [`Progress`] snapshot to its observer
//! every `report_every` steps and once at the final step. Observers only
//! watch; they cannot stop or alter the run.

use parking_lot::Mutex;

use l96_physics::State;

/// Snapshot of a running integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub step: u64,
    pub num_steps: u64,
    pub time: f64,
    /// Mean of the slow variables.
    pub mean_x: f64,
    /// Largest |X_i|.
    pub max_abs_x: f64,
}

impl Progress {
    pub fn new(step: u64, num_steps: u64, dt: f64, state: &State) -> Self {
        let slow = state.slow();
        let mean_x = if slow.is_empty() {
            0.0
        } else {
            slow.iter().sum::<f64>() / slow.len() as f64
        };
        let max_abs_x = slow.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        Self {
            step,
            num_steps,
            time: step as f64 * dt,
            mean_x,
            max_abs_x,
        }
    }

    /// Completed fraction in [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.num_steps <= 1 {
            1.0
        } else {
            self.step as f64 / (self.num_steps - 1) as f64
        }
    }
}

/// Receives progress snapshots from a simulation.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &Progress);
}

/// Logs each snapshot at `info` level.
#[derive(Debug, Clone, Default)]
pub struct LogProgress {
    label: String,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ProgressObserver for LogProgress {
    fn on_progress(&self, p: &Progress) {
        log::info!(
            "{}step {}/{} ({:.1}%) t={:.3} mean X={:.4} max |X|={:.4}",
            if self.label.is_empty() {
                String::new()
            } else {
                format!("[{}] ", self.label)
            },
            p.step,
            p.num_steps,
            100.0 * p.fraction(),
            p.time,
            p.mean_x,
            p.max_abs_x
        );
    }
}

/// Keeps every snapshot for later inspection.
///
/// Thread-safe: the history is guarded by a `parking_lot::Mutex`.
#[derive(Debug, Default)]
pub struct ProgressHistory {
    history: Mutex<Vec<Progress>>,
}

impl ProgressHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Progress> {
        self.history.lock().clone()
    }

    pub fn last(&self) -> Option<Progress> {
        self.history.lock().last().copied()
    }

    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }
}

impl ProgressObserver for ProgressHistory {
    fn on_progress(&self, progress: &Progress) {
        self.history.lock().push(*progress);
    }
}

/// Observer backed by a caller-supplied closure.
type ProgressFn = Box<dyn Fn(&Progress) + Send + Sync>;

pub struct ExternalProgress {
    callback: ProgressFn,
}

impl ExternalProgress {
    pub fn new(callback: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl ProgressObserver for ExternalProgress {
    fn on_progress(&self, progress: &Progress) {
        (self.callback)(progress)
    }
}
