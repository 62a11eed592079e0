// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Truth-Run Driver
// ─────────────────────────────────────────────────────────────────────
//! One truth run: seed, integrate, retain, finalize.
//!
//! States that burn-in and stride retention would discard are dropped as
//! they are produced, so memory holds only the retained trajectory.

use std::sync::Arc;

use l96_data::{Retention, Trajectory, TrajectoryStore};
use l96_physics::{InitialCondition, Integrator};
use l96_types::{L96Result, LorenzParams};

use crate::observer::{Progress, ProgressObserver};

/// Snapshots per run when no explicit interval is set.
const DEFAULT_REPORTS: u64 = 20;

/// Configured truth run over one immutable parameter set.
#[derive(Clone)]
pub struct Simulation {
    params: LorenzParams,
    initial: InitialCondition,
    observer: Option<Arc<dyn ProgressObserver>>,
    report_every: u64,
}

impl Simulation {
    /// Validates `params`.
    pub fn new(params: LorenzParams) -> L96Result<Self> {
        params.validate()?;
        let report_every = (params.num_steps / DEFAULT_REPORTS).max(1);
        Ok(Self {
            params,
            initial: InitialCondition::default(),
            observer: None,
            report_every,
        })
    }

    pub fn with_initial(mut self, initial: InitialCondition) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Report every `n` steps (clamped to at least 1).
    pub fn with_report_every(mut self, n: u64) -> Self {
        self.report_every = n.max(1);
        self
    }

    pub fn params(&self) -> &LorenzParams {
        &self.params
    }

    pub fn initial(&self) -> &InitialCondition {
        &self.initial
    }

    /// Integrate and return the finalized trajectory.
    pub fn run(&self) -> L96Result<Trajectory> {
        let p = &self.params;
        let layout = p.layout();
        let mut integrator = Integrator::new(p)?;
        let initial = self.initial.build(p)?;
        let retention = Retention::new(p.burn_in, p.skip)?;
        let mut store = TrajectoryStore::retaining(layout, p.time_step, retention, p.retained_len());

        log::info!(
            "integrating K={} J={} F={} dt={} for {} steps (burn_in={}, skip={})",
            p.k,
            p.j,
            p.f,
            p.time_step,
            p.num_steps,
            p.burn_in,
            p.skip
        );

        let last = p.num_steps.saturating_sub(1);
        let every = self.report_every;
        let observer = self.observer.as_deref();
        integrator.run(initial, p.num_steps, |step, state| {
            store.record(step, state)?;
            if let Some(obs) = observer {
                if step % every == 0 || step == last {
                    obs.on_progress(&Progress::new(step, p.num_steps, p.time_step, state));
                }
            }
            Ok(())
        })?;

        let traj = store.finalize(p.burn_in, p.skip)?;
        log::info!(
            "integration finished: {} states retained of {}",
            traj.len(),
            p.num_steps
        );
        Ok(traj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::ProgressHistory;
    use l96_types::L96Error;

    fn small(num_steps: u64, burn_in: u64, skip: u64) -> LorenzParams {
        LorenzParams {
            k: 6,
            j: 4,
            num_steps,
            burn_in,
            skip,
            ..Default::default()
        }
    }

    #[test]
    fn test_retained_length_and_indices() {
        let p = small(100, 10, 7);
        let traj = Simulation::new(p.clone()).unwrap().run().unwrap();
        assert_eq!(traj.len(), p.retained_len());
        assert_eq!(traj.len(), 13);
        for (n, &s) in traj.steps().iter().enumerate() {
            assert_eq!(s, 10 + 7 * n as u64);
        }
    }

    #[test]
    fn test_burn_in_past_end_rejected() {
        assert!(matches!(
            Simulation::new(small(20, 50, 1)),
            Err(L96Error::Config(_))
        ));
    }

    #[test]
    fn test_runs_are_bit_identical() {
        let sim = Simulation::new(small(300, 0, 3)).unwrap();
        let a = sim.run().unwrap();
        let b = sim.run().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_matches_dense_integration() {
        let p = small(50, 5, 5);
        let traj = Simulation::new(p.clone()).unwrap().run().unwrap();

        let mut integrator = Integrator::new(&p).unwrap();
        let mut state = InitialCondition::Impulse.build(&p).unwrap();
        for _ in 0..traj.step(2) {
            state = integrator.step(&state).unwrap();
        }
        assert_eq!(traj.slow_at(2), state.slow());
        assert_eq!(traj.fast_at(2), state.fast());
    }

    #[test]
    fn test_observer_sees_interval_and_last_step() {
        let history = Arc::new(ProgressHistory::new());
        Simulation::new(small(25, 0, 1))
            .unwrap()
            .with_observer(history.clone())
            .with_report_every(10)
            .run()
            .unwrap();
        let steps: Vec<u64> = history.snapshots().iter().map(|p| p.step).collect();
        assert_eq!(steps, vec![0, 10, 20, 24]);
    }

    #[test]
    fn test_unstable_run_reports_step() {
        let p = LorenzParams {
            time_step: 0.5,
            ..small(200, 0, 1)
        };
        match Simulation::new(p).unwrap().run() {
            Err(L96Error::Unstable { step, .. }) => assert!(step >= 1),
            other => panic!("expected Unstable, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(Simulation::new(small(100, 0, 0)).is_err());
    }

    #[test]
    fn test_explicit_initial_condition() {
        let p = LorenzParams {
            k: 3,
            j: 0,
            ..small(10, 0, 1)
        };
        let traj = Simulation::new(p)
            .unwrap()
            .with_initial(InitialCondition::Explicit {
                slow: vec![2.0, 0.5, -1.0],
                fast: vec![],
            })
            .run()
            .unwrap();
        assert_eq!(traj.slow_at(0), &[2.0, 0.5, -1.0]);
    }
}
