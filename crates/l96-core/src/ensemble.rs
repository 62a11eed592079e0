// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Ensembles
// ─────────────────────────────────────────────────────────────────────
//! Independent truth runs in parallel (rayon), one immutable parameter
//! set per member. Results come back in member order.

use std::sync::Arc;

use rayon::prelude::*;

use l96_data::Trajectory;
use l96_physics::{InitialCondition, Regime};
use l96_types::{L96Result, LorenzParams};

use crate::observer::ProgressObserver;
use crate::simulation::Simulation;

/// One ensemble member.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleMember {
    pub label: String,
    pub params: LorenzParams,
    pub initial: InitialCondition,
}

impl EnsembleMember {
    pub fn new(label: impl Into<String>, params: LorenzParams) -> Self {
        Self {
            label: label.into(),
            params,
            initial: InitialCondition::default(),
        }
    }

    pub fn with_initial(mut self, initial: InitialCondition) -> Self {
        self.initial = initial;
        self
    }
}

/// One member per forcing value, everything else from `base`.
pub fn forcing_sweep(base: &LorenzParams, forcings: &[f64]) -> Vec<EnsembleMember> {
    forcings
        .iter()
        .map(|&f| EnsembleMember::new(format!("F={f}"), LorenzParams { f, ..base.clone() }))
        .collect()
}

/// One member per named regime, integration settings from `template`.
pub fn regime_members(regimes: &[Regime], template: &LorenzParams) -> Vec<EnsembleMember> {
    regimes
        .iter()
        .map(|&r| {
            let physics = r.params();
            EnsembleMember::new(
                r.name(),
                LorenzParams {
                    k: physics.k,
                    j: physics.j,
                    h: physics.h,
                    b: physics.b,
                    c: physics.c,
                    f: physics.f,
                    ..template.clone()
                },
            )
        })
        .collect()
}

/// `n` members started from the forcing equilibrium, member `m` nudged
/// by `m · scale`.
pub fn perturbed_members(base: &LorenzParams, n: usize, scale: f64) -> Vec<EnsembleMember> {
    (0..n)
        .map(|m| {
            EnsembleMember::new(format!("member-{m}"), base.clone()).with_initial(
                InitialCondition::PerturbedEquilibrium {
                    perturbation: m as f64 * scale,
                },
            )
        })
        .collect()
}

/// Run every member; the first failure aborts the ensemble.
///
/// Every member is validated before any integration starts.
pub fn run_ensemble(
    members: &[EnsembleMember],
    observer: Option<Arc<dyn ProgressObserver>>,
) -> L96Result<Vec<Trajectory>> {
    let sims = members
        .iter()
        .map(|m| {
            let mut sim = Simulation::new(m.params.clone())?.with_initial(m.initial.clone());
            if let Some(obs) = &observer {
                sim = sim.with_observer(Arc::clone(obs));
            }
            Ok(sim)
        })
        .collect::<L96Result<Vec<_>>>()?;

    log::info!("running ensemble of {} members", sims.len());
    let out = sims
        .par_iter()
        .zip(members.par_iter())
        .map(|(sim, m)| {
            sim.run().map_err(|e| {
                log::error!("ensemble member {} failed: {e}", m.label);
                e
            })
        })
        .collect::<L96Result<Vec<_>>>()?;
    log::info!("ensemble finished");
    Ok(out)
}
