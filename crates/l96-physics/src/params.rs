// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Canonical Parameters
// ─────────────────────────────────────────────────────────────────────
//! Named parameter regimes of the two-scale Lorenz-96 system.
//!
//! Sources:
//!   - Lorenz (1996), "Predictability: a problem partly solved"
//!   - Wilks (2005), QJRMS 131, parameterization experiments
//!   - Arnold, Moroz & Palmer (2013), stochastic parameterization tests
//!
//! Every regime keeps the integration settings (Δt, step counts, burn-in,
//! stride) of [`LorenzParams::default`]; only the physics changes.

use l96_types::LorenzParams;

/// A named physical regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// K=8, J=32, F=30: the truth run the GAN trainer is fed by default.
    GanTruth,
    /// K=36, J=10, F=10.
    Lorenz1996,
    /// K=8, J=32, F=18.
    Wilks2005,
    /// K=8, J=32, F=20.
    Arnold2013,
    /// K=40, J=0, F=8: classic single-scale chaos.
    SingleScale,
}

impl Regime {
    pub const ALL: [Regime; 5] = [
        Regime::GanTruth,
        Regime::Lorenz1996,
        Regime::Wilks2005,
        Regime::Arnold2013,
        Regime::SingleScale,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Regime::GanTruth => "gan-truth",
            Regime::Lorenz1996 => "lorenz-1996",
            Regime::Wilks2005 => "wilks-2005",
            Regime::Arnold2013 => "arnold-2013",
            Regime::SingleScale => "single-scale",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    /// (K, J, h, b, c, F)
    fn physics(self) -> (usize, usize, f64, f64, f64, f64) {
        match self {
            Regime::GanTruth => (8, 32, 1.0, 10.0, 10.0, 30.0),
            Regime::Lorenz1996 => (36, 10, 1.0, 10.0, 10.0, 10.0),
            Regime::Wilks2005 => (8, 32, 1.0, 10.0, 10.0, 18.0),
            Regime::Arnold2013 => (8, 32, 1.0, 10.0, 10.0, 20.0),
            Regime::SingleScale => (40, 0, 1.0, 10.0, 10.0, 8.0),
        }
    }

    /// Full parameter set for this regime.
    pub fn params(self) -> LorenzParams {
        let (k, j, h, b, c, f) = self.physics();
        LorenzParams {
            k,
            j,
            h,
            b,
            c,
            f,
            ..LorenzParams::default()
        }
    }
}

/// Model time units per "day" in Lorenz's scaling (one day ≈ 0.2 units).
pub const MTU_PER_DAY: f64 = 0.2;

/// Steps of `time_step` covering `days` of model time, rounded up.
pub fn steps_for_days(days: f64, time_step: f64) -> u64 {
    (days * MTU_PER_DAY / time_step).ceil().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_gan_truth() {
        assert_eq!(Regime::GanTruth.params(), LorenzParams::default());
    }

    #[test]
    fn test_all_regimes_validate() {
        for r in Regime::ALL {
            assert!(r.params().validate().is_ok(), "{} invalid", r.name());
        }
    }

    #[test]
    fn test_names_roundtrip() {
        for r in Regime::ALL {
            assert_eq!(Regime::from_name(r.name()), Some(r));
        }
        assert_eq!(Regime::from_name("nope"), None);
    }

    #[test]
    fn test_single_scale_has_no_fast_variables() {
        let p = Regime::SingleScale.params();
        assert_eq!(p.layout().n_fast(), 0);
        assert_eq!(p.f, 8.0);
    }

    #[test]
    fn test_steps_for_days() {
        // 5 days = 1 MTU = 1000 steps of 0.001
        assert_eq!(steps_for_days(5.0, 0.001), 1000);
        assert_eq!(steps_for_days(0.0, 0.001), 0);
    }
}
