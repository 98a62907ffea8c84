//! Calcium compartments of the bouton: channel microdomains, the ryanodine
//! receptor and the endoplasmic reticulum store.

use serde::{Deserialize, Serialize};
use crate::parameters::PhysicalParameters;
use crate::series::{TimeSeries, Trajectories};

pub mod ip3_receptor;


/// Local calcium at a fixed distance from a channel cluster, relaxing
/// exponentially toward `rest`
#[derive(Debug, Clone, Trajectories)]
pub struct CalciumMicrodomain {
    /// Distance from the channel cluster to the vesicles (um)
    pub distance: f64,
    /// Decay time constant (ms)
    pub tau_dec: f64,
    /// Baseline concentration (nM)
    pub rest: f64,
    /// Calcium concentration (nM)
    pub concentration: TimeSeries,
}

impl CalciumMicrodomain {
    pub fn new(len: usize, distance: f64, tau_dec: f64) -> Self {
        CalciumMicrodomain {
            distance,
            tau_dec,
            rest: 0.,
            concentration: TimeSeries::with_initial(len, 0.),
        }
    }

    /// Rate of change of calcium (nM/ms) produced by `current` at this distance
    pub fn flux_from_current(&self, current: f64, physical: &PhysicalParameters) -> f64 {
        physical.current_to_flux(current, self.distance)
    }

    /// Relaxation term `(c[i] - rest) / tau_dec` at step `i`
    pub fn relaxation(&self, i: usize) -> f64 {
        (self.concentration[i] - self.rest) / self.tau_dec
    }

    /// Integrates the pool from `i` to `i + 1` given the influx at `i`
    pub fn relax(&mut self, i: usize, dt: f64, flux: f64) {
        self.concentration[i + 1] = self.concentration[i] + dt * (flux - self.relaxation(i));
    }

    /// Holds the pool at baseline for step `i + 1`
    pub fn clamp_to_rest(&mut self, i: usize) {
        self.concentration[i + 1] = self.rest;
    }
}

/// Calcium induced calcium release through ryanodine receptors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RyanodineReceptor {
    /// Maximal release rate (ms^-1)
    pub v_ryr: f64,
    /// Calcium at half activation (nM)
    pub k_ryr: f64,
    /// Hill coefficient of activation
    pub n_ryr: f64,
}

impl Default for RyanodineReceptor {
    fn default() -> Self {
        RyanodineReceptor {
            v_ryr: 5e-6,
            k_ryr: 800.,
            n_ryr: 3.,
        }
    }
}

impl RyanodineReceptor {
    /// Release flux (nM/ms) from the store given cytosolic and ER calcium (nM)
    pub fn cicr_flux(&self, calcium: f64, er_calcium: f64) -> f64 {
        let activation = calcium.powf(self.n_ryr);

        self.v_ryr * activation / (activation + self.k_ryr.powf(self.n_ryr))
            * (er_calcium - calcium)
    }
}

/// Calcium content of the endoplasmic reticulum
#[derive(Debug, Clone, Trajectories)]
pub struct EndoplasmicReticulum {
    /// ER calcium concentration (nM)
    pub calcium: TimeSeries,
}

impl EndoplasmicReticulum {
    pub fn new(len: usize, resting_calcium: f64) -> Self {
        EndoplasmicReticulum {
            calcium: TimeSeries::with_initial(len, resting_calcium),
        }
    }

    /// Depletes the store by the RyR flux net of its microdomain relaxation and by
    /// the IP3 receptor flux into the cytosol, both scaled by the ER volume ratio
    pub fn step(
        &mut self,
        i: usize,
        dt: f64,
        ryr_flux: f64,
        ryr_relaxation: f64,
        ip3r_flux: f64,
        physical: &PhysicalParameters,
    ) {
        let c1 = physical.er_volume_ratio;
        self.calcium[i + 1] = self.calcium[i]
            - dt * ((ryr_flux - ryr_relaxation) / c1)
            - dt * ip3r_flux / c1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microdomain_relaxes_to_zero() {
        let mut domain = CalciumMicrodomain::new(2001, 0.09, 100.);
        domain.concentration[0] = 500.;

        for i in 0..2000 {
            domain.relax(i, 0.05, 0.);
        }

        let last = domain.concentration.last().unwrap_or(f64::NAN);
        assert!(last < 500. * (-1_f64).exp());
        assert!(last > 0.);
    }

    #[test]
    fn test_cicr_half_activation() {
        let ryr = RyanodineReceptor::default();
        let flux = ryr.cicr_flux(800., 5e6);

        assert!((flux - 0.5 * 5e-6 * (5e6 - 800.)).abs() < 1e-9);
        assert_eq!(ryr.cicr_flux(0., 5e6), 0.);
    }

    #[test]
    fn test_er_depleted_by_release() {
        let physical = PhysicalParameters::default();
        let mut er = EndoplasmicReticulum::new(3, 5e6);

        er.step(0, 0.05, 1., 0., 0., &physical);
        er.step(1, 0.05, 0., 0., 0., &physical);

        assert!(er.calcium[1] < 5e6);
        assert_eq!(er.calcium[2], er.calcium[1]);
    }
}
