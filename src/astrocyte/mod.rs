//! Astrocyte IP3/calcium oscillator of De Pitta et al (2009) with stochastic
//! IP3 receptor gating, gliotransmitter release into the extrasynaptic cleft and
//! ligand gated membrane receptors.

use serde::{Deserialize, Serialize};
use crate::calcium::ip3_receptor::Ip3rKinetics;
use crate::distribution::UniformSource;
use crate::error::{InstabilityDiagnostics, NumericalInstabilityError};
use crate::experiment::ExperimentConfig;
use crate::parameters::{PhysicalParameters, SimulationParameters};
use crate::series::{TimeSeries, Trajectories};
use crate::vesicles::{DockingSitesRelease, ReleaseModel, VesicleParameters, VesiclePool};

pub mod receptors;

use receptors::{AstrocyteReceptor, AstrocyteReceptors};


/// Astrocyte constants, De Pitta et al (2009) unless noted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AstrocyteParameters {
    /// Number of IP3 receptors in a cluster, Nadkarni & Jung (2007)
    pub channels: f64,
    /// Total cell free calcium (nM)
    pub total_calcium: f64,
    pub kinetics: Ip3rKinetics,
    /// Maximal rate of calcium leak from the ER (ms^-1)
    pub v2: f64,
    /// Maximal SERCA uptake (nM/ms)
    pub v3: f64,
    /// SERCA calcium affinity (nM)
    pub k3: f64,
    /// Maximal IP3 production by PLC beta (nM/ms)
    pub v_plcb: f64,
    /// Maximal IP3 production by PLC delta (nM/ms)
    pub v_plcd: f64,
    /// Inhibition constant of PLC delta activity (nM)
    pub k_plcd: f64,
    /// Calcium affinity of PLC delta (nM)
    pub k_plcd_calcium: f64,
    /// Maximal degradation by IP-5P (ms^-1)
    pub r_5p: f64,
    /// Glutamate affinity of the receptor (mM)
    pub k_r: f64,
    /// Calcium/PKC dependent inhibition factor (mM)
    pub k_p: f64,
    /// Calcium affinity of PKC (nM)
    pub k_pi: f64,
    /// Maximal degradation by IP3-3K (nM/ms)
    pub v_3k: f64,
    /// Calcium affinity of IP3-3K (nM)
    pub k_d: f64,
    /// IP3 affinity of IP3-3K (nM)
    pub k_3k: f64,
    /// Resting membrane potential (mV)
    pub v_rest: f64,
    /// Initial calcium (nM)
    pub calcium_init: f64,
    /// Initial IP3 receptor gate
    pub gate_init: f64,
    /// Initial IP3 (nM)
    pub ip3_init: f64,
    pub receptors: AstrocyteReceptors,
}

impl Default for AstrocyteParameters {
    fn default() -> Self {
        AstrocyteParameters {
            channels: 20.,
            total_calcium: 2e3,
            kinetics: Ip3rKinetics { v1: 6e-3, ..Ip3rKinetics::default() },
            v2: 0.11e-3,
            v3: 0.9,
            k3: 0.1e3,
            v_plcb: 0.5,
            v_plcd: 0.05,
            k_plcd: 1.5e3,
            k_plcd_calcium: 0.1e3,
            r_5p: 0.05e-3,
            k_r: 1.3e-3,
            k_p: 10e-3,
            k_pi: 0.6e3,
            v_3k: 2.,
            k_d: 0.7e3,
            k_3k: 1e3,
            v_rest: -85.,
            calcium_init: 100.,
            gate_init: 0.5,
            ip3_init: 160.,
            receptors: AstrocyteReceptors::default(),
        }
    }
}

/// IP3 production and degradation terms (nM/ms)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ip3Terms {
    /// Agonist dependent production
    pub glutamate: f64,
    /// Agonist independent production by PLC delta
    pub plc_delta: f64,
    /// Degradation by IP3-3K
    pub kinase: f64,
    /// Degradation by IP-5P
    pub phosphatase: f64,
}

impl Ip3Terms {
    pub fn net(&self) -> f64 {
        self.glutamate + self.plc_delta - self.kinase - self.phosphatase
    }
}

/// State and trajectories of the astrocyte
#[derive(Debug, Clone, Trajectories)]
pub struct Astrocyte {
    pub params: AstrocyteParameters,
    pub receptors: AstrocyteReceptors,
    /// Cytosolic calcium (nM)
    pub calcium: TimeSeries,
    /// IP3 receptor gate
    pub gate: TimeSeries,
    /// IP3 concentration (nM)
    pub ip3: TimeSeries,
    #[trajectory(flatten)]
    pub vesicles: VesiclePool,
    pub i_ampa: TimeSeries,
    pub i_nmda: TimeSeries,
    pub i_p2x: TimeSeries,
    /// ATP evoked calcium influx rate (uM/s)
    pub atp_calcium_influx: TimeSeries,
    /// PLC beta drive from P2Y receptors (nM/ms)
    pub plc_beta: TimeSeries,
    /// Steps whose gate noise fell outside `[0, 1]`
    pub noise_rejections: usize,
}

impl Astrocyte {
    pub fn new(ex: &ExperimentConfig, params: &AstrocyteParameters, vesicle_params: &VesicleParameters) -> Self {
        let len = ex.horizon();

        Astrocyte {
            params: *params,
            receptors: params.receptors,
            calcium: TimeSeries::with_initial(len, params.calcium_init),
            gate: TimeSeries::with_initial(len, params.gate_init),
            ip3: TimeSeries::with_initial(len, params.ip3_init),
            vesicles: VesiclePool::new(
                len,
                *vesicle_params,
                ReleaseModel::DockingSites(DockingSitesRelease::default()),
                params.calcium_init,
            ),
            i_ampa: TimeSeries::zeros(len),
            i_nmda: TimeSeries::zeros(len),
            i_p2x: TimeSeries::zeros(len),
            atp_calcium_influx: TimeSeries::zeros(len),
            plc_beta: TimeSeries::zeros(len),
            noise_rejections: 0,
        }
    }

    /// Builds an astrocyte from the full parameter set
    pub fn from_parameters(ex: &ExperimentConfig, params: &SimulationParameters) -> Self {
        Astrocyte::new(ex, &params.astrocyte, &params.astrocyte_vesicles)
    }

    /// Extrasynaptic glutamate at step `i` (mM)
    pub fn extrasynaptic_glutamate(&self, i: usize) -> f64 {
        self.vesicles.glutamate[i]
    }

    /// IP3 production and degradation given synaptic glutamate (mM)
    pub fn ip3_terms(&self, calcium: f64, ip3: f64, synaptic_glutamate: f64) -> Ip3Terms {
        let p = &self.params;

        let pkc_inhibition = 1. + (p.k_p / p.k_r) * (calcium / (calcium + p.k_pi));
        let agonist = synaptic_glutamate.max(0.).powf(0.7);

        Ip3Terms {
            glutamate: p.v_plcb * agonist / (agonist + (p.k_r * pkc_inhibition).powf(0.7)),
            plc_delta: p.v_plcd / (1. + ip3 / p.k_plcd)
                * calcium.powi(2) / (calcium.powi(2) + p.k_plcd_calcium.powi(2)),
            kinase: p.v_3k * calcium.powi(4) / (calcium.powi(4) + p.k_d.powi(4))
                * ip3 / (ip3 + p.k_3k),
            phosphatase: p.r_5p * ip3,
        }
    }

    /// Advances the oscillator, its vesicles and receptors from `i` to `i + 1`,
    /// `since_release` is the time since the bouton's last evoked release (ms),
    /// exactly two uniforms are drawn from `source`
    pub fn step<U: UniformSource>(
        &mut self,
        i: usize,
        dt: f64,
        synaptic_glutamate: f64,
        since_release: Option<f64>,
        source: &mut U,
        physical: &PhysicalParameters,
    ) -> Result<(), NumericalInstabilityError> {
        let p = self.params;
        let (calcium, ip3, gate) = (self.calcium[i], self.ip3[i], self.gate[i]);

        let ip3_terms = self.ip3_terms(calcium, ip3, synaptic_glutamate);

        let gate_step = p.kinetics.stochastic_gate_step(ip3, calcium, gate, dt, p.channels, source);
        self.gate[i + 1] = gate_step.value;
        if !gate_step.noise_accepted {
            self.noise_rejections += 1;
        }

        let c1 = physical.er_volume_ratio;
        let er_calcium = (p.total_calcium - calcium) / c1;

        let j_chan = p.kinetics.channel_flux(ip3, calcium, gate, er_calcium, physical);
        let j_pump = p.v3 * calcium.powi(2) / (p.k3.powi(2) + calcium.powi(2));
        let j_leak = c1 * p.v2 * (calcium - er_calcium);

        let calcium_next = calcium + dt * (-j_chan - j_pump - j_leak);
        self.calcium[i + 1] = calcium_next;

        if !calcium_next.is_finite() || calcium_next < 0. {
            return Err(NumericalInstabilityError {
                compartment: "astrocyte",
                step: i,
                diagnostics: InstabilityDiagnostics {
                    calcium_next,
                    calcium_prior: calcium,
                    gate,
                    j_chan,
                    j_pump,
                    j_leak,
                },
            });
        }

        self.ip3[i + 1] = ip3 + dt * ip3_terms.net();

        self.vesicles.release_step(i, dt, calcium);

        let voltage = p.v_rest;
        self.receptors.p2x.set_since_release(since_release);
        let atp = self.receptors.p2x.atp();

        self.i_ampa[i] = self.receptors.ampa.current(dt, synaptic_glutamate, voltage);
        self.i_nmda[i] = self.receptors.nmda.current(dt, synaptic_glutamate, voltage);
        self.i_p2x[i] = self.receptors.p2x.current(dt, atp, voltage);
        self.atp_calcium_influx[i] = self.receptors.p2x.calcium_influx_rate();
        self.plc_beta[i] = self.receptors.p2y.current(dt, atp, voltage);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::SeededUniform;
    use crate::error::SimulationError;
    use crate::experiment::build_train;
    use crate::parameters::StimulusParameters;

    fn experiment() -> ExperimentConfig {
        build_train(75., 1., 1, 0.05, true, &StimulusParameters::default())
            .expect("valid experiment")
    }

    #[test]
    fn test_resting_astrocyte_stays_valid() -> Result<(), SimulationError> {
        let params = SimulationParameters::default();
        let ex = experiment();
        let mut astrocyte = Astrocyte::from_parameters(&ex, &params);
        let mut source = SeededUniform::new(3);

        for i in 0..ex.steps {
            astrocyte.step(i, ex.delta_t, 0., None, &mut source, &params.physical)?;
        }

        assert_eq!(source.draws(), 2 * ex.steps as u64);
        assert!(astrocyte.calcium.iter().all(|x| *x >= 0.));
        assert!(astrocyte.gate.iter().all(|x| (0. ..=1.).contains(x)));
        assert!(astrocyte.ip3.iter().all(|x| *x >= 0.));
        // no gliotransmission at rest
        assert!(astrocyte.vesicles.e.iter().all(|x| *x == 0.));

        Ok(())
    }

    #[test]
    fn test_glutamate_drives_ip3_production() {
        let astrocyte = Astrocyte::from_parameters(&experiment(), &SimulationParameters::default());

        let quiet = astrocyte.ip3_terms(100., 160., 0.);
        let driven = astrocyte.ip3_terms(100., 160., 1.);
        assert_eq!(quiet.glutamate, 0.);
        assert!(driven.glutamate > 0.4);
        assert!(driven.net() > quiet.net());
    }

    #[test]
    fn test_runaway_pump_reports_instability() {
        let mut params = SimulationParameters::default();
        params.astrocyte.v3 = 1e9;
        let ex = experiment();
        let mut astrocyte = Astrocyte::from_parameters(&ex, &params);
        let mut source = SeededUniform::new(3);

        let err = astrocyte.step(0, ex.delta_t, 0., None, &mut source, &params.physical)
            .expect_err("calcium must become negative");

        assert_eq!(err.compartment, "astrocyte");
        assert_eq!(err.step, 0);
        assert!(err.diagnostics.calcium_next < 0.);
        assert_eq!(err.diagnostics.calcium_prior, 100.);
        assert!(err.diagnostics.j_pump > 1e8);
        assert!(!format!("{}", err).is_empty());
    }

    #[test]
    fn test_p2x_window_after_release() -> Result<(), SimulationError> {
        let params = SimulationParameters::default();
        let ex = experiment();
        let mut astrocyte = Astrocyte::from_parameters(&ex, &params);
        let mut source = SeededUniform::new(3);

        astrocyte.step(0, ex.delta_t, 0., Some(0.), &mut source, &params.physical)?;
        astrocyte.step(1, ex.delta_t, 0., Some(2.), &mut source, &params.physical)?;

        assert!(astrocyte.i_p2x[0] > 0.);
        assert!(astrocyte.atp_calcium_influx[0] > 0.);
        assert_eq!(astrocyte.i_p2x[1], 0.);

        Ok(())
    }
}
