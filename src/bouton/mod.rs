//! Presynaptic bouton: a Hodgkin Huxley membrane with voltage gated calcium
//! channels and presynaptic NMDA receptors on its plasma membrane, an ER with
//! ryanodine and IP3 receptors, and a vesicle pool releasing glutamate.

use serde::{Deserialize, Serialize};
use crate::calcium::{CalciumMicrodomain, EndoplasmicReticulum, RyanodineReceptor};
use crate::calcium::ip3_receptor::{Ip3Receptor, Ip3ReceptorParameters};
use crate::experiment::ExperimentConfig;
use crate::neuron::hodgkin_huxley::{HodgkinHuxleyMembrane, MembraneParameters};
use crate::neuron::ion_channels::{CalciumChannelParameters, IonChannel, VoltageGatedCalciumChannel};
use crate::neuron::receptors::{PresynapticNMDAParameters, PresynapticNMDAReceptor};
use crate::parameters::{PhysicalParameters, SimulationParameters};
use crate::series::{TimeSeries, Trajectories};
use crate::vesicles::{ReleaseModel, VesicleParameters, VesiclePool};


/// Pharmacological block applied for a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blockers {
    /// NMDA receptor antagonist
    pub ap5: bool,
    /// Ryanodine receptor block
    pub ryr: bool,
}

/// Bouton constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoutonParameters {
    pub membrane: MembraneParameters,
    pub vgcc: CalciumChannelParameters,
    pub nmda: PresynapticNMDAParameters,
    pub ryr: RyanodineReceptor,
    pub ip3_receptor: Ip3ReceptorParameters,
    /// Resting bouton calcium (nM)
    pub calcium_rest: f64,
    /// Resting ER calcium (nM)
    pub er_calcium_rest: f64,
    /// Calcium decay time constant (ms)
    pub tau_dec: f64,
    /// Distance from the VGCC cluster to the vesicles (um)
    pub vgcc_distance: f64,
    /// Distance from the NMDA receptor cluster to the vesicles (um)
    pub nmda_distance: f64,
    /// Number of VGCCs contributing to global calcium
    pub vgcc_count: f64,
    /// Number of NMDA receptors contributing to global calcium
    pub nmda_count: f64,
    /// Ratio of bouton volume to microdomain volume
    pub bouton_volume: f64,
    /// Whether plasma membrane pump and leak currents are recorded
    pub plasma_membrane_fluxes: bool,
    /// Maximal plasma membrane pump current (uA/cm^2)
    pub i_pump_max: f64,
    /// Pump affinity (nM), Erler et al (2004)
    pub k_pump: f64,
    /// Plasma membrane calcium leak (mS/cm^2)
    pub g_ca_leak: f64,
}

impl Default for BoutonParameters {
    fn default() -> Self {
        BoutonParameters {
            membrane: MembraneParameters::default(),
            vgcc: CalciumChannelParameters::default(),
            nmda: PresynapticNMDAParameters::default(),
            ryr: RyanodineReceptor::default(),
            ip3_receptor: Ip3ReceptorParameters::default(),
            calcium_rest: 100.,
            er_calcium_rest: 5e6,
            tau_dec: 100.,
            vgcc_distance: 0.090,
            nmda_distance: 0.030,
            vgcc_count: 33.,
            nmda_count: 33.,
            bouton_volume: 100.,
            plasma_membrane_fluxes: false,
            i_pump_max: 0.225,
            k_pump: 100.,
            g_ca_leak: 0.001022664392140,
        }
    }
}

/// Running sum of a trajectory, untouched while the channel is blocked
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
    pub sum: f64,
    pub count: usize,
}

impl RunningMean {
    pub fn accumulate(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Mean of every accumulated value, `None` if nothing was accumulated
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// State and trajectories of a bouton
#[derive(Debug, Clone, Trajectories)]
pub struct Bouton {
    pub params: BoutonParameters,
    /// Calcium reversal potential (mV)
    pub e_ca: f64,
    #[trajectory(flatten)]
    pub membrane: HodgkinHuxleyMembrane,
    pub vgcc: VoltageGatedCalciumChannel,
    pub nmda_receptor: PresynapticNMDAReceptor,
    #[trajectory(flatten)]
    pub ca_vgcc: CalciumMicrodomain,
    #[trajectory(flatten)]
    pub ca_ryr: CalciumMicrodomain,
    #[trajectory(flatten)]
    pub ca_nmda: CalciumMicrodomain,
    #[trajectory(flatten)]
    pub er: EndoplasmicReticulum,
    #[trajectory(flatten)]
    pub ip3_receptor: Ip3Receptor,
    #[trajectory(flatten)]
    pub vesicles: VesiclePool,
    /// Calcium near the vesicles (nM)
    pub ca_local: TimeSeries,
    /// Bouton average calcium (nM)
    pub ca_global: TimeSeries,
    /// VGCC calcium current (uA/cm^2)
    pub i_vgcc: TimeSeries,
    /// NMDA receptor calcium current (uA/cm^2)
    pub i_nmda: TimeSeries,
    /// Plasma membrane pump current (uA/cm^2)
    pub i_pump: TimeSeries,
    /// Plasma membrane calcium leak (uA/cm^2)
    pub i_ca_leak: TimeSeries,
    pub nmda_mean: RunningMean,
    delay: usize,
}

impl Bouton {
    pub fn new(
        ex: &ExperimentConfig,
        params: &BoutonParameters,
        vesicle_params: &VesicleParameters,
        release_model: &ReleaseModel,
        physical: &PhysicalParameters,
    ) -> Self {
        let len = ex.horizon();
        let e_ca = physical.calcium_reversal(params.calcium_rest);

        Bouton {
            params: *params,
            e_ca,
            membrane: HodgkinHuxleyMembrane::new(len, &params.membrane),
            vgcc: VoltageGatedCalciumChannel::new(params.vgcc, e_ca, params.membrane.v_rest),
            nmda_receptor: PresynapticNMDAReceptor::new(&params.nmda, e_ca),
            ca_vgcc: CalciumMicrodomain::new(len, params.vgcc_distance, params.tau_dec),
            ca_ryr: CalciumMicrodomain::new(len, 0., params.tau_dec),
            ca_nmda: CalciumMicrodomain::new(len, params.nmda_distance, params.tau_dec),
            er: EndoplasmicReticulum::new(len, params.er_calcium_rest),
            ip3_receptor: Ip3Receptor::new(len, params.ip3_receptor),
            vesicles: VesiclePool::new(len, *vesicle_params, release_model.clone(), params.calcium_rest),
            ca_local: TimeSeries::with_initial(len, params.calcium_rest),
            ca_global: TimeSeries::with_initial(len, params.calcium_rest),
            i_vgcc: TimeSeries::zeros(len),
            i_nmda: TimeSeries::zeros(len),
            i_pump: TimeSeries::zeros(len),
            i_ca_leak: TimeSeries::zeros(len),
            nmda_mean: RunningMean::default(),
            delay: ex.delay_steps(),
        }
    }

    /// Builds a bouton from the full parameter set
    pub fn from_parameters(ex: &ExperimentConfig, params: &SimulationParameters) -> Self {
        Bouton::new(
            ex,
            &params.bouton,
            &params.bouton_vesicles,
            &params.release_model,
            &params.physical,
        )
    }

    /// Lag of the RyR and NMDA receptor delay lines in steps
    pub fn delay_steps(&self) -> usize {
        self.delay
    }

    fn plasma_membrane_currents(&self, voltage: f64, calcium: f64) -> (f64, f64) {
        let p = &self.params;
        let pump = p.i_pump_max * calcium.powi(2) / (calcium.powi(2) + p.k_pump.powi(2));

        (pump, p.g_ca_leak * (voltage - self.e_ca))
    }

    /// Advances every bouton compartment from `i` to `i + 1`, `extrasynaptic_glutamate`
    /// is the astrocyte's glutamate at `i` (mM)
    pub fn step(
        &mut self,
        i: usize,
        ex: &ExperimentConfig,
        extrasynaptic_glutamate: f64,
        blockers: Blockers,
        physical: &PhysicalParameters,
    ) {
        let dt = ex.delta_t;
        let voltage = self.membrane.v[i];
        let p = self.params;

        self.membrane.step(i, dt, ex.iapp[i]);

        if p.plasma_membrane_fluxes {
            let (pump, leak) = self.plasma_membrane_currents(voltage, self.ca_local[i]);
            self.i_pump[i] = pump;
            self.i_ca_leak[i] = leak;
        }

        self.vgcc.update_current(voltage, dt);
        self.i_vgcc[i] = self.vgcc.get_current();
        let flux_vgcc = self.ca_vgcc.flux_from_current(self.i_vgcc[i], physical);
        self.ca_vgcc.relax(i, dt, flux_vgcc);

        let mut flux_ryr = 0.;
        if !blockers.ryr && i > self.delay {
            let lagged = i - self.delay;
            flux_ryr = p.ryr.cicr_flux(self.ca_local[lagged], self.er.calcium[lagged]);
            self.ca_ryr.relax(i, dt, flux_ryr);
        } else {
            self.ca_ryr.clamp_to_rest(i);
        }

        let flux_ip3r = self.ip3_receptor.step(
            i, dt, self.ca_global[i], self.er.calcium[i], extrasynaptic_glutamate, physical,
        );
        self.er.step(i, dt, flux_ryr, self.ca_ryr.relaxation(i), flux_ip3r, physical);

        let mut flux_nmda = 0.;
        if !blockers.ap5 {
            let current = if i > self.delay {
                let glutamate = self.vesicles.glutamate[i - self.delay];
                self.nmda_receptor.calcium_current(dt, glutamate, voltage)
            } else {
                0.
            };
            self.i_nmda[i] = current;

            flux_nmda = self.ca_nmda.flux_from_current(current, physical);
            self.ca_nmda.relax(i, dt, flux_nmda);
            self.nmda_mean.accumulate(self.ca_nmda.concentration[i + 1]);
        }

        let ca_local = self.ca_local[i];
        self.ca_local[i + 1] = ca_local
            + dt * (flux_vgcc + flux_ryr + flux_nmda - (ca_local - p.calcium_rest) / p.tau_dec);

        let ca_global = self.ca_global[i];
        self.ca_global[i + 1] = ca_global
            + dt * (
                p.vgcc_count * flux_vgcc / p.bouton_volume
                + flux_ryr / p.bouton_volume
                + p.nmda_count * flux_nmda / p.bouton_volume
                + flux_ip3r / p.bouton_volume
                - (ca_global - p.calcium_rest) / p.tau_dec
            );

        self.vesicles.release(i, ex, voltage, p.membrane.v_rest, ca_local);
    }
}
