//! IP3 receptor kinetics of Shuai & Jung (2002) shared by the bouton ER and the
//! astrocyte, the astrocyte gate additionally receives Gaussian channel noise.

use serde::{Deserialize, Serialize};
use crate::distribution::{box_muller, UniformSource};
use crate::parameters::PhysicalParameters;
use crate::series::{TimeSeries, Trajectories};


/// Gating kinetics of an IP3 receptor cluster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ip3rKinetics {
    /// Maximal calcium flux through IP3 receptors (ms^-1)
    pub v1: f64,
    /// IP3 dissociation constant (nM)
    pub d1: f64,
    /// Inhibitory calcium dissociation constant (nM)
    pub d2: f64,
    /// IP3 dissociation constant (nM)
    pub d3: f64,
    /// Activation calcium dissociation constant (nM)
    pub d5: f64,
    /// Inhibitory calcium binding constant (nM^-1 * ms^-1)
    pub a2: f64,
}

impl Default for Ip3rKinetics {
    fn default() -> Self {
        Ip3rKinetics {
            v1: 10e-3,
            d1: 0.13e3,
            d2: 1.049e3,
            d3: 0.9434e3,
            d5: 0.08234e3,
            a2: 0.2e-6,
        }
    }
}

impl Ip3rKinetics {
    /// Steady state of IP3 binding `minf` and calcium activation `ninf`
    pub fn steady_states(&self, ip3: f64, calcium: f64) -> (f64, f64) {
        (ip3 / (ip3 + self.d1), calcium / (calcium + self.d5))
    }

    /// Opening and closing rates of the inactivation gate
    pub fn gate_rates(&self, ip3: f64, calcium: f64) -> (f64, f64) {
        (
            self.a2 * self.d2 * (ip3 + self.d1) / (ip3 + self.d3),
            self.a2 * calcium,
        )
    }

    /// Deterministic rate of change of the gate
    pub fn gate_drift(&self, ip3: f64, calcium: f64, gate: f64) -> f64 {
        let (aq, bq) = self.gate_rates(ip3, calcium);

        aq * (1. - gate) - bq * gate
    }

    /// Calcium flux through the channel (nM/ms), positive values move calcium
    /// from the cytosol into the ER
    pub fn channel_flux(
        &self,
        ip3: f64,
        calcium: f64,
        gate: f64,
        er_calcium: f64,
        physical: &PhysicalParameters,
    ) -> f64 {
        let (minf, ninf) = self.steady_states(ip3, calcium);

        physical.er_volume_ratio * self.v1 * minf.powi(3) * ninf.powi(3) * gate.powi(3)
            * (calcium - er_calcium)
    }

    /// Advances the gate with channel noise scaled by the number of channels in
    /// the cluster, two uniforms are drawn on every call, a candidate leaving
    /// `[0, 1]` (or a non-finite increment) falls back to the noiseless update
    pub fn stochastic_gate_step<U: UniformSource>(
        &self,
        ip3: f64,
        calcium: f64,
        gate: f64,
        dt: f64,
        channels: f64,
        source: &mut U,
    ) -> GateStep {
        let drift = self.gate_drift(ip3, calcium, gate);
        let u1 = source.next_uniform();
        let u2 = source.next_uniform();

        let covariance = drift / channels;
        let noise = box_muller(u1, u2, 2. * dt * covariance);

        // range check covers the full update, not only `gate + noise`, so an
        // accepted step never leaves the unit interval
        let candidate = dt * drift + gate + noise;
        if (0. ..=1.).contains(&candidate) {
            GateStep { value: candidate, noise_accepted: true }
        } else {
            GateStep { value: dt * drift + gate, noise_accepted: false }
        }
    }
}

/// Result of one stochastic gate update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateStep {
    /// Gate at the next step
    pub value: f64,
    /// Whether the noise term was used
    pub noise_accepted: bool,
}

/// Parameters of the bouton's IP3 receptors and their IP3 supply
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ip3ReceptorParameters {
    pub kinetics: Ip3rKinetics,
    /// Resting IP3 (nM)
    pub ip3_rest: f64,
    /// Initial gate
    pub gate_init: f64,
    /// Maximal IP3 production rate from mGluRs (nM/ms), Nadkarni & Jung (2008)
    pub v_glu: f64,
    /// Glutamate at which production is halved (mM)
    pub k_glu: f64,
    /// Hill exponent of production
    pub glu_exponent: f64,
    /// IP3 degradation time constant (ms)
    pub tau_ip3: f64,
    /// Whether the SERCA pump and ER leak fluxes are applied
    pub pump_and_leak: bool,
    /// Leak of calcium from the ER (ms^-1)
    pub v2: f64,
    /// Maximal SERCA rate (nM/ms)
    pub v3: f64,
    /// SERCA affinity (nM), Erler (2004)
    pub k3: f64,
}

impl Default for Ip3ReceptorParameters {
    fn default() -> Self {
        Ip3ReceptorParameters {
            kinetics: Ip3rKinetics::default(),
            ip3_rest: 160.,
            gate_init: 0.22,
            v_glu: 0.062,
            k_glu: 0.78e-3,
            glu_exponent: 0.7,
            tau_ip3: 1400.,
            pump_and_leak: false,
            v2: 0.2374e-3,
            v3: 90.,
            k3: 0.1e3,
        }
    }
}

/// Noiseless IP3 receptors of the bouton ER, IP3 is produced by extrasynaptic
/// glutamate released from the astrocyte
#[derive(Debug, Clone, Trajectories)]
pub struct Ip3Receptor {
    pub params: Ip3ReceptorParameters,
    /// IP3 concentration (nM)
    pub ip3: TimeSeries,
    /// Inactivation gate
    pub gate: TimeSeries,
}

impl Ip3Receptor {
    pub fn new(len: usize, params: Ip3ReceptorParameters) -> Self {
        Ip3Receptor {
            params,
            ip3: TimeSeries::with_initial(len, params.ip3_rest),
            gate: TimeSeries::with_initial(len, params.gate_init),
        }
    }

    /// SERCA uptake (nM/ms)
    pub fn serca_flux(&self, calcium: f64) -> f64 {
        let p = &self.params;

        p.v3 * calcium.powi(2) / (p.k3.powi(2) + calcium.powi(2))
    }

    /// Passive exchange between ER and cytosol (nM/ms)
    pub fn leak_flux(&self, calcium: f64, er_calcium: f64, physical: &PhysicalParameters) -> f64 {
        physical.er_volume_ratio * self.params.v2 * (calcium - er_calcium)
    }

    /// Advances IP3 and the gate to `i + 1`, returns the net flux into the cytosol (nM/ms)
    pub fn step(
        &mut self,
        i: usize,
        dt: f64,
        calcium: f64,
        er_calcium: f64,
        extrasynaptic_glutamate: f64,
        physical: &PhysicalParameters,
    ) -> f64 {
        let p = self.params;
        let ip3 = self.ip3[i];
        let gate = self.gate[i];

        let j_chan = p.kinetics.channel_flux(ip3, calcium, gate, er_calcium, physical);
        let (j_pump, j_leak) = if p.pump_and_leak {
            (self.serca_flux(calcium), self.leak_flux(calcium, er_calcium, physical))
        } else {
            (0., 0.)
        };

        let glutamate = extrasynaptic_glutamate.max(0.).powf(p.glu_exponent);
        let production = p.v_glu * glutamate / (p.k_glu.powf(p.glu_exponent) + glutamate);

        self.ip3[i + 1] = ip3 + dt * (production - (ip3 - p.ip3_rest) / p.tau_ip3);
        self.gate[i + 1] = gate + dt * p.kinetics.gate_drift(ip3, calcium, gate);

        -j_chan - j_pump - j_leak
    }
}
