//! Ligand gated receptor kinetics and the presynaptic NMDA receptor.

use serde::{Deserialize, Serialize};


/// Modifier for NMDA receptor current based on magnesium concentration and voltage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BV {
    /// Extracellular magnesium (mM)
    pub magnesium: f64,
}

impl Default for BV {
    fn default() -> Self {
        // 1.5 mM of Mg
        BV { magnesium: 1.5 }
    }
}

impl BV {
    /// Calculates effect of magnesium and voltage on NMDA receptor,
    /// voltage should be in mV
    pub fn calculate_b(&self, voltage: f64) -> f64 {
        1. / (1. + ((-0.062 * voltage).exp() * self.magnesium / 3.57))
    }
}

/// Calculates receptor gating values over time based on neurotransmitter concentration
pub trait ReceptorKinetics: Clone {
    /// Calculates the change in receptor gating based on neurotransmitter input
    fn apply_r_change(&mut self, t: f64, dt: f64);
    /// Gets the receptor gating value
    fn get_r(&self) -> f64;
    /// Sets the receptor gating value
    fn set_r(&mut self, r: f64);
}

/// Receptor dynamics based off of model
/// found in this [paper](https://papers.cnl.salk.edu/PDFs/Kinetic%20Models%20of%20Synaptic%20Transmission%201998-3229.pdf)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DestexheReceptor {
    /// Receptor gating value
    pub r: f64,
    /// Forward rate constant (mM^-1 * ms^-1)
    pub alpha: f64,
    /// Backwards rate constant (ms^-1)
    pub beta: f64,
}

impl ReceptorKinetics for DestexheReceptor {
    fn apply_r_change(&mut self, t: f64, dt: f64) {
        self.r += (self.alpha * t * (1. - self.r) - self.beta * self.r) * dt;
    }

    fn get_r(&self) -> f64 {
        self.r
    }

    fn set_r(&mut self, r: f64) {
        self.r = r;
    }
}

/// Default parameters for AMPA receptor kinetics
pub trait AMPADefault {
    fn ampa_default() -> Self;
}

/// Default parameters for NMDA receptor kinetics
pub trait NMDADefault {
    fn nmda_default() -> Self;
}

macro_rules! impl_destexhe_receptor_default {
    ($trait:ident, $method:ident, $alpha:expr, $beta:expr) => {
        impl $trait for DestexheReceptor {
            fn $method() -> Self {
                DestexheReceptor {
                    r: 0.,
                    alpha: $alpha, // mM^-1 * ms^-1
                    beta: $beta, // ms^-1
                }
            }
        }
    };
}

impl_destexhe_receptor_default!(Default, default, 1., 1.);
impl_destexhe_receptor_default!(AMPADefault, ampa_default, 1.1, 0.19);
impl_destexhe_receptor_default!(NMDADefault, nmda_default, 0.072, 0.0066);

/// Parameters of the presynaptic NMDA receptor cluster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresynapticNMDAParameters {
    /// Maximal calcium conductance of the cluster (mS/cm^2)
    pub g_nmda: f64,
    /// Magnesium block
    pub bv: BV,
    /// Receptor kinetics with the initial gating value
    pub receptor: DestexheReceptor,
}

impl Default for PresynapticNMDAParameters {
    fn default() -> Self {
        PresynapticNMDAParameters {
            g_nmda: 0.0005,
            bv: BV::default(),
            receptor: DestexheReceptor::nmda_default(),
        }
    }
}

/// Presynaptic NMDA receptor, passes calcium in proportion to the glutamate
/// released by its own bouton
#[derive(Debug, Clone, Copy)]
pub struct PresynapticNMDAReceptor<R: ReceptorKinetics = DestexheReceptor> {
    /// Maximal calcium conductance (mS/cm^2)
    pub g_nmda: f64,
    /// Calcium reversal potential (mV)
    pub e_ca: f64,
    /// Magnesium block
    pub bv: BV,
    /// Receptor kinetics
    pub receptor: R,
    /// Current output, negative values are inward
    pub current: f64,
}

impl PresynapticNMDAReceptor<DestexheReceptor> {
    pub fn new(params: &PresynapticNMDAParameters, e_ca: f64) -> Self {
        PresynapticNMDAReceptor {
            g_nmda: params.g_nmda,
            e_ca,
            bv: params.bv,
            receptor: params.receptor,
            current: 0.,
        }
    }
}

impl<R: ReceptorKinetics> PresynapticNMDAReceptor<R> {
    /// Calcium current from the present receptor state, then advances the
    /// receptor given the glutamate concentration (mM)
    pub fn calcium_current(&mut self, dt: f64, glutamate: f64, voltage: f64) -> f64 {
        self.current = self.g_nmda * self.receptor.get_r() * self.bv.calculate_b(voltage)
            * (voltage - self.e_ca);
        self.receptor.apply_r_change(glutamate, dt);

        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnesium_block_relieved_by_depolarization() {
        let bv = BV::default();

        assert!(bv.calculate_b(-70.) < 0.05);
        assert!(bv.calculate_b(0.) > 0.65);
        assert!(bv.calculate_b(20.) > bv.calculate_b(0.));
    }

    #[test]
    fn test_receptor_relaxes_without_ligand() {
        let mut receptor = DestexheReceptor::nmda_default();
        receptor.set_r(0.5);
        receptor.apply_r_change(0., 1.);

        assert!((receptor.get_r() - 0.5 * (1. - 0.0066)).abs() < 1e-12);
    }

    #[test]
    fn test_nmda_current_inward_after_binding() {
        let mut nmda = PresynapticNMDAReceptor::new(&PresynapticNMDAParameters::default(), 125.);

        // unbound receptor carries no current
        assert_eq!(nmda.calcium_current(0.05, 1., -20.), 0.);
        let current = nmda.calcium_current(0.05, 1., -20.);
        assert!(current < 0.);
    }
}
