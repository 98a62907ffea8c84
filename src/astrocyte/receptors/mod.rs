//! Ligand gated currents of the astrocyte membrane, AMPA and NMDA receptors
//! respond to cleft glutamate while purinergic P2X and P2Y receptors respond to
//! ATP co-released with an evoked vesicle (Di Garbo, 2009).

use serde::{Deserialize, Serialize};
use crate::neuron::receptors::{
    AMPADefault, BV, DestexheReceptor, NMDADefault, ReceptorKinetics,
};


/// A receptor producing a current from a ligand concentration
pub trait AstrocyteReceptor {
    /// Current from the present receptor state, then advances the receptor
    /// given the ligand concentration
    fn current(&mut self, dt: f64, ligand: f64, voltage: f64) -> f64;
}

/// AMPA receptor, large and fast currents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AMPAAstrocyteReceptor {
    /// Maximal conductance (mS)
    pub g: f64,
    /// Reversal potential (mV)
    pub reversal: f64,
    pub receptor: DestexheReceptor,
}

impl Default for AMPAAstrocyteReceptor {
    fn default() -> Self {
        AMPAAstrocyteReceptor {
            g: 0.35e-6,
            reversal: 0.,
            receptor: DestexheReceptor::ampa_default(),
        }
    }
}

impl AstrocyteReceptor for AMPAAstrocyteReceptor {
    fn current(&mut self, dt: f64, ligand: f64, voltage: f64) -> f64 {
        let current = self.g * self.receptor.get_r() * (voltage - self.reversal);
        self.receptor.apply_r_change(ligand, dt);

        current
    }
}

/// NMDA receptor, astrocytic receptors are barely blocked by magnesium
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NMDAAstrocyteReceptor {
    /// Maximal conductance (mS)
    pub g: f64,
    /// Reversal potential (mV)
    pub reversal: f64,
    pub bv: BV,
    pub receptor: DestexheReceptor,
}

impl Default for NMDAAstrocyteReceptor {
    fn default() -> Self {
        NMDAAstrocyteReceptor {
            g: 0.7e-6,
            reversal: 0.,
            bv: BV { magnesium: 0.02 },
            receptor: DestexheReceptor::nmda_default(),
        }
    }
}

impl AstrocyteReceptor for NMDAAstrocyteReceptor {
    fn current(&mut self, dt: f64, ligand: f64, voltage: f64) -> f64 {
        let current = self.g * self.receptor.get_r() * self.bv.calculate_b(voltage)
            * (voltage - self.reversal);
        self.receptor.apply_r_change(ligand, dt);

        current
    }
}

/// Ionotropic ATP receptor, active for a fixed window after an evoked release
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct P2XReceptor {
    /// Extracellular ATP after release (uM)
    pub atp_ex: f64,
    /// Current amplitude (uA/cm^2/uM)
    pub amplitude: f64,
    /// Half saturation of ATP evoked calcium influx (uM)
    pub half_saturation: f64,
    /// Maximal ATP evoked calcium influx (uM/s)
    pub max_influx: f64,
    /// Length of the response window (ms)
    pub atp_life: f64,
    #[serde(skip)]
    pub since_release: Option<f64>,
}

impl Default for P2XReceptor {
    fn default() -> Self {
        P2XReceptor {
            atp_ex: 3.,
            amplitude: 0.05,
            half_saturation: 0.9,
            max_influx: 0.08,
            atp_life: 1.,
            since_release: None,
        }
    }
}

impl P2XReceptor {
    /// Sets the time elapsed since the last evoked release (ms)
    pub fn set_since_release(&mut self, since_release: Option<f64>) {
        self.since_release = since_release;
    }

    /// Whether ATP from the last evoked release is still present
    pub fn atp_present(&self) -> bool {
        self.since_release.map_or(false, |elapsed| elapsed < self.atp_life)
    }

    /// Extracellular ATP seen by the astrocyte (uM)
    pub fn atp(&self) -> f64 {
        if self.atp_present() { self.atp_ex } else { 0. }
    }

    /// Rate of ATP evoked calcium influx (uM/s)
    pub fn calcium_influx_rate(&self) -> f64 {
        if !self.atp_present() {
            return 0.;
        }
        let activation = self.atp_ex.powf(1.4);

        self.max_influx * activation / (self.half_saturation + activation)
    }
}

impl AstrocyteReceptor for P2XReceptor {
    fn current(&mut self, _: f64, ligand: f64, _: f64) -> f64 {
        if self.atp_present() { self.amplitude * ligand } else { 0. }
    }
}

/// Metabotropic ATP receptor driving PLC beta
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct P2YReceptor {
    /// Scaling of PLC beta activity by receptor activation (nM/ms)
    pub k_atp: f64,
    /// Activated fraction of receptors with ATP binding rates
    pub receptor: DestexheReceptor,
}

impl Default for P2YReceptor {
    fn default() -> Self {
        P2YReceptor {
            k_atp: 0.05,
            receptor: DestexheReceptor { r: 0., alpha: 0.1, beta: 0.01 },
        }
    }
}

impl AstrocyteReceptor for P2YReceptor {
    /// PLC beta drive `k_atp * XF` rather than a membrane current
    fn current(&mut self, dt: f64, ligand: f64, _: f64) -> f64 {
        let drive = self.k_atp * self.receptor.get_r();
        self.receptor.apply_r_change(ligand, dt);

        drive
    }
}

/// Every receptor on the astrocyte membrane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AstrocyteReceptors {
    pub ampa: AMPAAstrocyteReceptor,
    pub nmda: NMDAAstrocyteReceptor,
    pub p2x: P2XReceptor,
    pub p2y: P2YReceptor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ampa_current_follows_binding() {
        let mut ampa = AMPAAstrocyteReceptor::default();

        assert_eq!(ampa.current(0.05, 1., -85.), 0.);
        assert!(ampa.current(0.05, 1., -85.) < 0.);
    }

    #[test]
    fn test_nmda_magnesium_block_weak() {
        let nmda = NMDAAstrocyteReceptor::default();

        let b = nmda.bv.calculate_b(-85.);
        assert!(b > 0.4);
        assert!(b > 10. * BV::default().calculate_b(-85.));
    }

    #[test]
    fn test_p2x_window() {
        let mut p2x = P2XReceptor::default();
        assert_eq!(p2x.current(0.05, p2x.atp(), -85.), 0.);

        p2x.set_since_release(Some(0.5));
        let atp = p2x.atp();
        assert_eq!(p2x.current(0.05, atp, -85.), 0.05 * 3.);
        assert!(p2x.calcium_influx_rate() > 0.);

        p2x.set_since_release(Some(1.));
        assert_eq!(p2x.current(0.05, p2x.atp(), -85.), 0.);
        assert_eq!(p2x.calcium_influx_rate(), 0.);
    }

    #[test]
    fn test_p2y_drive_rises_with_atp() {
        let mut p2y = P2YReceptor::default();

        assert_eq!(p2y.current(0.05, 3., -85.), 0.);
        assert!(p2y.current(0.05, 3., -85.) > 0.);
    }
}
