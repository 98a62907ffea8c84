//! Hodgkin Huxley membrane of the bouton, driven by the applied current train.

use serde::{Deserialize, Serialize};
use crate::series::{TimeSeries, Trajectories};
use super::ion_channels::{
    BasicGatingVariable, IonChannel, KIonChannel, LeakChannel,
    NaIonChannel, TimestepIndependentIonChannel,
};


/// Membrane constants, Hodgkin & Huxley (1952) shifted to rest at -70 mV
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembraneParameters {
    /// Membrane capacitance (uF/cm^2)
    pub c_m: f64,
    /// Sodium conductance (mS/cm^2)
    pub g_na: f64,
    /// Potassium conductance (mS/cm^2)
    pub g_k: f64,
    /// Leak conductance (mS/cm^2)
    pub g_l: f64,
    /// Sodium reversal potential (mV)
    pub e_na: f64,
    /// Potassium reversal potential (mV)
    pub e_k: f64,
    /// Leak reversal potential (mV)
    pub e_l: f64,
    /// Resting potential (mV)
    pub v_rest: f64,
    pub m_init: f64,
    pub h_init: f64,
    pub n_init: f64,
}

impl Default for MembraneParameters {
    fn default() -> Self {
        MembraneParameters {
            c_m: 1.,
            g_na: 120.,
            g_k: 36.,
            g_l: 0.27,
            e_na: 45.,
            e_k: -82.,
            e_l: -59.4,
            v_rest: -70.,
            m_init: 0.1,
            h_init: 0.6,
            n_init: 0.3,
        }
    }
}

/// Membrane potential and gating trajectories of a Hodgkin Huxley membrane
#[derive(Debug, Clone, Trajectories)]
pub struct HodgkinHuxleyMembrane {
    /// Membrane capacitance (uF/cm^2)
    pub c_m: f64,
    /// Sodium ion channel
    pub na_channel: NaIonChannel,
    /// Potassium ion channel
    pub k_channel: KIonChannel,
    /// Leak channel
    pub leak_channel: LeakChannel,
    /// Membrane potential (mV)
    pub v: TimeSeries,
    pub m: TimeSeries,
    pub h: TimeSeries,
    pub n: TimeSeries,
}

impl HodgkinHuxleyMembrane {
    /// Allocates trajectories of `len` entries with the given initial conditions
    pub fn new(len: usize, params: &MembraneParameters) -> Self {
        let gate = |state| BasicGatingVariable { state, ..BasicGatingVariable::default() };

        HodgkinHuxleyMembrane {
            c_m: params.c_m,
            na_channel: NaIonChannel {
                g_na: params.g_na,
                e_na: params.e_na,
                m: gate(params.m_init),
                h: gate(params.h_init),
                current: 0.,
            },
            k_channel: KIonChannel {
                g_k: params.g_k,
                e_k: params.e_k,
                n: gate(params.n_init),
                current: 0.,
            },
            leak_channel: LeakChannel { g_l: params.g_l, e_l: params.e_l, current: 0. },
            v: TimeSeries::with_initial(len, params.v_rest),
            m: TimeSeries::with_initial(len, params.m_init),
            h: TimeSeries::with_initial(len, params.h_init),
            n: TimeSeries::with_initial(len, params.n_init),
        }
    }

    /// Writes voltage and gates at `i + 1` from their values at `i` given the
    /// applied current at `i` (uA/cm^2)
    pub fn step(&mut self, i: usize, dt: f64, input_current: f64) {
        let voltage = self.v[i];
        self.na_channel.m.state = self.m[i];
        self.na_channel.h.state = self.h[i];
        self.k_channel.n.state = self.n[i];

        self.na_channel.update_current(voltage, dt);
        self.k_channel.update_current(voltage, dt);
        self.leak_channel.update_current(voltage);

        let i_ion = self.na_channel.get_current()
            + self.k_channel.get_current()
            + self.leak_channel.get_current();

        self.v[i + 1] = voltage + dt * (input_current - i_ion) / self.c_m;
        self.m[i + 1] = self.na_channel.m.state;
        self.h[i + 1] = self.na_channel.h.state;
        self.n[i + 1] = self.k_channel.n.state;
    }
}
