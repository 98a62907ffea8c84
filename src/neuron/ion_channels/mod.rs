//! Voltage gated ion channels of the bouton membrane, rates follow the
//! Hodgkin Huxley formalism shifted so the membrane rests at -70 mV.

use serde::{Deserialize, Serialize};


/// Evaluates `x / (exp(x / k) - 1)`, which has a removable singularity at
/// `x = 0` where the limit `k` is used (with its first order correction)
pub fn singular_rate(x: f64, k: f64) -> f64 {
    if x.abs() < 1e-9 {
        k - x / 2.
    } else {
        x / (x / k).exp_m1()
    }
}

/// A gating variable with forward and backward rates
#[derive(Debug, Clone, Copy)]
pub struct BasicGatingVariable {
    /// Opening rate (ms^-1)
    pub alpha: f64,
    /// Closing rate (ms^-1)
    pub beta: f64,
    /// Fraction of open gates
    pub state: f64,
}

impl Default for BasicGatingVariable {
    fn default() -> Self {
        BasicGatingVariable {
            alpha: 0.,
            beta: 0.,
            state: 0.,
        }
    }
}

impl BasicGatingVariable {
    /// Sets the state to the steady state of the current rates
    pub fn init_state(&mut self) {
        self.state = self.alpha / (self.alpha + self.beta);
    }

    /// Forward Euler update of the state given the current rates
    pub fn update(&mut self, dt: f64) {
        self.state += dt * (self.alpha * (1. - self.state) - self.beta * self.state);
    }
}

/// An ion channel whose gating depends on the timestep
pub trait IonChannel {
    /// Computes the current from the present gating state then advances the gates
    fn update_current(&mut self, voltage: f64, dt: f64);
    /// Gets the last computed current (uA/cm^2)
    fn get_current(&self) -> f64;
}

/// An ion channel without gating dynamics
pub trait TimestepIndependentIonChannel {
    /// Computes the current at the given voltage
    fn update_current(&mut self, voltage: f64);
    /// Gets the last computed current (uA/cm^2)
    fn get_current(&self) -> f64;
}

/// Sodium channel with activation `m` and inactivation `h`
#[derive(Debug, Clone, Copy)]
pub struct NaIonChannel {
    /// Maximal conductance (mS/cm^2)
    pub g_na: f64,
    /// Reversal potential (mV)
    pub e_na: f64,
    /// Activation gate
    pub m: BasicGatingVariable,
    /// Inactivation gate
    pub h: BasicGatingVariable,
    /// Current output
    pub current: f64,
}

impl NaIonChannel {
    fn update_gate_time_constants(&mut self, voltage: f64) {
        self.m.alpha = 0.1 * singular_rate(-voltage - 45., 10.);
        self.m.beta = 4. * ((-voltage - 70.) / 18.).exp();
        self.h.alpha = 0.07 * ((-voltage - 70.) / 20.).exp();
        self.h.beta = 1. / (((-voltage - 40.) / 10.).exp() + 1.);
    }
}

impl IonChannel for NaIonChannel {
    fn update_current(&mut self, voltage: f64, dt: f64) {
        self.update_gate_time_constants(voltage);
        self.current = self.g_na * self.m.state.powi(3) * self.h.state * (voltage - self.e_na);

        self.m.update(dt);
        self.h.update(dt);
    }

    fn get_current(&self) -> f64 {
        self.current
    }
}

/// Delayed rectifier potassium channel with activation `n`
#[derive(Debug, Clone, Copy)]
pub struct KIonChannel {
    /// Maximal conductance (mS/cm^2)
    pub g_k: f64,
    /// Reversal potential (mV)
    pub e_k: f64,
    /// Activation gate
    pub n: BasicGatingVariable,
    /// Current output
    pub current: f64,
}

impl KIonChannel {
    fn update_gate_time_constants(&mut self, voltage: f64) {
        self.n.alpha = 0.01 * singular_rate(-voltage - 60., 10.);
        self.n.beta = 0.125 * ((-voltage - 70.) / 80.).exp();
    }
}

impl IonChannel for KIonChannel {
    fn update_current(&mut self, voltage: f64, dt: f64) {
        self.update_gate_time_constants(voltage);
        self.current = self.g_k * self.n.state.powi(4) * (voltage - self.e_k);

        self.n.update(dt);
    }

    fn get_current(&self) -> f64 {
        self.current
    }
}

/// Passive leak channel
#[derive(Debug, Clone, Copy)]
pub struct LeakChannel {
    /// Conductance (mS/cm^2)
    pub g_l: f64,
    /// Reversal potential (mV)
    pub e_l: f64,
    /// Current output
    pub current: f64,
}

impl TimestepIndependentIonChannel for LeakChannel {
    fn update_current(&mut self, voltage: f64) {
        self.current = self.g_l * (voltage - self.e_l);
    }

    fn get_current(&self) -> f64 {
        self.current
    }
}

/// Parameters of the high voltage activated calcium channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalciumChannelParameters {
    /// Maximal conductance of the channel cluster (mS/cm^2)
    pub g_ca: f64,
    /// Maximal opening rate (ms^-1)
    pub alpha_max: f64,
    /// Slope of the opening rate (mV^-1)
    pub alpha_slope: f64,
    /// Half activation of the opening rate (mV)
    pub alpha_half: f64,
    /// Closing rate scale (ms^-1 * mV^-1)
    pub beta_scale: f64,
    /// Voltage offset of the closing rate (mV)
    pub beta_offset: f64,
    /// Slope factor of the closing rate (mV)
    pub beta_slope: f64,
}

impl Default for CalciumChannelParameters {
    fn default() -> Self {
        CalciumChannelParameters {
            g_ca: 0.04,
            alpha_max: 1.6,
            alpha_slope: 0.072,
            alpha_half: 5.,
            beta_scale: 0.02,
            beta_offset: 8.9,
            beta_slope: 5.,
        }
    }
}

/// High voltage activated calcium channel, `I = g * m^2 * (V - E_Ca)`
#[derive(Debug, Clone, Copy)]
pub struct VoltageGatedCalciumChannel {
    pub params: CalciumChannelParameters,
    /// Calcium reversal potential (mV)
    pub e_ca: f64,
    /// Activation gate
    pub m: BasicGatingVariable,
    /// Current output, negative values are inward
    pub current: f64,
}

impl VoltageGatedCalciumChannel {
    /// Creates a channel with its gate at steady state for `voltage`
    pub fn new(params: CalciumChannelParameters, e_ca: f64, voltage: f64) -> Self {
        let mut channel = VoltageGatedCalciumChannel {
            params,
            e_ca,
            m: BasicGatingVariable::default(),
            current: 0.,
        };
        channel.update_gate_time_constants(voltage);
        channel.m.init_state();

        channel
    }

    fn update_gate_time_constants(&mut self, voltage: f64) {
        let p = &self.params;
        self.m.alpha = p.alpha_max / (1. + (-p.alpha_slope * (voltage - p.alpha_half)).exp());
        self.m.beta = p.beta_scale * singular_rate(voltage + p.beta_offset, p.beta_slope);
    }
}

impl IonChannel for VoltageGatedCalciumChannel {
    fn update_current(&mut self, voltage: f64, dt: f64) {
        self.update_gate_time_constants(voltage);
        self.current = self.params.g_ca * self.m.state.powi(2) * (voltage - self.e_ca);

        self.m.update(dt);
    }

    fn get_current(&self) -> f64 {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular_rate_limit() {
        assert_eq!(singular_rate(0., 10.), 10.);
        // continuous across the singular point
        let left = singular_rate(-1e-6, 10.);
        let right = singular_rate(1e-6, 10.);
        assert!((left - 10.).abs() < 1e-5);
        assert!((right - 10.).abs() < 1e-5);
    }

    #[test]
    fn test_rates_finite_at_singular_voltages() {
        let mut na = NaIonChannel {
            g_na: 120.,
            e_na: 45.,
            m: BasicGatingVariable { state: 0.1, ..Default::default() },
            h: BasicGatingVariable { state: 0.6, ..Default::default() },
            current: 0.,
        };
        na.update_current(-45., 0.05);
        assert!((na.m.alpha - 1.).abs() < 1e-12);
        assert!(na.current.is_finite());

        let mut k = KIonChannel {
            g_k: 36.,
            e_k: -82.,
            n: BasicGatingVariable { state: 0.3, ..Default::default() },
            current: 0.,
        };
        k.update_current(-60., 0.05);
        assert!((k.n.alpha - 0.1).abs() < 1e-12);
        assert!(k.current.is_finite());

        let mut ca = VoltageGatedCalciumChannel::new(CalciumChannelParameters::default(), 125., -70.);
        ca.update_current(-8.9, 0.05);
        assert!((ca.m.beta - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_current_uses_state_before_gate_update() {
        let mut k = KIonChannel {
            g_k: 36.,
            e_k: -82.,
            n: BasicGatingVariable { state: 0.5, ..Default::default() },
            current: 0.,
        };
        k.update_current(0., 0.05);

        assert!((k.current - 36. * 0.5_f64.powi(4) * 82.).abs() < 1e-9);
        assert!(k.n.state > 0.5);
    }

    #[test]
    fn test_calcium_channel_mostly_closed_at_rest() {
        let ca = VoltageGatedCalciumChannel::new(CalciumChannelParameters::default(), 125., -70.);

        assert!(ca.m.state > 0. && ca.m.state < 0.01, "m: {}", ca.m.state);
    }
}
