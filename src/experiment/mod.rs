//! Stimulus trains and the experiment configuration consumed by every step.

use crate::error::ConfigurationError;
use crate::parameters::StimulusParameters;
use crate::series::{delay_steps, TimeSeries};


/// Inter-stimulus interval reserved for paired pulse runs, no scoring is done
pub const PAIRED_PULSE_ISI: f64 = 75.;

/// Experimental setup of a run
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Inter-stimulus interval (ms)
    pub isi: f64,
    /// Requested length of the train (s)
    pub seconds: f64,
    /// Number of trials per condition
    pub trials: usize,
    /// Timestep (ms)
    pub delta_t: f64,
    /// Whether the astrocyte is coupled to the bouton
    pub astro: bool,
    /// Whether the blocker condition applies AP5
    pub ap5_exp: bool,
    /// Whether the blocker condition applies ryanodine block
    pub ry_exp: bool,
    /// Padding before the first stimulus (ms)
    pub beg_pad: f64,
    /// Number of response bins, one per pulse
    pub bins: usize,
    /// Number of integration steps
    pub steps: usize,
    /// Step index of each pulse onset
    pub onsets: Vec<usize>,
    /// Applied current (uA/cm^2)
    pub iapp: TimeSeries,
}

impl ExperimentConfig {
    /// Whether this is the paired pulse configuration
    pub fn is_paired_pulse(&self) -> bool {
        self.isi == PAIRED_PULSE_ISI
    }

    /// Lag of the delay lines in steps
    pub fn delay_steps(&self) -> usize {
        delay_steps(self.beg_pad, self.delta_t)
    }

    /// Number of entries of every trajectory
    pub fn horizon(&self) -> usize {
        self.steps + 1
    }

    /// Step range `[start, end)` of each pulse's response window
    pub fn bin_windows(&self) -> Vec<(usize, usize)> {
        self.onsets.iter()
            .enumerate()
            .map(|(n, start)| {
                let end = self.onsets.get(n + 1).copied().unwrap_or(self.horizon());
                (*start, end)
            })
            .collect()
    }
}

/// Builds a train of current pulses spaced by `isi` (ms) spanning `seconds`,
/// the paired pulse interval always gives two pulses
pub fn build_train(
    isi: f64,
    seconds: f64,
    trials: usize,
    delta_t: f64,
    astro: bool,
    stimulus: &StimulusParameters,
) -> Result<ExperimentConfig, ConfigurationError> {
    if !(delta_t > 0.) {
        return Err(ConfigurationError::NonPositiveTimestep);
    }
    if !(isi > 0.) {
        return Err(ConfigurationError::NonPositiveInterval);
    }
    if !(seconds > 0.) {
        return Err(ConfigurationError::NonPositiveDuration);
    }
    if trials == 0 {
        return Err(ConfigurationError::NoTrials);
    }
    for (name, value) in [("delta_t", delta_t), ("isi", isi), ("seconds", seconds)] {
        if !value.is_finite() {
            return Err(ConfigurationError::NonFiniteValue(name));
        }
    }

    let pulses = if isi == PAIRED_PULSE_ISI {
        2.
    } else {
        (seconds * 1000. / isi).floor().max(1.)
    };
    let duration = stimulus.beg_pad + pulses * isi;
    let steps = (duration / delta_t).round();

    for (name, count) in [("pulses", pulses), ("steps", steps)] {
        if !count.is_finite() || count >= u32::MAX as f64 {
            return Err(ConfigurationError::NonFiniteValue(name));
        }
    }
    let (pulses, steps) = (pulses as usize, steps as usize);
    let pulse_steps = ((stimulus.pulse_width / delta_t).round() as usize).max(1);

    let onsets: Vec<usize> = (0..pulses)
        .map(|n| ((stimulus.beg_pad + n as f64 * isi) / delta_t).round() as usize)
        .collect();

    let mut iapp = TimeSeries::zeros(steps + 1);
    for onset in onsets.iter() {
        for i in *onset..(onset + pulse_steps).min(steps + 1) {
            iapp[i] = stimulus.amplitude;
        }
    }

    Ok(ExperimentConfig {
        isi,
        seconds,
        trials,
        delta_t,
        astro,
        ap5_exp: false,
        ry_exp: false,
        beg_pad: stimulus.beg_pad,
        bins: pulses,
        steps,
        onsets,
        iapp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paired_pulse_train() -> Result<(), ConfigurationError> {
        let ex = build_train(75., 1., 1, 0.05, false, &StimulusParameters::default())?;

        assert!(ex.is_paired_pulse());
        assert_eq!(ex.bins, 2);
        assert_eq!(ex.steps, 3100);
        assert_eq!(ex.onsets, vec![100, 1600]);
        assert_eq!(ex.iapp.len(), 3101);
        assert_eq!(ex.iapp.iter().filter(|x| **x > 0.).count(), 40);
        assert_eq!(ex.iapp[100], 40.);
        assert_eq!(ex.iapp[120], 0.);
        assert_eq!(ex.delay_steps(), 120);

        Ok(())
    }

    #[test]
    fn test_long_train_bins() -> Result<(), ConfigurationError> {
        let ex = build_train(50., 5., 10, 0.05, true, &StimulusParameters::default())?;

        assert_eq!(ex.bins, 100);
        assert_eq!(ex.steps, 100_100);
        let windows = ex.bin_windows();
        assert_eq!(windows.len(), 100);
        assert_eq!(windows[0], (100, 1100));
        assert_eq!(windows[99], (99_100, 100_101));

        Ok(())
    }

    #[test]
    fn test_short_train_has_one_pulse() -> Result<(), ConfigurationError> {
        let ex = build_train(2000., 1., 1, 0.05, false, &StimulusParameters::default())?;
        assert_eq!(ex.bins, 1);

        Ok(())
    }

    #[test]
    fn test_invalid_configuration() {
        let stimulus = StimulusParameters::default();

        assert!(matches!(
            build_train(50., 1., 1, 0., false, &stimulus),
            Err(ConfigurationError::NonPositiveTimestep)
        ));
        assert!(matches!(
            build_train(-1., 1., 1, 0.05, false, &stimulus),
            Err(ConfigurationError::NonPositiveInterval)
        ));
        assert!(matches!(
            build_train(50., 1., 0, 0.05, false, &stimulus),
            Err(ConfigurationError::NoTrials)
        ));
    }

    #[test]
    fn test_infinite_inputs_are_rejected() {
        let stimulus = StimulusParameters::default();

        assert!(matches!(
            build_train(50., f64::INFINITY, 1, 0.05, false, &stimulus),
            Err(ConfigurationError::NonFiniteValue("seconds"))
        ));
        assert!(matches!(
            build_train(f64::INFINITY, 1., 1, 0.05, false, &stimulus),
            Err(ConfigurationError::NonFiniteValue("isi"))
        ));
        assert!(matches!(
            build_train(50., 1., 1, f64::INFINITY, false, &stimulus),
            Err(ConfigurationError::NonFiniteValue("delta_t"))
        ));
        assert!(matches!(
            build_train(1e300, 1e300, 1, 0.05, false, &stimulus),
            Err(ConfigurationError::NonFiniteValue("steps"))
        ));
        assert!(matches!(
            build_train(1e-300, 1e300, 1, 0.05, false, &stimulus),
            Err(ConfigurationError::NonFiniteValue("pulses"))
        ));
    }
}
