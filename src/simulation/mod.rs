//! Trial loop coupling the bouton and the astrocyte, condition runs under
//! control and blocker conditions, and scoring of the per pulse responses.

use tracing::{debug, info, warn};
use crate::astrocyte::Astrocyte;
use crate::bouton::{Blockers, Bouton};
use crate::distribution::UniformSource;
use crate::error::SimulationError;
use crate::experiment::ExperimentConfig;
use crate::parameters::SimulationParameters;
use crate::series::{TimeSeries, Trajectories};
use crate::vesicles::VesiclePool;


/// Pharmacological condition of a set of trials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Artificial cerebrospinal fluid, no blocker
    Acsf,
    /// Blocker requested for the experiment
    Blocker,
}

impl Condition {
    pub fn name(&self) -> &'static str {
        match self {
            Condition::Acsf => "acsf",
            Condition::Blocker => "blocker",
        }
    }

    /// Blockers applied under this condition
    pub fn blockers(&self, ex: &ExperimentConfig) -> Blockers {
        match self {
            Condition::Acsf => Blockers::default(),
            Condition::Blocker if ex.ap5_exp => Blockers { ap5: true, ryr: false },
            Condition::Blocker if ex.ry_exp => Blockers { ap5: false, ryr: true },
            Condition::Blocker => Blockers::default(),
        }
    }
}

/// Every trajectory of a single trial
#[derive(Debug, Clone)]
pub struct TrialRecord {
    pub bouton: Bouton,
    pub astrocyte: Option<Astrocyte>,
}

impl TrialRecord {
    /// Trajectories of the bouton followed by the astrocyte's, prefixed by compartment
    pub fn trajectories(&self) -> Vec<(String, &TimeSeries)> {
        let mut output: Vec<(String, &TimeSeries)> = self.bouton.trajectories()
            .into_iter()
            .map(|(name, series)| (format!("bouton.{}", name), series))
            .collect();

        if let Some(astrocyte) = &self.astrocyte {
            output.extend(
                astrocyte.trajectories()
                    .into_iter()
                    .map(|(name, series)| (format!("astrocyte.{}", name), series))
            );
        }

        output
    }
}

/// Runs one trial, stepping the bouton then the astrocyte at every step
pub fn run_trial<U: UniformSource>(
    ex: &ExperimentConfig,
    params: &SimulationParameters,
    blockers: Blockers,
    source: &mut U,
) -> Result<TrialRecord, SimulationError> {
    let mut bouton = Bouton::from_parameters(ex, params);
    let mut astrocyte = if ex.astro {
        Some(Astrocyte::from_parameters(ex, params))
    } else {
        None
    };

    for i in 0..ex.steps {
        let extrasynaptic_glutamate = astrocyte.as_ref()
            .map_or(0., |astrocyte| astrocyte.extrasynaptic_glutamate(i));

        bouton.step(i, ex, extrasynaptic_glutamate, blockers, &params.physical);

        if let Some(astrocyte) = astrocyte.as_mut() {
            astrocyte.step(
                i,
                ex.delta_t,
                bouton.vesicles.glutamate[i],
                bouton.vesicles.time_since_release(i, ex.delta_t),
                source,
                &params.physical,
            )?;
        }
    }

    Ok(TrialRecord { bouton, astrocyte })
}

/// Peak effective vesicle fraction within each pulse window
pub fn bin_responses(ex: &ExperimentConfig, pool: &VesiclePool) -> Vec<f64> {
    ex.bin_windows()
        .into_iter()
        .map(|(start, end)| pool.e.max_in(start, end).unwrap_or(0.))
        .collect()
}

/// Trial averaged responses of a condition and its last trial
#[derive(Debug, Clone)]
pub struct ConditionResult {
    pub condition: Condition,
    pub blockers: Blockers,
    /// Mean response per bin across trials
    pub responses: Vec<f64>,
    pub last_trial: TrialRecord,
}

/// Runs every trial of a condition
pub fn run_condition<U: UniformSource>(
    ex: &ExperimentConfig,
    params: &SimulationParameters,
    condition: Condition,
    source: &mut U,
) -> Result<ConditionResult, SimulationError> {
    let blockers = condition.blockers(ex);
    let mut responses = vec![0.; ex.bins];
    let mut last_trial = None;

    for trial in 0..ex.trials {
        let record = run_trial(ex, params, blockers, source)?;
        let trial_responses = bin_responses(ex, &record.bouton.vesicles);
        debug!(
            condition = condition.name(),
            trial,
            first_response = trial_responses.first().copied().unwrap_or(0.),
            "trial finished"
        );

        responses.iter_mut()
            .zip(trial_responses)
            .for_each(|(total, response)| *total += response);
        last_trial = Some(record);
    }

    responses.iter_mut().for_each(|total| *total /= ex.trials as f64);

    let last_trial = match last_trial {
        Some(record) => record,
        None => return Err(crate::error::ConfigurationError::NoTrials.into()),
    };

    info!(
        condition = condition.name(),
        ap5 = blockers.ap5,
        ryr = blockers.ryr,
        first_response = responses.first().copied().unwrap_or(0.),
        last_response = responses.last().copied().unwrap_or(0.),
        "condition finished"
    );

    Ok(ConditionResult { condition, blockers, responses, last_trial })
}

/// Runs the control condition then the blocker condition sharing one random source
pub fn sim<U: UniformSource>(
    ex: &ExperimentConfig,
    params: &SimulationParameters,
    source: &mut U,
) -> Result<(ConditionResult, ConditionResult), SimulationError> {
    let acsf = run_condition(ex, params, Condition::Acsf, source)?;
    let blocker = run_condition(ex, params, Condition::Blocker, source)?;

    Ok((acsf, blocker))
}

/// Normalized responses and the blocker effect per bin
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    /// Control responses relative to the first pulse
    pub acsf_normalized: Vec<f64>,
    /// Blocker responses relative to the first pulse
    pub blocker_normalized: Vec<f64>,
    /// Blocker response over control response per bin
    pub blocker_ratio: Vec<f64>,
}

/// Compares the control and blocker bar charts
pub trait Scorer {
    fn score(&mut self, acsf: &[f64], blocker: &[f64], ex: &ExperimentConfig) -> ScoreReport;
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0. { numerator / denominator } else { 0. }
}

fn normalize(responses: &[f64]) -> Vec<f64> {
    let first = responses.first().copied().unwrap_or(0.);

    responses.iter().map(|response| ratio(*response, first)).collect()
}

/// Scores trains by facilitation relative to the first pulse
#[derive(Debug, Clone, Copy, Default)]
pub struct PairedPulseScore;

impl Scorer for PairedPulseScore {
    fn score(&mut self, acsf: &[f64], blocker: &[f64], ex: &ExperimentConfig) -> ScoreReport {
        let report = ScoreReport {
            acsf_normalized: normalize(acsf),
            blocker_normalized: normalize(blocker),
            blocker_ratio: acsf.iter()
                .zip(blocker)
                .map(|(a, b)| ratio(*b, *a))
                .collect(),
        };

        let mean_ratio = if report.blocker_ratio.is_empty() {
            0.
        } else {
            report.blocker_ratio.iter().sum::<f64>() / report.blocker_ratio.len() as f64
        };
        info!(isi = ex.isi, bins = ex.bins, mean_ratio, "scored responses");

        report
    }
}

/// Results of both conditions and the score when one was computed
#[derive(Debug, Clone)]
pub struct ExperimentReport {
    pub acsf: ConditionResult,
    pub blocker: ConditionResult,
    pub score: Option<ScoreReport>,
}

/// Runs both conditions then scores them unless this is the paired pulse configuration
pub fn run_experiment<S: Scorer, U: UniformSource>(
    ex: &ExperimentConfig,
    params: &SimulationParameters,
    scorer: &mut S,
    source: &mut U,
) -> Result<ExperimentReport, SimulationError> {
    info!(
        isi = ex.isi,
        trials = ex.trials,
        steps = ex.steps,
        ap5 = ex.ap5_exp,
        ryr = ex.ry_exp,
        astro = ex.astro,
        release_model = params.release_model.name(),
        "starting experiment"
    );
    if !ex.ap5_exp && !ex.ry_exp {
        warn!("no blocker was specified, blocker condition runs without blockers");
    }

    let (acsf, blocker) = sim(ex, params, source)?;

    let score = if ex.is_paired_pulse() {
        info!("paired pulse interval, skipping scoring");
        None
    } else {
        Some(scorer.score(&acsf.responses, &blocker.responses, ex))
    };

    Ok(ExperimentReport { acsf, blocker, score })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::experiment::build_train;
    use crate::parameters::StimulusParameters;

    #[test]
    fn test_blocker_precedence() -> Result<(), SimulationError> {
        let mut ex = build_train(75., 1., 1, 0.05, false, &StimulusParameters::default())?;

        assert_eq!(Condition::Blocker.blockers(&ex), Blockers::default());
        ex.ry_exp = true;
        assert_eq!(Condition::Blocker.blockers(&ex), Blockers { ap5: false, ryr: true });
        ex.ap5_exp = true;
        assert_eq!(Condition::Blocker.blockers(&ex), Blockers { ap5: true, ryr: false });
        assert_eq!(Condition::Acsf.blockers(&ex), Blockers::default());

        Ok(())
    }

    #[test]
    fn test_paired_pulse_score() -> Result<(), SimulationError> {
        let ex = build_train(50., 1., 1, 0.05, false, &StimulusParameters::default())?;
        let report = PairedPulseScore.score(&[0.2, 0.3], &[0.1, 0.0], &ex);

        let expected = [
            (&report.acsf_normalized, [1., 1.5]),
            (&report.blocker_normalized, [1., 0.]),
            (&report.blocker_ratio, [0.5, 0.]),
        ];
        for (values, expected) in expected {
            assert_eq!(values.len(), expected.len());
            for (value, target) in values.iter().zip(expected) {
                assert_relative_eq!(*value, target, epsilon = 1e-12);
            }
        }

        Ok(())
    }

    #[test]
    fn test_zero_first_response_normalizes_to_zero() {
        assert_eq!(normalize(&[0., 0.4]), vec![0., 0.]);
        assert!(normalize(&[]).is_empty());
    }
}
