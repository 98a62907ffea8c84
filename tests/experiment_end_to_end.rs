#[cfg(test)]
mod test {
    use presynaptic_plasticity::{
        distribution::SeededUniform,
        error::SimulationError,
        experiment::{build_train, ExperimentConfig},
        parameters::SimulationParameters,
        simulation::{run_experiment, PairedPulseScore, ScoreReport, Scorer},
    };


    #[derive(Default)]
    struct CountingScorer {
        calls: usize,
        inner: PairedPulseScore,
    }

    impl Scorer for CountingScorer {
        fn score(&mut self, acsf: &[f64], blocker: &[f64], ex: &ExperimentConfig) -> ScoreReport {
            self.calls += 1;
            self.inner.score(acsf, blocker, ex)
        }
    }

    #[test]
    fn test_paired_pulse_is_not_scored() -> Result<(), SimulationError> {
        let params = SimulationParameters::default();
        let ex = build_train(75., 1., 1, params.delta_t, false, &params.stimulus)?;
        let mut scorer = CountingScorer::default();
        let mut source = SeededUniform::new(params.seed);

        let report = run_experiment(&ex, &params, &mut scorer, &mut source)?;

        assert_eq!(scorer.calls, 0);
        assert!(report.score.is_none());
        assert_eq!(report.acsf.responses.len(), ex.bins);
        assert_eq!(report.blocker.responses.len(), ex.bins);
        assert!(report.acsf.responses.iter().all(|x| *x > 0.));
        // no astrocyte means no random draws
        assert_eq!(source.draws(), 0);
        assert!(report.acsf.last_trial.astrocyte.is_none());

        Ok(())
    }

    #[test]
    fn test_long_train_with_ap5_and_astrocyte() -> Result<(), SimulationError> {
        let params = SimulationParameters::default();
        let mut ex = build_train(50., 5., 10, params.delta_t, true, &params.stimulus)?;
        ex.ap5_exp = true;
        let mut scorer = CountingScorer::default();
        let mut source = SeededUniform::new(params.seed);

        let report = run_experiment(&ex, &params, &mut scorer, &mut source)?;

        assert_eq!(scorer.calls, 1);
        let score = report.score.as_ref().expect("scoring runs for isi 50");
        assert_eq!(score.blocker_ratio.len(), 100);
        assert_eq!(report.acsf.responses.len(), 100);
        assert_eq!(report.blocker.responses.len(), 100);

        assert!(report.blocker.blockers.ap5);
        assert!(!report.blocker.blockers.ryr);
        assert_eq!(report.blocker.last_trial.bouton.nmda_mean.count, 0);
        assert_eq!(report.acsf.last_trial.bouton.nmda_mean.count, ex.steps);

        assert_eq!(source.draws(), (2 * ex.steps * ex.trials * 2) as u64);
        let astrocyte = report.acsf.last_trial.astrocyte.as_ref().expect("astrocyte is coupled");
        assert!(astrocyte.i_ampa.iter().any(|x| *x != 0.));
        assert!(astrocyte.i_p2x.iter().any(|x| *x != 0.));
        assert!(astrocyte.ip3.iter().any(|x| *x != astrocyte.ip3.initial()));

        Ok(())
    }

    #[test]
    fn test_seeded_runs_repeat() -> Result<(), SimulationError> {
        let params = SimulationParameters { seed: 11, ..SimulationParameters::default() };
        let mut ex = build_train(75., 1., 1, params.delta_t, true, &params.stimulus)?;
        ex.ry_exp = true;

        let first = run_experiment(&ex, &params, &mut PairedPulseScore, &mut SeededUniform::new(params.seed))?;
        let second = run_experiment(&ex, &params, &mut PairedPulseScore, &mut SeededUniform::new(params.seed))?;

        for (a, b) in [(&first.acsf, &second.acsf), (&first.blocker, &second.blocker)] {
            assert_eq!(a.responses, b.responses);

            let (left, right) = (a.last_trial.trajectories(), b.last_trial.trajectories());
            assert_eq!(left.len(), right.len());
            for ((name, x), (other_name, y)) in left.iter().zip(right.iter()) {
                assert_eq!(name, other_name);
                assert_eq!(x, y, "trajectory {} differs", name);
            }
        }

        Ok(())
    }

    #[test]
    fn test_instability_reaches_the_caller() -> Result<(), SimulationError> {
        let mut params = SimulationParameters::default();
        params.astrocyte.v3 = 1e9;
        let ex = build_train(75., 1., 1, params.delta_t, true, &params.stimulus)?;

        let result = run_experiment(&ex, &params, &mut PairedPulseScore, &mut SeededUniform::new(1));

        match result {
            Err(SimulationError::NumericalInstability(err)) => {
                assert_eq!(err.compartment, "astrocyte");
                assert_eq!(err.step, 0);
                assert!(err.diagnostics.calcium_next < 0.);
            },
            other => panic!("expected numerical instability, got {:?}", other.map(|_| ())),
        }

        Ok(())
    }
}
