#[cfg(test)]
mod test {
    use std::{fs::{read_to_string, remove_dir_all}, env::temp_dir};
    use presynaptic_plasticity::{
        distribution::SeededUniform,
        error::SimulationError,
        experiment::build_train,
        export::{barchart_path, save_experiment, trajectory_path},
        parameters::SimulationParameters,
        simulation::{run_experiment, PairedPulseScore},
    };


    #[test]
    fn test_saved_files() -> Result<(), SimulationError> {
        let root = temp_dir().join(format!("presynaptic_plasticity_export_{}", std::process::id()));
        let params = SimulationParameters::default();
        let mut ex = build_train(100., 0.2, 1, params.delta_t, true, &params.stimulus)?;
        ex.ap5_exp = true;

        let report = run_experiment(&ex, &params, &mut PairedPulseScore, &mut SeededUniform::new(1))?;
        save_experiment(&root, &ex, &report, params.save_stride)?;

        assert!(root.join("png").is_dir());

        let acsf = read_to_string(trajectory_path(&root, &report.acsf, &ex))?;
        assert!(acsf.starts_with("time,bouton.membrane.v"));
        assert!(acsf.lines().next().unwrap_or("").contains("astrocyte.calcium"));
        // header plus one row every stride steps
        assert_eq!(acsf.lines().count(), 1 + (ex.horizon() + params.save_stride - 1) / params.save_stride);

        assert!(trajectory_path(&root, &report.blocker, &ex).ends_with("csv/blocker_isi100.csv"));

        let barchart = read_to_string(barchart_path(&root, &ex))?;
        let mut lines = barchart.lines();
        assert_eq!(
            lines.next(),
            Some("bin,acsf,blocker,acsf_normalized,blocker_normalized,blocker_ratio"),
        );
        assert_eq!(lines.count(), ex.bins);

        remove_dir_all(&root)?;

        Ok(())
    }
}
