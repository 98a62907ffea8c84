//! CSV export of trial trajectories and per pulse bar charts.

use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::info;
use crate::error::SimulationError;
use crate::experiment::ExperimentConfig;
use crate::simulation::{ConditionResult, ExperimentReport};


/// Directories written by a run relative to the output root
pub const OUTPUT_DIRECTORIES: [&str; 2] = ["csv", "png"];

/// Creates every output directory under `root` if absent
pub fn ensure_output_directories(root: &Path) -> Result<(), SimulationError> {
    for directory in OUTPUT_DIRECTORIES {
        create_dir_all(root.join(directory))?;
    }

    Ok(())
}

/// Row of the bar chart, one per pulse
#[derive(Debug, Clone, Serialize)]
pub struct BarRecord {
    pub bin: usize,
    pub acsf: f64,
    pub blocker: f64,
    pub acsf_normalized: Option<f64>,
    pub blocker_normalized: Option<f64>,
    pub blocker_ratio: Option<f64>,
}

fn isi_label(isi: f64) -> String {
    if isi.fract() == 0. { format!("{}", isi as i64) } else { format!("{}", isi) }
}

/// Path of the trajectory file of a condition
pub fn trajectory_path(root: &Path, condition: &ConditionResult, ex: &ExperimentConfig) -> PathBuf {
    root.join("csv")
        .join(format!("{}_isi{}.csv", condition.condition.name(), isi_label(ex.isi)))
}

/// Path of the bar chart file
pub fn barchart_path(root: &Path, ex: &ExperimentConfig) -> PathBuf {
    root.join("csv").join(format!("barchart_isi{}.csv", isi_label(ex.isi)))
}

/// Writes the last trial of a condition, one row every `stride` steps with a time column (ms)
pub fn write_trajectories(
    path: &Path,
    condition: &ConditionResult,
    ex: &ExperimentConfig,
    stride: usize,
) -> Result<(), SimulationError> {
    let trajectories = condition.last_trial.trajectories();
    let mut writer = csv::Writer::from_writer(File::create(path)?);

    let mut header = vec![String::from("time")];
    header.extend(trajectories.iter().map(|(name, _)| name.clone()));
    writer.write_record(&header)?;

    for i in (0..ex.horizon()).step_by(stride.max(1)) {
        let mut row = vec![(i as f64 * ex.delta_t).to_string()];
        row.extend(
            trajectories.iter()
                .map(|(_, series)| series.get(i).unwrap_or(f64::NAN).to_string())
        );
        writer.write_record(&row)?;
    }

    writer.flush()?;

    Ok(())
}

/// Builds the bar chart rows from both conditions and the score if present
pub fn bar_records(report: &ExperimentReport) -> Vec<BarRecord> {
    let score_at = |values: Option<&Vec<f64>>, n: usize| values.and_then(|v| v.get(n).copied());

    report.acsf.responses.iter()
        .zip(report.blocker.responses.iter())
        .enumerate()
        .map(|(bin, (acsf, blocker))| BarRecord {
            bin,
            acsf: *acsf,
            blocker: *blocker,
            acsf_normalized: score_at(report.score.as_ref().map(|s| &s.acsf_normalized), bin),
            blocker_normalized: score_at(report.score.as_ref().map(|s| &s.blocker_normalized), bin),
            blocker_ratio: score_at(report.score.as_ref().map(|s| &s.blocker_ratio), bin),
        })
        .collect()
}

/// Writes the per pulse responses of both conditions
pub fn write_barchart(path: &Path, report: &ExperimentReport) -> Result<(), SimulationError> {
    let mut writer = csv::Writer::from_writer(File::create(path)?);

    for record in bar_records(report) {
        writer.serialize(record)?;
    }

    writer.flush()?;

    Ok(())
}

/// Saves the last trial of both conditions and the bar chart under `root/csv`
pub fn save_experiment(
    root: &Path,
    ex: &ExperimentConfig,
    report: &ExperimentReport,
    stride: usize,
) -> Result<(), SimulationError> {
    ensure_output_directories(root)?;

    for condition in [&report.acsf, &report.blocker] {
        let path = trajectory_path(root, condition, ex);
        write_trajectories(&path, condition, ex, stride)?;
        info!(path = %path.display(), "saved trajectories");
    }

    let path = barchart_path(root, ex);
    write_barchart(&path, report)?;
    info!(path = %path.display(), "saved bar chart");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isi_label() {
        assert_eq!(isi_label(75.), "75");
        assert_eq!(isi_label(12.5), "12.5");
    }
}
