//! Parameter sets for a run, every biological constant shared between
//! compartments lives in [`PhysicalParameters`] and is passed by reference.

use std::{fs::read_to_string, io::ErrorKind, path::Path};
use serde::{Deserialize, Serialize};
use crate::astrocyte::AstrocyteParameters;
use crate::bouton::BoutonParameters;
use crate::error::ConfigurationError;
use crate::vesicles::{ReleaseModel, VesicleParameters};


/// Physical constants shared by every compartment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalParameters {
    /// Ratio of ER volume to cytosolic volume, Shuai & Jung (2002)
    pub er_volume_ratio: f64,
    /// Faraday's constant (C/mol)
    pub faraday: f64,
    /// Gas constant (J/mol/K)
    pub gas_constant: f64,
    /// Temperature of the experiments of Perea & Araque (2007) (K)
    pub temperature: f64,
    /// Extracellular calcium (nM)
    pub extracellular_calcium: f64,
    /// Calcium diffusion coefficient (um^2/ms), Nadkarni et al. (2010)
    pub calcium_diffusion: f64,
}

impl Default for PhysicalParameters {
    fn default() -> Self {
        PhysicalParameters {
            er_volume_ratio: 0.185,
            faraday: 96485.33289,
            gas_constant: 8.3144598,
            temperature: 273.15 + 21.,
            extracellular_calcium: 2e6,
            calcium_diffusion: 0.050,
        }
    }
}

impl PhysicalParameters {
    /// Faraday's constant scaled to micromoles
    pub fn faraday_micro(&self) -> f64 {
        self.faraday / 1e6
    }

    /// Calcium reversal potential (mV) from the Nernst equation given
    /// the resting intracellular calcium (nM)
    pub fn calcium_reversal(&self, intracellular_calcium: f64) -> f64 {
        1000. * (self.gas_constant * self.temperature / (2. * self.faraday))
            * (self.extracellular_calcium / intracellular_calcium).ln()
    }

    /// Converts a calcium current into the rate of change of calcium (nM/ms)
    /// at `distance` (um) from the channel cluster
    pub fn current_to_flux(&self, current: f64, distance: f64) -> f64 {
        -current / (2. * self.faraday_micro() * self.calcium_diffusion * distance)
    }
}

/// Shape of the applied current train
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StimulusParameters {
    /// Padding before the first stimulus (ms), also sets delay lines
    pub beg_pad: f64,
    /// Applied current amplitude (uA/cm^2)
    pub amplitude: f64,
    /// Duration of each pulse (ms)
    pub pulse_width: f64,
}

impl Default for StimulusParameters {
    fn default() -> Self {
        StimulusParameters {
            beg_pad: 5.,
            amplitude: 40.,
            pulse_width: 1.,
        }
    }
}

/// Every parameter of a run, loadable from a `.toml` file where any
/// missing table or key falls back to its default
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub physical: PhysicalParameters,
    pub stimulus: StimulusParameters,
    pub bouton: BoutonParameters,
    pub bouton_vesicles: VesicleParameters,
    pub astrocyte: AstrocyteParameters,
    pub astrocyte_vesicles: VesicleParameters,
    /// Integration timestep shared by every component (ms)
    pub delta_t: f64,
    /// Release kinetics used by the bouton for the whole run
    pub release_model: ReleaseModel,
    /// Seed of the shared uniform source
    pub seed: u64,
    /// Whether to write trajectories and bar charts to disk
    pub save_data: bool,
    /// Write every `save_stride`-th step of the trajectories
    pub save_stride: usize,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            physical: PhysicalParameters::default(),
            stimulus: StimulusParameters::default(),
            bouton: BoutonParameters::default(),
            bouton_vesicles: VesicleParameters::default(),
            astrocyte: AstrocyteParameters::default(),
            astrocyte_vesicles: VesicleParameters::astrocyte_default(),
            delta_t: 0.05,
            release_model: ReleaseModel::default(),
            seed: 1,
            save_data: true,
            save_stride: 20,
        }
    }
}

impl SimulationParameters {
    /// Parses parameters from the contents of a `.toml` file
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(contents)
            .map_err(|e| ConfigurationError::InvalidParameterFile(e.to_string()))
    }

    /// Loads parameters from a `.toml` file, returns defaults if the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        match read_to_string(path.as_ref()) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigurationError::InvalidParameterFile(
                format!("{}: {}", path.as_ref().display(), e)
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vesicles::ReleaseModel;

    #[test]
    fn test_calcium_reversal_near_125_mv() {
        let physical = PhysicalParameters::default();
        let reversal = physical.calcium_reversal(100.);

        assert!((reversal - 125.5).abs() < 0.5, "reversal: {}", reversal);
    }

    #[test]
    fn test_current_to_flux_sign() {
        let physical = PhysicalParameters::default();

        // inward (negative) current raises calcium
        assert!(physical.current_to_flux(-1., 0.09) > 0.);
        assert_eq!(physical.current_to_flux(0., 0.09), 0.);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() -> Result<(), ConfigurationError> {
        let params = SimulationParameters::from_toml_str(r#"
            seed = 7

            [physical]
            er_volume_ratio = 0.2

            [release_model]
            model = "sequential_binding"
            sites = 4
        "#)?;

        assert_eq!(params.seed, 7);
        assert_eq!(params.physical.er_volume_ratio, 0.2);
        assert_eq!(params.physical.faraday, PhysicalParameters::default().faraday);
        assert_eq!(params.stimulus, StimulusParameters::default());
        match params.release_model {
            ReleaseModel::SequentialBinding(model) => assert_eq!(model.sensor.sites, 4),
            other => panic!("unexpected release model: {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_missing_file_gives_defaults() -> Result<(), ConfigurationError> {
        let path = std::env::temp_dir().join("presynaptic_plasticity_absent_parameters.toml");
        let params = SimulationParameters::load_or_default(&path)?;

        assert_eq!(params.seed, SimulationParameters::default().seed);

        Ok(())
    }

    #[test]
    fn test_unreadable_file_is_rejected() {
        let path = std::env::temp_dir()
            .join(format!("presynaptic_plasticity_invalid_utf8_{}.toml", std::process::id()));
        std::fs::write(&path, [0xff, 0xfe, b's', b'e', b'e', b'd']).expect("temporary file");

        let result = SimulationParameters::load_or_default(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigurationError::InvalidParameterFile(_))));
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        assert!(SimulationParameters::from_toml_str("seed = \"seven\"").is_err());
    }
}
