use std::fmt::{Display, Debug, Formatter, Result};


/// Error set for invalid experiment or parameter configuration
pub enum ConfigurationError {
    /// Integration timestep must be strictly positive
    NonPositiveTimestep,
    /// Inter-stimulus interval must be strictly positive
    NonPositiveInterval,
    /// Experiment duration must be strictly positive
    NonPositiveDuration,
    /// At least one trial must be run
    NoTrials,
    /// Named quantity is infinite, not a number, or gives an unrepresentable number of steps
    NonFiniteValue(&'static str),
    /// Parameter file exists but could not be parsed
    InvalidParameterFile(String),
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ConfigurationError::NonPositiveTimestep => write!(f, "Timestep must be greater than 0"),
            ConfigurationError::NonPositiveInterval => write!(f, "Inter-stimulus interval must be greater than 0"),
            ConfigurationError::NonPositiveDuration => write!(f, "Experiment duration must be greater than 0"),
            ConfigurationError::NoTrials => write!(f, "At least one trial is required"),
            ConfigurationError::NonFiniteValue(name) => write!(f, "{} must be finite and fit in memory", name),
            ConfigurationError::InvalidParameterFile(msg) => write!(f, "Cannot parse parameter file: {}", msg),
        }
    }
}

impl Debug for ConfigurationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

impl std::error::Error for ConfigurationError {}

/// Full state of a compartment at the step where its calcium became invalid
#[derive(Clone, Copy, PartialEq)]
pub struct InstabilityDiagnostics {
    /// Newly computed calcium concentration (nM)
    pub calcium_next: f64,
    /// Calcium concentration at the prior step (nM)
    pub calcium_prior: f64,
    /// IP3 receptor gating variable at the prior step
    pub gate: f64,
    /// Calcium flux through IP3 receptors (nM/ms)
    pub j_chan: f64,
    /// SERCA pump flux (nM/ms)
    pub j_pump: f64,
    /// ER leak flux (nM/ms)
    pub j_leak: f64,
}

impl Display for InstabilityDiagnostics {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(
            f,
            "ca[i+1]={}  ca[i]={}  gate={},  j_chan={},  j_pump={},  j_leak={}",
            self.calcium_next,
            self.calcium_prior,
            self.gate,
            self.j_chan,
            self.j_pump,
            self.j_leak,
        )
    }
}

impl Debug for InstabilityDiagnostics {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", self)
    }
}

/// A calcium state became negative or not a number, the modeling assumptions
/// of the compartment no longer hold and the run cannot continue
pub struct NumericalInstabilityError {
    /// Compartment that produced the invalid value
    pub compartment: &'static str,
    /// Step index `i` whose update produced index `i + 1`
    pub step: usize,
    /// State at the failing step
    pub diagnostics: InstabilityDiagnostics,
}

impl Display for NumericalInstabilityError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(
            f,
            "Calcium in {} became negative or not a number at step {}: {}",
            self.compartment,
            self.step,
            self.diagnostics,
        )
    }
}

impl Debug for NumericalInstabilityError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// A set of errors that may occur when running a simulation
pub enum SimulationError {
    /// Errors related to configuration
    ConfigurationRelatedError(ConfigurationError),
    /// Fatal numerical instability
    NumericalInstability(Box<NumericalInstabilityError>),
    /// Trajectories or bar charts could not be written
    Export(String),
}

impl Display for SimulationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            SimulationError::ConfigurationRelatedError(err) => write!(f, "{}", err),
            SimulationError::NumericalInstability(err) => write!(f, "{}", err),
            SimulationError::Export(msg) => write!(f, "Cannot export results: {}", msg),
        }
    }
}

impl Debug for SimulationError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

impl std::error::Error for SimulationError {}

impl From<ConfigurationError> for SimulationError {
    fn from(err: ConfigurationError) -> SimulationError {
        SimulationError::ConfigurationRelatedError(err)
    }
}

impl From<NumericalInstabilityError> for SimulationError {
    fn from(err: NumericalInstabilityError) -> SimulationError {
        SimulationError::NumericalInstability(Box::new(err))
    }
}

impl From<csv::Error> for SimulationError {
    fn from(err: csv::Error) -> SimulationError {
        SimulationError::Export(err.to_string())
    }
}

impl From<std::io::Error> for SimulationError {
    fn from(err: std::io::Error) -> SimulationError {
        SimulationError::Export(err.to_string())
    }
}
