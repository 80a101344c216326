//! Error types for simulation operations.

use thiserror::Error;

/// Fatal conditions detected by the step controller.
///
/// These are the only errors the driver treats as a simulation runtime
/// failure; everything else is an ordinary error of the host environment.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeFailure {
    #[error("Health check failed at step {step} (t={t:e}): {detail}")]
    HealthCheck { step: u64, t: f64, detail: String },

    #[error("Restart file written by {saved} workers, this run has {current}")]
    PartitionMismatch { saved: usize, current: usize },

    #[error("Final time {t:e} misses target {t_final:e}")]
    FinalTime { t: f64, t_final: f64 },
}

/// Configuration problems found before the run starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Conflicting options: {what}")]
    Conflict { what: &'static str },
}

/// Errors encountered during a simulation run.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation runtime failure: {0}")]
    Runtime(#[from] RuntimeFailure),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub fn is_runtime_failure(&self) -> bool {
        matches!(self, SimError::Runtime(_))
    }

    pub fn runtime_failure(&self) -> Option<&RuntimeFailure> {
        match self {
            SimError::Runtime(f) => Some(f),
            _ => None,
        }
    }
}

impl From<rf_fluids::FluidError> for SimError {
    fn from(e: rf_fluids::FluidError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<rf_mesh::MeshError> for SimError {
    fn from(e: rf_mesh::MeshError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<rf_core::RfError> for SimError {
    fn from(e: rf_core::RfError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
