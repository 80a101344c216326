//! Error types for the rf-app service layer.

use std::path::PathBuf;

/// Unified error for the CLI and the run services.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Simulation error: {0}")]
    Simulation(#[from] rf_sim::SimError),

    #[error("Case setup failed on another worker")]
    PeerSetupFailed,

    #[error("Worker {rank} panicked")]
    WorkerPanicked { rank: usize },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// True for the fatal runtime failures raised by the step loop.
    pub fn is_runtime_failure(&self) -> bool {
        matches!(self, AppError::Simulation(e) if e.is_runtime_failure())
    }
}

impl From<rf_core::RfError> for AppError {
    fn from(err: rf_core::RfError) -> Self {
        AppError::Backend {
            message: err.to_string(),
        }
    }
}

impl From<rf_fluids::FluidError> for AppError {
    fn from(err: rf_fluids::FluidError) -> Self {
        AppError::Backend {
            message: err.to_string(),
        }
    }
}

impl From<rf_mesh::MeshError> for AppError {
    fn from(err: rf_mesh::MeshError) -> Self {
        AppError::Backend {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_sim::{RuntimeFailure, SimError};

    #[test]
    fn runtime_failures_stay_distinguishable() {
        let fatal: AppError = SimError::from(RuntimeFailure::FinalTime {
            t: 1.0,
            t_final: 2.0,
        })
        .into();
        assert!(fatal.is_runtime_failure());

        let ordinary: AppError = rf_mesh::MeshError::MeshMismatch.into();
        assert!(!ordinary.is_runtime_failure());
        assert!(ordinary.to_string().starts_with("Backend error"));
    }
}
