use thiserror::Error;

use crate::control::flight_phase::FlightPhase;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Domain error: {quantity} = {value} is outside the valid range of the model")]
    DomainError { quantity: &'static str, value: f64 },

    #[error("Configuration error in `{field}`: {reason}")]
    ConfigurationError { field: String, reason: String },

    #[error(
        "Integration timeout: {phase} phase did not reach its terminal event within {budget} s (stopped at t = {time:.3} s)"
    )]
    IntegrationTimeout {
        phase: FlightPhase,
        time: f64,
        budget: f64,
    },
}

impl SimulationError {
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SimulationError::ConfigurationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn domain(quantity: &'static str, value: f64) -> Self {
        SimulationError::DomainError { quantity, value }
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Rejects non-finite and non-positive values for a named configuration field.
pub fn require_positive(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimulationError::configuration(
            field,
            format!("must be a positive finite number, got {value}"),
        ))
    }
}
