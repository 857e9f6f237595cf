//! Routing parameters and the per-step simulation context.

use crate::error::{ConfigError, Result};
use crate::types::GRAVITY;

/// Parameters shared by every edge of a simulation.
///
/// # Example
///
/// ```
/// use sw1d::simulation::RoutingConfig;
///
/// let config = RoutingConfig::default()
///     .with_timestep_factor(0.5)
///     .with_min_substep(1.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RoutingConfig {
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
    /// Safety factor on every stability bound, in (0, 1]
    pub timestep_factor: f64,
    /// Lower cut-off for the substep (s)
    pub min_substep: Option<f64>,
    /// Relative tolerance of the water balance check
    pub balance_tolerance: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            timestep_factor: 0.7,
            min_substep: None,
            balance_tolerance: 1e-9,
        }
    }
}

impl RoutingConfig {
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_timestep_factor(mut self, factor: f64) -> Self {
        self.timestep_factor = factor;
        self
    }

    pub fn with_min_substep(mut self, min_substep: f64) -> Self {
        self.min_substep = Some(min_substep);
        self
    }

    pub fn with_balance_tolerance(mut self, tolerance: f64) -> Self {
        self.balance_tolerance = tolerance;
        self
    }

    /// Check every parameter range.
    pub fn validate(&self) -> Result<()> {
        if !(self.gravity > 0.0 && self.gravity.is_finite()) {
            return Err(ConfigError::InvalidRouting(format!(
                "gravity must be positive, got {}",
                self.gravity
            )));
        }
        if !(self.timestep_factor > 0.0 && self.timestep_factor <= 1.0) {
            return Err(ConfigError::InvalidRouting(format!(
                "timestep factor must lie in (0, 1], got {}",
                self.timestep_factor
            )));
        }
        if let Some(min) = self.min_substep {
            if !(min > 0.0 && min.is_finite()) {
                return Err(ConfigError::InvalidRouting(format!(
                    "minimum substep must be positive, got {}",
                    min
                )));
            }
        }
        if !(self.balance_tolerance >= 0.0) {
            return Err(ConfigError::InvalidRouting(format!(
                "balance tolerance must be non-negative, got {}",
                self.balance_tolerance
            )));
        }
        Ok(())
    }
}

/// Explicit simulation state threaded through every network operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationContext {
    /// Routing parameters
    pub config: RoutingConfig,
    /// Length of one external step (s)
    pub external_step: f64,
    /// Index of the current external step
    pub step: usize,
    /// Simulation time (s); start of the current substep inside the loop
    pub time: f64,
}

impl SimulationContext {
    /// Context at time zero.
    pub fn new(config: RoutingConfig, external_step: f64) -> Result<Self> {
        config.validate()?;
        if !(external_step > 0.0 && external_step.is_finite()) {
            return Err(ConfigError::InvalidRouting(format!(
                "external step must be positive, got {}",
                external_step
            )));
        }
        Ok(Self {
            config,
            external_step,
            step: 0,
            time: 0.0,
        })
    }

    /// Same context shifted `offset` seconds into the current step.
    pub fn at_offset(&self, offset: f64) -> Self {
        Self {
            time: self.time + offset,
            ..*self
        }
    }

    /// Move on to the next external step.
    pub fn advance(&mut self) {
        self.step += 1;
        self.time += self.external_step;
    }
}
