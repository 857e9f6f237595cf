//! External forcing per external step.
//!
//! Forcing is looked up by channel name and slot position, so the same
//! provider serves every network split off a builder. Values are fetched
//! once before the substep loop and held for the whole external step.

use std::collections::HashMap;

/// Source of boundary and lateral forcing.
///
/// `None` keeps the value currently in effect.
pub trait ForcingProvider: Send + Sync {
    /// Lateral inflow into a segment (m³/s).
    fn lateral_inflow(&self, channel: &str, segment: usize, step: usize) -> Option<f64>;

    /// Prescribed discharge of an inflow or outflow edge (m³/s).
    fn boundary_discharge(&self, channel: &str, edge: usize, step: usize) -> Option<f64>;

    /// External water level behind a gate or pump without a downstream segment (m).
    fn boundary_water_level(&self, channel: &str, edge: usize, step: usize) -> Option<f64>;
}

type Series = HashMap<(String, usize), Vec<f64>>;

/// In-memory forcing tables indexed by external step.
///
/// Steps past the end of a series keep the last value.
///
/// # Example
///
/// ```
/// use sw1d::simulation::{ForcingProvider, TabulatedForcing};
///
/// let forcing = TabulatedForcing::new()
///     .with_boundary_discharge("upper", 0, vec![1.0, 4.0]);
///
/// assert_eq!(forcing.boundary_discharge("upper", 0, 1), Some(4.0));
/// assert_eq!(forcing.boundary_discharge("upper", 0, 5), Some(4.0));
/// assert_eq!(forcing.boundary_discharge("lower", 0, 0), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TabulatedForcing {
    lateral: Series,
    discharge: Series,
    level: Series,
}

impl TabulatedForcing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lateral_inflow(
        mut self,
        channel: impl Into<String>,
        segment: usize,
        values: Vec<f64>,
    ) -> Self {
        self.lateral.insert((channel.into(), segment), values);
        self
    }

    pub fn with_boundary_discharge(
        mut self,
        channel: impl Into<String>,
        edge: usize,
        values: Vec<f64>,
    ) -> Self {
        self.discharge.insert((channel.into(), edge), values);
        self
    }

    pub fn with_boundary_water_level(
        mut self,
        channel: impl Into<String>,
        edge: usize,
        values: Vec<f64>,
    ) -> Self {
        self.level.insert((channel.into(), edge), values);
        self
    }

    fn lookup(series: &Series, channel: &str, position: usize, step: usize) -> Option<f64> {
        let values = series.get(&(channel.to_string(), position))?;
        values.get(step).or_else(|| values.last()).copied()
    }
}

impl ForcingProvider for TabulatedForcing {
    fn lateral_inflow(&self, channel: &str, segment: usize, step: usize) -> Option<f64> {
        Self::lookup(&self.lateral, channel, segment, step)
    }

    fn boundary_discharge(&self, channel: &str, edge: usize, step: usize) -> Option<f64> {
        Self::lookup(&self.discharge, channel, edge, step)
    }

    fn boundary_water_level(&self, channel: &str, edge: usize, step: usize) -> Option<f64> {
        Self::lookup(&self.level, channel, edge, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let forcing = TabulatedForcing::new()
            .with_lateral_inflow("a", 1, vec![0.5, 0.25])
            .with_boundary_water_level("a", 3, vec![2.0]);
        assert_eq!(forcing.lateral_inflow("a", 1, 0), Some(0.5));
        assert_eq!(forcing.lateral_inflow("a", 1, 1), Some(0.25));
        assert_eq!(forcing.lateral_inflow("a", 0, 0), None);
        assert_eq!(forcing.boundary_water_level("a", 3, 10), Some(2.0));
    }

    #[test]
    fn test_empty_series() {
        let forcing = TabulatedForcing::new().with_boundary_discharge("a", 0, vec![]);
        assert_eq!(forcing.boundary_discharge("a", 0, 0), None);
    }
}
