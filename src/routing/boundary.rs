//! Prescribed-discharge boundaries.
//!
//! Inflow edges feed the first segment of a channel from an external series,
//! outflow edges withdraw from the last segment. Both take their discharge
//! from the forcing of the current external step.

/// Parameters of an inflow or outflow edge.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundaryConfig {
    /// Discharge used when the forcing provides none (m³/s)
    pub discharge: f64,
}

impl BoundaryConfig {
    /// Constant prescribed discharge.
    pub fn new(discharge: f64) -> Self {
        Self { discharge }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.discharge.is_finite() {
            return Err(format!("discharge is not finite: {}", self.discharge));
        }
        Ok(())
    }
}

/// Kinematic wave stability bound: `f 1000 L / (5/3 |Q| / A)`.
///
/// `length` is the half-length of the attached segment (km), `area` its
/// wetted area (m²). Returns infinity for zero flow or a dry segment.
pub fn kinematic_max_substep(timestep_factor: f64, length: f64, discharge: f64, area: f64) -> f64 {
    if discharge == 0.0 || area <= 0.0 {
        return f64::INFINITY;
    }
    let celerity = 5.0 / 3.0 * discharge.abs() / area;
    timestep_factor * 1000.0 * length / celerity
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kinematic_bound() {
        // v = 2 m/s, c = 10/3 m/s
        let dt = kinematic_max_substep(0.6, 0.5, 20.0, 10.0);
        assert_relative_eq!(dt, 0.6 * 500.0 / (10.0 / 3.0), max_relative = 1e-12);
    }

    #[test]
    fn test_sign_does_not_matter() {
        assert_eq!(
            kinematic_max_substep(0.6, 0.5, 20.0, 10.0),
            kinematic_max_substep(0.6, 0.5, -20.0, 10.0)
        );
    }

    #[test]
    fn test_degenerate_bounds() {
        assert_eq!(kinematic_max_substep(0.6, 0.5, 0.0, 10.0), f64::INFINITY);
        assert_eq!(kinematic_max_substep(0.6, 0.5, 5.0, 0.0), f64::INFINITY);
    }
}
