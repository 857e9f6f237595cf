//! Sluice gate.
//!
//! Orifice flow through the effective opening
//!
//! ```text
//! a = min(gate_height, max(L_up, L_down)) - bottom_level
//! Q = c w a sqrt(2g) [ φ(ΔL) sqrt(max(ΔL, 0)) - φ(-ΔL) sqrt(max(-ΔL, 0)) ]
//! ```
//!
//! with `ΔL = L_up - L_down`. The factor `φ` rises smoothly from 0 to 1 over
//! the damping radius, so the derivative of `Q` with respect to the head
//! difference vanishes for balanced levels instead of growing without bound.
//! The formula is antisymmetric: swapping both levels flips the sign exactly.

use std::fmt;
use std::sync::Arc;

/// Parameters of a gate edge.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateConfig {
    /// Level of the gate sill (m)
    pub bottom_level: f64,
    /// Level of the lower gate edge (m), the initial value if controlled
    pub gate_height: f64,
    /// Gate width (m)
    pub gate_width: f64,
    /// Flow coefficient (-)
    pub flow_coefficient: f64,
    /// Head difference below which the flow is damped (m)
    pub damping_radius: f64,
    /// Water level behind the gate when no segment or forcing provides one (m)
    pub downstream_level: Option<f64>,
}

impl GateConfig {
    /// Create a new gate configuration with a 1 cm damping radius.
    pub fn new(
        bottom_level: f64,
        gate_height: f64,
        gate_width: f64,
        flow_coefficient: f64,
    ) -> Self {
        Self {
            bottom_level,
            gate_height,
            gate_width,
            flow_coefficient,
            damping_radius: 0.01,
            downstream_level: None,
        }
    }

    /// Set the damping radius.
    pub fn with_damping_radius(mut self, radius: f64) -> Self {
        self.damping_radius = radius;
        self
    }

    /// Set a fixed external water level behind the gate.
    pub fn with_downstream_level(mut self, level: f64) -> Self {
        self.downstream_level = Some(level);
        self
    }

    /// Effective opening for the given gate height and levels.
    ///
    /// The opening is capped by the higher of the two levels, so it does not
    /// depend on the flow direction and reversed levels give an exactly
    /// mirrored discharge.
    pub fn effective_opening(
        &self,
        gate_height: f64,
        level_upstream: f64,
        level_downstream: f64,
    ) -> f64 {
        gate_height.min(level_upstream.max(level_downstream)) - self.bottom_level
    }

    /// Signed gate discharge (m³/s); positive from upstream to downstream.
    pub fn discharge(
        &self,
        gate_height: f64,
        level_upstream: f64,
        level_downstream: f64,
        gravity: f64,
    ) -> f64 {
        let opening = self.effective_opening(gate_height, level_upstream, level_downstream);
        if opening <= 0.0 {
            return 0.0;
        }
        let dh = level_upstream - level_downstream;
        let forward = self.damping(dh) * dh.max(0.0).sqrt();
        let backward = self.damping(-dh) * (-dh).max(0.0).sqrt();
        self.flow_coefficient
            * self.gate_width
            * opening
            * (2.0 * gravity).sqrt()
            * (forward - backward)
    }

    /// Stability bound `f 1000 L / (c sqrt(2 g |ΔL|))`.
    ///
    /// Infinite for a closed gate or balanced levels.
    pub fn max_substep(
        &self,
        timestep_factor: f64,
        length: f64,
        gate_height: f64,
        level_upstream: f64,
        level_downstream: f64,
        gravity: f64,
    ) -> f64 {
        let opening = self.effective_opening(gate_height, level_upstream, level_downstream);
        let dh = (level_upstream - level_downstream).abs();
        if opening <= 0.0 || dh == 0.0 {
            return f64::INFINITY;
        }
        timestep_factor * 1000.0 * length / (self.flow_coefficient * (2.0 * gravity * dh).sqrt())
    }

    /// Smoothstep from 0 at no head to 1 at the damping radius.
    fn damping(&self, dh: f64) -> f64 {
        if dh <= 0.0 {
            return 0.0;
        }
        if self.damping_radius <= 0.0 || dh >= self.damping_radius {
            return 1.0;
        }
        let x = dh / self.damping_radius;
        x * x * (3.0 - 2.0 * x)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !(self.bottom_level.is_finite() && self.gate_height.is_finite()) {
            return Err("gate levels must be finite".to_string());
        }
        if !(self.gate_width >= 0.0 && self.gate_width.is_finite()) {
            return Err(format!("gate width must be non-negative, got {}", self.gate_width));
        }
        if !(self.flow_coefficient > 0.0 && self.flow_coefficient.is_finite()) {
            return Err(format!(
                "flow coefficient must be positive, got {}",
                self.flow_coefficient
            ));
        }
        if !(self.damping_radius >= 0.0) {
            return Err(format!(
                "damping radius must be non-negative, got {}",
                self.damping_radius
            ));
        }
        Ok(())
    }
}

/// State handed to a gate control callback once per substep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateControlContext {
    /// Simulation time at the start of the substep (s)
    pub time: f64,
    /// Upstream water level (m)
    pub upstream_level: f64,
    /// Downstream water level (m)
    pub downstream_level: f64,
    /// Gate height currently in effect (m)
    pub gate_height: f64,
}

/// User-supplied rule returning the gate height for a substep.
///
/// # Example
///
/// ```
/// use sw1d::routing::GateControl;
///
/// // Close the gate whenever the downstream level exceeds 8 m
/// let control = GateControl::new(|ctx| if ctx.downstream_level > 8.0 { 0.0 } else { 6.0 });
/// ```
#[derive(Clone)]
pub struct GateControl(Arc<dyn Fn(&GateControlContext) -> f64 + Send + Sync>);

impl GateControl {
    /// Wrap a control rule.
    pub fn new<F>(rule: F) -> Self
    where
        F: Fn(&GateControlContext) -> f64 + Send + Sync + 'static,
    {
        Self(Arc::new(rule))
    }

    /// Evaluate the rule.
    pub fn gate_height(&self, ctx: &GateControlContext) -> f64 {
        (self.0)(ctx)
    }
}

impl fmt::Debug for GateControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GateControl(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const G: f64 = 9.81;

    fn gate() -> GateConfig {
        GateConfig::new(4.0, 6.0, 3.0, 0.6)
    }

    #[test]
    fn test_submerged_gate() {
        let q = gate().discharge(6.0, 9.0, 7.0, G);
        assert_relative_eq!(q, 22.55, epsilon = 0.01);
    }

    #[test]
    fn test_reversed_levels_flip_sign() {
        let forward = gate().discharge(6.0, 9.0, 7.0, G);
        let backward = gate().discharge(6.0, 7.0, 9.0, G);
        assert_eq!(forward, -backward);
    }

    #[test]
    fn test_closed_gate() {
        assert_eq!(gate().discharge(4.0, 9.0, 7.0, G), 0.0);
        assert_eq!(gate().discharge(3.0, 9.0, 7.0, G), 0.0);
        assert_eq!(gate().max_substep(0.5, 1.0, 4.0, 9.0, 7.0, G), f64::INFINITY);
    }

    #[test]
    fn test_opening_capped_by_higher_level() {
        let g = gate();
        // Gate above both levels: water on the higher side sets the opening
        assert_eq!(g.effective_opening(9.0, 5.5, 5.0), 1.5);
        assert_eq!(g.effective_opening(9.0, 5.0, 5.5), 1.5);
        // Gate below the higher level caps it
        assert_eq!(g.effective_opening(5.0, 7.0, 4.5), 1.0);
    }

    #[test]
    fn test_water_below_sill() {
        assert_eq!(gate().discharge(6.0, 3.0, 2.0, G), 0.0);
    }

    #[test]
    fn test_balanced_levels() {
        let g = gate();
        assert_eq!(g.discharge(6.0, 8.0, 8.0, G), 0.0);
        assert_eq!(g.max_substep(0.5, 1.0, 6.0, 8.0, 8.0, G), f64::INFINITY);
    }

    #[test]
    fn test_damping_is_smooth() {
        let g = gate().with_damping_radius(0.1);
        let tiny = g.discharge(6.0, 8.0 + 1e-4, 8.0, G);
        let undamped = gate().with_damping_radius(0.0).discharge(6.0, 8.0 + 1e-4, 8.0, G);
        assert!(tiny > 0.0);
        assert!(tiny < 1e-3 * undamped);
        // Full flow beyond the radius
        assert_eq!(
            g.discharge(6.0, 8.5, 8.0, G),
            gate().with_damping_radius(0.0).discharge(6.0, 8.5, 8.0, G)
        );
    }

    #[test]
    fn test_control_callback() {
        let control = GateControl::new(|ctx| if ctx.upstream_level > 8.0 { 7.0 } else { 5.0 });
        let ctx = GateControlContext {
            time: 0.0,
            upstream_level: 9.0,
            downstream_level: 7.0,
            gate_height: 6.0,
        };
        assert_eq!(control.gate_height(&ctx), 7.0);
        assert_eq!(format!("{:?}", control), "GateControl(..)");
    }
}
