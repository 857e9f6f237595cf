//! Free-flow weir at a channel outlet.
//!
//! Poleni formula:
//!
//! ```text
//! Q = w 2/3 c sqrt(2g) h^(3/2),   h = max(L - crest, 0)
//! ```

/// Parameters of a weir edge.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeirConfig {
    /// Crest level (m)
    pub crest_height: f64,
    /// Crest width (m)
    pub crest_width: f64,
    /// Flow coefficient (-)
    pub flow_coefficient: f64,
}

impl WeirConfig {
    /// Create a new weir configuration.
    pub fn new(crest_height: f64, crest_width: f64, flow_coefficient: f64) -> Self {
        Self {
            crest_height,
            crest_width,
            flow_coefficient,
        }
    }

    /// Head above the crest for the given upstream level.
    pub fn head(&self, level: f64) -> f64 {
        (level - self.crest_height).max(0.0)
    }

    /// Poleni discharge (m³/s).
    pub fn discharge(&self, level: f64, gravity: f64) -> f64 {
        let h = self.head(level);
        if h <= 0.0 {
            return 0.0;
        }
        self.crest_width * 2.0 / 3.0 * self.flow_coefficient * (2.0 * gravity).sqrt() * h.powf(1.5)
    }

    /// Stability bound `f 1000 L / (c sqrt(2 g h))`, infinite at or below the crest.
    pub fn max_substep(&self, timestep_factor: f64, length: f64, level: f64, gravity: f64) -> f64 {
        let h = self.head(level);
        if h <= 0.0 {
            return f64::INFINITY;
        }
        timestep_factor * 1000.0 * length / (self.flow_coefficient * (2.0 * gravity * h).sqrt())
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.crest_height.is_finite() {
            return Err(format!("crest height is not finite: {}", self.crest_height));
        }
        if !(self.crest_width >= 0.0 && self.crest_width.is_finite()) {
            return Err(format!("crest width must be non-negative, got {}", self.crest_width));
        }
        if !(self.flow_coefficient > 0.0 && self.flow_coefficient.is_finite()) {
            return Err(format!(
                "flow coefficient must be positive, got {}",
                self.flow_coefficient
            ));
        }
        Ok(())
    }
}
