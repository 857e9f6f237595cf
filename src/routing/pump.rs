//! Level-triggered pump.
//!
//! The pumping rate follows a capacity curve over the lift (downstream minus
//! upstream level) and is scaled by an activation that rises linearly from 0
//! at the lower trigger level to 1 at the upper trigger level of the
//! upstream segment.

/// Parameters of a pump edge.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PumpConfig {
    /// Upstream level at which pumping starts (m)
    pub trigger_low: f64,
    /// Upstream level at which pumping reaches full capacity (m)
    pub trigger_high: f64,
    /// Lifts of the capacity curve (m), strictly increasing
    pub lifts: Vec<f64>,
    /// Maximum pumping rates at those lifts (m³/s)
    pub rates: Vec<f64>,
    /// Water level at the pump outlet when no segment or forcing provides one (m)
    pub downstream_level: Option<f64>,
}

impl PumpConfig {
    /// Pump with a constant capacity.
    pub fn constant(trigger_low: f64, trigger_high: f64, rate: f64) -> Self {
        Self::with_curve(trigger_low, trigger_high, vec![0.0], vec![rate])
    }

    /// Pump with a lift-dependent capacity curve.
    pub fn with_curve(
        trigger_low: f64,
        trigger_high: f64,
        lifts: Vec<f64>,
        rates: Vec<f64>,
    ) -> Self {
        Self {
            trigger_low,
            trigger_high,
            lifts,
            rates,
            downstream_level: None,
        }
    }

    /// Set a fixed external water level at the outlet.
    pub fn with_downstream_level(mut self, level: f64) -> Self {
        self.downstream_level = Some(level);
        self
    }

    /// Activation in [0, 1] for the given upstream level.
    pub fn activation(&self, level_upstream: f64) -> f64 {
        if level_upstream <= self.trigger_low {
            0.0
        } else if level_upstream >= self.trigger_high {
            1.0
        } else {
            (level_upstream - self.trigger_low) / (self.trigger_high - self.trigger_low)
        }
    }

    /// Capacity for the given lift, interpolated and held constant beyond the curve ends.
    pub fn capacity(&self, lift: f64) -> f64 {
        let n = self.lifts.len();
        if lift <= self.lifts[0] {
            return self.rates[0];
        }
        if lift >= self.lifts[n - 1] {
            return self.rates[n - 1];
        }
        let j = self.lifts.partition_point(|&x| x <= lift);
        let (x0, x1) = (self.lifts[j - 1], self.lifts[j]);
        let (y0, y1) = (self.rates[j - 1], self.rates[j]);
        y0 + (y1 - y0) * (lift - x0) / (x1 - x0)
    }

    /// Pumped discharge (m³/s).
    pub fn discharge(&self, level_upstream: f64, level_downstream: f64) -> f64 {
        self.activation(level_upstream) * self.capacity(level_downstream - level_upstream)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !(self.trigger_low < self.trigger_high) {
            return Err(format!(
                "lower trigger level {} must be below upper trigger level {}",
                self.trigger_low, self.trigger_high
            ));
        }
        if self.lifts.is_empty() || self.lifts.len() != self.rates.len() {
            return Err(format!(
                "capacity curve needs matching non-empty lifts and rates, got {} and {}",
                self.lifts.len(),
                self.rates.len()
            ));
        }
        if self.lifts.windows(2).any(|w| !(w[1] > w[0])) {
            return Err("capacity curve lifts must be strictly increasing".to_string());
        }
        if self.rates.iter().any(|&r| !(r >= 0.0 && r.is_finite())) {
            return Err("pumping rates must be non-negative".to_string());
        }
        Ok(())
    }
}
