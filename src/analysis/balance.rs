//! Water balance diagnostics.
//!
//! ```text
//! error = lateral + boundary_in - boundary_out - (V_end - V_start)
//! ```
//!
//! All volumes are in 1000 m³, the unit segments store. The explicit scheme
//! moves exactly `Q dt` per substep between edges and segments, so the error
//! is round-off unless something external tampers with segment volumes.
//!
//! # Example
//!
//! ```
//! use sw1d::analysis::WaterBalance;
//!
//! let mut balance = WaterBalance::new(10.0);
//! balance.record(1.0, 2.0, 0.5);
//! balance.finish(12.5);
//! assert!(balance.error().abs() < 1e-12);
//! ```

use crate::network::Network;
use crate::storage::StorageModel;
use crate::types::SegmentIndex;

/// Accumulated volumes of one network over one or more external steps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaterBalance {
    /// Lateral inflow into all segments
    pub lateral_inflow: f64,
    /// Inflow through edges without an upstream segment
    pub boundary_inflow: f64,
    /// Outflow through edges without a downstream segment
    pub boundary_outflow: f64,
    /// Stored volume at the start
    pub volume_start: f64,
    /// Stored volume at the end
    pub volume_end: f64,
}

impl WaterBalance {
    /// Open a balance at the given stored volume.
    pub fn new(volume_start: f64) -> Self {
        Self {
            volume_start,
            volume_end: volume_start,
            ..Self::default()
        }
    }

    /// Add the fluxes of one external step.
    pub fn record(&mut self, lateral_inflow: f64, boundary_inflow: f64, boundary_outflow: f64) {
        self.lateral_inflow += lateral_inflow;
        self.boundary_inflow += boundary_inflow;
        self.boundary_outflow += boundary_outflow;
    }

    /// Close the balance at the given stored volume.
    pub fn finish(&mut self, volume_end: f64) {
        self.volume_end = volume_end;
    }

    /// Append a later balance of the same network.
    pub fn merge(&mut self, later: &WaterBalance) {
        self.record(later.lateral_inflow, later.boundary_inflow, later.boundary_outflow);
        self.volume_end = later.volume_end;
    }

    /// Change of stored volume.
    pub fn storage_change(&self) -> f64 {
        self.volume_end - self.volume_start
    }

    /// Absolute residual (1000 m³).
    pub fn error(&self) -> f64 {
        self.lateral_inflow + self.boundary_inflow - self.boundary_outflow - self.storage_change()
    }

    /// Residual relative to the largest volume involved.
    pub fn relative_error(&self) -> f64 {
        let scale = [
            self.lateral_inflow.abs(),
            self.boundary_inflow.abs(),
            self.boundary_outflow.abs(),
            self.volume_start.abs(),
            self.volume_end.abs(),
        ]
        .into_iter()
        .fold(0.0_f64, f64::max);
        if scale > 0.0 {
            self.error().abs() / scale
        } else {
            0.0
        }
    }

    /// Whether the relative residual stays within `tolerance`.
    pub fn is_closed(&self, tolerance: f64) -> bool {
        self.relative_error() <= tolerance
    }
}

/// Conservation findings. Reported, never fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum BalanceWarning {
    /// A segment ended an external step with negative storage.
    NegativeVolume {
        channel: String,
        position: usize,
        segment: SegmentIndex,
        step: usize,
        volume: f64,
    },
    /// The water balance residual exceeds the tolerance.
    BalanceError {
        step: usize,
        error: f64,
        relative: f64,
    },
}

impl std::fmt::Display for BalanceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeVolume {
                channel,
                position,
                step,
                volume,
                ..
            } => write!(
                f,
                "Negative volume in channel `{}` segment {} after step {}: {:.3e} (1000 m³)",
                channel, position, step, volume
            ),
            Self::BalanceError {
                step,
                error,
                relative,
            } => write!(
                f,
                "Water balance error after step {}: {:.3e} (1000 m³), relative {:.3e}",
                step, error, relative
            ),
        }
    }
}

/// Segments of `network` holding negative volume.
pub fn negative_volumes(network: &Network, step: usize) -> Vec<BalanceWarning> {
    network
        .segments()
        .iter()
        .enumerate()
        .filter(|(_, segment)| segment.water_volume() < 0.0)
        .map(|(s, segment)| {
            let index = SegmentIndex::new(s);
            let (channel, position) = network.segment_location(index);
            BalanceWarning::NegativeVolume {
                channel: channel.to_string(),
                position,
                segment: index,
                step,
                volume: segment.water_volume(),
            }
        })
        .collect()
}

/// Compare a balance against `tolerance`.
pub fn check_waterbalance(
    balance: &WaterBalance,
    tolerance: f64,
    step: usize,
) -> Option<BalanceWarning> {
    if balance.is_closed(tolerance) {
        None
    } else {
        Some(BalanceWarning::BalanceError {
            step,
            error: balance.error(),
            relative: balance.relative_error(),
        })
    }
}
