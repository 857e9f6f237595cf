//! Water storage in channel segments.
//!
//! Segments hold volume; routing edges move it. The [`StorageModel`] trait is
//! the seam the orchestrator drives every substep.

mod segment;

pub use segment::{InitialState, Segment, SegmentConfig};

/// Capability interface of a storage submodel.
pub trait StorageModel {
    /// Set the substep length (s) used by the next update.
    fn set_substep(&mut self, substep: f64);

    /// Apply one substep of mass balance.
    ///
    /// `edge_inflow` is the sum of the discharges of all upstream edges minus
    /// the sum of the discharges of all downstream edges (m³/s). Lateral
    /// inflow is added by the storage itself.
    fn update_storage(&mut self, edge_inflow: f64);

    /// Stored water volume (1000 m³). May be transiently negative.
    fn water_volume(&self) -> f64;

    /// Current water level (m).
    fn water_level(&self) -> f64;
}
