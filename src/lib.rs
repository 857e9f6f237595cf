//! # sw1d
//!
//! One-dimensional shallow-water routing through channel networks.
//!
//! This crate provides the building blocks of an explicit channel router:
//! - Cross-section geometry (stacked trapezes, tabulated widths)
//! - Segment storages holding water volume
//! - Routing edges: local inertial flow, boundary inflow and outflow,
//!   weirs, sluice gates and pumps
//! - Network assembly from independently configured channels joined at
//!   junctions
//! - Adaptive substep scheduling and a multi-network simulation runner
//! - Water balance diagnostics
//!
//! Units: segment lengths in km, volumes in 1000 m³, discharges in m³/s,
//! levels and depths in m, times in s.

pub mod analysis;
pub mod cross_section;
pub mod error;
pub mod network;
pub mod routing;
pub mod simulation;
pub mod storage;
pub mod types;

// Re-export main types for convenience
pub use analysis::{BalanceWarning, WaterBalance, check_waterbalance};
pub use cross_section::{CrossSection, CrossSectionModel, Geometry, Shape, Trapeze};
pub use error::{ConfigError, CrossSectionError, EdgeSide};
pub use network::{ChannelAssembly, ChannelConfig, Junction, Network, NetworkBuilder};
pub use routing::{
    BoundaryConfig, CentralConfig, EdgeConfig, GateConfig, GateControl, GateControlContext,
    PumpConfig, RoutingEdge, RoutingKind, RoutingModel, WeirConfig,
};
pub use simulation::{
    ForcingProvider, RoutingConfig, SchedulerState, Simulation, SimulationContext,
    SimulationResult, StepReport, SubstepScheduler, TabulatedForcing,
};
pub use storage::{InitialState, Segment, SegmentConfig, StorageModel};
pub use types::{ChannelIndex, EdgeIndex, GRAVITY, SegmentIndex};
