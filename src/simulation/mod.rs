//! Time stepping of channel networks.
//!
//! This module ties together:
//! - [`RoutingConfig`] and the explicit [`SimulationContext`]
//! - external forcing through [`ForcingProvider`]
//! - the [`SubstepScheduler`] state machine for one external step
//! - the [`Simulation`] runner over all disconnected networks
//!
//! # Example
//! ```ignore
//! use sw1d::simulation::{RoutingConfig, Simulation, TabulatedForcing};
//!
//! let forcing = TabulatedForcing::new().with_boundary_discharge("upper", 0, inflows);
//! let mut sim = Simulation::from_builder(&builder, RoutingConfig::default(), 3600.0)?;
//! let result = sim.run(24, Some(&forcing));
//! println!("{} substeps", result.substeps);
//! ```

mod context;
mod forcing;
mod runner;
mod scheduler;

pub use context::{RoutingConfig, SimulationContext};
pub use forcing::{ForcingProvider, TabulatedForcing};
pub use runner::{Simulation, SimulationResult};
pub use scheduler::{SchedulerState, StepReport, SubstepScheduler, TimeStepState};
