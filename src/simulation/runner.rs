//! Simulation runner implementation.
//!
//! Steps every independent network through the same external steps.

use std::ops::ControlFlow;

use crate::analysis::{BalanceWarning, WaterBalance};
use crate::error::Result;
use crate::network::{Network, NetworkBuilder};

use super::{ForcingProvider, RoutingConfig, SimulationContext, StepReport, SubstepScheduler};

// =============================================================================
// Simulation Result
// =============================================================================

/// Result of a simulation run.
#[derive(Clone, Debug)]
pub struct SimulationResult {
    /// Simulation time reached (s).
    pub final_time: f64,
    /// Number of external steps taken.
    pub n_steps: usize,
    /// Total number of substeps over all networks.
    pub substeps: usize,
    /// Smallest substep used (s).
    pub min_substep: f64,
    /// Largest substep used (s).
    pub max_substep: f64,
    /// Water balance of every network over the run.
    pub balances: Vec<WaterBalance>,
    /// Every conservation warning raised.
    pub warnings: Vec<BalanceWarning>,
    /// Total wall-clock time in seconds.
    pub wall_time: f64,
    /// Whether the run stopped before the requested number of steps.
    pub stopped_early: bool,
}

// =============================================================================
// Simulation Runner
// =============================================================================

/// Runs a set of disconnected networks.
///
/// The networks share no data, so with the `parallel` feature
/// [`Simulation::step_parallel`] advances them on the rayon pool.
///
/// # Example
///
/// ```
/// use sw1d::cross_section::CrossSection;
/// use sw1d::network::{ChannelConfig, NetworkBuilder};
/// use sw1d::routing::{BoundaryConfig, CentralConfig, EdgeConfig, WeirConfig};
/// use sw1d::simulation::{RoutingConfig, Simulation};
/// use sw1d::storage::SegmentConfig;
///
/// let xs = CrossSection::rectangle(0.0, 10.0).unwrap();
/// let segment = SegmentConfig::new(2.0, xs).with_water_level(1.0);
/// let mut channel = ChannelConfig::uniform("river", 4, segment, CentralConfig::default());
/// channel.edges[0] = Some(EdgeConfig::Inflow(BoundaryConfig::new(5.0)));
/// channel.edges[4] = Some(EdgeConfig::Weir(WeirConfig::new(0.5, 10.0, 0.6)));
///
/// let builder = NetworkBuilder::new().channel(channel);
/// let mut sim = Simulation::from_builder(&builder, RoutingConfig::default(), 3600.0).unwrap();
/// let result = sim.run(3, None);
///
/// assert_eq!(result.n_steps, 3);
/// assert!(result.balances[0].is_closed(1e-9));
/// ```
pub struct Simulation {
    networks: Vec<Network>,
    schedulers: Vec<SubstepScheduler>,
    context: SimulationContext,
    balances: Vec<WaterBalance>,
}

impl Simulation {
    /// Create a simulation over already assembled networks.
    pub fn new(networks: Vec<Network>, config: RoutingConfig, external_step: f64) -> Result<Self> {
        let context = SimulationContext::new(config, external_step)?;
        let schedulers = vec![SubstepScheduler::new(); networks.len()];
        let balances = networks.iter().map(|n| WaterBalance::new(n.total_volume())).collect();
        Ok(Self {
            networks,
            schedulers,
            context,
            balances,
        })
    }

    /// Assemble every connected component of `builder` and simulate them together.
    pub fn from_builder(
        builder: &NetworkBuilder,
        config: RoutingConfig,
        external_step: f64,
    ) -> Result<Self> {
        Self::new(builder.build_components()?, config, external_step)
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    pub fn network_mut(&mut self, index: usize) -> &mut Network {
        &mut self.networks[index]
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    /// Water balance of every network since construction.
    pub fn balances(&self) -> &[WaterBalance] {
        &self.balances
    }

    /// Advance all networks by one external step, one after another.
    pub fn step(&mut self, forcing: Option<&dyn ForcingProvider>) -> Vec<StepReport> {
        let ctx = self.context;
        let reports = self
            .networks
            .iter_mut()
            .zip(self.schedulers.iter_mut())
            .map(|(network, scheduler)| {
                if let Some(forcing) = forcing {
                    network.apply_forcing(forcing, ctx.step);
                }
                scheduler.run_step(network, &ctx)
            })
            .collect();
        self.close_step(reports)
    }

    /// Advance all networks by one external step in parallel using rayon.
    ///
    /// Enable with the `parallel` feature.
    #[cfg(feature = "parallel")]
    pub fn step_parallel(&mut self, forcing: Option<&dyn ForcingProvider>) -> Vec<StepReport> {
        use rayon::prelude::*;

        let ctx = self.context;
        let reports = self
            .networks
            .par_iter_mut()
            .zip(self.schedulers.par_iter_mut())
            .map(|(network, scheduler)| {
                if let Some(forcing) = forcing {
                    network.apply_forcing(forcing, ctx.step);
                }
                scheduler.run_step(network, &ctx)
            })
            .collect();
        self.close_step(reports)
    }

    fn close_step(&mut self, reports: Vec<StepReport>) -> Vec<StepReport> {
        for (balance, report) in self.balances.iter_mut().zip(&reports) {
            balance.merge(&report.balance);
        }
        self.context.advance();
        reports
    }

    /// Run `n_steps` external steps.
    pub fn run(
        &mut self,
        n_steps: usize,
        forcing: Option<&dyn ForcingProvider>,
    ) -> SimulationResult {
        self.run_with_callback(n_steps, forcing, |_, _| ControlFlow::Continue(()))
    }

    /// Run `n_steps` external steps, consulting `callback` after each one.
    ///
    /// The callback receives the step index and the reports of all networks.
    /// Returning `ControlFlow::Break` stops the run between external steps.
    pub fn run_with_callback<F>(
        &mut self,
        n_steps: usize,
        forcing: Option<&dyn ForcingProvider>,
        mut callback: F,
    ) -> SimulationResult
    where
        F: FnMut(usize, &[StepReport]) -> ControlFlow<()>,
    {
        let start_wall = std::time::Instant::now();
        let mut balances: Vec<WaterBalance> = self
            .networks
            .iter()
            .map(|n| WaterBalance::new(n.total_volume()))
            .collect();
        let mut warnings = Vec::new();
        let mut substeps = 0;
        let mut min_substep = f64::INFINITY;
        let mut max_substep: f64 = 0.0;
        let mut taken = 0;
        let mut stopped_early = false;

        log::info!(
            "Starting simulation: {} networks, {} steps of {} s",
            self.networks.len(),
            n_steps,
            self.context.external_step
        );

        for _ in 0..n_steps {
            let step = self.context.step;

            #[cfg(feature = "parallel")]
            let reports = self.step_parallel(forcing);
            #[cfg(not(feature = "parallel"))]
            let reports = self.step(forcing);

            for (balance, report) in balances.iter_mut().zip(&reports) {
                balance.merge(&report.balance);
                substeps += report.substeps;
                min_substep = min_substep.min(report.min_substep);
                max_substep = max_substep.max(report.max_substep);
                warnings.extend(report.warnings.iter().cloned());
            }
            taken += 1;

            if callback(step, &reports).is_break() {
                stopped_early = taken < n_steps;
                break;
            }
        }

        let wall_time = start_wall.elapsed().as_secs_f64();
        log::info!(
            "Simulation complete: {} steps, {} substeps, substep range [{:.3}, {:.3}] s, \
             {:.2} s wall time",
            taken,
            substeps,
            min_substep,
            max_substep,
            wall_time
        );

        SimulationResult {
            final_time: self.context.time,
            n_steps: taken,
            substeps,
            min_substep,
            max_substep,
            balances,
            warnings,
            wall_time,
            stopped_early,
        }
    }
}
