//! Substep scheduling within one external step.
//!
//! ```text
//!  Idle ──begin──▶ EstimatingSubstep ──choose──▶ Computing ──▶ Updating
//!                        ▲                                        │
//!                        └────────────── more time left ──────────┤
//!                                                                 ▼
//!  Idle ◀──finish── Done ◀──────────────── final substep ─────────┘
//! ```
//!
//! Each substep is the smallest stability bound over all edges, clamped to
//! the time left in the external step. The substep that reaches the end of
//! the step is set to exactly the remaining time, so the substeps always add
//! up to the external step length.

use crate::analysis::{BalanceWarning, WaterBalance, check_waterbalance, negative_volumes};
use crate::network::Network;

use super::SimulationContext;

/// Scheduler states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulerState {
    /// Between external steps.
    #[default]
    Idle,
    /// Polling edges for stability bounds.
    EstimatingSubstep,
    /// Solving discharges with the chosen substep.
    Computing,
    /// Applying discharges to storages.
    Updating,
    /// External step exhausted.
    Done,
}

/// Time bookkeeping of the current external step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeStepState {
    /// Length of the external step (s)
    pub external_step: f64,
    /// Substep currently in use (s)
    pub substep: f64,
    /// Time already integrated (s)
    pub elapsed: f64,
    /// Time left (s)
    pub remaining: f64,
    /// Whether the current substep closes the external step
    pub final_substep: bool,
    /// Substeps taken so far
    pub substeps: usize,
    /// Smallest substep taken (s)
    pub min_substep: f64,
    /// Largest substep taken (s)
    pub max_substep: f64,
}

/// Outcome of one external step of one network.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// Index of the external step
    pub step: usize,
    /// Number of substeps
    pub substeps: usize,
    /// Smallest substep (s)
    pub min_substep: f64,
    /// Largest substep (s)
    pub max_substep: f64,
    /// Discharge of every edge averaged over the step (m³/s), by edge index
    pub discharges: Vec<f64>,
    /// Water balance of the step
    pub balance: WaterBalance,
    /// Conservation findings
    pub warnings: Vec<BalanceWarning>,
}

/// Drives the substep loop of one network.
#[derive(Clone, Debug, Default)]
pub struct SubstepScheduler {
    state: SchedulerState,
    time_step: TimeStepState,
}

impl SubstepScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn time_step(&self) -> &TimeStepState {
        &self.time_step
    }

    /// Open an external step of `external_step` seconds.
    pub fn begin(&mut self, external_step: f64) {
        debug_assert!(matches!(self.state, SchedulerState::Idle | SchedulerState::Done));
        self.time_step = TimeStepState {
            external_step,
            remaining: external_step,
            min_substep: f64::INFINITY,
            ..TimeStepState::default()
        };
        self.state = SchedulerState::EstimatingSubstep;
    }

    /// Turn the network-wide stability estimate into the next substep.
    pub fn choose_substep(&mut self, estimate: f64, min_substep: Option<f64>) -> f64 {
        debug_assert_eq!(self.state, SchedulerState::EstimatingSubstep);
        let remaining = self.time_step.remaining;

        let mut substep = estimate;
        if let Some(floor) = min_substep {
            if substep < floor {
                log::warn!(
                    "Substep estimate {:.3e} s below the floor of {:.3e} s, using the floor",
                    substep,
                    floor
                );
                substep = floor;
            }
        }
        if !(substep > 0.0) {
            log::warn!("Invalid substep estimate {}, using the remaining time", substep);
            substep = remaining;
        }

        let final_substep = substep >= remaining;
        if final_substep {
            substep = remaining;
        }

        let ts = &mut self.time_step;
        ts.substep = substep;
        ts.final_substep = final_substep;
        self.state = SchedulerState::Computing;
        substep
    }

    /// Discharges are solved.
    pub fn computed(&mut self) {
        debug_assert_eq!(self.state, SchedulerState::Computing);
        self.state = SchedulerState::Updating;
    }

    /// Storages are updated; returns the next state.
    pub fn updated(&mut self) -> SchedulerState {
        debug_assert_eq!(self.state, SchedulerState::Updating);
        let ts = &mut self.time_step;
        ts.substeps += 1;
        ts.min_substep = ts.min_substep.min(ts.substep);
        ts.max_substep = ts.max_substep.max(ts.substep);
        ts.elapsed += ts.substep;
        if ts.final_substep {
            ts.remaining = 0.0;
            self.state = SchedulerState::Done;
        } else {
            ts.remaining = ts.external_step - ts.elapsed;
            self.state = SchedulerState::EstimatingSubstep;
        }
        self.state
    }

    /// Close the external step.
    pub fn finish(&mut self) -> TimeStepState {
        debug_assert_eq!(self.state, SchedulerState::Done);
        self.state = SchedulerState::Idle;
        self.time_step
    }

    /// Integrate `network` over one external step.
    ///
    /// Forcing for the step must already be applied.
    pub fn run_step(&mut self, network: &mut Network, ctx: &SimulationContext) -> StepReport {
        let volume_start = network.total_volume();
        network.begin_external_step();
        self.begin(ctx.external_step);

        loop {
            let substep_ctx = ctx.at_offset(self.time_step.elapsed);
            network.apply_gate_controls(&substep_ctx);
            let (estimate, limiting) = network.estimate_max_substep(&substep_ctx);
            let substep = self.choose_substep(estimate, ctx.config.min_substep);

            if log::log_enabled!(log::Level::Trace) {
                let limit = limiting.map_or_else(
                    || "nothing".to_string(),
                    |e| {
                        let (channel, position) = network.edge_location(e);
                        format!("edge {} of `{}`", position, channel)
                    },
                );
                log::trace!(
                    "t = {:.3} s: substep {:.4} s, limited by {}",
                    substep_ctx.time,
                    substep,
                    limit
                );
            }

            network.broadcast_substep(substep);
            network.solve_discharges(&substep_ctx);
            self.computed();
            network.update_storages();
            if self.updated() == SchedulerState::Done {
                break;
            }
        }
        let time_step = self.finish();

        let (inflow, outflow) = network.boundary_volumes();
        let mut balance = WaterBalance::new(volume_start);
        balance.record(network.lateral_volume(ctx.external_step), inflow, outflow);
        balance.finish(network.total_volume());

        let mut warnings = negative_volumes(network, ctx.step);
        let tolerance = ctx.config.balance_tolerance;
        if let Some(warning) = check_waterbalance(&balance, tolerance, ctx.step) {
            warnings.push(warning);
        }
        for warning in &warnings {
            log::warn!("{}", warning);
        }

        log::debug!(
            "Step {}: {} substeps, substep range [{:.3}, {:.3}] s",
            ctx.step,
            time_step.substeps,
            time_step.min_substep,
            time_step.max_substep
        );

        StepReport {
            step: ctx.step,
            substeps: time_step.substeps,
            min_substep: time_step.min_substep,
            max_substep: time_step.max_substep,
            discharges: network
                .edges()
                .iter()
                .map(|e| e.averaged_discharge(ctx.external_step))
                .collect(),
            balance,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        let mut scheduler = SubstepScheduler::new();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        scheduler.begin(100.0);
        assert_eq!(scheduler.state(), SchedulerState::EstimatingSubstep);
        assert_eq!(scheduler.choose_substep(40.0, None), 40.0);
        assert_eq!(scheduler.state(), SchedulerState::Computing);
        scheduler.computed();
        assert_eq!(scheduler.state(), SchedulerState::Updating);
        assert_eq!(scheduler.updated(), SchedulerState::EstimatingSubstep);

        assert_eq!(scheduler.choose_substep(40.0, None), 40.0);
        scheduler.computed();
        assert_eq!(scheduler.updated(), SchedulerState::EstimatingSubstep);

        // Clamped to the remaining 20 s
        assert_eq!(scheduler.choose_substep(40.0, None), 20.0);
        assert!(scheduler.time_step().final_substep);
        scheduler.computed();
        assert_eq!(scheduler.updated(), SchedulerState::Done);

        let ts = scheduler.finish();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(ts.substeps, 3);
        assert_eq!(ts.elapsed, 100.0);
        assert_eq!(ts.min_substep, 20.0);
        assert_eq!(ts.max_substep, 40.0);
    }

    #[test]
    fn test_infinite_estimate_takes_whole_step() {
        let mut scheduler = SubstepScheduler::new();
        scheduler.begin(3600.0);
        assert_eq!(scheduler.choose_substep(f64::INFINITY, None), 3600.0);
        scheduler.computed();
        assert_eq!(scheduler.updated(), SchedulerState::Done);
    }

    #[test]
    fn test_floor() {
        let mut scheduler = SubstepScheduler::new();
        scheduler.begin(10.0);
        assert_eq!(scheduler.choose_substep(0.01, Some(1.0)), 1.0);
    }

    #[test]
    fn test_invalid_estimate() {
        let mut scheduler = SubstepScheduler::new();
        scheduler.begin(10.0);
        assert_eq!(scheduler.choose_substep(f64::NAN, None), 10.0);
    }

    #[test]
    fn test_substeps_sum_to_step() {
        let mut scheduler = SubstepScheduler::new();
        scheduler.begin(1000.0);
        let mut total = 0.0;
        loop {
            total += scheduler.choose_substep(7.3, None);
            scheduler.computed();
            if scheduler.updated() == SchedulerState::Done {
                break;
            }
        }
        assert!((total - 1000.0).abs() < 1e-9);
        assert_eq!(scheduler.finish().substeps, 137);
    }
}
