//! Routing edges: discharge between segments and across network boundaries.
//!
//! Every edge sits on the interface between two segments or between one
//! segment and the outside world. Its [`RoutingKind`] selects the stability
//! estimate and the discharge formula.
//!
//! # Available Routing Kinds
//!
//! | Kind | Storages | Discharge | Stability bound |
//! |------|----------|-----------|-----------------|
//! | `Central` | up + down | local inertial | gravity wave `f 1000 L / sqrt(g h)` |
//! | `Inflow` | down | prescribed | kinematic `f 1000 L / (5/3 |Q| / A)` |
//! | `Outflow` | up | prescribed | kinematic |
//! | `Weir` | up | Poleni free flow | `f 1000 L / (c sqrt(2 g h))` |
//! | `Gate` | up (+ down) | damped orifice | `f 1000 L / (c sqrt(2 g |ΔL|))` |
//! | `Pump` | up (+ down) | triggered capacity curve | kinematic |
//!
//! Gates and pumps without a downstream segment discharge against an
//! external water level taken from the forcing or their configuration.
//!
//! All formulas are total: dry interfaces, zero flow, balanced heads and
//! closed gates resolve to zero discharge or an infinite stability bound.

mod apportion;
mod boundary;
mod central;
mod gate;
mod pump;
mod weir;

pub use apportion::{limit_to_available, partial_discharge};
pub use boundary::{BoundaryConfig, kinematic_max_substep};
pub use central::{
    CentralConfig, LocalInertialInput, local_inertial_discharge, local_inertial_max_substep,
};
pub use gate::{GateConfig, GateControl, GateControlContext};
pub use pump::PumpConfig;
pub use weir::WeirConfig;

use crate::cross_section::Geometry;
use crate::storage::{Segment, StorageModel};
use crate::types::{EdgeIndex, SegmentIndex};

/// Variant tag of a routing edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoutingKind {
    Central,
    Inflow,
    Outflow,
    Weir,
    Gate,
    Pump,
}

impl RoutingKind {
    /// Short name for messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Central => "central",
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
            Self::Weir => "weir",
            Self::Gate => "gate",
            Self::Pump => "pump",
        }
    }

    /// Whether a segment may be attached upstream of this edge.
    pub fn accepts_upstream_storage(self) -> bool {
        !matches!(self, Self::Inflow)
    }

    /// Whether a segment may be attached downstream of this edge.
    pub fn accepts_downstream_storage(self) -> bool {
        matches!(self, Self::Central | Self::Inflow | Self::Gate | Self::Pump)
    }

    /// Whether an upstream segment must be attached.
    pub fn requires_upstream_storage(self) -> bool {
        self.accepts_upstream_storage()
    }

    /// Whether a downstream segment must be attached.
    pub fn requires_downstream_storage(self) -> bool {
        matches!(self, Self::Central | Self::Inflow)
    }
}

impl std::fmt::Display for RoutingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration of one routing edge.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum EdgeConfig {
    Central(CentralConfig),
    Inflow(BoundaryConfig),
    Outflow(BoundaryConfig),
    Weir(WeirConfig),
    Gate(GateConfig),
    Pump(PumpConfig),
}

impl EdgeConfig {
    /// Variant tag.
    pub fn kind(&self) -> RoutingKind {
        match self {
            Self::Central(_) => RoutingKind::Central,
            Self::Inflow(_) => RoutingKind::Inflow,
            Self::Outflow(_) => RoutingKind::Outflow,
            Self::Weir(_) => RoutingKind::Weir,
            Self::Gate(_) => RoutingKind::Gate,
            Self::Pump(_) => RoutingKind::Pump,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            Self::Central(c) => c.validate(),
            Self::Inflow(c) | Self::Outflow(c) => c.validate(),
            Self::Weir(c) => c.validate(),
            Self::Gate(c) => c.validate(),
            Self::Pump(c) => c.validate(),
        }
    }
}

/// Read-only view of everything an edge needs for one substep.
#[derive(Clone, Copy, Debug)]
pub struct EdgeContext<'a> {
    /// Segment feeding the edge
    pub upstream: Option<&'a Segment>,
    /// Segment receiving from the edge
    pub downstream: Option<&'a Segment>,
    /// Sum of partial discharges of the upstream neighbours (m³/s)
    pub discharge_upstream: f64,
    /// Sum of partial discharges of the downstream neighbours (m³/s)
    pub discharge_downstream: f64,
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
    /// Safety factor applied to all stability bounds
    pub timestep_factor: f64,
    /// Simulation time at the start of the substep (s)
    pub time: f64,
}

/// Capability interface of a routing submodel.
pub trait RoutingModel {
    /// Variant tag.
    fn kind(&self) -> RoutingKind;

    /// Estimate and remember the largest stable substep (s), possibly infinite.
    fn estimate_max_substep(&mut self, ctx: &EdgeContext<'_>) -> f64;

    /// Set the substep (s) used by the next discharge solution.
    fn set_substep(&mut self, substep: f64);

    /// Compute the new discharge (m³/s) without storing it.
    ///
    /// The result is already limited to the water available upstream.
    fn solve_discharge(&self, ctx: &EdgeContext<'_>) -> f64;

    /// Store a discharge and add its volume to the external-step total.
    fn commit_discharge(&mut self, discharge: f64);

    /// Discharge of the last substep (m³/s); positive downstream.
    fn discharge(&self) -> f64;

    /// Discharge volume accumulated over the current external step (m³).
    fn discharge_volume(&self) -> f64;
}

/// One routing edge of a network.
///
/// Segment and neighbour links are indices maintained by the network
/// builder; the edge owns none of them.
#[derive(Clone, Debug)]
pub struct RoutingEdge {
    config: EdgeConfig,
    discharge: f64,
    discharge_volume: f64,
    max_substep: f64,
    substep: f64,
    boundary_discharge: f64,
    external_level: Option<f64>,
    gate_height: f64,
    control: Option<GateControl>,
    pub(crate) upstream_segment: Option<SegmentIndex>,
    pub(crate) downstream_segment: Option<SegmentIndex>,
    pub(crate) upstream_neighbors: Vec<EdgeIndex>,
    pub(crate) downstream_neighbors: Vec<EdgeIndex>,
}

impl RoutingEdge {
    /// Create an unlinked edge.
    pub fn new(config: EdgeConfig) -> Self {
        let (boundary_discharge, gate_height, external_level) = match &config {
            EdgeConfig::Inflow(c) | EdgeConfig::Outflow(c) => (c.discharge, 0.0, None),
            EdgeConfig::Gate(c) => (0.0, c.gate_height, c.downstream_level),
            EdgeConfig::Pump(c) => (0.0, 0.0, c.downstream_level),
            _ => (0.0, 0.0, None),
        };
        Self {
            config,
            discharge: 0.0,
            discharge_volume: 0.0,
            max_substep: f64::INFINITY,
            substep: 0.0,
            boundary_discharge,
            external_level,
            gate_height,
            control: None,
            upstream_segment: None,
            downstream_segment: None,
            upstream_neighbors: Vec::new(),
            downstream_neighbors: Vec::new(),
        }
    }

    /// Edge configuration.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Segment feeding this edge.
    pub fn upstream_segment(&self) -> Option<SegmentIndex> {
        self.upstream_segment
    }

    /// Segment receiving from this edge.
    pub fn downstream_segment(&self) -> Option<SegmentIndex> {
        self.downstream_segment
    }

    /// Edges draining into this edge's upstream segment.
    pub fn upstream_neighbors(&self) -> &[EdgeIndex] {
        &self.upstream_neighbors
    }

    /// Edges draining this edge's downstream segment.
    pub fn downstream_neighbors(&self) -> &[EdgeIndex] {
        &self.downstream_neighbors
    }

    /// Last stability estimate (s).
    pub fn max_substep(&self) -> f64 {
        self.max_substep
    }

    /// Gate height currently in effect (m); zero for non-gates.
    pub fn gate_height(&self) -> f64 {
        self.gate_height
    }

    /// Prescribed discharge of inflow and outflow edges (m³/s).
    pub fn boundary_discharge(&self) -> f64 {
        self.boundary_discharge
    }

    /// Set the prescribed discharge for the current external step.
    pub fn set_boundary_discharge(&mut self, discharge: f64) {
        self.boundary_discharge = discharge;
    }

    /// External water level behind a gate or pump, if any.
    pub fn external_level(&self) -> Option<f64> {
        self.external_level
    }

    /// Set the external water level for the current external step.
    pub fn set_external_level(&mut self, level: f64) {
        self.external_level = Some(level);
    }

    /// Attach a gate control rule. Ignored for other kinds.
    pub fn set_control(&mut self, control: GateControl) {
        if matches!(self.config, EdgeConfig::Gate(_)) {
            self.control = Some(control);
        }
    }

    /// Overwrite the current discharge, e.g. for warm starts.
    pub fn set_discharge(&mut self, discharge: f64) {
        self.discharge = discharge;
    }

    /// Discharge averaged over an external step of `seconds`.
    pub fn averaged_discharge(&self, seconds: f64) -> f64 {
        if seconds > 0.0 {
            self.discharge_volume / seconds
        } else {
            self.discharge
        }
    }

    pub(crate) fn reset_discharge_volume(&mut self) {
        self.discharge_volume = 0.0;
    }

    pub(crate) fn clear_links(&mut self) {
        self.upstream_segment = None;
        self.downstream_segment = None;
        self.upstream_neighbors.clear();
        self.downstream_neighbors.clear();
    }

    /// Let the control rule of a gate pick the gate height for the next substep.
    pub(crate) fn apply_control(&mut self, ctx: &EdgeContext<'_>) {
        let Some(control) = &self.control else {
            return;
        };
        let (Some(up), Some(down)) = (self.level_upstream(ctx), self.level_downstream(ctx)) else {
            return;
        };
        self.gate_height = control.gate_height(&GateControlContext {
            time: ctx.time,
            upstream_level: up,
            downstream_level: down,
            gate_height: self.gate_height,
        });
    }

    fn level_upstream(&self, ctx: &EdgeContext<'_>) -> Option<f64> {
        ctx.upstream.map(|s| s.water_level())
    }

    /// Downstream level from the segment, the external level or the kind's fallback.
    fn level_downstream(&self, ctx: &EdgeContext<'_>) -> Option<f64> {
        if let Some(s) = ctx.downstream {
            return Some(s.water_level());
        }
        if let Some(level) = self.external_level {
            return Some(level);
        }
        match &self.config {
            // Free outfall below the sill
            EdgeConfig::Gate(c) => Some(c.bottom_level),
            // No lift
            EdgeConfig::Pump(_) => self.level_upstream(ctx),
            _ => None,
        }
    }

    /// Shortest half-length among the attached segments (km).
    fn attached_half_length(ctx: &EdgeContext<'_>) -> f64 {
        let up = ctx.upstream.map_or(f64::INFINITY, Segment::half_length);
        let down = ctx.downstream.map_or(f64::INFINITY, Segment::half_length);
        up.min(down)
    }

    fn raw_discharge(&self, ctx: &EdgeContext<'_>) -> f64 {
        let g = ctx.gravity;
        match &self.config {
            EdgeConfig::Central(c) => {
                let (Some(up), Some(down)) = (ctx.upstream, ctx.downstream) else {
                    return 0.0;
                };
                let geometry = interface_geometry(up, down);
                local_inertial_discharge(
                    c,
                    &LocalInertialInput {
                        discharge_old: self.discharge,
                        discharge_upstream: ctx.discharge_upstream,
                        discharge_downstream: ctx.discharge_downstream,
                        level_upstream: up.water_level(),
                        level_downstream: down.water_level(),
                        area: geometry.area,
                        perimeter: geometry.perimeter,
                        length: up.half_length() + down.half_length(),
                        substep: self.substep,
                        gravity: g,
                    },
                )
            }
            EdgeConfig::Inflow(_) | EdgeConfig::Outflow(_) => self.boundary_discharge,
            EdgeConfig::Weir(c) => self
                .level_upstream(ctx)
                .map_or(0.0, |level| c.discharge(level, g)),
            EdgeConfig::Gate(c) => match (self.level_upstream(ctx), self.level_downstream(ctx)) {
                (Some(up), Some(down)) => c.discharge(self.gate_height, up, down, g),
                _ => 0.0,
            },
            EdgeConfig::Pump(c) => match (self.level_upstream(ctx), self.level_downstream(ctx)) {
                (Some(up), Some(down)) => c.discharge(up, down),
                _ => 0.0,
            },
        }
    }
}

/// Interface geometry between two segments.
///
/// Both profiles are evaluated at the mean of the two water levels and
/// their depth, area and perimeter are averaged.
pub fn interface_geometry(upstream: &Segment, downstream: &Segment) -> Geometry {
    let level = 0.5 * (upstream.water_level() + downstream.water_level());
    let gu = upstream.cross_section().level_to_geometry(level);
    let gd = downstream.cross_section().level_to_geometry(level);
    Geometry {
        depth: 0.5 * (gu.depth + gd.depth),
        level,
        area: 0.5 * (gu.area + gd.area),
        perimeter: 0.5 * (gu.perimeter + gd.perimeter),
        top_width: 0.5 * (gu.top_width + gd.top_width),
    }
}

impl RoutingModel for RoutingEdge {
    fn kind(&self) -> RoutingKind {
        self.config.kind()
    }

    fn estimate_max_substep(&mut self, ctx: &EdgeContext<'_>) -> f64 {
        let f = ctx.timestep_factor;
        let g = ctx.gravity;
        let length = Self::attached_half_length(ctx);

        self.max_substep = match &self.config {
            EdgeConfig::Central(_) => match (ctx.upstream, ctx.downstream) {
                (Some(up), Some(down)) => {
                    let geometry = interface_geometry(up, down);
                    local_inertial_max_substep(f, length, geometry.depth, g)
                }
                _ => f64::INFINITY,
            },
            EdgeConfig::Inflow(_) => ctx.downstream.map_or(f64::INFINITY, |s| {
                kinematic_max_substep(f, length, self.boundary_discharge, s.wetted_area())
            }),
            EdgeConfig::Outflow(_) => ctx.upstream.map_or(f64::INFINITY, |s| {
                kinematic_max_substep(f, length, self.boundary_discharge, s.wetted_area())
            }),
            EdgeConfig::Weir(c) => self
                .level_upstream(ctx)
                .map_or(f64::INFINITY, |level| c.max_substep(f, length, level, g)),
            EdgeConfig::Gate(c) => match (self.level_upstream(ctx), self.level_downstream(ctx)) {
                (Some(up), Some(down)) => c.max_substep(f, length, self.gate_height, up, down, g),
                _ => f64::INFINITY,
            },
            EdgeConfig::Pump(c) => match (ctx.upstream, self.level_downstream(ctx)) {
                (Some(up), Some(down)) => {
                    let q = c.discharge(up.water_level(), down);
                    kinematic_max_substep(f, length, q, up.wetted_area())
                }
                _ => f64::INFINITY,
            },
        };
        self.max_substep
    }

    fn set_substep(&mut self, substep: f64) {
        self.substep = substep;
    }

    fn solve_discharge(&self, ctx: &EdgeContext<'_>) -> f64 {
        let raw = self.raw_discharge(ctx);
        limit_to_available(
            raw,
            ctx.upstream.map(StorageModel::water_volume),
            ctx.downstream.map(StorageModel::water_volume),
            self.substep,
        )
    }

    fn commit_discharge(&mut self, discharge: f64) {
        self.discharge = discharge;
        self.discharge_volume += self.substep * discharge;
    }

    fn discharge(&self) -> f64 {
        self.discharge
    }

    fn discharge_volume(&self) -> f64 {
        self.discharge_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross_section::CrossSection;
    use crate::storage::SegmentConfig;
    use approx::assert_relative_eq;

    const G: f64 = 9.81;

    fn segment(length: f64, bottom: f64, level: f64) -> Segment {
        let xs = CrossSection::rectangle(bottom, 2.0).unwrap();
        Segment::new(SegmentConfig::new(length, xs).with_water_level(level))
    }

    fn ctx<'a>(up: Option<&'a Segment>, down: Option<&'a Segment>) -> EdgeContext<'a> {
        EdgeContext {
            upstream: up,
            downstream: down,
            discharge_upstream: 0.0,
            discharge_downstream: 0.0,
            gravity: G,
            timestep_factor: 0.5,
            time: 0.0,
        }
    }

    #[test]
    fn test_kind_roles() {
        assert!(RoutingKind::Central.accepts_upstream_storage());
        assert!(RoutingKind::Central.accepts_downstream_storage());
        assert!(!RoutingKind::Inflow.accepts_upstream_storage());
        assert!(!RoutingKind::Outflow.accepts_downstream_storage());
        assert!(!RoutingKind::Weir.accepts_downstream_storage());
        assert!(RoutingKind::Gate.accepts_downstream_storage());
        assert!(!RoutingKind::Gate.requires_downstream_storage());
    }

    #[test]
    fn test_interface_geometry_averages_profiles() {
        let up = segment(2.0, 1.0, 5.0);
        let down = segment(2.0, -1.0, 3.0);
        // Interface level 4: depths 3 and 5, mean area 8 / perimeter 10
        let g = interface_geometry(&up, &down);
        assert_relative_eq!(g.level, 4.0);
        assert_relative_eq!(g.area, 8.0);
        assert_relative_eq!(g.perimeter, 10.0);
    }

    #[test]
    fn test_central_max_substep_uses_half_length() {
        let up = segment(2.0, 0.0, 4.0);
        let down = segment(1.0, 0.0, 4.0);
        let mut edge = RoutingEdge::new(EdgeConfig::Central(CentralConfig::default()));
        let dt = edge.estimate_max_substep(&ctx(Some(&up), Some(&down)));
        assert_relative_eq!(dt, 0.5 * 1000.0 * 0.5 / (G * 4.0_f64).sqrt(), max_relative = 1e-12);
        assert_eq!(edge.max_substep(), dt);
    }

    #[test]
    fn test_inflow_discharge_and_bound() {
        let down = segment(2.0, 0.0, 5.0);
        let mut edge = RoutingEdge::new(EdgeConfig::Inflow(BoundaryConfig::new(0.0)));
        assert_eq!(edge.estimate_max_substep(&ctx(None, Some(&down))), f64::INFINITY);

        edge.set_boundary_discharge(10.0);
        edge.set_substep(60.0);
        let c = ctx(None, Some(&down));
        assert_eq!(edge.solve_discharge(&c), 10.0);
        let dt = edge.estimate_max_substep(&c);
        assert_relative_eq!(
            dt,
            0.5 * 1000.0 * 1.0 / (5.0 / 3.0 * 10.0 / 10.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_outflow_clamped_by_volume() {
        let up = segment(1.0, 0.0, 0.5); // A = 1 m², V = 1 (1000 m³)
        let mut edge = RoutingEdge::new(EdgeConfig::Outflow(BoundaryConfig::new(100.0)));
        edge.set_substep(100.0);
        let q = edge.solve_discharge(&ctx(Some(&up), None));
        assert_relative_eq!(q, 10.0, max_relative = 1e-12);
    }

    #[test]
    fn test_weir_edge() {
        let up = segment(1.0, 0.0, 7.0);
        let mut edge = RoutingEdge::new(EdgeConfig::Weir(WeirConfig::new(5.0, 10.0, 0.6)));
        edge.set_substep(1.0);
        assert_relative_eq!(edge.solve_discharge(&ctx(Some(&up), None)), 50.11, epsilon = 0.01);
    }

    #[test]
    fn test_gate_edge_between_segments() {
        let up = segment(5.0, 0.0, 9.0);
        let down = segment(5.0, 0.0, 7.0);
        let mut edge = RoutingEdge::new(EdgeConfig::Gate(GateConfig::new(4.0, 6.0, 3.0, 0.6)));
        edge.set_substep(1.0);
        let forward = edge.solve_discharge(&ctx(Some(&up), Some(&down)));
        assert_relative_eq!(forward, 22.55, epsilon = 0.01);
        let backward = edge.solve_discharge(&ctx(Some(&down), Some(&up)));
        assert_eq!(forward, -backward);
    }

    #[test]
    fn test_gate_external_level_and_control() {
        let up = segment(5.0, 0.0, 9.0);
        let mut edge = RoutingEdge::new(EdgeConfig::Gate(
            GateConfig::new(4.0, 6.0, 3.0, 0.6).with_downstream_level(7.0),
        ));
        edge.set_control(GateControl::new(|c| c.gate_height - 1.0));
        let c = ctx(Some(&up), None);
        edge.apply_control(&c);
        assert_eq!(edge.gate_height(), 5.0);
        edge.set_substep(1.0);
        // Opening halved
        assert_relative_eq!(edge.solve_discharge(&c), 22.55 / 2.0, epsilon = 0.01);
    }

    #[test]
    fn test_control_ignored_for_weir() {
        let mut edge = RoutingEdge::new(EdgeConfig::Weir(WeirConfig::new(5.0, 10.0, 0.6)));
        edge.set_control(GateControl::new(|_| 0.0));
        assert!(edge.control.is_none());
    }

    #[test]
    fn test_commit_accumulates_volume() {
        let mut edge = RoutingEdge::new(EdgeConfig::Inflow(BoundaryConfig::new(2.0)));
        edge.set_substep(30.0);
        edge.commit_discharge(2.0);
        edge.set_substep(10.0);
        edge.commit_discharge(5.0);
        assert_eq!(edge.discharge(), 5.0);
        assert_eq!(edge.discharge_volume(), 110.0);
        assert_relative_eq!(edge.averaged_discharge(40.0), 2.75);
        edge.reset_discharge_volume();
        assert_eq!(edge.discharge_volume(), 0.0);
    }

    #[test]
    fn test_pump_edge() {
        let up = segment(1.0, 0.0, 2.5);
        let mut edge = RoutingEdge::new(EdgeConfig::Pump(
            PumpConfig::constant(2.0, 3.0, 4.0).with_downstream_level(6.0),
        ));
        edge.set_substep(1.0);
        let c = ctx(Some(&up), None);
        assert_relative_eq!(edge.solve_discharge(&c), 2.0);
        assert!(edge.estimate_max_substep(&c).is_finite());
    }
}
