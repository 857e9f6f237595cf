//! Channel networks.
//!
//! A [`Network`] is an arena of segments and routing edges plus the channels
//! and junctions that placed them there. All cross-references are arena
//! indices, so relinking clears and rebuilds them without touching any
//! hydraulic state.
//!
//! # Linking rules
//!
//! Inside a channel, edge `j` takes segment `j - 1` upstream and segment `j`
//! downstream. At a junction, for every entering channel `U` and exiting
//! channel `D`, exactly one of `U`'s terminal edge and `D`'s initial edge must
//! supply the connection; it is bound to the segment across the junction. A
//! terminal edge supplies it only if it accepts a downstream storage, an
//! initial edge only if it accepts an upstream storage, so an outflow or weir
//! ending `U` and an inflow heading `D` stay boundaries. Each side of an edge
//! binds at most one segment.

mod builder;
mod channel;

pub use builder::{Junction, NetworkBuilder};
pub use channel::{ChannelAssembly, ChannelConfig};

use crate::error::{ConfigError, EdgeSide, Result};
use crate::routing::{
    EdgeContext, GateControl, RoutingEdge, RoutingKind, RoutingModel, partial_discharge,
};
use crate::simulation::{ForcingProvider, SimulationContext};
use crate::storage::{Segment, StorageModel};
use crate::types::{ChannelIndex, EdgeIndex, SegmentIndex};

/// A junction with resolved channel indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct JunctionLinks {
    pub(crate) name: String,
    pub(crate) entering: Vec<ChannelIndex>,
    pub(crate) exiting: Vec<ChannelIndex>,
}

/// One planned segment binding.
#[derive(Clone, Copy, Debug)]
struct Link {
    edge: EdgeIndex,
    segment: SegmentIndex,
    side: EdgeSide,
}

/// A linked set of channels, ready to be simulated.
#[derive(Clone, Debug)]
pub struct Network {
    pub(crate) segments: Vec<Segment>,
    pub(crate) edges: Vec<RoutingEdge>,
    pub(crate) channels: Vec<ChannelAssembly>,
    pub(crate) junctions: Vec<JunctionLinks>,
    pub(crate) segment_origin: Vec<(ChannelIndex, usize)>,
    pub(crate) edge_origin: Vec<(ChannelIndex, usize)>,
}

impl Network {
    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn n_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn edges(&self) -> &[RoutingEdge] {
        &self.edges
    }

    pub fn channels(&self) -> &[ChannelAssembly] {
        &self.channels
    }

    pub fn segment(&self, index: SegmentIndex) -> &Segment {
        &self.segments[index]
    }

    pub fn segment_mut(&mut self, index: SegmentIndex) -> &mut Segment {
        &mut self.segments[index]
    }

    pub fn edge(&self, index: EdgeIndex) -> &RoutingEdge {
        &self.edges[index]
    }

    pub fn edge_mut(&mut self, index: EdgeIndex) -> &mut RoutingEdge {
        &mut self.edges[index]
    }

    /// Channel by name.
    pub fn channel(&self, name: &str) -> Option<&ChannelAssembly> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Arena index of the segment at `position` of `channel`.
    pub fn segment_index(&self, channel: &str, position: usize) -> Option<SegmentIndex> {
        self.channel(channel)?.segments.get(position).copied()
    }

    /// Arena index of the edge in slot `position` of `channel`.
    pub fn edge_index(&self, channel: &str, position: usize) -> Option<EdgeIndex> {
        self.channel(channel)?.edges.get(position).copied().flatten()
    }

    /// Channel name and slot position of an edge.
    pub fn edge_location(&self, index: EdgeIndex) -> (&str, usize) {
        let (channel, position) = self.edge_origin[index];
        (self.channels[channel].name.as_str(), position)
    }

    /// Channel name and slot position of a segment.
    pub fn segment_location(&self, index: SegmentIndex) -> (&str, usize) {
        let (channel, position) = self.segment_origin[index];
        (self.channels[channel].name.as_str(), position)
    }

    /// Stored water in all segments (1000 m³).
    pub fn total_volume(&self) -> f64 {
        self.segments.iter().map(StorageModel::water_volume).sum()
    }

    /// Attach a control rule to the gate in slot `position` of `channel`.
    pub fn set_gate_control(
        &mut self,
        channel: &str,
        position: usize,
        control: GateControl,
    ) -> Result<()> {
        let index = self.edge_index(channel, position).ok_or_else(|| ConfigError::InvalidEdge {
            channel: channel.to_string(),
            position,
            message: "no routing edge in this slot".to_string(),
        })?;
        let edge = &mut self.edges[index];
        if edge.kind() != RoutingKind::Gate {
            return Err(ConfigError::InvalidEdge {
                channel: channel.to_string(),
                position,
                message: format!("a {} edge cannot be gate controlled", edge.kind()),
            });
        }
        edge.set_control(control);
        Ok(())
    }

    // =========================================================================
    // Linking
    // =========================================================================

    /// Rebuild every segment and edge cross-reference.
    ///
    /// Existing links are cleared first, so calling this repeatedly yields
    /// identical references.
    pub fn connect(&mut self) -> Result<()> {
        for segment in &mut self.segments {
            segment.clear_links();
        }
        for edge in &mut self.edges {
            edge.clear_links();
        }

        for link in self.plan_links()? {
            self.bind(link)?;
        }

        for e in 0..self.edges.len() {
            let (upstream, downstream) = {
                let edge = &self.edges[e];
                let upstream = edge
                    .upstream_segment
                    .map(|s| self.segments[s].upstream_edges.clone())
                    .unwrap_or_default();
                let downstream = edge
                    .downstream_segment
                    .map(|s| self.segments[s].downstream_edges.clone())
                    .unwrap_or_default();
                (upstream, downstream)
            };
            self.edges[e].upstream_neighbors = upstream;
            self.edges[e].downstream_neighbors = downstream;
        }

        self.check_required_sides()
    }

    /// Collect internal and junction bindings.
    fn plan_links(&self) -> Result<Vec<Link>> {
        let mut links = Vec::new();

        for channel in &self.channels {
            let n = channel.segments.len();
            for (j, slot) in channel.edges.iter().enumerate() {
                let Some(edge) = *slot else { continue };
                if j > 0 {
                    links.push(Link {
                        edge,
                        segment: channel.segments[j - 1],
                        side: EdgeSide::Upstream,
                    });
                }
                if j < n {
                    links.push(Link {
                        edge,
                        segment: channel.segments[j],
                        side: EdgeSide::Downstream,
                    });
                }
            }
        }

        for junction in &self.junctions {
            for &u in &junction.entering {
                for &d in &junction.exiting {
                    let up = &self.channels[u];
                    let down = &self.channels[d];
                    // Only an edge that can take a storage on the junction side
                    // supplies the connection
                    let terminal = up
                        .terminal_edge()
                        .filter(|&e| self.edges[e].kind().accepts_downstream_storage());
                    let initial = down
                        .initial_edge()
                        .filter(|&e| self.edges[e].kind().accepts_upstream_storage());
                    let link = match (terminal, initial) {
                        (Some(_), Some(_)) => {
                            return Err(ConfigError::AmbiguousConnection {
                                junction: junction.name.clone(),
                                upstream: up.name.clone(),
                                downstream: down.name.clone(),
                            })
                        }
                        (None, None) => {
                            return Err(ConfigError::MissingConnection {
                                junction: junction.name.clone(),
                                upstream: up.name.clone(),
                                downstream: down.name.clone(),
                            })
                        }
                        (Some(edge), None) => Link {
                            edge,
                            segment: down.first_segment(),
                            side: EdgeSide::Downstream,
                        },
                        (None, Some(edge)) => Link {
                            edge,
                            segment: up.last_segment(),
                            side: EdgeSide::Upstream,
                        },
                    };
                    links.push(link);
                }
            }
        }

        Ok(links)
    }

    /// Bind one segment to one edge side, both directions.
    fn bind(&mut self, link: Link) -> Result<()> {
        let (channel, position) = self.edge_origin[link.edge];
        let channel = &self.channels[channel].name;
        let edge = &mut self.edges[link.edge];
        let kind = edge.kind();

        let (accepts, slot) = match link.side {
            EdgeSide::Upstream => (kind.accepts_upstream_storage(), &mut edge.upstream_segment),
            EdgeSide::Downstream => {
                (kind.accepts_downstream_storage(), &mut edge.downstream_segment)
            }
        };
        if !accepts {
            return Err(ConfigError::IncompatibleEdge {
                channel: channel.clone(),
                position,
                kind: kind.name(),
                side: link.side,
            });
        }
        if slot.is_some() {
            return Err(ConfigError::DuplicateConnection {
                channel: channel.clone(),
                position,
                side: link.side,
            });
        }
        *slot = Some(link.segment);

        let segment = &mut self.segments[link.segment];
        match link.side {
            // The segment feeds the edge
            EdgeSide::Upstream => segment.downstream_edges.push(link.edge),
            EdgeSide::Downstream => segment.upstream_edges.push(link.edge),
        }
        Ok(())
    }

    fn check_required_sides(&self) -> Result<()> {
        for (e, edge) in self.edges.iter().enumerate() {
            let kind = edge.kind();
            let missing = if kind.requires_upstream_storage() && edge.upstream_segment.is_none() {
                Some(EdgeSide::Upstream)
            } else if kind.requires_downstream_storage() && edge.downstream_segment.is_none() {
                Some(EdgeSide::Downstream)
            } else {
                None
            };
            if let Some(side) = missing {
                let (channel, position) = self.edge_location(EdgeIndex::new(e));
                return Err(ConfigError::UnconnectedEdge {
                    channel: channel.to_string(),
                    position,
                    kind: kind.name(),
                    side,
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Apportionment
    // =========================================================================

    /// Share of `edge`'s discharge passed to a downstream neighbour whose own
    /// discharge is `client`.
    pub fn partial_discharge_downstream(&self, edge: EdgeIndex, client: f64) -> f64 {
        let edge = &self.edges[edge];
        let siblings: Vec<f64> = edge
            .downstream_neighbors
            .iter()
            .map(|&n| self.edges[n].discharge())
            .collect();
        partial_discharge(edge.discharge(), client, &siblings)
    }

    /// Share of `edge`'s discharge drawn from an upstream neighbour whose own
    /// discharge is `client`.
    pub fn partial_discharge_upstream(&self, edge: EdgeIndex, client: f64) -> f64 {
        let edge = &self.edges[edge];
        let siblings: Vec<f64> = edge
            .upstream_neighbors
            .iter()
            .map(|&n| self.edges[n].discharge())
            .collect();
        partial_discharge(edge.discharge(), client, &siblings)
    }

    // =========================================================================
    // Substep operations
    // =========================================================================

    /// Apply the forcing of external step `step`.
    pub fn apply_forcing(&mut self, forcing: &dyn ForcingProvider, step: usize) {
        for (s, &(channel, position)) in self.segment_origin.iter().enumerate() {
            let name = &self.channels[channel].name;
            if let Some(q) = forcing.lateral_inflow(name, position, step) {
                self.segments[s].set_lateral_flow(q);
            }
        }
        for (e, &(channel, position)) in self.edge_origin.iter().enumerate() {
            let name = &self.channels[channel].name;
            let edge = &mut self.edges[e];
            match edge.kind() {
                RoutingKind::Inflow | RoutingKind::Outflow => {
                    if let Some(q) = forcing.boundary_discharge(name, position, step) {
                        edge.set_boundary_discharge(q);
                    }
                }
                RoutingKind::Gate | RoutingKind::Pump if edge.downstream_segment.is_none() => {
                    if let Some(level) = forcing.boundary_water_level(name, position, step) {
                        edge.set_external_level(level);
                    }
                }
                _ => {}
            }
        }
    }

    /// Reset the per-step discharge volumes of all edges.
    pub fn begin_external_step(&mut self) {
        for edge in &mut self.edges {
            edge.reset_discharge_volume();
        }
    }

    /// Let every controlled gate pick its height for the coming substep.
    pub fn apply_gate_controls(&mut self, ctx: &SimulationContext) {
        for e in EdgeIndex::iter(self.edges.len()) {
            if self.edges[e].kind() != RoutingKind::Gate {
                continue;
            }
            let edge_ctx = edge_context(&self.segments, &self.edges, e, ctx);
            self.edges[e].apply_control(&edge_ctx);
        }
    }

    /// Ask every edge for its stability bound.
    ///
    /// Returns the smallest bound and the edge imposing it, or infinity and
    /// `None` when nothing limits the substep.
    pub fn estimate_max_substep(&mut self, ctx: &SimulationContext) -> (f64, Option<EdgeIndex>) {
        let mut min = f64::INFINITY;
        let mut limiting = None;
        for e in EdgeIndex::iter(self.edges.len()) {
            let edge_ctx = edge_context(&self.segments, &self.edges, e, ctx);
            let dt = self.edges[e].estimate_max_substep(&edge_ctx);
            if dt < min {
                min = dt;
                limiting = Some(e);
            }
        }
        (min, limiting)
    }

    /// Hand the chosen substep to every segment and edge.
    pub fn broadcast_substep(&mut self, substep: f64) {
        for segment in &mut self.segments {
            segment.set_substep(substep);
        }
        for edge in &mut self.edges {
            edge.set_substep(substep);
        }
    }

    /// Solve all discharges from the current state, then commit them.
    pub fn solve_discharges(&mut self, ctx: &SimulationContext) {
        let discharges: Vec<f64> = EdgeIndex::iter(self.edges.len())
            .map(|e| {
                let edge_ctx = edge_context(&self.segments, &self.edges, e, ctx);
                self.edges[e].solve_discharge(&edge_ctx)
            })
            .collect();
        for (edge, q) in self.edges.iter_mut().zip(discharges) {
            edge.commit_discharge(q);
        }
    }

    /// Apply the freshly solved discharges to every segment.
    pub fn update_storages(&mut self) {
        let inflows: Vec<f64> = self
            .segments
            .iter()
            .map(|segment| {
                let inflow: f64 = segment
                    .upstream_edges
                    .iter()
                    .map(|&e| self.edges[e].discharge())
                    .sum();
                let outflow: f64 = segment
                    .downstream_edges
                    .iter()
                    .map(|&e| self.edges[e].discharge())
                    .sum();
                inflow - outflow
            })
            .collect();
        for (segment, inflow) in self.segments.iter_mut().zip(inflows) {
            segment.update_storage(inflow);
        }
    }

    /// Boundary volumes of the current external step (1000 m³).
    ///
    /// Returns `(inflow, outflow)`: the water that entered through edges
    /// without an upstream segment and left through edges without a
    /// downstream segment.
    pub fn boundary_volumes(&self) -> (f64, f64) {
        let mut inflow = 0.0;
        let mut outflow = 0.0;
        for edge in &self.edges {
            let volume = edge.discharge_volume() / 1000.0;
            match (edge.upstream_segment, edge.downstream_segment) {
                (None, Some(_)) => inflow += volume,
                (Some(_), None) => outflow += volume,
                _ => {}
            }
        }
        (inflow, outflow)
    }

    /// Lateral inflow volume over `seconds` (1000 m³).
    pub fn lateral_volume(&self, seconds: f64) -> f64 {
        self.segments.iter().map(|s| s.lateral_flow() * seconds / 1000.0).sum()
    }
}

/// Build the substep view of one edge.
///
/// The result borrows only the segments, so the edge itself can be
/// mutated while the context is alive.
fn edge_context<'a>(
    segments: &'a [Segment],
    edges: &[RoutingEdge],
    index: EdgeIndex,
    ctx: &SimulationContext,
) -> EdgeContext<'a> {
    let edge = &edges[index];
    let client = edge.discharge();

    let share = |neighbor: EdgeIndex, downstream: bool| {
        let n = &edges[neighbor];
        let siblings: Vec<f64> = if downstream {
            n.downstream_neighbors.iter().map(|&s| edges[s].discharge()).collect()
        } else {
            n.upstream_neighbors.iter().map(|&s| edges[s].discharge()).collect()
        };
        partial_discharge(n.discharge(), client, &siblings)
    };

    EdgeContext {
        upstream: edge.upstream_segment.map(|s| &segments[s]),
        downstream: edge.downstream_segment.map(|s| &segments[s]),
        discharge_upstream: edge.upstream_neighbors.iter().map(|&n| share(n, true)).sum(),
        discharge_downstream: edge.downstream_neighbors.iter().map(|&n| share(n, false)).sum(),
        gravity: ctx.config.gravity,
        timestep_factor: ctx.config.timestep_factor,
        time: ctx.time,
    }
}
