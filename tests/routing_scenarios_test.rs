//! Integration tests for the routing edges inside assembled networks.
//!
//! These tests verify:
//! - Stationarity of the local inertial discharge for Strickler flow
//! - Weir and gate discharges for reference configurations
//! - Degenerate inputs resolving to zero discharge or infinite bounds
//! - The one-sided volume limit

use approx::assert_relative_eq;
use sw1d::routing::{
    LocalInertialInput, limit_to_available, local_inertial_discharge, partial_discharge,
};
use sw1d::{
    BoundaryConfig, CentralConfig, ChannelConfig, CrossSection, EdgeConfig, GateConfig, GateControl,
    Network, NetworkBuilder, RoutingConfig, RoutingModel, SegmentConfig, SimulationContext,
    StorageModel, WeirConfig,
};

const G: f64 = 9.81;

fn context(external_step: f64) -> SimulationContext {
    SimulationContext::new(RoutingConfig::default(), external_step).unwrap()
}

/// Manning–Strickler discharge for A = 6 m², P = 8 m, slope 2 m over 2 km.
fn strickler_discharge() -> f64 {
    50.0 * 6.0 * (6.0_f64 / 8.0).powf(2.0 / 3.0) * (2.0_f64 / 2000.0).sqrt()
}

/// Two 2 km rectangular segments (2 m wide, bottom at 1 m) at levels 5 m
/// and 3 m, between an inflow and an outflow edge.
fn stationary_network(q: f64) -> Network {
    let xs = CrossSection::rectangle(1.0, 2.0).unwrap();
    let channel = ChannelConfig::new("reach")
        .edge(EdgeConfig::Inflow(BoundaryConfig::new(q)))
        .segment(SegmentConfig::new(2.0, xs.clone()).with_water_level(5.0))
        .edge(EdgeConfig::Central(CentralConfig::new(50.0, 0.2)))
        .segment(SegmentConfig::new(2.0, xs).with_water_level(3.0))
        .edge(EdgeConfig::Outflow(BoundaryConfig::new(q)));
    NetworkBuilder::new().channel(channel).build().unwrap()
}

/// Stationary Strickler flow stays stationary through one substep.
#[test]
fn test_central_stationarity_in_network() {
    let q = strickler_discharge();
    assert_relative_eq!(q, 7.83, epsilon = 0.01);

    let mut network = stationary_network(q);
    let central = network.edge_index("reach", 1).unwrap();
    for e in 0..network.n_edges() {
        network.edge_mut(sw1d::EdgeIndex::new(e)).set_discharge(q);
    }

    // Interface: level 4 m, depth 3 m, A = 6 m², P = 8 m
    let up = network.segment(network.segment_index("reach", 0).unwrap());
    let down = network.segment(network.segment_index("reach", 1).unwrap());
    let interface = sw1d::routing::interface_geometry(up, down);
    assert_relative_eq!(interface.area, 6.0, max_relative = 1e-12);
    assert_relative_eq!(interface.perimeter, 8.0, max_relative = 1e-12);

    let ctx = context(100.0);
    network.broadcast_substep(100.0);
    network.solve_discharges(&ctx);
    assert_relative_eq!(network.edge(central).discharge(), q, max_relative = 1e-9);
}

/// The local inertial formula itself, with the reference inputs.
#[test]
fn test_central_stationarity_formula() {
    let q = strickler_discharge();
    let input = LocalInertialInput {
        discharge_old: q,
        discharge_upstream: q,
        discharge_downstream: q,
        level_upstream: 5.0,
        level_downstream: 3.0,
        area: 6.0,
        perimeter: 8.0,
        length: 2.0,
        substep: 100.0,
        gravity: G,
    };
    let q_new = local_inertial_discharge(&CentralConfig::new(50.0, 0.2), &input);
    assert_relative_eq!(q_new, q, max_relative = 1e-12);
}

fn weir_network(level: f64) -> Network {
    let channel = ChannelConfig::new("pond")
        .segment(
            SegmentConfig::new(1.0, CrossSection::rectangle(0.0, 20.0).unwrap())
                .with_water_level(level),
        )
        .edge(EdgeConfig::Weir(WeirConfig::new(5.0, 10.0, 0.6)));
    NetworkBuilder::new().channel(channel).build().unwrap()
}

/// Weir below its crest neither flows nor limits the substep.
#[test]
fn test_weir_below_crest() {
    let mut network = weir_network(4.0);
    let ctx = context(60.0);
    let (estimate, limiting) = network.estimate_max_substep(&ctx);
    assert_eq!(estimate, f64::INFINITY);
    assert!(limiting.is_none());

    network.broadcast_substep(60.0);
    network.solve_discharges(&ctx);
    assert_eq!(network.edges()[0].discharge(), 0.0);
}

/// Poleni discharge at 2 m head.
#[test]
fn test_weir_above_crest() {
    let mut network = weir_network(7.0);
    let ctx = context(1.0);
    let (estimate, _) = network.estimate_max_substep(&ctx);
    assert!(estimate.is_finite());

    network.broadcast_substep(1.0);
    network.solve_discharges(&ctx);
    assert_relative_eq!(network.edges()[0].discharge(), 50.11, epsilon = 0.01);
}

fn gate_network(level_up: f64, level_down: f64) -> Network {
    let xs = CrossSection::rectangle(0.0, 10.0).unwrap();
    let channel = ChannelConfig::new("sluice")
        .segment(SegmentConfig::new(5.0, xs.clone()).with_water_level(level_up))
        .edge(EdgeConfig::Gate(GateConfig::new(4.0, 6.0, 3.0, 0.6)))
        .segment(SegmentConfig::new(5.0, xs).with_water_level(level_down));
    NetworkBuilder::new().channel(channel).build().unwrap()
}

fn gate_discharge(network: &mut Network) -> f64 {
    let ctx = context(1.0);
    network.broadcast_substep(1.0);
    network.solve_discharges(&ctx);
    let gate = network.edge_index("sluice", 1).unwrap();
    network.edge(gate).discharge()
}

/// Submerged gate flow and its exact sign flip.
#[test]
fn test_gate_between_segments() {
    let forward = gate_discharge(&mut gate_network(9.0, 7.0));
    let backward = gate_discharge(&mut gate_network(7.0, 9.0));
    assert_relative_eq!(forward, 22.55, epsilon = 0.01);
    assert_eq!(forward, -backward);
}

/// A control rule closing the gate stops the flow.
#[test]
fn test_gate_control_closes() {
    let mut network = gate_network(9.0, 7.0);
    let control = GateControl::new(|ctx| if ctx.time >= 0.0 { 4.0 } else { 6.0 });
    network.set_gate_control("sluice", 1, control).unwrap();
    let ctx = context(1.0);
    network.apply_gate_controls(&ctx);
    let gate = network.edge_index("sluice", 1).unwrap();
    assert_eq!(network.edge(gate).gate_height(), 4.0);

    let (estimate, _) = network.estimate_max_substep(&ctx);
    assert_eq!(estimate, f64::INFINITY);
    assert_eq!(gate_discharge(&mut network), 0.0);
}

/// Balanced levels at a gate give no flow and no stability limit.
#[test]
fn test_gate_balanced_levels() {
    let mut network = gate_network(8.0, 8.0);
    let (estimate, _) = network.estimate_max_substep(&context(1.0));
    assert_eq!(estimate, f64::INFINITY);
    assert_eq!(gate_discharge(&mut network), 0.0);
}

/// Dry segments on both sides of a central edge give zero discharge.
#[test]
fn test_dry_central_edge() {
    let xs = CrossSection::rectangle(0.0, 2.0).unwrap();
    let segment = SegmentConfig::new(1.0, xs);
    let mut channel = ChannelConfig::uniform("dry", 2, segment, CentralConfig::default());
    channel.edges[2] = Some(EdgeConfig::Outflow(BoundaryConfig::new(0.0)));
    let mut network = NetworkBuilder::new().channel(channel).build().unwrap();

    let ctx = context(10.0);
    let (estimate, _) = network.estimate_max_substep(&ctx);
    assert_eq!(estimate, f64::INFINITY);
    network.broadcast_substep(10.0);
    network.solve_discharges(&ctx);
    for edge in network.edges() {
        assert_eq!(edge.discharge(), 0.0);
        assert!(!edge.discharge().is_nan());
    }
}

/// Outflow cannot withdraw more than the segment holds in one substep.
#[test]
fn test_outflow_limited_to_storage() {
    let channel = ChannelConfig::new("tank")
        .segment(
            SegmentConfig::new(1.0, CrossSection::rectangle(0.0, 1.0).unwrap())
                .with_water_depth(1.0),
        )
        .edge(EdgeConfig::Outflow(BoundaryConfig::new(100.0)));
    let mut network = NetworkBuilder::new().channel(channel).build().unwrap();

    // 1 (1000 m³) stored, 50 s substep: at most 20 m³/s
    network.broadcast_substep(50.0);
    network.solve_discharges(&context(50.0));
    assert_relative_eq!(network.edges()[0].discharge(), 20.0, max_relative = 1e-12);

    network.update_storages();
    assert!(network.segments()[0].water_volume().abs() < 1e-12);
}

/// Apportionment degenerate cases and the one-sided limit.
#[test]
fn test_apportion_and_limit() {
    assert_eq!(partial_discharge(5.0, 0.0, &[0.0, 0.0]), 0.0);
    assert_eq!(partial_discharge(5.0, 0.0, &[0.0]), 5.0);
    assert_relative_eq!(partial_discharge(6.0, 1.0, &[1.0, 2.0]), 2.0);

    // The receiving side is never checked
    assert_eq!(limit_to_available(10.0, Some(1e6), Some(-5.0), 1.0), 10.0);
    assert_eq!(limit_to_available(-10.0, Some(-5.0), Some(1e6), 1.0), -10.0);
}
