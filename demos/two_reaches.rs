//! Two tributaries joining a main reach.
//!
//! Run with: `RUST_LOG=debug cargo run --example two_reaches`
//!
//! - `upper` and `side` are fed by boundary inflow hydrographs
//! - Both join `lower` at a confluence
//! - `lower` ends at a sluice gate draining to a tidal level
//!
//! Prints the averaged discharges at the confluence and the gate together
//! with the water balance of every hour.

use std::ops::ControlFlow;

use sw1d::{
    BoundaryConfig, CentralConfig, ChannelConfig, CrossSection, EdgeConfig, GateConfig, Junction,
    NetworkBuilder, RoutingConfig, SegmentConfig, Simulation, TabulatedForcing, Trapeze,
};

/// Compound trapezoidal reach with a bottom falling 10 cm per km.
fn reach(name: &str, n: usize, bottom: f64, inflow: Option<f64>) -> ChannelConfig {
    let mut channel = ChannelConfig::new(name);
    if let Some(q) = inflow {
        channel = channel.edge(EdgeConfig::Inflow(BoundaryConfig::new(q)));
    }
    for i in 0..n {
        let xs = CrossSection::trapezes(
            bottom - 0.1 * i as f64,
            vec![Trapeze::new(0.0, 12.0, 2.0), Trapeze::new(2.5, 60.0, 5.0)],
        )
        .and_then(|xs| xs.with_friction(30.0, 1e-4))
        .expect("valid profile");
        channel = channel.segment(SegmentConfig::new(1.0, xs).with_water_depth(1.2));
        if i + 1 < n {
            channel = channel.edge(EdgeConfig::Central(CentralConfig::new(30.0, 0.1)));
        }
    }
    channel
}

fn main() {
    env_logger::init();

    // Parameters
    let hours = 24;
    let external_step = 3600.0;

    let outlet = || EdgeConfig::Central(CentralConfig::new(30.0, 0.1));
    let upper = reach("upper", 6, 2.0, Some(8.0)).edge(outlet());
    let side = reach("side", 4, 1.8, Some(3.0)).edge(outlet());
    let lower = reach("lower", 8, 1.3, None).edge(EdgeConfig::Gate(
        GateConfig::new(0.2, 1.8, 6.0, 0.62).with_downstream_level(0.8),
    ));

    let builder = NetworkBuilder::new()
        .channel(upper)
        .channel(side)
        .channel(lower)
        .junction(Junction::new("confluence").entering("upper").entering("side").exiting("lower"));

    // Flood wave on `upper`, semidiurnal tide behind the gate
    let flood: Vec<f64> = (0..hours)
        .map(|h| 8.0 + 40.0 * (-((h as f64 - 8.0) / 3.0).powi(2)).exp())
        .collect();
    let tide: Vec<f64> = (0..hours)
        .map(|h| 0.8 + 0.6 * (2.0 * std::f64::consts::PI * h as f64 / 12.42).sin())
        .collect();
    let forcing = TabulatedForcing::new()
        .with_boundary_discharge("upper", 0, flood)
        .with_boundary_water_level("lower", 8, tide);

    let mut sim = Simulation::from_builder(&builder, RoutingConfig::default(), external_step)
        .expect("valid network");
    let network = &sim.networks()[0];
    let junction_edges = [
        network.edge_index("upper", 6).expect("upper outlet"),
        network.edge_index("side", 4).expect("side outlet"),
    ];
    let gate = network.edge_index("lower", 8).expect("gate");

    println!("Two reaches");
    println!("===========");
    println!("Segments: {}", network.n_segments());
    println!("Edges: {}", network.n_edges());
    println!();
    println!(
        "{:>4} {:>10} {:>10} {:>10} {:>8} {:>12}",
        "hour", "upper", "side", "gate", "substeps", "balance"
    );

    let result = sim.run_with_callback(hours, Some(&forcing), |step, reports| {
        let report = &reports[0];
        println!(
            "{:>4} {:>10.3} {:>10.3} {:>10.3} {:>8} {:>12.3e}",
            step + 1,
            report.discharges[junction_edges[0].get()],
            report.discharges[junction_edges[1].get()],
            report.discharges[gate.get()],
            report.substeps,
            report.balance.error()
        );
        ControlFlow::Continue(())
    });

    println!();
    println!(
        "Substeps: {} in [{:.1}, {:.1}] s",
        result.substeps, result.min_substep, result.max_substep
    );
    println!("Relative balance error: {:.2e}", result.balances[0].relative_error());
    println!("Warnings: {}", result.warnings.len());
    println!("Wall time: {:.3} s", result.wall_time);
}
