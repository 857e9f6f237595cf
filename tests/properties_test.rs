//! Property-based tests.
//!
//! These tests verify:
//! - Wetted area grows monotonically with depth
//! - `area_to_geometry` inverts `depth_to_geometry`
//! - Substeps always add up to the external step
//! - Apportioned shares add up to the apportioned discharge

use proptest::prelude::*;
use sw1d::routing::partial_discharge;
use sw1d::{CrossSection, SchedulerState, SubstepScheduler, Trapeze};

fn two_trapezes() -> impl Strategy<Value = CrossSection> {
    (0.5..20.0f64, 0.0..3.0f64, 0.3..3.0f64, 0.0..30.0f64, 0.0..5.0f64).prop_map(
        |(b0, s0, z1, b1, s1)| {
            let trapezes = vec![Trapeze::new(0.0, b0, s0), Trapeze::new(z1, b1, s1)];
            CrossSection::trapezes(2.0, trapezes).unwrap()
        },
    )
}

fn width_table() -> impl Strategy<Value = CrossSection> {
    prop::collection::vec((0.1..2.0f64, 0.5..25.0f64), 1..6).prop_map(|rows| {
        let mut heights = vec![0.0];
        let mut widths = vec![rows[0].1];
        let mut z = 0.0;
        for &(dz, w) in &rows[1..] {
            z += dz;
            heights.push(z);
            widths.push(w);
        }
        CrossSection::widths(0.0, heights, widths).unwrap()
    })
}

proptest! {
    /// Area never decreases as the depth rises.
    #[test]
    fn prop_area_monotonic_in_depth(xs in two_trapezes(), d in 0.0..10.0f64, dd in 0.001..2.0f64) {
        let lower = xs.depth_to_geometry(d);
        let upper = xs.depth_to_geometry(d + dd);
        prop_assert!(upper.area > lower.area);
        prop_assert!(upper.perimeter >= lower.perimeter);
    }

    /// Inverting the area recovers the depth for stacked trapezes.
    #[test]
    fn prop_area_inverse_trapezes(xs in two_trapezes(), d in 0.01..10.0f64) {
        let area = xs.depth_to_geometry(d).area;
        let g = xs.area_to_geometry(area);
        prop_assert!((g.depth - d).abs() < 1e-6 * d.max(1.0), "depth {} vs {}", g.depth, d);
        prop_assert!((g.level - (2.0 + d)).abs() < 1e-6 * d.max(1.0));
    }

    /// Inverting the area recovers the depth for width tables.
    #[test]
    fn prop_area_inverse_widths(xs in width_table(), d in 0.01..8.0f64) {
        let area = xs.depth_to_geometry(d).area;
        let g = xs.area_to_geometry(area);
        prop_assert!((g.depth - d).abs() < 1e-6 * d.max(1.0), "depth {} vs {}", g.depth, d);
    }

    /// Whatever the stability estimates, the substeps cover the step exactly.
    #[test]
    fn prop_substeps_sum_to_external_step(
        step in 1.0..7200.0f64,
        estimates in prop::collection::vec(0.5..5000.0f64, 1..40),
    ) {
        let mut scheduler = SubstepScheduler::new();
        scheduler.begin(step);
        let mut total = 0.0;
        let mut i = 0;
        loop {
            let substep = scheduler.choose_substep(estimates[i % estimates.len()], None);
            prop_assert!(substep > 0.0);
            total += substep;
            scheduler.computed();
            i += 1;
            if scheduler.updated() == SchedulerState::Done {
                break;
            }
        }
        prop_assert!((total - step).abs() <= 1e-9 * step);
        prop_assert_eq!(scheduler.finish().substeps, i);
    }

    /// Shares of all siblings add up to the discharge.
    #[test]
    fn prop_shares_sum(
        q in -50.0..50.0f64,
        siblings in prop::collection::vec(-20.0..20.0f64, 2..6),
    ) {
        prop_assume!(siblings.iter().any(|s| s.abs() > 1e-6));
        let total: f64 = siblings.iter().map(|&s| partial_discharge(q, s, &siblings)).sum();
        prop_assert!((total - q).abs() < 1e-9 * q.abs().max(1.0));
    }
}
