//! Discharge post-processing shared by all routing kinds.

/// Share of `discharge` attributed to one of several neighbours.
///
/// At a confluence or bifurcation an edge's discharge is split among the
/// edges on the other side of the shared segment in proportion to their
/// absolute discharges. `siblings` holds the discharges of all of them,
/// including the client's own `client` value.
///
/// A single sibling always receives the whole discharge, even when its own
/// discharge is zero: with nothing to share with, a plain reach passes its
/// flow on unchanged. The proportional rule applies from two siblings on, and
/// if every one of them reports zero the share is zero.
pub fn partial_discharge(discharge: f64, client: f64, siblings: &[f64]) -> f64 {
    match siblings.len() {
        0 => 0.0,
        1 => discharge,
        _ => {
            let total: f64 = siblings.iter().map(|q| q.abs()).sum();
            if total > 0.0 {
                discharge * client.abs() / total
            } else {
                0.0
            }
        }
    }
}

/// Limit a discharge to the water actually available for one substep.
///
/// Positive flow may not take more than `1000 max(V_up, 0) / dt` from the
/// upstream segment, negative flow not more than `1000 max(V_down, 0) / dt`
/// from the downstream one. Sides without a segment are not limited. The
/// receiving segment is never checked.
pub fn limit_to_available(
    discharge: f64,
    volume_upstream: Option<f64>,
    volume_downstream: Option<f64>,
    substep: f64,
) -> f64 {
    if substep <= 0.0 {
        return discharge;
    }
    if discharge > 0.0 {
        if let Some(v) = volume_upstream {
            return discharge.min(1000.0 * v.max(0.0) / substep);
        }
    } else if discharge < 0.0 {
        if let Some(v) = volume_downstream {
            return discharge.max(-1000.0 * v.max(0.0) / substep);
        }
    }
    discharge
}
