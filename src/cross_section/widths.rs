//! Tabulated width/height profile.
//!
//! Widths are measured at strictly increasing heights above the channel
//! bottom. Between two measurements the width varies linearly; above the
//! highest one the banks are extended vertically without limit.

use crate::error::CrossSectionError;

use super::Geometry;

/// Validate a width table.
pub(crate) fn validate(heights: &[f64], widths: &[f64]) -> Result<(), CrossSectionError> {
    if heights.is_empty() {
        return Err(CrossSectionError::Empty);
    }
    if heights.len() != widths.len() {
        return Err(CrossSectionError::LengthMismatch(heights.len(), widths.len()));
    }
    if heights[0] != 0.0 {
        return Err(CrossSectionError::BottomOffset(heights[0]));
    }
    for (index, (&h, &w)) in heights.iter().zip(widths).enumerate() {
        if !(h.is_finite() && w.is_finite()) {
            return Err(CrossSectionError::NonFinite(index));
        }
        if w < 0.0 {
            return Err(CrossSectionError::NegativeWidth { index, value: w });
        }
        if index > 0 && h <= heights[index - 1] {
            return Err(CrossSectionError::NonIncreasingHeight { index, value: h });
        }
    }
    if widths.iter().all(|&w| w == 0.0) {
        return Err(CrossSectionError::ZeroWidth);
    }
    Ok(())
}

/// Integrate the table up to `depth`.
pub(crate) fn geometry(heights: &[f64], widths: &[f64], depth: f64) -> Geometry {
    let mut geometry = Geometry::dry();
    if depth <= 0.0 {
        return geometry;
    }
    geometry.depth = depth;
    geometry.perimeter = widths[0];

    let n = heights.len();
    for j in 0..n - 1 {
        let (h0, h1) = (heights[j], heights[j + 1]);
        let (w0, w1) = (widths[j], widths[j + 1]);
        let dh = depth.min(h1) - h0;
        let w = w0 + (w1 - w0) * dh / (h1 - h0);

        geometry.area += 0.5 * (w0 + w) * dh;
        geometry.perimeter += 2.0 * (dh * dh + 0.25 * (w - w0) * (w - w0)).sqrt();
        geometry.top_width = w;

        if depth <= h1 {
            return geometry;
        }
    }

    // Vertical walls above the highest measurement
    let dh = depth - heights[n - 1];
    geometry.area += widths[n - 1] * dh;
    geometry.perimeter += 2.0 * dh;
    geometry.top_width = widths[n - 1];
    geometry
}
