//! Stacked trapeze geometry.
//!
//! A profile is a stack of symmetric trapezes. Trapeze `i` starts at height
//! `z_i` above the channel bottom with bottom width `b_i` and side slope
//! `s_i` (horizontal per vertical, per side). Once the water rises above the
//! start of the next trapeze, the lower one continues as a vertical column
//! with its full top width.
//!
//! For a trapeze filled to local depth `h`:
//! - A = (b + s h) h
//! - P = b + 2 h sqrt(1 + s²)
//! - W = b + 2 s h

use crate::error::CrossSectionError;

use super::Geometry;

/// One trapeze of a stacked profile.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trapeze {
    /// Height of the trapeze bottom above the channel bottom (m)
    pub height: f64,
    /// Bottom width (m)
    pub bottom_width: f64,
    /// Side slope, horizontal extent per metre of rise on each side
    pub side_slope: f64,
}

impl Trapeze {
    /// Create a new trapeze.
    pub fn new(height: f64, bottom_width: f64, side_slope: f64) -> Self {
        Self {
            height,
            bottom_width,
            side_slope,
        }
    }

    /// Rectangle starting at the channel bottom.
    pub fn rectangle(width: f64) -> Self {
        Self::new(0.0, width, 0.0)
    }

    fn top_width_at(&self, local_depth: f64) -> f64 {
        self.bottom_width + 2.0 * self.side_slope * local_depth
    }
}

/// Validate a trapeze stack.
pub(crate) fn validate(trapezes: &[Trapeze]) -> Result<(), CrossSectionError> {
    let first = trapezes.first().ok_or(CrossSectionError::Empty)?;
    if first.height != 0.0 {
        return Err(CrossSectionError::BottomOffset(first.height));
    }
    let mut previous = f64::NEG_INFINITY;
    let mut total_width = 0.0;
    for (index, t) in trapezes.iter().enumerate() {
        if !(t.height.is_finite() && t.bottom_width.is_finite() && t.side_slope.is_finite()) {
            return Err(CrossSectionError::NonFinite(index));
        }
        if t.side_slope < 0.0 {
            return Err(CrossSectionError::NegativeSlope {
                index,
                value: t.side_slope,
            });
        }
        if t.bottom_width < 0.0 {
            return Err(CrossSectionError::NegativeWidth {
                index,
                value: t.bottom_width,
            });
        }
        if t.height <= previous {
            return Err(CrossSectionError::NonIncreasingHeight {
                index,
                value: t.height,
            });
        }
        previous = t.height;
        total_width += t.bottom_width + t.side_slope;
    }
    if total_width <= 0.0 {
        return Err(CrossSectionError::ZeroWidth);
    }
    Ok(())
}

/// Sum the contributions of all trapezes below `depth`.
pub(crate) fn geometry(trapezes: &[Trapeze], depth: f64) -> Geometry {
    let mut geometry = Geometry::dry();
    if depth <= 0.0 {
        return geometry;
    }
    geometry.depth = depth;

    for (i, t) in trapezes.iter().enumerate() {
        if depth <= t.height {
            break;
        }
        let top = trapezes.get(i + 1).map_or(f64::INFINITY, |next| next.height);
        let h = depth.min(top) - t.height;
        let width = t.top_width_at(h);

        geometry.area += (t.bottom_width + t.side_slope * h) * h;
        geometry.perimeter += t.bottom_width + 2.0 * h * (1.0 + t.side_slope * t.side_slope).sqrt();
        geometry.top_width += width;

        // Filled trapeze continues as a vertical column
        if depth > top {
            geometry.area += width * (depth - top);
        }
    }
    geometry
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_rectangle() {
        let stack = [Trapeze::rectangle(2.0)];
        let g = geometry(&stack, 3.0);
        assert!((g.area - 6.0).abs() < TOL);
        assert!((g.perimeter - 8.0).abs() < TOL);
        assert!((g.top_width - 2.0).abs() < TOL);
    }

    #[test]
    fn test_single_trapeze() {
        let stack = [Trapeze::new(0.0, 2.0, 1.0)];
        let g = geometry(&stack, 1.0);
        // (2 + 1) * 1
        assert!((g.area - 3.0).abs() < TOL);
        assert!((g.perimeter - (2.0 + 2.0 * 2.0_f64.sqrt())).abs() < TOL);
        assert!((g.top_width - 4.0).abs() < TOL);
    }

    #[test]
    fn test_stacked_trapezes() {
        // Main channel 2 m wide and 1 m deep, floodplains 10 m wide on top
        let stack = [Trapeze::new(0.0, 2.0, 0.0), Trapeze::new(1.0, 10.0, 0.0)];

        let below = geometry(&stack, 0.5);
        assert!((below.area - 1.0).abs() < TOL);
        assert!((below.top_width - 2.0).abs() < TOL);

        let above = geometry(&stack, 1.5);
        // Channel column 2 * 1.5 plus floodplain 10 * 0.5
        assert!((above.area - 8.0).abs() < TOL);
        assert!((above.top_width - 12.0).abs() < TOL);
        // 2 + 2*1 (channel) + 10 + 2*0.5 (floodplain)
        assert!((above.perimeter - 15.0).abs() < TOL);
    }

    #[test]
    fn test_negative_depth_is_dry() {
        let stack = [Trapeze::new(0.0, 2.0, 1.0)];
        let g = geometry(&stack, -1.0);
        assert_eq!(g.area, 0.0);
        assert_eq!(g.perimeter, 0.0);
        assert_eq!(g.top_width, 0.0);
    }

    #[test]
    fn test_validation() {
        assert_eq!(validate(&[]), Err(CrossSectionError::Empty));
        assert!(matches!(
            validate(&[Trapeze::new(0.0, 1.0, -0.5)]),
            Err(CrossSectionError::NegativeSlope { index: 0, .. })
        ));
        assert!(matches!(
            validate(&[Trapeze::new(0.0, 1.0, 0.0), Trapeze::new(0.0, 1.0, 0.0)]),
            Err(CrossSectionError::NonIncreasingHeight { index: 1, .. })
        ));
        assert!(matches!(
            validate(&[Trapeze::new(0.5, 1.0, 0.0)]),
            Err(CrossSectionError::BottomOffset(_))
        ));
        assert!(validate(&[Trapeze::new(0.0, 1.0, 0.0), Trapeze::new(2.0, 5.0, 1.0)]).is_ok());
    }
}
