//! Channel cross sections.
//!
//! A [`CrossSection`] converts between water depth (or level) and the wetted
//! geometry of a channel profile: wetted area, wetted perimeter and surface
//! width. It is a pure function of its configuration and is owned by exactly
//! one [`Segment`](crate::storage::Segment).
//!
//! Two profile descriptions are available:
//!
//! | Shape | Description |
//! |-------|-------------|
//! | [`Shape::Trapezes`] | Stack of symmetric trapezes, see [`Trapeze`] |
//! | [`Shape::Widths`] | Measured widths at increasing heights, linearly interpolated |
//!
//! With [`Friction`] data attached, a cross section also yields the
//! Manning–Strickler discharge and the kinematic wave celerity.
//!
//! # Example
//!
//! ```
//! use sw1d::cross_section::{CrossSection, Trapeze};
//!
//! let xs = CrossSection::trapezes(10.0, vec![Trapeze::rectangle(2.0)]).unwrap();
//! let g = xs.level_to_geometry(13.0);
//! assert_eq!(g.depth, 3.0);
//! assert_eq!(g.area, 6.0);
//! assert_eq!(g.perimeter, 8.0);
//! ```

mod pegasus;
mod trapeze;
mod widths;

pub use pegasus::{PegasusConfig, pegasus};
pub use trapeze::Trapeze;

use crate::error::CrossSectionError;

/// Wetted geometry at one water depth.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    /// Water depth above the channel bottom (m)
    pub depth: f64,
    /// Water level (m above datum)
    pub level: f64,
    /// Wetted area (m²)
    pub area: f64,
    /// Wetted perimeter (m)
    pub perimeter: f64,
    /// Surface width (m)
    pub top_width: f64,
}

impl Geometry {
    /// Zero-area geometry.
    pub fn dry() -> Self {
        Self::default()
    }

    /// Hydraulic radius A / P, zero for dry sections.
    pub fn hydraulic_radius(&self) -> f64 {
        if self.perimeter > 0.0 {
            self.area / self.perimeter
        } else {
            0.0
        }
    }

    /// Check if the section carries no water.
    pub fn is_dry(&self) -> bool {
        self.area <= 0.0
    }
}

/// Profile description.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// Stacked trapezes, lowest first.
    Trapezes(Vec<Trapeze>),
    /// Widths (m) at strictly increasing heights (m) above the bottom.
    Widths { heights: Vec<f64>, widths: Vec<f64> },
}

/// Manning–Strickler friction parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Friction {
    /// Strickler coefficient k = 1/n (m^(1/3)/s)
    pub strickler: f64,
    /// Bottom slope (m/m)
    pub bottom_slope: f64,
}

/// A validated channel profile.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrossSection {
    bottom_level: f64,
    shape: Shape,
    friction: Option<Friction>,
}

impl CrossSection {
    /// Create a cross section from a shape, validating it.
    pub fn new(bottom_level: f64, shape: Shape) -> Result<Self, CrossSectionError> {
        let cross_section = Self {
            bottom_level,
            shape,
            friction: None,
        };
        cross_section.validate()?;
        Ok(cross_section)
    }

    /// Recheck the geometry, e.g. after deserialisation.
    pub(crate) fn validate(&self) -> Result<(), CrossSectionError> {
        if !self.bottom_level.is_finite() {
            return Err(CrossSectionError::NonFinite(0));
        }
        match &self.shape {
            Shape::Trapezes(t) => trapeze::validate(t),
            Shape::Widths { heights, widths } => widths::validate(heights, widths),
        }
    }

    /// Stacked trapeze profile.
    pub fn trapezes(bottom_level: f64, trapezes: Vec<Trapeze>) -> Result<Self, CrossSectionError> {
        Self::new(bottom_level, Shape::Trapezes(trapezes))
    }

    /// Tabulated width profile.
    pub fn widths(
        bottom_level: f64,
        heights: Vec<f64>,
        widths: Vec<f64>,
    ) -> Result<Self, CrossSectionError> {
        Self::new(bottom_level, Shape::Widths { heights, widths })
    }

    /// Rectangular profile of the given width.
    pub fn rectangle(bottom_level: f64, width: f64) -> Result<Self, CrossSectionError> {
        Self::trapezes(bottom_level, vec![Trapeze::rectangle(width)])
    }

    /// Attach Manning–Strickler friction data.
    pub fn with_friction(
        mut self,
        strickler: f64,
        bottom_slope: f64,
    ) -> Result<Self, CrossSectionError> {
        let strickler_ok = strickler > 0.0 && strickler.is_finite();
        let slope_ok = bottom_slope >= 0.0 && bottom_slope.is_finite();
        if !(strickler_ok && slope_ok) {
            return Err(CrossSectionError::InvalidFriction {
                strickler,
                bottom_slope,
            });
        }
        self.friction = Some(Friction {
            strickler,
            bottom_slope,
        });
        Ok(self)
    }

    /// Absolute level of the channel bottom (m).
    pub fn bottom_level(&self) -> f64 {
        self.bottom_level
    }

    /// Profile description.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Friction data, if any.
    pub fn friction(&self) -> Option<Friction> {
        self.friction
    }

    /// Geometry at the given depth. Non-positive depths give the dry geometry.
    pub fn depth_to_geometry(&self, depth: f64) -> Geometry {
        let mut g = match &self.shape {
            Shape::Trapezes(t) => trapeze::geometry(t, depth),
            Shape::Widths { heights, widths } => widths::geometry(heights, widths, depth),
        };
        g.level = self.bottom_level + g.depth;
        g
    }

    /// Geometry at the given water level.
    pub fn level_to_geometry(&self, level: f64) -> Geometry {
        self.depth_to_geometry(level - self.bottom_level)
    }

    /// Geometry holding the given wetted area.
    ///
    /// Inverts the monotone area–depth relation with [`pegasus`].
    /// Non-positive areas give the dry geometry.
    pub fn area_to_geometry(&self, area: f64) -> Geometry {
        if !(area > 0.0) {
            return self.depth_to_geometry(0.0);
        }

        let area_at = |d: f64| self.depth_to_geometry(d).area - area;

        let mut upper = 1.0;
        for _ in 0..64 {
            if area_at(upper) >= 0.0 {
                break;
            }
            upper *= 2.0;
        }

        let config = PegasusConfig {
            f_tol: 1e-12 * area.max(1.0),
            ..PegasusConfig::default()
        };
        let depth = pegasus(area_at, 0.0, upper, config);
        self.depth_to_geometry(depth)
    }

    /// Manning–Strickler discharge (m³/s) for the given geometry.
    ///
    /// Q = k A R^(2/3) sqrt(S). Zero without friction data or for dry sections.
    pub fn discharge(&self, geometry: &Geometry) -> f64 {
        match self.friction {
            Some(f) if !geometry.is_dry() => {
                f.strickler
                    * geometry.area
                    * geometry.hydraulic_radius().powf(2.0 / 3.0)
                    * f.bottom_slope.sqrt()
            }
            _ => 0.0,
        }
    }

    /// Kinematic wave celerity dQ/dA (m/s) at the given depth.
    ///
    /// Evaluated by a forward difference. Zero for dry sections or without
    /// friction data.
    pub fn celerity(&self, depth: f64) -> f64 {
        let g0 = self.depth_to_geometry(depth);
        if g0.is_dry() || self.friction.is_none() {
            return 0.0;
        }
        let delta = 1e-6 * depth.max(1e-3);
        let g1 = self.depth_to_geometry(depth + delta);
        let da = g1.area - g0.area;
        if da <= 0.0 {
            return 0.0;
        }
        (self.discharge(&g1) - self.discharge(&g0)) / da
    }

    /// Stateful view implementing [`CrossSectionModel`].
    pub fn probe(&self) -> CrossSectionProbe<'_> {
        CrossSectionProbe {
            section: self,
            geometry: self.depth_to_geometry(0.0),
        }
    }
}

/// Set-then-query interface over a cross section.
///
/// Callers pick the independent variable with one of the `use_*` methods and
/// then read any derived quantity.
pub trait CrossSectionModel {
    /// Set the water depth (m).
    fn use_water_depth(&mut self, depth: f64);

    /// Set the water level (m).
    fn use_water_level(&mut self, level: f64);

    /// Set the wetted area (m²).
    fn use_wetted_area(&mut self, area: f64);

    /// Current water depth (m).
    fn water_depth(&self) -> f64;

    /// Current water level (m).
    fn water_level(&self) -> f64;

    /// Current wetted area (m²).
    fn wetted_area(&self) -> f64;

    /// Current wetted perimeter (m).
    fn wetted_perimeter(&self) -> f64;

    /// Current surface width (m).
    fn surface_width(&self) -> f64;

    /// Manning–Strickler discharge (m³/s).
    fn discharge(&self) -> f64;

    /// Kinematic wave celerity (m/s).
    fn celerity(&self) -> f64;
}

/// A cross section together with the geometry last selected on it.
#[derive(Clone, Copy, Debug)]
pub struct CrossSectionProbe<'a> {
    section: &'a CrossSection,
    geometry: Geometry,
}

impl CrossSectionProbe<'_> {
    /// Geometry for the current selection.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }
}

impl CrossSectionModel for CrossSectionProbe<'_> {
    fn use_water_depth(&mut self, depth: f64) {
        self.geometry = self.section.depth_to_geometry(depth);
    }

    fn use_water_level(&mut self, level: f64) {
        self.geometry = self.section.level_to_geometry(level);
    }

    fn use_wetted_area(&mut self, area: f64) {
        self.geometry = self.section.area_to_geometry(area);
    }

    fn water_depth(&self) -> f64 {
        self.geometry.depth
    }

    fn water_level(&self) -> f64 {
        self.geometry.level
    }

    fn wetted_area(&self) -> f64 {
        self.geometry.area
    }

    fn wetted_perimeter(&self) -> f64 {
        self.geometry.perimeter
    }

    fn surface_width(&self) -> f64 {
        self.geometry.top_width
    }

    fn discharge(&self) -> f64 {
        self.section.discharge(&self.geometry)
    }

    fn celerity(&self) -> f64 {
        self.section.celerity(self.geometry.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn compound() -> CrossSection {
        CrossSection::trapezes(
            100.0,
            vec![Trapeze::new(0.0, 5.0, 1.0), Trapeze::new(2.0, 20.0, 2.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_level_and_depth_agree() {
        let xs = compound();
        let by_depth = xs.depth_to_geometry(2.5);
        let by_level = xs.level_to_geometry(102.5);
        assert_eq!(by_depth, by_level);
        assert_relative_eq!(by_level.level, 102.5);
    }

    #[test]
    fn test_level_below_bottom_is_dry() {
        let xs = compound();
        let g = xs.level_to_geometry(99.0);
        assert!(g.is_dry());
        assert_eq!(g.depth, 0.0);
        assert_eq!(g.level, 100.0);
    }

    #[test]
    fn test_area_inverse_trapezes() {
        let xs = compound();
        for &depth in &[0.1, 1.0, 2.0, 2.7, 6.0] {
            let area = xs.depth_to_geometry(depth).area;
            let g = xs.area_to_geometry(area);
            assert_relative_eq!(g.depth, depth, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_area_inverse_widths() {
        let xs = CrossSection::widths(0.0, vec![0.0, 1.0, 3.0], vec![0.0, 4.0, 10.0]).unwrap();
        for &depth in &[0.5, 1.0, 2.0, 5.0] {
            let area = xs.depth_to_geometry(depth).area;
            assert_relative_eq!(xs.area_to_geometry(area).depth, depth, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_negative_area_is_dry() {
        let xs = compound();
        assert!(xs.area_to_geometry(-3.0).is_dry());
    }

    #[test]
    fn test_strickler_discharge() {
        // Rectangle 2 m wide, 3 m deep: A = 6, P = 8
        let xs = CrossSection::rectangle(0.0, 2.0)
            .unwrap()
            .with_friction(50.0, 0.001)
            .unwrap();
        let g = xs.depth_to_geometry(3.0);
        let expected = 50.0 * 6.0 * 0.75_f64.powf(2.0 / 3.0) * 0.001_f64.sqrt();
        assert_relative_eq!(xs.discharge(&g), expected, max_relative = 1e-12);
        assert_relative_eq!(xs.discharge(&g), 7.831, epsilon = 1e-3);
    }

    #[test]
    fn test_celerity_wide_channel() {
        // Very wide rectangle: c ≈ 5/3 v
        let xs = CrossSection::rectangle(0.0, 1000.0)
            .unwrap()
            .with_friction(30.0, 0.0005)
            .unwrap();
        let g = xs.depth_to_geometry(1.0);
        let v = xs.discharge(&g) / g.area;
        assert_relative_eq!(xs.celerity(1.0), 5.0 / 3.0 * v, max_relative = 1e-2);
    }

    #[test]
    fn test_no_friction_gives_zero() {
        let xs = compound();
        assert_eq!(xs.discharge(&xs.depth_to_geometry(1.0)), 0.0);
        assert_eq!(xs.celerity(1.0), 0.0);
    }

    #[test]
    fn test_invalid_friction() {
        let xs = CrossSection::rectangle(0.0, 1.0).unwrap();
        assert!(xs.clone().with_friction(0.0, 0.001).is_err());
        assert!(xs.with_friction(30.0, -0.1).is_err());
    }

    #[test]
    fn test_probe() {
        let xs = CrossSection::rectangle(10.0, 4.0).unwrap();
        let mut probe = xs.probe();

        probe.use_wetted_area(8.0);
        assert_relative_eq!(probe.water_depth(), 2.0, max_relative = 1e-9);
        assert_relative_eq!(probe.water_level(), 12.0, max_relative = 1e-9);
        assert_relative_eq!(probe.surface_width(), 4.0);

        probe.use_water_level(11.0);
        assert_relative_eq!(probe.wetted_area(), 4.0);
        assert_relative_eq!(probe.wetted_perimeter(), 6.0);

        probe.use_water_depth(0.0);
        assert_eq!(probe.wetted_area(), 0.0);
        assert_eq!(probe.discharge(), 0.0);
        assert_eq!(probe.celerity(), 0.0);
    }
}
