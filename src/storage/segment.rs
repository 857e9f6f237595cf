//! Channel segment storage.
//!
//! A segment stores the water volume of one discretised piece of channel.
//! Units follow the usual hydrological convention:
//! - length in km
//! - volume in 1000 m³
//! - discharge in m³/s
//!
//! so the wetted area is simply `A = V / L` (m²) and a flow `Q` over a
//! substep `dt` changes the volume by `Q dt / 1000`.

use crate::cross_section::{CrossSection, CrossSectionModel, Geometry};
use crate::types::EdgeIndex;

use super::StorageModel;

/// Initial water content of a segment.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitialState {
    /// Empty segment.
    #[default]
    Dry,
    /// Water level (m).
    WaterLevel(f64),
    /// Water depth (m).
    WaterDepth(f64),
    /// Water volume (1000 m³).
    WaterVolume(f64),
}

/// Configuration of one segment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentConfig {
    /// Segment length (km)
    pub length: f64,
    /// Channel profile
    pub cross_section: CrossSection,
    /// Initial water content
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial: InitialState,
}

impl SegmentConfig {
    /// Create a dry segment configuration.
    pub fn new(length: f64, cross_section: CrossSection) -> Self {
        Self {
            length,
            cross_section,
            initial: InitialState::Dry,
        }
    }

    /// Start at the given water level.
    pub fn with_water_level(mut self, level: f64) -> Self {
        self.initial = InitialState::WaterLevel(level);
        self
    }

    /// Start at the given water depth.
    pub fn with_water_depth(mut self, depth: f64) -> Self {
        self.initial = InitialState::WaterDepth(depth);
        self
    }

    /// Start with the given water volume.
    pub fn with_water_volume(mut self, volume: f64) -> Self {
        self.initial = InitialState::WaterVolume(volume);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !(self.length > 0.0 && self.length.is_finite()) {
            return Err(format!("length must be positive, got {}", self.length));
        }
        let value = match self.initial {
            InitialState::Dry => 0.0,
            InitialState::WaterLevel(v)
            | InitialState::WaterDepth(v)
            | InitialState::WaterVolume(v) => v,
        };
        if !value.is_finite() {
            return Err(format!("initial state is not finite: {:?}", self.initial));
        }
        Ok(())
    }
}

/// One channel segment.
///
/// The upstream/downstream edge lists are lookup links maintained by the
/// network builder; the segment never owns the edges.
#[derive(Clone, Debug)]
pub struct Segment {
    length: f64,
    cross_section: CrossSection,
    volume: f64,
    geometry: Geometry,
    lateral_flow: f64,
    substep: f64,
    pub(crate) upstream_edges: Vec<EdgeIndex>,
    pub(crate) downstream_edges: Vec<EdgeIndex>,
}

impl Segment {
    /// Create a segment from its configuration.
    pub fn new(config: SegmentConfig) -> Self {
        let SegmentConfig {
            length,
            cross_section,
            initial,
        } = config;

        let geometry = match initial {
            InitialState::Dry => cross_section.depth_to_geometry(0.0),
            InitialState::WaterLevel(level) => cross_section.level_to_geometry(level),
            InitialState::WaterDepth(depth) => cross_section.depth_to_geometry(depth),
            InitialState::WaterVolume(volume) => cross_section.area_to_geometry(volume / length),
        };
        let volume = match initial {
            InitialState::WaterVolume(volume) => volume,
            _ => geometry.area * length,
        };

        Self {
            length,
            cross_section,
            volume,
            geometry,
            lateral_flow: 0.0,
            substep: 0.0,
            upstream_edges: Vec::new(),
            downstream_edges: Vec::new(),
        }
    }

    /// Segment length (km).
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Distance from the segment centre to either end (km).
    pub fn half_length(&self) -> f64 {
        0.5 * self.length
    }

    /// Channel profile.
    pub fn cross_section(&self) -> &CrossSection {
        &self.cross_section
    }

    /// Wetted geometry for the current volume.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Current water depth (m).
    pub fn water_depth(&self) -> f64 {
        self.geometry.depth
    }

    /// Current wetted area (m²).
    pub fn wetted_area(&self) -> f64 {
        self.geometry.area
    }

    /// Lateral inflow for the current external step (m³/s).
    pub fn lateral_flow(&self) -> f64 {
        self.lateral_flow
    }

    /// Set the lateral inflow for the current external step (m³/s).
    pub fn set_lateral_flow(&mut self, flow: f64) {
        self.lateral_flow = flow;
    }

    /// Substep length last broadcast to this segment (s).
    pub fn substep(&self) -> f64 {
        self.substep
    }

    /// Routing edges feeding this segment.
    pub fn upstream_edges(&self) -> &[EdgeIndex] {
        &self.upstream_edges
    }

    /// Routing edges draining this segment.
    pub fn downstream_edges(&self) -> &[EdgeIndex] {
        &self.downstream_edges
    }

    /// Overwrite the stored volume (1000 m³) and rederive the geometry.
    pub fn set_water_volume(&mut self, volume: f64) {
        self.volume = volume;
        self.update_geometry();
    }

    pub(crate) fn clear_links(&mut self) {
        self.upstream_edges.clear();
        self.downstream_edges.clear();
    }

    fn update_geometry(&mut self) {
        let mut probe = self.cross_section.probe();
        probe.use_wetted_area(self.volume / self.length);
        self.geometry = probe.geometry();
    }
}

impl StorageModel for Segment {
    fn set_substep(&mut self, substep: f64) {
        self.substep = substep;
    }

    fn update_storage(&mut self, edge_inflow: f64) {
        let net_inflow = (self.lateral_flow + edge_inflow) * self.substep / 1000.0;
        self.volume += net_inflow;
        self.update_geometry();
    }

    fn water_volume(&self) -> f64 {
        self.volume
    }

    fn water_level(&self) -> f64 {
        self.geometry.level
    }
}
