//! Channel configuration and its assembled form.
//!
//! A channel is an ordered chain of slots
//!
//! ```text
//! edge 0 | segment 0 | edge 1 | segment 1 | ... | segment n-1 | edge n
//! ```
//!
//! Edge `j` sits between segments `j - 1` and `j`. The internal edges
//! `1..n` are mandatory; the initial and terminal edges may be left empty
//! when a neighbouring channel supplies the connection at a junction.

use crate::error::ConfigError;
use crate::routing::EdgeConfig;
use crate::storage::SegmentConfig;
use crate::types::{EdgeIndex, SegmentIndex};

/// User-facing description of one channel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelConfig {
    /// Unique channel name
    pub name: String,
    /// Segment slots, upstream to downstream
    pub segments: Vec<Option<SegmentConfig>>,
    /// Edge slots, one more than segments
    pub edges: Vec<Option<EdgeConfig>>,
}

impl ChannelConfig {
    /// Start an empty channel with a vacant initial edge slot.
    ///
    /// # Example
    ///
    /// ```
    /// use sw1d::cross_section::CrossSection;
    /// use sw1d::network::ChannelConfig;
    /// use sw1d::routing::{BoundaryConfig, CentralConfig, EdgeConfig, WeirConfig};
    /// use sw1d::storage::SegmentConfig;
    ///
    /// let xs = CrossSection::rectangle(0.0, 10.0).unwrap();
    /// let segment = SegmentConfig::new(2.0, xs).with_water_depth(1.0);
    ///
    /// let channel = ChannelConfig::new("upper")
    ///     .edge(EdgeConfig::Inflow(BoundaryConfig::new(5.0)))
    ///     .segment(segment.clone())
    ///     .edge(EdgeConfig::Central(CentralConfig::default()))
    ///     .segment(segment)
    ///     .edge(EdgeConfig::Weir(WeirConfig::new(0.5, 10.0, 0.6)));
    ///
    /// assert_eq!(channel.n_segments(), 2);
    /// assert_eq!(channel.edges.len(), 3);
    /// ```
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
            edges: vec![None],
        }
    }

    /// Append a segment followed by a vacant edge slot.
    pub fn segment(mut self, segment: SegmentConfig) -> Self {
        self.segments.push(Some(segment));
        self.edges.push(None);
        self
    }

    /// Fill the most recent edge slot.
    pub fn edge(mut self, edge: EdgeConfig) -> Self {
        if let Some(slot) = self.edges.last_mut() {
            *slot = Some(edge);
        } else {
            self.edges.push(Some(edge));
        }
        self
    }

    /// Chain of `n` identical segments joined by identical central edges.
    ///
    /// Initial and terminal edges are left vacant.
    pub fn uniform(
        name: impl Into<String>,
        n: usize,
        segment: SegmentConfig,
        central: crate::routing::CentralConfig,
    ) -> Self {
        let mut channel = Self::new(name);
        for i in 0..n {
            if i > 0 {
                channel = channel.edge(EdgeConfig::Central(central));
            }
            channel = channel.segment(segment.clone());
        }
        channel
    }

    /// Number of segment slots.
    pub fn n_segments(&self) -> usize {
        self.segments.len()
    }

    /// Check slot counts and that every internal slot is filled.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let n = self.segments.len();
        if n == 0 {
            return Err(ConfigError::EmptyChannel(self.name.clone()));
        }
        if self.edges.len() != n + 1 {
            return Err(ConfigError::EdgeSlotCount {
                channel: self.name.clone(),
                segments: n,
                edges: self.edges.len(),
            });
        }
        for (position, slot) in self.segments.iter().enumerate() {
            let Some(segment) = slot else {
                return Err(ConfigError::MissingSegment {
                    channel: self.name.clone(),
                    position,
                });
            };
            segment.validate().map_err(|message| ConfigError::InvalidSegment {
                channel: self.name.clone(),
                position,
                message,
            })?;
            segment
                .cross_section
                .validate()
                .map_err(|source| ConfigError::InvalidCrossSection {
                    channel: self.name.clone(),
                    position,
                    source,
                })?;
        }
        for (position, slot) in self.edges.iter().enumerate() {
            match slot {
                None if position > 0 && position < n => {
                    return Err(ConfigError::MissingEdge {
                        channel: self.name.clone(),
                        position,
                    });
                }
                None => {}
                Some(edge) => edge.validate().map_err(|message| ConfigError::InvalidEdge {
                    channel: self.name.clone(),
                    position,
                    message,
                })?,
            }
        }
        Ok(())
    }
}

/// A channel placed in a network arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelAssembly {
    pub(crate) name: String,
    pub(crate) segments: Vec<SegmentIndex>,
    pub(crate) edges: Vec<Option<EdgeIndex>>,
}

impl ChannelAssembly {
    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arena indices of the segments, upstream to downstream.
    pub fn segments(&self) -> &[SegmentIndex] {
        &self.segments
    }

    /// Arena indices of the edge slots.
    pub fn edges(&self) -> &[Option<EdgeIndex>] {
        &self.edges
    }

    /// First segment.
    pub fn first_segment(&self) -> SegmentIndex {
        self.segments[0]
    }

    /// Last segment.
    pub fn last_segment(&self) -> SegmentIndex {
        self.segments[self.segments.len() - 1]
    }

    /// Edge in the initial slot, if any.
    pub fn initial_edge(&self) -> Option<EdgeIndex> {
        self.edges[0]
    }

    /// Edge in the terminal slot, if any.
    pub fn terminal_edge(&self) -> Option<EdgeIndex> {
        self.edges[self.edges.len() - 1]
    }
}
