//! Network assembly from channels and junctions.

use std::collections::{HashMap, HashSet};

use crate::error::{ConfigError, Result};
use crate::routing::RoutingEdge;
use crate::storage::Segment;
use crate::types::{ChannelIndex, EdgeIndex, SegmentIndex};

use super::channel::{ChannelAssembly, ChannelConfig};
use super::{JunctionLinks, Network};

/// A named graph node joining channel ends.
///
/// Every channel in `entering` ends at the node, every channel in
/// `exiting` starts there.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Junction {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub entering: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub exiting: Vec<String>,
}

impl Junction {
    /// Create a junction without channels.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entering: Vec::new(),
            exiting: Vec::new(),
        }
    }

    /// Add a channel ending at this junction.
    pub fn entering(mut self, channel: impl Into<String>) -> Self {
        self.entering.push(channel.into());
        self
    }

    /// Add a channel starting at this junction.
    pub fn exiting(mut self, channel: impl Into<String>) -> Self {
        self.exiting.push(channel.into());
        self
    }

    fn channels(&self) -> impl Iterator<Item = &String> {
        self.entering.iter().chain(self.exiting.iter())
    }
}

/// Collects channel and junction configurations and assembles networks.
///
/// # Example
///
/// ```
/// use sw1d::cross_section::CrossSection;
/// use sw1d::network::{ChannelConfig, Junction, NetworkBuilder};
/// use sw1d::routing::{BoundaryConfig, CentralConfig, EdgeConfig, WeirConfig};
/// use sw1d::storage::SegmentConfig;
///
/// let xs = CrossSection::rectangle(0.0, 10.0).unwrap();
/// let segment = SegmentConfig::new(1.0, xs).with_water_depth(1.0);
///
/// let upper = ChannelConfig::new("upper")
///     .edge(EdgeConfig::Inflow(BoundaryConfig::new(2.0)))
///     .segment(segment.clone())
///     .edge(EdgeConfig::Central(CentralConfig::default()));
/// let lower = ChannelConfig::new("lower")
///     .segment(segment)
///     .edge(EdgeConfig::Weir(WeirConfig::new(0.8, 10.0, 0.6)));
///
/// let network = NetworkBuilder::new()
///     .channel(upper)
///     .channel(lower)
///     .junction(Junction::new("j").entering("upper").exiting("lower"))
///     .build()
///     .unwrap();
///
/// assert_eq!(network.n_segments(), 2);
/// assert_eq!(network.n_edges(), 3);
/// ```
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkBuilder {
    channels: Vec<ChannelConfig>,
    junctions: Vec<Junction>,
}

impl NetworkBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel.
    pub fn channel(mut self, channel: ChannelConfig) -> Self {
        self.channels.push(channel);
        self
    }

    /// Add a junction.
    pub fn junction(mut self, junction: Junction) -> Self {
        self.junctions.push(junction);
        self
    }

    /// Add a channel in place.
    pub fn add_channel(&mut self, channel: ChannelConfig) {
        self.channels.push(channel);
    }

    /// Add a junction in place.
    pub fn add_junction(&mut self, junction: Junction) {
        self.junctions.push(junction);
    }

    /// Configured channels.
    pub fn channels(&self) -> &[ChannelConfig] {
        &self.channels
    }

    /// Configured junctions.
    pub fn junctions(&self) -> &[Junction] {
        &self.junctions
    }

    /// Validate everything and assemble a single linked network.
    pub fn build(&self) -> Result<Network> {
        let lookup = self.validate()?;

        let mut segments = Vec::new();
        let mut edges = Vec::new();
        let mut channels = Vec::with_capacity(self.channels.len());
        let mut segment_origin = Vec::new();
        let mut edge_origin = Vec::new();

        for (c, config) in self.channels.iter().enumerate() {
            let channel = ChannelIndex::new(c);
            let mut assembly = ChannelAssembly {
                name: config.name.clone(),
                segments: Vec::with_capacity(config.segments.len()),
                edges: Vec::with_capacity(config.edges.len()),
            };
            for (position, slot) in config.segments.iter().enumerate() {
                // Filled slots were checked in `validate`
                if let Some(segment) = slot {
                    assembly.segments.push(SegmentIndex::new(segments.len()));
                    segments.push(Segment::new(segment.clone()));
                    segment_origin.push((channel, position));
                }
            }
            for (position, slot) in config.edges.iter().enumerate() {
                let index = slot.as_ref().map(|edge| {
                    let index = EdgeIndex::new(edges.len());
                    edges.push(RoutingEdge::new(edge.clone()));
                    edge_origin.push((channel, position));
                    index
                });
                assembly.edges.push(index);
            }
            channels.push(assembly);
        }

        let junctions = self
            .junctions
            .iter()
            .map(|j| JunctionLinks {
                name: j.name.clone(),
                entering: j.entering.iter().map(|n| lookup[n.as_str()]).collect(),
                exiting: j.exiting.iter().map(|n| lookup[n.as_str()]).collect(),
            })
            .collect();

        let mut network = Network {
            segments,
            edges,
            channels,
            junctions,
            segment_origin,
            edge_origin,
        };
        network.connect()?;

        log::info!(
            "Assembled network: {} channels, {} segments, {} routing edges, {} junctions",
            network.channels.len(),
            network.segments.len(),
            network.edges.len(),
            network.junctions.len()
        );
        Ok(network)
    }

    /// Split into independently simulated networks.
    ///
    /// Channels end up in the same network exactly when a chain of junctions
    /// joins them. Networks are ordered by their first channel.
    pub fn build_components(&self) -> Result<Vec<Network>> {
        let lookup = self.validate()?;

        let n = self.channels.len();
        let mut parent: Vec<usize> = (0..n).collect();
        for junction in &self.junctions {
            let mut members = junction.channels().map(|name| lookup[name.as_str()].get());
            if let Some(first) = members.next() {
                for other in members {
                    union(&mut parent, first, other);
                }
            }
        }

        let mut roots: Vec<usize> = Vec::new();
        let mut groups: HashMap<usize, NetworkBuilder> = HashMap::new();
        for (c, channel) in self.channels.iter().enumerate() {
            let root = find(&mut parent, c);
            if !groups.contains_key(&root) {
                roots.push(root);
            }
            groups.entry(root).or_default().add_channel(channel.clone());
        }
        for junction in &self.junctions {
            if let Some(name) = junction.channels().next() {
                let root = find(&mut parent, lookup[name.as_str()].get());
                if let Some(group) = groups.get_mut(&root) {
                    group.add_junction(junction.clone());
                }
            }
        }

        let networks = roots
            .iter()
            .filter_map(|root| groups.remove(root))
            .map(|group| group.build())
            .collect::<Result<Vec<_>>>()?;

        log::info!("Split {} channels into {} networks", n, networks.len());
        Ok(networks)
    }

    /// Check names and every channel; return the name lookup.
    fn validate(&self) -> Result<HashMap<&str, ChannelIndex>> {
        let mut lookup = HashMap::with_capacity(self.channels.len());
        for (c, channel) in self.channels.iter().enumerate() {
            channel.validate()?;
            if lookup.insert(channel.name.as_str(), ChannelIndex::new(c)).is_some() {
                return Err(ConfigError::DuplicateChannel(channel.name.clone()));
            }
        }
        let mut seen = HashSet::new();
        for junction in &self.junctions {
            for name in junction.channels() {
                if !lookup.contains_key(name.as_str()) {
                    return Err(ConfigError::UnknownChannel {
                        junction: junction.name.clone(),
                        channel: name.clone(),
                    });
                }
            }
            if !seen.insert(junction.name.as_str()) {
                return Err(ConfigError::InvalidRouting(format!(
                    "junction `{}` is defined more than once",
                    junction.name
                )));
            }
        }
        Ok(lookup)
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross_section::CrossSection;
    use crate::routing::{BoundaryConfig, CentralConfig, EdgeConfig, WeirConfig};
    use crate::storage::SegmentConfig;

    fn segment() -> SegmentConfig {
        SegmentConfig::new(1.0, CrossSection::rectangle(0.0, 5.0).unwrap()).with_water_depth(1.0)
    }

    fn reach(name: &str) -> ChannelConfig {
        ChannelConfig::new(name)
            .edge(EdgeConfig::Inflow(BoundaryConfig::new(1.0)))
            .segment(segment())
            .edge(EdgeConfig::Outflow(BoundaryConfig::new(1.0)))
    }

    #[test]
    fn test_duplicate_channel() {
        let result = NetworkBuilder::new().channel(reach("a")).channel(reach("a")).build();
        assert_eq!(result.err(), Some(ConfigError::DuplicateChannel("a".into())));
    }

    #[test]
    fn test_unknown_channel() {
        let result = NetworkBuilder::new()
            .channel(reach("a"))
            .junction(Junction::new("j").entering("a").exiting("b"))
            .build();
        assert!(matches!(result, Err(ConfigError::UnknownChannel { .. })));
    }

    #[test]
    fn test_components_split() {
        let open_end = |name: &str| {
            ChannelConfig::new(name)
                .edge(EdgeConfig::Inflow(BoundaryConfig::new(1.0)))
                .segment(segment())
                .edge(EdgeConfig::Central(CentralConfig::default()))
        };
        let tail = |name: &str| {
            ChannelConfig::new(name)
                .segment(segment())
                .edge(EdgeConfig::Weir(WeirConfig::new(0.5, 5.0, 0.6)))
        };
        let builder = NetworkBuilder::new()
            .channel(open_end("a1"))
            .channel(reach("lonely"))
            .channel(tail("a2"))
            .junction(Junction::new("ja").entering("a1").exiting("a2"));

        let networks = builder.build_components().unwrap();
        assert_eq!(networks.len(), 2);
        assert_eq!(networks[0].channels().len(), 2);
        assert_eq!(networks[0].channels()[0].name(), "a1");
        assert_eq!(networks[0].channels()[1].name(), "a2");
        assert_eq!(networks[1].channels()[0].name(), "lonely");
    }

    #[test]
    fn test_union_find() {
        let mut parent: Vec<usize> = (0..5).collect();
        union(&mut parent, 3, 4);
        union(&mut parent, 4, 1);
        assert_eq!(find(&mut parent, 3), find(&mut parent, 1));
        assert_ne!(find(&mut parent, 0), find(&mut parent, 1));
    }
}
