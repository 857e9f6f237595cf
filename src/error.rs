//! Configuration error types.
//!
//! Every error here is raised while a network is assembled or relinked.
//! Nothing in the substep loop returns an error.

use thiserror::Error;

/// Which side of a routing edge a connection concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeSide {
    /// The storage feeding the edge.
    Upstream,
    /// The storage receiving from the edge.
    Downstream,
}

impl std::fmt::Display for EdgeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Downstream => write!(f, "downstream"),
        }
    }
}

/// Invalid cross-section geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrossSectionError {
    /// Geometry without any trapeze or table entry.
    #[error("cross section has no geometry entries")]
    Empty,

    /// Trapeze and table vectors have different lengths.
    #[error("cross section table lengths differ: {0} vs {1}")]
    LengthMismatch(usize, usize),

    /// Negative side slope.
    #[error("side slope of entry {index} is negative ({value})")]
    NegativeSlope { index: usize, value: f64 },

    /// Negative width.
    #[error("width of entry {index} is negative ({value})")]
    NegativeWidth { index: usize, value: f64 },

    /// Every entry has zero width and slope.
    #[error("cross section has zero width at every height")]
    ZeroWidth,

    /// Heights are not strictly increasing.
    #[error("height of entry {index} ({value}) does not exceed the previous one")]
    NonIncreasingHeight { index: usize, value: f64 },

    /// The lowest entry must start at the channel bottom.
    #[error("lowest entry starts at height {0}, expected 0")]
    BottomOffset(f64),

    /// NaN or infinite parameter.
    #[error("non-finite value in entry {0}")]
    NonFinite(usize),

    /// Friction parameters out of range.
    #[error("invalid friction: strickler {strickler}, bottom slope {bottom_slope}")]
    InvalidFriction { strickler: f64, bottom_slope: f64 },
}

/// Fatal errors while assembling or relinking a channel network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A channel without any segment.
    #[error("channel `{0}` has no segments")]
    EmptyChannel(String),

    /// Two channels share a name.
    #[error("channel `{0}` is defined more than once")]
    DuplicateChannel(String),

    /// Internal segment slot left empty.
    #[error("channel `{channel}` is missing its segment at position {position}")]
    MissingSegment { channel: String, position: usize },

    /// Internal edge slot left empty.
    #[error("channel `{channel}` is missing its routing edge at position {position}")]
    MissingEdge { channel: String, position: usize },

    /// Edge slot vector does not match the segment count.
    #[error(
        "channel `{channel}` has {edges} edge slots for {segments} segments, \
         expected one more slot than segments"
    )]
    EdgeSlotCount {
        channel: String,
        segments: usize,
        edges: usize,
    },

    /// Junction references a channel that was never configured.
    #[error("junction `{junction}` references unknown channel `{channel}`")]
    UnknownChannel { junction: String, channel: String },

    /// Both channels supply an edge at the junction.
    #[error(
        "junction `{junction}`: both `{upstream}` and `{downstream}` provide a routing edge, \
         the connection is ambiguous"
    )]
    AmbiguousConnection {
        junction: String,
        upstream: String,
        downstream: String,
    },

    /// Neither channel supplies an edge that can connect at the junction.
    #[error(
        "junction `{junction}`: neither `{upstream}` nor `{downstream}` provides a routing edge \
         that can connect them"
    )]
    MissingConnection {
        junction: String,
        upstream: String,
        downstream: String,
    },

    /// The edge kind cannot take a storage on the requested side.
    #[error("channel `{channel}` edge {position} ({kind}) cannot accept a {side} storage")]
    IncompatibleEdge {
        channel: String,
        position: usize,
        kind: &'static str,
        side: EdgeSide,
    },

    /// A second storage tried to bind to an already connected side.
    #[error("channel `{channel}` edge {position} already has a {side} storage")]
    DuplicateConnection {
        channel: String,
        position: usize,
        side: EdgeSide,
    },

    /// A required side stayed unconnected after linking.
    #[error("channel `{channel}` edge {position} ({kind}) has no {side} storage")]
    UnconnectedEdge {
        channel: String,
        position: usize,
        kind: &'static str,
        side: EdgeSide,
    },

    /// Segment parameters out of range.
    #[error("channel `{channel}` segment {position}: {message}")]
    InvalidSegment {
        channel: String,
        position: usize,
        message: String,
    },

    /// Edge parameters out of range.
    #[error("channel `{channel}` edge {position}: {message}")]
    InvalidEdge {
        channel: String,
        position: usize,
        message: String,
    },

    /// Cross-section geometry rejected.
    #[error("channel `{channel}` segment {position}: {source}")]
    InvalidCrossSection {
        channel: String,
        position: usize,
        #[source]
        source: CrossSectionError,
    },

    /// Routing parameters out of range.
    #[error("invalid routing configuration: {0}")]
    InvalidRouting(String),
}

/// Result alias for network assembly.
pub type Result<T> = std::result::Result<T, ConfigError>;
