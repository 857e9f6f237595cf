//! Strongly-typed domain types for safer APIs.
//!
//! Index newtypes keep segment, edge and channel indices from being mixed up
//! when they are passed around as cross-references.
//!
//! # Example
//!
//! ```
//! use sw1d::types::{EdgeIndex, SegmentIndex};
//!
//! let seg = SegmentIndex::new(0);
//! let edge = EdgeIndex::new(0);
//! assert_eq!(seg.get(), edge.get());
//! ```

mod indices;

pub use indices::{ChannelIndex, EdgeIndex, SegmentIndex};

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f64 = 9.81;
