//! Strongly-typed arena indices.
//!
//! Segments, routing edges and channels live in flat arenas owned by a
//! [`Network`](crate::network::Network). Cross-references between them are
//! stored as these indices, never as pointers, so a network can clear and
//! rebuild its links without lifetime trouble.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Arena index newtype: construction, raw access, ranges, display and
/// indexing of slices and vectors.
macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident, $display_prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Position in the arena.
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }

            /// All indices of an arena of length `n`.
            pub fn iter(n: usize) -> impl ExactSizeIterator<Item = $name> {
                (0..n).map($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($display_prefix, "{}"), self.0)
            }
        }

        impl<T> Index<$name> for [T] {
            type Output = T;
            #[inline]
            fn index(&self, i: $name) -> &T {
                &self[i.0]
            }
        }

        impl<T> IndexMut<$name> for [T] {
            #[inline]
            fn index_mut(&mut self, i: $name) -> &mut T {
                &mut self[i.0]
            }
        }

        impl<T> Index<$name> for Vec<T> {
            type Output = T;
            #[inline]
            fn index(&self, i: $name) -> &T {
                &self.as_slice()[i]
            }
        }

        impl<T> IndexMut<$name> for Vec<T> {
            #[inline]
            fn index_mut(&mut self, i: $name) -> &mut T {
                &mut self.as_mut_slice()[i]
            }
        }
    };
}

define_index!(
    /// Index of a [`Segment`](crate::storage::Segment) in a network arena.
    ///
    /// # Example
    ///
    /// ```
    /// use sw1d::types::SegmentIndex;
    ///
    /// let seg = SegmentIndex::new(3);
    /// assert_eq!(seg.get(), 3);
    /// assert_eq!(seg.to_string(), "S3");
    /// ```
    SegmentIndex,
    "S"
);

define_index!(
    /// Index of a [`RoutingEdge`](crate::routing::RoutingEdge) in a network arena.
    EdgeIndex,
    "Q"
);

define_index!(
    /// Index of a [`ChannelAssembly`](crate::network::ChannelAssembly) in a network.
    ChannelIndex,
    "C"
);
