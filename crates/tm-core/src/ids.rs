//! Strongly typed, zero-cost identifier wrappers.
//!
//! Every graph in the workspace is arena-allocated: nodes and edges live in
//! `Vec`s and refer to each other by index.  The wrappers below make those
//! indices type-safe (`CombNodeId` does not index a grid array) while staying
//! `Copy + Ord + Hash`.  The inner integer is `pub` for direct SoA indexing
//! via `id.0 as usize`, but callers should prefer the `.index()` helpers.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to the type's MAX.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a transit line in the graph's line registry.
    pub struct LineId(u32);
}

typed_id! {
    /// Index of a node in the geographic transit graph.
    pub struct TransitNodeId(u32);
}

typed_id! {
    /// Index of an edge in the geographic transit graph.
    pub struct TransitEdgeId(u32);
}

typed_id! {
    /// Index of a node in the combination graph (degree-2 chains collapsed).
    pub struct CombNodeId(u32);
}

typed_id! {
    /// Index of an edge in the combination graph.
    pub struct CombEdgeId(u32);
}

typed_id! {
    /// Index of a grid node (hub or port) in the octilinear grid graph.
    pub struct GridNodeId(u32);
}

typed_id! {
    /// Index of a directed grid edge (sink, bend, or real edge).
    pub struct GridEdgeId(u32);
}
