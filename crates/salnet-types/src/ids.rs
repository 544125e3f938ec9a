//! Type-safe identifier wrappers around plain integers.
//!
//! Every entity in the simulation has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. Fish and redd IDs are
//! sequential handles allocated by the model and never reused. Reach IDs
//! index the stream network's reach arena and are stable once the network
//! is built (reaches are never removed).

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around an integer with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wrap a raw value as an identifier.
            pub const fn from_raw(raw: $inner) -> Self {
                Self(raw)
            }

            /// Return the raw inner value.
            pub const fn raw(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a fish, allocated sequentially by the model.
    FishId(u64)
}

define_id! {
    /// Unique identifier for a redd (egg nest), allocated sequentially by
    /// the model.
    ReddId(u64)
}

define_id! {
    /// Index of a reach in the stream network's reach arena.
    ReachId(usize)
}
