//! Element handles.
//!
//! Vertices, half-edges and faces are addressed through distinct `u32`
//! newtypes, so a face handle can never be passed where a vertex is expected.
//! `u32::MAX` is the null handle used for unset links.

use std::fmt;

const NULL: u32 = u32::MAX;

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Handle for the element at `offset` in its buffer.
            #[inline]
            pub fn new(offset: usize) -> Self {
                debug_assert!(offset < NULL as usize, "{} offset {} too large", $tag, offset);
                Self(offset as u32)
            }

            /// The null handle.
            #[inline]
            pub fn invalid() -> Self {
                Self(NULL)
            }

            /// Buffer offset.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// False for the null handle.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != NULL
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self(NULL)
            }
        }

        impl From<usize> for $name {
            fn from(offset: usize) -> Self {
                Self::new(offset)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.is_valid() {
                    true => write!(f, "{}{}", $tag, self.0),
                    false => write!(f, "{}-", $tag),
                }
            }
        }
    };
}

element_id!(
    /// Handle of a mesh vertex.
    VertexId,
    "v"
);
element_id!(
    /// Handle of a directed half-edge.
    HalfEdgeId,
    "h"
);
element_id!(
    /// Handle of a triangle.
    FaceId,
    "f"
);
