//! Representation of the two graphs that get aligned
//! as well as the colour type used to tell their
//! vertices apart.
use custom_debug_derive::Debug;

mod internal_graph;
pub use internal_graph::Graph;

/// Dense zero-based vertex index after offset normalization.
pub type VertexIndex = usize;
/// Structural discriminator of a vertex.
pub type Colour = u64;

/// A vertex index that does not exist in a graph of the given size.
#[derive(Debug, PartialEq, Eq)]
pub struct GraphError(pub i64);
