//! Tree structures for flowed content
//!
//! This module contains the two trees the fragmentation engine works with:
//! - **Styled tree**: immutable, already-cascaded source nodes (input)
//! - **View tree**: the mutable mirror realized lazily during layout (output)
//!
//! # Architecture
//!
//! ```text
//! Styled tree → ViewFactory → View tree → break decisions → truncated view tree
//! ```
//!
//! The styled tree says what could be laid out; the view tree records what a
//! container actually realized. Break decisions mutate only the view tree.

// Module declarations
pub mod factory;
pub mod node_context;
pub mod styled;
pub mod view;

// Re-exports from styled
pub use styled::{
  can_ignore, Display, NodeStyle, StyledData, StyledHandle, StyledNode, StyledNodeBuilder,
  WhiteSpace,
};

// Re-exports from view
pub use view::{block_edge, truncate_after, ViewHandle, ViewNode};

// Re-exports from node_context
pub use node_context::{is_same_node_position, ChunkPosition, NodeContext, NodePosition};

// Re-exports from factory
pub use factory::{LayoutContext, ViewFactory};
