pub mod breaks;
pub mod error;
pub mod layout;
pub mod task;
pub mod tree;

pub use breaks::{BreakValue, ForcedBreakKind};
pub use error::{Error, LayoutError, Result};
pub use layout::break_position::{BreakPositionAndNodeContext, EdgeBreakPosition};
pub use layout::column::Column;
pub use layout::constraint::LayoutConstraint;
pub use layout::edge_skipper::{BoxEdgeHooks, EdgeSkipper};
pub use layout::formatting_context::{BlockFormattingContext, FormattingContext};
pub use layout::iterator::{
  LayoutIterator, LayoutIteratorState, LayoutStrategy, NodeEvent, NodeEventKind, StateHandle,
};
pub use layout::pseudo_column::PseudoColumn;
pub use task::{Frame, TaskResult};
pub use tree::factory::{LayoutContext, ViewFactory};
pub use tree::node_context::{is_same_node_position, ChunkPosition, NodeContext, NodePosition};
pub use tree::styled::{
  can_ignore, Display, NodeStyle, StyledData, StyledHandle, StyledNode, StyledNodeBuilder,
  WhiteSpace,
};
pub use tree::view::{block_edge, ViewHandle, ViewNode};
