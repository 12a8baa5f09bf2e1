//! Positions within a flow.
//!
//! [`NodeContext`] is the engine's working record: a node, which of its edges
//! is being crossed, and the layout state accumulated at that point. Contexts
//! are plain values; snapshots are taken with `clone`, stored snapshots are
//! never mutated, and the live context of an iterator run is replaced
//! wholesale when an operation needs to rewrite it.
//!
//! [`NodePosition`] is the durable form: anchored to the immutable styled
//! tree, it survives view-tree truncation and is what containers accept and
//! return as resumable positions.

use std::rc::Rc;

use crate::breaks::BreakValue;
use crate::layout::formatting_context::FormattingContext;
use crate::tree::styled::{can_ignore, StyledData, StyledHandle, WhiteSpace};
use crate::tree::view::ViewHandle;

/// A position in the flow plus the layout state accumulated there.
#[derive(Debug, Clone)]
pub struct NodeContext {
  /// Source node this context points at.
  pub source: StyledHandle,
  /// Realized view node, when the position has one.
  pub view: Option<ViewHandle>,
  /// True when the context represents the node's trailing edge.
  pub after: bool,
  /// Offset within the node; 0 for element edges.
  pub offset_in_node: usize,
  /// True for inline-level positions.
  pub inline: bool,
  /// Whitespace policy governing this position.
  pub whitespace: WhiteSpace,
  /// Computed `break-before` of the node.
  pub break_before: Option<BreakValue>,
  /// Computed `break-after` of the node.
  pub break_after: Option<BreakValue>,
  /// Set when the content up to this position does not fit its container.
  pub overflow: bool,
  /// Formatting context governing this position.
  pub formatting_context: Rc<dyn FormattingContext>,
}

impl NodeContext {
  /// True for element nodes.
  pub fn is_element(&self) -> bool {
    self.source.is_element()
  }

  /// True when the node is a text run the whitespace policy allows skipping.
  pub fn can_ignore(&self) -> bool {
    match &self.source.data {
      StyledData::Element { .. } => false,
      StyledData::Text { text } | StyledData::Comment { text } => {
        can_ignore(text, self.whitespace)
      }
    }
  }

  /// The durable position this context stands at.
  pub fn to_node_position(&self) -> NodePosition {
    NodePosition {
      node: Rc::clone(&self.source),
      after: self.after,
      offset_in_node: self.offset_in_node,
    }
  }
}

/// A resumable position anchored to the immutable styled tree.
#[derive(Debug, Clone)]
pub struct NodePosition {
  /// The node the position is anchored to.
  pub node: StyledHandle,
  /// True for the node's trailing edge.
  pub after: bool,
  /// Offset within the node; 0 for element edges.
  pub offset_in_node: usize,
}

impl NodePosition {
  /// Position at the leading edge of `node`.
  pub fn before(node: &StyledHandle) -> Self {
    Self {
      node: Rc::clone(node),
      after: false,
      offset_in_node: 0,
    }
  }

  /// Position at the trailing edge of `node`.
  pub fn after(node: &StyledHandle) -> Self {
    Self {
      node: Rc::clone(node),
      after: true,
      offset_in_node: 0,
    }
  }
}

/// True when both positions name the same edge of the same node.
pub fn is_same_node_position(a: &NodePosition, b: &NodePosition) -> bool {
  Rc::ptr_eq(&a.node, &b.node) && a.after == b.after && a.offset_in_node == b.offset_in_node
}

/// Starting position of one layout chunk.
#[derive(Debug, Clone)]
pub struct ChunkPosition {
  /// Position of the primary flow.
  pub primary: NodePosition,
}

impl ChunkPosition {
  pub fn new(primary: NodePosition) -> Self {
    Self { primary }
  }

  /// Chunk starting at the leading edge of the flow root.
  pub fn at_flow_start(root: &StyledHandle) -> Self {
    Self::new(NodePosition::before(root))
  }
}
