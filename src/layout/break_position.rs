//! Break records collected while a container fills.

use crate::breaks::BreakValue;
use crate::layout::column::Column;
use crate::tree::node_context::NodeContext;
use crate::tree::view::block_edge;

/// A recorded opportunity to split the container at a box edge.
///
/// Captures the context at the edge, the effective break value crossed there,
/// and whether the edge was already past the budget when recorded. The block
/// coordinate is measured lazily against the asking column and cached, so
/// recording stays cheap while the view tree is still growing.
#[derive(Debug, Clone)]
pub struct EdgeBreakPosition {
  pub position: NodeContext,
  pub break_on_edge: Option<BreakValue>,
  pub overflows: bool,
  edge: Option<f32>,
}

impl EdgeBreakPosition {
  pub fn new(position: NodeContext, break_on_edge: Option<BreakValue>, overflows: bool) -> Self {
    Self {
      position,
      break_on_edge,
      overflows,
      edge: None,
    }
  }

  /// Re-derives whether this edge still admits a break under the column's
  /// current fill state, returning the context to resume from when it does.
  pub fn find_acceptable_break(&mut self, column: &Column) -> Option<NodeContext> {
    self.update_overflows(column);
    if self.overflows && column.stop_at_overflow() {
      return None;
    }
    Some(self.position.clone())
  }

  fn update_overflows(&mut self, column: &Column) {
    if let Some(edge) = self.measured_edge(column) {
      self.overflows = column.is_overflown(edge);
      self.position.overflow = self.overflows;
    }
  }

  /// Block coordinate of the recorded edge: the trailing edge of the node's
  /// realized subtree for an after position, its leading edge otherwise, plus
  /// the cloned padding/border of the boxes open around it.
  fn measured_edge(&mut self, column: &Column) -> Option<f32> {
    if self.edge.is_none() {
      let view = self.position.view.as_ref()?;
      let mut edge = block_edge(&column.element(), view);
      if !self.position.after {
        edge -= view.subtree_extent();
      }
      edge += column.calculate_cloned_padding_border(&self.position);
      self.edge = Some(edge);
    }
    self.edge
  }
}

/// A surviving break record paired with the context to resume from.
#[derive(Debug, Clone)]
pub struct BreakPositionAndNodeContext {
  pub break_position: EdgeBreakPosition,
  pub node_context: NodeContext,
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::rc::Rc;

  use crate::tree::factory::{LayoutContext, ViewFactory};
  use crate::tree::node_context::NodePosition;
  use crate::tree::styled::{StyledHandle, StyledNodeBuilder};

  fn walk_to(factory: &ViewFactory, root: &StyledHandle, name: &str, after: bool) -> NodeContext {
    let mut cursor = Some(
      factory
        .open_at(&NodePosition::before(root))
        .value()
        .unwrap()
        .unwrap(),
    );
    while let Some(context) = cursor {
      if context.source.name() == name && context.after == after {
        return context;
      }
      cursor = factory
        .next_in_tree(context, false)
        .value()
        .unwrap()
        .unwrap();
    }
    panic!("no `{name}` position in the flow");
  }

  fn two_box_flow() -> StyledHandle {
    StyledNodeBuilder::element("flow")
      .child(StyledNodeBuilder::element("a").extent(1.0).build())
      .child(StyledNodeBuilder::element("b").extent(2.0).build())
      .build()
  }

  #[test]
  fn test_after_edge_measures_the_realized_subtree() {
    let root = two_box_flow();
    let factory = Rc::new(ViewFactory::new(&root));
    let column = Column::new(&factory.view_root(), factory.clone(), 2.5);

    let a_after = walk_to(&factory, &root, "a", true);
    let mut fitting = EdgeBreakPosition::new(a_after, None, false);
    let resumed = fitting.find_acceptable_break(&column);
    assert!(resumed.is_some());
    assert!(!fitting.overflows);
    assert!(!resumed.unwrap().overflow);

    let b_after = walk_to(&factory, &root, "b", true);
    let mut overflowing = EdgeBreakPosition::new(b_after, None, false);
    assert!(overflowing.find_acceptable_break(&column).is_none());
    assert!(overflowing.overflows);
  }

  #[test]
  fn test_before_edge_excludes_the_box_itself() {
    let root = two_box_flow();
    let factory = Rc::new(ViewFactory::new(&root));
    let column = Column::new(&factory.view_root(), factory.clone(), 2.5);

    let b_before = walk_to(&factory, &root, "b", false);
    let mut record = EdgeBreakPosition::new(b_before, None, false);
    assert!(record.find_acceptable_break(&column).is_some());
    assert!(!record.overflows);
  }

  #[test]
  fn test_tolerant_column_accepts_an_overflowing_edge_and_flags_it() {
    let root = two_box_flow();
    let factory = Rc::new(ViewFactory::new(&root));
    let column =
      Column::new(&factory.view_root(), factory.clone(), 2.5).with_stop_at_overflow(false);

    let b_after = walk_to(&factory, &root, "b", true);
    let mut record = EdgeBreakPosition::new(b_after, None, false);
    let resumed = record.find_acceptable_break(&column);
    assert!(record.overflows);
    assert!(resumed.unwrap().overflow);
  }

  #[test]
  fn test_cloned_padding_border_pushes_the_edge_out() {
    let root = StyledNodeBuilder::element("flow")
      .cloned_padding_border(0.5)
      .child(StyledNodeBuilder::element("a").extent(1.0).build())
      .build();
    let factory = Rc::new(ViewFactory::new(&root));

    let tight = Column::new(&factory.view_root(), factory.clone(), 1.2);
    let a_after = walk_to(&factory, &root, "a", true);
    let mut record = EdgeBreakPosition::new(a_after.clone(), None, false);
    assert!(record.find_acceptable_break(&tight).is_none());

    let roomy = Column::new(&factory.view_root(), factory.clone(), 1.6);
    let mut record = EdgeBreakPosition::new(a_after, None, false);
    assert!(record.find_acceptable_break(&roomy).is_some());
  }
}
