//! Isolated layout of a nested flow inside an already-open container.
//!
//! A [`PseudoColumn`] wraps a shadow [`Column`] whose view tree and break
//! records are private to the nested flow. The parent container's budget and
//! constraints carry over; the parent's own fill state is never touched. The
//! shadow never stops at overflow, so its records stay usable even when the
//! nested content runs past the budget.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::layout::break_position::{BreakPositionAndNodeContext, EdgeBreakPosition};
use crate::layout::column::Column;
use crate::task::TaskResult;
use crate::tree::factory::LayoutContext;
use crate::tree::node_context::{is_same_node_position, ChunkPosition, NodeContext};
use crate::tree::styled::StyledHandle;
use crate::tree::view::ViewHandle;

/// Shadow container for one nested flow.
#[derive(Debug)]
pub struct PseudoColumn {
  column: Column,
  start_node_contexts: Rc<RefCell<Vec<NodeContext>>>,
}

impl PseudoColumn {
  /// Builds the shadow container for the flow rooted at `flow_root`,
  /// nested at `parent_context` inside `parent`.
  pub fn new(parent: &Column, flow_root: &StyledHandle, parent_context: &NodeContext) -> Self {
    let layout_context = parent.layout_context().clone_context(flow_root);
    let element = layout_context.view_root();
    let column = parent.derive_shadow(&element, layout_context, parent_context);
    let start_node_contexts: Rc<RefCell<Vec<NodeContext>>> = Rc::new(RefCell::new(Vec::new()));
    let starts = Rc::clone(&start_node_contexts);
    column.set_open_observer(Box::new(move |context| {
      starts.borrow_mut().push(context.clone());
    }));
    Self {
      column,
      start_node_contexts,
    }
  }

  /// Fills the shadow container from `chunk`; see [`Column::layout`].
  pub fn layout(
    &self,
    chunk: &ChunkPosition,
    leading_edge: bool,
  ) -> TaskResult<Result<Option<ChunkPosition>>> {
    self.column.layout(chunk, leading_edge)
  }

  /// Best break recorded in the shadow. With `allow_break_at_start_position`
  /// the position the fill started from counts as a break of last resort:
  /// it is returned when the shadow recorded nothing better.
  pub fn find_acceptable_break_position(
    &self,
    allow_break_at_start_position: bool,
  ) -> Option<BreakPositionAndNodeContext> {
    let found = self.column.find_acceptable_break_position();
    if allow_break_at_start_position {
      if let Some(start) = self.start_node_contexts.borrow().first().cloned() {
        let mut break_position = EdgeBreakPosition::new(start.clone(), None, start.overflow);
        break_position.find_acceptable_break(&self.column);
        if found.is_none() {
          return Some(BreakPositionAndNodeContext {
            break_position,
            node_context: start,
          });
        }
      }
    }
    found
  }

  /// See [`Column::finish_break`].
  pub fn finish_break(
    &self,
    position: &NodeContext,
    force_remove_self: bool,
    end_of_column: bool,
  ) -> TaskResult<Result<()>> {
    self.column.finish_break(position, force_remove_self, end_of_column)
  }

  pub fn do_finish_break_of_fragment_layout_constraints(
    &self,
    position_after: Option<&NodeContext>,
  ) {
    self
      .column
      .do_finish_break_of_fragment_layout_constraints(position_after);
  }

  /// Whether `context` is the position the first fill started from.
  pub fn is_start_node_context(&self, context: &NodeContext) -> bool {
    let starts = self.start_node_contexts.borrow();
    let Some(start) = starts.first() else {
      return false;
    };
    let same_view = match (&start.view, &context.view) {
      (Some(a), Some(b)) => Rc::ptr_eq(a, b),
      (None, None) => true,
      _ => false,
    };
    same_view && start.after == context.after && start.offset_in_node == context.offset_in_node
  }

  /// Whether `context` sits at the edge the shadow's most recent fit test
  /// measured.
  pub fn is_last_after_node_context(&self, context: &NodeContext) -> bool {
    match self.column.last_after_position() {
      Some(last) => is_same_node_position(&context.to_node_position(), &last),
      None => false,
    }
  }

  /// Root of the shadow's view tree.
  pub fn column_element(&self) -> ViewHandle {
    self.column.element()
  }

  pub fn column(&self) -> &Column {
    &self.column
  }
}
