//! One container's worth of layout state and the block-flow driver.
//!
//! A [`Column`] is a fixed-extent container being filled from a flow. It owns
//! the fill state the fragmentation machinery mutates: recorded break
//! opportunities, the kind of a forced break that stopped the run, the
//! identity of the last fully exited box, and the registered layout
//! constraints. Geometry is reduced to a single block-axis budget
//! (`block_limit`); an edge fits while it does not measure strictly past it.
//!
//! [`Column::layout`] drives the flow through the container with the
//! edge-skipping strategy: forced breaks first, then constraints, then the
//! size fit, at every box start edge and once more at the trailing edge when
//! the flow runs out.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use crate::breaks::{BreakValue, ForcedBreakKind};
use crate::error::Result;
use crate::layout::break_position::{BreakPositionAndNodeContext, EdgeBreakPosition};
use crate::layout::constraint::LayoutConstraint;
use crate::layout::edge_skipper::{
  process_forced_break, process_layout_constraint, save_edge_and_process_overflow, BoxEdgeHooks,
  EdgeSkipper,
};
use crate::layout::formatting_context::{BlockFormattingContext, FormattingContext};
use crate::layout::iterator::{LayoutIterator, NodeEvent, StateHandle};
use crate::task::TaskResult;
use crate::tree::factory::LayoutContext;
use crate::tree::node_context::{is_same_node_position, ChunkPosition, NodeContext, NodePosition};
use crate::tree::view::{block_edge, truncate_after, ViewHandle};

struct ColumnCore {
  element: ViewHandle,
  layout_context: Rc<dyn LayoutContext>,
  block_limit: Cell<f32>,
  stop_at_overflow: Cell<bool>,
  break_positions: RefCell<Vec<EdgeBreakPosition>>,
  forced_break_kind: Cell<Option<ForcedBreakKind>>,
  last_after_position: RefCell<Option<NodePosition>>,
  layout_constraints: RefCell<Vec<Rc<dyn LayoutConstraint>>>,
  flow_root_formatting_context: RefCell<Rc<dyn FormattingContext>>,
  open_observer: RefCell<Option<Box<dyn Fn(&NodeContext)>>>,
}

/// A fixed-extent container being filled from a flow.
///
/// Handles are cheap to clone and share one container.
#[derive(Clone)]
pub struct Column {
  core: Rc<ColumnCore>,
}

impl fmt::Debug for Column {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Column")
      .field("block_limit", &self.core.block_limit.get())
      .field("stop_at_overflow", &self.core.stop_at_overflow.get())
      .field("break_positions", &self.core.break_positions.borrow().len())
      .field("forced_break_kind", &self.core.forced_break_kind.get())
      .finish_non_exhaustive()
  }
}

impl Column {
  /// A container rooted at `element`, realizing views through
  /// `layout_context`, overflowing strictly past `block_limit`.
  pub fn new(
    element: &ViewHandle,
    layout_context: Rc<dyn LayoutContext>,
    block_limit: f32,
  ) -> Self {
    Self {
      core: Rc::new(ColumnCore {
        element: Rc::clone(element),
        layout_context,
        block_limit: Cell::new(block_limit),
        stop_at_overflow: Cell::new(true),
        break_positions: RefCell::new(Vec::new()),
        forced_break_kind: Cell::new(None),
        last_after_position: RefCell::new(None),
        layout_constraints: RefCell::new(Vec::new()),
        flow_root_formatting_context: RefCell::new(Rc::new(BlockFormattingContext)),
        open_observer: RefCell::new(None),
      }),
    }
  }

  /// A container that tolerates overflow keeps filling past the budget and
  /// keeps reporting overflowing edges as acceptable breaks.
  pub fn with_stop_at_overflow(self, stop: bool) -> Self {
    self.core.stop_at_overflow.set(stop);
    self
  }

  pub fn add_layout_constraint(&self, constraint: Rc<dyn LayoutConstraint>) {
    self.core.layout_constraints.borrow_mut().push(constraint);
  }

  pub fn set_flow_root_formatting_context(&self, formatting_context: Rc<dyn FormattingContext>) {
    *self.core.flow_root_formatting_context.borrow_mut() = formatting_context;
  }

  pub fn flow_root_formatting_context(&self) -> Rc<dyn FormattingContext> {
    Rc::clone(&self.core.flow_root_formatting_context.borrow())
  }

  pub(crate) fn set_open_observer(&self, observer: Box<dyn Fn(&NodeContext)>) {
    *self.core.open_observer.borrow_mut() = Some(observer);
  }

  /// Root of this container's view tree.
  pub fn element(&self) -> ViewHandle {
    Rc::clone(&self.core.element)
  }

  pub fn layout_context(&self) -> Rc<dyn LayoutContext> {
    Rc::clone(&self.core.layout_context)
  }

  pub fn block_limit(&self) -> f32 {
    self.core.block_limit.get()
  }

  pub fn stop_at_overflow(&self) -> bool {
    self.core.stop_at_overflow.get()
  }

  /// Strictly past the budget; content ending exactly at the limit fits.
  pub fn is_overflown(&self, edge: f32) -> bool {
    edge > self.core.block_limit.get()
  }

  /// Kind of the forced break that stopped the last run, if one did.
  pub fn forced_break_kind(&self) -> Option<ForcedBreakKind> {
    self.core.forced_break_kind.get()
  }

  pub(crate) fn set_forced_break_kind(&self, kind: Option<ForcedBreakKind>) {
    self.core.forced_break_kind.set(kind);
  }

  /// Identity of the box edge checked by the most recent fit test.
  pub fn last_after_position(&self) -> Option<NodePosition> {
    self.core.last_after_position.borrow().clone()
  }

  /// Snapshot of the break records accumulated so far, oldest first.
  pub fn break_positions(&self) -> Vec<EdgeBreakPosition> {
    self.core.break_positions.borrow().clone()
  }

  /// Total cloned padding/border contributed by `context`'s box and the boxes
  /// open around it, up to this container's flow root.
  pub fn calculate_cloned_padding_border(&self, context: &NodeContext) -> f32 {
    let root = &self.core.element.source;
    let mut total = 0.0;
    let mut cursor = Some(Rc::clone(&context.source));
    while let Some(node) = cursor {
      total += node.style.cloned_padding_border;
      if Rc::ptr_eq(&node, root) {
        break;
      }
      cursor = node.parent();
    }
    total
  }

  /// Realizes the view path down to `position`, notifying the open observer.
  pub fn open_all_views(&self, position: &NodePosition) -> TaskResult<Result<NodeContext>> {
    let column = self.clone();
    self
      .core
      .layout_context
      .open_at(position)
      .then_async(move |opened| {
        if let Ok(context) = &opened {
          if let Some(observer) = &*column.core.open_observer.borrow() {
            observer(context);
          }
        }
        TaskResult::ready(opened)
      })
  }

  /// Fills the container from `chunk` until the flow hits a forced break,
  /// violates a constraint, runs out of budget, or runs out entirely.
  ///
  /// Resolves with the position to resume the flow from, or `None` when
  /// everything was placed and fits. `leading_edge` marks a run starting at
  /// the very beginning of a fresh container, where pending forced break
  /// values must not fire again.
  pub fn layout(
    &self,
    chunk: &ChunkPosition,
    leading_edge: bool,
  ) -> TaskResult<Result<Option<ChunkPosition>>> {
    debug!(
      target: "pageflow",
      "column layout from `{}` (limit {})",
      chunk.primary.node.name(),
      self.block_limit()
    );
    let column = self.clone();
    self.open_all_views(&chunk.primary).then_async(move |opened| {
      let initial = match opened {
        Ok(context) => context,
        Err(error) => return TaskResult::ready(Err(error)),
      };
      let hooks = BlockFlowHooks {
        column: column.clone(),
      };
      let iterator = LayoutIterator::new(
        Rc::new(EdgeSkipper::new(hooks, leading_edge)),
        column.layout_context(),
      );
      iterator.iterate(initial).then_async(|stopped| {
        TaskResult::ready(stopped.map(|context| {
          context.map(|context| ChunkPosition::new(context.to_node_position()))
        }))
      })
    })
  }

  /// Fit test against the budget for the content placed up to `position`,
  /// recording a reusable break record as a side effect.
  ///
  /// Positions without a view, or whose view was already detached from this
  /// container, test as fitting and record nothing. A test repeated at the
  /// same node position keeps the first record. Records are kept when the
  /// edge fits or `save_even_overflowed` is set. Returns whether the edge
  /// overflows, honoring `stop_at_overflow`.
  pub fn check_overflow_and_save_edge_and_break_position(
    &self,
    position: Option<&NodeContext>,
    save_even_overflowed: bool,
    break_at_edge: Option<BreakValue>,
  ) -> bool {
    let Some(position) = position else {
      return false;
    };
    let Some(view) = position.view.as_ref() else {
      return false;
    };
    if view.is_orphan(&self.core.element) {
      return false;
    }

    let mut edge = block_edge(&self.core.element, view);
    if !position.after {
      edge -= view.subtree_extent();
    }
    edge += self.calculate_cloned_padding_border(position);
    let overflown = self.is_overflown(edge);

    let node_position = position.to_node_position();
    let repeated = self
      .core
      .break_positions
      .borrow()
      .last()
      .is_some_and(|record| {
        is_same_node_position(&record.position.to_node_position(), &node_position)
      });
    if (save_even_overflowed || !overflown) && !repeated {
      trace!(
        target: "pageflow",
        "record edge `{}` at {} (overflows: {})",
        position.source.name(),
        edge,
        overflown
      );
      self.core.break_positions.borrow_mut().push(
        EdgeBreakPosition::new(position.clone(), break_at_edge, overflown),
      );
    }
    *self.core.last_after_position.borrow_mut() = Some(node_position);

    overflown && self.stop_at_overflow()
  }

  /// Best break recorded so far under the current fill state, newest record
  /// first. Idempotent between layout calls.
  pub fn find_acceptable_break_position(&self) -> Option<BreakPositionAndNodeContext> {
    let mut records = self.core.break_positions.borrow_mut();
    for record in records.iter_mut().rev() {
      if let Some(node_context) = record.find_acceptable_break(self) {
        debug!(
          target: "pageflow",
          "acceptable break at `{}` (after: {})",
          node_context.source.name(),
          node_context.after
        );
        return Some(BreakPositionAndNodeContext {
          break_position: record.clone(),
          node_context,
        });
      }
    }
    None
  }

  /// Commits a break at `position`: every view realized after it is removed
  /// from this container. The position's own view is removed too when
  /// breaking before an element, or unconditionally with `force_remove_self`.
  /// `end_of_column` marks a break that seals the container rather than an
  /// inner float area; the view-side truncation is the same either way.
  pub fn finish_break(
    &self,
    position: &NodeContext,
    force_remove_self: bool,
    end_of_column: bool,
  ) -> TaskResult<Result<()>> {
    let remove_self =
      force_remove_self || (position.view.is_some() && position.is_element() && !position.after);
    if let Some(view) = &position.view {
      truncate_after(view, remove_self);
    }
    debug!(
      target: "pageflow",
      "break committed at `{}` (remove_self: {}, end_of_column: {})",
      position.source.name(),
      remove_self,
      end_of_column
    );
    TaskResult::ready(Ok(()))
  }

  /// Notifies every registered constraint that the fragment is final.
  pub fn do_finish_break_of_fragment_layout_constraints(
    &self,
    position_after: Option<&NodeContext>,
  ) {
    let constraints = self.core.layout_constraints.borrow().clone();
    for constraint in &constraints {
      constraint.finish_break(position_after);
    }
  }

  /// Shadow container for laying out a nested flow: budget and constraints
  /// carried over, mutable break-tracking state fresh. The budget shrinks by
  /// the cloned padding/border of the boxes open around `parent_context`, and
  /// the shadow never stops at overflow.
  pub(crate) fn derive_shadow(
    &self,
    element: &ViewHandle,
    layout_context: Rc<dyn LayoutContext>,
    parent_context: &NodeContext,
  ) -> Column {
    let parent_cloned = self.calculate_cloned_padding_border(parent_context);
    let shadow = Column::new(element, layout_context, self.block_limit() - parent_cloned)
      .with_stop_at_overflow(false);
    *shadow.core.layout_constraints.borrow_mut() =
      self.core.layout_constraints.borrow().clone();
    shadow.set_flow_root_formatting_context(Rc::clone(&parent_context.formatting_context));
    debug!(
      target: "pageflow",
      "shadow container, limit {} -> {}",
      self.block_limit(),
      shadow.block_limit()
    );
    shadow
  }
}

/// Block-flow decisions: forced break first, then constraints, then the size
/// fit, at every box start edge; content confirms the pending edges; the
/// trailing edge is tested once more when the flow runs out.
struct BlockFlowHooks {
  column: Column,
}

impl BlockFlowHooks {
  fn constraints(&self) -> Vec<Rc<dyn LayoutConstraint>> {
    self.column.core.layout_constraints.borrow().clone()
  }
}

impl BoxEdgeHooks for BlockFlowHooks {
  fn start_non_inline_box(&self, state: &StateHandle) -> TaskResult<()> {
    if process_forced_break(state, &self.column) {
      state.borrow_mut().break_requested = true;
      return TaskResult::ready(());
    }
    for constraint in self.constraints() {
      if process_layout_constraint(state, constraint.as_ref(), &self.column) {
        state.borrow_mut().break_requested = true;
        return TaskResult::ready(());
      }
    }
    if save_edge_and_process_overflow(state, &self.column) {
      state.borrow_mut().break_requested = true;
    }
    TaskResult::ready(())
  }

  fn non_edge_content(&self, state: &StateHandle, event: NodeEvent) -> TaskResult<()> {
    if event.entering {
      if save_edge_and_process_overflow(state, &self.column) {
        state.borrow_mut().break_requested = true;
        return TaskResult::ready(());
      }
      // Content confirms the pending edges.
      let mut guard = state.borrow_mut();
      guard.leading_edge_contexts.clear();
      guard.leading_edge = false;
      guard.at_unforced_break = false;
      guard.break_at_the_edge = None;
    }
    TaskResult::ready(())
  }

  fn flow_exhausted(&self, state: &StateHandle) -> TaskResult<()> {
    save_edge_and_process_overflow(state, &self.column);
    TaskResult::ready(())
  }
}
