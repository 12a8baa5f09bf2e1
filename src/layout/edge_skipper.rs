//! Edge batching between pieces of real content.
//!
//! Between two pieces of content a flow crosses a run of box edges: the ends
//! of boxes being closed and the starts of boxes being opened. Break values on
//! those edges collapse into one effective value, and the fit of everything
//! placed so far is checked once for the whole run instead of per edge.
//! [`EdgeSkipper`] owns that bookkeeping as a [`LayoutStrategy`]; a concrete
//! driver supplies the decisions through [`BoxEdgeHooks`].
//!
//! The three decision operations ([`process_forced_break`],
//! [`save_edge_and_process_overflow`], [`process_layout_constraint`]) are free
//! functions so a driver can call them from inside its hooks in whatever order
//! its flow requires.

use std::rc::Rc;

use log::debug;

use crate::breaks::{is_forced_break_value, resolve_effective_break_value, BreakValue};
use crate::layout::column::Column;
use crate::layout::constraint::LayoutConstraint;
use crate::layout::iterator::{
  LayoutIteratorState, LayoutStrategy, NodeEvent, NodeEventKind, StateHandle,
};
use crate::task::TaskResult;
use crate::tree::node_context::NodeContext;

/// Applies a pending forced break.
///
/// Outside the leading edge of the run, a forced value accumulated at the
/// current edge relocates the position back to the outermost start-edge
/// snapshot (undoing the entry into any empty wrapper boxes), detaches the
/// view already realized for that position, and records the break kind on the
/// column. Returns whether a forced break was applied.
pub fn process_forced_break(state: &StateHandle, column: &Column) -> bool {
  let mut guard = state.borrow_mut();
  let needed = !guard.leading_edge && is_forced_break_value(guard.break_at_the_edge.as_ref());
  if needed {
    if let Some(outermost) = guard.leading_edge_contexts.first() {
      guard.node_context = Some(outermost.clone());
    }
    if let Some(view) = guard
      .node_context
      .as_ref()
      .and_then(|context| context.view.clone())
    {
      view.detach();
    }
    if let Some(BreakValue::Forced(kind)) = guard.break_at_the_edge {
      column.set_forced_break_kind(Some(kind));
      debug!(target: "pageflow", "forced {:?} break at `{}`", kind, context_name(&guard));
    }
  }
  needed
}

/// Fit test for everything placed so far, recording a reusable break record
/// at the last fully exited box as a side effect.
///
/// On overflow the current position is replaced by a copy of that last exited
/// context flagged as overflowing, so the run stops where content still fit.
/// Returns whether the content overflows the column.
pub fn save_edge_and_process_overflow(state: &StateHandle, column: &Column) -> bool {
  let overflow = {
    let guard = state.borrow();
    column.check_overflow_and_save_edge_and_break_position(
      guard.last_after_context.as_ref(),
      true,
      guard.break_at_the_edge,
    )
  };
  if overflow {
    let mut guard = state.borrow_mut();
    let mut stopped = guard
      .last_after_context
      .clone()
      .or_else(|| guard.node_context.clone());
    if let Some(context) = &mut stopped {
      context.overflow = true;
    }
    debug!(target: "pageflow", "overflow past `{}`", context_name(&guard));
    guard.node_context = stopped;
  }
  overflow
}

/// Asks `constraint` whether the current box may be laid out at all.
///
/// On violation a break record is still saved at the last exited box (skipped
/// if that edge overflows) and the current context is flagged as overflowing,
/// without replacing it. Returns whether the constraint was violated.
pub fn process_layout_constraint(
  state: &StateHandle,
  constraint: &dyn LayoutConstraint,
  column: &Column,
) -> bool {
  let violated = {
    let guard = state.borrow();
    match &guard.node_context {
      Some(context) => !constraint.allow_layout(context),
      None => false,
    }
  };
  if violated {
    {
      let guard = state.borrow();
      column.check_overflow_and_save_edge_and_break_position(
        guard.last_after_context.as_ref(),
        false,
        guard.break_at_the_edge,
      );
    }
    let mut guard = state.borrow_mut();
    debug!(target: "pageflow", "constraint forbids `{}`", context_name(&guard));
    if let Some(context) = &mut guard.node_context {
      context.overflow = true;
    }
  }
  violated
}

fn context_name(state: &LayoutIteratorState) -> String {
  state
    .node_context
    .as_ref()
    .map(|context| context.source.name().to_string())
    .unwrap_or_default()
}

/// Decision points a concrete driver supplies to [`EdgeSkipper`].
///
/// Every hook defaults to a no-op so a driver overrides only the edges it
/// cares about.
pub trait BoxEdgeHooks {
  /// A non-inline box is being entered; its break-before value has been
  /// merged into the accumulated edge value and its context snapshotted.
  fn start_non_inline_box(&self, state: &StateHandle) -> TaskResult<()> {
    let _ = state;
    TaskResult::ready(())
  }

  /// A non-inline box is being exited after content was seen inside it.
  fn end_non_inline_box(&self, state: &StateHandle) -> TaskResult<()> {
    let _ = state;
    TaskResult::ready(())
  }

  /// A non-inline box is being exited with nothing inside it.
  fn end_empty_non_inline_box(&self, state: &StateHandle) -> TaskResult<()> {
    let _ = state;
    TaskResult::ready(())
  }

  /// Content that is not a box edge: non-collapsible text or an inline
  /// element, entering or exiting.
  fn non_edge_content(&self, state: &StateHandle, event: NodeEvent) -> TaskResult<()> {
    let _ = (state, event);
    TaskResult::ready(())
  }

  /// The flow ran out before the run was stopped.
  fn flow_exhausted(&self, state: &StateHandle) -> TaskResult<()> {
    let _ = state;
    TaskResult::ready(())
  }
}

/// [`LayoutStrategy`] that batches box edges and tracks the accumulated break
/// value, the leading-edge snapshots, and the last fully exited box.
pub struct EdgeSkipper<H: BoxEdgeHooks> {
  hooks: H,
  leading_edge: bool,
}

impl<H: BoxEdgeHooks> EdgeSkipper<H> {
  /// `leading_edge` marks a run starting at the very beginning of a fresh
  /// container, where forced break values must not fire again.
  pub fn new(hooks: H, leading_edge: bool) -> Self {
    Self {
      hooks,
      leading_edge,
    }
  }
}

impl<H: BoxEdgeHooks + 'static> LayoutStrategy for EdgeSkipper<H> {
  fn initial_state(&self, initial: NodeContext) -> LayoutIteratorState {
    let at_unforced_break = self.leading_edge && initial.after;
    let mut state = LayoutIteratorState::new(initial);
    state.leading_edge = self.leading_edge;
    state.at_unforced_break = at_unforced_break;
    state
  }

  fn process_event(&self, state: &StateHandle, event: NodeEvent) -> TaskResult<()> {
    match (event.kind, event.entering) {
      (NodeEventKind::NonInlineElement, true) => {
        {
          let mut guard = state.borrow_mut();
          if let Some(context) = guard.node_context.clone() {
            let break_before = context.break_before;
            guard.leading_edge_contexts.push(context);
            guard.break_at_the_edge =
              resolve_effective_break_value(guard.break_at_the_edge, break_before);
          }
          guard.on_start_edges = true;
        }
        self.hooks.start_non_inline_box(state)
      }
      (NodeEventKind::NonInlineElement, false) => {
        let empty = state.borrow().on_start_edges;
        let settled = if empty {
          let state = Rc::clone(state);
          self
            .hooks
            .end_empty_non_inline_box(&state)
            .then_async(move |()| {
              let mut guard = state.borrow_mut();
              if !guard.break_requested {
                // Collapsed box: drop everything accumulated at its edges so
                // runs of empty wrappers do not grow the buffer unbounded.
                guard.leading_edge_contexts.clear();
                guard.leading_edge = false;
                guard.at_unforced_break = false;
                guard.break_at_the_edge = None;
              }
              TaskResult::ready(())
            })
        } else {
          self.hooks.end_non_inline_box(state)
        };
        let state = Rc::clone(state);
        settled.then_async(move |()| {
          let mut guard = state.borrow_mut();
          if !guard.break_requested {
            guard.on_start_edges = false;
            guard.last_after_context = guard.node_context.clone();
            guard.break_at_the_edge = resolve_effective_break_value(
              guard.break_at_the_edge,
              guard
                .node_context
                .as_ref()
                .and_then(|context| context.break_after),
            );
          }
          TaskResult::ready(())
        })
      }
      (NodeEventKind::NonElement, _) | (NodeEventKind::InlineElement, _) => {
        if event.entering {
          state.borrow_mut().on_start_edges = false;
        }
        self.hooks.non_edge_content(state, event)
      }
      (NodeEventKind::IgnoredText, _) | (NodeEventKind::NonDisplayable, _) => {
        TaskResult::ready(())
      }
    }
  }

  fn finish(&self, state: &StateHandle) -> TaskResult<()> {
    self.hooks.flow_exhausted(state)
  }
}
