//! Classified edge iteration over a flow.
//!
//! [`LayoutIterator`] advances a [`NodeContext`] through the flow one edge at
//! a time. Every position is classified fresh into one of five mutually
//! exclusive categories, in priority order:
//!
//! 1. no realized view (suppressed subtrees, comments)
//! 2. text the governing whitespace policy allows collapsing away
//! 3. other non-element content
//! 4. inline-level elements
//! 5. block-level elements
//!
//! crossed with the edge direction (entering vs exiting). The matching
//! [`LayoutStrategy`] callback runs to completion, including asynchronous
//! continuations, before the iterator advances past the position.
//! Classification is never cached across an advancement, because advancing
//! may realize views that did not exist a step earlier.

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use crate::breaks::BreakValue;
use crate::error::{Error, Result};
use crate::task::{Frame, TaskResult};
use crate::tree::factory::LayoutContext;
use crate::tree::node_context::NodeContext;

/// Content category of the node behind a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEventKind {
  /// No realized view: suppressed subtrees and comments.
  NonDisplayable,
  /// Text the whitespace policy collapses away.
  IgnoredText,
  /// Non-element content that is real, i.e. non-collapsible text.
  NonElement,
  /// An element laid out inline.
  InlineElement,
  /// An element starting its own block.
  NonInlineElement,
}

/// One classified enter/exit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeEvent {
  pub kind: NodeEventKind,
  pub entering: bool,
}

impl NodeEvent {
  /// Classifies `context`: view presence first, then content type, then
  /// inline-vs-block.
  pub fn classify(context: &NodeContext) -> Self {
    let kind = if context.view.is_none() {
      NodeEventKind::NonDisplayable
    } else if !context.is_element() {
      if context.can_ignore() {
        NodeEventKind::IgnoredText
      } else {
        NodeEventKind::NonElement
      }
    } else if context.inline {
      NodeEventKind::InlineElement
    } else {
      NodeEventKind::NonInlineElement
    };
    Self {
      kind,
      entering: !context.after,
    }
  }
}

/// Mutable state of one iteration run, shared with strategy callbacks.
#[derive(Debug)]
pub struct LayoutIteratorState {
  /// Current position; `None` once the flow is exhausted.
  pub node_context: Option<NodeContext>,
  /// Whether the run sits right after an unforced break.
  pub at_unforced_break: bool,
  /// Set by a callback to stop once its continuation settles.
  pub break_requested: bool,
  /// True until the first real content of the whole run is seen.
  pub leading_edge: bool,
  /// Break value accumulated across edges crossed since the last content.
  pub break_at_the_edge: Option<BreakValue>,
  /// True between a box's start edge and its first content.
  pub on_start_edges: bool,
  /// Start-edge snapshots since the last content, outermost first.
  pub leading_edge_contexts: Vec<NodeContext>,
  /// The deepest fully exited box so far.
  pub last_after_context: Option<NodeContext>,
}

impl LayoutIteratorState {
  pub fn new(initial: NodeContext) -> Self {
    Self {
      node_context: Some(initial),
      at_unforced_break: false,
      break_requested: false,
      leading_edge: false,
      break_at_the_edge: None,
      on_start_edges: false,
      leading_edge_contexts: Vec::new(),
      last_after_context: None,
    }
  }
}

/// Shared handle to a run's state, kept alive across suspension points.
pub type StateHandle = Rc<RefCell<LayoutIteratorState>>;

/// Receives classified events as a run advances.
pub trait LayoutStrategy {
  /// Builds the state for a run starting at `initial`.
  fn initial_state(&self, initial: NodeContext) -> LayoutIteratorState {
    LayoutIteratorState::new(initial)
  }

  /// Handles one event. May mutate the shared state, request termination,
  /// and suspend.
  fn process_event(&self, state: &StateHandle, event: NodeEvent) -> TaskResult<()>;

  /// Runs once when the flow is exhausted without a requested break.
  fn finish(&self, state: &StateHandle) -> TaskResult<()> {
    let _ = state;
    TaskResult::ready(())
  }
}

/// Drives a [`LayoutStrategy`] over a flow.
pub struct LayoutIterator {
  strategy: Rc<dyn LayoutStrategy>,
  layout_context: Rc<dyn LayoutContext>,
}

impl LayoutIterator {
  pub fn new(strategy: Rc<dyn LayoutStrategy>, layout_context: Rc<dyn LayoutContext>) -> Self {
    Self {
      strategy,
      layout_context,
    }
  }

  /// Runs from `initial` until a callback requests a break or the flow is
  /// exhausted.
  ///
  /// Resolves with the stopping context, or `None` when the whole flow was
  /// consumed. On exhaustion the strategy's `finish` hook runs first and may
  /// still install a stopping context, e.g. when the trailing edge does not
  /// fit.
  pub fn iterate(&self, initial: NodeContext) -> TaskResult<Result<Option<NodeContext>>> {
    let strategy = Rc::clone(&self.strategy);
    let layout_context = Rc::clone(&self.layout_context);
    let state: StateHandle = Rc::new(RefCell::new(strategy.initial_state(initial)));
    let failure: Rc<RefCell<Option<Error>>> = Rc::new(RefCell::new(None));

    let loop_done = {
      let strategy = Rc::clone(&strategy);
      let state = Rc::clone(&state);
      let failure = Rc::clone(&failure);
      Frame::run_loop("layout_iterator", move || {
        let event = {
          let guard = state.borrow();
          match &guard.node_context {
            Some(context) => NodeEvent::classify(context),
            None => return TaskResult::ready(false),
          }
        };
        trace!(
          target: "pageflow",
          "iterate {:?} ({})",
          event.kind,
          if event.entering { "enter" } else { "exit" }
        );
        let layout_context = Rc::clone(&layout_context);
        let state = Rc::clone(&state);
        let failure = Rc::clone(&failure);
        strategy.process_event(&state, event).then_async(move |()| {
          // The stopping context must survive: never advance once a break is
          // requested, and never overwrite it with a late advancement result.
          if state.borrow().break_requested {
            return TaskResult::ready(false);
          }
          let (position, at_unforced_break) = {
            let guard = state.borrow();
            match &guard.node_context {
              Some(context) => (context.clone(), guard.at_unforced_break),
              None => return TaskResult::ready(false),
            }
          };
          layout_context
            .next_in_tree(position, at_unforced_break)
            .then_async(move |outcome| {
              let again = match outcome {
                Err(error) => {
                  failure.borrow_mut().replace(error);
                  false
                }
                Ok(next) => {
                  let mut guard = state.borrow_mut();
                  if guard.break_requested {
                    false
                  } else {
                    let advanced = next.is_some();
                    guard.node_context = next;
                    advanced
                  }
                }
              };
              TaskResult::ready(again)
            })
        })
      })
    };

    loop_done.then_async(move |()| {
      if let Some(error) = failure.borrow_mut().take() {
        return TaskResult::ready(Err(error));
      }
      let exhausted = {
        let guard = state.borrow();
        guard.node_context.is_none() && !guard.break_requested
      };
      if exhausted {
        let settled = Rc::clone(&state);
        strategy
          .finish(&state)
          .then_async(move |()| TaskResult::ready(Ok(settled.borrow_mut().node_context.take())))
      } else {
        TaskResult::ready(Ok(state.borrow_mut().node_context.take()))
      }
    })
  }
}
