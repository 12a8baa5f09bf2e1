//! Caller-supplied acceptability checks beyond the block budget.

use std::fmt;

use crate::tree::node_context::NodeContext;

/// A veto the caller holds over placing content in the current fragment.
///
/// Constraints are checked at box start edges, before any size-based fit
/// test. A constraint that answers `false` stops the run the same way
/// overflow does; once the caller commits to a break it notifies every
/// registered constraint through [`LayoutConstraint::finish_break`].
pub trait LayoutConstraint: fmt::Debug {
  /// Whether the box behind `context` may be laid out in this fragment.
  fn allow_layout(&self, context: &NodeContext) -> bool;

  /// The fragment is final; `position_after` is the position right after the
  /// committed break, when one exists.
  fn finish_break(&self, position_after: Option<&NodeContext>) {
    let _ = position_after;
  }
}
