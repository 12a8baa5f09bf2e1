//! Fragmentation-aware layout drivers.
//!
//! This module contains the machinery that walks a flow through a sequence of
//! fixed-extent containers:
//!
//! - **Iteration**: [`LayoutIterator`] advances edge by edge through the flow
//!   and dispatches classified events to a [`LayoutStrategy`]
//! - **Edge skipping**: [`EdgeSkipper`] batches consecutive box edges between
//!   pieces of real content and hands them to break hooks in bulk
//! - **Break tracking**: [`EdgeBreakPosition`] records where a container may
//!   be split and which of those records survive an overflow
//! - **Containers**: [`Column`] owns one container's worth of layout state;
//!   [`PseudoColumn`] reuses it for flows nested inside a measured region
//!
//! # Architecture
//!
//! A container run is a cooperative task: the iterator body returns a
//! [`TaskResult`](crate::task::TaskResult) per step so that view realization
//! may suspend mid-flow. Strategies never see raw tree positions; they see
//! enter/exit events whose category is derived from the current
//! [`NodeContext`](crate::tree::NodeContext) at dispatch time.

// Break records collected while a container fills
pub mod break_position;

// One container's worth of layout state and the block-flow driver
pub mod column;

// Caller-supplied acceptability checks beyond the block budget
pub mod constraint;

// Edge batching between pieces of real content
pub mod edge_skipper;

// Formatting context seam shared by every node context
pub mod formatting_context;

// Event classification and the cooperative iteration loop
pub mod iterator;

// Nested flows laid out against an enclosing measured region
pub mod pseudo_column;

// Re-exports
pub use break_position::{BreakPositionAndNodeContext, EdgeBreakPosition};
pub use column::Column;
pub use constraint::LayoutConstraint;
pub use edge_skipper::{BoxEdgeHooks, EdgeSkipper};
pub use formatting_context::{BlockFormattingContext, FormattingContext};
pub use iterator::{
  LayoutIterator, LayoutIteratorState, LayoutStrategy, NodeEvent, NodeEventKind, StateHandle,
};
pub use pseudo_column::PseudoColumn;
