//! Formatting context trait - the seam between flows
//!
//! Node contexts and containers carry a reference to the formatting model
//! governing their subtree. The fragmentation engine only needs to tell
//! contexts apart and name them in logs; concrete layout behavior lives in
//! the container driving the iterator.

use std::fmt;
use std::rc::Rc;

/// Formatting model governing a subtree of the flow.
pub trait FormattingContext: fmt::Debug {
  /// Debug name of the context.
  fn name(&self) -> &'static str;

  /// True for block formatting.
  fn is_block(&self) -> bool;
}

/// Plain block formatting.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFormattingContext;

impl FormattingContext for BlockFormattingContext {
  fn name(&self) -> &'static str {
    "block"
  }

  fn is_block(&self) -> bool {
    true
  }
}

/// True when two contexts are the same instance.
pub fn same_formatting_context(
  a: &Rc<dyn FormattingContext>,
  b: &Rc<dyn FormattingContext>,
) -> bool {
  Rc::ptr_eq(a, b)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_block_context_identity() {
    let a: Rc<dyn FormattingContext> = Rc::new(BlockFormattingContext);
    let b = Rc::clone(&a);
    let c: Rc<dyn FormattingContext> = Rc::new(BlockFormattingContext);

    assert!(same_formatting_context(&a, &b));
    assert!(!same_formatting_context(&a, &c));
    assert!(a.is_block());
    assert_eq!(a.name(), "block");
  }
}
