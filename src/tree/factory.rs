//! Lazy view realization.
//!
//! [`LayoutContext`] is the seam between the fragmentation engine and whatever
//! realizes content: advancing through the flow is an operation that may
//! suspend, because an implementation may have to wait on external resources
//! before it can produce the next view node. [`ViewFactory`] is the default,
//! fully synchronous implementation: a depth-first walk over the styled tree
//! that materializes view nodes on first visit and caches the source-to-view
//! mapping.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{LayoutError, Result};
use crate::layout::formatting_context::{BlockFormattingContext, FormattingContext};
use crate::task::TaskResult;
use crate::tree::node_context::{NodeContext, NodePosition};
use crate::tree::styled::{Display, StyledData, StyledHandle, WhiteSpace};
use crate::tree::view::{ViewHandle, ViewNode};

/// Realizes views and advances through the flow on behalf of a container.
pub trait LayoutContext {
  /// Advances to the position following `position`, realizing views lazily.
  ///
  /// Resolves with `Ok(None)` when the flow is exhausted. `at_unforced_break`
  /// tells the implementation whether the walk sits right after an unforced
  /// break, which resumable implementations use to re-open rather than
  /// re-create boxes.
  fn next_in_tree(
    &self,
    position: NodeContext,
    at_unforced_break: bool,
  ) -> TaskResult<Result<Option<NodeContext>>>;

  /// Realizes the view path down to `position` and returns its context.
  fn open_at(&self, position: &NodePosition) -> TaskResult<Result<NodeContext>>;

  /// An independent context for laying out the flow rooted at `flow_root`,
  /// with its own view tree and caches.
  fn clone_context(&self, flow_root: &StyledHandle) -> Rc<dyn LayoutContext>;

  /// The realized root of this context's view tree.
  fn view_root(&self) -> ViewHandle;
}

/// Default synchronous [`LayoutContext`] over a styled tree.
pub struct ViewFactory {
  root: StyledHandle,
  view_root: ViewHandle,
  views: RefCell<FxHashMap<usize, ViewHandle>>,
  formatting_context: Rc<dyn FormattingContext>,
}

impl ViewFactory {
  pub fn new(root: &StyledHandle) -> Self {
    let view_root = ViewNode::new(root);
    let mut views = FxHashMap::default();
    views.insert(Self::key(root), Rc::clone(&view_root));
    Self {
      root: Rc::clone(root),
      view_root,
      views: RefCell::new(views),
      formatting_context: Rc::new(BlockFormattingContext),
    }
  }

  fn key(source: &StyledHandle) -> usize {
    Rc::as_ptr(source) as usize
  }

  fn displayable(source: &StyledHandle) -> bool {
    match &source.data {
      StyledData::Comment { .. } => false,
      StyledData::Element { .. } => source.style.display != Display::None,
      StyledData::Text { .. } => true,
    }
  }

  /// The cached view for `source`, realizing and attaching it on first visit.
  /// Suppressed nodes (comments, `display: none`) have no view.
  fn view_for(&self, source: &StyledHandle) -> Option<ViewHandle> {
    if !Self::displayable(source) {
      return None;
    }
    if let Some(existing) = self.views.borrow().get(&Self::key(source)) {
      return Some(Rc::clone(existing));
    }
    let view = ViewNode::new(source);
    if !Rc::ptr_eq(source, &self.root) {
      if let Some(parent) = source.parent() {
        if let Some(parent_view) = self.view_for(&parent) {
          ViewNode::append(&parent_view, &view);
        }
      }
    }
    self
      .views
      .borrow_mut()
      .insert(Self::key(source), Rc::clone(&view));
    Some(view)
  }

  fn whitespace_for(&self, source: &StyledHandle) -> WhiteSpace {
    if source.is_element() {
      return source.style.white_space;
    }
    let mut cursor = source.parent();
    while let Some(node) = cursor {
      if node.is_element() {
        return node.style.white_space;
      }
      cursor = node.parent();
    }
    WhiteSpace::default()
  }

  fn context_at(&self, source: &StyledHandle, after: bool) -> NodeContext {
    NodeContext {
      source: Rc::clone(source),
      view: self.view_for(source),
      after,
      offset_in_node: 0,
      inline: match &source.data {
        StyledData::Element { .. } => source.style.display == Display::Inline,
        _ => true,
      },
      whitespace: self.whitespace_for(source),
      break_before: source.style.break_before,
      break_after: source.style.break_after,
      overflow: false,
      formatting_context: Rc::clone(&self.formatting_context),
    }
  }

  /// Depth-first advancement: descend into realized subtrees, then cross to
  /// the trailing edge, then to the following sibling, finally back out to
  /// the parent's trailing edge.
  fn advance(&self, position: &NodeContext) -> Option<NodeContext> {
    let source = &position.source;
    if !position.after {
      // Suppressed nodes have no view and their subtree is skipped.
      if position.view.is_some() {
        if let Some(first) = source.first_child() {
          return Some(self.context_at(&first, false));
        }
      }
      return Some(self.context_at(source, true));
    }
    if Rc::ptr_eq(source, &self.root) {
      return None;
    }
    if let Some(sibling) = source.next_sibling() {
      return Some(self.context_at(&sibling, false));
    }
    source
      .parent()
      .map(|parent| self.context_at(&parent, true))
  }

  fn open_position(&self, position: &NodePosition) -> Result<NodeContext> {
    let node = &position.node;
    if !Rc::ptr_eq(node, &self.root) {
      let mut cursor = node.parent();
      let mut under_root = false;
      while let Some(ancestor) = cursor {
        if !Self::displayable(&ancestor) {
          return Err(
            LayoutError::PositionNotFound {
              message: format!("`{}` sits under a suppressed subtree", node.name()),
            }
            .into(),
          );
        }
        if Rc::ptr_eq(&ancestor, &self.root) {
          under_root = true;
          break;
        }
        cursor = ancestor.parent();
      }
      if !under_root {
        return Err(
          LayoutError::PositionNotFound {
            message: format!("`{}` is not under the flow root", node.name()),
          }
          .into(),
        );
      }
    }

    let mut context = self.context_at(node, position.after);
    context.offset_in_node = position.offset_in_node;

    // Ancestors realized on the way down are carried-over shells: their
    // content belongs to a previous container. The target itself is a shell
    // only when resuming past its trailing edge.
    if let Some(view) = &context.view {
      let mut cursor = view.parent();
      while let Some(ancestor) = cursor {
        ancestor.set_shell(true);
        cursor = ancestor.parent();
      }
      if position.after {
        view.set_shell(true);
      }
    }
    Ok(context)
  }
}

impl LayoutContext for ViewFactory {
  fn next_in_tree(
    &self,
    position: NodeContext,
    _at_unforced_break: bool,
  ) -> TaskResult<Result<Option<NodeContext>>> {
    TaskResult::ready(Ok(self.advance(&position)))
  }

  fn open_at(&self, position: &NodePosition) -> TaskResult<Result<NodeContext>> {
    TaskResult::ready(self.open_position(position))
  }

  fn clone_context(&self, flow_root: &StyledHandle) -> Rc<dyn LayoutContext> {
    Rc::new(ViewFactory::new(flow_root))
  }

  fn view_root(&self) -> ViewHandle {
    Rc::clone(&self.view_root)
  }
}
